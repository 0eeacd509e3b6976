//! Runtime for Graphwalk.
//!
//! This crate provides the query execution runtime:
//! - `schema`: Schema definition and building
//! - `executor`: Query execution
//! - `resolver`: Field resolvers and the resolver registry
//! - `selection`: Selection-set collection and merging
//! - `coerce`: Argument and leaf-value coercion
//! - `abstract_type`: Concrete-type resolution for interfaces and unions
//! - `naming`: Response-key naming conventions
//! - `error`: Execution errors and the response envelope

pub mod abstract_type;
pub mod coerce;
pub mod error;
pub mod executor;
pub mod naming;
pub mod resolver;
pub mod schema;
pub mod selection;

pub use abstract_type::{resolve_concrete, AbstractTypeError, FnTypeResolver, TypeResolver};
pub use coerce::{coerce_arguments, coerce_leaf, CoercionError};
pub use error::{ErrorCode, ExecutionError, PathSegment, RequestError, Response};
pub use executor::{Context, ExecutionRequest, Executor, ExecutorConfig};
pub use naming::{to_camel_case, AsIsConverter, CamelCaseConverter, FieldNameConverter};
pub use resolver::{
    AsyncFnResolver, BoxedResolver, FnResolver, PropertyResolver, Resolver, ResolverArgs,
    ResolverError, ResolverFuture, ResolverInfo, ResolverMap, ResolverResult,
};
pub use schema::{
    EnumDef, EnumValueDef, FieldDef, InputObjectDef, InputValueDef, InterfaceDef, ObjectDef,
    ScalarDef, Schema, SchemaBuilder, TypeDef, TypeKind, TypeRef, UnionDef,
};
pub use selection::{collect_fields, CollectedField};
