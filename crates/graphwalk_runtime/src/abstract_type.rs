//! Concrete-type resolution for interface and union values.

use crate::error::ErrorCode;
use crate::executor::Context;
use crate::schema::{ObjectDef, Schema, TypeDef};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Names the concrete object type for a value at an abstract-typed position.
///
/// Registered per abstract type at schema-build time via
/// [`SchemaBuilder::type_resolver`](crate::schema::SchemaBuilder::type_resolver).
pub trait TypeResolver: Send + Sync {
    /// Returns the concrete object type name, or `None` if undetermined.
    fn resolve_type(&self, value: &Value, ctx: &Context) -> Option<String>;
}

/// A type resolver backed by a plain function.
pub struct FnTypeResolver {
    func: Arc<dyn Fn(&Value, &Context) -> Option<String> + Send + Sync>,
}

impl FnTypeResolver {
    /// Creates a new function type resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl TypeResolver for FnTypeResolver {
    fn resolve_type(&self, value: &Value, ctx: &Context) -> Option<String> {
        (self.func)(value, ctx)
    }
}

/// Failure to map a value at an abstract-typed position to a concrete object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbstractTypeError {
    #[error("unable to determine the concrete type for a value of abstract type '{0}'")]
    Undetermined(String),

    #[error("type '{concrete}' resolved for abstract type '{abstract_name}' is not an object type")]
    UnknownConcrete {
        abstract_name: String,
        concrete: String,
    },

    #[error("object type '{concrete}' is not a possible type of '{abstract_name}'")]
    Incompatible {
        abstract_name: String,
        concrete: String,
    },
}

impl AbstractTypeError {
    /// Returns the classification for the response error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Undetermined(_) => ErrorCode::AmbiguousType,
            Self::UnknownConcrete { .. } | Self::Incompatible { .. } => ErrorCode::TypeMismatch,
        }
    }
}

/// Resolves the concrete object type for `value` at an abstract position.
///
/// An explicitly registered [`TypeResolver`] wins; otherwise the value's
/// `__typename` property is consulted. The resolved name must denote an
/// object type that is a possible type of the abstract type.
pub fn resolve_concrete<'a>(
    schema: &'a Schema,
    abstract_name: &str,
    value: &Value,
    ctx: &Context,
) -> Result<&'a ObjectDef, AbstractTypeError> {
    let concrete = schema
        .type_resolver(abstract_name)
        .and_then(|resolver| resolver.resolve_type(value, ctx))
        .or_else(|| {
            value
                .get("__typename")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    let Some(concrete) = concrete else {
        return Err(AbstractTypeError::Undetermined(abstract_name.to_string()));
    };

    let object = match schema.get_type(&concrete) {
        Some(TypeDef::Object(object)) => object,
        _ => {
            return Err(AbstractTypeError::UnknownConcrete {
                abstract_name: abstract_name.to_string(),
                concrete,
            })
        }
    };

    if !schema.is_possible_type(abstract_name, object) {
        return Err(AbstractTypeError::Incompatible {
            abstract_name: abstract_name.to_string(),
            concrete,
        });
    }

    Ok(object)
}
