//! Query execution.
//!
//! The executor walks an operation's selection tree against the schema,
//! invoking a resolver for every field and assembling the response object
//! in document order. Sibling fields of a query resolve concurrently;
//! mutation root fields run one at a time.
//!
//! Field failures degrade the response instead of aborting it: the failed
//! position becomes null, an error is recorded, and when the position is
//! declared non-null the null climbs to the nearest nullable ancestor.

use crate::abstract_type::resolve_concrete;
use crate::coerce::{coerce_arguments, coerce_leaf};
use crate::error::{ErrorCode, ExecutionError, PathSegment, RequestError, Response};
use crate::naming::{AsIsConverter, FieldNameConverter};
use crate::resolver::{ResolverArgs, ResolverInfo, ResolverMap};
use crate::schema::{ObjectDef, Schema, TypeDef, TypeRef};
use crate::selection::{collect_fields, CollectedField};
use futures_util::future::join_all;
use graphwalk_document::{Document, OperationDefinition, OperationKind, Selection, Variables};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Request-scoped user context passed to every resolver.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, Value>,
}

impl Context {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a serializable value under a key.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.into(), value);
        }
    }

    /// Gets a value by key, deserialized into the requested type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Gets the raw stored value by key.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum selection nesting depth before execution is aborted.
    pub max_depth: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

/// The query executor.
///
/// Holds the schema and resolver registry; one executor serves any number
/// of concurrent requests.
#[derive(Debug)]
pub struct Executor {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
    config: ExecutorConfig,
}

impl Executor {
    /// Creates an executor with property-based default resolution.
    pub fn new(schema: Schema) -> Self {
        Self::with_resolvers(schema, ResolverMap::new())
    }

    /// Creates an executor with the given resolver registry.
    pub fn with_resolvers(schema: Schema, resolvers: ResolverMap) -> Self {
        Self {
            schema: Arc::new(schema),
            resolvers: Arc::new(resolvers),
            config: ExecutorConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Executes a request to completion and returns the response envelope.
    pub async fn execute(&self, request: ExecutionRequest<'_>) -> Response {
        let operation =
            match select_operation(request.document, request.operation_name.as_deref()) {
                Ok(operation) => operation,
                Err(error) => return Response::request_failed(error),
            };

        let root_def = match root_object(&self.schema, operation) {
            Ok(object) => object,
            Err(error) => return Response::request_failed(error),
        };

        debug!(
            kind = ?operation.kind,
            operation = operation.name.as_deref().unwrap_or("<anonymous>"),
            "executing operation"
        );

        let errors = Mutex::new(Vec::new());
        let ecx = ExecutionContext {
            schema: &self.schema,
            document: request.document,
            resolvers: &self.resolvers,
            variables: &request.variables,
            context: &request.context,
            converter: request.converter.as_ref(),
            cancellation: &request.cancellation,
            errors: &errors,
            max_depth: self.config.max_depth,
        };

        let selections: Vec<&Selection> = operation.selections.iter().collect();
        let sequential = operation.kind == OperationKind::Mutation;
        let data = execute_selection_set(
            ecx,
            root_def,
            selections,
            request.root,
            Vec::new(),
            0,
            sequential,
        )
        .await;

        let collected = errors.into_inner();
        debug!(errors = collected.len(), "execution finished");

        match data {
            Ok(Ok(map)) => Response::from_parts(Some(Value::Object(map)), collected),
            Ok(Err(Propagated)) => Response::from_parts(Some(Value::Null), collected),
            Err(fatal) => {
                debug!(error = %fatal, "request-fatal failure");
                Response::request_failed(fatal)
            }
        }
    }
}

/// A single execution request: the document plus its runtime inputs.
pub struct ExecutionRequest<'a> {
    pub document: &'a Document,
    pub operation_name: Option<String>,
    pub root: Value,
    pub variables: Variables,
    pub context: Context,
    pub cancellation: CancellationToken,
    pub converter: Arc<dyn FieldNameConverter>,
}

impl<'a> ExecutionRequest<'a> {
    /// Creates a request with default inputs: null root, no variables,
    /// as-is field naming.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            operation_name: None,
            root: Value::Null,
            variables: Variables::new(),
            context: Context::new(),
            cancellation: CancellationToken::new(),
            converter: Arc::new(AsIsConverter),
        }
    }

    /// Selects the operation to execute by name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the root value handed to root-field resolvers.
    pub fn with_root(mut self, root: Value) -> Self {
        self.root = root;
        self
    }

    /// Sets the variable values.
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Sets the user context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Sets the cancellation token observed between resolver invocations.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets the response-key naming convention.
    pub fn with_converter(mut self, converter: impl FieldNameConverter + 'static) -> Self {
        self.converter = Arc::new(converter);
        self
    }
}

impl std::fmt::Debug for ExecutionRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("operation_name", &self.operation_name)
            .field("root", &self.root)
            .field("variables", &self.variables)
            .finish()
    }
}

/// Shared per-request state threaded through the execution tree.
#[derive(Clone, Copy)]
struct ExecutionContext<'a> {
    schema: &'a Schema,
    document: &'a Document,
    resolvers: &'a ResolverMap,
    variables: &'a Variables,
    context: &'a Context,
    converter: &'a dyn FieldNameConverter,
    cancellation: &'a CancellationToken,
    errors: &'a Mutex<Vec<ExecutionError>>,
    max_depth: usize,
}

impl ExecutionContext<'_> {
    async fn record(&self, error: ExecutionError) {
        self.errors.lock().await.push(error);
    }
}

/// Marker for a null climbing out of a non-null position. The violation is
/// already recorded; the nearest nullable ancestor absorbs it as null.
struct Propagated;

type FieldOutcome = Result<Result<Value, Propagated>, RequestError>;
type SetOutcome = Result<Result<serde_json::Map<String, Value>, Propagated>, RequestError>;

fn select_operation<'a>(
    document: &'a Document,
    name: Option<&str>,
) -> Result<&'a OperationDefinition, RequestError> {
    match name {
        Some(name) => document
            .operations
            .iter()
            .find(|operation| operation.name.as_deref() == Some(name))
            .ok_or_else(|| RequestError::OperationNotFound(name.to_string())),
        None => match document.operations.as_slice() {
            [] => Err(RequestError::NoOperations),
            [operation] => Ok(operation),
            _ => Err(RequestError::AmbiguousOperation),
        },
    }
}

fn root_object<'a>(
    schema: &'a Schema,
    operation: &OperationDefinition,
) -> Result<&'a ObjectDef, RequestError> {
    let (root, kind) = match operation.kind {
        OperationKind::Query => (schema.query_root(), "query"),
        OperationKind::Mutation => (schema.mutation_root(), "mutation"),
    };
    root.ok_or(RequestError::MissingRootType(kind))
}

/// Executes a collected selection set against `object`, producing the
/// response map in first-occurrence document order.
fn execute_selection_set<'a>(
    ecx: ExecutionContext<'a>,
    object: &'a ObjectDef,
    selections: Vec<&'a Selection>,
    parent: Value,
    path: Vec<PathSegment>,
    depth: usize,
    sequential: bool,
) -> Pin<Box<dyn Future<Output = SetOutcome> + Send + 'a>> {
    Box::pin(async move {
        if depth > ecx.max_depth {
            return Err(RequestError::DepthExceeded(ecx.max_depth));
        }

        let fields = collect_fields(ecx.document, ecx.schema, object, &selections, ecx.converter)?;

        let mut map = serde_json::Map::with_capacity(fields.len());
        if sequential {
            for field in fields {
                let key = field.response_key.clone();
                match execute_field(ecx, object, field, parent.clone(), &path, depth).await? {
                    Ok(value) => {
                        map.insert(key, value);
                    }
                    // A poisoned root field aborts the remaining mutations.
                    Err(Propagated) => return Ok(Err(Propagated)),
                }
            }
        } else {
            let keys: Vec<String> = fields.iter().map(|f| f.response_key.clone()).collect();
            let futures: Vec<_> = fields
                .into_iter()
                .map(|field| execute_field(ecx, object, field, parent.clone(), &path, depth))
                .collect();
            for (key, outcome) in keys.into_iter().zip(join_all(futures).await) {
                match outcome? {
                    Ok(value) => {
                        map.insert(key, value);
                    }
                    Err(Propagated) => return Ok(Err(Propagated)),
                }
            }
        }
        Ok(Ok(map))
    })
}

/// Resolves one collected field and completes its value against the
/// declared return type.
async fn execute_field<'a>(
    ecx: ExecutionContext<'a>,
    object: &'a ObjectDef,
    field: CollectedField<'a>,
    parent: Value,
    parent_path: &[PathSegment],
    depth: usize,
) -> FieldOutcome {
    let mut path = parent_path.to_vec();
    path.push(PathSegment::Field(field.response_key.clone()));

    // Meta-field: the concrete type name, no resolver involved.
    if field.name == "__typename" {
        return Ok(Ok(Value::String(object.name.clone())));
    }

    let Some(field_def) = object.field(field.name) else {
        ecx.record(
            ExecutionError::new(
                ErrorCode::UnknownField,
                format!("unknown field '{}' on type '{}'", field.name, object.name),
            )
            .with_path(path),
        )
        .await;
        return Ok(Ok(Value::Null));
    };

    if ecx.cancellation.is_cancelled() {
        return cancelled(ecx, &field_def.ty, path).await;
    }

    let args = match coerce_arguments(
        ecx.schema,
        &field_def.arguments,
        field.arguments,
        ecx.variables,
    ) {
        Ok(args) => ResolverArgs::from_map(args),
        Err(error) => {
            ecx.record(
                ExecutionError::new(
                    ErrorCode::ArgumentCoercion,
                    format!("field '{}.{}': {}", object.name, field.name, error),
                )
                .with_path(path),
            )
            .await;
            return Ok(failed(&field_def.ty));
        }
    };

    let info = ResolverInfo::new(field.name, &object.name)
        .with_return_type(field_def.ty.to_string())
        .with_path(path.clone());

    trace!(parent = %object.name, field = %field.name, "resolving field");

    let resolved = match ecx.resolvers.get(&object.name, field.name) {
        Some(resolver) => {
            // Biased: a resolver that has already produced a value keeps it
            // even when the token flips in the same instant.
            tokio::select! {
                biased;
                result = resolver.resolve(&parent, &args, ecx.context, &info) => result,
                () = ecx.cancellation.cancelled() => {
                    return cancelled(ecx, &field_def.ty, path).await;
                }
            }
        }
        // No resolver registered and no default: plain property access.
        None => Ok(parent.get(field.name).cloned().unwrap_or(Value::Null)),
    };

    let value = match resolved {
        Ok(value) => value,
        Err(error) => {
            ecx.record(
                ExecutionError::new(ErrorCode::ResolverFailure, error.to_string())
                    .with_path(path),
            )
            .await;
            return Ok(failed(&field_def.ty));
        }
    };

    let outcome = complete_value(ecx, &field_def.ty, field.selections, value, path, depth).await?;
    Ok(absorb(&field_def.ty, outcome))
}

/// Completes a resolved value against its declared type.
fn complete_value<'a>(
    ecx: ExecutionContext<'a>,
    ty: &'a TypeRef,
    selections: Vec<&'a Selection>,
    value: Value,
    path: Vec<PathSegment>,
    depth: usize,
) -> Pin<Box<dyn Future<Output = FieldOutcome> + Send + 'a>> {
    Box::pin(async move {
        match ty {
            TypeRef::NonNull(inner) => {
                match complete_value(ecx, inner, selections, value, path.clone(), depth).await? {
                    Ok(Value::Null) => {
                        ecx.record(
                            ExecutionError::new(
                                ErrorCode::TypeMismatch,
                                format!("cannot return null for non-nullable type '{ty}'"),
                            )
                            .with_path(path),
                        )
                        .await;
                        Ok(Err(Propagated))
                    }
                    other => Ok(other),
                }
            }
            TypeRef::List(inner) => {
                if value.is_null() {
                    return Ok(Ok(Value::Null));
                }
                let Value::Array(items) = value else {
                    ecx.record(
                        ExecutionError::new(
                            ErrorCode::TypeMismatch,
                            format!("expected a list for type '{ty}'"),
                        )
                        .with_path(path),
                    )
                    .await;
                    return Ok(Err(Propagated));
                };

                let futures: Vec<_> = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Index(index));
                        complete_value(ecx, inner, selections.clone(), item, item_path, depth)
                    })
                    .collect();

                let mut out = Vec::with_capacity(futures.len());
                for outcome in join_all(futures).await {
                    match outcome? {
                        Ok(item) => out.push(item),
                        // A poisoned non-null element poisons the list;
                        // a nullable element absorbs to null in place.
                        Err(Propagated) => {
                            if inner.is_non_null() {
                                return Ok(Err(Propagated));
                            }
                            out.push(Value::Null);
                        }
                    }
                }
                Ok(Ok(Value::Array(out)))
            }
            TypeRef::Named(name) => {
                if value.is_null() {
                    return Ok(Ok(Value::Null));
                }
                let Some(def) = ecx.schema.get_type(name) else {
                    ecx.record(
                        ExecutionError::new(
                            ErrorCode::Internal,
                            format!("schema references undefined type '{name}'"),
                        )
                        .with_path(path),
                    )
                    .await;
                    return Ok(Err(Propagated));
                };

                match def {
                    TypeDef::Scalar(_) | TypeDef::Enum(_) => match coerce_leaf(def, value) {
                        Ok(leaf) => Ok(Ok(leaf)),
                        Err(error) => {
                            ecx.record(
                                ExecutionError::new(ErrorCode::TypeMismatch, error.to_string())
                                    .with_path(path),
                            )
                            .await;
                            Ok(Err(Propagated))
                        }
                    },
                    TypeDef::Object(object_def) => {
                        complete_object(ecx, object_def, selections, value, path, depth).await
                    }
                    TypeDef::Interface(_) | TypeDef::Union(_) => {
                        match resolve_concrete(ecx.schema, name, &value, ecx.context) {
                            Ok(concrete) => {
                                complete_object(ecx, concrete, selections, value, path, depth)
                                    .await
                            }
                            Err(error) => {
                                ecx.record(
                                    ExecutionError::new(error.code(), error.to_string())
                                        .with_path(path),
                                )
                                .await;
                                Ok(Err(Propagated))
                            }
                        }
                    }
                    TypeDef::InputObject(_) => {
                        ecx.record(
                            ExecutionError::new(
                                ErrorCode::TypeMismatch,
                                format!("input object type '{name}' cannot be selected as output"),
                            )
                            .with_path(path),
                        )
                        .await;
                        Ok(Err(Propagated))
                    }
                }
            }
        }
    })
}

async fn complete_object<'a>(
    ecx: ExecutionContext<'a>,
    object: &'a ObjectDef,
    selections: Vec<&'a Selection>,
    value: Value,
    path: Vec<PathSegment>,
    depth: usize,
) -> FieldOutcome {
    match execute_selection_set(ecx, object, selections, value, path, depth + 1, false).await? {
        Ok(map) => Ok(Ok(Value::Object(map))),
        Err(Propagated) => Ok(Err(Propagated)),
    }
}

async fn cancelled(
    ecx: ExecutionContext<'_>,
    ty: &TypeRef,
    path: Vec<PathSegment>,
) -> FieldOutcome {
    debug!("cancellation observed");
    ecx.record(
        ExecutionError::new(ErrorCode::Cancelled, "execution was cancelled").with_path(path),
    )
    .await;
    Ok(failed(ty))
}

/// Outcome of a failed field by declared nullability: nullable positions
/// absorb to null, non-null positions poison the parent.
fn failed(ty: &TypeRef) -> Result<Value, Propagated> {
    if ty.is_non_null() {
        Err(Propagated)
    } else {
        Ok(Value::Null)
    }
}

fn absorb(ty: &TypeRef, outcome: Result<Value, Propagated>) -> Result<Value, Propagated> {
    match outcome {
        Ok(value) => Ok(value),
        Err(Propagated) => failed(ty),
    }
}
