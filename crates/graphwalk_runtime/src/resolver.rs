//! Field resolvers and the resolver registry.

use crate::error::PathSegment;
use crate::executor::Context;
use crate::naming::to_snake_case;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Coerced arguments passed to a resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: HashMap<String, Value>,
}

impl ResolverArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a coerced argument map.
    pub fn from_map(args: HashMap<String, Value>) -> Self {
        Self { args }
    }

    /// Looks up the raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Deserializes the argument into `T`, or `None` when absent or mistyped.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Deserializes a required argument, erroring when absent or malformed.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))?;
        serde_json::from_value(value.clone())
            .map_err(|e| ResolverError::ArgumentParse(name.to_string(), e.to_string()))
    }

    /// Borrows the underlying argument map.
    pub fn all(&self) -> &HashMap<String, Value> {
        &self.args
    }

    /// Returns true when no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Inserts an argument, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Per-call details handed to every resolver invocation.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    /// The declared field name being resolved.
    pub field_name: String,

    /// The declared return type, rendered (`[Person!]`, `String!`, ...).
    pub return_type: String,

    /// The parent type name.
    pub parent_type: String,

    /// Response path to this field.
    pub path: Vec<PathSegment>,
}

impl ResolverInfo {
    /// Creates info for a named field on a parent type.
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            return_type: String::new(),
            parent_type: parent_type.into(),
            path: Vec::new(),
        }
    }

    /// Records the rendered return type.
    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Records the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

/// Outcome of a single resolver call.
pub type ResolverResult = Result<Value, ResolverError>;

/// Boxed future returned by [`Resolver::resolve`].
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error raised inside a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("missing required argument: {0}")]
    MissingArgument(String),

    #[error("failed to parse argument '{0}': {1}")]
    ArgumentParse(String, String),

    #[error("{0}")]
    Custom(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        Self::Custom(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}

/// Produces the value for one field of one parent object.
pub trait Resolver: Send + Sync {
    /// Resolves the field against `parent` with already-coerced `args`.
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

/// Owned, type-erased resolver as stored in the registry.
pub type BoxedResolver = Box<dyn Resolver>;

type SyncFieldFn =
    Box<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>;

/// Adapts a plain function into a [`Resolver`].
///
/// The function runs when `resolve` is called; the returned future is
/// already complete by the time it is first polled.
pub struct FnResolver {
    func: SyncFieldFn,
}

impl FnResolver {
    /// Wraps a sync function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Box::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

type AsyncFieldFn = Box<
    dyn Fn(Value, ResolverArgs, Context, ResolverInfo) -> ResolverFuture<'static> + Send + Sync,
>;

/// Adapts an async function into a [`Resolver`].
///
/// Inputs are cloned so the produced future owns everything it touches.
pub struct AsyncFnResolver {
    func: AsyncFieldFn,
}

impl AsyncFnResolver {
    /// Wraps an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Box::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        (self.func)(parent.clone(), args.clone(), ctx.clone(), info.clone())
    }
}

/// Default resolver that reads properties off the parent object.
///
/// Looks up the declared field name, then its snake_case spelling. A missing
/// property resolves to null; a non-object parent is an error.
pub struct PropertyResolver;

impl Resolver for PropertyResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let field_name = &info.field_name;
        let result = match parent {
            Value::Object(map) => Ok(map
                .get(field_name)
                .or_else(|| map.get(&to_snake_case(field_name)))
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            _ => Err(ResolverError::FieldNotFound(field_name.clone())),
        };
        Box::pin(async move { result })
    }
}

/// Registry of field resolvers keyed by `Type.field`.
pub struct ResolverMap {
    /// Explicit registrations.
    resolvers: FxHashMap<String, BoxedResolver>,

    /// Fallback used when no registration matches.
    default_resolver: Option<BoxedResolver>,
}

impl ResolverMap {
    /// Creates a new resolver map with [`PropertyResolver`] as the default.
    pub fn new() -> Self {
        Self {
            resolvers: FxHashMap::default(),
            default_resolver: Some(Box::new(PropertyResolver)),
        }
    }

    /// Registers a resolver under `Type.field`.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let (type_name, field_name) = (type_name.into(), field_name.into());
        self.resolvers
            .insert(format!("{type_name}.{field_name}"), Box::new(resolver));
    }

    /// Registers a plain function under `Type.field`.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async function under `Type.field`.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Looks up the resolver for `Type.field`, falling back to the default.
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        self.resolvers
            .get(&format!("{type_name}.{field_name}"))
            .or(self.default_resolver.as_ref())
            .map(|r| r.as_ref())
    }

    /// Replaces the default resolver.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Some(Box::new(resolver));
    }

    /// Drops the default, so lookups return only explicit registrations.
    pub fn remove_default(&mut self) {
        self.default_resolver = None;
    }
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("registered", &self.resolvers.len())
            .field("default", &self.default_resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_args() {
        let mut args = ResolverArgs::new();
        args.set("first", serde_json::json!(10));
        args.set("label", serde_json::json!("inbox"));

        assert_eq!(args.get_as::<i64>("first"), Some(10));
        assert_eq!(args.get_as::<String>("label"), Some("inbox".to_string()));
        assert_eq!(args.get_as::<i64>("missing"), None);
        assert_eq!(args.require::<i64>("first").unwrap(), 10);
        assert!(args.require::<i64>("missing").is_err());
    }

    #[tokio::test]
    async fn test_property_resolver() {
        let resolver = PropertyResolver;
        let parent = serde_json::json!({"name": "Grace", "age": 41});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("name", "Person");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), serde_json::json!("Grace"));
    }

    #[tokio::test]
    async fn test_property_resolver_snake_case_fallback() {
        let resolver = PropertyResolver;
        let parent = serde_json::json!({"first_name": "Alice"});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("firstName", "Person");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), serde_json::json!("Alice"));
    }

    #[tokio::test]
    async fn test_property_resolver_non_object_parent() {
        let resolver = PropertyResolver;
        let parent = serde_json::json!(42);
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("name", "Person");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(
            result.unwrap_err(),
            ResolverError::FieldNotFound("name".to_string())
        );
    }

    #[tokio::test]
    async fn test_fn_resolver() {
        let resolver = FnResolver::new(|_parent, args, _ctx, _info| {
            let id: i64 = args.require("id")?;
            Ok(serde_json::json!({"id": id, "name": "Person"}))
        });

        let parent = serde_json::json!({});
        let mut args = ResolverArgs::new();
        args.set("id", serde_json::json!(42));
        let ctx = Context::new();
        let info = ResolverInfo::new("person", "Query");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(
            result.unwrap(),
            serde_json::json!({"id": 42, "name": "Person"})
        );
    }

    #[tokio::test]
    async fn test_async_fn_resolver() {
        let resolver = AsyncFnResolver::new(|_parent, _args, _ctx, _info| async {
            Ok(serde_json::json!("deferred"))
        });

        let parent = serde_json::json!({});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("value", "Query");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), serde_json::json!("deferred"));
    }

    #[tokio::test]
    async fn test_resolver_map() {
        let mut map = ResolverMap::new();

        map.register_fn("Query", "ping", |_parent, _args, _ctx, _info| {
            Ok(serde_json::json!("pong"))
        });

        let resolver = map.get("Query", "ping").unwrap();
        let parent = serde_json::json!({});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("ping", "Query");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), serde_json::json!("pong"));
    }

    #[tokio::test]
    async fn test_resolver_map_default_fallback() {
        let map = ResolverMap::new();

        // Unregistered fields fall back to the property resolver.
        let resolver = map.get("Person", "name").unwrap();
        let parent = serde_json::json!({"name": "Ada"});
        let args = ResolverArgs::new();
        let ctx = Context::new();
        let info = ResolverInfo::new("name", "Person");

        let result = resolver.resolve(&parent, &args, &ctx, &info).await;
        assert_eq!(result.unwrap(), serde_json::json!("Ada"));
    }

    #[test]
    fn test_resolver_map_remove_default() {
        let mut map = ResolverMap::new();
        map.remove_default();
        assert!(map.get("Person", "name").is_none());
    }

    #[test]
    fn test_resolver_error_from_str() {
        let error: ResolverError = "boom".into();
        assert_eq!(error, ResolverError::Custom("boom".to_string()));
        assert_eq!(error.to_string(), "boom");
    }
}
