//! Schema definition for graphwalk.

use crate::abstract_type::TypeResolver;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A GraphQL schema: the named-type registry plus the operation roots.
///
/// Schemas are immutable once built and shared across requests.
#[derive(Clone, Default)]
pub struct Schema {
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
    type_resolvers: FxHashMap<String, Arc<dyn TypeResolver>>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Gets an object type by name.
    pub fn get_object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Returns the query root object, if configured.
    pub fn query_root(&self) -> Option<&ObjectDef> {
        self.get_object(self.query_type.as_deref()?)
    }

    /// Returns the mutation root object, if configured.
    pub fn mutation_root(&self) -> Option<&ObjectDef> {
        self.get_object(self.mutation_type.as_deref()?)
    }

    /// Returns the registered type resolver for an abstract type.
    pub fn type_resolver(&self, name: &str) -> Option<&dyn TypeResolver> {
        self.type_resolvers.get(name).map(Arc::as_ref)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Whether `object` is a valid concrete type for the named abstract type.
    pub fn is_possible_type(&self, abstract_name: &str, object: &ObjectDef) -> bool {
        match self.types.get(abstract_name) {
            Some(TypeDef::Interface(_)) => {
                object.implements.iter().any(|name| name == abstract_name)
            }
            Some(TypeDef::Union(union)) => union.members.iter().any(|name| *name == object.name),
            _ => false,
        }
    }

    /// Whether a fragment with the given type condition applies to `object`.
    ///
    /// A condition applies on an exact name match, when `object` implements
    /// the named interface, or when `object` is a member of the named union.
    pub fn fragment_applies(&self, type_condition: &str, object: &ObjectDef) -> bool {
        type_condition == object.name || self.is_possible_type(type_condition, object)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field(
                "type_resolvers",
                &self.type_resolvers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The kind of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

/// A type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    /// Returns the type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(def) => &def.name,
            Self::Object(def) => &def.name,
            Self::Interface(def) => &def.name,
            Self::Union(def) => &def.name,
            Self::Enum(def) => &def.name,
            Self::InputObject(def) => &def.name,
        }
    }

    /// Returns the type kind.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Object(_) => TypeKind::Object,
            Self::Interface(_) => TypeKind::Interface,
            Self::Union(_) => TypeKind::Union,
            Self::Enum(_) => TypeKind::Enum,
            Self::InputObject(_) => TypeKind::InputObject,
        }
    }

    /// Whether the type is an interface or a union.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }
}

/// Scalar type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
}

impl ScalarDef {
    /// Creates a new scalar definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Object type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

impl ObjectDef {
    /// Creates a new object definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            implements: Vec::new(),
        }
    }

    /// Adds a field.
    pub fn add_field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Declares an implemented interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    /// Gets a field definition by declared name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }
}

/// Interface type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

impl InterfaceDef {
    /// Creates a new interface definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Adds a field.
    pub fn add_field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// Union type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

impl UnionDef {
    /// Creates a new union definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
        }
    }

    /// Adds a member object type.
    pub fn add_member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }
}

/// Enum type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

impl EnumDef {
    /// Creates a new enum definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: Vec::new(),
        }
    }

    /// Adds a value.
    pub fn add_value(mut self, name: impl Into<String>) -> Self {
        self.values.push(EnumValueDef {
            name: name.into(),
            description: None,
        });
        self
    }

    /// Whether the enum declares the given value name.
    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|value| value.name == name)
    }
}

/// Enum value definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
}

/// Input object type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
}

impl InputObjectDef {
    /// Creates a new input object definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Adds an input field.
    pub fn add_field(mut self, field: InputValueDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// Field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
}

impl FieldDef {
    /// Creates a new field definition.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
        }
    }

    /// Adds an argument.
    pub fn add_argument(mut self, argument: InputValueDef) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }
}

/// Input value definition: an argument or an input object field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<serde_json::Value>,
}

impl InputValueDef {
    /// Creates a new input value definition.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Type reference: a named type with optional list and non-null wrappers.
///
/// Types are nullable unless wrapped in `NonNull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Returns the innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    /// Whether the outermost wrapper is non-null.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strips an outermost non-null wrapper, if present.
    pub fn unwrap_non_null(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Schema builder.
#[derive(Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        let mut builder = Self::default();
        // Add built-in scalars
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            builder.schema.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: Some(format!("Built-in {name} scalar")),
                }),
            );
        }
        builder
    }

    /// Sets the query root type.
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.schema.query_type = Some(name.into());
        self
    }

    /// Sets the mutation root type.
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.schema.mutation_type = Some(name.into());
        self
    }

    /// Adds a type.
    pub fn add_type(mut self, type_def: TypeDef) -> Self {
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Registers a type resolver for an abstract type.
    pub fn type_resolver(
        mut self,
        type_name: impl Into<String>,
        resolver: impl TypeResolver + 'static,
    ) -> Self {
        self.schema
            .type_resolvers
            .insert(type_name.into(), Arc::new(resolver));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("schema", &self.schema)
            .finish()
    }
}
