//! Operation, selection and fragment definitions.

use crate::value::InputValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A validated, executable document.
///
/// Operations keep document order. Fragments are keyed by name and shared
/// by every operation in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub operations: Vec<OperationDefinition>,
    pub fragments: IndexMap<String, FragmentDefinition>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation.
    pub fn with_operation(mut self, operation: OperationDefinition) -> Self {
        self.operations.push(operation);
        self
    }

    /// Adds a named fragment.
    pub fn with_fragment(mut self, fragment: FragmentDefinition) -> Self {
        self.fragments.insert(fragment.name.clone(), fragment);
        self
    }

    /// Looks up a fragment by name.
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments.get(name)
    }
}

/// The kind of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// A single operation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub selections: Vec<Selection>,
}

impl OperationDefinition {
    /// Creates an anonymous query operation.
    pub fn query() -> Self {
        Self {
            kind: OperationKind::Query,
            name: None,
            selections: Vec::new(),
        }
    }

    /// Creates an anonymous mutation operation.
    pub fn mutation() -> Self {
        Self {
            kind: OperationKind::Mutation,
            name: None,
            selections: Vec::new(),
        }
    }

    /// Names the operation.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a top-level selection.
    pub fn with_selection(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }
}

/// A named fragment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDefinition {
    pub name: String,
    /// The type the fragment applies to (object, interface or union name).
    pub type_condition: String,
    pub selections: Vec<Selection>,
}

impl FragmentDefinition {
    /// Creates a fragment on the given type condition.
    pub fn new(name: impl Into<String>, type_condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_condition: type_condition.into(),
            selections: Vec::new(),
        }
    }

    /// Adds a selection.
    pub fn with_selection(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }
}

/// A single selection within a selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    Field(FieldSelection),
    FragmentSpread(String),
    InlineFragment(InlineFragment),
}

impl From<FieldSelection> for Selection {
    fn from(field: FieldSelection) -> Self {
        Self::Field(field)
    }
}

impl From<InlineFragment> for Selection {
    fn from(fragment: InlineFragment) -> Self {
        Self::InlineFragment(fragment)
    }
}

/// A field selection, optionally aliased and carrying sub-selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub selections: Vec<Selection>,
}

impl FieldSelection {
    /// Creates a selection of the given field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            selections: Vec::new(),
        }
    }

    /// Aliases the field in the response.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an argument.
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    /// Adds a sub-selection.
    pub fn with_selection(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }
}

/// An inline fragment, optionally constrained to a type condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub selections: Vec<Selection>,
}

impl InlineFragment {
    /// Creates an inline fragment without a type condition.
    pub fn new() -> Self {
        Self {
            type_condition: None,
            selections: Vec::new(),
        }
    }

    /// Creates an inline fragment constrained to the given type.
    pub fn on(type_condition: impl Into<String>) -> Self {
        Self {
            type_condition: Some(type_condition.into()),
            selections: Vec::new(),
        }
    }

    /// Adds a selection.
    pub fn with_selection(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }
}

impl Default for InlineFragment {
    fn default() -> Self {
        Self::new()
    }
}
