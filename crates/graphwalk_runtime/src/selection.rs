//! Selection-set collection and merging.
//!
//! Flattens fragment spreads and inline fragments against a concrete object
//! type and groups fields by response key, preserving first-occurrence
//! document order.

use crate::error::RequestError;
use crate::naming::FieldNameConverter;
use crate::schema::{ObjectDef, Schema};
use graphwalk_document::{Document, InputValue, Selection};
use indexmap::IndexMap;

/// A response-key group produced by collecting a selection set.
#[derive(Debug)]
pub struct CollectedField<'a> {
    /// The response key: alias verbatim, otherwise the converted field name.
    pub response_key: String,
    /// The declared field name.
    pub name: &'a str,
    /// Arguments of the first occurrence.
    pub arguments: &'a [(String, InputValue)],
    /// Unioned sub-selections of every merged occurrence, document order.
    pub selections: Vec<&'a Selection>,
}

/// Collects a selection set against a concrete object type.
///
/// Fragments whose type conditions are compatible with `object` are
/// flattened in place; incompatible ones contribute nothing. Repeated
/// response keys merge into one group that unions their sub-selections.
pub fn collect_fields<'a>(
    document: &'a Document,
    schema: &Schema,
    object: &ObjectDef,
    selections: &[&'a Selection],
    converter: &dyn FieldNameConverter,
) -> Result<Vec<CollectedField<'a>>, RequestError> {
    let mut grouped = IndexMap::new();
    let mut spread_path = Vec::new();
    collect_into(
        document,
        schema,
        object,
        selections,
        converter,
        &mut spread_path,
        &mut grouped,
    )?;
    Ok(grouped.into_values().collect())
}

fn collect_into<'a>(
    document: &'a Document,
    schema: &Schema,
    object: &ObjectDef,
    selections: &[&'a Selection],
    converter: &dyn FieldNameConverter,
    spread_path: &mut Vec<&'a str>,
    grouped: &mut IndexMap<String, CollectedField<'a>>,
) -> Result<(), RequestError> {
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                let response_key = match &field.alias {
                    Some(alias) => alias.clone(),
                    None => converter.convert(&field.name),
                };
                match grouped.get_mut(&response_key) {
                    Some(existing) => {
                        // Same key, same declared field: union the
                        // sub-selections. A conflicting declared name is
                        // dropped; validation rejects such documents.
                        if existing.name == field.name {
                            existing.selections.extend(field.selections.iter());
                        }
                    }
                    None => {
                        grouped.insert(
                            response_key.clone(),
                            CollectedField {
                                response_key,
                                name: field.name.as_str(),
                                arguments: &field.arguments,
                                selections: field.selections.iter().collect(),
                            },
                        );
                    }
                }
            }
            Selection::FragmentSpread(name) => {
                let Some(fragment) = document.fragment(name) else {
                    // Unknown fragments contribute nothing.
                    continue;
                };
                if schema.fragment_applies(&fragment.type_condition, object) {
                    if spread_path.iter().any(|seen| seen == name) {
                        return Err(RequestError::FragmentCycle(name.clone()));
                    }
                    spread_path.push(name.as_str());
                    let nested: Vec<&Selection> = fragment.selections.iter().collect();
                    collect_into(
                        document,
                        schema,
                        object,
                        &nested,
                        converter,
                        spread_path,
                        grouped,
                    )?;
                    spread_path.pop();
                }
            }
            Selection::InlineFragment(fragment) => {
                let applies = match &fragment.type_condition {
                    Some(condition) => schema.fragment_applies(condition, object),
                    None => true,
                };
                if applies {
                    let nested: Vec<&Selection> = fragment.selections.iter().collect();
                    collect_into(
                        document,
                        schema,
                        object,
                        &nested,
                        converter,
                        spread_path,
                        grouped,
                    )?;
                }
            }
        }
    }
    Ok(())
}
