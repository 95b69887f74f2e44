//! # Widget Mutations
//!
//! Edits made through the property, layout and binding panels. Each
//! mutation targets one node and is routed through the document so the
//! namespace and layout invariants are checked before anything changes.
//!
//! ## Mutation Semantics
//!
//! ### SetIdentifier
//! - Rejected when empty or already used by another widget or name
//!
//! ### SetProperty
//! - Variable and command properties are checked against the shared
//!   namespace; reusing a variable or command of the same kind is allowed
//!
//! ### SetLayoutProperty
//! - Moving a grid widget onto a cell already used by a sibling is rejected
//! - `row` and `column` must be non-negative integers
//!
//! ### SetManager
//! - Rejected when it clashes with the siblings' manager, unless `place`
//!
//! ### AddBinding
//! - The handler name is checked against the shared namespace

use crate::{Binding, Document, EditorError, Manager, NodeKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetIdentifier {
        key: NodeKey,
        identifier: String,
    },

    SetProperty {
        key: NodeKey,
        name: String,
        value: String,
    },

    RemoveProperty {
        key: NodeKey,
        name: String,
    },

    SetLayoutProperty {
        key: NodeKey,
        name: String,
        value: String,
    },

    RemoveLayoutProperty {
        key: NodeKey,
        name: String,
    },

    SetManager {
        key: NodeKey,
        manager: Manager,
    },

    AddBinding {
        key: NodeKey,
        binding: Binding,
    },

    /// Remove the binding at `index`
    RemoveBinding {
        key: NodeKey,
        index: usize,
    },
}

impl Mutation {
    /// Node the mutation edits
    pub fn target(&self) -> NodeKey {
        match self {
            Mutation::SetIdentifier { key, .. }
            | Mutation::SetProperty { key, .. }
            | Mutation::RemoveProperty { key, .. }
            | Mutation::SetLayoutProperty { key, .. }
            | Mutation::RemoveLayoutProperty { key, .. }
            | Mutation::SetManager { key, .. }
            | Mutation::AddBinding { key, .. }
            | Mutation::RemoveBinding { key, .. } => *key,
        }
    }

    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), EditorError> {
        match self {
            Mutation::SetIdentifier { key, identifier } => doc.set_identifier(*key, identifier),

            Mutation::SetProperty { key, name, value } => doc.set_property(*key, name, value),

            Mutation::RemoveProperty { key, name } => doc.remove_property(*key, name),

            Mutation::SetLayoutProperty { key, name, value } => {
                doc.set_layout_property(*key, name, value)
            }

            Mutation::RemoveLayoutProperty { key, name } => doc.remove_layout_property(*key, name),

            Mutation::SetManager { key, manager } => doc.set_manager(*key, *manager),

            Mutation::AddBinding { key, binding } => {
                let mut bindings = doc.node(*key)?.data().bindings.clone();
                bindings.push(binding.clone());
                doc.set_bindings(*key, bindings)
            }

            Mutation::RemoveBinding { key, index } => {
                let mut bindings = doc.node(*key)?.data().bindings.clone();
                if *index < bindings.len() {
                    bindings.remove(*index);
                }
                doc.set_bindings(*key, bindings)
            }
        }
    }
}
