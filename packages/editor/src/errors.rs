//! Error types for the editor

use crate::{GridCell, Manager, NodeKey};
use thiserror::Error;
use widgetree_catalog::CatalogError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeKey),

    #[error("Class \"{0}\" not mapped")]
    UnknownClass(String),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Malformed fragment: {0}")]
    MalformedFragment(String),

    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for EditorError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::UnknownClass(classname) => EditorError::UnknownClass(classname),
            other => EditorError::Catalog(other),
        }
    }
}

impl EditorError {
    /// Expected, non-fatal outcome of an edit (the tree is unchanged)
    pub fn is_rejection(&self) -> bool {
        matches!(self, EditorError::Rejected(_) | EditorError::CycleDetected)
    }
}

/// Reason an edit was refused by the validator, the identifier authority,
/// or the layout coordinator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Allowed children: {}.", .allowed.join(", "))]
    ChildNotAllowed { parent: String, child: String, allowed: Vec<String> },

    #[error("Only {max} children allowed for {parent}")]
    TooManyChildren { parent: String, max: usize },

    #[error("{parent} not allowed as parent of {child}")]
    ParentNotAllowed { parent: String, child: String },

    #[error("Not allowed, {parent} is not a container.")]
    NotAContainer { parent: String },

    #[error("{child} not allowed at root level")]
    NotAllowedAtRoot { child: String },

    #[error("Not allowed at root level, {child} is not a container.")]
    RootRequiresContainer { child: String },

    #[error("Name \"{0}\" is already in use")]
    NameInUse(String),

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Layout manager {requested} conflicts with {siblings} used by siblings")]
    ManagerConflict { requested: Manager, siblings: Manager },

    #[error("Grid cell ({}, {}) is already occupied", .0.row, .0.column)]
    CellOccupied(GridCell),

    #[error("Grid {name} must be a non-negative number, got \"{value}\"")]
    InvalidGridIndex { name: String, value: String },

    #[error("No free grid row left below row {0}")]
    GridFull(u32),

    #[error("Selection spans more than one parent")]
    MixedParents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        let r = Rejection::ChildNotAllowed {
            parent: "ttk.Notebook".into(),
            child: "ttk.Button".into(),
            allowed: vec!["ttk.Notebook.Tab".into()],
        };
        assert_eq!(r.to_string(), "Allowed children: ttk.Notebook.Tab.");

        let r = Rejection::CellOccupied(GridCell::new(2, 0));
        assert_eq!(r.to_string(), "Grid cell (2, 0) is already occupied");

        let r = Rejection::InvalidGridIndex { name: "row".into(), value: "two".into() };
        assert_eq!(r.to_string(), "Grid row must be a non-negative number, got \"two\"");
    }

    #[test]
    fn test_unknown_class_from_catalog() {
        let err: EditorError = CatalogError::UnknownClass("x.Y".into()).into();
        assert!(matches!(err, EditorError::UnknownClass(ref c) if c == "x.Y"));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_rejection_is_non_fatal() {
        let err: EditorError = Rejection::EmptyName.into();
        assert!(err.is_rejection());
    }
}
