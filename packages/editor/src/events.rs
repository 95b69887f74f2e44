//! Notifications raised by the engine.
//!
//! Events are queued in the order they happen and drained by the host
//! with [`EditSession::take_events`](crate::EditSession::take_events).
//! Deferred focus changes (`Reveal`) are queued after the events of the
//! mutation that caused them.

use crate::{GridCell, NodeKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A node's label or layout changed
    NodeChanged {
        key: NodeKey,
        label: String,
        cell: Option<GridCell>,
    },

    /// The document was modified, saved, replaced or cleared
    DocumentChanged { dirty: bool },

    /// The preview of a top-level window must be redrawn (`None` = all)
    Redraw { toplevel: Option<NodeKey> },

    /// Scroll to and focus a node
    Reveal { key: NodeKey },

    /// Populate the edit panels with a node
    Edit { key: NodeKey },

    /// Clear the edit panels
    EditorHidden,
}

impl EditorEvent {
    pub fn is_document_changed(&self) -> bool {
        matches!(self, EditorEvent::DocumentChanged { .. })
    }
}
