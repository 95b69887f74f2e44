//! # Widgetree Editor
//!
//! Document engine for a visual widget-tree designer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ catalog: classname → structural constraints │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document + EditSession              │
//! │  - Tree store (slotmap arena)               │
//! │  - Structural validator                     │
//! │  - Identifier authority (shared namespace)  │
//! │  - Layout coordinator                       │
//! │  - Clipboard / duplicate transaction        │
//! │  - Filter engine (visible projection)       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: panels, preview, save (via events)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: the filtered view is derived
//! 2. **Validate, then commit**: a rejected edit leaves no trace
//! 3. **Data-only catalog**: constraints are looked up, not dispatched
//! 4. **No global hooks**: name validation borrows the live document
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use widgetree_catalog::Catalog;
//! use widgetree_editor::{EditSession, EditorConfig};
//!
//! let mut session = EditSession::new(Arc::new(Catalog::tk()), EditorConfig::default());
//!
//! let frame = session.add_widget("ttk.Frame")?;
//! session.add_widget("ttk.Button")?;
//!
//! session.set_selection(vec![frame]);
//! session.duplicate()?;
//!
//! let saved = session.to_document(None)?;
//! for event in session.take_events() {
//!     // redraw, refresh panels, update title bar...
//! }
//! ```

mod clipboard;
mod config;
mod document;
mod errors;
mod events;
mod filter;
mod fragment;
mod layout;
mod mutations;
mod namespace;
mod node;
mod session;
mod validator;

pub use clipboard::{MemoryClipboard, PasteOutcome, Transport};
pub use config::{EditorConfig, NamingSeparator, DEFAULT_CONFIG_NAME};
pub use document::{Document, Node, NodeKey, Placement};
pub use errors::{EditorError, Rejection};
pub use events::EditorEvent;
pub use filter::{matches as filter_matches, Detached, FilterState};
pub use fragment::{Fragment, FragmentCodec, JsonCodec, WidgetDef};
pub use layout::{ContainerInfo, Direction, Layout};
pub use mutations::Mutation;
pub use namespace::{
    command_name, variable_name, widget_names, IdCounter, NameKind, Namespace,
};
pub use node::{Binding, GridCell, Manager, Properties, Property, WidgetData};
pub use session::{EditContext, EditSession};
pub use validator::{check_constraints, Validator};

// Re-export the catalog for convenience
pub use widgetree_catalog::{Catalog, CatalogError, ComponentSpec};
