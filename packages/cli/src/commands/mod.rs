pub mod check;
pub mod init;
pub mod tree;

pub use check::{check, CheckArgs};
pub use init::{init, InitArgs};
pub use tree::{tree, TreeArgs};

use anyhow::{Context, Result};
use std::path::Path;
use widgetree_catalog::Catalog;

/// UI-definition file extension
pub const DOCUMENT_EXTENSION: &str = "wtree";

/// Catalog from `path`, or the built-in Tk catalog
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Cannot load catalog {}", path.display())),
        None => Ok(Catalog::tk()),
    }
}
