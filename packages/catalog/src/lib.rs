//! # Widgetree Catalog
//!
//! Read-only lookup from a component class name to its structural
//! constraints and default values.
//!
//! The catalog is plain data: the structural validator and the identifier
//! authority in `widgetree-editor` are pure functions over it, so toolkits
//! are added by shipping a JSON file rather than code.
//!
//! ```json
//! {
//!   "components": [
//!     { "classname": "ttk.Frame", "container": true },
//!     { "classname": "ttk.Button", "commandProperties": ["command"] }
//!   ]
//! }
//! ```

mod component;
mod error;

pub use component::{ComponentSpec, ROOT_PARENT};
pub use error::CatalogError;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error};

const TK_CATALOG: &str = include_str!("../data/tk.json");

/// On-disk catalog format
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

/// Component catalog keyed by class name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    specs: HashMap<String, ComponentSpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of specs, rejecting duplicate class names
    pub fn from_specs(specs: impl IntoIterator<Item = ComponentSpec>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.register(spec)?;
        }
        Ok(catalog)
    }

    /// Parse a catalog from its JSON form
    pub fn from_json(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(source)?;
        let catalog = Self::from_specs(file.components)?;
        debug!(components = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Bundled catalog of the standard Tk / ttk classes
    pub fn tk() -> Self {
        match Self::from_json(TK_CATALOG) {
            Ok(catalog) => catalog,
            Err(err) => {
                error!(error = %err, "Bundled Tk catalog is invalid");
                Self::default()
            }
        }
    }

    /// Add a component spec
    pub fn register(&mut self, spec: ComponentSpec) -> Result<(), CatalogError> {
        if self.specs.contains_key(&spec.classname) {
            return Err(CatalogError::DuplicateClass(spec.classname));
        }
        self.specs.insert(spec.classname.clone(), spec);
        Ok(())
    }

    pub fn get(&self, classname: &str) -> Option<&ComponentSpec> {
        self.specs.get(classname)
    }

    /// Look up a class, failing for unmapped names
    pub fn require(&self, classname: &str) -> Result<&ComponentSpec, CatalogError> {
        self.get(classname)
            .ok_or_else(|| CatalogError::UnknownClass(classname.to_string()))
    }

    pub fn contains(&self, classname: &str) -> bool {
        self.specs.contains_key(classname)
    }

    /// Base name for generated identifiers; unmapped classes fall back to
    /// the last dot-separated segment.
    pub fn short_name<'a>(&'a self, classname: &'a str) -> &'a str {
        match self.get(classname) {
            Some(spec) => spec.short_name(),
            None => classname.rsplit('.').next().unwrap_or(classname),
        }
    }

    pub fn is_tkvar_property(&self, classname: &str, property: &str) -> bool {
        self.get(classname)
            .map_or(false, |spec| spec.is_tkvar_property(property))
    }

    pub fn is_command_property(&self, classname: &str, property: &str) -> bool {
        self.get(classname)
            .map_or(false, |spec| spec.is_command_property(property))
    }

    /// All class names, sorted
    pub fn classnames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = Catalog::from_json(TK_CATALOG).unwrap();
        assert!(catalog.len() > 10);
        assert!(catalog.contains("ttk.Frame"));
        assert!(catalog.contains("tk.Menu"));
    }

    #[test]
    fn test_bundled_menu_is_root_only_or_menubutton() {
        let catalog = Catalog::tk();
        let menu = catalog.require("tk.Menu").unwrap();

        assert!(menu.allowed_at_root());
        assert!(!menu.accepts_parent("ttk.Frame"));
        assert!(menu.accepts_parent("ttk.Menubutton"));
        assert!(menu.menu);
        assert!(!menu.layout_required);
    }

    #[test]
    fn test_require_unknown_class() {
        let catalog = Catalog::tk();
        let err = catalog.require("qt.QWidget").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownClass(ref c) if c == "qt.QWidget"));
        assert_eq!(err.to_string(), "Class \"qt.QWidget\" not mapped");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = Catalog::from_specs(vec![
            ComponentSpec::new("Frame").container(),
            ComponentSpec::new("Frame"),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateClass(_))));
    }

    #[test]
    fn test_namespace_property_lookup() {
        let catalog = Catalog::tk();
        assert!(catalog.is_command_property("ttk.Button", "command"));
        assert!(catalog.is_tkvar_property("ttk.Entry", "textvariable"));
        assert!(!catalog.is_tkvar_property("ttk.Entry", "text"));
        assert!(!catalog.is_command_property("unknown.Class", "command"));
    }

    #[test]
    fn test_short_name_for_unmapped_class() {
        let catalog = Catalog::new();
        assert_eq!(catalog.short_name("custom.Gauge"), "Gauge");
    }

    #[test]
    fn test_classnames_sorted() {
        let catalog = Catalog::from_specs(vec![
            ComponentSpec::new("b.Second"),
            ComponentSpec::new("a.First"),
        ])
        .unwrap();
        assert_eq!(catalog.classnames(), vec!["a.First", "b.Second"]);
    }
}
