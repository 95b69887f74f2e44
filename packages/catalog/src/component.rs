//! # Component Specs
//!
//! Data-only description of a widget class: where it may live in the tree,
//! what it may contain, and which of its properties reference names in the
//! shared namespace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token used in `allowed_parents` to mean "top level of the document"
pub const ROOT_PARENT: &str = "root";

/// Structural constraints and defaults for one component class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Fully qualified class name (e.g. `ttk.Button`)
    pub classname: String,

    /// Base name used for generated identifiers (defaults to the last
    /// dot-separated segment of `classname`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Whether instances may hold children
    #[serde(default)]
    pub container: bool,

    /// Classes allowed as parent. `None` means unrestricted; the `root`
    /// token allows top-level placement. An empty list means root only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_parents: Option<Vec<String>>,

    /// Classes allowed as children. `None` (or empty) means no explicit set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_children: Option<Vec<String>>,

    /// Maximum number of children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_children: Option<usize>,

    /// Whether the node is positioned by a layout manager at all
    /// (menus and menu items are not)
    #[serde(default = "default_layout_required")]
    pub layout_required: bool,

    /// Listed by the designer as a top-level menu rather than a window
    #[serde(default)]
    pub menu: bool,

    /// Properties whose value is a variable binding (`type:name` or `name`)
    #[serde(default)]
    pub tkvar_properties: Vec<String>,

    /// Properties whose value is a JSON encoded command reference
    #[serde(default)]
    pub command_properties: Vec<String>,

    /// Property defaults applied to new instances. `{id}` is replaced by
    /// the instance identifier.
    #[serde(default)]
    pub default_properties: BTreeMap<String, String>,

    /// Layout defaults applied to new instances
    #[serde(default)]
    pub default_layout: BTreeMap<String, String>,
}

fn default_layout_required() -> bool {
    true
}

impl ComponentSpec {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            short_name: None,
            container: false,
            allowed_parents: None,
            allowed_children: None,
            max_children: None,
            layout_required: true,
            menu: false,
            tkvar_properties: Vec::new(),
            command_properties: Vec::new(),
            default_properties: BTreeMap::new(),
            default_layout: BTreeMap::new(),
        }
    }

    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    pub fn with_allowed_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_parents = Some(parents.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_allowed_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_children = Some(children.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_children(mut self, max: usize) -> Self {
        self.max_children = Some(max);
        self
    }

    pub fn with_tkvar_property(mut self, name: impl Into<String>) -> Self {
        self.tkvar_properties.push(name.into());
        self
    }

    pub fn with_command_property(mut self, name: impl Into<String>) -> Self {
        self.command_properties.push(name.into());
        self
    }

    pub fn with_default_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_properties.insert(name.into(), value.into());
        self
    }

    pub fn without_layout(mut self) -> Self {
        self.layout_required = false;
        self
    }

    /// Base name for generated identifiers
    pub fn short_name(&self) -> &str {
        match &self.short_name {
            Some(name) => name,
            None => self
                .classname
                .rsplit('.')
                .next()
                .unwrap_or(&self.classname),
        }
    }

    /// Explicit child whitelist, if one is declared
    pub fn explicit_children(&self) -> Option<&[String]> {
        match &self.allowed_children {
            Some(children) if !children.is_empty() => Some(children),
            _ => None,
        }
    }

    /// Whether this class may be placed at the top level
    pub fn allowed_at_root(&self) -> bool {
        match &self.allowed_parents {
            Some(parents) => parents.is_empty() || parents.iter().any(|p| p == ROOT_PARENT),
            None => self.container,
        }
    }

    /// Whether `parent_class` is an acceptable parent (ignores root)
    pub fn accepts_parent(&self, parent_class: &str) -> bool {
        match &self.allowed_parents {
            Some(parents) => parents.iter().any(|p| p == parent_class),
            None => true,
        }
    }

    pub fn is_tkvar_property(&self, name: &str) -> bool {
        self.tkvar_properties.iter().any(|p| p == name)
    }

    pub fn is_command_property(&self, name: &str) -> bool {
        self.command_properties.iter().any(|p| p == name)
    }
}
