//! # Fragments
//!
//! Serialized subtrees. The same form carries clipboard content, the
//! duplicate holding value and whole saved documents:
//!
//! ```json
//! {
//!   "author": "...",
//!   "widgets": [
//!     { "class": "ttk.Frame", "id": "frame1", "manager": "pack",
//!       "children": [ { "class": "ttk.Label", "id": "label1" } ] }
//!   ]
//! }
//! ```
//!
//! The text form is produced by a [`FragmentCodec`], so another
//! UI-definition format can be plugged in without touching the engine.

use crate::namespace::widget_names;
use crate::{EditorError, NameKind, WidgetData};
use serde::{Deserialize, Serialize};
use widgetree_catalog::Catalog;

/// A widget together with its whole subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDef {
    #[serde(flatten)]
    pub widget: WidgetData,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WidgetDef>,
}

impl WidgetDef {
    pub fn leaf(widget: WidgetData) -> Self {
        Self {
            widget,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: WidgetDef) -> Self {
        self.children.push(child);
        self
    }

    /// Number of widgets in the subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(WidgetDef::count).sum::<usize>()
    }

    /// Visit the subtree in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a WidgetDef)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut WidgetDef)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Every name the subtree contributes to the shared namespace, in
    /// pre-order
    pub fn collect_names(&self, catalog: &Catalog, out: &mut Vec<(NameKind, String)>) {
        self.walk(&mut |def| out.extend(widget_names(catalog, &def.widget)));
    }

    /// Fail on the first class the catalog does not know
    pub fn check_classes(&self, catalog: &Catalog) -> Result<(), EditorError> {
        let mut unknown = None;
        self.walk(&mut |def| {
            if unknown.is_none() && !catalog.contains(&def.widget.classname) {
                unknown = Some(def.widget.classname.clone());
            }
        });
        match unknown {
            Some(classname) => Err(EditorError::UnknownClass(classname)),
            None => Ok(()),
        }
    }
}

/// Serialized set of subtrees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default)]
    pub widgets: Vec<WidgetDef>,
}

impl Fragment {
    pub fn new(author: Option<String>, widgets: Vec<WidgetDef>) -> Self {
        Self { author, widgets }
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn check_classes(&self, catalog: &Catalog) -> Result<(), EditorError> {
        self.widgets.iter().try_for_each(|def| def.check_classes(catalog))
    }
}

/// Text form of fragments
pub trait FragmentCodec: std::fmt::Debug {
    fn encode(&self, fragment: &Fragment) -> Result<String, EditorError>;

    /// Parse text into a fragment. Foreign or malformed content is an
    /// [`EditorError::MalformedFragment`].
    fn decode(&self, text: &str) -> Result<Fragment, EditorError>;
}

/// Default codec (pretty-printed JSON)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl FragmentCodec for JsonCodec {
    fn encode(&self, fragment: &Fragment) -> Result<String, EditorError> {
        serde_json::to_string_pretty(fragment).map_err(|e| EditorError::MalformedFragment(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<Fragment, EditorError> {
        if text.trim().is_empty() {
            return Err(EditorError::MalformedFragment("empty content".to_string()));
        }
        serde_json::from_str(text).map_err(|e| EditorError::MalformedFragment(e.to_string()))
    }
}
