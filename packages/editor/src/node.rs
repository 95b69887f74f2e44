//! # Widget Records
//!
//! The data carried by every node of the document tree. Tree structure
//! (parent / children) lives in the [`Document`](crate::Document) arena;
//! a [`WidgetData`] only describes the widget itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layout strategy positioning a widget inside its parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manager {
    Grid,
    #[default]
    Pack,
    Place,
}

impl Manager {
    pub const ALL: [Manager; 3] = [Manager::Grid, Manager::Pack, Manager::Place];

    pub fn as_str(&self) -> &'static str {
        match self {
            Manager::Grid => "grid",
            Manager::Pack => "pack",
            Manager::Place => "place",
        }
    }
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Manager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Manager::Grid),
            "pack" => Ok(Manager::Pack),
            "place" => Ok(Manager::Place),
            other => Err(format!("Unknown layout manager: {}", other)),
        }
    }
}

/// A single name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// Insertion-ordered property list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Vec<Property>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Set a value, keeping the original position of an existing entry
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Property { name, value }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|p| p.name == name)?;
        Some(self.0.remove(pos).value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|p| (p.name.as_str(), p.value.as_str()))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (name, value) in iter {
            props.set(name, value);
        }
        props
    }
}

/// Event binding: an event sequence routed to a named handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub sequence: String,
    pub handler: String,
    #[serde(default)]
    pub add: bool,
}

impl Binding {
    pub fn new(sequence: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            handler: handler.into(),
            add: false,
        }
    }
}

/// Grid coordinates of a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: u32,
    pub column: u32,
}

impl GridCell {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Widget description stored in each tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
    #[serde(rename = "class")]
    pub classname: String,

    #[serde(rename = "id")]
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,

    #[serde(default)]
    pub manager: Manager,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub layout: Properties,

    /// Manager enforced on this widget's own children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_manager: Option<Manager>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
}

impl WidgetData {
    pub fn new(classname: impl Into<String>, identifier: impl Into<String>, manager: Manager) -> Self {
        Self {
            classname: classname.into(),
            identifier: identifier.into(),
            properties: Properties::new(),
            manager,
            layout: Properties::new(),
            container_manager: None,
            bindings: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(name, value);
        self
    }

    pub fn with_cell(mut self, row: u32, column: u32) -> Self {
        self.set_cell(GridCell::new(row, column));
        self
    }

    pub fn with_binding(mut self, sequence: impl Into<String>, handler: impl Into<String>) -> Self {
        self.bindings.push(Binding::new(sequence, handler));
        self
    }

    /// Tree label, `"{identifier}: {classname}"`
    pub fn label(&self) -> String {
        format!("{}: {}", self.identifier, self.classname)
    }

    pub fn row(&self) -> Option<u32> {
        self.layout.get("row").and_then(|v| v.trim().parse().ok())
    }

    pub fn column(&self) -> Option<u32> {
        self.layout.get("column").and_then(|v| v.trim().parse().ok())
    }

    /// Grid coordinates, only for grid-managed widgets
    pub fn cell(&self) -> Option<GridCell> {
        if self.manager != Manager::Grid {
            return None;
        }
        Some(GridCell::new(self.row()?, self.column()?))
    }

    pub fn set_cell(&mut self, cell: GridCell) {
        self.layout.set("row", cell.row.to_string());
        self.layout.set("column", cell.column.to_string());
    }

    pub fn clear_cell(&mut self) {
        self.layout.remove("row");
        self.layout.remove("column");
    }
}
