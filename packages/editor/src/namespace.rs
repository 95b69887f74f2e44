//! # Identifier Authority
//!
//! Widget identifiers, variable names, command names and event-handler
//! names share one namespace: a name used by one kind may not be used by
//! another, and no two widgets may share an identifier.
//!
//! There is no registry to keep in sync. [`Namespace`] is a borrowed view of
//! the live [`Document`] and answers every question by walking the tree, so
//! removing a subtree releases its names immediately. Property editors that
//! validate names as the user types are handed a `Namespace` instead of
//! reaching for a global hook.

use crate::config::{EditorConfig, NamingSeparator};
use crate::{Document, NodeKey, Rejection, WidgetData};
use std::collections::HashMap;
use tracing::debug;
use widgetree_catalog::Catalog;

/// Which part of the shared namespace a name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Identifier,
    Variable,
    Command,
    Handler,
}

/// Variable name from a binding value (`type:name` or bare `name`)
pub fn variable_name(value: &str) -> &str {
    match value.split_once(':') {
        Some((_, name)) => name,
        None => value,
    }
}

/// Command name from a command property value.
///
/// Commands are stored as a JSON object whose `value` member is the
/// callback name. Plain strings are accepted as the name itself.
pub fn command_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') {
        return match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(json) => json
                .get("value")
                .and_then(|v| v.as_str())
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            Err(err) => {
                debug!(value, error = %err, "Unparsable command property");
                None
            }
        };
    }
    Some(trimmed.to_string())
}

/// Rewrite a variable binding value to use `new_name`, keeping its type prefix
pub fn rename_variable(value: &str, new_name: &str) -> String {
    match value.split_once(':') {
        Some((vtype, _)) => format!("{}:{}", vtype, new_name),
        None => new_name.to_string(),
    }
}

/// Rewrite a command property value to call `new_name`
pub fn rename_command(value: &str, new_name: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('{') {
        if let Ok(mut json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(obj) = json.as_object_mut() {
                obj.insert("value".to_string(), serde_json::Value::String(new_name.to_string()));
                return json.to_string();
            }
        }
    }
    new_name.to_string()
}

/// Every name a widget contributes to the shared namespace
pub fn widget_names(catalog: &Catalog, data: &WidgetData) -> Vec<(NameKind, String)> {
    let mut names = vec![(NameKind::Identifier, data.identifier.clone())];

    for (pname, value) in data.properties.iter() {
        if catalog.is_tkvar_property(&data.classname, pname) {
            let name = variable_name(value);
            if !name.is_empty() {
                names.push((NameKind::Variable, name.to_string()));
            }
        } else if catalog.is_command_property(&data.classname, pname) {
            if let Some(name) = command_name(value) {
                names.push((NameKind::Command, name));
            }
        }
    }

    for binding in &data.bindings {
        if !binding.handler.is_empty() {
            names.push((NameKind::Handler, binding.handler.clone()));
        }
    }

    names
}

/// Read-only namespace queries over a live document
#[derive(Debug, Clone, Copy)]
pub struct Namespace<'a> {
    doc: &'a Document,
}

impl<'a> Namespace<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Kinds under which `name` is used, optionally ignoring one widget
    fn kinds_of(&self, name: &str, except: Option<NodeKey>) -> Vec<NameKind> {
        let catalog = self.doc.catalog();
        let mut kinds = Vec::new();
        for (key, node) in self.doc.iter() {
            if Some(key) == except {
                continue;
            }
            for (kind, used) in widget_names(catalog, node.data()) {
                if used == name && !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    pub fn is_defined(&self, kind: NameKind, name: &str) -> bool {
        self.kinds_of(name, None).contains(&kind)
    }

    pub fn is_id_defined(&self, name: &str) -> bool {
        self.doc.iter().any(|(_, node)| node.data().identifier == name)
    }

    pub fn is_variable_defined(&self, name: &str) -> bool {
        self.is_defined(NameKind::Variable, name)
    }

    pub fn is_command_defined(&self, name: &str) -> bool {
        self.is_defined(NameKind::Command, name)
    }

    pub fn is_handler_defined(&self, name: &str) -> bool {
        self.is_defined(NameKind::Handler, name)
    }

    /// True when `name` is not used by any kind anywhere in the tree
    pub fn is_unique(&self, name: &str) -> bool {
        self.kinds_of(name, None).is_empty()
    }

    /// Identifier check for widget `owner` (its own current id does not count)
    pub fn is_id_valid(&self, name: &str, owner: Option<NodeKey>) -> bool {
        !name.is_empty() && self.kinds_of(name, owner).is_empty()
    }

    /// A name of `kind` is valid when no other kind uses it. Reusing a
    /// variable, command or handler of the same kind refers to the same
    /// entity and is allowed.
    pub fn is_valid_for(&self, kind: NameKind, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        !collides(kind, &self.kinds_of(name, None))
    }

    pub fn is_variable_valid(&self, name: &str) -> bool {
        self.is_valid_for(NameKind::Variable, name)
    }

    pub fn is_command_valid(&self, name: &str) -> bool {
        self.is_valid_for(NameKind::Command, name)
    }

    pub fn is_handler_valid(&self, name: &str) -> bool {
        self.is_valid_for(NameKind::Handler, name)
    }

    /// Whole namespace: name -> kinds using it
    pub fn names(&self) -> HashMap<String, Vec<NameKind>> {
        self.names_except(None)
    }

    /// Namespace as seen by widget `owner` (its own names left out)
    pub fn names_except(&self, owner: Option<NodeKey>) -> HashMap<String, Vec<NameKind>> {
        let catalog = self.doc.catalog();
        let mut all: HashMap<String, Vec<NameKind>> = HashMap::new();
        for (key, node) in self.doc.iter() {
            if Some(key) == owner {
                continue;
            }
            for (kind, name) in widget_names(catalog, node.data()) {
                let kinds = all.entry(name).or_default();
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        all
    }

    /// Check a batch of incoming names against the tree (minus `owner`)
    /// and against each other
    pub fn check_incoming(
        &self,
        incoming: &[(NameKind, String)],
        owner: Option<NodeKey>,
    ) -> Result<(), Rejection> {
        let mut taken = self.names_except(owner);
        for (kind, name) in incoming {
            if name.is_empty() {
                if *kind == NameKind::Identifier {
                    return Err(Rejection::EmptyName);
                }
                continue;
            }
            let kinds = taken.entry(name.clone()).or_default();
            if collides(*kind, kinds) {
                return Err(Rejection::NameInUse(name.clone()));
            }
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        Ok(())
    }

    /// Names that break the namespace invariant: identifiers used twice, or
    /// any name used by more than one kind
    pub fn conflicts(&self) -> Vec<String> {
        let mut id_counts: HashMap<&str, usize> = HashMap::new();
        for (_, node) in self.doc.iter() {
            *id_counts.entry(node.data().identifier.as_str()).or_default() += 1;
        }

        let mut conflicts: Vec<String> = self
            .names()
            .into_iter()
            .filter(|(name, kinds)| {
                kinds.len() > 1 || id_counts.get(name.as_str()).copied().unwrap_or(0) > 1
            })
            .map(|(name, _)| name)
            .collect();
        conflicts.sort();
        conflicts
    }
}

/// Identifiers collide with any use; other kinds only with a different kind
pub(crate) fn collides(kind: NameKind, used_as: &[NameKind]) -> bool {
    match kind {
        NameKind::Identifier => !used_as.is_empty(),
        _ => used_as.iter().any(|k| *k != kind),
    }
}

fn compose(separator: NamingSeparator, base: &str, index: u32) -> String {
    match separator {
        NamingSeparator::Underscore => format!("{}_{}", base, index),
        NamingSeparator::None => format!("{}{}", base, index),
    }
}

/// `{short}{sep}{n}`, lowercased, optionally with an uppercase first letter
fn format_id(separator: NamingSeparator, uppercase_first: bool, short_name: &str, index: u32) -> String {
    let name = compose(separator, short_name, index).to_lowercase();
    if !uppercase_first {
        return name;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

/// Per-class counters for generated identifiers
#[derive(Debug, Clone, Default)]
pub struct IdCounter {
    counts: HashMap<String, u32>,
    separator: NamingSeparator,
    uppercase_first: bool,
}

impl IdCounter {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            counts: HashMap::new(),
            separator: config.widget_naming_separator,
            uppercase_first: config.widget_naming_ufletter,
        }
    }

    /// Forget prior usage (new / loaded document)
    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// Next free identifier for `classname`; `is_taken` reports collisions
    /// across the whole shared namespace
    pub fn generate_id(
        &mut self,
        catalog: &Catalog,
        classname: &str,
        is_taken: impl Fn(&str) -> bool,
    ) -> String {
        let short_name = catalog.short_name(classname);
        let (separator, uppercase_first) = (self.separator, self.uppercase_first);
        let counter = self.counts.entry(classname.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format_id(separator, uppercase_first, short_name, *counter);
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Keep `start` when it is free, otherwise generate a new identifier
    pub fn unique_id(
        &mut self,
        catalog: &Catalog,
        classname: &str,
        start: &str,
        is_taken: impl Fn(&str) -> bool,
    ) -> String {
        if !start.is_empty() && !is_taken(start) {
            return start.to_string();
        }
        self.generate_id(catalog, classname, is_taken)
    }

    /// Free variant of a variable / command / handler name
    pub fn unique_name(&self, base: &str, is_taken: impl Fn(&str) -> bool) -> String {
        if !base.is_empty() && !is_taken(base) {
            return base.to_string();
        }
        let mut index = 1;
        loop {
            let candidate = compose(self.separator, base, index);
            if !is_taken(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Manager, NodeKey};
    use std::sync::Arc;
    use widgetree_catalog::ComponentSpec;

    fn catalog() -> Catalog {
        Catalog::from_specs(vec![
            ComponentSpec::new("ttk.Frame").container(),
            ComponentSpec::new("ttk.Entry").with_tkvar_property("textvariable"),
            ComponentSpec::new("ttk.Button").with_command_property("command"),
            ComponentSpec::new("tk.Menuitem.Command").with_command_property("command"),
        ])
        .unwrap()
    }

    fn doc_with_names() -> (Document, NodeKey) {
        let mut doc = Document::new(Arc::new(catalog()));
        let frame = doc
            .append(None, WidgetData::new("ttk.Frame", "frame1", Manager::Pack))
            .unwrap();
        let entry = WidgetData::new("ttk.Entry", "entry1", Manager::Pack)
            .with_property("textvariable", "string:username")
            .with_binding("<Return>", "on_submit");
        doc.append(Some(frame), entry).unwrap();
        let button = WidgetData::new("ttk.Button", "button1", Manager::Pack)
            .with_property("command", r#"{"value": "on_click", "type": "simple"}"#);
        doc.append(Some(frame), button).unwrap();
        (doc, frame)
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(variable_name("int:count"), "count");
        assert_eq!(variable_name("count"), "count");
        assert_eq!(command_name(r#"{"value": "on_ok"}"#).as_deref(), Some("on_ok"));
        assert_eq!(command_name("on_ok").as_deref(), Some("on_ok"));
        assert_eq!(command_name("  "), None);
        assert_eq!(command_name("{broken"), None);
        assert_eq!(rename_variable("int:count", "count_1"), "int:count_1");

        let renamed = rename_command(r#"{"value":"on_ok","type":"simple"}"#, "on_ok_1");
        assert_eq!(command_name(&renamed).as_deref(), Some("on_ok_1"));
        assert!(renamed.contains("simple"));
    }

    #[test]
    fn test_four_kinds_share_one_namespace() {
        let (doc, _) = doc_with_names();
        let ns = Namespace::new(&doc);

        assert!(ns.is_id_defined("entry1"));
        assert!(ns.is_variable_defined("username"));
        assert!(ns.is_command_defined("on_click"));
        assert!(ns.is_handler_defined("on_submit"));
        assert!(ns.is_unique("label1"));

        for name in ["entry1", "username", "on_click", "on_submit"] {
            assert!(!ns.is_unique(name), "{} should be taken", name);
            assert!(!ns.is_id_valid(name, None));
        }

        // same kind refers to the same entity
        assert!(ns.is_variable_valid("username"));
        assert!(ns.is_command_valid("on_click"));
        // other kinds collide
        assert!(!ns.is_handler_valid("username"));
        assert!(!ns.is_variable_valid("on_submit"));
        assert!(!ns.is_command_valid("frame1"));
        assert!(ns.conflicts().is_empty());
    }

    #[test]
    fn test_id_valid_for_its_owner() {
        let (doc, frame) = doc_with_names();
        let ns = Namespace::new(&doc);
        assert!(ns.is_id_valid("frame1", Some(frame)));
        assert!(!ns.is_id_valid("", Some(frame)));
    }

    #[test]
    fn test_check_incoming_within_batch() {
        let (doc, _) = doc_with_names();
        let ns = Namespace::new(&doc);

        let ok = vec![
            (NameKind::Identifier, "entry2".to_string()),
            (NameKind::Variable, "username".to_string()),
        ];
        assert!(ns.check_incoming(&ok, None).is_ok());

        let dup = vec![
            (NameKind::Identifier, "entry2".to_string()),
            (NameKind::Handler, "entry2".to_string()),
        ];
        assert_eq!(
            ns.check_incoming(&dup, None),
            Err(Rejection::NameInUse("entry2".into()))
        );

        let empty = vec![(NameKind::Identifier, String::new())];
        assert_eq!(ns.check_incoming(&empty, None), Err(Rejection::EmptyName));
    }

    #[test]
    fn test_generate_id_skips_taken_names() {
        let catalog = Catalog::tk();
        let mut counter = IdCounter::default();
        let taken = ["button1", "button2"];

        let id = counter.generate_id(&catalog, "ttk.Button", |n| taken.contains(&n));
        assert_eq!(id, "button3");
        let id = counter.generate_id(&catalog, "ttk.Button", |_| false);
        assert_eq!(id, "button4");
        let id = counter.generate_id(&catalog, "tk.Menuitem.Command", |_| false);
        assert_eq!(id, "command1");

        counter.reset();
        assert_eq!(counter.generate_id(&catalog, "ttk.Button", |_| false), "button1");
    }

    #[test]
    fn test_generate_id_naming_options() {
        let config = EditorConfig {
            widget_naming_separator: NamingSeparator::Underscore,
            widget_naming_ufletter: true,
            ..EditorConfig::default()
        };
        let mut counter = IdCounter::new(&config);
        let catalog = Catalog::tk();
        assert_eq!(counter.generate_id(&catalog, "ttk.Label", |_| false), "Label_1");
        assert_eq!(counter.unique_name("on_click", |n| n == "on_click"), "on_click_1");
    }

    #[test]
    fn test_unique_id_keeps_free_start() {
        let catalog = Catalog::tk();
        let mut counter = IdCounter::default();
        assert_eq!(counter.unique_id(&catalog, "ttk.Entry", "name_entry", |_| false), "name_entry");
        assert_eq!(counter.unique_id(&catalog, "ttk.Entry", "name_entry", |n| n == "name_entry"), "entry1");
        assert_eq!(counter.unique_id(&catalog, "ttk.Entry", "", |_| false), "entry2");
    }
}
