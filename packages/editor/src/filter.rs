//! # Filter Engine
//!
//! Hides the nodes that do not match a search text. The document itself is
//! never touched: the filter only keeps a record of hidden subtrees and
//! derives the visible projection from it, so clearing a filter restores
//! the exact prior structure by construction.
//!
//! A node stays visible when it matches or when any of its descendants
//! does, so the ancestry of every match is shown. Non-matching children of
//! a matching node are hidden.

use crate::{Document, NodeKey};
use std::collections::HashSet;
use tracing::debug;

/// A hidden subtree and where it sat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detached {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    text: String,
    /// Hidden subtree roots in detach order
    detached: Vec<Detached>,
    /// Every hidden node (subtree roots and their descendants)
    hidden: HashSet<NodeKey>,
}

/// Case-insensitive match on the label (`"{id}: {class}"`) or the class name
pub fn matches(doc: &Document, key: NodeKey, needle: &str) -> bool {
    doc.get(key).map_or(false, |data| {
        data.label().to_lowercase().contains(needle) || data.classname.to_lowercase().contains(needle)
    })
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Hidden subtree roots in the order they were detached
    pub fn detached(&self) -> &[Detached] {
        &self.detached
    }

    /// Reset, then hide everything that does not match `text`. Returns the
    /// number of hidden nodes.
    pub fn apply(&mut self, doc: &Document, text: &str) -> usize {
        self.clear();
        if text.is_empty() {
            return 0;
        }

        self.text = text.to_string();
        let needle = text.to_lowercase();
        for (index, root) in doc.roots().iter().enumerate() {
            let (matched, mut records) = detach(doc, *root, &needle);
            if !matched {
                records = vec![Detached { key: *root, parent: None, index }];
            }
            self.detached.extend(records);
        }

        for record in &self.detached {
            self.hidden.insert(record.key);
            self.hidden.extend(doc.descendants(record.key));
        }

        debug!(text, hidden = self.hidden.len(), "Applied filter");
        self.hidden.len()
    }

    /// Re-attach every hidden subtree, latest first. Returns the records in
    /// the order they were replayed.
    pub fn clear(&mut self) -> Vec<Detached> {
        let mut replayed = Vec::with_capacity(self.detached.len());
        while let Some(record) = self.detached.pop() {
            replayed.push(record);
        }
        self.hidden.clear();
        self.text.clear();
        replayed
    }

    pub fn is_hidden(&self, key: NodeKey) -> bool {
        self.hidden.contains(&key)
    }

    pub fn is_visible(&self, doc: &Document, key: NodeKey) -> bool {
        doc.contains(key) && !self.is_hidden(key)
    }

    /// Children of `parent` shown while the filter is active
    pub fn visible_children(&self, doc: &Document, parent: Option<NodeKey>) -> Vec<NodeKey> {
        doc.children(parent)
            .iter()
            .copied()
            .filter(|k| !self.is_hidden(*k))
            .collect()
    }

    pub fn visible_roots(&self, doc: &Document) -> Vec<NodeKey> {
        self.visible_children(doc, None)
    }

    /// Visible nodes in pre-order
    pub fn visible_preorder(&self, doc: &Document) -> Vec<NodeKey> {
        doc.preorder().into_iter().filter(|k| !self.is_hidden(*k)).collect()
    }
}

/// Returns whether `key` or a descendant matches, and the subtrees to hide
/// below `key`
fn detach(doc: &Document, key: NodeKey, needle: &str) -> (bool, Vec<Detached>) {
    let mut records = Vec::new();
    let mut children_match = false;

    for (child_index, child) in doc.children(Some(key)).iter().enumerate() {
        let (matched, child_records) = detach(doc, *child, needle);
        if matched {
            records.extend(child_records);
            children_match = true;
        } else {
            records.push(Detached {
                key: *child,
                parent: Some(key),
                index: child_index,
            });
        }
    }

    (matches(doc, key, needle) || children_match, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Manager, WidgetData};
    use std::sync::Arc;
    use widgetree_catalog::{Catalog, ComponentSpec};

    fn build() -> (Document, Vec<NodeKey>) {
        let catalog = Catalog::from_specs(vec![
            ComponentSpec::new("ttk.Frame").container(),
            ComponentSpec::new("ttk.Label"),
            ComponentSpec::new("ttk.Button"),
        ])
        .unwrap();
        let mut doc = Document::new(Arc::new(catalog));
        let w = |class: &str, id: &str| WidgetData::new(class, id, Manager::Pack);

        let main = doc.append(None, w("ttk.Frame", "main")).unwrap();
        let form = doc.append(Some(main), w("ttk.Frame", "form")).unwrap();
        let name = doc.append(Some(form), w("ttk.Label", "name_label")).unwrap();
        let ok = doc.append(Some(main), w("ttk.Button", "ok")).unwrap();
        let other = doc.append(None, w("ttk.Frame", "other")).unwrap();
        (doc, vec![main, form, name, ok, other])
    }

    #[test]
    fn test_ancestors_of_matches_stay_visible() {
        let (doc, keys) = build();
        let [main, form, name, ok, other] = keys[..] else { unreachable!() };
        let mut filter = FilterState::new();

        filter.apply(&doc, "NAME");
        assert!(filter.is_visible(&doc, main));
        assert!(filter.is_visible(&doc, form));
        assert!(filter.is_visible(&doc, name));
        assert!(filter.is_hidden(ok));
        assert!(filter.is_hidden(other));
        assert_eq!(filter.visible_roots(&doc), vec![main]);
        assert_eq!(filter.visible_children(&doc, Some(main)), vec![form]);

        let records = filter.detached();
        assert_eq!(records[0], Detached { key: ok, parent: Some(main), index: 1 });
        assert_eq!(records[1], Detached { key: other, parent: None, index: 1 });
    }

    #[test]
    fn test_match_on_class_name() {
        let (doc, keys) = build();
        let mut filter = FilterState::new();
        filter.apply(&doc, "button");
        assert!(!filter.is_hidden(keys[3]));
        assert!(filter.is_hidden(keys[1]));
        assert!(filter.is_hidden(keys[2]));
    }

    #[test]
    fn test_matching_node_hides_non_matching_children() {
        let (doc, keys) = build();
        let mut filter = FilterState::new();
        filter.apply(&doc, "main");
        assert!(!filter.is_hidden(keys[0]));
        assert!(filter.is_hidden(keys[1]));
        assert!(filter.is_hidden(keys[2]));
        assert!(filter.is_hidden(keys[3]));
    }

    #[test]
    fn test_no_match_hides_everything_then_clear_restores() {
        let (doc, keys) = build();
        let before = doc.preorder();
        let mut filter = FilterState::new();

        filter.apply(&doc, "zzz");
        assert!(filter.visible_roots(&doc).is_empty());
        assert!(keys.iter().all(|k| filter.is_hidden(*k)));

        let replayed = filter.clear();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].key, keys[4]);
        assert!(!filter.is_active());
        assert_eq!(filter.visible_preorder(&doc), before);
    }

    #[test]
    fn test_empty_text_resets() {
        let (doc, _) = build();
        let mut filter = FilterState::new();
        filter.apply(&doc, "ok");
        assert!(filter.is_active());
        assert_eq!(filter.apply(&doc, ""), 0);
        assert!(!filter.is_active());
        assert!(filter.detached().is_empty());
    }
}
