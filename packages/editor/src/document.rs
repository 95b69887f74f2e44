//! # Document Tree Store
//!
//! The authoritative in-memory widget tree.
//!
//! Nodes live in a [`SlotMap`] arena and are addressed by [`NodeKey`]
//! handles. Ownership is top-down: a node owns the ordered list of its
//! children's keys, and its parent link is a plain key used for traversal.
//!
//! Every mutating call validates before touching the arena:
//!
//! ```text
//! structure (catalog) → namespace → layout → commit → DocumentChanged
//! ```
//!
//! A failed call returns an error and leaves the tree and the event queue
//! untouched.

use crate::fragment::WidgetDef;
use crate::namespace::widget_names;
use crate::validator::check_constraints;
use crate::{
    Binding, EditorError, EditorEvent, GridCell, Manager, NameKind, Namespace, Rejection,
    Validator, WidgetData,
};
use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;
use tracing::debug;
use widgetree_catalog::Catalog;

new_key_type! {
    /// Stable handle of a node, never reused while the node is alive
    pub struct NodeKey;
}

/// One entry of the arena
#[derive(Debug, Clone)]
pub struct Node {
    data: WidgetData,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    pub fn data(&self) -> &WidgetData {
        &self.data
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// How the layout coordinator treats an incoming node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    /// Adopt the siblings' manager. A grid node without a cell goes one
    /// row past the last; a given cell is kept while free, otherwise the
    /// node drops below the last sibling in that column.
    #[default]
    Auto,
    /// Keep the given layout, rejecting manager conflicts and occupied cells
    Exact,
    /// Keep the given layout unchecked (documents read from a file)
    Verbatim,
}

/// Editable widget tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    catalog: Arc<Catalog>,

    /// Current version number (increments on each committed mutation)
    pub version: u64,

    dirty: bool,
    events: Vec<EditorEvent>,
}

impl Document {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            catalog,
            version: 0,
            dirty: false,
            events: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_arc(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.emit(EditorEvent::DocumentChanged { dirty: false });
    }

    /// Drain queued notifications in the order they were raised
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    pub(crate) fn commit(&mut self) {
        self.version += 1;
        self.dirty = true;
        self.emit(EditorEvent::DocumentChanged { dirty: true });
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn node(&self, key: NodeKey) -> Result<&Node, EditorError> {
        self.nodes.get(key).ok_or(EditorError::NodeNotFound(key))
    }

    pub fn get(&self, key: NodeKey) -> Option<&WidgetData> {
        self.nodes.get(key).map(|n| &n.data)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Ordered children of `parent` (`None` = top level). Unknown keys have
    /// no children.
    pub fn children(&self, parent: Option<NodeKey>) -> &[NodeKey] {
        match parent {
            Some(key) => self.nodes.get(key).map_or(&[], |n| n.children.as_slice()),
            None => &self.roots,
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        let node = self.nodes.get(key)?;
        self.children(node.parent).iter().position(|k| *k == key)
    }

    /// Top-level ancestor of `key` (itself when at root)
    pub fn toplevel_of(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = key;
        if !self.contains(current) {
            return None;
        }
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = self.parent(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Descendants of `key` in pre-order, excluding `key` itself
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.collect_preorder(self.children(Some(key)), &mut out);
        out
    }

    /// Every node of the tree in pre-order
    pub fn preorder(&self) -> Vec<NodeKey> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect_preorder(&self.roots, &mut out);
        out
    }

    fn collect_preorder(&self, keys: &[NodeKey], out: &mut Vec<NodeKey>) {
        for key in keys {
            out.push(*key);
            self.collect_preorder(self.children(Some(*key)), out);
        }
    }

    /// Iterate nodes in pre-order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.preorder()
            .into_iter()
            .filter_map(move |key| self.nodes.get(key).map(|node| (key, node)))
    }

    /// Display label, `"{id}: {class}"`
    pub fn label(&self, key: NodeKey) -> Option<String> {
        self.get(key).map(WidgetData::label)
    }

    pub fn find_by_id(&self, identifier: &str) -> Option<NodeKey> {
        self.iter()
            .find(|(_, node)| node.data.identifier == identifier)
            .map(|(key, _)| key)
    }

    fn is_menu(&self, key: NodeKey) -> bool {
        self.get(key)
            .and_then(|data| self.catalog.get(&data.classname))
            .map_or(false, |spec| spec.menu)
    }

    /// Top-level windows (root nodes that are not menus)
    pub fn top_widgets(&self) -> Vec<NodeKey> {
        self.roots.iter().copied().filter(|k| !self.is_menu(*k)).collect()
    }

    /// Top-level menus
    pub fn top_menus(&self) -> Vec<NodeKey> {
        self.roots.iter().copied().filter(|k| self.is_menu(*k)).collect()
    }

    /// Whether instances of `classname` are positioned by a layout manager
    pub(crate) fn needs_layout(&self, classname: &str) -> bool {
        self.catalog
            .get(classname)
            .map_or(true, |spec| spec.layout_required)
    }

    /// Subtree of `key` as a serializable definition
    pub fn to_def(&self, key: NodeKey) -> Result<WidgetDef, EditorError> {
        let node = self.node(key)?;
        let children = node
            .children
            .iter()
            .map(|child| self.to_def(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WidgetDef {
            widget: node.data.clone(),
            children,
        })
    }

    // ------------------------------------------------------------------
    // Structural mutations
    // ------------------------------------------------------------------

    /// Insert a single widget under `parent` at `index` (clamped to the
    /// number of children)
    pub fn insert(
        &mut self,
        parent: Option<NodeKey>,
        data: WidgetData,
        index: usize,
    ) -> Result<NodeKey, EditorError> {
        self.insert_tree(parent, index, WidgetDef::leaf(data), Placement::Auto)
    }

    /// Append a single widget as the last child of `parent`
    pub fn append(&mut self, parent: Option<NodeKey>, data: WidgetData) -> Result<NodeKey, EditorError> {
        let index = self.children(parent).len();
        self.insert(parent, data, index)
    }

    /// Insert a whole subtree. The top node is validated against the live
    /// tree, descendants against their parents within the subtree, and all
    /// names against the shared namespace. Nothing is inserted on failure.
    pub fn insert_tree(
        &mut self,
        parent: Option<NodeKey>,
        index: usize,
        mut def: WidgetDef,
        placement: Placement,
    ) -> Result<NodeKey, EditorError> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }

        Validator::new(self).check(parent, &def.widget.classname)?;
        self.check_subtree(&def)?;

        let mut incoming = Vec::new();
        def.collect_names(&self.catalog, &mut incoming);
        Namespace::new(self).check_incoming(&incoming, None)?;

        self.place(parent, None, &mut def.widget, placement)?;

        let key = self.attach(parent, index, def);
        self.commit();
        debug!(
            key = ?key,
            parent = ?parent,
            nodes = self.nodes.len(),
            "Inserted subtree"
        );
        Ok(key)
    }

    /// Catalog constraints inside a subtree about to be inserted
    fn check_subtree(&self, def: &WidgetDef) -> Result<(), EditorError> {
        let spec = self.catalog.require(&def.widget.classname)?;
        for (count, child) in def.children.iter().enumerate() {
            let child_spec = self.catalog.require(&child.widget.classname)?;
            check_constraints(Some((spec, count)), child_spec)?;
            self.check_subtree(child)?;
        }
        Ok(())
    }

    fn attach(&mut self, parent: Option<NodeKey>, index: usize, def: WidgetDef) -> NodeKey {
        let WidgetDef { widget, children } = def;
        let key = self.nodes.insert(Node {
            data: widget,
            parent,
            children: Vec::new(),
        });
        self.link(parent, index, key);
        for child in children {
            let end = self.children(Some(key)).len();
            self.attach(Some(key), end, child);
        }
        key
    }

    fn link(&mut self, parent: Option<NodeKey>, index: usize, key: NodeKey) {
        let siblings = match parent {
            Some(p) => match self.nodes.get_mut(p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, key);
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = parent;
        }
    }

    fn unlink(&mut self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key);
        let siblings = match parent {
            Some(p) => &mut self.nodes.get_mut(p)?.children,
            None => &mut self.roots,
        };
        let index = siblings.iter().position(|k| *k == key)?;
        siblings.remove(index);
        Some(index)
    }

    /// Remove `key` and all its descendants, returning the removed subtree.
    /// The subtree's names are released with it.
    pub fn remove(&mut self, key: NodeKey) -> Result<WidgetDef, EditorError> {
        let def = self.to_def(key)?;
        let doomed = self.descendants(key);

        self.unlink(key);
        self.nodes.remove(key);
        for k in doomed {
            self.nodes.remove(k);
        }

        self.commit();
        debug!(key = ?key, removed = def.count(), "Removed subtree");
        Ok(def)
    }

    /// Move `key` under `new_parent` at `index` (position among the
    /// children that remain once `key` has been taken out)
    pub fn move_node(
        &mut self,
        key: NodeKey,
        new_parent: Option<NodeKey>,
        index: usize,
    ) -> Result<(), EditorError> {
        let node = self.node(key)?;
        let old_parent = node.parent;
        let classname = node.data.classname.clone();

        if let Some(parent) = new_parent {
            self.node(parent)?;
            if parent == key || self.is_ancestor(key, parent) {
                return Err(EditorError::CycleDetected);
            }
        }

        Validator::new(self).check_move(new_parent, &classname, key)?;

        let mut data = node.data.clone();
        if old_parent != new_parent {
            self.place(new_parent, Some(key), &mut data, Placement::Auto)?;
        }

        self.unlink(key);
        self.link(new_parent, index, key);
        if let Some(node) = self.nodes.get_mut(key) {
            node.data = data;
        }

        self.commit();
        debug!(key = ?key, parent = ?new_parent, index, "Moved node");
        Ok(())
    }

    /// Replace the whole tree with the content of `other`, keeping the
    /// queued events of this document
    pub(crate) fn replace_with(&mut self, other: Document) {
        let events = std::mem::take(&mut self.events);
        *self = other;
        self.events = events;
        self.version += 1;
        self.dirty = false;
        self.emit(EditorEvent::DocumentChanged { dirty: false });
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.version += 1;
        self.dirty = false;
        self.emit(EditorEvent::DocumentChanged { dirty: false });
    }

    // ------------------------------------------------------------------
    // Data edits
    // ------------------------------------------------------------------

    /// Apply `edit` to a copy of the node's data, validate the result and
    /// store it
    pub(crate) fn edit_data(
        &mut self,
        key: NodeKey,
        edit: impl FnOnce(&mut WidgetData),
    ) -> Result<(), EditorError> {
        let node = self.node(key)?;
        let parent = node.parent;
        let before = node.data.clone();
        let mut data = before.clone();
        edit(&mut data);

        if data == before {
            return Ok(());
        }

        let names = widget_names(&self.catalog, &data);
        Namespace::new(self).check_incoming(&names, Some(key))?;

        if let (Some(parent), Some(cell)) = (parent, data.cell()) {
            if before.cell() != Some(cell) && self.layout().is_occupied(Some(parent), cell, Some(key)) {
                return Err(Rejection::CellOccupied(cell).into());
            }
        }

        self.store_data(key, data);
        self.commit();
        Ok(())
    }

    /// Overwrite a node's data and queue its change notification
    pub(crate) fn store_data(&mut self, key: NodeKey, data: WidgetData) {
        let label = data.label();
        let cell = data.cell();
        if let Some(node) = self.nodes.get_mut(key) {
            node.data = data;
            self.emit(EditorEvent::NodeChanged { key, label, cell });
        }
    }

    pub fn set_identifier(&mut self, key: NodeKey, identifier: &str) -> Result<(), EditorError> {
        if identifier.is_empty() {
            return Err(Rejection::EmptyName.into());
        }
        self.edit_data(key, |data| data.identifier = identifier.to_string())
    }

    pub fn set_property(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), EditorError> {
        self.edit_data(key, |data| data.properties.set(name, value))
    }

    pub fn remove_property(&mut self, key: NodeKey, name: &str) -> Result<(), EditorError> {
        self.edit_data(key, |data| {
            data.properties.remove(name);
        })
    }

    /// Set a layout property. Moving a grid widget onto an occupied cell
    /// is rejected, and so is a `row` or `column` that is not a grid index.
    pub fn set_layout_property(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), EditorError> {
        if (name == "row" || name == "column") && value.trim().parse::<u32>().is_err() {
            return Err(Rejection::InvalidGridIndex {
                name: name.to_string(),
                value: value.to_string(),
            }
            .into());
        }
        self.edit_data(key, |data| data.layout.set(name, value))
    }

    pub fn remove_layout_property(&mut self, key: NodeKey, name: &str) -> Result<(), EditorError> {
        self.edit_data(key, |data| {
            data.layout.remove(name);
        })
    }

    pub fn set_bindings(&mut self, key: NodeKey, bindings: Vec<Binding>) -> Result<(), EditorError> {
        self.edit_data(key, |data| data.bindings = bindings)
    }

    /// Names `key` contributes to the shared namespace
    pub fn names_of(&self, key: NodeKey) -> Vec<(NameKind, String)> {
        self.get(key)
            .map(|data| widget_names(&self.catalog, data))
            .unwrap_or_default()
    }

    /// Grid cell of `key`, when it is grid managed
    pub fn cell(&self, key: NodeKey) -> Option<GridCell> {
        self.get(key).and_then(WidgetData::cell)
    }

    pub fn manager(&self, key: NodeKey) -> Option<Manager> {
        self.get(key).map(|data| data.manager)
    }

    /// Record the manager used by the children of `key`. Returns whether
    /// the stored value changed.
    pub(crate) fn set_container_manager(&mut self, key: NodeKey, manager: Option<Manager>) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) if node.data.container_manager != manager => {
                node.data.container_manager = manager;
                true
            }
            _ => false,
        }
    }
}
