//! # Edit Session Management
//!
//! An EditSession is one user's editing state around a document: the
//! selection, the node shown in the edit panels, the active filter, the
//! clipboard transport and the identifier counters.
//!
//! All user actions enter here. Structural actions that must see the true
//! tree run with the filter suspended and re-apply it afterwards.

use crate::clipboard::{MemoryClipboard, Renamer, Transport};
use crate::document::Placement;
use crate::filter::FilterState;
use crate::layout::{ContainerInfo, Direction};
use crate::namespace::IdCounter;
use crate::{
    Document, EditorConfig, EditorError, EditorEvent, Fragment, FragmentCodec, JsonCodec, Manager,
    Mutation, Namespace, NodeKey, Validator, WidgetData,
};
use std::sync::Arc;
use tracing::{debug, warn};
use widgetree_catalog::Catalog;

/// What the edit panels need for the selected node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContext {
    pub key: NodeKey,
    /// Managers the node may use without clashing with its siblings
    pub allowed_managers: Vec<Manager>,
    /// The node seen as a container of its own children
    pub container: ContainerInfo,
}

/// Single-user edit session
#[derive(Debug)]
pub struct EditSession {
    pub(crate) document: Document,
    config: EditorConfig,
    pub(crate) ids: IdCounter,

    /// Selected nodes, in selection order
    selection: Vec<NodeKey>,

    /// Node shown in the edit panels
    current_edit: Option<NodeKey>,

    filter: FilterState,
    /// Selection before the filter was applied
    saved_selection: Option<Vec<NodeKey>>,
    /// Whether the user changed the selection while filtered
    selection_touched: bool,

    pub(crate) transport: Box<dyn Transport>,
    pub(crate) codec: Box<dyn FragmentCodec>,
    /// Holding value used by duplicate
    pub(crate) holding: Option<String>,
}

fn log_rejection(action: &str, err: &EditorError) {
    if err.is_rejection() {
        warn!(action, reason = %err, "Edit rejected");
    }
}

impl EditSession {
    pub fn new(catalog: Arc<Catalog>, config: EditorConfig) -> Self {
        Self {
            document: Document::new(catalog),
            ids: IdCounter::new(&config),
            config,
            selection: Vec::new(),
            current_edit: None,
            filter: FilterState::new(),
            saved_selection: None,
            selection_touched: false,
            transport: Box::new(MemoryClipboard::new()),
            codec: Box::new(JsonCodec),
            holding: None,
        }
    }

    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_codec(mut self, codec: Box<dyn FragmentCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.document.catalog()
    }

    /// Namespace view for panels validating user-typed names
    pub fn namespace(&self) -> Namespace<'_> {
        Namespace::new(&self.document)
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.document)
    }

    pub fn selection(&self) -> &[NodeKey] {
        &self.selection
    }

    pub fn current_edit(&self) -> Option<NodeKey> {
        self.current_edit
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Fragment last produced by duplicate
    pub fn holding_value(&self) -> Option<&str> {
        self.holding.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        self.document.take_events()
    }

    fn emit(&mut self, event: EditorEvent) {
        self.document.emit(event);
    }

    fn redraw(&mut self, key: NodeKey) {
        let toplevel = self.document.toplevel_of(key);
        self.emit(EditorEvent::Redraw { toplevel });
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Replace the selection and show the first node in the edit panels
    pub(crate) fn select(&mut self, keys: Vec<NodeKey>) {
        let mut selection: Vec<NodeKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if self.document.contains(key) && !selection.contains(&key) {
                selection.push(key);
            }
        }
        self.selection = selection;
        self.current_edit = self.selection.first().copied();
        match self.current_edit {
            Some(key) => self.emit(EditorEvent::Edit { key }),
            None => self.emit(EditorEvent::EditorHidden),
        }
    }

    /// User selection change
    pub fn set_selection(&mut self, keys: Vec<NodeKey>) {
        if self.filter.is_active() {
            self.selection_touched = true;
        }
        self.select(keys);
    }

    /// Select the widget with `identifier`, clearing any filter first
    pub fn select_by_id(&mut self, identifier: &str) -> Option<NodeKey> {
        self.clear_filter();
        let key = self.document.find_by_id(identifier)?;
        self.select(vec![key]);
        self.emit(EditorEvent::Reveal { key });
        Some(key)
    }

    /// Select the previous visible node
    pub fn nav_up(&mut self) -> Option<NodeKey> {
        self.nav(false)
    }

    /// Select the next visible node
    pub fn nav_down(&mut self) -> Option<NodeKey> {
        self.nav(true)
    }

    fn nav(&mut self, forward: bool) -> Option<NodeKey> {
        let visible = self.filter.visible_preorder(&self.document);
        let target = match self.selection.first().and_then(|k| visible.iter().position(|v| v == k)) {
            Some(pos) if forward => visible.get(pos + 1).copied(),
            Some(pos) => pos.checked_sub(1).and_then(|p| visible.get(p)).copied(),
            None if forward => visible.first().copied(),
            None => visible.last().copied(),
        }?;
        self.set_selection(vec![target]);
        self.emit(EditorEvent::Reveal { key: target });
        Some(target)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Add a new widget of `classname` under the selected node. When the
    /// selected node cannot hold it, the widget goes to that node's parent
    /// instead (the top level for a top-level node).
    pub fn add_widget(&mut self, classname: &str) -> Result<NodeKey, EditorError> {
        self.clear_filter();
        let catalog = self.document.catalog_arc();
        let spec = catalog.require(classname)?;

        let mut parent = self.selection.first().copied();
        if let Some(selected) = parent {
            if !self.validator().can_insert(Some(selected), classname) {
                parent = self.document.parent(selected);
            }
        }
        if let Err(err) = self.validator().check(parent, classname) {
            log_rejection("add", &err);
            return Err(err);
        }

        let document = &self.document;
        let identifier = self
            .ids
            .generate_id(&catalog, classname, |name| !Namespace::new(document).is_unique(name));

        let mut data = WidgetData::new(classname, identifier.as_str(), self.config.default_layout_manager);
        for (name, value) in &spec.default_properties {
            data.properties.set(name.as_str(), value.replace("{id}", &identifier));
        }
        for (name, value) in &spec.default_layout {
            data.layout.set(name.as_str(), value.as_str());
        }

        let index = self.document.children(parent).len();
        let key = self.document.insert(parent, data, index).map_err(|err| {
            log_rejection("add", &err);
            err
        })?;

        debug!(classname, identifier = %identifier, "Added widget");
        self.redraw(key);
        self.select(vec![key]);
        self.emit(EditorEvent::Reveal { key });
        Ok(key)
    }

    /// Delete every selected node. Nodes already removed with a selected
    /// ancestor are skipped. Focus moves to a neighbour of the last deleted
    /// node that was not itself selected. Returns the number of deleted
    /// subtrees.
    pub fn delete_selection(&mut self) -> usize {
        let selection = self.selection.clone();
        if selection.is_empty() {
            return 0;
        }

        self.with_filter_suspended(|s| {
            let mut removed = 0;
            let mut final_focus = None;
            let mut redraw: Vec<Option<NodeKey>> = Vec::new();

            for key in &selection {
                let Some(index) = s.document.index_of(*key) else {
                    debug!(key = ?key, "Skipping stale selection entry");
                    continue;
                };
                let parent = s.document.parent(*key);
                let siblings = s.document.children(parent);
                let prev = index.checked_sub(1).and_then(|i| siblings.get(i)).copied();
                let next = siblings.get(index + 1).copied();
                final_focus = [prev, next, parent]
                    .into_iter()
                    .flatten()
                    .find(|k| !selection.contains(k));

                let toplevel = match parent {
                    Some(_) => s.document.toplevel_of(*key),
                    None => None,
                };

                match s.document.remove(*key) {
                    Ok(_) => {
                        removed += 1;
                        if !redraw.contains(&toplevel) {
                            redraw.push(toplevel);
                        }
                    }
                    Err(err) => debug!(key = ?key, error = %err, "Skipping stale selection entry"),
                }
            }

            for toplevel in redraw {
                if toplevel.map_or(true, |k| s.document.contains(k)) {
                    s.emit(EditorEvent::Redraw { toplevel });
                }
            }

            s.selection.clear();
            s.current_edit = None;
            s.emit(EditorEvent::EditorHidden);

            if let Some(focus) = final_focus.filter(|k| s.document.contains(*k)) {
                s.select(vec![focus]);
                s.emit(EditorEvent::Reveal { key: focus });
            }
            removed
        })
    }

    /// Move a node under another parent
    pub fn move_node(
        &mut self,
        key: NodeKey,
        new_parent: Option<NodeKey>,
        index: usize,
    ) -> Result<(), EditorError> {
        let old_toplevel = self.document.toplevel_of(key);
        self.with_filter_suspended(|s| s.document.move_node(key, new_parent, index))
            .map_err(|err| {
                log_rejection("move", &err);
                err
            })?;

        let new_toplevel = self.document.toplevel_of(key);
        if old_toplevel != new_toplevel {
            if let Some(old) = old_toplevel.filter(|k| self.document.contains(*k)) {
                self.emit(EditorEvent::Redraw { toplevel: Some(old) });
            }
        }
        self.emit(EditorEvent::Redraw { toplevel: new_toplevel });
        self.emit(EditorEvent::Reveal { key });
        Ok(())
    }

    /// Move the selected node one place up among its siblings. Returns
    /// false when it is already first.
    pub fn move_up(&mut self) -> Result<bool, EditorError> {
        self.move_by(-1)
    }

    /// Move the selected node one place down among its siblings
    pub fn move_down(&mut self) -> Result<bool, EditorError> {
        self.move_by(1)
    }

    fn move_by(&mut self, offset: isize) -> Result<bool, EditorError> {
        let Some(key) = self.selection.first().copied() else {
            return Ok(false);
        };
        let index = self.document.index_of(key).ok_or(EditorError::NodeNotFound(key))?;
        let parent = self.document.parent(key);
        let len = self.document.children(parent).len();

        let target = match index.checked_add_signed(offset) {
            Some(target) if target < len => target,
            _ => return Ok(false),
        };
        self.move_node(key, parent, target)?;
        Ok(true)
    }

    /// Nudge the selected grid widgets one cell
    pub fn grid_move(&mut self, direction: Direction) -> Vec<NodeKey> {
        let selection = self.selection.clone();
        let moved = self.with_filter_suspended(|s| s.document.grid_move(&selection, direction));
        if let Some(first) = moved.first().copied() {
            self.redraw(first);
        }
        moved
    }

    /// Switch the edited node and its siblings to `manager`. Top-level
    /// nodes have no container and are left alone.
    pub fn change_container_manager(&mut self, manager: Manager) -> Result<usize, EditorError> {
        let Some(key) = self.current_edit else {
            return Ok(0);
        };
        let Some(container) = self.document.parent(key) else {
            return Ok(0);
        };
        let switched = self
            .with_filter_suspended(|s| s.document.change_container_manager(container, manager, Some(key)))
            .map_err(|err| {
                log_rejection("change manager", &err);
                err
            })?;
        self.redraw(key);
        Ok(switched)
    }

    /// Switch only the edited node to `manager`
    pub fn set_manager(&mut self, manager: Manager) -> Result<(), EditorError> {
        let Some(key) = self.current_edit else {
            return Ok(());
        };
        self.apply(Mutation::SetManager { key, manager })
    }

    /// Apply a property / layout / binding / identifier edit
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), EditorError> {
        let key = mutation.target();
        self.with_filter_suspended(|s| mutation.apply(&mut s.document))
            .map_err(|err| {
                log_rejection("edit", &err);
                err
            })?;
        self.redraw(key);
        Ok(())
    }

    /// Edit panel data for `key`. Records the manager its children use as
    /// the node's container manager.
    pub fn edit_context(&mut self, key: NodeKey) -> Result<EditContext, EditorError> {
        let layout = self.document.layout();
        let allowed_managers = layout.allowed_managers(key)?;
        let container = layout.container_info(key)?;
        if let Some(manager) = container.manager {
            self.document.set_container_manager(key, Some(manager));
        }
        Ok(EditContext {
            key,
            allowed_managers,
            container,
        })
    }

    // ------------------------------------------------------------------
    // Filter
    // ------------------------------------------------------------------

    /// Hide nodes not matching `text`. An empty text clears the filter.
    /// Returns the number of hidden nodes.
    pub fn apply_filter(&mut self, text: &str) -> usize {
        if text.is_empty() {
            self.clear_filter();
            return 0;
        }
        if !self.filter.is_active() {
            self.saved_selection = Some(self.selection.clone());
            self.selection_touched = false;
        }
        self.filter.apply(&self.document, text)
    }

    /// Show every node again and restore the selection from before the
    /// filter, unless the user picked something else meanwhile
    pub fn clear_filter(&mut self) {
        if !self.filter.is_active() {
            return;
        }
        self.filter.clear();

        let saved = self.saved_selection.take();
        if !self.selection_touched {
            if let Some(saved) = saved {
                if saved != self.selection {
                    self.select(saved);
                }
            }
        }
        self.selection_touched = false;

        if let Some(key) = self.selection.first().copied() {
            self.emit(EditorEvent::Reveal { key });
        }
    }

    /// Run `f` on the unfiltered tree, then re-apply the filter text. When
    /// `f` leaves the selection alone the previously active node is
    /// revealed again. Nested calls see no filter and restore nothing.
    pub fn with_filter_suspended<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        if !self.filter.is_active() {
            return f(self);
        }

        let text = self.filter.text().to_string();
        let active = self.current_edit;
        let selection = self.selection.clone();
        self.filter.clear();

        let result = f(self);

        self.filter.apply(&self.document, &text);
        if self.selection == selection {
            if let Some(key) = active.filter(|k| self.document.contains(*k)) {
                self.emit(EditorEvent::Reveal { key });
            }
        } else {
            self.selection_touched = true;
        }
        result
    }

    // ------------------------------------------------------------------
    // Whole document
    // ------------------------------------------------------------------

    /// Serialize the true tree, or the subtree of `root`
    pub fn to_document(&self, root: Option<NodeKey>) -> Result<String, EditorError> {
        let widgets = match root {
            Some(key) => vec![self.document.to_def(key)?],
            None => self
                .document
                .roots()
                .iter()
                .map(|key| self.document.to_def(*key))
                .collect::<Result<Vec<_>, _>>()?,
        };
        self.codec
            .encode(&Fragment::new(self.config.author.clone(), widgets))
    }

    /// Replace the tree with a serialized document. Identifiers and names
    /// are made unique as in paste; layout is kept as written. The current
    /// tree is untouched when loading fails. Returns the number of
    /// top-level widgets.
    pub fn load_document(&mut self, text: &str) -> Result<usize, EditorError> {
        let fragment = self.codec.decode(text)?;
        let catalog = self.document.catalog_arc();
        fragment.check_classes(&catalog)?;

        let mut ids = IdCounter::new(&self.config);
        let mut loaded = Document::new(Arc::clone(&catalog));
        let mut renamer = Renamer::new(&loaded);
        for (index, mut def) in fragment.widgets.into_iter().enumerate() {
            renamer.rename(&catalog, &mut ids, &mut def);
            loaded.insert_tree(None, index, def, Placement::Verbatim)?;
        }
        let count = loaded.roots().len();
        let renamed = renamer.into_log();
        if !renamed.is_empty() {
            warn!(renamed = renamed.len(), "Renamed duplicate names while loading");
        }

        self.reset_view();
        self.ids = ids;
        self.document.replace_with(loaded);
        self.emit(EditorEvent::EditorHidden);
        self.emit(EditorEvent::Redraw { toplevel: None });
        debug!(widgets = count, nodes = self.document.len(), "Loaded document");
        Ok(count)
    }

    /// Start an empty document
    pub fn new_document(&mut self) {
        self.reset_view();
        self.ids.reset();
        self.document.clear();
        self.emit(EditorEvent::EditorHidden);
        self.emit(EditorEvent::Redraw { toplevel: None });
    }

    fn reset_view(&mut self) {
        self.filter.clear();
        self.saved_selection = None;
        self.selection_touched = false;
        self.selection.clear();
        self.current_edit = None;
        self.holding = None;
    }

    pub fn mark_saved(&mut self) {
        self.document.mark_saved();
    }
}
