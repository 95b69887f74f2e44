//! # Clipboard / Duplicate Transaction
//!
//! Copy, cut, paste and duplicate share one mechanism: the selection is
//! encoded into a [`Fragment`](crate::Fragment) and re-inserted under an
//! anchor. They differ in the medium and the anchor:
//!
//! | operation | medium            | anchor                              |
//! |-----------|-------------------|-------------------------------------|
//! | paste     | [`Transport`]     | selected node, or the top level     |
//! | duplicate | holding value     | parent of the first selected node   |
//!
//! Each top-level widget of a fragment is handled on its own: validated
//! against the anchor, given the anchor's children manager, renamed where
//! its names collide, moved off an occupied grid cell, then inserted.
//! A rejected widget is skipped and its siblings still go in.

use crate::document::Placement;
use crate::namespace::{
    collides, command_name, rename_command, rename_variable, variable_name, IdCounter,
};
use crate::{
    Document, EditSession, EditorError, EditorEvent, GridCell, Manager, NameKind, Namespace,
    NodeKey, Rejection, Validator, WidgetData, WidgetDef,
};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, warn};
use widgetree_catalog::Catalog;

/// System clipboard seam
pub trait Transport: fmt::Debug {
    fn read(&self) -> Option<String>;
    fn write(&mut self, content: String);
}

/// In-process clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    content: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }
}

impl Transport for MemoryClipboard {
    fn read(&self) -> Option<String> {
        self.content.clone()
    }

    fn write(&mut self, content: String) {
        self.content = Some(content);
    }
}

/// Result of a paste or duplicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteOutcome {
    /// Inserted top-level nodes, in fragment order
    pub inserted: Vec<NodeKey>,
    /// Top-level widgets rejected at the anchor
    pub skipped: usize,
    /// `(old, new)` names changed to keep the namespace collision free
    pub renamed: Vec<(String, String)>,
}

impl PasteOutcome {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
    }
}

/// Renames the names of incoming subtrees that collide with the tree or
/// with each other. A variable, command or handler referenced several
/// times in the fragment gets the same new name everywhere.
#[derive(Debug)]
pub(crate) struct Renamer {
    taken: HashMap<String, Vec<NameKind>>,
    renames: HashMap<(NameKind, String), String>,
    log: Vec<(String, String)>,
}

impl Renamer {
    pub(crate) fn new(doc: &Document) -> Self {
        Self {
            taken: Namespace::new(doc).names(),
            renames: HashMap::new(),
            log: Vec::new(),
        }
    }

    pub(crate) fn rename(&mut self, catalog: &Catalog, ids: &mut IdCounter, def: &mut WidgetDef) {
        self.rename_widget(catalog, ids, &mut def.widget);
        for child in &mut def.children {
            self.rename(catalog, ids, child);
        }
    }

    pub(crate) fn into_log(self) -> Vec<(String, String)> {
        self.log
    }

    fn reserve(&mut self, kind: NameKind, name: &str) {
        let kinds = self.taken.entry(name.to_string()).or_default();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    fn used_as(&self, name: &str) -> &[NameKind] {
        self.taken.get(name).map_or(&[], Vec::as_slice)
    }

    fn rename_widget(&mut self, catalog: &Catalog, ids: &mut IdCounter, data: &mut WidgetData) {
        let old = data.identifier.clone();
        if old.is_empty() || collides(NameKind::Identifier, self.used_as(&old)) {
            let taken = &self.taken;
            let new = ids.unique_id(catalog, &data.classname, &old, |n| taken.contains_key(n));
            debug!(old = %old, new = %new, "Renamed pasted identifier");
            self.log.push((old, new.clone()));
            data.identifier = new;
        }
        let identifier = data.identifier.clone();
        self.reserve(NameKind::Identifier, &identifier);

        let classname = data.classname.clone();
        for property in data.properties.iter_mut() {
            if catalog.is_tkvar_property(&classname, &property.name) {
                let name = variable_name(&property.value).to_string();
                if name.is_empty() {
                    continue;
                }
                let new = self.resolve(ids, NameKind::Variable, &name);
                if new != name {
                    property.value = rename_variable(&property.value, &new);
                }
            } else if catalog.is_command_property(&classname, &property.name) {
                if let Some(name) = command_name(&property.value) {
                    let new = self.resolve(ids, NameKind::Command, &name);
                    if new != name {
                        property.value = rename_command(&property.value, &new);
                    }
                }
            }
        }

        for binding in &mut data.bindings {
            if binding.handler.is_empty() {
                continue;
            }
            let handler = binding.handler.clone();
            binding.handler = self.resolve(ids, NameKind::Handler, &handler);
        }
    }

    fn resolve(&mut self, ids: &IdCounter, kind: NameKind, name: &str) -> String {
        if let Some(mapped) = self.renames.get(&(kind, name.to_string())) {
            return mapped.clone();
        }

        let new = if collides(kind, self.used_as(name)) {
            let taken = &self.taken;
            ids.unique_name(name, |n| taken.contains_key(n))
        } else {
            name.to_string()
        };

        if new != name {
            self.renames.insert((kind, name.to_string()), new.clone());
            self.log.push((name.to_string(), new.clone()));
        }
        self.reserve(kind, &new);
        new
    }
}

impl EditSession {
    /// Selected nodes whose ancestors are not selected too, in selection
    /// order
    fn selection_roots(&self) -> Vec<NodeKey> {
        let doc = self.document();
        self.selection()
            .iter()
            .copied()
            .filter(|k| doc.contains(*k))
            .filter(|k| !self.selection().iter().any(|other| doc.is_ancestor(*other, *k)))
            .collect()
    }

    fn encode_selection(&self) -> Result<Option<String>, EditorError> {
        let roots = self.selection_roots();
        if roots.is_empty() {
            return Ok(None);
        }
        let widgets = roots
            .iter()
            .map(|key| self.document().to_def(*key))
            .collect::<Result<Vec<_>, _>>()?;
        let fragment = crate::Fragment::new(self.config().author.clone(), widgets);
        Ok(Some(self.codec.encode(&fragment)?))
    }

    /// Serialize the selected subtrees to the transport. Returns the number
    /// of copied subtrees.
    pub fn copy(&mut self) -> Result<usize, EditorError> {
        let count = self.selection_roots().len();
        match self.encode_selection()? {
            Some(text) => {
                self.transport.write(text);
                debug!(count, "Copied selection");
                Ok(count)
            }
            None => Ok(0),
        }
    }

    /// Copy, then delete the selection
    pub fn cut(&mut self) -> Result<usize, EditorError> {
        let count = self.copy()?;
        if count > 0 {
            self.delete_selection();
        }
        Ok(count)
    }

    /// Duplicate needs a non-empty selection under a single parent
    pub fn can_duplicate(&self) -> bool {
        let doc = self.document();
        let mut parents = self.selection().iter().filter(|k| doc.contains(**k)).map(|k| doc.parent(*k));
        match parents.next() {
            Some(first) => parents.all(|p| p == first),
            None => false,
        }
    }

    /// Copy the selection into the holding value and paste it under the
    /// parent of the first selected node. The transport is left alone.
    pub fn duplicate(&mut self) -> Result<PasteOutcome, EditorError> {
        if !self.can_duplicate() {
            debug!(selected = self.selection().len(), "Duplicate needs one parent");
            return Ok(PasteOutcome::default());
        }
        let anchor = self.selection().first().and_then(|k| self.document().parent(*k));
        let Some(text) = self.encode_selection()? else {
            return Ok(PasteOutcome::default());
        };
        self.holding = Some(text.clone());
        self.with_filter_suspended(|s| s.paste_text(&text, anchor))
    }

    /// Insert the transport content under the selected node (or at the top
    /// level when nothing is selected)
    pub fn paste(&mut self) -> Result<PasteOutcome, EditorError> {
        let Some(text) = self.transport.read() else {
            debug!("Clipboard is empty");
            return Ok(PasteOutcome::default());
        };
        let anchor = self.selection().first().copied();
        self.with_filter_suspended(|s| s.paste_text(&text, anchor))
    }

    pub(crate) fn paste_text(
        &mut self,
        text: &str,
        anchor: Option<NodeKey>,
    ) -> Result<PasteOutcome, EditorError> {
        let fragment = match self.codec.decode(text) {
            Ok(fragment) => fragment,
            Err(err) => {
                error!(error = %err, "Invalid clipboard content");
                return Ok(PasteOutcome::default());
            }
        };
        let catalog = self.document().catalog_arc();
        fragment.check_classes(&catalog)?;

        let mut outcome = PasteOutcome::default();
        let mut renamer = Renamer::new(self.document());

        for mut def in fragment.widgets {
            if let Err(err) = Validator::new(self.document()).check(anchor, &def.widget.classname) {
                warn!(classname = %def.widget.classname, error = %err, "Skipping pasted widget");
                outcome.skipped += 1;
                continue;
            }

            if let Err(rejection) = self.reconcile_layout(anchor, &mut def.widget) {
                warn!(classname = %def.widget.classname, error = %rejection, "Skipping pasted widget");
                outcome.skipped += 1;
                continue;
            }
            renamer.rename(&catalog, &mut self.ids, &mut def);

            let index = self.document().children(anchor).len();
            match self.document.insert_tree(anchor, index, def, Placement::Exact) {
                Ok(key) => outcome.inserted.push(key),
                Err(err) if err.is_rejection() => {
                    warn!(error = %err, "Skipping pasted widget");
                    outcome.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        outcome.renamed = renamer.into_log();

        if let Some(last) = outcome.inserted.last().copied() {
            let toplevel = self.document().toplevel_of(last);
            self.document.emit(EditorEvent::Redraw { toplevel });
            self.select(vec![last]);
            self.document.emit(EditorEvent::Reveal { key: last });
        }
        debug!(
            inserted = outcome.inserted.len(),
            skipped = outcome.skipped,
            renamed = outcome.renamed.len(),
            "Pasted fragment"
        );
        Ok(outcome)
    }

    /// Give an incoming top-level widget the anchor's children manager, or
    /// the configured default while the anchor has none, and a free grid row
    fn reconcile_layout(&self, anchor: Option<NodeKey>, data: &mut WidgetData) -> Result<(), Rejection> {
        let doc = self.document();
        let Some(container) = anchor else {
            return Ok(());
        };
        if !doc.needs_layout(&data.classname) {
            return Ok(());
        }

        let layout = doc.layout();
        if data.manager != Manager::Place {
            data.manager = layout
                .children_manager(Some(container), None)
                .unwrap_or(self.config().default_layout_manager);
        }

        if data.manager == Manager::Grid {
            let cell = match data.cell() {
                Some(cell) => GridCell::new(layout.available_row(Some(container), cell, None)?, cell.column),
                None => GridCell::new(layout.next_row(Some(container), None)?, 0),
            };
            data.set_cell(cell);
        } else {
            data.clear_cell();
        }
        Ok(())
    }
}
