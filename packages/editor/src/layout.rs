//! # Layout Coordinator
//!
//! Keeps the children of each container on one layout manager and keeps
//! their grid cells distinct.
//!
//! Widgets using `place` are positioned independently and never take part
//! in sibling consistency. Widgets whose class is not positioned at all
//! (menus, notebook tabs) are ignored as well. Top-level nodes are separate
//! windows and are not coordinated with each other.
//!
//! Read-only questions go through [`Layout`]; the batch edits
//! ([`Document::change_container_manager`], [`Document::grid_move`],
//! [`Document::set_manager`]) validate up front and then always complete.

use crate::document::Placement;
use crate::{Document, EditorError, GridCell, Manager, NodeKey, Rejection, WidgetData};
use tracing::debug;

/// What an edit panel needs to know about a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Manager used by the children, `None` while undetermined
    pub manager: Option<Manager>,
    pub has_children: bool,
    /// Grid size as `(rows, columns)`; zero when no child uses grid
    pub grid_dim: (u32, u32),
}

/// Direction of a one-cell grid nudge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn shift(self, cell: GridCell) -> Option<GridCell> {
        match self {
            Direction::Up => cell.row.checked_sub(1).map(|row| GridCell::new(row, cell.column)),
            Direction::Down => cell.row.checked_add(1).map(|row| GridCell::new(row, cell.column)),
            Direction::Left => cell.column.checked_sub(1).map(|col| GridCell::new(cell.row, col)),
            Direction::Right => cell.column.checked_add(1).map(|col| GridCell::new(cell.row, col)),
        }
    }
}

/// Layout queries over a live document
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    doc: &'a Document,
}

impl<'a> Layout<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Children of `parent` that follow the container's manager
    fn coordinated(
        &self,
        parent: Option<NodeKey>,
        excluding: Option<NodeKey>,
    ) -> impl Iterator<Item = (NodeKey, &'a WidgetData)> + 'a {
        let doc = self.doc;
        doc.children(parent)
            .iter()
            .copied()
            .filter(move |k| Some(*k) != excluding)
            .filter_map(move |k| doc.get(k).map(|data| (k, data)))
            .filter(move |(_, data)| doc.needs_layout(&data.classname))
    }

    /// Manager used by the children of `parent`, ignoring `place` widgets
    /// and `excluding`. `None` when no child determines it yet.
    pub fn children_manager(&self, parent: Option<NodeKey>, excluding: Option<NodeKey>) -> Option<Manager> {
        self.coordinated(parent, excluding)
            .map(|(_, data)| data.manager)
            .find(|m| *m != Manager::Place)
    }

    /// Highest grid row among the children of `parent`
    pub fn max_row(&self, parent: Option<NodeKey>, excluding: Option<NodeKey>) -> Option<u32> {
        self.coordinated(parent, excluding)
            .filter(|(_, data)| data.manager == Manager::Grid)
            .filter_map(|(_, data)| data.row())
            .max()
    }

    /// Row given to a new grid child: one past the last row, or 0 at the
    /// top level and in empty containers
    pub fn next_row(&self, parent: Option<NodeKey>, excluding: Option<NodeKey>) -> Result<u32, Rejection> {
        if parent.is_none() {
            return Ok(0);
        }
        match self.max_row(parent, excluding) {
            Some(row) => row.checked_add(1).ok_or(Rejection::GridFull(row)),
            None => Ok(0),
        }
    }

    pub fn is_occupied(&self, parent: Option<NodeKey>, cell: GridCell, excluding: Option<NodeKey>) -> bool {
        parent.is_some()
            && self
                .coordinated(parent, excluding)
                .any(|(_, data)| data.cell() == Some(cell))
    }

    /// Row for an incoming node at `cell`. Siblings in the same column are
    /// scanned; when one sits exactly on `cell` the node goes below the last
    /// of them, otherwise its row is kept. The column is never changed.
    pub fn available_row(
        &self,
        parent: Option<NodeKey>,
        cell: GridCell,
        excluding: Option<NodeKey>,
    ) -> Result<u32, Rejection> {
        let mut max_row = 0;
        let mut collides = false;
        for (_, data) in self.coordinated(parent, excluding) {
            if let Some(other) = data.cell() {
                if other.column != cell.column {
                    continue;
                }
                collides |= other.row == cell.row;
                max_row = max_row.max(other.row);
            }
        }
        if collides {
            max_row.checked_add(1).ok_or(Rejection::GridFull(max_row))
        } else {
            Ok(cell.row)
        }
    }

    /// `(rows, columns)` spanned by the grid children of `parent`
    pub fn grid_dim(&self, parent: Option<NodeKey>) -> (u32, u32) {
        self.coordinated(parent, None)
            .filter_map(|(_, data)| data.cell())
            .fold((0, 0), |(rows, cols), cell| {
                (
                    rows.max(cell.row.saturating_add(1)),
                    cols.max(cell.column.saturating_add(1)),
                )
            })
    }

    pub fn container_info(&self, key: NodeKey) -> Result<ContainerInfo, EditorError> {
        let node = self.doc.node(key)?;
        Ok(ContainerInfo {
            manager: self.children_manager(Some(key), None),
            has_children: !node.children().is_empty(),
            grid_dim: self.grid_dim(Some(key)),
        })
    }

    /// Managers `key` may switch to without clashing with its siblings
    pub fn allowed_managers(&self, key: NodeKey) -> Result<Vec<Manager>, EditorError> {
        let parent = self.doc.node(key)?.parent();
        let excluded = match self.children_manager(parent, Some(key)) {
            Some(Manager::Grid) if parent.is_some() => Some(Manager::Pack),
            Some(Manager::Pack) if parent.is_some() => Some(Manager::Grid),
            _ => None,
        };
        Ok(Manager::ALL
            .iter()
            .copied()
            .filter(|m| Some(*m) != excluded)
            .collect())
    }
}

impl Document {
    pub fn layout(&self) -> Layout<'_> {
        Layout::new(self)
    }

    /// Position an incoming node under `parent` according to `placement`
    pub(crate) fn place(
        &self,
        parent: Option<NodeKey>,
        moving: Option<NodeKey>,
        data: &mut WidgetData,
        placement: Placement,
    ) -> Result<(), Rejection> {
        if placement == Placement::Verbatim || !self.needs_layout(&data.classname) {
            return Ok(());
        }

        let layout = self.layout();
        let Some(container) = parent else {
            if placement == Placement::Auto && data.manager == Manager::Grid && data.cell().is_none() {
                data.set_cell(GridCell::new(0, 0));
            }
            return Ok(());
        };
        let siblings = layout.children_manager(Some(container), moving);

        match placement {
            Placement::Auto => {
                if data.manager != Manager::Place {
                    if let Some(manager) = siblings {
                        data.manager = manager;
                    }
                }
                if data.manager == Manager::Grid {
                    match data.cell() {
                        None => {
                            let row = layout.next_row(parent, moving)?;
                            data.set_cell(GridCell::new(row, 0));
                        }
                        Some(cell) if layout.is_occupied(parent, cell, moving) => {
                            let row = layout.available_row(parent, cell, moving)?;
                            data.set_cell(GridCell::new(row, cell.column));
                        }
                        Some(_) => {}
                    }
                } else {
                    data.clear_cell();
                }
            }
            Placement::Exact => {
                if let Some(siblings) = siblings {
                    if data.manager != Manager::Place && data.manager != siblings {
                        return Err(Rejection::ManagerConflict {
                            requested: data.manager,
                            siblings,
                        });
                    }
                }
                if let Some(cell) = data.cell() {
                    if layout.is_occupied(parent, cell, moving) {
                        return Err(Rejection::CellOccupied(cell));
                    }
                }
            }
            Placement::Verbatim => {}
        }
        Ok(())
    }

    /// Switch the children of `container` to `manager`.
    ///
    /// Every child not using `place` switches, plus `include` whatever its
    /// current manager. Children moved to grid get rows 0, 1, 2... in child
    /// order, column 0; children leaving grid lose their row and column.
    /// Commits once for the whole batch, including when only the
    /// container's recorded manager changed.
    pub fn change_container_manager(
        &mut self,
        container: NodeKey,
        manager: Manager,
        include: Option<NodeKey>,
    ) -> Result<usize, EditorError> {
        self.node(container)?;
        if let Some(key) = include {
            if self.parent(key) != Some(container) || !self.contains(key) {
                return Err(EditorError::NodeNotFound(key));
            }
        }

        let targets: Vec<(NodeKey, WidgetData)> = self
            .layout()
            .coordinated(Some(container), None)
            .filter(|(k, data)| data.manager != Manager::Place || Some(*k) == include)
            .map(|(k, data)| (k, data.clone()))
            .collect();

        let mut row = 0;
        let mut switched = 0;
        for (key, mut data) in targets {
            let before = data.clone();
            data.manager = manager;
            if manager == Manager::Grid {
                data.set_cell(GridCell::new(row, 0));
                row += 1;
            } else {
                data.clear_cell();
            }
            if data != before {
                self.store_data(key, data);
                switched += 1;
            }
        }

        let recorded = manager != Manager::Place && self.set_container_manager(container, Some(manager));

        if switched > 0 || recorded {
            self.commit();
        }
        debug!(container = ?container, manager = %manager, switched, "Changed container manager");
        Ok(switched)
    }

    /// Switch a single widget's manager. Clashing with the siblings'
    /// manager is rejected unless `place` is requested.
    pub fn set_manager(&mut self, key: NodeKey, manager: Manager) -> Result<(), EditorError> {
        let node = self.node(key)?;
        let parent = node.parent();
        let mut data = node.data().clone();
        if data.manager == manager {
            return Ok(());
        }

        let layout = self.layout();
        if manager != Manager::Place && parent.is_some() {
            if let Some(siblings) = layout.children_manager(parent, Some(key)) {
                if siblings != manager {
                    return Err(Rejection::ManagerConflict { requested: manager, siblings }.into());
                }
            }
        }

        data.manager = manager;
        if manager == Manager::Grid {
            let keep = data
                .cell()
                .filter(|cell| !layout.is_occupied(parent, *cell, Some(key)));
            if keep.is_none() {
                let row = layout.next_row(parent, Some(key))?;
                data.set_cell(GridCell::new(row, 0));
            }
        } else {
            data.clear_cell();
        }

        self.store_data(key, data);
        self.commit();
        Ok(())
    }

    /// Nudge grid widgets one cell in `direction`. Stops at the first
    /// widget not on grid; widgets at the edge or facing an occupied cell
    /// stay put. Returns the widgets that moved.
    pub fn grid_move(&mut self, keys: &[NodeKey], direction: Direction) -> Vec<NodeKey> {
        let mut moved = Vec::new();
        for key in keys {
            let Some(data) = self.get(*key) else {
                continue;
            };
            let Some(cell) = data.cell() else {
                break;
            };
            let Some(target) = direction.shift(cell) else {
                continue;
            };
            let parent = self.parent(*key);
            if self.layout().is_occupied(parent, target, Some(*key)) {
                debug!(key = ?key, row = target.row, column = target.column, "Grid cell occupied");
                continue;
            }
            let mut data = data.clone();
            data.set_cell(target);
            self.store_data(*key, data);
            moved.push(*key);
        }
        if !moved.is_empty() {
            self.commit();
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use widgetree_catalog::{Catalog, ComponentSpec};

    fn doc() -> Document {
        let catalog = Catalog::from_specs(vec![
            ComponentSpec::new("Frame").container(),
            ComponentSpec::new("Label"),
            ComponentSpec::new("Menu").without_layout(),
        ])
        .unwrap();
        Document::new(Arc::new(catalog))
    }

    fn label(id: &str, manager: Manager) -> WidgetData {
        WidgetData::new("Label", id, manager)
    }

    #[test]
    fn test_children_manager_skips_place_and_excluded() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        let placed = doc.append(Some(frame), label("a", Manager::Place)).unwrap();
        assert_eq!(doc.layout().children_manager(Some(frame), None), None);

        let gridded = doc.append(Some(frame), label("b", Manager::Grid)).unwrap();
        assert_eq!(doc.layout().children_manager(Some(frame), None), Some(Manager::Grid));
        assert_eq!(doc.layout().children_manager(Some(frame), Some(gridded)), None);
        assert_eq!(doc.get(placed).unwrap().manager, Manager::Place);
    }

    #[test]
    fn test_new_child_adopts_manager_and_next_row() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        let a = doc.append(Some(frame), label("a", Manager::Grid)).unwrap();
        let b = doc.append(Some(frame), label("b", Manager::Pack)).unwrap();
        let c = doc.append(Some(frame), label("c", Manager::Place)).unwrap();

        assert_eq!(doc.cell(a), Some(GridCell::new(0, 0)));
        assert_eq!(doc.get(b).unwrap().manager, Manager::Grid);
        assert_eq!(doc.cell(b), Some(GridCell::new(1, 0)));
        assert_eq!(doc.get(c).unwrap().manager, Manager::Place);
    }

    #[test]
    fn test_available_row_same_column_only() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        doc.append(Some(frame), label("a", Manager::Grid).with_cell(2, 0)).unwrap();
        doc.append(Some(frame), label("b", Manager::Grid).with_cell(5, 1)).unwrap();

        let layout = doc.layout();
        assert_eq!(layout.available_row(Some(frame), GridCell::new(2, 0), None), Ok(3));
        assert_eq!(layout.available_row(Some(frame), GridCell::new(2, 1), None), Ok(2));
        assert_eq!(layout.available_row(Some(frame), GridCell::new(4, 0), None), Ok(4));
    }

    #[test]
    fn test_pack_to_grid_switch() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        let kids: Vec<NodeKey> = ["a", "b", "c"]
            .iter()
            .map(|id| doc.append(Some(frame), label(id, Manager::Pack)).unwrap())
            .collect();
        let mut free = label("d", Manager::Place);
        free.layout.set("x", "10");
        let placed = doc.append(Some(frame), free).unwrap();
        let placed_before = doc.get(placed).unwrap().clone();
        doc.take_events();

        let switched = doc.change_container_manager(frame, Manager::Grid, None).unwrap();
        assert_eq!(switched, 3);
        for (row, key) in kids.iter().enumerate() {
            assert_eq!(doc.cell(*key), Some(GridCell::new(row as u32, 0)));
        }
        assert_eq!(doc.get(placed).unwrap(), &placed_before);
        assert_eq!(doc.get(frame).unwrap().container_manager, Some(Manager::Grid));

        let changed = doc
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, crate::EditorEvent::DocumentChanged { .. }))
            .count();
        assert_eq!(changed, 1);

        doc.change_container_manager(frame, Manager::Pack, None).unwrap();
        assert!(doc.get(kids[0]).unwrap().layout.is_empty());
    }

    #[test]
    fn test_switching_empty_container_is_committed() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        doc.take_events();
        let version = doc.version;

        assert_eq!(doc.change_container_manager(frame, Manager::Grid, None).unwrap(), 0);
        assert_eq!(doc.get(frame).unwrap().container_manager, Some(Manager::Grid));
        assert_eq!(doc.version, version + 1);
        assert!(doc.take_events().contains(&crate::EditorEvent::DocumentChanged { dirty: true }));

        doc.change_container_manager(frame, Manager::Grid, None).unwrap();
        assert_eq!(doc.version, version + 1);
        assert!(doc.take_events().is_empty());
    }

    #[test]
    fn test_set_manager_conflict() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        let a = doc.append(Some(frame), label("a", Manager::Pack)).unwrap();
        let b = doc.append(Some(frame), label("b", Manager::Pack)).unwrap();

        let err = doc.set_manager(b, Manager::Grid).unwrap_err();
        assert!(matches!(err, EditorError::Rejected(Rejection::ManagerConflict { .. })));

        doc.set_manager(b, Manager::Place).unwrap();
        doc.set_manager(a, Manager::Grid).unwrap();
        assert_eq!(doc.cell(a), Some(GridCell::new(0, 0)));
        assert_eq!(doc.layout().allowed_managers(b).unwrap(), vec![Manager::Grid, Manager::Place]);
    }

    #[test]
    fn test_grid_move() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        let a = doc.append(Some(frame), label("a", Manager::Grid)).unwrap();
        let b = doc.append(Some(frame), label("b", Manager::Grid)).unwrap();

        assert!(doc.grid_move(&[a], Direction::Up).is_empty());
        assert!(doc.grid_move(&[a], Direction::Down).is_empty());
        assert_eq!(doc.grid_move(&[b], Direction::Right), vec![b]);
        assert_eq!(doc.cell(b), Some(GridCell::new(1, 1)));
        assert_eq!(doc.grid_move(&[a], Direction::Down), vec![a]);
        assert_eq!(doc.cell(a), Some(GridCell::new(1, 0)));
    }

    #[test]
    fn test_grid_at_largest_index() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        let corner = doc
            .append(Some(frame), label("a", Manager::Grid).with_cell(u32::MAX, u32::MAX))
            .unwrap();

        assert!(doc.grid_move(&[corner], Direction::Down).is_empty());
        assert!(doc.grid_move(&[corner], Direction::Right).is_empty());
        assert_eq!(doc.cell(corner), Some(GridCell::new(u32::MAX, u32::MAX)));
        assert_eq!(doc.layout().grid_dim(Some(frame)), (u32::MAX, u32::MAX));
        assert_eq!(doc.layout().next_row(Some(frame), None), Err(Rejection::GridFull(u32::MAX)));

        let err = doc.append(Some(frame), label("b", Manager::Grid)).unwrap_err();
        assert!(matches!(err, EditorError::Rejected(Rejection::GridFull(_))));
        let err = doc
            .append(Some(frame), label("c", Manager::Grid).with_cell(u32::MAX, u32::MAX))
            .unwrap_err();
        assert!(matches!(err, EditorError::Rejected(Rejection::GridFull(_))));
        assert_eq!(doc.children(Some(frame)).len(), 1);

        assert_eq!(doc.grid_move(&[corner], Direction::Up), vec![corner]);
        assert_eq!(doc.cell(corner), Some(GridCell::new(u32::MAX - 1, u32::MAX)));
    }

    #[test]
    fn test_container_info() {
        let mut doc = doc();
        let frame = doc.append(None, WidgetData::new("Frame", "f", Manager::Pack)).unwrap();
        doc.append(Some(frame), label("a", Manager::Grid).with_cell(0, 2)).unwrap();
        doc.append(Some(frame), label("b", Manager::Grid).with_cell(3, 0)).unwrap();

        let info = doc.layout().container_info(frame).unwrap();
        assert_eq!(info.manager, Some(Manager::Grid));
        assert!(info.has_children);
        assert_eq!(info.grid_dim, (4, 3));
    }
}
