//! # Structural Validator
//!
//! Decides whether a component class may be inserted under a given parent.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. parent declares an explicit child set that lacks the class
//! 2. parent is already at its `max_children`
//! 3. class declares `allowed_parents` that lack the parent class
//! 4. parent has no explicit child set and is not a container
//! 5. at root: class must allow `root`, or be a container when its
//!    parents are unspecified

use crate::{Document, EditorError, NodeKey, Rejection};
use tracing::debug;
use widgetree_catalog::ComponentSpec;

/// Check a class against an (optional) parent spec and its current child count
pub fn check_constraints(
    parent: Option<(&ComponentSpec, usize)>,
    child: &ComponentSpec,
) -> Result<(), Rejection> {
    match parent {
        Some((parent, child_count)) => {
            if let Some(allowed) = parent.explicit_children() {
                if !allowed.iter().any(|c| c == &child.classname) {
                    return Err(Rejection::ChildNotAllowed {
                        parent: parent.classname.clone(),
                        child: child.classname.clone(),
                        allowed: allowed.to_vec(),
                    });
                }
            }

            if let Some(max) = parent.max_children {
                if child_count >= max {
                    return Err(Rejection::TooManyChildren {
                        parent: parent.classname.clone(),
                        max,
                    });
                }
            }

            if !child.accepts_parent(&parent.classname) {
                return Err(Rejection::ParentNotAllowed {
                    parent: parent.classname.clone(),
                    child: child.classname.clone(),
                });
            }

            if parent.explicit_children().is_none() && !parent.container {
                return Err(Rejection::NotAContainer {
                    parent: parent.classname.clone(),
                });
            }

            Ok(())
        }
        None => {
            if child.allowed_at_root() {
                Ok(())
            } else if child.allowed_parents.is_some() {
                Err(Rejection::NotAllowedAtRoot {
                    child: child.classname.clone(),
                })
            } else {
                Err(Rejection::RootRequiresContainer {
                    child: child.classname.clone(),
                })
            }
        }
    }
}

/// Validator bound to a live document
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    doc: &'a Document,
}

impl<'a> Validator<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Diagnostic check of inserting `classname` under `parent` (`None` = root)
    pub fn check(&self, parent: Option<NodeKey>, classname: &str) -> Result<(), EditorError> {
        self.check_with_count(parent, classname, None)
    }

    /// Like [`check`](Self::check), but pretends `moving` is not yet a child
    /// of `parent` (used when re-inserting a node under its own parent)
    pub fn check_move(
        &self,
        parent: Option<NodeKey>,
        classname: &str,
        moving: NodeKey,
    ) -> Result<(), EditorError> {
        self.check_with_count(parent, classname, Some(moving))
    }

    /// Boolean form used for menu state and the leaf fallback
    pub fn can_insert(&self, parent: Option<NodeKey>, classname: &str) -> bool {
        match self.check(parent, classname) {
            Ok(()) => true,
            Err(err) => {
                debug!(classname, error = %err, "Insertion not valid");
                false
            }
        }
    }

    fn check_with_count(
        &self,
        parent: Option<NodeKey>,
        classname: &str,
        moving: Option<NodeKey>,
    ) -> Result<(), EditorError> {
        let catalog = self.doc.catalog();
        let child = catalog.require(classname)?;

        let parent = match parent {
            Some(key) => {
                let node = self.doc.node(key)?;
                let spec = catalog.require(&node.data().classname)?;
                let count = node
                    .children()
                    .iter()
                    .filter(|c| Some(**c) != moving)
                    .count();
                Some((spec, count))
            }
            None => None,
        };

        check_constraints(parent, child)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> ComponentSpec {
        ComponentSpec::new("Frame").container()
    }

    fn menu() -> ComponentSpec {
        ComponentSpec::new("Menu").with_allowed_parents(Vec::<String>::new())
    }

    #[test]
    fn test_menu_rejected_under_frame_accepted_at_root() {
        let err = check_constraints(Some((&frame(), 0)), &menu()).unwrap_err();
        assert_eq!(
            err,
            Rejection::ParentNotAllowed {
                parent: "Frame".into(),
                child: "Menu".into()
            }
        );

        assert!(check_constraints(None, &menu()).is_ok());
    }

    #[test]
    fn test_explicit_children_checked_first() {
        let notebook = ComponentSpec::new("Notebook")
            .with_allowed_children(["Tab"])
            .with_max_children(0);
        let button = ComponentSpec::new("Button");

        let err = check_constraints(Some((&notebook, 0)), &button).unwrap_err();
        assert!(matches!(err, Rejection::ChildNotAllowed { .. }));
    }

    #[test]
    fn test_max_children() {
        let tab = ComponentSpec::new("Tab").container().with_max_children(1);
        let label = ComponentSpec::new("Label");

        assert!(check_constraints(Some((&tab, 0)), &label).is_ok());
        assert_eq!(
            check_constraints(Some((&tab, 1)), &label).unwrap_err(),
            Rejection::TooManyChildren { parent: "Tab".into(), max: 1 }
        );
    }

    #[test]
    fn test_leaf_parent_rejected() {
        let label = ComponentSpec::new("Label");
        let button = ComponentSpec::new("Button");

        assert_eq!(
            check_constraints(Some((&label, 0)), &button).unwrap_err(),
            Rejection::NotAContainer { parent: "Label".into() }
        );
    }

    #[test]
    fn test_explicit_children_allow_non_container() {
        let notebook = ComponentSpec::new("Notebook").with_allowed_children(["Tab"]);
        let tab = ComponentSpec::new("Tab").with_allowed_parents(["Notebook"]);
        assert!(check_constraints(Some((&notebook, 3)), &tab).is_ok());
    }

    #[test]
    fn test_root_rules() {
        assert!(check_constraints(None, &frame()).is_ok());

        assert_eq!(
            check_constraints(None, &ComponentSpec::new("Label")).unwrap_err(),
            Rejection::RootRequiresContainer { child: "Label".into() }
        );

        let tab = ComponentSpec::new("Tab").container().with_allowed_parents(["Notebook"]);
        assert_eq!(
            check_constraints(None, &tab).unwrap_err(),
            Rejection::NotAllowedAtRoot { child: "Tab".into() }
        );

        let toplevel = ComponentSpec::new("Toplevel").with_allowed_parents(["root"]);
        assert!(check_constraints(None, &toplevel).is_ok());
    }
}
