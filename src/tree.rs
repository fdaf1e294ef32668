//! Spec tree: the structural representation of declared groups and items.
//!
//! A tree is built once per run, rewritten any number of times by the hook
//! combinators (identical shape and sibling order, transformed actions),
//! then consumed by the runner. Nothing here executes anything.

use crate::outcome::{Outcome, SourceLocation};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A one-shot executable effect taking a borrowed parameter of type `P`.
///
/// Items and cleanups both store this shape, so hook composition can rewrite
/// every action in a tree uniformly.
pub type ActionWith<P> = Box<dyn FnOnce(&P) -> Outcome + Send>;

/// A leaf test case.
pub struct Item<P> {
    /// Human-readable requirement this item verifies.
    pub requirement: String,
    /// Where the item was declared, when the caller captured it.
    pub location: Option<SourceLocation>,
    /// Whether the runner may execute this item off the reporting thread.
    pub parallel: bool,
    /// The composed executable action.
    pub action: ActionWith<P>,
}

/// A node in the spec tree.
///
/// `P` is the parameter type every contained item's action consumes. Hook
/// composition rebuilds the tree with a possibly different parameter type.
/// Sibling order is the sequential-execution and report-nesting contract.
pub enum SpecTree<P> {
    /// A named, ordered collection of subtrees. Purely structural.
    Group {
        name: String,
        children: Vec<SpecTree<P>>,
    },
    /// A leaf test case.
    Item(Item<P>),
    /// Runs `cleanup` exactly once after every item under `children` has
    /// finished, whatever their outcomes.
    WithCleanup {
        cleanup: ActionWith<P>,
        children: Vec<SpecTree<P>>,
    },
}

/// An ordered sequence of sibling trees, as produced by the builder.
pub type SpecForest<P> = Vec<SpecTree<P>>;

// ============================================================================
// TRAVERSAL AND REWRITING
// ============================================================================

impl<P: 'static> SpecTree<P> {
    /// Rewrites every item, preserving tree shape and sibling order.
    ///
    /// Used for marking items parallelizable and similar item-local edits;
    /// total over any shape, including empty groups.
    pub fn map_items<F>(self, f: &F) -> SpecTree<P>
    where
        F: Fn(Item<P>) -> Item<P>,
    {
        match self {
            SpecTree::Group { name, children } => SpecTree::Group {
                name,
                children: children.into_iter().map(|c| c.map_items(f)).collect(),
            },
            SpecTree::Item(item) => SpecTree::Item(f(item)),
            SpecTree::WithCleanup { cleanup, children } => SpecTree::WithCleanup {
                cleanup,
                children: children.into_iter().map(|c| c.map_items(f)).collect(),
            },
        }
    }

    /// Rebuilds the tree with every action, item and cleanup alike, passed
    /// through `wrap`. The shape is unchanged; the parameter type may not be.
    ///
    /// This is the structural engine behind the hook combinators.
    pub fn map_actions<Q, W>(self, wrap: &W) -> SpecTree<Q>
    where
        Q: 'static,
        W: Fn(ActionWith<P>) -> ActionWith<Q>,
    {
        match self {
            SpecTree::Group { name, children } => SpecTree::Group {
                name,
                children: children.into_iter().map(|c| c.map_actions(wrap)).collect(),
            },
            SpecTree::Item(item) => SpecTree::Item(Item {
                requirement: item.requirement,
                location: item.location,
                parallel: item.parallel,
                action: wrap(item.action),
            }),
            SpecTree::WithCleanup { cleanup, children } => SpecTree::WithCleanup {
                cleanup: wrap(cleanup),
                children: children.into_iter().map(|c| c.map_actions(wrap)).collect(),
            },
        }
    }

    /// Number of items in this subtree.
    pub fn item_count(&self) -> usize {
        match self {
            SpecTree::Item(_) => 1,
            SpecTree::Group { children, .. } | SpecTree::WithCleanup { children, .. } => {
                children.iter().map(SpecTree::item_count).sum()
            }
        }
    }
}

/// [`SpecTree::map_items`] across every root of a forest.
pub fn map_forest_items<P, F>(forest: SpecForest<P>, f: &F) -> SpecForest<P>
where
    P: 'static,
    F: Fn(Item<P>) -> Item<P>,
{
    forest.into_iter().map(|tree| tree.map_items(f)).collect()
}

/// [`SpecTree::map_actions`] across every root of a forest.
pub fn map_forest_actions<P, Q, W>(forest: SpecForest<P>, wrap: &W) -> SpecForest<Q>
where
    P: 'static,
    Q: 'static,
    W: Fn(ActionWith<P>) -> ActionWith<Q>,
{
    forest.into_iter().map(|tree| tree.map_actions(wrap)).collect()
}

/// Total number of items across a forest.
pub fn forest_item_count<P: 'static>(forest: &[SpecTree<P>]) -> usize {
    forest.iter().map(SpecTree::item_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(requirement: &str) -> SpecTree<()> {
        SpecTree::Item(Item {
            requirement: requirement.to_string(),
            location: None,
            parallel: false,
            action: Box::new(|_: &()| Outcome::Success),
        })
    }

    #[test]
    fn item_count_covers_nested_and_empty_groups() {
        let tree: SpecTree<()> = SpecTree::Group {
            name: "outer".into(),
            children: vec![
                leaf("a"),
                SpecTree::Group {
                    name: "empty".into(),
                    children: vec![],
                },
                SpecTree::WithCleanup {
                    cleanup: Box::new(|_: &()| Outcome::Success),
                    children: vec![leaf("b"), leaf("c")],
                },
            ],
        };
        assert_eq!(tree.item_count(), 3);
    }

    #[test]
    fn map_actions_preserves_shape_and_order() {
        let forest: SpecForest<()> = vec![
            SpecTree::Group {
                name: "g".into(),
                children: vec![leaf("first"), leaf("second")],
            },
            leaf("third"),
        ];
        let mapped: SpecForest<u32> = map_forest_actions(forest, &|inner: ActionWith<()>| {
            let wrapped: ActionWith<u32> = Box::new(move |_: &u32| inner(&()));
            wrapped
        });

        assert_eq!(forest_item_count(&mapped), 3);
        match &mapped[0] {
            SpecTree::Group { name, children } => {
                assert_eq!(name, "g");
                assert_eq!(children.len(), 2);
                match &children[0] {
                    SpecTree::Item(item) => assert_eq!(item.requirement, "first"),
                    _ => panic!("expected an item"),
                }
            }
            _ => panic!("expected a group"),
        }
    }

    #[test]
    fn mapped_actions_still_run() {
        let forest: SpecForest<()> = vec![leaf("runs")];
        let mapped = map_forest_actions(forest, &|inner: ActionWith<()>| {
            let wrapped: ActionWith<u8> = Box::new(move |_: &u8| inner(&()));
            wrapped
        });
        match mapped.into_iter().next() {
            Some(SpecTree::Item(item)) => {
                assert_eq!((item.action)(&7u8), Outcome::Success);
            }
            _ => panic!("expected an item"),
        }
    }
}
