//! Spec builder: the ordered-append surface callers declare suites through.
//!
//! Declaration methods (`describe`, `it`, `append`) take `&mut self` and
//! accumulate nodes in declaration order. Transformation methods (the hook
//! combinators, `parallel`, `sequential`) consume the builder and return one
//! wrapping the rewritten forest, possibly with a new parameter type.

use crate::example::Example;
use crate::hooks;
use crate::outcome::{IntoOutcome, SourceLocation};
use crate::tree::{forest_item_count, map_forest_items, ActionWith, Item, SpecForest, SpecTree};

/// An ordered accumulation of groups and items whose actions consume a
/// parameter of type `P` (`()` for plain suites).
///
/// # Examples
///
/// ```rust
/// use pramana::Spec;
/// let mut spec = Spec::new();
/// spec.describe("arithmetic", |s| {
///     s.it("adds", || 2 + 2 == 4);
///     s.it("subtracts", || 4 - 2 == 2);
/// });
/// assert_eq!(spec.item_count(), 2);
/// ```
pub struct Spec<P = ()> {
    nodes: SpecForest<P>,
}

impl<P: 'static> Default for Spec<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> Spec<P> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Wraps an existing forest for further declaration or transformation.
    pub fn from_forest(nodes: SpecForest<P>) -> Self {
        Self { nodes }
    }

    /// The accumulated forest, in declaration order.
    pub fn into_forest(self) -> SpecForest<P> {
        self.nodes
    }

    /// Number of items declared so far.
    pub fn item_count(&self) -> usize {
        forest_item_count(&self.nodes)
    }

    // ========================================================================
    // DECLARATION
    // ========================================================================

    /// Appends one named group whose children are whatever `body` declares.
    pub fn describe(&mut self, name: impl Into<String>, body: impl FnOnce(&mut Spec<P>)) {
        let mut inner = Spec::new();
        body(&mut inner);
        self.nodes.push(SpecTree::Group {
            name: name.into(),
            children: inner.nodes,
        });
    }

    /// Appends one item wrapping `example`'s run-with-parameter capability.
    pub fn it(&mut self, requirement: impl Into<String>, example: impl Example<Param = P>) {
        self.push_item(requirement.into(), None, example);
    }

    /// Like [`Spec::it`], with a source location attached for failure
    /// reports; pair with [`location!`](crate::location).
    pub fn it_at(
        &mut self,
        location: SourceLocation,
        requirement: impl Into<String>,
        example: impl Example<Param = P>,
    ) {
        self.push_item(requirement.into(), Some(location), example);
    }

    /// Appends one item from a closure that consumes the parameter.
    pub fn it_with<F, R>(&mut self, requirement: impl Into<String>, body: F)
    where
        F: FnOnce(&P) -> R + Send + 'static,
        R: IntoOutcome,
    {
        self.nodes.push(SpecTree::Item(Item {
            requirement: requirement.into(),
            location: None,
            parallel: false,
            action: Box::new(move |param: &P| body(param).into_outcome()),
        }));
    }

    /// Concatenates another builder's siblings after this one's, in order.
    pub fn append(&mut self, other: Spec<P>) {
        self.nodes.extend(other.nodes);
    }

    fn push_item<E: Example<Param = P>>(
        &mut self,
        requirement: String,
        location: Option<SourceLocation>,
        example: E,
    ) {
        self.nodes.push(SpecTree::Item(Item {
            requirement,
            location,
            parallel: false,
            action: Box::new(move |param: &P| example.run(param)),
        }));
    }

    // ========================================================================
    // EXECUTION MARKING
    // ========================================================================

    /// Marks every contained item as safe to run on the worker pool.
    pub fn parallel(self) -> Spec<P> {
        Spec {
            nodes: map_forest_items(self.nodes, &|mut item| {
                item.parallel = true;
                item
            }),
        }
    }

    /// Marks every contained item as reporting-thread only.
    pub fn sequential(self) -> Spec<P> {
        Spec {
            nodes: map_forest_items(self.nodes, &|mut item| {
                item.parallel = false;
                item
            }),
        }
    }

    // ========================================================================
    // HOOKS
    // ========================================================================
    //
    // Thin wrappers over the forest-level combinators in `hooks`; see that
    // module for ordering and memoization semantics.

    /// See [`hooks::around_with`].
    pub fn around_with<Q, W>(self, wrap: W) -> Spec<Q>
    where
        Q: 'static,
        W: Fn(ActionWith<P>) -> ActionWith<Q>,
    {
        Spec {
            nodes: hooks::around_with(self.nodes, wrap),
        }
    }

    /// See [`hooks::before`].
    pub fn before<S>(self, setup: S) -> Spec<()>
    where
        S: Fn() -> P + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::before(self.nodes, setup),
        }
    }

    /// See [`hooks::before_`].
    pub fn before_<S>(self, setup: S) -> Spec<P>
    where
        S: Fn() + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::before_(self.nodes, setup),
        }
    }

    /// See [`hooks::before_with`].
    pub fn before_with<Q, T>(self, transform: T) -> Spec<Q>
    where
        Q: 'static,
        T: Fn(&Q) -> P + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::before_with(self.nodes, transform),
        }
    }

    /// See [`hooks::before_all`].
    pub fn before_all<S>(self, setup: S) -> Spec<()>
    where
        P: Send + Sync,
        S: Fn() -> P + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::before_all(self.nodes, setup),
        }
    }

    /// See [`hooks::before_all_`].
    pub fn before_all_<S>(self, setup: S) -> Spec<P>
    where
        S: Fn() + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::before_all_(self.nodes, setup),
        }
    }

    /// See [`hooks::after`].
    pub fn after<C>(self, cleanup: C) -> Spec<P>
    where
        C: Fn(&P) + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::after(self.nodes, cleanup),
        }
    }

    /// See [`hooks::after_`].
    pub fn after_<C>(self, cleanup: C) -> Spec<P>
    where
        C: Fn() + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::after_(self.nodes, cleanup),
        }
    }

    /// See [`hooks::after_all`].
    pub fn after_all<C>(self, cleanup: C) -> Spec<P>
    where
        C: FnOnce(&P) + Send + 'static,
    {
        Spec {
            nodes: hooks::after_all(self.nodes, cleanup),
        }
    }

    /// See [`hooks::after_all_`].
    pub fn after_all_<C>(self, cleanup: C) -> Spec<P>
    where
        C: FnOnce() + Send + 'static,
    {
        Spec {
            nodes: hooks::after_all_(self.nodes, cleanup),
        }
    }

    /// See [`hooks::around`].
    pub fn around<W>(self, wrap: W) -> Spec<()>
    where
        W: Fn(&mut dyn FnMut(&P)) + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::around(self.nodes, wrap),
        }
    }

    /// See [`hooks::around_`].
    pub fn around_<W>(self, wrap: W) -> Spec<P>
    where
        W: Fn(&mut dyn FnMut()) + Send + Sync + 'static,
    {
        Spec {
            nodes: hooks::around_(self.nodes, wrap),
        }
    }
}
