//! Arena-backed state tree.
//!
//! Nodes live in a `Vec` and refer to each other by [`StateIndex`]; the
//! parent link is an index, so there is no ownership cycle between parent
//! and child. Index 0 is always the root.

use super::table::TransitionTable;
use crate::builder::BuildError;
use crate::core::{EventKind, StateId, StateRef, ROOT_NAME};
use crate::runtime::Hook;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Position of a node in its tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateIndex(usize);

impl StateIndex {
    pub const ROOT: StateIndex = StateIndex(0);

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the state tree.
pub struct StateNode<S, E> {
    id: Option<S>,
    parent: Option<StateIndex>,
    children: Vec<StateIndex>,
    depth: usize,
    transitions: TransitionTable<S, E>,
    on_enter: Vec<Hook<S, E>>,
    on_exit: Vec<Hook<S, E>>,
}

impl<S: StateId, E: Eq + Hash> StateNode<S, E> {
    fn new(id: Option<S>, parent: Option<StateIndex>, depth: usize) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            depth,
            transitions: TransitionTable::new(),
            on_enter: Vec::new(),
            on_exit: Vec::new(),
        }
    }

    /// Identity of the node; `None` for the root.
    pub fn id(&self) -> Option<&S> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        self.id.as_ref().map_or(ROOT_NAME, |id| id.name())
    }

    pub fn parent(&self) -> Option<StateIndex> {
        self.parent
    }

    pub fn children(&self) -> &[StateIndex] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn transitions(&self) -> &TransitionTable<S, E> {
        &self.transitions
    }

    pub(crate) fn transitions_mut(&mut self) -> &mut TransitionTable<S, E> {
        &mut self.transitions
    }

    pub(crate) fn enter_hooks(&self) -> &[Hook<S, E>] {
        &self.on_enter
    }

    pub(crate) fn exit_hooks(&self) -> &[Hook<S, E>] {
        &self.on_exit
    }

    pub(crate) fn add_enter_hook(&mut self, hook: Hook<S, E>) {
        self.on_enter.push(hook);
    }

    pub(crate) fn add_exit_hook(&mut self, hook: Hook<S, E>) {
        self.on_exit.push(hook);
    }
}

/// The state tree: an arena of nodes plus an identity index.
///
/// Structure is fixed once a machine is built; only the builder mutates it.
pub struct StateTree<S, E> {
    nodes: Vec<StateNode<S, E>>,
    index: HashMap<S, StateIndex>,
}

impl<S: StateId, E: Eq + Hash> StateTree<S, E> {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![StateNode::new(None, None, 0)],
            index: HashMap::new(),
        }
    }

    /// Create a new child under `parent`.
    ///
    /// Fails if `id` is already used anywhere in the tree, which also rules
    /// out duplicates among siblings.
    pub fn add_child(&mut self, parent: StateIndex, id: S) -> Result<StateIndex, BuildError> {
        if self.index.contains_key(&id) {
            return Err(BuildError::DuplicateState {
                state: id.name().to_string(),
            });
        }

        let child = StateIndex(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes
            .push(StateNode::new(Some(id.clone()), Some(parent), depth));
        self.nodes[parent.0].children.push(child);
        self.index.insert(id, child);
        Ok(child)
    }

    /// Look up a node by identity.
    pub fn resolve(&self, id: &S) -> Option<StateIndex> {
        self.index.get(id).copied()
    }

    pub fn resolve_ref(&self, state: &StateRef<S>) -> Option<StateIndex> {
        match state {
            StateRef::Root => Some(StateIndex::ROOT),
            StateRef::State(id) => self.resolve(id),
        }
    }

    pub fn node(&self, index: StateIndex) -> &StateNode<S, E> {
        &self.nodes[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: StateIndex) -> &mut StateNode<S, E> {
        &mut self.nodes[index.0]
    }

    pub fn name(&self, index: StateIndex) -> &str {
        self.node(index).name()
    }

    pub fn parent(&self, index: StateIndex) -> Option<StateIndex> {
        self.node(index).parent
    }

    pub fn is_leaf(&self, index: StateIndex) -> bool {
        self.node(index).is_leaf()
    }

    /// Whether `id` names `node` or one of its descendants.
    pub fn contains_state(&self, node: StateIndex, id: &S) -> bool {
        self.resolve(id)
            .is_some_and(|found| self.is_ancestor_or_self(node, found))
    }

    /// `node`, its parent, and so on up to and including the root.
    pub fn ancestor_chain(&self, node: StateIndex) -> Vec<StateIndex> {
        std::iter::successors(Some(node), |&n| self.parent(n)).collect()
    }

    /// Whether `ancestor` lies on `node`'s ancestor chain (inclusive).
    pub fn is_ancestor_or_self(&self, ancestor: StateIndex, node: StateIndex) -> bool {
        let target_depth = self.node(ancestor).depth;
        let mut current = node;
        while self.node(current).depth > target_depth {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        current == ancestor
    }

    /// Deepest node that is an ancestor-or-self of both `a` and `b`.
    pub fn common_ancestor(&self, a: StateIndex, b: StateIndex) -> StateIndex {
        let (mut a, mut b) = (a, b);
        while self.node(a).depth > self.node(b).depth {
            a = self.parent(a).unwrap_or(StateIndex::ROOT);
        }
        while self.node(b).depth > self.node(a).depth {
            b = self.parent(b).unwrap_or(StateIndex::ROOT);
        }
        while a != b {
            a = self.parent(a).unwrap_or(StateIndex::ROOT);
            b = self.parent(b).unwrap_or(StateIndex::ROOT);
        }
        a
    }

    /// All node indices, root first, in creation order.
    pub fn indices(&self) -> impl Iterator<Item = StateIndex> {
        (0..self.nodes.len()).map(StateIndex)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Whether `node` declares a default entry (guarded or not).
    pub fn has_default(&self, node: StateIndex) -> bool {
        self.node(node)
            .transitions
            .handles(&EventKind::DefaultEntry)
    }
}

impl<S: StateId, E: Eq + Hash> Default for StateTree<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
