//! State identity trait.
//!
//! Every node in a state tree is identified by a value implementing
//! [`StateId`]. Identities must be unique across the whole tree so that
//! transition targets can be resolved by identity alone.

use std::fmt::Debug;
use std::hash::Hash;

/// Identity of a state in the tree.
///
/// # Required Traits
///
/// - `Clone`: identities are copied into transitions and history records
/// - `Eq` + `Hash`: identities key the tree's lookup index
/// - `Debug`: identities appear in diagnostics
/// - `Send` + `Sync`: machines and their timer handles cross threads
///
/// Implementations are provided for `&'static str` and `String`. For enums,
/// the [`state_enum!`](crate::state_enum) macro generates one.
///
/// # Example
///
/// ```rust
/// use hfsm::core::StateId;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl StateId for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Closed.name(), "Closed");
/// ```
pub trait StateId: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

impl StateId for &'static str {
    fn name(&self) -> &str {
        self
    }
}

impl StateId for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

/// Identity of a user event.
///
/// Blanket-implemented for every type with the required bounds, so plain
/// enums and string literals work out of the box.
pub trait EventId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> EventId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Reference to a node by identity, or to the implicit root.
///
/// The root has no caller-visible identity; declarations that apply to it
/// (the initial transition, machine-wide handlers) use [`StateRef::Root`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateRef<S> {
    Root,
    State(S),
}

impl<S> From<S> for StateRef<S> {
    fn from(state: S) -> Self {
        StateRef::State(state)
    }
}

impl<S: StateId> StateRef<S> {
    /// Name for diagnostics; the root is reported as `"<root>"`.
    pub fn name(&self) -> &str {
        match self {
            StateRef::Root => ROOT_NAME,
            StateRef::State(s) => s.name(),
        }
    }
}

pub(crate) const ROOT_NAME: &str = "<root>";
