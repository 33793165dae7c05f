//! Builder for declaring state trees.

use crate::builder::error::BuildError;
use crate::core::{Event, EventId, EventKind, Guard, StateId, StateRef};
use crate::runtime::{ConfigError, HookContext, HookError, Machine, MachineConfig};
use crate::timer::{Clock, SystemClock};
use crate::tree::{StateIndex, StateTree, Transition};
use std::sync::Arc;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for declaring a machine with a fluent API.
///
/// Declarations that name an existing state fail immediately with
/// [`BuildError::UnknownState`]. Transition targets are only recorded: they
/// are resolved when the transition first fires, or up front by
/// [`validate`](Self::validate).
pub struct MachineBuilder<S: StateId, E: EventId> {
    tree: StateTree<S, E>,
    config: MachineConfig,
    clock: Arc<dyn Clock>,
}

impl<S: StateId, E: EventId> MachineBuilder<S, E> {
    /// Create a builder holding only the root.
    pub fn new() -> Self {
        Self {
            tree: StateTree::new(),
            config: MachineConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Declare a top-level state.
    pub fn state(self, id: S) -> Result<Self, BuildError> {
        self.substate(StateRef::Root, id)
    }

    /// Declare `id` as a child of `parent`.
    pub fn substate(mut self, parent: impl Into<StateRef<S>>, id: S) -> Result<Self, BuildError> {
        let parent = self.index_of(&parent.into())?;
        self.tree.add_child(parent, id)?;
        Ok(self)
    }

    /// Set the root's default entry, i.e. the machine's initial state.
    pub fn initial(mut self, target: S) -> Self {
        self.tree
            .node_mut(StateIndex::ROOT)
            .transitions_mut()
            .add(EventKind::DefaultEntry, Transition::new(target));
        self
    }

    /// Set the child a composite state enters by default.
    pub fn default_transition(
        self,
        state: impl Into<StateRef<S>>,
        target: S,
    ) -> Result<Self, BuildError> {
        self.on(state, EventKind::DefaultEntry, target, None)
    }

    /// Add a guarded default entry; the first passing one wins.
    pub fn default_transition_when<F>(
        self,
        state: impl Into<StateRef<S>>,
        target: S,
        guard: F,
    ) -> Result<Self, BuildError>
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.on(
            state,
            EventKind::DefaultEntry,
            target,
            Some(Guard::new(guard)),
        )
    }

    /// Add a transition from `from` to `target` on `event`.
    pub fn transition(
        self,
        from: impl Into<StateRef<S>>,
        event: E,
        target: S,
    ) -> Result<Self, BuildError> {
        self.on(from, EventKind::User(event), target, None)
    }

    /// Add a transition that only fires while `guard` holds.
    pub fn transition_when<F>(
        self,
        from: impl Into<StateRef<S>>,
        event: E,
        target: S,
        guard: F,
    ) -> Result<Self, BuildError>
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.on(
            from,
            EventKind::User(event),
            target,
            Some(Guard::new(guard)),
        )
    }

    /// Add a transition on any event kind, including the reserved ones.
    pub fn on(
        mut self,
        from: impl Into<StateRef<S>>,
        kind: EventKind<E>,
        target: S,
        guard: Option<Guard>,
    ) -> Result<Self, BuildError> {
        let from = self.index_of(&from.into())?;
        let transition = match guard {
            Some(guard) => Transition::guarded(target, guard),
            None => Transition::new(target),
        };
        self.tree
            .node_mut(from)
            .transitions_mut()
            .add(kind, transition);
        Ok(self)
    }

    /// Run `hook` whenever `state` is entered.
    pub fn on_enter<F>(mut self, state: impl Into<StateRef<S>>, hook: F) -> Result<Self, BuildError>
    where
        F: Fn(&Event<E>, &mut HookContext<'_, S, E>) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        let node = self.index_of(&state.into())?;
        self.tree.node_mut(node).add_enter_hook(Box::new(hook));
        Ok(self)
    }

    /// Run `hook` whenever `state` is exited.
    pub fn on_exit<F>(mut self, state: impl Into<StateRef<S>>, hook: F) -> Result<Self, BuildError>
    where
        F: Fn(&Event<E>, &mut HookContext<'_, S, E>) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        let node = self.index_of(&state.into())?;
        self.tree.node_mut(node).add_exit_hook(Box::new(hook));
        Ok(self)
    }

    /// Leave `state` for `target` once it has been active for `after`.
    ///
    /// Entering `state` arms its timer, exiting disarms it, and the timeout
    /// event it produces drives the transition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hfsm::timer::ManualClock;
    /// use hfsm::Machine;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let clock = Arc::new(ManualClock::starting_now());
    /// let mut machine = Machine::<&str, &str>::builder()
    ///     .state("Waiting")?
    ///     .state("Expired")?
    ///     .initial("Waiting")
    ///     .timeout("Waiting", Duration::from_millis(100), "Expired")?
    ///     .clock(clock.clone())
    ///     .build();
    ///
    /// machine.start()?;
    /// clock.advance(Duration::from_millis(150));
    /// machine.pulse()?;
    /// assert_eq!(machine.current_state(), Some(&"Expired"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn timeout(self, state: S, after: Duration, target: S) -> Result<Self, BuildError> {
        self.arm_timeout(state, after, target, None)
    }

    /// Like [`timeout`](Self::timeout), but the transition only fires while
    /// `guard` holds when the timer expires.
    pub fn timeout_when<F>(
        self,
        state: S,
        after: Duration,
        target: S,
        guard: F,
    ) -> Result<Self, BuildError>
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.arm_timeout(state, after, target, Some(Guard::new(guard)))
    }

    fn arm_timeout(
        self,
        state: S,
        after: Duration,
        target: S,
        guard: Option<Guard>,
    ) -> Result<Self, BuildError> {
        self.on(state.clone(), EventKind::Timeout, target, guard)?
            .on_enter(state.clone(), move |_, ctx| {
                ctx.set_timeout(after);
                Ok(())
            })?
            .on_exit(state, |_, ctx| {
                ctx.cancel_timeout();
                Ok(())
            })
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the clock timers are judged against.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Check the whole declaration, accumulating every configuration error.
    ///
    /// Reports unknown transition targets, composite states without a
    /// default entry, and a root that cannot reach an initial state.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let tree = &self.tree;
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigError>>> = Vec::new();

        for index in tree.indices() {
            let node = tree.node(index);

            if node.is_root() {
                let check = if node.is_composite() && tree.has_default(index) {
                    Validation::success(())
                } else {
                    Validation::fail(ConfigError::NoInitialState)
                };
                checks.push(check);
            } else if node.is_composite() && !tree.has_default(index) {
                checks.push(Validation::fail(ConfigError::MissingDefault {
                    state: node.name().to_string(),
                }));
            }

            for (_, transition) in node.transitions().iter() {
                if tree.resolve(transition.target()).is_none() {
                    checks.push(Validation::fail(ConfigError::TargetNotFound {
                        from: node.name().to_string(),
                        target: transition.target().name().to_string(),
                    }));
                }
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the machine without validating; problems surface at first use.
    pub fn build(self) -> Machine<S, E> {
        Machine::new(self.tree, self.config, self.clock)
    }

    /// Validate, then build.
    pub fn build_validated(self) -> Result<Machine<S, E>, BuildError> {
        match self.validate() {
            Validation::Success(_) => Ok(self.build()),
            Validation::Failure(errors) => Err(BuildError::Invalid {
                errors: errors.iter().cloned().collect(),
            }),
        }
    }

    fn index_of(&self, state: &StateRef<S>) -> Result<StateIndex, BuildError> {
        self.tree
            .resolve_ref(state)
            .ok_or_else(|| BuildError::UnknownState {
                state: state.name().to_string(),
            })
    }
}

impl<S: StateId, E: EventId> Default for MachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Builder = MachineBuilder<&'static str, &'static str>;

    #[test]
    fn unknown_parent_is_rejected() {
        let result = Builder::new().substate("Missing", "Child");
        assert!(
            matches!(result, Err(BuildError::UnknownState { ref state }) if state == "Missing")
        );
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let result = Builder::new()
            .state("A")
            .and_then(|b| b.state("B"))
            .and_then(|b| b.substate("B", "A"));
        assert!(matches!(result, Err(BuildError::DuplicateState { ref state }) if state == "A"));
    }

    #[test]
    fn transition_from_unknown_state_is_rejected() {
        let result = Builder::new().transition("Ghost", "go", "A");
        assert!(matches!(result, Err(BuildError::UnknownState { .. })));
    }

    #[test]
    fn forward_references_to_targets_are_allowed() {
        let result = Builder::new()
            .state("A")
            .and_then(|b| b.transition("A", "go", "DeclaredLater"))
            .and_then(|b| b.state("DeclaredLater"));
        assert!(result.is_ok());
    }

    #[test]
    fn validation_accumulates_all_errors() {
        let builder = Builder::new()
            .state("A")
            .and_then(|b| b.state("B"))
            .and_then(|b| b.substate("B", "B1"))
            .and_then(|b| b.transition("A", "go", "Nowhere"))
            .unwrap();

        match builder.validate() {
            Validation::Failure(errors) => {
                let errors: Vec<ConfigError> = errors.iter().cloned().collect();
                assert_eq!(errors.len(), 3);
                assert!(errors.contains(&ConfigError::NoInitialState));
                assert!(errors.contains(&ConfigError::MissingDefault { state: "B".into() }));
                assert!(errors.contains(&ConfigError::TargetNotFound {
                    from: "A".into(),
                    target: "Nowhere".into(),
                }));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn valid_declaration_passes_and_builds() {
        let builder = Builder::new()
            .state("A")
            .and_then(|b| b.state("B"))
            .and_then(|b| b.substate("B", "B1"))
            .and_then(|b| b.default_transition("B", "B1"))
            .and_then(|b| b.transition("A", "go", "B"))
            .map(|b| b.initial("A"))
            .unwrap();

        assert!(builder.validate().is_success());
        assert!(builder.build_validated().is_ok());
    }

    #[test]
    fn build_validated_reports_errors() {
        let result = Builder::new().state("A").unwrap().build_validated();
        match result {
            Err(BuildError::Invalid { errors }) => {
                assert_eq!(errors, vec![ConfigError::NoInitialState]);
            }
            _ => panic!("Expected BuildError::Invalid"),
        }
    }

    #[test]
    fn timeout_declares_transition_and_hooks() {
        let builder = Builder::new()
            .state("Waiting")
            .and_then(|b| b.state("Done"))
            .and_then(|b| b.timeout("Waiting", Duration::from_millis(5), "Done"))
            .unwrap();

        let waiting = builder.tree.resolve(&"Waiting").unwrap();
        let node = builder.tree.node(waiting);
        let timeout = node.transitions().find(&EventKind::Timeout).unwrap();
        assert_eq!(timeout.target(), &"Done");
        assert_eq!(node.enter_hooks().len(), 1);
        assert_eq!(node.exit_hooks().len(), 1);
    }

    #[test]
    fn root_level_declarations_use_state_ref() {
        let builder = Builder::new()
            .state("A")
            .and_then(|b| b.transition(StateRef::Root, "reset", "A"))
            .unwrap();
        let root = builder.tree.node(StateIndex::ROOT);
        assert!(root.transitions().find(&EventKind::User("reset")).is_some());
    }
}
