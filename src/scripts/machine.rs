//! Generic state machine driving entity behavior.
//!
//! A [`StateMachine`] owns exactly one active state at a time, a boxed
//! object implementing [`State`] for some context type `C`. The context is
//! whatever the owning script wants its states to read and write (input
//! snapshots, output accumulators, facing) and is passed into every hook
//! by mutable reference.
//!
//! # Lifecycle
//!
//! - [`StateMachine::init`] constructs the initial state and runs its
//!   `on_enter`. It must be called exactly once, before any `update`.
//! - [`StateMachine::update`] dispatches `on_update` to the active state.
//! - [`StateMachine::switch_state`] requests a transition. The transition
//!   runs `on_exit` on the old state, constructs the new state, and runs its
//!   `on_enter`, always before the surrounding `init`/`update` call
//!   returns. A state may transition to its own type; that re-runs both
//!   hooks rather than being a no-op.
//!
//! Calling `update` before `init` is a programming error and panics.

/// Behavior hooks for one state of a [`StateMachine`].
///
/// All hooks default to no-ops; states implement only what they need. Each
/// hook receives the machine (to request transitions) and the context.
pub trait State<C>: Send + Sync {
    fn on_enter(&mut self, _machine: &mut StateMachine<C>, _ctx: &mut C) {}
    fn on_update(&mut self, _machine: &mut StateMachine<C>, _ctx: &mut C) {}
    fn on_exit(&mut self, _machine: &mut StateMachine<C>, _ctx: &mut C) {}
}

/// State machine owning one active state over a context type `C`.
pub struct StateMachine<C> {
    active: Option<Box<dyn State<C>>>,
    pending: Option<Box<dyn State<C>>>,
}

impl<C> Default for StateMachine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> StateMachine<C> {
    pub fn new() -> Self {
        Self {
            active: None,
            pending: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// Construct the initial state and run its `on_enter`.
    ///
    /// # Panics
    ///
    /// Panics if the machine was already initialized.
    pub fn init<S: State<C> + Default + 'static>(&mut self, ctx: &mut C) {
        assert!(
            self.active.is_none(),
            "state machine initialized twice"
        );
        let mut state = Box::new(S::default());
        state.on_enter(self, ctx);
        self.active = Some(state);
        self.apply_pending(ctx);
    }

    /// Dispatch `on_update` to the active state, then apply any transition
    /// it requested.
    ///
    /// # Panics
    ///
    /// Panics if called before [`StateMachine::init`].
    pub fn update(&mut self, ctx: &mut C) {
        let mut state = self
            .active
            .take()
            .expect("state machine updated before init");
        state.on_update(self, ctx);
        self.active = Some(state);
        self.apply_pending(ctx);
    }

    /// Request a transition to a new state.
    ///
    /// Applied before the surrounding `init`/`update` call returns. When a
    /// hook requests several transitions in one dispatch, the last request
    /// wins.
    pub fn switch_state<S: State<C> + Default + 'static>(&mut self) {
        self.pending = Some(Box::new(S::default()));
    }

    fn apply_pending(&mut self, ctx: &mut C) {
        while let Some(mut next) = self.pending.take() {
            if let Some(mut old) = self.active.take() {
                old.on_exit(self, ctx);
            }
            next.on_enter(self, ctx);
            self.active = Some(next);
        }
    }
}
