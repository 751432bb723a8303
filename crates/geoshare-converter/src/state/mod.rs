//! State machines that drive a conversion and the delivery of its result.
//!
//! Each state is an immutable value. [`Transition::transition`] either
//! produces the next state or `None` when the machine is finished or waiting
//! for user input. [`StateContext`] replaces the current state with each
//! result and records the linear history.

mod conversion;
mod share;

use std::fmt::Debug;
use std::future::Future;

use crate::error::ConversionError;

pub use conversion::{ConversionContext, ConversionDeps, ConversionState};
pub use share::{
    PlatformPermissions, ResultSink, ShareContext, ShareDeps, ShareState, SinkError,
};

/// Upper bound on transitions per [`StateContext::transition`] call.
///
/// Legitimate chains are short; the only loop is the search-page redirect.
pub const MAX_ITERATIONS: usize = 10;

pub trait Transition<C>: Sized {
    /// Returns the next state, or `None` if this state does not advance on
    /// its own.
    fn transition(&self, ctx: &C) -> impl Future<Output = Option<Self>>;
}

/// Runs transitions from `initial` until one returns `None`.
///
/// `on_change` sees every new state as soon as it is produced.
///
/// # Errors
///
/// Returns [`ConversionError::IterationLimitExceeded`] after exactly
/// `max_iterations` transitions that all produced a state.
pub async fn drive<S, C, F>(
    initial: S,
    ctx: &C,
    max_iterations: usize,
    mut on_change: F,
) -> Result<S, ConversionError>
where
    S: Transition<C> + Debug,
    F: FnMut(&S),
{
    let mut current = initial;
    for _ in 0..max_iterations {
        match current.transition(ctx).await {
            Some(next) => {
                on_change(&next);
                current = next;
            }
            None => return Ok(current),
        }
    }

    tracing::error!(
        max_iterations,
        state = ?current,
        "state machine did not settle; transition cycle"
    );
    Err(ConversionError::IterationLimitExceeded { max_iterations })
}

/// Holds the current state of one machine plus its collaborators.
///
/// The current state only changes once a transition has completed, so
/// dropping an in-flight [`StateContext::transition`] future leaves the
/// context at the last finished state.
#[derive(Debug)]
pub struct StateContext<S, D> {
    deps: D,
    current: S,
    history: Vec<S>,
    max_iterations: usize,
}

impl<S, D> StateContext<S, D>
where
    S: Transition<D> + Clone + Debug,
{
    pub fn new(deps: D, initial: S) -> Self {
        Self {
            deps,
            current: initial.clone(),
            history: vec![initial],
            max_iterations: MAX_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }

    pub fn current_state(&self) -> &S {
        &self.current
    }

    /// Every state the context has held, oldest first.
    pub fn history(&self) -> &[S] {
        &self.history
    }

    /// Replaces the current state without running any transition.
    pub fn set_state(&mut self, state: S) {
        tracing::debug!(state = ?state, "state changed");
        self.history.push(state.clone());
        self.current = state;
    }

    /// Sets `state` and runs transitions from it.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn start(&mut self, state: S) -> Result<&S, ConversionError> {
        self.set_state(state);
        self.transition().await
    }

    /// Runs transitions from the current state until the machine settles.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn transition(&mut self) -> Result<&S, ConversionError> {
        let Self {
            deps,
            current,
            history,
            max_iterations,
        } = &mut *self;
        let start = current.clone();

        drive(start, &*deps, *max_iterations, |next| {
            tracing::debug!(state = ?next, "state changed");
            history.push(next.clone());
            *current = next.clone();
        })
        .await?;

        Ok(&self.current)
    }
}
