//! # Stillwater Core
//!
//! Core traits and types for Stillwater feature stores.
//!
//! The booking front end is assembled from small isolated features (the
//! booking cart, the event stream bridge). Each feature is a pure
//! [`reducer::Reducer`] over its own state, driven by actions and an
//! environment of injected collaborators. Side effects are never performed
//! inside a reducer: they are returned as [`effect::Effect`] values and
//! executed by the `Store` in the runtime crate.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a feature
//! - **Action**: All possible inputs to a reducer (commands and feedback events)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```ignore
//! use stillwater_core::{SmallVec, effect::Effect, reducer::Reducer};
//!
//! #[derive(Clone, Debug)]
//! struct WaitlistState {
//!     guests: Vec<String>,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum WaitlistAction {
//!     Join { guest: String },
//!     Promote,
//! }
//!
//! struct WaitlistReducer;
//!
//! impl Reducer for WaitlistReducer {
//!     type State = WaitlistState;
//!     type Action = WaitlistAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut WaitlistState,
//!         action: WaitlistAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<WaitlistAction>; 4]> {
//!         match action {
//!             WaitlistAction::Join { guest } => {
//!                 state.guests.push(guest);
//!                 SmallVec::new()
//!             }
//!             WaitlistAction::Promote => {
//!                 state.guests.pop();
//!                 SmallVec::new()
//!             }
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce at most one effect; the `SmallVec` keeps
        /// the common case off the heap.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution), returned from reducers and executed
/// by the Store.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the Store
    /// runtime on spawned tasks.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Delayed action (for timers and scheduled feedback)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }
}
