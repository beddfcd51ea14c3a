//! # Stillwater Testing
//!
//! Testing utilities and helpers for Stillwater feature stores.
//!
//! This crate provides:
//! - [`ReducerTest`]: A fluent Given-When-Then harness for reducers
//! - [`assertions`]: Assertion helpers for effect lists
//!
//! ## Example
//!
//! ```ignore
//! use stillwater_testing::{ReducerTest, assertions};
//!
//! #[test]
//! fn clearing_empties_the_cart() {
//!     ReducerTest::new(BookingReducer)
//!         .with_env(test_environment())
//!         .given_state(populated_cart())
//!         .when_action(BookingAction::Clear)
//!         .then_state(|state| assert!(state.is_empty()))
//!         .then_effects(assertions::assert_no_effects)
//!         .run();
//! }
//! ```


// Re-export commonly used items
pub use reducer_test::{ReducerTest, assertions};
