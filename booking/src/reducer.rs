//! Reducer logic for the booking cart.
//!
//! Commands mutate the cart and mirror it to storage in the same turn;
//! payments run as effects and feed their receipt back as a
//! `PaymentSettled` event.

use crate::payment::PaymentGateway;
use crate::storage::CartStorage;
use crate::types::{BookingAction, CartLine, CartState, PaymentScope};
use std::sync::Arc;
use stillwater_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Environment dependencies for the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Persisted cart adapter
    pub storage: Arc<CartStorage>,
    /// Payment confirmation gateway
    pub gateway: Arc<dyn PaymentGateway>,
}

impl BookingEnvironment {
    /// Creates a new `BookingEnvironment`
    #[must_use]
    pub fn new(storage: Arc<CartStorage>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { storage, gateway }
    }
}

/// Reducer for the booking cart
#[derive(Clone, Debug)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Schedules a payment confirmation for `scope`
    ///
    /// The gateway's receipt feeds back as `PaymentSettled`.
    fn confirm_payment(env: &BookingEnvironment, scope: PaymentScope) -> Effect<BookingAction> {
        let confirmation = env.gateway.confirm(scope.clone());
        Effect::Future(Box::pin(async move {
            let receipt = confirmation.await;
            Some(BookingAction::PaymentSettled {
                scope,
                reference: receipt.reference,
            })
        }))
    }

    /// Marks the lines covered by `scope` as paid
    ///
    /// Settlement applies to whatever the cart holds at settle time: a line
    /// removed while its payment was in flight is skipped, and a whole-cart
    /// settlement covers lines added during the gateway delay.
    fn settle(state: &mut CartState, scope: &PaymentScope) {
        match scope {
            PaymentScope::Line(id) => {
                if let Some(line) = state.lines.iter_mut().find(|line| &line.id == id) {
                    line.paid = true;
                } else {
                    tracing::debug!(%id, "settled line no longer in cart");
                }
            }
            PaymentScope::All => {
                for line in &mut state.lines {
                    line.paid = true;
                }
            }
        }
    }
}

impl Default for BookingReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for BookingReducer {
    type State = CartState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            BookingAction::AddItem { item, qty, pay_now } => {
                let id = item.id.clone();
                if let Some(line) = state.lines.iter_mut().find(|line| line.id == id) {
                    // Same id accumulates quantity; the line already in the
                    // cart keeps its name, price, and paid flag.
                    line.qty += qty;
                } else {
                    // Newest addition sits at the front. An immediate-pay
                    // line is marked paid up front and the gateway
                    // confirmation below re-settles it.
                    state.lines.insert(0, CartLine::new(item, qty, pay_now));
                }
                env.storage.save(&state.lines);

                if pay_now {
                    smallvec![Self::confirm_payment(env, PaymentScope::Line(id))]
                } else {
                    SmallVec::new()
                }
            }

            BookingAction::RemoveItem { id } => {
                // Absent ids are a no-op, not an error
                state.lines.retain(|line| line.id != id);
                env.storage.save(&state.lines);
                SmallVec::new()
            }

            BookingAction::UpdateQty { id, qty } => {
                // The value is stored verbatim. Zero and negative quantities
                // keep the line in the cart; they do not remove it.
                if let Some(line) = state.lines.iter_mut().find(|line| line.id == id) {
                    line.qty = qty;
                }
                env.storage.save(&state.lines);
                SmallVec::new()
            }

            BookingAction::PayItem { id } => {
                smallvec![Self::confirm_payment(env, PaymentScope::Line(id))]
            }

            BookingAction::PayAll => {
                smallvec![Self::confirm_payment(env, PaymentScope::All)]
            }

            BookingAction::Clear => {
                state.lines.clear();
                env.storage.save(&state.lines);
                SmallVec::new()
            }

            // ========== Events ==========
            BookingAction::PaymentSettled { scope, reference } => {
                tracing::info!(%reference, ?scope, "payment settled");
                Self::settle(state, &scope);
                env.storage.save(&state.lines);
                SmallVec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::InstantGateway;
    use crate::storage::MemoryBackend;
    use crate::types::{ItemDetails, ItemId};
    use stillwater_testing::{ReducerTest, assertions};

    fn test_env() -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::new(CartStorage::new(Arc::new(MemoryBackend::new()))),
            Arc::new(InstantGateway),
        )
    }

    fn room() -> ItemDetails {
        ItemDetails::new("r1", "Lakeview Room", 500.0)
    }

    fn spa() -> ItemDetails {
        ItemDetails::new("spa", "Forest Spa", 120.0).with_portion("60 min")
    }

    fn cart_with(lines: Vec<CartLine>) -> CartState {
        CartState::from_lines(lines)
    }

    #[test]
    fn test_add_item_inserts_at_front() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![CartLine::new(room(), 1, false)]))
            .when_action(BookingAction::AddItem {
                item: spa(),
                qty: 2,
                pay_now: false,
            })
            .then_state(|state| {
                assert_eq!(state.len(), 2);
                assert_eq!(state.lines[0].id, ItemId::new("spa"));
                assert_eq!(state.lines[0].qty, 2);
                assert!(!state.lines[0].paid);
                assert_eq!(state.lines[1].id, ItemId::new("r1"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_add_existing_id_accumulates_qty() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![CartLine::new(room(), 1, false)]))
            .when_action(BookingAction::AddItem {
                item: ItemDetails::new("r1", "Renamed Room", 999.0),
                qty: 2,
                pay_now: false,
            })
            .then_state(|state| {
                assert_eq!(state.len(), 1);
                let line = &state.lines[0];
                // The first insertion's details win
                assert_eq!(line.qty, 3);
                assert_eq!(line.name, "Lakeview Room");
                assert!((line.price - 500.0).abs() < f64::EPSILON);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_add_with_pay_now_marks_paid_and_schedules_confirmation() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(CartState::new())
            .when_action(BookingAction::AddItem {
                item: spa(),
                qty: 1,
                pay_now: true,
            })
            .then_state(|state| {
                // Paid immediately at insertion; the confirmation that
                // follows re-settles the same line.
                assert!(state.lines[0].paid);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_remove_item_deletes_the_line() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![
                CartLine::new(spa(), 1, false),
                CartLine::new(room(), 2, false),
            ]))
            .when_action(BookingAction::RemoveItem {
                id: ItemId::new("spa"),
            })
            .then_state(|state| {
                assert_eq!(state.len(), 1);
                assert!(!state.exists(&ItemId::new("spa")));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_remove_absent_id_leaves_cart_unchanged() {
        let before = cart_with(vec![CartLine::new(room(), 2, false)]);
        let expected = before.clone();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(before)
            .when_action(BookingAction::RemoveItem {
                id: ItemId::new("ghost"),
            })
            .then_state(move |state| assert_eq!(*state, expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_update_qty_stores_zero_verbatim() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![
                CartLine::new(room(), 2, false),
                CartLine::new(spa(), 1, false),
            ]))
            .when_action(BookingAction::UpdateQty {
                id: ItemId::new("r1"),
                qty: 0,
            })
            .then_state(|state| {
                // The line stays in the cart and contributes zero
                assert_eq!(state.len(), 2);
                assert_eq!(state.lines[0].qty, 0);
                assert!((state.total() - 120.0).abs() < f64::EPSILON);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_update_qty_absent_id_is_a_noop() {
        let before = cart_with(vec![CartLine::new(room(), 2, false)]);
        let expected = before.clone();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(before)
            .when_action(BookingAction::UpdateQty {
                id: ItemId::new("ghost"),
                qty: 5,
            })
            .then_state(move |state| assert_eq!(*state, expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_pay_item_schedules_confirmation_without_mutating() {
        let before = cart_with(vec![CartLine::new(room(), 2, false)]);
        let expected = before.clone();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(before)
            .when_action(BookingAction::PayItem {
                id: ItemId::new("r1"),
            })
            .then_state(move |state| {
                // The line flips to paid only when the settlement lands
                assert_eq!(*state, expected);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_pay_all_schedules_a_single_confirmation() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![
                CartLine::new(room(), 2, false),
                CartLine::new(spa(), 1, false),
            ]))
            .when_action(BookingAction::PayAll)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_clear_empties_the_cart() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![
                CartLine::new(room(), 2, true),
                CartLine::new(spa(), 1, false),
            ]))
            .when_action(BookingAction::Clear)
            .then_state(|state| {
                assert!(state.is_empty());
                assert!((state.total()).abs() < f64::EPSILON);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_settlement_marks_only_the_scoped_line() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![
                CartLine::new(room(), 2, false),
                CartLine::new(spa(), 1, false),
            ]))
            .when_action(BookingAction::PaymentSettled {
                scope: PaymentScope::Line(ItemId::new("spa")),
                reference: "sim_test".to_string(),
            })
            .then_state(|state| {
                assert!(!state.lines[0].paid);
                assert!(state.lines[1].paid);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_settlement_for_removed_line_is_a_noop() {
        let before = cart_with(vec![CartLine::new(room(), 2, false)]);
        let expected = before.clone();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(before)
            .when_action(BookingAction::PaymentSettled {
                scope: PaymentScope::Line(ItemId::new("gone")),
                reference: "sim_test".to_string(),
            })
            .then_state(move |state| assert_eq!(*state, expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_settlement_for_all_marks_every_line() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(cart_with(vec![
                CartLine::new(room(), 2, false),
                CartLine::new(spa(), 1, true),
            ]))
            .when_action(BookingAction::PaymentSettled {
                scope: PaymentScope::All,
                reference: "sim_test".to_string(),
            })
            .then_state(|state| {
                assert!(state.lines.iter().all(|line| line.paid));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_mutations_mirror_to_storage_in_the_same_turn() {
        let env = test_env();
        let storage = Arc::clone(&env.storage);
        let reducer = BookingReducer::new();
        let mut state = CartState::new();

        let _ = reducer.reduce(
            &mut state,
            BookingAction::AddItem {
                item: room(),
                qty: 2,
                pay_now: false,
            },
            &env,
        );
        assert_eq!(storage.load(), state.lines);

        let _ = reducer.reduce(
            &mut state,
            BookingAction::UpdateQty {
                id: ItemId::new("r1"),
                qty: 4,
            },
            &env,
        );
        assert_eq!(storage.load(), state.lines);

        let _ = reducer.reduce(&mut state, BookingAction::Clear, &env);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn test_repeat_add_then_settle_scenario() {
        let env = test_env();
        let reducer = BookingReducer::new();
        let mut state = CartState::new();

        let _ = reducer.reduce(
            &mut state,
            BookingAction::AddItem {
                item: ItemDetails::new("r1", "Suite", 500.0),
                qty: 1,
                pay_now: false,
            },
            &env,
        );
        let _ = reducer.reduce(
            &mut state,
            BookingAction::AddItem {
                item: ItemDetails::new("r1", "Suite", 500.0),
                qty: 2,
                pay_now: false,
            },
            &env,
        );

        assert_eq!(state.len(), 1);
        assert_eq!(state.lines[0].qty, 3);
        assert!(!state.lines[0].paid);
        assert!((state.total() - 1500.0).abs() < f64::EPSILON);

        let _ = reducer.reduce(
            &mut state,
            BookingAction::PaymentSettled {
                scope: PaymentScope::Line(ItemId::new("r1")),
                reference: "sim_test".to_string(),
            },
            &env,
        );

        assert!(state.lines[0].paid);
        assert!((state.total() - 1500.0).abs() < f64::EPSILON);
    }
}
