//! # Stage Handshake Tests
//!
//! Between any two successful `prepare` calls there is exactly one `claim`;
//! `should_stall()` matches `is_valid()`; claiming an empty slot returns
//! nothing and has no side effects.

use proptest::prelude::*;

use npusim_core::core::pipeline::stage_data::StageData;

#[test]
fn test_starts_empty() {
    let slot: StageData<i32> = StageData::new();
    assert!(!slot.is_valid());
    assert!(!slot.should_stall());
    assert_eq!(slot.peek(), None);
}

#[test]
fn test_prepare_then_claim() {
    let mut slot = StageData::new();
    slot.prepare(42);
    assert!(slot.is_valid());
    assert!(slot.should_stall());
    assert_eq!(slot.claim(), Some(42));
    assert!(!slot.is_valid());
}

#[test]
fn test_claim_empty_returns_none_without_side_effects() {
    let mut slot: StageData<i32> = StageData::new();
    assert_eq!(slot.claim(), None);
    assert_eq!(slot.claim(), None);
    assert!(!slot.should_stall());
}

#[test]
fn test_peek_does_not_clear() {
    let mut slot = StageData::new();
    slot.prepare(7);
    assert_eq!(slot.peek(), Some(&7));
    assert_eq!(slot.peek(), Some(&7));
    assert!(slot.should_stall());
    assert_eq!(slot.claim(), Some(7));
}

#[test]
fn test_reset_clears() {
    let mut slot = StageData::new();
    slot.prepare(1);
    slot.reset();
    assert!(!slot.is_valid());
    assert_eq!(slot.claim(), None);
}

#[test]
fn test_stall_matches_validity() {
    let mut slot = StageData::new();
    for round in 0..3 {
        assert_eq!(slot.should_stall(), slot.is_valid());
        slot.prepare(round);
        assert_eq!(slot.should_stall(), slot.is_valid());
        assert_eq!(slot.claim(), Some(round));
    }
}

#[derive(Debug, Clone)]
enum Action {
    PrepareIfEmpty(i32),
    Claim,
    Peek,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        any::<i32>().prop_map(Action::PrepareIfEmpty),
        Just(Action::Claim),
        Just(Action::Peek),
    ]
}

proptest! {
    /// The slot behaves exactly like an `Option` under any legal sequence
    /// of handshake operations.
    #[test]
    fn prop_matches_option_model(actions in proptest::collection::vec(action(), 1..64)) {
        let mut slot = StageData::new();
        let mut model: Option<i32> = None;
        for act in actions {
            match act {
                Action::PrepareIfEmpty(v) => {
                    if model.is_none() {
                        slot.prepare(v);
                        model = Some(v);
                    }
                }
                Action::Claim => {
                    prop_assert_eq!(slot.claim(), model.take());
                }
                Action::Peek => {
                    prop_assert_eq!(slot.peek(), model.as_ref());
                }
            }
            prop_assert_eq!(slot.is_valid(), model.is_some());
            prop_assert_eq!(slot.should_stall(), model.is_some());
        }
    }
}
