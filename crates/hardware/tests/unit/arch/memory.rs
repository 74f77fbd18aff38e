//! # Memory and Flag Tests
//!
//! Bounds behavior (`base + len <= memory_size` succeeds, anything further
//! fails) and the flag array.

use npusim_core::SimError;
use npusim_core::config::ArchStateConfig;
use npusim_core::core::arch::state::ArchState;
use npusim_core::trace::NullTrace;

fn small_state() -> ArchState {
    let cfg = ArchStateConfig {
        memory_size: 256,
        ..ArchStateConfig::default()
    };
    ArchState::new(cfg, 2, Box::new(NullTrace))
}

#[test]
fn test_write_then_read_round_trips() {
    let mut st = small_state();
    st.write_memory(10, &[1, 2, 3, 4]).unwrap();
    assert_eq!(st.read_memory(10, 4).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_access_up_to_the_last_byte_succeeds() {
    let mut st = small_state();
    st.write_memory(252, &[9, 9, 9, 9]).unwrap();
    assert_eq!(st.read_memory(252, 4).unwrap(), vec![9, 9, 9, 9]);
    assert_eq!(st.read_memory(256, 0).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_access_past_the_end_is_fatal() {
    let mut st = small_state();
    assert!(matches!(
        st.write_memory(253, &[0, 0, 0, 0]),
        Err(SimError::MemoryBounds { base: 253, len: 4, size: 256 })
    ));
    assert!(matches!(
        st.read_memory(256, 1),
        Err(SimError::MemoryBounds { .. })
    ));
}

#[test]
fn test_huge_base_does_not_overflow() {
    let st = small_state();
    assert!(matches!(
        st.read_memory(usize::MAX, 2),
        Err(SimError::MemoryBounds { .. })
    ));
}

#[test]
fn test_overlapping_writes_later_wins() {
    let mut st = small_state();
    st.write_memory(0, &[1; 8]).unwrap();
    st.write_memory(4, &[2; 8]).unwrap();
    assert_eq!(st.read_memory(0, 12).unwrap(), [vec![1; 4], vec![2; 8]].concat());
}

#[test]
fn test_flags_set_clear_check() {
    let mut st = small_state();
    assert!(!st.check_flag(0).unwrap());
    st.set_flag(0).unwrap();
    assert!(st.check_flag(0).unwrap());
    st.clear_flag(0).unwrap();
    assert!(!st.check_flag(0).unwrap());
}

#[test]
fn test_flag_out_of_range_is_fatal() {
    let mut st = small_state();
    let count = st.cfg().num_flags;
    assert!(matches!(
        st.set_flag(count),
        Err(SimError::FlagOutOfRange { .. })
    ));
    assert!(matches!(
        st.check_flag(count),
        Err(SimError::FlagOutOfRange { .. })
    ));
}
