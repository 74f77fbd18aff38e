//! Single-slot handshake channel between pipeline stages.
//!
//! A stage prepares data for the next stage; the downstream stage must claim
//! it before the upstream stage may produce more. Unclaimed data means the
//! producer stalls. This one-deep channel is what turns downstream busyness
//! into upstream backpressure without any explicit wiring.

/// Single-slot channel with claim-based handshaking.
///
/// Between any two successful [`prepare`](Self::prepare) calls there is
/// exactly one [`claim`](Self::claim); long-latency consumers may
/// [`peek`](Self::peek) for their whole latency window (keeping the producer
/// stalled) and claim only when they finish.
///
/// # Examples
///
/// ```
/// use npusim_core::core::pipeline::stage_data::StageData;
///
/// let mut slot: StageData<u32> = StageData::default();
/// slot.prepare(7);
/// assert!(slot.should_stall());
/// assert_eq!(slot.peek(), Some(&7));
/// assert_eq!(slot.claim(), Some(7));
/// assert!(!slot.should_stall());
/// assert_eq!(slot.claim(), None);
/// ```
#[derive(Debug)]
pub struct StageData<T> {
    slot: Option<T>,
}

impl<T> Default for StageData<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> StageData<T> {
    /// Creates an empty channel.
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Places `value` in the slot for the downstream stage.
    ///
    /// Should only be called after the previous value was claimed; the
    /// producer checks [`should_stall`](Self::should_stall) first.
    pub fn prepare(&mut self, value: T) {
        debug_assert!(self.slot.is_none(), "prepare over an unclaimed slot");
        self.slot = Some(value);
    }

    /// Takes the value, emptying the slot and releasing the producer.
    pub fn claim(&mut self) -> Option<T> {
        self.slot.take()
    }

    /// Observes the value without claiming it.
    pub fn peek(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    /// True when the producer must not overwrite the slot.
    pub fn should_stall(&self) -> bool {
        self.slot.is_some()
    }

    /// True when a value is waiting to be claimed.
    pub fn is_valid(&self) -> bool {
        self.slot.is_some()
    }

    /// Clears the slot unconditionally.
    pub fn reset(&mut self) {
        self.slot = None;
    }
}
