//! Trace sinks: where the pipeline reports what happened each cycle.
//!
//! The core reports stage intervals, retires, and architectural counter
//! changes through the [`TraceSink`] trait and never sees a serialization
//! format. Two sinks ship with the crate:
//! 1. **[`NullTrace`]:** Discards everything (headless runs, tests).
//! 2. **[`PerfettoTrace`](perfetto::PerfettoTrace):** Chrome Trace Event
//!    JSON, openable in Perfetto.

use std::fmt;

/// Chrome-Trace-Event JSON sink.
pub mod perfetto;

/// Pipeline stage identifier carried by stage-interval events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Instruction fetch.
    Fetch,
    /// Decode/dispatch.
    Dispatch,
    /// Execution.
    Execute,
}

impl Stage {
    /// One-letter tag used in trace output ("F", "D", "E").
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Fetch => "F",
            Self::Dispatch => "D",
            Self::Execute => "E",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a uop left the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetireKind {
    /// Completed architecturally.
    Retire,
    /// Squashed on the wrong path of a taken branch.
    Flush,
}

/// Receiver for per-cycle pipeline events.
///
/// Lane ids are assigned deterministically: IFU = 0, IDU = 1, execution
/// units 2, 3, … in roster order. `cycle` arguments are the reporting unit's
/// own cycle counter at the time of the event.
pub trait TraceSink {
    /// Advances the trace timestamp by `elapsed` cycles.
    fn log_cycle(&mut self, elapsed: u64);

    /// Records the display label for a uop (logged once at fetch).
    fn log_insn(&mut self, id: u64, label: &str);

    /// Marks the start of `stage` for uop `id` on `lane`.
    fn log_stage_start(&mut self, id: u64, stage: Stage, lane: usize, cycle: u64);

    /// Marks the end of `stage` for uop `id` on `lane`.
    fn log_stage_end(&mut self, id: u64, stage: Stage, lane: usize, cycle: u64);

    /// Records that uop `id` left the pipeline.
    fn log_retire(&mut self, id: u64, kind: RetireKind);

    /// Records an accepted architectural state change.
    fn log_arch_value(&mut self, regfile: &str, index: usize, value: i64);

    /// Finishes the trace stream; called once at the end of a run.
    fn close(&mut self);
}

/// A sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn log_cycle(&mut self, _elapsed: u64) {}
    fn log_insn(&mut self, _id: u64, _label: &str) {}
    fn log_stage_start(&mut self, _id: u64, _stage: Stage, _lane: usize, _cycle: u64) {}
    fn log_stage_end(&mut self, _id: u64, _stage: Stage, _lane: usize, _cycle: u64) {}
    fn log_retire(&mut self, _id: u64, _kind: RetireKind) {}
    fn log_arch_value(&mut self, _regfile: &str, _index: usize, _value: i64) {}
    fn close(&mut self) {}
}
