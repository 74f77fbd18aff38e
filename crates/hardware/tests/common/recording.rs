//! A trace sink that records every event for cycle-level assertions.

use std::cell::RefCell;
use std::rc::Rc;

use npusim_core::trace::{RetireKind, Stage, TraceSink};

/// One stage-start or stage-end event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub id: u64,
    pub stage: Stage,
    pub lane: usize,
    pub cycle: u64,
}

/// Everything a run reported, in arrival order.
#[derive(Debug, Default)]
pub struct TraceLog {
    pub starts: Vec<StageEvent>,
    pub ends: Vec<StageEvent>,
    pub retires: Vec<(u64, RetireKind)>,
    pub labels: Vec<(u64, String)>,
    pub arch_values: Vec<(String, usize, i64)>,
    pub cycles: u64,
    pub closed: bool,
}

impl TraceLog {
    fn find(events: &[StageEvent], id: u64, stage: Stage) -> Option<u64> {
        events
            .iter()
            .find(|e| e.id == id && e.stage == stage)
            .map(|e| e.cycle)
    }

    /// First E-start cycle for `id`.
    pub fn e_start(&self, id: u64) -> Option<u64> {
        Self::find(&self.starts, id, Stage::Execute)
    }

    /// First E-end cycle for `id`.
    pub fn e_end(&self, id: u64) -> Option<u64> {
        Self::find(&self.ends, id, Stage::Execute)
    }

    /// First D-start cycle for `id`.
    pub fn d_start(&self, id: u64) -> Option<u64> {
        Self::find(&self.starts, id, Stage::Dispatch)
    }

    /// First D-end cycle for `id`.
    pub fn d_end(&self, id: u64) -> Option<u64> {
        Self::find(&self.ends, id, Stage::Dispatch)
    }

    /// True when `id` retired normally.
    pub fn retired(&self, id: u64) -> bool {
        self.retires
            .iter()
            .any(|&(rid, kind)| rid == id && kind == RetireKind::Retire)
    }

    /// Ids squashed on the wrong path.
    pub fn flushed_ids(&self) -> Vec<u64> {
        self.retires
            .iter()
            .filter(|&&(_, kind)| kind == RetireKind::Flush)
            .map(|&(id, _)| id)
            .collect()
    }
}

/// Sink half: records into a shared log the test keeps a handle to.
#[derive(Debug)]
pub struct RecordingTrace {
    log: Rc<RefCell<TraceLog>>,
}

impl RecordingTrace {
    /// Creates the sink and the shared log handle.
    pub fn new() -> (Self, Rc<RefCell<TraceLog>>) {
        let log = Rc::new(RefCell::new(TraceLog::default()));
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl TraceSink for RecordingTrace {
    fn log_cycle(&mut self, elapsed: u64) {
        self.log.borrow_mut().cycles += elapsed;
    }

    fn log_insn(&mut self, id: u64, label: &str) {
        self.log.borrow_mut().labels.push((id, label.to_owned()));
    }

    fn log_stage_start(&mut self, id: u64, stage: Stage, lane: usize, cycle: u64) {
        self.log.borrow_mut().starts.push(StageEvent {
            id,
            stage,
            lane,
            cycle,
        });
    }

    fn log_stage_end(&mut self, id: u64, stage: Stage, lane: usize, cycle: u64) {
        self.log.borrow_mut().ends.push(StageEvent {
            id,
            stage,
            lane,
            cycle,
        });
    }

    fn log_retire(&mut self, id: u64, kind: RetireKind) {
        self.log.borrow_mut().retires.push((id, kind));
    }

    fn log_arch_value(&mut self, regfile: &str, index: usize, value: i64) {
        self.log
            .borrow_mut()
            .arch_values
            .push((regfile.to_owned(), index, value));
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}
