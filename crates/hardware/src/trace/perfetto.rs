//! Perfetto (Chrome Trace Event) sink.
//!
//! Serializes the pipeline trace as a Chrome Trace Event JSON array:
//! - Each lane becomes a named thread under the functional-unit process.
//! - A stage interval becomes one complete ("X") event from its recorded
//!   start cycle to its end cycle.
//! - Architectural state changes become counter ("C") events under a second
//!   process, one thread per register.
//!
//! Open the output with Perfetto (<https://ui.perfetto.dev>).

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde_json::{Value, json};

use super::{RetireKind, Stage, TraceSink};

/// Process id grouping the functional-unit lanes.
const FU_PID: u64 = 0;
/// Process id grouping the architectural-state counters.
const ARCH_PID: u64 = 1;

/// Thread id for the PC counter track.
const PC_TID: u64 = 1000;
/// First thread id for non-XRF register counter tracks.
const REG_TID_BASE: u64 = 2000;

/// Chrome-Trace-Event JSON trace sink.
pub struct PerfettoTrace<W: Write> {
    out: W,
    first_event: bool,
    failed: bool,
    ts: u64,
    insn_labels: HashMap<u64, String>,
    active: HashMap<(u64, Stage, usize), u64>,
    arch_threads: HashMap<(String, usize), (u64, String)>,
}

impl<W: Write> std::fmt::Debug for PerfettoTrace<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfettoTrace")
            .field("ts", &self.ts)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl PerfettoTrace<BufWriter<File>> {
    /// Creates a trace writing to `path`.
    ///
    /// # Errors
    ///
    /// Propagates file creation failures.
    pub fn create(
        path: &Path,
        process_name: &str,
        lane_names: &BTreeMap<usize, String>,
    ) -> io::Result<Self> {
        Ok(Self::new(
            BufWriter::new(File::create(path)?),
            process_name,
            lane_names,
        ))
    }
}

impl<W: Write> PerfettoTrace<W> {
    /// Creates a trace over an arbitrary writer and emits the metadata
    /// events naming the processes and lane threads.
    pub fn new(out: W, process_name: &str, lane_names: &BTreeMap<usize, String>) -> Self {
        let mut this = Self {
            out,
            first_event: true,
            failed: false,
            ts: 1,
            insn_labels: HashMap::new(),
            active: HashMap::new(),
            arch_threads: HashMap::new(),
        };
        this.write_raw("[");
        this.emit(&json!({
            "name": "process_name",
            "ph": "M",
            "pid": FU_PID,
            "tid": 0,
            "args": {"name": process_name},
        }));
        for (&lane, name) in lane_names {
            this.emit(&json!({
                "name": "thread_name",
                "ph": "M",
                "pid": FU_PID,
                "tid": lane,
                "args": {"name": name},
            }));
        }
        this.emit(&json!({
            "name": "process_name",
            "ph": "M",
            "pid": ARCH_PID,
            "tid": 0,
            "args": {"name": "ArchState"},
        }));
        this
    }

    fn write_raw(&mut self, s: &str) {
        if self.failed {
            return;
        }
        if let Err(err) = self.out.write_all(s.as_bytes()) {
            tracing::warn!(%err, "trace output failed; disabling trace");
            self.failed = true;
        }
    }

    fn emit(&mut self, event: &Value) {
        if self.first_event {
            self.first_event = false;
        } else {
            self.write_raw(",\n");
        }
        let line = event.to_string();
        self.write_raw(&line);
    }

    fn label(&self, id: u64) -> String {
        self.insn_labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("insn-{id}"))
    }
}

impl<W: Write> TraceSink for PerfettoTrace<W> {
    fn log_cycle(&mut self, elapsed: u64) {
        self.ts += elapsed;
    }

    fn log_insn(&mut self, id: u64, label: &str) {
        let _ = self.insn_labels.insert(id, format!("{id}: {label}"));
    }

    fn log_stage_start(&mut self, id: u64, stage: Stage, lane: usize, cycle: u64) {
        // A second start for the same interval is ignored, matching the
        // duplicate-end guard below.
        let _ = self.active.entry((id, stage, lane)).or_insert(cycle);
    }

    fn log_stage_end(&mut self, id: u64, stage: Stage, lane: usize, cycle: u64) {
        let Some(start) = self.active.remove(&(id, stage, lane)) else {
            return;
        };
        let dur = cycle.saturating_sub(start);
        let label = self.label(id);
        self.emit(&json!({
            "name": label,
            "cat": stage.tag(),
            "ph": "X",
            "pid": FU_PID,
            "tid": lane,
            "ts": start,
            "dur": dur,
            "args": {"insn_id": id, "stage": stage.tag()},
        }));
    }

    fn log_retire(&mut self, _id: u64, _kind: RetireKind) {}

    fn log_arch_value(&mut self, regfile: &str, index: usize, value: i64) {
        let key = (regfile.to_owned(), index);
        if !self.arch_threads.contains_key(&key) {
            let (tid, name) = match regfile {
                "xrf" => (index as u64, format!("{regfile}[{index:02}]")),
                "pc" => (PC_TID, "pc".to_owned()),
                _ => (REG_TID_BASE + index as u64, format!("{regfile}[{index:02}]")),
            };
            self.emit(&json!({
                "name": "thread_name",
                "ph": "M",
                "pid": ARCH_PID,
                "tid": tid,
                "args": {"name": name},
            }));
            let _ = self.arch_threads.insert(key.clone(), (tid, name));
        }
        if let Some((tid, name)) = self.arch_threads.get(&key).cloned() {
            let ts = self.ts;
            self.emit(&json!({
                "name": name,
                "ph": "C",
                "pid": ARCH_PID,
                "tid": tid,
                "ts": ts,
                "args": {"value": value},
            }));
        }
    }

    fn close(&mut self) {
        self.write_raw("]\n");
        if !self.failed {
            if let Err(err) = self.out.flush() {
                tracing::warn!(%err, "trace flush failed");
            }
        }
    }
}
