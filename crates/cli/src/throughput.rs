//! Analytical GEMM throughput model.
//!
//! A closed-form counterpart to the cycle simulator: given the tile geometry
//! of the matrix unit and a GEMM size M×N×K, derive cycle count, instruction
//! count, and memory traffic for two dataflows without simulating anything.
//! Useful for sizing register files and sanity-checking simulated runs.

/// Tile geometry of the modeled matrix unit.
#[derive(Debug, Clone, Copy)]
pub struct TileParams {
    /// Width of the input dtype in bytes.
    pub input_width: u64,
    /// Width of the output dtype in bytes.
    pub output_width: u64,
    /// Rows in a matrix register (activation tile height).
    pub mt: u64,
    /// Number of inner-product trees / width of the systolic array.
    pub nt: u64,
    /// Elements each tree reduces / height of the systolic array.
    pub kt: u64,
}

impl Default for TileParams {
    fn default() -> Self {
        Self {
            input_width: 1,
            output_width: 2,
            mt: 64,
            nt: 16,
            kt: 32,
        }
    }
}

impl TileParams {
    const fn input_tile_bytes(&self) -> u64 {
        self.input_width * self.mt * self.kt
    }

    const fn weight_tile_bytes(&self) -> u64 {
        self.input_width * self.nt * self.kt
    }

    const fn output_tile_bytes(&self) -> u64 {
        self.output_width * self.mt * self.nt
    }
}

/// Derived counts for one dataflow over one GEMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataflowStats {
    /// Total cycles (one activation row per cycle).
    pub cycles: u64,
    /// Matmul instructions issued.
    pub instructions: u64,
    /// Activation bytes loaded.
    pub input_load_bytes: u64,
    /// Weight bytes loaded.
    pub weight_load_bytes: u64,
    /// Output bytes stored.
    pub output_store_bytes: u64,
}

const fn ceil_div(a: u64, b: u64) -> u64 {
    a.div_ceil(b)
}

/// Output-stationary dataflow: accumulators stay put, inputs and weights
/// stream per K-tile; outputs are stored once per (M, N) tile.
pub fn output_stationary(p: &TileParams, m: u64, n: u64, k: u64) -> DataflowStats {
    let m_iters = ceil_div(m, p.mt);
    let n_iters = m_iters * ceil_div(n, p.nt);
    let k_iters = n_iters * ceil_div(k, p.kt);
    let row_iters = k_iters * p.mt;

    DataflowStats {
        cycles: row_iters,
        instructions: k_iters,
        input_load_bytes: k_iters * p.input_tile_bytes(),
        weight_load_bytes: k_iters * p.weight_tile_bytes(),
        output_store_bytes: n_iters * p.output_tile_bytes(),
    }
}

/// Weight-stationary dataflow: each weight tile is loaded once and reused
/// across the M dimension; partial outputs are stored per M-tile.
pub fn weight_stationary(p: &TileParams, m: u64, n: u64, k: u64) -> DataflowStats {
    let k_iters = ceil_div(k, p.kt);
    let n_iters = k_iters * ceil_div(n, p.nt);
    let m_iters = n_iters * ceil_div(m, p.mt);
    let row_iters = m_iters * p.mt;

    DataflowStats {
        cycles: row_iters,
        instructions: m_iters,
        input_load_bytes: m_iters * p.input_tile_bytes(),
        weight_load_bytes: n_iters * p.weight_tile_bytes(),
        output_store_bytes: m_iters * p.output_tile_bytes(),
    }
}

/// Prints a side-by-side comparison of both dataflows.
pub fn print_comparison(p: &TileParams, m: u64, n: u64, k: u64) {
    let os = output_stationary(p, m, n, k);
    let ws = weight_stationary(p, m, n, k);
    println!(
        "GEMM {m}x{n}x{k}, tiles MT={} NT={} KT={}",
        p.mt, p.nt, p.kt
    );
    println!("{:<24} {:>16} {:>16}", "metric", "output-stationary", "weight-stationary");
    println!("{}", "-".repeat(58));
    let row = |name: &str, a: u64, b: u64| println!("{name:<24} {a:>16} {b:>16}");
    row("cycles", os.cycles, ws.cycles);
    row("instructions", os.instructions, ws.instructions);
    row("input load bytes", os.input_load_bytes, ws.input_load_bytes);
    row("weight load bytes", os.weight_load_bytes, ws.weight_load_bytes);
    row("output store bytes", os.output_store_bytes, ws.output_store_bytes);
}
