//! NPU cycle-accurate simulator CLI.
//!
//! This binary provides a single entry point for the performance model. It performs:
//! 1. **Run:** Execute a built-in or JSON program on a built-in or JSON hardware
//!    config, writing a Perfetto trace and printing summary statistics.
//! 2. **List:** Show the built-in programs and the registered instruction set.
//! 3. **Throughput:** Evaluate the analytical GEMM dataflow model (no simulation).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use npusim_core::config::{
    DispatchStrategy, ExecutionUnitConfig, ExecutionUnitKind, HardwareConfig,
};
use npusim_core::isa::decode::SourceProgram;
use npusim_core::trace::perfetto::PerfettoTrace;
use npusim_core::trace::{NullTrace, TraceSink};
use npusim_core::{IsaSpec, Simulation};

mod programs;
mod throughput;

#[derive(Parser, Debug)]
#[command(
    name = "npusim",
    author,
    version,
    about = "NPU cycle-accurate performance model",
    long_about = "Run a program on the modeled NPU core and emit a Perfetto trace.\n\nExamples:\n  npusim run -p matmul -o trace.json\n  npusim run --program-file kernel.json --config-file machine.json\n  npusim throughput --m 512 --n 256 --k 1024"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program until completion or the cycle cap.
    Run {
        /// Built-in program name (see `npusim list`).
        #[arg(short, long, default_value = "addi")]
        program: String,

        /// JSON program file; overrides --program.
        #[arg(long)]
        program_file: Option<PathBuf>,

        /// Built-in machine name (see `npusim list`).
        #[arg(short, long, default_value = "simple-npu")]
        machine: String,

        /// JSON hardware config file; overrides --machine.
        #[arg(long)]
        config_file: Option<PathBuf>,

        /// Output trace file.
        #[arg(short, long, default_value = "trace.json")]
        output: PathBuf,

        /// Maximum cycles to simulate.
        #[arg(long, default_value_t = 10_000)]
        max_cycles: u64,

        /// Skip trace output entirely.
        #[arg(long)]
        no_trace: bool,
    },

    /// List built-in programs and the registered instruction set.
    List,

    /// Evaluate the analytical GEMM throughput model.
    Throughput {
        /// GEMM M dimension.
        #[arg(long, default_value_t = 512)]
        m: u64,

        /// GEMM N dimension.
        #[arg(long, default_value_t = 512)]
        n: u64,

        /// GEMM K dimension.
        #[arg(long, default_value_t = 512)]
        k: u64,

        /// Activation tile height.
        #[arg(long, default_value_t = 64)]
        mt: u64,

        /// Weight tile height.
        #[arg(long, default_value_t = 16)]
        nt: u64,

        /// Reduction tile depth.
        #[arg(long, default_value_t = 32)]
        kt: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Run {
            program,
            program_file,
            machine,
            config_file,
            output,
            max_cycles,
            no_trace,
        } => cmd_run(
            &program,
            program_file,
            &machine,
            config_file,
            &output,
            max_cycles,
            no_trace,
        ),
        Commands::List => cmd_list(),
        Commands::Throughput {
            m,
            n,
            k,
            mt,
            nt,
            kt,
        } => {
            let params = throughput::TileParams {
                mt,
                nt,
                kt,
                ..throughput::TileParams::default()
            };
            throughput::print_comparison(&params, m, n, k);
        }
    }
}

fn cmd_list() {
    println!("Built-in programs:");
    for name in programs::PROGRAM_NAMES {
        println!("  {name}");
    }
    println!("\nBuilt-in machines:");
    for name in MACHINE_NAMES {
        println!("  {name}");
    }
    let isa = IsaSpec::baseline();
    println!("\nInstruction set: {} mnemonics", isa.len());
}

/// Names of all built-in machines.
const MACHINE_NAMES: &[&str] = &["simple-npu", "dual-dma"];

/// Looks up a built-in machine by name.
fn builtin_machine(name: &str) -> Result<HardwareConfig, npusim_core::SimError> {
    match name {
        "simple-npu" => Ok(HardwareConfig::default()),
        // Two DMA engines sharing the DMA class under round-robin dispatch.
        "dual-dma" => {
            let mut config = HardwareConfig {
                name: "dual-dma".to_owned(),
                dispatch_strategy: DispatchStrategy::RoundRobin,
                ..HardwareConfig::default()
            };
            config.execution_units.push(ExecutionUnitConfig {
                name: "DMA1".to_owned(),
                kind: ExecutionUnitKind::Dma,
            });
            Ok(config)
        }
        other => Err(npusim_core::SimError::UnknownConfig(other.to_owned())),
    }
}

fn cmd_run(
    program_name: &str,
    program_file: Option<PathBuf>,
    machine: &str,
    config_file: Option<PathBuf>,
    output: &PathBuf,
    max_cycles: u64,
    no_trace: bool,
) {
    let config = match config_file {
        Some(path) => read_json::<HardwareConfig>(&path),
        None => builtin_machine(machine).unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            eprintln!("Available machines: {}", MACHINE_NAMES.join(", "));
            process::exit(1);
        }),
    };

    let source = match program_file {
        Some(path) => read_json::<SourceProgram>(&path),
        None => programs::builtin(program_name).unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            eprintln!("Available programs: {}", programs::PROGRAM_NAMES.join(", "));
            process::exit(1);
        }),
    };

    let isa = IsaSpec::baseline();
    let program = isa.decode_program(&source).unwrap_or_else(|err| {
        eprintln!("Error decoding program: {err}");
        process::exit(1);
    });

    println!("Machine: {}  (fetch width {})", config.name, config.fetch_width);
    println!(
        "Units:   {}",
        config
            .execution_units
            .iter()
            .map(|eu| eu.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Program: {} instructions", program.len());

    tracing::info!(max_cycles, "starting run");

    let trace: Box<dyn TraceSink> = if no_trace {
        Box::new(NullTrace)
    } else {
        let mut lanes: BTreeMap<usize, String> = BTreeMap::new();
        let _ = lanes.insert(0, "IFU".to_owned());
        let _ = lanes.insert(1, "IDU".to_owned());
        for (idx, eu) in config.execution_units.iter().enumerate() {
            let _ = lanes.insert(2 + idx, eu.name.clone());
        }
        match PerfettoTrace::create(output, &config.name, &lanes) {
            Ok(sink) => Box::new(sink),
            Err(err) => {
                eprintln!("Error creating trace file {}: {err}", output.display());
                process::exit(1);
            }
        }
    };

    let mut sim = Simulation::new(&config, program, trace);
    let stats = sim.run(max_cycles).unwrap_or_else(|err| {
        eprintln!("\n[!] FATAL: {err}");
        process::exit(1);
    });

    stats.print();

    println!("\nFinal scalar registers:");
    let state = sim.core().state();
    for rs in 0..8 {
        if let Ok(v) = state.read_xrf(rs) {
            print!("  x{rs}={v}");
        }
    }
    println!();

    if !no_trace {
        println!("\nTrace written to: {}", output.display());
        println!("Open with Perfetto (https://ui.perfetto.dev)");
    }
}

/// Reads and deserializes a JSON file, exiting with a diagnostic on failure.
fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> T {
    let text = fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("Error reading {}: {err}", path.display());
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|err| {
        eprintln!("Error parsing {}: {err}", path.display());
        process::exit(1);
    })
}
