use log::{debug, LevelFilter};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};
use structopt::StructOpt;

use unit_flow::{
    max_flow::{compute_max_flow_directed, FlowSolution},
    network::FlowNetwork,
    parser::ParsedNetwork,
};

#[derive(StructOpt)]
#[structopt(name = "max_flow", about = "Maximum flow between two vertices of a network")]
struct Args {
    /// DIMACS max-flow file, the built-in diamond graph when missing
    input: Option<PathBuf>,

    /// Source vertex (0 based), overrides the file's 'n <id> s' line
    #[structopt(short, long)]
    source: Option<usize>,

    /// Sink vertex (0 based), overrides the file's 'n <id> t' line
    #[structopt(short = "t", long)]
    sink: Option<usize>,

    /// Solve the integer program instead of augmenting paths
    #[structopt(long)]
    lp: bool,

    /// Print the flow carried by every edge
    #[structopt(long)]
    flows: bool,

    /// Print the edges of a minimum cut
    #[structopt(long)]
    min_cut: bool,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

// Mimalloc allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

struct ConsoleLogger {
    start: Instant,
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    // Stdout only carries results
    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{:.2?} {} - {}",
                self.start.elapsed(),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

#[cfg_attr(feature = "verbose", allow(unused_variables))]
fn init_logging(verbose: u8) {
    let console_logger = ConsoleLogger {
        start: Instant::now(),
    };
    let console_logger = Box::leak(Box::new(console_logger));

    if log::set_logger(console_logger).is_err() {
        return;
    }
    log::set_max_level(match () {
        #[cfg(feature = "verbose")]
        () => LevelFilter::Debug,
        #[cfg(not(feature = "verbose"))]
        () => match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        },
    });
    debug!("Debug enabled");
}

#[cfg(feature = "scip")]
fn solve_lp(
    network: &FlowNetwork,
    source: usize,
    sink: usize,
    verbose: bool,
) -> Result<FlowSolution, Box<dyn std::error::Error>> {
    use unit_flow::{lp_max_flow::solve_max_flow_lp, lp_solvers::scip::ScipSolver};
    Ok(solve_max_flow_lp::<ScipSolver>(network, source, sink, verbose)?)
}

#[cfg(not(feature = "scip"))]
fn solve_lp(
    _network: &FlowNetwork,
    _source: usize,
    _sink: usize,
    _verbose: bool,
) -> Result<FlowSolution, Box<dyn std::error::Error>> {
    Err("--lp needs a build with the 'scip' feature".into())
}

fn print_solution(
    mut out: impl Write,
    network: &FlowNetwork,
    solution: &FlowSolution,
    flows: bool,
) -> io::Result<()> {
    writeln!(out, "{}", solution.value)?;
    if flows {
        for (edge, flow) in network.edges().iter().zip(&solution.edge_flows) {
            writeln!(out, "f {} {} {}", edge.from, edge.to, flow)?;
        }
    }
    if let Some(min_cut) = &solution.min_cut {
        for &idx in min_cut {
            let edge = network.edges()[idx];
            writeln!(out, "m {} {}", edge.from, edge.to)?;
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (network, file_source, file_sink) = match &args.input {
        Some(path) => {
            let parsed = ParsedNetwork::from_file(path)?;
            (parsed.network, parsed.source, parsed.sink)
        }
        None => (FlowNetwork::diamond_with_chord(), Some(0), Some(3)),
    };

    log::info!(
        "Network with {} vertices and {} edges",
        network.vertex_count(),
        network.edge_count()
    );

    let source = args
        .source
        .or(file_source)
        .ok_or("no source vertex given")?;
    let sink = args.sink.or(file_sink).ok_or("no sink vertex given")?;

    let solution = if args.lp {
        if args.min_cut {
            log::warn!("Minimum cut is only reported by the augmenting path solver");
        }
        solve_lp(&network, source, sink, args.verbose > 1)?
    } else {
        compute_max_flow_directed(&network, source, sink, args.min_cut, None)?
    };

    print_solution(io::stdout().lock(), &network, &solution, args.flows)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::from_args();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
