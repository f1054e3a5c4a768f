use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::{channel, Sender};
use std::thread;
use std::time::{Duration, Instant};
use clap::Parser;
use log::debug;
use serde::Serialize;
use cachemap::config::CacheConfig;
use cachemap::io::read_address_trace;
use cachemap::simulator::{Simulation, Simulator};
use cachemap::trace::{StepKind, Trace, TraceStep};
use crate::stepper::{Control, Event, Tutorial};

mod stepper;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

const DEFAULT_AUTOPLAY_MS: u64 = 1500;

#[derive(Parser, Debug)]
#[command(about = String::from("Step-by-step tutor for cache address mapping"))]
struct Args {
    /// Cache configuration (JSON)
    config: String,

    /// Binary addresses to access, in order
    addresses: Vec<String>,

    /// Read more addresses from a trace file, after the ones given inline
    #[arg(short, long)]
    trace_file: Option<String>,

    /// Print every step of every access
    #[arg(short, long)]
    steps: bool,

    /// Walk through the steps of the last access interactively
    #[arg(long)]
    tutorial: bool,

    /// Auto-advance the tutorial every MS milliseconds, starting immediately
    #[arg(long, value_name = "MS")]
    autoplay: Option<u64>,

    /// Fill the cache with random blocks before the first access
    #[arg(long)]
    seed: Option<u64>,

    /// Print one JSON record per access instead of a summary line
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

#[derive(Serialize)]
struct AccessRecord<'a> {
    address: String,
    hit: bool,
    line: String,
    word: u32,
    evicted: Option<String>,
    steps: &'a Trace,
}

impl<'a> AccessRecord<'a> {
    fn new(simulation: &'a Simulation) -> Self {
        let access = &simulation.access;
        Self {
            address: access.address.to_string(),
            hit: access.hit(),
            line: access.line().to_string(),
            word: access.delivered_word(),
            evicted: access.replacement.as_ref().and_then(|r| r.evicted.map(|tag| tag.to_string())),
            steps: &simulation.trace,
        }
    }
}

fn summary(simulation: &Simulation) -> String {
    let access = &simulation.access;
    let address = &access.address;
    let index = address.index.map(|i| format!(" index {i}")).unwrap_or_default();
    let outcome = if access.hit() { "HIT " } else { "MISS" };
    format!(
        "{address}  tag {}{index} word {}  {outcome} {}  -> {}",
        address.tag,
        address.word,
        access.line(),
        access.delivered_word()
    )
}

fn render_step(step: &TraceStep, position: usize, total: usize) -> String {
    let marker = match step.kind {
        StepKind::Info => "·",
        StepKind::Success => "✓",
        StepKind::Error => "✗",
        StepKind::Warning => "!",
    };
    format!("[{position}/{total}] {marker} {}\n{}", step.title, step.description)
}

fn print_trace(trace: &Trace) {
    for (i, step) in trace.steps().iter().enumerate() {
        println!("{}\n", render_step(step, i + 1, trace.len()));
    }
}

/// Forwards every line of stdin to `events` on its own thread
fn read_commands(events: Sender<Event>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if events.send(Event::Command(line)).is_err() {
                return;
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

fn run_tutorial(trace: &Trace, autoplay: Option<u64>) {
    let interval = Duration::from_millis(autoplay.unwrap_or(DEFAULT_AUTOPLAY_MS));
    let (sender, receiver) = channel();
    let mut tutorial = Tutorial::new(trace.len(), interval, sender.clone());
    read_commands(sender);
    println!("Commands: n (next), p (previous), j K (jump to step K), r (reset), play, pause, q (quit)\n");
    if let Some(step) = trace.get(0) {
        println!("{}", render_step(step, 1, trace.len()));
    }
    if autoplay.is_some() {
        tutorial.play();
    }
    while let Ok(event) = receiver.recv() {
        match tutorial.handle(event) {
            Control::Show(index) => {
                if let Some(step) = trace.get(index) {
                    println!("\n{}", render_step(step, index + 1, trace.len()));
                }
            }
            Control::Unchanged => {}
            Control::Help => println!("Unknown command. Use n, p, j K, r, play, pause, or q"),
            Control::Quit => break,
        }
    }
    debug!("tutorial finished on step {} of {}", tutorial.cursor().current() + 1, tutorial.cursor().len());
}

fn main() -> Result<(), String> {
    pretty_env_logger::init();
    let start = Instant::now();
    let args = Args::parse();
    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let config: CacheConfig = serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    let mut simulator = Simulator::new(&config).map_err(|e| format!("Invalid configuration: {e}"))?;
    if let Some(seed) = args.seed {
        simulator.randomise(seed);
    }

    let mut addresses = args.addresses.clone();
    if let Some(path) = &args.trace_file {
        let trace_file = File::open(path).map_err(|e| format!("Couldn't open the trace file at path {path}: {e}"))?;
        addresses.extend(read_address_trace(trace_file)?);
    }

    let mut last = None;
    for address in &addresses {
        let simulation = simulator.simulate(address).map_err(|e| format!("Couldn't simulate {address}: {e}"))?;
        if args.json {
            println!("{}", serde_json::to_string(&AccessRecord::new(&simulation)).map_err(|e| format!("Couldn't serialise the access {e}"))?);
        } else {
            println!("{}", summary(&simulation));
            if args.steps {
                println!();
                print_trace(&simulation.trace);
            }
        }
        last = Some(simulation);
    }
    println!("{}", serde_json::to_string_pretty(simulator.result()).map_err(|e| format!("Couldn't serialise the output {e}"))?);

    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        println!("Derived geometry: {:?}", simulator.geometry());
        println!("Invalid cache lines: {}", simulator.get_invalid_line_count());
    }

    if args.tutorial {
        match &last {
            Some(simulation) => run_tutorial(&simulation.trace, args.autoplay),
            None => return Err("The tutorial needs at least one address".to_string()),
        }
    }
    Ok(())
}
