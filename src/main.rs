use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use lendsim::config::SimulationConfig;
use lendsim::report::{self, DayDist, DayRecord, DistStats, RunSummary};
use lendsim::source::{PolicySchedule, PolicySource, StaticPolicy};
use lendsim::{OnMissingPolicy, Policy, SimError, Simulation};

#[derive(Parser, Debug)]
#[command(name = "lendsim")]
#[command(about = "Simulate a city of loan applicants under a daily underwriting policy", long_about = None)]
struct Args {
    /// Seed for the run (first seed with --runs)
    #[arg(short, long, default_value_t = SimulationConfig::canonical().seed)]
    seed: u64,

    /// Number of citizens
    #[arg(short, long, default_value_t = SimulationConfig::canonical().n_agents)]
    agents: usize,

    /// Interest rate in percentage points, e.g. 8.5
    #[arg(short, long, default_value_t = SimulationConfig::canonical().interest_rate)]
    interest_rate: f64,

    /// Days to simulate
    #[arg(short, long, default_value_t = SimulationConfig::canonical().days)]
    days: u32,

    /// JSON file holding one policy applied every day
    #[arg(long, conflicts_with = "schedule")]
    policy: Option<PathBuf>,

    /// NDJSON file holding one policy (or null) per day
    #[arg(long)]
    schedule: Option<PathBuf>,

    /// Stop at the first day without a usable policy instead of skipping it
    #[arg(long)]
    abort_on_missing: bool,

    /// Where to write the day records of a single run
    #[arg(short, long, default_value = "days.ndjson")]
    output: PathBuf,

    /// Run this many consecutive seeds and report per-day distributions
    #[arg(long)]
    runs: Option<u64>,

    /// With --runs, also write every run's day records as CSV
    #[arg(long, requires = "runs")]
    csv: Option<PathBuf>,

    /// Suppress the console tables
    #[arg(short, long)]
    quiet: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let base_config = SimulationConfig {
        seed: args.seed,
        n_agents: args.agents,
        interest_rate: args.interest_rate,
        days: args.days,
    };
    let on_missing =
        if args.abort_on_missing { OnMissingPolicy::Abort } else { OnMissingPolicy::Skip };

    if let Some(n) = args.runs {
        let mut all_runs = Vec::new();
        for i in 0..n {
            let config = base_config.nth_run(i);
            let mut source = load_source(args)?;
            let mut sim = Simulation::from_config(config)?;
            sim.run(source.as_mut(), on_missing)?;
            all_runs.push(sim.log);
        }

        if let Some(path) = &args.csv {
            report::write_runs_csv(&all_runs, args.seed, BufWriter::new(File::create(path)?))?;
        }

        if !args.quiet {
            if n < 2 {
                eprintln!("Warning: distributions need at least 2 runs");
            } else {
                print_distributions(&report::analyse_distributions(&all_runs), n);
            }
        }
        return Ok(());
    }

    let mut source = load_source(args)?;
    let mut sim = Simulation::from_config(base_config)?;
    sim.run(source.as_mut(), on_missing)?;

    report::write_ndjson(&sim.log, BufWriter::new(File::create(&args.output)?))?;

    if !args.quiet {
        print_days(&sim.log);
        if !sim.skipped.is_empty() {
            let days: Vec<String> = sim.skipped.iter().map(|d| d.to_string()).collect();
            println!("\nUnsettled days: {}", days.join(", "));
        }
        print_summary(&RunSummary::from_records(&sim.log));
        println!("\nDay records written to {}", args.output.display());
    }
    Ok(())
}

fn load_source(args: &Args) -> Result<Box<dyn PolicySource>, SimError> {
    if let Some(path) = &args.schedule {
        return Ok(Box::new(PolicySchedule::from_ndjson(open(path)?)?));
    }
    let policy = match &args.policy {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Policy::from_json(&text)?
        }
        None => Policy::canonical(),
    };
    Ok(Box::new(StaticPolicy(policy)))
}

fn open(path: &Path) -> Result<BufReader<File>, SimError> {
    Ok(BufReader::new(File::open(path)?))
}

fn pct(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "-".to_string())
}

fn print_days(records: &[DayRecord]) {
    println!(
        "{:>4} | {:>7} | {:>8} | {:>8} | {:>9} | {:>10} | {:>8} | {:>8}",
        "Day", "Applied", "Approved", "Defaults", "TotalAppr", "TotalDeflt", "ApprR%", "DefR%"
    );
    println!("{}", "-".repeat(84));
    for r in records {
        println!(
            "{:>4} | {:>7} | {:>8} | {:>8} | {:>9} | {:>10} | {:>8} | {:>8}",
            r.day,
            r.applied_count,
            r.approved_count,
            r.default_count,
            r.total_approved_to_date,
            r.total_defaulted_to_date,
            pct(r.approval_rate()),
            pct(r.default_rate()),
        );
    }
}

fn print_summary(s: &RunSummary) {
    println!("\n=== Summary ({} days) ===", s.days);
    println!("  Total approvals:   {}", s.total_approvals);
    println!("  Total defaults:    {}", s.total_defaults);
    println!("  Avg approval rate: {}", pct(s.avg_approval_rate));
    println!("  Avg default rate:  {}", pct(s.avg_default_rate));
}

fn print_dist_section<F>(title: &str, dists: &[DayDist], scale: f64, extract: F)
where
    F: Fn(&DayDist) -> Option<&DistStats>,
{
    println!("\n--- {title} ---");
    println!(
        "{:>4} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7}",
        "Day", "min", "p5", "p50", "p95", "max", "mean", "stddev"
    );
    for dd in dists {
        let Some(ds) = extract(dd) else {
            println!("{:>4} | {:>7}", dd.day, "-");
            continue;
        };
        println!(
            "{:>4} | {:>7.1} | {:>7.1} | {:>7.1} | {:>7.1} | {:>7.1} | {:>7.1} | {:>7.1}",
            dd.day,
            ds.min * scale,
            ds.p5 * scale,
            ds.p50 * scale,
            ds.p95 * scale,
            ds.max * scale,
            ds.mean * scale,
            ds.std_dev * scale,
        );
    }
}

fn print_distributions(dists: &[DayDist], n_runs: u64) {
    println!("=== Multi-Run Distribution (N={n_runs} runs) ===");
    print_dist_section("Approved", dists, 1.0, |d| Some(&d.approved));
    print_dist_section("Defaults", dists, 1.0, |d| Some(&d.defaults));
    print_dist_section("ApprR%", dists, 100.0, |d| d.approval_rate.as_ref());
    print_dist_section("DefR%", dists, 100.0, |d| d.default_rate.as_ref());
}
