//! Reads a `days.ndjson` written by `lendsim` and prints the headline
//! metrics plus the derived-rate table.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lendsim::report::{RunSummary, read_ndjson};

#[derive(Parser, Debug)]
#[command(name = "summarise")]
#[command(about = "Summarise day records from a lendsim run", long_about = None)]
struct Args {
    /// Day records to read
    #[arg(default_value = "days.ndjson")]
    path: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let file = match File::open(&args.path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: cannot open {}: {e}", args.path.display());
            eprintln!("Run `cargo run --release` first to generate the day records.");
            return ExitCode::FAILURE;
        }
    };
    let records = match read_ndjson(BufReader::new(file)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pct = |rate: Option<f64>| {
        rate.map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "-".to_string())
    };

    let s = RunSummary::from_records(&records);
    println!("=== {} ({} days) ===", args.path.display(), s.days);
    println!("  Total approvals:   {}", s.total_approvals);
    println!("  Total defaults:    {}", s.total_defaults);
    println!("  Avg approval rate: {}", pct(s.avg_approval_rate));
    println!("  Avg default rate:  {}", pct(s.avg_default_rate));

    println!("\n{:>4} | {:>8} | {:>8}", "Day", "ApprR%", "DefR%");
    println!("{}", "-".repeat(26));
    for r in &records {
        println!("{:>4} | {:>8} | {:>8}", r.day, pct(r.approval_rate()), pct(r.default_rate()));
    }

    ExitCode::SUCCESS
}
