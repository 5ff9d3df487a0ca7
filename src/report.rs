use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::types::Day;

/// Raw counts emitted after each settled day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub day: Day,
    pub applied_count: u32,
    /// Applicants approved by today's settlement.
    pub approved_count: u32,
    /// Agents in default at settlement time.
    pub default_count: u32,
    /// Agents holding an approval after today's settlement.
    pub total_approved_to_date: u32,
    /// Agents that have defaulted by the end of today.
    pub total_defaulted_to_date: u32,
}

impl DayRecord {
    /// Approved / applied. `None` when nobody applied.
    pub fn approval_rate(&self) -> Option<f64> {
        ratio(self.approved_count, self.applied_count)
    }

    /// Defaults / currently approved. `None` when nobody holds an approval.
    pub fn default_rate(&self) -> Option<f64> {
        ratio(self.default_count, self.total_approved_to_date)
    }
}

fn ratio(num: u32, den: u32) -> Option<f64> {
    if den == 0 { None } else { Some(num as f64 / den as f64) }
}

fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Headline metrics over one run.
///
/// The averages ignore days whose rate is undefined instead of counting them
/// as 0%. A run with quiet days therefore reports a higher average than a
/// zero-filled mean over every day would.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub days: usize,
    pub total_approvals: u64,
    /// Sum of the daily default counts (a defaulted agent counts every day).
    pub total_defaults: u64,
    /// Mean of the daily approval rates, over days where one is defined.
    pub avg_approval_rate: Option<f64>,
    /// Mean of the daily default rates, over days where one is defined.
    pub avg_default_rate: Option<f64>,
}

impl RunSummary {
    pub fn from_records(records: &[DayRecord]) -> Self {
        RunSummary {
            days: records.len(),
            total_approvals: records.iter().map(|r| r.approved_count as u64).sum(),
            total_defaults: records.iter().map(|r| r.default_count as u64).sum(),
            avg_approval_rate: mean_defined(records.iter().map(DayRecord::approval_rate)),
            avg_default_rate: mean_defined(records.iter().map(DayRecord::default_rate)),
        }
    }
}

/// Distribution statistics for a continuous metric across N runs.
#[derive(Debug, Clone, PartialEq)]
pub struct DistStats {
    pub n: usize,
    pub min: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Per-day cross-run distribution of the key counts and rates.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDist {
    pub day: Day,
    pub approved: DistStats,
    pub defaults: DistStats,
    /// Only runs where the rate is defined contribute.
    pub approval_rate: Option<DistStats>,
    pub default_rate: Option<DistStats>,
}

/// Linear interpolation between closest ranks of an ascending slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = p * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
}

fn percentile_stats(values: &mut [f64]) -> Option<DistStats> {
    values.sort_by(f64::total_cmp);
    let (&min, &max) = (values.first()?, values.last()?);
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    let std_dev = if n > 1 { (sum_sq / (n - 1) as f64).sqrt() } else { 0.0 };

    Some(DistStats {
        n,
        min,
        p5: quantile(values, 0.05),
        p50: quantile(values, 0.50),
        p95: quantile(values, 0.95),
        max,
        mean,
        std_dev,
    })
}

/// Per-day distributions across repeated runs.
///
/// Days settled in fewer than 2 runs are skipped. Sorted by day.
pub fn analyse_distributions(all_runs: &[Vec<DayRecord>]) -> Vec<DayDist> {
    let all_days: BTreeSet<Day> =
        all_runs.iter().flat_map(|run| run.iter().map(|r| r.day)).collect();

    let mut result = Vec::new();
    for day in all_days {
        let records: Vec<&DayRecord> = all_runs
            .iter()
            .filter_map(|run| run.iter().find(|r| r.day == day))
            .collect();
        if records.len() < 2 {
            continue;
        }

        let mut approved: Vec<f64> = records.iter().map(|r| r.approved_count as f64).collect();
        let mut defaults: Vec<f64> = records.iter().map(|r| r.default_count as f64).collect();
        let mut approval_rate: Vec<f64> = records.iter().filter_map(|r| r.approval_rate()).collect();
        let mut default_rate: Vec<f64> = records.iter().filter_map(|r| r.default_rate()).collect();

        let (Some(approved), Some(defaults)) =
            (percentile_stats(&mut approved), percentile_stats(&mut defaults))
        else {
            continue;
        };
        result.push(DayDist {
            day,
            approved,
            defaults,
            approval_rate: percentile_stats(&mut approval_rate),
            default_rate: percentile_stats(&mut default_rate),
        });
    }
    result
}

/// One JSON object per line.
pub fn write_ndjson(records: &[DayRecord], mut writer: impl Write) -> Result<(), SimError> {
    for r in records {
        serde_json::to_writer(&mut writer, r)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_ndjson(reader: impl BufRead) -> Result<Vec<DayRecord>, SimError> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Per-run, per-day rows for offline analysis. Run `i` is labelled with seed
/// `start_seed + i`, wrapping past `u64::MAX`. Undefined rates are left empty.
pub fn write_runs_csv(
    all_runs: &[Vec<DayRecord>],
    start_seed: u64,
    mut writer: impl Write,
) -> Result<(), SimError> {
    writeln!(
        writer,
        "seed,day,applied,approved,defaults,total_approved,total_defaulted,approval_rate,default_rate"
    )?;
    let fmt_rate = |r: Option<f64>| r.map(|v| format!("{v:.6}")).unwrap_or_default();
    for (i, run) in all_runs.iter().enumerate() {
        let seed = start_seed.wrapping_add(i as u64);
        for r in run {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{}",
                seed,
                r.day,
                r.applied_count,
                r.approved_count,
                r.default_count,
                r.total_approved_to_date,
                r.total_defaulted_to_date,
                fmt_rate(r.approval_rate()),
                fmt_rate(r.default_rate()),
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
