use std::fmt::Write;

use super::strip_emphasis;
use crate::analysis::AnalysisReport;
use crate::sleep::SleepOutcome;

/// Human-readable plain-text report
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "MYFLOW WELLNESS REPORT")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out)?;

    writeln!(out, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    if let Some(range) = &report.date_range {
        writeln!(
            out,
            "Period: {} to {} ({} of {} days logged)",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d"),
            report.days_analyzed,
            range.num_days()
        )?;
    } else {
        writeln!(out, "Period: no days logged")?;
    }
    if let Some(ingest) = &report.ingest {
        writeln!(
            out,
            "Input notes: {} entries skipped, {} duplicate dates overwritten, {} unnamed factors dropped",
            ingest.skipped.len(),
            ingest.duplicates_overwritten,
            ingest.dropped_factors
        )?;
    }
    writeln!(out)?;

    writeln!(out, "PACING")?;
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "State: {}", report.pacing.state)?;
    writeln!(out, "{}", strip_emphasis(&report.pacing.message))?;
    if let Some(baseline) = &report.pacing.baseline {
        writeln!(
            out,
            "Latest load {:.1} vs threshold {:.1} (baseline mean {:.1} ± {:.1} over {} days)",
            report.pacing.latest_load,
            report.pacing.load_threshold,
            baseline.mean_load,
            baseline.std_load,
            baseline.window_days
        )?;
    }
    writeln!(out)?;

    writeln!(out, "SLEEP VULNERABILITY")?;
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(
        out,
        "Sleep penalty applied: {}",
        if report.vulnerability.is_vulnerable { "yes" } else { "no" }
    )?;
    writeln!(out, "{}", report.vulnerability.reason)?;
    writeln!(out)?;

    writeln!(out, "SLEEP AND SYMPTOMS")?;
    writeln!(out, "{}", "-".repeat(60))?;
    match &report.sleep {
        SleepOutcome::Analyzed(sleep) => {
            writeln!(out, "Average sleep: {:.1} hours", sleep.avg_sleep_hours)?;
            writeln!(
                out,
                "Sleep-tic correlation: {:.2} ({})",
                sleep.correlation_coefficient, sleep.correlation_strength
            )?;
            writeln!(out, "Personal optimal sleep: {:.1} hours", sleep.optimal_sleep_hours)?;
            if let (Some(good), Some(bad)) = (sleep.avg_tics_good_sleep, sleep.avg_tics_bad_sleep) {
                writeln!(out, "Average tics near optimal sleep: {:.1}", good)?;
                writeln!(out, "Average tics far from optimal sleep: {:.1}", bad)?;
            }
            writeln!(out)?;
            writeln!(out, "{}", sleep.insight_message)?;
        }
        SleepOutcome::InsufficientData { message } => {
            writeln!(out, "{}", message)?;
        }
    }
    writeln!(out)?;

    let factors = &report.protective_factors;
    writeln!(out, "PROTECTIVE FACTORS")?;
    writeln!(out, "{}", "-".repeat(60))?;
    if !factors.ranked_factors.is_empty() {
        writeln!(
            out,
            "{:<4} {:<24} {:>10} {:>6} {:>10} {:>10}",
            "Rank", "Factor", "Reduction", "Used", "Tics with", "without"
        )?;
        writeln!(out, "{:-<70}", "")?;
        for (i, factor) in factors.ranked_factors.iter().enumerate() {
            writeln!(
                out,
                "{:<4} {:<24} {:>9.0}% {:>6} {:>10.1} {:>10.1}",
                i + 1,
                factor.name,
                factor.tic_reduction_pct,
                factor.times_used,
                factor.avg_tics_with,
                factor.avg_tics_without
            )?;
        }
        writeln!(out)?;
    }

    if !factors.top_best_days.is_empty() {
        writeln!(out, "Best days (lowest load):")?;
        for day in &factors.top_best_days {
            let what_helped = if day.protective_factors.is_empty() {
                "Natural good day!".to_string()
            } else {
                day.protective_factors.join(", ")
            };
            writeln!(
                out,
                "  #{} {}  load {:.1}, {} tics  ({})",
                day.rank,
                day.date.format("%Y-%m-%d"),
                day.tnl,
                day.tic_count,
                what_helped
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", strip_emphasis(&factors.insight_message))?;
    Ok(())
}
