//! Command output formatting.

use std::io;

use fee_oracle_estimator::{CalibrationReport, FeeCurve};

const GWEI: f64 = 1e9;

pub(crate) fn write_json(
    out: &mut impl io::Write,
    value: &impl serde::Serialize,
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn write_curve(out: &mut impl io::Write, curve: &FeeCurve) -> io::Result<()> {
    writeln!(
        out,
        "{:>11}  {:>20}  {:>29}",
        "time factor", "max fee, gwei", "max priority fee, gwei"
    )?;
    for suggestion in curve {
        writeln!(
            out,
            "{:>11}  {:>20.3}  {:>29.3}",
            suggestion.time_factor,
            suggestion.max_fee_per_gas / GWEI,
            suggestion.max_priority_fee_per_gas / GWEI
        )?;
    }
    Ok(())
}

pub(crate) fn write_report(out: &mut impl io::Write, report: &CalibrationReport) -> io::Result<()> {
    writeln!(
        out,
        "Inclusion rates for blocks {}..={}",
        report.first_block, report.last_block
    )?;
    writeln!(
        out,
        "{:>11}  {:>8}  {:>8}  {:>7}",
        "time factor", "attempts", "included", "rate"
    )?;
    for (time_factor, stats) in &report.time_factors {
        let rate = match stats.rate() {
            Some(rate) => format!("{:.1}%", rate * 100.0),
            None => "n/a".to_owned(),
        };
        writeln!(
            out,
            "{time_factor:>11}  {:>8}  {:>8}  {rate:>7}",
            stats.attempts, stats.included
        )?;
    }
    Ok(())
}
