//! Compare a generated script against a reference.

use std::path::PathBuf;

use fsgen_report::{build_report, ScriptReport};
use fsgen_script_model::Funscript;

pub fn run(script: PathBuf, reference: PathBuf) -> anyhow::Result<()> {
    let generated = Funscript::load(&script)
        .map_err(|e| anyhow::anyhow!("Failed to load script {}: {e}", script.display()))?;

    let report = build_report(&generated, Some(&reference));

    let summary = report.summary();
    println!("Script: {}", script.display());
    println!("  {} actions over {} ms", summary.point_count, summary.duration_ms);

    match &report {
        ScriptReport::WithReference { deviation, .. } => {
            println!("Against reference: {}", reference.display());
            println!("  samples:        {}", deviation.sample_count);
            println!("  mean abs dev:   {:.2}", deviation.mean_abs_dev);
            println!("  max abs dev:    {:.2}", deviation.max_abs_dev);
            println!("  correlation:    {:.3}", deviation.correlation);
        }
        ScriptReport::SummaryOnly { .. } => {
            println!("Reference unavailable or not comparable; summary only.");
        }
    }

    Ok(())
}
