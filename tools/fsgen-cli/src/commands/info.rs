//! Show statistics for a script.

use std::path::PathBuf;

use fsgen_report::summarize;
use fsgen_script_model::Funscript;

pub fn run(script: PathBuf) -> anyhow::Result<()> {
    let loaded = Funscript::load(&script)
        .map_err(|e| anyhow::anyhow!("Failed to load script {}: {e}", script.display()))?;

    let stats = summarize(&loaded.actions);

    println!("Script: {}", script.display());
    println!("  version:      {}", loaded.version);
    println!("  range:        0–{}", loaded.range);
    println!("  actions:      {}", stats.point_count);
    println!("  duration:     {} ms", stats.duration_ms);
    println!("  positions:    {}..{} (mean {:.1})", stats.min_pos, stats.max_pos, stats.mean_pos);
    println!("  longest gap:  {} ms", stats.longest_gap_ms);

    print!("  distribution:");
    for (bucket, count) in stats.distribution.iter().enumerate() {
        print!(" {}0s:{}", bucket, count);
    }
    println!();

    if !loaded.metadata.is_empty() {
        println!("  metadata:");
        for (key, value) in &loaded.metadata {
            println!("    {key}: {value}");
        }
    }

    Ok(())
}
