//! Natural-language processing report.
//!
//! The pipeline statistics are rendered into a prompt, sent to a
//! [`ReportGenerator`] and the answer is written next to the other outputs.

pub mod lmstudio;

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::core::errors::{OrthoparkError, Result};
use crate::core::timer::{format_duration, Timer};
use crate::pipeline::PipelineStats;

pub use lmstudio::LmStudioClient;

/// First line of every report file.
pub const REPORT_HEADER: &str = "--- Processing report ---";

/// Produces report text from a prompt
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Generate report text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Render the statistics of a run into a prompt.
pub fn build_report_prompt(stats: &PipelineStats) -> String {
    let resolution = stats
        .odm_resolution
        .as_ref()
        .map(|r| format!("{r} cm/pixel"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut lines = vec![
        "Write a short report on a drone imagery processing run using the data below.".to_string(),
        String::new(),
        format!("- Images processed: {}", stats.image_count),
        format!("- Orthophoto resolution: {resolution}"),
        format!("- Orthophoto created: {}", yes_no(stats.ortho_found)),
        format!("- DSM created: {}", yes_no(stats.dsm_found)),
        format!("- Parking analysis run: {}", yes_no(stats.analysis_run)),
    ];
    if let Some((total, occupied, vacant)) = stats.occupancy() {
        lines.push(format!(
            "- {total} slots analysed: {occupied} occupied, {vacant} vacant"
        ));
    }
    lines.push(format!(
        "- Total processing time: {}",
        format_duration(stats.total_time)
    ));
    lines.push(String::new());
    lines.push("Keep the report to 3-4 sentences.".to_string());
    lines.join("\n")
}

/// Report file contents for `text` generated at `generated_at`.
pub fn format_report(text: &str, generated_at: &DateTime<Local>) -> String {
    format!(
        "{REPORT_HEADER}\nGenerated at: {}\n\n{}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        text
    )
}

/// Write the report file, creating its parent directory.
pub fn write_report(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| OrthoparkError::io(format!("Failed to create {}", parent.display()), e))?;
    }
    fs::write(path, format_report(text, &Local::now()))
        .map_err(|e| OrthoparkError::io(format!("Failed to write report {}", path.display()), e))?;
    info!("Report saved to: {}", path.display());
    Ok(())
}

/// Generate and save the report; failures are logged and yield `None`.
pub async fn run_report_stage(
    generator: &dyn ReportGenerator,
    stats: &PipelineStats,
    report_path: &Path,
) -> Option<String> {
    info!("--- Stage: report generation ---");
    let _timer = Timer::start("Report generation");

    let prompt = build_report_prompt(stats);
    let text = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to generate report: {}", e);
            return None;
        }
    };

    if let Err(e) = write_report(report_path, &text) {
        error!("Failed to save report: {}", e);
    }
    Some(text)
}
