//! Console output for CLI commands.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use orthopark::core::config::OrthoparkConfig;
use orthopark::core::timer::format_duration;
use orthopark::PipelineStats;

/// Row type for two-column summary tables.
#[derive(Tabled)]
pub struct SummaryRow {
    pub item: String,
    pub value: String,
}

impl SummaryRow {
    pub fn new(item: &str, value: impl ToString) -> Self {
        Self {
            item: item.to_string(),
            value: value.to_string(),
        }
    }
}

/// Render rows as a rounded table.
pub fn summary_table(rows: Vec<SummaryRow>) -> String {
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    table.to_string()
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".yellow().to_string()
    }
}

/// Rows summarising a finished run.
pub fn run_summary_rows(stats: &PipelineStats) -> Vec<SummaryRow> {
    let mut rows = vec![
        SummaryRow::new("Images processed", stats.image_count),
        SummaryRow::new(
            "Orthophoto resolution",
            stats
                .odm_resolution
                .as_ref()
                .map(|r| format!("{r} cm/pixel"))
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        SummaryRow::new("Orthophoto", yes_no(stats.ortho_found)),
        SummaryRow::new("Elevation model", yes_no(stats.dsm_found)),
        SummaryRow::new("Parking analysis", yes_no(stats.analysis_run)),
    ];
    if let Some((total, occupied, vacant)) = stats.occupancy() {
        rows.push(SummaryRow::new(
            "Slots",
            format!("{total} analysed: {occupied} occupied, {vacant} vacant"),
        ));
    }
    rows.push(SummaryRow::new(
        "Total time",
        format_duration(stats.total_time),
    ));
    rows
}

/// Print the summary of a finished run.
pub fn display_run_summary(stats: &PipelineStats) {
    println!();
    println!("{}", "✅ Pipeline finished".bright_green().bold());
    println!("{}", summary_table(run_summary_rows(stats)));
}

/// Print the main settings of a configuration.
pub fn display_config_summary(config: &OrthoparkConfig) {
    println!("{}", "📋 Configuration Summary".bright_blue().bold());

    let rows = vec![
        SummaryRow::new("Input images", config.paths.input_image_dir.display()),
        SummaryRow::new("Output directory", config.paths.output_dir.display()),
        SummaryRow::new("ODM run method", config.odm.run_method),
        SummaryRow::new("ODM image", &config.odm.docker_image),
        SummaryRow::new("ODM project", &config.odm.project_name),
        SummaryRow::new("ODM options", config.odm.options.len()),
        SummaryRow::new("Parking analysis", config.analysis.enabled),
        SummaryRow::new("LLM report", config.report.enabled),
        SummaryRow::new("Log level", &config.logging.level),
    ];
    println!("{}", summary_table(rows));
    println!();
}
