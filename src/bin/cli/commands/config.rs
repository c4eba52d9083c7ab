//! `print-default-config`, `init-config` and `validate-config`.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use orthopark::OrthoparkConfig;

use crate::cli::args::{InitConfigArgs, ValidateConfigArgs};
use crate::cli::output::{display_config_summary, summary_table, SummaryRow};

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!(
        "{}",
        "# odm.options keys are ODM flags without the leading '--'".dimmed()
    );
    let yaml_output = serde_yaml::to_string(&OrthoparkConfig::default())?;
    println!("{}", yaml_output);
    Ok(())
}

/// Settings a first run usually needs to touch.
#[derive(Tabled)]
struct SettingRow {
    setting: &'static str,
    default: &'static str,
}

fn first_run_settings() -> Vec<SettingRow> {
    [
        ("paths.input_image_dir", "data/input_images"),
        ("odm.run_method", "docker"),
        ("analysis.enabled", "false"),
        ("report.enabled", "false"),
    ]
    .into_iter()
    .map(|(setting, default)| SettingRow { setting, default })
    .collect()
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {} (pass --force to overwrite)",
            args.output.display()
        ));
    }

    let yaml_content = serde_yaml::to_string(&OrthoparkConfig::default())?;
    tokio::fs::write(&args.output, yaml_content).await?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );

    let mut table = Table::new(first_run_settings());
    table.with(TableStyle::rounded());
    println!("{}", table);
    println!(
        "Then: {}",
        format!("orthopark run --config {}", args.output.display()).cyan()
    );

    Ok(())
}

/// Validate an orthopark configuration file
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    let config = match OrthoparkConfig::from_yaml_file(&args.config)
        .and_then(|config| config.validate().map(|()| config))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
        }
    };

    println!(
        "{} {}",
        "✅ Configuration file is valid:".bright_green().bold(),
        args.config.display().to_string().cyan()
    );
    display_config_summary(&config);

    if args.verbose {
        let rows = config
            .odm
            .options
            .iter()
            .map(|(name, value)| SummaryRow::new(name, value))
            .collect();
        println!("{}", summary_table(rows));
    }

    Ok(())
}
