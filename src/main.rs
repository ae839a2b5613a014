use ar_intel::config::cli::OutputFormat;
use ar_intel::config::toml_config::SourceConfig;
use ar_intel::core::export::{render_aging_totals, render_priority_queue, TableFormat};
use ar_intel::core::tools::{ToolCall, ToolName, ToolOutput, ToolResult};
use ar_intel::domain::ports::InvoiceSource;
use ar_intel::utils::error::{ArError, ErrorSeverity};
use ar_intel::utils::{logger, validation::Validate};
use ar_intel::{AppConfig, ArEngine, CliConfig, JsonFileSource, SuiteQlSource};
use chrono::NaiveDate;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if cli.list_tools {
        for tool in ToolName::ALL {
            println!("{:<28} {}", tool.as_str(), tool.description());
        }
        return;
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ ar-intel failed: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // A rejected call writes no result, so even Low exits non-zero.
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> Result<(), ArError> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    };
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated");

    let call = cli.tool_call()?;
    let today = chrono::Local::now().date_naive();

    let source_config = match &cli.input {
        Some(path) => SourceConfig::File { path: path.clone() },
        None => config.source.clone().ok_or_else(|| {
            ArError::configuration(
                "source",
                "no [source] table in the configuration and no --input file given",
            )
        })?,
    };

    let rendered = match source_config {
        SourceConfig::File { path } => {
            run_tool(JsonFileSource::new(path), config, &call, today, cli.format).await?
        }
        SourceConfig::Suiteql(suiteql) => {
            run_tool(SuiteQlSource::new(suiteql)?, config, &call, today, cli.format).await?
        }
    };

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            tracing::info!("📁 Output saved to: {}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn run_tool<S: InvoiceSource>(
    source: S,
    config: AppConfig,
    call: &ToolCall,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<String, ArError> {
    let engine = ArEngine::new(source, config.engine)?;

    let table = match format {
        OutputFormat::Json => {
            let output = engine.dispatch(call, today).await?;
            return Ok(serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Csv => TableFormat::Csv,
        OutputFormat::Tsv => TableFormat::Tsv,
    };

    let (as_of, result) = engine.run_call(call, today).await?;

    // Tables cover the row-shaped results; risk profiles stay JSON.
    match &result {
        ToolResult::Priority(report) => render_priority_queue(&report.queue, table),
        ToolResult::Brief(brief) => render_priority_queue(&brief.priority_queue, table),
        ToolResult::Aging(report) => render_aging_totals(&report.summary, table),
        ToolResult::Risk(_) => {
            tracing::warn!("⚠️ {} has no table form, writing JSON", call.tool);
            let output = ToolOutput::new(call, as_of, &result)?;
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}
