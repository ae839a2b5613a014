use crate::core::tools::{ToolCall, ToolName};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Tsv,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "ar-intel")]
#[command(about = "Accounts-receivable aging, risk and collections priority tools")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Read invoice rows from a JSON file instead of the configured source
    #[arg(short, long)]
    pub input: Option<String>,

    /// Tool to run
    #[arg(short, long, default_value = "daily_ar_brief")]
    pub tool: ToolName,

    /// Full tool call as JSON; overrides --tool, --as-of, --top-n and --dry-run
    #[arg(long)]
    pub call: Option<String>,

    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,

    /// Override the configured result size
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Leave out customers owing less than this
    #[arg(long)]
    pub min_open_balance: Option<f64>,

    /// Passed through to the tool output for downstream collaborators
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// List the available tools and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

impl CliConfig {
    pub fn tool_call(&self) -> crate::utils::error::Result<ToolCall> {
        if let Some(payload) = &self.call {
            return ToolCall::from_json(payload);
        }
        Ok(ToolCall {
            tool: self.tool,
            as_of: self.as_of,
            top_n: self.top_n,
            min_open_balance: self.min_open_balance,
            dry_run: self.dry_run,
        })
    }
}
