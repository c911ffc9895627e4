use anyhow::Context;
use clap::{Parser, Subcommand};
use claimsheet::cli;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "claimsheet")]
#[command(about = "Build protected, rule-driven claim spreadsheets from billing records.")]
#[command(long_about = "Claimsheet - Rule-driven claim spreadsheet builder

Takes billing records (CSV or JSON), places them into a worksheet (a fresh one
or a sheet of a template workbook), then applies per-column rules from a
JSON/YAML rule file: data validation, conditional highlights, number formats,
alignment and computed value formulas. The result is styled, protected with
selected columns left editable, and saved as .xlsx.

COMMANDS:
  build  - Build and save a sheet from records
  check  - Verify every configured column exists, without writing
  rules  - Print a rule file in normalized form

EXAMPLES:
  claimsheet build config.yaml --records claims.csv
  claimsheet build config.yaml -r claims.json -o out/claims.xlsx
  claimsheet check config.yaml --records claims.csv
  claimsheet rules rules.json")]
#[command(version)]
struct Cli {
    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Build a sheet from records and save it.

PIPELINE:
  1. Rename record fields through header_mapping, parse date_columns
  2. Load the template sheet and insert records (template formulas are kept),
     or build a fresh sheet including inserted_columns
  3. Apply column rules over rows 2..row_range
  4. Style header, band rows, size columns, hide columns past visible_columns
  5. Protect the sheet; unlocked_columns stay editable for the record rows
  6. Save without overwriting (an existing file is an error)

The protection password comes from --password, then CLAIMSHEET_PASSWORD,
then the config file.")]
    /// Build and save a sheet from records
    Build {
        /// Report config (YAML)
        config: PathBuf,

        /// Record file (.csv or .json)
        #[arg(short, long)]
        records: PathBuf,

        /// Output .xlsx path (defaults to output_dir/file_name from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sheet protection password
        #[arg(long, env = "CLAIMSHEET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Verify every configured column exists in the sheet header row
    Check {
        /// Report config (YAML)
        config: PathBuf,

        /// Record file supplying the columns when no template is configured
        #[arg(short, long)]
        records: Option<PathBuf>,
    },

    /// Print a rule file in normalized JSON
    Rules {
        /// Rule file (.json, .yaml, .yml)
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "claimsheet=debug"
    } else {
        "claimsheet=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            config,
            records,
            output,
            password,
        } => {
            let source = config.display().to_string();
            cli::build(config, records, output, password, cli.verbose)
                .with_context(|| format!("Failed to build sheet from {}", source))?;
        }

        Commands::Check { config, records } => {
            let source = config.display().to_string();
            cli::check(config, records).with_context(|| format!("Check failed for {}", source))?;
        }

        Commands::Rules { file } => cli::rules(file)?,
    }

    Ok(())
}
