use crate::config::ReportConfig;
use crate::error::{SheetError, SheetResult};
use crate::report::{CheckReport, ReportBuilder};
use crate::rules::RuleSet;
use crate::table::RecordTable;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the build command
pub fn build(
    config_path: PathBuf,
    records: PathBuf,
    output: Option<PathBuf>,
    password: Option<String>,
    verbose: bool,
) -> SheetResult<PathBuf> {
    println!("{}", "📋 Claimsheet - Building sheet".bold().green());
    println!("   Config:  {}", config_path.display());
    println!("   Records: {}\n", records.display());

    let mut config = ReportConfig::load(&config_path)?;
    if let Some(password) = password {
        config.protection.password = password;
    }

    if verbose {
        println!("{}", "📖 Loading rules and records...".cyan());
    }
    let builder = ReportBuilder::from_config(config)?;
    let table = RecordTable::load(&records)?;

    if verbose {
        println!(
            "   {} rule columns, {} records, {} fields",
            builder.rules().len(),
            table.len(),
            table.fields().len()
        );
        match &builder.config().template {
            Some(template) => println!("   Template: {}", template.display()),
            None => println!("   No template, building a fresh sheet"),
        }
        println!();
    }

    let report = match builder.run(table, output.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            println!("{}", format!("❌ Build failed: {}", e).bold().red());
            return Err(e);
        }
    };

    println!("{}", "✅ Sheet saved".bold().green());
    println!("   File:    {}", report.path.display());
    println!("   Records: {}", report.records);
    if report.skipped_formula_cells > 0 {
        println!(
            "   {}",
            format!(
                "{} template formula cells kept",
                report.skipped_formula_cells
            )
            .yellow()
        );
    }
    println!();

    Ok(report.path)
}

/// Execute the check command
pub fn check(config_path: PathBuf, records: Option<PathBuf>) -> SheetResult<()> {
    println!("{}", "🔍 Claimsheet - Checking configuration".bold().green());
    println!("   Config: {}\n", config_path.display());

    let config = ReportConfig::load(&config_path)?;
    let builder = ReportBuilder::from_config(config)?;
    let table = records.as_deref().map(RecordTable::load).transpose()?;
    let grid = builder.header_grid(table)?;

    println!(
        "   Sheet '{}' has {} header columns, {} rule columns configured\n",
        grid.name(),
        grid.headers().len(),
        builder.rules().len()
    );

    let report = builder.check(&grid);
    print_check_report(&report);

    if report.is_ok() {
        println!("{}", "✅ Every configured column resolves".bold().green());
        Ok(())
    } else {
        Err(SheetError::Config(format!(
            "{} problem(s) found in configuration",
            report.problem_count()
        )))
    }
}

fn print_check_report(report: &CheckReport) {
    for column in &report.missing_rule_columns {
        println!(
            "   {} rule column '{}' not found in header row",
            "❌".red(),
            column.bright_yellow()
        );
    }
    for column in &report.missing_unlocked_columns {
        println!(
            "   {} unlocked column '{}' not found in header row",
            "❌".red(),
            column.bright_yellow()
        );
    }
    for (column, reason) in &report.invalid_templates {
        println!(
            "   {} value formula for '{}': {}",
            "❌".red(),
            column.bright_yellow(),
            reason
        );
    }
    if !report.is_ok() {
        println!();
    }
}

/// Execute the rules command: print a rule file in normalized JSON
pub fn rules(path: PathBuf) -> SheetResult<()> {
    let rules = RuleSet::load(&path)?;

    println!("{}", "📐 Claimsheet - Column rules".bold().green());
    println!("   File: {}", path.display());
    println!("   {} columns\n", rules.len());

    for (column, column_rules) in rules.iter() {
        println!(
            "   {} ({} rule kinds)",
            column.bright_blue().bold(),
            column_rules.kind_count()
        );
    }
    println!();
    println!("{}", rules.to_json_string()?);

    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
