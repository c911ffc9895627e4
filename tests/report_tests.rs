//! End-to-end report builds from the sample config in test-data/

use calamine::{open_workbook, Data, Reader, Xlsx};
use claimsheet::config::ReportConfig;
use claimsheet::core::header::find_column;
use claimsheet::core::GridFormatter;
use claimsheet::error::SheetError;
use claimsheet::excel::ExcelExporter;
use claimsheet::report::ReportBuilder;
use claimsheet::rules::RuleSet;
use claimsheet::table::RecordTable;
use claimsheet::types::{CellValue, Grid, Rgb, RowRange};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SHEET_HEADERS: [&str; 21] = [
    "CONTROL/ACCOUNT #",
    "LAST NAME",
    "FIRST NAME",
    "MIDDLE",
    "DATE OF BIRTH",
    "MEDICAID ID",
    "COVERAGE EXPIRATION DATE",
    "DATE OF SERVICE",
    "CPT/HCPCS/DENTAL CODE",
    "SERVICE CODE MODIFIER",
    "BILLED AMOUNT",
    "GRAND TOTAL",
    "AMOUNT DUE",
    "LOCAL SHARE",
    "FEDERAL SHARE",
    "SPEND DOWN",
    "TPL AMOUNT",
    "TPL",
    "CONTRACTUAL ADJUSTMENT",
    "ADJUSTMENT REASON",
    "NOTE",
];

fn test_data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data").join(name)
}

/// Copy the sample files into a scratch directory so outputs land there
fn scratch() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    for name in ["config.yaml", "rules.json", "records.csv"] {
        fs::copy(test_data(name), dir.path().join(name)).unwrap();
    }
    let config = dir.path().join("config.yaml");
    (dir, config)
}

fn builder(config: &Path) -> ReportBuilder {
    ReportBuilder::from_config(ReportConfig::load(config).unwrap()).unwrap()
}

fn records(dir: &Path) -> RecordTable {
    RecordTable::load(&dir.join("records.csv")).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY BUILD
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_fresh_sheet_layout() {
    let (dir, config) = scratch();
    let (grid, summary) = builder(&config).build(records(dir.path())).unwrap();

    assert_eq!(summary.rows, 3);
    let headers: Vec<String> = grid.headers().into_iter().map(|(_, h)| h).collect();
    assert_eq!(headers, SHEET_HEADERS.to_vec());

    // rename + date parsing
    assert_eq!(grid.value(2, 1), Some(&CellValue::from("00012345")));
    assert!(matches!(grid.value(2, 5), Some(CellValue::Date(_))));
    assert!(matches!(grid.value(2, 8), Some(CellValue::DateTime(_))));
}

#[test]
fn test_rules_cover_configured_range() {
    let (dir, config) = scratch();
    let (grid, _) = builder(&config).build(records(dir.path())).unwrap();

    let medicaid = find_column(&grid, "MEDICAID ID").unwrap();
    assert_eq!(medicaid, 6);
    for row in [2, 4, 500, 1000] {
        assert_eq!(
            grid.cell(row, medicaid).unwrap().style.number_format.as_deref(),
            Some("00-000000-00")
        );
    }
    assert!(grid.cell(1001, medicaid).is_none());

    assert_eq!(
        grid.value(2, 12),
        Some(&CellValue::Formula("=SUM(M2,P2,Q2,S2)".to_string()))
    );
    assert_eq!(
        grid.value(1000, 14),
        Some(&CellValue::Formula("=FLOOR($M1000*0.17,0.01)".to_string()))
    );

    let rules = RuleSet::load(&dir.path().join("rules.json")).unwrap();
    let expected_validations = rules
        .iter()
        .filter(|(_, r)| r.data_validation.is_some())
        .count();
    assert_eq!(grid.validations().len(), expected_validations);
    assert!(grid
        .validations()
        .iter()
        .all(|v| v.range.first_row == 2 && v.range.last_row == 1000));
    assert_eq!(grid.conditional_formats().len(), 4);
}

#[test]
fn test_styling_and_protection() {
    let (dir, config) = scratch();
    let (grid, _) = builder(&config).build(records(dir.path())).unwrap();

    let header = &grid.cell(1, 1).unwrap().style;
    assert_eq!(header.fill, Some(Rgb(0x4472C4)));
    assert_eq!(header.font.as_ref().map(|f| f.size), Some(8.0));
    assert_eq!(grid.row_height(1), Some(22.9));

    assert_eq!(grid.cell(2, 3).unwrap().style.fill, Some(Rgb(0xD9E1F2)));
    assert_eq!(grid.cell(3, 3).unwrap().style.fill, Some(Rgb(0xB4C6E7)));
    assert!(!grid.is_column_hidden(21));
    assert!(grid.is_column_hidden(23));

    assert!(grid.is_protected());
    let amount_due = find_column(&grid, "AMOUNT DUE").unwrap();
    assert!(grid.is_locked(1, amount_due));
    for row in 2..=4 {
        assert!(!grid.is_locked(row, amount_due));
        assert!(grid.is_locked(row, 11));
    }
    assert!(grid.is_locked(5, amount_due));
}

#[test]
fn test_missing_mapped_date_column_aborts() {
    let (dir, config) = scratch();
    let mut config = ReportConfig::load(&config).unwrap();
    config.date_columns.push("DATE OF DEATH".to_string());
    let rules = RuleSet::load(&config.rules).unwrap();

    let err = ReportBuilder::new(config, rules)
        .build(records(dir.path()))
        .unwrap_err();
    assert!(matches!(err, SheetError::ColumnNotFound { ref column } if column == "DATE OF DEATH"));
}

// ═══════════════════════════════════════════════════════════════════════════
// SAVED WORKBOOK
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_saves_to_default_location() {
    let (dir, config) = scratch();
    let report = builder(&config).run(records(dir.path()), None).unwrap();

    assert_eq!(
        report.path,
        dir.path().join("generated_sheets").join("CTS_Insert_Example.xlsx")
    );
    assert_eq!(report.records, 3);

    let mut workbook: Xlsx<_> = open_workbook(&report.path).unwrap();
    let range = workbook.worksheet_range("MAP or COFA").unwrap();
    assert_eq!(range.get_value((0, 5)), Some(&Data::String("MEDICAID ID".to_string())));
    assert_eq!(range.get_value((3, 1)), Some(&Data::String("Garcia".to_string())));

    let formulas = workbook.worksheet_formula("MAP or COFA").unwrap();
    assert_eq!(
        formulas.get_value((1, 11)).map(String::as_str),
        Some("SUM(M2,P2,Q2,S2)")
    );
}

#[test]
fn test_second_run_does_not_clobber() {
    let (dir, config) = scratch();
    let builder = builder(&config);
    let first = builder.run(records(dir.path()), None).unwrap();
    let before = fs::read(&first.path).unwrap();

    let err = builder.run(records(dir.path()), None).unwrap_err();

    assert!(matches!(err, SheetError::DestinationExists(_)));
    assert_eq!(fs::read(&first.path).unwrap(), before);
}

// ═══════════════════════════════════════════════════════════════════════════
// TEMPLATE BUILD
// ═══════════════════════════════════════════════════════════════════════════

/// A template sheet: every header, totals formulas prefilled for 10 rows
fn write_template(dir: &Path) -> PathBuf {
    let mut template = Grid::with_headers("MAP or COFA", &SHEET_HEADERS).unwrap();
    let totals = RuleSet::from_json_str(
        r#"{"GRAND TOTAL": {"value_formula": "=SUM(M{row},P{row},Q{row},S{row})"}}"#,
    )
    .unwrap();
    GridFormatter::new(&totals, RowRange::new(10).unwrap())
        .apply(&mut template)
        .unwrap();

    let path = dir.join("CTS_Example_Template.xlsx");
    ExcelExporter::new(&template).save(&path).unwrap();
    path
}

#[test]
fn test_template_build_inserts_records_and_keeps_formulas() {
    let (dir, config_path) = scratch();
    let template = write_template(dir.path());

    let mut config = ReportConfig::load(&config_path).unwrap();
    config.template = Some(template);
    config.row_range = 10;
    let rules = RuleSet::load(&config.rules).unwrap();
    let builder = ReportBuilder::new(config, rules);

    let mut table = records(dir.path());
    // a user-entry column present in the template receives values too
    table
        .insert_columns(&[("GRAND TOTAL".to_string(), 11)])
        .unwrap();

    let (grid, summary) = builder.build(table).unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.skipped_formula_cells, 3);
    assert_eq!(grid.value(3, 2), Some(&CellValue::from("Jones")));
    assert_eq!(
        grid.value(3, 12),
        Some(&CellValue::Formula("=SUM(M3,P3,Q3,S3)".to_string()))
    );
    assert_eq!(
        grid.cell(2, 6).unwrap().style.number_format.as_deref(),
        Some("00-000000-00")
    );
}

#[test]
fn test_check_against_template() {
    let (dir, config_path) = scratch();
    let template = write_template(dir.path());

    let mut config = ReportConfig::load(&config_path).unwrap();
    config.template = Some(template);
    config.protection.unlocked_columns.push("COMMENTS".to_string());
    let rules = RuleSet::load(&config.rules).unwrap();
    let builder = ReportBuilder::new(config, rules);

    let grid = builder.header_grid(None).unwrap();
    let report = builder.check(&grid);

    assert!(report.missing_rule_columns.is_empty());
    assert_eq!(report.missing_unlocked_columns, vec!["COMMENTS"]);
}
