use anyhow::Result;
use chrono::{Days, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use ieepa_claims::{
    read_source_file, ClaimsError, ClaimsPipeline, FixedClock, SourceKind, Value,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

struct Reports {
    entry_summary: PathBuf,
    liquidation_status: PathBuf,
    importer_statement: PathBuf,
}

fn write_reports(dir: &Path) -> Reports {
    let d200 = today() - Days::new(200);
    let d120 = today() - Days::new(120);
    let d10 = today() - Days::new(10);

    Reports {
        entry_summary: write(
            dir,
            "entry_summary.csv",
            "entry_number,hts_code,duties_paid,entered_value\n\
             00000000001,9903.01.1234,1000,25000\n\
             00000000002,9903.01.1234,2500.5,25000\n\
             00000000003,8501.10.0000,900,25000\n\
             00000000004,9903.88.0015,4000,25000\n\
             5,9903.88.0015,,25000\n\
             00000000006,9903.88.0015,750,25000\n",
        ),
        liquidation_status: write(
            dir,
            "liquidation_status.csv",
            &format!(
                "entry_number,liquidation_date,liquidation_status,protest_status\n\
                 1,{d200},Liquidated,None\n\
                 2,{d120},liquidated,\n\
                 3,{d10},Liquidated,None\n\
                 4,{d10},Liquidated,Filed\n\
                 5,{d10},LIQUIDATED,NA\n"
            ),
        ),
        importer_statement: write(
            dir,
            "importer_statement.csv",
            "entry_number,importer_name,port_of_entry,entry_date\n\
             1,Importer 1,LAX,2025-01-10\n\
             3,Importer 3,SEA,2025-02-11\n",
        ),
    }
}

#[test]
fn test_end_to_end_scenarios() -> Result<()> {
    let dir = tempdir()?;
    let reports = write_reports(dir.path());

    let mut pipeline = ClaimsPipeline::with_clock(FixedClock(today()));
    let table = pipeline.process_files(
        &reports.entry_summary,
        &reports.liquidation_status,
        Some(reports.importer_statement.as_path()),
    )?;

    assert_eq!(table.len(), 6);

    // Eligible, liquidated 200 days ago: overdue by 20 days
    let r1 = table.find("00000000001").unwrap();
    assert_eq!(table.get(r1, "calculated_refund_due"), Some(Value::Number(1000.0)));
    assert_eq!(table.get(r1, "days_remaining"), Some(Value::Integer(-20)));
    assert_eq!(table.get(r1, "port_of_entry"), Some(Value::Text("LAX".to_string())));

    // Lower-case status, blank protest: eligible and urgent (60 days)
    let r2 = table.find("00000000002").unwrap();
    assert_eq!(table.get(r2, "calculated_refund_due"), Some(Value::Number(2500.5)));
    assert_eq!(table.get(r2, "days_remaining"), Some(Value::Integer(60)));

    // Non-IEEPA code
    let r3 = table.find("00000000003").unwrap();
    assert_eq!(table.get(r3, "calculated_refund_due"), Some(Value::Number(0.0)));

    // Protest filed
    let r4 = table.find("00000000004").unwrap();
    assert_eq!(table.get(r4, "calculated_refund_due"), Some(Value::Number(0.0)));

    // Missing duties on an eligible entry: refund is zero, row still present
    let r5 = table.find("00000000005").unwrap();
    assert_eq!(table.get(r5, "duties_paid"), Some(Value::Null));
    assert_eq!(table.get(r5, "calculated_refund_due"), Some(Value::Number(0.0)));

    // No liquidation or importer match
    let r6 = table.find("00000000006").unwrap();
    assert_eq!(table.get(r6, "liquidation_date"), Some(Value::Null));
    assert_eq!(table.get(r6, "protest_deadline"), Some(Value::Null));
    assert_eq!(table.get(r6, "days_remaining"), Some(Value::Null));
    assert_eq!(table.get(r6, "importer_name"), Some(Value::Null));
    assert_eq!(table.get(r6, "calculated_refund_due"), Some(Value::Number(0.0)));

    let summary = pipeline.summary()?;
    assert_eq!(summary.total_entries, 6);
    assert_eq!(summary.refund_eligible_count, 2);
    assert_eq!(summary.overdue_deadlines, 1);
    // Entries 3, 4 and 5 still have 170 days left
    assert_eq!(summary.urgent_deadlines, 1);
    assert_eq!(summary.total_refund_value, 3500.5);
    assert_eq!(summary.average_refund, 1750.25);

    Ok(())
}

#[test]
fn test_export_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let reports = write_reports(dir.path());
    let output = dir.path().join("results.csv");

    let mut pipeline = ClaimsPipeline::with_clock(FixedClock(today()));
    pipeline.process_files(&reports.entry_summary, &reports.liquidation_status, None)?;
    pipeline.export(&output)?;

    let text = fs::read_to_string(&output)?;
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("entry_number,hts_code,duties_paid,entered_value,liquidation_date,liquidation_status,protest_status,calculated_refund_due,protest_deadline,days_remaining")
    );
    assert_eq!(lines.count(), 6);

    // The export reads back as an entry summary with the same keys
    let reread = read_source_file(SourceKind::EntrySummary, &output)?;
    assert_eq!(reread.len(), 6);
    assert_eq!(reread.key(4), "00000000005");

    Ok(())
}

#[test]
fn test_export_without_process_fails() {
    let dir = tempdir().unwrap();
    let pipeline = ClaimsPipeline::new();

    let err = pipeline.export(&dir.path().join("out.csv")).unwrap_err();
    assert!(matches!(err, ClaimsError::Unprocessed));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn test_bad_liquidation_date_aborts_batch() {
    let dir = tempdir().unwrap();
    let reports = write_reports(dir.path());
    let bad = write(
        dir.path(),
        "bad_liquidation.csv",
        "entry_number,liquidation_date,liquidation_status,protest_status\n\
         1,2025-01-01,Liquidated,None\n\
         2,31/31/2025,Liquidated,None\n",
    );

    let mut pipeline = ClaimsPipeline::with_clock(FixedClock(today()));
    let err = pipeline
        .process_files(&reports.entry_summary, &bad, None)
        .unwrap_err();

    assert!(matches!(err, ClaimsError::SourceRead { .. }));
    assert!(pipeline.result().is_none());
}

#[test]
fn test_missing_column_is_schema_error() {
    let dir = tempdir().unwrap();
    let reports = write_reports(dir.path());
    let no_protest = write(
        dir.path(),
        "liquidation_no_protest.csv",
        "entry_number,liquidation_date,liquidation_status\n1,2025-01-01,Liquidated\n",
    );

    let mut pipeline = ClaimsPipeline::new();
    let err = pipeline
        .process_files(&reports.entry_summary, &no_protest, None)
        .unwrap_err();

    match err {
        ClaimsError::Schema { column, .. } => assert_eq!(column, "protest_status"),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_source_error() {
    let dir = tempdir().unwrap();
    let reports = write_reports(dir.path());

    let mut pipeline = ClaimsPipeline::new();
    let err = pipeline
        .process_files(
            &reports.entry_summary,
            &dir.path().join("does_not_exist.csv"),
            None,
        )
        .unwrap_err();

    assert!(matches!(err, ClaimsError::SourceRead { .. }));
}

#[test]
fn test_text_entered_value_still_processes() -> Result<()> {
    let dir = tempdir()?;
    let entries = write(
        dir.path(),
        "entry_summary_tbd.csv",
        "entry_number,hts_code,duties_paid,entered_value\n\
         1,9903.01.1234,1000,TBD\n",
    );
    let liquidation = write(
        dir.path(),
        "liquidation_tbd.csv",
        "entry_number,liquidation_date,liquidation_status,protest_status\n\
         1,2025-06-01,Liquidated,None\n",
    );

    let mut pipeline = ClaimsPipeline::with_clock(FixedClock(today()));
    let table = pipeline.process_files(&entries, &liquidation, None)?;

    assert_eq!(table.get(0, "entered_value"), Some(Value::Text("TBD".to_string())));
    assert_eq!(table.get(0, "calculated_refund_due"), Some(Value::Number(1000.0)));

    let output = dir.path().join("results.csv");
    pipeline.export(&output)?;
    let text = fs::read_to_string(&output)?;
    assert!(text.lines().nth(1).unwrap().starts_with("00000000001,9903.01.1234,1000,TBD,"));

    Ok(())
}
