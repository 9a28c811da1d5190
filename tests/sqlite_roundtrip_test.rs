#![cfg(feature = "sqlite")]

//! The report pipeline against a real on-disk database.

mod common;

use common::{date, scenario_snapshots, scenario_trades};
use tradelog::adapters::file_config_adapter::FileConfigAdapter;
use tradelog::adapters::sqlite_adapter::SqliteAdapter;
use tradelog::domain::metrics::compute_report;
use tradelog::domain::period::Period;
use tradelog::ports::journal_port::JournalPort;

#[test]
fn report_from_file_backed_journal() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("journal.db");
    let config = FileConfigAdapter::from_string(&format!(
        "[sqlite]\npath = {}\npool_size = 2\n",
        db_path.display()
    ))
    .unwrap();

    let journal = SqliteAdapter::from_config(&config).unwrap();
    journal.initialize_schema().unwrap();
    journal.insert_trades(&scenario_trades()).unwrap();
    journal.insert_snapshots(&scenario_snapshots()).unwrap();

    let trades = journal.load_trades().unwrap();
    let snapshots = journal.load_snapshots().unwrap();
    assert_eq!(trades.len(), 5);
    assert_eq!(snapshots.len(), 12);

    let report = compute_report(&trades, &snapshots, Period::AllTime, date(2026, 8, 25), 5);
    assert!(report.summary.has_enough_data);
    assert!((report.summary.win_rate - 40.0).abs() < 1e-9);
    assert_eq!(report.advanced_metrics.win_streak, 2);
    assert_eq!(report.advanced_metrics.loss_streak, 3);
    assert!((report.executive_metrics.max_drawdown.percent - (-7.70)).abs() < 0.1);

    // Stored rows match what went in, and the report matches the in-memory
    // computation over the original fixtures.
    let direct = compute_report(
        &scenario_trades(),
        &scenario_snapshots(),
        Period::AllTime,
        date(2026, 8, 25),
        5,
    );
    assert_eq!(
        serde_json::to_string(&report).unwrap(),
        serde_json::to_string(&direct).unwrap()
    );
}

#[test]
fn schema_initialization_is_idempotent() {
    let adapter = SqliteAdapter::in_memory().unwrap();
    adapter.initialize_schema().unwrap();
    adapter.initialize_schema().unwrap();
    assert!(adapter.load_trades().unwrap().is_empty());
    assert!(adapter.latest_snapshot().unwrap().is_none());
}
