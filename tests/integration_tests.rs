//! Integration tests for the plantops CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use plantops::core::workbook::{self, Cell, Sheet};
use plantops::core::LockSettings;

/// Helper to get a plantops command
fn plantops() -> Command {
    Command::cargo_bin("plantops").unwrap()
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    plantops()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    tmp
}

/// Helper to seed raw stock rows through the CLI
fn seed_raw(tmp: &TempDir, sku: &str, qty: f64) {
    plantops()
        .current_dir(tmp.path())
        .args([
            "stock",
            "add",
            sku,
            "--name",
            &format!("{} material", sku),
            "--qty",
            &qty.to_string(),
            "--warehouse",
            "raw",
            "--quiet",
        ])
        .assert()
        .success();
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    plantops()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("production and inventory"));
}

#[test]
fn test_version_displays() {
    plantops()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plantops"));
}

#[test]
fn test_unknown_command_fails() {
    plantops()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_workspace_structure() {
    let tmp = TempDir::new().unwrap();

    plantops()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".plantops").exists());
    assert!(tmp.path().join(".plantops/config.yaml").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();

    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a plantops workspace"));
}

// ============================================================================
// Stock & Movement Tests
// ============================================================================

#[test]
fn test_stock_add_and_list() {
    let tmp = setup_workspace();
    seed_raw(&tmp, "M1", 3.5);

    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list", "--warehouse", "raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1"))
        .stdout(predicate::str::contains("3.5"));
}

#[test]
fn test_movement_creates_row_then_updates_it() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args([
            "mov", "add", "X", "--name", "Widget", "--qty", "5", "--reason", "receipt",
            "--operator", "ana",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Movement #1"));

    plantops()
        .current_dir(tmp.path())
        .args([
            "mov",
            "add",
            "X",
            "--name",
            "Widget",
            "--qty=-2",
            "--reason",
            "issue",
            "--operator",
            "ana",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Movement #2"));

    // One stock row at quantity 3, two ledger entries in order.
    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list", "--warehouse", "finished", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("X\tWidget\t3"));

    plantops()
        .current_dir(tmp.path())
        .args(["mov", "list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("receipt"))
        .stdout(predicate::str::contains("issue"));
}

#[test]
fn test_movement_exports_finished_sheet() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args(["mov", "add", "X", "--qty", "5", "--operator", "ana"])
        .assert()
        .success();

    let names = workbook::sheet_names(&tmp.path().join("plant.xlsx"));
    assert!(names.contains(&"Finished Goods".to_string()));
}

#[test]
fn test_stock_set_requires_existing_row() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args(["stock", "set", "M9", "--qty", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no stock row"));

    seed_raw(&tmp, "M9", 1.0);
    plantops()
        .current_dir(tmp.path())
        .args(["stock", "set", "M9", "--qty", "4"])
        .assert()
        .success();
}

// ============================================================================
// Order Command Tests
// ============================================================================

#[test]
fn test_order_create_consumes_first_row_first() {
    let tmp = setup_workspace();
    seed_raw(&tmp, "M1", 3.0);
    seed_raw(&tmp, "M1", 4.0);

    plantops()
        .current_dir(tmp.path())
        .args([
            "order",
            "create",
            "P1",
            "--qty",
            "10",
            "--bom",
            r#"[{"mp_id":"M1","qty_per_product":0.5}]"#,
            "--operator",
            "ana",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order #1"))
        .stdout(predicate::str::contains("consumed 5 of M1"));

    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list", "--warehouse", "raw", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1\tM1 material\t0"))
        .stdout(predicate::str::contains("M1\tM1 material\t2"));

    plantops()
        .current_dir(tmp.path())
        .args(["order", "list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1\t10"));
}

#[test]
fn test_order_shortage_aborts_without_mutation() {
    let tmp = setup_workspace();
    seed_raw(&tmp, "M1", 1.0);
    seed_raw(&tmp, "M1", 3.0);

    plantops()
        .current_dir(tmp.path())
        .args([
            "order",
            "create",
            "P1",
            "--qty",
            "10",
            "--bom",
            r#"[{"mp_id":"M1","qty_per_product":0.5}]"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("M1"))
        .stderr(predicate::str::contains("Insufficient stock"));

    // Stock unchanged, no order logged.
    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list", "--warehouse", "raw", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1\tM1 material\t1"))
        .stdout(predicate::str::contains("M1\tM1 material\t3"));

    plantops()
        .current_dir(tmp.path())
        .args(["order", "list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1").not());
}

#[test]
fn test_order_rejects_malformed_bom() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args(["order", "create", "P1", "--qty", "10", "--bom", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid BOM"));
}

// ============================================================================
// Production Command Tests
// ============================================================================

#[test]
fn test_prod_add_and_report() {
    let tmp = setup_workspace();

    for (operator, eff) in [("Ana", "0.9"), ("Ana", "0.7"), ("Bruno", "0.95")] {
        plantops()
            .current_dir(tmp.path())
            .args([
                "prod",
                "add",
                "--date",
                "2025-03-10",
                "--machine",
                "Oriente 45",
                "--product",
                "P1",
                "--shift",
                "1",
                "--operator",
                operator,
                "--scheduled",
                "100",
                "--produced",
                "90",
                "--efficiency",
                eff,
                "--quiet",
            ])
            .assert()
            .success();
    }

    plantops()
        .current_dir(tmp.path())
        .args(["prod", "report", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bruno\t95.00%"))
        .stdout(predicate::str::contains("Ana\t80.00%"));

    // Operator filter restricts the aggregation exactly.
    plantops()
        .current_dir(tmp.path())
        .args(["prod", "report", "--operator", "Ana", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bruno").not());
}

#[test]
fn test_prod_add_rejects_bad_efficiency() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args(["prod", "add", "--efficiency", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("efficiency"));
}

#[test]
fn test_prod_summary_shows_loss() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args([
            "prod",
            "add",
            "--product",
            "P1",
            "--scheduled",
            "100",
            "--produced",
            "60",
            "--quiet",
        ])
        .assert()
        .success();

    plantops()
        .current_dir(tmp.path())
        .args(["prod", "summary", "--format", "tsv", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1\t100\t60\t40"));
}

// ============================================================================
// Machine Command Tests
// ============================================================================

#[test]
fn test_machine_set_and_list() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args([
            "machine",
            "set",
            "Oriente 45",
            "--product",
            "P1",
            "--operator",
            "ana",
            "--status",
            "setup",
        ])
        .assert()
        .success();

    // Upsert replaces, never duplicates.
    plantops()
        .current_dir(tmp.path())
        .args(["machine", "set", "Oriente 45", "--status", "breakdown"])
        .assert()
        .success();

    plantops()
        .current_dir(tmp.path())
        .args(["machine", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("breakdown"))
        .stdout(predicate::str::contains("Setup").not());
}

#[test]
fn test_machine_set_rejects_unknown_status() {
    let tmp = setup_workspace();

    plantops()
        .current_dir(tmp.path())
        .args(["machine", "set", "MG", "--status", "idle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid machine status"));
}

// ============================================================================
// Sync Command Tests
// ============================================================================

fn seed_workbook(tmp: &TempDir) {
    let mut sheet = Sheet::new(["SKU", "Name", "Quantity", "Unit", "Location"]);
    sheet.push_row(vec![
        Cell::from("M1"),
        Cell::from("Resin"),
        Cell::from(3.0),
        Cell::from("kg"),
        Cell::from("A1"),
    ]);
    sheet.push_row(vec![
        Cell::from("M1"),
        Cell::from("Resin"),
        Cell::from(4.0),
        Cell::from("kg"),
        Cell::from("A2"),
    ]);
    workbook::write_sheets(
        &tmp.path().join("plant.xlsx"),
        &[("Raw Materials".to_string(), sheet)],
        LockSettings::default(),
    )
    .unwrap();
}

#[test]
fn test_first_command_imports_workbook_automatically() {
    let tmp = TempDir::new().unwrap();
    seed_workbook(&tmp);

    plantops()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();

    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list", "--warehouse", "raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("First run"))
        .stdout(predicate::str::contains("M1"));
}

#[test]
fn test_sync_import_force_overwrites_mirror() {
    let tmp = setup_workspace();
    seed_raw(&tmp, "OLD", 9.0);
    seed_workbook(&tmp);

    plantops()
        .current_dir(tmp.path())
        .args(["sync", "import", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 sheet(s), 2 row(s)"));

    plantops()
        .current_dir(tmp.path())
        .args(["stock", "list", "--warehouse", "raw", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1"))
        .stdout(predicate::str::contains("OLD").not());
}

#[test]
fn test_sync_export_writes_all_mapped_sheets() {
    let tmp = setup_workspace();
    seed_raw(&tmp, "M1", 2.0);

    plantops()
        .current_dir(tmp.path())
        .args(["sync", "export"])
        .assert()
        .success();

    let names = workbook::sheet_names(&tmp.path().join("plant.xlsx"));
    for sheet in ["Raw Materials", "Finished Goods", "Production", "Orders"] {
        assert!(names.contains(&sheet.to_string()), "missing sheet {sheet}");
    }
}

#[test]
fn test_sync_status_reports_tables() {
    let tmp = setup_workspace();
    seed_raw(&tmp, "M1", 2.0);

    plantops()
        .current_dir(tmp.path())
        .args(["sync", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stock_raw"))
        .stdout(predicate::str::contains("1 row(s)"));
}
