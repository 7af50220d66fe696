use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run the binary with an isolated home directory and no remote configured.
fn pricewise(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pricewise").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("PRICEWISE_API_URL")
        .env_remove("PRICEWISE_API_KEY")
        .env_remove("PRICEWISE_LOG");
    cmd
}

fn initialized() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    pricewise(home.path())
        .args(["init", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized pricewise"));
    home
}

const UPLOAD: &str = r#"[
    {"id": "u1", "productName": "Wireless Earbuds", "category": "Audio", "price": 100, "quantity": 5, "month": "April", "salesLocation": "Texas"},
    {"productName": "Desk Lamp", "price": 20, "quantity": 2, "month": "February"}
]"#;

#[test]
fn init_creates_store_and_settings() {
    let home = initialized();
    let data_dir = home.path().join("data");
    assert!(data_dir.join("pricewise.db").exists());
    assert!(data_dir.join("exports").is_dir());
    assert!(home.path().join(".config/pricewise/settings.json").exists());

    pricewise(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Products:       6"))
        .stdout(predicate::str::contains("(not configured)"));
}

#[test]
fn summary_from_fixture() {
    let home = tempfile::tempdir().unwrap();
    pricewise(home.path())
        .args(["report", "--source", "fixture", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sales Summary"))
        .stdout(predicate::str::contains("24"));
}

#[test]
fn empty_local_store_falls_back_with_notice() {
    let home = initialized();
    pricewise(home.path())
        .args(["report", "--source", "local", "regions"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using local data:"))
        .stdout(predicate::str::contains("Sales by Region"));
}

#[test]
fn uploaded_file_drives_reports() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("upload.json");
    std::fs::write(&file, UPLOAD).unwrap();

    pricewise(home.path())
        .args(["report", "categories", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Audio"))
        .stdout(predicate::str::contains("Uncategorized"))
        .stdout(predicate::str::contains("$500.00"));
}

#[test]
fn malformed_upload_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("bad.json");
    std::fs::write(&file, r#"{"productName": "A"}"#).unwrap();

    pricewise(home.path())
        .args(["report", "summary", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Uploaded file must contain an array"));
}

#[test]
fn clean_writes_csv_export() {
    let home = tempfile::tempdir().unwrap();
    let output = home.path().join("out").join("clean.csv");

    pricewise(home.path())
        .args(["clean", "--source", "fixture", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data Quality"));

    let csv = std::fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,product,category,quantity,unit_price,total_sales,region,date,customer_type"
    );
    assert_eq!(lines.count(), 24);
}

#[test]
fn import_then_read_local() {
    let home = initialized();
    let file = home.path().join("upload.json");
    std::fs::write(&file, UPLOAD).unwrap();

    pricewise(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported, 0 skipped"));

    pricewise(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));

    pricewise(home.path())
        .args(["report", "--source", "local", "summary"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using local data").not())
        .stdout(predicate::str::contains("$540.00"));
}

#[test]
fn simulate_default_sweep() {
    let home = tempfile::tempdir().unwrap();
    pricewise(home.path())
        .args(["simulate", "--source", "fixture"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Price Simulation"))
        .stdout(predicate::str::contains("-20.0%"))
        .stdout(predicate::str::contains("+20.0%"))
        .stdout(predicate::str::contains("Optimal price change"));
}

#[test]
fn simulate_rejects_bad_sweep() {
    let home = tempfile::tempdir().unwrap();
    pricewise(home.path())
        .args(["simulate", "--source", "fixture", "--step", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid price sweep"));
}

#[test]
fn simulate_rejects_oversized_sweep() {
    let home = tempfile::tempdir().unwrap();
    pricewise(home.path())
        .args(["simulate", "--source", "fixture", "--step", "1e-300"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid price sweep"));
}

#[test]
fn trend_rejects_unknown_granularity() {
    let home = tempfile::tempdir().unwrap();
    pricewise(home.path())
        .args(["report", "trend", "--granularity", "hourly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown granularity"));
}

#[test]
fn products_categorize() {
    let home = initialized();
    pricewise(home.path())
        .args(["products", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Winter Thermal Jacket"));

    pricewise(home.path())
        .args(["products", "categorize"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Categorized: 5"))
        .stdout(predicate::str::contains("Unmatched: 1"));
}

#[test]
fn products_update() {
    let home = initialized();
    pricewise(home.path())
        .args(["products", "update", "1", "--price", "59.99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated product 1"));

    pricewise(home.path())
        .args(["products", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$59.99"));

    pricewise(home.path())
        .args(["products", "update", "1", "--price", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Price must be positive"));
}

#[test]
fn product_validation_errors() {
    let home = initialized();
    pricewise(home.path())
        .args(["products", "add", "Lamp", "--sku", "WH-PRO-001", "--price", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WH-PRO-001"));
}

#[test]
fn pricing_rules_lifecycle() {
    let home = initialized();
    pricewise(home.path())
        .args([
            "pricing", "add", "Clearance", "--category", "Seasonal", "--type", "percentage",
            "--value", "-25", "--priority", "4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added pricing rule 4"));

    pricewise(home.path())
        .args(["pricing", "delete", "4"])
        .assert()
        .success();

    pricewise(home.path())
        .args(["pricing", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Summer Sale"))
        .stdout(predicate::str::contains("Clearance").not());

    pricewise(home.path())
        .args(["pricing", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clearance"));
}

#[test]
fn pricing_rule_needs_known_category() {
    let home = initialized();
    pricewise(home.path())
        .args(["pricing", "add", "Promo", "--category", "Nope", "--type", "fixed", "--value", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category: Nope"));
}

#[test]
fn strategies_board() {
    let home = tempfile::tempdir().unwrap();
    pricewise(home.path())
        .arg("strategies")
        .assert()
        .success()
        .stdout(predicate::str::contains("Premium Products Markup"))
        .stdout(predicate::str::contains("Regional Price Adjustment"));

    let out = pricewise(home.path())
        .args(["strategies", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);
}
