//! Integration tests for the kollab CLI
//!
//! These run the real binary, against a fake backend where a server is needed.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// Helper to create a kollab Command isolated from the user's environment
fn kollab(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("kollab");
    cmd.current_dir(dir.path())
        .env_remove("KOLLAB_SERVER_URL")
        .env_remove("KOLLAB_EVENTS_URL")
        .env_remove("KOLLAB_COMPANY_ID")
        .env_remove("RUST_LOG")
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"));
    cmd
}

/// Helper to create a temporary working directory
fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Fake backend
// =============================================================================

fn stored_report() -> Value {
    json!({
        "executive_summary": "Checkout is the main pain point.",
        "issues": [
            {
                "issue_type": "Checkout crash",
                "description": "App crashes on pay",
                "criticality": "critical",
                "responsible_team": "Payments",
                "status": "new"
            },
            {
                "issue_type": "Slow search",
                "description": "Search takes seconds",
                "criticality": "low",
                "responsible_team": "Search",
                "status": "processing"
            }
        ],
        "implementation_plan": { "immediate_actions": ["Roll back release 4.2"] },
        "cross_team_initiatives": [
            { "name": "Release hygiene", "description": "Staged rollouts", "teams_involved": ["Payments", "QA"] }
        ]
    })
}

async fn analyze(mut multipart: Multipart) -> Json<Value> {
    let mut save = false;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.bytes().await.unwrap();
        if name == "save_analysis" {
            save = &value[..] == b"true";
        }
    }
    Json(json!({
        "final_report": stored_report(),
        "saved": save,
        "ticket_id": "t9"
    }))
}

async fn fetch(Path((company, ticket)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
    if ticket != "t1" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Analysis not found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "ticket_id": "t1",
                "company_id": company,
                "status": "processing",
                "final_report": stored_report()
            }
        })),
    )
}

async fn task_status(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["task_index"].as_u64().unwrap_or(0) >= 2 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Invalid task index" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "overall_status": "processing" })),
    )
}

async fn analysis_status() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Serve the fake backend on a background thread; returns its base URL.
fn spawn_backend() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/api/analyze", post(analyze))
                .route("/api/analysis/{company}/{ticket}", get(fetch))
                .route("/api/analysis/status", post(analysis_status))
                .route("/api/task/status", post(task_status));
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_kollab_help() {
        let dir = create_temp_dir();
        kollab(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("analyze"))
            .stdout(predicate::str::contains("ticket-status"));
    }

    #[test]
    fn test_kollab_version() {
        let dir = create_temp_dir();
        kollab(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_invalid_task_status_rejected_by_parser() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["task", "t1", "0", "done"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid task status"));
    }

    #[test]
    fn test_invalid_tab_rejected_by_parser() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["show", "t1", "--tab", "urgent"])
            .assert()
            .failure();
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No kollab.toml found"))
            .stdout(predicate::str::contains("http://localhost:5000"))
            .stdout(predicate::str::contains("company_id = (not set)"));
    }

    #[test]
    fn test_config_init_creates_toml() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created kollab.toml"));

        let content = fs::read_to_string(dir.path().join("kollab.toml")).unwrap();
        assert!(content.contains("[defaults]"));
        assert!(content.contains("save_analysis = true"));
        assert!(content.contains("[[progress.stages]]"));
    }

    #[test]
    fn test_config_init_refuses_to_overwrite() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("kollab.toml"), "[defaults]\ncompany_id = \"acme\"\n").unwrap();

        kollab(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = fs::read_to_string(dir.path().join("kollab.toml")).unwrap();
        assert!(content.contains("acme"));
    }

    #[test]
    fn test_config_init_at_explicit_path() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["--config", "conf/kollab.toml", "config", "init"])
            .assert()
            .success();

        assert!(dir.path().join("conf/kollab.toml").is_file());
    }

    #[test]
    fn test_config_shows_file_values_and_overrides() {
        let dir = create_temp_dir();
        fs::write(
            dir.path().join("kollab.toml"),
            r#"
[server]
base_url = "http://analysis.internal:8080"

[defaults]
company_id = "acme"
query = "What hurts retention?"
"#,
        )
        .unwrap();

        kollab(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("http://analysis.internal:8080"))
            .stdout(predicate::str::contains("company_id = \"acme\""))
            .stdout(predicate::str::contains("What hurts retention?"));

        kollab(&dir)
            .env("KOLLAB_COMPANY_ID", "globex")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("company_id = \"globex\""));

        kollab(&dir)
            .env("KOLLAB_COMPANY_ID", "globex")
            .args(["--company", "initech", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("company_id = \"initech\""));
    }

    #[test]
    fn test_config_validate_warns_without_company() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No company id configured"));
    }

    #[test]
    fn test_config_validate_with_company_is_clean() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["--company", "acme", "config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_config_validate_rejects_bad_server() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["--server", "ftp://files.example.com", "config", "validate"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Configuration errors:"));
    }

    #[test]
    fn test_config_invalid_toml_fails() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("kollab.toml"), "[defaults\ncompany_id = ").unwrap();

        kollab(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid config file"));
    }

    #[test]
    fn test_config_missing_explicit_file_fails() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["--config", "nowhere.toml", "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read config file"));
    }
}

// =============================================================================
// Analyze Tests
// =============================================================================

mod analyze {
    use super::*;

    #[test]
    fn test_analyze_missing_file() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args([
                "--server",
                "http://127.0.0.1:1",
                "--company",
                "acme",
                "analyze",
                "missing.csv",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File not found"));
    }

    #[test]
    fn test_analyze_requires_company() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("feedback.csv"), "comment\nslow\n").unwrap();

        kollab(&dir)
            .args(["--server", "http://127.0.0.1:1", "analyze", "feedback.csv"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Please enter a Company ID"));
    }

    #[test]
    fn test_analyze_against_backend() {
        let dir = create_temp_dir();
        let server = spawn_backend();
        fs::write(dir.path().join("feedback.csv"), "comment\ncheckout crashes\n").unwrap();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "analyze",
                "feedback.csv",
                "--export",
                "out",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Analysis #t9"))
            .stdout(predicate::str::contains("Checkout crash"))
            .stdout(predicate::str::contains("Analysis saved as Ticket #t9"))
            .stdout(predicate::str::contains("/dashboard/acme"));

        assert!(dir.path().join("out/analysis-t9.json").is_file());
    }

    #[test]
    fn test_analyze_without_terminal_keeps_status_log() {
        let dir = create_temp_dir();
        let server = spawn_backend();
        fs::write(dir.path().join("feedback.csv"), "comment\ncheckout crashes\n").unwrap();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "analyze",
                "feedback.csv",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("Uploading and analyzing data"))
            .stderr(predicate::str::contains("Analysis complete"));
    }

    #[test]
    fn test_analyze_no_save() {
        let dir = create_temp_dir();
        let server = spawn_backend();
        fs::write(dir.path().join("feedback.csv"), "comment\ncheckout crashes\n").unwrap();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "analyze",
                "feedback.csv",
                "--no-save",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Analysis (unsaved)"))
            .stdout(predicate::str::contains("saved as Ticket").not());
    }
}

// =============================================================================
// Ticket Tests
// =============================================================================

mod ticket {
    use super::*;

    #[test]
    fn test_show_requires_company() {
        let dir = create_temp_dir();
        kollab(&dir)
            .args(["--server", "http://127.0.0.1:1", "show", "t1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Please enter a Company ID"));
    }

    #[test]
    fn test_show_ticket() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args(["--server", server.as_str(), "--company", "acme", "show", "t1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Analysis #t1"))
            .stdout(predicate::str::contains("[Processing]"))
            .stdout(predicate::str::contains("Checkout is the main pain point."))
            .stdout(predicate::str::contains("Slow search"))
            .stdout(predicate::str::contains("Roll back release 4.2"))
            .stdout(predicate::str::contains("Release hygiene"));
    }

    #[test]
    fn test_show_filters_by_tab() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "show",
                "t1",
                "--tab",
                "critical",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Checkout crash"))
            .stdout(predicate::str::contains("Slow search").not());

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "show",
                "t1",
                "--tab",
                "high",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("No high priority issues found"));
    }

    #[test]
    fn test_show_tasks() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "show",
                "t1",
                "--tasks",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("#0"))
            .stdout(predicate::str::contains("#1"))
            .stdout(predicate::str::contains("New 1  Processing 1  Resolved 0"));
    }

    #[test]
    fn test_show_missing_ticket() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args(["--server", server.as_str(), "--company", "acme", "show", "t404"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Analysis not found"));
    }

    #[test]
    fn test_task_status_update() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "task",
                "t1",
                "0",
                "resolved",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Task #0 is now [Resolved]"))
            .stdout(predicate::str::contains("New 0  Processing 1  Resolved 1"));
    }

    #[test]
    fn test_task_already_in_status() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "task",
                "t1",
                "1",
                "processing",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("already Processing"));
    }

    #[test]
    fn test_task_index_out_of_range() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "task",
                "t1",
                "5",
                "resolved",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("out of range"));
    }

    #[test]
    fn test_ticket_status_update() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "ticket-status",
                "t1",
                "resolved",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ticket t1 is now [Resolved]"));
    }

    #[test]
    fn test_export_ticket() {
        let dir = create_temp_dir();
        let server = spawn_backend();

        kollab(&dir)
            .args([
                "--server",
                server.as_str(),
                "--company",
                "acme",
                "export",
                "t1",
                "-o",
                "exports",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("analysis-t1.json"));

        let content = fs::read_to_string(dir.path().join("exports/analysis-t1.json")).unwrap();
        let stored: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(stored["ticket_id"], "t1");
        assert_eq!(stored["final_report"]["issues"][0]["issue_type"], "Checkout crash");
    }
}
