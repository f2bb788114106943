//! End-to-end tests against a workspace on disk

mod common;

use common::{workspace, write};
use hacknet_hints::diagnostics::Severity;
use hacknet_hints::resources::ResourceClass;
use hacknet_hints::{DiagnoseOptions, HintEngine};
use pretty_assertions::assert_eq;
use std::process::Command;

fn labels(engine: &HintEngine, text: &str, offset: usize) -> Vec<String> {
    engine
        .complete(None, text, offset)
        .into_iter()
        .map(|s| s.label)
        .collect()
}

#[test]
fn test_completion_in_workspace() {
    let temp = workspace();
    let engine = HintEngine::open(temp.path());

    assert_eq!(labels(&engine, "", 0), vec!["Computer", "mission"]);
    assert_eq!(
        labels(&engine, "<Computer id=\"a\"></Computer>", 17),
        vec!["portal", "file"]
    );
    assert_eq!(labels(&engine, "<Computer type=\"\"/>", 16), vec!["1", "2"]);
}

#[test]
fn test_step_chain_completion() {
    let temp = workspace();
    let engine = HintEngine::open(temp.path());

    let text = r#"<Computer id="x"><portal request="GET /a"/></Computer>"#;
    assert_eq!(labels(&engine, text, 40), vec!["/a", "/b"]);

    // The trailing space is trimmed, so no step matches yet
    let text = r#"<Computer id="x"><portal request="GET "/></Computer>"#;
    assert_eq!(labels(&engine, text, 38), vec!["GET ", "POST "]);
}

#[test]
fn test_hover_and_definition() {
    let temp = workspace();
    let engine = HintEngine::open(temp.path());

    let text = r#"<Computer type="1"/>"#;
    assert_eq!(engine.hover(None, text, 3).as_deref(), Some("A computer node"));
    assert_eq!(engine.hover(None, text, 11).as_deref(), Some("Security level"));
    assert_eq!(engine.hover(None, text, 16).as_deref(), Some("Corporate"));

    let targets = engine.definition(None, common::MISSION, 31);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].relative_path, "Nodes/core.xml");
    assert_eq!(targets[0].file_path, temp.path().join("Nodes/core.xml"));
}

#[test]
fn test_computer_change_rediagnoses_dependents() {
    let temp = workspace();
    let mission = temp.path().join("Missions/m.xml");
    let core = temp.path().join("Nodes/core.xml");
    let mut engine = HintEngine::open(temp.path());

    let reports = engine.diagnose(&engine.document_paths(), DiagnoseOptions::default());
    assert!(reports.iter().all(|r| r.is_clean()), "{:?}", reports);

    let text = r#"<Computer id="renamed" ip="10.0.0.1"/>"#;
    write(temp.path(), "Nodes/core.xml", text);
    engine.update_file(&core, text);

    let options = DiagnoseOptions {
        scan_dependents: true,
        ..DiagnoseOptions::default()
    };
    let reports = engine.diagnose(&[core.clone()], options);
    let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec![mission.clone(), core]);

    let mission_report = &reports[0];
    assert_eq!(mission_report.error_count(), 1);
    assert!(mission_report.findings[0].message.contains("core"));
}

#[test]
fn test_duplicate_computer_ids() {
    let temp = workspace();
    let other = write(temp.path(), "Nodes/copy.xml", r#"<Computer id="core" ip="10.0.0.2"/>"#);
    let core = temp.path().join("Nodes/core.xml");
    let mut engine = HintEngine::open(temp.path());

    let reports = engine.diagnose(&[core.clone(), other.clone()], DiagnoseOptions::default());
    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_eq!(report.error_count(), 1, "{:?}", report);
        assert_eq!(report.findings[0].code.as_deref(), Some("duplicate-id"));
        assert!(report.findings[0].message.contains("id重复"));
    }

    std::fs::remove_file(&other).unwrap();
    assert_eq!(engine.remove_file(&other), Some(ResourceClass::Computer));
    let options = DiagnoseOptions {
        scan_dependents: true,
        ..DiagnoseOptions::default()
    };
    let reports = engine.diagnose(&[other.clone()], options);
    let core_report = reports
        .iter()
        .find(|r| r.path == core)
        .expect("core.xml re-diagnosed after the duplicate was deleted");
    assert!(core_report.is_clean(), "{:?}", core_report);
    assert!(reports.iter().any(|r| r.path == other && r.is_clean()));
}

#[test]
fn test_unknown_tags_are_hints() {
    let temp = workspace();
    let path = write(
        temp.path(),
        "Nodes/odd.xml",
        "<Computer id=\"odd\" type=\"9\">\n  <Mystery><Inner/></Mystery>\n</Computer>",
    );
    let mut engine = HintEngine::open(temp.path());

    let reports = engine.diagnose(&[path], DiagnoseOptions::default());
    let severities: Vec<Severity> = reports[0].findings.iter().map(|f| f.severity).collect();
    assert_eq!(severities, vec![Severity::Warning, Severity::Hint]);
    assert_eq!(reports[0].findings[1].range.start.line, 1);
}

#[test]
fn test_cli_diagnose_reports_errors() {
    let temp = workspace();
    write(temp.path(), "Nodes/copy.xml", r#"<Computer id="core"/>"#);

    let output = Command::new(env!("CARGO_BIN_EXE_hacknet-hints"))
        .args(["--workspace", temp.path().to_str().unwrap(), "diagnose"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("duplicate-id"), "{}", stdout);
}

#[test]
fn test_cli_complete_json() {
    let temp = workspace();
    let file = write(temp.path(), "Nodes/new.xml", r#"<Computer type=""/>"#);

    let output = Command::new(env!("CARGO_BIN_EXE_hacknet-hints"))
        .args(["--workspace", temp.path().to_str().unwrap(), "--format", "json", "complete"])
        .arg(&file)
        .arg("1:17")
        .output()
        .unwrap();

    assert!(output.status.success());
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items[0]["label"], "1");
    assert_eq!(items[1]["label"], "2");
}
