use serde_json::json;

use crate::history::SearchKind;
use crate::output::{DashboardSnapshot, OutputFormat};
use crate::render::RenderContext;
use crate::storage::FileStore;
use crate::ui::{Tab, UiController};

#[test]
fn camel_case_keys_win_over_snake_case() {
    let device = crate::normalize::normalize_device(&json!({
        "serialNumber": "5CD123",
        "serial_number": "IGNORED",
        "assetTag": "",
        "asset_tag": "CB-0042",
        "model": null,
    }));
    assert_eq!(device.serial_number.as_deref(), Some("5CD123"));
    assert_eq!(device.asset_tag.as_deref(), Some("CB-0042"));
    assert!(device.model.is_none());
}

#[test]
fn backend_markup_is_escaped_in_cards() {
    let devices = crate::normalize::normalize_devices(&[json!({
        "assetTag": "<script>alert(1)</script>",
        "deviceType": "Chromebooks",
        "status": "ACTIVE",
    })]);
    let html =
        crate::render::device::device_results(&devices, &RenderContext::default(), "none")
            .render();
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<script>alert"));
}

#[test]
fn history_and_hero_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("storage.json");

    {
        let mut ui = UiController::new(FileStore::open(&path));
        ui.record_search("cb-1", SearchKind::Device);
        ui.record_search("ada@school.org", SearchKind::User);
        assert!(ui.toggle_hero().unwrap());
    }

    let ui = UiController::new(FileStore::open(&path));
    assert!(ui.hero_collapsed());
    let recent = ui.recent_searches();
    assert_eq!(recent.len(), 2);
    assert!(recent
        .iter()
        .any(|r| r.query == "cb-1" && r.kind == SearchKind::Device));
    assert!(recent
        .iter()
        .any(|r| r.query == "ada@school.org" && r.kind == SearchKind::User));
}

#[test]
fn corrupt_storage_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{not json").unwrap();

    let mut ui = UiController::new(FileStore::open(&path));
    assert!(ui.recent_searches().is_empty());
    assert!(!ui.hero_collapsed());

    ui.record_search("cb-9", SearchKind::Device);
    let ui = UiController::new(FileStore::open(&path));
    assert_eq!(ui.recent_searches().len(), 1);
}

#[tokio::test]
async fn failed_search_renders_alert_in_page() {
    let api = crate::fetch::testing::serve(|line| {
        if line.contains("/api/combined/search") {
            ("500 Internal Server Error", r#"{"detail": "x"}"#.to_string())
        } else {
            ("200 OK", "{}".to_string())
        }
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut ui = UiController::new(FileStore::open(dir.path().join("storage.json")));

    crate::fetch::search_devices(&api, &mut ui, "cb-1").await;
    ui.switch_tab(Tab::Reports);

    let snapshot = DashboardSnapshot::capture(&ui);
    let html = String::from_utf8(crate::output::render(
        OutputFormat::Html,
        &snapshot,
        &RenderContext::default(),
    ))
    .unwrap();
    assert!(html.contains("Error: x"));
    assert!(html.contains(r#"role="alert""#));

    let json: serde_json::Value =
        serde_json::from_slice(&crate::output::render_json(&snapshot)).unwrap();
    assert_eq!(json["active_tab"], "reports");
    assert_eq!(json["recent_searches"][0]["query"], "cb-1");
}

#[tokio::test]
async fn failed_widget_refresh_never_renders_as_loading() {
    let api = crate::fetch::testing::serve(|line| {
        if line.starts_with("POST") {
            ("500 Internal Server Error", r#"{"detail": "cache busy"}"#.to_string())
        } else {
            ("200 OK", "{}".to_string())
        }
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut ui = UiController::new(FileStore::open(dir.path().join("storage.json")));

    crate::fetch::initialize(&api, &mut ui, false).await;
    assert!(!crate::fetch::refresh_widgets(&api, &mut ui).await);

    let snapshot = DashboardSnapshot::capture(&ui);
    let html = String::from_utf8(crate::output::render(
        OutputFormat::Html,
        &snapshot,
        &RenderContext::default(),
    ))
    .unwrap();
    assert!(!html.contains("Loading AUE data"));
    assert!(html.contains("Error loading AUE data"));
    assert!(!html.contains(r#"id="aueExpiredCount">...<"#));
}
