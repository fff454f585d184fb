//! Request orchestration: every action moves its panel through loading and
//! ends in results, an empty state or an inline error, with a toast.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::api::{ApiClient, ApiError};
use crate::history::SearchKind;
use crate::model::{AdvancedSearchFilters, PanelState, CHROMEBOOK_TYPE};
use crate::normalize::{normalize_devices, normalize_users, tag_untyped};
use crate::render::format::format_count;
use crate::storage::KeyValueStore;
use crate::ui::toast::ToastLevel;
use crate::ui::{Tab, UiController};

pub const NO_DEVICES: &str = "No devices found";
pub const NO_USERS: &str = "No users found";
pub const NO_MATCHING_DEVICES: &str = "No devices found matching the criteria";
pub const EMPTY_QUERY: &str = "Enter a search term";
pub const NO_FILTERS: &str = "Please select at least one filter";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Rejected before any request was made.
    Rejected,
    Empty,
    Loaded(usize),
    Failed,
}

/// Terminal spinner, cleared when dropped so no path leaves it running.
struct Spinner(ProgressBar);

impl Spinner {
    fn start(message: &'static str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        Self(pb)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

fn settle<T>(what: &str, result: Result<T, ApiError>) -> PanelState<T> {
    match result {
        Ok(value) => PanelState::Ready(value),
        Err(e) => {
            log::warn!("{what} failed: {e}");
            PanelState::Failed(e.display_message())
        }
    }
}

fn plural(count: u64, noun: &str) -> String {
    format!("{} {noun}(s) found", format_count(count))
}

pub async fn search_devices<S: KeyValueStore>(
    api: &ApiClient,
    ui: &mut UiController<S>,
    query: &str,
) -> FetchOutcome {
    let query = query.trim();
    if query.is_empty() {
        ui.notify(ToastLevel::Warning, EMPTY_QUERY);
        return FetchOutcome::Rejected;
    }
    ui.record_search(query, SearchKind::Device);
    ui.switch_tab(Tab::Search);
    ui.set_search_info(Vec::new());
    ui.data_mut().devices = PanelState::Loading;

    let result = {
        let _spinner = Spinner::start("Searching devices...");
        api.search_devices(query).await
    };

    match result {
        Ok(response) => {
            let devices = normalize_devices(&response.devices);
            let count = response.count.max(devices.len() as u64);
            ui.set_search_info(vec![plural(count, "device")]);
            if devices.is_empty() {
                ui.data_mut().devices = PanelState::Empty(NO_DEVICES.to_string());
                ui.notify(ToastLevel::Info, NO_DEVICES);
                FetchOutcome::Empty
            } else {
                let loaded = devices.len();
                ui.data_mut().devices = PanelState::Ready(devices);
                ui.notify(
                    ToastLevel::Success,
                    format!("Found {} device(s)", format_count(count)),
                );
                FetchOutcome::Loaded(loaded)
            }
        }
        Err(e) => {
            log::warn!("device search for '{query}' failed: {e}");
            ui.data_mut().devices = PanelState::Failed(e.display_message());
            ui.notify(ToastLevel::Error, format!("Search failed: {}", e.detail()));
            FetchOutcome::Failed
        }
    }
}

pub async fn advanced_search<S: KeyValueStore>(
    api: &ApiClient,
    ui: &mut UiController<S>,
    filters: &AdvancedSearchFilters,
) -> FetchOutcome {
    if filters.is_empty() {
        ui.notify(ToastLevel::Warning, NO_FILTERS);
        return FetchOutcome::Rejected;
    }
    ui.switch_tab(Tab::Search);
    ui.set_search_info(Vec::new());
    ui.data_mut().devices = PanelState::Loading;

    let result = {
        let _spinner = Spinner::start("Searching devices...");
        api.advanced_search(filters).await
    };

    match result {
        Ok(response) => {
            // The advanced search only covers Google-managed devices.
            let devices = tag_untyped(normalize_devices(&response.devices), CHROMEBOOK_TYPE);
            let count = response.total_count.max(devices.len() as u64);
            ui.set_search_info(vec![
                plural(count, "device"),
                format!("Filters: {}", filters.describe().join(", ")),
            ]);
            if devices.is_empty() {
                ui.data_mut().devices = PanelState::Empty(NO_MATCHING_DEVICES.to_string());
                ui.notify(ToastLevel::Info, NO_MATCHING_DEVICES);
                FetchOutcome::Empty
            } else {
                let loaded = devices.len();
                ui.data_mut().devices = PanelState::Ready(devices);
                ui.notify(
                    ToastLevel::Success,
                    format!("Found {} devices", format_count(count)),
                );
                FetchOutcome::Loaded(loaded)
            }
        }
        Err(e) => {
            log::warn!("advanced search failed: {e}");
            ui.data_mut().devices = PanelState::Failed(e.display_message());
            ui.notify(ToastLevel::Error, format!("Search failed: {}", e.detail()));
            FetchOutcome::Failed
        }
    }
}

pub async fn search_users<S: KeyValueStore>(
    api: &ApiClient,
    ui: &mut UiController<S>,
    query: &str,
) -> FetchOutcome {
    let query = query.trim();
    if query.is_empty() {
        ui.notify(ToastLevel::Warning, EMPTY_QUERY);
        return FetchOutcome::Rejected;
    }
    ui.record_search(query, SearchKind::User);
    ui.switch_tab(Tab::Users);
    ui.data_mut().users = PanelState::Loading;

    let result = {
        let _spinner = Spinner::start("Searching users...");
        api.search_users(query).await
    };

    match result {
        Ok(response) => {
            let users = normalize_users(&response.users);
            let count = response.count.max(users.len() as u64);
            if users.is_empty() {
                ui.data_mut().users = PanelState::Empty(NO_USERS.to_string());
                ui.notify(ToastLevel::Info, NO_USERS);
                FetchOutcome::Empty
            } else {
                let loaded = users.len();
                ui.data_mut().users = PanelState::Ready(users);
                ui.notify(
                    ToastLevel::Success,
                    format!("Found {} user(s)", format_count(count)),
                );
                FetchOutcome::Loaded(loaded)
            }
        }
        Err(e) => {
            log::warn!("user search for '{query}' failed: {e}");
            ui.data_mut().users = PanelState::Failed(e.display_message());
            ui.notify(
                ToastLevel::Error,
                format!("User search failed: {}", e.detail()),
            );
            FetchOutcome::Failed
        }
    }
}

/// Loads the hero stats and, when `widgets` is set, both report widgets concurrently.
pub async fn initialize<S: KeyValueStore>(api: &ApiClient, ui: &mut UiController<S>, widgets: bool) {
    {
        let data = ui.data_mut();
        data.stats = PanelState::Loading;
        if widgets {
            data.aue = PanelState::Loading;
            data.security = PanelState::Loading;
        }
    }

    let widget_requests = async {
        if widgets {
            Some(futures::join!(
                api.aue_expiration(false),
                api.security_alerts(false)
            ))
        } else {
            None
        }
    };
    let (stats, widget_results) = {
        let _spinner = Spinner::start("Loading dashboard...");
        futures::join!(api.stats(), widget_requests)
    };

    let data = ui.data_mut();
    data.stats = settle("dashboard stats", stats);
    if let Some((aue, security)) = widget_results {
        data.aue = settle("AUE expiration", aue);
        data.security = settle("security alerts", security);
    }
}

/// Invalidates the backend widget cache, then re-fetches both widgets bypassing it.
pub async fn refresh_widgets<S: KeyValueStore>(api: &ApiClient, ui: &mut UiController<S>) -> bool {
    let _spinner = Spinner::start("Refreshing widgets...");

    if let Err(e) = api.refresh_widgets().await {
        log::warn!("widget refresh failed: {e}");
        let data = ui.data_mut();
        data.aue = PanelState::Failed(e.display_message());
        data.security = PanelState::Failed(e.display_message());
        ui.notify(ToastLevel::Error, "Failed to refresh dashboard widgets");
        return false;
    }

    {
        let data = ui.data_mut();
        data.aue = PanelState::Loading;
        data.security = PanelState::Loading;
    }
    let (aue, security) = futures::join!(api.aue_expiration(true), api.security_alerts(true));

    let ok = aue.is_ok() && security.is_ok();
    let data = ui.data_mut();
    data.aue = settle("AUE expiration", aue);
    data.security = settle("security alerts", security);

    if ok {
        ui.notify(ToastLevel::Success, "Dashboard widgets refreshed successfully");
    } else {
        ui.notify(ToastLevel::Error, "Failed to refresh dashboard widgets");
    }
    ok
}

/// Re-runs entry `index` (zero-based) of the merged recent-searches list.
pub async fn rerun<S: KeyValueStore>(
    api: &ApiClient,
    ui: &mut UiController<S>,
    index: usize,
) -> FetchOutcome {
    let Some(entry) = ui.recent_searches().into_iter().nth(index) else {
        ui.notify(
            ToastLevel::Warning,
            format!("No recent search #{}", index + 1),
        );
        return FetchOutcome::Rejected;
    };
    log::info!("re-running {} search '{}'", entry.kind.label(), entry.query);
    match entry.kind {
        SearchKind::Device => search_devices(api, ui, &entry.query).await,
        SearchKind::User => search_users(api, ui, &entry.query).await,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::serve;
    use super::*;
    use crate::storage::MemoryStore;

    fn ui() -> UiController<MemoryStore> {
        UiController::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn server_error_ends_in_error_state() {
        let api = serve(|_| ("500 Internal Server Error", r#"{"detail": "x"}"#.to_string())).await;
        let mut ui = ui();

        let outcome = search_devices(&api, &mut ui, "cb-1").await;

        assert_eq!(outcome, FetchOutcome::Failed);
        assert!(!ui.data().devices.is_loading());
        let shown = ui.data().devices.error().unwrap();
        assert_eq!(shown, "Error: x");
        let toast = ui.last_toast().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert!(toast.message.contains('x'));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_recording() {
        let api = serve(|_| ("200 OK", "{}".to_string())).await;
        let mut ui = ui();

        assert_eq!(search_devices(&api, &mut ui, "   ").await, FetchOutcome::Rejected);
        assert_eq!(search_users(&api, &mut ui, "").await, FetchOutcome::Rejected);

        assert!(ui.recent_searches().is_empty());
        assert_eq!(ui.toasts().len(), 2);
        assert!(ui.toasts().iter().all(|t| t.level == ToastLevel::Warning));
        assert_eq!(ui.data().devices, PanelState::Idle);
    }

    #[tokio::test]
    async fn device_results_are_normalized() {
        let api = serve(|_| {
            (
                "200 OK",
                r#"{"devices": [{"asset_tag": "CB-1", "deviceType": "Chromebooks", "status": "ACTIVE"}], "count": 1}"#
                    .to_string(),
            )
        })
        .await;
        let mut ui = ui();

        assert_eq!(search_devices(&api, &mut ui, " CB-1 ").await, FetchOutcome::Loaded(1));
        let devices = ui.data().devices.ready().unwrap();
        assert_eq!(devices[0].asset_tag.as_deref(), Some("CB-1"));
        assert_eq!(ui.search_info(), ["1 device(s) found"]);
        assert_eq!(ui.recent_searches()[0].query, "CB-1");
    }

    #[tokio::test]
    async fn empty_user_results_show_empty_state() {
        let api = serve(|_| ("200 OK", r#"{"users": [], "count": 0}"#.to_string())).await;
        let mut ui = ui();

        assert_eq!(search_users(&api, &mut ui, "nobody").await, FetchOutcome::Empty);
        assert_eq!(ui.data().users, PanelState::Empty(NO_USERS.to_string()));
        assert_eq!(ui.active_tab(), Tab::Users);
    }

    #[tokio::test]
    async fn advanced_search_needs_a_filter_and_tags_chromebooks() {
        let api = serve(|line| {
            assert!(line.contains("battery_min=0"));
            (
                "200 OK",
                r#"{"devices": [{"serialNumber": "5CD1"}], "total_count": 1}"#.to_string(),
            )
        })
        .await;
        let mut ui = ui();

        let none = AdvancedSearchFilters::default();
        assert_eq!(advanced_search(&api, &mut ui, &none).await, FetchOutcome::Rejected);
        assert_eq!(ui.last_toast().unwrap().message, NO_FILTERS);

        let filters = AdvancedSearchFilters {
            battery: Some(crate::model::BatteryRange { min: 0, max: 30 }),
            ..Default::default()
        };
        assert_eq!(advanced_search(&api, &mut ui, &filters).await, FetchOutcome::Loaded(1));
        let devices = ui.data().devices.ready().unwrap();
        assert!(devices[0].is_chromebook());
        assert_eq!(ui.search_info()[1], "Filters: Battery: 0-30%");
    }

    #[tokio::test]
    async fn initialize_settles_every_panel() {
        let api = serve(|line| {
            if line.contains("/api/dashboard/stats") {
                (
                    "200 OK",
                    r#"{"total_devices": 10, "active": 8, "disabled": 1, "deprovisioned": 1}"#
                        .to_string(),
                )
            } else if line.contains("aue-expiration") {
                ("503 Service Unavailable", r#"{"detail": "cache cold"}"#.to_string())
            } else {
                ("200 OK", r#"{"devModeCount": 2, "totalAlerts": 2}"#.to_string())
            }
        })
        .await;
        let mut ui = ui();

        initialize(&api, &mut ui, true).await;

        let data = ui.data();
        assert_eq!(data.stats.ready().unwrap().total_devices, 10);
        assert_eq!(data.aue.error(), Some("Error: cache cold"));
        assert_eq!(data.security.ready().unwrap().dev_mode_count, 2);
    }

    #[tokio::test]
    async fn refresh_failure_leaves_widgets_in_error() {
        let api = serve(|_| ("500 Internal Server Error", r#"{"detail": "cache busy"}"#.to_string())).await;
        let mut ui = ui();

        assert!(!refresh_widgets(&api, &mut ui).await);
        assert_eq!(ui.data().aue.error(), Some("Error: cache busy"));
        assert_eq!(ui.data().security.error(), Some("Error: cache busy"));
        assert_eq!(
            ui.last_toast().unwrap().message,
            "Failed to refresh dashboard widgets"
        );
    }

    #[tokio::test]
    async fn refresh_refetches_with_force_flag() {
        let api = serve(|line| {
            if line.starts_with("POST") {
                ("200 OK", r#"{"status": "ok"}"#.to_string())
            } else if line.contains("force_refresh=true") {
                ("200 OK", "{}".to_string())
            } else {
                ("400 Bad Request", r#"{"detail": "missing force flag"}"#.to_string())
            }
        })
        .await;
        let mut ui = ui();

        assert!(refresh_widgets(&api, &mut ui).await);
        assert!(ui.data().aue.ready().is_some());
        assert!(ui.data().security.ready().is_some());
    }

    #[tokio::test]
    async fn rerun_dispatches_on_kind() {
        let api = serve(|line| {
            if line.contains("/api/user/search") {
                ("200 OK", r#"{"users": [{"email": "ada@example.org"}], "count": 1}"#.to_string())
            } else {
                ("200 OK", r#"{"devices": [], "count": 0}"#.to_string())
            }
        })
        .await;
        let mut ui = ui();
        ui.record_search("ada", SearchKind::User);

        assert_eq!(rerun(&api, &mut ui, 0).await, FetchOutcome::Loaded(1));
        assert_eq!(rerun(&api, &mut ui, 5).await, FetchOutcome::Rejected);
        assert_eq!(ui.last_toast().unwrap().message, "No recent search #6");
    }
}
