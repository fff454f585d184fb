use crate::model::{AueExpiration, AueYear, DashboardStats, PanelState, SecurityAlerts};

use super::format::{format_count, format_timestamp};
use super::html::{el, Element, Node};

pub const ERROR_TEXT: &str = "Error";
const LOADING_TEXT: &str = "...";
const NOT_LOADED_TEXT: &str = "-";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AueTileClass {
    CurrentYear,
    NearFuture,
    FarFuture,
}

impl AueTileClass {
    /// Years already past also count as near future.
    pub fn classify(year: i32, current_year: i32) -> Self {
        let diff = year - current_year;
        if diff == 0 {
            Self::CurrentYear
        } else if diff <= 2 {
            Self::NearFuture
        } else {
            Self::FarFuture
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::CurrentYear => "current-year",
            Self::NearFuture => "near-future",
            Self::FarFuture => "far-future",
        }
    }
}

fn stat(id: &'static str, label: &str, value: String) -> Element {
    el("div")
        .class("stat-card")
        .child(el("div").class("stat-value").id(id).text(value))
        .child(el("div").class("stat-label").text(label))
}

fn counter<T>(state: &PanelState<T>, pick: impl Fn(&T) -> u64) -> String {
    match state {
        PanelState::Ready(value) => format_count(pick(value)),
        PanelState::Failed(_) => ERROR_TEXT.to_string(),
        PanelState::Empty(_) => "0".to_string(),
        PanelState::Loading => LOADING_TEXT.to_string(),
        PanelState::Idle => NOT_LOADED_TEXT.to_string(),
    }
}

pub fn stats_widget(state: &PanelState<DashboardStats>) -> Node {
    let sync = state
        .ready()
        .and_then(|s| s.last_sync.clone())
        .map(|ts| {
            el("div")
                .class("stats-last-sync")
                .text(format!("Last sync: {}", format_timestamp(&Some(ts))))
        });
    el("div")
        .class("stats-grid")
        .id("deviceStats")
        .child(stat(
            "totalDevices",
            "Total Devices",
            counter(state, |s| s.total_devices),
        ))
        .child(stat("activeDevices", "Active", counter(state, |s| s.active)))
        .child(stat(
            "disabledDevices",
            "Disabled",
            counter(state, |s| s.disabled),
        ))
        .child(stat(
            "deprovisionedDevices",
            "Deprovisioned",
            counter(state, |s| s.deprovisioned),
        ))
        .child_opt(sync)
        .into()
}

fn aue_tile(year: &AueYear, current_year: i32) -> Node {
    let class = AueTileClass::classify(year.year, current_year);
    let plural = if year.count == 1 { "" } else { "s" };
    el("div")
        .class(format!("aue-year-tile {}", class.css_class()))
        .child(el("div").class("aue-year-count").text(format_count(year.count)))
        .child(el("div").class("aue-year-label").text(year.year.to_string()))
        .child(
            el("div")
                .class("aue-tooltip")
                .child(el("div").class("aue-tooltip-header").text(format!(
                    "{} device{plural} expiring in {}",
                    format_count(year.count),
                    year.year
                )))
                .child(
                    el("div").class("aue-tooltip-models").children(year.models.iter().map(|m| {
                        el("div")
                            .class("aue-tooltip-model")
                            .text(format!("{} | {}", format_count(m.count), m.model))
                    })),
                ),
        )
        .into()
}

/// `fallback_year` is used when the payload does not carry its own current year.
pub fn aue_widget(state: &PanelState<AueExpiration>, fallback_year: i32) -> Node {
    let tiles = match state {
        PanelState::Ready(data) if !data.years.is_empty() => {
            let current = data.current_year.unwrap_or(fallback_year);
            el("div")
                .class("aue-years")
                .id("aueYearsContainer")
                .children(data.years.iter().map(|y| aue_tile(y, current)))
        }
        PanelState::Ready(_) | PanelState::Empty(_) => el("div")
            .class("aue-years")
            .id("aueYearsContainer")
            .child(el("div").class("aue-loading").text("No AUE data available")),
        PanelState::Failed(_) => el("div")
            .class("aue-years")
            .id("aueYearsContainer")
            .child(
                el("div")
                    .class("aue-loading aue-error")
                    .text("Error loading AUE data"),
            ),
        PanelState::Loading => el("div")
            .class("aue-years")
            .id("aueYearsContainer")
            .child(el("div").class("aue-loading").text("Loading AUE data...")),
        PanelState::Idle => el("div")
            .class("aue-years")
            .id("aueYearsContainer")
            .child(el("div").class("aue-idle").text("AUE data not loaded")),
    };

    el("div")
        .class("widget widget-aue")
        .child(el("h3").class("widget-title").text("Auto Update Expiration"))
        .child(
            el("div")
                .class("aue-expired")
                .child(el("span").text("Already expired: "))
                .child(
                    el("span")
                        .id("aueExpiredCount")
                        .text(counter(state, |d| d.expired_count)),
                ),
        )
        .child(tiles)
        .into()
}

pub fn security_widget(state: &PanelState<SecurityAlerts>) -> Node {
    el("div")
        .class("widget widget-security")
        .child(el("h3").class("widget-title").text("Security Alerts"))
        .child(
            el("div")
                .class("stats-grid")
                .child(stat(
                    "devModeCount",
                    "Dev Mode",
                    counter(state, |a| a.dev_mode_count),
                ))
                .child(stat(
                    "poorBatteryCount",
                    "Poor Battery",
                    counter(state, |a| a.poor_battery_count),
                ))
                .child(stat(
                    "pendingRepairsCount",
                    "Pending Repairs",
                    counter(state, |a| a.pending_repairs_count),
                ))
                .child(stat(
                    "totalAlerts",
                    "Total Alerts",
                    counter(state, |a| a.total_alerts),
                )),
        )
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AueModel;

    #[test]
    fn tile_classes_follow_year_distance() {
        assert_eq!(AueTileClass::classify(2025, 2025), AueTileClass::CurrentYear);
        assert_eq!(AueTileClass::classify(2026, 2025), AueTileClass::NearFuture);
        assert_eq!(AueTileClass::classify(2027, 2025), AueTileClass::NearFuture);
        assert_eq!(AueTileClass::classify(2028, 2025), AueTileClass::FarFuture);
        assert_eq!(AueTileClass::classify(2024, 2025), AueTileClass::NearFuture);
    }

    #[test]
    fn aue_tiles_render_counts_and_models() {
        let data = AueExpiration {
            current_year: Some(2025),
            expired_count: 1200,
            years: vec![AueYear {
                year: 2025,
                count: 1,
                models: vec![AueModel {
                    model: "Dell <3100>".into(),
                    count: 1,
                }],
            }],
        };
        let html = aue_widget(&PanelState::Ready(data), 2030).render();
        assert!(html.contains("aue-year-tile current-year"));
        assert!(html.contains("1 device expiring in 2025"));
        assert!(html.contains("1 | Dell &lt;3100&gt;"));
        assert!(html.contains("1,200"));
    }

    #[test]
    fn unloaded_widgets_do_not_look_busy() {
        let html = aue_widget(&PanelState::Idle, 2025).render();
        assert!(html.contains("AUE data not loaded"));
        assert!(!html.contains("Loading"));
        assert!(html.contains("<span id=\"aueExpiredCount\">-</span>"));

        let html = security_widget(&PanelState::Idle).render();
        assert!(!html.contains(">...<"));

        let html = aue_widget(&PanelState::Loading, 2025).render();
        assert!(html.contains("Loading AUE data..."));
    }

    #[test]
    fn failed_widgets_show_error() {
        let html = security_widget(&PanelState::Failed("Error: boom".into())).render();
        assert_eq!(html.matches(">Error<").count(), 4);

        let html = aue_widget(&PanelState::Failed("Error: boom".into()), 2025).render();
        assert!(html.contains("Error loading AUE data"));
        assert!(html.contains("<span id=\"aueExpiredCount\">Error</span>"));
    }

    #[test]
    fn stats_render_totals() {
        let stats = DashboardStats {
            total_devices: 15234,
            active: 15000,
            disabled: 200,
            deprovisioned: 34,
            ..Default::default()
        };
        let html = stats_widget(&PanelState::Ready(stats)).render();
        assert!(html.contains("15,234"));
        assert!(html.contains(">34<"));
    }
}
