pub mod report;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::history::RecentSearch;
use crate::model::{DeviceRecord, PanelState, UserRecord};
use crate::render::badges::BatteryTier;
use crate::render::format::{format_count, format_fee, format_percent, or_na};
use crate::render::RenderContext;
use crate::storage::KeyValueStore;
use crate::ui::toast::Toast;
use crate::ui::{DashboardData, Tab, UiController};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Everything one rendered page shows, detached from the controller.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub active_tab: Tab,
    pub hero_collapsed: bool,
    pub search_info: Vec<String>,
    pub recent_searches: Vec<RecentSearch>,
    #[serde(flatten)]
    pub data: DashboardData,
    pub toasts: Vec<Toast>,
}

impl DashboardSnapshot {
    pub fn capture<S: KeyValueStore>(ui: &UiController<S>) -> Self {
        Self {
            generated_at: Utc::now(),
            active_tab: ui.active_tab(),
            hero_collapsed: ui.hero_collapsed(),
            search_info: ui.search_info().to_vec(),
            recent_searches: ui.recent_searches(),
            data: ui.data().clone(),
            toasts: ui.toasts().to_vec(),
        }
    }

    /// Year the AUE tiles are classed against when the payload omits it.
    pub fn current_year(&self) -> i32 {
        self.generated_at.year()
    }
}

fn kv_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(":: {:<10}: {}\n", label, value));
}

fn state_summary<T>(state: &PanelState<T>, ready: impl FnOnce(&T) -> String) -> String {
    match state {
        PanelState::Ready(value) => ready(value),
        PanelState::Failed(message) => message.clone(),
        PanelState::Empty(message) => message.clone(),
        PanelState::Loading => "loading".to_string(),
        PanelState::Idle => "not loaded".to_string(),
    }
}

fn device_line(device: &DeviceRecord) -> String {
    let mut parts = vec![
        or_na(&device.asset_tag).to_string(),
        or_na(&device.serial_number).to_string(),
        or_na(&device.model).to_string(),
        or_na(&device.status).to_string(),
    ];
    if let Some(health) = device.battery_health.filter(|_| device.is_chromebook()) {
        parts.push(format!(
            "battery {} ({})",
            format_percent(health),
            BatteryTier::classify(health).name()
        ));
    }
    if let Some(owner) = device
        .iiq_owner_email
        .as_deref()
        .or(device.annotated_user.as_deref())
    {
        parts.push(owner.to_string());
    }
    parts.join("  ")
}

fn user_line(user: &UserRecord) -> String {
    let mut line = format!("{} <{}>", or_na(&user.full_name), or_na(&user.email));
    line.push_str(&format!(
        "  {} assigned, {} recent",
        user.assigned_count.unwrap_or(user.assigned_devices.len() as u64),
        user.recent_count.unwrap_or(user.recent_devices.len() as u64)
    ));
    if let Some(fee) = user.fee_balance.filter(|f| *f != 0.0) {
        line.push_str(&format!("  fee {}", format_fee(fee)));
    }
    line
}

pub fn render_text(snapshot: &DashboardSnapshot) -> Vec<u8> {
    let data = &snapshot.data;
    let mut out = String::new();

    kv_line(&mut out, "Tab", snapshot.active_tab.label());
    kv_line(
        &mut out,
        "Devices",
        &state_summary(&data.stats, |s| {
            format!(
                "{} total, {} active, {} disabled, {} deprovisioned",
                format_count(s.total_devices),
                format_count(s.active),
                format_count(s.disabled),
                format_count(s.deprovisioned)
            )
        }),
    );
    kv_line(
        &mut out,
        "AUE",
        &state_summary(&data.aue, |a| {
            let years = a
                .years
                .iter()
                .map(|y| format!("{}: {}", y.year, format_count(y.count)))
                .collect::<Vec<_>>();
            if years.is_empty() {
                format!("{} expired", format_count(a.expired_count))
            } else {
                format!("{} expired; {}", format_count(a.expired_count), years.join(", "))
            }
        }),
    );
    kv_line(
        &mut out,
        "Security",
        &state_summary(&data.security, |s| {
            format!(
                "dev mode {}, poor battery {}, pending repairs {}, total {}",
                s.dev_mode_count, s.poor_battery_count, s.pending_repairs_count, s.total_alerts
            )
        }),
    );
    for line in &snapshot.search_info {
        kv_line(&mut out, "Search", line);
    }

    match &data.devices {
        PanelState::Ready(devices) => {
            out.push_str("\nDevices:\n");
            for device in devices {
                out.push_str(&format!("  {}\n", device_line(device)));
            }
        }
        PanelState::Idle => {}
        other => kv_line(&mut out, "Results", &state_summary(other, |_| String::new())),
    }

    match &data.users {
        PanelState::Ready(users) => {
            out.push_str("\nUsers:\n");
            for user in users {
                out.push_str(&format!("  {}\n", user_line(user)));
            }
        }
        PanelState::Idle => {}
        other => kv_line(&mut out, "Users", &state_summary(other, |_| String::new())),
    }

    if !snapshot.recent_searches.is_empty() {
        out.push_str("\nRecent searches:\n");
        for (i, entry) in snapshot.recent_searches.iter().enumerate() {
            out.push_str(&format!(
                "  {:>2}. [{}] {}  {}\n",
                i + 1,
                entry.kind.label(),
                entry.query,
                entry.timestamp.format("%Y-%m-%d %H:%M UTC")
            ));
        }
    }

    out.into_bytes()
}

pub fn render_json(snapshot: &DashboardSnapshot) -> Vec<u8> {
    serde_json::to_vec_pretty(snapshot).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(snapshot: &DashboardSnapshot, ctx: &RenderContext) -> Vec<u8> {
    report::render_html(snapshot, ctx)
}

pub fn render(format: OutputFormat, snapshot: &DashboardSnapshot, ctx: &RenderContext) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(snapshot),
        OutputFormat::Json => render_json(snapshot),
        OutputFormat::Html => render_html(snapshot, ctx),
    }
}
