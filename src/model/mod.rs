use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Device type literal that enables the Chromebook-only fields.
pub const CHROMEBOOK_TYPE: &str = "Chromebooks";

/// Canonical device shape produced by [`crate::normalize`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeviceRecord {
    pub asset_tag: Option<String>,
    pub serial_number: Option<String>,
    pub device_id: Option<String>,
    pub iiq_asset_id: Option<String>,
    pub device_type: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
    pub iiq_status: Option<String>,
    pub iiq_owner_name: Option<String>,
    pub iiq_owner_email: Option<String>,
    pub iiq_owner_student_id: Option<String>,
    pub annotated_user: Option<String>,
    pub user_full_name: Option<String>,
    pub last_known_user: Option<String>,
    pub location: Option<String>,
    pub room: Option<String>,
    pub annotated_location: Option<String>,
    pub org_unit_path: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub wan_ip_address: Option<String>,
    pub os_version: Option<String>,
    pub last_sync: Option<String>,
    pub last_used_date: Option<String>,
    pub auto_update_expiration: Option<String>,
    pub boot_mode: Option<String>,
    pub battery_health: Option<f64>,
    pub battery_cycle_count: Option<u64>,
    pub battery_design_capacity: Option<u64>,
    pub battery_full_charge_capacity: Option<u64>,
    pub meraki_ap_name: Option<String>,
    pub meraki_network: Option<String>,
    pub meraki_last_seen: Option<String>,
    pub meraki_note: Option<String>,
    pub meraki_newer: Option<bool>,
    pub student_grade: Option<String>,
    pub recent_users: Vec<String>,
}

impl DeviceRecord {
    pub fn is_chromebook(&self) -> bool {
        self.device_type.as_deref() == Some(CHROMEBOOK_TYPE)
    }

    /// Location as shown on cards: IIQ location first, then the annotated one.
    pub fn display_location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .or(self.annotated_location.as_deref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserRecord {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub is_student: bool,
    pub student_id: Option<String>,
    pub fee_balance: Option<f64>,
    pub location: Option<String>,
    pub grade: Option<String>,
    pub org_unit: Option<String>,
    pub is_active: bool,
    pub assigned_count: Option<u64>,
    pub recent_count: Option<u64>,
    pub assigned_devices: Vec<DeviceRecord>,
    pub recent_devices: Vec<DeviceRecord>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_devices: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub disabled: u64,
    #[serde(default)]
    pub deprovisioned: u64,
    #[serde(default)]
    pub provisioned: Option<u64>,
    #[serde(default)]
    pub last_sync: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AueExpiration {
    #[serde(default)]
    pub current_year: Option<i32>,
    #[serde(default)]
    pub expired_count: u64,
    #[serde(default)]
    pub years: Vec<AueYear>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AueYear {
    pub year: i32,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub models: Vec<AueModel>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AueModel {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlerts {
    #[serde(default)]
    pub dev_mode_count: u64,
    #[serde(default)]
    pub poor_battery_count: u64,
    #[serde(default)]
    pub pending_repairs_count: u64,
    #[serde(default)]
    pub total_alerts: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeviceSearchResponse {
    #[serde(default)]
    pub devices: Vec<Value>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdvancedSearchResponse {
    #[serde(default)]
    pub devices: Vec<Value>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserSearchResponse {
    #[serde(default)]
    pub users: Vec<Value>,
    #[serde(default)]
    pub count: u64,
}

/// Lifecycle of one dashboard panel. Every fetch ends in `Empty`, `Ready` or `Failed`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum PanelState<T> {
    Idle,
    Loading,
    Empty(String),
    Ready(T),
    Failed(String),
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> PanelState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Empty(_) => "empty",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatteryRange {
    pub min: u8,
    pub max: u8,
}

impl BatteryRange {
    /// Parses `MIN-MAX` percentages, e.g. `0-30`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (min, max) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| "expected MIN-MAX".to_string())?;
        let min: u8 = min
            .trim()
            .parse()
            .map_err(|_| format!("invalid minimum '{}'", min.trim()))?;
        let max: u8 = max
            .trim()
            .parse()
            .map_err(|_| format!("invalid maximum '{}'", max.trim()))?;
        if min > max || max > 100 {
            return Err("expected 0 <= MIN <= MAX <= 100".to_string());
        }
        Ok(Self { min, max })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvancedSearchFilters {
    pub status: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub org_unit: Option<String>,
    pub boot_mode: Option<String>,
    pub aue_year: Option<i32>,
    pub repair_status: Option<String>,
    pub battery: Option<BatteryRange>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AdvancedSearchFilters {
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query-string parameters for the filters that are set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let text = [
            ("status", &self.status),
            ("model", &self.model),
            ("location", &self.location),
            ("org_unit", &self.org_unit),
            ("boot_mode", &self.boot_mode),
        ];
        for (name, value) in text {
            if let Some(v) = non_empty(value) {
                pairs.push((name, v.to_string()));
            }
        }
        if let Some(year) = self.aue_year {
            pairs.push(("aue_year", year.to_string()));
        }
        if let Some(v) = non_empty(&self.repair_status) {
            pairs.push(("repair_status", v.to_string()));
        }
        if let Some(range) = self.battery {
            pairs.push(("battery_min", range.min.to_string()));
            pairs.push(("battery_max", range.max.to_string()));
        }
        pairs
    }

    /// Human-readable summary of the active filters.
    pub fn describe(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(v) = non_empty(&self.status) {
            out.push(format!("Status: {v}"));
        }
        if let Some(v) = non_empty(&self.model) {
            out.push(format!("Model: {v}"));
        }
        if let Some(v) = non_empty(&self.location) {
            out.push(format!("Location: {v}"));
        }
        if let Some(v) = non_empty(&self.org_unit) {
            out.push(format!("Org Unit: {v}"));
        }
        if let Some(range) = self.battery {
            out.push(format!("Battery: {}-{}%", range.min, range.max));
        }
        if let Some(v) = non_empty(&self.boot_mode) {
            out.push(format!("Boot: {v}"));
        }
        if let Some(year) = self.aue_year {
            out.push(format!("AUE: {year}"));
        }
        if let Some(v) = non_empty(&self.repair_status) {
            out.push(format!("Repair: {v}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_range_parses_and_rejects() {
        assert_eq!(
            BatteryRange::parse("30-50").unwrap(),
            BatteryRange { min: 30, max: 50 }
        );
        assert!(BatteryRange::parse("50").is_err());
        assert!(BatteryRange::parse("60-30").is_err());
        assert!(BatteryRange::parse("0-101").is_err());
        assert!(BatteryRange::parse("a-10").is_err());
    }

    #[test]
    fn blank_filters_are_skipped() {
        let filters = AdvancedSearchFilters {
            status: Some("  ".to_string()),
            model: Some("Chromebook 3100".to_string()),
            battery: Some(BatteryRange { min: 0, max: 30 }),
            ..Default::default()
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("model", "Chromebook 3100".to_string()),
                ("battery_min", "0".to_string()),
                ("battery_max", "30".to_string()),
            ]
        );
        assert!(!filters.is_empty());
        assert!(AdvancedSearchFilters::default().is_empty());
    }

    #[test]
    fn aue_payload_decodes_camel_case() {
        let data: AueExpiration = serde_json::from_str(
            r#"{"currentYear": 2025, "expiredCount": 12,
                "years": [{"year": 2026, "count": 3, "models": [{"count": 3, "model": "Dell 3100"}]}]}"#,
        )
        .unwrap();
        assert_eq!(data.current_year, Some(2025));
        assert_eq!(data.expired_count, 12);
        assert_eq!(data.years[0].models[0].model, "Dell 3100");
    }
}
