use crate::model::DeviceRecord;

use super::format::{format_percent, known, NOT_ASSIGNED, NOT_AVAILABLE};
use super::html::{el, Node};

pub const HIGH_CYCLE_COUNT: u64 = 500;
pub const DEGRADATION_THRESHOLD: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatteryTier {
    Critical,
    Warning,
    Fair,
    Good,
    Excellent,
}

impl BatteryTier {
    /// Strict upper bounds: 29 is critical, 30 is warning.
    pub fn classify(health: f64) -> Self {
        if health < 30.0 {
            Self::Critical
        } else if health < 50.0 {
            Self::Warning
        } else if health < 70.0 {
            Self::Fair
        } else if health < 90.0 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Critical => "badge-battery-critical",
            Self::Warning => "badge-battery-warning",
            Self::Fair => "badge-battery-fair",
            Self::Good => "badge-battery-good",
            Self::Excellent => "badge-battery-excellent",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Critical => "\u{1F534}",
            Self::Warning => "\u{26A0}\u{FE0F}",
            Self::Fair => "\u{1F7E1}",
            Self::Good => "\u{1F7E2}",
            Self::Excellent => "\u{1F50B}",
        }
    }
}

pub fn battery_badge(health: f64) -> Node {
    let tier = BatteryTier::classify(health);
    let pct = format_percent(health);
    el("span")
        .class(format!("device-badge {}", tier.css_class()))
        .attr("data-battery-tier", tier.name())
        .attr("title", format!("Battery Health: {pct}"))
        .text(format!("{} Battery: {pct}", tier.icon()))
        .into()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusStyle {
    Active,
    Disabled,
}

impl StatusStyle {
    pub fn of(status: Option<&str>) -> Self {
        match status {
            Some("ACTIVE") => Self::Active,
            _ => Self::Disabled,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Active => "badge-active",
            Self::Disabled => "badge-disabled",
        }
    }
}

pub fn status_badge(prefix: &str, status: Option<&str>) -> Node {
    let style = StatusStyle::of(status);
    let label = status.filter(|s| !s.is_empty()).unwrap_or(NOT_AVAILABLE);
    el("span")
        .class(format!("device-badge {}", style.css_class()))
        .child(el("span").class("status-indicator"))
        .child(el("span").text(format!("{prefix}{label}")))
        .into()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSource {
    Iiq,
    Google,
}

impl UserSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Iiq => "IIQ Official",
            Self::Google => "Google",
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            Self::Iiq => "field-badge badge-iiq",
            Self::Google => "field-badge badge-google",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignedUser<'a> {
    pub email: Option<&'a str>,
    pub source: Option<UserSource>,
}

impl<'a> AssignedUser<'a> {
    /// IIQ owner email outranks the annotated user.
    pub fn resolve(device: &'a DeviceRecord) -> Self {
        if let Some(email) = known(&device.iiq_owner_email) {
            return Self {
                email: Some(email),
                source: Some(UserSource::Iiq),
            };
        }
        match known(&device.annotated_user).filter(|u| !u.eq_ignore_ascii_case(NOT_ASSIGNED)) {
            Some(user) => Self {
                email: Some(user),
                source: Some(UserSource::Google),
            },
            None => Self {
                email: None,
                source: None,
            },
        }
    }

    pub fn display(&self) -> &'a str {
        self.email.unwrap_or(NOT_ASSIGNED)
    }
}

pub fn user_source_badge(source: Option<UserSource>) -> Option<Node> {
    source.map(|s| el("span").class(s.css_class()).text(s.label()).into())
}

pub fn has_user_mismatch(device: &DeviceRecord) -> bool {
    if !device.is_chromebook() {
        return false;
    }
    let Some(last_known) = known(&device.last_known_user) else {
        return false;
    };
    match AssignedUser::resolve(device).email {
        Some(assigned) => !assigned.eq_ignore_ascii_case(last_known),
        None => false,
    }
}

/// Percent of design capacity lost, when both capacities are reported.
pub fn capacity_degradation(device: &DeviceRecord) -> Option<i64> {
    let design = device.battery_design_capacity.filter(|d| *d > 0)?;
    let full = device.battery_full_charge_capacity?;
    Some(((1.0 - full as f64 / design as f64) * 100.0).round() as i64)
}

pub fn significant_degradation(device: &DeviceRecord) -> Option<i64> {
    capacity_degradation(device).filter(|loss| *loss > DEGRADATION_THRESHOLD)
}

pub fn is_high_cycle_count(cycles: u64) -> bool {
    cycles > HIGH_CYCLE_COUNT
}

pub fn is_dev_boot_mode(mode: Option<&str>) -> bool {
    mode == Some("Dev")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CHROMEBOOK_TYPE;

    #[test]
    fn battery_tier_boundaries_are_strict() {
        let cases = [
            (0.0, BatteryTier::Critical),
            (29.0, BatteryTier::Critical),
            (29.9, BatteryTier::Critical),
            (30.0, BatteryTier::Warning),
            (49.0, BatteryTier::Warning),
            (50.0, BatteryTier::Fair),
            (69.0, BatteryTier::Fair),
            (70.0, BatteryTier::Good),
            (89.0, BatteryTier::Good),
            (90.0, BatteryTier::Excellent),
            (100.0, BatteryTier::Excellent),
        ];
        for (health, tier) in cases {
            assert_eq!(BatteryTier::classify(health), tier, "health {health}");
        }
    }

    #[test]
    fn absent_status_is_disabled() {
        assert_eq!(StatusStyle::of(None), StatusStyle::Disabled);
        assert_eq!(StatusStyle::of(Some("active")), StatusStyle::Disabled);
        assert_eq!(StatusStyle::of(Some("ACTIVE")), StatusStyle::Active);
        let html = status_badge("Google: ", None).render();
        assert!(html.contains("badge-disabled"));
        assert!(html.contains("Google: N/A"));
    }

    #[test]
    fn iiq_owner_outranks_annotated_user() {
        let device = DeviceRecord {
            iiq_owner_email: Some("owner@x.org".into()),
            annotated_user: Some("other@x.org".into()),
            ..Default::default()
        };
        let user = AssignedUser::resolve(&device);
        assert_eq!(user.email, Some("owner@x.org"));
        assert_eq!(user.source, Some(UserSource::Iiq));

        let google_only = DeviceRecord {
            annotated_user: Some("other@x.org".into()),
            ..Default::default()
        };
        assert_eq!(
            AssignedUser::resolve(&google_only).source,
            Some(UserSource::Google)
        );

        let nobody = DeviceRecord::default();
        let user = AssignedUser::resolve(&nobody);
        assert_eq!(user.source, None);
        assert_eq!(user.display(), "Not assigned");
    }

    #[test]
    fn mismatch_only_for_chromebooks_with_different_users() {
        let mut device = DeviceRecord {
            device_type: Some(CHROMEBOOK_TYPE.into()),
            iiq_owner_email: Some("Owner@x.org".into()),
            last_known_user: Some("owner@X.org".into()),
            ..Default::default()
        };
        assert!(!has_user_mismatch(&device));

        device.last_known_user = Some("someone@x.org".into());
        assert!(has_user_mismatch(&device));

        device.last_known_user = Some("N/A".into());
        assert!(!has_user_mismatch(&device));

        device.last_known_user = Some("someone@x.org".into());
        device.device_type = Some("iPads".into());
        assert!(!has_user_mismatch(&device));

        let unassigned = DeviceRecord {
            device_type: Some(CHROMEBOOK_TYPE.into()),
            annotated_user: Some("Not assigned".into()),
            last_known_user: Some("someone@x.org".into()),
            ..Default::default()
        };
        assert!(!has_user_mismatch(&unassigned));
    }

    #[test]
    fn degradation_shown_above_ten_percent() {
        let mut device = DeviceRecord {
            battery_design_capacity: Some(5000),
            battery_full_charge_capacity: Some(4500),
            ..Default::default()
        };
        assert_eq!(capacity_degradation(&device), Some(10));
        assert_eq!(significant_degradation(&device), None);

        device.battery_full_charge_capacity = Some(4000);
        assert_eq!(significant_degradation(&device), Some(20));

        device.battery_design_capacity = Some(0);
        assert_eq!(capacity_degradation(&device), None);
    }
}
