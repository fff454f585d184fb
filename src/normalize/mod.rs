//! Maps the two backend naming conventions onto the canonical records.
//!
//! The simple search endpoint answers in camelCase, the advanced search in
//! snake_case, and a few fields carry legacy names. Each canonical field lists
//! its source keys in precedence order; the first key holding a present value
//! (not `null`, not `""`) wins. Nothing is validated: a value of the wrong
//! JSON type simply leaves the field empty.

use serde_json::{Map, Value};

use crate::model::{DeviceRecord, UserRecord, CHROMEBOOK_TYPE};

#[derive(Clone, Copy, Debug)]
pub struct FieldAliases {
    pub canonical: &'static str,
    pub sources: &'static [&'static str],
}

const fn alias(canonical: &'static str, sources: &'static [&'static str]) -> FieldAliases {
    FieldAliases { canonical, sources }
}

pub const DEVICE_FIELDS: &[FieldAliases] = &[
    alias("asset_tag", &["assetTag", "asset_tag"]),
    alias("serial_number", &["serialNumber", "serial_number"]),
    alias("device_id", &["deviceId", "device_id"]),
    alias("iiq_asset_id", &["assetId", "iiqAssetId", "iiq_asset_id"]),
    alias("device_type", &["deviceType", "device_type"]),
    alias("model", &["model"]),
    alias("status", &["googleStatus", "status"]),
    alias("iiq_status", &["iiqStatus", "iiq_status"]),
    alias("iiq_owner_name", &["iiqOwnerName", "iiq_owner_name"]),
    alias("iiq_owner_email", &["iiqOwnerEmail", "iiq_owner_email"]),
    alias(
        "iiq_owner_student_id",
        &["iiqOwnerStudentId", "iiq_owner_student_id", "student_id"],
    ),
    alias("annotated_user", &["assignedUser", "annotated_user"]),
    alias("user_full_name", &["userFullName", "user_full_name"]),
    alias("last_known_user", &["lastKnownUser", "last_known_user"]),
    alias("location", &["iiqLocation", "location", "iiq_location"]),
    alias("room", &["iiqRoom", "room", "iiq_room"]),
    alias("annotated_location", &["annotatedLocation", "annotated_location"]),
    alias("org_unit_path", &["orgUnitPath", "org_unit_path"]),
    alias("mac_address", &["macAddress", "mac_address"]),
    alias("ip_address", &["ipAddress", "ip_address"]),
    alias("wan_ip_address", &["wanIpAddress", "wan_ip_address"]),
    alias("os_version", &["osVersion", "os_version"]),
    alias("last_sync", &["lastSync", "last_sync", "updated_at"]),
    alias("last_used_date", &["lastUsedDate", "last_used_date"]),
    alias("auto_update_expiration", &["aueDate", "auto_update_expiration"]),
    alias("boot_mode", &["bootMode", "boot_mode"]),
    alias("battery_health", &["batteryHealth", "battery_health"]),
    alias("battery_cycle_count", &["batteryCycleCount", "battery_cycle_count"]),
    alias(
        "battery_design_capacity",
        &["batteryDesignCapacity", "battery_design_capacity"],
    ),
    alias(
        "battery_full_charge_capacity",
        &["batteryFullChargeCapacity", "battery_full_charge_capacity"],
    ),
    alias("meraki_ap_name", &["merakiApName", "meraki_ap_name"]),
    alias("meraki_network", &["merakiNetwork", "meraki_network"]),
    alias(
        "meraki_last_seen",
        &["merakiLastSeen", "meraki_last_seen", "last_seen_meraki"],
    ),
    alias("meraki_note", &["merakiNote", "meraki_note"]),
    alias("meraki_newer", &["merakiNewer", "meraki_newer"]),
    alias("student_grade", &["studentGrade", "student_grade"]),
    alias("recent_users", &["recentUsers", "recent_users"]),
];

pub const USER_FIELDS: &[FieldAliases] = &[
    alias("full_name", &["fullName", "full_name"]),
    alias("email", &["email"]),
    alias("user_id", &["userId", "user_id"]),
    alias("is_student", &["isStudent", "is_student"]),
    alias("student_id", &["studentId", "student_id"]),
    alias("fee_balance", &["feeBalance", "fee_balance", "total_fee_balance"]),
    alias("location", &["location", "iiq_location"]),
    alias("grade", &["grade", "student_grade"]),
    alias("org_unit", &["googleOrgUnit", "org_unit_path"]),
    alias("is_active", &["isActive", "is_active"]),
    alias("assigned_count", &["iiqAssignedCount", "iiq_assigned_count"]),
    alias("recent_count", &["googleRecentCount", "google_recent_count"]),
    alias(
        "assigned_devices",
        &["iiqAssignedDevices", "iiq_assigned_devices"],
    ),
    alias(
        "recent_devices",
        &["googleRecentDevices", "google_recent_devices"],
    ),
];

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

struct Fields<'a> {
    object: Option<&'a Map<String, Value>>,
    table: &'static [FieldAliases],
}

impl<'a> Fields<'a> {
    fn new(value: &'a Value, table: &'static [FieldAliases]) -> Self {
        Self {
            object: value.as_object(),
            table,
        }
    }

    fn pick(&self, canonical: &str) -> Option<&'a Value> {
        let object = self.object?;
        let sources = self
            .table
            .iter()
            .find(|f| f.canonical == canonical)
            .map(|f| f.sources)
            .unwrap_or_default();
        debug_assert!(!sources.is_empty(), "no aliases for '{canonical}'");
        sources
            .iter()
            .filter_map(|key| object.get(*key))
            .find(|value| is_present(value))
    }

    fn text(&self, canonical: &str) -> Option<String> {
        match self.pick(canonical)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn number(&self, canonical: &str) -> Option<f64> {
        match self.pick(canonical)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
    }

    fn count(&self, canonical: &str) -> Option<u64> {
        self.number(canonical)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u64)
    }

    fn flag(&self, canonical: &str) -> Option<bool> {
        match self.pick(canonical)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn users(&self, canonical: &str) -> Vec<String> {
        let Some(Value::Array(items)) = self.pick(canonical) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(o) => o.get("email").and_then(Value::as_str),
                _ => None,
            })
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn devices(&self, canonical: &str) -> Vec<DeviceRecord> {
        match self.pick(canonical) {
            Some(Value::Array(items)) => normalize_devices(items),
            _ => Vec::new(),
        }
    }
}

pub fn normalize_device(value: &Value) -> DeviceRecord {
    let f = Fields::new(value, DEVICE_FIELDS);
    DeviceRecord {
        asset_tag: f.text("asset_tag"),
        serial_number: f.text("serial_number"),
        device_id: f.text("device_id"),
        iiq_asset_id: f.text("iiq_asset_id"),
        device_type: f.text("device_type"),
        model: f.text("model"),
        status: f.text("status"),
        iiq_status: f.text("iiq_status"),
        iiq_owner_name: f.text("iiq_owner_name"),
        iiq_owner_email: f.text("iiq_owner_email"),
        iiq_owner_student_id: f.text("iiq_owner_student_id"),
        annotated_user: f.text("annotated_user"),
        user_full_name: f.text("user_full_name"),
        last_known_user: f.text("last_known_user"),
        location: f.text("location"),
        room: f.text("room"),
        annotated_location: f.text("annotated_location"),
        org_unit_path: f.text("org_unit_path"),
        mac_address: f.text("mac_address"),
        ip_address: f.text("ip_address"),
        wan_ip_address: f.text("wan_ip_address"),
        os_version: f.text("os_version"),
        last_sync: f.text("last_sync"),
        last_used_date: f.text("last_used_date"),
        auto_update_expiration: f.text("auto_update_expiration"),
        boot_mode: f.text("boot_mode"),
        battery_health: f.number("battery_health"),
        battery_cycle_count: f.count("battery_cycle_count"),
        battery_design_capacity: f.count("battery_design_capacity"),
        battery_full_charge_capacity: f.count("battery_full_charge_capacity"),
        meraki_ap_name: f.text("meraki_ap_name"),
        meraki_network: f.text("meraki_network"),
        meraki_last_seen: f.text("meraki_last_seen"),
        meraki_note: f.text("meraki_note"),
        meraki_newer: f.flag("meraki_newer"),
        student_grade: f.text("student_grade"),
        recent_users: f.users("recent_users"),
    }
}

pub fn normalize_devices(values: &[Value]) -> Vec<DeviceRecord> {
    values.iter().map(normalize_device).collect()
}

pub fn normalize_user(value: &Value) -> UserRecord {
    let f = Fields::new(value, USER_FIELDS);
    UserRecord {
        full_name: f.text("full_name"),
        email: f.text("email"),
        user_id: f.text("user_id"),
        is_student: f.flag("is_student").unwrap_or(false),
        student_id: f.text("student_id"),
        fee_balance: f.number("fee_balance"),
        location: f.text("location"),
        grade: f.text("grade"),
        org_unit: f.text("org_unit"),
        is_active: f.flag("is_active").unwrap_or(false),
        assigned_count: f.count("assigned_count"),
        recent_count: f.count("recent_count"),
        assigned_devices: f.devices("assigned_devices"),
        recent_devices: tag_untyped(f.devices("recent_devices"), CHROMEBOOK_TYPE),
    }
}

/// Fills in `device_type` for records from a source that only holds one type.
pub fn tag_untyped(mut devices: Vec<DeviceRecord>, device_type: &str) -> Vec<DeviceRecord> {
    for device in devices.iter_mut().filter(|d| d.device_type.is_none()) {
        device.device_type = Some(device_type.to_string());
    }
    devices
}

pub fn normalize_users(values: &[Value]) -> Vec<UserRecord> {
    values.iter().map(normalize_user).collect()
}
