use crate::model::DeviceRecord;

use super::badges::{
    battery_badge, has_user_mismatch, is_dev_boot_mode, is_high_cycle_count,
    significant_degradation, status_badge, user_source_badge, AssignedUser, BatteryTier,
};
use super::format::{
    format_aue, format_date, format_percent, format_timestamp, known, or_na, NOT_AVAILABLE,
};
use super::html::{el, fragment, Element, Node};
use super::RenderContext;

pub const MAX_RECENT_USERS: usize = 5;

const ICON_TAG: &str = "\u{1F3F7}\u{FE0F}";
const ICON_LAPTOP: &str = "\u{1F4BB}";
const ICON_TABLET: &str = "\u{1F4F1}";

pub(crate) fn field(icon: &str, label: &str, value: impl Into<Node>) -> Node {
    el("div")
        .class("device-field")
        .child(
            el("div")
                .class("field-label")
                .child(el("span").class("field-icon").text(icon))
                .child(el("span").text(label)),
        )
        .child(el("div").class("field-value").child(value))
        .into()
}

fn secondary(value: impl Into<String>) -> Element {
    el("div").class("field-value-secondary").text(value)
}

/// Copy button consumed by the page script through its `data-copy-*` attributes.
pub(crate) fn copy_button(label: &str, value: &str, caption: &str) -> Node {
    el("button")
        .class("quick-action-btn-compact copy-btn")
        .attr("type", "button")
        .attr("data-copy-label", label)
        .attr("data-copy-value", value)
        .attr("title", format!("Copy {}", label.to_lowercase()))
        .text(caption)
        .into()
}

pub(crate) fn external_link(href: String, title: &str, caption: &str) -> Node {
    el("a")
        .class("quick-action-btn-compact")
        .attr("href", href)
        .attr("target", "_blank")
        .attr("rel", "noopener noreferrer")
        .attr("title", title)
        .text(caption)
        .into()
}

fn quick_actions(device: &DeviceRecord, ctx: &RenderContext) -> Node {
    let google = device
        .is_chromebook()
        .then(|| ctx.links.google_device(device))
        .flatten()
        .map(|href| external_link(href, "Open in Google Admin", "Google"));
    let iiq = ctx
        .links
        .iiq_device(device)
        .map(|href| external_link(href, "Open in IncidentIQ", "IIQ"));
    let mac = known(&device.mac_address).map(|mac| copy_button("MAC", mac, "\u{1F310} MAC"));

    el("div")
        .class("quick-actions-compact")
        .child_opt(google)
        .child_opt(iiq)
        .child(copy_button(
            "Serial",
            or_na(&device.serial_number),
            "\u{1F4CB} Serial",
        ))
        .child_opt(mac)
        .child(copy_button(
            "Asset Tag",
            or_na(&device.asset_tag),
            &format!("{ICON_TAG} Asset"),
        ))
        .into()
}

fn header(device: &DeviceRecord, ctx: &RenderContext) -> Node {
    let tag = el("span").text(or_na(&device.asset_tag));
    let tag_line = match ctx.links.iiq_device(device) {
        Some(href) => el("a")
            .attr("href", href)
            .attr("target", "_blank")
            .attr("title", "View in IncidentIQ")
            .child(el("span").class("asset-icon").text(ICON_TAG))
            .child(tag),
        None => el("span")
            .child(el("span").class("asset-icon").text(ICON_TAG))
            .child(tag),
    };

    let battery = device
        .is_chromebook()
        .then_some(device.battery_health)
        .flatten()
        .map(battery_badge);
    let iiq_status = known(&device.iiq_status).map(|s| {
        el("span")
            .class("device-badge badge-iiq-status")
            .text(format!("\u{1F3AB} IIQ: {s}"))
    });

    el("div")
        .class("device-header")
        .child(
            el("div")
                .class("device-header-top")
                .child(
                    el("div")
                        .class("device-primary-info")
                        .child(el("div").class("device-asset-tag").child(tag_line))
                        .child(
                            el("div")
                                .class("device-subtitle")
                                .text(format!("Serial: {}", or_na(&device.serial_number))),
                        ),
                )
                .child(quick_actions(device, ctx)),
        )
        .child(
            el("div")
                .class("device-header-bottom")
                .child(el("div").class("status-heading").text("Statuses:"))
                .child(
                    el("div")
                        .class("device-status-badges")
                        .child(status_badge(
                            "\u{1F310} Google: ",
                            known(&device.status),
                        ))
                        .child_opt(iiq_status)
                        .child_opt(battery),
                ),
        )
        .into()
}

fn assigned_user_field(device: &DeviceRecord) -> Node {
    let user = AssignedUser::resolve(device);
    let name = match (known(&device.iiq_owner_name), user.email) {
        (Some(name), Some(_)) => Some(match known(&device.iiq_owner_student_id) {
            Some(id) => format!("{name} ({id})"),
            None => name.to_string(),
        }),
        _ => known(&device.user_full_name).map(str::to_string),
    };
    let mismatch = has_user_mismatch(device).then(|| {
        el("div")
            .class("field-warning")
            .text("\u{26A0}\u{FE0F} User mismatch: Device recently used by different user")
    });

    el("div")
        .class("device-field")
        .child(
            el("div")
                .class("field-label")
                .child(el("span").class("field-icon").text("\u{1F464}"))
                .child(el("span").text("Assigned User"))
                .child_opt(user_source_badge(user.source)),
        )
        .child(
            el("div")
                .class("field-value")
                .text(user.display())
                .child_opt(name.map(secondary))
                .child_opt(mismatch),
        )
        .into()
}

fn location_value(device: &DeviceRecord) -> String {
    let location = device
        .display_location()
        .map(str::trim)
        .filter(|l| !l.is_empty() && *l != NOT_AVAILABLE);
    match (location, known(&device.room)) {
        (Some(location), Some(room)) => format!("{location} / {room}"),
        (Some(location), None) => location.to_string(),
        (None, Some(room)) => room.to_string(),
        (None, None) => NOT_AVAILABLE.to_string(),
    }
}

fn wan_value(device: &DeviceRecord, ctx: &RenderContext) -> Node {
    match known(&device.wan_ip_address) {
        Some(wan) => {
            let class = if ctx.is_untrusted_wan(wan) {
                "wan-ip wan-ip-warning"
            } else {
                "wan-ip"
            };
            el("span").class(class).text(wan).into()
        }
        None => NOT_AVAILABLE.into(),
    }
}

/// Battery health, cycles and capacity. Shares its tier with the header badge.
pub fn battery_details(device: &DeviceRecord) -> Vec<Node> {
    let Some(health) = device.battery_health else {
        return Vec::new();
    };
    let tier = BatteryTier::classify(health);
    let mut out = Vec::new();

    let loss = significant_degradation(device)
        .map(|loss| el("span").class("battery-degraded").text(format!(" ({loss}% degraded)")));
    out.push(field(
        "\u{1F50B}",
        "Battery Health",
        el("span")
            .class(format!("battery-value battery-{}", tier.name()))
            .text(format_percent(health))
            .child_opt(loss),
    ));

    if let Some(cycles) = device.battery_cycle_count.filter(|c| *c > 0) {
        let warning = is_high_cycle_count(cycles)
            .then(|| el("span").class("cycle-warning").text(" \u{26A0}\u{FE0F} High"));
        out.push(field(
            "\u{1F504}",
            "Charge Cycles",
            el("span").text(cycles.to_string()).child_opt(warning),
        ));
    }

    if let (Some(full), Some(design)) = (
        device.battery_full_charge_capacity,
        device.battery_design_capacity,
    ) {
        out.push(field(
            "\u{26A1}",
            "Battery Capacity",
            format!("{full} / {design} mAh"),
        ));
    }
    out
}

fn meraki_fields(device: &DeviceRecord) -> Vec<Node> {
    let mut out = Vec::new();
    if let Some(ap) = known(&device.meraki_ap_name) {
        out.push(field(
            "\u{1F4E1}",
            "Last Known AP",
            el("span")
                .text(ap)
                .child_opt(known(&device.meraki_network).map(secondary)),
        ));
    }
    if known(&device.meraki_last_seen).is_some() {
        let note = known(&device.meraki_note).map(|note| {
            let class = if device.meraki_newer.unwrap_or(false) {
                "field-value-secondary meraki-newer"
            } else {
                "field-value-secondary meraki-older"
            };
            el("div").class(class).text(note)
        });
        out.push(field(
            "\u{1F550}",
            "Meraki Last Seen",
            el("span")
                .text(format_timestamp(&device.meraki_last_seen))
                .child_opt(note),
        ));
    }
    out
}

fn recent_users(device: &DeviceRecord) -> Option<Node> {
    if device.recent_users.is_empty() {
        return None;
    }
    let chips = device
        .recent_users
        .iter()
        .take(MAX_RECENT_USERS)
        .map(|user| el("span").class("user-chip").text(format!("\u{1F464} {user}")));
    Some(
        el("div")
            .class("recent-users-section")
            .child(
                el("div")
                    .class("section-header")
                    .child(el("span").text("\u{1F4CB}"))
                    .child(el("span").text("Recent Users")),
            )
            .child(el("div").children(chips))
            .into(),
    )
}

/// Field grid shared by the full card and the expanded user-card row.
fn detail_fields(device: &DeviceRecord, ctx: &RenderContext) -> Vec<Node> {
    let chromebook = device.is_chromebook();
    let mut fields = vec![assigned_user_field(device)];

    if chromebook {
        if let Some(last) = known(&device.last_known_user) {
            fields.push(field("\u{1F550}", "Last Known User", last));
        }
    }
    fields.push(field(ICON_LAPTOP, "Model", or_na(&device.model)));
    fields.push(field("\u{1F4CD}", "Location", location_value(device)));
    if chromebook {
        if let Some(ou) = known(&device.org_unit_path) {
            fields.push(field("\u{1F4C1}", "Org Unit Path", ou));
        }
    }
    if let Some(grade) = known(&device.student_grade) {
        fields.push(field("\u{1F393}", "Grade", grade));
    }
    fields.push(field("\u{1F310}", "MAC Address", or_na(&device.mac_address)));
    fields.push(field("\u{1F30D}", "LAN IP", or_na(&device.ip_address)));
    fields.push(field("\u{1F310}", "WAN IP", wan_value(device, ctx)));
    fields.push(field("\u{1F4BF}", "OS Version", or_na(&device.os_version)));
    if chromebook && known(&device.last_sync).is_some() {
        fields.push(field(
            "\u{1F504}",
            "Last Sync",
            format_timestamp(&device.last_sync),
        ));
    }
    if known(&device.last_used_date).is_some() {
        fields.push(field(
            "\u{1F4C5}",
            "Last Used",
            format_date(&device.last_used_date),
        ));
    }
    if known(&device.auto_update_expiration).is_some() {
        fields.push(field(
            "\u{23F3}",
            "Auto Update Expiration",
            format_aue(&device.auto_update_expiration),
        ));
    }
    if let Some(mode) = known(&device.boot_mode) {
        let class = if is_dev_boot_mode(Some(mode)) {
            "boot-dev-mode"
        } else {
            "boot-verified"
        };
        fields.push(field(
            "\u{1F510}",
            "Boot Mode",
            el("span").class(class).text(mode),
        ));
    }
    if chromebook {
        fields.extend(battery_details(device));
    }
    fields.extend(meraki_fields(device));
    fields
}

pub fn device_card(device: &DeviceRecord, ctx: &RenderContext) -> Node {
    let (type_class, status_class) = (
        if device.is_chromebook() {
            "type-chromebook"
        } else {
            "type-ipad"
        },
        if known(&device.status) == Some("ACTIVE") {
            "status-active"
        } else {
            "status-disabled"
        },
    );
    el("div")
        .class(format!("device-card {type_class} {status_class}"))
        .child(header(device, ctx))
        .child(
            el("div")
                .class("device-content")
                .child(el("div").class("device-grid").children(detail_fields(device, ctx)))
                .child_opt(recent_users(device)),
        )
        .into()
}

/// Search results, or `empty_message` when there are none.
pub fn device_results(devices: &[DeviceRecord], ctx: &RenderContext, empty_message: &str) -> Node {
    if devices.is_empty() {
        return el("div").class("no-results").text(empty_message).into();
    }
    el("div")
        .class("results-grid")
        .children(devices.iter().map(|d| device_card(d, ctx)))
        .into()
}

/// Hands the device over to a device search; the page script turns it into a `fleetview -d` command.
fn search_device_button(query: &str) -> Node {
    el("button")
        .class("quick-action-btn-compact search-device-btn")
        .attr("type", "button")
        .attr("data-search-device", query)
        .attr("title", "Search this device")
        .text("\u{1F50D} Search device")
        .into()
}

/// Collapsible compact row used inside user cards.
pub fn device_row(device: &DeviceRecord, ctx: &RenderContext, row_id: &str) -> Node {
    let battery = device
        .is_chromebook()
        .then_some(device.battery_health)
        .flatten()
        .map(battery_badge);
    let type_icon = if device.is_chromebook() {
        ICON_LAPTOP
    } else {
        ICON_TABLET
    };

    let summary = el("div")
        .class("user-device-summary")
        .attr("data-toggle", row_id)
        .child(
            el("div")
                .class("user-device-info")
                .child(
                    el("span")
                        .class("user-device-asset")
                        .text(format!("{ICON_TAG} {}", or_na(&device.asset_tag))),
                )
                .child(
                    el("span")
                        .class("user-device-serial")
                        .text(format!("SN: {}", or_na(&device.serial_number))),
                )
                .child(el("span").class("user-device-model").text(format!(
                    "{type_icon} {}",
                    or_na(&device.model)
                )))
                .child(status_badge("\u{1F310} ", known(&device.status)))
                .child_opt(battery),
        )
        .child(
            el("span")
                .class("collapse-icon")
                .child(Node::markup("&#9654;")),
        );

    let search = known(&device.asset_tag)
        .or_else(|| known(&device.serial_number))
        .map(search_device_button);

    let details = el("div")
        .class("user-device-details")
        .id(row_id)
        .attr("data-collapsed", "true")
        .child(quick_actions(device, ctx))
        .child_opt(search)
        .child(el("div").class("device-grid").children(detail_fields(device, ctx)))
        .child_opt(recent_users(device));

    el("div")
        .class("user-device-item")
        .child(summary)
        .child(details)
        .into()
}

pub fn device_rows(devices: &[DeviceRecord], ctx: &RenderContext, section_id: &str) -> Node {
    fragment(
        devices
            .iter()
            .enumerate()
            .map(|(i, d)| device_row(d, ctx, &format!("{section_id}-{i}"))),
    )
}
