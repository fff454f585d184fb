use crate::model::{DeviceRecord, UserRecord};

use super::device::{copy_button, device_rows, external_link};
use super::format::{format_fee, known, or_na};
use super::html::{el, Node};
use super::RenderContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceSection {
    Assigned,
    Recent,
}

impl DeviceSection {
    fn key(self) -> &'static str {
        match self {
            Self::Assigned => "iiq",
            Self::Recent => "google",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Assigned => "IIQ Assigned Devices",
            Self::Recent => "Recent Logins (Last 5, Most Recent First)",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Assigned => "\u{1F4E6}",
            Self::Recent => "\u{1F510}",
        }
    }
}

fn fee_badge(balance: f64) -> Node {
    let class = if balance > 0.0 {
        "fee-balance fee-owed"
    } else {
        "fee-balance fee-clear"
    };
    el("span")
        .class(class)
        .text(format!("\u{1F4B0} {}", format_fee(balance)))
        .into()
}

fn device_section(
    devices: &[DeviceRecord],
    section: DeviceSection,
    user_index: usize,
    ctx: &RenderContext,
) -> Node {
    let section_id = format!("user-{user_index}-{}-devices", section.key());
    let header = el("div")
        .class("user-devices-header")
        .attr("data-toggle", format!("{section_id}-list"))
        .child(el("span").class("field-icon").text(section.icon()))
        .child(el("span").class("user-devices-title").text(section.title()))
        .child(el("span").class("count-pill").text(devices.len().to_string()));

    let list = if devices.is_empty() {
        el("div")
            .class("user-devices-list empty-list")
            .id(format!("{section_id}-list"))
            .text("No devices found")
    } else {
        el("div")
            .class("user-devices-list")
            .id(format!("{section_id}-list"))
            .child(device_rows(devices, ctx, &section_id))
    };

    el("div")
        .class("user-devices-section")
        .child(header)
        .child(list)
        .into()
}

pub fn user_card(user: &UserRecord, index: usize, ctx: &RenderContext) -> Node {
    let card_id = format!("user-card-{index}");
    let (status, badge_class) = if user.is_active {
        ("ACTIVE", "badge-active")
    } else {
        ("INACTIVE", "badge-disabled")
    };

    let student_id = user
        .is_student
        .then(|| known(&user.student_id))
        .flatten()
        .map(|id| el("span").class("student-id").text(format!(" (ID: {id})")));

    let mut meta = el("span").class("user-meta");
    if let Some(location) = known(&user.location) {
        meta = meta.child(el("span").text(format!("\u{1F4CD} {location}")));
    }
    if let Some(grade) = known(&user.grade) {
        meta = meta.child(el("span").text(format!("\u{1F393} Grade {grade}")));
    }
    if let Some(ou) = known(&user.org_unit) {
        meta = meta.child(el("span").text(format!("\u{1F4C1} {ou}")));
    }

    let email = or_na(&user.email);
    let google = ctx
        .links
        .google_user(user)
        .map(|href| external_link(href, "Open in Google Admin", "Google"));
    let iiq = known(&user.email)
        .and_then(|email| ctx.links.iiq_search(email))
        .map(|href| external_link(href, "Search in IncidentIQ", "IIQ"));
    let mail = known(&user.email).map(|email| {
        el("a")
            .class("quick-action-btn-compact")
            .attr("href", format!("mailto:{email}"))
            .attr("title", "Send email")
            .text("\u{2709} Mail")
    });

    let header = el("div")
        .class("device-header")
        .child(
            el("div")
                .class("device-header-top")
                .child(
                    el("div")
                        .class("device-primary-info")
                        .attr("data-toggle", format!("{card_id}-content"))
                        .child(
                            el("div")
                                .class("device-asset-tag")
                                .child(el("span").class("asset-icon").text("\u{1F464}"))
                                .child(
                                    el("span")
                                        .text(or_na(&user.full_name))
                                        .child_opt(student_id)
                                        .child_opt(user.fee_balance.map(fee_badge)),
                                ),
                        )
                        .child(el("div").class("device-subtitle").text(email).child(meta)),
                )
                .child(
                    el("div")
                        .class("quick-actions-compact")
                        .child_opt(google)
                        .child_opt(iiq)
                        .child_opt(mail)
                        .child(copy_button("Email", email, "\u{1F4CB} Email"))
                        .child(
                            el("span")
                                .class("collapse-icon")
                                .attr("data-toggle", format!("{card_id}-content"))
                                .child(Node::markup("&#9654;")),
                        ),
                ),
        )
        .child(
            el("div")
                .class("device-header-bottom")
                .child(el("div").class("status-heading").text("Status:"))
                .child(
                    el("div")
                        .class("device-status-badges")
                        .child(
                            el("span")
                                .class(format!("device-badge {badge_class}"))
                                .child(el("span").class("status-indicator"))
                                .child(el("span").text(format!("Google: {status}"))),
                        )
                        .child(el("span").class("device-badge badge-assigned-count").text(
                            format!(
                                "\u{1F4E6} Assigned Devices: {}",
                                user.assigned_count.unwrap_or(0)
                            ),
                        ))
                        .child(el("span").class("device-badge badge-recent-count").text(
                            format!(
                                "\u{1F510} Recent Devices: {}",
                                user.recent_count.unwrap_or(0)
                            ),
                        )),
                ),
        );

    el("div")
        .class("device-card user-card")
        .id(card_id.clone())
        .child(header)
        .child(
            el("div")
                .class("user-card-content")
                .id(format!("{card_id}-content"))
                .attr("data-collapsed", "true")
                .child(
                    el("div")
                        .class("device-content")
                        .child(device_section(
                            &user.assigned_devices,
                            DeviceSection::Assigned,
                            index,
                            ctx,
                        ))
                        .child(device_section(
                            &user.recent_devices,
                            DeviceSection::Recent,
                            index,
                            ctx,
                        )),
                ),
        )
        .into()
}

pub fn user_results(users: &[UserRecord], ctx: &RenderContext) -> Node {
    if users.is_empty() {
        return el("div").class("no-results").text("No users found").into();
    }
    el("div")
        .class("results-grid")
        .children(users.iter().enumerate().map(|(i, u)| user_card(u, i, ctx)))
        .into()
}
