//! Pure record → HTML node rendering. No network access, no persisted state.

pub mod badges;
pub mod device;
pub mod format;
pub mod html;
pub mod user;
pub mod widgets;

use reqwest::Url;

use crate::model::{DeviceRecord, UserRecord};

pub use badges::BatteryTier;
pub use html::{el, text, Node};

pub const DEFAULT_IIQ_URL: &str = "https://crsd.incidentiq.com";
pub const DEFAULT_GOOGLE_ADMIN_URL: &str = "https://admin.google.com";
pub const DEFAULT_TRUSTED_WAN_PREFIX: &str = "167";

/// Outbound links to the asset-management and directory consoles.
#[derive(Clone, Debug)]
pub struct Links {
    pub iiq_base: String,
    pub google_admin_base: String,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            iiq_base: DEFAULT_IIQ_URL.to_string(),
            google_admin_base: DEFAULT_GOOGLE_ADMIN_URL.to_string(),
        }
    }
}

fn join_segments(base: &str, segments: &[&str]) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

impl Links {
    /// IIQ asset page, or an IIQ search by serial when the asset id is unknown.
    pub fn iiq_device(&self, device: &DeviceRecord) -> Option<String> {
        if let Some(id) = format::known(&device.iiq_asset_id) {
            return join_segments(&self.iiq_base, &["agent", "assets", id]).map(String::from);
        }
        let serial = format::known(&device.serial_number)?;
        self.iiq_search(serial)
    }

    pub fn iiq_search(&self, query: &str) -> Option<String> {
        let mut url = join_segments(&self.iiq_base, &["agent", "search"])?;
        url.query_pairs_mut().append_pair("query", query);
        Some(url.into())
    }

    pub fn google_device(&self, device: &DeviceRecord) -> Option<String> {
        let id = format::known(&device.device_id)?;
        let mut url = join_segments(&self.google_admin_base, &["ac", "chrome", "devices", id])?;
        url.query_pairs_mut().append_pair("journey", "217");
        Some(url.into())
    }

    pub fn google_user(&self, user: &UserRecord) -> Option<String> {
        let id = format::known(&user.user_id)?;
        join_segments(&self.google_admin_base, &["ac", "users", id]).map(String::from)
    }
}

#[derive(Clone, Debug)]
pub struct RenderContext {
    pub links: Links,
    /// WAN addresses outside this prefix are highlighted. Empty disables the check.
    pub trusted_wan_prefix: String,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            links: Links::default(),
            trusted_wan_prefix: DEFAULT_TRUSTED_WAN_PREFIX.to_string(),
        }
    }
}

impl RenderContext {
    pub fn is_untrusted_wan(&self, wan: &str) -> bool {
        !self.trusted_wan_prefix.is_empty() && !wan.starts_with(&self.trusted_wan_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iiq_link_prefers_asset_id() {
        let links = Links::default();
        let device = DeviceRecord {
            iiq_asset_id: Some("a1b2".into()),
            serial_number: Some("SN 1".into()),
            ..Default::default()
        };
        assert_eq!(
            links.iiq_device(&device).as_deref(),
            Some("https://crsd.incidentiq.com/agent/assets/a1b2")
        );

        let serial_only = DeviceRecord {
            serial_number: Some("SN 1".into()),
            ..Default::default()
        };
        assert_eq!(
            links.iiq_device(&serial_only).as_deref(),
            Some("https://crsd.incidentiq.com/agent/search?query=SN+1")
        );
        assert_eq!(links.iiq_device(&DeviceRecord::default()), None);
    }

    #[test]
    fn google_links_need_ids() {
        let links = Links::default();
        let device = DeviceRecord {
            device_id: Some("dev-9".into()),
            ..Default::default()
        };
        assert_eq!(
            links.google_device(&device).as_deref(),
            Some("https://admin.google.com/ac/chrome/devices/dev-9?journey=217")
        );
        assert_eq!(links.google_user(&UserRecord::default()), None);
    }

    #[test]
    fn wan_prefix_check() {
        let ctx = RenderContext::default();
        assert!(!ctx.is_untrusted_wan("167.1.2.3"));
        assert!(ctx.is_untrusted_wan("10.0.0.1"));
        let open = RenderContext {
            trusted_wan_prefix: String::new(),
            ..Default::default()
        };
        assert!(!open.is_untrusted_wan("10.0.0.1"));
    }
}
