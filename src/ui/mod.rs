//! Application state for one dashboard session.
//!
//! [`UiController`] owns everything the page shows: the active tab, the hero
//! collapse flag, every panel's fetch state, the search info lines and the
//! toast queue. Persistence goes through the injected [`KeyValueStore`]: the
//! history lists and the hero flag are loaded once and written on mutation.

pub mod clipboard;
pub mod toast;

use std::time::Instant;

use serde::Serialize;

use crate::history::{HistoryStore, RecentSearch, SearchKind, DEFAULT_RECENT_LIMIT};
use crate::model::{
    AueExpiration, DashboardStats, DeviceRecord, PanelState, SecurityAlerts, UserRecord,
};
use crate::storage::{KeyValueStore, StorageError};

use self::clipboard::{is_copyable, Clipboard};
use self::toast::{Toast, ToastLevel, ToastQueue};

pub const HERO_COLLAPSED_KEY: &str = "heroCollapsed";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Search,
    Users,
    Reports,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Search, Tab::Users, Tab::Reports];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "search" | "devices" | "device" => Some(Self::Search),
            "users" | "user" => Some(Self::Users),
            "reports" | "report" => Some(Self::Reports),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Users => "users",
            Self::Reports => "reports",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Search => "Device Search",
            Self::Users => "User Search",
            Self::Reports => "Reports",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardData {
    pub stats: PanelState<DashboardStats>,
    pub aue: PanelState<AueExpiration>,
    pub security: PanelState<SecurityAlerts>,
    pub devices: PanelState<Vec<DeviceRecord>>,
    pub users: PanelState<Vec<UserRecord>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    Rejected,
    Copied(&'static str),
    Failed,
}

pub struct UiController<S> {
    history: HistoryStore<S>,
    hero_collapsed: bool,
    active_tab: Tab,
    data: DashboardData,
    search_info: Vec<String>,
    toasts: ToastQueue,
    clipboard: Clipboard,
}

impl<S: KeyValueStore> UiController<S> {
    pub fn new(storage: S) -> Self {
        let hero_collapsed = storage.get(HERO_COLLAPSED_KEY).as_deref() == Some("true");
        Self {
            history: HistoryStore::load(storage),
            hero_collapsed,
            active_tab: Tab::default(),
            data: DashboardData::default(),
            search_info: Vec::new(),
            toasts: ToastQueue::default(),
            clipboard: Clipboard::default(),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Clipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_toasts(mut self, toasts: ToastQueue) -> Self {
        self.toasts = toasts;
        self
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        log::debug!("switching to tab {}", tab.key());
        self.active_tab = tab;
    }

    pub fn hero_collapsed(&self) -> bool {
        self.hero_collapsed
    }

    /// Flips the hero panel and persists the new state.
    pub fn toggle_hero(&mut self) -> Result<bool, StorageError> {
        self.hero_collapsed = !self.hero_collapsed;
        self.history
            .storage_mut()
            .set(HERO_COLLAPSED_KEY, self.hero_collapsed.to_string())?;
        Ok(self.hero_collapsed)
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore<S> {
        &mut self.history
    }

    pub fn recent_searches(&self) -> Vec<RecentSearch> {
        self.history.recent(DEFAULT_RECENT_LIMIT)
    }

    /// A storage failure only costs persistence; the in-memory list is updated regardless.
    pub fn record_search(&mut self, query: &str, kind: SearchKind) {
        if let Err(e) = self.history.record(query, kind) {
            log::warn!("failed to persist {} search history: {e}", kind.label());
        }
    }

    pub fn clear_history(&mut self) -> Result<(), StorageError> {
        self.history.clear_all()
    }

    pub fn notify(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.push(level, message);
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.toasts()
    }

    pub fn last_toast(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn expire_toasts(&mut self, now: Instant) -> usize {
        self.toasts.expire(now)
    }

    pub fn search_info(&self) -> &[String] {
        &self.search_info
    }

    pub fn set_search_info(&mut self, lines: Vec<String>) {
        self.search_info = lines;
    }

    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DashboardData {
        &mut self.data
    }

    pub fn copy_to_clipboard(&mut self, label: &str, value: &str) -> CopyOutcome {
        if !is_copyable(value) {
            self.notify(ToastLevel::Warning, format!("No {label} to copy"));
            return CopyOutcome::Rejected;
        }
        match self.clipboard.copy(value) {
            Ok(backend) => {
                self.notify(ToastLevel::Success, format!("{label} copied to clipboard"));
                CopyOutcome::Copied(backend)
            }
            Err(e) => {
                log::error!("copy of {label} failed: {e}");
                self.notify(ToastLevel::Error, format!("Failed to copy {label}"));
                CopyOutcome::Failed
            }
        }
    }
}
