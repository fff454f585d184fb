use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError};

pub const MAX_ENTRIES: usize = 20;
pub const DEFAULT_RECENT_LIMIT: usize = 10;

pub const DEVICE_HISTORY_KEY: &str = "searchHistory";
pub const USER_HISTORY_KEY: &str = "userSearchHistory";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Device,
    User,
}

impl SearchKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "device" | "devices" => Some(Self::Device),
            "user" | "users" => Some(Self::User),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::User => "user",
        }
    }

    fn storage_key(self) -> &'static str {
        match self {
            Self::Device => DEVICE_HISTORY_KEY,
            Self::User => USER_HISTORY_KEY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecentSearch {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub kind: SearchKind,
}

/// Recent device and user queries, newest first, persisted through `S`.
#[derive(Debug)]
pub struct HistoryStore<S> {
    storage: S,
    device: Vec<HistoryEntry>,
    user: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn load(storage: S) -> Self {
        let device = load_list(&storage, SearchKind::Device);
        let user = load_list(&storage, SearchKind::User);
        Self {
            storage,
            device,
            user,
        }
    }

    pub fn record(&mut self, query: &str, kind: SearchKind) -> Result<(), StorageError> {
        self.record_at(query, kind, Utc::now())
    }

    pub fn record_at(
        &mut self,
        query: &str,
        kind: SearchKind,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let list = self.list_mut(kind);
        list.retain(|entry| entry.query != query);
        list.insert(
            0,
            HistoryEntry {
                query: query.to_string(),
                timestamp,
            },
        );
        list.truncate(MAX_ENTRIES);
        self.persist(kind)
    }

    pub fn list(&self, kind: SearchKind) -> &[HistoryEntry] {
        match kind {
            SearchKind::Device => &self.device,
            SearchKind::User => &self.user,
        }
    }

    /// Both kinds merged, newest first, at most `limit` entries.
    pub fn recent(&self, limit: usize) -> Vec<RecentSearch> {
        let tagged = |kind: SearchKind| {
            self.list(kind).iter().map(move |entry| RecentSearch {
                query: entry.query.clone(),
                timestamp: entry.timestamp,
                kind,
            })
        };
        let mut merged: Vec<RecentSearch> = tagged(SearchKind::Device)
            .chain(tagged(SearchKind::User))
            .collect();
        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        merged.truncate(limit);
        merged
    }

    pub fn clear(&mut self, kind: SearchKind) -> Result<(), StorageError> {
        self.list_mut(kind).clear();
        self.storage.remove(kind.storage_key())
    }

    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.clear(SearchKind::Device)?;
        self.clear(SearchKind::User)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn list_mut(&mut self, kind: SearchKind) -> &mut Vec<HistoryEntry> {
        match kind {
            SearchKind::Device => &mut self.device,
            SearchKind::User => &mut self.user,
        }
    }

    fn persist(&mut self, kind: SearchKind) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(self.list(kind))
            .map_err(|e| StorageError::Encode { source: e })?;
        self.storage.set(kind.storage_key(), encoded)
    }
}

fn load_list<S: KeyValueStore>(storage: &S, kind: SearchKind) -> Vec<HistoryEntry> {
    let Some(raw) = storage.get(kind.storage_key()) else {
        return Vec::new();
    };
    let mut entries = match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("discarding unreadable {} history: {e}", kind.label());
            return Vec::new();
        }
    };
    let mut seen = std::collections::HashSet::new();
    entries.retain(|entry| seen.insert(entry.query.clone()));
    entries.truncate(MAX_ENTRIES);
    entries
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::storage::MemoryStore;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn rerecording_moves_query_to_front_without_duplicates() {
        let mut history = HistoryStore::load(MemoryStore::new());
        history.record_at("cb-100", SearchKind::Device, at(1)).unwrap();
        history.record_at("cb-200", SearchKind::Device, at(2)).unwrap();
        history.record_at("cb-100", SearchKind::Device, at(3)).unwrap();

        let list = history.list(SearchKind::Device);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].query, "cb-100");
        assert_eq!(list[0].timestamp, at(3));
        assert_eq!(list[1].query, "cb-200");
    }

    #[test]
    fn keeps_only_twenty_most_recent() {
        let mut history = HistoryStore::load(MemoryStore::new());
        for i in 0..21 {
            history
                .record_at(&format!("q{i}"), SearchKind::User, at(i))
                .unwrap();
        }
        let list = history.list(SearchKind::User);
        assert_eq!(list.len(), MAX_ENTRIES);
        assert_eq!(list[0].query, "q20");
        assert!(!list.iter().any(|e| e.query == "q0"));
    }

    #[test]
    fn kinds_are_independent() {
        let mut history = HistoryStore::load(MemoryStore::new());
        history.record_at("alice", SearchKind::User, at(1)).unwrap();
        history.record_at("alice", SearchKind::Device, at(2)).unwrap();
        assert_eq!(history.list(SearchKind::User).len(), 1);
        assert_eq!(history.list(SearchKind::Device).len(), 1);
    }

    #[test]
    fn recent_merges_by_timestamp_and_caps() {
        let mut history = HistoryStore::load(MemoryStore::new());
        for i in 0..8 {
            history
                .record_at(&format!("d{i}"), SearchKind::Device, at(i * 2))
                .unwrap();
            history
                .record_at(&format!("u{i}"), SearchKind::User, at(i * 2 + 1))
                .unwrap();
        }
        let recent = history.recent(DEFAULT_RECENT_LIMIT);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].query, "u7");
        assert_eq!(recent[0].kind, SearchKind::User);
        assert_eq!(recent[1].query, "d7");
        assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn persists_and_reloads() {
        let mut history = HistoryStore::load(MemoryStore::new());
        history.record_at("cb-1", SearchKind::Device, at(5)).unwrap();
        let storage = history.storage().clone();

        let reloaded = HistoryStore::load(storage);
        assert_eq!(reloaded.list(SearchKind::Device)[0].query, "cb-1");
        assert_eq!(reloaded.list(SearchKind::Device)[0].timestamp, at(5));
    }

    #[test]
    fn corrupt_storage_loads_empty() {
        let storage = MemoryStore::new()
            .with_entry(DEVICE_HISTORY_KEY, "[{\"query\": 12}")
            .with_entry(USER_HISTORY_KEY, "not json at all");
        let history = HistoryStore::load(storage);
        assert!(history.list(SearchKind::Device).is_empty());
        assert!(history.list(SearchKind::User).is_empty());
    }

    #[test]
    fn clear_removes_persisted_list() {
        let mut history = HistoryStore::load(MemoryStore::new());
        history.record_at("cb-1", SearchKind::Device, at(1)).unwrap();
        history.clear(SearchKind::Device).unwrap();
        assert!(history.list(SearchKind::Device).is_empty());
        assert_eq!(history.storage().get(DEVICE_HISTORY_KEY), None);
    }
}
