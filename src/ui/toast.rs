use std::time::{Duration, Instant};

use colored::Colorize;
use serde::Serialize;

pub const TOAST_VISIBLE: Duration = Duration::from_millis(3000);
pub const TOAST_EXIT: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "INF",
            Self::Success => "OK",
            Self::Warning => "WRN",
            Self::Error => "ERR",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Info => "toast info",
            Self::Success => "toast success",
            Self::Warning => "toast warning",
            Self::Error => "toast error",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Exiting,
    Expired,
}

#[derive(Clone, Debug, Serialize)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    #[serde(skip)]
    created: Instant,
}

impl Toast {
    pub fn phase_at(&self, now: Instant) -> ToastPhase {
        let age = now.saturating_duration_since(self.created);
        if age < TOAST_VISIBLE {
            ToastPhase::Visible
        } else if age < TOAST_VISIBLE + TOAST_EXIT {
            ToastPhase::Exiting
        } else {
            ToastPhase::Expired
        }
    }
}

/// `[TAG] message` with the tag colored by level.
pub fn format_line(level: ToastLevel, message: &str) -> String {
    let tag = match level {
        ToastLevel::Info => level.tag().bold().cyan(),
        ToastLevel::Success => level.tag().bold().green(),
        ToastLevel::Warning => level.tag().bold().yellow(),
        ToastLevel::Error => level.tag().bold().red(),
    };
    format!("{}{}{} {}", "[".bold().white(), tag, "]".bold().white(), message)
}

#[derive(Debug, Default)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
    echo: bool,
}

impl ToastQueue {
    /// Queue that also prints every toast to stderr.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) -> &Toast {
        self.push_at(level, message, Instant::now())
    }

    pub fn push_at(
        &mut self,
        level: ToastLevel,
        message: impl Into<String>,
        created: Instant,
    ) -> &Toast {
        let message = message.into();
        if self.echo {
            eprintln!("{}", format_line(level, &message));
        }
        log::debug!("toast #{} ({:?}): {message}", self.next_id, level);
        self.toasts.push(Toast {
            id: self.next_id,
            level,
            message,
            created,
        });
        self.next_id += 1;
        &self.toasts[self.toasts.len() - 1]
    }

    /// Drops toasts past their exit phase; returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        self.toasts
            .retain(|t| t.phase_at(now) != ToastPhase::Expired);
        before - self.toasts.len()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_goes_through_visible_exit_and_expiry() {
        let start = Instant::now();
        let mut queue = ToastQueue::default();
        queue.push_at(ToastLevel::Success, "Serial copied to clipboard", start);
        let toast = queue.last().unwrap().clone();

        assert_eq!(toast.phase_at(start), ToastPhase::Visible);
        assert_eq!(
            toast.phase_at(start + Duration::from_millis(2999)),
            ToastPhase::Visible
        );
        assert_eq!(
            toast.phase_at(start + Duration::from_millis(3000)),
            ToastPhase::Exiting
        );
        assert_eq!(
            toast.phase_at(start + Duration::from_millis(3299)),
            ToastPhase::Exiting
        );
        assert_eq!(
            toast.phase_at(start + Duration::from_millis(3300)),
            ToastPhase::Expired
        );

        assert_eq!(queue.expire(start + Duration::from_millis(3100)), 0);
        assert_eq!(queue.expire(start + Duration::from_millis(3300)), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn ids_increase() {
        let mut queue = ToastQueue::default();
        let a = queue.push(ToastLevel::Info, "a").id;
        let b = queue.push(ToastLevel::Error, "b").id;
        assert!(b > a);
        assert_eq!(queue.toasts().len(), 2);
    }

    #[test]
    fn line_carries_tag_and_message() {
        colored::control::set_override(false);
        assert_eq!(
            format_line(ToastLevel::Warning, "No MAC to copy"),
            "[WRN] No MAC to copy"
        );
    }
}
