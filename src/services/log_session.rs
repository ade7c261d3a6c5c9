//! Paginated, owner-bound views over a member's jail history.

use crate::services::jail::AuditLogEntry;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_IDLE_SECS: i64 = 60;

const CUSTOM_ID_PREFIX: &str = "jaillog-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
}

impl Navigation {
    fn key(self) -> &'static str {
        match self {
            Navigation::Previous => "prev",
            Navigation::Next => "next",
        }
    }
}

/// Component custom id for a navigation button of `session_id`.
pub fn custom_id(navigation: Navigation, session_id: &str) -> String {
    format!("{}{}-{}", CUSTOM_ID_PREFIX, navigation.key(), session_id)
}

/// Inverse of [`custom_id`].
pub fn parse_custom_id(custom_id: &str) -> Option<(Navigation, &str)> {
    let rest = custom_id.strip_prefix(CUSTOM_ID_PREFIX)?;
    let (key, session_id) = rest.split_once('-')?;
    let navigation = match key {
        "prev" => Navigation::Previous,
        "next" => Navigation::Next,
        _ => return None,
    };
    if session_id.is_empty() {
        return None;
    }
    Some((navigation, session_id))
}

/// One rendered page, detached from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub session_id: String,
    pub subject: serenity::UserId,
    /// Display name of the subject, captured when the session opened.
    pub subject_label: String,
    pub index: usize,
    pub total: usize,
    pub entries: Vec<AuditLogEntry>,
}

impl PageView {
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigated {
    Moved(PageView),
    /// Already on the first or last page.
    Unchanged(PageView),
    NotOwner,
    /// Timed out, closed, or never existed.
    Expired,
}

#[derive(Debug, Clone)]
pub struct LogSession {
    id: String,
    owner: serenity::UserId,
    subject: serenity::UserId,
    subject_label: String,
    /// Frozen at open time; always at least one (possibly empty) page.
    pages: Vec<Vec<AuditLogEntry>>,
    current: usize,
    idle_timeout: Duration,
    expires_at: DateTime<Utc>,
}

impl LogSession {
    pub fn new(
        id: String,
        owner: serenity::UserId,
        subject: serenity::UserId,
        subject_label: String,
        entries: Vec<AuditLogEntry>,
        page_size: usize,
        idle_timeout: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let mut pages: Vec<Vec<AuditLogEntry>> = entries
            .chunks(page_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        if pages.is_empty() {
            pages.push(Vec::new());
        }

        Self {
            id,
            owner,
            subject,
            subject_label,
            pages,
            current: 0,
            idle_timeout,
            expires_at: now + idle_timeout,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn view(&self) -> PageView {
        PageView {
            session_id: self.id.clone(),
            subject: self.subject,
            subject_label: self.subject_label.clone(),
            index: self.current,
            total: self.pages.len(),
            entries: self.pages[self.current].clone(),
        }
    }

    pub fn navigate(
        &mut self,
        actor: serenity::UserId,
        navigation: Navigation,
        now: DateTime<Utc>,
    ) -> Navigated {
        if self.is_expired(now) {
            return Navigated::Expired;
        }
        if actor != self.owner {
            return Navigated::NotOwner;
        }

        self.expires_at = now + self.idle_timeout;

        let target = match navigation {
            Navigation::Previous => self.current.checked_sub(1),
            Navigation::Next => Some(self.current + 1).filter(|page| *page < self.pages.len()),
        };

        match target {
            Some(page) => {
                self.current = page;
                Navigated::Moved(self.view())
            }
            None => Navigated::Unchanged(self.view()),
        }
    }
}

/// Open log sessions keyed by session id.
pub struct LogSessionService {
    sessions: DashMap<String, LogSession>,
    /// Start time of this service, so ids from before a restart never match.
    epoch: String,
    next_id: AtomicU64,
    page_size: usize,
    idle_timeout: Duration,
}

impl LogSessionService {
    pub fn new(page_size: usize, idle_timeout: Duration) -> Self {
        Self::started_at(page_size, idle_timeout, Utc::now())
    }

    pub(crate) fn started_at(
        page_size: usize,
        idle_timeout: Duration,
        started: DateTime<Utc>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            epoch: format!("{:x}", started.timestamp_millis()),
            next_id: AtomicU64::new(1),
            page_size,
            idle_timeout,
        }
    }

    /// Opens a session over `entries` and returns its first page.
    pub fn open(
        &self,
        owner: serenity::UserId,
        subject: serenity::UserId,
        subject_label: String,
        entries: Vec<AuditLogEntry>,
        now: DateTime<Utc>,
    ) -> PageView {
        self.prune(now);

        let id = format!(
            "{}.{:x}",
            self.epoch,
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );
        let session = LogSession::new(
            id.clone(),
            owner,
            subject,
            subject_label,
            entries,
            self.page_size,
            self.idle_timeout,
            now,
        );
        let view = session.view();
        self.sessions.insert(id, session);
        view
    }

    pub fn navigate(
        &self,
        session_id: &str,
        actor: serenity::UserId,
        navigation: Navigation,
        now: DateTime<Utc>,
    ) -> Navigated {
        let outcome = match self.sessions.get_mut(session_id) {
            Some(mut session) => session.navigate(actor, navigation, now),
            None => return Navigated::Expired,
        };

        if outcome == Navigated::Expired {
            self.sessions.remove(session_id);
        }
        outcome
    }

    /// Ends a session early, e.g. when its message could not be delivered.
    pub fn close(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drops timed-out sessions and returns how many were removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before - self.sessions.len()
    }
}
