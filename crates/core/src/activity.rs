use std::{
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub at: SystemTime,
    pub level: ActivityLevel,
    pub message: String,
}

type Listener = Arc<dyn Fn(&ActivityEntry) + Send + Sync>;

/// Human-readable progress log shared by every stage of a run.
///
/// Each entry is mirrored to `tracing` so the same story shows up in the
/// structured logs.
#[derive(Clone, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
    listener: Option<Listener>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(
        mut self,
        listener: impl Fn(&ActivityEntry) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ActivityLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ActivityLevel::Success, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(ActivityLevel::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ActivityLevel::Error, message.into());
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| entry.message.contains(needle))
    }

    fn push(&self, level: ActivityLevel, message: String) {
        match level {
            ActivityLevel::Info | ActivityLevel::Success => tracing::info!("{message}"),
            ActivityLevel::Warning => tracing::warn!("{message}"),
            ActivityLevel::Error => tracing::error!("{message}"),
        }

        let entry = ActivityEntry {
            at: SystemTime::now(),
            level,
            message,
        };
        if let Some(listener) = &self.listener {
            listener(&entry);
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("entries", &self.entries().len())
            .finish()
    }
}
