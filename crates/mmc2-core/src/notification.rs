use std::error::Error;

use mmc2_common::registry::NAME;
use tracing::{debug, error, info};

use crate::conversation::truncate_chars;

pub const NEW_MESSAGE_TITLE: &str = "新消息";
pub const PREVIEW_CHARS: usize = 50;

pub type SinkError = Box<dyn Error + Send + Sync>;

/// Where notifications end up once they pass the enabled check.
pub trait NotificationSink {
    fn deliver(&self, title: &str, body: &str) -> Result<(), SinkError>;
}

/// Emits notifications as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, title: &str, body: &str) -> Result<(), SinkError> {
        info!(title, body, "notification");
        Ok(())
    }
}

#[derive(Debug)]
pub struct NotificationService<S = LogSink> {
    sink: S,
    enabled: bool,
}

impl Default for NotificationService<LogSink> {
    fn default() -> Self {
        Self::new(LogSink)
    }
}

impl<S: NotificationSink> NotificationService<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!(enabled, "notifications toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns true when the sink accepted the notification.
    pub fn show(&self, title: &str, body: &str) -> bool {
        if !self.enabled {
            debug!(title, "notifications disabled, skipping");
            return false;
        }
        match self.sink.deliver(title, body) {
            Ok(()) => true,
            Err(err) => {
                error!(title, error = %err, "failed to deliver notification");
                false
            }
        }
    }

    pub fn show_new_message(&self, sender_name: &str, preview: &str) -> bool {
        let body = format!("{sender_name}: {}", truncate_chars(preview, PREVIEW_CHARS));
        self.show(NEW_MESSAGE_TITLE, &body)
    }

    pub fn show_system(&self, body: &str) -> bool {
        self.show(NAME, body)
    }
}
