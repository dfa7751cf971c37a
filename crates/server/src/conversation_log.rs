//! Daily conversation log
//!
//! Plain-text log the shop owner reads each evening. Appends one block
//! per answered question; clearing archives the current file under the
//! day's date and starts fresh.

use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

/// Append-only daily log with archive-on-clear
pub struct ConversationLog {
    path: PathBuf,
    enabled: bool,
    // File appends and the archive rename must not interleave.
    lock: Mutex<()>,
}

impl ConversationLog {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
            lock: Mutex::new(()),
        }
    }

    /// Record one exchange. Logging failures are reported, never
    /// propagated; a full disk must not take the shop offline.
    pub fn append(&self, customer_type: &str, question: &str, answer: &str, client_ip: &str) {
        if !self.enabled {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!(
            "\n=== {timestamp} ===\nCustomer Type: {customer_type}\nIP: {client_ip}\nQuestion: {question}\nDave's Response: {answer}\n---\n\n"
        );

        let _guard = self.lock.lock();
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| std::io::Write::write_all(&mut f, entry.as_bytes()));

        if let Err(e) = result {
            tracing::error!(path = %self.path.display(), error = %e, "failed to log conversation");
        }
    }

    /// Today's log contents, or a placeholder when nothing is logged.
    pub fn read_all(&self) -> String {
        let _guard = self.lock.lock();
        match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => "No conversations logged yet today.".to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Archive the current file as `conversations_YYYY-MM-DD.txt` next
    /// to it. Returns the archive name, or `None` when there was
    /// nothing to clear.
    pub fn clear(&self) -> std::io::Result<Option<String>> {
        let _guard = self.lock.lock();

        if !self.path.exists() {
            return Ok(None);
        }

        let today = Local::now().format("%Y-%m-%d");
        let archive_name = format!("conversations_{}.txt", today);
        let archive_path = self
            .path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&archive_name);

        std::fs::rename(&self.path, &archive_path)?;
        tracing::info!(archive = %archive_path.display(), "conversation log archived");
        Ok(Some(archive_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_in(dir: &tempfile::TempDir) -> ConversationLog {
        ConversationLog::new(dir.path().join("daily_conversations.txt"), true)
    }

    #[test]
    fn test_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        log.append("general", "Do you have milk?", "Should do!", "10.0.0.1");

        let content = log.read_all();
        assert!(content.contains("Customer Type: general"));
        assert!(content.contains("Question: Do you have milk?"));
        assert!(content.contains("Dave's Response: Should do!"));
        assert!(content.contains("IP: 10.0.0.1"));
    }

    #[test]
    fn test_read_without_file_returns_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        assert_eq!(log.read_all(), "No conversations logged yet today.");
    }

    #[test]
    fn test_clear_archives_with_date() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        log.append("returning", "Eggs?", "Fresh today!", "10.0.0.2");
        let archive = log.clear().unwrap().expect("file existed");

        assert!(archive.starts_with("conversations_"));
        assert!(archive.ends_with(".txt"));
        assert!(dir.path().join(&archive).exists());
        // Next read starts fresh.
        assert_eq!(log.read_all(), "No conversations logged yet today.");
    }

    #[test]
    fn test_clear_with_no_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        assert!(log.clear().unwrap().is_none());
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily_conversations.txt");
        let log = ConversationLog::new(&path, false);

        log.append("general", "Hello?", "Hi!", "10.0.0.3");
        assert!(!path.exists());
    }
}
