//! User-facing notifications.
//!
//! The session never lets a failure escape; instead every outcome worth
//! telling the user about is pushed here as a severity-tagged notice. The UI
//! collaborator drains the buffer and renders it however it likes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// One message for the user: a short summary and a longer detail line.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Notice {
    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// Ordered buffer of notices produced by session operations.
#[derive(Debug, Default)]
pub struct Notifications {
    entries: Vec<Notice>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        self.entries.push(notice);
    }

    pub fn success(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Notice::new(Severity::Success, summary, detail));
    }

    pub fn info(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Notice::new(Severity::Info, summary, detail));
    }

    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Notice::new(Severity::Warning, summary, detail));
    }

    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Notice::new(Severity::Error, summary, detail));
    }

    pub fn entries(&self) -> &[Notice] {
        &self.entries
    }

    /// Remove and return everything accumulated so far.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.entries)
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|notice| notice.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_buffer() {
        let mut notifications = Notifications::new();
        notifications.error("Error", "something failed");
        notifications.info("Info", "but life goes on");

        assert!(notifications.has_errors());
        let drained = notifications.drain();
        assert_eq!(drained.len(), 2);
        assert!(notifications.entries().is_empty());
        assert!(!notifications.has_errors());
    }
}
