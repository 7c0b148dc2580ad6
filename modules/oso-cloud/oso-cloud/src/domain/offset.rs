//! Causal offset tracking for read-your-writes consistency.

use parking_lot::RwLock;

/// Most recent offset token issued by the service for this client's writes.
///
/// Shared by every call on one client. Reads and updates are individually
/// atomic, but two concurrent writes may land in either order, so callers
/// needing strict ordering must serialize their writes.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    current: RwLock<Option<String>>,
}

impl OffsetTracker {
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.current.read().clone()
    }

    /// Record the offset returned by a write.
    pub fn advance(&self, token: String) {
        tracing::debug!(offset = %token, "causal offset advanced");
        *self.current.write() = Some(token);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_keeps_latest_token() {
        let tracker = OffsetTracker::default();
        assert_eq!(tracker.current(), None);

        tracker.advance("offset-1".to_owned());
        tracker.advance("offset-2".to_owned());

        assert_eq!(tracker.current().as_deref(), Some("offset-2"));
    }
}
