//! Template identifiers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-unique template id: milliseconds since the Unix epoch at creation,
/// bumped forward when two templates are created within the same tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(pub i64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source for a single store.
#[derive(Debug, Default)]
pub struct IdClock {
    last: i64,
}

impl IdClock {
    /// Starts after `last`, typically the largest id already stored.
    pub fn starting_after(last: i64) -> Self {
        Self { last }
    }

    /// Returns a fresh id strictly greater than every id seen so far.
    pub fn next_id(&mut self) -> TemplateId {
        let id = now_millis().max(self.last.saturating_add(1));
        self.last = id;
        TemplateId(id)
    }

    /// Records an externally chosen id so later ids stay above it.
    pub fn observe(&mut self, id: TemplateId) {
        self.last = self.last.max(id.0);
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
