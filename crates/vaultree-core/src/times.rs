//! Node timestamps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The timestamp set every node carries.
///
/// `location_changed` tracks the last reparenting (move or recycle), used by
/// synchronization to decide which copy's placement wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTimes {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub accessed: DateTime<Utc>,
    pub location_changed: DateTime<Utc>,
    /// Absent means the node never expires.
    pub expires: Option<DateTime<Utc>>,
}

impl NodeTimes {
    /// Fresh timestamp set with all fields at `now` and no expiry.
    pub fn now() -> Self {
        let now = Utc::now();
        NodeTimes {
            created: now,
            modified: now,
            accessed: now,
            location_changed: now,
            expires: None,
        }
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires {
            Some(t) => t < now,
            None => false,
        }
    }
}

impl Default for NodeTimes {
    fn default() -> Self {
        Self::now()
    }
}
