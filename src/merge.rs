//! Merge functions.
//!
//! A merge function decides what a queued value becomes when its key is
//! pushed again. It receives the stored value first and the incoming value
//! second.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Keep the value that was queued first; ignore the new one.
pub fn retain_old<V>(old: V, _new: V) -> V {
    old
}

/// Overwrite the queued value with the latest one.
pub fn retain_new<V>(_old: V, new: V) -> V {
    new
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// The two standard merge policies, selectable by name from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Keep the first value seen.
    RetainOld,
    /// Keep the most recent value seen.
    #[default]
    RetainNew,
}

impl MergePolicy {
    /// Apply this policy to a stored and an incoming value.
    pub fn merge<V>(self, old: V, new: V) -> V {
        match self {
            MergePolicy::RetainOld => retain_old(old, new),
            MergePolicy::RetainNew => retain_new(old, new),
        }
    }

    /// This policy as a plain merge function, for `UniqueQueue::new`.
    pub fn into_fn<V>(self) -> impl FnMut(V, V) -> V + Clone {
        move |old, new| self.merge(old, new)
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MergePolicy::RetainOld => "retain_old",
            MergePolicy::RetainNew => "retain_new",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MergePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain_old" | "retain-old" | "old" => Ok(MergePolicy::RetainOld),
            "retain_new" | "retain-new" | "new" => Ok(MergePolicy::RetainNew),
            _ => Err(Error::UnknownPolicy(s.to_string())),
        }
    }
}
