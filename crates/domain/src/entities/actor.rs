//! Actor entity - the creatures rolls are made by and effects land on
//!
//! Actors carry three things the resolution flows touch: named check
//! modifiers (stats), spendable pools (resources, e.g. luck and hit points),
//! and the active status set effects grant into.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, UserId};

/// Resource pool spent by luck re-resolutions.
pub const LUCK_RESOURCE: &str = "luck";
/// Resource pool damage/healing formulas apply against.
pub const HP_RESOURCE: &str = "hp";

/// An actor in the shared world state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    /// Owning participant, if any.
    pub owner: Option<UserId>,
    /// Named check modifiers ("melee", "agility", ...).
    pub stats: HashMap<String, i32>,
    /// Spendable pools keyed by resource name.
    pub resources: HashMap<String, i64>,
    /// Active status identifiers.
    pub statuses: BTreeSet<String>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            owner: None,
            stats: HashMap::new(),
            resources: HashMap::new(),
            statuses: BTreeSet::new(),
        }
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_stat(mut self, key: impl Into<String>, value: i32) -> Self {
        self.stats.insert(key.into(), value);
        self
    }

    pub fn with_resource(mut self, key: impl Into<String>, value: i64) -> Self {
        self.resources.insert(key.into(), value);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.statuses.insert(status.into());
        self
    }

    /// Read a resource pool. Absent pools read as zero.
    pub fn resource(&self, key: &str) -> i64 {
        self.resources.get(key).copied().unwrap_or(0)
    }

    pub fn set_resource(&mut self, key: impl Into<String>, value: i64) {
        self.resources.insert(key.into(), value);
    }

    /// Check modifier for a named stat.
    pub fn stat(&self, key: &str) -> Option<i32> {
        self.stats.get(key).copied()
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.contains(status)
    }

    /// Grant statuses as a set union. Returns only the statuses that were
    /// actually new, so callers can tell a re-application from a first grant.
    pub fn grant_statuses<I, S>(&mut self, statuses: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for status in statuses {
            let status = status.into();
            if self.statuses.insert(status.clone()) {
                added.push(status);
            }
        }
        added
    }
}
