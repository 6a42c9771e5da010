use crate::rule::Priority;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a failed rule lands in a verdict. Fixed one-to-one by priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Deny,
    Warn,
    Info,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Deny, Bucket::Warn, Bucket::Info];

    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Must => Bucket::Deny,
            Priority::Should => Bucket::Warn,
            Priority::Have => Bucket::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Deny => "deny",
            Bucket::Warn => "warn",
            Bucket::Info => "info",
        }
    }
}

/// Failed rule IDs grouped by severity. Passing rules appear in no set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyVerdict {
    #[serde(default)]
    pub deny: BTreeSet<String>,
    #[serde(default)]
    pub warn: BTreeSet<String>,
    #[serde(default)]
    pub info: BTreeSet<String>,
}

impl PolicyVerdict {
    /// Record one rule outcome. Only failures are stored.
    pub fn record(&mut self, rule_id: &str, priority: Priority, ok: bool) {
        if ok {
            return;
        }
        self.bucket_mut(Bucket::for_priority(priority))
            .insert(rule_id.to_string());
    }

    pub fn bucket(&self, bucket: Bucket) -> &BTreeSet<String> {
        match bucket {
            Bucket::Deny => &self.deny,
            Bucket::Warn => &self.warn,
            Bucket::Info => &self.info,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BTreeSet<String> {
        match bucket {
            Bucket::Deny => &mut self.deny,
            Bucket::Warn => &mut self.warn,
            Bucket::Info => &mut self.info,
        }
    }

    /// Bucket holding `rule_id`, if it failed.
    pub fn bucket_of(&self, rule_id: &str) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|b| self.bucket(*b).contains(rule_id))
    }

    pub fn is_clean(&self) -> bool {
        self.deny.is_empty() && self.warn.is_empty() && self.info.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.deny.len() + self.warn.len() + self.info.len()
    }

    /// Rule IDs present in more than one bucket. Always empty for verdicts built with `record`;
    /// verdicts read from an external evaluator may violate it.
    pub fn overlapping(&self) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut dup = BTreeSet::new();
        for b in Bucket::ALL {
            for id in self.bucket(b) {
                if !seen.insert(id.clone()) {
                    dup.insert(id.clone());
                }
            }
        }
        dup
    }
}
