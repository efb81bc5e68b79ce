//! Sync status resolver -- decides whether a set of local entities is
//! fully and consistently mirrored remotely.
//!
//! Local entities and remote lookups are paired by position.  A remote
//! record counts as a counterpart only if it reports no external key or
//! the same key as the local entity.  The whole group is `synced` iff
//! every local entity has a counterpart and the counterparts agree on
//! their group id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{CategoryEntity, LocalEntity, RemoteEntity, RemoteSet};
use crate::types::{EntityId, RemoteId};

/// Resolved verdict for one validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    NotSynced,
    /// The pipeline failed before a status could be resolved.
    Unknown,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::NotSynced => "not_synced",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strictly group ids are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRule {
    /// A single entity: at most one group id, none is fine.
    Optional,
    /// A variant family: exactly one group id shared by every member.
    Required,
}

/// Local side of a pairing.
pub trait SyncSubject {
    fn entity_id(&self) -> EntityId;
    fn retailer_id(&self) -> &str;
}

/// Remote side of a pairing.
pub trait SyncCounterpart {
    fn remote_id(&self) -> &str;
    fn retailer_id(&self) -> Option<&str>;
    fn group_id(&self) -> Option<&str>;
}

impl SyncSubject for LocalEntity {
    fn entity_id(&self) -> EntityId {
        self.id
    }
    fn retailer_id(&self) -> &str {
        &self.retailer_id
    }
}

impl SyncSubject for CategoryEntity {
    fn entity_id(&self) -> EntityId {
        self.id
    }
    fn retailer_id(&self) -> &str {
        &self.retailer_id
    }
}

impl SyncCounterpart for RemoteEntity {
    fn remote_id(&self) -> &str {
        &self.id
    }
    fn retailer_id(&self) -> Option<&str> {
        self.retailer_id.as_deref()
    }
    fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }
}

/// A set is its own group.
impl SyncCounterpart for RemoteSet {
    fn remote_id(&self) -> &str {
        &self.id
    }
    fn retailer_id(&self) -> Option<&str> {
        self.retailer_id.as_deref()
    }
    fn group_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Output of [`resolve_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: SyncStatus,
    /// The single group id shared by all counterparts, if there is one.
    pub group_id: Option<RemoteId>,
    /// Positional: whether local entity `i` has a remote counterpart.
    pub found: Vec<bool>,
    /// Human-readable explanation lines for the debug trail.
    pub notes: Vec<String>,
}

impl Resolution {
    pub fn found_count(&self) -> usize {
        self.found.iter().filter(|f| **f).count()
    }
}

/// Resolve the sync status of `locals` against their positional `remotes`.
///
/// A shorter `remotes` slice leaves the trailing locals without a
/// counterpart.
pub fn resolve_status<L, R>(locals: &[L], remotes: &[Option<R>], rule: GroupRule) -> Resolution
where
    L: SyncSubject,
    R: SyncCounterpart,
{
    let mut notes = Vec::new();

    if locals.is_empty() {
        notes.push("no local entities to resolve; nothing was compared".to_string());
        return Resolution {
            status: SyncStatus::NotSynced,
            group_id: None,
            found: Vec::new(),
            notes,
        };
    }

    let mut found = Vec::with_capacity(locals.len());
    let mut group_ids: BTreeSet<&str> = BTreeSet::new();
    let mut ungrouped = Vec::new();

    for (index, local) in locals.iter().enumerate() {
        let remote = remotes.get(index).and_then(Option::as_ref);
        let Some(remote) = remote else {
            notes.push(format!(
                "entity {} ({}) has no remote counterpart",
                local.entity_id(),
                local.retailer_id()
            ));
            found.push(false);
            continue;
        };

        if let Some(remote_key) = remote.retailer_id() {
            if remote_key != local.retailer_id() {
                notes.push(format!(
                    "entity {} ({}) matched remote {} carrying key {remote_key}; not a counterpart",
                    local.entity_id(),
                    local.retailer_id(),
                    remote.remote_id()
                ));
                found.push(false);
                continue;
            }
        }

        match remote.group_id() {
            Some(group) => {
                group_ids.insert(group);
            }
            None => ungrouped.push(local.entity_id()),
        }
        found.push(true);
    }

    let found_count = found.iter().filter(|f| **f).count();
    let all_found = found_count == locals.len();

    let group_ok = match (rule, group_ids.len()) {
        (_, 1) => rule == GroupRule::Optional || ungrouped.is_empty(),
        (GroupRule::Optional, 0) => true,
        _ => false,
    };

    if all_found && !group_ok {
        if group_ids.len() > 1 {
            let listed: Vec<&str> = group_ids.iter().copied().collect();
            notes.push(format!(
                "remote group ids disagree: {}",
                listed.join(", ")
            ));
        } else if group_ids.is_empty() {
            notes.push("no remote group id reported for the variant family".to_string());
        }
        if !ungrouped.is_empty() && rule == GroupRule::Required {
            let ids: Vec<String> = ungrouped.iter().map(ToString::to_string).collect();
            notes.push(format!("entities without a remote group id: {}", ids.join(", ")));
        }
    }

    let group_id = if group_ids.len() == 1 {
        group_ids.iter().next().map(|g| g.to_string())
    } else {
        None
    };

    let status = if all_found && group_ok {
        SyncStatus::Synced
    } else {
        if !all_found {
            notes.push(format!(
                "{found_count} of {} local entities found remotely",
                locals.len()
            ));
        }
        SyncStatus::NotSynced
    };

    Resolution {
        status,
        group_id,
        found,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Local(EntityId, &'static str);

    impl SyncSubject for Local {
        fn entity_id(&self) -> EntityId {
            self.0
        }
        fn retailer_id(&self) -> &str {
            self.1
        }
    }

    fn remote(id: &str, key: &str, group: Option<&str>) -> Option<RemoteEntity> {
        Some(RemoteEntity {
            id: id.into(),
            retailer_id: Some(key.into()),
            group_id: group.map(Into::into),
            ..Default::default()
        })
    }

    #[test]
    fn all_found_with_one_group_is_synced() {
        let locals = [Local(1, "a_1"), Local(2, "b_2")];
        let remotes = [remote("11", "a_1", Some("g1")), remote("12", "b_2", Some("g1"))];
        let res = resolve_status(&locals, &remotes, GroupRule::Required);
        assert_eq!(res.status, SyncStatus::Synced);
        assert_eq!(res.group_id.as_deref(), Some("g1"));
        assert_eq!(res.found, vec![true, true]);
        assert!(res.notes.is_empty());
    }

    #[test]
    fn disagreeing_groups_are_not_synced_even_when_all_found() {
        let locals = [Local(1, "a_1"), Local(2, "b_2")];
        let remotes = [remote("11", "a_1", Some("g1")), remote("12", "b_2", Some("g2"))];
        let res = resolve_status(&locals, &remotes, GroupRule::Required);
        assert_eq!(res.status, SyncStatus::NotSynced);
        assert_eq!(res.found_count(), 2);
        assert_eq!(res.group_id, None);
        assert!(res.notes.iter().any(|n| n.contains("g1, g2")));
    }

    #[test]
    fn missing_counterpart_is_named_in_notes() {
        let locals = [Local(1, "a_1"), Local(2, "b_2")];
        let remotes = [remote("11", "a_1", Some("g1")), None];
        let res = resolve_status(&locals, &remotes, GroupRule::Required);
        assert_eq!(res.status, SyncStatus::NotSynced);
        assert_eq!(res.found, vec![true, false]);
        assert!(res.notes.iter().any(|n| n.contains("entity 2 (b_2)")));
    }

    #[test]
    fn zero_locals_is_not_synced() {
        let res = resolve_status::<Local, RemoteEntity>(&[], &[], GroupRule::Required);
        assert_eq!(res.status, SyncStatus::NotSynced);
        assert!(res.found.is_empty());
    }

    #[test]
    fn single_entity_without_group_is_synced() {
        let locals = [Local(1, "SKU-1")];
        let remotes = [remote("11", "SKU-1", None)];
        let res = resolve_status(&locals, &remotes, GroupRule::Optional);
        assert_eq!(res.status, SyncStatus::Synced);
        assert_eq!(res.group_id, None);
    }

    #[test]
    fn family_requires_a_group_id() {
        let locals = [Local(1, "a_1")];
        let remotes = [remote("11", "a_1", None)];
        let res = resolve_status(&locals, &remotes, GroupRule::Required);
        assert_eq!(res.status, SyncStatus::NotSynced);
    }

    #[test]
    fn foreign_key_is_not_a_counterpart() {
        let locals = [Local(1, "SKU-1")];
        let remotes = [remote("11", "SKU-9", None)];
        let res = resolve_status(&locals, &remotes, GroupRule::Optional);
        assert_eq!(res.status, SyncStatus::NotSynced);
        assert_eq!(res.found, vec![false]);
    }

    #[test]
    fn shorter_remote_slice_leaves_trailing_locals_unmatched() {
        let locals = [Local(1, "a_1"), Local(2, "b_2")];
        let remotes = [remote("11", "a_1", Some("g1"))];
        let res = resolve_status(&locals, &remotes, GroupRule::Required);
        assert_eq!(res.found, vec![true, false]);
    }

    #[test]
    fn status_strings() {
        assert_eq!(SyncStatus::NotSynced.to_string(), "not_synced");
        assert_eq!(
            serde_json::to_string(&SyncStatus::Synced).unwrap(),
            "\"synced\""
        );
    }
}
