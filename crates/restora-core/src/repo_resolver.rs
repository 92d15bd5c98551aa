// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository lookup against a configuration snapshot
//!
//! Resolution is stateless: callers pass the latest snapshot every time, so
//! the result always reflects the current attributes of the repository.
//! A missing repository is an ordinary outcome, not an error.

use std::collections::HashMap;

use restora_config_types::{ConfigSnapshot, Repository};

/// Outcome of looking up a repository id
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Repository),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn repository(&self) -> Option<&Repository> {
        match self {
            Resolution::Found(repo) => Some(repo),
            Resolution::NotFound => None,
        }
    }
}

/// Find the first repository in `snapshot` whose id equals `id`
pub fn resolve(snapshot: &ConfigSnapshot, id: &str) -> Resolution {
    snapshot
        .repos()
        .iter()
        .find(|repo| repo.id == id)
        .cloned()
        .map_or(Resolution::NotFound, Resolution::Found)
}

/// Id-keyed index over one snapshot, for callers resolving many ids.
///
/// Produces the same results as [`resolve`] on the snapshot it was built
/// from.
#[derive(Debug)]
pub struct RepoIndex<'a> {
    by_id: HashMap<&'a str, &'a Repository>,
}

impl<'a> RepoIndex<'a> {
    pub fn new(snapshot: &'a ConfigSnapshot) -> Self {
        let mut by_id = HashMap::with_capacity(snapshot.repos().len());
        for repo in snapshot.repos() {
            // first occurrence wins, matching the linear search
            by_id.entry(repo.id.as_str()).or_insert(repo);
        }
        Self { by_id }
    }

    pub fn resolve(&self, id: &str) -> Resolution {
        self.by_id
            .get(id)
            .map_or(Resolution::NotFound, |repo| Resolution::Found((*repo).clone()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ConfigSnapshot {
        let mut offsite = Repository::new("offsite", "s3:https://backups.example.com/restora");
        offsite.password_env = Some("OFFSITE_PASSWORD".into());
        ConfigSnapshot::new(vec![Repository::new("repo1", "/mnt/repo1"), offsite], vec![]).unwrap()
    }

    #[test]
    fn found_iff_id_present() {
        let snapshot = snapshot();
        for repo in snapshot.repos() {
            assert_eq!(resolve(&snapshot, &repo.id), Resolution::Found(repo.clone()));
        }
        assert_eq!(resolve(&snapshot, "repo2"), Resolution::NotFound);
    }

    #[test]
    fn resolve_is_idempotent() {
        let snapshot = snapshot();
        assert_eq!(resolve(&snapshot, "offsite"), resolve(&snapshot, "offsite"));
        assert_eq!(resolve(&snapshot, "gone"), resolve(&snapshot, "gone"));
    }

    #[test]
    fn malformed_ids_are_not_found() {
        let snapshot = snapshot();
        for id in ["", " repo1", "REPO1", "repo1\n", "../repo1"] {
            assert_eq!(resolve(&snapshot, id), Resolution::NotFound, "id {id:?}");
        }
    }

    #[test]
    fn returns_current_attributes() {
        let before = snapshot();
        let mut moved = Repository::new("repo1", "/mnt/elsewhere");
        moved.auto_unlock = true;
        let after = ConfigSnapshot::new(vec![moved.clone()], vec![]).unwrap();

        assert_eq!(resolve(&before, "repo1").repository().unwrap().uri, "/mnt/repo1");
        assert_eq!(resolve(&after, "repo1"), Resolution::Found(moved));
    }

    #[test]
    fn empty_snapshot_resolves_nothing() {
        assert!(!resolve(&ConfigSnapshot::empty(), "repo1").is_found());
    }

    #[test]
    fn index_agrees_with_linear_search() {
        let snapshot = snapshot();
        let index = RepoIndex::new(&snapshot);
        assert_eq!(index.len(), 2);
        for id in ["repo1", "offsite", "missing", ""] {
            assert_eq!(index.resolve(id), resolve(&snapshot, id));
        }
    }
}
