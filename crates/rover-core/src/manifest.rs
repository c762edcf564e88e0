//! Per-mission date ranges and the readiness gate in front of search.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiError, RoverApi};

/// Valid date and SOL range for one mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionManifest {
    pub mission_id: String,
    pub landing_date: NaiveDate,
    pub most_recent_earth_date: NaiveDate,
    pub most_recent_sol: u64,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("rover photo servers are not available right now, please try again later")]
    UpstreamUnavailable {
        mission: String,
        #[source]
        source: ApiError,
    },

    #[error("mission manifests have already been requested")]
    AlreadyRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Loading,
    Ready,
    Failed,
}

/// Manifests keyed by mission id, plus the fixed set of missions that must all be
/// present before the cache is ready.
///
/// Entries are written once and never replaced. A single failed fetch makes the
/// cache terminally failed; it never becomes ready afterwards.
#[derive(Debug, Clone)]
pub struct ManifestCache {
    required: Vec<String>,
    loaded: HashMap<String, MissionManifest>,
    requested: bool,
    failed: Option<String>,
}

impl ManifestCache {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for id in required {
            let id = id.into().to_lowercase();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self {
            required: ids,
            loaded: HashMap::new(),
            requested: false,
            failed: None,
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_ready(&self) -> bool {
        self.failed.is_none() && self.required.iter().all(|id| self.loaded.contains_key(id))
    }

    pub fn state(&self) -> CacheState {
        if self.failed.is_some() {
            CacheState::Failed
        } else if self.is_ready() {
            CacheState::Ready
        } else {
            CacheState::Loading
        }
    }

    /// Mission whose fetch put the cache into the failed state.
    pub fn failed_mission(&self) -> Option<&str> {
        self.failed.as_deref()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn get(&self, mission_id: &str) -> Option<&MissionManifest> {
        self.loaded.get(&mission_id.to_lowercase())
    }

    /// Loaded manifests in required-set order.
    pub fn manifests(&self) -> impl Iterator<Item = &MissionManifest> {
        self.required.iter().filter_map(|id| self.loaded.get(id))
    }

    /// Stores a fetched manifest and returns true if this completion made the
    /// cache ready.
    ///
    /// Manifests for unknown missions, repeats and anything arriving after a
    /// failure are ignored.
    pub fn record(&mut self, mut manifest: MissionManifest) -> bool {
        manifest.mission_id = manifest.mission_id.to_lowercase();
        let id = manifest.mission_id.clone();

        if self.failed.is_some() {
            debug!("discarding manifest for '{id}': cache already failed");
            return false;
        }
        if !self.required.contains(&id) {
            warn!("discarding manifest for untracked mission '{id}'");
            return false;
        }
        if self.loaded.contains_key(&id) {
            warn!("discarding duplicate manifest for '{id}'");
            return false;
        }

        let was_ready = self.is_ready();
        self.loaded.insert(id, manifest);
        !was_ready && self.is_ready()
    }

    /// Marks the cache failed. Returns true only for the first failure, so the
    /// fatal condition is surfaced once.
    pub fn fail(&mut self, mission_id: &str) -> bool {
        if self.failed.is_some() {
            return false;
        }
        self.failed = Some(mission_id.to_lowercase());
        true
    }

    fn begin_request(&mut self) -> Result<Vec<String>, ManifestError> {
        if self.requested {
            return Err(ManifestError::AlreadyRequested);
        }
        self.requested = true;
        Ok(self.required.clone())
    }
}

/// Progress reported while manifests load.
#[derive(Debug)]
pub enum LoadEvent<'a> {
    Loaded {
        mission: &'a str,
        loaded: usize,
        required: usize,
    },
    Ready,
    Failed {
        mission: &'a str,
        error: &'a ApiError,
    },
}

/// Fetches every required manifest concurrently and records each one as it lands.
///
/// Readiness is re-evaluated after every completion and flips only when the last
/// required manifest arrives. The first failure fails the cache and is reported
/// once, through `on_event` and the returned error. Fetches still in flight at that
/// point run to completion and their results are discarded.
pub async fn load_manifests(
    api: &dyn RoverApi,
    cache: &RefCell<ManifestCache>,
    mut on_event: impl FnMut(LoadEvent<'_>),
) -> Result<(), ManifestError> {
    let missions = cache.borrow_mut().begin_request()?;
    if missions.is_empty() {
        info!("no mission manifests required");
        on_event(LoadEvent::Ready);
        return Ok(());
    }
    info!("requesting manifests for {}", missions.join(", "));

    let mut pending: FuturesUnordered<_> = missions
        .iter()
        .map(|id| async move { (id.as_str(), api.fetch_manifest(id).await) })
        .collect();

    let mut fatal = None;
    while let Some((mission, result)) = pending.next().await {
        match result {
            Ok(manifest) => {
                let (became_ready, failed, loaded, required) = {
                    let mut cache = cache.borrow_mut();
                    let became_ready = cache.record(manifest);
                    (
                        became_ready,
                        cache.state() == CacheState::Failed,
                        cache.loaded_count(),
                        cache.required().len(),
                    )
                };
                if failed {
                    continue;
                }
                debug!("manifest for '{mission}' loaded ({loaded}/{required})");
                on_event(LoadEvent::Loaded {
                    mission,
                    loaded,
                    required,
                });
                if became_ready {
                    info!("all {required} mission manifests loaded");
                    on_event(LoadEvent::Ready);
                }
            }
            Err(error) => {
                let first = cache.borrow_mut().fail(mission);
                if !first {
                    debug!("ignoring manifest failure for '{mission}' after earlier failure: {error}");
                    continue;
                }
                warn!("manifest for '{mission}' failed: {error}");
                on_event(LoadEvent::Failed {
                    mission,
                    error: &error,
                });
                fatal = Some(ManifestError::UpstreamUnavailable {
                    mission: mission.to_string(),
                    source: error,
                });
            }
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(id: &str) -> MissionManifest {
        MissionManifest {
            mission_id: id.to_string(),
            landing_date: NaiveDate::from_ymd_opt(2004, 1, 4).unwrap(),
            most_recent_earth_date: NaiveDate::from_ymd_opt(2010, 3, 21).unwrap(),
            most_recent_sol: 2208,
        }
    }

    fn permutations(ids: &[&'static str]) -> Vec<Vec<&'static str>> {
        if ids.len() <= 1 {
            return vec![ids.to_vec()];
        }
        let mut out = Vec::new();
        for (i, first) in ids.iter().enumerate() {
            let mut rest = ids.to_vec();
            rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, *first);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_ready_only_after_last_completion_in_every_order() {
        let orders = permutations(&["a", "b", "c"]);
        assert_eq!(orders.len(), 6);

        for order in orders {
            let mut cache = ManifestCache::new(["A", "B", "C"]);
            assert!(!cache.is_ready());
            for (i, id) in order.iter().enumerate() {
                let last = i == order.len() - 1;
                assert_eq!(cache.record(manifest(id)), last, "order {order:?}");
                assert_eq!(cache.is_ready(), last, "order {order:?}");
            }
            assert_eq!(cache.state(), CacheState::Ready);
        }
    }

    #[test]
    fn test_required_set_is_normalized() {
        let cache = ManifestCache::new(["Curiosity", "curiosity", "Spirit"]);
        assert_eq!(cache.required(), ["curiosity", "spirit"]);
    }

    #[test]
    fn test_empty_required_set_is_ready() {
        assert!(ManifestCache::new(Vec::<String>::new()).is_ready());
    }

    #[test]
    fn test_record_never_overwrites() {
        let mut cache = ManifestCache::new(["a", "b"]);
        assert!(!cache.record(manifest("a")));

        let mut replacement = manifest("a");
        replacement.most_recent_sol = 1;
        assert!(!cache.record(replacement));
        assert_eq!(cache.get("a").unwrap().most_recent_sol, 2208);
    }

    #[test]
    fn test_record_ignores_untracked_mission() {
        let mut cache = ManifestCache::new(["a"]);
        assert!(!cache.record(manifest("z")));
        assert!(cache.get("z").is_none());
        assert!(!cache.is_ready());
    }

    #[test]
    fn test_failure_is_terminal_and_reported_once() {
        let mut cache = ManifestCache::new(["a", "b", "c"]);
        cache.record(manifest("a"));
        assert!(cache.fail("b"));
        assert!(!cache.fail("c"));

        assert!(!cache.record(manifest("c")));
        assert!(!cache.is_ready());
        assert_eq!(cache.state(), CacheState::Failed);
        assert_eq!(cache.failed_mission(), Some("b"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut cache = ManifestCache::new(["curiosity"]);
        cache.record(manifest("Curiosity"));
        assert!(cache.get("CURIOSITY").is_some());
        assert_eq!(cache.manifests().count(), 1);
    }
}
