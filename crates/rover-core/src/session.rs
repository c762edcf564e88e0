//! The context object shared by the search front end.

use std::cell::{Ref, RefCell};
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::api::{ApiError, HttpRoverApi, RoverApi};
use crate::config::Config;
use crate::gate::{Gate, SubmitControl};
use crate::manifest::{self, CacheState, LoadEvent, ManifestCache, ManifestError, MissionManifest};
use crate::saved::SavedImages;
use crate::search::{PhotoRecord, SearchCriteria, SearchOrchestrator, SearchOutcome};
use crate::validation::{self, FormInput, FormValidation};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("mission manifests are still loading")]
    NotReady,

    #[error("searching is unavailable because mission manifests failed to load")]
    ManifestsUnavailable,

    #[error("a search is already in progress")]
    Busy,

    #[error("the search form has invalid fields")]
    Invalid(FormValidation),
}

/// Everything one search front end needs, built once at startup: the manifest
/// cache, the orchestrator, the submit gates and the saved photos.
///
/// The session lives on a single thread. Operations take `&self` so manifest
/// loading and searches can be driven as concurrent tasks, with the gates
/// deciding what may run.
pub struct SearchSession {
    api: Arc<dyn RoverApi>,
    cache: RefCell<ManifestCache>,
    controls: SubmitControl,
    orchestrator: SearchOrchestrator,
    saved: RefCell<SavedImages>,
}

impl SearchSession {
    pub fn new<I, S>(api: Arc<dyn RoverApi>, missions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            orchestrator: SearchOrchestrator::new(api.clone()),
            api,
            cache: RefCell::new(ManifestCache::new(missions)),
            controls: SubmitControl::new(),
            saved: RefCell::new(SavedImages::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let api = HttpRoverApi::new(config)?;
        Ok(Self::new(Arc::new(api), config.missions.iter().cloned()))
    }

    /// Fetches every mission manifest, holding the loading gate until the last
    /// one lands or the first one fails. Only the first call issues requests.
    pub async fn load_manifests(
        &self,
        on_event: impl FnMut(LoadEvent<'_>),
    ) -> Result<(), ManifestError> {
        let _loading = self
            .controls
            .acquire(Gate::ManifestLoading)
            .ok_or(ManifestError::AlreadyRequested)?;
        manifest::load_manifests(self.api.as_ref(), &self.cache, on_event).await
    }

    pub fn state(&self) -> CacheState {
        self.cache.borrow().state()
    }

    pub fn is_ready(&self) -> bool {
        self.cache.borrow().is_ready()
    }

    /// True when a submit would be accepted right now.
    pub fn can_submit(&self) -> bool {
        self.controls.is_enabled() && self.is_ready()
    }

    pub fn missions(&self) -> Vec<String> {
        self.cache.borrow().required().to_vec()
    }

    pub fn manifests(&self) -> Vec<MissionManifest> {
        self.cache.borrow().manifests().cloned().collect()
    }

    pub fn validate(&self, input: &FormInput) -> FormValidation {
        validation::validate_form(input, &self.cache.borrow())
    }

    /// Validates the form and, if it passes, runs one search.
    ///
    /// While another search is in flight the submit is refused with
    /// [`SubmitError::Busy`] before any validation runs. The in-flight gate is held
    /// for the duration of the request and released on every outcome. Upstream failures come back as
    /// [`SearchOutcome::RequestFailed`], not as an `Err`.
    pub async fn submit(&self, input: &FormInput) -> Result<SearchOutcome, SubmitError> {
        match self.state() {
            CacheState::Failed => return Err(SubmitError::ManifestsUnavailable),
            CacheState::Loading => return Err(SubmitError::NotReady),
            CacheState::Ready if self.controls.is_held(Gate::ManifestLoading) => {
                return Err(SubmitError::NotReady);
            }
            CacheState::Ready => {}
        }

        // Busy wins over field errors.
        let _in_flight = self
            .controls
            .acquire(Gate::SearchInFlight)
            .ok_or(SubmitError::Busy)?;

        let form = self.validate(input);
        if !form.is_valid() {
            debug!("submit rejected: {:?}", form.errors());
            return Err(SubmitError::Invalid(form));
        }

        Ok(self
            .orchestrator
            .search(SearchCriteria::from_form(input))
            .await)
    }

    /// Adds a photo to the session's saved list; false if it was already there.
    pub fn save(&self, photo: &PhotoRecord) -> bool {
        self.saved.borrow_mut().add(photo)
    }

    pub fn saved(&self) -> Ref<'_, SavedImages> {
        self.saved.borrow()
    }

    pub fn controls(&self) -> &SubmitControl {
        &self.controls
    }
}
