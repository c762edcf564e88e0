//! # rover-core
//!
//! Search a planetary rover photo archive by Earth date or SOL, rover and camera.
//!
//! Searching is gated on every tracked mission's manifest having loaded, since the
//! manifests define which dates and SOLs each mission accepts.
//!
//! ```rust,no_run
//! use rover_core::{Config, FormInput, SearchOutcome, SearchSession};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let session = SearchSession::from_config(&Config::load(None)?)?;
//! session.load_manifests(|_| {}).await?;
//!
//! match session.submit(&FormInput::new("1000", "curiosity", "fhaz")).await? {
//!     SearchOutcome::Success(photos) => println!("{} photos", photos.len()),
//!     SearchOutcome::Empty => println!("No images found!"),
//!     SearchOutcome::RequestFailed(reason) => eprintln!("{reason}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod gate;
pub mod manifest;
pub mod saved;
pub mod search;
pub mod session;
pub mod validation;

pub use api::{ApiError, HttpRoverApi, RoverApi};
pub use config::{Config, ConfigError};
pub use gate::{Gate, GateGuard, SubmitControl};
pub use manifest::{CacheState, LoadEvent, ManifestCache, ManifestError, MissionManifest};
pub use saved::SavedImages;
pub use search::{
    DateParam, PhotoQuery, PhotoRecord, SearchCriteria, SearchOrchestrator, SearchOutcome,
};
pub use session::{SearchSession, SubmitError};
pub use validation::{
    DateOrSol, FieldValidationOutcome, FormInput, FormValidation, ValidationResult,
};
