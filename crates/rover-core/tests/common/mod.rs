#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rover_core::{ApiError, MissionManifest, PhotoQuery, PhotoRecord, RoverApi};

/// Scripted upstream: each mission answers after its own delay, either with a
/// manifest or with an HTTP status failure.
#[derive(Default)]
pub struct FakeApi {
    manifests: HashMap<String, (Duration, Result<MissionManifest, u16>)>,
    photos: Option<Result<Vec<PhotoRecord>, u16>>,
    photo_delay: Duration,
    pub manifest_calls: RefCell<Vec<String>>,
    pub photo_queries: RefCell<Vec<PhotoQuery>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest(mut self, mission: &str, delay_ms: u64) -> Self {
        self.manifests.insert(
            mission.to_string(),
            (Duration::from_millis(delay_ms), Ok(manifest(mission))),
        );
        self
    }

    pub fn failing_manifest(mut self, mission: &str, delay_ms: u64, status: u16) -> Self {
        self.manifests.insert(
            mission.to_string(),
            (Duration::from_millis(delay_ms), Err(status)),
        );
        self
    }

    pub fn photos(mut self, photos: Vec<PhotoRecord>, delay_ms: u64) -> Self {
        self.photos = Some(Ok(photos));
        self.photo_delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn failing_photos(mut self, status: u16) -> Self {
        self.photos = Some(Err(status));
        self
    }
}

fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        reason: "Service Unavailable".to_string(),
    }
}

#[async_trait(?Send)]
impl RoverApi for FakeApi {
    async fn fetch_manifest(&self, mission_id: &str) -> Result<MissionManifest, ApiError> {
        self.manifest_calls.borrow_mut().push(mission_id.to_string());
        let (delay, result) = self
            .manifests
            .get(mission_id)
            .cloned()
            .unwrap_or((Duration::ZERO, Err(404)));
        tokio::time::sleep(delay).await;
        result.map_err(status_error)
    }

    async fn fetch_photos(&self, query: &PhotoQuery) -> Result<Vec<PhotoRecord>, ApiError> {
        self.photo_queries.borrow_mut().push(query.clone());
        tokio::time::sleep(self.photo_delay).await;
        self.photos.clone().unwrap_or(Ok(vec![])).map_err(status_error)
    }
}

pub fn manifest(mission: &str) -> MissionManifest {
    MissionManifest {
        mission_id: mission.to_string(),
        landing_date: NaiveDate::from_ymd_opt(2012, 8, 6).unwrap(),
        most_recent_earth_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        most_recent_sol: 3800,
    }
}

pub fn photo(id: u64) -> PhotoRecord {
    PhotoRecord {
        id,
        image_url: format!("http://mars.example/{id}.jpg"),
        earth_date: "2015-05-30".to_string(),
        sol: 1000,
        camera_name: "FHAZ".to_string(),
        rover_name: "Curiosity".to_string(),
    }
}
