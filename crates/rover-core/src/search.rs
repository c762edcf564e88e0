//! Photo search: request construction, the single upstream call and outcome
//! classification.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, RoverApi};
use crate::validation::{self, FormInput};

/// One photo as returned by the service, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: u64,
    pub image_url: String,
    pub earth_date: String,
    pub sol: u64,
    pub camera_name: String,
    pub rover_name: String,
}

/// Validated input of a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    date_or_sol: String,
    rover_id: String,
    camera_id: String,
}

impl SearchCriteria {
    pub fn new(
        date_or_sol: impl Into<String>,
        rover_id: impl Into<String>,
        camera_id: impl Into<String>,
    ) -> Self {
        Self {
            date_or_sol: date_or_sol.into(),
            rover_id: rover_id.into(),
            camera_id: camera_id.into(),
        }
    }

    pub fn from_form(input: &FormInput) -> Self {
        let input = input.normalized();
        Self::new(input.date_or_sol, input.rover, input.camera)
    }

    pub fn date_or_sol(&self) -> &str {
        &self.date_or_sol
    }

    pub fn rover_id(&self) -> &str {
        &self.rover_id
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParam {
    Sol,
    EarthDate,
}

impl DateParam {
    pub fn as_str(self) -> &'static str {
        match self {
            DateParam::Sol => "sol",
            DateParam::EarthDate => "earth_date",
        }
    }
}

/// Query parameters for one photo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoQuery {
    pub date_param: DateParam,
    pub date_value: String,
    pub camera: String,
    pub rover: String,
}

impl PhotoQuery {
    /// Purely numeric input is queried as `sol`, anything else as `earth_date`.
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        let date_param = if validation::is_sol(criteria.date_or_sol()) {
            DateParam::Sol
        } else {
            DateParam::EarthDate
        };
        Self {
            date_param,
            date_value: criteria.date_or_sol().to_string(),
            camera: criteria.camera_id().to_string(),
            rover: criteria.rover_id().to_string(),
        }
    }

    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (self.date_param.as_str(), self.date_value.as_str()),
            ("camera", self.camera.as_str()),
            ("rover", self.rover.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Success(Vec<PhotoRecord>),
    Empty,
    RequestFailed(String),
}

impl SearchOutcome {
    pub fn classify(result: Result<Vec<PhotoRecord>, ApiError>) -> Self {
        match result {
            Ok(photos) if photos.is_empty() => SearchOutcome::Empty,
            Ok(photos) => SearchOutcome::Success(photos),
            Err(err) => SearchOutcome::RequestFailed(err.to_string()),
        }
    }
}

/// Issues photo searches. Every call is a fresh single attempt; nothing is cached
/// between calls.
pub struct SearchOrchestrator {
    api: Arc<dyn RoverApi>,
}

impl SearchOrchestrator {
    pub fn new(api: Arc<dyn RoverApi>) -> Self {
        Self { api }
    }

    pub async fn search(&self, criteria: SearchCriteria) -> SearchOutcome {
        let query = PhotoQuery::from_criteria(&criteria);
        debug!(
            "searching {}={} camera={} rover={}",
            query.date_param.as_str(),
            query.date_value,
            query.camera,
            query.rover
        );

        let outcome = SearchOutcome::classify(self.api.fetch_photos(&query).await);
        match &outcome {
            SearchOutcome::Success(photos) => debug!("search returned {} photos", photos.len()),
            SearchOutcome::Empty => debug!("search returned no photos"),
            SearchOutcome::RequestFailed(reason) => warn!("search failed: {reason}"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: u64) -> PhotoRecord {
        PhotoRecord {
            id,
            image_url: format!("http://mars.example/{id}.jpg"),
            earth_date: "2015-05-30".to_string(),
            sol: 1000,
            camera_name: "FHAZ".to_string(),
            rover_name: "Curiosity".to_string(),
        }
    }

    #[test]
    fn test_sol_param_for_numeric_input() {
        let query = PhotoQuery::from_criteria(&SearchCriteria::new("150", "curiosity", "fhaz"));
        assert_eq!(query.date_param, DateParam::Sol);
        assert_eq!(query.pairs()[0], ("sol", "150"));
    }

    #[test]
    fn test_earth_date_param_for_dates() {
        let query =
            PhotoQuery::from_criteria(&SearchCriteria::new("2021-02-03", "curiosity", "fhaz"));
        assert_eq!(query.date_param, DateParam::EarthDate);
        assert_eq!(query.pairs()[0], ("earth_date", "2021-02-03"));
    }

    #[test]
    fn test_query_always_carries_rover_and_camera() {
        let query = PhotoQuery::from_criteria(&SearchCriteria::new("7", "spirit", "pancam"));
        assert_eq!(query.pairs()[1], ("camera", "pancam"));
        assert_eq!(query.pairs()[2], ("rover", "spirit"));
    }

    #[test]
    fn test_criteria_from_form_is_normalized() {
        let criteria = SearchCriteria::from_form(&FormInput::new(" 150 ", "Curiosity", " fhaz"));
        assert_eq!(criteria, SearchCriteria::new("150", "curiosity", "fhaz"));
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(SearchOutcome::classify(Ok(vec![])), SearchOutcome::Empty);
    }

    #[test]
    fn test_classify_success_passes_records_through() {
        assert_eq!(
            SearchOutcome::classify(Ok(vec![photo(1)])),
            SearchOutcome::Success(vec![photo(1)])
        );
    }

    #[test]
    fn test_classify_failure() {
        let outcome = SearchOutcome::classify(Err(ApiError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
        }));
        assert_eq!(
            outcome,
            SearchOutcome::RequestFailed(
                "request failed with status 500: Internal Server Error".to_string()
            )
        );
    }
}
