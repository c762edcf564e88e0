//! Client for the upstream photo and manifest service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::manifest::MissionManifest;
use crate::search::{PhotoQuery, PhotoRecord};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed with status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),
}

/// The remote service as seen by the rest of the crate.
///
/// Both calls are single attempts; retries and caching are the caller's concern.
#[async_trait(?Send)]
pub trait RoverApi {
    async fn fetch_manifest(&self, mission_id: &str) -> Result<MissionManifest, ApiError>;

    async fn fetch_photos(&self, query: &PhotoQuery) -> Result<Vec<PhotoRecord>, ApiError>;
}

/// Maps a response status onto success (2xx) or [`ApiError::Status`] carrying the
/// status text.
pub fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    Err(ApiError::Status {
        status: status.as_u16(),
        reason: status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string(),
    })
}

#[derive(Deserialize)]
struct ManifestBody {
    landing_date: NaiveDate,
    max_date: NaiveDate,
    max_sol: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestResponse {
    Wrapped { photo_manifest: ManifestBody },
    Flat(ManifestBody),
}

#[derive(Deserialize)]
struct PhotosResponse {
    photos: Vec<PhotoResponse>,
}

#[derive(Deserialize)]
struct PhotoResponse {
    id: u64,
    img_src: String,
    earth_date: String,
    sol: u64,
    camera: NameResponse,
    rover: NameResponse,
}

#[derive(Deserialize)]
struct NameResponse {
    name: String,
}

/// Decodes a manifest body, accepting both the bare field set and the
/// `photo_manifest` envelope.
pub fn decode_manifest(mission_id: &str, body: &str) -> Result<MissionManifest, ApiError> {
    let body = match serde_json::from_str(body)? {
        ManifestResponse::Wrapped { photo_manifest } => photo_manifest,
        ManifestResponse::Flat(body) => body,
    };
    Ok(MissionManifest {
        mission_id: mission_id.to_lowercase(),
        landing_date: body.landing_date,
        most_recent_earth_date: body.max_date,
        most_recent_sol: body.max_sol,
    })
}

pub fn decode_photos(body: &str) -> Result<Vec<PhotoRecord>, ApiError> {
    let response: PhotosResponse = serde_json::from_str(body)?;
    Ok(response
        .photos
        .into_iter()
        .map(|p| PhotoRecord {
            id: p.id,
            image_url: p.img_src,
            earth_date: p.earth_date,
            sol: p.sol,
            camera_name: p.camera.name,
            rover_name: p.rover.name,
        })
        .collect())
}

pub struct HttpRoverApi {
    base_url: Url,
    api_key: Option<String>,
    photos_path: String,
    client: Client,
}

impl HttpRoverApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|_| ApiError::InvalidUrl(config.api_base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            photos_path: config.photos_path.clone(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("api_key", key);
        }
        url
    }

    /// `GET {base}/manifests/{mission}`
    pub fn manifest_url(&self, mission_id: &str) -> Url {
        self.endpoint(&["manifests", mission_id])
    }

    /// `GET {base}/{photos_path}?{sol|earth_date}=..&camera=..&rover=..`
    ///
    /// A `{rover}` segment in the configured path is filled with the mission id.
    /// The rover is also sent as a query parameter either way.
    pub fn photos_url(&self, query: &PhotoQuery) -> Url {
        let segments: Vec<&str> = self
            .photos_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| if s == "{rover}" { query.rover.as_str() } else { s })
            .collect();
        let mut url = self.endpoint(&segments);
        url.query_pairs_mut().extend_pairs(query.pairs());
        url
    }

    async fn get_text(&self, url: Url) -> Result<String, ApiError> {
        debug!("GET {}", redact_key(&url));
        let response = self.client.get(url).send().await?;
        check_status(response.status())?;
        Ok(response.text().await?)
    }
}

#[async_trait(?Send)]
impl RoverApi for HttpRoverApi {
    async fn fetch_manifest(&self, mission_id: &str) -> Result<MissionManifest, ApiError> {
        let body = self.get_text(self.manifest_url(mission_id)).await?;
        decode_manifest(mission_id, &body)
    }

    async fn fetch_photos(&self, query: &PhotoQuery) -> Result<Vec<PhotoRecord>, ApiError> {
        let body = self.get_text(self.photos_url(query)).await?;
        decode_photos(&body)
    }
}

fn redact_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    if url.query().is_none() {
        return redacted;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" { "***".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchCriteria;

    fn api(key: Option<&str>) -> HttpRoverApi {
        let config = Config {
            api_base_url: "https://example.test/mars-photos/api/v1".to_string(),
            api_key: key.map(str::to_string),
            photos_path: "photos".to_string(),
            ..Config::default()
        };
        HttpRoverApi::new(&config).unwrap()
    }

    #[test]
    fn test_manifest_url() {
        insta::assert_snapshot!(
            api(Some("KEY")).manifest_url("curiosity").as_str(),
            @"https://example.test/mars-photos/api/v1/manifests/curiosity?api_key=KEY"
        );
    }

    #[test]
    fn test_photos_url_for_sol() {
        let query = PhotoQuery::from_criteria(&SearchCriteria::new("150", "curiosity", "fhaz"));
        insta::assert_snapshot!(
            api(None).photos_url(&query).as_str(),
            @"https://example.test/mars-photos/api/v1/photos?sol=150&camera=fhaz&rover=curiosity"
        );
    }

    #[test]
    fn test_photos_url_for_earth_date() {
        let query =
            PhotoQuery::from_criteria(&SearchCriteria::new("2021-02-03", "spirit", "navcam"));
        insta::assert_snapshot!(
            api(Some("KEY")).photos_url(&query).as_str(),
            @"https://example.test/mars-photos/api/v1/photos?api_key=KEY&earth_date=2021-02-03&camera=navcam&rover=spirit"
        );
    }

    #[test]
    fn test_photos_url_for_default_config() {
        let api = HttpRoverApi::new(&Config::default()).unwrap();
        let query = PhotoQuery::from_criteria(&SearchCriteria::new("1000", "curiosity", "fhaz"));
        insta::assert_snapshot!(
            api.photos_url(&query).as_str(),
            @"https://api.nasa.gov/mars-photos/api/v1/rovers/curiosity/photos?api_key=DEMO_KEY&sol=1000&camera=fhaz&rover=curiosity"
        );
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let config = Config {
            api_base_url: "https://example.test/v1/".to_string(),
            api_key: None,
            ..Config::default()
        };
        let api = HttpRoverApi::new(&config).unwrap();
        assert_eq!(
            api.manifest_url("spirit").as_str(),
            "https://example.test/v1/manifests/spirit"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            HttpRoverApi::new(&config),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_redact_key() {
        let url = api(Some("SECRET")).manifest_url("spirit");
        assert!(!redact_key(&url).as_str().contains("SECRET"));
    }

    #[test]
    fn test_redact_key_without_query() {
        let url = api(None).manifest_url("spirit");
        assert_eq!(
            redact_key(&url).as_str(),
            "https://example.test/mars-photos/api/v1/manifests/spirit"
        );
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());

        let err = check_status(StatusCode::SERVICE_UNAVAILABLE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "request failed with status 503: Service Unavailable"
        );
        assert!(check_status(StatusCode::MOVED_PERMANENTLY).is_err());
    }

    #[test]
    fn test_decode_flat_manifest() {
        let manifest = decode_manifest(
            "Curiosity",
            r#"{"landing_date":"2012-08-06","max_date":"2023-01-01","max_sol":3800}"#,
        )
        .unwrap();
        assert_eq!(manifest.mission_id, "curiosity");
        assert_eq!(manifest.most_recent_sol, 3800);
        assert_eq!(
            manifest.landing_date,
            NaiveDate::from_ymd_opt(2012, 8, 6).unwrap()
        );
    }

    #[test]
    fn test_decode_wrapped_manifest() {
        let body = r#"{
            "photo_manifest": {
                "name": "Spirit",
                "landing_date": "2004-01-04",
                "launch_date": "2003-06-10",
                "status": "complete",
                "max_sol": 2208,
                "max_date": "2010-03-21",
                "total_photos": 124550
            }
        }"#;
        let manifest = decode_manifest("spirit", body).unwrap();
        assert_eq!(
            manifest.most_recent_earth_date,
            NaiveDate::from_ymd_opt(2010, 3, 21).unwrap()
        );
        assert_eq!(manifest.most_recent_sol, 2208);
    }

    #[test]
    fn test_decode_manifest_missing_fields() {
        assert!(matches!(
            decode_manifest("spirit", r#"{"landing_date":"2004-01-04"}"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_photos() {
        let body = r#"{"photos":[{
            "id": 102693,
            "sol": 1000,
            "camera": {"id": 20, "name": "FHAZ", "rover_id": 5},
            "img_src": "http://mars.example/FLB_486265257EDR_F0481570FHAZ00323M_.JPG",
            "earth_date": "2015-05-30",
            "rover": {"id": 5, "name": "Curiosity", "status": "active"}
        }]}"#;
        let photos = decode_photos(body).unwrap();
        assert_eq!(
            photos,
            vec![PhotoRecord {
                id: 102693,
                image_url: "http://mars.example/FLB_486265257EDR_F0481570FHAZ00323M_.JPG"
                    .to_string(),
                earth_date: "2015-05-30".to_string(),
                sol: 1000,
                camera_name: "FHAZ".to_string(),
                rover_name: "Curiosity".to_string(),
            }]
        );
    }

    #[test]
    fn test_decode_empty_photos() {
        assert!(decode_photos(r#"{"photos":[]}"#).unwrap().is_empty());
    }
}
