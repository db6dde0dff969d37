use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

use super::decode::{decode_filter_options, decode_photos};
use super::request::{Payload, Query};
use crate::config::{Config, MAX_SIMILAR_LIMIT};
use crate::error::FetchError;
use crate::state::data::Facet;

/// A downloaded hi-res image with its natural size in pixels
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// HTTP client for the filter-options, photo-search and similarity services.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    filters_url: String,
    photos_url: String,
    similar_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| FetchError::Transport {
                endpoint: "client",
                source,
            })?;

        info!("🌐 Using photo API at {}", config.api_base);

        Ok(Self {
            http,
            filters_url: config.filters_url(),
            photos_url: config.photos_url(),
            similar_url: config.similar_url(),
        })
    }

    /// Run one query against the matching service
    pub async fn execute(self, query: Query) -> Result<Payload, FetchError> {
        match query {
            Query::FilterOptions(scope) => {
                let body = self.get("filters", &self.filters_url, &facet_params(&scope)).await?;
                decode_filter_options(&body)
                    .map(Payload::Options)
                    .map_err(|source| FetchError::Malformed {
                        endpoint: "filters",
                        source,
                    })
            }
            Query::Photos(selection) => {
                let body = self.get("photos", &self.photos_url, &facet_params(&selection)).await?;
                decode_photos(&body)
                    .map(Payload::Photos)
                    .map_err(|source| FetchError::Malformed {
                        endpoint: "photos",
                        source,
                    })
            }
            Query::Similar { id, limit } => {
                let params = vec![
                    ("id".to_string(), id),
                    ("limit".to_string(), limit.min(MAX_SIMILAR_LIMIT).to_string()),
                ];
                let body = self.get("similar", &self.similar_url, &params).await?;
                decode_photos(&body)
                    .map(Payload::Photos)
                    .map_err(|source| FetchError::Malformed {
                        endpoint: "similar",
                        source,
                    })
            }
        }
    }

    /// Download raw image bytes (thumbnails)
    pub async fn fetch_bytes(self, url: String) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint: "image", source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint: "image", status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { endpoint: "image", source })?;
        Ok(bytes.to_vec())
    }

    /// Download a hi-res image and read its natural size from the header
    pub async fn fetch_image(self, url: String) -> Result<LoadedImage, FetchError> {
        let bytes = self.fetch_bytes(url).await?;

        // Header parsing can touch the whole buffer for some formats
        tokio::task::spawn_blocking(move || -> Result<LoadedImage, FetchError> {
            let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
                .with_guessed_format()
                .map_err(image::ImageError::IoError)?
                .into_dimensions()?;
            Ok(LoadedImage { bytes, width, height })
        })
        .await?
    }

    async fn get(
        &self,
        endpoint: &'static str,
        url: &str,
        params: &[(String, String)],
    ) -> Result<String, FetchError> {
        debug!("GET {} {:?}", url, params);

        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint, status });
        }

        response
            .text()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })
    }
}

/// Repeated `Facet=value` query parameters
fn facet_params(pairs: &[(Facet, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(facet, value)| (facet.as_str().to_string(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_params_repeat_keys() {
        let params = facet_params(&[
            (Facet::Year, "2023".to_string()),
            (Facet::Event, "F1".to_string()),
            (Facet::Event, "GT".to_string()),
        ]);
        assert_eq!(
            params,
            vec![
                ("Year".to_string(), "2023".to_string()),
                ("Event".to_string(), "F1".to_string()),
                ("Event".to_string(), "GT".to_string()),
            ]
        );
    }

    #[test]
    fn test_client_builds_endpoint_urls() {
        let config = Config {
            api_base: "http://localhost:9000".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.filters_url, "http://localhost:9000/filters");
        assert_eq!(client.similar_url, "http://localhost:9000/similar");
    }
}
