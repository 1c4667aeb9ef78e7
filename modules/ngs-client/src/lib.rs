pub mod error;
pub mod types;

pub use error::{NgsError, Result};
pub use types::SurveyMark;

const BASE_URL: &str = "https://geodesy.noaa.gov/api/nde";

pub struct NgsClient {
    client: reqwest::Client,
    base_url: String,
}

impl NgsClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different data explorer deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Survey marks inside a lat/lon rectangle.
    pub async fn marks_in_bounds(
        &self,
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Vec<SurveyMark>> {
        let url = format!("{}/bounds", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("minlat", min_lat),
                ("maxlat", max_lat),
                ("minlon", min_lon),
                ("maxlon", max_lon),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NgsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = resp.text().await?;
        let marks: Vec<SurveyMark> = serde_json::from_str(&text)?;
        tracing::debug!(count = marks.len(), "Fetched NGS survey marks");
        Ok(marks)
    }
}

impl Default for NgsClient {
    fn default() -> Self {
        Self::new()
    }
}
