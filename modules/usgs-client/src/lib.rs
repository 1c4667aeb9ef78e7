pub mod error;
pub mod types;

pub use error::{Result, UsgsError};
pub use types::{
    Coordinate, MetadataField, SceneFilter, SceneResult, SceneSearchData, SceneSearchRequest,
    SpatialFilter,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{ApiResponse, LoginTokenRequest};

const BASE_URL: &str = "https://m2m.cr.usgs.gov/api/api/json/stable";

pub struct UsgsClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    application_token: String,
}

impl UsgsClient {
    pub fn new(username: String, application_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            username,
            application_token,
        }
    }

    /// Point the client at a different M2M deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Exchange username + application token for a session API key.
    pub async fn login_token(&self) -> Result<String> {
        let body = LoginTokenRequest {
            username: self.username.clone(),
            token: self.application_token.clone(),
        };

        let api_key: Option<String> = self.post("login-token", None, &body).await?;
        let api_key = api_key.filter(|k| !k.is_empty()).ok_or(UsgsError::NoApiKey)?;
        tracing::info!(username = %self.username, "Authenticated with USGS M2M");
        Ok(api_key)
    }

    /// Search scenes of `request.dataset_name` inside a bounding rectangle.
    pub async fn scene_search(
        &self,
        api_key: &str,
        request: &SceneSearchRequest,
    ) -> Result<SceneSearchData> {
        let data: Option<SceneSearchData> = self.post("scene-search", Some(api_key), request).await?;
        let data = data.unwrap_or_default();
        tracing::debug!(
            dataset = %request.dataset_name,
            results = data.results.len(),
            total_hits = ?data.total_hits,
            "USGS scene search complete"
        );
        Ok(data)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: Option<&str>,
        body: &B,
    ) -> Result<Option<T>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut req = self.client.post(&url).json(body);
        if let Some(key) = api_key {
            req = req.header("X-Auth-Token", key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UsgsError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = resp.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&text)?;
        if let Some(code) = envelope.error_code {
            return Err(UsgsError::Api {
                code,
                message: envelope
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        Ok(envelope.data)
    }
}
