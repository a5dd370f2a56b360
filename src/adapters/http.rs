use crate::config::BackendConfig;
use crate::core::roster::{parse_roster_body, AthleteRoster};
use crate::domain::model::Submission;
use crate::domain::ports::ScoreBackend;
use crate::utils::error::{BoardError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

const ROSTER_ENDPOINT: &str = "dashboard_get/";
const RESULT_ENDPOINT: &str = "dashboard_set/";

/// Scoring backend reached over plain HTTP GET requests.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| BoardError::InvalidConfigValueError {
                field: "backend.base_url".to_string(),
                value: config.base_url.clone(),
                reason: e.to_string(),
            })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url.join(name).map_err(|e| BoardError::ConfigError {
            message: format!("cannot build {} endpoint: {}", name, e),
        })
    }
}

#[async_trait]
impl ScoreBackend for HttpBackend {
    async fn fetch_roster(&self, platform: u32, competition: u32) -> Result<AthleteRoster> {
        let url = self.endpoint(ROSTER_ENDPOINT)?;
        tracing::debug!("Making roster request to: {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("platform", platform.to_string()),
                ("competition", competition.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Roster response status: {}", status);
        if !status.is_success() {
            return Err(BoardError::roster(format!("status {}", status)));
        }

        let body = response.text().await?;
        parse_roster_body(&body)
    }

    async fn submit_result(&self, submission: &Submission) -> Result<String> {
        let url = self.endpoint(RESULT_ENDPOINT)?;
        tracing::debug!("Making result request to: {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("sportsmenid", submission.athlete_id.clone()),
                ("competition", submission.competition.to_string()),
                ("result", submission.result.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BoardError::submission(format!(
                "status {}: {}",
                status,
                body.trim()
            )));
        }
        Ok(body)
    }
}
