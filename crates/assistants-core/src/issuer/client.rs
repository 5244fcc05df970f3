//! HTTP client for the session endpoints

use std::sync::Arc;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::error::{IssueError, IssueResult};
use crate::config::{SessionConfig, DEFAULT_API_BASE};
use crate::logging::{LoggerExt, NoOpLogger, SharedLogger};
use crate::secrets::{SecretStore, UPLIFTAI_SECRET};

pub const CREATE_PUBLIC_SESSION: &str = "createPublicSession";
pub const CREATE_SESSION: &str = "createSession";

/// Token and room URL needed to join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub token: String,
    #[serde(rename = "wsUrl")]
    pub ws_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    participant_name: &'a str,
}

/// Issues session credentials for realtime assistants
pub struct SessionIssuer {
    client: Client,
    api_base: String,
    secrets: Option<Arc<dyn SecretStore>>,
    logger: SharedLogger,
}

impl SessionIssuer {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            secrets: None,
            logger: Arc::new(NoOpLogger::new()),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.api_base.clone())
    }

    /// Store holding the API key for private sessions
    pub fn with_secret_store(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Session for an assistant with public access enabled
    pub async fn create_public_session(
        &self,
        assistant_id: &str,
        participant_name: &str,
    ) -> IssueResult<SessionCredentials> {
        self.request(assistant_id, CREATE_PUBLIC_SESSION, participant_name, None)
            .await
    }

    /// Session for a private assistant, authenticated with the `upliftai` API key
    pub async fn create_session(
        &self,
        assistant_id: &str,
        participant_name: &str,
    ) -> IssueResult<SessionCredentials> {
        let api_key = self
            .secrets
            .as_ref()
            .and_then(|store| store.get(UPLIFTAI_SECRET))
            .ok_or(IssueError::MissingApiKey)?;

        self.request(assistant_id, CREATE_SESSION, participant_name, Some(&api_key))
            .await
    }

    fn endpoint(&self, assistant_id: &str, action: &str) -> IssueResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| IssueError::InvalidBaseUrl(format!("{}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| IssueError::InvalidBaseUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(["v1", "realtime-assistants", assistant_id, action]);
        Ok(url)
    }

    async fn request(
        &self,
        assistant_id: &str,
        action: &str,
        participant_name: &str,
        api_key: Option<&str>,
    ) -> IssueResult<SessionCredentials> {
        let assistant_id = assistant_id.trim();
        if assistant_id.is_empty() {
            return Err(IssueError::EmptyAssistantId);
        }

        let url = self.endpoint(assistant_id, action)?;
        self.logger.debug_fmt(format_args!("[SessionIssuer] POST {}", url));

        let mut request = self
            .client
            .post(url)
            .json(&SessionRequest { participant_name });
        if let Some(api_key) = api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            self.logger.error_fmt(format_args!("[SessionIssuer] Request failed: {}", e));
            IssueError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.logger.warn_fmt(format_args!(
                "[SessionIssuer] {} for assistant {} returned {}",
                action, assistant_id, status
            ));
            return Err(match status {
                StatusCode::NOT_FOUND => IssueError::AssistantNotFound(assistant_id.to_string()),
                StatusCode::FORBIDDEN if api_key.is_none() => {
                    IssueError::AssistantNotPublic(assistant_id.to_string())
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IssueError::Unauthorized {
                    status: status.as_u16(),
                },
                _ => IssueError::status(status.as_u16(), body),
            });
        }

        let body = response.text().await?;
        let credentials: SessionCredentials = serde_json::from_str(&body)
            .map_err(|e| IssueError::invalid_response(e.to_string()))?;
        if credentials.token.is_empty() || credentials.ws_url.is_empty() {
            return Err(IssueError::invalid_response("token and wsUrl must be non-empty"));
        }

        self.logger.info_fmt(format_args!(
            "[SessionIssuer] Session issued for assistant {}",
            assistant_id
        ));
        Ok(credentials)
    }
}

impl Default for SessionIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("api_base", &self.api_base)
            .field("has_secrets", &self.secrets.is_some())
            .finish_non_exhaustive()
    }
}
