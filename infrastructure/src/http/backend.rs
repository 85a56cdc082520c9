//! `reqwest` adapter for the agent backend.
//!
//! One client serves the three ports: chat dispatch, consensus status
//! polling and the model catalog.

use super::error::{HttpError, classify, rejection};
use super::wire::{ChatBody, ChatResponseBody, ModelsBody, PingBody, StatusBody};
use async_trait::async_trait;
use codeagent_application::{
    ChatDispatch, Credential, DispatchError, ModelCatalog, SessionStatusSource,
};
use codeagent_domain::{
    ChatReply, ChatRequest, Model, ModelAvailability, ModelInfo, SessionSnapshot, SessionToken,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, HttpError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("codeagent/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        info!("HTTP backend at {}", base_url);
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Read a success body as JSON or map the failure
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        session: Option<&str>,
    ) -> Result<T, DispatchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status, &body, session));
        }
        let bytes = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| DispatchError::Transport(format!("Malformed response body: {e}")))
    }
}

#[async_trait]
impl ChatDispatch for HttpBackend {
    async fn dispatch(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, DispatchError> {
        let body = ChatBody::new(request, credential.as_str());
        debug!(
            "POST /chat ({} history turn(s), consensus: {})",
            body.conversation_history.len(),
            body.consensus
        );

        let response = self
            .client
            .post(self.endpoint("chat"))
            .header(API_KEY_HEADER, credential.as_str())
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let body: ChatResponseBody = Self::read_json(response, None).await?;
        match (body.session_id, body.responses) {
            (Some(token), _) if !token.trim().is_empty() => {
                Ok(ChatReply::Session(SessionToken::new(token)))
            }
            (_, Some(replies)) => Ok(ChatReply::Direct(replies)),
            _ => Err(DispatchError::Transport(
                "Response carries neither replies nor a session id".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SessionStatusSource for HttpBackend {
    async fn fetch(&self, token: &SessionToken) -> Result<SessionSnapshot, DispatchError> {
        let response = self
            .client
            .get(self.endpoint(&format!("consensus/{}", token.as_str())))
            .send()
            .await
            .map_err(classify)?;

        let body: StatusBody = Self::read_json(response, Some(token.as_str())).await?;
        Ok(body.into_snapshot())
    }
}

#[async_trait]
impl ModelCatalog for HttpBackend {
    async fn list_models(&self, credential: &Credential) -> Result<Vec<ModelInfo>, DispatchError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .header(API_KEY_HEADER, credential.as_str())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify)?;

        let body: ModelsBody = Self::read_json(response, None).await?;
        Ok(body.into_models())
    }

    async fn ping(
        &self,
        model: &Model,
        credential: &Credential,
    ) -> Result<ModelAvailability, DispatchError> {
        debug!("POST /ping-model ({})", model);
        let response = self
            .client
            .post(self.endpoint("ping-model"))
            .query(&[("model", model.as_str()), ("api_key", credential.as_str())])
            .header(API_KEY_HEADER, credential.as_str())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify)?;

        let body: PingBody = Self::read_json(response, None).await?;
        Ok(body.into_availability())
    }
}
