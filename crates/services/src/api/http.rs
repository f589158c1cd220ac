use std::sync::Arc;

use async_trait::async_trait;
use proctor_core::model::{GradeReport, SessionId, SkillLevel, SubmissionPayload};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::wire::{
    ErrorBody, GenerateRequest, GenerateResponse, RecordDto, SubmitRequest, SubmitResponse,
};
use super::{
    ApiConfig, AssessmentHistory, AssessmentRecord, GradingService, LoadedSession, QuestionSource,
    StaticToken, TokenProvider,
};
use crate::error::{ApiError, GenerationError, GradingError, HistoryError};

const GENERATE_PATH: &str = "/api/assessment/generate/";
const SUBMIT_PATH: &str = "/api/assessment/submit/";
const HISTORY_PATH: &str = "/api/assessment/history/";
const RESULT_PATH: &str = "/api/assessment/result/";

/// Talks to the assessment REST API over HTTP.
#[derive(Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    config: ApiConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpAssessmentApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssessmentApi")
            .field("base_url", &self.config.base_url)
            .field("request_timeout", &self.config.request_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpAssessmentApi {
    /// Build a client that authenticates with `config.token`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            tokens: Arc::new(StaticToken::new(config.token.clone())),
            config: config.clone(),
        })
    }

    /// Read the bearer token from `tokens` on every request instead.
    #[must_use]
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ApiError::HttpStatus { status, message });
        }
        Ok(response.json().await?)
    }
}

fn client_rejection(err: &ApiError) -> Option<String> {
    match err {
        ApiError::HttpStatus { status, message } if *status == StatusCode::BAD_REQUEST => {
            Some(message.clone())
        }
        _ => None,
    }
}

#[async_trait]
impl QuestionSource for HttpAssessmentApi {
    async fn start_session(
        &self,
        skill: &str,
        level: SkillLevel,
    ) -> Result<LoadedSession, GenerationError> {
        let request = self
            .client
            .post(self.config.endpoint(GENERATE_PATH))
            .json(&GenerateRequest {
                skill,
                level: level.as_str(),
            });
        let body: GenerateResponse = match self.send(request).await {
            Ok(body) => body,
            Err(err) => {
                return Err(match client_rejection(&err) {
                    Some(message) => GenerationError::Rejected(message),
                    None => GenerationError::Api(err),
                });
            }
        };
        Ok(body.into_loaded()?)
    }
}

#[async_trait]
impl GradingService for HttpAssessmentApi {
    async fn submit_session(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<GradeReport, GradingError> {
        let request = self
            .client
            .post(self.config.endpoint(SUBMIT_PATH))
            .json(&SubmitRequest::from(payload));
        match self.send::<SubmitResponse>(request).await {
            Ok(body) => Ok(body.into_report(payload.answers.len())),
            Err(err) => Err(match client_rejection(&err) {
                Some(message) => GradingError::Rejected(message),
                None => GradingError::Api(err),
            }),
        }
    }
}

#[async_trait]
impl AssessmentHistory for HttpAssessmentApi {
    async fn history(&self) -> Result<Vec<AssessmentRecord>, HistoryError> {
        let request = self.client.get(self.config.endpoint(HISTORY_PATH));
        let records: Vec<RecordDto> = self.send(request).await?;
        Ok(records.into_iter().map(AssessmentRecord::from).collect())
    }

    async fn session_record(&self, id: SessionId) -> Result<AssessmentRecord, HistoryError> {
        let path = format!("{RESULT_PATH}{}/", id.value());
        let request = self.client.get(self.config.endpoint(&path));
        match self.send::<RecordDto>(request).await {
            Ok(record) => Ok(record.into()),
            Err(ApiError::HttpStatus { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(HistoryError::NotFound(id.value()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_is_a_rejection() {
        let err = ApiError::HttpStatus {
            status: StatusCode::BAD_REQUEST,
            message: "Assessment already submitted.".into(),
        };
        assert_eq!(
            client_rejection(&err).as_deref(),
            Some("Assessment already submitted.")
        );

        let err = ApiError::HttpStatus {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream".into(),
        };
        assert_eq!(client_rejection(&err), None);
    }

    #[test]
    fn token_provider_can_be_swapped() {
        let api = HttpAssessmentApi::new(&ApiConfig::default().with_token(Some("a".into())))
            .unwrap()
            .with_token_provider(Arc::new(|| Some("b".to_string())));
        assert_eq!(api.tokens.token().as_deref(), Some("b"));
        assert_eq!(api.config().base_url, "http://localhost:8000");
    }
}
