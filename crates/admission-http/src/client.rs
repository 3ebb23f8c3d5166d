//! REST implementation of [`AdmissionBackend`]

use crate::config::HttpConfig;
use crate::error::{classify_response, transport_error, HttpError};
use admission_core::{
    AdmissionSummary, BackendError, DraftFields, ExistingAdmission, SaveAck, ServerDraft,
    SubmissionPayload, SubmitReceipt,
};
use admission_sync::AdmissionBackend;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

const CHECK_EXISTING: &str = "admissions/check-existing/";
const DRAFT: &str = "admissions/draft/";
const SUBMIT: &str = "admissions/";
const MY_ADMISSION: &str = "admissions/my-admission/";

#[derive(Serialize)]
struct SaveDraftBody<'a> {
    draft_data: &'a DraftFields,
    current_step: u8,
}

/// Admission backend over the REST API
#[derive(Debug, Clone)]
pub struct HttpAdmissionBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAdmissionBackend {
    /// Create backend
    ///
    /// # Errors
    /// - `HttpError::InvalidBaseUrl` unless the base URL is http(s)
    /// - `HttpError::Client` if the client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HttpError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Get API root
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<(StatusCode, String), BackendError> {
        let response = builder.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        tracing::debug!(operation, status = status.as_u16(), "backend responded");
        Ok((status, body))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, BackendError> {
        let (status, body) = self.send(builder, operation).await?;
        if !status.is_success() {
            return Err(classify_response(status, &body));
        }
        decode(operation, &body)
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(operation, error = %e, "unexpected response shape");
        BackendError::Unknown(format!("malformed {operation} response: {e}"))
    })
}

#[async_trait]
impl AdmissionBackend for HttpAdmissionBackend {
    async fn check_existing_admission(&self) -> Result<ExistingAdmission, BackendError> {
        self.call(self.request(Method::GET, CHECK_EXISTING), "check_existing")
            .await
    }

    async fn get_draft(&self) -> Result<Option<ServerDraft>, BackendError> {
        let (status, body) = self
            .send(self.request(Method::GET, DRAFT), "get_draft")
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(classify_response(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode("get_draft", &body)
    }

    async fn save_draft(&self, fields: &DraftFields, current_step: u8) -> Result<SaveAck, BackendError> {
        let body = SaveDraftBody {
            draft_data: fields,
            current_step,
        };
        self.call(self.request(Method::POST, DRAFT).json(&body), "save_draft")
            .await
    }

    async fn clear_draft(&self) -> Result<(), BackendError> {
        let (status, body) = self
            .send(self.request(Method::DELETE, DRAFT), "clear_draft")
            .await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(classify_response(status, &body))
        }
    }

    async fn submit_application(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmitReceipt, BackendError> {
        self.call(self.request(Method::POST, SUBMIT).json(payload), "submit")
            .await
    }

    async fn get_my_admission(&self) -> Result<AdmissionSummary, BackendError> {
        self.call(self.request(Method::GET, MY_ADMISSION), "my_admission")
            .await
    }
}
