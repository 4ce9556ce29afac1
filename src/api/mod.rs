use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::model::{BinCategory, BinSnapshot, DashboardSnapshot};

pub mod model;

use model::{
    AuthResponse, BinUpdate, Classification, ClassificationQuery, CollectionHistory, CurrentUser,
    DashboardPayload, ErrorBody, MessageResponse, RawBin, Registration, WasteLog,
};

const USER_AGENT: &str = concat!("binwatch/", env!("CARGO_PKG_VERSION"));
const GENERIC_FAILURE: &str = "Request failed";
const UNREADABLE_FAILURE: &str = "Network error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    Url(String),
    #[error("failed to reach backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message} (HTTP {status})")]
    Status { status: StatusCode, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unknown bin category '{0}' in response")]
    UnknownCategory(String),
}

impl ApiError {
    /// Text shown to the user: the backend's own message for HTTP failures,
    /// the error's display form otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Extract the `error` or `detail` field of a failure body.
pub fn failure_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .error
            .or(parsed.detail)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        Err(_) => UNREADABLE_FAILURE.to_string(),
    }
}

/// Where the poller gets its snapshots from.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// The backend authenticates with a session cookie, so the client keeps
    /// a cookie store for its lifetime.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .no_proxy()
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Request, ApiError> {
        self.build_query_request::<()>(method, path, None, body)
    }

    /// Like [`ApiClient::build_request`], with `query` encoded into the URL.
    pub fn build_query_request<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Request, ApiError> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| ApiError::Url(err.to_string()))?;
        let mut builder = self
            .http
            .request(method, endpoint)
            .header("Accept", "application/json");
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T, ApiError> {
        debug!(method = %request.method(), url = %request.url(), "sending api request");
        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            let message = failure_message(&body);
            warn!(%status, %message, "api request failed");
            return Err(ApiError::Status { status, message });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.build_request(Method::GET, path, None)?;
        self.execute(request).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let request = self.build_request(Method::POST, path, body)?;
        self.execute(request).await
    }

    #[instrument(skip_all)]
    pub async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        let payload: DashboardPayload = self.get("dashboard_data").await?;
        Ok(payload.normalize(Utc::now()))
    }

    /// Bins with categories outside the fixed set are dropped.
    #[instrument(skip_all)]
    pub async fn fetch_bins(&self) -> Result<Vec<BinSnapshot>, ApiError> {
        let raw: Vec<RawBin> = self.get("bins/").await?;
        Ok(raw.into_iter().filter_map(RawBin::into_snapshot).collect())
    }

    #[instrument(skip(self))]
    pub async fn fetch_bin(&self, category: BinCategory) -> Result<BinSnapshot, ApiError> {
        let raw: RawBin = self.get(&format!("bins/{}/", category.as_str())).await?;
        let kind = raw.kind.clone();
        raw.into_snapshot().ok_or(ApiError::UnknownCategory(kind))
    }

    /// Overwrite selected fields of one bin; returns the bin as stored.
    #[instrument(skip(self))]
    pub async fn update_bin_status(
        &self,
        category: BinCategory,
        update: &BinUpdate,
    ) -> Result<BinSnapshot, ApiError> {
        let body = serde_json::to_value(update)?;
        let request =
            self.build_request(Method::PATCH, &format!("bins/{}/", category.as_str()), Some(&body))?;
        let raw: RawBin = self.execute(request).await?;
        let kind = raw.kind.clone();
        raw.into_snapshot().ok_or(ApiError::UnknownCategory(kind))
    }

    #[instrument(skip(self))]
    pub async fn fetch_classifications(
        &self,
        query: &ClassificationQuery,
    ) -> Result<Vec<Classification>, ApiError> {
        let query = (!query.is_empty()).then_some(query);
        let request = self.build_query_request(Method::GET, "classifications/", query, None)?;
        self.execute(request).await
    }

    /// Raw sorting log kept by the classifier service.
    #[instrument(skip_all)]
    pub async fn fetch_waste_logs(&self) -> Result<Vec<WasteLog>, ApiError> {
        self.get("waste_logs").await
    }

    #[instrument(skip(self))]
    pub async fn fetch_history(
        &self,
        category: Option<BinCategory>,
    ) -> Result<Vec<CollectionHistory>, ApiError> {
        let path = match category {
            Some(cat) => format!("history/?bin_type={}", cat.as_str()),
            None => "history/".to_string(),
        };
        self.get(&path).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.post("auth/login/", Some(&body)).await
    }

    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let body = serde_json::to_value(registration)?;
        self.post("auth/register/", Some(&body)).await
    }

    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<String, ApiError> {
        let res: MessageResponse = self.post("auth/logout/", None).await?;
        Ok(res.message)
    }

    #[instrument(skip_all)]
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get("auth/user/").await
    }
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        ApiClient::fetch_dashboard(self).await
    }
}
