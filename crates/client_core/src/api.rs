use async_trait::async_trait;
use reqwest::{redirect, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AccountId, ApiLayout},
    error::ErrorBody,
    protocol::{
        AccountRecord, CourseRecord, LoginForm, NewAccount, NewCourse, PasswordChangeRequest,
    },
};
use tracing::{debug, warn};

use crate::{
    config::{ClientSettings, ConfigError},
    endpoints::Endpoints,
    error::ApiFailure,
};

/// The remote service as the client sees it. Every method performs at most
/// one request and never retries.
#[async_trait]
pub trait AccountApi: Send + Sync {
    fn layout(&self) -> ApiLayout;
    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, ApiFailure>;
    async fn create_account(&self, account: &NewAccount) -> Result<AccountRecord, ApiFailure>;
    async fn delete_account(&self, username: &str) -> Result<(), ApiFailure>;
    async fn fetch_account(&self, username: &str) -> Result<AccountRecord, ApiFailure>;
    /// Succeeds when the server accepts the credentials.
    async fn login(&self, form: &LoginForm) -> Result<(), ApiFailure>;
    async fn change_password(
        &self,
        username: &str,
        request: &PasswordChangeRequest,
    ) -> Result<(), ApiFailure>;
    async fn list_courses(&self) -> Result<Vec<CourseRecord>, ApiFailure>;
    async fn create_course(&self, course: &NewCourse) -> Result<CourseRecord, ApiFailure>;
    async fn courses_for_professor(
        &self,
        professor_id: AccountId,
    ) -> Result<Vec<CourseRecord>, ApiFailure>;
}

pub struct HttpAccountApi {
    http: Client,
    endpoints: Endpoints,
}

impl HttpAccountApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let endpoints = Endpoints::new(&settings.base_url, settings.layout)?;
        // Login answers with a redirect to the profile page; that answer is
        // the success signal, so redirects are never followed.
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        accept_redirect: bool,
    ) -> Result<Response, ApiFailure> {
        let response = request.send().await.map_err(|err| {
            warn!(operation, error = %err, "request failed");
            ApiFailure::Transport(err.to_string())
        })?;

        let status = response.status();
        if status.is_success() || (accept_redirect && status.is_redirection()) {
            debug!(operation, status = status.as_u16(), "request completed");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = ErrorBody::parse(&body).and_then(|b| b.summary().map(str::to_string));
        debug!(
            operation,
            status = status.as_u16(),
            detail = detail.as_deref().unwrap_or(""),
            "request rejected"
        );
        Err(ApiFailure::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn json<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> Result<T, ApiFailure> {
        response.json::<T>().await.map_err(|err| {
            warn!(operation, error = %err, "response body did not decode");
            ApiFailure::Decode(err.to_string())
        })
    }
}

#[async_trait]
impl AccountApi for HttpAccountApi {
    fn layout(&self) -> ApiLayout {
        self.endpoints.layout()
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, ApiFailure> {
        let response = self
            .send("list_accounts", self.http.get(self.endpoints.accounts()), false)
            .await?;
        Self::json("list_accounts", response).await
    }

    async fn create_account(&self, account: &NewAccount) -> Result<AccountRecord, ApiFailure> {
        let request = self
            .http
            .post(self.endpoints.accounts())
            .json(&account.payload(self.layout()));
        let response = self.send("create_account", request, false).await?;
        let raw = response
            .text()
            .await
            .map_err(|err| ApiFailure::Transport(err.to_string()))?;

        // Some revisions answer 200 with an empty body.
        if raw.trim().is_empty() {
            return Ok(AccountRecord {
                id: None,
                username: account.username.clone(),
                first_name: account.first_name.clone(),
                last_name: account.last_name.clone(),
                email: account.email.clone(),
            });
        }
        serde_json::from_str(&raw).map_err(|err| ApiFailure::Decode(err.to_string()))
    }

    async fn delete_account(&self, username: &str) -> Result<(), ApiFailure> {
        let url = self.endpoints.account(username)?;
        self.send("delete_account", self.http.delete(url), false)
            .await?;
        Ok(())
    }

    async fn fetch_account(&self, username: &str) -> Result<AccountRecord, ApiFailure> {
        let url = self.endpoints.account_by_username(username)?;
        let response = self.send("fetch_account", self.http.get(url), false).await?;
        Self::json("fetch_account", response).await
    }

    async fn login(&self, form: &LoginForm) -> Result<(), ApiFailure> {
        self.send("login", self.http.post(self.endpoints.login()).form(form), true)
            .await?;
        Ok(())
    }

    async fn change_password(
        &self,
        username: &str,
        request: &PasswordChangeRequest,
    ) -> Result<(), ApiFailure> {
        let url = self.endpoints.password(username)?;
        self.send("change_password", self.http.put(url).json(request), false)
            .await?;
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<CourseRecord>, ApiFailure> {
        let url = self.endpoints.courses()?;
        let response = self.send("list_courses", self.http.get(url), false).await?;
        Self::json("list_courses", response).await
    }

    async fn create_course(&self, course: &NewCourse) -> Result<CourseRecord, ApiFailure> {
        let url = self.endpoints.courses()?;
        let response = self
            .send("create_course", self.http.post(url).json(course), false)
            .await?;
        Self::json("create_course", response).await
    }

    async fn courses_for_professor(
        &self,
        professor_id: AccountId,
    ) -> Result<Vec<CourseRecord>, ApiFailure> {
        let url = self.endpoints.professor_courses(professor_id)?;
        let response = self
            .send("courses_for_professor", self.http.get(url), false)
            .await?;
        Self::json("courses_for_professor", response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
