//! HTTP gateway to the VocaRed backend.
//!
//! Pure translation of intents into REST calls. Authenticated calls take the
//! bearer token from the injected [`Credentials`]; a missing token fails
//! before any request is built.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    counselor::{CounselorDashboard, CounselorQuestionnaire, NewQuestionnaire},
    credentials::{Credentials, TokenPair},
    error::{Error, Result},
    identity::{DomainCheck, IdentityRecord, Institution, Profile, RegisterPayload},
    models::*,
};

#[async_trait]
pub trait QuestionnaireGateway: Send + Sync {
    async fn start_attempt(&self, questionnaire_id: QuestionnaireId) -> Result<AttemptId>;
    async fn fetch_questionnaire(&self, questionnaire_id: QuestionnaireId)
        -> Result<Questionnaire>;
    async fn save_answers(
        &self,
        attempt_id: AttemptId,
        answers: &[AnswerEntry],
        confirm: bool,
    ) -> Result<SaveReceipt>;
    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary>;
    async fn fetch_result_detail(&self, attempt_id: AttemptId) -> Result<ResultDetail>;
    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireSummary>>;
    async fn list_results(&self) -> Result<Vec<ResultSummary>>;
    async fn check_retake(&self, questionnaire_id: QuestionnaireId) -> Result<RetakeCheck>;
    async fn restart_questionnaire(
        &self,
        questionnaire_id: QuestionnaireId,
        reason: &str,
    ) -> Result<()>;
}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn dni_exists(&self, dni: &str) -> Result<bool>;
    async fn email_exists(&self, email: &str) -> Result<bool>;
    async fn validate_domain(&self, email: &str) -> Result<DomainCheck>;
    async fn lookup_identity(&self, dni: &str) -> Result<IdentityRecord>;
    async fn list_institutions(&self) -> Result<Vec<Institution>>;
    /// Exchanges credentials for tokens and stores them in the session.
    async fn login(&self, username: &str, password: &str) -> Result<()>;
    async fn me(&self) -> Result<Profile>;
    async fn register(&self, payload: &RegisterPayload) -> Result<Option<String>>;
    fn logout(&self);
}

#[async_trait]
pub trait CounselorGateway: Send + Sync {
    async fn fetch_counselor_dashboard(&self) -> Result<CounselorDashboard>;
    async fn list_counselor_questionnaires(&self) -> Result<Vec<CounselorQuestionnaire>>;
    async fn create_questionnaire(&self, draft: &NewQuestionnaire) -> Result<Option<String>>;
    async fn set_questionnaire_active(&self, id: QuestionnaireId, active: bool) -> Result<()>;
    async fn delete_questionnaire(&self, id: QuestionnaireId) -> Result<()>;
}

/// Shared HTTP plumbing: one connection pool for every browser session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("vocared-web/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Gateway bound to one browser session's credentials.
    pub fn for_session(&self, credentials: Arc<Credentials>) -> Backend {
        Backend {
            api: self.clone(),
            credentials,
        }
    }
}

#[derive(Clone)]
pub struct Backend {
    api: ApiClient,
    credentials: Arc<Credentials>,
}

#[derive(Serialize)]
struct LoginReq<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshReq<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResp {
    access: String,
}

#[derive(Deserialize)]
struct ExistsResp {
    #[serde(default)]
    exists: bool,
}

#[derive(Deserialize)]
struct RegisterResp {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct ActiveReq {
    activo: bool,
}

fn seg(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

impl Backend {
    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Sends an authenticated request, refreshing the access token once on 401.
    async fn authed<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let token = self.credentials.bearer()?;
        let resp = build(&self.api.http).bearer_auth(&token).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return decode(resp).await;
        }

        debug!("access token rejected, refreshing");
        self.refresh_access().await?;
        let token = self.credentials.bearer()?;
        let resp = build(&self.api.http).bearer_auth(&token).send().await?;
        decode(resp).await
    }

    async fn refresh_access(&self) -> Result<()> {
        let Some(refresh) = self.credentials.refresh_token() else {
            self.credentials.clear();
            return Err(Error::Unauthorized);
        };
        let resp = self
            .api
            .http
            .post(self.api.url("/api/auth/token/refresh/"))
            .json(&RefreshReq { refresh: &refresh })
            .send()
            .await?;
        match decode::<RefreshResp>(resp).await {
            Ok(r) => {
                self.credentials.replace_access(r.access);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, dropping session");
                self.credentials.clear();
                Err(Error::Unauthorized)
            }
        }
    }

    async fn public<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        decode(req.send().await?).await
    }
}

/// Maps a backend response onto `T` or the error taxonomy.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;

    if status.is_success() {
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        return Ok(serde_json::from_str(body)?);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
        StatusCode::NOT_FOUND => Err(Error::NotFound),
        _ => Err(Error::Server {
            status: status.as_u16(),
            message: server_message(&body)
                .unwrap_or_else(|| format!("El servidor respondió {}", status.as_u16())),
        }),
    }
}

/// Picks the human-readable message out of an error body.
pub fn server_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    for key in ["error", "detail", "message"] {
        if let Some(s) = v.get(key).and_then(Value::as_str) {
            return Some(s.to_string());
        }
    }
    // {"errors": {"dni": ["Ya registrado"]}} or {"dni": ["..."]}
    let fields = v.get("errors").unwrap_or(&v).as_object()?;
    fields.values().find_map(|f| match f {
        Value::String(s) => Some(s.clone()),
        Value::Array(a) => a.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

#[async_trait]
impl QuestionnaireGateway for Backend {
    async fn start_attempt(&self, questionnaire_id: QuestionnaireId) -> Result<AttemptId> {
        let url = self.api.url("/api/estudiante/cuestionarios/iniciar/");
        let body = StartAttemptReq {
            cuestionario_id: questionnaire_id,
        };
        let resp: StartAttemptResp = self.authed(|c| c.post(&url).json(&body)).await?;
        info!(questionnaire_id, attempt_id = resp.intento_id, "attempt started");
        Ok(resp.intento_id)
    }

    async fn fetch_questionnaire(
        &self,
        questionnaire_id: QuestionnaireId,
    ) -> Result<Questionnaire> {
        let url = self
            .api
            .url(&format!("/api/estudiante/cuestionarios/{questionnaire_id}/"));
        self.authed(|c| c.get(&url)).await
    }

    async fn save_answers(
        &self,
        attempt_id: AttemptId,
        answers: &[AnswerEntry],
        confirm: bool,
    ) -> Result<SaveReceipt> {
        let url = self.api.url("/api/estudiante/cuestionarios/guardar/");
        let body = SaveAnswersReq {
            intento_id: attempt_id,
            respuestas: answers.to_vec(),
            confirmar: confirm,
        };
        let receipt: Option<SaveReceipt> = self.authed(|c| c.post(&url).json(&body)).await?;
        Ok(receipt.unwrap_or_default())
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary> {
        let url = self.api.url("/api/estudiante/dashboard/");
        self.authed(|c| c.get(&url)).await
    }

    async fn fetch_result_detail(&self, attempt_id: AttemptId) -> Result<ResultDetail> {
        let url = self
            .api
            .url(&format!("/api/estudiante/resultados/{attempt_id}/"));
        self.authed(|c| c.get(&url)).await
    }

    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireSummary>> {
        let url = self.api.url("/api/estudiante/cuestionarios/");
        self.authed(|c| c.get(&url)).await
    }

    async fn list_results(&self) -> Result<Vec<ResultSummary>> {
        let url = self.api.url("/api/estudiante/resultados/");
        self.authed(|c| c.get(&url)).await
    }

    async fn check_retake(&self, questionnaire_id: QuestionnaireId) -> Result<RetakeCheck> {
        let url = self.api.url(&format!(
            "/api/estudiante/cuestionarios/{questionnaire_id}/verificar-retomar/"
        ));
        self.authed(|c| c.get(&url)).await
    }

    async fn restart_questionnaire(
        &self,
        questionnaire_id: QuestionnaireId,
        reason: &str,
    ) -> Result<()> {
        let url = self.api.url(&format!(
            "/api/estudiante/cuestionarios/{questionnaire_id}/reiniciar/"
        ));
        let body = RetakeReq {
            razon: reason.to_string(),
        };
        let _: Value = self.authed(|c| c.post(&url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityGateway for Backend {
    async fn dni_exists(&self, dni: &str) -> Result<bool> {
        let url = self.api.url(&format!("/api/check-dni/{}/", seg(dni)));
        let r: ExistsResp = self.public(self.api.http.get(url)).await?;
        Ok(r.exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let url = self.api.url(&format!("/api/check-email/{}/", seg(email)));
        let r: ExistsResp = self.public(self.api.http.get(url)).await?;
        Ok(r.exists)
    }

    async fn validate_domain(&self, email: &str) -> Result<DomainCheck> {
        let url = self
            .api
            .url(&format!("/api/validate-domain/?email={}", seg(email)));
        let resp = self.api.http.get(url).send().await?;
        // a rejected domain comes back as 400 with the same body shape
        if resp.status() == StatusCode::BAD_REQUEST {
            let body = resp.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }
        decode(resp).await
    }

    async fn lookup_identity(&self, dni: &str) -> Result<IdentityRecord> {
        let url = self.api.url(&format!("/api/reniec/mock/{}/", seg(dni)));
        self.public(self.api.http.get(url)).await
    }

    async fn list_institutions(&self) -> Result<Vec<Institution>> {
        let url = self.api.url("/api/instituciones/");
        self.public(self.api.http.get(url)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = self.api.url("/api/auth/token/");
        let resp = self
            .api
            .http
            .post(url)
            .json(&LoginReq { username, password })
            .send()
            .await?;
        // bad credentials are a 401 here, not an expired session
        if resp.status() == StatusCode::UNAUTHORIZED {
            let body = resp.text().await?;
            return Err(Error::Server {
                status: 401,
                message: server_message(&body)
                    .unwrap_or_else(|| "Contraseña incorrecta".to_string()),
            });
        }
        let tokens: TokenPair = decode(resp).await?;
        self.credentials.set(tokens);
        Ok(())
    }

    async fn me(&self) -> Result<Profile> {
        let url = self.api.url("/api/auth/me/");
        self.authed(|c| c.get(&url)).await
    }

    async fn register(&self, payload: &RegisterPayload) -> Result<Option<String>> {
        let url = self.api.url("/api/auth/register/");
        let resp = self.api.http.post(url).json(payload).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let parsed: Option<RegisterResp> = serde_json::from_str(&body).ok();
        match parsed {
            Some(r) if status.is_success() && r.success => Ok(r.message),
            _ => Err(Error::Server {
                status: status.as_u16(),
                message: server_message(&body)
                    .unwrap_or_else(|| "Error al registrarse".to_string()),
            }),
        }
    }

    fn logout(&self) {
        self.credentials.clear();
    }
}

#[async_trait]
impl CounselorGateway for Backend {
    async fn fetch_counselor_dashboard(&self) -> Result<CounselorDashboard> {
        let url = self.api.url("/api/orientador/dashboard/");
        self.authed(|c| c.get(&url)).await
    }

    async fn list_counselor_questionnaires(&self) -> Result<Vec<CounselorQuestionnaire>> {
        let url = self.api.url("/api/orientador/cuestionarios/");
        self.authed(|c| c.get(&url)).await
    }

    async fn create_questionnaire(&self, draft: &NewQuestionnaire) -> Result<Option<String>> {
        let url = self.api.url("/api/orientador/cuestionarios/crear/");
        let v: Value = self.authed(|c| c.post(&url).json(draft)).await?;
        Ok(v.get("message").and_then(Value::as_str).map(str::to_string))
    }

    async fn set_questionnaire_active(&self, id: QuestionnaireId, active: bool) -> Result<()> {
        let url = self
            .api
            .url(&format!("/api/orientador/cuestionarios/{id}/actualizar/"));
        let body = ActiveReq { activo: active };
        let _: Value = self.authed(|c| c.put(&url).json(&body)).await?;
        Ok(())
    }

    async fn delete_questionnaire(&self, id: QuestionnaireId) -> Result<()> {
        let url = self
            .api
            .url(&format!("/api/orientador/cuestionarios/{id}/eliminar/"));
        let _: Value = self.authed(|c| c.delete(&url)).await?;
        Ok(())
    }
}
