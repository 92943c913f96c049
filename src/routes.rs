use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use http::StatusCode;
use serde::Deserialize;
use std::{path::Path as FsPath, sync::Arc};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{
    counselor::{filter_questionnaires, ActiveFilter, AuthoringForm, DEFAULT_QUESTION_ROWS},
    error::Error,
    gateway::{CounselorGateway, QuestionnaireGateway},
    identity::{IdentityFlow, ProfileForm, Role, Step},
    models::{AttemptId, OptionId, QuestionId, QuestionnaireId},
    questionnaire::{Direction, Phase, SessionController},
    state::{ActiveAttempt, AppState, BrowserSession, SESSION_COOKIE},
    views::{self, AttemptView},
};

pub fn router(state: AppState, static_dir: impl AsRef<FsPath>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // identity
        .route("/", get(home))
        .route("/auth/dni", post(submit_dni))
        .route("/auth/password", post(submit_password))
        .route("/auth/rol", post(choose_role))
        .route("/auth/registro", post(register))
        .route("/auth/fortaleza", post(password_strength))
        .route("/auth/cambiar-dni", post(change_dni))
        .route("/auth/salir", post(logout))
        // student
        .route("/estudiante/dashboard", get(student_dashboard))
        .route("/estudiante/cuestionarios/:id/iniciar", post(start_questionnaire))
        .route("/estudiante/cuestionarios/:id/retomar", post(retake_questionnaire))
        .route("/estudiante/intento", get(attempt_page))
        .route("/estudiante/intento/responder", post(answer))
        .route("/estudiante/intento/navegar", post(navigate))
        .route("/estudiante/intento/guardar", post(save_progress))
        .route("/estudiante/intento/finalizar", post(request_submit))
        .route("/estudiante/intento/cancelar", post(cancel_submit))
        .route("/estudiante/intento/confirmar", post(confirm_submit))
        .route("/estudiante/resultado/:id", get(result_page))
        // counselor
        .route("/orientador/dashboard", get(counselor_dashboard))
        .route("/orientador/cuestionarios", post(create_questionnaire))
        .route("/orientador/cuestionarios/:id/estado", post(toggle_questionnaire))
        .route("/orientador/cuestionarios/:id/eliminar", post(delete_questionnaire))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

// --- identity ---

async fn home(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if s.is_logged_in() && s.role.is_some() {
        return (jar, Redirect::to(Role::home_path(s.role))).into_response();
    }
    let flash = s.flash.take();
    (jar, views::identity_page(&s.identity, flash.as_deref())).into_response()
}

#[derive(Deserialize)]
struct DniForm {
    #[serde(default)]
    dni: String,
}

async fn submit_dni(
    State(st): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DniForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut guard = session.lock().await;
    let s = &mut *guard;
    let first = s.identity.submit_identifier(&s.backend, &form.dni).await;
    if let Err(Error::InvalidState(_)) = first {
        // a stale form from an earlier step; start over with what was typed
        s.identity = IdentityFlow::new();
        let retry = s.identity.submit_identifier(&s.backend, &form.dni).await;
        if let Err(e) = retry {
            warn!(error = %e, "identifier lookup failed after restarting the flow");
        }
    }
    (jar, Redirect::to("/")).into_response()
}

#[derive(Deserialize)]
struct PasswordForm {
    #[serde(default)]
    password: String,
}

async fn submit_password(
    State(st): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PasswordForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut guard = session.lock().await;
    let s = &mut *guard;
    let outcome = s.identity.submit_password(&s.backend, &form.password).await;
    match outcome {
        Ok(dest) => {
            s.role = match s.identity.step() {
                Step::LoggedIn { role } => *role,
                _ => None,
            };
            if s.role.is_none() {
                s.logout();
                s.flash = Some("No se pudo obtener tu perfil. Intenta nuevamente.".into());
            }
            (jar, Redirect::to(dest)).into_response()
        }
        Err(_) => (jar, Redirect::to("/")).into_response(),
    }
}

#[derive(Deserialize)]
struct RoleForm {
    rol: Role,
}

async fn choose_role(
    State(st): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RoleForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut guard = session.lock().await;
    let s = &mut *guard;
    if let Err(e) = s.identity.choose_role(&s.backend, form.rol).await {
        warn!(error = %e, "role chosen out of order");
    }
    (jar, Redirect::to("/")).into_response()
}

async fn register(
    State(st): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut guard = session.lock().await;
    let s = &mut *guard;
    if let Ok(message) = s.identity.submit_profile(&s.backend, &form).await {
        s.identity = IdentityFlow::new();
        s.flash = Some(message);
    }
    (jar, Redirect::to("/")).into_response()
}

async fn password_strength(Form(form): Form<PasswordForm>) -> Html<String> {
    Html(views::strength_meter(&form.password))
}

async fn change_dni(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = st.session(jar).await;
    session.lock().await.identity.change_identifier();
    (jar, Redirect::to("/")).into_response()
}

async fn logout(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = st.session(jar).await;
    session.lock().await.logout();
    st.forget(&jar).await;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    info!("session closed");
    (jar, Redirect::to("/")).into_response()
}

// --- helpers ---

fn require_role(s: &BrowserSession, role: Role) -> Result<(), Redirect> {
    if !s.is_logged_in() {
        return Err(Redirect::to("/"));
    }
    if s.role != Some(role) {
        return Err(Redirect::to(Role::home_path(s.role)));
    }
    Ok(())
}

/// Auth failures end the session; anything else renders an error page.
fn failure(s: &mut BrowserSession, e: Error, back: &str) -> Response {
    if e.is_auth() {
        s.logout();
        s.flash = Some(e.to_string());
        return Redirect::to("/").into_response();
    }
    warn!(error = %e, "request failed");
    (e.status(), views::error_page(&e.to_string(), back)).into_response()
}

/// The logged-in student's running attempt, or a redirect.
async fn attempt_of(
    st: &AppState,
    jar: CookieJar,
) -> Result<(CookieJar, Arc<Mutex<SessionController>>), Response> {
    let (jar, session) = st.session(jar).await;
    let s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Student) {
        return Err((jar, r).into_response());
    }
    match &s.attempt {
        Some(a) => Ok((jar, a.controller.clone())),
        None => Err((jar, Redirect::to("/estudiante/dashboard")).into_response()),
    }
}

fn back_to_attempt(jar: CookieJar) -> Response {
    (jar, Redirect::to("/estudiante/intento")).into_response()
}

// --- student ---

async fn student_dashboard(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Student) {
        return (jar, r).into_response();
    }
    let b = &s.backend;
    let loaded = tokio::try_join!(
        b.fetch_dashboard_summary(),
        b.list_questionnaires(),
        b.list_results()
    );
    match loaded {
        Ok((summary, questionnaires, results)) => {
            let flash = s.flash.take();
            let page = views::student_dashboard(
                &summary,
                &questionnaires,
                &results,
                flash.as_deref(),
            );
            (jar, page).into_response()
        }
        Err(e) => (jar, failure(&mut s, e, "/")).into_response(),
    }
}

/// Starts an attempt and its autosave timer, replacing any previous one.
async fn begin_attempt(
    st: &AppState,
    s: &mut BrowserSession,
    questionnaire_id: QuestionnaireId,
) -> Response {
    let mut controller = st.new_controller(&s.backend);
    match controller.begin(questionnaire_id).await {
        Ok(()) => {
            info!(questionnaire_id, "attempt opened");
            s.attempt = Some(ActiveAttempt::new(controller, st.autosave_every));
            Redirect::to("/estudiante/intento").into_response()
        }
        Err(e) => failure(s, e, "/estudiante/dashboard"),
    }
}

async fn start_questionnaire(
    State(st): State<AppState>,
    jar: CookieJar,
    Path(id): Path<QuestionnaireId>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Student) {
        return (jar, r).into_response();
    }
    (jar, begin_attempt(&st, &mut s, id).await).into_response()
}

#[derive(Deserialize)]
struct RetakeForm {
    #[serde(default)]
    razon: String,
}

async fn retake_questionnaire(
    State(st): State<AppState>,
    jar: CookieJar,
    Path(id): Path<QuestionnaireId>,
    Form(form): Form<RetakeForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Student) {
        return (jar, r).into_response();
    }
    let reason = form.razon.trim();
    if reason.is_empty() {
        s.flash = Some("Indica por qué quieres volver a dar el cuestionario".into());
        return (jar, Redirect::to("/estudiante/dashboard")).into_response();
    }

    let check = s.backend.check_retake(id).await;
    match check {
        Ok(c) if !c.puede_retomar => {
            s.flash = Some("Aún no puedes volver a dar este cuestionario".into());
            (jar, Redirect::to("/estudiante/dashboard")).into_response()
        }
        Ok(_) => match s.backend.restart_questionnaire(id, reason).await {
            Ok(()) => (jar, begin_attempt(&st, &mut s, id).await).into_response(),
            Err(e) => (jar, failure(&mut s, e, "/estudiante/dashboard")).into_response(),
        },
        Err(e) => (jar, failure(&mut s, e, "/estudiante/dashboard")).into_response(),
    }
}

async fn attempt_page(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    let mut c = controller.lock().await;
    match c.phase().clone() {
        Phase::Idle | Phase::Loading => return (jar, views::loading_page()).into_response(),
        Phase::Completed => {
            let to = c
                .attempt_id()
                .map(|id| format!("/estudiante/resultado/{id}"))
                .unwrap_or_else(|| "/estudiante/dashboard".into());
            return (jar, Redirect::to(&to)).into_response();
        }
        Phase::Failed {
            message,
            recoverable: false,
        } => {
            let page = views::error_page(&message, "/estudiante/dashboard");
            return (jar, (StatusCode::BAD_GATEWAY, page)).into_response();
        }
        _ => {}
    }

    let notice = c.take_notice();
    let (Some(questionnaire), Some(question)) = (c.questionnaire(), c.current_question()) else {
        let page =
            views::error_page("Este cuestionario no tiene preguntas", "/estudiante/dashboard");
        return (jar, page).into_response();
    };
    let view = AttemptView {
        questionnaire,
        question,
        index: c.cursor(),
        selected: c.answers().get(question.id),
        progress: c.progress(),
        phase: c.phase(),
        notice,
    };
    (jar, views::attempt_page(&view)).into_response()
}

#[derive(Deserialize)]
struct AnswerForm {
    pregunta_id: QuestionId,
    opcion_id: OptionId,
}

async fn answer(
    State(st): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AnswerForm>,
) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    let mut c = controller.lock().await;
    if let Err(e) = c.select_option(form.pregunta_id, form.opcion_id) {
        c.set_notice(e.to_string());
    }
    back_to_attempt(jar)
}

#[derive(Deserialize)]
struct NavForm {
    #[serde(default)]
    direccion: Option<String>,
    #[serde(default)]
    indice: Option<usize>,
}

async fn navigate(
    State(st): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NavForm>,
) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    let mut c = controller.lock().await;
    let moved = match (form.indice, form.direccion.as_deref()) {
        (Some(i), _) => c.go_to(i),
        (None, Some("anterior")) => c.navigate(Direction::Previous),
        (None, _) => c.navigate(Direction::Next),
    };
    if let Err(e) = moved {
        c.set_notice(e.to_string());
    }
    back_to_attempt(jar)
}

async fn save_progress(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    controller.lock().await.save_progress().await;
    back_to_attempt(jar)
}

async fn request_submit(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    let mut c = controller.lock().await;
    match c.request_submit() {
        Ok(()) | Err(Error::Incomplete { .. }) => {}
        Err(e) => c.set_notice(e.to_string()),
    }
    back_to_attempt(jar)
}

async fn cancel_submit(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    let _ = controller.lock().await.cancel_submit();
    back_to_attempt(jar)
}

async fn confirm_submit(State(st): State<AppState>, jar: CookieJar) -> Response {
    let (jar, controller) = match attempt_of(&st, jar).await {
        Ok(v) => v,
        Err(r) => return r,
    };
    let outcome: Result<AttemptId, Error> = controller.lock().await.confirm_submit().await;

    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    match outcome {
        Ok(id) => {
            // dropping the attempt stops its autosave timer
            s.attempt = None;
            (jar, Redirect::to(&format!("/estudiante/resultado/{id}"))).into_response()
        }
        Err(e) if e.is_auth() => (jar, failure(&mut s, e, "/")).into_response(),
        Err(_) => back_to_attempt(jar),
    }
}

async fn result_page(
    State(st): State<AppState>,
    jar: CookieJar,
    Path(id): Path<AttemptId>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Student) {
        return (jar, r).into_response();
    }
    let detail = s.backend.fetch_result_detail(id).await;
    match detail {
        Ok(d) => (jar, views::results_page(id, &d)).into_response(),
        Err(e) => (jar, failure(&mut s, e, "/estudiante/dashboard")).into_response(),
    }
}

// --- counselor ---

#[derive(Deserialize, Default)]
struct ListingQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    estado: ActiveFilter,
    /// question slots in the authoring form
    preguntas: Option<usize>,
}

async fn counselor_dashboard(
    State(st): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListingQuery>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Counselor) {
        return (jar, r).into_response();
    }
    let b = &s.backend;
    let loaded = tokio::try_join!(b.fetch_counselor_dashboard(), b.list_counselor_questionnaires());
    match loaded {
        Ok((dash, list)) => {
            let listing = filter_questionnaires(&list, &query.q, query.estado);
            let flash = s.flash.take();
            let rows = query.preguntas.unwrap_or(DEFAULT_QUESTION_ROWS);
            let page = views::counselor_page(
                &dash,
                &listing,
                &query.q,
                query.estado,
                rows,
                flash.as_deref(),
            );
            (jar, page).into_response()
        }
        Err(e) => (jar, failure(&mut s, e, "/")).into_response(),
    }
}

async fn create_questionnaire(
    State(st): State<AppState>,
    jar: CookieJar,
    axum_extra::extract::Form(form): axum_extra::extract::Form<AuthoringForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Counselor) {
        return (jar, r).into_response();
    }
    let draft = match form.into_questionnaire() {
        Ok(d) => d,
        Err(e) => {
            s.flash = Some(e.to_string());
            return (jar, Redirect::to("/orientador/dashboard")).into_response();
        }
    };
    let created = s.backend.create_questionnaire(&draft).await;
    match created {
        Ok(msg) => {
            info!(titulo = %draft.titulo, preguntas = draft.num_preguntas, "questionnaire created");
            s.flash = Some(msg.unwrap_or_else(|| "Cuestionario creado exitosamente".into()));
        }
        Err(e) if e.is_auth() => return (jar, failure(&mut s, e, "/")).into_response(),
        Err(e) => s.flash = Some(format!("Error al crear el cuestionario: {e}")),
    }
    (jar, Redirect::to("/orientador/dashboard")).into_response()
}

#[derive(Deserialize)]
struct ActiveForm {
    activo: bool,
}

async fn toggle_questionnaire(
    State(st): State<AppState>,
    jar: CookieJar,
    Path(id): Path<QuestionnaireId>,
    Form(form): Form<ActiveForm>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Counselor) {
        return (jar, r).into_response();
    }
    let updated = s.backend.set_questionnaire_active(id, form.activo).await;
    match updated {
        Ok(()) => {
            s.flash = Some(if form.activo {
                "Cuestionario activado".into()
            } else {
                "Cuestionario desactivado".into()
            })
        }
        Err(e) if e.is_auth() => return (jar, failure(&mut s, e, "/")).into_response(),
        Err(e) => s.flash = Some(format!("Error al actualizar el cuestionario: {e}")),
    }
    (jar, Redirect::to("/orientador/dashboard")).into_response()
}

async fn delete_questionnaire(
    State(st): State<AppState>,
    jar: CookieJar,
    Path(id): Path<QuestionnaireId>,
) -> Response {
    let (jar, session) = st.session(jar).await;
    let mut s = session.lock().await;
    if let Err(r) = require_role(&s, Role::Counselor) {
        return (jar, r).into_response();
    }
    let deleted = s.backend.delete_questionnaire(id).await;
    match deleted {
        Ok(()) => {
            info!(questionnaire_id = id, "questionnaire deleted");
            s.flash = Some("Cuestionario eliminado".into());
        }
        Err(e) if e.is_auth() => return (jar, failure(&mut s, e, "/")).into_response(),
        Err(e) => s.flash = Some(format!("Error al eliminar el cuestionario: {e}")),
    }
    (jar, Redirect::to("/orientador/dashboard")).into_response()
}
