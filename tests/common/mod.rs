//! A small in-process stand-in for the VocaRed backend.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::net::TcpListener;

pub const ATTEMPT_ID: i64 = 501;
pub const PASSWORD: &str = "secreta123";
/// registered accounts; the second one is a counselor
pub const STUDENT_DNI: &str = "12345678";
pub const COUNSELOR_DNI: &str = "11112222";

pub struct MockBackend {
    /// every request path, in arrival order
    pub hits: Mutex<Vec<String>>,
    pub saves: Mutex<Vec<Value>>,
    /// the only access token currently accepted
    pub valid_token: Mutex<String>,
    pub refresh_ok: AtomicBool,
    pub fail_final_save: AtomicBool,
    /// username of the last successful login
    pub user: Mutex<String>,
    pub registered: Mutex<Vec<Value>>,
    pub retake_allowed: AtomicBool,
    pub retake_reasons: Mutex<Vec<String>>,
    /// counselor writes as (action, body)
    pub counselor_writes: Mutex<Vec<(String, Value)>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            hits: Mutex::new(Vec::new()),
            saves: Mutex::new(Vec::new()),
            valid_token: Mutex::new("acc-1".into()),
            refresh_ok: AtomicBool::new(true),
            fail_final_save: AtomicBool::new(false),
            user: Mutex::new(String::new()),
            registered: Mutex::new(Vec::new()),
            retake_allowed: AtomicBool::new(true),
            retake_reasons: Mutex::new(Vec::new()),
            counselor_writes: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    fn hit(&self, path: &str) {
        self.hits.lock().unwrap().push(path.to_string());
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<Value> {
        self.saves.lock().unwrap().clone()
    }

    pub fn registered(&self) -> Vec<Value> {
        self.registered.lock().unwrap().clone()
    }

    pub fn counselor_writes(&self) -> Vec<(String, Value)> {
        self.counselor_writes.lock().unwrap().clone()
    }

    fn counselor_write(&self, action: String, body: Value) {
        self.counselor_writes.lock().unwrap().push((action, body));
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

type Mock = State<Arc<MockBackend>>;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

/// Starts the mock on an ephemeral port and returns its base url.
pub async fn spawn() -> (String, Arc<MockBackend>) {
    let mock = Arc::new(MockBackend::default());
    let app = Router::new()
        .route("/api/auth/token/", post(token))
        .route("/api/auth/token/refresh/", post(refresh))
        .route("/api/auth/me/", get(me))
        .route("/api/auth/register/", post(register))
        .route("/api/check-dni/:dni/", get(check_dni))
        .route("/api/check-email/:email/", get(check_email))
        .route("/api/reniec/mock/:dni/", get(reniec))
        .route("/api/validate-domain/", get(validate_domain))
        .route("/api/instituciones/", get(institutions))
        .route("/api/estudiante/dashboard/", get(dashboard))
        .route("/api/estudiante/cuestionarios/", get(questionnaires))
        .route("/api/estudiante/cuestionarios/iniciar/", post(start))
        .route("/api/estudiante/cuestionarios/guardar/", post(save))
        .route("/api/estudiante/cuestionarios/:id/", get(questionnaire))
        .route(
            "/api/estudiante/cuestionarios/:id/verificar-retomar/",
            get(check_retake),
        )
        .route("/api/estudiante/cuestionarios/:id/reiniciar/", post(restart))
        .route("/api/estudiante/resultados/", get(results))
        .route("/api/estudiante/resultados/:id/", get(result_detail))
        .route("/api/orientador/dashboard/", get(counselor_dashboard))
        .route("/api/orientador/cuestionarios/", get(counselor_questionnaires))
        .route("/api/orientador/cuestionarios/crear/", post(create))
        .route("/api/orientador/cuestionarios/:id/actualizar/", put(update))
        .route("/api/orientador/cuestionarios/:id/eliminar/", delete(remove))
        .with_state(mock.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), mock)
}

async fn token(State(m): Mock, Json(body): Json<Value>) -> Response {
    m.hit("token");
    if body["password"] == PASSWORD {
        *m.valid_token.lock().unwrap() = "acc-1".into();
        *m.user.lock().unwrap() = body["username"].as_str().unwrap_or_default().to_string();
        Json(json!({"access": "acc-1", "refresh": "ref-1"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Credenciales inválidas"})),
        )
            .into_response()
    }
}

async fn refresh(State(m): Mock, Json(body): Json<Value>) -> Response {
    m.hit("refresh");
    if m.refresh_ok.load(Ordering::SeqCst) && body["refresh"] == "ref-1" {
        *m.valid_token.lock().unwrap() = "acc-2".into();
        Json(json!({"access": "acc-2"})).into_response()
    } else {
        unauthorized()
    }
}

async fn me(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("me");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    let user = m.user.lock().unwrap().clone();
    if user == COUNSELOR_DNI {
        return Json(json!({
            "user": COUNSELOR_DNI,
            "email": "luis@unsa.edu.pe",
            "first_name": "LUIS",
            "last_name": "ROJAS PAREDES",
            "rol": {"tipo_usuario": "Orientador"}
        }))
        .into_response();
    }
    Json(json!({
        "user": STUDENT_DNI,
        "email": "ana@gmail.com",
        "first_name": "ANA",
        "last_name": "QUISPE MAMANI",
        "rol": {"tipo_usuario": "Estudiante"}
    }))
    .into_response()
}

async fn register(State(m): Mock, Json(body): Json<Value>) -> Response {
    m.hit("register");
    if body["dni"] == STUDENT_DNI {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "El DNI ya está registrado"})),
        )
            .into_response();
    }
    m.registered.lock().unwrap().push(body);
    Json(json!({"success": true, "message": "Usuario registrado"})).into_response()
}

async fn check_dni(State(m): Mock, Path(dni): Path<String>) -> Json<Value> {
    m.hit("check-dni");
    Json(json!({"exists": dni == STUDENT_DNI || dni == COUNSELOR_DNI}))
}

async fn check_email(State(m): Mock, Path(email): Path<String>) -> Json<Value> {
    m.hit("check-email");
    Json(json!({"exists": email == "ana@gmail.com"}))
}

async fn reniec(State(m): Mock, Path(_dni): Path<String>) -> Json<Value> {
    m.hit("reniec");
    Json(json!({
        "success": true,
        "nombres": "LUIS",
        "apellidoPaterno": "ROJAS",
        "apellidoMaterno": "PAREDES",
        "fechaNacimiento": ""
    }))
}

async fn validate_domain(
    State(m): Mock,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    m.hit("validate-domain");
    let email = q.get("email").cloned().unwrap_or_default();
    if email.ends_with("@unsa.edu.pe") {
        Json(json!({"valid": true, "institucion": "UNSA", "tipo": "Universidad"})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"valid": false, "message": "Dominio no permitido para orientadores"})),
        )
            .into_response()
    }
}

async fn institutions(State(m): Mock) -> Json<Value> {
    m.hit("instituciones");
    Json(json!([{"InstiID": 5, "InstiNombre": "UNSA"}]))
}

async fn dashboard(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("dashboard");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "cuestionariosDisponibles": 1,
        "cuestionariosCompletados": 0,
        "recomendacionesActivas": 0,
        "progreso": 0
    }))
    .into_response()
}

async fn questionnaires(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("cuestionarios");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{
        "id": 9, "titulo": "Intereses Vocacionales", "descripcion": "Descubre tu vocación",
        "duracion": "10 min", "preguntas": 3, "completado": false
    }]))
    .into_response()
}

async fn start(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("iniciar");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"intento_id": ATTEMPT_ID})).into_response()
}

async fn questionnaire(State(m): Mock, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    m.hit("cuestionario");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    let q = |qid: i64, orden: i64| {
        json!({
            "id": qid, "orden": orden, "categoria": "Tecnología",
            "texto": format!("Pregunta número {orden}"),
            "opciones": [
                {"id": qid * 10 + 1, "texto": "Me encanta"},
                {"id": qid * 10 + 2, "texto": "No me interesa"}
            ]
        })
    };
    Json(json!({
        "id": id, "nombre": "Intereses Vocacionales",
        "preguntas": [q(2, 2), q(1, 1), q(3, 3)]
    }))
    .into_response()
}

async fn save(State(m): Mock, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    m.hit("guardar");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    if body["confirmar"] == true && m.fail_final_save.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "fallo interno"})),
        )
            .into_response();
    }
    m.saves.lock().unwrap().push(body);
    Json(json!({"mensaje": "Respuestas guardadas"})).into_response()
}

async fn results(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("resultados");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

async fn result_detail(State(m): Mock, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    m.hit("resultado");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    if id != ATTEMPT_ID {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado"}))).into_response();
    }
    Json(json!({
        "cuestionario": "Intereses Vocacionales",
        "fecha": "2026-10-18",
        "total_respuestas": 3,
        "recomendaciones": [
            {"id": 1, "carrera": "Ingeniería de Sistemas", "score": 87.5, "nivel": "Alto",
             "descripcion": "Afinidad con tecnología"}
        ]
    }))
    .into_response()
}

async fn check_retake(State(m): Mock, headers: HeaderMap, Path(_id): Path<i64>) -> Response {
    m.hit("verificar-retomar");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    let allowed = m.retake_allowed.load(Ordering::SeqCst);
    Json(json!({"puede_retomar": allowed, "resultado_anterior": {"id": ATTEMPT_ID}}))
        .into_response()
}

async fn restart(
    State(m): Mock,
    headers: HeaderMap,
    Path(_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    m.hit("reiniciar");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    let reason = body["razon"].as_str().unwrap_or_default().to_string();
    m.retake_reasons.lock().unwrap().push(reason);
    Json(json!({"success": true})).into_response()
}

async fn counselor_dashboard(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("orientador-dashboard");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "nombre": "Luis Rojas",
        "institucion": "UNSA",
        "estadisticas": {
            "total_estudiantes": 40, "cuestionarios_activos": 1,
            "respuestas_hoy": 3, "promedio_completitud": 75.0
        },
        "cuestionarios_recientes": [
            {"id": 9, "titulo": "Intereses Vocacionales", "version": "1.0",
             "activo": true, "respuestas_totales": 12}
        ],
        "actividad_reciente": [
            {"estudiante": "Ana Quispe", "cuestionario": "Intereses Vocacionales",
             "fecha": "2026-10-17", "recomendaciones": 3}
        ]
    }))
    .into_response()
}

async fn counselor_questionnaires(State(m): Mock, headers: HeaderMap) -> Response {
    m.hit("orientador-cuestionarios");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"id": 9, "titulo": "Intereses Vocacionales", "descripcion": "Descubre tu vocación",
         "version": "1.0", "num_preguntas": 3, "activo": true,
         "respuestas_totales": 12, "resultados_completados": 10},
        {"id": 10, "titulo": "Aptitudes", "descripcion": "Habilidades",
         "version": 2, "num_preguntas": 5, "activo": false,
         "respuestas_totales": 0, "resultados_completados": 0}
    ]))
    .into_response()
}

async fn create(State(m): Mock, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    m.hit("crear");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    m.counselor_write("crear".into(), body);
    Json(json!({"message": "Cuestionario creado exitosamente", "id": 11})).into_response()
}

async fn update(
    State(m): Mock,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    m.hit("actualizar");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    m.counselor_write(format!("actualizar/{id}"), body);
    Json(json!({"success": true})).into_response()
}

async fn remove(State(m): Mock, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    m.hit("eliminar");
    if !m.authorized(&headers) {
        return unauthorized();
    }
    if id != 9 && id != 10 {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado"}))).into_response();
    }
    m.counselor_write(format!("eliminar/{id}"), Value::Null);
    StatusCode::NO_CONTENT.into_response()
}
