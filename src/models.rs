use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type QuestionnaireId = i64;
pub type AttemptId = i64;
pub type QuestionId = i64;
pub type OptionId = i64;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StartAttemptReq {
    pub cuestionario_id: QuestionnaireId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StartAttemptResp {
    pub intento_id: AttemptId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub preguntas: Vec<Question>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub orden: i32,
    #[serde(default)]
    pub categoria: String,
    pub texto: String,
    #[serde(default)]
    pub opciones: Vec<AnswerOption>,
}

impl Question {
    pub fn has_option(&self, option_id: OptionId) -> bool {
        self.opciones.iter().any(|o| o.id == option_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub id: OptionId,
    pub texto: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerEntry {
    pub pregunta_id: QuestionId,
    pub opcion_id: OptionId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SaveAnswersReq {
    pub intento_id: AttemptId,
    pub respuestas: Vec<AnswerEntry>,
    pub confirmar: bool,
}

/// Whatever the backend echoes after a save; the message becomes the save notice.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SaveReceipt {
    #[serde(default, alias = "message")]
    pub mensaje: Option<String>,
}

/// Local crash-recovery copy of an attempt's answers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DraftSnapshot {
    pub respuestas: Vec<AnswerEntry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub id: i64,
    pub carrera: String,
    pub score: f64,
    #[serde(default)]
    pub nivel: String,
    #[serde(default)]
    pub descripcion: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultDetail {
    pub cuestionario: String,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub total_respuestas: u32,
    #[serde(default)]
    pub recomendaciones: Vec<Recommendation>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSummary {
    pub cuestionarios_disponibles: u32,
    pub cuestionarios_completados: u32,
    pub ultima_evaluacion: Option<String>,
    pub fecha_ultima_evaluacion: Option<String>,
    pub recomendaciones_activas: u32,
    pub progreso: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionnaireSummary {
    pub id: QuestionnaireId,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub duracion: Option<String>,
    #[serde(default)]
    pub preguntas: Option<u32>,
    #[serde(default)]
    pub completado: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub id: AttemptId,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RetakeCheck {
    pub puede_retomar: bool,
    #[serde(default)]
    pub resultado_anterior: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RetakeReq {
    pub razon: String,
}
