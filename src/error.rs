use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> message, rendered inline next to the offending input.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No se pudo conectar con el servidor. Intenta nuevamente.")]
    Network(#[from] reqwest::Error),

    #[error("No has iniciado sesión")]
    MissingCredential,

    #[error("Tu sesión expiró, vuelve a iniciar sesión")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("Revisa los campos marcados")]
    Fields(FieldErrors),

    #[error("{}", missing_answers_message(*missing))]
    Incomplete { missing: usize },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Recurso no encontrado")]
    NotFound,

    #[error("Acción no permitida en este momento ({0})")]
    InvalidState(&'static str),

    #[error("Respuesta inesperada del servidor")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub fn missing_answers_message(missing: usize) -> String {
    if missing == 1 {
        "Falta 1 pregunta por responder".to_string()
    } else {
        format!("Faltan {missing} preguntas por responder")
    }
}

impl Error {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Error::Validation(msg.into())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::MissingCredential | Error::Unauthorized)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Network(_) | Error::Decode(_) => StatusCode::BAD_GATEWAY,
            Error::MissingCredential | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Validation(_) | Error::Fields(_) | Error::Incomplete { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::Server { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidState(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
