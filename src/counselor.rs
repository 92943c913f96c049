//! Counselor dashboard: statistics, questionnaire listing and authoring.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    models::QuestionnaireId,
};

pub const CATEGORIES: [&str; 10] = [
    "Tecnología",
    "Ciencias Sociales",
    "Artes",
    "Negocios",
    "Salud",
    "Ingeniería",
    "Educación",
    "Comunicación",
    "Ciencias Naturales",
    "Deportes",
];

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Stats {
    pub total_estudiantes: u32,
    pub cuestionarios_activos: u32,
    pub respuestas_hoy: u32,
    pub promedio_completitud: f64,
}

impl Stats {
    /// Suggestions shown under the numbers.
    pub fn advice(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.promedio_completitud < 50.0 {
            out.push(concat!(
                "Considera enviar recordatorios a los estudiantes ",
                "que no han completado sus cuestionarios"
            ));
        }
        if self.cuestionarios_activos == 0 {
            out.push(concat!(
                "Crea al menos un cuestionario activo ",
                "para que los estudiantes puedan responder"
            ));
        }
        if self.total_estudiantes == 0 {
            out.push("Agrega estudiantes a tu institución para comenzar a usar el sistema");
        }
        if self.promedio_completitud >= 50.0 && self.respuestas_hoy > 0 {
            out.push("¡Gran trabajo! Tu participación estudiantil es excelente");
        }
        out
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RecentQuestionnaire {
    pub id: QuestionnaireId,
    pub titulo: String,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub activo: bool,
    #[serde(default)]
    pub respuestas_totales: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Activity {
    pub estudiante: String,
    pub cuestionario: String,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub recomendaciones: u32,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CounselorDashboard {
    pub nombre: String,
    pub institucion: String,
    pub estadisticas: Stats,
    pub cuestionarios_recientes: Vec<RecentQuestionnaire>,
    pub actividad_reciente: Vec<Activity>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CounselorQuestionnaire {
    pub id: QuestionnaireId,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub num_preguntas: u32,
    #[serde(default)]
    pub activo: bool,
    #[serde(default)]
    pub respuestas_totales: u32,
    #[serde(default)]
    pub resultados_completados: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveFilter {
    #[default]
    Todos,
    Activos,
    Inactivos,
}

/// Case-insensitive search over title and description plus the active filter.
pub fn filter_questionnaires<'a>(
    list: &'a [CounselorQuestionnaire],
    search: &str,
    active: ActiveFilter,
) -> Vec<&'a CounselorQuestionnaire> {
    let needle = search.trim().to_lowercase();
    list.iter()
        .filter(|q| {
            needle.is_empty()
                || q.titulo.to_lowercase().contains(&needle)
                || q.descripcion
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .filter(|q| match active {
            ActiveFilter::Todos => true,
            ActiveFilter::Activos => q.activo,
            ActiveFilter::Inactivos => !q.activo,
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub orden: u32,
    pub texto: String,
    pub categoria: String,
}

/// Blank question slots the authoring form starts with.
pub const DEFAULT_QUESTION_ROWS: usize = 3;
pub const MAX_QUESTION_ROWS: usize = 50;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewQuestionnaire {
    pub titulo: String,
    pub descripcion: String,
    pub activo: bool,
    pub num_preguntas: usize,
    pub preguntas: Vec<NewQuestion>,
}

/// Authoring form; question texts and categories arrive as parallel lists.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AuthoringForm {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub activo: Option<String>,
    #[serde(default, rename = "pregunta_texto")]
    pub textos: Vec<String>,
    #[serde(default, rename = "pregunta_categoria")]
    pub categorias: Vec<String>,
}

impl AuthoringForm {
    /// Validates before anything is sent; the first problem wins.
    ///
    /// Blank rows at the end of the form are unused slots and are dropped; a
    /// blank row followed by a filled one is still an error.
    pub fn into_questionnaire(mut self) -> Result<NewQuestionnaire> {
        while self.textos.last().is_some_and(|t| t.trim().is_empty()) {
            self.textos.pop();
        }
        self.categorias.truncate(self.textos.len());

        let titulo = self.titulo.trim().to_string();
        let descripcion = self.descripcion.trim().to_string();
        if titulo.is_empty() {
            return Err(Error::validation("El título es obligatorio"));
        }
        if descripcion.is_empty() {
            return Err(Error::validation("La descripción es obligatoria"));
        }
        if self.textos.is_empty() {
            return Err(Error::validation("Debe haber al menos una pregunta"));
        }

        let mut preguntas = Vec::with_capacity(self.textos.len());
        for (i, texto) in self.textos.iter().enumerate() {
            let texto = texto.trim();
            if texto.is_empty() {
                return Err(Error::validation(format!("La pregunta {} está vacía", i + 1)));
            }
            let categoria = self
                .categorias
                .get(i)
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .unwrap_or(CATEGORIES[0]);
            if !CATEGORIES.contains(&categoria) {
                return Err(Error::validation(format!(
                    "Categoría inválida en la pregunta {}",
                    i + 1
                )));
            }
            preguntas.push(NewQuestion {
                orden: (i + 1) as u32,
                texto: texto.to_string(),
                categoria: categoria.to_string(),
            });
        }

        Ok(NewQuestionnaire {
            titulo,
            descripcion,
            activo: self.activo.as_deref().map_or(false, |v| v != "false"),
            num_preguntas: preguntas.len(),
            preguntas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> AuthoringForm {
        AuthoringForm {
            titulo: " Intereses ".into(),
            descripcion: "Test vocacional".into(),
            activo: Some("on".into()),
            textos: vec!["¿Te gusta programar?".into(), "¿Te gusta dibujar?".into()],
            categorias: vec!["Tecnología".into(), "Artes".into()],
        }
    }

    #[test]
    fn authoring_builds_ordered_payload() {
        let q = form().into_questionnaire().unwrap();
        assert_eq!(q.titulo, "Intereses");
        assert!(q.activo);
        assert_eq!(q.num_preguntas, 2);
        assert_eq!(q.preguntas[1].orden, 2);
        assert_eq!(q.preguntas[1].categoria, "Artes");
    }

    #[test]
    fn trailing_blank_rows_are_unused_slots() {
        let mut f = form();
        f.textos.push("  ".into());
        f.categorias.push("Ciencias".into());
        let q = f.into_questionnaire().unwrap();
        assert_eq!(q.num_preguntas, 2);
        assert_eq!(q.preguntas.len(), 2);

        let mut f = form();
        f.textos = vec!["".into(), "".into(), "".into()];
        assert_eq!(
            f.into_questionnaire().unwrap_err().to_string(),
            "Debe haber al menos una pregunta"
        );
    }

    #[test]
    fn authoring_reports_first_problem() {
        let mut f = form();
        f.textos.insert(1, "   ".into());
        f.categorias.insert(1, "Ciencias".into());
        let err = f.into_questionnaire().unwrap_err();
        assert_eq!(err.to_string(), "La pregunta 2 está vacía");

        let mut f = form();
        f.titulo.clear();
        assert_eq!(
            f.into_questionnaire().unwrap_err().to_string(),
            "El título es obligatorio"
        );

        let mut f = form();
        f.textos.clear();
        assert!(f.into_questionnaire().is_err());

        let mut f = form();
        f.categorias[0] = "Magia".into();
        assert!(f.into_questionnaire().is_err());
    }

    #[test]
    fn missing_category_defaults_to_first() {
        let mut f = form();
        f.categorias.truncate(0);
        let q = f.into_questionnaire().unwrap();
        assert!(q.preguntas.iter().all(|p| p.categoria == "Tecnología"));
    }

    #[test]
    fn advice_follows_numbers() {
        let quiet = Stats::default();
        assert_eq!(quiet.advice().len(), 3);

        let busy = Stats {
            total_estudiantes: 40,
            cuestionarios_activos: 2,
            respuestas_hoy: 5,
            promedio_completitud: 80.0,
        };
        assert_eq!(
            busy.advice(),
            vec!["¡Gran trabajo! Tu participación estudiantil es excelente"]
        );
    }

    #[test]
    fn listing_filters() {
        let q = |id, titulo: &str, activo| CounselorQuestionnaire {
            id,
            titulo: titulo.into(),
            descripcion: Some("Orientación vocacional".into()),
            version: None,
            num_preguntas: 10,
            activo,
            respuestas_totales: 0,
            resultados_completados: 0,
        };
        let list = vec![q(1, "Intereses", true), q(2, "Aptitudes", false)];
        assert_eq!(filter_questionnaires(&list, "", ActiveFilter::Todos).len(), 2);
        assert_eq!(filter_questionnaires(&list, "apti", ActiveFilter::Todos)[0].id, 2);
        assert_eq!(filter_questionnaires(&list, "vocacional", ActiveFilter::Activos)[0].id, 1);
        assert!(filter_questionnaires(&list, "intereses", ActiveFilter::Inactivos).is_empty());
    }
}
