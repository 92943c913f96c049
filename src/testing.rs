// In-memory stand-ins for the backend, shared by unit tests.

use async_trait::async_trait;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Mutex};

use crate::{
    error::{Error, Result},
    gateway::QuestionnaireGateway,
    models::*,
};

pub fn three_questions() -> Questionnaire {
    let q = |id: i64, orden| Question {
        id,
        orden,
        categoria: "General".into(),
        texto: format!("Pregunta {id}"),
        opciones: vec![
            AnswerOption { id: id * 10 + 1, texto: "Sí".into() },
            AnswerOption { id: id * 10 + 2, texto: "No".into() },
        ],
    };
    Questionnaire {
        id: 1,
        nombre: "Intereses".into(),
        descripcion: None,
        // out of order on purpose
        preguntas: vec![q(3, 3), q(1, 1), q(2, 2)],
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub saves: Mutex<Vec<(AttemptId, Vec<AnswerEntry>, bool)>>,
    pub fail_saves: AtomicBool,
    pub missing_questionnaire: bool,
    /// message echoed back on successful saves
    pub receipt: Mutex<Option<String>>,
}

impl FakeGateway {
    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[async_trait]
impl QuestionnaireGateway for FakeGateway {
    async fn start_attempt(&self, _q: QuestionnaireId) -> Result<AttemptId> {
        Ok(77)
    }

    async fn fetch_questionnaire(&self, _q: QuestionnaireId) -> Result<Questionnaire> {
        if self.missing_questionnaire {
            return Err(Error::NotFound);
        }
        Ok(three_questions())
    }

    async fn save_answers(
        &self,
        attempt_id: AttemptId,
        answers: &[AnswerEntry],
        confirm: bool,
    ) -> Result<SaveReceipt> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Server {
                status: 500,
                message: "boom".into(),
            });
        }
        self.saves
            .lock()
            .unwrap()
            .push((attempt_id, answers.to_vec(), confirm));
        Ok(SaveReceipt {
            mensaje: self.receipt.lock().unwrap().clone(),
        })
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary> {
        Ok(DashboardSummary::default())
    }

    async fn fetch_result_detail(&self, _a: AttemptId) -> Result<ResultDetail> {
        Err(Error::NotFound)
    }

    async fn list_questionnaires(&self) -> Result<Vec<QuestionnaireSummary>> {
        Ok(vec![])
    }

    async fn list_results(&self) -> Result<Vec<ResultSummary>> {
        Ok(vec![])
    }

    async fn check_retake(&self, _q: QuestionnaireId) -> Result<RetakeCheck> {
        Ok(RetakeCheck {
            puede_retomar: false,
            resultado_anterior: None,
        })
    }

    async fn restart_questionnaire(&self, _q: QuestionnaireId, _r: &str) -> Result<()> {
        Ok(())
    }
}
