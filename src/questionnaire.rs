//! Questionnaire-taking session: one attempt, one answer sheet, one cursor.
//!
//! Phases per attempt:
//! `Loading → Active ⇄ AutoSaving`, `Active → Confirming → Submitting →
//! Completed`, `Confirming → Active` on cancel, and `Failed` from `Loading`
//! or `Submitting`. A failed submit keeps the answers and the draft so the
//! user can try again.

use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info, warn};

use crate::{
    draft::DraftStore,
    error::{Error, Result},
    gateway::QuestionnaireGateway,
    models::*,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Active,
    AutoSaving,
    Confirming,
    Submitting,
    Completed,
    /// `recoverable` is false when nothing was loaded and only a new Begin helps.
    Failed { message: String, recoverable: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to save, or nothing changed since the last save.
    Skipped,
    Saved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub missing: usize,
    pub percent: u32,
}

impl Progress {
    pub fn compute(answered: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (answered as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            answered,
            missing: total.saturating_sub(answered),
            percent,
        }
    }
}

/// question id → chosen option id, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet(BTreeMap<QuestionId, OptionId>);

impl AnswerSheet {
    pub fn get(&self, question_id: QuestionId) -> Option<OptionId> {
        self.0.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn set(&mut self, question_id: QuestionId, option_id: OptionId) {
        self.0.insert(question_id, option_id);
    }

    pub fn entries(&self) -> Vec<AnswerEntry> {
        self.0
            .iter()
            .map(|(&pregunta_id, &opcion_id)| AnswerEntry {
                pregunta_id,
                opcion_id,
            })
            .collect()
    }
}

pub struct SessionController {
    gateway: Arc<dyn QuestionnaireGateway>,
    drafts: Arc<dyn DraftStore>,
    phase: Phase,
    attempt_id: Option<AttemptId>,
    questionnaire: Option<Questionnaire>,
    answers: AnswerSheet,
    cursor: usize,
    /// bumped on every answer change
    revision: u64,
    saved_revision: u64,
    /// what the backend said about the last successful save
    receipt: Option<String>,
    notice: Option<String>,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn QuestionnaireGateway>, drafts: Arc<dyn DraftStore>) -> Self {
        Self {
            gateway,
            drafts,
            phase: Phase::Idle,
            attempt_id: None,
            questionnaire: None,
            answers: AnswerSheet::default(),
            cursor: 0,
            revision: 0,
            saved_revision: 0,
            receipt: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    pub fn questionnaire(&self) -> Option<&Questionnaire> {
        self.questionnaire.as_ref()
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn question_count(&self) -> usize {
        self.questionnaire.as_ref().map_or(0, |q| q.preguntas.len())
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questionnaire.as_ref()?.preguntas.get(self.cursor)
    }

    pub fn progress(&self) -> Progress {
        Progress::compute(self.answers.len(), self.question_count())
    }

    /// One-shot message for the next render (save confirmations, errors).
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    fn loaded(&self) -> bool {
        self.attempt_id.is_some() && self.questionnaire.is_some()
    }

    /// Active, or recovered from a failed submit.
    fn ensure_interactive(&mut self) -> Result<()> {
        match &self.phase {
            Phase::Active => Ok(()),
            Phase::Failed {
                recoverable: true, ..
            } if self.loaded() => {
                self.phase = Phase::Active;
                Ok(())
            }
            _ => Err(Error::InvalidState("el cuestionario no está activo")),
        }
    }

    pub async fn begin(&mut self, questionnaire_id: QuestionnaireId) -> Result<()> {
        if questionnaire_id <= 0 {
            return Err(Error::validation("Cuestionario inválido"));
        }
        self.phase = Phase::Loading;
        self.attempt_id = None;
        self.questionnaire = None;
        self.answers = AnswerSheet::default();
        self.cursor = 0;
        self.revision = 0;
        self.saved_revision = 0;

        match self.load(questionnaire_id).await {
            Ok(()) => {
                self.phase = Phase::Active;
                Ok(())
            }
            Err(e) => {
                warn!(questionnaire_id, error = %e, "could not load questionnaire");
                self.phase = Phase::Failed {
                    message: "Error al cargar el cuestionario. Intenta nuevamente.".into(),
                    recoverable: false,
                };
                Err(e)
            }
        }
    }

    async fn load(&mut self, questionnaire_id: QuestionnaireId) -> Result<()> {
        let attempt_id = self.gateway.start_attempt(questionnaire_id).await?;
        let mut questionnaire = self.gateway.fetch_questionnaire(questionnaire_id).await?;
        questionnaire.preguntas.sort_by_key(|q| q.orden);

        if let Some(draft) = self.drafts.get(attempt_id) {
            let mut restored = 0;
            for entry in draft {
                let valid = questionnaire
                    .preguntas
                    .iter()
                    .any(|q| q.id == entry.pregunta_id && q.has_option(entry.opcion_id));
                if valid {
                    self.answers.set(entry.pregunta_id, entry.opcion_id);
                    restored += 1;
                }
            }
            if restored > 0 {
                info!(attempt_id, restored, "restored answers from draft");
                self.revision = 1;
            }
        }

        self.attempt_id = Some(attempt_id);
        self.questionnaire = Some(questionnaire);
        Ok(())
    }

    pub fn select_option(&mut self, question_id: QuestionId, option_id: OptionId) -> Result<()> {
        self.ensure_interactive()?;
        let question = self
            .questionnaire
            .as_ref()
            .and_then(|q| q.preguntas.iter().find(|p| p.id == question_id))
            .ok_or_else(|| Error::validation("La pregunta no pertenece a este cuestionario"))?;
        if !question.has_option(option_id) {
            return Err(Error::validation("La opción no pertenece a esta pregunta"));
        }

        if self.answers.get(question_id) != Some(option_id) {
            self.answers.set(question_id, option_id);
            self.revision += 1;
        }
        Ok(())
    }

    pub fn navigate(&mut self, direction: Direction) -> Result<()> {
        self.ensure_interactive()?;
        let last = self.question_count().saturating_sub(1);
        self.cursor = match direction {
            Direction::Previous => self.cursor.saturating_sub(1),
            Direction::Next => (self.cursor + 1).min(last),
        };
        Ok(())
    }

    /// Jumps straight to a question, clamped to the valid range.
    pub fn go_to(&mut self, index: usize) -> Result<()> {
        self.ensure_interactive()?;
        self.cursor = index.min(self.question_count().saturating_sub(1));
        Ok(())
    }

    /// Non-final save of the whole sheet, then mirror it locally.
    ///
    /// Never returns an error; failures are logged and reported as
    /// [`SaveOutcome::Failed`].
    pub async fn autosave(&mut self) -> SaveOutcome {
        if self.phase != Phase::Active || self.answers.is_empty() {
            return SaveOutcome::Skipped;
        }
        let Some(attempt_id) = self.attempt_id else {
            return SaveOutcome::Skipped;
        };
        if self.revision == self.saved_revision {
            debug!(attempt_id, "no changes since last save");
            return SaveOutcome::Skipped;
        }

        self.phase = Phase::AutoSaving;
        let revision = self.revision;
        let entries = self.answers.entries();
        let outcome = match self.gateway.save_answers(attempt_id, &entries, false).await {
            Ok(receipt) => {
                self.drafts.put(attempt_id, &entries);
                self.saved_revision = revision;
                self.receipt = receipt.mensaje;
                info!(attempt_id, answered = entries.len(), "progress saved");
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!(attempt_id, error = %e, "autosave failed");
                SaveOutcome::Failed
            }
        };
        self.phase = Phase::Active;
        outcome
    }

    /// Explicit "save progress": same path as autosave, but tells the user.
    pub async fn save_progress(&mut self) -> SaveOutcome {
        if self.ensure_interactive().is_err() {
            return SaveOutcome::Skipped;
        }
        let outcome = self.autosave().await;
        let notice = match outcome {
            SaveOutcome::Saved => match self.receipt.take() {
                Some(msg) if !msg.trim().is_empty() => msg,
                _ => "Progreso guardado".to_string(),
            },
            SaveOutcome::Skipped if self.answers.is_empty() => "Aún no hay respuestas".into(),
            SaveOutcome::Skipped => "No hay cambios por guardar".into(),
            SaveOutcome::Failed => "No se pudo guardar el progreso".into(),
        };
        self.notice = Some(notice);
        outcome
    }

    /// Checks completeness and, if every question is answered, asks for
    /// confirmation.
    pub fn request_submit(&mut self) -> Result<()> {
        self.ensure_interactive()?;
        let progress = self.progress();
        if progress.missing > 0 {
            let err = Error::Incomplete {
                missing: progress.missing,
            };
            self.notice = Some(err.to_string());
            return Err(err);
        }
        self.phase = Phase::Confirming;
        Ok(())
    }

    pub fn cancel_submit(&mut self) -> Result<()> {
        if self.phase != Phase::Confirming {
            return Err(Error::InvalidState("no hay envío pendiente"));
        }
        self.phase = Phase::Active;
        Ok(())
    }

    /// Final save. On success the draft is dropped and the attempt id returned
    /// for the results view.
    pub async fn confirm_submit(&mut self) -> Result<AttemptId> {
        if self.phase != Phase::Confirming {
            return Err(Error::InvalidState("confirma el envío primero"));
        }
        let Some(attempt_id) = self.attempt_id else {
            return Err(Error::InvalidState("sin intento activo"));
        };

        self.phase = Phase::Submitting;
        let entries = self.answers.entries();
        match self.gateway.save_answers(attempt_id, &entries, true).await {
            Ok(_) => {
                self.drafts.clear(attempt_id);
                self.saved_revision = self.revision;
                self.phase = Phase::Completed;
                info!(attempt_id, "questionnaire submitted");
                Ok(attempt_id)
            }
            Err(e) => {
                warn!(attempt_id, error = %e, "final submit failed");
                let message = "Error al enviar el cuestionario. Intenta nuevamente.".to_string();
                self.notice = Some(message.clone());
                self.phase = Phase::Failed {
                    message,
                    recoverable: true,
                };
                Err(e)
            }
        }
    }
}
