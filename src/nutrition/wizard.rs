use serde::{Deserialize, Serialize};

use super::answers::{AnswerRecord, RecommendationRequest};
use super::plan::RecommendationPlan;
use super::summary::{answers_summary, format_plan};
use super::validator::{validate, Step};

pub const GREETING: &str = "Hola, soy tu asistente nutricional. Para recomendarte recetas personalizadas, necesito algunos datos tuyos. ¿Podrías proporcionarme tu peso (kg)?";
pub const PROCESSING: &str = "Procesando tu solicitud...";
pub const CLOSING: &str =
    "Si deseas realizar una nueva consulta, haz clic en el botón 'Limpiar Chat' arriba.";
const FALLBACK_ERROR: &str = "Hubo un problema al obtener las recomendaciones";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    #[serde(default)]
    pub has_export: bool,
}

/// Persisted form of a wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub messages: Vec<Message>,
    #[serde(rename = "userData")]
    pub answers: AnswerRecord,
    pub current_step: Step,
}

/// What a submission did to the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Blank input, nothing recorded.
    Ignored,
    /// A recommendation request is still pending.
    Busy,
    /// The answer failed validation and was reprompted.
    Rejected,
    /// The answer was stored and the wizard moved on to this step.
    Advanced(Step),
    /// Every answer is in; the caller must request recommendations and then
    /// call [`Wizard::complete`] or [`Wizard::fail`].
    Finalize(RecommendationRequest),
    /// The record could not be completed; the wizard started over.
    Failed,
}

/// Question asked after `completed` has been answered.
fn prompt_after(completed: Step) -> &'static str {
    match completed {
        Step::Peso => "Ahora, ingresa tu altura en centímetros (cm).",
        Step::Altura => "¿Cuál es tu edad?",
        Step::Edad => "Escribe tus restricciones dietéticas separadas por comas (ejemplo: Sin gluten, Vegetariano, Keto, Ninguna, Sin lactosa).",
        Step::Restricciones => "¿Prefieres recetas dulces o saladas?",
        Step::Preferencia => "¿Para cuántos días necesitas recomendaciones? (máximo 7 días)",
        Step::Dias => "",
    }
}

#[derive(Debug, Clone)]
pub struct Wizard {
    messages: Vec<Message>,
    answers: AnswerRecord,
    step: Step,
    next_id: u64,
    pending: Option<u64>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        let mut wizard = Self {
            messages: Vec::new(),
            answers: AnswerRecord::default(),
            step: Step::Peso,
            next_id: 1,
            pending: None,
        };
        wizard.push(Sender::Ai, GREETING, false);
        wizard
    }

    /// Rebuilds a wizard from storage: a non-empty snapshot wins, then the
    /// last stored result, then a fresh greeting.
    pub fn restore(snapshot: Option<Snapshot>, last: Option<(&str, &RecommendationPlan)>) -> Self {
        if let Some(snapshot) = snapshot.filter(|s| !s.messages.is_empty()) {
            let messages: Vec<Message> = snapshot
                .messages
                .into_iter()
                .filter(|m| !(m.sender == Sender::Ai && m.text == PROCESSING))
                .collect();
            let next_id = messages.iter().map(|m| m.id).max().unwrap_or(0) + 1;
            return Self {
                messages,
                answers: snapshot.answers,
                step: snapshot.current_step,
                next_id,
                pending: None,
            };
        }

        let mut wizard = Self::new();
        if let Some((summary, plan)) = last {
            wizard.messages.clear();
            wizard.push_result(summary, plan);
        }
        wizard
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            messages: self.messages.clone(),
            answers: self.answers.clone(),
            current_step: self.step,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Id of the processing notice while a request is outstanding.
    pub fn pending(&self) -> Option<u64> {
        self.pending
    }

    pub fn submit(&mut self, raw: &str) -> Outcome {
        if raw.trim().is_empty() {
            return Outcome::Ignored;
        }
        if self.is_busy() {
            return Outcome::Busy;
        }

        self.push(Sender::User, raw, false);

        if !validate(self.step, raw) || !self.answers.record(self.step, raw) {
            let text = format!("Por favor, ingresa un valor válido para {}.", self.step);
            self.push(Sender::Ai, &text, false);
            return Outcome::Rejected;
        }

        match self.step.next() {
            Some(next) => {
                self.push(Sender::Ai, prompt_after(self.step), false);
                self.step = next;
                Outcome::Advanced(next)
            }
            None => match self.answers.to_request() {
                Some(request) => {
                    let id = self.push(Sender::Ai, PROCESSING, false);
                    self.pending = Some(id);
                    Outcome::Finalize(request)
                }
                None => {
                    self.fail(Some("faltan datos de pasos anteriores"));
                    Outcome::Failed
                }
            },
        }
    }

    /// Replaces the transcript with the result of a successful request and
    /// starts over. Returns the answers summary that heads the transcript.
    pub fn complete(&mut self, request: &RecommendationRequest, plan: &RecommendationPlan) -> String {
        let summary = answers_summary(request);
        self.pending = None;
        self.messages.clear();
        self.push_result(&summary, plan);
        self.answers = AnswerRecord::default();
        self.step = Step::Peso;
        summary
    }

    /// Drops the processing notice, reports `reason` (or a generic text) and
    /// starts over without keeping any answer.
    pub fn fail(&mut self, reason: Option<&str>) {
        if let Some(id) = self.pending.take() {
            self.messages.retain(|m| m.id != id);
        }
        let text = format!(
            "Error: {}. Por favor, intenta nuevamente.",
            reason.unwrap_or(FALLBACK_ERROR)
        );
        self.push(Sender::Ai, &text, false);
        self.answers = AnswerRecord::default();
        self.step = Step::Peso;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.push(Sender::Ai, GREETING, false);
        self.answers = AnswerRecord::default();
        self.step = Step::Peso;
        self.pending = None;
    }

    /// Appends an assistant notice outside the question flow.
    pub fn notify(&mut self, text: &str) -> u64 {
        self.push(Sender::Ai, text, false)
    }

    fn push_result(&mut self, summary: &str, plan: &RecommendationPlan) {
        self.push(Sender::Ai, summary, false);
        self.push(Sender::Ai, &format_plan(plan), true);
        self.push(Sender::Ai, CLOSING, false);
    }

    fn push(&mut self, sender: Sender, text: &str, has_export: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            text: text.to_string(),
            sender,
            has_export,
        });
        id
    }
}
