use serde::{Deserialize, Serialize};

use crate::nutrition::{
    answers::AnswerRecord,
    metrics::SlotFilter,
    validator::Step,
    wizard::{Message, Wizard},
};

/// Current state of a user's chat as shown by the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub messages: Vec<Message>,
    pub current_step: Step,
    #[serde(rename = "userData")]
    pub answers: AnswerRecord,
    pub busy: bool,
}

impl From<&Wizard> for ChatView {
    fn from(w: &Wizard) -> Self {
        Self {
            messages: w.messages().to_vec(),
            current_step: w.step(),
            answers: w.answers().clone(),
            busy: w.is_busy(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub meal: SlotFilter,
}

/// Optional body of an export; without text the stored plan is exported.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    pub key: String,
    pub rows: usize,
    pub message_id: u64,
}
