//! Request payloads accepted by the storage layer.
//!
//! Create payloads carry the full record minus generated fields; patch payloads
//! are partial and leave absent fields untouched. Nullable columns use
//! `Option<Option<T>>` so an explicit `null` clears the value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::settings::AssistantSettings;
use super::models::{
    AppointmentType, CaseStatus, ClientType, DocumentStatus, InvoiceStatus, Sender,
};
use crate::config::AssistantMode;
use crate::error::LawdeskError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProfile {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub lawyer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub address: Option<Option<String>>,
    #[serde(rename = "type")]
    pub client_type: Option<ClientType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientFilter {
    #[serde(rename = "type")]
    pub client_type: Option<ClientType>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCase {
    pub number: Option<String>,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub case_type: String,
    pub court: String,
    pub status: Option<CaseStatus>,
    pub client_id: Option<String>,
    pub lawyer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CasePatch {
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type")]
    pub case_type: Option<String>,
    pub court: Option<String>,
    pub status: Option<CaseStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub client_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCaseMessage {
    pub message: String,
    #[serde(default = "default_sender")]
    pub sender: Sender,
}

fn default_sender() -> Sender {
    Sender::User
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub title: String,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub case_id: Option<String>,
    pub client_id: Option<String>,
    pub lawyer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub case_id: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub client_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub title: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub content: Option<String>,
    pub status: Option<DocumentStatus>,
    pub case_id: Option<String>,
    pub client_id: Option<String>,
    pub lawyer_id: Option<String>,
    /// Values substituted into `{{key}}` placeholders of `content`.
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub content: Option<String>,
    pub status: Option<DocumentStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub case_id: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub client_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    pub case_id: Option<String>,
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoiceItem {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub client_id: String,
    pub status: Option<InvoiceStatus>,
    pub date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub amount: Option<f64>,
    #[serde(default)]
    pub items: Vec<NewInvoiceItem>,
    pub lawyer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoicePatch {
    pub status: Option<InvoiceStatus>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub items: Option<Vec<NewInvoiceItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrompt {
    pub content: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptPatch {
    pub content: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPredefinedResponse {
    pub response: String,
    #[serde(default)]
    pub processing_time: f64,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredefinedResponsePatch {
    pub response: Option<String>,
    pub processing_time: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub valid_until: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantSettingsPatch {
    pub mode: Option<AssistantMode>,
    pub glm_model: Option<String>,
    pub gemini_model: Option<String>,
    pub system_prompt: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl AssistantSettingsPatch {
    /// Merge onto `current`, rejecting values outside the accepted ranges.
    pub fn apply(self, current: AssistantSettings) -> Result<AssistantSettings, LawdeskError> {
        require_text_if_set(self.glm_model.as_deref(), "اسم نموذج GLM")?;
        require_text_if_set(self.gemini_model.as_deref(), "اسم نموذج Gemini")?;
        if let Some(secs) = self.timeout_secs
            && !(1..=600).contains(&secs)
        {
            return Err(LawdeskError::validation("مهلة الطلب يجب أن تكون بين 1 و 600 ثانية"));
        }
        if let Some(retries) = self.max_retries
            && retries > 10
        {
            return Err(LawdeskError::validation("عدد المحاولات يجب ألا يتجاوز 10"));
        }
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(LawdeskError::validation("درجة الحرارة يجب أن تكون بين 0 و 2"));
        }
        if let Some(p) = self.top_p
            && !(0.0..=1.0).contains(&p)
        {
            return Err(LawdeskError::validation("قيمة top_p يجب أن تكون بين 0 و 1"));
        }
        if let Some(tokens) = self.max_tokens
            && !(1..=32_768).contains(&tokens)
        {
            return Err(LawdeskError::validation("الحد الأقصى للرموز يجب أن يكون بين 1 و 32768"));
        }

        Ok(AssistantSettings {
            mode: self.mode.unwrap_or(current.mode),
            glm_model: self
                .glm_model
                .map(|m| m.trim().to_string())
                .unwrap_or(current.glm_model),
            gemini_model: self
                .gemini_model
                .map(|m| m.trim().to_string())
                .unwrap_or(current.gemini_model),
            system_prompt: self.system_prompt.unwrap_or(current.system_prompt),
            timeout_secs: self.timeout_secs.unwrap_or(current.timeout_secs),
            max_retries: self.max_retries.unwrap_or(current.max_retries),
            temperature: self.temperature.unwrap_or(current.temperature),
            top_p: self.top_p.unwrap_or(current.top_p),
            max_tokens: self.max_tokens.unwrap_or(current.max_tokens),
        })
    }
}

/// Rejects blank required text with an Arabic reason naming the field.
pub(crate) fn require_text(value: &str, field_ar: &str) -> Result<(), LawdeskError> {
    if value.trim().is_empty() {
        return Err(LawdeskError::validation(format!("{field_ar} مطلوب")));
    }
    Ok(())
}

/// Same as [`require_text`] for patch fields that may be absent.
pub(crate) fn require_text_if_set(value: Option<&str>, field_ar: &str) -> Result<(), LawdeskError> {
    match value {
        Some(v) => require_text(v, field_ar),
        None => Ok(()),
    }
}

pub(crate) fn require_non_negative(amount: f64) -> Result<(), LawdeskError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(LawdeskError::validation("المبلغ يجب أن يكون رقماً موجباً"));
    }
    Ok(())
}
