//! Legal assistant: builds the conversation context, calls the configured
//! provider and records both sides of the exchange.

use backon::ExponentialBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::format::{FormattedBlock, format_legal_content};
use crate::api::chat_completions::ChatCompletionsApi;
use crate::api::gemini_api::GeminiApi;
use crate::config::{AssistantConfig, AssistantMode};
use crate::db::Storage;
use crate::db::models::{ChatMessage, Feedback, Sender};
use crate::db::params::AssistantSettingsPatch;
use crate::db::settings::AssistantSettings;
use crate::error::LawdeskError;
use crate::types::chat_completions::{ChatCompletionRequest, MessageRole, PromptMessage};
use crate::types::gemini::{GenerateContentRequest, GenerationConfig};

const GEMINI_EMPTY_REPLY: &str = "لا يوجد رد من Gemini.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplyMetadata {
    pub model: String,
    pub tokens: u64,
    pub processing_ms: u64,
}

/// Stored AI message plus its display blocks.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssistantReply {
    pub message: ChatMessage,
    pub formatted: Vec<FormattedBlock>,
    pub metadata: ReplyMetadata,
}

struct Completion {
    text: String,
    tokens: u64,
    model: String,
}

/// Prefix the request with the default prompt when one is configured.
pub fn apply_default_prompt(default: Option<&str>, content: &str) -> String {
    match default.map(str::trim).filter(|d| !d.is_empty()) {
        Some(default) => format!("{default}\n\nالمطلوب:\n{content}"),
        None => content.to_string(),
    }
}

/// System prompt, then prior turns, then the current request.
pub fn build_context(
    system_prompt: &str,
    history: &[ChatMessage],
    current: String,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if !system_prompt.trim().is_empty() {
        messages.push(PromptMessage::new(MessageRole::System, system_prompt));
    }
    messages.extend(history.iter().map(|m| {
        let role = match m.sender {
            Sender::User => MessageRole::User,
            Sender::Ai => MessageRole::Assistant,
        };
        PromptMessage::new(role, m.content.clone())
    }));
    messages.push(PromptMessage::new(MessageRole::User, current));
    messages
}

pub struct AssistantService {
    storage: Storage,
    /// Replaced wholesale when an admin saves new settings.
    cfg: RwLock<AssistantConfig>,
    client: reqwest::Client,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AssistantService {
    pub fn new(storage: Storage, cfg: AssistantConfig) -> Result<Self, LawdeskError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("lawdesk/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10));
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let client = builder.build()?;

        let limiter = NonZeroU32::new(cfg.requests_per_minute)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        info!(
            mode = ?cfg.mode,
            model = cfg.active_model(),
            max_retries = cfg.max_retries,
            timeout_secs = cfg.timeout_secs,
            "assistant ready"
        );
        Ok(Self {
            storage,
            cfg: RwLock::new(cfg),
            client,
            limiter,
        })
    }

    /// Configuration in effect for one request.
    fn config(&self) -> AssistantConfig {
        self.cfg
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn settings(&self) -> AssistantSettings {
        AssistantSettings::from_config(&self.config())
    }

    /// Validate, persist and activate new settings.
    pub async fn update_settings(
        &self,
        patch: AssistantSettingsPatch,
    ) -> Result<AssistantSettings, LawdeskError> {
        let settings = patch.apply(self.settings())?;
        self.storage.save_assistant_settings(&settings).await?;
        settings.apply_to(&mut self.cfg.write().unwrap_or_else(PoisonError::into_inner));
        info!(
            mode = ?settings.mode,
            timeout_secs = settings.timeout_secs,
            max_retries = settings.max_retries,
            "assistant settings updated"
        );
        Ok(settings)
    }

    /// Activate settings saved by an earlier run, if any.
    pub async fn restore_settings(&self) -> Result<(), LawdeskError> {
        if let Some(settings) = self.storage.load_assistant_settings().await? {
            settings.apply_to(&mut self.cfg.write().unwrap_or_else(PoisonError::into_inner));
            info!(mode = ?settings.mode, "restored saved assistant settings");
        }
        Ok(())
    }

    /// Answer `content` for `user_id` and record the exchange.
    pub async fn send(&self, user_id: &str, content: &str) -> Result<AssistantReply, LawdeskError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(LawdeskError::validation("نص الرسالة مطلوب"));
        }
        if let Some(limiter) = &self.limiter
            && limiter.check().is_err()
        {
            warn!(user_id, "assistant rate limit hit");
            return Err(LawdeskError::RateLimited);
        }

        let cfg = self.config();
        let limit = u32::try_from(cfg.history_len).unwrap_or(u32::MAX);
        let history = self.storage.assistant_history(user_id, Some(limit)).await?;
        let default_prompt = self.storage.default_prompt().await?;
        let request = apply_default_prompt(default_prompt.as_ref().map(|p| p.content.as_str()), content);
        let messages = build_context(&cfg.system_prompt, &history, request);

        self.storage
            .insert_message(user_id, None, Sender::User, content)
            .await?;

        let started = Instant::now();
        let completion = tokio::time::timeout(cfg.timeout(), self.complete(&cfg, &messages))
            .await
            .map_err(|_| {
                warn!(user_id, timeout_secs = cfg.timeout_secs, "assistant timed out");
                LawdeskError::AssistantTimeout
            })??;
        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let message = self
            .storage
            .insert_message(user_id, None, Sender::Ai, &completion.text)
            .await?;
        debug!(user_id, tokens = completion.tokens, processing_ms, "assistant replied");

        Ok(AssistantReply {
            formatted: format_legal_content(&completion.text),
            message,
            metadata: ReplyMetadata {
                model: completion.model,
                tokens: completion.tokens,
                processing_ms,
            },
        })
    }

    async fn complete(
        &self,
        cfg: &AssistantConfig,
        messages: &[PromptMessage],
    ) -> Result<Completion, LawdeskError> {
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(cfg.max_retries)
            .with_jitter();
        match cfg.mode {
            AssistantMode::Glm => {
                let api_key = required_key(&cfg.glm_api_key, "GLM")?;
                let body = ChatCompletionRequest {
                    model: &cfg.glm_model,
                    messages,
                    temperature: cfg.temperature,
                    top_p: cfg.top_p,
                    max_tokens: cfg.max_tokens,
                };
                let resp = ChatCompletionsApi::try_post(
                    &self.client,
                    &cfg.glm_base_url,
                    api_key,
                    retry_policy,
                    &body,
                )
                .await?;
                let text = resp.first_content().ok_or_else(|| {
                    LawdeskError::AssistantUnavailable("لم يتم استلام رد من النموذج".to_string())
                })?;
                Ok(Completion {
                    text: text.to_string(),
                    tokens: resp.total_tokens(),
                    model: resp.model.clone().unwrap_or_else(|| cfg.glm_model.clone()),
                })
            }
            AssistantMode::Gemini => {
                let api_key = required_key(&cfg.gemini_api_key, "Gemini")?;
                let body = GenerateContentRequest::from_messages(
                    messages,
                    GenerationConfig {
                        temperature: cfg.temperature,
                        top_p: cfg.top_p,
                        max_output_tokens: cfg.max_tokens,
                    },
                );
                let resp = GeminiApi::try_generate(
                    &self.client,
                    &cfg.gemini_base_url,
                    api_key,
                    &cfg.gemini_model,
                    retry_policy,
                    &body,
                )
                .await?;
                Ok(Completion {
                    text: resp
                        .first_text()
                        .unwrap_or_else(|| GEMINI_EMPTY_REPLY.to_string()),
                    tokens: resp.total_tokens(),
                    model: resp
                        .model_version
                        .clone()
                        .unwrap_or_else(|| cfg.gemini_model.clone()),
                })
            }
            AssistantMode::Predefined => self.predefined().await,
        }
    }

    /// Random valid canned reply, delivered after its processing time.
    async fn predefined(&self) -> Result<Completion, LawdeskError> {
        let valid = self.storage.valid_predefined_responses().await?;
        let chosen = {
            let mut rng = rand::thread_rng();
            valid.choose(&mut rng).cloned()
        };
        let chosen = chosen.ok_or_else(|| {
            LawdeskError::AssistantUnavailable("لا توجد ردود معدة مسبقاً صالحة".to_string())
        })?;

        if chosen.processing_time > 0.0 {
            let delay = Duration::try_from_secs_f64(chosen.processing_time).map_err(|e| {
                warn!(id = %chosen.id, error = %e, "unusable processing time on canned reply");
                LawdeskError::AssistantUnavailable("مدة معالجة الرد المعد مسبقاً غير صالحة".to_string())
            })?;
            tokio::time::sleep(delay).await;
        }
        Ok(Completion {
            text: chosen.response,
            tokens: 0,
            model: "predefined".to_string(),
        })
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<ChatMessage>, LawdeskError> {
        self.storage.assistant_history(user_id, None).await
    }

    pub async fn clear(&self, user_id: &str) -> Result<u64, LawdeskError> {
        let removed = self.storage.clear_assistant_history(user_id).await?;
        info!(user_id, removed, "assistant conversation cleared");
        Ok(removed)
    }

    pub async fn feedback(
        &self,
        user_id: &str,
        message_id: &str,
        feedback: Feedback,
    ) -> Result<ChatMessage, LawdeskError> {
        self.storage.set_feedback(user_id, message_id, feedback).await
    }
}

fn required_key<'a>(key: &'a str, provider: &str) -> Result<&'a str, LawdeskError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(LawdeskError::AssistantUnavailable(format!(
            "لم يتم إعداد مفتاح {provider}"
        )));
    }
    Ok(key)
}
