use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::error::LawdeskError;

/// Process-wide configuration used by `main`.
///
/// Library code takes `Config` (or one of its sections) explicitly, so tests can
/// build their own without touching the environment.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| match Config::load() {
    Ok(cfg) => cfg,
    Err(e) => panic!("FATAL: invalid lawdesk configuration: {e}"),
});

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub basic: BasicConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Config {
    /// Defaults, then `config.toml`, then `LAWDESK_*` environment variables.
    pub fn load() -> Result<Self, LawdeskError> {
        Self::figment()
            .extract()
            .map_err(|e| LawdeskError::Config(e.to_string()))
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("LAWDESK_").split("__"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub allow_registration: bool,
    pub seed_demo_users: bool,
    pub body_limit_bytes: usize,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            database_url: "sqlite:lawdesk.db".to_string(),
            loglevel: "info".to_string(),
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            allow_registration: true,
            seed_demo_users: false,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Which backend answers assistant prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantMode {
    Glm,
    Gemini,
    Predefined,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub mode: AssistantMode,
    pub glm_base_url: Url,
    pub glm_api_key: String,
    pub glm_model: String,
    pub gemini_base_url: Url,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub history_len: usize,
    pub system_prompt: String,
    pub requests_per_minute: u32,
    pub proxy: Option<Url>,
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Model name reported for the active mode.
    pub fn active_model(&self) -> &str {
        match self.mode {
            AssistantMode::Glm => &self.glm_model,
            AssistantMode::Gemini => &self.gemini_model,
            AssistantMode::Predefined => "predefined",
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            mode: AssistantMode::Glm,
            glm_base_url: Url::parse("https://open.bigmodel.cn/api/paas/v4/")
                .expect("static GLM url"),
            glm_api_key: String::new(),
            glm_model: "glm-4-0520".to_string(),
            gemini_base_url: Url::parse("https://generativelanguage.googleapis.com/v1beta/")
                .expect("static Gemini url"),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.5-pro".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            temperature: 0.7,
            top_p: 0.7,
            max_tokens: 2048,
            history_len: 10,
            system_prompt: "أنت مساعد قانوني ذكي يقدم استشارات قانونية دقيقة ومهنية. تتحدث باللغة العربية وتفهم القوانين المصرية جيداً.".to_string(),
            requests_per_minute: 30,
            proxy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_extract_without_files() {
        Jail::expect_with(|_jail| {
            let cfg = Config::load().expect("defaults load");
            assert_eq!(cfg.basic.token_ttl_hours, 24);
            assert_eq!(cfg.assistant.mode, AssistantMode::Glm);
            assert_eq!(cfg.assistant.max_retries, 3);
            assert!(cfg.basic.jwt_secret.is_empty());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [basic]
                jwt_secret = "from-toml"
                token_ttl_hours = 2

                [assistant]
                mode = "gemini"
                "#,
            )?;
            jail.set_env("LAWDESK_BASIC__JWT_SECRET", "from-env");

            let cfg = Config::load().expect("layered config loads");
            assert_eq!(cfg.basic.jwt_secret, "from-env");
            assert_eq!(cfg.basic.token_ttl_hours, 2);
            assert_eq!(cfg.assistant.mode, AssistantMode::Gemini);
            assert_eq!(cfg.assistant.active_model(), "gemini-2.5-pro");
            Ok(())
        });
    }
}
