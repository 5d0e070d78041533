//! Process configuration, read from the environment (and `.env`), plus the
//! subcommands of the binary.

use std::fmt;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::generation::DEFAULT_SYSTEM_PROMPT;

pub const GEMINI_MODELS: &[&str] = &["gemini-pro", "gemini-1.5-pro", "gemini-1.5-flash"];

pub const OPENAI_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-4",
    "gpt-4-turbo",
    "gpt-4o",
    "gpt-4o-mini",
];

/// The text-generation provider chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }

    pub fn allowed_models(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => GEMINI_MODELS,
            Provider::OpenAi => OPENAI_MODELS,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("unknown AI provider '{other}' (expected gemini or openai)")),
        }
    }
}

/// Every problem found by [`Config::validate`].
#[derive(Debug, Error)]
#[error("invalid configuration:\n  - {}", .problems.join("\n  - "))]
pub struct ConfigError {
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "repo-steward", version, about = "GitHub issue and pull request steward")]
pub struct Config {
    /// Personal access token the service acts as.
    #[arg(long, env = "GITHUB_TOKEN", default_value = "", hide_env_values = true)]
    pub github_token: String,

    /// Shared secret for X-Hub-Signature-256.
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", default_value = "", hide_env_values = true)]
    pub webhook_secret: String,

    #[arg(long, env = "AI_PROVIDER", default_value = "gemini")]
    pub ai_provider: Provider,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-pro")]
    pub gemini_model: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-3.5-turbo")]
    pub openai_model: String,

    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    /// Notifications are sent only when both this and `OWNER_EMAIL` are set.
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    #[arg(long, env = "OWNER_EMAIL")]
    pub owner_email: Option<String>,

    #[arg(long, env = "NOTIFY_FROM", default_value = "repo-steward <onboarding@resend.dev>")]
    pub notify_from: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Recent comments used to profile a commenter's style.
    #[arg(long, env = "PROFILE_COMMENT_LIMIT", default_value_t = 10)]
    pub profile_comment_limit: usize,

    /// Recently updated issues searched for those comments.
    #[arg(long, env = "PROFILE_SCAN_WINDOW", default_value_t = 20)]
    pub profile_scan_window: u8,

    /// Total generation attempts per reply.
    #[arg(long, env = "GENERATION_MAX_RETRIES", default_value_t = 3)]
    pub generation_max_retries: u32,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve webhooks (the default when no subcommand is given)
    Serve,
    /// Manage this service's webhook on the account's public repositories
    Hooks {
        #[command(subcommand)]
        action: HookAction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum HookAction {
    /// Add the webhook to every public repository that lacks it
    Setup {
        /// Public URL of this service's /webhook endpoint
        #[arg(long, env = "WEBHOOK_URL")]
        url: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Show every webhook on the account's public repositories
    List,
    /// Delete the webhooks that deliver to the URL
    Remove {
        #[arg(long, env = "WEBHOOK_URL")]
        url: String,
        #[arg(long)]
        yes: bool,
    },
}

impl Config {
    /// Model name for the selected provider.
    pub fn model(&self) -> &str {
        match self.ai_provider {
            Provider::Gemini => &self.gemini_model,
            Provider::OpenAi => &self.openai_model,
        }
    }

    /// API key for the selected provider, if set.
    pub fn provider_api_key(&self) -> Option<&str> {
        let key = match self.ai_provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAi => self.openai_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Resend key and recipient, when email notifications are configured.
    pub fn email(&self) -> Option<(&str, &str)> {
        let key = self.resend_api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        let to = self.owner_email.as_deref().filter(|e| !e.trim().is_empty())?;
        Some((key, to))
    }

    /// Checks what a `hooks` action needs. Generation and email settings are
    /// not consulted.
    pub fn validate_hooks(&self, action: &HookAction) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.github_token.trim().is_empty() {
            problems.push("GITHUB_TOKEN is required".to_string());
        }
        match action {
            HookAction::Setup { url, .. } => {
                if self.webhook_secret.trim().is_empty() {
                    problems.push("GITHUB_WEBHOOK_SECRET is required".to_string());
                }
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    problems.push(format!("WEBHOOK_URL '{url}' is not an http(s) URL"));
                }
            }
            HookAction::Remove { url, .. } => {
                if url.trim().is_empty() {
                    problems.push("WEBHOOK_URL is required".to_string());
                }
            }
            HookAction::List => {}
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { problems })
        }
    }

    /// Checks everything the service needs to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.github_token.trim().is_empty() {
            problems.push("GITHUB_TOKEN is required".to_string());
        }
        if self.webhook_secret.trim().is_empty() {
            problems.push("GITHUB_WEBHOOK_SECRET is required".to_string());
        }

        let provider = self.ai_provider;
        if self.provider_api_key().is_none() {
            let var = match provider {
                Provider::Gemini => "GEMINI_API_KEY",
                Provider::OpenAi => "OPENAI_API_KEY",
            };
            problems.push(format!("{var} is required when AI_PROVIDER={provider}"));
        }
        if !provider.allowed_models().contains(&self.model()) {
            problems.push(format!(
                "model '{}' is not available for {provider} (choose one of: {})",
                self.model(),
                provider.allowed_models().join(", ")
            ));
        }

        if self.profile_comment_limit == 0 {
            problems.push("PROFILE_COMMENT_LIMIT must be at least 1".to_string());
        }
        if self.profile_scan_window == 0 || self.profile_scan_window > 100 {
            problems.push("PROFILE_SCAN_WINDOW must be between 1 and 100".to_string());
        }
        if self.generation_max_retries == 0 {
            problems.push("GENERATION_MAX_RETRIES must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { problems })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // Built directly so the tests do not depend on the ambient environment.
    fn valid() -> Config {
        Config {
            github_token: "ghp_x".into(),
            webhook_secret: "s3cret".into(),
            ai_provider: Provider::Gemini,
            gemini_api_key: Some("g-key".into()),
            gemini_model: "gemini-pro".into(),
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            resend_api_key: None,
            owner_email: None,
            notify_from: "steward <bot@example.com>".into(),
            port: 5000,
            profile_comment_limit: 10,
            profile_scan_window: 20,
            generation_max_retries: 3,
            command: None,
        }
    }

    fn default_of(id: &str) -> String {
        let command = Config::command();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id() == id)
            .unwrap();
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    #[test]
    fn command_definition_is_consistent() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults() {
        assert_eq!(default_of("ai_provider"), "gemini");
        assert_eq!(default_of("gemini_model"), "gemini-pro");
        assert_eq!(default_of("openai_model"), "gpt-3.5-turbo");
        assert_eq!(default_of("port"), "5000");
        assert_eq!(default_of("profile_comment_limit"), "10");
        assert_eq!(default_of("profile_scan_window"), "20");
        assert_eq!(default_of("generation_max_retries"), "3");
        valid().validate().unwrap();
    }

    #[test]
    fn provider_parsing_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(" gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn every_problem_is_reported_at_once() {
        let config = Config {
            github_token: String::new(),
            webhook_secret: " ".into(),
            ai_provider: Provider::OpenAi,
            openai_model: "gpt-2".into(),
            ..valid()
        };
        let err = config.validate().unwrap_err();

        assert_eq!(err.problems.len(), 4, "{err}");
        let message = err.to_string();
        assert!(message.contains("GITHUB_TOKEN is required"));
        assert!(message.contains("GITHUB_WEBHOOK_SECRET is required"));
        assert!(message.contains("OPENAI_API_KEY is required when AI_PROVIDER=openai"));
        assert!(message.contains("model 'gpt-2' is not available for openai"));
    }

    #[test]
    fn model_must_belong_to_the_selected_provider() {
        let mut config = valid();
        config.gemini_model = "gpt-4".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.problems.len(), 1);
    }

    #[test]
    fn email_needs_both_key_and_recipient() {
        let mut config = valid();
        config.resend_api_key = Some("re_x".into());
        assert!(config.email().is_none());
        config.owner_email = Some("owner@example.com".into());
        assert_eq!(config.email(), Some(("re_x", "owner@example.com")));
    }

    #[test]
    fn rejects_zero_limits() {
        let mut config = valid();
        config.generation_max_retries = 0;
        config.profile_scan_window = 0;
        assert_eq!(config.validate().unwrap_err().problems.len(), 2);
    }

    #[test]
    fn hooks_subcommand_parses() {
        let config = Config::try_parse_from([
            "repo-steward",
            "hooks",
            "setup",
            "--url",
            "https://steward.example/webhook",
            "--yes",
        ])
        .unwrap();
        assert_eq!(
            config.command,
            Some(Command::Hooks {
                action: HookAction::Setup {
                    url: "https://steward.example/webhook".into(),
                    yes: true,
                }
            })
        );
    }

    #[test]
    fn hook_actions_need_only_github_settings() {
        let config = Config {
            gemini_api_key: None,
            webhook_secret: String::new(),
            ..valid()
        };
        config.validate_hooks(&HookAction::List).unwrap();

        let setup = HookAction::Setup {
            url: "steward.example/webhook".into(),
            yes: false,
        };
        let err = config.validate_hooks(&setup).unwrap_err();
        assert_eq!(err.problems.len(), 2, "{err}");
        assert!(err.to_string().contains("GITHUB_WEBHOOK_SECRET is required"));

        let no_token = Config {
            github_token: String::new(),
            ..valid()
        };
        assert!(no_token.validate_hooks(&HookAction::List).is_err());
    }
}
