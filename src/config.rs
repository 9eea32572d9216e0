use crate::constants::*;
use crate::extract::UnparseablePolicy;
use crate::main_helper::Args;
use crate::prompt::default_system_prompt;
use crate::types::*;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct BasicAuthSecrets {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for BasicAuthSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthSecrets")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl BasicAuthSecrets {
    pub fn is_complete(&self) -> bool {
        matches!((&self.username, &self.password), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }
}

/// Everything one invocation needs to know about its environment. Loaded once at
/// startup and passed down explicitly.
#[derive(Clone)]
pub struct Settings {
    pub anthropic_api_key: Option<String>,
    pub basic_auth: BasicAuthSecrets,
    pub require_auth: bool,
    pub unparseable: UnparseablePolicy,
    pub system_prompt: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("basic_auth", &self.basic_auth)
            .field("require_auth", &self.require_auth)
            .field("unparseable", &self.unparseable)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            basic_auth: BasicAuthSecrets::default(),
            require_auth: true,
            unparseable: UNPARSEABLE_POLICY,
            system_prompt: default_system_prompt(),
        }
    }
}

impl Settings {
    /// Reads secrets through `lookup` so callers decide where they come from.
    /// Empty values count as unset.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            anthropic_api_key: read(ENV_ANTHROPIC_API_KEY),
            basic_auth: BasicAuthSecrets {
                username: read(ENV_BASIC_AUTH_USERNAME),
                password: read(ENV_BASIC_AUTH_PASSWORD),
            },
            ..Self::default()
        }
    }

    pub fn from_process_env() -> Self {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Applies command line switches on top of the environment.
    pub fn with_args(mut self, args: &Args) -> Result<Self> {
        self.require_auth = !args.disable_auth;
        if args.reject_unparseable {
            self.unparseable = UnparseablePolicy::Reject;
        }
        if let Some(path) = &args.system_prompt_file {
            let prompt = std::fs::read_to_string(path)?;
            if prompt.trim().is_empty() {
                return Err(QuizError::Config(format!(
                    "system prompt file {} is empty",
                    path.display()
                ))
                .into());
            }
            self.system_prompt = prompt;
        }
        Ok(self)
    }

    pub fn api_key(&self) -> Result<&str> {
        match self.anthropic_api_key.as_deref() {
            Some(k) => Ok(k),
            None => {
                tracing::error!("{} environment variable not set", ENV_ANTHROPIC_API_KEY);
                Err(QuizError::Config("API configuration error".into()).into())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.anthropic_api_key.is_some() && (!self.require_auth || self.basic_auth.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["quizshim"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["invoke", "--event", "-"]);
        Args::try_parse_from(argv).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_env_reads_all_secrets() {
        let vars = env(&[
            (ENV_ANTHROPIC_API_KEY, "sk-test"),
            (ENV_BASIC_AUTH_USERNAME, "u"),
            (ENV_BASIC_AUTH_PASSWORD, "p"),
        ]);
        let settings = Settings::from_env(|k| vars.get(k).cloned());
        assert_eq!(settings.anthropic_api_key.as_deref(), Some("sk-test"));
        assert!(settings.basic_auth.is_complete());
        assert!(settings.require_auth);
        assert_eq!(settings.unparseable, UNPARSEABLE_POLICY);
        assert!(settings.is_ready());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let vars = env(&[(ENV_ANTHROPIC_API_KEY, ""), (ENV_BASIC_AUTH_USERNAME, "u")]);
        let settings = Settings::from_env(|k| vars.get(k).cloned());
        assert!(settings.anthropic_api_key.is_none());
        assert!(!settings.basic_auth.is_complete());
        assert!(!settings.is_ready());

        let err = settings.api_key().unwrap_err();
        assert_eq!(err.inner.to_string(), "API configuration error");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let vars = env(&[
            (ENV_ANTHROPIC_API_KEY, "sk-very-secret"),
            (ENV_BASIC_AUTH_PASSWORD, "hunter2"),
        ]);
        let rendered = format!("{:?}", Settings::from_env(|k| vars.get(k).cloned()));
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_with_args_defaults_keep_gate_and_policy() {
        let settings = Settings::default().with_args(&args(&[])).unwrap();
        assert!(settings.require_auth);
        assert_eq!(settings.unparseable, UNPARSEABLE_POLICY);
        assert_eq!(settings.system_prompt, default_system_prompt());
    }

    #[test]
    fn test_with_args_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "You write riddles.").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let settings = Settings::default()
            .with_args(&args(&[
                "--disable-auth",
                "--reject-unparseable",
                "--system-prompt-file",
                path.as_str(),
            ]))
            .unwrap();
        assert!(!settings.require_auth);
        assert_eq!(settings.unparseable, UnparseablePolicy::Reject);
        assert_eq!(settings.system_prompt, "You write riddles.");
    }

    #[test]
    fn test_with_args_rejects_empty_system_prompt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "  \n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let err = Settings::default()
            .with_args(&args(&["--system-prompt-file", path.as_str()]))
            .unwrap_err();
        assert!(matches!(err.inner, QuizError::Config(_)));
    }

    #[test]
    fn test_max_attempts_is_bounded() {
        assert_eq!(args(&["--max-attempts", "3"]).max_attempts, 3);
        assert!(Args::try_parse_from(["quizshim", "--max-attempts", "0", "invoke", "--event", "-"]).is_err());
        assert!(Args::try_parse_from(["quizshim", "--max-attempts", "70", "invoke", "--event", "-"]).is_err());
    }
}
