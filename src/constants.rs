use crate::extract::UnparseablePolicy;

/// Model used when the request does not name one
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Upstream generation parameters
pub const MAX_TOKENS: u32 = 8000;
pub const TEMPERATURE: f32 = 0.1;

/// Anthropic Messages API
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Index of the first option in the `correct` field of generated questions (0 = zero-based)
pub const ANSWER_INDEX_BASE: u8 = 0;

/// What happens when the model output is not valid JSON
pub const UNPARSEABLE_POLICY: UnparseablePolicy = UnparseablePolicy::Warn;

/// Trailing line appended to every user message
pub const JSON_ONLY_INSTRUCTION: &str = "Please respond with valid JSON only.";

pub const UNPARSEABLE_WARNING: &str = "Response is not valid JSON";

/// Environment variables
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_BASIC_AUTH_USERNAME: &str = "BASIC_AUTH_USERNAME";
pub const ENV_BASIC_AUTH_PASSWORD: &str = "BASIC_AUTH_PASSWORD";

/// Envelope headers
pub const BASIC_AUTH_CHALLENGE: &str = "Basic realm=\"Restricted Area\"";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const ALLOW_ANY_ORIGIN: &str = "*";

/// Upstream statuses worth retrying
pub const RETRYABLE_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504, 529];

/// Ceiling on the backoff between upstream attempts
pub const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Upper bound accepted for `--max-attempts`
pub const MAX_UPSTREAM_ATTEMPTS: u32 = 10;

/// Characters of model output kept when logging
pub const LOG_PREVIEW_CHARS: usize = 200;
