use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for replygate.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ReplygateError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    // Generic fallthrough (wraps anyhow for interop)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Provider errors ────────────────────────────────────────────────────────

/// Errors from the hosted model API.
///
/// `Timeout` is the only variant the gateway reports distinctly to the user;
/// every other variant collapses into the generic upstream-failure message.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("http: {0}")]
    Http(String),

    #[error(
        "Gemini API key not found. Set GEMINI_API_KEY (or GOOGLE_API_KEY), \
         or put api_key in config.toml"
    )]
    MissingKey,

    #[error("empty response from model")]
    EmptyResponse,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err.to_string())
        }
    }
}

// ─── Prompt / Template errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),
}

// ─── Gateway errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("refusing public bind: {0}")]
    PublicBind(String),

    #[error("bind failed: {0}")]
    Bind(String),
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ReplygateError>;
