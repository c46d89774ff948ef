use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Shared access password. Usually supplied via env, not the file.
    pub password: Option<String>,
    /// Gemini API key. Usually supplied via env, not the file.
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub brand: BrandConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 3000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Allow binding to non-localhost (default: false)
    #[serde(default)]
    pub allow_public_bind: bool,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            allow_public_bind: false,
        }
    }
}

/// Brand voice the model replies in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    #[serde(default = "default_brand_name")]
    pub name: String,
    #[serde(default = "default_brand_description")]
    pub description: String,
    /// Handle the model is instructed to tag in every reply.
    #[serde(default = "default_brand_handle")]
    pub handle: String,
    /// Greeting seeded as the first model turn of every transcript.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_brand_name() -> String {
    "Invesho".into()
}

fn default_brand_description() -> String {
    "an AI fundraising co-pilot that helps startups find investors and manage their fundraising"
        .into()
}

fn default_brand_handle() -> String {
    "@InveshoAI".into()
}

fn default_greeting() -> String {
    "Hi! 👋 Please share the post content or URL to generate a smart reply.".into()
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: default_brand_name(),
            description: default_brand_description(),
            handle: default_brand_handle(),
            greeting: default_greeting(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum turns kept per transcript (greeting excluded from the cap).
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Maximum concurrent sessions before the oldest is evicted.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_turns() -> usize {
    40
}

fn default_max_sessions() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".replygate").join("config.toml"),
            password: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            gateway: GatewayConfig::default(),
            brand: BrandConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.replygate/config.toml`, creating it with defaults on first
    /// run, then apply environment overrides.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;

        let mut config = Self::load_or_init_at(&home)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Disk half of `load_or_init`, rooted at an explicit home directory.
    fn load_or_init_at(home: &Path) -> Result<Self> {
        let replygate_dir = home.join(".replygate");
        let config_path = replygate_dir.join("config.toml");

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            Ok(config)
        } else {
            fs::create_dir_all(&replygate_dir).context("Failed to create .replygate directory")?;
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) =
            std::env::var("REPLYGATE_PASSWORD").or_else(|_| std::env::var("password"))
            && !password.is_empty()
        {
            self.password = Some(password);
        }

        if let Ok(key) =
            std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_API_KEY"))
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("REPLYGATE_MODEL")
            && !model.is_empty()
        {
            self.model = model;
        }

        if let Ok(port_str) = std::env::var("REPLYGATE_PORT").or_else(|_| std::env::var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Ok(host) = std::env::var("REPLYGATE_HOST").or_else(|_| std::env::var("HOST"))
            && !host.is_empty()
        {
            self.gateway.host = host;
        }

        if let Ok(temp_str) = std::env::var("REPLYGATE_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.temperature = temp;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "temperature must be within 0.0..=2.0 (got {})",
                self.temperature
            );
        }
        if self.session.max_turns == 0 {
            anyhow::bail!("session.max_turns must be at least 1");
        }
        if self.session.max_sessions == 0 {
            anyhow::bail!("session.max_sessions must be at least 1");
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
