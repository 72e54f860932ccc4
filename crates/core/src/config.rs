use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use secrecy::Secret;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::TargetSize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub model_gateway: ModelGatewayConfig,
    pub crop: CropConfig,
    pub safety: SafetyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<Secret<String>>,
    /// Reply to `/start`.
    pub greeting: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelGatewayConfig {
    /// Base URL of an OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<Secret<String>>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Number of title/description variants requested per rewrite.
    pub variants: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CropConfig {
    /// Sizes offered in the crop menu, in menu order.
    pub targets: Vec<TargetSize>,
    /// JPEG quality of delivered crops.
    pub output_quality: u8,
    /// JPEG quality used when re-encoding non-JPEG uploads.
    pub normalize_quality: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SafetyConfig {
    pub max_download_size_bytes: u64,
    /// Longest outbound text message, in characters.
    pub max_message_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

impl AppConfig {
    /// Load layered configuration: `config/default`, `config/{CROPBOT_ENV}`,
    /// `config/local`, `APP__*` variables, then `BOT_TOKEN` / `LLM_API_KEY`.
    pub fn load() -> Result<Self> {
        let env = std::env::var("CROPBOT_ENV").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__CROP__OUTPUT_QUALITY=90 to crop.output_quality
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("telegram.bot_token", std::env::var("BOT_TOKEN").ok())?
            .set_override_option("model_gateway.api_key", std::env::var("LLM_API_KEY").ok())?;

        Self::build(builder)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml(source: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.crop.targets.is_empty() {
            return Err(Error::Config("crop.targets must not be empty".into()));
        }
        if let Some(bad) = self.crop.targets.iter().find(|t| t.width == 0 || t.height == 0) {
            return Err(Error::Config(format!("crop target {} has a zero side", bad)));
        }
        for (name, quality) in [
            ("crop.output_quality", self.crop.output_quality),
            ("crop.normalize_quality", self.crop.normalize_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(Error::Config(format!("{} must be within 1..=100", name)));
            }
        }
        if self.safety.max_message_chars == 0 {
            return Err(Error::Config("safety.max_message_chars must be positive".into()));
        }
        if self.model_gateway.variants == 0 {
            return Err(Error::Config("model_gateway.variants must be positive".into()));
        }
        Ok(())
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            greeting: "Hello! Send me a photo to crop, or a product description to rewrite.".into(),
        }
    }
}

impl Default for ModelGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            api_key: None,
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 1024,
            variants: 3,
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                TargetSize {
                    width: 1110,
                    height: 398,
                },
                TargetSize {
                    width: 345,
                    height: 250,
                },
            ],
            output_quality: 80,
            normalize_quality: 95,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_download_size_bytes: 20 * 1024 * 1024, // 20MB, the Bot API download cap
            max_message_chars: 4096,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info,cropbot=debug".into(),
        }
    }
}
