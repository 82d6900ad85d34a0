use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Which inference backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    Http,
    Fake,
}

/// Request body shape sent to an `http` provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProtocol {
    /// Gradio predict: `{"data": [ingredients, dietary, allergies, cuisines]}`.
    Gradio,
    /// Named fields plus the rendered prompt and sampling parameters.
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    pub provider: InferenceProvider,
    pub protocol: InferenceProtocol,
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub inference: InferenceConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "pantrychef".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pantrychef-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let inference = InferenceConfig::from_env()?;
        Ok(Self {
            database_url,
            jwt,
            inference,
        })
    }
}

impl InferenceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let provider = match std::env::var("INFERENCE_PROVIDER")
            .unwrap_or_else(|_| "http".into())
            .to_lowercase()
            .as_str()
        {
            "http" => InferenceProvider::Http,
            "fake" => InferenceProvider::Fake,
            other => anyhow::bail!("unknown INFERENCE_PROVIDER: {other}"),
        };

        let protocol = match std::env::var("INFERENCE_PROTOCOL")
            .unwrap_or_else(|_| "gradio".into())
            .to_lowercase()
            .as_str()
        {
            "gradio" => InferenceProtocol::Gradio,
            "json" => InferenceProtocol::Json,
            other => anyhow::bail!("unknown INFERENCE_PROTOCOL: {other}"),
        };

        let endpoint = std::env::var("INFERENCE_URL").ok().filter(|v| !v.trim().is_empty());
        if provider == InferenceProvider::Http && endpoint.is_none() {
            anyhow::bail!("INFERENCE_URL must be set when INFERENCE_PROVIDER=http");
        }

        Ok(Self {
            provider,
            protocol,
            endpoint,
            api_token: std::env::var("INFERENCE_API_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            timeout_secs: env_parse("INFERENCE_TIMEOUT_SECS").unwrap_or(120),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
