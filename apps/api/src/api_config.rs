use std::collections::BTreeSet;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use promptloom_core::AppError;
use promptloom_domain::RateLimitFeature;
use tracing_subscriber::EnvFilter;

const MIN_GATEWAY_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct LlmRuntimeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitRuntimeConfig {
    pub enabled: bool,
    pub disabled_features: BTreeSet<RateLimitFeature>,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub gateway_shared_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub llm: LlmRuntimeConfig,
    pub api_call_timeout: Duration,
    pub workflow_deadline: Option<Duration>,
    pub rate_limits: RateLimitRuntimeConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = optional_env("DATABASE_URL");
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let gateway_shared_secret = required_env("GATEWAY_SHARED_SECRET")?;
        if gateway_shared_secret.len() < MIN_GATEWAY_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "GATEWAY_SHARED_SECRET must be at least {MIN_GATEWAY_SECRET_LENGTH} characters"
            )));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parsed_env("API_PORT", 3001_u16)?;

        let llm = LlmRuntimeConfig {
            base_url: env::var("LLM_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
            api_key: optional_env("LLM_API_KEY"),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_owned()),
            timeout: Duration::from_secs(parsed_env("LLM_TIMEOUT_SECONDS", 120_u64)?),
        };

        let api_call_timeout =
            Duration::from_secs(parsed_env("API_CALL_TIMEOUT_SECONDS", 60_u64)?);
        let workflow_deadline = optional_env("WORKFLOW_DEADLINE_SECONDS")
            .map(|value| parse_value::<u64>("WORKFLOW_DEADLINE_SECONDS", value.as_str()))
            .transpose()?
            .map(Duration::from_secs);

        let rate_limits = RateLimitRuntimeConfig {
            enabled: parsed_env("RATE_LIMIT_ENABLED", true)?,
            disabled_features: parse_feature_list(
                env::var("RATE_LIMIT_DISABLED_FEATURES")
                    .unwrap_or_default()
                    .as_str(),
            )?,
            sweep_interval: Duration::from_secs(
                parsed_env("RATE_LIMIT_SWEEP_INTERVAL_SECONDS", 60_u64)?.max(1),
            ),
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            gateway_shared_secret,
            api_host,
            api_port,
            llm,
            api_call_timeout,
            workflow_deadline,
            rate_limits,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    optional_env(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(name) {
        Some(value) => parse_value(name, value.as_str()),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
}

fn parse_feature_list(value: &str) -> Result<BTreeSet<RateLimitFeature>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|feature| !feature.is_empty())
        .map(|feature| {
            RateLimitFeature::from_str(feature).map_err(|_| {
                AppError::Validation(format!(
                    "invalid RATE_LIMIT_DISABLED_FEATURES entry '{feature}'"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use promptloom_domain::RateLimitFeature;

    use super::{parse_feature_list, parse_value};

    #[test]
    fn feature_list_accepts_both_spellings_and_blanks() {
        let features = parse_feature_list(" optimize, image_generation ,,createShare");
        assert!(features.is_ok());
        let features = features.unwrap_or_default();

        assert_eq!(features.len(), 3);
        assert!(features.contains(&RateLimitFeature::ImageGeneration));
        assert!(features.contains(&RateLimitFeature::CreateShare));
        assert!(parse_feature_list("").is_ok_and(|features| features.is_empty()));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        assert!(parse_feature_list("optimize,teleport").is_err());
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let error = parse_value::<u16>("API_PORT", "port").err();
        assert!(
            error
                .map(|error| error.to_string())
                .is_some_and(|message| message.contains("API_PORT"))
        );
    }
}
