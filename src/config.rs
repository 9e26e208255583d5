use std::{path::PathBuf, str::FromStr};

use anyhow::Context;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub catalog: CatalogConfig,
    pub messages_path: PathBuf,
    pub messages_reload_secs: u64,
}

/// Only HMAC algorithms are accepted since the key is a shared secret.
pub fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let alg = Algorithm::from_str(raw.trim())
        .with_context(|| format!("unknown JWT_ALGORITHM {raw:?}"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => anyhow::bail!("JWT_ALGORITHM {other:?} is not supported, use HS256/HS384/HS512"),
    }
}

/// Unset keys take the default; a set key that does not parse is an error.
fn parsed_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key}={raw:?} is not a valid value")),
        None => Ok(default),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key).with_context(|| format!("{key} is not set"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = required(&lookup, "DATABASE_URL")?;

        let ttl_minutes: i64 = parsed_or(&lookup, "JWT_TTL_MINUTES", 48 * 60)?;
        anyhow::ensure!(ttl_minutes > 0, "JWT_TTL_MINUTES must be positive, got {ttl_minutes}");
        let jwt = JwtConfig {
            secret: required(&lookup, "JWT_SECRET")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "movieshelf".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "movieshelf-users".into()),
            ttl_minutes,
            algorithm: parse_algorithm(
                &lookup("JWT_ALGORITHM").unwrap_or_else(|| "HS256".into()),
            )?,
        };
        let catalog = CatalogConfig {
            api_key: required(&lookup, "TMDB_KEY")?,
            base_url: lookup("TMDB_BASE_URL")
                .unwrap_or_else(|| "https://api.themoviedb.org/3".into()),
            language: lookup("TMDB_LANGUAGE").unwrap_or_else(|| "en-US".into()),
            timeout_secs: parsed_or(&lookup, "TMDB_TIMEOUT_SECS", 10)?,
        };
        Ok(Self {
            database_url,
            jwt,
            catalog,
            messages_path: lookup("MESSAGES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("resources/messages.json")),
            messages_reload_secs: parsed_or(&lookup, "MESSAGES_RELOAD_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hmac_algorithms() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm(" HS512 ").unwrap(), Algorithm::HS512);
    }

    #[test]
    fn rejects_asymmetric_and_unknown_algorithms() {
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let mut env: std::collections::HashMap<String, String> = [
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("TMDB_KEY", "key"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in vars {
            env.insert(k.to_string(), v.to_string());
        }
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_keys_are_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, 48 * 60);
        assert_eq!(cfg.jwt.algorithm, Algorithm::HS256);
        assert_eq!(cfg.catalog.timeout_secs, 10);
        assert_eq!(cfg.messages_reload_secs, 30);
    }

    #[test]
    fn unparsable_values_abort_instead_of_defaulting() {
        let err = load(&[("JWT_TTL_MINUTES", "forty-eight-hours")]).unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{err}");

        let err = load(&[("TMDB_TIMEOUT_SECS", "-5")]).unwrap_err();
        assert!(err.to_string().contains("TMDB_TIMEOUT_SECS"), "{err}");

        assert!(load(&[("MESSAGES_RELOAD_SECS", "soon")]).is_err());
    }

    #[test]
    fn ttl_must_be_positive() {
        assert!(load(&[("JWT_TTL_MINUTES", "-5")]).is_err());
        assert!(load(&[("JWT_TTL_MINUTES", "0")]).is_err());
        assert_eq!(load(&[("JWT_TTL_MINUTES", "15")]).unwrap().jwt.ttl_minutes, 15);
    }

    #[test]
    fn missing_required_keys_are_named() {
        let err = AppConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
