use crate::invoicing::ZohoConfig;
use crate::payments::providers::RazorpayConfig;
use anyhow::{anyhow, Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub payments: PaymentsConfig,
    pub auth: AuthConfig,
    pub zoho: Option<ZohoConfig>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub razorpay: RazorpayConfig,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected a boolean, got '{}'", other)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .context("PORT not set")?
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_format: match optional("LOG_FORMAT").as_deref() {
                None | Some("pretty") => LogFormat::Pretty,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(anyhow!("LOG_FORMAT must be 'pretty' or 'json', got {}", other))
                }
            },
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            run_migrations: match optional("RUN_MIGRATIONS") {
                Some(value) => parse_bool(&value).context("RUN_MIGRATIONS")?,
                None => true,
            },
        };

        let redis = optional("REDIS_URL").map(|url| RedisConfig { url });

        let payments = PaymentsConfig {
            razorpay: RazorpayConfig::from_env().context("Razorpay configuration")?,
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
        };

        let auth = AuthConfig {
            jwt_secret: env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET not set")?,
            jwt_audience: optional("AUTH_JWT_AUDIENCE"),
        };

        let zoho = ZohoConfig::from_env().context("Zoho Books configuration")?;

        let config = Config {
            server,
            database,
            redis,
            payments,
            auth,
            zoho,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(anyhow!("DATABASE_URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be greater than 0"));
        }

        if self.payments.razorpay.key_id.trim().is_empty()
            || self.payments.razorpay.key_secret.trim().is_empty()
        {
            return Err(anyhow!("RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET cannot be empty"));
        }

        if self.payments.currency.len() != 3 {
            return Err(anyhow!(
                "PAYMENT_CURRENCY must be a 3-letter code, got {}",
                self.payments.currency
            ));
        }

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(anyhow!("AUTH_JWT_SECRET cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                environment: "development".to_string(),
                log_format: LogFormat::Pretty,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/projectdesk".to_string(),
                max_connections: 20,
                run_migrations: true,
            },
            redis: None,
            payments: PaymentsConfig {
                razorpay: RazorpayConfig {
                    key_id: "rzp_test".to_string(),
                    key_secret: "secret".to_string(),
                    ..Default::default()
                },
                currency: "INR".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "jwt".to_string(),
                jwt_audience: None,
            },
            zoho: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_low_port_rejected() {
        let mut config = config();
        config.server.port = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let mut config = config();
        config.server.environment = "qa".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_gateway_secret_rejected() {
        let mut config = config();
        config.payments.razorpay.key_secret = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
