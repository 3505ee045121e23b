//! Server configuration from command-line flags and environment.

use crate::middleware::RateLimitConfig;
use clap::Parser;
use std::time::Duration;

/// Secret used when `JWT_SECRET` is unset in debug builds.
pub const DEV_JWT_SECRET: &str = "textile-negotiation-dev-secret-change-me";

#[derive(Parser, Debug, Clone)]
#[command(name = "textile-negotiation")]
#[command(about = "Textile negotiation platform API server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "4000")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// SQLite database path
    #[arg(long, env = "DB_PATH", default_value = "textile_negotiation.db")]
    pub db_path: String,

    /// HS256 signing secret (required in release builds)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[arg(long, env = "JWT_EXPIRATION_HOURS", default_value = "720")]
    pub jwt_expiration_hours: i64,

    /// Base URL of the MPSO optimizer service
    #[arg(long, env = "OPTIMIZER_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub optimizer_base_url: String,

    /// Optimizer request timeout in seconds
    #[arg(long, env = "OPTIMIZER_TIMEOUT_SECS", default_value = "30")]
    pub optimizer_timeout_secs: u64,

    /// Mark the session cookie Secure
    #[arg(long, env = "COOKIE_SECURE", default_value_t = false, action = clap::ArgAction::Set)]
    pub cookie_secure: bool,

    /// Signup/login requests allowed per client per minute
    #[arg(long, env = "LOGIN_RATE_LIMIT", default_value = "20")]
    pub login_rate_limit: u32,

    /// Extra requests tolerated above the login limit
    #[arg(long, env = "LOGIN_RATE_BURST", default_value = "5")]
    pub login_rate_burst: u32,

    /// Admin account created at startup when absent
    #[arg(long, env = "BOOTSTRAP_ADMIN_EMAIL")]
    pub bootstrap_admin_email: Option<String>,

    #[arg(long, env = "BOOTSTRAP_ADMIN_PASSWORD", hide_env_values = true)]
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn optimizer_timeout(&self) -> Duration {
        Duration::from_secs(self.optimizer_timeout_secs.max(1))
    }

    pub fn login_limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.login_rate_limit.max(1),
            window: Duration::from_secs(60),
            burst: self.login_rate_burst,
        }
    }

    /// Resolve the signing secret. Release builds refuse to start without one.
    pub fn resolve_jwt_secret(&self) -> anyhow::Result<String> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ if cfg!(debug_assertions) => {
                tracing::warn!("⚠️  JWT_SECRET not set, using development secret");
                Ok(DEV_JWT_SECRET.to_string())
            }
            _ => anyhow::bail!("JWT_SECRET must be set"),
        }
    }

    /// Bootstrap admin credentials, when both are configured
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (
            self.bootstrap_admin_email.as_deref(),
            self.bootstrap_admin_password.as_deref(),
        ) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}
