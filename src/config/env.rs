// src/config/env.rs
// Environment configuration, loaded once at startup. Mirrors the teacher's
// EnvConfig::load()/ConfigValidation pattern but scoped to this core's
// actual inputs (DATABASE_URL, AIDIS_BIND_ADDR, AIDIS_EMBEDDING_DIM,
// AIDIS_LOG_LEVEL); the CLI layer (see `cli.rs`) owns flag-vs-env
// precedence via clap, this layer only validates the resolved values.

use tracing::info;

use crate::config::cli::Cli;

/// Resolved, validated configuration for one server run.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub bind: String,
    pub stdio: bool,
    pub database_url: String,
    pub embedding_dim: usize,
    pub log_level: String,
    pub embedding_api_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
}

impl EnvConfig {
    /// Load configuration from already-parsed CLI args (which themselves
    /// fall back to environment variables per clap's own precedence).
    pub fn load(cli: &Cli) -> Self {
        info!("loading configuration");
        Self {
            bind: cli.bind.clone(),
            stdio: cli.stdio,
            database_url: cli.database_url.clone(),
            embedding_dim: cli.embedding_dim,
            log_level: cli.log_level.clone(),
            embedding_api_url: cli.embedding_api_url.clone(),
            embedding_api_key: cli.embedding_api_key.clone(),
            embedding_model: cli.embedding_model.clone(),
        }
    }

    /// Validate the configuration. Never logs the database URL's
    /// credentials; only whether one was supplied.
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if self.database_url.trim().is_empty() {
            validation.add_error("DATABASE_URL (or --database-url) must be set");
        }

        if self.embedding_dim == 0 {
            validation.add_error("--embedding-dim must be greater than zero");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            validation.add_warning(format!(
                "unknown log level '{}', falling back to 'info'",
                self.log_level
            ));
        }

        if self.embedding_api_key.trim().is_empty() {
            validation.add_warning("no embedding API key configured; context/decision embedding-backed tools will return EmbeddingUnavailable");
        }

        if self.bind.parse::<std::net::SocketAddr>().is_ok() {
            if let Ok(addr) = self.bind.parse::<std::net::SocketAddr>() {
                if !addr.ip().is_loopback() {
                    validation.add_warning(
                        "binding to a non-loopback address; this is unauthenticated",
                    );
                }
            }
        } else {
            validation.add_error(format!("--bind value '{}' is not a valid address", self.bind));
        }

        validation
    }
}

/// Configuration validation result: warnings are advisory, errors prevent
/// startup (exit code 2, per §6).
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }
        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }
        if lines.is_empty() {
            "configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            bind: "127.0.0.1:8080".to_string(),
            stdio: false,
            database_url: "postgres://localhost/aidis".to_string(),
            embedding_dim: 1536,
            log_level: "info".to_string(),
            embedding_api_url: "https://api.openai.com/v1/embeddings".to_string(),
            embedding_api_key: "test-key".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }

    #[test]
    fn valid_config_has_no_errors() {
        let cfg = EnvConfig::load(&base_cli());
        let validation = cfg.validate();
        assert!(validation.is_valid());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let mut cli = base_cli();
        cli.database_url = String::new();
        let cfg = EnvConfig::load(&cli);
        let validation = cfg.validate();
        assert!(!validation.is_valid());
    }

    #[test]
    fn non_loopback_bind_is_a_warning_not_an_error() {
        let mut cli = base_cli();
        cli.bind = "0.0.0.0:8080".to_string();
        let cfg = EnvConfig::load(&cli);
        let validation = cfg.validate();
        assert!(validation.is_valid());
        assert!(!validation.warnings.is_empty());
    }
}
