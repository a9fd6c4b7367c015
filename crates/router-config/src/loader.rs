//! Configuration loading with environment variable substitution.

use std::env;
use std::path::Path;

use crate::{Config, ConfigError};

/// Configuration loader with environment variable substitution.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ROUTER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<Config, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ConfigError::FileNotFound(file_path.to_string())
			} else {
				ConfigError::IoError(e)
			}
		})?;

		let substituted_content = self.substitute_env_vars(&content)?;

		let config: Config = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		Ok(config)
	}

	/// Replaces `${VAR_NAME}` patterns with the variable's value.
	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.router.log_level = log_level;
		}

		if let Ok(interval) = env::var(format!("{}SYNC_INTERVAL_SECS", self.env_prefix)) {
			config.ingest.sync_interval_secs = interval.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid sync interval: {}", e))
			})?;
		}

		if let Ok(max_hops) = env::var(format!("{}MAX_HOPS", self.env_prefix)) {
			config.planner.max_hops = max_hops
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid max hops: {}", e)))?;
		}

		Ok(())
	}

	fn validate_config(&self, config: &Config) -> Result<(), ConfigError> {
		if config.planner.max_hops == 0 {
			return Err(ConfigError::ValidationError(
				"planner.max_hops must be at least 1".to_string(),
			));
		}
		if config.planner.max_iterations == 0 {
			return Err(ConfigError::ValidationError(
				"planner.max_iterations must be at least 1".to_string(),
			));
		}
		if config.ingest.sync_interval_secs == 0 {
			return Err(ConfigError::ValidationError(
				"ingest.sync_interval_secs must be at least 1".to_string(),
			));
		}

		Ok(())
	}
}
