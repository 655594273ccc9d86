use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;
use crate::error::Result;

/// Tuning knobs for one scan run.
///
/// The config is built once and handed to each [`crate::Driver`]
/// explicitly; nothing in this crate reads environment variables or
/// process-wide state.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL of the LLM gateway (no trailing path).
    pub endpoint: String,
    /// Most file-content bytes sent on the first attempt.
    pub byte_cap: usize,
    /// Ladder rungs that would shrink the cap below this floor are not
    /// attempted; sending a near-empty payload wastes a model call.
    pub min_byte_cap: usize,
    /// Output-token budget requested from the model on the first attempt.
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub connect_timeout: Duration,
    /// Read timeout for one gateway call. Local models can be slow, so
    /// this defaults high; lower it for interactive use.
    pub request_timeout: Duration,
    /// Number of contiguous line-range slices on the last ladder rung.
    pub slice_count: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            byte_cap: 48 * 1024,
            min_byte_cap: 2 * 1024,
            max_output_tokens: 1024,
            temperature: 0.0,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(600),
            slice_count: 2,
        }
    }
}

/// Optional settings from a TOML config file or CLI flags. Later layers
/// win: defaults, then the file, then explicit overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub byte_cap: Option<usize>,
    pub min_byte_cap: Option<usize>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub slice_count: Option<usize>,
}

impl ScanConfig {
    pub fn load(config_file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.display().to_string(),
                source,
            })?;
            let from_file: ConfigOverrides =
                toml::from_str(&raw).map_err(|err| Error::Config(err.to_string()))?;
            config.apply(from_file);
        }
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            endpoint,
            byte_cap,
            min_byte_cap,
            max_output_tokens,
            temperature,
            connect_timeout_secs,
            request_timeout_secs,
            slice_count,
        } = overrides;
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(byte_cap) = byte_cap {
            self.byte_cap = byte_cap;
        }
        if let Some(min_byte_cap) = min_byte_cap {
            self.min_byte_cap = min_byte_cap;
        }
        if let Some(max_output_tokens) = max_output_tokens {
            self.max_output_tokens = max_output_tokens;
        }
        if let Some(temperature) = temperature {
            self.temperature = temperature;
        }
        if let Some(secs) = connect_timeout_secs {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(slice_count) = slice_count {
            self.slice_count = slice_count;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config("endpoint must not be empty".to_string()));
        }
        if self.byte_cap == 0 {
            return Err(Error::Config("byte_cap must be positive".to_string()));
        }
        if self.min_byte_cap > self.byte_cap {
            return Err(Error::Config(format!(
                "min_byte_cap {} exceeds byte_cap {}",
                self.min_byte_cap, self.byte_cap
            )));
        }
        if self.slice_count == 0 {
            return Err(Error::Config("slice_count must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature {} out of range",
                self.temperature
            )));
        }
        Ok(())
    }
}
