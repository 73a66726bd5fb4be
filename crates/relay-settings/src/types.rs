//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial
//! settings file deserializes cleanly with compiled defaults filling the
//! gaps. Each type implements [`Default`] with production values.

use serde::{Deserialize, Serialize};

/// Root settings type for relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Settings schema version.
    pub version: String,
    /// Gateway and toolhost network settings.
    pub server: ServerSettings,
    /// Reasoning-service (routing + synthesis) settings.
    pub reasoning: ReasoningSettings,
    /// Tool backend settings.
    pub tools: ToolSettings,
    /// Session lifecycle settings.
    pub sessions: SessionSettings,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            reasoning: ReasoningSettings::default(),
            tools: ToolSettings::default(),
            sessions: SessionSettings::default(),
        }
    }
}

impl RelaySettings {
    /// Correct nonsensical values in place.
    ///
    /// Zero timeouts and zero capacities are replaced with defaults, with a
    /// warning, so a bad settings file degrades to usable behavior instead
    /// of a confusing runtime failure.
    pub fn validate(&mut self) {
        fn floor_nonzero(val: &mut u64, fallback: u64, name: &str) {
            if *val == 0 {
                tracing::warn!("{name} is 0, using default {fallback}");
                *val = fallback;
            }
        }
        floor_nonzero(&mut self.reasoning.timeout_secs, 30, "reasoning.timeoutSecs");
        floor_nonzero(&mut self.tools.call_timeout_secs, 15, "tools.callTimeoutSecs");
        floor_nonzero(
            &mut self.sessions.eviction_grace_secs,
            300,
            "sessions.evictionGraceSecs",
        );
        floor_nonzero(
            &mut self.sessions.sweep_interval_secs,
            60,
            "sessions.sweepIntervalSecs",
        );
        if self.sessions.max_concurrent == 0 {
            tracing::warn!("sessions.maxConcurrent is 0, using default 32");
            self.sessions.max_concurrent = 32;
        }
    }
}

/// Network settings for the gateway and toolhost binaries.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Gateway HTTP port.
    pub port: u16,
    /// Toolhost HTTP port.
    pub toolhost_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            toolhost_port: 5000,
        }
    }
}

/// Reasoning-service settings (OpenAI-compatible chat completions API).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReasoningSettings {
    /// API base URL (no trailing slash).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature for the routing call.
    pub routing_temperature: f64,
    /// Sampling temperature for the synthesis call.
    pub synthesis_temperature: f64,
    /// Soft word cap passed to the synthesis prompt.
    pub max_answer_words: u32,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 30,
            routing_temperature: 0.3,
            synthesis_temperature: 0.7,
            max_answer_words: 150,
        }
    }
}

/// Tool backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    /// Toolhost base URL (no trailing slash).
    pub base_url: String,
    /// Per-dispatch timeout in seconds.
    pub call_timeout_secs: u64,
    /// Environment variable holding the Serper web-search API key.
    pub serper_api_key_env: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            call_timeout_secs: 15,
            serper_api_key_env: "SERPER_API_KEY".to_string(),
        }
    }
}

/// Session lifecycle settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Maximum concurrently live (non-terminal) sessions.
    pub max_concurrent: usize,
    /// How long a terminal session stays retrievable before eviction.
    pub eviction_grace_secs: u64,
    /// Interval between background eviction sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 32,
            eviction_grace_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = RelaySettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.server.toolhost_port, 5000);
        assert_eq!(settings.reasoning.model, "llama-3.3-70b-versatile");
        assert_eq!(settings.reasoning.timeout_secs, 30);
        assert_eq!(settings.tools.call_timeout_secs, 15);
        assert_eq!(settings.sessions.max_concurrent, 32);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: RelaySettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.toolhost_port, 5000);
        assert_eq!(settings.sessions.max_concurrent, 32);
    }

    #[test]
    fn validate_floors_zero_values() {
        let mut settings = RelaySettings::default();
        settings.reasoning.timeout_secs = 0;
        settings.sessions.max_concurrent = 0;
        settings.validate();
        assert_eq!(settings.reasoning.timeout_secs, 30);
        assert_eq!(settings.sessions.max_concurrent, 32);
    }
}
