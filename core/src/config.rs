//! Client-wide defaults applied to every request.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Defaults a `JsonClient` applies when a descriptor leaves them unset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Used when the descriptor has no timeout. `None` waits indefinitely.
    #[serde(rename = "timeout_secs", deserialize_with = "deserialize_secs")]
    pub default_timeout: Option<Duration>,
    /// Added to every request unless the descriptor sets the same name.
    pub default_headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Some(DEFAULT_TIMEOUT),
            default_headers: Vec::new(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    secs.map(|secs| Duration::try_from_secs_f64(secs).map_err(<D::Error as serde::de::Error>::custom))
        .transpose()
}
