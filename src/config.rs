use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::signals::{RiskPhrases, DEFAULT_RISK_PHRASES};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Engine settings read from an optional JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub risk_phrases: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_phrases: DEFAULT_RISK_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(raw)?;
        if config.phrases().is_empty() {
            return Err(EngineError::Config(
                "risk_phrases must contain at least one non-blank phrase".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config = Self::from_json(&raw)?;
                tracing::info!(
                    path = %path.display(),
                    phrases = config.risk_phrases.len(),
                    "loaded engine config"
                );
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn phrases(&self) -> RiskPhrases {
        RiskPhrases::new(&self.risk_phrases)
    }
}
