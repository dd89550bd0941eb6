use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Knobs for one retrieval pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Hits requested per query term.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Hits must score strictly above this to survive filtering.
    #[serde(default)]
    pub min_score: f32,

    /// Terms accepted per request; extras are dropped with a warning.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,

    /// Terms embedded and searched concurrently. Each term costs an
    /// embedding call, so this bounds pressure on the provider.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "top_k must be greater than zero".into(),
            ));
        }
        if self.max_terms == 0 {
            return Err(RetrievalError::InvalidConfig(
                "max_terms must be greater than zero".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(RetrievalError::InvalidConfig(
                "max_concurrency must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(RetrievalError::InvalidConfig(format!(
                "min_score must be within [0, 1], got {}",
                self.min_score
            )));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: 0.0,
            max_terms: default_max_terms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

fn default_max_terms() -> usize {
    8
}

fn default_max_concurrency() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_top_k_rejected() {
        let cfg = RetrievalConfig {
            top_k: 0,
            ..RetrievalConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(RetrievalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn out_of_range_min_score_rejected() {
        let cfg = RetrievalConfig {
            min_score: 1.5,
            ..RetrievalConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let cfg = RetrievalConfig {
            max_concurrency: 0,
            ..RetrievalConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
