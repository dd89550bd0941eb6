use serde::{Deserialize, Serialize};

/// Validation limits applied to catalog records.
///
/// Limits are byte counts over the UTF-8 representation. They exist to keep a
/// single oversized record from blowing up embedding requests or index
/// documents, not as a schema contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogConfig {
    #[serde(default = "default_max_name_bytes")]
    pub max_name_bytes: usize,

    #[serde(default = "default_max_description_bytes")]
    pub max_description_bytes: usize,

    #[serde(default = "default_max_price_bytes")]
    pub max_price_bytes: usize,

    /// Strip ASCII control characters from free-text fields.
    #[serde(default = "default_true")]
    pub strip_control_chars: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_name_bytes: default_max_name_bytes(),
            max_description_bytes: default_max_description_bytes(),
            max_price_bytes: default_max_price_bytes(),
            strip_control_chars: true,
        }
    }
}

fn default_max_name_bytes() -> usize {
    512
}

fn default_max_description_bytes() -> usize {
    16 * 1024
}

fn default_max_price_bytes() -> usize {
    64
}

fn default_true() -> bool {
    true
}
