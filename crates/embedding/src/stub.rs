use fxhash::hash64;

use crate::config::EmbeddingConfig;
use crate::normalize::l2_normalize_in_place;
use crate::types::Embedding;

/// Deterministic stand-in for the hosted embedding model.
///
/// Sinusoid values derived from a hash of the text: reproducible, cheap, and
/// different texts land far apart, which is all offline tests need.
pub(crate) fn stub_embedding(text: &str, cfg: &EmbeddingConfig) -> Embedding {
    let mut v = vec![0f32; cfg.dimension];
    // Nonzero seed: the empty string hashes to 0, which would collapse to an
    // all-zero vector. Folding the index in keeps components past 32 from
    // tiling.
    let h = hash64(text.as_bytes()) ^ 0x9e37_79b9_7f4a_7c15;
    for (idx, value) in v.iter_mut().enumerate() {
        let component = h.wrapping_add((idx as u64).wrapping_mul(0x100_0000_01b3));
        *value = (component as f32 * 0.0001).sin();
    }
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    Embedding {
        vector: v,
        model: format!("stub:{}", cfg.model),
        dimension: cfg.dimension,
        normalized: cfg.normalize,
    }
}
