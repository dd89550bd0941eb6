use serde::{Deserialize, Serialize};

/// A fixed-length vector representation of one piece of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    /// Model that produced the vector.
    pub model: String,
    pub dimension: usize,
    /// Whether the vector was L2-normalized after the provider returned it.
    pub normalized: bool,
}

impl Embedding {
    /// L2 norm of the vector, for invariant checks.
    pub fn l2_norm(&self) -> f32 {
        self.vector.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_norm_matches_hand_computation() {
        let e = Embedding {
            vector: vec![3.0, 4.0],
            model: "m".into(),
            dimension: 2,
            normalized: false,
        };
        assert!((e.l2_norm() - 5.0).abs() < 1e-6);
    }
}
