use anyhow::Result;

use super::EmbeddingModel;

pub const HASHING_MODEL_ID: &str = "hashing";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Offline embedding model using signed feature hashing of lowercased word
/// tokens. Output is L2-normalized and always `dimension` long.
#[derive(Debug, Clone)]
pub struct HashingModel {
    dimension: usize,
}

impl HashingModel {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingModel for HashingModel {
    fn model_id(&self) -> &str {
        HASHING_MODEL_ID
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimension];
        if self.dimension == 0 {
            return Ok(vector);
        }

        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_has_declared_dimension() {
        for dimension in [1, 8, 64, 300] {
            let model = HashingModel::new(dimension);
            let embedding = model.embed("hello world").expect("embed should succeed");
            assert_eq!(embedding.len(), dimension);
            assert_eq!(model.dimensions(), Some(dimension));
        }
    }

    #[test]
    fn embedding_is_normalized() {
        let model = HashingModel::new(32);
        let embedding = model
            .embed("The quick brown fox jumps over the lazy dog")
            .expect("embed should succeed");
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let model = HashingModel::new(16);
        let embedding = model.embed("  ...  ").expect("embed should succeed");
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn tokenization_ignores_case_and_punctuation() {
        let model = HashingModel::new(64);
        let a = model.embed("Hello, World!").expect("embed should succeed");
        let b = model.embed("hello world").expect("embed should succeed");
        assert_eq!(a, b);
    }
}
