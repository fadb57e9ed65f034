//! FNV-1a hashing encoder.
//!
//! Bag-of-tokens projection: each token hashes to one dimension and adds a
//! sign taken from the hash's high bit. Deterministic and model-file free,
//! which is what the text classifier's weights were fit against.

use serde::Deserialize;

use super::EmbeddingEncoder;
use crate::error::Result;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn default_min_token_len() -> usize {
    2
}
fn default_l2() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct HashingSpec {
    pub kind: String,
    pub dimension: usize,
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    #[serde(default = "default_l2")]
    pub l2_normalize: bool,
}

#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
    min_token_len: usize,
    l2_normalize: bool,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            min_token_len: default_min_token_len(),
            l2_normalize: true,
        }
    }

    pub fn from_spec(spec: HashingSpec) -> std::result::Result<Self, String> {
        if spec.kind != "hashing" {
            return Err(format!("unsupported encoder kind '{}'", spec.kind));
        }
        if spec.dimension == 0 {
            return Err("dimension must be > 0".into());
        }
        Ok(Self {
            dimension: spec.dimension,
            min_token_len: spec.min_token_len,
            l2_normalize: spec.l2_normalize,
        })
    }

    pub fn embed_one(&self, text: &str) -> Vec<f64> {
        let mut v = vec![0.0_f64; self.dimension];
        for token in tokenize(text, self.min_token_len) {
            let h = fnv1a(token.as_bytes());
            let idx = (h % self.dimension as u64) as usize;
            let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
            v[idx] += sign;
        }
        if self.l2_normalize {
            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                v.iter_mut().for_each(|x| *x /= norm);
            }
        }
        v
    }
}

impl EmbeddingEncoder for HashingEncoder {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Alphanumeric runs, lowercased, shorter than `min_len` dropped.
fn tokenize(s: &str, min_len: usize) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(move |t| t.chars().count() >= min_len)
        .map(|t| t.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}
