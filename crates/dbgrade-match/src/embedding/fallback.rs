//! Deterministic offline embeddings.
//!
//! Words and character trigrams of the normalized text are hashed with SHA-256 into
//! signed buckets. Text without any alphanumeric content expands the digest of the raw
//! text instead, so every input yields a unit vector of the requested dimension.

use sha2::{Digest, Sha256};

use crate::normalize::normalize;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Pseudo-embedding of `text` with `dimension` components, L2-normalized.
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dimension = dimension.max(1);
    let mut vector = vec![0.0_f32; dimension];
    let normalized = normalize(text);
    for word in normalized.split_whitespace() {
        add_feature(&mut vector, &format!("w:{word}"), WORD_WEIGHT);
        let padded: Vec<char> = format!("#{word}#").chars().collect();
        for gram in padded.windows(3) {
            let gram: String = gram.iter().collect();
            add_feature(&mut vector, &format!("c:{gram}"), TRIGRAM_WEIGHT);
        }
    }
    if l2_normalize(&mut vector) {
        return vector;
    }
    let mut vector = digest_expansion(text, dimension);
    if !l2_normalize(&mut vector) {
        vector[0] = 1.0;
    }
    vector
}

fn add_feature(vector: &mut [f32], feature: &str, weight: f32) {
    let digest = Sha256::digest(feature.as_bytes());
    let mut bucket_bytes = [0u8; 8];
    bucket_bytes.copy_from_slice(&digest[..8]);
    let bucket = (u64::from_le_bytes(bucket_bytes) % vector.len() as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
    vector[bucket] += sign * weight;
}

/// Counter-mode expansion of the text digest into centered values in `[-1, 1]`.
fn digest_expansion(text: &str, dimension: usize) -> Vec<f32> {
    let seed = Sha256::digest(text.as_bytes());
    let mut values = Vec::with_capacity(dimension);
    let mut counter: u64 = 0;
    while values.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(counter.to_le_bytes());
        for byte in hasher.finalize() {
            if values.len() == dimension {
                break;
            }
            values.push(f32::from(byte) / 127.5 - 1.0);
        }
        counter += 1;
    }
    values
}

/// Scales `vector` to unit length; returns false when it has no finite, non-zero norm.
pub(crate) fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm = vector
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return false;
    }
    for value in vector.iter_mut() {
        *value = (f64::from(*value) / norm) as f32;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(vector: &[f32]) -> f64 {
        vector
            .iter()
            .map(|v| f64::from(*v) * f64::from(*v))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn produces_unit_vectors_of_requested_dimension() {
        for text in ["MaHangHoa", "", "###", "TABLE MuaHang: PhieuMuaHang, NgayMua"] {
            let vector = fallback_embedding(text, 64);
            assert_eq!(vector.len(), 64);
            assert!((norm(&vector) - 1.0).abs() < 1e-5, "{text:?}");
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(fallback_embedding("DonGia", 32), fallback_embedding("DonGia", 32));
        assert_eq!(fallback_embedding("!!", 32), fallback_embedding("!!", 32));
    }

    #[test]
    fn shares_features_between_spellings() {
        let a = fallback_embedding("DonGia", 256);
        let b = fallback_embedding("don_gia", 256);
        let dot: f64 = a.iter().zip(&b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
        assert!(dot > 0.999);
    }
}
