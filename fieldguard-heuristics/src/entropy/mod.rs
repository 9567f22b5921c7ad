use libm::log2;

use crate::EntropyScore;

/// Calculates the Shannon entropy of a byte slice in bits per symbol.
pub fn shannon_entropy(data: &[u8]) -> EntropyScore {
    if data.is_empty() {
        return 0.0;
    }

    let mut histogram = [0usize; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }

    let total = data.len() as f64;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * log2(p)
        })
        .sum()
}

/// Returns true when `token` is at least `min_len` bytes long and carries at
/// least `min_bits` of entropy per byte.
///
/// Secrets such as API tokens sit well above 3 bits/byte while words and
/// repeated filler (`aaaaaaaa`, `password`) sit below it.
pub fn looks_random(token: &[u8], min_len: usize, min_bits: EntropyScore) -> bool {
    token.len() >= min_len && shannon_entropy(token) >= min_bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_empty() {
        assert_eq!(shannon_entropy(b""), 0.0);
    }

    #[test]
    fn test_entropy_single_symbol() {
        assert_eq!(shannon_entropy(b"zzzzzz"), 0.0);
    }

    #[test]
    fn test_entropy_uniform_eight_symbols() {
        let entropy = shannon_entropy(b"01234567");
        assert!((entropy - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_looks_random_rejects_short_and_repetitive() {
        assert!(!looks_random(b"a1B2", 8, 2.5));
        assert!(!looks_random(b"aaaaaaaaaaaa", 8, 2.5));
        assert!(looks_random(b"q8Zr2LmX0vTw4kPa", 8, 2.5));
    }
}
