//! BM25 scoring

/// BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    /// Term-frequency saturation
    pub k1: f64,
    /// Length normalization
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    /// Inverse document frequency of a term found in `df` of `n` documents
    pub fn idf(&self, n: usize, df: usize) -> f64 {
        let n = n as f64;
        let df = df as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Saturated term frequency for a field of length `len`
    pub fn tf(&self, tf: f64, len: f64, avg_len: f64) -> f64 {
        if tf <= 0.0 {
            return 0.0;
        }
        let norm = if avg_len > 0.0 { len / avg_len } else { 1.0 };
        tf * (self.k1 + 1.0) / (tf + self.k1 * (1.0 - self.b + self.b * norm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rare_terms_weigh_more() {
        let bm = Bm25::default();
        assert!(bm.idf(100, 1) > bm.idf(100, 50));
        assert!(bm.idf(100, 100) > 0.0);
    }

    #[test]
    fn test_tf_saturates_and_normalizes() {
        let bm = Bm25::default();
        assert!(bm.tf(2.0, 10.0, 10.0) > bm.tf(1.0, 10.0, 10.0));
        assert!(bm.tf(100.0, 10.0, 10.0) < bm.k1 + 1.0);
        assert!(bm.tf(1.0, 5.0, 10.0) > bm.tf(1.0, 20.0, 10.0));
        assert_eq!(bm.tf(0.0, 5.0, 10.0), 0.0);
    }
}
