/// Multiplier for a score computed from `num_facts` claims.
///
/// `exp(1 - gamma / n)` below `gamma`, `1.0` from `gamma` on. Continuous at
/// `n = gamma` and increasing in `n`. `gamma == 0` disables the penalty.
pub fn length_penalty(num_facts: usize, gamma: usize) -> f64 {
    if gamma == 0 || num_facts >= gamma {
        return 1.0;
    }
    if num_facts == 0 {
        return 0.0;
    }
    (1.0 - gamma as f64 / num_facts as f64).exp()
}

/// Applies [`length_penalty`] to `raw_score` and clamps to `[0, 1]`.
pub fn penalized_score(raw_score: f64, num_facts: usize, gamma: usize) -> f64 {
    (raw_score * length_penalty(num_facts, gamma)).clamp(0.0, 1.0)
}
