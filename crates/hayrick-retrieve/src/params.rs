//! Tuning knobs for the hybrid retrieval engine.

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct HybridParams {
    /// Over-sampled BM25 candidate count.
    pub bm25_chunks: usize,
    /// Maximum number of centers kept after thresholding.
    pub center_k: usize,
    /// Neighbor expansion reach: chunks `c ± window` are pulled in.
    pub neighbor_window: u32,
    /// Hard cap on chunks entering the prompt.
    pub max_context_chunks: usize,
    /// Weight of dense similarity in the fused score.
    pub fusion_alpha: f32,
    /// A candidate stays a center while `fused >= threshold * top`.
    pub center_rel_threshold: f32,
    /// Evidence decay per chunk of distance from its center.
    pub distance_penalty: f32,
    /// Character budget for the assembled context.
    pub context_char_budget: usize,
}

impl Default for HybridParams {
    fn default() -> Self {
        Self {
            bm25_chunks: 50,
            center_k: 3,
            neighbor_window: 2,
            max_context_chunks: 30,
            fusion_alpha: 0.6,
            center_rel_threshold: 0.85,
            distance_penalty: 0.02,
            context_char_budget: 12_000,
        }
    }
}

impl HybridParams {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bm25_chunks: env_parse("HYBRID_BM25_CHUNKS", defaults.bm25_chunks),
            center_k: env_parse("HYBRID_CENTER_K", defaults.center_k),
            neighbor_window: env_parse("HYBRID_NEIGHBOR_WINDOW", defaults.neighbor_window),
            max_context_chunks: env_parse("HYBRID_MAX_CONTEXT_CHUNKS", defaults.max_context_chunks),
            fusion_alpha: env_parse("HYBRID_FUSION_ALPHA", defaults.fusion_alpha),
            center_rel_threshold: env_parse(
                "HYBRID_CENTER_REL_THRESHOLD",
                defaults.center_rel_threshold,
            ),
            distance_penalty: env_parse("HYBRID_DISTANCE_PENALTY", defaults.distance_penalty),
            context_char_budget: env_parse(
                "HYBRID_CONTEXT_CHAR_BUDGET",
                defaults.context_char_budget,
            ),
        }
    }
}
