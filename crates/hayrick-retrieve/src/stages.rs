//! The pure stages of the hybrid pipeline.
//!
//! Everything here is deterministic over its inputs: score fusion,
//! center selection, neighbor id derivation, dedup/ranking and context
//! assembly. Ties are always broken by `(document_id, chunk_id)`
//! ascending so replaying a question against an unchanged corpus
//! produces the same ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use hayrick_core::{chunk_key, ChunkRecord};

/// A BM25 candidate fetched back from the vector store, with its raw
/// and fused scores.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk: ChunkRecord,
    pub cosine: f32,
    pub bm25: f32,
    pub fused: f32,
}

/// A chunk in the final evidence set.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: ChunkRecord,
    pub is_center: bool,
    pub distance_from_center: u32,
    /// Fused score of the center this chunk was reached from.
    pub center_score: f32,
    /// `center_score − distance · penalty`; the final ranking key.
    pub evidence_score: f32,
}

impl RetrievedChunk {
    fn identity(&self) -> (&str, u32) {
        (&self.chunk.document_id, self.chunk.chunk_id)
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Min-max normalize to `[0, 1]`. A degenerate set (min == max) maps
/// everything to 1.0 so a lone candidate is never zeroed out.
pub fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let Some(min) = values.iter().cloned().reduce(f32::min) else {
        return Vec::new();
    };
    let max = values.iter().cloned().reduce(f32::max).unwrap_or(min);

    if max <= min {
        return vec![1.0; values.len()];
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}

/// Score fusion over the candidate set: cosine against the query vector
/// and BM25 scores are normalized independently, then blended with
/// `fused = alpha · cos + (1 − alpha) · bm25`. Records without an
/// embedding are dropped. The result is sorted best-first.
pub fn fuse_candidates(
    records: Vec<ChunkRecord>,
    query: &[f32],
    bm25_by_key: &HashMap<String, f32>,
    alpha: f32,
) -> Vec<Candidate> {
    let mut raw: Vec<(ChunkRecord, f32, f32)> = records
        .into_iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_deref()?;
            let cosine = cosine_similarity(query, embedding);
            let bm25 = bm25_by_key.get(&chunk.key()).copied().unwrap_or(0.0);
            Some((chunk, cosine, bm25))
        })
        .collect();

    let cos_norm = min_max_normalize(&raw.iter().map(|r| r.1).collect::<Vec<_>>());
    let bm25_norm = min_max_normalize(&raw.iter().map(|r| r.2).collect::<Vec<_>>());

    let mut candidates: Vec<Candidate> = raw
        .drain(..)
        .zip(cos_norm.into_iter().zip(bm25_norm))
        .map(|((chunk, cosine, bm25), (c, b))| Candidate {
            chunk,
            cosine,
            bm25,
            fused: alpha * c + (1.0 - alpha) * b,
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.fused
            .partial_cmp(&a.fused)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                (&a.chunk.document_id, a.chunk.chunk_id)
                    .cmp(&(&b.chunk.document_id, b.chunk.chunk_id))
            })
    });
    candidates
}

/// Center selection: keep candidates within `rel_threshold` of the top
/// fused score, cap at `center_k`, and always keep the BM25 rank-1 hit
/// so the lexical signal cannot be drowned by a dense-only winner.
pub fn select_centers(
    candidates: &[Candidate],
    rel_threshold: f32,
    center_k: usize,
    bm25_top: Option<(&str, u32)>,
) -> Vec<Candidate> {
    let Some(top) = candidates.first() else {
        return Vec::new();
    };
    let s_top = top.fused;
    let cap = center_k.max(1);

    let mut centers: Vec<Candidate> = candidates
        .iter()
        .filter(|c| s_top <= 0.0 || c.fused >= rel_threshold * s_top)
        .take(cap)
        .cloned()
        .collect();

    if let Some((doc, chunk_id)) = bm25_top {
        let identity =
            |c: &Candidate| c.chunk.document_id == doc && c.chunk.chunk_id == chunk_id;
        if !centers.iter().any(|c| identity(c)) {
            if let Some(must) = candidates.iter().find(|c| identity(*c)) {
                if centers.len() < cap {
                    centers.push(must.clone());
                } else if let Some(worst) = centers
                    .iter()
                    .enumerate()
                    .min_by(|a, b| {
                        a.1.fused.partial_cmp(&b.1.fused).unwrap_or(Ordering::Equal)
                    })
                    .map(|(i, _)| i)
                {
                    centers[worst] = must.clone();
                }
            }
        }
    }

    centers
}

/// Deterministic ids for the `±window` neighborhood of a center.
/// Offsets below chunk 0 are skipped, never wrapped.
pub fn neighbor_keys(document_id: &str, center: u32, window: u32) -> Vec<String> {
    let low = center.saturating_sub(window);
    let high = center + window;
    (low..=high)
        .map(|chunk_id| chunk_key(document_id, chunk_id))
        .collect()
}

/// Dedup and rank the expanded evidence set.
///
/// A chunk reachable from several centers keeps the minimum distance
/// (and, at equal distance, the better center score). The evidence
/// score decays linearly with distance; the result is sorted by
/// evidence descending and truncated to `max_chunks`.
pub fn rank_expansion(
    centers: &[Candidate],
    fetched: &[ChunkRecord],
    window: u32,
    penalty: f32,
    max_chunks: usize,
) -> Vec<RetrievedChunk> {
    let mut best: HashMap<(String, u32), RetrievedChunk> = HashMap::new();

    for center in centers {
        for chunk in fetched {
            if chunk.document_id != center.chunk.document_id {
                continue;
            }
            let distance = chunk.chunk_id.abs_diff(center.chunk.chunk_id);
            if distance > window {
                continue;
            }

            let entry = RetrievedChunk {
                chunk: chunk.clone(),
                is_center: distance == 0,
                distance_from_center: distance,
                center_score: center.fused,
                evidence_score: center.fused - distance as f32 * penalty,
            };

            let key = (chunk.document_id.clone(), chunk.chunk_id);
            let replace = match best.get(&key) {
                Some(existing) => {
                    existing.distance_from_center > distance
                        || (existing.distance_from_center == distance
                            && center.fused > existing.center_score)
                }
                None => true,
            };
            if replace {
                best.insert(key, entry);
            }
        }
    }

    let mut ranked: Vec<RetrievedChunk> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.evidence_score
            .partial_cmp(&a.evidence_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.identity().cmp(&b.identity()))
    });
    ranked.truncate(max_chunks);
    ranked
}

/// Concatenate chunk texts under the character budget, each introduced
/// by a `[Chunk i]` delimiter. Assembly stops before the first chunk
/// that would overflow the budget; the returned count is exactly the
/// characters consumed.
pub fn build_context(chunks: &[RetrievedChunk], char_budget: usize) -> (String, usize) {
    let mut context = String::new();

    for (i, retrieved) in chunks.iter().enumerate() {
        let text = retrieved.chunk.text.trim();
        if text.is_empty() {
            continue;
        }

        let block = format!("[Chunk {}]\n{}\n", i + 1, text);
        let added = if context.is_empty() {
            block.len()
        } else {
            block.len() + 1
        };
        if context.len() + added > char_budget {
            break;
        }

        if !context.is_empty() {
            context.push('\n');
        }
        context.push_str(&block);
    }

    let used = context.len();
    (context, used)
}
