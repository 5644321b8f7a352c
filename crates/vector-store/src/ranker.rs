use crate::error::{Result, VectorStoreError};
use crate::matrix::VectorMatrix;
use ndarray::ArrayView1;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use thaifood_corpus::RecordId;

/// Score given to records whose embedding is the zero vector.
pub const DEGENERATE_SCORE: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedHit {
    pub record_id: RecordId,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Exhaustive cosine ranking of every matrix row against `query`.
///
/// Returns `min(k, rows)` hits ordered by score descending, then record id
/// ascending. Zero-norm rows score [`DEGENERATE_SCORE`] and sort after any
/// real row with the same score.
pub fn rank(query: &[f32], matrix: &VectorMatrix, k: usize) -> Result<Vec<RankedHit>> {
    if query.len() != matrix.dimension() {
        return Err(VectorStoreError::DimensionMismatch {
            expected: matrix.dimension(),
            actual: query.len(),
        });
    }

    let limit = k.min(matrix.rows());
    if limit == 0 {
        return Ok(Vec::new());
    }

    let query = ArrayView1::from(query);
    let query_norm = query.dot(&query).sqrt();
    let dots = matrix.view().dot(&query);

    // Min-heap of the best `limit` candidates seen so far.
    let mut heap = BinaryHeap::with_capacity(limit + 1);
    for (index, dot) in dots.iter().enumerate() {
        let row_norm = matrix.norm(index);
        heap.push(Reverse(Candidate {
            score: cosine_score(*dot, query_norm, row_norm),
            degenerate: row_norm == 0.0,
            id: RecordId(index),
        }));
        if heap.len() > limit {
            heap.pop();
        }
    }

    let mut candidates: Vec<Candidate> = heap.into_iter().map(|Reverse(c)| c).collect();
    candidates.sort_by(|a, b| b.cmp(a));

    Ok(candidates
        .into_iter()
        .map(|c| RankedHit {
            record_id: c.id,
            score: c.score,
        })
        .collect())
}

fn cosine_score(dot: f32, query_norm: f32, row_norm: f32) -> f32 {
    if row_norm == 0.0 {
        return DEGENERATE_SCORE;
    }
    if query_norm == 0.0 {
        return 0.0;
    }
    let score = dot / (query_norm * row_norm);
    if !score.is_finite() {
        return DEGENERATE_SCORE;
    }
    // Fold -0.0 into 0.0 so total_cmp treats them as a tie.
    if score == 0.0 {
        return 0.0;
    }
    score.clamp(-1.0, 1.0)
}

/// Ordered so that "better" compares greater.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    degenerate: bool,
    id: RecordId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.degenerate.cmp(&self.degenerate))
            .then_with(|| other.id.cmp(&self.id))
    }
}
