use serde::Serialize;

/// Internal candidate carrying its relevance score. Never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: f32,
}

impl<T> Scored<T> {
    pub fn new(item: T, score: f32) -> Self {
        Self { item, score }
    }
}

/// External record: the item plus its rank, with no score field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub item: T,
    pub importance_rank: usize,
}

/// Sorts by descending score (stable, so input order breaks ties), assigns
/// dense 1-based ranks and keeps at most `cap` items.
pub fn rank_top<T>(mut candidates: Vec<Scored<T>>, cap: usize) -> Vec<Ranked<T>> {
    candidates.sort_by(|left, right| right.score.total_cmp(&left.score));
    candidates
        .into_iter()
        .take(cap)
        .enumerate()
        .map(|(position, candidate)| Ranked {
            item: candidate.item,
            importance_rank: position + 1,
        })
        .collect()
}

/// First `max_chars` characters of the body, with an ellipsis when cut.
pub fn content_preview(body: &str, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        let head: String = body.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
