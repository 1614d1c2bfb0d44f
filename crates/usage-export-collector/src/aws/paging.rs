//! Helpers for manual pagination with an early stop

use usage_export_common::ResourceId;

/// Accumulates identifiers until a limit is reached.
#[derive(Debug)]
pub struct CappedIds {
    ids: Vec<ResourceId>,
    limit: usize,
}

impl CappedIds {
    pub fn new(limit: usize) -> Self {
        Self {
            ids: Vec::with_capacity(limit.min(1024)),
            limit,
        }
    }

    /// Add an identifier; returns `true` once the limit has been reached.
    pub fn push(&mut self, id: impl Into<String>) -> bool {
        if !self.is_full() {
            self.ids.push(ResourceId::new(id));
        }
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.limit
    }

    pub fn into_inner(self) -> Vec<ResourceId> {
        self.ids
    }
}

/// Page size to request: the remaining need, clamped to the API's bounds.
pub fn page_size(remaining: usize, min: i32, max: i32) -> i32 {
    i32::try_from(remaining).unwrap_or(max).clamp(min, max)
}

/// Normalize an empty continuation token to `None`
pub fn next_token(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(str::to_string)
}
