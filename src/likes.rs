//! Like Store Adapter
//!
//! Maps identifiers onto store keys (`like:<id>`), records likes and reads the
//! counts for the window of identifiers around a center.
//!
//! Store failures never reach the caller as errors:
//!
//! - a failed increment is logged and reported as [`LikeOutcome::Degraded`]
//! - a failed bulk read is logged and every identifier in the window reads as 0
//! - a stored value that is not an integer is logged and its identifier is
//!   omitted from the window (corrupt entry omission)

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::LikeStore;

pub const WINDOW_RADIUS: i64 = 10;

/// Like counts keyed by identifier, ascending.
pub type Window = BTreeMap<i64, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// The store applied the increment; carries the new count.
    Recorded(i64),
    /// The increment may not have landed.
    Degraded,
}

impl LikeOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, LikeOutcome::Degraded)
    }
}

pub fn like_key(id: i64) -> String {
    format!("like:{}", id)
}

/// Identifiers in `[center - radius, center + radius]`, skipping any that would
/// fall outside the i64 domain.
pub fn window_ids(center: i64, radius: i64) -> Vec<i64> {
    (-radius..=radius)
        .filter_map(|offset| center.checked_add(offset))
        .collect()
}

#[derive(Clone)]
pub struct Likes {
    store: Arc<dyn LikeStore>,
}

impl Likes {
    pub fn new(store: Arc<dyn LikeStore>) -> Self {
        Self { store }
    }

    pub async fn increment(&self, id: i64) -> LikeOutcome {
        match self.store.incr(&like_key(id)).await {
            Ok(count) => {
                tracing::debug!(id, count, "like recorded");
                LikeOutcome::Recorded(count)
            }
            Err(e) => {
                tracing::error!(id, error = %e, "failed to increment likes");
                LikeOutcome::Degraded
            }
        }
    }

    pub async fn get_window(&self, center: i64) -> Window {
        self.get_window_with_radius(center, WINDOW_RADIUS).await
    }

    pub async fn get_window_with_radius(&self, center: i64, radius: i64) -> Window {
        let ids = window_ids(center, radius);
        let keys: Vec<String> = ids.iter().map(|id| like_key(*id)).collect();

        let values = match self.store.get_many(&keys).await {
            Ok(values) => values,
            Err(e) => {
                tracing::error!(center, error = %e, "failed to get likes window");
                return ids.into_iter().map(|id| (id, 0)).collect();
            }
        };

        if values.len() != ids.len() {
            tracing::error!(
                center,
                expected = ids.len(),
                got = values.len(),
                "store returned a mismatched number of values"
            );
        }

        let mut window = Window::new();
        for ((id, key), value) in ids.iter().zip(&keys).zip(values) {
            match value {
                None => {
                    window.insert(*id, 0);
                }
                Some(raw) => match parse_count(&raw) {
                    Some(count) => {
                        window.insert(*id, count);
                    }
                    None => {
                        tracing::error!(key = %key, value = %raw, "key has non-numeric value");
                    }
                },
            }
        }

        window
    }
}

/// Parses a stored counter, truncating it to 32 bits.
///
/// Anything that fits an i64 is accepted, so counters above `i32::MAX` are kept
/// (and wrap above `u32::MAX`) rather than treated as corrupt.
fn parse_count(raw: &str) -> Option<u32> {
    raw.parse::<i64>().ok().map(|n| n as u32)
}
