//! Series already emitted during incremental updates

use crate::types::AssetSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Request-scoped table of series ids already handed to the chart. Clear it
/// at the start of every full refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSeries {
    ids: BTreeSet<String>,
}

impl SeenSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop series whose id was already seen and record the rest
    pub fn retain_unseen(&mut self, series: Vec<AssetSeries>) -> Vec<AssetSeries> {
        series
            .into_iter()
            .filter(|s| self.ids.insert(s.id.clone()))
            .collect()
    }
}
