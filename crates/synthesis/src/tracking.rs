//! Manual feature overrides
//!
//! Features that do not blend are applied after the surface is complete:
//! the feature's own depth replaces the cell value and an audit entry is
//! recorded for each replacement.

use bathygrid_core::{Result, NULL_ELEVATION};
use tracing::debug;

use crate::point::{FeaturePoint, TrackingEntry};
use crate::radius::{FeatureRole, ResolvedFeature};
use crate::sink::SurfaceSink;

/// Human-readable description from a feature's free text
fn describe(feature: &FeaturePoint, index: usize) -> String {
    let parts: Vec<&str> = [feature.description.trim(), feature.remarks.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        match feature.id {
            Some(id) => format!("Feature {id}"),
            None => format!("Feature {index}"),
        }
    } else {
        parts.join(" - ")
    }
}

/// Applies tracked features to an already emitted surface.
#[derive(Debug, Default)]
pub struct TrackingListBuilder {
    next_sequence: u32,
}

impl TrackingListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries emitted so far
    pub fn len(&self) -> usize {
        self.next_sequence as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_sequence == 0
    }

    /// Override the cell of every tracked feature, in input order.
    ///
    /// `features` is the full feature list the `resolved` indices refer to.
    /// Cells still holding [`NULL_ELEVATION`] have no data to override and
    /// are skipped without consuming a sequence number.
    pub fn apply(
        &mut self,
        features: &[FeaturePoint],
        resolved: &[ResolvedFeature],
        sink: &mut dyn SurfaceSink,
    ) -> Result<Vec<TrackingEntry>> {
        let mut entries = Vec::new();
        for target in resolved.iter().filter(|f| f.role == FeatureRole::Track) {
            let Some(feature) = features.get(target.index) else {
                continue;
            };
            let (row, col) = target.cell;
            let previous = sink.read_cell(row, col)?;
            if previous == NULL_ELEVATION {
                debug!(index = target.index, row, col, "tracked feature over empty cell, skipped");
                continue;
            }

            sink.override_cell(row, col, (-feature.depth) as f32)?;
            let entry = TrackingEntry {
                sequence: self.next_sequence,
                row,
                col,
                depth: feature.depth,
                previous_elevation: previous,
                description: describe(feature, target.index),
                timestamp: feature.capture_time.to_datetime(),
                feature_index: target.index,
            };
            sink.emit_tracking_entry(&entry)?;
            debug!(sequence = entry.sequence, row, col, depth = entry.depth, "cell overridden");
            self.next_sequence += 1;
            entries.push(entry);
        }
        Ok(entries)
    }
}
