//! Feature influence radius
//!
//! Automated features record how they were found in their remarks, e.g.
//! `pfmFeature - Bin size: 2.0, Max trigger distance: 3.5`. The trigger
//! distance is used verbatim; otherwise the radius is derived from the bin
//! size as the worst-case separation between a shoal point centered in one
//! bin and a trigger point near the far corner of an adjacent bin:
//!
//! ```text
//! radius = √2 · (bin/2 + 2·bin/3) ≈ 1.65 · bin
//! ```

use std::f64::consts::SQRT_2;

use tracing::debug;

use crate::frame::GridFrame;
use crate::point::{FeatureOrigin, FeaturePoint};

const MAX_TRIGGER_TAG: &str = "max trigger distance";
const BIN_SIZE_TAG: &str = "bin size";

/// Radius implied by a feature-detection bin size
pub fn radius_for_bin(bin: f64) -> f64 {
    let half = bin / 2.0;
    let two_thirds = bin * 2.0 / 3.0;
    SQRT_2 * (half + two_thirds)
}

/// Number following `tag` in `text` (case-insensitive), skipping `:`/`=`.
fn tagged_value(text: &str, tag: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let start = lower.find(tag)? + tag.len();
    let rest = lower[start..].trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace());
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == 'e'))
        .unwrap_or(rest.len());
    rest[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// What a feature does during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureRole {
    /// Pulls nearby cells toward the shoalest depth through the weight grid
    Blend,
    /// Overrides its own cell after the surface is written
    Track,
}

/// A feature with its radius and grid placement worked out
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFeature {
    /// Position in the feature source
    pub index: usize,
    /// Grid-frame position
    pub x: f64,
    pub y: f64,
    /// Cell holding the feature
    pub cell: (usize, usize),
    pub depth: f64,
    /// Influence radius in meters, 0 for features that do not blend
    pub radius: f64,
    pub role: FeatureRole,
}

/// Derives influence radii from feature provenance.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRadiusResolver {
    min_confidence: u8,
    default_radius: f64,
}

impl FeatureRadiusResolver {
    pub fn new(min_confidence: u8, default_radius: f64) -> Self {
        Self {
            min_confidence,
            default_radius,
        }
    }

    pub fn is_eligible(&self, feature: &FeaturePoint) -> bool {
        feature.confidence_level >= self.min_confidence
    }

    /// Influence radius in meters; 0 for manual or low-confidence features
    pub fn radius(&self, feature: &FeaturePoint) -> f64 {
        if !self.is_eligible(feature) || feature.origin() != FeatureOrigin::Automated {
            return 0.0;
        }
        let provenance = [feature.remarks.as_str(), feature.description.as_str()];
        if let Some(distance) = provenance.iter().find_map(|t| tagged_value(t, MAX_TRIGGER_TAG)) {
            return distance;
        }
        if let Some(bin) = provenance.iter().find_map(|t| tagged_value(t, BIN_SIZE_TAG)) {
            return radius_for_bin(bin);
        }
        self.default_radius
    }

    /// Resolve every feature against the run's grid frame.
    ///
    /// Output order matches input order; ignored features are dropped.
    pub fn resolve(&self, features: &[FeaturePoint], frame: &GridFrame<'_>) -> Vec<ResolvedFeature> {
        features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                if !self.is_eligible(feature) {
                    return None;
                }
                if !feature.depth.is_finite() {
                    debug!(index, "feature has no usable depth, skipped");
                    return None;
                }
                let Some((x, y)) = frame.to_grid(feature.x, feature.y) else {
                    debug!(index, "feature has non-finite position, skipped");
                    return None;
                };
                let Some(cell) = frame.geometry().cell_of(x, y) else {
                    debug!(index, x, y, "feature outside grid, skipped");
                    return None;
                };
                let radius = self.radius(feature);
                let role = if radius > 0.0 {
                    FeatureRole::Blend
                } else {
                    FeatureRole::Track
                };
                Some(ResolvedFeature {
                    index,
                    x,
                    y,
                    cell,
                    depth: feature.depth,
                    radius,
                    role,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bathygrid_core::{GridGeometry, Vincenty};

    fn auto(remarks: &str, confidence: u8) -> FeaturePoint {
        FeaturePoint::new(0.5, 0.5, 10.0, confidence).with_remarks(remarks)
    }

    #[test]
    fn test_trigger_distance_used_verbatim() {
        let r = FeatureRadiusResolver::new(3, 7.0);
        let f = auto("pfmFeature - Bin size: 2.0, Max trigger distance: 4.25", 5);
        assert_relative_eq!(r.radius(&f), 4.25);
    }

    #[test]
    fn test_radius_from_bin_size() {
        let r = FeatureRadiusResolver::new(3, 7.0);
        let f = auto("pfmFeature bin size = 3", 3);
        let expected = SQRT_2 * (1.5 + 2.0);
        assert_relative_eq!(r.radius(&f), expected, epsilon = 1e-12);
        assert_relative_eq!(radius_for_bin(1.0), 1.649_915, epsilon = 1e-6);
    }

    #[test]
    fn test_default_and_zero_radius() {
        let r = FeatureRadiusResolver::new(3, 7.0);
        assert_relative_eq!(r.radius(&auto("pfmFeature", 4)), 7.0);
        // Manual marker
        assert_eq!(r.radius(&auto("Bin size: 2.0", 5)), 0.0);
        // Low confidence
        assert_eq!(r.radius(&auto("pfmFeature - Bin size: 2.0", 2)), 0.0);
    }

    #[test]
    fn test_tagged_value_parsing() {
        assert_eq!(tagged_value("Bin Size: 2.5m", BIN_SIZE_TAG), Some(2.5));
        assert_eq!(tagged_value("bin size:", BIN_SIZE_TAG), None);
        assert_eq!(tagged_value("bin size: -4", BIN_SIZE_TAG), None);
        assert_eq!(tagged_value("nothing here", BIN_SIZE_TAG), None);
    }

    #[test]
    fn test_resolve_assigns_roles_and_cells() {
        let geometry = GridGeometry::from_parts((0.0, 0.0), (1.0, 1.0), 4, 4).unwrap();
        let geodesic = Vincenty::default();
        let frame = GridFrame::new(&geometry, None, &geodesic).unwrap();
        let features = vec![
            auto("pfmFeature - Max trigger distance: 200000", 5),
            auto("placed by hydrographer", 5),
            auto("pfmFeature", 1),
            FeaturePoint::new(9.0, 9.0, 10.0, 5),
            FeaturePoint::new(f64::NAN, 1.0, 10.0, 5),
        ];
        let resolved = FeatureRadiusResolver::new(3, 50.0).resolve(&features, &frame);

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].role, FeatureRole::Blend);
        assert_eq!(resolved[0].cell, (3, 0));
        assert_eq!(resolved[1].role, FeatureRole::Track);
        assert_eq!(resolved[1].index, 1);
        assert_eq!(resolved[1].radius, 0.0);
    }
}
