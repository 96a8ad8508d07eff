//! Soundings, features and tracking records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Validity markers carried by a sounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointFlags(u8);

impl PointFlags {
    pub const NONE: Self = Self(0);
    /// Removed by an editor
    pub const DELETED: Self = Self(1);
    /// Rejected by automatic filtering
    pub const INVALID: Self = Self(1 << 1);
    /// Reference-only sounding, not part of the surface by default
    pub const REFERENCE: Self = Self(1 << 2);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for PointFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A single depth sounding from the point database.
///
/// Position is geodetic (longitude, latitude in degrees); depth is
/// positive down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    /// Total propagated vertical error (>= 0)
    #[serde(default)]
    pub vertical_error: f64,
    #[serde(default)]
    pub flags: PointFlags,
}

impl SourcePoint {
    pub fn new(x: f64, y: f64, depth: f64, vertical_error: f64) -> Self {
        Self {
            x,
            y,
            depth,
            vertical_error,
            flags: PointFlags::NONE,
        }
    }

    pub fn with_flags(mut self, flags: PointFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether the sounding contributes to a cell.
    ///
    /// Deleted and invalid soundings never do; reference soundings only when
    /// `include_reference` is set. Non-finite values are excluded.
    pub fn is_usable(&self, include_reference: bool) -> bool {
        if self.flags.intersects(PointFlags::DELETED | PointFlags::INVALID) {
            return false;
        }
        if !include_reference && self.flags.contains(PointFlags::REFERENCE) {
            return false;
        }
        self.x.is_finite() && self.y.is_finite() && self.depth.is_finite()
    }
}

/// How a feature came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOrigin {
    /// Produced by the automated feature-significance process
    Automated,
    /// Placed by hand
    Manual,
}

/// Tag the automated significance process writes into feature remarks
pub const AUTOMATED_FEATURE_TAG: &str = "pfmfeature";

/// Time a feature's source sounding was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureTime {
    /// Seconds since the Unix epoch
    pub seconds: i64,
    #[serde(default)]
    pub nanos: u32,
}

impl CaptureTime {
    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanos).unwrap_or_default()
    }
}

/// A significant sounding with provenance.
///
/// Position is geodetic (longitude, latitude in degrees); depth positive down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    #[serde(default)]
    pub id: Option<u32>,
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    pub confidence_level: u8,
    #[serde(default)]
    pub description: String,
    /// Free-text provenance; bin size and trigger distance are parsed from it
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub capture_time: CaptureTime,
}

impl FeaturePoint {
    pub fn new(x: f64, y: f64, depth: f64, confidence_level: u8) -> Self {
        Self {
            id: None,
            x,
            y,
            depth,
            confidence_level,
            description: String::new(),
            remarks: String::new(),
            capture_time: CaptureTime::default(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn origin(&self) -> FeatureOrigin {
        if self.remarks.to_lowercase().contains(AUTOMATED_FEATURE_TAG) {
            FeatureOrigin::Automated
        } else {
            FeatureOrigin::Manual
        }
    }
}

/// Audit record of a cell overwritten by a manually placed feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Dense, starting at 0
    pub sequence: u32,
    pub row: usize,
    pub col: usize,
    /// Depth of the feature that replaced the cell (positive down)
    pub depth: f64,
    /// Elevation held by the cell before the override
    pub previous_elevation: f32,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Position of the feature in the feature source
    pub feature_index: usize,
}
