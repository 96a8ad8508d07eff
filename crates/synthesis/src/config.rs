//! Run configuration
//!
//! A `SynthesisConfig` is a plain value passed into every run; nothing is
//! kept between runs. It deserializes from JSON with every field optional.

use bathygrid_core::{AreaBounds, BinSize, Error, Projection, Result, Utm};
use serde::{Deserialize, Serialize};

/// Statistic used for cells away from features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMode {
    /// Shoalest sounding
    Minimum,
    /// Deepest sounding
    Maximum,
    /// Mean of valid soundings
    #[default]
    Average,
    /// Mean of every sounding, reference soundings included
    AllDepths,
}

impl SurfaceMode {
    /// Modes whose elevation is blended toward the shoalest depth near features
    pub fn blends(&self) -> bool {
        matches!(self, SurfaceMode::Average | SurfaceMode::AllDepths)
    }

    /// Whether soundings flagged as reference contribute to the cell
    pub fn includes_reference(&self) -> bool {
        matches!(self, SurfaceMode::AllDepths)
    }
}

/// Estimator for the co-registered uncertainty grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyMode {
    /// No uncertainty grid
    #[default]
    None,
    /// Sample standard deviation of the depths
    StdDev,
    /// Mean total propagated error
    AverageTpe,
    /// RMS total propagated error, blended toward the shoalest sounding's error
    Final,
}

/// Frame the output grid is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionConfig {
    /// Longitude/latitude grid
    #[default]
    Geodetic,
    /// UTM grid; zone and hemisphere default to the area's center
    Utm {
        #[serde(default)]
        zone: Option<u8>,
        #[serde(default)]
        north: Option<bool>,
    },
}

impl ProjectionConfig {
    /// Build the projection for an area, `None` for geodetic grids
    pub fn build(&self, area: &AreaBounds) -> Result<Option<Box<dyn Projection>>> {
        match *self {
            ProjectionConfig::Geodetic => Ok(None),
            ProjectionConfig::Utm { zone: Some(zone), north } => {
                let north = north.unwrap_or(area.center().1 >= 0.0);
                Ok(Some(Box::new(Utm::new(zone, north)?)))
            }
            ProjectionConfig::Utm { zone: None, north } => {
                let mut utm = Utm::for_area(area.min_x, area.min_y, area.max_x, area.max_y)?;
                if let Some(north) = north {
                    utm = Utm::new(utm.zone(), north)?;
                }
                Ok(Some(Box::new(utm)))
            }
        }
    }
}

/// Everything a synthesis run needs besides its inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Output bin size, in meters or arc-minutes
    pub bin_size: BinSize,
    pub surface: SurfaceMode,
    pub uncertainty: UncertaintyMode,
    /// Blend toward the shoalest depth near significant features
    pub enhanced: bool,
    /// Features with a lower confidence level are ignored entirely
    pub min_confidence: u8,
    /// Radius (meters) for automated features whose provenance gives none.
    /// Defaults to the radius implied by the output cell size.
    pub default_feature_radius: Option<f64>,
    pub projection: ProjectionConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            bin_size: BinSize::default(),
            surface: SurfaceMode::default(),
            uncertainty: UncertaintyMode::default(),
            enhanced: true,
            min_confidence: 3,
            default_feature_radius: None,
            projection: ProjectionConfig::default(),
        }
    }
}

impl SynthesisConfig {
    /// Reject contradictory or degenerate settings before anything is allocated
    pub fn validate(&self) -> Result<()> {
        let size = match self.bin_size {
            BinSize::Meters(v) | BinSize::Minutes(v) => v,
        };
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::DegenerateCellSize { dx: size, dy: size });
        }
        if let Some(radius) = self.default_feature_radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(Error::InvalidParameter {
                    name: "default_feature_radius",
                    value: radius.to_string(),
                    reason: "must be a positive distance in meters".into(),
                });
            }
        }
        if let ProjectionConfig::Utm { zone: Some(zone), .. } = self.projection {
            Utm::new(zone, true)?;
        }
        Ok(())
    }

    /// Whether an uncertainty grid is produced at all
    pub fn wants_uncertainty(&self) -> bool {
        self.uncertainty != UncertaintyMode::None
    }
}
