//! # bathygrid synthesis
//!
//! Enhanced bathymetric surface synthesis: soundings are gridded with a
//! plain statistic, except near significant features where cells are pulled
//! toward the shoalest sounding by a radius-bounded, distance-weighted curve.
//!
//! Modules:
//! - `radius`: influence radius from feature provenance
//! - `weight`: feature-proximity weight grid
//! - `aggregate`: per-cell sounding statistics
//! - `surface`: elevation and uncertainty from statistics and weight
//! - `tracking`: manual feature overrides with audit entries
//! - `engine`: run orchestration over sources, sinks and progress hooks
//!
//! # Example
//!
//! ```ignore
//! use bathygrid_core::{AreaBounds, BinSize};
//! use bathygrid_synthesis::prelude::*;
//!
//! let config = SynthesisConfig { bin_size: BinSize::Meters(5.0), ..Default::default() };
//! let engine = SurfaceEngine::new(config)?;
//! let area = AreaBounds::new(-70.3, 43.6, -70.2, 43.7);
//! let mut sink = MemorySink::new(&engine.geometry(area)?, false);
//! engine.run(area, &soundings, &features, &mut sink, &mut NoProgress)?;
//! ```

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod frame;
mod maybe_rayon;
pub mod point;
pub mod radius;
pub mod sink;
pub mod source;
pub mod surface;
pub mod tracking;
pub mod weight;

pub use aggregate::{CellAggregator, CellStats};
pub use config::{ProjectionConfig, SurfaceMode, SynthesisConfig, UncertaintyMode};
pub use engine::{SurfaceEngine, SynthesisContext, SynthesisSummary};
pub use frame::{DistanceMetric, GridFrame};
pub use point::{CaptureTime, FeatureOrigin, FeaturePoint, PointFlags, SourcePoint, TrackingEntry};
pub use radius::{radius_for_bin, FeatureRadiusResolver, FeatureRole, ResolvedFeature};
pub use sink::{CancelFlag, MemorySink, NoProgress, Progress, SurfaceSink};
pub use source::{BinnedPointStore, FeatureSource, PointSource};
pub use surface::{SurfaceRow, SurfaceSynthesizer};
pub use tracking::TrackingListBuilder;
pub use weight::{LogCurve, WeightGridBuilder};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ProjectionConfig, SurfaceMode, SynthesisConfig, UncertaintyMode};
    pub use crate::engine::{SurfaceEngine, SynthesisSummary};
    pub use crate::point::{FeaturePoint, PointFlags, SourcePoint, TrackingEntry};
    pub use crate::sink::{CancelFlag, MemorySink, NoProgress, Progress, SurfaceSink};
    pub use crate::source::{BinnedPointStore, FeatureSource, PointSource};
}
