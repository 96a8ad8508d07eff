//! Synthesis run orchestration
//!
//! A run derives the grid, resolves feature radii and the weight grid up
//! front, then aggregates and emits the surface one row at a time before
//! applying tracked feature overrides:
//!
//! ```text
//! GridGeometry → FeatureRadiusResolver → WeightGridBuilder
//!             → (CellAggregator → SurfaceSynthesizer → emit_row) per row
//!             → TrackingListBuilder
//! ```
//!
//! Nothing survives a run except what was written to the sink.

use bathygrid_core::{
    AreaBounds, Error, GreatCircle, GridGeometry, Projection, Raster, Result, Vincenty,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::CellAggregator;
use crate::config::SynthesisConfig;
use crate::frame::GridFrame;
use crate::point::FeaturePoint;
use crate::radius::{radius_for_bin, FeatureRadiusResolver, FeatureRole, ResolvedFeature};
use crate::sink::{Progress, SurfaceSink};
use crate::source::{FeatureSource, PointSource};
use crate::surface::SurfaceSynthesizer;
use crate::tracking::TrackingListBuilder;
use crate::weight::{LogCurve, WeightGridBuilder, PROGRESS_SHARE};

/// Per-run state: the frame, falloff table and resolved features
pub struct SynthesisContext<'a> {
    pub frame: GridFrame<'a>,
    pub curve: LogCurve,
    pub features: Vec<FeaturePoint>,
    pub resolved: Vec<ResolvedFeature>,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(config: &SynthesisConfig, frame: GridFrame<'a>, source: &dyn FeatureSource) -> Result<Self> {
        let features = source.features()?;
        let default_radius = config.default_feature_radius.unwrap_or_else(|| {
            radius_for_bin(frame.geometry().cell_size_meters(frame.geodesic()))
        });
        let resolved = FeatureRadiusResolver::new(config.min_confidence, default_radius)
            .resolve(&features, &frame);
        Ok(Self {
            frame,
            curve: LogCurve::new(),
            features,
            resolved,
        })
    }

    fn count(&self, role: FeatureRole) -> usize {
        self.resolved.iter().filter(|f| f.role == role).count()
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisSummary {
    pub rows: usize,
    pub cols: usize,
    /// Cells with at least one contributing sounding
    pub populated_cells: usize,
    /// Cells with a non-zero feature weight
    pub weighted_cells: usize,
    pub features_total: usize,
    pub features_blended: usize,
    pub features_tracked: usize,
    pub tracking_entries: usize,
}

/// Runs enhanced surface synthesis.
pub struct SurfaceEngine {
    config: SynthesisConfig,
    projection: Option<Box<dyn Projection>>,
    geodesic: Box<dyn GreatCircle>,
}

impl SurfaceEngine {
    /// Validates `config`; nothing is allocated for an invalid one.
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            projection: None,
            geodesic: Box::new(Vincenty::default()),
        })
    }

    /// Use `projection` for every run instead of the configured one
    pub fn with_projection(mut self, projection: Box<dyn Projection>) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_geodesic(mut self, geodesic: Box<dyn GreatCircle>) -> Self {
        self.geodesic = geodesic;
        self
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    fn with_area_projection<R>(
        &self,
        area: &AreaBounds,
        f: impl FnOnce(Option<&dyn Projection>) -> Result<R>,
    ) -> Result<R> {
        match &self.projection {
            Some(p) => f(Some(p.as_ref())),
            None => {
                let built = self.config.projection.build(area)?;
                f(built.as_deref())
            }
        }
    }

    /// Grid a run over `area` would produce
    pub fn geometry(&self, area: AreaBounds) -> Result<GridGeometry> {
        self.with_area_projection(&area, |projection| {
            GridGeometry::new(area, self.config.bin_size, projection, self.geodesic.as_ref())
        })
    }

    /// Synthesize the surface over `area`.
    pub fn run(
        &self,
        area: AreaBounds,
        points: &dyn PointSource,
        features: &dyn FeatureSource,
        sink: &mut dyn SurfaceSink,
        progress: &mut dyn Progress,
    ) -> Result<SynthesisSummary> {
        self.with_area_projection(&area, |projection| {
            let geometry =
                GridGeometry::new(area, self.config.bin_size, projection, self.geodesic.as_ref())?;
            self.run_on(&geometry, projection, points, features, sink, progress)
        })
    }

    /// Synthesize the surface on an already derived grid.
    ///
    /// `projection` is required when `geometry` is projected.
    pub fn run_on(
        &self,
        geometry: &GridGeometry,
        projection: Option<&dyn Projection>,
        points: &dyn PointSource,
        features: &dyn FeatureSource,
        sink: &mut dyn SurfaceSink,
        progress: &mut dyn Progress,
    ) -> Result<SynthesisSummary> {
        let frame = GridFrame::new(geometry, projection, self.geodesic.as_ref())?;
        let context = SynthesisContext::new(&self.config, frame, features)?;
        let (rows, cols) = (geometry.rows(), geometry.cols());
        info!(
            rows,
            cols,
            projected = geometry.is_projected(),
            features = context.features.len(),
            blended = context.count(FeatureRole::Blend),
            tracked = context.count(FeatureRole::Track),
            "starting surface synthesis"
        );

        let weights = if self.config.enhanced {
            WeightGridBuilder::new(frame, &context.resolved, &context.curve).build(progress)?
        } else {
            let mut grid = Raster::new(rows, cols);
            grid.set_transform(geometry.transform());
            grid
        };
        let weighted_cells = weights.data().iter().filter(|&&w| w > 0).count();

        let synthesizer = SurfaceSynthesizer::from_config(&self.config);
        let aggregator = CellAggregator::new(frame, self.config.surface.includes_reference());
        let cadence = (rows / 20).max(1);
        let mut populated_cells = 0;

        for row in 0..rows {
            if row % cadence == 0 {
                if progress.is_cancelled() {
                    info!(row, "synthesis cancelled");
                    return Err(Error::Cancelled);
                }
                progress.report((PROGRESS_SHARE + row * (100 - PROGRESS_SHARE) / rows) as u8);
            }
            let stats = aggregator.aggregate_row(points, row)?;
            populated_cells += stats.iter().filter(|s| !s.is_empty()).count();
            let surface = synthesizer.row(&stats, weights.row(row)?)?;
            sink.emit_row(row, &surface.elevation, surface.uncertainty.as_deref())?;
        }

        if progress.is_cancelled() {
            info!("synthesis cancelled before tracking");
            return Err(Error::Cancelled);
        }
        let entries = TrackingListBuilder::new().apply(&context.features, &context.resolved, sink)?;
        progress.report(100);

        let summary = SynthesisSummary {
            rows,
            cols,
            populated_cells,
            weighted_cells,
            features_total: context.features.len(),
            features_blended: context.count(FeatureRole::Blend),
            features_tracked: context.count(FeatureRole::Track),
            tracking_entries: entries.len(),
        };
        debug!(?summary, "surface synthesis finished");
        info!(
            populated = summary.populated_cells,
            weighted = summary.weighted_cells,
            overrides = summary.tracking_entries,
            "surface synthesis complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::SourcePoint;
    use crate::sink::{CancelFlag, MemorySink, NoProgress};
    use crate::source::BinnedPointStore;
    use bathygrid_core::BinSize;

    struct FailingSink;

    impl SurfaceSink for FailingSink {
        fn emit_row(&mut self, row: usize, _: &[f32], _: Option<&[f32]>) -> Result<()> {
            Err(Error::from_sink(format!("disk full at row {row}")))
        }

        fn read_cell(&self, _: usize, _: usize) -> Result<f32> {
            unreachable!()
        }

        fn override_cell(&mut self, _: usize, _: usize, _: f32) -> Result<()> {
            unreachable!()
        }

        fn emit_tracking_entry(&mut self, _: &crate::point::TrackingEntry) -> Result<()> {
            unreachable!()
        }
    }

    fn area() -> AreaBounds {
        AreaBounds::new(-70.01, 43.0, -70.0, 43.01)
    }

    fn engine() -> SurfaceEngine {
        SurfaceEngine::new(SynthesisConfig {
            bin_size: BinSize::Minutes(0.1),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SynthesisConfig {
            bin_size: BinSize::Meters(-1.0),
            ..Default::default()
        };
        assert!(SurfaceEngine::new(config).is_err());
    }

    #[test]
    fn test_sink_error_surfaces_verbatim() {
        let points = BinnedPointStore::new(0.01, 0.01).unwrap();
        let err = engine()
            .run(area(), &points, &Vec::<FeaturePoint>::new(), &mut FailingSink, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, Error::Sink(_)));
        assert!(err.to_string().contains("disk full at row 0"));
    }

    #[test]
    fn test_cancelled_run_emits_nothing() {
        let engine = engine();
        let geometry = engine.geometry(area()).unwrap();
        let points = BinnedPointStore::from_points(
            vec![SourcePoint::new(-70.005, 43.005, 12.0, 0.2)],
            0.01,
            0.01,
        )
        .unwrap();
        let mut sink = MemorySink::new(&geometry, false);
        let mut flag = CancelFlag::new();
        flag.cancel();

        let result = engine.run_on(&geometry, None, &points, &Vec::<FeaturePoint>::new(), &mut sink, &mut flag);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(sink.rows_emitted(), 0);
    }

    #[test]
    fn test_summary_counts() {
        let engine = engine();
        let geometry = engine.geometry(area()).unwrap();
        let points = BinnedPointStore::from_points(
            vec![
                SourcePoint::new(-70.0045, 43.0055, 12.0, 0.2),
                SourcePoint::new(-70.0046, 43.0054, 14.0, 0.2),
            ],
            0.01,
            0.01,
        )
        .unwrap();
        let mut sink = MemorySink::new(&geometry, false);
        let summary = engine
            .run_on(&geometry, None, &points, &Vec::<FeaturePoint>::new(), &mut sink, &mut NoProgress)
            .unwrap();

        assert_eq!((summary.rows, summary.cols), (geometry.rows(), geometry.cols()));
        assert_eq!(summary.populated_cells, 1);
        assert_eq!(summary.weighted_cells, 0);
        assert_eq!(summary.tracking_entries, 0);
        assert_eq!(sink.rows_emitted(), geometry.rows());
    }
}
