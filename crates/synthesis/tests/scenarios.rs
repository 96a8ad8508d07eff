//! End-to-end synthesis runs over small synthetic surveys.
//!
//! Projected runs use a 10 m UTM grid so distances are easy to reason
//! about: soundings and features are placed at cell centers and passed in
//! geodetic coordinates like real data.

use approx::assert_relative_eq;
use bathygrid_core::{
    AreaBounds, BinSize, GridGeometry, Projection, Utm, Vincenty, NULL_ELEVATION,
    NULL_UNCERTAINTY,
};
use bathygrid_synthesis::prelude::*;
use bathygrid_synthesis::{GridFrame, LogCurve, SynthesisContext, WeightGridBuilder};

const CELL: f64 = 10.0;

struct Survey {
    utm: Utm,
    geometry: GridGeometry,
}

impl Survey {
    fn new(rows: usize, cols: usize) -> Self {
        Self::with_origin((400_000.0, 4_800_000.0), rows, cols)
    }

    fn with_origin(origin: (f64, f64), rows: usize, cols: usize) -> Self {
        let utm = Utm::new(19, true).unwrap();
        let geometry = GridGeometry::from_projected_parts(origin, CELL, rows, cols, &utm).unwrap();
        Self { utm, geometry }
    }

    /// Geodetic position of a cell center
    fn at(&self, row: usize, col: usize) -> (f64, f64) {
        let (x, y) = self.geometry.cell_center(row, col);
        self.utm.inverse(x, y)
    }

    fn sounding(&self, row: usize, col: usize, depth: f64, error: f64) -> SourcePoint {
        let (lon, lat) = self.at(row, col);
        SourcePoint::new(lon, lat, depth, error)
    }

    fn feature(&self, row: usize, col: usize, depth: f64, confidence: u8) -> FeaturePoint {
        let (lon, lat) = self.at(row, col);
        FeaturePoint::new(lon, lat, depth, confidence)
    }

    /// Every cell gets soundings at 15 m and 25 m (mean 20, shoalest 15)
    fn uniform_soundings(&self) -> Vec<SourcePoint> {
        let mut points = Vec::new();
        for row in 0..self.geometry.rows() {
            for col in 0..self.geometry.cols() {
                points.push(self.sounding(row, col, 15.0, 0.5));
                points.push(self.sounding(row, col, 25.0, 0.3));
            }
        }
        points
    }

    fn store(&self, points: Vec<SourcePoint>) -> BinnedPointStore {
        BinnedPointStore::from_points(points, 0.001, 0.001).unwrap()
    }

    fn run(
        &self,
        config: SynthesisConfig,
        points: &BinnedPointStore,
        features: &Vec<FeaturePoint>,
    ) -> (MemorySink, SynthesisSummary) {
        let engine = SurfaceEngine::new(config.clone()).unwrap();
        let mut sink = MemorySink::new(&self.geometry, config.wants_uncertainty());
        let summary = engine
            .run_on(&self.geometry, Some(&self.utm), points, features, &mut sink, &mut NoProgress)
            .unwrap();
        (sink, summary)
    }

    fn weights(&self, config: &SynthesisConfig, features: &Vec<FeaturePoint>) -> Vec<Vec<u8>> {
        let geodesic = Vincenty::default();
        let frame = GridFrame::new(&self.geometry, Some(&self.utm), &geodesic).unwrap();
        let context = SynthesisContext::new(config, frame, features).unwrap();
        let grid = WeightGridBuilder::new(frame, &context.resolved, &context.curve)
            .build(&mut NoProgress)
            .unwrap();
        (0..grid.rows())
            .map(|r| grid.row(r).unwrap().to_vec())
            .collect()
    }
}

fn elevation(sink: &MemorySink, row: usize, col: usize) -> f32 {
    sink.elevation().get(row, col).unwrap()
}

#[test]
fn scenario_a_single_feature_falloff() {
    let survey = Survey::new(10, 10);
    let features = vec![survey
        .feature(5, 5, 15.0, 5)
        .with_remarks("pfmFeature - Bin size: 1.0, Max trigger distance: 20.0")];
    let config = SynthesisConfig::default();

    let w = survey.weights(&config, &features);
    assert_eq!(w[5][5], 100);
    for (r, c) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
        assert_eq!(w[r][c], 73, "orthogonal neighbour ({r}, {c})");
    }
    for (r, c) in [(4, 4), (4, 6), (6, 4), (6, 6)] {
        assert_eq!(w[r][c], 52, "diagonal neighbour ({r}, {c})");
    }
    assert!(w[5][5] > w[5][6] && w[5][6] > w[6][6]);
    for (r, c) in [(0, 0), (0, 9), (9, 0), (9, 9), (5, 7), (3, 5)] {
        assert_eq!(w[r][c], 0, "cell ({r}, {c}) at or beyond the radius");
    }

    let points = survey.store(survey.uniform_soundings());
    let (sink, summary) = survey.run(config, &points, &features);

    assert_eq!(summary.features_blended, 1);
    assert_eq!(summary.weighted_cells, 9);
    assert_eq!(summary.populated_cells, 100);
    assert_eq!(elevation(&sink, 5, 5), -15.0);
    assert_relative_eq!(elevation(&sink, 5, 6), -(20.0 - 5.0 * 0.73), epsilon = 1e-5);
    assert_relative_eq!(elevation(&sink, 4, 4), -(20.0 - 5.0 * 0.52), epsilon = 1e-5);
    assert_eq!(elevation(&sink, 0, 0), -20.0);
    assert!(sink.tracking().is_empty());
}

#[test]
fn scenario_b_overlapping_features() {
    let survey = Survey::new(11, 11);
    let curve = LogCurve::new();
    let contribution = |ratio: f64| curve.contribution(ratio).unwrap();

    // Shoal soundings at each feature
    let mut points = survey.uniform_soundings();
    points.push(survey.sounding(5, 3, 8.0, 0.1));
    points.push(survey.sounding(5, 7, 12.0, 0.1));
    let points = survey.store(points);

    for radius in [25.0, 30.0] {
        let remarks = format!("pfmFeature - Max trigger distance: {radius}");
        let features = vec![
            survey.feature(5, 3, 8.0, 5).with_remarks(remarks.as_str()),
            survey.feature(5, 7, 12.0, 5).with_remarks(remarks.as_str()),
        ];
        let config = SynthesisConfig::default();
        let w = survey.weights(&config, &features);

        // Midway between both features, 20 m from each
        let expected = (2.0 * contribution(20.0 / radius)).round().min(100.0) as u8;
        assert_eq!(w[5][5], expected, "radius {radius}");

        let (sink, _) = survey.run(config, &points, &features);
        assert_eq!(elevation(&sink, 5, 3), -8.0);
        assert_eq!(elevation(&sink, 5, 7), -12.0);

        // Below the clamp, moving from the overlap toward the shoaler
        // feature pulls the surface up
        if expected < 100 {
            let path: Vec<f32> = [5, 4, 3].iter().map(|&c| elevation(&sink, 5, c)).collect();
            assert!(path.windows(2).all(|p| p[1] > p[0]), "{path:?}");
        }
    }

    // Unclamped overlap sums both contributions
    assert!(2.0 * contribution(0.8) < 100.0);
    assert!(2.0 * contribution(20.0 / 30.0) > 100.0);
}

#[test]
fn scenario_c_low_confidence_feature_is_ignored() {
    let survey = Survey::new(6, 6);
    let points = survey.store(survey.uniform_soundings());
    let config = SynthesisConfig::default();

    let (baseline, _) = survey.run(config.clone(), &points, &Vec::new());
    let features = vec![
        survey.feature(2, 2, 3.0, 2).with_description("Pinnacle"),
        survey
            .feature(3, 3, 3.0, 1)
            .with_remarks("pfmFeature - Max trigger distance: 30"),
    ];
    let (sink, summary) = survey.run(config, &points, &features);

    assert_eq!(summary.features_total, 2);
    assert_eq!(summary.features_blended + summary.features_tracked, 0);
    assert!(sink.tracking().is_empty());
    assert_eq!(sink.elevation().data(), baseline.elevation().data());
    assert_eq!(elevation(&sink, 2, 2), -20.0);
}

#[test]
fn scenario_d_empty_survey_stays_null() {
    let survey = Survey::new(5, 5);
    let points = survey.store(Vec::new());
    let features = vec![
        survey.feature(1, 1, 4.0, 5).with_description("Rock"),
        survey.feature(2, 2, 4.0, 5).with_remarks("pfmFeature - Bin size: 2"),
        FeaturePoint::new(10.0, 10.0, 4.0, 5),
    ];
    let config = SynthesisConfig {
        uncertainty: UncertaintyMode::Final,
        ..Default::default()
    };
    let (sink, summary) = survey.run(config, &points, &features);

    assert_eq!(summary.populated_cells, 0);
    assert_eq!(summary.tracking_entries, 0);
    assert!(sink.tracking().is_empty());
    assert!(sink.elevation().data().iter().all(|&v| v == NULL_ELEVATION));
    assert!(sink
        .uncertainty()
        .unwrap()
        .data()
        .iter()
        .all(|&v| v == NULL_UNCERTAINTY));
}

#[test]
fn manual_feature_overrides_cell_and_is_reproducible() {
    let survey = Survey::new(6, 6);
    let points = survey.store(survey.uniform_soundings());
    let features = vec![
        survey.feature(1, 4, 2.5, 4).with_description("Obstruction"),
        survey.feature(3, 0, 6.0, 3).with_remarks("reported by pilot"),
    ];
    let config = SynthesisConfig::default();

    let (first, summary) = survey.run(config.clone(), &points, &features);
    assert_eq!(summary.features_tracked, 2);
    assert_eq!(summary.tracking_entries, 2);
    assert_eq!(elevation(&first, 1, 4), -2.5);
    assert_eq!(elevation(&first, 3, 0), -6.0);
    assert_eq!(elevation(&first, 1, 3), -20.0);

    let entries = first.tracking();
    assert_eq!(entries[0].sequence, 0);
    assert_eq!((entries[0].row, entries[0].col), (1, 4));
    assert_eq!(entries[0].previous_elevation, -20.0);
    assert_eq!(entries[0].description, "Obstruction");
    assert_eq!(entries[1].sequence, 1);
    assert_eq!(entries[1].description, "reported by pilot");

    let (second, _) = survey.run(config, &points, &features);
    assert_eq!(second.tracking(), entries);
    assert_eq!(second.elevation().data(), first.elevation().data());
}

#[test]
fn uncertainty_grids_follow_the_weight() {
    let survey = Survey::new(7, 7);
    let points = survey.store(survey.uniform_soundings());
    let features = vec![survey
        .feature(3, 3, 15.0, 5)
        .with_remarks("pfmFeature - Max trigger distance: 20")];

    let config = SynthesisConfig {
        uncertainty: UncertaintyMode::AverageTpe,
        ..Default::default()
    };
    let (sink, _) = survey.run(config, &points, &features);
    let unc = sink.uncertainty().unwrap();
    // Shoalest sounding carries 0.5, mean error is 0.4
    assert_relative_eq!(unc.get(3, 3).unwrap(), 0.5, epsilon = 1e-6);
    assert_relative_eq!(unc.get(0, 0).unwrap(), 0.4, epsilon = 1e-6);

    let config = SynthesisConfig {
        uncertainty: UncertaintyMode::StdDev,
        ..Default::default()
    };
    let (sink, _) = survey.run(config, &points, &features);
    let unc = sink.uncertainty().unwrap();
    assert!(unc.data().iter().all(|&v| v >= 0.0));
    assert_relative_eq!(unc.get(0, 0).unwrap(), 50f32.sqrt(), epsilon = 1e-5);
}

#[test]
fn minimum_surface_ignores_features() {
    let survey = Survey::new(5, 5);
    let points = survey.store(survey.uniform_soundings());
    let features = vec![survey
        .feature(2, 2, 15.0, 5)
        .with_remarks("pfmFeature - Max trigger distance: 30")];
    let config = SynthesisConfig {
        surface: SurfaceMode::Minimum,
        ..Default::default()
    };
    let (sink, _) = survey.run(config, &points, &features);
    assert!(sink.elevation().data().iter().all(|&v| v == -15.0));
}

#[test]
fn reference_soundings_only_in_all_depths_mode() {
    let survey = Survey::new(3, 3);
    let mut points = survey.uniform_soundings();
    points.push(survey.sounding(1, 1, 5.0, 0.1).with_flags(PointFlags::REFERENCE));
    points.push(survey.sounding(1, 1, 1.0, 0.1).with_flags(PointFlags::DELETED));
    let points = survey.store(points);

    let (avg, _) = survey.run(SynthesisConfig::default(), &points, &Vec::new());
    assert_eq!(elevation(&avg, 1, 1), -20.0);

    let config = SynthesisConfig {
        surface: SurfaceMode::AllDepths,
        enhanced: false,
        ..Default::default()
    };
    let (all, _) = survey.run(config, &points, &Vec::new());
    assert_relative_eq!(elevation(&all, 1, 1), -15.0, epsilon = 1e-6);
}

#[test]
fn geodetic_run_with_default_radius() {
    let area = AreaBounds::new(-70.02, 43.0, -70.0, 43.02);
    let config = SynthesisConfig {
        bin_size: BinSize::Minutes(0.1),
        ..Default::default()
    };
    let engine = SurfaceEngine::new(config)
        .unwrap()
        .with_geodesic(Box::new(Vincenty::default()));
    assert_eq!(engine.config().min_confidence, 3);
    let geometry = engine.geometry(area).unwrap();
    assert_eq!((geometry.rows(), geometry.cols()), (12, 12));

    let mut points = Vec::new();
    for row in 0..geometry.rows() {
        for col in 0..geometry.cols() {
            let (lon, lat) = geometry.cell_center(row, col);
            points.push(SourcePoint::new(lon, lat, 30.0, 0.2));
            points.push(SourcePoint::new(lon, lat, 40.0, 0.2));
        }
    }
    let points = BinnedPointStore::from_points(points, 0.005, 0.005).unwrap();
    let (lon, lat) = geometry.cell_center(6, 6);
    let features = vec![FeaturePoint::new(lon, lat, 30.0, 5).with_remarks("pfmFeature")];

    let mut sink = MemorySink::new(&geometry, false);
    let summary = engine
        .run(area, &points, &features, &mut sink, &mut NoProgress)
        .unwrap();

    assert_eq!(summary.features_blended, 1);
    // Default radius is ~1.65 north-south cells, ~2.25 cells east-west at 43N
    assert_eq!(summary.weighted_cells, 11);
    assert_eq!(elevation(&sink, 6, 6), -30.0);
    assert!(elevation(&sink, 6, 7) > -35.0 && elevation(&sink, 6, 7) < -30.0);
    assert_eq!(elevation(&sink, 0, 0), -35.0);
}

#[test]
fn projected_rows_across_central_meridian_keep_soundings() {
    // 100 km wide strip straddling easting 500 000, where rows bulge north in lat/lon
    let survey = Survey::with_origin((450_000.0, 4_800_000.0), 4, 10_000);
    let points = survey.store(vec![
        survey.sounding(1, 5000, 12.0, 0.2),
        survey.sounding(1, 0, 14.0, 0.2),
        survey.sounding(1, 9999, 16.0, 0.2),
        survey.sounding(0, 5000, 18.0, 0.2),
    ]);
    let config = SynthesisConfig {
        enhanced: false,
        ..Default::default()
    };

    let (sink, summary) = survey.run(config, &points, &Vec::new());

    assert_eq!(summary.populated_cells, 4);
    assert_eq!(elevation(&sink, 1, 5000), -12.0);
    assert_eq!(elevation(&sink, 1, 0), -14.0);
    assert_eq!(elevation(&sink, 1, 9999), -16.0);
    assert_eq!(elevation(&sink, 0, 5000), -18.0);
    assert_eq!(elevation(&sink, 2, 5000), NULL_ELEVATION);
}
