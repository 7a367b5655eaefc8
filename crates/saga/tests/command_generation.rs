//! End-to-end runs against an in-memory host and a recording runner.
//!
//! Nothing here needs a SAGA installation: the runner records the commands
//! and simulates the files SAGA would write.

use std::collections::HashMap;
use std::path::PathBuf;

use approx::assert_relative_eq;
use sagabridge::{
    AlgorithmDescriptor, AlgorithmHooks, CommandRunner, Feedback, LogFeedback, ParamValue,
    Parameters, ProcessingContext, SagaAlgorithm, SagaError, SagaSession, SagaSettings,
};
use sagabridge_core::{GeoTransform, RasterInfo, CRS};
use tempfile::TempDir;

/// Host with a fixed set of layers; temporary files go into a temp dir.
struct MemoryContext {
    temp: TempDir,
    rasters: HashMap<String, RasterInfo>,
    vectors: HashMap<String, (String, Option<CRS>)>,
    counter: std::cell::Cell<usize>,
}

impl MemoryContext {
    fn new() -> Self {
        Self {
            temp: tempfile::tempdir().unwrap(),
            rasters: HashMap::new(),
            vectors: HashMap::new(),
            counter: std::cell::Cell::new(0),
        }
    }

    fn raster(mut self, source: &str, name: &str, bands: usize, origin_x: f64) -> Self {
        self.rasters.insert(
            source.to_string(),
            RasterInfo {
                name: name.to_string(),
                band_count: bands,
                width: 100,
                height: 100,
                transform: GeoTransform::new(origin_x, 1000.0, 10.0, -10.0),
            },
        );
        self
    }

    fn vector(mut self, source: &str, shapefile: &str, crs: Option<CRS>) -> Self {
        self.vectors
            .insert(source.to_string(), (shapefile.to_string(), crs));
        self
    }
}

impl ProcessingContext for MemoryContext {
    fn raster_info(&self, source: &str) -> Option<RasterInfo> {
        self.rasters.get(source).cloned()
    }

    fn layer_name(&self, source: &str) -> Option<String> {
        self.rasters.get(source).map(|r| r.name.clone())
    }

    fn source_crs(&self, source: &str) -> Option<CRS> {
        self.vectors.get(source).and_then(|(_, crs)| crs.clone())
    }

    fn compatible_vector_path(
        &self,
        source: &str,
        _formats: &[&str],
        _preferred: &str,
        _feedback: &mut dyn Feedback,
    ) -> sagabridge::Result<Option<String>> {
        Ok(self.vectors.get(source).map(|(path, _)| path.clone()))
    }

    fn temp_filename(&self, basename: &str) -> sagabridge::Result<PathBuf> {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        let dir = self.temp.path().join(format!("t{}", n));
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(basename))
    }
}

/// Records every batch and creates the grids `io_gdal` would export.
#[derive(Default)]
struct RecordingRunner {
    batches: Vec<Vec<String>>,
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, commands: &[String], feedback: &mut dyn Feedback) -> sagabridge::Result<()> {
        for command in commands {
            if let Some(rest) = command.strip_prefix("io_gdal") {
                let start = rest.find("-GRIDS \"").unwrap() + "-GRIDS \"".len();
                let end = start + rest[start..].find('"').unwrap();
                std::fs::write(&rest[start..end], "").unwrap();
            }
        }
        feedback.set_progress(100.0);
        self.batches.push(commands.to_vec());
        Ok(())
    }
}

fn algorithm(text: &str) -> SagaAlgorithm {
    SagaAlgorithm::new(AlgorithmDescriptor::parse(text, "test").unwrap())
}

fn text(value: &str) -> ParamValue {
    ParamValue::Text(value.to_string())
}

const SLOPE: &str = "Slope, Aspect, Curvature\n\
    ta_morphometry\n\
    QgsProcessingParameterRasterLayer|ELEVATION|Elevation|None|False\n\
    QgsProcessingParameterEnum|METHOD|Method|[0] maximum slope;[1] maximum triangle slope|False|1\n\
    QgsProcessingParameterRasterDestination|SLOPE|Slope\n\
    Hardcoded|-UNIT_SLOPE 0\n";

#[test]
fn test_raster_run_exports_then_calls_tool() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("slope.sdat").display().to_string();
    let ctx = MemoryContext::new().raster("/data/dem.tif", "My DEM", 1, 0.0);
    let alg = algorithm(SLOPE);
    let mut session = SagaSession::new(SagaSettings::default());
    let mut runner = RecordingRunner::default();
    let mut feedback = LogFeedback::new();

    let mut params = Parameters::new();
    params.insert("ELEVATION".into(), text("/data/dem.tif"));
    params.insert("SLOPE".into(), text(&out));

    let outputs = alg
        .process(&mut session, &params, &ctx, &mut runner, &mut feedback)
        .unwrap();

    let commands = &runner.batches[0];
    assert_eq!(commands.len(), 2);
    assert!(commands[0].starts_with("io_gdal 0 -TRANSFORM 1 -RESAMPLING 3 -GRIDS \""));
    assert!(commands[0].contains("MyDEM.sgrd"));
    assert!(commands[0].ends_with("-FILES \"/data/dem.tif\""));

    let grid = session.cache.lookup("/data/dem.tif").unwrap();
    assert_eq!(
        commands[1],
        format!(
            "ta_morphometry \"Slope, Aspect, Curvature\" -UNIT_SLOPE 0 -ELEVATION \"{}\" -METHOD 1 -SLOPE \"{}\"",
            grid.display(),
            out
        )
    );
    assert_eq!(outputs.get("SLOPE"), Some(&out));
    assert_eq!(outputs.len(), 1);
    assert_relative_eq!(feedback.progress(), 100.0);
    // No vector input, so no CRS and no sidecar.
    assert!(!dir.path().join("slope.prj").exists());
}

#[test]
fn test_session_cache_skips_second_export() {
    let ctx = MemoryContext::new().raster("/data/dem.tif", "dem", 1, 0.0);
    let alg = algorithm(SLOPE);
    let mut session = SagaSession::new(SagaSettings::default());
    let mut runner = RecordingRunner::default();
    let mut params = Parameters::new();
    params.insert("ELEVATION".into(), text("/data/dem.tif"));

    for _ in 0..2 {
        alg.process(&mut session, &params, &ctx, &mut runner, &mut LogFeedback::new())
            .unwrap();
    }
    assert_eq!(runner.batches[0].len(), 2);
    assert_eq!(runner.batches[1].len(), 1);
    assert!(runner.batches[1][0].starts_with("ta_morphometry"));
    assert_eq!(session.cache.len(), 1);
}

#[test]
fn test_vector_crs_is_written_next_to_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let grid = dir.path().join("density.sdat").display().to_string();
    let ctx = MemoryContext::new().vector("roads", "/data/roads.shp", Some(CRS::wgs84()));
    let alg = algorithm(
        "Line Density\ngrid_gridding\n\
         QgsProcessingParameterFeatureSource|LINES|Lines|-1|None|False\n\
         QgsProcessingParameterNumber|RADIUS|Radius|QgsProcessingParameterNumber.Double|100|False|None|None\n\
         QgsProcessingParameterRasterDestination|DENSITY|Density\n",
    );
    let mut session = SagaSession::default();
    let mut runner = RecordingRunner::default();
    let mut params = Parameters::new();
    params.insert("LINES".into(), text("roads"));
    params.insert("DENSITY".into(), text(&grid));

    let outputs = alg
        .process(&mut session, &params, &ctx, &mut runner, &mut LogFeedback::new())
        .unwrap();

    assert_eq!(
        runner.batches[0],
        vec![format!(
            "grid_gridding \"Line Density\"  -LINES \"/data/roads.shp\" -RADIUS 100.0 -DENSITY \"{}\"",
            grid
        )]
    );
    assert_eq!(outputs["DENSITY"], grid);
    let prj = std::fs::read_to_string(dir.path().join("density.prj")).unwrap();
    assert!(prj.starts_with("GEOGCS"));
}

#[test]
fn test_multiple_layers_keep_exported_paths_as_flag() {
    let ctx = MemoryContext::new()
        .raster("/data/a.sgrd", "a", 1, 0.0)
        .raster("/data/b.tif", "b", 1, 0.0);
    let alg = algorithm(
        "Grid Statistics for Points\nshapes_grid\n\
         QgsProcessingParameterMultipleLayers|GRIDS|Grids|3|None|False\n",
    );
    let mut session = SagaSession::default();
    let mut feedback = LogFeedback::new();
    let mut params = Parameters::new();
    params.insert(
        "GRIDS".into(),
        ParamValue::Layers(vec!["/data/a.sgrd".into(), "/data/b.tif".into()]),
    );

    let plan = alg
        .prepare(&mut session, &params, &ctx, &mut feedback)
        .unwrap();
    let exported = session.cache.lookup("/data/b.tif");
    // Not run yet, so the export is not on disk and the cache evicts it.
    assert!(exported.is_none());

    let b_grid = plan.commands[0]
        .split("-GRIDS \"")
        .nth(1)
        .and_then(|s| s.split('"').next())
        .unwrap()
        .to_string();
    let joined = format!("/data/a.sgrd;{}", b_grid);
    assert_eq!(
        plan.commands[1],
        format!("shapes_grid \"Grid Statistics for Points\"  -{} \"{}\"", joined, joined)
    );
}

#[test]
fn test_validation_failure_runs_nothing() {
    let ctx = MemoryContext::new()
        .raster("/data/a.tif", "a", 1, 0.0)
        .raster("/data/b.tif", "b", 1, 50.0);
    let alg = algorithm(
        "Grid Difference\ngrid_calculus\n\
         QgsProcessingParameterRasterLayer|A|A|None|False\n\
         QgsProcessingParameterRasterLayer|B|B|None|False\n\
         QgsProcessingParameterRasterDestination|C|Difference\n",
    );
    let mut session = SagaSession::default();
    let mut runner = RecordingRunner::default();
    let mut params = Parameters::new();
    params.insert("A".into(), text("/data/a.tif"));
    params.insert("B".into(), text("/data/b.tif"));

    let err = alg
        .process(&mut session, &params, &ctx, &mut runner, &mut LogFeedback::new())
        .unwrap_err();
    assert!(matches!(err, SagaError::ExtentMismatch));
    assert!(runner.batches.is_empty());
    assert!(session.cache.is_empty());
}

#[test]
fn test_edit_hook_rewrites_commands() {
    fn append_flag(mut commands: Vec<String>) -> Vec<String> {
        if let Some(last) = commands.last_mut() {
            last.push_str(" -EXTRA 1");
        }
        commands
    }
    fn pick_method(_: &AlgorithmDescriptor, params: &mut Parameters) {
        params.insert("METHOD".into(), ParamValue::Enum(0));
    }

    let ctx = MemoryContext::new();
    let alg = algorithm(SLOPE);
    let mut session = SagaSession::default();
    session.hooks.register(
        alg.descriptor().hook_key(),
        AlgorithmHooks {
            pre_process: Some(pick_method),
            edit_commands: Some(append_flag),
        },
    );
    let mut params = Parameters::new();
    params.insert("ELEVATION".into(), text("/data/dem.sgrd"));
    params.insert("SLOPE".into(), text("/out/slope.sdat"));

    let plan = alg
        .prepare(&mut session, &params, &ctx, &mut LogFeedback::new())
        .unwrap();
    assert_eq!(
        plan.commands,
        vec!["ta_morphometry \"Slope, Aspect, Curvature\" -UNIT_SLOPE 0 -ELEVATION \"/data/dem.sgrd\" -METHOD 0 -SLOPE \"/out/slope.sdat\" -EXTRA 1".to_string()]
    );
}

#[test]
fn test_rgb_composite_adds_image_export() {
    let ctx = MemoryContext::new();
    let alg = algorithm(
        "RGB Composite\ngrid_visualisation\n\
         QgsProcessingParameterRasterLayer|R_GRID|Red|None|False\n\
         QgsProcessingParameterRasterDestination|RGB|Output RGB\n",
    );
    let mut session = SagaSession::default();
    let mut runner = RecordingRunner::default();
    let mut params = Parameters::new();
    params.insert("R_GRID".into(), text("/data/red.sgrd"));
    params.insert("RGB".into(), text("/out/rgb.sdat"));

    alg.process(&mut session, &params, &ctx, &mut runner, &mut LogFeedback::new())
        .unwrap();
    let commands = &runner.batches[0];
    assert_eq!(commands.len(), 2);
    assert_eq!(
        commands[1],
        "io_grid_image 0 -IS_RGB -GRID:\"/out/rgb.sdat.sgrd\" -FILE:\"/out/rgb.sdat\""
    );
}

#[test]
fn test_missing_required_input() {
    let ctx = MemoryContext::new();
    let alg = algorithm(SLOPE);
    let err = alg
        .process(
            &mut SagaSession::default(),
            &Parameters::new(),
            &ctx,
            &mut RecordingRunner::default(),
            &mut LogFeedback::new(),
        )
        .unwrap_err();
    assert!(matches!(err, SagaError::MissingParameter(ref name) if name == "ELEVATION"));
}

#[test]
fn test_failed_export_keeps_earlier_exports_cached() {
    let ctx = MemoryContext::new().raster("/data/dem.tif", "dem", 1, 0.0);
    let alg = algorithm(
        "Grid Values to Points\nshapes_grid\n\
         QgsProcessingParameterRasterLayer|GRIDS|Grids|None|False\n\
         QgsProcessingParameterFeatureSource|POLYGONS|Polygons|2|None|False\n\
         QgsProcessingParameterVectorDestination|SHAPES|Shapes\n",
    );
    let mut session = SagaSession::default();
    let mut runner = RecordingRunner::default();
    let mut params = Parameters::new();
    params.insert("GRIDS".into(), text("/data/dem.tif"));
    params.insert("POLYGONS".into(), text("/data/areas.gpkg"));

    let err = alg
        .process(&mut session, &params, &ctx, &mut runner, &mut LogFeedback::new())
        .unwrap_err();
    assert!(matches!(err, SagaError::UnsupportedFormat { ref param, .. } if param == "POLYGONS"));
    assert!(runner.batches.is_empty());
    // The grid exported before the failure stays cached for the next run.
    assert_eq!(session.cache.len(), 1);
}
