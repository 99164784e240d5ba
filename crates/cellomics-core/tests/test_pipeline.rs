mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{ImageBuffer, Luma};
use ndarray::s;

use cellomics_core::error::CellomicsError;
use cellomics_core::frame::{ChannelOrder, CompositeImage};
use cellomics_core::group::group_by_acquisition;
use cellomics_core::io::FileCodec;
use cellomics_core::pipeline::config::PipelineConfig;
use cellomics_core::pipeline::{
    process_well, run_batch, run_pipeline, run_pipeline_reported, PipelineStage,
    ProgressReporter,
};
use cellomics_core::rescale::TargetBitDepth;

use common::{tile_refs, MemoryCodec, PLATE};

fn field_value(field: u32) -> u16 {
    100 + field as u16
}

fn config_for(output: &Path) -> PipelineConfig {
    PipelineConfig {
        input: PathBuf::from("unused"),
        output: output.to_path_buf(),
        ..Default::default()
    }
}

fn expected_output(output: &Path, well: &str) -> PathBuf {
    output
        .join(PLATE.to_string())
        .join(format!("MFGTMP-{PLATE}-{well}.TIF"))
}

// ---------------------------------------------------------------------------
// process_well
// ---------------------------------------------------------------------------

#[test]
fn test_process_well_two_channels() {
    let out = tempfile::tempdir().unwrap();
    let src = PathBuf::from("plate");
    let mut codec = MemoryCodec::default();
    let mut paths = codec.add_channel(&src, "A01", 0, (2, 2), field_value);
    paths.extend(codec.add_channel(&src, "A01", 1, (2, 2), |f| 1000 - f as u16));

    let groups = group_by_acquisition(paths).unwrap();
    let (key, tiles) = groups.iter().next().unwrap();
    let config = config_for(out.path());

    let result = process_well(key, tiles, &config, &codec).unwrap();
    assert_eq!(result.path, expected_output(out.path(), "A01"));
    assert_eq!(result.channels, vec![0, 1]);
    assert!(out.path().join(PLATE.to_string()).is_dir());

    let written = codec.written();
    assert_eq!(written.len(), 1);
    let (path, image) = &written[0];
    assert_eq!(path, &result.path);
    let CompositeImage::U8(data) = image else {
        panic!("expected 8-bit composite");
    };
    assert_eq!(data.dim(), (10, 10, 3));
    // Field 0 (dimmest in channel 0) sits at the centre.
    assert_eq!(data[[4, 4, 0]], 0);
    // Field 24 (brightest in channel 0) sits top-right.
    assert_eq!(data[[0, 9, 0]], 255);
    // Channel 1 is inverted.
    assert_eq!(data[[4, 4, 1]], 255);
    assert_eq!(data[[0, 9, 1]], 0);
    // Channel 2 was never acquired.
    assert!(data.slice(s![.., .., 2]).iter().all(|&v| v == 0));
}

#[test]
fn test_process_well_respects_order_and_depth() {
    let out = tempfile::tempdir().unwrap();
    let mut codec = MemoryCodec::default();
    let paths = codec.add_channel(&PathBuf::from("p"), "B02", 0, (3, 3), field_value);

    let groups = group_by_acquisition(paths).unwrap();
    let (key, tiles) = groups.iter().next().unwrap();
    let config = PipelineConfig {
        order: ChannelOrder::new([2, 1, 0]).unwrap(),
        target_bit_depth: TargetBitDepth::Sixteen,
        ..config_for(out.path())
    };

    process_well(key, tiles, &config, &codec).unwrap();

    let written = codec.written();
    let CompositeImage::U16(data) = &written[0].1 else {
        panic!("expected 16-bit composite");
    };
    assert!(data.slice(s![.., .., 0]).iter().all(|&v| v == 0));
    assert_eq!(data[[0, 14, 2]], 65535);
}

#[test]
fn test_process_well_ignores_channels_above_two() {
    let out = tempfile::tempdir().unwrap();
    let src = PathBuf::from("p");
    let mut codec = MemoryCodec::default();
    let mut paths = codec.add_channel(&src, "C03", 0, (2, 2), field_value);
    paths.extend(codec.add_channel(&src, "C03", 3, (2, 2), field_value));

    let groups = group_by_acquisition(paths).unwrap();
    let (key, tiles) = groups.iter().next().unwrap();

    let result = process_well(key, tiles, &config_for(out.path()), &codec).unwrap();
    assert_eq!(result.channels, vec![0]);
}

#[test]
fn test_process_well_incomplete_channel_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let src = PathBuf::from("p");
    let mut codec = MemoryCodec::default();
    let mut paths = codec.add_channel(&src, "A01", 0, (2, 2), field_value);
    let mut partial = codec.add_channel(&src, "A01", 1, (2, 2), field_value);
    partial.pop();
    paths.extend(partial);

    let tiles = tile_refs(&paths);
    let key = tiles[0].record.acquisition_key();

    let err = process_well(&key, &tiles, &config_for(out.path()), &codec).unwrap_err();
    assert!(matches!(err, CellomicsError::TileCount { found: 24, .. }));
    assert!(codec.written().is_empty());
    assert!(!out.path().join(PLATE.to_string()).exists());
}

// ---------------------------------------------------------------------------
// run_batch
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CountingReporter {
    advanced: AtomicUsize,
    stages: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.fetch_add(1, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.advanced.fetch_add(1, Ordering::SeqCst);
    }
}

fn batch_with_broken_well(parallel: bool) {
    let out = tempfile::tempdir().unwrap();
    let src = PathBuf::from("p");
    let mut codec = MemoryCodec::default();
    let mut paths = Vec::new();
    for well in ["A01", "A02", "A03"] {
        paths.extend(codec.add_channel(&src, well, 0, (2, 2), field_value));
    }
    // A02 has a tile with the wrong shape.
    codec.insert(paths[30].clone(), ndarray::Array2::zeros((3, 2)));

    let groups = group_by_acquisition(paths).unwrap();
    let config = PipelineConfig {
        parallel,
        ..config_for(out.path())
    };
    let counter = Arc::new(CountingReporter::default());
    let reporter: Arc<dyn ProgressReporter> = counter.clone();

    let report = run_batch(&groups, &config, &codec, &reporter);

    assert_eq!(report.wells.len(), 3);
    assert_eq!(report.failure_count(), 1);
    assert!(!report.is_success());
    let (failed_key, err) = report.failed().next().unwrap();
    assert_eq!(failed_key.well, "A02");
    assert!(matches!(err, CellomicsError::TileShapeMismatch { .. }));

    let mut written: Vec<PathBuf> = codec.written().into_iter().map(|(p, _)| p).collect();
    written.sort();
    assert_eq!(
        written,
        vec![
            expected_output(out.path(), "A01"),
            expected_output(out.path(), "A03"),
        ]
    );
    assert_eq!(report.succeeded().count(), 2);
    assert_eq!(counter.advanced.load(Ordering::SeqCst), 3);
    assert_eq!(counter.stages.load(Ordering::SeqCst), 1);
}

#[test]
fn test_run_batch_isolates_failures_parallel() {
    batch_with_broken_well(true);
}

#[test]
fn test_run_batch_isolates_failures_sequential() {
    batch_with_broken_well(false);
}

// ---------------------------------------------------------------------------
// run_pipeline (on disk)
// ---------------------------------------------------------------------------

fn write_plate(dir: &Path, well: &str, channels: &[u32]) {
    for &channel in channels {
        for field in 0..25u32 {
            let name = common::tile_name(PLATE, well, field, channel);
            let value = (field * 150 + channel) as u16;
            let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_pixel(3, 2, Luma([value]));
            img.save(dir.join(name)).unwrap();
        }
    }
}

#[test]
fn test_run_pipeline_end_to_end() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_plate(input.path(), "A01", &[0, 1]);
    write_plate(input.path(), "B07", &[0, 1, 2]);
    std::fs::write(input.path().join("README.txt"), b"not a tile").unwrap();

    let config = PipelineConfig {
        input: input.path().to_path_buf(),
        output: output.path().to_path_buf(),
        ..Default::default()
    };

    let report = run_pipeline(&config, Arc::new(FileCodec)).unwrap();
    assert!(report.is_success());
    assert_eq!(report.wells.len(), 2);

    for well in ["A01", "B07"] {
        let path = expected_output(output.path(), well);
        let rgb = image::open(&path).unwrap().to_rgb8();
        assert_eq!(rgb.dimensions(), (15, 10));
        // Centre cell holds field 0: the darkest value after stretching.
        assert_eq!(rgb.get_pixel(7, 5).0[0], 0);
    }
    let a01 = image::open(expected_output(output.path(), "A01"))
        .unwrap()
        .to_rgb8();
    assert_eq!(a01.get_pixel(0, 0).0[2], 0);
}

#[test]
fn test_run_pipeline_reports_all_stages() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_plate(input.path(), "A01", &[0]);

    let config = PipelineConfig {
        input: input.path().to_path_buf(),
        output: output.path().to_path_buf(),
        ..Default::default()
    };
    let counter = Arc::new(CountingReporter::default());

    let report = run_pipeline_reported(&config, Arc::new(FileCodec), counter.clone()).unwrap();
    assert!(report.is_success());
    assert_eq!(counter.stages.load(Ordering::SeqCst), 3);
    assert_eq!(counter.advanced.load(Ordering::SeqCst), 1);
}

#[test]
fn test_run_pipeline_rejects_invalid_stretch() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.input = dir.path().to_path_buf();
    config.stretch.low_percentile = 0.7;
    config.stretch.high_percentile = Some(0.3);

    assert!(matches!(
        run_pipeline(&config, Arc::new(FileCodec)),
        Err(CellomicsError::InvalidStretch { .. })
    ));
}

#[test]
fn test_run_pipeline_malformed_tile_name() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("stray.tif"), b"").unwrap();

    let config = PipelineConfig {
        input: input.path().to_path_buf(),
        output: output.path().to_path_buf(),
        ..Default::default()
    };
    assert!(matches!(
        run_pipeline(&config, Arc::new(FileCodec)),
        Err(CellomicsError::MalformedFilename { .. })
    ));
}
