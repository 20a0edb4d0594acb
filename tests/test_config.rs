mod common;

use cardscan::detection::preprocessing::gaussian_kernel;
use cardscan::{CardScanError, OutputSize, ShapeDetector};
use common::*;
use std::fs;

#[test]
fn test_defaults() {
    let config = RecognitionConfig::default();
    assert_eq!(config.blur_kernel, 11);
    assert_eq!(config.edge_low, 100.0);
    assert_eq!(config.edge_high, 150.0);
    assert_eq!(config.poly_tolerance, 0.02);
    assert_eq!(config.output_size, OutputSize { width: 480, height: 360 });
    assert_eq!(config.input_scale, 0.5);
    assert!(config.validate().is_ok());
    assert!((config.blur_sigma() - 2.0).abs() < 1e-6);
}

#[test]
fn test_partial_file_keeps_defaults() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "input_scale": 1.0, "output_size": { "width": 640, "height": 480 } }"#)?;

    let config = RecognitionConfig::from_file(&path)?;
    assert_eq!(config.input_scale, 1.0);
    assert_eq!(config.output_size, OutputSize { width: 640, height: 480 });
    assert_eq!(config.blur_kernel, 11);
    assert_eq!(config.max_features, 500);
    Ok(())
}

#[test]
fn test_invalid_file_rejected() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");

    fs::write(&path, r#"{ "blur_kernel": 4 }"#)?;
    assert!(RecognitionConfig::from_file(&path).is_err());

    fs::write(&path, "not json")?;
    assert!(RecognitionConfig::from_file(&path).is_err());

    assert!(RecognitionConfig::from_file(&dir.path().join("missing.json")).is_err());
    Ok(())
}

#[test]
fn test_validate_rejects_bad_values() {
    let cases = [
        RecognitionConfig { blur_kernel: 0, ..Default::default() },
        RecognitionConfig { blur_kernel: 10, ..Default::default() },
        RecognitionConfig { edge_low: 200.0, ..Default::default() },
        RecognitionConfig { poly_tolerance: 0.0, ..Default::default() },
        RecognitionConfig { output_size: OutputSize { width: 0, height: 360 }, ..Default::default() },
        RecognitionConfig { input_scale: 0.0, ..Default::default() },
        RecognitionConfig { channel_capacity: 0, ..Default::default() },
    ];
    for config in &cases {
        assert!(matches!(config.validate(), Err(CardScanError::InvalidConfig(_))), "{:?}", config);
    }
}

#[test]
fn test_with_input_scale() {
    let config = RecognitionConfig::default().with_input_scale(1.0);
    assert_eq!(config.input_scale, 1.0);
    assert_eq!(config.blur_kernel, 11);
}

#[test]
fn test_blur_kernel_matches_config() {
    let config = RecognitionConfig::default();
    let kernel = gaussian_kernel(config.blur_kernel, config.blur_sigma());
    assert_eq!(kernel.len(), 11);
    assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert!(kernel.iter().zip(kernel.iter().rev()).all(|(a, b)| (a - b).abs() < 1e-7));
    assert!(kernel.iter().all(|&w| w <= kernel[5]));

    let wide = RecognitionConfig { blur_kernel: 21, ..Default::default() };
    assert_eq!(gaussian_kernel(wide.blur_kernel, wide.blur_sigma()).len(), 21);
    assert_eq!(ShapeDetector::new(&wide).blur_kernel, 21);
}
