use relief::{Bounds, Terrain, TerrainConfig, TerrainError};
use validator::ValidationErrors;

#[test]
fn test_config_validation() {
    let config = TerrainConfig {
        seed: 0.into(),
        size: 5000,  // invalid (too big)
        range: -1.0, // invalid
        ..Default::default()
    };

    // This is a bit of a lazy check but it works well enough
    let err = Terrain::generate(config).unwrap_err();
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    let mut error_fields = validation_errors
        .errors()
        .keys()
        .copied()
        .collect::<Vec<&str>>();
    error_fields.sort_unstable();
    assert_eq!(
        error_fields,
        vec!["range", "size"],
        "incorrect validation errors in {:#?}",
        validation_errors
    );
}

#[test]
fn test_invalid_dimension() {
    let config = TerrainConfig {
        seed: 0.into(),
        size: 0,
        ..Default::default()
    };
    let err = Terrain::generate(config).unwrap_err();
    assert_eq!(
        err.downcast::<TerrainError>().unwrap(),
        TerrainError::InvalidDimension { size: 0 }
    );
}

#[test]
fn test_invalid_bounds() {
    let bounds = Bounds::new(0.0, 1.0, 2.0, -2.0);
    let config = TerrainConfig {
        seed: 0.into(),
        bounds,
        ..Default::default()
    };
    let err = Terrain::generate(config).unwrap_err();
    assert_eq!(
        err.downcast::<TerrainError>().unwrap(),
        TerrainError::InvalidBounds { bounds }
    );
}

/// NaN gets past a plain range check, so it needs its own rule
#[test]
fn test_nan_range() {
    let config = TerrainConfig {
        seed: 0.into(),
        range: f64::NAN,
        ..Default::default()
    };
    let err = Terrain::generate(config).unwrap_err();
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    assert!(validation_errors.field_errors().contains_key("range"));
}
