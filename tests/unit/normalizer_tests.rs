// Transformation parameter normalization through the public API

use mediacache::transform::{FitMode, Operation, OutputFormat, TransformationSpec};
use mediacache::MediaError;
use std::collections::HashMap;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_same_set_in_any_order_gives_same_spec() {
    let orders: [&[(&str, &str)]; 3] = [
        &[("width", "100"), ("height", "50"), ("format", "webp")],
        &[("format", "webp"), ("height", "50"), ("width", "100")],
        &[("height", "50"), ("format", "webp"), ("width", "100")],
    ];

    let specs: Vec<TransformationSpec> = orders
        .iter()
        .map(|pairs| TransformationSpec::normalize(&params(pairs)).unwrap())
        .collect();

    assert!(specs.windows(2).all(|w| w[0] == w[1]));
    assert!(specs
        .iter()
        .all(|s| s.suffix() == "__fmax_fwebp_h50_w100"));
}

#[test]
fn test_fit_comes_first() {
    let spec = TransformationSpec::normalize(&params(&[
        ("quality", "70"),
        ("format", "webp"),
        ("width", "100"),
        ("height", "50"),
    ]))
    .unwrap();

    assert_eq!(
        spec.operations(),
        &[
            Operation::Fit {
                mode: FitMode::Max,
                width: 100,
                height: 50
            },
            Operation::Format {
                value: OutputFormat::WebP
            },
            Operation::Quality { value: 70 },
        ]
    );
}

#[test]
fn test_validation_error_names_the_key() {
    let err: MediaError = TransformationSpec::normalize(&params(&[("quality", "0")]))
        .unwrap_err()
        .into();

    match err {
        MediaError::Validation { key, .. } => assert_eq!(key, "quality"),
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[test]
fn test_crop_without_dimensions_is_rejected() {
    assert!(TransformationSpec::normalize(&params(&[("crop", "true")])).is_err());
    assert!(TransformationSpec::normalize(&params(&[
        ("crop", "true"),
        ("width", "10"),
        ("height", "10"),
    ]))
    .is_ok());
}
