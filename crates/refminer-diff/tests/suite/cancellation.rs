use std::time::Duration;

use refminer_config::DetectionConfig;
use refminer_diff::{CancellationToken, DetectionContext, DiffError};

use super::fixtures::{detect_with, extraction};

#[test]
fn elapsed_deadline_aborts_the_class_pair() {
    let (input, aligner) = extraction();
    let ctx = DetectionContext::default().with_timeout(Duration::ZERO);

    let result = detect_with(&input, &aligner, &DetectionConfig::default(), &ctx);

    assert!(
        matches!(result, Err(DiffError::Timeout { .. })),
        "expected a timeout, got {result:?}"
    );
}

#[test]
fn cancelled_token_aborts_the_class_pair() {
    let (input, aligner) = extraction();
    let token = CancellationToken::new();
    let ctx = DetectionContext::new(token.clone());
    token.cancel();

    let result = detect_with(&input, &aligner, &DetectionConfig::default(), &ctx);

    assert!(matches!(result, Err(DiffError::Cancelled { .. })), "got {result:?}");
    assert!(aligner.requests().is_empty());
}

#[test]
fn generous_deadline_does_not_interfere() {
    let (input, aligner) = extraction();
    let config = DetectionConfig {
        timeout_ms: Some(60_000),
        ..DetectionConfig::default()
    };
    let ctx = DetectionContext::default().with_optional_timeout(config.timeout());

    let report = detect_with(&input, &aligner, &config, &ctx).expect("detection");

    assert_eq!(report.refactorings.len(), 1);
}
