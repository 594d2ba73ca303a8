//! Integration tests for resilience primitives

#![cfg(feature = "foundation")]

use std::time::Duration;

use storefront_common::resilience::{Backoff, Jitter};
use storefront_common::{ErrorClassification, ErrorSeverity};

/// Without jitter the retry delays for a 1s base are 1s, 2s, 4s, 8s.
#[test]
fn test_backoff_doubles_from_base() {
    let backoff = Backoff::new();
    let base = Duration::from_secs(1);

    let delays: Vec<_> = (0..4).map(|attempt| backoff.delay(attempt, base)).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8)
        ]
    );
}

/// Jitter is off unless requested.
#[test]
fn test_default_backoff_has_no_jitter() {
    assert_eq!(Backoff::default().jitter(), Jitter::None);
    assert_eq!(Backoff::new().with_jitter(0.2).jitter(), Jitter::Proportional(0.2));
}

/// Errors outside this crate can plug into the classification trait.
#[test]
fn test_external_error_classification() {
    struct Flaky;

    impl ErrorClassification for Flaky {
        fn is_retryable(&self) -> bool {
            true
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Warning
        }

        fn is_critical(&self) -> bool {
            false
        }
    }

    let err = Flaky;
    assert!(err.is_retryable());
    assert!(!err.is_critical());
    assert!(err.severity() < ErrorSeverity::Error);
}
