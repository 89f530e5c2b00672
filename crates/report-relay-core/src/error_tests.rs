//! Tests for error types.

use super::*;
use std::error::Error as _;

#[test]
fn test_not_found_classification() {
    assert!(ProviderError::QueueNotFound("FL_acc.fifo".to_string()).is_not_found());
    assert!(ProviderError::ObjectNotFound {
        bucket: "bp-temp-us".to_string(),
        key: "FL_acc_50".to_string(),
    }
    .is_not_found());

    assert!(!ProviderError::AccessDenied("denied".to_string()).is_not_found());
    assert!(!ProviderError::NetworkError("connection reset".to_string()).is_not_found());
    assert!(!ProviderError::Authentication("bad token".to_string()).is_not_found());
}

#[test]
fn test_submission_failure_preserves_cause() {
    let error = RelayError::SubmissionFailed {
        queue: "https://sqs.us-east-2.amazonaws.com/123/FL_acc.fifo".to_string(),
        source: ProviderError::Authentication("SignatureDoesNotMatch".to_string()),
    };

    let source = error.source().expect("submission failure should carry a cause");
    assert!(source.to_string().contains("SignatureDoesNotMatch"));
    assert!(error.to_string().contains("FL_acc.fifo"));
}

#[test]
fn test_store_hard_failure_wraps_provider_error() {
    let error = RelayError::store(ProviderError::AccessDenied("AccessDenied".to_string()));

    match &error {
        RelayError::HardFailure { message, source } => {
            assert!(message.contains("Access denied"));
            assert!(source.is_some());
        }
        other => panic!("Expected HardFailure, got {:?}", other),
    }
}

#[test]
fn test_filesystem_hard_failure_names_path() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let error = RelayError::filesystem("write", Path::new("/tmp/out/report"), io_error);

    assert!(error.to_string().contains("/tmp/out/report"));
    assert!(error.source().is_some());
}

#[test]
fn test_timeout_message_reports_attempts() {
    let error = RelayError::Timeout {
        bucket: "bp-temp-us".to_string(),
        key: "FL_acc_50".to_string(),
        attempts: 30,
    };

    assert_eq!(
        error.to_string(),
        "Timed out waiting for s3://bp-temp-us/FL_acc_50 after 30 attempts"
    );
}
