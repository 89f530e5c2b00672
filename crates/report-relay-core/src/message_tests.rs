//! Tests for message and queue identifier types.

use super::*;
use chrono::TimeZone;

#[test]
fn test_queue_target_recognizes_addresses() {
    let target = QueueTarget::parse("https://sqs.us-east-2.amazonaws.com/123456789012/FL_acc.fifo");
    match target {
        QueueTarget::Address(address) => {
            assert_eq!(address.queue_name(), "FL_acc.fifo");
            assert!(address.is_fifo());
        }
        other => panic!("Expected address, got {:?}", other),
    }

    assert!(matches!(
        QueueTarget::parse("http://localhost:4566/000000000000/reports"),
        QueueTarget::Address(_)
    ));
}

#[test]
fn test_queue_target_treats_bare_identifiers_as_names() {
    assert_eq!(
        QueueTarget::parse("FL_acc.fifo"),
        QueueTarget::Name("FL_acc.fifo".to_string())
    );
    assert_eq!(
        QueueTarget::parse("  reports  "),
        QueueTarget::Name("reports".to_string())
    );
}

#[test]
fn test_queue_address_fifo_detection() {
    assert!(QueueAddress::new("https://sqs.us-east-2.amazonaws.com/1/FL_acc.fifo").is_fifo());
    assert!(!QueueAddress::new("https://sqs.us-east-2.amazonaws.com/1/FL_acc").is_fifo());
    assert!(!QueueAddress::new("https://sqs.us-east-2.amazonaws.com/1/fifo-reports").is_fifo());
}

#[test]
fn test_queue_name_ignores_trailing_slash() {
    let address = QueueAddress::new("https://sqs.us-east-2.amazonaws.com/1/reports.fifo/");
    assert_eq!(address.queue_name(), "reports.fifo");
}

#[test]
fn test_dedup_key_from_timestamp_has_microsecond_resolution() {
    let at = Utc.timestamp_opt(1_718_000_000, 123_456_789).unwrap();
    assert_eq!(DedupKey::from_timestamp(at).as_str(), "1718000000.123456");

    let whole_second = Utc.timestamp_opt(1_718_000_000, 0).unwrap();
    assert_eq!(
        DedupKey::from_timestamp(whole_second).as_str(),
        "1718000000.000000"
    );
}

#[test]
fn test_dedup_keys_differ_for_distinct_instants() {
    let first = Utc.timestamp_opt(1_718_000_000, 1_000).unwrap();
    let second = Utc.timestamp_opt(1_718_000_000, 2_000).unwrap();

    assert_ne!(DedupKey::from_timestamp(first), DedupKey::from_timestamp(second));
}

#[test]
fn test_message_id_parsing() {
    let id: MessageId = "5fea7756-0ea4-451a-a703-a558b933e274".parse().unwrap();
    assert_eq!(id.as_str(), "5fea7756-0ea4-451a-a703-a558b933e274");

    assert!("".parse::<MessageId>().is_err());
    assert_ne!(MessageId::new(), MessageId::new());
}
