//! Tests for XML extraction helpers.

use super::*;

const LIST_QUEUES_RESPONSE: &str = r#"<?xml version="1.0"?>
<ListQueuesResponse xmlns="http://queue.amazonaws.com/doc/2012-11-05/">
  <ListQueuesResult>
    <QueueUrl>https://sqs.us-east-2.amazonaws.com/123456789012/FL_acc.fifo</QueueUrl>
    <QueueUrl>https://sqs.us-east-2.amazonaws.com/123456789012/FL_acc_dlq.fifo</QueueUrl>
  </ListQueuesResult>
  <ResponseMetadata>
    <RequestId>725275ae-0b9b-4762-b238-436d7c65a1ac</RequestId>
  </ResponseMetadata>
</ListQueuesResponse>"#;

#[test]
fn test_element_texts_collects_all_matches_in_order() {
    let urls = element_texts(LIST_QUEUES_RESPONSE, b"QueueUrl").unwrap();

    assert_eq!(
        urls,
        vec![
            "https://sqs.us-east-2.amazonaws.com/123456789012/FL_acc.fifo".to_string(),
            "https://sqs.us-east-2.amazonaws.com/123456789012/FL_acc_dlq.fifo".to_string(),
        ]
    );
}

#[test]
fn test_element_texts_returns_empty_for_missing_element() {
    assert!(element_texts(LIST_QUEUES_RESPONSE, b"NextToken")
        .unwrap()
        .is_empty());
}

#[test]
fn test_element_texts_unescapes_entities() {
    let xml = "<Error><Message>Value &lt;bad&gt; &amp; more</Message></Error>";
    assert_eq!(
        first_element_text(xml, b"Message").as_deref(),
        Some("Value <bad> & more")
    );
}

#[test]
fn test_malformed_document_is_serialization_error() {
    let result = element_texts("<Error><Code>Oops</Wrong></Error>", b"Code");
    assert!(matches!(result, Err(ProviderError::SerializationError(_))));
}
