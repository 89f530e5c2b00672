//! Tests for the in-memory queue service and object store.

use super::*;

mod queue_service {
    use super::*;

    #[tokio::test]
    async fn test_created_queue_resolves_by_name() {
        let service = InMemoryQueueService::new();
        let created = service.create_queue("FL_acc.fifo");

        let resolved = service.resolve_queue_url("FL_acc.fifo").await.unwrap();

        assert_eq!(resolved, created);
        assert_eq!(resolved.queue_name(), "FL_acc.fifo");
    }

    #[tokio::test]
    async fn test_unknown_name_is_queue_not_found() {
        let service = InMemoryQueueService::new();

        let result = service.resolve_queue_url("missing").await;

        assert_eq!(result, Err(ProviderError::QueueNotFound("missing".to_string())));
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let service = InMemoryQueueService::new()
            .with_queue("FL_acc.fifo")
            .with_queue("FL_dev.fifo")
            .with_queue("TX_acc.fifo");

        let all = service.list_queue_urls(None).await.unwrap();
        let florida = service.list_queue_urls(Some("FL_")).await.unwrap();

        assert_eq!(all.len(), 3);
        let names: Vec<&str> = florida.iter().map(|q| q.queue_name()).collect();
        assert_eq!(names, vec!["FL_acc.fifo", "FL_dev.fifo"]);
    }

    #[tokio::test]
    async fn test_outage_fails_every_operation() {
        let service = InMemoryQueueService::new();
        let queue = service.create_queue("FL_acc");
        let outage = ProviderError::NetworkError("connection reset".to_string());
        service.set_outage(Some(outage.clone()));

        assert_eq!(service.resolve_queue_url("FL_acc").await, Err(outage.clone()));
        assert_eq!(service.list_queue_urls(None).await, Err(outage.clone()));
        assert_eq!(service.send_message(&queue, "{}", None).await, Err(outage));

        service.set_outage(None);
        assert!(service.send_message(&queue, "{}", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_fifo_queue_requires_ordering_keys() {
        let service = InMemoryQueueService::new();
        let queue = service.create_queue("FL_acc.fifo");

        let result = service.send_message(&queue, "{}", None).await;

        assert!(matches!(result, Err(ProviderError::ServiceError(_))));
        assert!(service.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_dedup_key_is_delivered_once() {
        let service = InMemoryQueueService::new();
        let queue = service.create_queue("FL_acc.fifo");
        let keys = OrderingKeys::new("report_requests", DedupKey::new("1705320000.123456"));

        let first = service.send_message(&queue, "one", Some(&keys)).await.unwrap();
        let second = service.send_message(&queue, "two", Some(&keys)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.send_calls(), 2);
        let delivered = service.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].body, "one");
    }

    #[tokio::test]
    async fn test_dedup_key_collapses_across_groups() {
        let service = InMemoryQueueService::new();
        let queue = service.create_queue("FL_acc.fifo");
        let dedup = DedupKey::new("1705320000.123456");

        let first = service
            .send_message(&queue, "one", Some(&OrderingKeys::new("report_requests", dedup.clone())))
            .await
            .unwrap();
        let second = service
            .send_message(&queue, "two", Some(&OrderingKeys::new("other_group", dedup)))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(service.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_same_dedup_key_on_other_queue_is_delivered() {
        let service = InMemoryQueueService::new();
        let acc = service.create_queue("FL_acc.fifo");
        let dev = service.create_queue("FL_dev.fifo");
        let keys = OrderingKeys::new("report_requests", DedupKey::new("1705320000.123456"));

        service.send_message(&acc, "{}", Some(&keys)).await.unwrap();
        service.send_message(&dev, "{}", Some(&keys)).await.unwrap();

        assert_eq!(service.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_distinct_dedup_keys_are_both_delivered() {
        let service = InMemoryQueueService::new();
        let queue = service.create_queue("FL_acc.fifo");

        for key in ["1705320000.123456", "1705320000.123457"] {
            let keys = OrderingKeys::new("report_requests", DedupKey::new(key));
            service.send_message(&queue, "{}", Some(&keys)).await.unwrap();
        }

        assert_eq!(service.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_send_to_unknown_address_fails() {
        let service = InMemoryQueueService::new();
        let queue = QueueAddress::new("https://sqs.memory.local/000000000000/nowhere");

        let result = service.send_message(&queue, "{}", None).await;

        assert!(matches!(result, Err(ProviderError::QueueNotFound(_))));
    }
}

mod object_store {
    use super::*;

    #[tokio::test]
    async fn test_stored_object_is_returned() {
        let store = InMemoryObjectStore::new();
        store.put_object("bp-temp-us", "FL_acc_50", b"PK\x03\x04".to_vec());

        let body = store.get_object("bp-temp-us", "FL_acc_50").await.unwrap();

        assert_eq!(body.as_ref(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();

        let error = store.get_object("bp-temp-us", "FL_acc_50").await.unwrap_err();

        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_delayed_object_appears_after_misses() {
        let store = InMemoryObjectStore::new();
        store.put_object_after("bp-temp-us", "FL_acc_50", 2, "late");

        assert!(store.get_object("bp-temp-us", "FL_acc_50").await.is_err());
        assert!(store.get_object("bp-temp-us", "FL_acc_50").await.is_err());
        let body = store.get_object("bp-temp-us", "FL_acc_50").await.unwrap();

        assert_eq!(body.as_ref(), b"late");
        assert_eq!(store.get_calls(), 3);
    }

    #[tokio::test]
    async fn test_injected_failure_wins_over_content() {
        let store = InMemoryObjectStore::new();
        store.put_object("bp-temp-us", "FL_acc_50", "data");
        store.fail_object(
            "bp-temp-us",
            "FL_acc_50",
            ProviderError::AccessDenied("bp-temp-us/FL_acc_50".to_string()),
        );

        let result = store.get_object("bp-temp-us", "FL_acc_50").await;

        assert!(matches!(result, Err(ProviderError::AccessDenied(_))));
    }
}
