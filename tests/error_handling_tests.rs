//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Each failure maps to the right error code
//! - Retry advice follows the error kind and status
//! - Error messages carry the backend's explanation
//! - Client-side validation stops a request before it is sent

use collection_view::prelude::*;
use std::sync::Arc;

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_network_error_code() {
        assert_eq!(ViewError::network("connection reset").error_code(), "NETWORK_ERROR");
    }

    #[test]
    fn test_server_error_code() {
        assert_eq!(ViewError::server(Some(404), "missing").error_code(), "SERVER_ERROR");
    }

    #[test]
    fn test_validation_error_code() {
        assert_eq!(
            ViewError::validation("name", "required").error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_cancelled_and_config_codes() {
        assert_eq!(ViewError::Cancelled.error_code(), "CANCELLED");
        let config = ViewError::Config {
            message: "bad".to_string(),
        };
        assert_eq!(config.error_code(), "CONFIG_ERROR");
    }
}

// =============================================================================
// Retry Advice Tests
// =============================================================================

mod retry_tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        assert!(ViewError::network("timeout").is_retryable());
    }

    #[test]
    fn test_5xx_is_retryable_4xx_is_not() {
        assert!(ViewError::server(Some(503), "busy").is_retryable());
        assert!(!ViewError::server(Some(400), "bad request").is_retryable());
        assert!(!ViewError::server(Some(404), "not found").is_retryable());
    }

    #[test]
    fn test_validation_and_cancelled_are_not_retryable() {
        assert!(!ViewError::validation("id", "empty").is_retryable());
        assert!(!ViewError::Cancelled.is_retryable());
        assert!(ViewError::Cancelled.is_cancelled());
    }
}

// =============================================================================
// Message Tests
// =============================================================================

mod message_tests {
    use super::*;

    #[test]
    fn test_server_message_with_status() {
        let err = ViewError::server(Some(422), "Invalid status transition");
        assert_eq!(err.to_string(), "Server error (422): Invalid status transition");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_server_message_without_status() {
        let err = ViewError::server(None, "Not allowed");
        assert_eq!(err.to_string(), "Server error: Not allowed");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_malformed_json_is_a_server_error() {
        let err: ViewError = serde_json::from_str::<Value>("{not json").unwrap_err().into();
        assert_eq!(err.error_code(), "SERVER_ERROR");
    }
}

// =============================================================================
// Error Propagation Through a View
// =============================================================================

mod propagation_tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn tickets() -> (Arc<InMemoryCollectionService>, CollectionView) {
        let resource = ResourceConfig::new("tickets", "/api/tickets");
        let service = Arc::new(
            InMemoryCollectionService::new(resource.clone())
                .with_json(vec![json!({"id": "t-1", "status": "open"})])
                .unwrap(),
        );
        let view = CollectionView::new(service.clone(), resource, 10);
        (service, view)
    }

    #[tokio::test]
    async fn test_unknown_id_surfaces_404() {
        let (_, view) = tickets();
        view.refresh().await.unwrap();

        let err = view
            .perform(Mutation::Update {
                id: "t-9".to_string(),
                patch: json!({"priority": "high"}),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_blank_action_is_validation_error() {
        let (service, view) = tickets();
        let err = view
            .perform(Mutation::Action {
                id: "t-1".to_string(),
                action: "".to_string(),
                body: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, ViewError::validation("action", "action name must not be empty"));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_is_remembered_until_next_success() {
        let (service, view) = tickets();
        service.fail_next(ViewError::server(Some(503), "maintenance"));

        assert!(view.refresh().await.is_err());
        assert!(!view.is_loaded());
        assert_eq!(view.last_error().unwrap().status(), Some(503));

        view.refresh().await.unwrap();
        assert!(view.last_error().is_none());
        assert!(view.is_loaded());
    }

    /// Accepts mutations but fails every fetch once switched off
    struct ReadOnlyOutage {
        inner: InMemoryCollectionService,
        reads_down: AtomicBool,
    }

    #[async_trait]
    impl CollectionService for ReadOnlyOutage {
        fn resource(&self) -> &str {
            self.inner.resource()
        }

        async fn fetch(&self, params: &QueryParams) -> Result<FetchedPage, ViewError> {
            if self.reads_down.load(Ordering::SeqCst) {
                return Err(ViewError::server(Some(502), "read replica offline"));
            }
            self.inner.fetch(params).await
        }

        async fn create(&self, body: Value) -> Result<MutationOutcome, ViewError> {
            self.inner.create(body).await
        }

        async fn update(&self, id: &str, patch: Value) -> Result<MutationOutcome, ViewError> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> Result<MutationOutcome, ViewError> {
            self.inner.delete(id).await
        }

        async fn action(
            &self,
            id: &str,
            action: &str,
            body: Option<Value>,
        ) -> Result<MutationOutcome, ViewError> {
            self.inner.action(id, action, body).await
        }
    }

    #[tokio::test]
    async fn test_failed_refetch_after_mutation_keeps_mutation_result() {
        let resource = ResourceConfig::new("tickets", "/api/tickets");
        let service = Arc::new(ReadOnlyOutage {
            inner: InMemoryCollectionService::new(resource.clone())
                .with_json(vec![json!({"id": "t-1", "status": "open"})])
                .unwrap(),
            reads_down: AtomicBool::new(false),
        });
        let view = CollectionView::new(service.clone(), resource, 10);
        view.refresh().await.unwrap();

        service.reads_down.store(true, Ordering::SeqCst);
        let outcome = view
            .perform(Mutation::TransitionStatus {
                id: "t-1".to_string(),
                status: "in-progress".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.item().unwrap().fields["status"], "in-progress");
        assert_eq!(view.last_error().unwrap().status(), Some(502));
        assert_eq!(view.snapshot()[0].fields["status"], "open");
    }

    #[tokio::test]
    async fn test_unknown_resource_in_context() {
        let ctx = AppContext::new(ClientConfig::default_config()).unwrap();
        let err = ctx.view("payroll").err().unwrap();
        assert!(matches!(err, ViewError::Config { .. }));
        assert!(err.to_string().contains("payroll"));
    }
}
