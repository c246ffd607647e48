//! Integration tests for configuration loading and merging

use collection_view::prelude::*;
use std::io::Write;

const DASHBOARD_YAML: &str = r#"
base_url: "http://localhost:3000"
timeout_ms: 5000
resources:
  - name: materials
    path: /api/materials/low-stock
    envelope: !named materials
    id_field: _id
    search_fields: [name, sku, supplier.name]
  - name: recurring-invoices
    path: /api/recurring-invoices
    envelope: paginated
    date_field: nextRunDate
    optimistic_updates: true
    default_sort: "amount:desc"
    statuses:
      active: [paused, completed]
      paused: [active]
  - name: documents
    path: /api/legal/documents
    pagination: server
    page_size: 25
    update_method: PUT
"#;

#[test]
fn test_load_from_yaml_str() {
    let config = ClientConfig::from_yaml_str(DASHBOARD_YAML).unwrap();

    assert_eq!(config.base_url, "http://localhost:3000");
    assert_eq!(config.timeout_ms, 5000);
    assert_eq!(config.default_page_size, 10);
    assert_eq!(config.resources.len(), 3);

    let materials = config.resource("materials").unwrap();
    assert_eq!(materials.envelope, EnvelopeShape::Named("materials".to_string()));
    assert_eq!(materials.id_field, "_id");
    assert_eq!(materials.search_fields.len(), 3);
    assert_eq!(materials.pagination, PaginationMode::Client);
    assert_eq!(materials.fetch_limit, 1000);

    let invoices = config.resource("recurring-invoices").unwrap();
    assert_eq!(invoices.envelope, EnvelopeShape::Paginated);
    assert_eq!(invoices.default_sort(), Some(SortSpec::desc("amount")));
    assert!(invoices.statuses.can_transition("active", "paused"));
    assert!(!invoices.statuses.can_transition("paused", "completed"));

    let documents = config.resource("documents").unwrap();
    assert_eq!(documents.pagination, PaginationMode::Server);
    assert_eq!(documents.update_method, UpdateMethod::Put);
    assert_eq!(config.page_size_for(documents), 25);
    assert_eq!(config.page_size_for(materials), 10);
}

#[test]
fn test_load_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DASHBOARD_YAML.as_bytes()).unwrap();

    let config = ClientConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.resources.len(), 3);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    assert!(ClientConfig::from_yaml_file(path.to_str().unwrap()).is_err());
}

#[test]
fn test_invalid_resources_are_rejected() {
    let duplicate = r#"
base_url: "http://localhost:3000"
resources:
  - name: tickets
    path: /api/tickets
  - name: tickets
    path: /api/support/tickets
"#;
    let err = ClientConfig::from_yaml_str(duplicate).unwrap_err();
    assert!(err.to_string().contains("duplicate resource 'tickets'"));

    let relative_path = r#"
base_url: "http://localhost:3000"
resources:
  - name: tickets
    path: api/tickets
"#;
    assert!(ClientConfig::from_yaml_str(relative_path).is_err());

    let zero_page = r#"
base_url: "http://localhost:3000"
resources:
  - name: tickets
    path: /api/tickets
    page_size: 0
"#;
    assert!(ClientConfig::from_yaml_str(zero_page).is_err());
}

#[test]
fn test_merge_empty_configs() {
    assert!(ClientConfig::merge(vec![]).is_none());
}

#[test]
fn test_merge_replaces_resources_by_name() {
    let base = ClientConfig::default_config();
    let base_count = base.resources.len();

    let mut tickets = ResourceConfig::new("tickets", "/api/v2/tickets");
    tickets.page_size = Some(50);
    let extra = ClientConfig::new("http://ignored")
        .with_resource(tickets)
        .with_resource(ResourceConfig::new("tasks", "/api/tasks"));

    let merged = ClientConfig::merge(vec![base.clone(), extra]).unwrap();

    assert_eq!(merged.base_url, base.base_url);
    assert_eq!(merged.resources.len(), base_count + 1);
    assert_eq!(merged.resource("tickets").unwrap().path, "/api/v2/tickets");
    assert_eq!(merged.resource("tickets").unwrap().page_size, Some(50));
    assert!(merged.resource("tasks").is_some());
    assert!(merged.validate().is_ok());
}

#[test]
fn test_default_config_is_valid() {
    let config = ClientConfig::default_config();
    assert!(config.validate().is_ok());

    let activities = config.resource("activities").unwrap();
    assert_eq!(activities.pagination, PaginationMode::LoadMore);
    assert_eq!(
        activities.default_sort(),
        Some(SortSpec::sum(["likes", "comments"], SortDirection::Desc))
    );

    let invoices = config.resource("recurring-invoices").unwrap();
    assert!(invoices.optimistic_updates);
    assert_eq!(invoices.statuses, StatusWorkflow::recurring_invoice());
}

#[test]
fn test_config_round_trips_through_yaml() {
    let config = ClientConfig::default_config();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let back = ClientConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(back, config);
}
