//! Configuration loading and management

use crate::core::error::ViewError;
use crate::core::sort::SortSpec;
use crate::core::status::StatusWorkflow;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// How a resource wraps its collection in the response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeShape {
    /// `{ success, data: { items, pagination: { page, limit, total, pages } } }`
    Paginated,
    /// `{ success, <key>: [...] }`
    Named(String),
    /// Try the known shapes in order
    #[default]
    Auto,
}

/// Where a resource is paginated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Fetch everything once, page in memory
    #[default]
    Client,
    /// Fetch one page per request
    Server,
    /// Fetch everything once, grow a visible prefix
    LoadMore,
}

/// HTTP method used for partial updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateMethod {
    #[default]
    Patch,
    Put,
}

/// Configuration for one collection resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource name (e.g., "invoices"); also the envelope key for `auto`
    pub name: String,

    /// Endpoint path relative to the base URL (e.g., "/api/invoices")
    pub path: String,

    #[serde(default)]
    pub envelope: EnvelopeShape,

    /// Field holding the item id
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Fields searched by the search box (dotted paths allowed)
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Field whose range is forwarded as `dateFrom`/`dateTo`
    #[serde(default)]
    pub date_field: Option<String>,

    #[serde(default)]
    pub pagination: PaginationMode,

    #[serde(default)]
    pub page_size: Option<usize>,

    /// Items added by each "load more"
    #[serde(default = "default_load_more_increment")]
    pub load_more_increment: usize,

    /// Items requested per fetch when paginating client-side
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Initial sort expression (`field:desc`)
    #[serde(default)]
    pub default_sort: Option<String>,

    #[serde(default)]
    pub update_method: UpdateMethod,

    /// Show updates before the backend confirms them
    #[serde(default)]
    pub optimistic_updates: bool,

    /// Status transitions offered to the user
    #[serde(default)]
    pub statuses: StatusWorkflow,

    /// Key a single item is wrapped in by mutation responses; derived from the name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_key: Option<String>,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_load_more_increment() -> usize {
    5
}

fn default_fetch_limit() -> usize {
    1000
}

impl ResourceConfig {
    /// Create a resource with default settings
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            envelope: EnvelopeShape::Auto,
            id_field: default_id_field(),
            search_fields: Vec::new(),
            date_field: None,
            pagination: PaginationMode::Client,
            page_size: None,
            load_more_increment: default_load_more_increment(),
            fetch_limit: default_fetch_limit(),
            default_sort: None,
            update_method: UpdateMethod::Patch,
            optimistic_updates: false,
            statuses: StatusWorkflow::new(),
            item_key: None,
        }
    }

    /// Parsed initial sort
    pub fn default_sort(&self) -> Option<SortSpec> {
        self.default_sort.as_deref().and_then(SortSpec::parse)
    }

    /// Key a mutation response may wrap the item in
    ///
    /// Falls back to the singular of the resource name: `activities` ->
    /// `activity`, `tickets` -> `ticket`.
    pub fn item_key(&self) -> String {
        if let Some(key) = &self.item_key {
            return key.clone();
        }
        let name = self.name.as_str();
        if let Some(stem) = name.strip_suffix("ies") {
            return format!("{stem}y");
        }
        name.strip_suffix('s').unwrap_or(name).to_string()
    }

    /// Check the resource for values the engine cannot work with
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.name.trim().is_empty() {
            return Err(ViewError::Config {
                message: "resource name must not be empty".to_string(),
            });
        }
        if !self.path.starts_with('/') {
            return Err(ViewError::Config {
                message: format!("resource '{}': path must start with '/'", self.name),
            });
        }
        if self.page_size == Some(0) {
            return Err(ViewError::Config {
                message: format!("resource '{}': page_size must be positive", self.name),
            });
        }
        if self.default_sort.is_some() && self.default_sort().is_none() {
            return Err(ViewError::Config {
                message: format!("resource '{}': default_sort is empty", self.name),
            });
        }
        Ok(())
    }
}

/// Complete configuration for a dashboard client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Page size for resources that don't set one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Broadcast capacity of the event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> usize {
    10
}

fn default_event_capacity() -> usize {
    256
}

impl ClientConfig {
    /// Create a configuration with no resources
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: default_timeout_ms(),
            default_page_size: default_page_size(),
            event_capacity: default_event_capacity(),
            resources: Vec::new(),
        }
    }

    /// Add a resource
    pub fn with_resource(mut self, resource: ResourceConfig) -> Self {
        self.resources.push(resource);
        self
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every resource and reject duplicate names
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(anyhow!("default_page_size must be positive"));
        }
        for (i, resource) in self.resources.iter().enumerate() {
            resource.validate()?;
            if self.resources[..i].iter().any(|r| r.name == resource.name) {
                return Err(anyhow!("duplicate resource '{}'", resource.name));
            }
        }
        Ok(())
    }

    /// Find a resource by name
    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Page size for a resource, falling back to the default
    pub fn page_size_for(&self, resource: &ResourceConfig) -> usize {
        resource.page_size.unwrap_or(self.default_page_size)
    }

    /// Merge several configurations
    ///
    /// The first configuration provides the base URL and global settings.
    /// Resources are concatenated; a later resource with the same name
    /// replaces the earlier one.
    pub fn merge(configs: Vec<ClientConfig>) -> Option<ClientConfig> {
        let mut iter = configs.into_iter();
        let mut merged = iter.next()?;

        for config in iter {
            for resource in config.resources {
                match merged.resources.iter_mut().find(|r| r.name == resource.name) {
                    Some(existing) => *existing = resource,
                    None => merged.resources.push(resource),
                }
            }
        }

        Some(merged)
    }

    /// A configuration covering the dashboard's list pages, for tests and demos
    pub fn default_config() -> Self {
        let mut materials = ResourceConfig::new("materials", "/api/materials/low-stock");
        materials.envelope = EnvelopeShape::Named("materials".to_string());
        materials.id_field = "_id".to_string();
        materials.search_fields = vec![
            "name".to_string(),
            "sku".to_string(),
            "supplier.name".to_string(),
        ];

        let mut invoices = ResourceConfig::new("recurring-invoices", "/api/recurring-invoices");
        invoices.envelope = EnvelopeShape::Paginated;
        invoices.search_fields = vec!["invoiceNumber".to_string(), "customer.name".to_string()];
        invoices.date_field = Some("nextRunDate".to_string());
        invoices.optimistic_updates = true;
        invoices.statuses = StatusWorkflow::recurring_invoice();

        let mut activities = ResourceConfig::new("activities", "/api/community/activities");
        activities.pagination = PaginationMode::LoadMore;
        activities.search_fields = vec!["title".to_string(), "author.name".to_string()];
        activities.default_sort = Some("likes+comments:desc".to_string());

        let mut documents = ResourceConfig::new("documents", "/api/legal/documents");
        documents.pagination = PaginationMode::Server;
        documents.search_fields = vec!["title".to_string()];
        documents.update_method = UpdateMethod::Put;

        let mut tickets = ResourceConfig::new("tickets", "/api/support/tickets");
        tickets.search_fields = vec!["subject".to_string()];
        tickets.statuses = StatusWorkflow::support_ticket();

        Self::new("http://localhost:3000")
            .with_resource(materials)
            .with_resource(invoices)
            .with_resource(activities)
            .with_resource(documents)
            .with_resource(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default_config();
        assert_eq!(config.resources.len(), 5);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.resource("activities").unwrap().pagination,
            PaginationMode::LoadMore
        );
    }

    #[test]
    fn test_yaml_serialization() {
        let config = ClientConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = ClientConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = ClientConfig::from_yaml_str(
            r#"
base_url: http://api.local
resources:
  - name: campaigns
    path: /api/ads/campaigns
"#,
        )
        .unwrap();

        assert_eq!(config.timeout_ms, 10_000);
        let campaigns = config.resource("campaigns").unwrap();
        assert_eq!(campaigns.id_field, "id");
        assert_eq!(campaigns.envelope, EnvelopeShape::Auto);
        assert_eq!(campaigns.update_method, UpdateMethod::Patch);
        assert_eq!(config.page_size_for(campaigns), 10);
    }

    #[test]
    fn test_invalid_path_rejected() {
        let err = ClientConfig::from_yaml_str(
            r#"
base_url: http://api.local
resources:
  - name: campaigns
    path: api/ads
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("path must start with '/'"));
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let config = ClientConfig::new("http://x")
            .with_resource(ResourceConfig::new("a", "/a"))
            .with_resource(ResourceConfig::new("a", "/b"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_item_key_singularizes_name() {
        assert_eq!(ResourceConfig::new("activities", "/api/community/activities").item_key(), "activity");
        assert_eq!(ResourceConfig::new("tickets", "/api/tickets").item_key(), "ticket");
        assert_eq!(ResourceConfig::new("inventory", "/api/inventory").item_key(), "inventory");

        let mut people = ResourceConfig::new("people", "/api/people");
        assert_eq!(people.item_key(), "people");
        people.item_key = Some("person".to_string());
        assert_eq!(people.item_key(), "person");
    }

    #[test]
    fn test_default_sort_parsing() {
        let config = ClientConfig::default_config();
        let sort = config.resource("activities").unwrap().default_sort().unwrap();
        assert_eq!(sort.to_string(), "likes+comments:desc");
    }
}
