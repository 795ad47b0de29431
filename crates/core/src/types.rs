/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of an external tool, e.g. `"jira"` or `"linear"`.
pub type IntegrationId = String;
