//! PM33 field-mapping domain model.
//!
//! Pure data types and rules shared by the session manager and its
//! consumers:
//!
//! - [`field_mapping`]: per-field status machine and data types.
//! - [`session`]: a per-integration mapping session and its invariants.
//! - [`discovery`]: initial status classification for scanned fields.
//! - [`schema`]: the canonical PM33 target schema and name matching.
//! - [`export`]: the JSON export envelope consumed downstream.
//! - [`seed`]: sample sessions shown by the dashboard demo.

pub mod discovery;
pub mod error;
pub mod export;
pub mod field_mapping;
pub mod schema;
pub mod seed;
pub mod session;
pub mod types;

pub use error::CoreError;
pub use field_mapping::{FieldDataType, FieldMapping, MappingStatus};
pub use session::{IntegrationMappingSession, MappingSummary};
