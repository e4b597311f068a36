//! redb table definitions for the Keeper registration store.
//!
//! Values are JSON-serialized domain types stored as `&[u8]`.

use redb::TableDefinition;

/// Registrations keyed by `{service_id}`.
pub const REGISTRATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("registrations");
