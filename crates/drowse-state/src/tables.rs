//! redb table definitions for the drowse parameter store.
//!
//! A single table of named string parameters. Names follow the
//! slash-prefixed convention of the operator tooling (`/drowse/armed`,
//! `/drowse/last_heartbeat`, ...), but any non-empty string is a valid name.

use redb::TableDefinition;

/// Named string parameters, keyed by full parameter name.
pub const PARAMS: TableDefinition<&str, &str> = TableDefinition::new("params");
