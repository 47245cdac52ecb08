use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::RefminerConfig;

/// JSON schema for `refminer.toml`.
///
/// Intended for editor tooling and CI validation of configuration files.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(RefminerConfig)
}
