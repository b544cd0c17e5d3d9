//! Bookmark identifiers
//!
//! Ids are opaque strings built from the current time in milliseconds plus a
//! random suffix, so ids minted in the same millisecond still differ. Import
//! batches additionally carry the entry's position in the batch.

use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix appended to generated ids
const SUFFIX_LEN: usize = 8;

/// Prefix for ids assigned during an import
pub const IMPORT_PREFIX: &str = "imported";

fn random_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Generate an id for a bookmark created by the user
pub fn generate_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), random_suffix())
}

/// Generate an id for the `index`-th entry of an import batch
pub fn generate_import_id(index: usize) -> String {
    format!(
        "{}-{}-{}-{}",
        IMPORT_PREFIX,
        Utc::now().timestamp_millis(),
        index,
        random_suffix()
    )
}
