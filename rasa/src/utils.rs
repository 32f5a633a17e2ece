//! Run identifiers and timestamps.

use chrono::Utc;
use uuid::Uuid;

/// Returns the current UTC time as an ISO 8601 string
/// (`YYYY-MM-DDTHH:MM:SS.ffffff+00:00`).
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Generates a random identifier for one pipeline run.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }

    #[test]
    fn test_run_ids_are_v4_and_distinct() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert_eq!(a.get_version_num(), 4);
        assert_ne!(a, b);
    }
}
