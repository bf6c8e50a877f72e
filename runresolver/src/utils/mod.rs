//! Utility functions for ids and timestamp handling.
//!
//! The metadata store records times as milliseconds since the Unix epoch;
//! these helpers convert between that wire form and `chrono` timestamps.

pub mod timestamps;

pub use timestamps::{
    from_epoch_millis, iso_timestamp, now_utc, to_epoch_millis, Timestamp, TimestampError,
};

/// Generates a random v4 UUID.
#[must_use]
pub fn generate_uuid() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uuid_is_valid() {
        let id = generate_uuid();
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.contains(':'));
    }
}
