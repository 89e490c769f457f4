//! Small text conversions offered under `util`.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid timestamp '{input}': {source}")]
    Timestamp {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("{0} seconds is outside the representable time range")]
    EpochOutOfRange(i64),
}

/// Base64 of the UTF-8 bytes of `text`.
pub fn base64_encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn base64_decode(encoded: &str) -> Result<String, ConvertError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Seconds since the Unix epoch for an RFC 3339 timestamp.
pub fn to_epoch(timestamp: &str) -> Result<i64, ConvertError> {
    let parsed = DateTime::parse_from_rfc3339(timestamp.trim()).map_err(|source| {
        ConvertError::Timestamp {
            input: timestamp.to_string(),
            source,
        }
    })?;
    Ok(parsed.timestamp())
}

/// RFC 3339 (UTC) for seconds since the Unix epoch.
pub fn from_epoch(seconds: i64) -> Result<String, ConvertError> {
    let time: DateTime<Utc> =
        DateTime::from_timestamp(seconds, 0).ok_or(ConvertError::EpochOutOfRange(seconds))?;
    Ok(time.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64() {
        assert_eq!(base64_encode("admin:Pa55"), "YWRtaW46UGE1NQ==");
        assert_eq!(base64_decode("YWRtaW46UGE1NQ==\n").unwrap(), "admin:Pa55");
        assert!(matches!(base64_decode("***"), Err(ConvertError::Base64(_))));
        assert!(matches!(base64_decode("/w=="), Err(ConvertError::Utf8(_))));
    }

    #[test]
    fn test_epoch_conversions() {
        assert_eq!(to_epoch("1970-01-01T00:00:00Z").unwrap(), 0);
        assert_eq!(to_epoch("2024-02-29T12:00:00+02:00").unwrap(), 1_709_200_800);
        assert_eq!(from_epoch(1_709_200_800).unwrap(), "2024-02-29T10:00:00Z");
        assert!(to_epoch("yesterday").is_err());
        assert!(matches!(from_epoch(i64::MAX), Err(ConvertError::EpochOutOfRange(_))));
    }
}
