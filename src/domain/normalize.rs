use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::ValidationError;
use super::message::RawMessage;
use super::record::LogRecord;

/// JSON document written by producers as the message value
#[derive(Debug, Deserialize)]
struct ProducerEnvelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    level: Option<String>,
    message: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl ProducerEnvelope {
    /// Only values that look like a JSON object with a `message` field qualify
    fn decode(value: &[u8]) -> Option<Self> {
        let first = value.iter().find(|b| !b.is_ascii_whitespace())?;
        if *first != b'{' {
            return None;
        }
        serde_json::from_slice(value).ok()
    }

    fn into_record(self, key: String) -> LogRecord {
        let id = if key.is_empty() {
            self.id.unwrap_or_default()
        } else {
            key
        };
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        LogRecord {
            id,
            timestamp,
            level: self.level.unwrap_or_default(),
            message: self.message,
            source: self.source,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Turn a raw message into a validated record
///
/// The key becomes the record ID. A value holding a producer envelope
/// contributes level, timestamp, source and message text; any other value is
/// taken verbatim as the message text and stamped with the current time.
pub fn normalize(message: &RawMessage) -> Result<LogRecord, ValidationError> {
    let key = message.key_str().into_owned();

    let record = match ProducerEnvelope::decode(&message.value) {
        Some(envelope) => envelope.into_record(key),
        None => LogRecord::new(key, message.value_str().into_owned()),
    };

    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Offset;
    use chrono::TimeZone;

    fn raw(key: &str, value: &str) -> RawMessage {
        RawMessage::new(key, value, Offset::new(0, 0))
    }

    #[test]
    fn plain_text_value_becomes_message() {
        let before = Utc::now();
        let record = normalize(&raw("1", "msg1")).unwrap();

        assert_eq!(record.id, "1");
        assert_eq!(record.message, "msg1");
        assert!(record.level.is_empty());
        assert!(record.timestamp >= before);
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(normalize(&raw("", "msg")), Err(ValidationError::EmptyId));
    }

    #[test]
    fn empty_value_rejected() {
        assert_eq!(
            normalize(&raw("1", "")),
            Err(ValidationError::EmptyMessage)
        );
    }

    #[test]
    fn producer_envelope_decoded() {
        let value = r#"{"id":"20240501-1","level":"INFO","message":"Test message number 1","timestamp":"2024-05-01T12:00:00Z"}"#;
        let record = normalize(&raw("20240501-1", value)).unwrap();

        assert_eq!(record.id, "20240501-1");
        assert_eq!(record.level, "INFO");
        assert_eq!(record.message, "Test message number 1");
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn key_wins_over_envelope_id() {
        let value = r#"{"id":"from-body","message":"m"}"#;
        let record = normalize(&raw("from-key", value)).unwrap();
        assert_eq!(record.id, "from-key");
    }

    #[test]
    fn envelope_id_used_when_key_empty() {
        let value = r#"{"id":"from-body","message":"m","source":"api"}"#;
        let record = normalize(&raw("", value)).unwrap();
        assert_eq!(record.id, "from-body");
        assert_eq!(record.source.as_deref(), Some("api"));
    }

    #[test]
    fn envelope_with_bad_timestamp_uses_now() {
        let before = Utc::now();
        let value = r#"{"message":"m","timestamp":"yesterday"}"#;
        let record = normalize(&raw("1", value)).unwrap();
        assert!(record.timestamp >= before);
    }

    #[test]
    fn envelope_with_empty_message_rejected() {
        let value = r#"{"id":"1","message":""}"#;
        assert_eq!(
            normalize(&raw("1", value)),
            Err(ValidationError::EmptyMessage)
        );
    }

    #[test]
    fn json_without_message_field_is_plain_text() {
        let value = r#"{"level":"WARN"}"#;
        let record = normalize(&raw("1", value)).unwrap();
        assert_eq!(record.message, value);
        assert!(record.level.is_empty());
    }

    #[test]
    fn malformed_json_is_plain_text() {
        let value = "{not json";
        let record = normalize(&raw("1", value)).unwrap();
        assert_eq!(record.message, value);
    }
}
