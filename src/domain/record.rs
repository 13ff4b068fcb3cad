use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Normalized log entry ready for storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LogRecord {
    /// Create a record stamped with the current UTC time and no level
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            level: String::new(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A record without an ID or message never reaches a sink
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_record_defaults() {
        let before = Utc::now();
        let record = LogRecord::new("1", "boot");

        assert_eq!(record.id, "1");
        assert_eq!(record.message, "boot");
        assert!(record.level.is_empty());
        assert!(record.source.is_none());
        assert!(record.timestamp >= before);
    }

    #[test]
    fn validate_rejects_empty_id_first() {
        assert_eq!(
            LogRecord::new("", "").validate(),
            Err(ValidationError::EmptyId)
        );
        assert_eq!(
            LogRecord::new("1", "").validate(),
            Err(ValidationError::EmptyMessage)
        );
        assert_eq!(LogRecord::new("1", "ok").validate(), Ok(()));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = LogRecord::new("a-1", "disk full")
            .with_level("ERROR")
            .with_timestamp(ts)
            .with_source("node-3");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "a-1");
        assert_eq!(json["level"], "ERROR");
        assert_eq!(json["message"], "disk full");
        assert_eq!(json["source"], "node-3");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn source_is_omitted_when_absent() {
        let json = serde_json::to_value(LogRecord::new("a", "b")).unwrap();
        assert!(json.get("source").is_none());
    }
}
