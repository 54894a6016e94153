/* src/history/record.rs */

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Captions longer than this are cut when a fit is created.
pub const MAX_MESSAGE_CHARS: usize = 60;

/// One saved session: the rendered composite and the score it got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFit {
    /// Creation time in epoch milliseconds.
    pub id: String,
    #[serde(with = "base64_bytes")]
    pub image: Vec<u8>,
    pub score: u8,
    pub message: String,
    /// RFC 3339 in UTC. Fits saved by old clients may carry a locale string instead.
    pub date: String,
}

impl SavedFit {
    pub fn new(image: Vec<u8>, score: u8, message: impl Into<String>) -> Self {
        Self::created_at(Utc::now(), image, score, message)
    }

    pub fn created_at(
        at: DateTime<Utc>,
        image: Vec<u8>,
        score: u8,
        message: impl Into<String>,
    ) -> Self {
        let message: String = message.into();
        Self {
            id: at.timestamp_millis().to_string(),
            image,
            score,
            message: message.chars().take(MAX_MESSAGE_CHARS).collect(),
            date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Locale-formatted dates (`1/2/2024, 10:00:00 AM`) can't be trusted.
    pub fn has_legacy_date(&self) -> bool {
        self.date.contains('/')
    }

    /// When this fit was created, reading `id` if `date` is unusable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        if !self.has_legacy_date() {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.date) {
                return Some(parsed.with_timezone(&Utc));
            }
        }
        self.id
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

mod base64_bytes {
    use super::{Engine, STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}
