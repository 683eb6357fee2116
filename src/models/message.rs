use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::options::VerificationOptions;
use super::position::{Position, UserId};
use crate::error::VerifyError;

/// A location ping as published to the ingest topic by the mobile backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingMessage {
    pub uuid: String,
    pub user_id: UserId,
    pub position: PingPosition,
    #[serde(default)]
    pub options: VerificationOptions,
}

/// Raw coordinates; some clients send them as strings.
#[derive(Debug, Deserialize)]
pub struct PingPosition {
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub accuracy: Option<f64>,
}

impl PingMessage {
    pub fn correlation_id(&self) -> Uuid {
        Uuid::parse_str(&self.uuid).unwrap_or_default()
    }

    /// Validate the reported coordinates. Missing values are rejected rather
    /// than defaulted to the null island.
    pub fn position(&self) -> Result<Position, VerifyError> {
        match (self.position.lat, self.position.lng) {
            (Some(lat), Some(lng)) => {
                Ok(Position::new(lat, lng)?.with_accuracy(self.position.accuracy))
            }
            (lat, lng) => Err(VerifyError::InvalidCoordinate {
                lat: lat.unwrap_or(f64::NAN),
                lng: lng.unwrap_or(f64::NAN),
            }),
        }
    }
}

fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
    }

    let v: Option<StringOrFloat> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim().parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_string_coordinates() {
        let payload = r#"
        {
            "uuid": "d52b1454-d43d-50fa-99ca-79515c904162",
            "userId": 42,
            "position": {
                "lat": "+20.652494",
                "lng": "-100.391404",
                "accuracy": ""
            },
            "options": {
                "requireMovement": true,
                "minSpeedKmh": 1,
                "maxSpeedKmh": 20
            }
        }
        "#;

        let msg: PingMessage = serde_json::from_str(payload).unwrap();
        assert_eq!(msg.user_id, UserId(42));
        let position = msg.position().unwrap();
        assert_eq!(position.lat(), 20.652494);
        assert_eq!(position.lng(), -100.391404);
        assert_eq!(position.accuracy(), None);
        assert!(msg.options.require_movement);
        assert_eq!(msg.options.max_speed_kmh, Some(20.0));
        assert_eq!(
            msg.correlation_id().to_string(),
            "d52b1454-d43d-50fa-99ca-79515c904162"
        );
    }

    #[test]
    fn test_options_default_when_absent() {
        let payload = r#"{"uuid": "x", "userId": 7, "position": {"lat": 1.5, "lng": 2.5}}"#;
        let msg: PingMessage = serde_json::from_str(payload).unwrap();
        assert_eq!(msg.options, VerificationOptions::default());
        assert!(msg.correlation_id().is_nil());
    }

    #[test]
    fn test_missing_coordinate_rejected() {
        let payload = r#"{"uuid": "x", "userId": 7, "position": {"lat": 1.5}}"#;
        let msg: PingMessage = serde_json::from_str(payload).unwrap();
        assert!(msg.position().is_err());
    }
}
