//! Event schema shared by producers, the aggregator, and the persister.

use std::collections::HashMap;

use crate::error::HandlerError;

/// A parsed driver-position event, strictly decoded from a stream entry's
/// flat key->string fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverPositionEvent {
    pub driver_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
}

/// A parsed order event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub order_id: String,
    pub customer_id: String,
    pub order_value: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
}

fn required_field<'a>(
    fields: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, HandlerError> {
    fields
        .get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| HandlerError::Malformed(format!("missing field `{key}`")))
}

fn parse_f64(fields: &HashMap<String, String>, key: &str) -> Result<f64, HandlerError> {
    let raw = required_field(fields, key)?;
    raw.parse::<f64>()
        .map_err(|e| HandlerError::Malformed(format!("field `{key}` = {raw:?} is not a number: {e}")))
}

impl DriverPositionEvent {
    /// Parses a stream entry's flat field map. Required keys per spec §6:
    /// `driver_id`, `latitude`, `longitude`, `timestamp`.
    pub fn parse(fields: &HashMap<String, String>) -> Result<Self, HandlerError> {
        Ok(Self {
            driver_id: required_field(fields, "driver_id")?.to_string(),
            latitude: parse_f64(fields, "latitude")?,
            longitude: parse_f64(fields, "longitude")?,
            timestamp: required_field(fields, "timestamp")?.to_string(),
        })
    }

    pub fn to_stream_fields(&self) -> Vec<(String, String)> {
        vec![
            ("driver_id".to_string(), self.driver_id.clone()),
            ("latitude".to_string(), format!("{:.6}", self.latitude)),
            ("longitude".to_string(), format!("{:.6}", self.longitude)),
            ("timestamp".to_string(), self.timestamp.clone()),
        ]
    }
}

impl OrderEvent {
    /// Parses a stream entry's flat field map. Required keys per spec §6:
    /// `order_id`, `customer_id`, `order_value`, `latitude`, `longitude`,
    /// `timestamp`.
    pub fn parse(fields: &HashMap<String, String>) -> Result<Self, HandlerError> {
        let order_value = parse_f64(fields, "order_value")?;
        if order_value < 0.0 {
            return Err(HandlerError::Malformed(format!(
                "order_value {order_value} is negative"
            )));
        }
        Ok(Self {
            order_id: required_field(fields, "order_id")?.to_string(),
            customer_id: required_field(fields, "customer_id")?.to_string(),
            order_value,
            latitude: parse_f64(fields, "latitude")?,
            longitude: parse_f64(fields, "longitude")?,
            timestamp: required_field(fields, "timestamp")?.to_string(),
        })
    }

    pub fn to_stream_fields(&self) -> Vec<(String, String)> {
        vec![
            ("order_id".to_string(), self.order_id.clone()),
            ("customer_id".to_string(), self.customer_id.clone()),
            ("order_value".to_string(), format!("{:.2}", self.order_value)),
            ("latitude".to_string(), format!("{:.6}", self.latitude)),
            ("longitude".to_string(), format!("{:.6}", self.longitude)),
            ("timestamp".to_string(), self.timestamp.clone()),
        ]
    }
}

/// Extracts the minute-bucket time key from an event timestamp: the first 16
/// characters, i.e. `YYYY-MM-DDTHH:MM`. Per Design Notes open question 3,
/// this implementation rejects timestamps too short to contain a full
/// `YYYY-MM-DDTHH:MM` prefix rather than silently padding/truncating into a
/// bucket that wouldn't correspond to a real minute.
pub fn time_key(timestamp: &str) -> Result<&str, HandlerError> {
    if timestamp.len() < 16 {
        return Err(HandlerError::Malformed(format!(
            "timestamp {timestamp:?} shorter than YYYY-MM-DDTHH:MM"
        )));
    }
    Ok(&timestamp[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_well_formed_driver_position() {
        let f = fields(&[
            ("driver_id", "d1"),
            ("latitude", "-19.9191"),
            ("longitude", "-43.9378"),
            ("timestamp", "2024-05-01T12:34:56"),
        ]);
        let ev = DriverPositionEvent::parse(&f).unwrap();
        assert_eq!(ev.driver_id, "d1");
        assert!((ev.latitude - -19.9191).abs() < 1e-9);
    }

    #[test]
    fn missing_field_is_malformed() {
        let f = fields(&[("driver_id", "d1"), ("latitude", "1.0")]);
        assert!(matches!(
            DriverPositionEvent::parse(&f),
            Err(HandlerError::Malformed(_))
        ));
    }

    #[test]
    fn unparseable_number_is_malformed() {
        let f = fields(&[
            ("driver_id", "d1"),
            ("latitude", "not-a-number"),
            ("longitude", "0.0"),
            ("timestamp", "2024-05-01T12:34:56"),
        ]);
        assert!(matches!(
            DriverPositionEvent::parse(&f),
            Err(HandlerError::Malformed(_))
        ));
    }

    #[test]
    fn negative_order_value_is_malformed() {
        let f = fields(&[
            ("order_id", "o1"),
            ("customer_id", "c1"),
            ("order_value", "-5.0"),
            ("latitude", "0.0"),
            ("longitude", "0.0"),
            ("timestamp", "2024-05-01T12:34:56"),
        ]);
        assert!(matches!(OrderEvent::parse(&f), Err(HandlerError::Malformed(_))));
    }

    #[test]
    fn time_key_takes_first_16_chars() {
        assert_eq!(time_key("2024-05-01T12:34:56.789").unwrap(), "2024-05-01T12:34");
    }

    #[test]
    fn time_key_rejects_short_timestamp() {
        assert!(time_key("2024-05").is_err());
    }
}
