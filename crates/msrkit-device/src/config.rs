use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Timing configuration for a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Pause before each command is written.
    #[serde(with = "duration_str")]
    pub pre_send_delay: Duration,
    /// Per-packet deadline for commands answered immediately.
    #[serde(with = "duration_str")]
    pub check_timeout: Duration,
    /// Per-packet deadline for commands that wait for a card swipe.
    #[serde(with = "duration_str")]
    pub swipe_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            pre_send_delay: Duration::from_millis(10),
            check_timeout: Duration::from_millis(150),
            swipe_timeout: Duration::from_secs(30),
        }
    }
}

impl DeviceConfig {
    /// Reject zero deadlines.
    pub fn validate(&self) -> Result<()> {
        if self.check_timeout.is_zero() {
            return Err(DeviceError::InvalidParameter(
                "check timeout must be greater than zero".to_string(),
            ));
        }
        if self.swipe_timeout.is_zero() {
            return Err(DeviceError::InvalidParameter(
                "swipe timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse `"150ms"`, `"2s"` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DeviceError::InvalidParameter(
            "duration must not be empty".to_string(),
        ));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| DeviceError::InvalidParameter(format!("invalid duration value: {input}")))?;

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Render a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}

mod duration_str {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.pre_send_delay, Duration::from_millis(10));
        assert_eq!(config.check_timeout, Duration::from_millis(150));
        assert_eq!(config.swipe_timeout, Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = DeviceConfig {
            check_timeout: Duration::ZERO,
            ..DeviceConfig::default()
        };
        assert!(matches!(config.validate(), Err(DeviceError::InvalidParameter(_))));
    }

    #[test]
    fn serde_uses_duration_strings() {
        let json = serde_json::to_value(DeviceConfig::default()).unwrap();
        assert_eq!(json["pre_send_delay"], "10ms");
        assert_eq!(json["check_timeout"], "150ms");
        assert_eq!(json["swipe_timeout"], "30s");

        let config: DeviceConfig =
            serde_json::from_str(r#"{"swipe_timeout": "5s"}"#).unwrap();
        assert_eq!(config.swipe_timeout, Duration::from_secs(5));
        assert_eq!(config.check_timeout, Duration::from_millis(150));
    }
}
