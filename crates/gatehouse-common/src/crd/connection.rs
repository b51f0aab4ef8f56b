//! Connection-level settings for gateway listeners

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Connection settings applied to a listener
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Limits on concurrent connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_limit: Option<ConnectionLimit>,
}

/// Concurrent connection limit
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLimit {
    /// Maximum concurrent connections. Once reached, new connections are
    /// closed after `closeDelay`. Zero means unlimited.
    #[serde(default)]
    #[schemars(range(min = 0))]
    pub value: i64,

    /// Delay before closing a rejected connection, as a Gateway API duration
    /// string (e.g., "1s", "500ms", "1h30m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_delay: Option<String>,
}

impl Connection {
    /// Validate limit bounds and duration syntax
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(limit) = &self.connection_limit {
            limit.validate()?;
        }
        Ok(())
    }
}

impl ConnectionLimit {
    /// Validate limit bounds and duration syntax
    pub fn validate(&self) -> Result<(), Error> {
        if self.value < 0 {
            return Err(Error::validation_for_field(
                "connection",
                "connectionLimit.value",
                format!("must be >= 0, got {}", self.value),
            ));
        }
        self.close_delay_duration()?;
        Ok(())
    }

    /// Parsed close delay, if set
    pub fn close_delay_duration(&self) -> Result<Option<Duration>, Error> {
        self.close_delay
            .as_deref()
            .map(|raw| {
                parse_gateway_duration(raw).map_err(|msg| {
                    Error::validation_for_field("connection", "connectionLimit.closeDelay", msg)
                })
            })
            .transpose()
    }
}

/// Parse a Gateway API duration string.
///
/// Accepts one to four `<digits><unit>` components where digits are 1-5
/// characters and unit is one of `h`, `m`, `s`, `ms`.
pub fn parse_gateway_duration(input: &str) -> Result<Duration, String> {
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let bytes = input.as_bytes();
    let mut total = Duration::ZERO;
    let mut components = 0;
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let digits = &input[start..i];
        if digits.is_empty() || digits.len() > 5 {
            return Err(format!("invalid duration {input:?}: expected 1-5 digits"));
        }
        let amount: u64 = digits
            .parse()
            .map_err(|e| format!("invalid duration {input:?}: {e}"))?;

        let unit = if input[i..].starts_with("ms") {
            i += 2;
            Duration::from_millis(amount)
        } else {
            let unit = bytes.get(i).copied();
            i += 1;
            match unit {
                Some(b'h') => Duration::from_secs(amount * 3600),
                Some(b'm') => Duration::from_secs(amount * 60),
                Some(b's') => Duration::from_secs(amount),
                _ => return Err(format!("invalid duration {input:?}: unit must be h, m, s or ms")),
            }
        };

        total += unit;
        components += 1;
        if components > 4 {
            return Err(format!("invalid duration {input:?}: at most 4 components"));
        }
    }

    Ok(total)
}
