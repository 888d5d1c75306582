//! Timestamp rendering styles and time zones.
//!
//! A [`TimestampFormat`] turns the instant of a tick into the text that lands
//! in the `timestamp` token. A custom strftime pattern always wins over a
//! named style; without either the instant is rendered as RFC 3339.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Zone name meaning "the host's current zone".
pub const LOCAL_ZONE: &str = "Local";

/// Named timestamp styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    /// `23/Mar/2025:00:00:00 +0000`
    Apache,
    /// `Sun Mar 23 00:00:00 2025`
    ApacheError,
    /// `Mar 23 00:00:00`
    Rfc3164,
    /// `2025-03-23T00:00:00.000Z`
    Rfc5424,
    /// `2025-03-23T00:00:00Z`
    Rfc3339,
    /// `1742688000`
    UnixSeconds,
}

impl TimestampStyle {
    fn pattern(&self) -> Option<&'static str> {
        match self {
            TimestampStyle::Apache => Some("%d/%b/%Y:%H:%M:%S %z"),
            TimestampStyle::ApacheError => Some("%a %b %d %H:%M:%S %Y"),
            TimestampStyle::Rfc3164 => Some("%b %d %H:%M:%S"),
            TimestampStyle::Rfc5424 => Some("%Y-%m-%dT%H:%M:%S%.3fZ"),
            TimestampStyle::Rfc3339 | TimestampStyle::UnixSeconds => None,
        }
    }
}

/// The zone a timestamp is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    #[default]
    Local,
    Named(Tz),
}

impl std::str::FromStr for Zone {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == LOCAL_ZONE {
            return Ok(Zone::Local);
        }

        s.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| TimestampError::UnknownZone(s.to_string()))
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Local => f.write_str(LOCAL_ZONE),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Errors raised while building a [`TimestampFormat`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// The zone is neither `Local` nor a known IANA name
    UnknownZone(String),

    /// The custom pattern contains an unsupported specifier
    InvalidPattern(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampError::UnknownZone(zone) => write!(f, "invalid timezone '{}'", zone),
            TimestampError::InvalidPattern(pattern) => {
                write!(f, "invalid custom timestamp pattern '{}'", pattern)
            }
        }
    }
}

impl std::error::Error for TimestampError {}

/// How the tick instant is rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimestampFormat {
    style: Option<TimestampStyle>,
    custom: Option<String>,
    zone: Zone,
}

impl TimestampFormat {
    /// Build a format, validating the custom pattern if one is given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if `custom` contains a specifier chrono
    /// does not understand.
    pub fn new(
        style: Option<TimestampStyle>,
        custom: Option<String>,
        zone: Zone,
    ) -> Result<Self, TimestampError> {
        let custom = custom.filter(|c| !c.is_empty());

        if let Some(pattern) = &custom {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(TimestampError::InvalidPattern(pattern.clone()));
            }
        }

        Ok(Self {
            style,
            custom,
            zone,
        })
    }

    /// A format with a fixed style in a fixed zone.
    pub fn styled(style: TimestampStyle, zone: Zone) -> Self {
        Self {
            style: Some(style),
            custom: None,
            zone,
        }
    }

    pub fn style(&self) -> Option<TimestampStyle> {
        self.style
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Whether neither a style nor a custom pattern was configured.
    pub fn is_unset(&self) -> bool {
        self.style.is_none() && self.custom.is_none()
    }

    /// Fill in `style` when nothing was configured.
    pub fn or_style(&self, style: TimestampStyle) -> Self {
        if self.is_unset() {
            Self::styled(style, self.zone)
        } else {
            self.clone()
        }
    }

    /// Render `instant` in this format.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use o11ybench::timestamp::{TimestampFormat, TimestampStyle, Zone};
    ///
    /// let zone: Zone = "UTC".parse().unwrap();
    /// let format = TimestampFormat::styled(TimestampStyle::UnixSeconds, zone);
    /// let instant = Utc.with_ymd_and_hms(2025, 3, 23, 0, 0, 0).unwrap();
    /// assert_eq!(format.format(instant), "1742688000");
    /// ```
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self.zone {
            Zone::Local => self.format_in(instant.with_timezone(&Local)),
            Zone::Named(tz) => self.format_in(instant.with_timezone(&tz)),
        }
    }

    fn format_in<Z>(&self, instant: DateTime<Z>) -> String
    where
        Z: TimeZone,
        Z::Offset: std::fmt::Display,
    {
        if let Some(pattern) = &self.custom {
            return instant.format(pattern).to_string();
        }

        match self.style {
            Some(TimestampStyle::UnixSeconds) => instant.timestamp().to_string(),
            Some(style) => match style.pattern() {
                Some(pattern) => instant.format(pattern).to_string(),
                None => instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            },
            // No style still renders in the configured zone.
            None => instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 23, 0, 0, 0).unwrap()
    }

    fn utc(style: TimestampStyle) -> String {
        TimestampFormat::styled(style, "UTC".parse().unwrap()).format(instant())
    }

    #[test]
    fn test_named_styles_in_utc() {
        assert_eq!(utc(TimestampStyle::Apache), "23/Mar/2025:00:00:00 +0000");
        assert_eq!(utc(TimestampStyle::ApacheError), "Sun Mar 23 00:00:00 2025");
        assert_eq!(utc(TimestampStyle::Rfc3164), "Mar 23 00:00:00");
        assert_eq!(utc(TimestampStyle::Rfc5424), "2025-03-23T00:00:00.000Z");
        assert_eq!(utc(TimestampStyle::Rfc3339), "2025-03-23T00:00:00Z");
        assert_eq!(utc(TimestampStyle::UnixSeconds), "1742688000");
    }

    #[test]
    fn test_named_zone_offset() {
        let zone: Zone = "Asia/Shanghai".parse().unwrap();
        let format = TimestampFormat::styled(TimestampStyle::Apache, zone);
        assert_eq!(format.format(instant()), "23/Mar/2025:08:00:00 +0800");

        // Unix seconds do not depend on the zone.
        let format = TimestampFormat::styled(TimestampStyle::UnixSeconds, zone);
        assert_eq!(format.format(instant()), "1742688000");
    }

    #[test]
    fn test_unstyled_rfc3339_uses_zone() {
        let format = TimestampFormat::new(None, None, "Asia/Shanghai".parse().unwrap()).unwrap();
        assert_eq!(format.format(instant()), "2025-03-23T08:00:00+08:00");

        let format = TimestampFormat::new(None, None, "UTC".parse().unwrap()).unwrap();
        assert_eq!(format.format(instant()), "2025-03-23T00:00:00Z");
    }

    #[test]
    fn test_custom_pattern_wins() {
        let format = TimestampFormat::new(
            Some(TimestampStyle::Apache),
            Some("%Y/%m/%d".to_string()),
            "UTC".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(format.format(instant()), "2025/03/23");
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let err = TimestampFormat::new(None, Some("%Q".to_string()), Zone::Local).unwrap_err();
        assert_eq!(err, TimestampError::InvalidPattern("%Q".to_string()));
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("Local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!("".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!("UTC".parse::<Zone>().unwrap().to_string(), "UTC");
        assert!(matches!(
            "Mars/Olympus".parse::<Zone>(),
            Err(TimestampError::UnknownZone(_))
        ));
    }

    #[test]
    fn test_default_style_only_when_unset() {
        let zone: Zone = "UTC".parse().unwrap();

        let unset = TimestampFormat::new(None, None, zone).unwrap();
        assert_eq!(unset.format(instant()), "2025-03-23T00:00:00Z");
        assert_eq!(
            unset.or_style(TimestampStyle::Rfc3164).format(instant()),
            "Mar 23 00:00:00"
        );

        let set = TimestampFormat::styled(TimestampStyle::UnixSeconds, zone);
        assert_eq!(
            set.or_style(TimestampStyle::Rfc3164).format(instant()),
            "1742688000"
        );
    }
}
