//! Decoder and framing configuration.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};

/// Default maximum line length accepted by the framed transport.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Default maximum literal size accepted by the framed transport.
pub const DEFAULT_MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// How FETCH records are keyed in a [`FetchTable`](crate::parser::FetchTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Key by UID when the record carries one, else by sequence number.
    #[default]
    Uid,
    /// Always key by sequence number.
    Sequence,
}

/// Zone that INTERNALDATE values are normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetZone {
    /// The host's configured zone.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl TargetZone {
    /// UTC as a fixed zone.
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Re-expresses `dt` in this zone and drops the zone information.
    #[must_use]
    pub fn naive_local<Tz: TimeZone>(self, dt: &DateTime<Tz>) -> NaiveDateTime {
        match self {
            Self::Local => dt.with_timezone(&Local).naive_local(),
            Self::Fixed(offset) => dt.with_timezone(&offset).naive_local(),
        }
    }
}

/// FETCH decoding configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeConfig {
    /// Table keying mode.
    pub key_mode: KeyMode,
    /// Zone for INTERNALDATE normalization.
    pub zone: TargetZone,
}

impl DecodeConfig {
    /// Creates the default configuration: UID keys, host-local dates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> DecodeConfigBuilder {
        DecodeConfigBuilder::new()
    }
}

/// Builder for [`DecodeConfig`].
#[derive(Debug, Clone, Default)]
pub struct DecodeConfigBuilder {
    key_mode: KeyMode,
    zone: TargetZone,
}

impl DecodeConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the keying mode.
    #[must_use]
    pub const fn key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    /// Sets the zone INTERNALDATE values are normalized into.
    #[must_use]
    pub const fn zone(mut self, zone: TargetZone) -> Self {
        self.zone = zone;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub const fn build(self) -> DecodeConfig {
        DecodeConfig {
            key_mode: self.key_mode,
            zone: self.zone,
        }
    }
}

/// Limits applied by [`FramedStream`](crate::connection::FramedStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingConfig {
    /// Maximum length of one response line.
    pub max_line_length: usize,
    /// Maximum size of one literal payload.
    pub max_literal_size: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_literal_size: DEFAULT_MAX_LITERAL_SIZE,
        }
    }
}

impl FramingConfig {
    /// Sets the maximum line length.
    #[must_use]
    pub const fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Sets the maximum literal size.
    #[must_use]
    pub const fn max_literal_size(mut self, max: usize) -> Self {
        self.max_literal_size = max;
        self
    }
}
