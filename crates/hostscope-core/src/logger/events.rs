//! Low-level numbered event sink
//!
//! Each entry becomes a `TRACE` event on target `hostscope::events` carrying
//! a numeric `event_id = area_code * 100 + sequence`. Because the sequence
//! wraps at 100, every area owns a fixed, cyclically reused block of ids.

use std::collections::HashMap;

use hostscope_api::ActionLogEntry;
use tracing::trace;

use super::SEQUENCE_MODULUS;
use super::sink::{LogSink, SinkError, SinkMeta};

/// Area code used for areas missing from the table
pub const UNKNOWN_AREA_CODE: u16 = 0;

/// Case-insensitive area → numeric code table
#[derive(Debug, Clone, Default)]
pub struct AreaCodes(HashMap<String, u16>);

impl AreaCodes {
    /// Assign codes 1, 2, 3, ... in iteration order
    pub fn from_areas<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes = HashMap::new();
        let mut next: u16 = 1;
        for area in areas {
            codes.entry(area.as_ref().to_lowercase()).or_insert_with(|| {
                let code = next;
                next = next.saturating_add(1);
                code
            });
        }
        Self(codes)
    }

    /// Code for `area`, [`UNKNOWN_AREA_CODE`] when not registered
    #[must_use]
    pub fn code(&self, area: &str) -> u16 {
        self.0
            .get(&area.to_lowercase())
            .copied()
            .unwrap_or(UNKNOWN_AREA_CODE)
    }

    /// Event id for `area` at `sequence`
    #[must_use]
    pub fn event_id(&self, area: &str, sequence: u8) -> u32 {
        u32::from(self.code(area)) * u32::from(SEQUENCE_MODULUS) + u32::from(sequence)
    }
}

/// Numbered event sink
#[derive(Debug, Clone)]
pub struct EventSink {
    codes: AreaCodes,
}

impl EventSink {
    #[must_use]
    pub fn new(codes: AreaCodes) -> Self {
        Self { codes }
    }
}

impl LogSink for EventSink {
    fn name(&self) -> &'static str {
        "events"
    }

    fn write(&self, entry: &ActionLogEntry, meta: &SinkMeta) -> Result<(), SinkError> {
        trace!(
            target: "hostscope::events",
            event_id = self.codes.event_id(&entry.area, meta.sequence),
            level = %entry.level,
            area = %entry.area,
            action = %entry.action,
            "{}",
            entry.message
        );
        Ok(())
    }
}
