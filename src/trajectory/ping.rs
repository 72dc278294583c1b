//! Ping Records
//!
//! One location observation per record, with the device identifier
//! dense-encoded to a `u32` code.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense device code (index into [`DeviceCodes`])
pub type DeviceCode = u32;

/// Zone identifier assigned by the spatial collaborator
pub type ZoneId = i32;

/// A single device location observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    /// Dense device code
    pub device: DeviceCode,
    /// Timezone-naive local timestamp
    pub timestamp: NaiveDateTime,
    /// Latitude (degrees, WGS-84)
    pub lat: f64,
    /// Longitude (degrees, WGS-84)
    pub lon: f64,
}

impl Ping {
    pub fn new(device: DeviceCode, timestamp: NaiveDateTime, lat: f64, lon: f64) -> Self {
        Self {
            device,
            timestamp,
            lat,
            lon,
        }
    }

    /// Timestamp as whole epoch seconds (floored), the resolution deltas use
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.and_utc().timestamp()
    }
}

/// A ping labeled with its spatial zone and time-of-day bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPing {
    pub ping: Ping,
    /// Zone id, or the configured sentinel when outside coverage
    pub zone_id: ZoneId,
    /// Time-of-day bin index
    pub time_bin: u16,
}

impl LabeledPing {
    pub fn new(ping: Ping, zone_id: ZoneId, time_bin: u16) -> Self {
        Self {
            ping,
            zone_id,
            time_bin,
        }
    }
}

/// Row types that carry a [`Ping`]
///
/// Lets delta computation and the filters run over raw as well as labeled
/// rows without copying them into a separate shape.
pub trait PingRow {
    fn ping(&self) -> &Ping;
}

impl PingRow for Ping {
    fn ping(&self) -> &Ping {
        self
    }
}

impl PingRow for LabeledPing {
    fn ping(&self) -> &Ping {
        &self.ping
    }
}

/// Dense encoding of external device identifiers
///
/// Codes are handed out in order of first appearance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceCodes {
    ids: Vec<String>,
    #[serde(skip)]
    lookup: HashMap<String, DeviceCode>,
}

impl DeviceCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code for `id`, allocating a new one on first sight
    pub fn encode(&mut self, id: &str) -> DeviceCode {
        if self.lookup.len() != self.ids.len() {
            self.rebuild_lookup();
        }
        if let Some(&code) = self.lookup.get(id) {
            return code;
        }
        let code = self.ids.len() as DeviceCode;
        self.ids.push(id.to_string());
        self.lookup.insert(id.to_string(), code);
        code
    }

    /// Original identifier for a code
    pub fn decode(&self, code: DeviceCode) -> Option<&str> {
        self.ids.get(code as usize).map(String::as_str)
    }

    /// Number of distinct devices seen
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    // Deserialization skips the lookup map
    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as DeviceCode))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, 27)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_codes_in_first_appearance_order() {
        let mut codes = DeviceCodes::new();
        assert_eq!(codes.encode("zeta"), 0);
        assert_eq!(codes.encode("alpha"), 1);
        assert_eq!(codes.encode("zeta"), 0);
        assert_eq!(codes.len(), 2);
        assert_eq!(codes.decode(1), Some("alpha"));
        assert_eq!(codes.decode(7), None);
    }

    #[test]
    fn test_codes_survive_serialization() {
        let mut codes = DeviceCodes::new();
        codes.encode("a");
        codes.encode("b");

        let json = serde_json::to_string(&codes).unwrap();
        let mut loaded: DeviceCodes = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.encode("b"), 1);
        assert_eq!(loaded.encode("c"), 2);
        assert_eq!(loaded.decode(0), Some("a"));
    }

    #[test]
    fn test_epoch_seconds_floor() {
        let p = Ping::new(0, ts(0, 0, 10), 46.0, 14.0);
        let q = Ping::new(
            0,
            ts(0, 0, 10) + chrono::Duration::milliseconds(900),
            46.0,
            14.0,
        );
        assert_eq!(p.epoch_seconds(), q.epoch_seconds());
    }

    #[test]
    fn test_ping_row_access() {
        let p = Ping::new(3, ts(8, 15, 0), 46.0, 14.0);
        let labeled = LabeledPing::new(p, 12, 8);
        assert_eq!(labeled.ping().device, 3);
        assert_eq!(p.ping().lat, 46.0);
    }
}
