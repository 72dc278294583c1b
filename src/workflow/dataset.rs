//! Column-Table Datasets
//!
//! The interchange format between pipeline stages: a JSON object of
//! equal-length column arrays. Only the columns a stage needs must be
//! present; the rest are optional and omitted when written.

use crate::trajectory::{Delta, DeviceCodes, LabeledPing, Ping, PingRow, Tracked};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Columnar ping table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviceid: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Read signed so a negative bin surfaces as a schema error
    pub time_bin: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_m: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_m_s: Option<Vec<f64>>,
}

/// Pings decoded from a table, with the device-id dictionary
#[derive(Debug, Clone)]
pub struct Decoded<P> {
    pub rows: Vec<P>,
    pub devices: DeviceCodes,
    /// Rows dropped because their timestamp could not be parsed
    pub dropped: usize,
}

fn required<'a, T>(column: &'a Option<Vec<T>>, name: &str) -> crate::Result<&'a [T]> {
    column
        .as_deref()
        .ok_or_else(|| crate::Error::Schema(format!("missing required column '{}'", name)))
}

fn check_len<T>(column: &[T], name: &str, expected: usize) -> crate::Result<()> {
    if column.len() != expected {
        return Err(crate::Error::Schema(format!(
            "column '{}' has {} rows, expected {}",
            name,
            column.len(),
            expected
        )));
    }
    Ok(())
}

/// Parse a combined timestamp string
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

/// Parse a separate date and time-of-day pair
pub fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date.trim(), f).ok())?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(time.trim(), f).ok())?;
    Some(date.and_time(time))
}

impl ColumnTable {
    /// Number of rows, taken from the first present core column
    pub fn len(&self) -> usize {
        self.deviceid
            .as_ref()
            .map(Vec::len)
            .or_else(|| self.lat.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn timestamps(&self, n: usize) -> crate::Result<Vec<Option<NaiveDateTime>>> {
        if let Some(datetime) = &self.datetime {
            check_len(datetime, "datetime", n)?;
            return Ok(datetime.iter().map(|s| parse_datetime(s)).collect());
        }
        match (&self.date, &self.time) {
            (Some(date), Some(time)) => {
                check_len(date, "date", n)?;
                check_len(time, "time", n)?;
                Ok(date
                    .iter()
                    .zip(time)
                    .map(|(d, t)| parse_date_time(d, t))
                    .collect())
            }
            _ => Err(crate::Error::Schema(
                "no timestamp: need 'datetime' or both 'date' and 'time'".to_string(),
            )),
        }
    }

    /// Decode raw pings; returns `(source row index, ping)` pairs
    fn decode_indexed(&self, mut devices: DeviceCodes) -> crate::Result<(Vec<(usize, Ping)>, DeviceCodes, usize)> {
        let ids = required(&self.deviceid, "deviceid")?;
        let lat = required(&self.lat, "lat")?;
        let lon = required(&self.lon, "lon")?;
        let n = ids.len();
        check_len(lat, "lat", n)?;
        check_len(lon, "lon", n)?;
        let timestamps = self.timestamps(n)?;

        let mut pings = Vec::with_capacity(n);
        let mut dropped = 0usize;
        for (i, ts) in timestamps.into_iter().enumerate() {
            match ts {
                Some(ts) => {
                    let device = devices.encode(&ids[i]);
                    pings.push((i, Ping::new(device, ts, lat[i], lon[i])));
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, rows = n, "Rows with unparsable timestamps dropped");
        }
        debug!(rows = pings.len(), devices = devices.len(), "Column table decoded");
        Ok((pings, devices, dropped))
    }

    /// Decode into raw pings
    pub fn to_pings(&self) -> crate::Result<Decoded<Ping>> {
        self.to_pings_with(DeviceCodes::new())
    }

    /// Decode into raw pings, extending an existing device dictionary so
    /// several tables share one code space
    pub fn to_pings_with(&self, devices: DeviceCodes) -> crate::Result<Decoded<Ping>> {
        let (indexed, devices, dropped) = self.decode_indexed(devices)?;
        Ok(Decoded {
            rows: indexed.into_iter().map(|(_, p)| p).collect(),
            devices,
            dropped,
        })
    }

    /// Decode into labeled pings; `zone_id` and `time_bin` are required
    pub fn to_labeled(&self) -> crate::Result<Decoded<LabeledPing>> {
        let zones = required(&self.zone_id, "zone_id")?;
        let bins = required(&self.time_bin, "time_bin")?;
        let n = self.len();
        check_len(zones, "zone_id", n)?;
        check_len(bins, "time_bin", n)?;

        let bins = bins
            .iter()
            .map(|&b| {
                u16::try_from(b).map_err(|_| crate::Error::Schema(format!("time_bin {} out of range", b)))
            })
            .collect::<crate::Result<Vec<u16>>>()?;

        let (indexed, devices, dropped) = self.decode_indexed(DeviceCodes::new())?;
        Ok(Decoded {
            rows: indexed
                .into_iter()
                .map(|(i, p)| LabeledPing::new(p, zones[i], bins[i]))
                .collect(),
            devices,
            dropped,
        })
    }

    fn from_rows<'a, P: PingRow + 'a>(rows: impl Iterator<Item = &'a P>, devices: &DeviceCodes) -> Self {
        let (mut ids, mut datetime, mut lat, mut lon) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for row in rows {
            let p = row.ping();
            ids.push(
                devices
                    .decode(p.device)
                    .map(str::to_string)
                    .unwrap_or_else(|| p.device.to_string()),
            );
            datetime.push(p.timestamp.format(DATETIME_OUTPUT_FORMAT).to_string());
            lat.push(p.lat);
            lon.push(p.lon);
        }
        ColumnTable {
            deviceid: Some(ids),
            datetime: Some(datetime),
            lat: Some(lat),
            lon: Some(lon),
            ..Default::default()
        }
    }

    pub fn from_pings(rows: &[Ping], devices: &DeviceCodes) -> Self {
        Self::from_rows(rows.iter(), devices)
    }

    pub fn from_labeled(rows: &[LabeledPing], devices: &DeviceCodes) -> Self {
        let mut table = Self::from_rows(rows.iter(), devices);
        table.zone_id = Some(rows.iter().map(|r| r.zone_id).collect());
        table.time_bin = Some(rows.iter().map(|r| i64::from(r.time_bin)).collect());
        table
    }

    /// Table of denoised rows, optionally with their delta columns
    pub fn from_tracked(rows: &[Tracked<Ping>], devices: &DeviceCodes, retain_deltas: bool) -> Self {
        let table = Self::from_rows(rows.iter().map(|t| &t.row), devices);
        if retain_deltas {
            table.with_deltas(rows.iter().map(|t| &t.delta))
        } else {
            table
        }
    }

    /// Attach `dist_m`, `dt` and `speed_m_s` columns
    pub fn with_deltas<'a>(mut self, deltas: impl IntoIterator<Item = &'a Delta>) -> Self {
        let (mut dist, mut dt, mut speed) = (Vec::new(), Vec::new(), Vec::new());
        for d in deltas {
            dist.push(d.distance_m);
            dt.push(d.elapsed_s);
            speed.push(d.speed_m_s);
        }
        self.dist_m = Some(dist);
        self.dt = Some(dt);
        self.speed_m_s = Some(speed);
        self
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: ColumnTable = serde_json::from_str(&content)?;
        Ok(table)
    }
}
