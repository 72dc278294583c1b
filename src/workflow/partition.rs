//! Device-Balanced Partitioning
//!
//! Splits a ping set into parts for parallel processing without ever
//! cutting a device's trajectory across two parts, and merges parts back.

use crate::trajectory::deltas::sort_by_device_time;
use crate::trajectory::{DeviceCode, Ping, PingRow};
use std::collections::BTreeMap;
use tracing::debug;

/// Split pings into `n_parts` groups of whole devices.
///
/// Devices are visited in code order and each goes to the part with the
/// fewest rows so far (lowest index on ties). Each part is ordered by
/// `(device, timestamp)`. Parts may be empty when there are fewer devices
/// than parts.
pub fn split_by_device(mut pings: Vec<Ping>, n_parts: usize) -> crate::Result<Vec<Vec<Ping>>> {
    if n_parts == 0 {
        return Err(crate::Error::Config("n_parts must be at least 1".to_string()));
    }

    sort_by_device_time(&mut pings);

    let mut by_device: BTreeMap<DeviceCode, Vec<Ping>> = BTreeMap::new();
    for p in pings {
        by_device.entry(p.device).or_default().push(p);
    }

    let mut parts: Vec<Vec<Ping>> = vec![Vec::new(); n_parts];
    for (device, rows) in by_device {
        let target = (0..n_parts)
            .min_by_key(|&i| (parts[i].len(), i))
            .unwrap_or(0);
        debug!(device, rows = rows.len(), part = target, "Device assigned");
        parts[target].extend(rows);
    }
    Ok(parts)
}

/// Reunite partitions into one set ordered by `(device, timestamp)`.
///
/// A device whose pings ended up in several parts comes out contiguous
/// again. Codes must come from one shared dictionary.
pub fn merge_parts<P: PingRow>(parts: Vec<Vec<P>>) -> Vec<P> {
    let n_parts = parts.len();
    let mut merged: Vec<P> = parts.into_iter().flatten().collect();
    sort_by_device_time(&mut merged);
    debug!(parts = n_parts, rows = merged.len(), "Partitions merged");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn pings(device: u32, n: usize) -> Vec<Ping> {
        let base = NaiveDate::from_ymd_opt(2023, 3, 27)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| Ping::new(device, base + chrono::Duration::seconds(i as i64), 46.0, 14.0))
            .collect()
    }

    #[test]
    fn test_zero_parts_rejected() {
        assert!(split_by_device(pings(0, 3), 0).is_err());
    }

    #[test]
    fn test_devices_never_split() {
        let mut all = pings(0, 10);
        all.extend(pings(1, 3));
        all.extend(pings(2, 4));
        all.extend(pings(3, 1));

        let parts = split_by_device(all, 2).unwrap();
        assert_eq!(parts.iter().map(Vec::len).sum::<usize>(), 18);

        let mut seen = HashSet::new();
        for part in &parts {
            let devices: HashSet<u32> = part.iter().map(|p| p.device).collect();
            for d in devices {
                assert!(seen.insert(d), "device {} appears in two parts", d);
            }
        }
    }

    #[test]
    fn test_greedy_balance() {
        let mut all = pings(0, 10);
        all.extend(pings(1, 3));
        all.extend(pings(2, 4));
        all.extend(pings(3, 1));

        let parts = split_by_device(all, 2).unwrap();
        // 0 -> part 0 (10), 1 -> part 1 (3), 2 -> part 1 (7), 3 -> part 1 (8)
        assert_eq!(parts[0].len(), 10);
        assert_eq!(parts[1].len(), 8);
    }

    #[test]
    fn test_merge_undoes_split() {
        let mut all = pings(2, 5);
        all.extend(pings(0, 3));
        all.extend(pings(1, 4));
        let mut expected = all.clone();
        sort_by_device_time(&mut expected);

        let parts = split_by_device(all, 3).unwrap();
        assert_eq!(merge_parts(parts), expected);
    }

    #[test]
    fn test_merge_reunites_device_spread_over_parts() {
        let device_0 = pings(0, 6);
        let parts = vec![
            vec![device_0[3], device_0[5]],
            pings(1, 2),
            vec![device_0[4], device_0[0], device_0[2], device_0[1]],
        ];

        let merged = merge_parts(parts);
        assert_eq!(&merged[..6], &device_0[..]);
        assert!(merged[6..].iter().all(|p| p.device == 1));
        assert!(merge_parts::<Ping>(Vec::new()).is_empty());
    }

    #[test]
    fn test_more_parts_than_devices() {
        let parts = split_by_device(pings(5, 4), 3).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
        assert!(parts[1].is_empty() && parts[2].is_empty());
    }
}
