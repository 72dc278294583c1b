//! Haversine Distance & Initial Bearing
//!
//! Scalar and batch forms produce bit-identical results: the batch functions
//! are plain maps over the scalar ones.

/// Mean Earth radius used for all distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in degrees.
///
/// Uses the `atan2` form of the haversine formula with the intermediate
/// term clamped to `[0, 1]`, so identical points return exactly `0` and
/// near-antipodal points never produce `NaN` from rounding overshoot.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2, in degrees within `[0, 360)`.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let x = dlambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    let deg = (x.atan2(y).to_degrees() + 360.0) % 360.0;
    // (-0.0 + 360) % 360 can round to 360.0 for tiny negative angles
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Absolute difference between two bearings folded into `[0, 180]`.
pub fn turn_angle(bearing_in: f64, bearing_out: f64) -> f64 {
    let diff = (bearing_out - bearing_in).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Element-wise [`haversine_distance`] over equal-length coordinate arrays.
///
/// Extra elements in longer slices are ignored.
pub fn haversine_distances(lat1: &[f64], lon1: &[f64], lat2: &[f64], lon2: &[f64]) -> Vec<f64> {
    lat1.iter()
        .zip(lon1)
        .zip(lat2.iter().zip(lon2))
        .map(|((&a, &b), (&c, &d))| haversine_distance(a, b, c, d))
        .collect()
}

/// Element-wise [`bearing`] over equal-length coordinate arrays.
pub fn bearings(lat1: &[f64], lon1: &[f64], lat2: &[f64], lon2: &[f64]) -> Vec<f64> {
    lat1.iter()
        .zip(lon1)
        .zip(lat2.iter().zip(lon2))
        .map(|((&a, &b), (&c, &d))| bearing(a, b, c, d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_zero_distance() {
        assert_eq!(haversine_distance(46.05, 14.5, 46.05, 14.5), 0.0);
        assert_eq!(haversine_distance(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // pi * R / 180
        let expected = std::f64::consts::PI * EARTH_RADIUS_M / 180.0;
        let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((d - expected).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_antipodal_points_finite() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!(d.is_finite());
        assert!((d - half_circumference).abs() < 1e-3);

        let d = haversine_distance(90.0, 0.0, -90.0, 0.0);
        assert!(d.is_finite());
        assert!((d - half_circumference).abs() < 1e-3);
    }

    #[test]
    fn test_distance_symmetric() {
        let ab = haversine_distance(46.05, 14.50, 46.56, 15.64);
        let ba = haversine_distance(46.56, 15.64, 46.05, 14.50);
        assert!((ab - ba).abs() < 1e-9);
        // Ljubljana -> Maribor is roughly 100 km
        assert!(ab > 95_000.0 && ab < 110_000.0);
    }

    #[test]
    fn test_cardinal_bearings() {
        assert!((bearing(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((bearing(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing(1.0, 0.0, 0.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing(0.0, 1.0, 0.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let coords = [
            (46.0, 14.0, 46.1, 13.9),
            (46.0, 14.0, 45.9, 14.0),
            (-33.9, 151.2, 51.5, -0.1),
            (10.0, 10.0, 10.0, 10.0),
        ];
        for (a, b, c, d) in coords {
            let brg = bearing(a, b, c, d);
            assert!((0.0..360.0).contains(&brg), "bearing {} out of range", brg);
        }
    }

    #[test]
    fn test_turn_angle_folding() {
        assert_eq!(turn_angle(10.0, 50.0), 40.0);
        assert_eq!(turn_angle(350.0, 10.0), 20.0);
        assert_eq!(turn_angle(0.0, 180.0), 180.0);
        assert_eq!(turn_angle(90.0, 90.0), 0.0);
        assert_eq!(turn_angle(270.0, 0.0), 90.0);
    }

    #[test]
    fn test_batch_matches_scalar() {
        let lat1 = [46.0, 46.01, 45.5, 0.0];
        let lon1 = [14.0, 14.02, 15.0, 0.0];
        let lat2 = [46.001, 46.03, 45.4, 0.0];
        let lon2 = [14.001, 14.00, 15.2, 179.9];

        let distances = haversine_distances(&lat1, &lon1, &lat2, &lon2);
        let brgs = bearings(&lat1, &lon1, &lat2, &lon2);
        assert_eq!(distances.len(), 4);

        for i in 0..4 {
            assert_eq!(distances[i], haversine_distance(lat1[i], lon1[i], lat2[i], lon2[i]));
            assert_eq!(brgs[i], bearing(lat1[i], lon1[i], lat2[i], lon2[i]));
        }
    }

    #[test]
    fn test_batch_empty() {
        assert!(haversine_distances(&[], &[], &[], &[]).is_empty());
        assert!(bearings(&[], &[], &[], &[]).is_empty());
    }
}
