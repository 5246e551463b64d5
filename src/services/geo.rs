//! Geographic helpers: haversine distance and nearest-volunteer search.
//!
//! Everything here is pure; the callers fetch candidate rows and pass them in.

use crate::models::volunteer::VolunteerProfile;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometers.
///
/// Uses the haversine formula and rounds to 2 decimal places, which is the
/// precision everything downstream (fees, radius filters) works at.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    round2(EARTH_RADIUS_KM * c)
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pick the closest usable volunteer for a pickup point.
///
/// A candidate qualifies when it has known coordinates and the pickup point
/// lies within its own service radius. Among qualifying candidates the
/// minimal distance wins; ties keep the earlier candidate, so callers get a
/// deterministic result for a given candidate order.
///
/// Returns the chosen profile together with its distance from the pickup
/// point, or `None` when nobody qualifies.
pub fn nearest_volunteer(
    pickup_lat: f64,
    pickup_lon: f64,
    candidates: &[VolunteerProfile],
) -> Option<(&VolunteerProfile, f64)> {
    let mut best: Option<(&VolunteerProfile, f64)> = None;

    for candidate in candidates {
        let (Some(lat), Some(lon)) = (candidate.current_latitude, candidate.current_longitude)
        else {
            continue;
        };

        let distance = haversine_km(pickup_lat, pickup_lon, lat, lon);
        if distance > candidate.service_radius_km {
            continue;
        }

        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(haversine_km(19.076, 72.8777, 19.076, 72.8777), 0.0);
    }

    #[test]
    fn known_city_pair_distance() {
        // Mumbai to Pune, roughly 120 km as the crow flies
        let d = haversine_km(19.076, 72.8777, 18.5204, 73.8567);
        assert!((d - 120.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = haversine_km(19.076, 72.8777, 28.7041, 77.1025);
        let ba = haversine_km(28.7041, 77.1025, 19.076, 72.8777);
        assert_eq!(ab, ba);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let d = haversine_km(19.076, 72.8777, 19.08, 72.88);
        assert_eq!(d, round2(d));
    }

    fn profile(lat: Option<f64>, lon: Option<f64>, radius: f64) -> VolunteerProfile {
        let now = Utc::now();
        VolunteerProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: "available".to_string(),
            is_available: true,
            current_latitude: lat,
            current_longitude: lon,
            last_location_update: Some(now),
            vehicle_type: "bike".to_string(),
            max_delivery_capacity: 5,
            service_radius_km: radius,
            total_deliveries: 0,
            successful_deliveries: 0,
            cancelled_deliveries: 0,
            average_rating: 0.0,
            total_ratings: 0,
            total_earnings_cents: 0,
            pending_payout_cents: 0,
            is_verified: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn picks_strictly_nearest_candidate() {
        let near = profile(Some(19.08), Some(72.88), 10.0);
        let far = profile(Some(19.20), Some(72.95), 50.0);
        let candidates = vec![far, near.clone()];

        let (chosen, distance) = nearest_volunteer(19.076, 72.8777, &candidates)
            .expect("a candidate should qualify");
        assert_eq!(chosen.id, near.id);
        assert!(distance < 1.0);
    }

    #[test]
    fn skips_candidates_without_coordinates() {
        let unknown = profile(None, None, 100.0);
        assert!(nearest_volunteer(19.076, 72.8777, &[unknown]).is_none());
    }

    #[test]
    fn respects_each_candidates_service_radius() {
        // About 120 km away but only serves 10 km
        let out_of_range = profile(Some(18.5204), Some(73.8567), 10.0);
        assert!(nearest_volunteer(19.076, 72.8777, &[out_of_range]).is_none());
    }

    #[test]
    fn ties_keep_the_earlier_candidate() {
        let first = profile(Some(19.08), Some(72.88), 10.0);
        let second = profile(Some(19.08), Some(72.88), 10.0);
        let candidates = vec![first.clone(), second];

        let (chosen, _) = nearest_volunteer(19.076, 72.8777, &candidates)
            .expect("both candidates qualify");
        assert_eq!(chosen.id, first.id);
    }

    #[test]
    fn none_when_no_candidates() {
        assert!(nearest_volunteer(19.076, 72.8777, &[]).is_none());
    }
}
