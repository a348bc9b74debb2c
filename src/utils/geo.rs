/// Great-circle distance between two coordinates (Haversine), in kilometers.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Whether a pickup point falls inside a tenant's service area.
pub fn is_within_radius(
    pickup_lat: f64,
    pickup_lng: f64,
    center_lat: f64,
    center_lng: f64,
    max_radius_km: f64,
) -> bool {
    haversine_distance(pickup_lat, pickup_lng, center_lat, center_lng) <= max_radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_madrid_barcelona() {
        let madrid = (40.4168, -3.7038);
        let barcelona = (41.3874, 2.1686);

        let distance = haversine_distance(madrid.0, madrid.1, barcelona.0, barcelona.1);
        // Roughly 505 km as the crow flies.
        assert!(distance > 480.0 && distance < 530.0);
    }

    #[test]
    fn test_service_area_boundary() {
        let center = (40.4168, -3.7038);
        let nearby = (40.42, -3.70);

        assert!(is_within_radius(nearby.0, nearby.1, center.0, center.1, 10.0));

        let barcelona = (41.3874, 2.1686);
        assert!(!is_within_radius(barcelona.0, barcelona.1, center.0, center.1, 10.0));
    }
}
