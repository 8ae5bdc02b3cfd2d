//! Transport distance estimation
//!
//! Resolves two free-text place names to an approximate distance in km.
//! Known cities use the haversine great-circle distance; anything else falls
//! back to a crude same-region check on the last word of the name.
//!
//! The result is a feasibility proxy, not a geodesic measurement. Note that
//! [`UNKNOWN_DISTANCE_KM`] is an ordinary number: a caller cannot tell it
//! apart from a measured 999 km except by knowing one input was empty.

/// Returned when either location is empty
pub const UNKNOWN_DISTANCE_KM: u32 = 999;

/// Fallback when the names share their last word
pub const SAME_REGION_KM: u32 = 250;

/// Fallback when the names end in different words
pub const OTHER_REGION_KM: u32 = 900;

/// Mean Earth radius
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate (latitude, longitude) of major Indian cities
static CITY_COORDINATES: &[(&str, (f64, f64))] = &[
    ("mumbai", (19.0760, 72.8777)),
    ("new delhi", (28.6139, 77.2090)),
    ("delhi", (28.7041, 77.1025)),
    ("bangalore", (12.9716, 77.5946)),
    ("bengaluru", (12.9716, 77.5946)),
    ("chennai", (13.0827, 80.2707)),
    ("hyderabad", (17.3850, 78.4867)),
    ("pune", (18.5204, 73.8567)),
    ("kolkata", (22.5726, 88.3639)),
    ("ahmedabad", (23.0225, 72.5714)),
    ("jaipur", (26.9124, 75.7873)),
    ("indore", (22.7196, 75.8577)),
    ("kochi", (9.9312, 76.2673)),
    ("coimbatore", (11.0168, 76.9558)),
];

fn normalize(location: &str) -> String {
    location.trim().to_lowercase()
}

/// Coordinates of a known city, matched case-insensitively
pub fn coordinates(location: &str) -> Option<(f64, f64)> {
    let name = normalize(location);
    CITY_COORDINATES
        .iter()
        .find(|(city, _)| *city == name)
        .map(|(_, coords)| *coords)
}

/// Great-circle distance between two (lat, lon) points in degrees
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    c * EARTH_RADIUS_KM
}

/// Estimated transport distance between two place names
pub fn distance_km(location_a: &str, location_b: &str) -> u32 {
    let a = normalize(location_a);
    let b = normalize(location_b);

    if a.is_empty() || b.is_empty() {
        return UNKNOWN_DISTANCE_KM;
    }
    if a == b {
        return 0;
    }

    if let (Some(from), Some(to)) = (coordinates(&a), coordinates(&b)) {
        return haversine_km(from, to).round_ties_even() as u32;
    }

    // Last word as a stand-in for state/region
    if a.split_whitespace().last() == b.split_whitespace().last() {
        SAME_REGION_KM
    } else {
        OTHER_REGION_KM
    }
}
