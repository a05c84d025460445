//! Static coordinates for the cities the dashboard knows how to pin on a map.

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use meteodash::LatLon;
///
/// let berlin = LatLon(52.5200, 13.4050);
/// assert_eq!(berlin.0, 52.5200); // Latitude
/// assert_eq!(berlin.1, 13.4050); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

const CITY_COORDINATES: [(&str, LatLon); 15] = [
    ("New York", LatLon(40.7128, -74.0060)),
    ("London", LatLon(51.5074, -0.1278)),
    ("Paris", LatLon(48.8566, 2.3522)),
    ("Tokyo", LatLon(35.6895, 139.6917)),
    ("Moscow", LatLon(55.7558, 37.6173)),
    ("Sydney", LatLon(-33.8688, 151.2093)),
    ("Berlin", LatLon(52.5200, 13.4050)),
    ("Beijing", LatLon(39.9042, 116.4074)),
    ("Rio de Janeiro", LatLon(-22.9068, -43.1729)),
    ("Dubai", LatLon(25.276987, 55.296249)),
    ("Los Angeles", LatLon(34.0522, -118.2437)),
    ("Singapore", LatLon(1.3521, 103.8198)),
    ("Mumbai", LatLon(19.0760, 72.8777)),
    ("Cairo", LatLon(30.0444, 31.2357)),
    ("Mexico City", LatLon(19.4326, -99.1332)),
];

/// Looks up the map position of a known city by exact name.
///
/// ```
/// use meteodash::city_coordinates;
///
/// assert!(city_coordinates("Tokyo").is_some());
/// assert!(city_coordinates("Atlantis").is_none());
/// ```
pub fn city_coordinates(city: &str) -> Option<LatLon> {
    CITY_COORDINATES
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, coordinates)| *coordinates)
}
