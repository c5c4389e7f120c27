use crate::gps_data::Point;

pub const EARTH_RADIUS_IN_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points on a spherical earth.
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = lat2 - lat1;
    // the half-angle sine below makes the ±180° seam continuous, no wrapping
    // needed for longitude.
    let dlng = (p2.longitude - p1.longitude).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // `a` can drift slightly above 1 for antipodal points.
    2.0 * EARTH_RADIUS_IN_M * a.sqrt().min(1.0).asin()
}

impl Point {
    pub fn haversine_distance(&self, other: &Point) -> f64 {
        distance(self, other)
    }
}
