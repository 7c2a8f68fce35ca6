//! Utility functions for geodesic distances and Web Mercator projection

use crate::{Result, TourError};
use geo::{Distance, Geodesic, Point};

/// Equatorial radius of the Web Mercator sphere in meters (EPSG:3857)
pub const EARTH_RADIUS_METERS: f64 = 6378137.0;

/// Precomputed constant: meters of easting per degree of longitude
const LON_TO_X_FACTOR: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// Geodesic distance in kilometers between two `(latitude, longitude)` pairs
///
/// `previous` is `None` for the first point of a stage, which has no predecessor
/// and therefore contributes zero distance.
///
/// Distances are measured on the WGS84 ellipsoid (Karney's geodesic algorithm).
#[inline]
pub fn distance_km(current: (f64, f64), previous: Option<(f64, f64)>) -> f64 {
    let Some((prev_lat, prev_lon)) = previous else {
        return 0.0;
    };
    let (lat, lon) = current;
    if lat == prev_lat && lon == prev_lon {
        return 0.0;
    }
    Geodesic.distance(Point::new(lon, lat), Point::new(prev_lon, prev_lat)) / 1000.0
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is not clamped: the northing diverges towards +/-90 degrees.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let x = lon * LON_TO_X_FACTOR;
    let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln() * EARTH_RADIUS_METERS;
    Point::new(x, y)
}

/// Inputs that can be projected by [`to_mercator`]
///
/// Implemented for scalars, fixed-size arrays, slices (columns) and vectors.
/// The projected output keeps the shape of the input.
pub trait MercatorInput: Sized {
    type Output;

    fn project(longitude: Self, latitude: Self) -> Result<Self::Output>;
}

impl MercatorInput for f64 {
    type Output = (f64, f64);

    fn project(longitude: Self, latitude: Self) -> Result<Self::Output> {
        let point = wgs84_to_mercator(latitude, longitude);
        Ok((point.x(), point.y()))
    }
}

impl<const N: usize> MercatorInput for [f64; N] {
    type Output = ([f64; N], [f64; N]);

    fn project(longitude: Self, latitude: Self) -> Result<Self::Output> {
        let mut eastings = [0.0; N];
        let mut northings = [0.0; N];
        for i in 0..N {
            let point = wgs84_to_mercator(latitude[i], longitude[i]);
            eastings[i] = point.x();
            northings[i] = point.y();
        }
        Ok((eastings, northings))
    }
}

impl MercatorInput for &[f64] {
    type Output = (Vec<f64>, Vec<f64>);

    fn project(longitude: Self, latitude: Self) -> Result<Self::Output> {
        if longitude.len() != latitude.len() {
            return Err(TourError::CoordinateConversion(format!(
                "longitude and latitude lengths differ ({} vs {})",
                longitude.len(),
                latitude.len()
            )));
        }
        Ok(longitude
            .iter()
            .zip(latitude)
            .map(|(&lon, &lat)| {
                let point = wgs84_to_mercator(lat, lon);
                (point.x(), point.y())
            })
            .unzip())
    }
}

impl MercatorInput for Vec<f64> {
    type Output = (Vec<f64>, Vec<f64>);

    fn project(longitude: Self, latitude: Self) -> Result<Self::Output> {
        <&[f64]>::project(&longitude, &latitude)
    }
}

/// Project longitude/latitude values into Web Mercator easting/northing meters
///
/// Accepts a scalar pair, two arrays, two slices or two vectors and returns
/// `(easting, northing)` in the same shape.
///
/// # Example
/// ```
/// use tour_track_lib::to_mercator;
///
/// let (x, y) = to_mercator(-74.0, 40.71).unwrap();
/// assert!(x < 0.0 && y > 0.0);
///
/// let (xs, ys) = to_mercator(vec![-74.0, 2.35], vec![40.71, 48.85]).unwrap();
/// assert_eq!(xs.len(), ys.len());
/// ```
pub fn to_mercator<T: MercatorInput>(longitude: T, latitude: T) -> Result<T::Output> {
    T::project(longitude, latitude)
}

/// Round a value to a fixed number of decimal places
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round to the nearest integer, ties to even
///
/// Every figure in a stage summary goes through this function.
#[inline]
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}
