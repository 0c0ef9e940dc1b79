use serde::{Deserialize, Serialize};

/// Administrative divisions served by the dashboard, in display order.
pub const DIVISIONS: [&str; 7] = [
    "Dhaka",
    "Chittagong",
    "Rajshahi",
    "Khulna",
    "Sylhet",
    "Rangpur",
    "Barisal",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Latitude/longitude box used to resolve a map click to a division.
///
/// Bounds are exclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub const fn contains(&self, point: Coordinates) -> bool {
        point.lat > self.min_lat
            && point.lat < self.max_lat
            && point.lng > self.min_lng
            && point.lng < self.max_lng
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivisionInfo {
    pub name: &'static str,
    pub centroid: Coordinates,
    pub bounds: Bounds,
}

const fn division(
    name: &'static str,
    centroid: (f64, f64),
    lat: (f64, f64),
    lng: (f64, f64),
) -> DivisionInfo {
    DivisionInfo {
        name,
        centroid: Coordinates {
            lat: centroid.0,
            lng: centroid.1,
        },
        bounds: Bounds {
            min_lat: lat.0,
            max_lat: lat.1,
            min_lng: lng.0,
            max_lng: lng.1,
        },
    }
}

/// Catalog entries share the order of [`DIVISIONS`]. The boxes overlap in a few
/// places, so lookups walk the catalog in order and the first hit wins.
pub const DIVISION_CATALOG: [DivisionInfo; 7] = [
    division("Dhaka", (23.8103, 90.4125), (23.5, 24.5), (89.8, 91.0)),
    division("Chittagong", (22.3569, 91.7832), (21.8, 24.0), (91.0, 92.6)),
    division("Rajshahi", (24.3745, 88.6042), (24.0, 25.8), (88.0, 89.8)),
    division("Khulna", (22.8456, 89.5403), (21.5, 23.4), (88.8, 90.2)),
    division("Sylhet", (24.8949, 91.8687), (24.0, 25.2), (90.8, 92.6)),
    division("Rangpur", (25.7439, 89.2752), (25.2, 26.6), (88.0, 90.5)),
    division("Barisal", (22.7010, 90.3535), (21.5, 23.4), (89.8, 91.0)),
];

pub fn division_info(name: &str) -> Option<&'static DivisionInfo> {
    DIVISION_CATALOG.iter().find(|info| info.name == name)
}

/// Resolve a point to the first division whose box contains it.
pub fn locate_division(point: Coordinates) -> Option<&'static DivisionInfo> {
    DIVISION_CATALOG
        .iter()
        .find(|info| info.bounds.contains(point))
}
