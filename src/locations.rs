use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::HashMap;

/// Base load used when a location id is not in the table.
/// Callers validate ids first, so this only guards direct use of the generator.
pub const FALLBACK_BASE: f64 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip)]
    pub base_intensity: f64,
}

// Bangalore monitoring points, in listing order.
pub static LOCATIONS: [Location; 4] = [
    Location { id: "silk_board", name: "Silk Board", latitude: 12.9177, longitude: 77.6233, base_intensity: 2500.0 },
    Location { id: "kr_puram", name: "KR Puram", latitude: 13.0075, longitude: 77.6959, base_intensity: 2200.0 },
    Location { id: "whitefield", name: "Whitefield", latitude: 12.9698, longitude: 77.7500, base_intensity: 1800.0 },
    Location { id: "hebbal", name: "Hebbal", latitude: 13.0358, longitude: 77.5970, base_intensity: 2000.0 },
];

lazy_static! {
    static ref BY_ID: HashMap<&'static str, &'static Location> =
        LOCATIONS.iter().map(|loc| (loc.id, loc)).collect();
}

pub fn find(id: &str) -> Option<&'static Location> {
    BY_ID.get(id).copied()
}

pub fn ids() -> impl Iterator<Item = &'static str> {
    LOCATIONS.iter().map(|loc| loc.id)
}

/// "Silk Board" -> "silk_board"
pub fn normalize_id(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "_")
}

pub fn base_intensity(id: &str) -> f64 {
    find(id).map(|loc| loc.base_intensity).unwrap_or(FALLBACK_BASE)
}
