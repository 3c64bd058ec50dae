// ── Map icon keys ──
//
// Maps a device category to the icon the map renders for it.

/// Categories that have a dedicated icon.
const KNOWN_CATEGORIES: &[&str] = &[
    "ambulance", "animal", "bicycle", "bike", "boat", "bulldozer", "bus", "camper", "car", "crane",
    "dumper", "e-bike", "e-bus", "e-car", "e-rickshaw", "e-scooter", "e-taxi", "finish",
    "firetruck", "garbagetruck", "harvester", "helicopter", "jcb", "jeep", "loading",
    "mixertruck", "motorcycle", "person", "pet", "plane", "poclain", "rickshaw", "roadroller",
    "schoolbus", "schoolvan", "scooter", "ship", "start", "suv", "tankertruck", "taxi", "tractor",
    "trailer", "train", "tram", "truck", "van",
];

pub const DEFAULT_ICON: &str = "default";
pub const START_POINT: &str = "startpoint";
pub const END_POINT: &str = "endpoint";

/// Icon key for a device category. Unknown or missing categories fall
/// back to [`DEFAULT_ICON`].
pub fn map_icon_key(category: Option<&str>) -> &str {
    match category {
        Some("offroad" | "pickup") => "car",
        Some("trolleybus") => "bus",
        Some(c) if KNOWN_CATEGORIES.contains(&c) => c,
        _ => DEFAULT_ICON,
    }
}
