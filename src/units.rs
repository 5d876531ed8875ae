//! Translation of provider-native units into the pipeline's canonical ones.
//! All functions are pure and total.

/// Neutral percentage for competition levels the table does not know.
pub const UNRECOGNIZED_COMPETITION: u8 = 50;

/// Ordered competition table. "Medium" sits closer to "high" than a linear
/// scale would put it.
const COMPETITION_LEVELS: &[(&str, u8)] = &[
    ("LOW", 20),
    ("MEDIUM", 60),
    ("HIGH", 90),
    ("UNSPECIFIED", 25),
    ("UNKNOWN", 25),
];

/// Round half-up to `places` decimals.
pub fn round_to(x: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (x * factor).round() / factor
}

/// Shorthand for one-decimal rounding used by all 0–10 scores.
pub fn round1(x: f64) -> f64 {
    round_to(x, 1)
}

/// Micro-currency to USD with cent precision. Absent → 0.0.
pub fn micros_to_usd(micros: Option<i64>) -> f64 {
    match micros {
        None => 0.0,
        Some(m) => round_to(m.max(0) as f64 / 1_000_000.0, 2),
    }
}

/// Competition level (e.g. `"MEDIUM"`) to a 0–100 percentage.
pub fn competition_level_to_percent(level: &str) -> u8 {
    let level = level.trim();
    COMPETITION_LEVELS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(level))
        .map(|&(_, pct)| pct)
        .unwrap_or(UNRECOGNIZED_COMPETITION)
}
