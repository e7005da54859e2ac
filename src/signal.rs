//! Synthetic traffic signal.
//!
//! Intensity is a closed-form product of location base load, weekend factor,
//! rush-hour profile and day adjustment, scaled by a ±10% jitter. Values are in
//! passenger car units per hour.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::days::Day;
use crate::locations;

pub const WEEKEND_FACTOR: f64 = 0.6;
const JITTER_FLOOR: f64 = 0.9;
const JITTER_SPAN: f64 = 0.2;

/// Source of uniform values in `[0.0, 1.0)` feeding the jitter.
pub trait JitterSource: Send + Sync {
    fn next_uniform(&self) -> f64;
}

/// Thread-local RNG, never seeded explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn next_uniform(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Replays a fixed list of values, wrapping around at the end.
pub struct SequenceJitter {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl SequenceJitter {
    /// `None` for an empty list.
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self { values, cursor: AtomicUsize::new(0) })
    }

    /// Always yields `value`. 0.5 gives a jitter multiplier of exactly 1.0.
    pub fn constant(value: f64) -> Self {
        Self { values: vec![value], cursor: AtomicUsize::new(0) }
    }

    /// Uniform draws that make `generate` return exactly `targets` for a
    /// reading whose pre-jitter value is `raw`.
    pub fn for_values(raw: f64, targets: &[f64]) -> Option<Self> {
        Self::new(
            targets
                .iter()
                .map(|t| (t / raw - JITTER_FLOOR) / JITTER_SPAN)
                .collect(),
        )
    }
}

impl JitterSource for SequenceJitter {
    fn next_uniform(&self) -> f64 {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()]
    }
}

pub fn hour_multiplier(hour: u8) -> f64 {
    match hour {
        8..=10 => 1.8,   // morning rush
        17..=20 => 2.0,  // evening rush
        12..=14 => 1.3,  // lunch
        0..=5 => 0.3,    // night
        22..=23 => 0.5,  // late evening
        _ => 1.0,
    }
}

pub fn day_multiplier(day: Day) -> f64 {
    match day {
        Day::Friday => 1.15,
        Day::Monday => 1.10,
        _ => 1.0,
    }
}

pub fn weekend_multiplier(day: Day) -> f64 {
    if day.is_weekend() { WEEKEND_FACTOR } else { 1.0 }
}

/// Intensity before jitter and rounding.
pub fn raw_intensity(location_id: &str, day: Day, hour: u8) -> f64 {
    locations::base_intensity(location_id)
        * weekend_multiplier(day)
        * hour_multiplier(hour)
        * day_multiplier(day)
}

/// One jittered intensity reading, rounded to two decimals.
///
/// `hour` is not re-validated here; callers keep it within `0..=23`.
pub fn generate(location_id: &str, day: Day, hour: u8, jitter: &dyn JitterSource) -> f64 {
    let factor = JITTER_FLOOR + jitter.next_uniform() * JITTER_SPAN;
    round2(raw_intensity(location_id, day, hour) * factor)
}

/// Rounds to two decimals, half to even on the exact binary value.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    // Exact error of the product; only matters when `scaled` landed on a half.
    let residual = value.mul_add(100.0, -scaled);
    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 && residual != 0.0 {
        if residual > 0.0 { scaled.ceil() } else { scaled.floor() }
    } else {
        scaled.round_ties_even()
    };
    rounded / 100.0
}
