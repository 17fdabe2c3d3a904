//! Core ballistics math utilities
//!
//! Includes:
//! - Physical constants shared by every crate in the workspace
//! - Kinematics helpers (angle/speed <-> components, frontal area, Mach)
//! - International Standard Atmosphere density below the tropopause
//! - Boundary validation and the shared error type

use std::f64::consts::PI;

use thiserror::Error;

/// -------------------------
/// Constants
/// -------------------------

/// Acceleration due to gravity [m/s²]
pub const G: f64 = 9.8067;
/// Fixed speed of sound used for Mach numbers [m/s] (not temperature corrected)
pub const SPEED_OF_SOUND_MPS: f64 = 343.0;

/// Sea-level standard pressure [Pa]
pub const P0: f64 = 101_325.0;
/// Sea-level standard temperature [K]
pub const T0: f64 = 288.15;
/// Molar mass of dry air [kg/mol]
pub const MOLAR_MASS_AIR: f64 = 0.028_965_2;
/// Universal gas constant [J/(mol·K)]
pub const R_UNIVERSAL: f64 = 8.314_46;
/// Temperature lapse rate [K/m]
pub const LAPSE_RATE: f64 = 0.0065;

/// Altitude where the barometric base `1 - L·h/T0` reaches zero [m]
pub const TROPOSPHERE_CEILING_M: f64 = T0 / LAPSE_RATE;

/// -------------------------
/// Errors
/// -------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BallisticsError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The angle search ran out of iterations short of the target.
    #[error("target range {target_m:.2} m is out of reach (last attempt {achieved_m:.2} m after {iterations} iterations)")]
    OutOfRange {
        target_m: f64,
        achieved_m: f64,
        iterations: u32,
    },

    #[error("integration did not reach the ground within {max_steps} steps")]
    StepLimit { max_steps: usize },
}

pub type Result<T> = std::result::Result<T, BallisticsError>;

fn invalid(name: &'static str, value: f64, reason: &'static str) -> BallisticsError {
    BallisticsError::InvalidParameter { name, value, reason }
}

pub fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(name, value, "must be a finite number"))
    }
}

pub fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "must be greater than zero"))
    }
}

pub fn ensure_non_negative(name: &'static str, value: f64) -> Result<f64> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "must not be negative"))
    }
}

/// Rejects altitudes where the barometric formula has no real value.
pub fn ensure_below_ceiling(name: &'static str, altitude_m: f64) -> Result<f64> {
    ensure_finite(name, altitude_m)?;
    if altitude_m < TROPOSPHERE_CEILING_M {
        Ok(altitude_m)
    } else {
        Err(invalid(name, altitude_m, "must be below the troposphere ceiling"))
    }
}

/// -------------------------
/// Kinematics
/// -------------------------

/// Split a speed [m/s] at `angle_deg` above the horizon into `(vx, vy)`.
pub fn to_components(speed: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg * PI / 180.0;
    (speed * rad.cos(), speed * rad.sin())
}

/// Magnitude of the velocity `(vx, vy)`.
pub fn to_speed(vx: f64, vy: f64) -> f64 {
    (vx * vx + vy * vy).sqrt()
}

/// Frontal area [m²] of a circular cross-section of `diameter` [m].
pub fn frontal_area(diameter: f64) -> f64 {
    PI * 0.25 * diameter * diameter
}

pub fn mach_number(speed: f64) -> f64 {
    speed / SPEED_OF_SOUND_MPS
}

/// Drag-free range [m] for launch and landing at the same height.
pub fn vacuum_range(speed: f64, angle_deg: f64) -> f64 {
    speed * speed * (2.0 * angle_deg).to_radians().sin() / G
}

/// Drag-free time of flight [s] for launch and landing at the same height.
pub fn vacuum_flight_time(speed: f64, angle_deg: f64) -> f64 {
    2.0 * speed * angle_deg.to_radians().sin() / G
}

/// -------------------------
/// Atmosphere
/// -------------------------

/// Air density [kg/m³] at `altitude_m` from the ISA barometric formula:
///
///   ρ(h) = (p0·M)/(R·T0) · (1 − L·h/T0)^((g·M)/(R·L) − 1)
///
/// Only meaningful below [`TROPOSPHERE_CEILING_M`]. Above it the base is
/// clamped to zero, so the density is reported as zero rather than NaN.
pub fn air_density(altitude_m: f64) -> f64 {
    let base = (1.0 - LAPSE_RATE * altitude_m / T0).max(0.0);
    let exponent = (G * MOLAR_MASS_AIR) / (R_UNIVERSAL * LAPSE_RATE) - 1.0;
    (P0 * MOLAR_MASS_AIR) / (R_UNIVERSAL * T0) * base.powf(exponent)
}

/// Same as [`air_density`] but refuses altitudes outside the formula's domain.
pub fn checked_air_density(altitude_m: f64) -> Result<f64> {
    ensure_below_ceiling("altitude_m", altitude_m).map(air_density)
}

/* -------------------------------- tests -------------------------------- */
