//! ballistics-models
//!
//! Reference drag curves stored as immutable, ascending `(mach, value)` lists.
//! The value is the standard projectile's drag-coefficient ratio at that Mach
//! number; a projectile's drag coefficient is that value times its own
//! ballistic/drag coefficient.
//!
//! Lookup is **nearest neighbour**, never interpolation:
//!   - at or below the first key            -> first value
//!   - above the last key                   -> last value
//!   - otherwise, between `prev` and `low`  -> whichever key is closer,
//!     `prev` only when strictly closer (a tie resolves to `low`)
//!
//! where `low` is the smallest key `>=` the requested Mach number.
//!
//! Exports:
//!   - `G7` / `g7_reference(mach)`
//!   - `drag_coefficient(mach, ballistic_coefficient)`

use thiserror::Error;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// One sample of a drag curve.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct CurvePoint {
    pub mach: f64,
    pub value: f64,
}

const fn pt(mach: f64, value: f64) -> CurvePoint {
    CurvePoint { mach, value }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("a drag curve needs at least one point")]
    Empty,
    #[error("curve point {index} is not finite")]
    NonFinite { index: usize },
    #[error("curve point {index} does not have a strictly larger Mach number than its predecessor")]
    Unsorted { index: usize },
}

/// Immutable drag curve sorted by ascending Mach number.
#[derive(Clone, Copy, Debug)]
pub struct DragCurve {
    points: &'static [CurvePoint],
}

impl DragCurve {
    /// Wrap a static table after checking it is non-empty, finite and strictly ascending.
    pub fn new(points: &'static [CurvePoint]) -> Result<Self, CurveError> {
        if points.is_empty() {
            return Err(CurveError::Empty);
        }
        for (index, p) in points.iter().enumerate() {
            if !p.mach.is_finite() || !p.value.is_finite() {
                return Err(CurveError::NonFinite { index });
            }
            if index > 0 && p.mach <= points[index - 1].mach {
                return Err(CurveError::Unsorted { index });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &'static [CurvePoint] {
        self.points
    }

    /// Reference value at the table key nearest to `mach`.
    pub fn lookup(&self, mach: f64) -> f64 {
        let pts = self.points;
        // Index of the smallest key >= mach.
        let low = pts.partition_point(|p| p.mach < mach);

        if low == pts.len() {
            return pts[pts.len() - 1].value;
        }
        if low == 0 {
            return pts[0].value;
        }

        let prev = pts[low - 1];
        let next = pts[low];
        if mach - prev.mach < next.mach - mach {
            prev.value
        } else {
            next.value
        }
    }

    pub fn min_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max)
    }
}

/* -------------------------- G7 reference curve -------------------------- */
/* Drag-coefficient ratio of the G7 standard projectile (long boat-tail).   */

const G7_POINTS: &[CurvePoint] = &[
    pt(0.0, 0.906_148_867_313_915_9),
    pt(0.4, 0.902_209_089_629_942_3),
    pt(0.5, 0.787_955_536_794_709_4),
    pt(0.6, 0.673_701_983_959_476_6),
    pt(0.7, 0.646_123_540_171_661_7),
    pt(0.8, 0.567_327_986_492_190_7),
    pt(0.825, 0.555_508_653_440_270_1),
    pt(0.85, 0.539_749_542_704_376),
    pt(0.875, 0.539_749_542_704_376),
    pt(0.9, 0.559_448_431_124_243_6),
    pt(0.925, 0.606_725_763_331_926_2),
    pt(0.95, 0.697_340_650_063_317_8),
    pt(0.975, 0.929_787_533_417_757),
    pt(1.0, 1.205_571_971_295_905_4),
    pt(1.025, 1.315_885_746_447_164_7),
    pt(1.05, 1.343_464_190_234_979_5),
    pt(1.075, 1.359_223_300_970_873_6),
    pt(1.1, 1.367_102_856_338_820_8),
    pt(1.15, 1.371_042_634_022_794_4),
    pt(1.2, 1.371_042_634_022_794_4),
    pt(1.3, 1.351_343_745_602_926_7),
    pt(1.4, 1.323_765_301_815_111_9),
    pt(1.5, 1.292_247_080_343_323_5),
    pt(1.6, 1.264_668_636_555_508_7),
    pt(1.8, 1.197_692_415_927_958_3),
    pt(2.0, 1.150_415_083_720_275_6),
    pt(2.2, 1.111_017_306_880_540_2),
    pt(2.4, 1.063_739_974_672_857_7),
];

/// The G7 curve. Built directly since `G7_POINTS` is known to be sorted.
pub const G7: DragCurve = DragCurve { points: G7_POINTS };

/// G7 reference value at `mach` (unscaled).
pub fn g7_reference(mach: f64) -> f64 {
    G7.lookup(mach)
}

/// G7 reference value scaled by the projectile's ballistic/drag coefficient.
pub fn drag_coefficient(mach: f64, ballistic_coefficient: f64) -> f64 {
    g7_reference(mach) * ballistic_coefficient
}

/* -------------------------------- tests -------------------------------- */
