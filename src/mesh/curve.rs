use std::f64::consts::TAU;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Step used for finite-difference tangents
const TANGENT_DELTA: f64 = 1e-4;

/// Sinusoidal curve: one full sine period spread over x in [-1.5, 1.5], scaled.
#[inline]
pub fn evaluate(t: f64, scale: f64) -> DVec3 {
    DVec3::new((t * 3.0 - 1.5) * scale, (TAU * t).sin() * scale, 0.0)
}

/// Parametric curves the mesh factory can sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    Sinusoid { scale: f64 },
}

impl Curve {
    pub fn sinusoid(scale: f64) -> Self {
        Curve::Sinusoid { scale }
    }

    /// Rejects parameters that would collapse the curve to a point
    pub fn check(&self) -> SceneResult<()> {
        match *self {
            Curve::Sinusoid { scale } if !(scale.is_finite() && scale > 0.0) => Err(SceneError::InvalidMesh(
                format!("curve scale must be positive and finite, got {}", scale),
            )),
            Curve::Sinusoid { .. } => Ok(()),
        }
    }

    /// Point at `t`. Callers only ever sample [0, 1].
    pub fn point_at(&self, t: f64) -> DVec3 {
        debug_assert!((0.0..=1.0).contains(&t), "curve parameter {t} out of domain");
        match *self {
            Curve::Sinusoid { scale } => evaluate(t, scale),
        }
    }

    pub fn try_point_at(&self, t: f64) -> SceneResult<DVec3> {
        if (0.0..=1.0).contains(&t) {
            Ok(self.point_at(t))
        } else {
            Err(SceneError::CurveDomain { t })
        }
    }

    /// Unit tangent from a central difference clamped to the domain
    pub fn tangent_at(&self, t: f64) -> DVec3 {
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        (self.point_at(t2) - self.point_at(t1)).normalize_or_zero()
    }
}
