//! Tuning constants for the force-directed layout.

use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Configuration for the force-directed layout.
///
/// Deserializes from a partial object; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Integration time step (default: 0.1). Verlet integration requires
    /// this to stay constant for the lifetime of a layout.
    pub timestep: f64,
    /// Fraction of the previous displacement carried into the next tick
    /// (default: 0.9).
    pub damping: f64,
    /// Base interaction scale `K` (default: 1.0). Repulsion reaches to `2K`.
    pub k: f64,
    /// Spring force per unit of length error (default: 5.0).
    pub spring_strength: f64,
    /// Torque force per radian of angle error (default: 10.0).
    pub torque_strength: f64,
    /// Largest angle error, in radians, that constraint relaxation will snap
    /// directly (default: π/4). Larger errors are left to the simulation.
    pub max_correction_angle: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            timestep: 0.1,
            damping: 0.9,
            k: 1.0,
            spring_strength: 5.0,
            torque_strength: 10.0,
            max_correction_angle: FRAC_PI_4,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(LayoutError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        };
        positive("timestep", self.timestep)?;
        positive("k", self.k)?;

        if !(0.0..=1.0).contains(&self.damping) {
            return Err(LayoutError::InvalidConfig(format!(
                "damping must lie in [0, 1], got {}",
                self.damping
            )));
        }
        if !self.spring_strength.is_finite() || !self.torque_strength.is_finite() {
            return Err(LayoutError::InvalidConfig(
                "force strengths must be finite".to_string(),
            ));
        }
        if !(0.0..=std::f64::consts::PI).contains(&self.max_correction_angle) {
            return Err(LayoutError::InvalidConfig(format!(
                "max_correction_angle must lie in [0, π], got {}",
                self.max_correction_angle
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn timestep_squared(&self) -> f64 {
        self.timestep * self.timestep
    }
}
