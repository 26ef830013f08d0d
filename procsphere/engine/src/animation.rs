//! Per-frame noise offset. The offset is handed to each generation pass
//! explicitly instead of being written back into the layer configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the frame offset comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum OffsetDriver {
    /// No animation; the offset stays at zero.
    #[default]
    Fixed,
    /// Scroll along +Z at `ShapeSettings::offset_velocity` units per second.
    Velocity,
    /// Track an external position (e.g. the host object's transform).
    Follow {
        /// Scale applied to the followed position
        sensitivity: f32,
    },
}

impl OffsetDriver {
    /// `Follow` sensitivity must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            OffsetDriver::Follow { sensitivity } if !sensitivity.is_finite() => {
                Err(ConfigError::Animation("sensitivity"))
            }
            _ => Ok(()),
        }
    }
}

/// Accumulates the frame offset for one sphere.
#[derive(Clone, Debug, Default)]
pub struct OffsetAnimator {
    driver: OffsetDriver,
    current: Vec3,
}

impl OffsetAnimator {
    /// Start at the zero offset.
    #[must_use]
    pub fn new(driver: OffsetDriver) -> Self {
        Self { driver, current: Vec3::ZERO }
    }

    /// Active driver.
    #[must_use]
    pub fn driver(&self) -> OffsetDriver {
        self.driver
    }

    /// Swap the driver; the accumulated offset is kept.
    pub fn set_driver(&mut self, driver: OffsetDriver) {
        self.driver = driver;
    }

    /// Offset of the most recent frame.
    #[must_use]
    pub fn current(&self) -> Vec3 {
        self.current
    }

    /// Back to the zero offset.
    pub fn reset(&mut self) {
        self.current = Vec3::ZERO;
    }

    /// Step by `dt` seconds. Returns the new offset when it changed, `None`
    /// when nothing needs regenerating.
    pub fn advance(&mut self, dt: f32, velocity: f32, follow_position: Vec3) -> Option<Vec3> {
        let next = match self.driver {
            OffsetDriver::Fixed => return None,
            OffsetDriver::Velocity => self.current + Vec3::Z * velocity * dt,
            OffsetDriver::Follow { sensitivity } => follow_position * sensitivity,
        };
        if next == self.current || !next.is_finite() {
            return None;
        }
        self.current = next;
        Some(next)
    }
}
