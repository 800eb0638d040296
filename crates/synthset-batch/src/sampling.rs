use std::f64::consts::{FRAC_PI_2, PI};

use rand::{rngs::StdRng, Rng, SeedableRng};
use synthset_linalg::{
    compose_rt, mat34_to_mat4, transforms::look_at_rotation, LinalgError, Mat4, Vec3,
};

use crate::config::ConfigError;

/// Convert spherical coordinates to a point, `inclination` measured from `+Z`.
pub fn spherical_to_cartesian(radius: f64, inclination: f64, azimuth: f64) -> Vec3 {
    [
        radius * inclination.sin() * azimuth.cos(),
        radius * inclination.sin() * azimuth.sin(),
        radius * inclination.cos(),
    ]
}

/// Inclination bands on the upper hemisphere.
///
/// The bands start at `start` and advance by `step` while below `stop`. Views
/// fill the bands in order with the same number of views per band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereBands {
    start: f64,
    stop: f64,
    step: f64,
    radius: f64,
}

impl HemisphereBands {
    /// Check `0 <= start < stop <= pi/2` and `step > 0`.
    pub fn new(start: f64, stop: f64, step: f64, radius: f64) -> Result<Self, ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: format!("placement.{field}"),
            reason: reason.to_string(),
        };
        if !(0.0..FRAC_PI_2).contains(&start) {
            return Err(invalid("inclination_start", "must lie in [0, pi/2)"));
        }
        if !(stop > 0.0 && stop <= FRAC_PI_2) {
            return Err(invalid("inclination_stop", "must lie in (0, pi/2]"));
        }
        if start >= stop {
            return Err(invalid(
                "inclination_start",
                "must be below inclination_stop",
            ));
        }
        if !(step > 0.0) {
            return Err(invalid("inclination_step", "must be positive"));
        }
        Ok(Self {
            start,
            stop,
            step,
            radius,
        })
    }

    /// The number of bands, counting the band at `start`.
    pub fn num_bands(&self) -> usize {
        ((self.stop - self.start) / self.step).ceil() as usize
    }

    /// The `(inclination, azimuth)` of view `index` out of `count`.
    ///
    /// # Errors
    ///
    /// `index` must be below `count`.
    pub fn angles(&self, index: u32, count: u32) -> Result<(f64, f64), ConfigError> {
        if index >= count {
            return Err(ConfigError::InvalidValue {
                field: "num_views".to_string(),
                reason: format!("view {index} out of {count}"),
            });
        }
        let n_bands = self.num_bands().max(1);
        let per_band = (count as usize).div_ceil(n_bands);
        let band = index as usize / per_band;
        let inclination = self.start + self.step * band as f64;
        let azimuth = 2.0 * PI * (index as f64 + 1.0) / per_band as f64;
        Ok((inclination, azimuth))
    }

    /// The location of view `index` out of `count`.
    pub fn location(&self, index: u32, count: u32) -> Result<Vec3, ConfigError> {
        let (inclination, azimuth) = self.angles(index, count)?;
        Ok(spherical_to_cartesian(self.radius, inclination, azimuth))
    }
}

/// A resolved camera placement strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Uniform random inclination in `[0, pi/2]` and azimuth in `[0, 2pi)`.
    Random {
        /// The sphere radius.
        radius: f64,
        /// Seed for reproducible locations.
        seed: Option<u64>,
    },
    /// Inclination bands.
    Hemisphere(HemisphereBands),
}

/// Produces the camera location of each view.
pub struct CameraSampler {
    placement: Placement,
    rng: StdRng,
}

impl CameraSampler {
    /// Create a sampler, seeding the rng from the placement or from entropy.
    pub fn new(placement: Placement) -> Self {
        let rng = match placement {
            Placement::Random {
                seed: Some(seed), ..
            } => StdRng::seed_from_u64(seed),
            _ => StdRng::from_rng(&mut rand::rng()),
        };
        Self { placement, rng }
    }

    /// The location of view `index` out of `count`.
    pub fn location(&mut self, index: u32, count: u32) -> Result<Vec3, ConfigError> {
        match self.placement {
            Placement::Random { radius, .. } => {
                let azimuth = self.rng.random_range(0.0..2.0 * PI);
                let inclination = self.rng.random_range(0.0..=FRAC_PI_2);
                Ok(spherical_to_cartesian(radius, inclination, azimuth))
            }
            Placement::Hemisphere(bands) => bands.location(index, count),
        }
    }
}

/// The world matrix of a host camera at `location` looking at the origin.
///
/// The camera looks along its local `-Z` with `Y` up.
pub fn look_at_origin(location: &Vec3) -> Result<Mat4, LinalgError> {
    let rotation = look_at_rotation(&[-location[0], -location[1], -location[2]])?;
    Ok(mat34_to_mat4(&compose_rt(&rotation, location)))
}
