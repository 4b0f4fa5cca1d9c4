use glam::Vec3;

use crate::error::GrowthError;

/// Upper bound accepted for [`Parameters::max_retries`].
pub const MAX_RETRIES_LIMIT: u32 = 1_000;

/// Parameters for one growth run.
///
/// All lengths are in mesh units and all angles in radians.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Parameters {
    /// Name of this run's output artifact. Not used by growth itself.
    pub output_name: String,
    /// Length of the trunk grown from the root in generation 1.
    pub initial_length: f32,
    /// Number of generations to grow.
    pub generations: u32,
    /// Length of every segment after generation 1.
    pub branch_length: f32,
    /// Growth direction of the trunk. Normalised before use.
    pub initial_direction: Vec3,
    /// Probability that a tip splits into two children.
    pub branching_probability: f32,
    /// `(min, max)` deflection of each child of a split from its parent's direction.
    pub branch_angle_range: (f32, f32),
    /// Maximum deflection of an unsplit continuation.
    pub continuation_jitter: f32,
    /// Minimum 3-D separation between segments that share no endpoint.
    pub avoidance_distance: f32,
    /// Re-drawn attempts per child after the first one fails.
    pub max_retries: u32,
    /// Bound on the projector's triangle walk.
    pub max_hops: usize,
    /// How far a projected point may lie from the surface.
    pub surface_tolerance: f32,
    /// Shorten a colliding candidate instead of rejecting it when possible.
    pub allow_truncation: bool,
    /// Shortest truncated segment kept, as a fraction of the full step.
    pub min_truncation_fraction: f32,
    /// Seed for the growth RNG. `None` draws one from the OS.
    pub random_seed: Option<u64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            output_name: "fractal-tree".to_string(),
            initial_length: 0.1,
            generations: 10,
            branch_length: 0.1,
            initial_direction: Vec3::X,
            branching_probability: 1.0,
            branch_angle_range: (0.2, 0.4),
            continuation_jitter: 0.05,
            avoidance_distance: 0.01,
            max_retries: 3,
            max_hops: 8,
            surface_tolerance: 1e-4,
            allow_truncation: true,
            min_truncation_fraction: 0.5,
            random_seed: None,
        }
    }
}

impl Parameters {
    /// Points the trunk from `init_node` towards `second_node`.
    ///
    /// Mirrors giving a second node instead of an explicit direction.
    pub fn aim_at(mut self, init_node: Vec3, second_node: Vec3) -> Self {
        self.initial_direction = second_node - init_node;
        self
    }

    /// Step length used for segments created in `generation`.
    #[inline]
    pub fn step_length(&self, generation: u32) -> f32 {
        if generation <= 1 {
            self.initial_length
        } else {
            self.branch_length
        }
    }

    /// Checks every field against its allowed range.
    ///
    /// ### Errors
    /// [`GrowthError::InvalidParameters`] naming the first offending field.
    pub fn validate(&self) -> Result<(), GrowthError> {
        let invalid = |msg: String| Err(GrowthError::InvalidParameters(msg));

        if !(self.initial_length.is_finite() && self.initial_length > 0.0) {
            return invalid(format!("initial_length must be > 0, got {}", self.initial_length));
        }
        if !(self.branch_length.is_finite() && self.branch_length > 0.0) {
            return invalid(format!("branch_length must be > 0, got {}", self.branch_length));
        }
        if self.generations == 0 {
            return invalid("generations must be >= 1".to_string());
        }
        if self.initial_direction.try_normalize().is_none() {
            return invalid(format!(
                "initial_direction must be a non-zero finite vector, got {}",
                self.initial_direction
            ));
        }
        if !(0.0..=1.0).contains(&self.branching_probability) {
            return invalid(format!(
                "branching_probability must be in [0, 1], got {}",
                self.branching_probability
            ));
        }
        let (lo, hi) = self.branch_angle_range;
        if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi) {
            return invalid(format!(
                "branch_angle_range must satisfy 0 <= min <= max, got ({lo}, {hi})"
            ));
        }
        if !(self.continuation_jitter.is_finite() && self.continuation_jitter >= 0.0) {
            return invalid(format!(
                "continuation_jitter must be >= 0, got {}",
                self.continuation_jitter
            ));
        }
        if !(self.avoidance_distance.is_finite() && self.avoidance_distance >= 0.0) {
            return invalid(format!(
                "avoidance_distance must be >= 0, got {}",
                self.avoidance_distance
            ));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return invalid(format!(
                "max_retries must be <= {MAX_RETRIES_LIMIT}, got {}",
                self.max_retries
            ));
        }
        if self.max_hops == 0 {
            return invalid("max_hops must be >= 1".to_string());
        }
        if !(self.surface_tolerance.is_finite() && self.surface_tolerance > 0.0) {
            return invalid(format!(
                "surface_tolerance must be > 0, got {}",
                self.surface_tolerance
            ));
        }
        if !(self.min_truncation_fraction > 0.0 && self.min_truncation_fraction <= 1.0) {
            return invalid(format!(
                "min_truncation_fraction must be in (0, 1], got {}",
                self.min_truncation_fraction
            ));
        }
        Ok(())
    }
}
