use crate::{
    error::{Result, StreamError},
    types::Value,
};

/// Integration direction along the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Follow the velocity.
    #[default]
    Forward,
    /// Follow the negated velocity.
    Backward,
}

impl Direction {
    /// `1` for [`Forward`](Direction::Forward), `-1` for [`Backward`](Direction::Backward).
    #[inline]
    pub fn sign(self) -> Value {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Immutable settings for a single streamline trace.
///
/// Build one with the `with_*` methods and hand it to a tracer at construction:
///
/// ```rust,ignore
/// let config = TraceConfig::default()
///     .with_direction(Direction::Backward)
///     .with_step_size(0.05)
///     .with_max_steps(200);
/// let tracer = StreamlineTracer::new(&field, config)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceConfig {
    /// Integration direction. Default: forward.
    pub direction: Direction,
    /// Increment of the integration parameter per step. Default: `0.1`.
    pub step_size: Value,
    /// Upper bound on the number of steps per trace. Default: `50`.
    pub max_steps: usize,
    /// Speeds below this stop the trace at a critical point. Default: `1e-6`.
    pub critical_speed: Value,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Forward,
            step_size: 0.1,
            max_steps: 50,
            critical_speed: 1e-6,
        }
    }
}

impl TraceConfig {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_step_size(mut self, step_size: Value) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_critical_speed(mut self, critical_speed: Value) -> Self {
        self.critical_speed = critical_speed;
        self
    }

    /// Returns [`StreamError::InvalidConfiguration`] if no trace could run with these settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(StreamError::InvalidConfiguration(
                "step size must be positive and finite",
            ));
        }
        if self.max_steps == 0 {
            return Err(StreamError::InvalidConfiguration(
                "max steps must be at least one",
            ));
        }
        if !(self.critical_speed >= 0.0) {
            return Err(StreamError::InvalidConfiguration(
                "critical speed must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Immutable settings for a stream surface trace.
///
/// Front maintenance thresholds are ratios of a reference spacing:
///
/// ```text
/// d_max = max_separation × reference     adjacent streamlines further apart get a new one between them
/// d_min = min_separation × reference     adjacent streamlines closer than this are merged
/// ```
///
/// The reference is [`reference_spacing`](SurfaceConfig::reference_spacing) when set,
/// otherwise the mean distance between adjacent seeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    /// Per-streamline integration settings.
    pub trace: TraceConfig,
    /// Insertion threshold ratio. Default: `2.0`.
    pub max_separation: Value,
    /// Removal threshold ratio. Must be below half of `max_separation`. Default: `0.25`.
    pub min_separation: Value,
    /// Absolute reference spacing. Default: derived from the seeding curve.
    pub reference_spacing: Option<Value>,
    /// Upper bound on streamlines alive or dead in one trace, seeds included. Default: `4096`.
    pub max_streamlines: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            trace: TraceConfig::default(),
            max_separation: 2.0,
            min_separation: 0.25,
            reference_spacing: None,
            max_streamlines: 4096,
        }
    }
}

impl SurfaceConfig {
    pub fn with_trace(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_separation(mut self, min_separation: Value, max_separation: Value) -> Self {
        self.min_separation = min_separation;
        self.max_separation = max_separation;
        self
    }

    pub fn with_reference_spacing(mut self, reference_spacing: Value) -> Self {
        self.reference_spacing = Some(reference_spacing);
        self
    }

    pub fn with_max_streamlines(mut self, max_streamlines: usize) -> Self {
        self.max_streamlines = max_streamlines;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.trace.validate()?;
        if !(self.min_separation > 0.0 && self.max_separation.is_finite()) {
            return Err(StreamError::InvalidConfiguration(
                "separation ratios must be positive and finite",
            ));
        }
        // A gap split in two must not immediately qualify for removal.
        if self.min_separation >= self.max_separation / 2.0 {
            return Err(StreamError::InvalidConfiguration(
                "min separation must be below half of max separation",
            ));
        }
        if let Some(reference) = self.reference_spacing {
            if !(reference.is_finite() && reference > 0.0) {
                return Err(StreamError::InvalidConfiguration(
                    "reference spacing must be positive and finite",
                ));
            }
        }
        if self.max_streamlines == 0 {
            return Err(StreamError::InvalidConfiguration(
                "max streamlines must be at least one",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TraceConfig::default().validate().is_ok());
        assert!(SurfaceConfig::default().validate().is_ok());
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Backward.sign(), -1.0);
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
    }

    #[test]
    fn rejects_bad_trace_settings() {
        for config in [
            TraceConfig::default().with_step_size(0.0),
            TraceConfig::default().with_step_size(-0.1),
            TraceConfig::default().with_step_size(Value::NAN),
            TraceConfig::default().with_max_steps(0),
            TraceConfig::default().with_critical_speed(-1.0),
        ] {
            assert!(matches!(
                config.validate(),
                Err(StreamError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_surface_settings() {
        for config in [
            SurfaceConfig::default().with_separation(0.0, 2.0),
            SurfaceConfig::default().with_separation(1.0, 2.0),
            SurfaceConfig::default().with_reference_spacing(0.0),
            SurfaceConfig::default().with_max_streamlines(0),
            SurfaceConfig::default().with_trace(TraceConfig::default().with_max_steps(0)),
        ] {
            assert!(matches!(
                config.validate(),
                Err(StreamError::InvalidConfiguration(_))
            ));
        }
    }
}
