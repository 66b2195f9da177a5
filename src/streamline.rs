#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use derive_more::Display;
use tracing::{debug, instrument};

use crate::{
    config::TraceConfig,
    error::{Result, StreamError},
    field::VectorField,
    types::{Point, Value, Vector},
};

/// Why a streamline stopped growing. None of these are errors.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The requested number of steps was taken.
    #[display("max steps reached")]
    MaxStepsReached,
    /// The next step would leave the sampled domain.
    #[display("left the domain")]
    OutOfDomain,
    /// The velocity vanished at the current position.
    #[display("critical point")]
    CriticalPoint,
}

/// Result of the single-step primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// The step succeeded and landed here.
    Moved(Point),
    /// The step could not be taken.
    Stopped(Termination),
}

/// An integrated curve: the seed followed by one position per step.
#[derive(Debug, Clone, PartialEq)]
pub struct Streamline {
    pub points: Vec<Point>,
    pub termination: Termination,
}

impl Streamline {
    /// Number of integration steps taken.
    pub fn steps(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn seed(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Length of the polyline.
    pub fn arc_length(&self) -> Value {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

/// Integrates streamlines through a [`VectorField`] with classic fourth-order Runge–Kutta.
///
/// The tracer borrows the field and holds an immutable [`TraceConfig`], so one
/// instance can run any number of traces, including concurrently.
///
/// ```text
/// k1 = s·v(p)
/// k2 = s·v(p + h/2·k1)
/// k3 = s·v(p + h/2·k2)
/// k4 = s·v(p + h·k3)
/// p' = p + h/6·(k1 + 2k2 + 2k3 + k4)        s = ±1 from the direction
/// ```
pub struct StreamlineTracer<'a, F: VectorField + ?Sized> {
    field: &'a F,
    config: TraceConfig,
}

impl<'a, F: VectorField + ?Sized> StreamlineTracer<'a, F> {
    /// Returns [`StreamError::InvalidConfiguration`] if `config` does not validate.
    pub fn new(field: &'a F, config: TraceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { field, config })
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn field(&self) -> &'a F {
        self.field
    }

    /// Directed velocity at `p`, or `None` outside the domain.
    #[inline]
    fn velocity(&self, p: &Point) -> Option<Vector> {
        self.field
            .sample(p)
            .ok()
            .map(|v| v * self.config.direction.sign())
    }

    /// Takes one RK4 step from `position`.
    ///
    /// Stops with [`Termination::CriticalPoint`] when the speed at `position` is
    /// below [`TraceConfig::critical_speed`], and with [`Termination::OutOfDomain`]
    /// when `position`, any intermediate sample, or the landing point lies
    /// outside the field.
    pub fn advance(&self, position: &Point) -> Advance {
        let h = self.config.step_size;
        let p = *position;

        let Some(k1) = self.velocity(&p) else {
            return Advance::Stopped(Termination::OutOfDomain);
        };
        if k1.norm() < self.config.critical_speed {
            return Advance::Stopped(Termination::CriticalPoint);
        }

        let stages = self
            .velocity(&(p + k1 * (h / 2.0)))
            .and_then(|k2| Some((k2, self.velocity(&(p + k2 * (h / 2.0)))?)))
            .and_then(|(k2, k3)| Some((k2, k3, self.velocity(&(p + k3 * h))?)));
        let Some((k2, k3, k4)) = stages else {
            return Advance::Stopped(Termination::OutOfDomain);
        };

        let next = p + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
        if !self.field.contains(&next) {
            return Advance::Stopped(Termination::OutOfDomain);
        }
        Advance::Moved(next)
    }

    /// Traces from `seed` for at most [`TraceConfig::max_steps`] steps.
    pub fn trace(&self, seed: Point) -> Result<Streamline> {
        self.trace_steps(seed, self.config.max_steps)
    }

    /// Traces from `seed` for at most `max_steps` steps.
    ///
    /// Returns the seed plus every position reached, with the reason tracing
    /// stopped. Fails only when `max_steps` is zero or the seed itself lies
    /// outside the field.
    #[instrument(level = "trace", skip(self))]
    pub fn trace_steps(&self, seed: Point, max_steps: usize) -> Result<Streamline> {
        if max_steps == 0 {
            return Err(StreamError::InvalidConfiguration(
                "max steps must be at least one",
            ));
        }
        if !self.field.contains(&seed) {
            return Err(StreamError::OutOfDomain { position: seed });
        }

        let mut points = Vec::with_capacity(max_steps + 1);
        points.push(seed);
        let mut current = seed;

        let termination = loop {
            if points.len() > max_steps {
                break Termination::MaxStepsReached;
            }
            match self.advance(&current) {
                Advance::Moved(next) => {
                    points.push(next);
                    current = next;
                }
                Advance::Stopped(reason) => break reason,
            }
        };

        debug!(steps = points.len() - 1, %termination, "streamline traced");
        Ok(Streamline {
            points,
            termination,
        })
    }

    /// Traces one streamline per seed, in seed order.
    ///
    /// Seeds are independent, so with the `parallel` feature they are traced on
    /// the rayon pool. Fails with the first seed that lies outside the field.
    pub fn trace_many(&self, seeds: &[Point]) -> Result<Vec<Streamline>> {
        #[cfg(feature = "parallel")]
        let traced: Result<Vec<Streamline>> =
            seeds.par_iter().map(|seed| self.trace(*seed)).collect();
        #[cfg(not(feature = "parallel"))]
        let traced: Result<Vec<Streamline>> = seeds.iter().map(|seed| self.trace(*seed)).collect();
        traced
    }
}
