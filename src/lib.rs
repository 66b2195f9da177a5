//! Streamlines and stream surfaces of steady 3D vector fields.
//!
//! A [`VectorField`] is sampled by a [`StreamlineTracer`], which integrates one
//! curve at a time with fourth-order Runge–Kutta. A [`StreamSurfaceTracer`]
//! advances a whole seeding curve in lock-step through the same single-step
//! primitive and triangulates the ribbon it sweeps, splitting wide gaps and
//! merging crowded streamlines as it goes.
//!
//! ```rust,ignore
//! let field = GridField::from_interleaved(dims, origin, spacing, &samples)?;
//!
//! let tracer = StreamlineTracer::new(&field, TraceConfig::default())?;
//! let streamline = tracer.trace(seed)?;
//!
//! let surface = StreamSurfaceTracer::new(&field, SurfaceConfig::default())?;
//! let mesh = surface.trace(&seeding_curve)?;
//! ```

pub mod analytic;
pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod interp;
pub mod mesh;
pub mod streamline;
pub mod surface;
pub mod types;

pub use analytic::AnalyticField;
pub use config::{Direction, SurfaceConfig, TraceConfig};
pub use error::{Result, StreamError};
pub use field::{Bounds, VectorField};
pub use grid::GridField;
pub use mesh::SurfaceMesh;
pub use streamline::{Advance, Streamline, StreamlineTracer, Termination};
pub use surface::{StreamSurfaceTracer, SurfaceStats};
pub use types::{Point, Value, Vector};
