#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument, trace};

use crate::{
    config::SurfaceConfig,
    error::{Result, StreamError},
    field::VectorField,
    interp::interpolate_points,
    mesh::SurfaceMesh,
    streamline::{Advance, StreamlineTracer, Termination},
    types::{Point, Value},
};

/// Lifecycle of one streamline in the front.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    /// Still integrating.
    Active,
    /// Stopped by the field; stays in the front as a gap in the ribbon.
    Terminated(Termination),
    /// Folded into a neighbour and removed from the front.
    Merged,
}

/// Arena entry for a streamline of the surface.
#[derive(Debug, Clone)]
struct FrontState {
    position: Point,
    /// Vertex of `position`.
    vertex: usize,
    /// Vertex this streamline held before the current row, if it moved this row.
    previous_vertex: Option<usize>,
    status: Status,
}

/// The advancing front: an arena of streamline states indexed by a stable id,
/// plus the ordered ids that currently make up the front.
///
/// Merged states leave `order`; terminated states stay in it so that their
/// neighbours are never stitched across them.
struct Front {
    states: Vec<FrontState>,
    order: Vec<usize>,
    mesh: SurfaceMesh,
    inserted: usize,
    merged: usize,
    terminated: usize,
}

impl Front {
    /// One state per seed, in seeding-curve order. Seeds become the first row
    /// of vertices.
    fn seed<F: VectorField + ?Sized>(field: &F, seeds: &[Point]) -> Self {
        let mut mesh = SurfaceMesh::new_empty();
        let mut terminated = 0;
        let states: Vec<FrontState> = seeds
            .iter()
            .map(|seed| {
                let status = if field.contains(seed) {
                    Status::Active
                } else {
                    terminated += 1;
                    Status::Terminated(Termination::OutOfDomain)
                };
                FrontState {
                    position: *seed,
                    vertex: mesh.push_vertex(*seed),
                    previous_vertex: None,
                    status,
                }
            })
            .collect();

        Self {
            order: (0..states.len()).collect(),
            states,
            mesh,
            inserted: 0,
            merged: 0,
            terminated,
        }
    }

    #[inline]
    fn is_active(&self, id: usize) -> bool {
        self.states[id].status == Status::Active
    }

    fn has_active(&self) -> bool {
        self.order.iter().any(|&id| self.is_active(id))
    }

    fn gap(&self, left: usize, right: usize) -> Value {
        (self.states[right].position - self.states[left].position).norm()
    }

    /// Advances every active streamline by one step and appends the new row of
    /// vertices in front order.
    ///
    /// Steps are independent of each other; all of them finish before any
    /// state or the mesh is touched.
    fn advance<F: VectorField + ?Sized>(&mut self, tracer: &StreamlineTracer<'_, F>) {
        let active: Vec<(usize, Point)> = self
            .order
            .iter()
            .filter(|&&id| self.is_active(id))
            .map(|&id| (id, self.states[id].position))
            .collect();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Advance> = active.par_iter().map(|(_, p)| tracer.advance(p)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Advance> = active.iter().map(|(_, p)| tracer.advance(p)).collect();

        for &id in &self.order {
            self.states[id].previous_vertex = None;
        }

        for ((id, _), outcome) in active.iter().zip(outcomes) {
            let state = &mut self.states[*id];
            match outcome {
                Advance::Moved(p) => {
                    state.previous_vertex = Some(state.vertex);
                    state.vertex = self.mesh.push_vertex(p);
                    state.position = p;
                }
                Advance::Stopped(reason) => {
                    trace!(id, %reason, position = %state.position, "streamline terminated");
                    state.status = Status::Terminated(reason);
                    self.terminated += 1;
                }
            }
        }
    }

    /// Emits two triangles for every adjacent pair that moved this row.
    fn stitch(&mut self) -> Result<()> {
        for pair in self.order.windows(2) {
            let (left, right) = (&self.states[pair[0]], &self.states[pair[1]]);
            let (Some(lp), Some(rp)) = (left.previous_vertex, right.previous_vertex) else {
                continue;
            };
            for [a, b, c] in self.mesh.split_quad(lp, rp, left.vertex, right.vertex) {
                self.mesh.triangle_from_verts(a, b, c)?;
            }
        }
        Ok(())
    }

    /// Splices a streamline seeded halfway between `left` and `right`.
    ///
    /// Its vertex joins the current row but it only contributes triangles once
    /// it has moved.
    fn insert_between(&mut self, left: usize, right: usize) -> usize {
        let position = interpolate_points(
            &self.states[left].position,
            &self.states[right].position,
            0.5,
        );
        let id = self.states.len();
        self.states.push(FrontState {
            position,
            vertex: self.mesh.push_vertex(position),
            previous_vertex: None,
            status: Status::Active,
        });
        self.inserted += 1;
        trace!(id, left, right, %position, "streamline inserted");
        id
    }

    /// Retires `victim` and closes the hole it leaves between its neighbours.
    fn merge(&mut self, victim: usize, left: Option<usize>, right: Option<usize>) -> Result<()> {
        self.states[victim].status = Status::Merged;
        self.merged += 1;
        trace!(id = victim, ?left, ?right, "streamline merged");

        if let (Some(l), Some(r)) = (left, right) {
            if self.is_active(l) && self.is_active(r) {
                self.mesh.triangle_from_verts(
                    self.states[l].vertex,
                    self.states[victim].vertex,
                    self.states[r].vertex,
                )?;
            }
        }
        Ok(())
    }

    /// Rebuilds the front after a row: splits gaps wider than `d_max` and merges
    /// neighbours closer than `d_min`.
    ///
    /// Of a pair that is too close the right member is dropped, unless it ends
    /// the front, in which case the left one goes.
    fn rewire(&mut self, d_min: Value, d_max: Value, max_streamlines: usize) -> Result<()> {
        let order = std::mem::take(&mut self.order);
        let mut next: Vec<usize> = Vec::with_capacity(order.len() + order.len() / 2);

        for (i, &id) in order.iter().enumerate() {
            if let Some(&left) = next.last() {
                if self.is_active(left) && self.is_active(id) {
                    let gap = self.gap(left, id);
                    if gap < d_min {
                        if let Some(&right) = order.get(i + 1) {
                            self.merge(id, Some(left), Some(right))?;
                            continue;
                        }
                        next.pop();
                        self.merge(left, next.last().copied(), Some(id))?;
                    } else if gap > d_max && self.states.len() < max_streamlines {
                        next.push(self.insert_between(left, id));
                    }
                }
            }
            next.push(id);
        }

        self.order = next;
        Ok(())
    }
}

/// Traces a stream surface from a seeding curve with an advancing front.
///
/// Every row, each active streamline takes one RK4 step through the shared
/// [`StreamlineTracer::advance`] primitive, the band between the previous and
/// the new row is triangulated, and the front is rewired:
///
/// ```text
/// row i+1   o----o----o--x--o----o        x = inserted (gap > d_max)
///           |\   |  / |      \   |
///           | \  | /  |       \  |        merged streamlines close their hole
/// row i     o----o----o--------o-o        with one extra triangle
/// ```
///
/// A streamline that leaves the domain or reaches a critical point stops,
/// leaving an open boundary; the rest of the surface keeps growing.
pub struct StreamSurfaceTracer<'a, F: VectorField + ?Sized> {
    streamlines: StreamlineTracer<'a, F>,
    config: SurfaceConfig,
}

/// Summary of a finished surface trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceStats {
    /// Rows advanced, not counting the seed row.
    pub rows: usize,
    /// Streamlines spliced into the front.
    pub inserted: usize,
    /// Streamlines removed for crowding.
    pub merged: usize,
    /// Streamlines stopped by the field, seeds outside the domain included.
    pub terminated: usize,
}

impl<'a, F: VectorField + ?Sized> StreamSurfaceTracer<'a, F> {
    /// Returns [`StreamError::InvalidConfiguration`] if `config` does not validate.
    pub fn new(field: &'a F, config: SurfaceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            streamlines: StreamlineTracer::new(field, config.trace)?,
            config,
        })
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Traces for at most `config.trace.max_steps` rows.
    pub fn trace(&self, seeding_curve: &[Point]) -> Result<SurfaceMesh> {
        self.trace_steps(seeding_curve, self.config.trace.max_steps)
    }

    /// Traces for at most `max_steps` rows.
    pub fn trace_steps(&self, seeding_curve: &[Point], max_steps: usize) -> Result<SurfaceMesh> {
        self.trace_with_stats(seeding_curve, max_steps)
            .map(|(mesh, _)| mesh)
    }

    /// Like [`trace_steps`](Self::trace_steps), also reporting how the front evolved.
    #[instrument(level = "debug", skip(self, seeding_curve), fields(seeds = seeding_curve.len()))]
    pub fn trace_with_stats(
        &self,
        seeding_curve: &[Point],
        max_steps: usize,
    ) -> Result<(SurfaceMesh, SurfaceStats)> {
        if seeding_curve.is_empty() {
            return Err(StreamError::InvalidConfiguration("seeding curve is empty"));
        }
        if max_steps == 0 {
            return Err(StreamError::InvalidConfiguration(
                "max steps must be at least one",
            ));
        }
        if seeding_curve.len() > self.config.max_streamlines {
            return Err(StreamError::InvalidConfiguration(
                "seeding curve has more points than max streamlines",
            ));
        }

        let reference = match self.config.reference_spacing {
            Some(reference) => reference,
            None => mean_spacing(seeding_curve)?,
        };
        let d_max = self.config.max_separation * reference;
        let d_min = self.config.min_separation * reference;

        let mut front = Front::seed(self.streamlines.field(), seeding_curve);
        let mut rows = 0;
        while rows < max_steps && front.has_active() {
            front.advance(&self.streamlines);
            front.stitch()?;
            front.rewire(d_min, d_max, self.config.max_streamlines)?;
            rows += 1;
        }

        let stats = SurfaceStats {
            rows,
            inserted: front.inserted,
            merged: front.merged,
            terminated: front.terminated,
        };
        debug!(
            rows,
            vertices = front.mesh.vertices.len(),
            faces = front.mesh.faces.len(),
            inserted = stats.inserted,
            merged = stats.merged,
            terminated = stats.terminated,
            "stream surface traced"
        );
        Ok((front.mesh, stats))
    }
}

/// Mean distance between consecutive seeds. Zero for a single seed.
fn mean_spacing(seeds: &[Point]) -> Result<Value> {
    if seeds.len() < 2 {
        return Ok(0.0);
    }
    let total: Value = seeds.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    let mean = total / (seeds.len() - 1) as Value;
    if !(mean.is_finite() && mean > 0.0) {
        return Err(StreamError::InvalidConfiguration(
            "seeding curve has zero length",
        ));
    }
    Ok(mean)
}
