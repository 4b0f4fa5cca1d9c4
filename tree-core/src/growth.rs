//! Generation-by-generation growth of the tree over the mesh surface.
//!
//! The typical run looks like:
//! 1. The initial node is snapped onto the mesh and becomes the root.
//! 2. Generation 1 grows a single trunk from the root along
//!    [`Parameters::initial_direction`].
//! 3. Every later generation visits the tips of the growth front in node-id
//!    order. Each tip either splits into two children deflected to both sides
//!    of its direction, or continues with one slightly jittered child.
//! 4. Every child goes through the [`SurfaceProjector`] and then the
//!    [`CollisionDetector`]. Failed children are re-drawn up to
//!    [`Parameters::max_retries`] times.
//!
//! A tip whose children all fail is terminated; this never aborts the run.

use std::fmt;

use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, trace, warn};

use crate::{
    collision::{Candidate, CollisionDetector, CollisionOutcome, RejectReason},
    config::Parameters,
    error::{ProjectionError, TreeResult},
    geometry::rotate_about_normal,
    mesh::Mesh,
    projector::{Projection, SurfaceProjector},
    spatial_index::SpatialIndex,
    tree::Tree,
    types::{BranchId, NodeId},
};

/// Why a tip stopped growing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Every child failed projection or collision checks on every attempt.
    ExhaustedRetries,
    /// The tip was truncated against another branch and touches it.
    Grazed,
    /// The run reached its generation count while the tip could still grow.
    GenerationLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TipState {
    /// Eligible to grow in the next generation.
    Active,
    /// An attempt failed this generation and the tip is being retried;
    /// `failures` counts the failed attempts over all of its children.
    Blocked { failures: u32 },
    Terminated(Termination),
}

/// A growable end of the tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tip {
    pub node: NodeId,
    /// Unit direction of the segment that created `node`.
    pub direction: Vec3,
    pub state: TipState,
}

impl Tip {
    fn active(node: NodeId, direction: Vec3) -> Self {
        Self {
            node,
            direction,
            state: TipState::Active,
        }
    }
}

/// Counters collected over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthReport {
    /// Generations actually processed.
    pub generations: u32,
    /// Tips still growable when the run stopped.
    pub active_tips: usize,
    /// Tips terminated by exhausted retries or grazing contact.
    pub terminated_tips: usize,
    /// Tip generations that went through [`TipState::Blocked`] at least once.
    pub blocked_tips: usize,
    pub accepted: usize,
    pub truncated: usize,
    pub collisions: usize,
    pub projection_failures: usize,
    /// Children abandoned after every retry failed.
    pub exhausted_candidates: usize,
}

impl fmt::Display for GrowthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "generations          {}", self.generations)?;
        writeln!(f, "active tips          {}", self.active_tips)?;
        writeln!(f, "terminated tips      {}", self.terminated_tips)?;
        writeln!(f, "blocked tips         {}", self.blocked_tips)?;
        writeln!(f, "accepted segments    {}", self.accepted)?;
        writeln!(f, "truncated segments   {}", self.truncated)?;
        writeln!(f, "collisions           {}", self.collisions)?;
        writeln!(f, "projection failures  {}", self.projection_failures)?;
        write!(f, "exhausted candidates {}", self.exhausted_candidates)
    }
}

/// Result of a growth run.
#[derive(Debug, Clone)]
pub struct GrownTree {
    pub output_name: String,
    pub tree: Tree,
    /// Final state of every tip that stopped growing, in the order it stopped.
    pub tips: Vec<Tip>,
    pub report: GrowthReport,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ChildPlan {
    Trunk,
    Continue,
    Split { side: f32 },
}

enum Attempt {
    Grown(Tip),
    Grazed(NodeId),
    Failed,
}

/// Grows a tree from `init_node` over `mesh`.
///
/// Uses [`Parameters::random_seed`] when set, otherwise an OS-seeded generator.
///
/// ### Errors
/// - [`crate::GrowthError::InvalidParameters`] for out-of-range parameters.
/// - [`crate::GrowthError::InvalidMesh`] if the mesh cannot be indexed.
/// - [`crate::GrowthError::SurfaceProjection`] if `init_node` is farther than
///   [`Parameters::initial_length`] from the surface.
pub fn grow(mesh: &Mesh, init_node: Vec3, params: &Parameters) -> TreeResult<GrownTree> {
    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    grow_with_rng(mesh, init_node, params, &mut rng)
}

/// Same as [`grow`], drawing all random decisions from `rng`.
pub fn grow_with_rng(
    mesh: &Mesh,
    init_node: Vec3,
    params: &Parameters,
    rng: &mut impl Rng,
) -> TreeResult<GrownTree> {
    params.validate()?;
    let index = SpatialIndex::new(mesh)?;
    let projector = SurfaceProjector::new(index, params.max_hops, params.surface_tolerance);
    let root = place_root(&projector, init_node, params.initial_length)?;

    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        generations = params.generations,
        "Starting fractal tree growth"
    );

    let mut grower = Grower::new(&projector, params, root);
    let mut front = vec![Tip::active(
        Tree::ROOT,
        params.initial_direction.normalize_or(Vec3::X),
    )];

    for generation in 1..=params.generations {
        if front.is_empty() {
            break;
        }
        front = grower.step_generation(front, generation, rng);
        grower.report.generations = generation;
        debug!(
            generation,
            tips = front.len(),
            nodes = grower.tree.node_count(),
            "Generation complete"
        );
    }

    let Grower {
        tree,
        mut tips,
        mut report,
        ..
    } = grower;

    report.active_tips = front.len();
    tips.extend(front.into_iter().map(|mut tip| {
        tip.state = TipState::Terminated(Termination::GenerationLimit);
        tip
    }));

    if tree.segment_count() == 0 {
        warn!("No segment could be grown from the root");
    }
    info!(
        nodes = tree.node_count(),
        segments = tree.segment_count(),
        active = report.active_tips,
        terminated = report.terminated_tips,
        "Growth finished"
    );

    Ok(GrownTree {
        output_name: params.output_name.clone(),
        tree,
        tips,
        report,
    })
}

/// Snaps the initial node onto the surface.
fn place_root(
    projector: &SurfaceProjector<'_>,
    init_node: Vec3,
    limit: f32,
) -> Result<Projection, ProjectionError> {
    let root = projector.snap(init_node);
    let distance = root.point.distance(init_node);
    if distance > limit {
        return Err(ProjectionError::RootOffSurface { distance, limit });
    }
    Ok(root)
}

/// Mutable state of one run.
struct Grower<'a, 'm> {
    projector: &'a SurfaceProjector<'m>,
    params: &'a Parameters,
    detector: CollisionDetector,
    tree: Tree,
    tips: Vec<Tip>,
    report: GrowthReport,
}

impl<'a, 'm> Grower<'a, 'm> {
    fn new(projector: &'a SurfaceProjector<'m>, params: &'a Parameters, root: Projection) -> Self {
        let cell = params.initial_length.max(params.branch_length);
        Self {
            projector,
            params,
            detector: CollisionDetector::new(
                params.avoidance_distance,
                cell,
                params.allow_truncation,
                params.min_truncation_fraction,
            ),
            tree: Tree::new(root.point, root.triangle),
            tips: Vec::new(),
            report: GrowthReport::default(),
        }
    }

    /// Extends every tip of `front` once and returns the next front.
    fn step_generation(
        &mut self,
        front: Vec<Tip>,
        generation: u32,
        rng: &mut impl Rng,
    ) -> Vec<Tip> {
        let mut next = Vec::with_capacity(front.len() * 2);
        for mut tip in front {
            let plans = self.plan_children(generation, rng);
            let mut created = 0;

            for plan in plans {
                let mut attempt = 0;
                loop {
                    match self.try_child(&tip, plan, attempt, generation, rng) {
                        Attempt::Grown(child) => {
                            next.push(child);
                            created += 1;
                            break;
                        }
                        Attempt::Grazed(node) => {
                            created += 1;
                            self.report.terminated_tips += 1;
                            self.tips.push(Tip {
                                node,
                                direction: tip.direction,
                                state: TipState::Terminated(Termination::Grazed),
                            });
                            break;
                        }
                        Attempt::Failed => {
                            attempt += 1;
                            tip.state = match tip.state {
                                TipState::Blocked { failures } => TipState::Blocked {
                                    failures: failures + 1,
                                },
                                _ => {
                                    self.report.blocked_tips += 1;
                                    TipState::Blocked { failures: 1 }
                                }
                            };
                            if attempt > self.params.max_retries {
                                self.report.exhausted_candidates += 1;
                                break;
                            }
                        }
                    }
                }
            }

            if created == 0 {
                let failures = match tip.state {
                    TipState::Blocked { failures } => failures,
                    _ => 0,
                };
                trace!(node = tip.node, failures, "Tip exhausted its retries");
                tip.state = TipState::Terminated(Termination::ExhaustedRetries);
                self.report.terminated_tips += 1;
                self.tips.push(tip);
            }
        }
        next
    }

    fn plan_children(&self, generation: u32, rng: &mut impl Rng) -> Vec<ChildPlan> {
        if generation == 1 {
            vec![ChildPlan::Trunk]
        } else if rng.random_bool(f64::from(self.params.branching_probability)) {
            vec![ChildPlan::Split { side: 1.0 }, ChildPlan::Split { side: -1.0 }]
        } else {
            vec![ChildPlan::Continue]
        }
    }

    /// Deflection of a child from its parent's direction, in radians.
    fn deflection(&self, plan: ChildPlan, attempt: u32, rng: &mut impl Rng) -> f32 {
        let jitter = self.params.continuation_jitter;
        match plan {
            ChildPlan::Trunk if attempt == 0 => 0.0,
            ChildPlan::Trunk | ChildPlan::Continue => uniform(rng, -jitter, jitter),
            ChildPlan::Split { side } => {
                let (lo, hi) = self.params.branch_angle_range;
                side * uniform(rng, lo, hi)
            }
        }
    }

    fn try_child(
        &mut self,
        tip: &Tip,
        plan: ChildPlan,
        attempt: u32,
        generation: u32,
        rng: &mut impl Rng,
    ) -> Attempt {
        let parent = self.tree.node(tip.node);
        let start = parent.pos;
        let normal = self.projector.normal_at(parent.triangle, start);
        let angle = self.deflection(plan, attempt, rng);
        let step = self.params.step_length(generation);

        let projected = rotate_about_normal(tip.direction, normal, angle)
            .ok_or(ProjectionError::DegenerateDirection)
            .and_then(|dir| self.projector.project(start, dir, step));
        let end = match projected {
            Ok(end) if end.point.distance(start) > step * 1e-3 => end,
            Ok(_) => {
                trace!(node = tip.node, "Projected step collapsed onto its start");
                self.report.projection_failures += 1;
                return Attempt::Failed;
            }
            Err(err) => {
                trace!(node = tip.node, %err, "Projection failed");
                self.report.projection_failures += 1;
                return Attempt::Failed;
            }
        };

        let candidate = Candidate {
            parent: tip.node,
            start,
            end,
        };
        match self.detector.check(&candidate, &self.tree, self.projector) {
            CollisionOutcome::Accepted => {
                let node = self.commit(tip.node, plan, end, generation);
                self.report.accepted += 1;
                let direction = (end.point - start).normalize_or(tip.direction);
                Attempt::Grown(Tip::active(node, direction))
            }
            CollisionOutcome::Truncated { end } => {
                let node = self.commit(tip.node, plan, end, generation);
                self.report.truncated += 1;
                Attempt::Grazed(node)
            }
            CollisionOutcome::Rejected(RejectReason::TooClose { segment, distance }) => {
                trace!(node = tip.node, segment, distance, "Candidate too close");
                self.report.collisions += 1;
                Attempt::Failed
            }
            CollisionOutcome::Rejected(RejectReason::OffSurface { distance }) => {
                trace!(node = tip.node, distance, "Candidate off surface");
                self.report.projection_failures += 1;
                Attempt::Failed
            }
        }
    }

    /// Appends the child node and its segment, and indexes the segment.
    fn commit(
        &mut self,
        parent: NodeId,
        plan: ChildPlan,
        end: Projection,
        generation: u32,
    ) -> NodeId {
        let branch = self.branch_for(parent, plan);
        let node = self
            .tree
            .add_child(parent, end.point, end.triangle, generation, branch);
        self.detector
            .register(&self.tree, self.tree.segment_count() - 1);
        node
    }

    fn branch_for(&mut self, parent: NodeId, plan: ChildPlan) -> BranchId {
        match plan {
            ChildPlan::Continue => match self.tree.incoming_branch(parent) {
                Some(branch) => branch,
                None => self.tree.start_branch(),
            },
            ChildPlan::Trunk | ChildPlan::Split { .. } => self.tree.start_branch(),
        }
    }
}

#[inline]
fn uniform(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}
