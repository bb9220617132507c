//! Fixed-timestep simulation loop over the particle set and its octree.
//!
//! Each tick runs collide → attract → step and then rebalances the octree so
//! it reflects particles that moved across domain boundaries or were removed
//! by merging. Everything is synchronous and single-threaded; a running tick
//! always completes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Domain;
use crate::error::GravityError;
use crate::octree::Octree;
use crate::particle::{Particle, ParticleSet, Vec3};

/// Initial positions are sampled uniformly per axis in this range.
const POSITION_RANGE: f64 = 100.0;
/// Initial velocities are sampled uniformly per axis in this range.
const VELOCITY_RANGE: f64 = 0.2;
/// Padding around the particle extremes when deriving a tree domain, so the
/// half-open upper bound still contains the outermost particle.
const DOMAIN_MARGIN: f64 = 1.0;

/// One simulation run: the live particle set, its spatial index, and the RNG
/// used for initialization.
pub struct Simulation {
    particles: ParticleSet,
    tree: Option<Octree>,
    rng: StdRng,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            particles: ParticleSet::new(),
            tree: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a simulation with a fixed RNG seed for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: ParticleSet::new(),
            tree: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Read access to the live particle set.
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// The octree built over the live particles, once initialized.
    pub fn tree(&self) -> Option<&Octree> {
        self.tree.as_ref()
    }

    /// Replaces the particle set with `count` unit-mass particles at
    /// uniformly random positions and velocities, then builds the octree.
    ///
    /// Fails with [`GravityError::InvalidCount`] for `count == 0`, leaving
    /// the existing particle set unchanged.
    pub fn init_particles(&mut self, count: usize) -> Result<(), GravityError> {
        if count == 0 {
            return Err(GravityError::InvalidCount(count));
        }
        self.particles.clear();
        for _ in 0..count {
            let position = self.random_vec(POSITION_RANGE);
            let velocity = self.random_vec(VELOCITY_RANGE);
            let particle = Particle::new(position, velocity, 1.0)?;
            self.particles.insert(particle);
        }
        self.tree = Some(Octree::build(&self.particles, self.bounding_domain())?);
        log::info!("Initialized {} particles", count);
        Ok(())
    }

    /// Replaces the particle set with an explicit initial particle list and
    /// builds the octree over it.
    ///
    /// Fails with [`GravityError::InvalidCount`] on an empty list, leaving
    /// the existing particle set unchanged.
    pub fn init_with(&mut self, initial: Vec<Particle>) -> Result<(), GravityError> {
        if initial.is_empty() {
            return Err(GravityError::InvalidCount(0));
        }
        self.particles.clear();
        for particle in initial {
            self.particles.insert(particle);
        }
        self.tree = Some(Octree::build(&self.particles, self.bounding_domain())?);
        log::info!("Initialized {} particles from explicit list", self.particles.len());
        Ok(())
    }

    /// Advances the simulation by `steps` ticks of collide → attract → step,
    /// rebalancing the octree after each tick.
    ///
    /// Fails with [`GravityError::InvalidCount`] for `steps == 0`.
    pub fn run_simulation(&mut self, steps: usize) -> Result<(), GravityError> {
        if steps == 0 {
            return Err(GravityError::InvalidCount(steps));
        }
        for step in 0..steps {
            self.collide_particles()?;
            self.attract_particles();
            self.step_particles();
            self.rebalance_tree()?;
            log::debug!("Step {}: {} particles", step, self.particles.len());
        }
        Ok(())
    }

    /// Applies the pairwise gravitational impulse between every ordered pair
    /// of distinct particles. Direct O(n²) summation; the octree is not
    /// consulted here.
    pub fn attract_particles(&mut self) {
        let ids = self.particles.ids();
        for &one in &ids {
            for &two in &ids {
                if one == two {
                    continue;
                }
                let Some(other) = self.particles.get(two).copied() else {
                    continue;
                };
                if let Some(p) = self.particles.get_mut(one) {
                    p.attract(&other);
                }
            }
        }
    }

    /// Merges every overlapping pair of particles.
    ///
    /// After each merge the scan restarts from the beginning: the merged
    /// particle may overlap particles that were already checked. The first
    /// particle of the pair keeps its id and becomes the merged particle;
    /// the second is removed from the octree and the live set.
    pub fn collide_particles(&mut self) -> Result<(), GravityError> {
        'scan: loop {
            let ids = self.particles.ids();
            for &one in &ids {
                for &two in &ids {
                    if one == two {
                        continue;
                    }
                    let (Some(a), Some(b)) = (self.particles.get(one), self.particles.get(two))
                    else {
                        continue;
                    };
                    if !Particle::check_collision(a, b) {
                        continue;
                    }
                    let merged = Particle::collide(a, b);
                    if let Some(tree) = self.tree.as_mut() {
                        tree.remove_particle(&self.particles, two)?;
                    }
                    self.particles.remove(two);
                    if let Some(survivor) = self.particles.get_mut(one) {
                        *survivor = merged;
                    }
                    log::debug!("Merged two particles, {} remain", self.particles.len());
                    continue 'scan;
                }
            }
            break;
        }
        Ok(())
    }

    /// Advances every particle by one unit timestep.
    pub fn step_particles(&mut self) {
        for (_, particle) in self.particles.iter_mut() {
            particle.step();
        }
    }

    /// Read-only `(position, radius)` view of the live particles, for
    /// rendering or telemetry collaborators.
    pub fn snapshot(&self) -> Vec<(Vec3, f64)> {
        self.particles
            .iter()
            .map(|(_, p)| (p.position(), p.radius()))
            .collect()
    }

    /// Rebalances the octree after a tick. If any particle escaped the root
    /// domain the tree is rebuilt over fresh bounds that cover it.
    fn rebalance_tree(&mut self) -> Result<(), GravityError> {
        let Some(tree) = self.tree.as_mut() else {
            return Ok(());
        };
        let evicted = tree.rebalance(&self.particles)?;
        if !evicted.is_empty() {
            log::debug!(
                "{} particles left the root domain, rebuilding tree",
                evicted.len()
            );
            self.tree = Some(Octree::build(&self.particles, self.bounding_domain())?);
        }
        Ok(())
    }

    /// Domain spanning the componentwise extremes of the live particles,
    /// padded by [`DOMAIN_MARGIN`].
    fn bounding_domain(&self) -> Domain {
        let mut min = Vec3::repeat(f64::INFINITY);
        let mut max = Vec3::repeat(f64::NEG_INFINITY);
        for (_, p) in self.particles.iter() {
            min = min.inf(&p.position());
            max = max.sup(&p.position());
        }
        Domain::new(
            min - Vec3::repeat(DOMAIN_MARGIN),
            max + Vec3::repeat(DOMAIN_MARGIN),
        )
    }

    fn random_vec(&mut self, range: f64) -> Vec3 {
        Vec3::new(
            self.rng.random_range(-range..range),
            self.rng.random_range(-range..range),
            self.rng.random_range(-range..range),
        )
    }
}
