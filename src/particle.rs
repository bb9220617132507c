//! Point masses and the arena that owns them.
//!
//! Particles carry position, velocity, mass, and a radius derived from the
//! mass under a unit-density sphere model. They live in a [`ParticleSet`]
//! slot arena and are referred to everywhere else (in particular by the
//! octree) through stable [`ParticleId`]s, so removing one particle never
//! invalidates references to the others.

use nalgebra::Vector3;

use crate::error::GravityError;

/// 3D vector used throughout the simulation.
///
/// Zero-length vectors have no unit direction; `normalize` on them produces
/// NaN components and callers must guard.
pub type Vec3 = Vector3<f64>;

/// Newtonian gravitational constant.
pub const G: f64 = 6.674e-11;

/// A point mass with a position, velocity, and derived radius.
///
/// The mass is strictly positive for the whole lifetime of the particle; the
/// radius is always `cbrt(3·mass / 4π)` (the radius of a unit-density sphere
/// of that mass) and is recomputed whenever the mass changes. It is never an
/// independent field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    position: Vec3,
    velocity: Vec3,
    mass: f64,
    radius: f64,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            mass: 1.0,
            radius: radius_from_mass(1.0),
        }
    }
}

impl Particle {
    /// Creates a particle, rejecting non-positive mass.
    pub fn new(position: Vec3, velocity: Vec3, mass: f64) -> Result<Self, GravityError> {
        if mass <= 0.0 {
            return Err(GravityError::NonPositiveMass(mass));
        }
        Ok(Self {
            position,
            velocity,
            mass,
            radius: radius_from_mass(mass),
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }

    /// Advances the position by one unit timestep (explicit Euler).
    pub fn step(&mut self) {
        self.position += self.velocity;
    }

    /// Accumulates the gravitational impulse from `other` onto this
    /// particle's velocity.
    ///
    /// The separation vector is left unnormalized, so the `r³` divisor both
    /// normalizes the direction and applies the inverse-square magnitude.
    /// Calling this with a particle at the same position divides by zero and
    /// produces NaN; callers must never attract a particle to itself.
    pub fn attract(&mut self, other: &Particle) {
        let dist = other.position - self.position;
        let r = dist.norm();
        let r_cubed = r * r * r;
        self.velocity += dist * (G * other.mass / r_cubed);
    }

    /// Merges two particles into one, conserving mass and momentum.
    ///
    /// The merged position sits on the segment between the two inputs,
    /// weighted toward the heavier one. The inputs are conceptually
    /// destroyed; the caller removes the absorbed particle from the live set
    /// and the octree.
    pub fn collide(one: &Particle, two: &Particle) -> Particle {
        let mass = one.mass + two.mass;
        let position = one.position + (two.position - one.position) * (two.mass / mass);
        let velocity = (one.momentum() + two.momentum()) / mass;
        Particle {
            position,
            velocity,
            mass,
            radius: radius_from_mass(mass),
        }
    }

    /// Bounding-sphere overlap test. Symmetric in its arguments.
    pub fn check_collision(one: &Particle, two: &Particle) -> bool {
        let dist = (one.position - two.position).norm();
        dist <= one.radius + two.radius
    }
}

/// Radius of a unit-density sphere with the given mass.
fn radius_from_mass(mass: f64) -> f64 {
    (3.0 * mass / (4.0 * std::f64::consts::PI)).cbrt()
}

/// Stable identifier of a particle in a [`ParticleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleId(u32);

impl ParticleId {
    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "ParticleId overflow");
        ParticleId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slot arena holding the live particle set.
///
/// Ids are stable: removing a particle leaves a hole rather than shifting the
/// others, so ids held by the octree stay valid for the particles that
/// survive. Iteration visits live particles in id order.
#[derive(Debug, Default, Clone)]
pub struct ParticleSet {
    slots: Vec<Option<Particle>>,
    len: usize,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a particle and returns its id. Slots are never reused, so ids
    /// are unique over the lifetime of the set.
    pub fn insert(&mut self, particle: Particle) -> ParticleId {
        let id = ParticleId::new(self.slots.len());
        self.slots.push(Some(particle));
        self.len += 1;
        id
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    /// Removes a particle, returning it if it was live.
    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let removed = self.slots.get_mut(id.index()).and_then(|s| s.take());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of all live particles, in id order.
    pub fn ids(&self) -> Vec<ParticleId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|p| (ParticleId::new(i), p)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ParticleId, &mut Particle)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|p| (ParticleId::new(i), p)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }
}
