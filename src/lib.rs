pub mod domain;
pub mod error;
pub mod octree;
pub mod particle;
pub mod simulation;

pub use domain::Domain;
pub use error::GravityError;
pub use octree::Octree;
pub use particle::{G, Particle, ParticleId, ParticleSet, Vec3};
pub use simulation::Simulation;

#[cfg(test)]
mod domain_test;
#[cfg(test)]
mod particle_test;
