use std::f64::consts::PI;

use crate::error::GravityError;
use crate::particle::{G, Particle, ParticleSet, Vec3};

const EPS: f64 = 1e-12;

fn unit_particle(position: [f64; 3]) -> Particle {
    Particle::new(position.into(), Vec3::zeros(), 1.0).unwrap()
}

#[test]
fn radius_is_derived_from_mass() {
    let p = Particle::new(Vec3::zeros(), Vec3::zeros(), 2.5).unwrap();
    let expected = (3.0 * 2.5 / (4.0 * PI)).cbrt();
    assert!((p.radius() - expected).abs() < EPS);
}

#[test]
fn radius_is_rederived_after_merge() {
    let a = unit_particle([0.0, 0.0, 0.0]);
    let b = Particle::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zeros(), 3.0).unwrap();
    let merged = Particle::collide(&a, &b);
    let expected = (3.0 * merged.mass() / (4.0 * PI)).cbrt();
    assert!((merged.radius() - expected).abs() < EPS);
}

#[test]
fn zero_mass_is_rejected() {
    let result = Particle::new(Vec3::zeros(), Vec3::zeros(), 0.0);
    assert_eq!(result, Err(GravityError::NonPositiveMass(0.0)));
}

#[test]
fn negative_mass_is_rejected() {
    let result = Particle::new(Vec3::zeros(), Vec3::zeros(), -1.0);
    assert_eq!(result, Err(GravityError::NonPositiveMass(-1.0)));
}

#[test]
fn default_particle_is_unit_mass_at_origin() {
    let p = Particle::default();
    assert_eq!(p.position(), Vec3::zeros());
    assert_eq!(p.velocity(), Vec3::zeros());
    assert!((p.mass() - 1.0).abs() < EPS);
    assert!((p.radius() - (3.0 / (4.0 * PI)).cbrt()).abs() < EPS);
}

#[test]
fn momentum_is_mass_times_velocity() {
    let p = Particle::new(Vec3::zeros(), Vec3::new(1.0, -2.0, 0.5), 4.0).unwrap();
    assert_eq!(p.momentum(), Vec3::new(4.0, -8.0, 2.0));
}

#[test]
fn step_advances_position_by_velocity() {
    let mut p = Particle::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.5, -1.0, 2.0), 1.0).unwrap();
    p.step();
    assert_eq!(p.position(), Vec3::new(1.5, 0.0, 3.0));
}

#[test]
fn attract_pulls_two_unit_masses_together() {
    let mut a = unit_particle([0.0, 0.0, 0.0]);
    let mut b = unit_particle([1.0, 0.0, 0.0]);
    let a_before = a;
    let b_before = b;
    a.attract(&b_before);
    b.attract(&a_before);

    // Unit separation and unit masses: the impulse magnitude is exactly G.
    assert!((a.velocity().x - G).abs() < EPS);
    assert!((b.velocity().x + G).abs() < EPS);
    assert!(a.velocity().y.abs() < EPS && a.velocity().z.abs() < EPS);
    assert!(b.velocity().y.abs() < EPS && b.velocity().z.abs() < EPS);
}

#[test]
fn attract_scales_with_inverse_square() {
    let mut near = unit_particle([0.0, 0.0, 0.0]);
    let mut far = unit_particle([0.0, 0.0, 0.0]);
    near.attract(&unit_particle([2.0, 0.0, 0.0]));
    far.attract(&unit_particle([4.0, 0.0, 0.0]));
    assert!((near.velocity().x / far.velocity().x - 4.0).abs() < 1e-9);
}

#[test]
fn merge_conserves_mass_and_momentum() {
    let a = Particle::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0), 1.0).unwrap();
    let b = Particle::new(Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, 3.0, 1.0), 3.0).unwrap();
    let merged = Particle::collide(&a, &b);

    assert!((merged.mass() - 4.0).abs() < EPS);
    let p_initial = a.momentum() + b.momentum();
    assert!((merged.momentum() - p_initial).norm() < EPS);
}

#[test]
fn merge_position_is_weighted_toward_the_heavier_particle() {
    let light = Particle::new(Vec3::new(0.0, 0.0, 0.0), Vec3::zeros(), 1.0).unwrap();
    let heavy = Particle::new(Vec3::new(4.0, 0.0, 0.0), Vec3::zeros(), 3.0).unwrap();
    let merged = Particle::collide(&light, &heavy);
    assert!((merged.position().x - 3.0).abs() < EPS);
}

#[test]
fn check_collision_is_symmetric() {
    let a = unit_particle([0.0, 0.0, 0.0]);
    let b = unit_particle([1.0, 0.0, 0.0]);
    assert_eq!(
        Particle::check_collision(&a, &b),
        Particle::check_collision(&b, &a)
    );
}

#[test]
fn overlapping_spheres_collide_and_distant_ones_do_not() {
    // Unit mass gives radius cbrt(3/4pi) ~ 0.62, so spheres at distance 1
    // overlap and spheres at distance 2 do not.
    let a = unit_particle([0.0, 0.0, 0.0]);
    let near = unit_particle([1.0, 0.0, 0.0]);
    let far = unit_particle([2.0, 0.0, 0.0]);
    assert!(Particle::check_collision(&a, &near));
    assert!(!Particle::check_collision(&a, &far));
}

#[test]
fn arena_ids_stay_stable_across_removal() {
    let mut set = ParticleSet::new();
    let a = set.insert(unit_particle([1.0, 0.0, 0.0]));
    let b = set.insert(unit_particle([2.0, 0.0, 0.0]));
    let c = set.insert(unit_particle([3.0, 0.0, 0.0]));

    assert_eq!(set.len(), 3);
    assert!(set.remove(b).is_some());
    assert_eq!(set.len(), 2);
    assert!(!set.contains(b));
    assert_eq!(set.get(a).unwrap().position().x, 1.0);
    assert_eq!(set.get(c).unwrap().position().x, 3.0);

    // Removing an already-removed id is a no-op.
    assert!(set.remove(b).is_none());
    assert_eq!(set.len(), 2);
}

#[test]
fn arena_iteration_visits_live_particles_in_id_order() {
    let mut set = ParticleSet::new();
    let a = set.insert(unit_particle([1.0, 0.0, 0.0]));
    let b = set.insert(unit_particle([2.0, 0.0, 0.0]));
    let c = set.insert(unit_particle([3.0, 0.0, 0.0]));
    set.remove(b);

    let ids = set.ids();
    assert_eq!(ids, vec![a, c]);
}
