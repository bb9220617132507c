use crate::domain::Domain;
use crate::error::GravityError;
use crate::particle::Vec3;

fn unit_cube() -> Domain {
    Domain::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0))
}

#[test]
fn construction_is_order_independent() {
    let a = Domain::new(Vec3::new(-1.0, 5.0, 0.0), Vec3::new(1.0, -5.0, 2.0));
    let b = Domain::new(Vec3::new(1.0, -5.0, 2.0), Vec3::new(-1.0, 5.0, 0.0));
    assert_eq!(a, b);
    assert_eq!(a.min(), Vec3::new(-1.0, -5.0, 0.0));
    assert_eq!(a.max(), Vec3::new(1.0, 5.0, 2.0));
}

#[test]
fn contains_is_half_open() {
    let d = unit_cube();
    assert!(d.contains(Vec3::zeros()));
    assert!(d.contains(Vec3::new(1.999, 1.999, 1.999)));
    assert!(!d.contains(Vec3::new(2.0, 1.0, 1.0)));
    assert!(!d.contains(Vec3::new(1.0, 2.0, 1.0)));
    assert!(!d.contains(Vec3::new(1.0, 1.0, 2.0)));
    assert!(!d.contains(Vec3::new(-0.001, 1.0, 1.0)));
}

#[test]
fn octant_index_encodes_z_y_x_most_to_least_significant() {
    // Midpoint of the unit cube is (1, 1, 1); 0.5 is the lower half and 1.5
    // the upper half on each axis.
    let d = unit_cube();
    assert_eq!(d.octant_index(Vec3::new(1.5, 1.5, 1.5)), 0);
    assert_eq!(d.octant_index(Vec3::new(0.5, 1.5, 1.5)), 1);
    assert_eq!(d.octant_index(Vec3::new(1.5, 0.5, 1.5)), 2);
    assert_eq!(d.octant_index(Vec3::new(0.5, 0.5, 1.5)), 3);
    assert_eq!(d.octant_index(Vec3::new(1.5, 1.5, 0.5)), 4);
    assert_eq!(d.octant_index(Vec3::new(0.5, 1.5, 0.5)), 5);
    assert_eq!(d.octant_index(Vec3::new(1.5, 0.5, 0.5)), 6);
    assert_eq!(d.octant_index(Vec3::new(0.5, 0.5, 0.5)), 7);
}

#[test]
fn midpoint_classifies_as_upper_half() {
    let d = unit_cube();
    assert_eq!(d.octant_index(Vec3::new(1.0, 1.0, 1.0)), 0);
}

#[test]
fn octant_domain_rejects_out_of_range_index() {
    let d = unit_cube();
    assert_eq!(d.octant_domain(8), Err(GravityError::InvalidOctant(8)));
}

#[test]
fn octant_domain_spans_midpoint_to_outer_corner() {
    let d = unit_cube();
    let upper = d.octant_domain(0).unwrap();
    assert_eq!(upper.min(), Vec3::new(1.0, 1.0, 1.0));
    assert_eq!(upper.max(), Vec3::new(2.0, 2.0, 2.0));

    let lower = d.octant_domain(7).unwrap();
    assert_eq!(lower.min(), Vec3::zeros());
    assert_eq!(lower.max(), Vec3::new(1.0, 1.0, 1.0));
}

#[test]
fn octant_domain_inverts_octant_index() {
    let d = unit_cube();
    let samples = [
        Vec3::new(1.5, 1.5, 1.5),
        Vec3::new(0.5, 1.5, 1.5),
        Vec3::new(1.5, 0.5, 1.5),
        Vec3::new(0.5, 0.5, 1.5),
        Vec3::new(1.5, 1.5, 0.5),
        Vec3::new(0.5, 1.5, 0.5),
        Vec3::new(1.5, 0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(0.1, 1.9, 1.1),
    ];
    for pos in samples {
        let sub = d.octant_domain(d.octant_index(pos)).unwrap();
        assert!(sub.contains(pos), "octant domain must contain {:?}", pos);
    }
}
