use nalgebra as na;

/// Rotation and translation of a parent coordinate frame expressed in world
/// space.
pub type Frame = na::Isometry3<f64>;

const EPSILON: f64 = 1e-12;

/// Builds frame from rotation and translation parts.
pub fn frame(
    rotation: na::UnitQuaternion<f64>,
    translation: na::Vector3<f64>,
) -> Frame {
    na::Isometry3::from_parts(na::Translation3::from(translation), rotation)
}

/// Returns shortest rotation that takes direction of `start` onto direction
/// of `end`.
///
/// Vector lengths are ignored. Opposite directions produce a half-turn
/// around an arbitrary axis orthogonal to `start`.
/// Degenerate (zero-length) input yields identity.
pub fn rotation_between(
    start: &na::Vector3<f64>,
    end: &na::Vector3<f64>,
) -> na::UnitQuaternion<f64> {
    if start.norm_squared() < EPSILON || end.norm_squared() < EPSILON {
        return na::UnitQuaternion::identity();
    }

    match na::UnitQuaternion::rotation_between(start, end) {
        Some(rotation) => rotation,
        None => {
            // Anti-parallel.
            let axis = orthogonal(start);
            na::UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI)
        }
    }
}

/// Returns unit vector orthogonal to non-zero `v`.
fn orthogonal(v: &na::Vector3<f64>) -> na::Unit<na::Vector3<f64>> {
    let abs = v.abs();
    let pick = if abs.x <= abs.y && abs.x <= abs.z {
        na::Vector3::x()
    } else if abs.y <= abs.z {
        na::Vector3::y()
    } else {
        na::Vector3::z()
    };

    na::Unit::new_normalize(v.cross(&pick))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(start: na::Vector3<f64>, end: na::Vector3<f64>) {
        let rotation = rotation_between(&start, &end);
        let rotated = rotation * start.normalize();
        let diff = rotated - end.normalize();
        assert!(
            diff.norm() < 1e-6,
            "{:?} -> {:?} rotated to {:?}",
            start,
            end,
            rotated
        );
    }

    #[test]
    fn aligns_axis_directions_at_any_scale() {
        let axes = [
            na::Vector3::x(),
            -na::Vector3::x(),
            na::Vector3::y(),
            -na::Vector3::y(),
            na::Vector3::z(),
            -na::Vector3::z(),
        ];

        for &scale in &[1.0, 10.0, 0.1] {
            for start in &axes {
                for end in &axes {
                    check(*start, *end * scale);
                }
            }
        }
    }

    #[test]
    fn aligns_arbitrary_directions() {
        check(
            na::Vector3::new(1.0, 2.0, 3.0),
            na::Vector3::new(-3.0, 0.5, 2.0),
        );
        check(
            na::Vector3::new(0.3, -0.2, 0.9),
            na::Vector3::new(-0.3, 0.2, -0.9),
        );
    }

    #[test]
    fn degenerate_input_is_identity() {
        let rotation =
            rotation_between(&na::Vector3::zeros(), &na::Vector3::x());
        assert_eq!(rotation, na::UnitQuaternion::identity());
    }

    #[test]
    fn frame_maps_points() {
        let f = frame(
            na::UnitQuaternion::from_axis_angle(
                &na::Vector3::z_axis(),
                std::f64::consts::FRAC_PI_2,
            ),
            na::Vector3::new(1.0, 0.0, 0.0),
        );

        let p = f.transform_point(&na::Point3::new(1.0, 0.0, 0.0));
        assert!((p - na::Point3::new(1.0, 1.0, 0.0)).norm() < 1e-9);

        let back = f.inverse_transform_point(&p);
        assert!((back - na::Point3::new(1.0, 0.0, 0.0)).norm() < 1e-9);
    }
}
