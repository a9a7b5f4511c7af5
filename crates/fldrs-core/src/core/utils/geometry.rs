use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Unit, UnitQuaternion, Vector3};
use thiserror::Error;

const DEGENERATE_LENGTH: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Degenerate geometry: zero-length vector while computing {context}")]
    DegenerateVector { context: &'static str },

    #[error("Superposition requires at least 3 paired points, but found {found}")]
    InsufficientPoints { found: usize },

    #[error("Point sets differ in size: {from} vs {to}")]
    MismatchedPointSets { from: usize, to: usize },

    #[error("Singular value decomposition did not produce both singular vector sets")]
    SvdFailed,
}

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

fn unit(vector: Vector3<f64>, context: &'static str) -> Result<Vector3<f64>, GeometryError> {
    let norm = vector.norm();
    if norm < DEGENERATE_LENGTH {
        return Err(GeometryError::DegenerateVector { context });
    }
    Ok(vector / norm)
}

/// Angle `a`-`vertex`-`c` in radians.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateVector`] if `a` or `c` coincides with `vertex`.
pub fn bond_angle(a: &Point3<f64>, vertex: &Point3<f64>, c: &Point3<f64>) -> Result<f64, GeometryError> {
    let u = unit(a - vertex, "bond angle")?;
    let v = unit(c - vertex, "bond angle")?;
    Ok(u.dot(&v).clamp(-1.0, 1.0).acos())
}

/// Unit normal of the plane through `a`, `b` and `c`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateVector`] when the points are coincident
/// or collinear.
pub fn plane_normal(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Result<Vector3<f64>, GeometryError> {
    unit((b - a).cross(&(c - a)), "plane normal")
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Least-squares rotation taking the centered `from` set onto the centered `to` set
/// (orthogonal Procrustes / Kabsch).
///
/// The rotation is forced to be proper: when the singular vectors would produce a
/// reflection, the last singular direction is negated.
pub fn superposition_rotation(
    from: &[Point3<f64>],
    to: &[Point3<f64>],
) -> Result<Rotation3<f64>, GeometryError> {
    if from.len() != to.len() {
        return Err(GeometryError::MismatchedPointSets {
            from: from.len(),
            to: to.len(),
        });
    }
    let (Some(from_centroid), Some(to_centroid)) = (centroid(from), centroid(to)) else {
        return Err(GeometryError::InsufficientPoints { found: 0 });
    };
    if from.len() < 3 {
        return Err(GeometryError::InsufficientPoints { found: from.len() });
    }

    let covariance = from
        .iter()
        .zip(to.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = covariance.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(GeometryError::SvdFailed);
    };

    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    Ok(Rotation3::from_matrix_unchecked(u * correction * v_t))
}

/// Rigid rotation by `angle` radians about the axis through `origin` pointing
/// towards `towards`.
pub fn rotation_about_axis(
    origin: &Point3<f64>,
    towards: &Point3<f64>,
    angle: f64,
) -> Result<Isometry3<f64>, GeometryError> {
    let axis = Unit::new_unchecked(unit(towards - origin, "rotation axis")?);
    let rotation = UnitQuaternion::from_axis_angle(&axis, angle);
    Ok(Isometry3::rotation_wrt_point(rotation, *origin))
}

/// Places a substituent of `center` on the external bisector of the angle
/// `a`-`center`-`b`, at `length` Angstroms from `center`.
///
/// This is the planar construction used for carbonyl oxygens (bisector of
/// CA-C-N) and amide hydrogens (bisector of C-N-CA).
pub fn external_bisector_position(
    center: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    length: f64,
) -> Result<Point3<f64>, GeometryError> {
    let u = unit(a - center, "bisector arm")?;
    let v = unit(b - center, "bisector arm")?;
    let direction = unit(-(u + v), "bisector direction")?;
    Ok(center + direction * length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOLERANCE: f64 = 1e-9;

    fn points_close(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> bool {
        (a - b).norm() < tolerance
    }

    #[test]
    fn distance_is_euclidean() {
        let d = distance(&Point3::new(0.0, 0.0, 0.0), &Point3::new(3.0, 4.0, 0.0));
        assert!((d - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn bond_angle_of_right_angle() {
        let angle = bond_angle(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(0.0, 2.0, 0.0),
        )
        .unwrap();
        assert!((angle - FRAC_PI_2).abs() < TOLERANCE);
    }

    #[test]
    fn bond_angle_of_straight_line_is_pi() {
        let angle = bond_angle(
            &Point3::new(-1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert!((angle - PI).abs() < TOLERANCE);
    }

    #[test]
    fn bond_angle_rejects_coincident_points() {
        let result = bond_angle(&Point3::origin(), &Point3::origin(), &Point3::new(1.0, 0.0, 0.0));
        assert!(matches!(result, Err(GeometryError::DegenerateVector { .. })));
    }

    #[test]
    fn plane_normal_requires_three_distinct_directions() {
        let normal = plane_normal(
            &Point3::origin(),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(0.0, 3.0, 0.0),
        )
        .unwrap();
        assert!((normal - Vector3::z()).norm() < TOLERANCE);

        let collinear = plane_normal(
            &Point3::origin(),
            &Point3::new(1.0, 1.0, 1.0),
            &Point3::new(2.0, 2.0, 2.0),
        );
        assert!(matches!(collinear, Err(GeometryError::DegenerateVector { .. })));
    }

    #[test]
    fn centroid_of_empty_set_is_none() {
        assert!(centroid(&[]).is_none());
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)]).unwrap();
        assert_eq!(c, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn superposition_recovers_known_rotation() {
        let from = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.9, 1.4, 0.0),
            Point3::new(0.3, 0.8, 1.1),
        ];
        let known = Rotation3::from_euler_angles(0.3, -1.1, 2.0);
        let to: Vec<_> = from
            .iter()
            .map(|p| known * p + Vector3::new(4.0, -2.0, 7.0))
            .collect();

        let rotation = superposition_rotation(&from, &to).unwrap();

        assert!((rotation.matrix() - known.matrix()).norm() < 1e-9);
        let angle = UnitQuaternion::from_rotation_matrix(&rotation).angle();
        assert!((angle - UnitQuaternion::from_rotation_matrix(&known).angle()).abs() < 1e-6);
    }

    #[test]
    fn superposition_never_returns_a_reflection() {
        let from = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let mirrored: Vec<_> = from.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();

        let rotation = superposition_rotation(&from, &mirrored).unwrap();

        assert!((rotation.matrix().determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn superposition_rejects_bad_inputs() {
        let two = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            superposition_rotation(&two, &two),
            Err(GeometryError::InsufficientPoints { found: 2 })
        );
        assert_eq!(
            superposition_rotation(&two, &two[..1]),
            Err(GeometryError::MismatchedPointSets { from: 2, to: 1 })
        );
        assert_eq!(
            superposition_rotation(&[], &[]),
            Err(GeometryError::InsufficientPoints { found: 0 })
        );
    }

    #[test]
    fn rotation_about_axis_keeps_axis_points_fixed() {
        let origin = Point3::new(1.0, 1.0, 0.0);
        let towards = Point3::new(1.0, 1.0, 5.0);
        let iso = rotation_about_axis(&origin, &towards, FRAC_PI_2).unwrap();

        assert!(points_close(&(iso * origin), &origin, TOLERANCE));
        assert!(points_close(&(iso * towards), &towards, TOLERANCE));
        let moved = iso * Point3::new(2.0, 1.0, 0.0);
        assert!(points_close(&moved, &Point3::new(1.0, 2.0, 0.0), TOLERANCE));
    }

    #[test]
    fn rotation_about_axis_rejects_zero_axis() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(rotation_about_axis(&p, &p, 1.0).is_err());
    }

    #[test]
    fn external_bisector_points_away_from_both_arms() {
        let center = Point3::origin();
        let a = Point3::new(-1.0, 1.0, 0.0);
        let b = Point3::new(1.0, 1.0, 0.0);

        let placed = external_bisector_position(&center, &a, &b, 1.23).unwrap();

        assert!(points_close(&placed, &Point3::new(0.0, -1.23, 0.0), TOLERANCE));
    }

    #[test]
    fn external_bisector_fails_for_straight_angle() {
        let result = external_bisector_position(
            &Point3::origin(),
            &Point3::new(-1.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            1.0,
        );
        assert!(matches!(result, Err(GeometryError::DegenerateVector { .. })));
    }
}
