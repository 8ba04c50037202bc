//! Vector algebra over fixed-length tuples.
//!
//! Lengths are never truncated or padded: any disagreement, including an
//! empty operand, is a `DimensionMismatch`. Non-finite components are
//! rejected up front.

use crate::error::{DemoError, Result};
use crate::traits::Scalar;
use num_traits::ToPrimitive;

fn check_finite<T: Scalar>(operation: &'static str, a: &[T]) -> Result<()> {
    match a.iter().find(|x| !x.is_finite()) {
        Some(x) => Err(DemoError::invalid(
            operation,
            x.to_f64().unwrap_or(f64::NAN),
            "must be finite",
        )),
        None => Ok(()),
    }
}

fn check_pair<T: Scalar>(operation: &'static str, a: &[T], b: &[T]) -> Result<()> {
    if a.is_empty() || a.len() != b.len() {
        return Err(DemoError::mismatch(operation, a.len(), b.len()));
    }
    check_finite(operation, a)?;
    check_finite(operation, b)
}

fn check_non_empty<T: Scalar>(operation: &'static str, a: &[T]) -> Result<()> {
    if a.is_empty() {
        return Err(DemoError::mismatch(operation, 0, 0));
    }
    check_finite(operation, a)
}

pub fn add<T: Scalar>(a: &[T], b: &[T]) -> Result<Vec<T>> {
    check_pair("add", a, b)?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x + y).collect())
}

pub fn subtract<T: Scalar>(a: &[T], b: &[T]) -> Result<Vec<T>> {
    check_pair("subtract", a, b)?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x - y).collect())
}

pub fn scale<T: Scalar>(a: &[T], factor: T) -> Result<Vec<T>> {
    check_non_empty("scale", a)?;
    check_finite("scale", &[factor])?;
    Ok(a.iter().map(|&x| x * factor).collect())
}

pub fn dot<T: Scalar>(a: &[T], b: &[T]) -> Result<T> {
    check_pair("dot", a, b)?;
    Ok(a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y))
}

/// Euclidean length.
pub fn norm<T: Scalar>(a: &[T]) -> Result<T> {
    check_non_empty("norm", a)?;
    Ok(a.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt())
}

pub fn distance<T: Scalar>(a: &[T], b: &[T]) -> Result<T> {
    check_pair("distance", a, b)?;
    norm(&subtract(a, b)?)
}

/// Angle between two vectors in radians.
pub fn angle_between<T: Scalar>(a: &[T], b: &[T]) -> Result<T> {
    check_pair("angle_between", a, b)?;
    let denom = norm(a)? * norm(b)?;
    if denom == T::zero() {
        return Err(DemoError::not_computable(
            "angle_between",
            "zero-length vector",
        ));
    }
    // Rounding can push the ratio just outside [-1, 1].
    let cos = (dot(a, b)? / denom).max(-T::one()).min(T::one());
    Ok(cos.acos())
}

/// Projection of `a` onto the direction of `b`.
pub fn project<T: Scalar>(a: &[T], b: &[T]) -> Result<Vec<T>> {
    check_pair("project", a, b)?;
    let bb = dot(b, b)?;
    if bb == T::zero() {
        return Err(DemoError::not_computable("project", "zero-length vector"));
    }
    scale(b, dot(a, b)? / bb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn componentwise_operations() {
        assert_eq!(add(&[1.0, 2.0], &[3.0, -1.0]).expect("add"), vec![4.0, 1.0]);
        assert_eq!(
            subtract(&[1.0, 2.0], &[3.0, -1.0]).expect("subtract"),
            vec![-2.0, 3.0]
        );
        assert_eq!(scale(&[1.5, -2.0], 2.0).expect("scale"), vec![3.0, -4.0]);
    }

    #[test]
    fn dot_is_commutative() {
        let samples = [
            (vec![1.0, 2.0, 3.0], vec![4.0, -5.0, 6.0]),
            (vec![0.1, 0.2], vec![0.3, 0.7]),
            (vec![-1e3, 2.5, 7.0, 0.0], vec![3.0, 1e-3, -2.0, 9.0]),
        ];
        for (a, b) in &samples {
            assert_eq!(dot(a, b).expect("dot"), dot(b, a).expect("dot"));
        }
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]).expect("dot"), 12.0);
    }

    #[test]
    fn norm_is_non_negative_and_vanishes_on_zero_scale() {
        for a in [vec![3.0, 4.0], vec![-1.0, -1.0, -1.0], vec![0.0]] {
            assert!(norm(&a).expect("norm") >= 0.0);
            let zeroed = scale(&a, 0.0).expect("scale");
            assert_eq!(norm(&zeroed).expect("norm"), 0.0);
        }
        assert_eq!(norm(&[3.0, 4.0]).expect("norm"), 5.0);
    }

    #[test]
    fn length_mismatch_fails_fast() {
        let err = dot(&[1.0, 2.0, 3.0], &[1.0, 2.0]).expect_err("mismatch");
        assert_eq!(
            err,
            DemoError::DimensionMismatch {
                operation: "dot",
                left: 3,
                right: 2
            }
        );
        assert!(add::<f64>(&[], &[]).is_err());
        assert!(norm::<f64>(&[]).is_err());
    }

    #[test]
    fn angle_and_projection() {
        let right = angle_between(&[1.0, 0.0], &[0.0, 2.0]).expect("angle");
        assert!((right - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let same: f64 = angle_between(&[1.0, 1.0], &[2.0, 2.0]).expect("angle");
        assert!(same.abs() < 1e-7);

        assert_eq!(
            project(&[2.0, 3.0], &[1.0, 0.0]).expect("project"),
            vec![2.0, 0.0]
        );
        assert!(matches!(
            angle_between(&[0.0, 0.0], &[1.0, 0.0]),
            Err(DemoError::NotComputable { .. })
        ));
    }

    #[test]
    fn non_finite_components_are_rejected() {
        assert!(matches!(
            dot(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(DemoError::InvalidHyperparameter { name: "dot", .. })
        ));
        assert!(matches!(
            norm(&[f64::INFINITY]),
            Err(DemoError::InvalidHyperparameter { name: "norm", .. })
        ));
        assert!(add(&[1.0], &[f64::NEG_INFINITY]).is_err());
        assert!(scale(&[1.0, 2.0], f64::NAN).is_err());
        assert!(norm(&[f32::NAN, 1.0]).is_err());
    }

    #[test]
    fn works_for_single_precision() {
        let d = distance(&[0.0_f32, 0.0], &[3.0, 4.0]).expect("distance");
        assert!((d - 5.0).abs() < 1e-6);
    }
}
