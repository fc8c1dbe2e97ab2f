/*
MIT License
Copyright (c) 2021 Germán Molina
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use crate::{Float, HothouseError, Matrix3, Point3D, Result, Triangle, Vector3D};

/// Builds a [`Vector3D`] out of a raw buffer, which needs to contain
/// exactly three finite values.
pub fn validate_vector3(values: &[Float]) -> Result<Vector3D> {
    if values.len() != 3 {
        return Err(HothouseError::validation(format!(
            "expected a vector of length 3, found length {}",
            values.len()
        )));
    }
    let v = Vector3D::new(values[0], values[1], values[2]);
    if !v.is_finite() {
        return Err(HothouseError::validation(format!(
            "vector {:?} has non-finite components",
            values
        )));
    }
    Ok(v)
}

/// Builds a list of [`Triangle`] out of a flat buffer of `9*N` values (i.e.,
/// `N` triangles, three vertices each, three coordinates per vertex).
pub fn validate_triangle_buffer(values: &[Float]) -> Result<Vec<Triangle>> {
    if values.is_empty() || values.len() % 9 != 0 {
        return Err(HothouseError::validation(format!(
            "expected a triangle buffer of shape (N, 3, 3), found {} values",
            values.len()
        )));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(HothouseError::validation(format!(
            "triangle buffer has a non-finite value at position {}",
            i
        )));
    }
    let triangles = values
        .chunks_exact(9)
        .map(|c| {
            [
                Point3D::new(c[0], c[1], c[2]),
                Point3D::new(c[3], c[4], c[5]),
                Point3D::new(c[6], c[7], c[8]),
            ]
        })
        .collect();
    Ok(triangles)
}

/// Checks that a vector can be used as a direction: finite and not zero.
pub(crate) fn check_direction(v: Vector3D, name: &str) -> Result<Vector3D> {
    if !v.is_finite() || v.length_squared() <= Float::EPSILON {
        return Err(HothouseError::validation(format!(
            "'{}' must be a finite, non-zero vector... found {:?}",
            name, v
        )));
    }
    Ok(v)
}

/// Checks that a scalar is finite and not negative
pub(crate) fn check_non_negative(v: Float, name: &str) -> Result<Float> {
    if !v.is_finite() || v < 0.0 {
        return Err(HothouseError::validation(format!(
            "'{}' must be finite and non-negative... found {}",
            name, v
        )));
    }
    Ok(v)
}

/// Gets the matrix that rotates points by `theta` radians around `axis`, following
/// the right-hand rule. The `axis` is normalized before being used.
pub fn rotation_matrix(theta: Float, axis: Vector3D) -> Result<Matrix3> {
    let u = check_direction(axis, "axis")?.normalize();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let k = 1. - cos_theta;

    // Rodrigues, written column by column
    Ok(Matrix3::from_cols(
        Vector3D::new(
            cos_theta + u.x * u.x * k,
            u.y * u.x * k + u.z * sin_theta,
            u.z * u.x * k - u.y * sin_theta,
        ),
        Vector3D::new(
            u.x * u.y * k - u.z * sin_theta,
            cos_theta + u.y * u.y * k,
            u.z * u.y * k + u.x * sin_theta,
        ),
        Vector3D::new(
            u.x * u.z * k + u.y * sin_theta,
            u.y * u.z * k - u.x * sin_theta,
            cos_theta + u.z * u.z * k,
        ),
    ))
}

/// Rotates `point` by `angle` radians around `axis`
pub fn rotate(point: Vector3D, angle: Float, axis: Vector3D) -> Result<Vector3D> {
    let r = rotation_matrix(angle, axis)?;
    Ok(r * point)
}
