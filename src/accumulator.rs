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

//! The hits reported by an [`IntersectionOracle`](crate::IntersectionOracle) are
//! turned into flux densities here. These are pure functions: the
//! [`Scene`](crate::Scene) decides which of them to call.
//!
//! The normals used here are the ones stored by [`Model`], whose length is
//! twice the area of the triangle.

use crate::oracle::{BounceRecord, Hit};
use crate::{Float, HothouseError, Model, Result, Vector3D, PI};

/// Angle (in radians) between the normal of a triangle and the
/// direction opposite to the ray.
///
/// This is between `0` (the ray hits the front of the triangle straight on) and
/// `PI` (the ray hits the back of the triangle straight on).
pub fn angle_of_incidence(normal: Vector3D, area: Float, direction: Vector3D) -> Float {
    let cos = normal.dot(-direction) / (2. * area * direction.length());
    cos.clamp(-1., 1.).acos()
}

/// The cosine weighting of a hit with a certain angle of incidence.
///
/// Hits on the back of a triangle weigh nothing, unless `any_direction` is
/// `true`... in which case both faces of the triangle receive light alike.
pub fn incidence_factor(aoi: Float, any_direction: bool) -> Float {
    if aoi > PI / 2. {
        if any_direction {
            (aoi - PI).cos()
        } else {
            0.0
        }
    } else {
        aoi.cos()
    }
}

/// The flux density received by a triangle when a ray carrying `power` hits it
pub fn hit_contribution(
    normal: Vector3D,
    area: Float,
    direction: Vector3D,
    power: Float,
    any_direction: bool,
) -> Float {
    if area <= 0.0 {
        return 0.0;
    }
    let aoi = angle_of_incidence(normal, area, direction);
    power * incidence_factor(aoi, any_direction) / area
}

/// Flux density received from an isotropic sky of flux density `diffuse_intensity`
/// by a surface with a certain `tilt` (i.e., the angle between its normal and the
/// vertical, in radians).
pub fn isotropic_diffuse(tilt: Float, diffuse_intensity: Float, any_direction: bool) -> Float {
    let tilt = if any_direction && tilt > PI / 2. {
        tilt - PI
    } else {
        tilt
    };
    diffuse_intensity * (1. + tilt.cos()) / 2.
}

/// The diffuse flux density received by each triangle in `model`
pub fn diffuse_flux(
    model: &Model,
    up: Vector3D,
    diffuse_intensity: Float,
    any_direction: bool,
) -> Result<Vec<Float>> {
    let tilts = model.tilts(up)?;
    Ok(tilts
        .iter()
        .zip(model.areas().iter())
        .map(|(tilt, area)| {
            if *area > 0.0 {
                isotropic_diffuse(*tilt, diffuse_intensity, any_direction)
            } else {
                0.0
            }
        })
        .collect())
}

/// An all-zeros flux (or hit-count) array for each model
pub fn zeros<T: Default + Clone>(models: &[Model]) -> Vec<Vec<T>> {
    models
        .iter()
        .map(|m| vec![T::default(); m.n_triangles()])
        .collect()
}

/// Checks that `hit` lands on one of the `models`
fn locate(models: &[Model], geometry_id: usize, triangle_id: usize) -> Result<()> {
    match models.get(geometry_id) {
        Some(m) if triangle_id < m.n_triangles() => Ok(()),
        _ => Err(HothouseError::oracle(format!(
            "hit on triangle {} of geometry {}, which does not exist",
            triangle_id, geometry_id
        ))),
    }
}

/// Counts how many `hits` land on each triangle of each of the `models`.
/// Misses are ignored.
pub fn histogram(models: &[Model], hits: &[Hit]) -> Result<Vec<Vec<u32>>> {
    let mut ret = zeros::<u32>(models);
    for (g, t) in hits.iter().filter_map(|h| h.target()) {
        locate(models, g, t)?;
        ret[g][t] += 1;
    }
    Ok(ret)
}

/// Accumulates `hits` from rays that all share the same `direction` and
/// carry `ray_intensity` each, adding the results to `flux`.
///
/// The angle of incidence is then the same for every ray hitting a
/// triangle, so it is computed once per triangle.
pub fn fold_parallel(
    models: &[Model],
    hits: &[Hit],
    direction: Vector3D,
    ray_intensity: Float,
    any_direction: bool,
    flux: &mut [Vec<Float>],
) -> Result<()> {
    let counts = histogram(models, hits)?;
    for ((model, counts), flux) in models.iter().zip(counts.iter()).zip(flux.iter_mut()) {
        let per_hit = |(normal, area): (&Vector3D, &Float)| {
            hit_contribution(*normal, *area, direction, ray_intensity, any_direction)
        };

        #[cfg(feature = "parallel")]
        let per_hit: Vec<Float> = {
            use rayon::prelude::*;
            model
                .normals()
                .par_iter()
                .zip(model.areas().par_iter())
                .map(per_hit)
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let per_hit: Vec<Float> = model
            .normals()
            .iter()
            .zip(model.areas().iter())
            .map(per_hit)
            .collect();

        for ((f, count), w) in flux.iter_mut().zip(counts.iter()).zip(per_hit.iter()) {
            *f += *count as Float * w;
        }
    }
    Ok(())
}

/// Accumulates `hits` from rays with arbitrary `directions` (one per hit),
/// each of them carrying `ray_intensity`, adding the results to `flux`.
pub fn fold_rays(
    models: &[Model],
    hits: &[Hit],
    directions: &[Vector3D],
    ray_intensity: Float,
    any_direction: bool,
    flux: &mut [Vec<Float>],
) -> Result<()> {
    if hits.len() != directions.len() {
        return Err(HothouseError::oracle(format!(
            "received {} hits for {} rays",
            hits.len(),
            directions.len()
        )));
    }
    for (hit, direction) in hits.iter().zip(directions.iter()) {
        if let Some((g, t)) = hit.target() {
            locate(models, g, t)?;
            let model = &models[g];
            flux[g][t] += hit_contribution(
                model.normals()[t],
                model.areas()[t],
                *direction,
                ray_intensity,
                any_direction,
            );
        }
    }
    Ok(())
}

/// Accumulates the hits of rays that were followed through several bounces,
/// adding the results to `flux`. Each [`BounceRecord`] knows the direction
/// of the ray and the fraction of `ray_intensity` it still carries.
pub fn fold_bounces(
    models: &[Model],
    bounces: &[Vec<BounceRecord>],
    ray_intensity: Float,
    any_direction: bool,
    flux: &mut [Vec<Float>],
) -> Result<()> {
    for b in bounces.iter().flatten() {
        locate(models, b.geometry_id, b.triangle_id)?;
        let model = &models[b.geometry_id];
        flux[b.geometry_id][b.triangle_id] += hit_contribution(
            model.normals()[b.triangle_id],
            model.areas()[b.triangle_id],
            b.direction,
            ray_intensity * b.power,
            any_direction,
        );
    }
    Ok(())
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::Point3D;

    /// A right triangle of area 2 on the XY plane, facing +Z
    fn flat() -> Model {
        Model::new(vec![[
            Point3D::new(0., 0., 0.),
            Point3D::new(2., 0., 0.),
            Point3D::new(0., 2., 0.),
        ]])
        .unwrap()
    }

    #[test]
    fn test_angle_of_incidence() {
        let m = flat();
        let (n, a) = (m.normals()[0], m.areas()[0]);
        assert!((a - 2.).abs() < 1e-12);

        let aoi = angle_of_incidence(n, a, Vector3D::new(0., 0., -1.));
        assert!(aoi.abs() < 1e-6);

        // The length of the direction does not matter
        let aoi = angle_of_incidence(n, a, Vector3D::new(0., 0., -7.));
        assert!(aoi.abs() < 1e-6);

        let aoi = angle_of_incidence(n, a, Vector3D::new(0., 0., 1.));
        assert!((aoi - PI).abs() < 1e-6);

        let aoi = angle_of_incidence(n, a, Vector3D::new(1., 0., -1.));
        assert!((aoi - PI / 4.).abs() < 1e-9);
    }

    #[test]
    fn test_incidence_factor() {
        assert!((incidence_factor(0.0, false) - 1.).abs() < 1e-12);
        assert!((incidence_factor(PI / 3., false) - 0.5).abs() < 1e-12);
        assert_eq!(incidence_factor(2. * PI / 3., false), 0.0);
        assert!((incidence_factor(2. * PI / 3., true) - 0.5).abs() < 1e-12);
        assert!((incidence_factor(PI, true) - 1.).abs() < 1e-12);
    }

    #[test]
    fn test_hit_contribution() {
        let m = flat();
        let (n, a) = (m.normals()[0], m.areas()[0]);
        let front = hit_contribution(n, a, Vector3D::new(0., 0., -1.), 3., false);
        assert!((front - 1.5).abs() < 1e-9);

        let back = hit_contribution(n, a, Vector3D::new(0., 0., 1.), 3., false);
        assert_eq!(back, 0.0);
        let back = hit_contribution(n, a, Vector3D::new(0., 0., 1.), 3., true);
        assert!((back - 1.5).abs() < 1e-9);

        // Degenerate triangles get nothing
        assert_eq!(
            hit_contribution(Vector3D::ZERO, 0.0, Vector3D::new(0., 0., -1.), 3., true),
            0.0
        );
    }

    #[test]
    fn test_isotropic_diffuse() {
        assert!((isotropic_diffuse(0.0, 100., false) - 100.).abs() < 1e-9);
        assert!((isotropic_diffuse(PI / 2., 100., false) - 50.).abs() < 1e-9);
        assert!(isotropic_diffuse(PI, 100., false).abs() < 1e-9);
        assert!((isotropic_diffuse(PI, 100., true) - 100.).abs() < 1e-9);
        assert!((isotropic_diffuse(2. * PI / 3., 100., true) - 75.).abs() < 1e-9);

        let m = flat();
        let d = diffuse_flux(&m, Vector3D::Z, 100., false).unwrap();
        assert_eq!(d.len(), 1);
        assert!((d[0] - 100.).abs() < 1e-9);
        let d = diffuse_flux(&m, -Vector3D::Z, 100., false).unwrap();
        assert!(d[0].abs() < 1e-9);
    }

    #[test]
    fn test_histogram() {
        let models = vec![flat(), flat()];
        let hits = vec![Hit::new(0, 0, 1.), Hit::MISS, Hit::new(1, 0, 1.), Hit::new(1, 0, 2.)];
        let h = histogram(&models, &hits).unwrap();
        assert_eq!(h, vec![vec![1], vec![2]]);

        let bad = vec![Hit::new(2, 0, 1.)];
        assert!(histogram(&models, &bad).is_err());
        let bad = vec![Hit::new(0, 1, 1.)];
        assert!(histogram(&models, &bad).is_err());
    }

    #[test]
    fn test_folds_agree() {
        let models = vec![flat()];
        let hits = vec![Hit::new(0, 0, 1.), Hit::new(0, 0, 1.), Hit::MISS];
        let dir = Vector3D::new(1., 0., -1.);

        let mut parallel = zeros::<Float>(&models);
        fold_parallel(&models, &hits, dir, 0.5, false, &mut parallel).unwrap();

        let mut rays = zeros::<Float>(&models);
        fold_rays(&models, &hits, &[dir; 3], 0.5, false, &mut rays).unwrap();

        let expected = 2. * 0.5 * (PI / 4.).cos() / 2.;
        assert!((parallel[0][0] - expected).abs() < 1e-9);
        assert!((rays[0][0] - expected).abs() < 1e-9);

        assert!(fold_rays(&models, &hits, &[dir; 2], 0.5, false, &mut rays).is_err());
    }

    #[test]
    fn test_fold_bounces() {
        let models = vec![flat()];
        let bounces = vec![
            vec![
                BounceRecord {
                    geometry_id: 0,
                    triangle_id: 0,
                    direction: Vector3D::new(0., 0., -1.),
                    power: 1.,
                    distance: 1.,
                },
                BounceRecord {
                    geometry_id: 0,
                    triangle_id: 0,
                    direction: Vector3D::new(0., 0., 1.),
                    power: 0.1,
                    distance: 1.,
                },
            ],
            vec![],
        ];
        let mut flux = zeros::<Float>(&models);
        fold_bounces(&models, &bounces, 4., false, &mut flux).unwrap();
        // Only the first bounce hits the front
        assert!((flux[0][0] - 2.).abs() < 1e-9);

        let mut flux = zeros::<Float>(&models);
        fold_bounces(&models, &bounces, 4., true, &mut flux).unwrap();
        assert!((flux[0][0] - 2.2).abs() < 1e-9);
    }
}
