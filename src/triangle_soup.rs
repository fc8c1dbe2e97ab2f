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

use crate::oracle::{BounceRecord, GeometryId, Hit, IntersectionOracle, QueryType};
use crate::{Float, HothouseError, Point3D, Result, Triangle, Vector3D};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
struct BBox {
    min: Point3D,
    max: Point3D,
}

impl BBox {
    fn empty() -> Self {
        Self {
            min: Point3D::splat(Float::INFINITY),
            max: Point3D::splat(Float::NEG_INFINITY),
        }
    }

    fn from_triangle(t: &Triangle) -> Self {
        Self {
            min: t[0].min(t[1]).min(t[2]),
            max: t[0].max(t[1]).max(t[2]),
        }
    }

    fn union(&self, other: &BBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    fn grow(&mut self, p: Point3D) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Slab test. `inv_dir` is the component-wise inverse of `direction`.
    ///
    /// A ray parallel to a slab is inside of it only if its origin is, even
    /// when that origin lies exactly on one of the slab's planes.
    fn intersect(&self, origin: Point3D, direction: Vector3D, inv_dir: Vector3D, t_max: Float) -> bool {
        let mut t_enter: Float = 0.0;
        let mut t_exit = Float::INFINITY;
        for axis in 0..3 {
            let (o, min, max) = (origin[axis], self.min[axis], self.max[axis]);
            if direction[axis] == 0.0 {
                if o < min || o > max {
                    return false;
                }
                continue;
            }
            let t1 = (min - o) * inv_dir[axis];
            let t2 = (max - o) * inv_dir[axis];
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }
        t_exit >= t_enter && t_enter <= t_max
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { bbox: BBox, start: usize, end: usize },
    Branch { bbox: BBox, left: usize, right: usize },
}

impl Node {
    fn bbox(&self) -> &BBox {
        match self {
            Node::Leaf { bbox, .. } | Node::Branch { bbox, .. } => bbox,
        }
    }
}

/// An [`IntersectionOracle`] that stores all triangles in memory and
/// accelerates ray casting with a Bounding Volume Hierarchy.
///
/// Rays that are followed through several bounces are reflected specularly,
/// losing a fraction `1 - reflectance` of their power at each bounce.
#[derive(Debug, Clone)]
pub struct TriangleSoup {
    geometries: Vec<Vec<Triangle>>,

    /// (geometry, triangle) pairs, sorted so that each leaf in the
    /// BVH owns a contiguous range of them.
    primitives: Vec<(GeometryId, usize)>,
    nodes: Vec<Node>,

    reflectance: Float,
}

impl Default for TriangleSoup {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleSoup {
    /// Maximum number of triangles in a leaf of the BVH
    const LEAF_SIZE: usize = 4;

    /// Offset for the starting point of reflected rays
    const DELTA: Float = 0.001;

    /// Hits closer than this are ignored
    const T_MIN: Float = 1e-9;

    /// Creates an empty `TriangleSoup`
    pub fn new() -> Self {
        Self {
            geometries: Vec::new(),
            primitives: Vec::new(),
            nodes: Vec::new(),
            reflectance: 0.1,
        }
    }

    /// Sets the fraction of power that rays keep after each bounce
    pub fn with_reflectance(mut self, reflectance: Float) -> Result<Self> {
        if !(0.0..=1.0).contains(&reflectance) {
            return Err(HothouseError::validation(format!(
                "reflectance must be between 0 and 1... found {}",
                reflectance
            )));
        }
        self.reflectance = reflectance;
        Ok(self)
    }

    /// The fraction of power that rays keep after each bounce
    pub fn reflectance(&self) -> Float {
        self.reflectance
    }

    fn triangle(&self, primitive: usize) -> &Triangle {
        let (g, t) = self.primitives[primitive];
        &self.geometries[g][t]
    }

    fn rebuild(&mut self) {
        self.primitives = self
            .geometries
            .iter()
            .enumerate()
            .flat_map(|(g, triangles)| (0..triangles.len()).map(move |t| (g, t)))
            .collect();
        self.nodes = Vec::with_capacity(2 * self.primitives.len() / Self::LEAF_SIZE + 1);
        if !self.primitives.is_empty() {
            self.build_node(0, self.primitives.len());
        }
    }

    /// Builds the node containing primitives `start..end`, returning its index
    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let mut bbox = BBox::empty();
        let mut centroids = BBox::empty();
        for i in start..end {
            let tri = self.triangle(i);
            bbox = bbox.union(&BBox::from_triangle(tri));
            centroids.grow((tri[0] + tri[1] + tri[2]) / 3.);
        }

        let index = self.nodes.len();
        let extent = centroids.max - centroids.min;
        if end - start <= Self::LEAF_SIZE || extent.max_element() <= 0.0 {
            self.nodes.push(Node::Leaf { bbox, start, end });
            return index;
        }

        // Split along the longest axis, at the median
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        let geometries = &self.geometries;
        self.primitives[start..end].sort_by(|a, b| {
            let ca = geometries[a.0][a.1].iter().map(|p| p[axis]).sum::<Float>();
            let cb = geometries[b.0][b.1].iter().map(|p| p[axis]).sum::<Float>();
            ca.total_cmp(&cb)
        });
        let mid = (start + end) / 2;

        // Placeholder, replaced once the children exist
        self.nodes.push(Node::Leaf { bbox, start, end });
        let left = self.build_node(start, mid);
        let right = self.build_node(mid, end);
        self.nodes[index] = Node::Branch { bbox, left, right };
        index
    }

    /// Möller-Trumbore. Both sides of the triangle are hit.
    fn intersect_triangle(tri: &Triangle, origin: Point3D, direction: Vector3D) -> Option<Float> {
        let e1 = tri[1] - tri[0];
        let e2 = tri[2] - tri[0];
        let p = direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() <= Float::EPSILON * e1.length() * e2.length() * direction.length() {
            return None;
        }
        let inv_det = 1. / det;
        let s = origin - tri[0];
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        if t > Self::T_MIN {
            Some(t)
        } else {
            None
        }
    }

    /// Finds the nearest primitive hit by a ray (or any of them, if `any_hit`)
    fn traverse(&self, origin: Point3D, direction: Vector3D, any_hit: bool) -> Option<(usize, Float)> {
        if self.nodes.is_empty() {
            return None;
        }
        let inv_dir = direction.recip();
        let mut best: Option<(usize, Float)> = None;
        let mut t_max = Float::INFINITY;
        let mut stack = vec![0];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            if !node.bbox().intersect(origin, direction, inv_dir, t_max) {
                continue;
            }
            match node {
                Node::Leaf { start, end, .. } => {
                    for prim in *start..*end {
                        if let Some(t) = Self::intersect_triangle(self.triangle(prim), origin, direction) {
                            if t < t_max {
                                t_max = t;
                                best = Some((prim, t));
                                if any_hit {
                                    return best;
                                }
                            }
                        }
                    }
                }
                Node::Branch { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        best
    }

    fn cast(&self, origin: Point3D, direction: Vector3D, any_hit: bool) -> Hit {
        match self.traverse(origin, direction, any_hit) {
            Some((prim, t)) => {
                let (g, tri) = self.primitives[prim];
                Hit::new(g, tri, t)
            }
            None => Hit::MISS,
        }
    }

    fn cast_bounces(&self, origin: Point3D, direction: Vector3D, max_bounces: usize) -> Vec<BounceRecord> {
        let mut ret = Vec::with_capacity(max_bounces);
        let mut origin = origin;
        let mut direction = direction;
        let mut power = 1.0;
        for _ in 0..max_bounces {
            let (prim, t) = match self.traverse(origin, direction, false) {
                Some(v) => v,
                None => break,
            };
            let (geometry_id, triangle_id) = self.primitives[prim];
            ret.push(BounceRecord {
                geometry_id,
                triangle_id,
                direction,
                power,
                distance: t,
            });

            // Reflect
            let tri = self.triangle(prim);
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            let reflected = direction - normal * (2. * direction.dot(normal));
            let hit_point = origin + direction * t;
            origin = hit_point + reflected.normalize_or_zero() * Self::DELTA;
            direction = reflected;
            power *= self.reflectance;
            if power <= 0.0 {
                break;
            }
        }
        ret
    }

    fn check_rays(&self, origins: &[Point3D], directions: &[Vector3D]) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(HothouseError::oracle(
                "cannot cast rays on a scene without triangles",
            ));
        }
        if origins.len() != directions.len() {
            return Err(HothouseError::validation(format!(
                "found {} origins but {} directions",
                origins.len(),
                directions.len()
            )));
        }
        Ok(())
    }
}

/// Applies `f` to each ray, in parallel if possible
fn map_rays<T, F>(origins: &[Point3D], directions: &[Vector3D], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(Point3D, Vector3D) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        origins
            .par_iter()
            .zip(directions.par_iter())
            .map(|(o, d)| f(*o, *d))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        origins
            .iter()
            .zip(directions.iter())
            .map(|(o, d)| f(*o, *d))
            .collect()
    }
}

impl IntersectionOracle for TriangleSoup {
    fn register(&mut self, triangles: &[Triangle]) -> Result<GeometryId> {
        if triangles.is_empty() {
            return Err(HothouseError::validation(
                "cannot register an empty set of triangles",
            ));
        }
        if triangles.iter().flatten().any(|p| !p.is_finite()) {
            return Err(HothouseError::validation(
                "cannot register triangles with non-finite vertices",
            ));
        }
        self.geometries.push(triangles.to_vec());
        self.rebuild();
        Ok(self.geometries.len() - 1)
    }

    fn n_geometries(&self) -> usize {
        self.geometries.len()
    }

    fn query(
        &self,
        origins: &[Point3D],
        directions: &[Vector3D],
        query: QueryType,
    ) -> Result<Vec<Hit>> {
        self.check_rays(origins, directions)?;
        let any_hit = query == QueryType::Occluded;
        Ok(map_rays(origins, directions, |o, d| self.cast(o, d, any_hit)))
    }

    fn query_bounces(
        &self,
        origins: &[Point3D],
        directions: &[Vector3D],
        max_bounces: usize,
    ) -> Result<Vec<Vec<BounceRecord>>> {
        self.check_rays(origins, directions)?;
        Ok(map_rays(origins, directions, |o, d| {
            self.cast_bounces(o, d, max_bounces)
        }))
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    fn square(z: Float) -> Vec<Triangle> {
        vec![
            [
                Point3D::new(-1., -1., z),
                Point3D::new(1., -1., z),
                Point3D::new(-1., 1., z),
            ],
            [
                Point3D::new(1., -1., z),
                Point3D::new(1., 1., z),
                Point3D::new(-1., 1., z),
            ],
        ]
    }

    /// A strip of many small triangles, so the BVH has some depth
    fn strip(n: usize) -> Vec<Triangle> {
        (0..n)
            .map(|i| {
                let x = i as Float;
                [
                    Point3D::new(x, 0., 0.),
                    Point3D::new(x + 1., 0., 0.),
                    Point3D::new(x, 1., 0.),
                ]
            })
            .collect()
    }

    #[test]
    fn test_empty() {
        let soup = TriangleSoup::new();
        let err = soup
            .query(&[Point3D::ZERO], &[Vector3D::Z], QueryType::Intersect)
            .unwrap_err();
        assert!(matches!(err, HothouseError::Oracle(_)));

        let mut soup = TriangleSoup::new();
        assert!(soup.register(&[]).is_err());
    }

    #[test]
    fn test_nearest() {
        let mut soup = TriangleSoup::new();
        assert_eq!(soup.register(&square(0.)).unwrap(), 0);
        assert_eq!(soup.register(&square(5.)).unwrap(), 1);
        assert_eq!(soup.n_geometries(), 2);

        let origins = [
            Point3D::new(0.5, 0.5, 10.),
            Point3D::new(-0.5, -0.5, -10.),
            Point3D::new(3., 3., 10.),
        ];
        let directions = [
            Vector3D::new(0., 0., -1.),
            Vector3D::new(0., 0., 1.),
            Vector3D::new(0., 0., -1.),
        ];
        let hits = soup
            .query(&origins, &directions, QueryType::Intersect)
            .unwrap();
        assert_eq!(hits[0].target(), Some((1, 1)));
        assert!((hits[0].distance - 5.).abs() < 1e-9);
        assert_eq!(hits[1].target(), Some((0, 0)));
        assert!((hits[1].distance - 10.).abs() < 1e-9);
        assert!(hits[2].is_miss());
        assert!(hits[2].distance.is_infinite());

        // Any hit will do
        let hits = soup
            .query(&origins[..1], &directions[..1], QueryType::Occluded)
            .unwrap();
        assert!(!hits[0].is_miss());

        assert!(soup
            .query(&origins, &directions[..1], QueryType::Distance)
            .is_err());
    }

    #[test]
    fn test_bvh_matches_brute_force() {
        let mut soup = TriangleSoup::new();
        let triangles = strip(100);
        soup.register(&triangles).unwrap();

        let direction = Vector3D::new(0.1, 0.05, -1.);
        for i in 0..200 {
            let origin = Point3D::new(i as Float * 0.51 - 2., 0.3, 3.);
            let hit = soup
                .query(&[origin], &[direction], QueryType::Intersect)
                .unwrap()[0];

            let mut expected: Option<(usize, Float)> = None;
            for (j, t) in triangles.iter().enumerate() {
                if let Some(d) = TriangleSoup::intersect_triangle(t, origin, direction) {
                    if expected.map_or(true, |(_, best)| d < best) {
                        expected = Some((j, d));
                    }
                }
            }
            match expected {
                Some((j, d)) => {
                    assert_eq!(hit.target(), Some((0, j)));
                    assert!((hit.distance - d).abs() < 1e-9);
                }
                None => assert!(hit.is_miss()),
            }
        }
    }

    #[test]
    fn test_ray_along_a_box_face() {
        // Rays that travel within the planes bounding the scene
        let mut soup = TriangleSoup::new();
        let triangles = square(0.);
        soup.register(&triangles).unwrap();

        let origins = [
            Point3D::new(-1., 0., 5.),
            Point3D::new(1., 1., 5.),
            Point3D::new(0.3, -1., 5.),
            Point3D::new(-1.5, 0., 5.),
        ];
        let direction = Vector3D::new(0., 0., -1.);
        for origin in origins {
            let hit = soup
                .query(&[origin], &[direction], QueryType::Intersect)
                .unwrap()[0];
            let expected = triangles
                .iter()
                .filter_map(|t| TriangleSoup::intersect_triangle(t, origin, direction))
                .fold(Float::INFINITY, Float::min);
            assert!(
                (hit.distance - expected).abs() < 1e-9 || hit.distance == expected,
                "origin {:?}: found {}, expected {}",
                origin,
                hit.distance,
                expected
            );
        }

        let hit = soup
            .query(&origins[..1], &[direction], QueryType::Intersect)
            .unwrap()[0];
        assert_eq!(hit.target().map(|(geometry, _)| geometry), Some(0));
        assert!((hit.distance - 5.).abs() < 1e-9);
    }

    #[test]
    fn test_slab_parallel_to_axis() {
        let bbox = BBox {
            min: Point3D::new(-1., -1., 0.),
            max: Point3D::new(1., 1., 0.),
        };
        let direction = Vector3D::new(0., 0., -1.);
        let inv_dir = direction.recip();
        assert!(bbox.intersect(Point3D::new(-1., 0., 5.), direction, inv_dir, Float::INFINITY));
        assert!(bbox.intersect(Point3D::new(1., 1., 5.), direction, inv_dir, Float::INFINITY));
        assert!(!bbox.intersect(Point3D::new(-1.01, 0., 5.), direction, inv_dir, Float::INFINITY));
        // Too far away
        assert!(!bbox.intersect(Point3D::new(0., 0., 5.), direction, inv_dir, 4.));
    }

    #[test]
    fn test_bounces() {
        // A floor and a ceiling... rays bounce between them
        let mut soup = TriangleSoup::new().with_reflectance(0.5).unwrap();
        soup.register(&square(0.)).unwrap();
        soup.register(&square(1.)).unwrap();

        let origins = [Point3D::new(0.1, 0.2, 0.5)];
        let directions = [Vector3D::new(0., 0., -1.)];
        let bounces = soup.query_bounces(&origins, &directions, 3).unwrap();
        let b = &bounces[0];
        assert_eq!(b.len(), 3);
        assert_eq!(b[0].geometry_id, 0);
        assert_eq!(b[1].geometry_id, 1);
        assert_eq!(b[2].geometry_id, 0);
        assert!((b[0].power - 1.).abs() < 1e-12);
        assert!((b[1].power - 0.5).abs() < 1e-12);
        assert!((b[2].power - 0.25).abs() < 1e-12);
        assert!((b[0].direction - Vector3D::new(0., 0., -1.)).length() < 1e-9);
        assert!((b[1].direction - Vector3D::new(0., 0., 1.)).length() < 1e-9);

        // Missing stops the bounces
        let bounces = soup
            .query_bounces(&[Point3D::new(0., 0., 2.)], &[Vector3D::Z], 3)
            .unwrap();
        assert!(bounces[0].is_empty());
        assert!(TriangleSoup::new().with_reflectance(1.5).is_err());
    }
}
