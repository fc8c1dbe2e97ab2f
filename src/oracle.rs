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

use crate::{Float, Point3D, Result, Triangle, Vector3D};

/// The identifier given by an [`IntersectionOracle`] to each set of triangles
/// registered in it.
pub type GeometryId = usize;

/// The kind of question asked to an [`IntersectionOracle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// How far is the nearest triangle?
    Distance,

    /// Is there any triangle in the way? The [`Hit`] reported is not
    /// necessarily the nearest one.
    Occluded,

    /// Which is the nearest triangle, and how far is it?
    Intersect,
}

/// What a ray hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// The [`GeometryId`] of the set of triangles that was hit, or `-1`.
    pub geometry_id: i64,

    /// The index of the triangle (within its set) that was hit, or `-1`.
    pub triangle_id: i64,

    /// The distance travelled by the ray, in units of the length of its direction.
    /// Infinite for misses.
    pub distance: Float,
}

impl Hit {
    /// A ray that did not hit anything
    pub const MISS: Hit = Hit {
        geometry_id: -1,
        triangle_id: -1,
        distance: Float::INFINITY,
    };

    /// Builds a new `Hit`
    pub fn new(geometry_id: GeometryId, triangle_id: usize, distance: Float) -> Self {
        Self {
            geometry_id: geometry_id as i64,
            triangle_id: triangle_id as i64,
            distance,
        }
    }

    /// Whether the ray missed everything
    pub fn is_miss(&self) -> bool {
        self.geometry_id < 0 || self.triangle_id < 0
    }

    /// The geometry and triangle that were hit, if any
    pub fn target(&self) -> Option<(GeometryId, usize)> {
        if self.is_miss() {
            None
        } else {
            Some((self.geometry_id as GeometryId, self.triangle_id as usize))
        }
    }
}

/// One of the hits of a ray that is followed through several reflections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceRecord {
    /// The [`GeometryId`] of the set of triangles that was hit
    pub geometry_id: GeometryId,

    /// The index of the triangle (within its set) that was hit
    pub triangle_id: usize,

    /// The direction in which the ray was travelling when it hit the triangle
    pub direction: Vector3D,

    /// The fraction of the original power that the ray still carries
    pub power: Float,

    /// The distance travelled since the previous bounce
    pub distance: Float,
}

/// Anything that can find out which triangles are hit by a set of rays.
///
/// The ids returned by [`IntersectionOracle::register`] must be sequential,
/// starting at zero.
pub trait IntersectionOracle {
    /// Adds a set of triangles
    fn register(&mut self, triangles: &[Triangle]) -> Result<GeometryId>;

    /// The number of sets of triangles registered so far
    fn n_geometries(&self) -> usize;

    /// Casts one ray per pair of `origins` and `directions`.
    ///
    /// Either all rays are cast, returning one [`Hit`] per ray, or an error is returned.
    fn query(
        &self,
        origins: &[Point3D],
        directions: &[Vector3D],
        query: QueryType,
    ) -> Result<Vec<Hit>>;

    /// Casts one ray per pair of `origins` and `directions`, following each one
    /// through up to `max_bounces` hits (the first one included).
    fn query_bounces(
        &self,
        origins: &[Point3D],
        directions: &[Vector3D],
        max_bounces: usize,
    ) -> Result<Vec<Vec<BounceRecord>>>;
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_hit() {
        assert!(Hit::MISS.is_miss());
        assert_eq!(Hit::MISS.target(), None);
        let h = Hit::new(2, 31, 1.5);
        assert!(!h.is_miss());
        assert_eq!(h.target(), Some((2, 31)));
    }
}
