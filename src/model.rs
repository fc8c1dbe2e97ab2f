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

use crate::geometry::{check_direction, validate_triangle_buffer};
use crate::{Float, HothouseError, Point3D, Result, Triangle, Vector3D};

/// A component of a [`Scene`](crate::Scene)... e.g., a plant.
///
/// It is a set of triangles, plus the (cached) normal and area
/// of each of them. The normals are NOT normalized: their length is
/// twice the area of the triangle.
#[derive(Debug, Clone)]
pub struct Model {
    triangles: Vec<Triangle>,

    /// The vertex buffer, when the model was built from a polygon mesh.
    vertices: Option<Vec<Point3D>>,

    /// Indexes of the vertices in each triangle, when the model
    /// was built from a polygon mesh.
    indices: Option<Vec<[usize; 3]>>,

    /// One RGB colour per vertex. Not used for any calculation.
    colours: Option<Vec<[Float; 3]>>,

    normals: Vec<Vector3D>,
    areas: Vec<Float>,
}

impl Model {
    /// Creates a new `Model` from a list of triangles
    pub fn new(triangles: Vec<Triangle>) -> Result<Self> {
        if triangles.is_empty() {
            return Err(HothouseError::validation("a Model needs at least one triangle"));
        }
        if triangles.iter().flatten().any(|p| !p.is_finite()) {
            return Err(HothouseError::validation(
                "a Model cannot have non-finite vertices",
            ));
        }
        let mut ret = Self {
            triangles,
            vertices: None,
            indices: None,
            colours: None,
            normals: Vec::new(),
            areas: Vec::new(),
        };
        ret.update_derived();
        Ok(ret)
    }

    /// Creates a new `Model` from a flat buffer with the coordinates of each vertex
    /// of each triangle (i.e., an `(N, 3, 3)` array)
    pub fn from_buffer(values: &[Float]) -> Result<Self> {
        let triangles = validate_triangle_buffer(values)?;
        Self::new(triangles)
    }

    /// Creates a `Model` from a polygon mesh. Faces can have any number of
    /// vertices (at least three) and are assumed to be convex: they are
    /// triangulated as a fan around their first vertex.
    pub fn from_polygons(
        vertices: Vec<Point3D>,
        faces: &[Vec<usize>],
        colours: Option<Vec<[Float; 3]>>,
    ) -> Result<Self> {
        if let Some(c) = &colours {
            if c.len() != vertices.len() {
                return Err(HothouseError::validation(format!(
                    "found {} colours for {} vertices",
                    c.len(),
                    vertices.len()
                )));
            }
        }
        let mut indices: Vec<[usize; 3]> = Vec::with_capacity(faces.len());
        for (face_index, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(HothouseError::validation(format!(
                    "face {} has only {} vertices",
                    face_index,
                    face.len()
                )));
            }
            if let Some(i) = face.iter().find(|i| **i >= vertices.len()) {
                return Err(HothouseError::validation(format!(
                    "face {} references vertex {}, but there are only {} vertices",
                    face_index,
                    i,
                    vertices.len()
                )));
            }
            let base = face[0];
            for pair in face[1..].windows(2) {
                indices.push([base, pair[0], pair[1]]);
            }
        }

        let triangles: Vec<Triangle> = indices
            .iter()
            .map(|[a, b, c]| [vertices[*a], vertices[*b], vertices[*c]])
            .collect();

        let mut ret = Self::new(triangles)?;
        ret.vertices = Some(vertices);
        ret.indices = Some(indices);
        ret.colours = colours;
        Ok(ret)
    }

    /// Recalculates the normals and areas. Needs to be called every time
    /// the triangles change.
    fn update_derived(&mut self) {
        self.normals = self
            .triangles
            .iter()
            .map(|[a, b, c]| (*b - *a).cross(*c - *a))
            .collect();
        self.areas = self.normals.iter().map(|n| 0.5 * n.length()).collect();
    }

    /// The triangles in the model
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The number of triangles in the model
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// The (not normalized) normal of each triangle. Its length
    /// is twice the area of the triangle.
    pub fn normals(&self) -> &[Vector3D] {
        &self.normals
    }

    /// The area of each triangle
    pub fn areas(&self) -> &[Float] {
        &self.areas
    }

    /// The vertex buffer, if this model was created from a polygon mesh
    pub fn vertices(&self) -> Option<&[Point3D]> {
        self.vertices.as_deref()
    }

    /// The indices of the vertices of each triangle, if this
    /// model was created from a polygon mesh
    pub fn indices(&self) -> Option<&[[usize; 3]]> {
        self.indices.as_deref()
    }

    /// The colour of each vertex, if any
    pub fn colours(&self) -> Option<&[[Float; 3]]> {
        self.colours.as_deref()
    }

    /// Moves the whole model by `delta`
    pub fn translate(&mut self, delta: Vector3D) -> Result<()> {
        if !delta.is_finite() {
            return Err(HothouseError::validation(format!(
                "cannot translate by {:?}",
                delta
            )));
        }
        for p in self.triangles.iter_mut().flatten() {
            *p += delta;
        }
        if let Some(vertices) = self.vertices.as_mut() {
            for p in vertices.iter_mut() {
                *p += delta;
            }
        }
        self.update_derived();
        Ok(())
    }

    /// Produces a copy of this model rotated `axial_rotation` radians around the
    /// Z axis and then placed at `origin` (i.e., the coordinates of the original model
    /// are taken as relative to the origin of the new one).
    pub fn clone_at(&self, origin: Point3D, axial_rotation: Float) -> Result<Self> {
        if !origin.is_finite() || !axial_rotation.is_finite() {
            return Err(HothouseError::validation(format!(
                "cannot place a model at {:?} with a rotation of {}",
                origin, axial_rotation
            )));
        }
        let (sin, cos) = axial_rotation.sin_cos();
        let place = |p: &Point3D| -> Point3D {
            origin + Point3D::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos, p.z)
        };

        let mut ret = self.clone();
        ret.triangles = self
            .triangles
            .iter()
            .map(|[a, b, c]| [place(a), place(b), place(c)])
            .collect();
        ret.vertices = self
            .vertices
            .as_ref()
            .map(|v| v.iter().map(place).collect());
        ret.update_derived();
        Ok(ret)
    }

    /// The largest distance between `point` and any of the vertices in this model
    pub fn max_distance_from(&self, point: Point3D) -> Float {
        self.triangles
            .iter()
            .flatten()
            .map(|p| p.distance(point))
            .fold(0.0, Float::max)
    }

    /// Angle (in radians) between the normal of each triangle and `up`
    pub fn tilts(&self, up: Vector3D) -> Result<Vec<Float>> {
        let up = check_direction(up, "up")?.normalize();
        Ok(self
            .normals
            .iter()
            .zip(self.areas.iter())
            .map(|(n, area)| {
                if *area > 0.0 {
                    (n.dot(up) / (2. * area)).clamp(-1., 1.).acos()
                } else {
                    0.0
                }
            })
            .collect())
    }
}
