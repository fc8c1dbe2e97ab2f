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

use crate::geometry::{check_direction, check_non_negative};
use crate::{Float, HothouseError, Point3D, Result, Vector3D};
use serde::{Deserialize, Serialize};

/// A set of rays (each of them an origin and a direction) that together
/// carry a certain `intensity`.
///
/// These can represent light sources (e.g., the sun) or cameras.
#[derive(Debug, Clone)]
pub struct RayBlaster {
    origins: Vec<Point3D>,
    directions: Vec<Vector3D>,

    /// Total power of all the rays combined
    intensity: Float,

    /// Ambient (i.e., sky) flux density. This does not depend
    /// on the number of rays.
    diffuse_intensity: Float,

    /// If all rays share the same direction, this is it.
    parallel_direction: Option<Vector3D>,

    /// If `Some(n)`, rays are followed through up to `n` hits (the first one included)
    max_bounces: Option<usize>,
}

impl RayBlaster {
    /// Creates a new `RayBlaster`. The `origins` and `directions`
    /// need to be of the same length.
    pub fn new(origins: Vec<Point3D>, directions: Vec<Vector3D>, intensity: Float) -> Result<Self> {
        if origins.is_empty() {
            return Err(HothouseError::validation("a RayBlaster needs at least one ray"));
        }
        if origins.len() != directions.len() {
            return Err(HothouseError::validation(format!(
                "found {} origins but {} directions",
                origins.len(),
                directions.len()
            )));
        }
        if origins.iter().any(|o| !o.is_finite()) {
            return Err(HothouseError::validation("ray origins need to be finite"));
        }
        for d in directions.iter() {
            check_direction(*d, "direction")?;
        }
        let intensity = check_non_negative(intensity, "intensity")?;

        let first = directions[0];
        let parallel_direction = if directions.iter().all(|d| *d == first) {
            Some(first)
        } else {
            None
        };

        Ok(Self {
            origins,
            directions,
            intensity,
            diffuse_intensity: 0.0,
            parallel_direction,
            max_bounces: None,
        })
    }

    /// Creates a new `RayBlaster` from two flat buffers of shape `(N, 3)`
    pub fn from_buffers(origins: &[Float], directions: &[Float], intensity: Float) -> Result<Self> {
        let to_vectors = |values: &[Float], name: &str| -> Result<Vec<Vector3D>> {
            if values.len() % 3 != 0 {
                return Err(HothouseError::validation(format!(
                    "{} should have shape (N, 3), but it has {} values",
                    name,
                    values.len()
                )));
            }
            Ok(values
                .chunks_exact(3)
                .map(|c| Vector3D::new(c[0], c[1], c[2]))
                .collect())
        };
        Self::new(
            to_vectors(origins, "origins")?,
            to_vectors(directions, "directions")?,
            intensity,
        )
    }

    /// Sets the diffuse intensity (i.e., the flux density coming from an isotropic sky)
    pub fn with_diffuse_intensity(mut self, diffuse_intensity: Float) -> Result<Self> {
        self.diffuse_intensity = check_non_negative(diffuse_intensity, "diffuse_intensity")?;
        Ok(self)
    }

    /// Makes the rays be followed through up to `max_bounces` hits
    pub fn with_bounces(mut self, max_bounces: usize) -> Self {
        self.max_bounces = Some(max_bounces);
        self
    }

    /// The origin of each ray
    pub fn origins(&self) -> &[Point3D] {
        &self.origins
    }

    /// The direction of each ray
    pub fn directions(&self) -> &[Vector3D] {
        &self.directions
    }

    /// The number of rays
    pub fn n_rays(&self) -> usize {
        self.origins.len()
    }

    /// The total power carried by all rays
    pub fn intensity(&self) -> Float {
        self.intensity
    }

    /// The diffuse flux density
    pub fn diffuse_intensity(&self) -> Float {
        self.diffuse_intensity
    }

    /// The power carried by each ray
    pub fn ray_intensity(&self) -> Float {
        self.intensity / self.n_rays() as Float
    }

    /// The direction shared by all rays, if any
    pub fn parallel_direction(&self) -> Option<Vector3D> {
        self.parallel_direction
    }

    /// The number of hits to follow, if this is a multi-bounce source
    pub fn max_bounces(&self) -> Option<usize> {
        self.max_bounces
    }
}

/// The position and orientation of an orthographic camera (or light source)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// The middle of the grid of rays
    pub center: Point3D,
    /// The direction of all rays (normalized)
    pub forward: Vector3D,
    /// The vertical axis of the grid (normalized)
    pub up: Vector3D,
    /// The horizontal axis of the grid: `forward x up`, normalized
    pub east: Vector3D,
}

impl CameraBasis {
    /// Creates a new `CameraBasis`. `up` cannot be parallel to `forward`. Both
    /// are normalized, so their length does not affect the size of the grid.
    pub fn new(center: Point3D, forward: Vector3D, up: Vector3D) -> Result<Self> {
        if !center.is_finite() {
            return Err(HothouseError::validation(format!(
                "center must be finite... found {:?}",
                center
            )));
        }
        let forward = check_direction(forward, "forward")?.normalize();
        let up = check_direction(up, "up")?.normalize();
        let east = forward.cross(up);
        if east.length() <= 1e-6 {
            return Err(HothouseError::validation(format!(
                "'up' ({:?}) is parallel to 'forward' ({:?})",
                up, forward
            )));
        }
        Ok(Self {
            center,
            forward,
            up,
            east: east.normalize(),
        })
    }
}

/// The size and resolution of a grid of rays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// The extent of the grid along `east`
    pub width: Float,
    /// The extent of the grid along `up`
    pub height: Float,
    /// Number of rays along `east`
    pub nx: usize,
    /// Number of rays along `up`
    pub ny: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            nx: 512,
            ny: 512,
        }
    }
}

impl GridOptions {
    fn validate(&self) -> Result<()> {
        check_non_negative(self.width, "width")?;
        check_non_negative(self.height, "height")?;
        if self.nx == 0 || self.ny == 0 {
            return Err(HothouseError::validation(format!(
                "a grid needs at least one ray in each direction... found {}x{}",
                self.nx, self.ny
            )));
        }
        Ok(())
    }
}

/// `n` values evenly spaced between `-extent/2` and `extent/2`, both included.
/// A single value sits in the middle.
fn offsets(extent: Float, n: usize) -> Vec<Float> {
    if n == 1 {
        return vec![0.0];
    }
    let step = extent / (n - 1) as Float;
    (0..n).map(|i| -extent / 2. + i as Float * step).collect()
}

/// A grid of `nx` by `ny` parallel rays.
///
/// The ray at column `i` (along `east`) and row `j` (along `up`) is
/// stored at position `i * ny + j`.
#[derive(Debug, Clone)]
pub struct OrthographicRayBlaster {
    basis: CameraBasis,
    grid: GridOptions,
    rays: RayBlaster,
}

impl OrthographicRayBlaster {
    /// Builds the grid of rays.
    pub fn new(basis: CameraBasis, grid: GridOptions, intensity: Float) -> Result<Self> {
        grid.validate()?;
        let offset_x = offsets(grid.width, grid.nx);
        let offset_y = offsets(grid.height, grid.ny);

        let mut origins = Vec::with_capacity(grid.nx * grid.ny);
        for ox in offset_x.iter() {
            for oy in offset_y.iter() {
                origins.push(basis.center + basis.east * *ox + basis.up * *oy);
            }
        }
        let directions = vec![basis.forward; origins.len()];
        let rays = RayBlaster::new(origins, directions, intensity)?;

        Ok(Self { basis, grid, rays })
    }

    /// The position and orientation of the grid
    pub fn basis(&self) -> &CameraBasis {
        &self.basis
    }

    /// The size and resolution of the grid
    pub fn grid(&self) -> &GridOptions {
        &self.grid
    }

    /// The rays
    pub fn rays(&self) -> &RayBlaster {
        &self.rays
    }

    /// Takes the rays out of the grid
    pub fn into_rays(self) -> RayBlaster {
        self.rays
    }

    /// Replaces the rays by the result of `f`
    pub(crate) fn map_rays<F>(mut self, f: F) -> Result<Self>
    where
        F: FnOnce(RayBlaster) -> Result<RayBlaster>,
    {
        self.rays = f(self.rays)?;
        Ok(self)
    }

    /// The position, in the array of rays, of the ray in column `i`
    /// and row `j`
    pub fn ray_index(&self, i: usize, j: usize) -> usize {
        i * self.grid.ny + j
    }

    /// Rearranges one value per ray (e.g., distances) into an image of `ny` rows
    /// and `nx` columns. Row `0` is the bottom of the grid (i.e., `-up`) and
    /// column `0` is its left side (i.e., `-east`).
    pub fn to_image<T: Copy>(&self, values: &[T]) -> Result<Vec<Vec<T>>> {
        if values.len() != self.rays.n_rays() {
            return Err(HothouseError::validation(format!(
                "expected one value per ray ({}), found {}",
                self.rays.n_rays(),
                values.len()
            )));
        }
        Ok((0..self.grid.ny)
            .map(|j| {
                (0..self.grid.nx)
                    .map(|i| values[self.ray_index(i, j)])
                    .collect()
            })
            .collect())
    }
}
