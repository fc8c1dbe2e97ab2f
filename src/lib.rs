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

#![deny(missing_docs)]

//! A ray-casting engine for estimating the photosynthetically active light
//! that reaches each triangle of a 3-D plant canopy. It is responsible for:
//!
//! * **Generating rays**: [`OrthographicRayBlaster`] produces a regular grid of parallel rays
//! (i.e., an orthographic camera) and [`SunRayBlaster`] orients such a grid so that it
//! reproduces the direct sunlight arriving at a location and time.
//! * **Casting them**: a [`Scene`] holds the plant [`Model`]s and hands the rays to an
//! [`IntersectionOracle`]. [`TriangleSoup`] is the oracle shipped with this crate, but anything
//! that can answer nearest-hit queries over a set of triangles will do.
//! * **Accumulating flux**: hits are turned into flux densities on each triangle, weighted by their
//! angle of incidence, with an isotropic sky contributing the diffuse part.

/// The kind of Floating point number used in the
/// library... the `"float"` feature means it becomes `f32`
/// and `f64` is used otherwise.
#[cfg(feature = "float")]
pub type Float = f32;
/// Well, Pi.
#[cfg(feature = "float")]
pub const PI: Float = std::f32::consts::PI;
/// A point in space
#[cfg(feature = "float")]
pub type Point3D = glam::Vec3;
/// A direction in space
#[cfg(feature = "float")]
pub type Vector3D = glam::Vec3;
/// A 3x3 matrix, used for rotations
#[cfg(feature = "float")]
pub type Matrix3 = glam::Mat3;

/// The kind of Floating point number used in the
/// library... the `"float"` feature means it becomes `f32`
/// and `f64` is used otherwise.
#[cfg(not(feature = "float"))]
pub type Float = f64;
/// Well, Pi.
#[cfg(not(feature = "float"))]
pub const PI: Float = std::f64::consts::PI;
/// A point in space
#[cfg(not(feature = "float"))]
pub type Point3D = glam::DVec3;
/// A direction in space
#[cfg(not(feature = "float"))]
pub type Vector3D = glam::DVec3;
/// A 3x3 matrix, used for rotations
#[cfg(not(feature = "float"))]
pub type Matrix3 = glam::DMat3;

/// Three vertices, in counterclockwise order when seen from the front.
pub type Triangle = [Point3D; 3];

mod error;
pub use error::{HothouseError, Result};

/// Validation of raw buffers and rotations about arbitrary axes
pub mod geometry;
pub use geometry::{rotate, rotation_matrix};

mod model;
pub use model::Model;

/// Rays, and the grids of rays that represent cameras and light sources.
pub mod blaster;
pub use blaster::{CameraBasis, GridOptions, OrthographicRayBlaster, RayBlaster};

mod sun_blaster;
pub use sun_blaster::{sun_aligned_basis, SunParameters, SunRayBlaster};

/// Solar position and irradiance models
pub mod solar;
pub use crate::solar::{
    ApparentSolarPosition, ClearSkyIrradiance, Irradiance, IrradianceComponents, SolarAngles,
    SolarPosition,
};

/// The contract of the ray/triangle intersection engine
pub mod oracle;
pub use oracle::{BounceRecord, GeometryId, Hit, IntersectionOracle, QueryType};

mod triangle_soup;
pub use triangle_soup::TriangleSoup;

/// Transforms hits into flux densities
pub mod accumulator;

mod scene;
pub use scene::{Scene, SolarPpfd};

/// Options for running a whole case from a file
pub mod options;
pub use options::{ComponentOptions, SimulationOptions};
