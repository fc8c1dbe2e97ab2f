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

use crate::scene::SolarPpfd;
use crate::solar::{ApparentSolarPosition, ClearSkyIrradiance, Irradiance, IrradianceComponents};
use crate::{Float, HothouseError, Model, Point3D, Result, Scene, TriangleSoup, Vector3D};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_up() -> Vector3D {
    Vector3D::Z
}

fn default_north() -> Vector3D {
    Vector3D::Y
}

fn default_resolution() -> usize {
    512
}

fn default_any_direction() -> bool {
    true
}

/// A plant (or any other object) in a simulation case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentOptions {
    /// The coordinates of each vertex of each triangle, as a
    /// flat `(N, 3, 3)` array
    pub triangles: Vec<Float>,

    /// Where to place the component. The coordinates in `triangles` are
    /// relative to this point.
    #[serde(default)]
    pub origin: Option<Point3D>,

    /// Rotation around the vertical axis, in radians
    #[serde(default)]
    pub axial_rotation: Float,
}

impl ComponentOptions {
    /// Builds the [`Model`] described by these options
    pub fn build(&self) -> Result<Model> {
        let model = Model::from_buffer(&self.triangles)?;
        if self.origin.is_none() && self.axial_rotation == 0.0 {
            return Ok(model);
        }
        model.clone_at(self.origin.unwrap_or(Point3D::ZERO), self.axial_rotation)
    }
}

/// A whole simulation case: a scene lit by the sun and the sky
/// at a certain place and time.
///
/// ```json
/// {
///     "latitude": 40.1164,
///     "longitude": -88.2434,
///     "date": "2020-06-17T16:00:00Z",
///     "nx": 256,
///     "ny": 256,
///     "components": [
///         { "triangles": [0,0,0, 1,0,0, 0,1,0], "origin": [2, 0, 0] }
///     ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationOptions {
    /// Latitude, in degrees (North is positive)
    pub latitude: Float,

    /// Longitude, in degrees (East is positive)
    pub longitude: Float,

    /// The date and time, in RFC 3339 format
    pub date: DateTime<Utc>,

    /// A point on the ground. Defaults to the origin.
    #[serde(default)]
    pub ground: Point3D,

    /// The vertical direction. Defaults to `[0, 0, 1]`.
    #[serde(default = "default_up")]
    pub up: Vector3D,

    /// The direction of North. Defaults to `[0, 1, 0]`.
    #[serde(default = "default_north")]
    pub north: Vector3D,

    /// Number of rays across the sun blaster. Defaults to 512.
    #[serde(default = "default_resolution")]
    pub nx: usize,

    /// Number of rays along the sun blaster. Defaults to 512.
    #[serde(default = "default_resolution")]
    pub ny: usize,

    /// Whether both faces of each triangle receive light. Defaults to `true`.
    #[serde(default = "default_any_direction")]
    pub any_direction: bool,

    /// Flux density of the sun, on a plane normal to it. Calculated with a
    /// [`ClearSkyIrradiance`] if not given.
    #[serde(default)]
    pub direct: Option<Float>,

    /// Flux density of the sky, on a horizontal plane. Calculated with a
    /// [`ClearSkyIrradiance`] if not given.
    #[serde(default)]
    pub diffuse: Option<Float>,

    /// If given, the rays are followed through up to this number of hits
    #[serde(default)]
    pub max_bounces: Option<usize>,

    /// The fraction of power kept by the rays after each bounce
    #[serde(default)]
    pub reflectance: Option<Float>,

    /// The objects in the scene
    pub components: Vec<ComponentOptions>,
}

impl std::str::FromStr for SimulationOptions {
    type Err = HothouseError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| HothouseError::Config(e.to_string()))
    }
}

impl SimulationOptions {
    /// Reads a simulation case from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HothouseError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        content.parse()
    }

    /// Builds the [`Scene`] described by these options
    pub fn build_scene(&self) -> Result<Scene> {
        let mut soup = TriangleSoup::new();
        if let Some(r) = self.reflectance {
            soup = soup.with_reflectance(r)?;
        }
        let mut scene = Scene::with_oracle(soup, self.ground, self.up, self.north)?;
        if let Some(n) = self.max_bounces {
            scene = scene.with_sun_bounces(n);
        }
        for (i, c) in self.components.iter().enumerate() {
            let model = c.build().map_err(|e| match e {
                HothouseError::Validation(msg) => {
                    HothouseError::Validation(format!("component {}: {}", i, msg))
                }
                e => e,
            })?;
            scene.add_component(model)?;
        }
        Ok(scene)
    }

    /// The flux densities of the sun and the sky. Those not given
    /// explicitly are calculated with a [`ClearSkyIrradiance`].
    pub fn irradiance(&self) -> IrradianceComponents {
        let clear_sky = match (self.direct, self.diffuse) {
            (Some(_), Some(_)) => IrradianceComponents::default(),
            _ => ClearSkyIrradiance::default().irradiance(
                self.latitude,
                self.longitude,
                &self.date,
            ),
        };
        IrradianceComponents {
            direct: self.direct.unwrap_or(clear_sky.direct),
            diffuse: self.diffuse.unwrap_or(clear_sky.diffuse),
        }
    }

    /// Builds the scene and lights it
    pub fn run(&self) -> Result<SolarPpfd> {
        let scene = self.build_scene()?;
        let irradiance = self.irradiance();
        log::info!(
            "{} components, direct = {:.3}, diffuse = {:.3}",
            scene.components().len(),
            irradiance.direct,
            irradiance.diffuse
        );
        scene.compute_solar_ppfd(
            self.latitude,
            self.longitude,
            self.date,
            self.nx,
            self.ny,
            self.any_direction,
            &ApparentSolarPosition,
            &irradiance,
        )
    }
}
