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

use crate::blaster::{CameraBasis, GridOptions, OrthographicRayBlaster, RayBlaster};
use crate::geometry::{check_direction, rotate};
use crate::solar::SolarPosition;
use crate::{Float, HothouseError, Point3D, Result, Vector3D, PI};
use chrono::{DateTime, Utc};

/// Where and when the sun is being simulated, and how the
/// scene is oriented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunParameters {
    /// Latitude, in degrees (North is positive)
    pub latitude: Float,
    /// Longitude, in degrees (East is positive)
    pub longitude: Float,
    /// The date and time
    pub date: DateTime<Utc>,
    /// A point on the ground, which all rays will be aimed at.
    pub ground: Point3D,
    /// A point directly above `ground`. Its distance to `ground` is the
    /// distance between the grid of rays and the ground.
    pub zenith: Point3D,
    /// The direction of North in the scene
    pub north: Vector3D,
}

/// Calculates the orientation of a grid of rays that reproduces the sunlight arriving
/// at `ground` when the sun is at a certain `altitude` and `azimuth` (in degrees,
/// the azimuth measured clockwise from `north`).
///
/// Returns the basis and the distance between the grid and `ground`.
pub fn sun_aligned_basis(
    ground: Point3D,
    zenith: Point3D,
    north: Vector3D,
    altitude: Float,
    azimuth: Float,
    height: Float,
) -> Result<(CameraBasis, Float)> {
    if !ground.is_finite() || !zenith.is_finite() {
        return Err(HothouseError::validation(format!(
            "ground ({:?}) and zenith ({:?}) must be finite",
            ground, zenith
        )));
    }
    let north = check_direction(north, "north")?;
    let zenith_direction = check_direction(zenith - ground, "zenith - ground")?;
    let solar_distance = zenith_direction.length();
    let zenith_direction = zenith_direction / solar_distance;
    // Only the horizontal part of North matters, and only its direction
    let north = north - zenith_direction * north.dot(zenith_direction);
    if north.length() < 1e-6 {
        return Err(HothouseError::validation(
            "'north' cannot be parallel to the zenith",
        ));
    }
    let north = north.normalize();
    let east = north.cross(zenith_direction);

    let altitude = altitude.to_radians();
    let azimuth = azimuth.to_radians();

    // Tilt down to the sun's altitude (around North), then sweep to its
    // azimuth (around the zenith).
    let align = |v: Vector3D| -> Result<Vector3D> {
        let tilted = rotate(v, PI / 2. - altitude, north)?;
        rotate(tilted, PI / 2. - azimuth, zenith_direction)
    };
    let forward = -align(zenith_direction)?;
    let up = -align(east)?;

    let mut center = ground - forward * solar_distance;
    let offset = ((height / 2. - (solar_distance * altitude.tan()).abs()) / 2.).max(0.0);
    center += up * offset;

    let basis = CameraBasis::new(center, forward, up)?;
    Ok((basis, solar_distance))
}

/// An [`OrthographicRayBlaster`] that reproduces the direct sunlight
/// arriving at a certain place and time.
#[derive(Debug, Clone)]
pub struct SunRayBlaster {
    parameters: SunParameters,
    solar_altitude: Float,
    solar_azimuth: Float,
    solar_distance: Float,
    blaster: OrthographicRayBlaster,
}

impl SunRayBlaster {
    /// Creates a new `SunRayBlaster`. Fails if the sun is below the horizon.
    pub fn new(
        parameters: SunParameters,
        grid: GridOptions,
        intensity: Float,
        solar: &dyn SolarPosition,
    ) -> Result<Self> {
        let angles = solar.solar_angles(parameters.latitude, parameters.longitude, &parameters.date);
        if angles.apparent_elevation < 0.0 {
            return Err(HothouseError::Domain(format!(
                "the sun is below the horizon (elevation of {:.3} degrees) at latitude {}, longitude {} on {}",
                angles.apparent_elevation, parameters.latitude, parameters.longitude, parameters.date
            )));
        }

        let (basis, solar_distance) = sun_aligned_basis(
            parameters.ground,
            parameters.zenith,
            parameters.north,
            angles.apparent_elevation,
            angles.azimuth,
            grid.height,
        )?;
        let blaster = OrthographicRayBlaster::new(basis, grid, intensity)?;

        Ok(Self {
            parameters,
            solar_altitude: angles.apparent_elevation,
            solar_azimuth: angles.azimuth,
            solar_distance,
            blaster,
        })
    }

    /// Sets the flux density of the sky
    pub fn with_diffuse_intensity(mut self, diffuse_intensity: Float) -> Result<Self> {
        self.blaster = self
            .blaster
            .map_rays(|r| r.with_diffuse_intensity(diffuse_intensity))?;
        Ok(self)
    }

    /// Makes the rays be followed through up to `max_bounces` hits
    pub fn with_bounces(mut self, max_bounces: usize) -> Result<Self> {
        self.blaster = self.blaster.map_rays(|r| Ok(r.with_bounces(max_bounces)))?;
        Ok(self)
    }

    /// The location and date of this sun
    pub fn parameters(&self) -> &SunParameters {
        &self.parameters
    }

    /// Apparent altitude of the sun, in degrees
    pub fn solar_altitude(&self) -> Float {
        self.solar_altitude
    }

    /// Azimuth of the sun (clockwise from North), in degrees
    pub fn solar_azimuth(&self) -> Float {
        self.solar_azimuth
    }

    /// Distance between `ground` and `zenith`
    pub fn solar_distance(&self) -> Float {
        self.solar_distance
    }

    /// The center of the grid of rays
    pub fn center(&self) -> Point3D {
        self.blaster.basis().center
    }

    /// The direction of the rays... from the sun towards the ground
    pub fn forward(&self) -> Vector3D {
        self.blaster.basis().forward
    }

    /// The vertical axis of the grid of rays
    pub fn up(&self) -> Vector3D {
        self.blaster.basis().up
    }

    /// The underlying grid
    pub fn orthographic(&self) -> &OrthographicRayBlaster {
        &self.blaster
    }

    /// The rays
    pub fn rays(&self) -> &RayBlaster {
        self.blaster.rays()
    }
}
