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

use crate::Float;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ::solar::{Solar, Time};

/// The position of the sun in the sky, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarAngles {
    /// Angle above the horizon, corrected for atmospheric refraction.
    /// Negative when the sun is below the horizon.
    pub apparent_elevation: Float,

    /// Angle measured clockwise from North (i.e., East is 90)
    pub azimuth: Float,
}

/// Something that knows where the sun is
pub trait SolarPosition {
    /// Calculates the position of the sun as seen from `latitude` and
    /// `longitude` (in degrees, East and North are positive) at a certain `date`
    fn solar_angles(&self, latitude: Float, longitude: Float, date: &DateTime<Utc>) -> SolarAngles;
}

/// The direct (normal) and diffuse (horizontal) flux densities
/// produced by the sun and the sky
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrradianceComponents {
    /// Flux density on a plane normal to the sun
    pub direct: Float,

    /// Flux density coming from the sky on a horizontal plane
    pub diffuse: Float,
}

/// Something that knows how much light comes from the sun and the sky
pub trait Irradiance {
    /// Calculates the direct and diffuse components at a certain location and date
    fn irradiance(
        &self,
        latitude: Float,
        longitude: Float,
        date: &DateTime<Utc>,
    ) -> IrradianceComponents;
}

/// Constant irradiance, regardless of the location and date
impl Irradiance for IrradianceComponents {
    fn irradiance(&self, _: Float, _: Float, _: &DateTime<Utc>) -> IrradianceComponents {
        *self
    }
}

/// The position of the sun as calculated by the `solar` crate, corrected
/// for atmospheric refraction.
///
/// The `solar` crate does not resolve the position of the sun when it is below
/// the horizon. In that case, the elevation is reported as `-90` degrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApparentSolarPosition;

/// Days since January 1st 00:00 (UTC), including the fraction of the current day
fn day_of_year(date: &DateTime<Utc>) -> Float {
    date.ordinal0() as Float + date.num_seconds_from_midnight() as Float / 86400.
}

/// Refraction correction, in degrees, for a certain (geometric) `elevation` in degrees
fn refraction(elevation: f64) -> f64 {
    let te = elevation.to_radians().tan();
    let arc_seconds = if elevation > 85. {
        0.0
    } else if elevation > 5. {
        58.1 / te - 0.07 / te.powi(3) + 0.000086 / te.powi(5)
    } else if elevation > -0.575 {
        1735. + elevation * (-518.2 + elevation * (103.4 + elevation * (-12.79 + elevation * 0.711)))
    } else {
        -20.772 / te
    };
    arc_seconds / 3600.
}

impl SolarPosition for ApparentSolarPosition {
    fn solar_angles(&self, latitude: Float, longitude: Float, date: &DateTime<Utc>) -> SolarAngles {
        // `solar` works in radians, with longitudes growing towards the West.
        // Dates are in UTC, so the standard meridian is Greenwich.
        let solar = Solar::new(latitude.to_radians(), -longitude.to_radians(), 0.0);
        let direction = match solar.sun_position(Time::Standard(day_of_year(date))) {
            Some(d) => d,
            None => {
                return SolarAngles {
                    apparent_elevation: -90.,
                    azimuth: 0.,
                }
            }
        };

        // X points East, Y points North and Z points up
        let (x, y, z) = (direction.x as f64, direction.y as f64, direction.z as f64);
        let elevation = z.atan2((x * x + y * y).sqrt()).to_degrees();
        let azimuth = x.atan2(y).to_degrees().rem_euclid(360.);

        SolarAngles {
            apparent_elevation: (elevation + refraction(elevation)) as Float,
            azimuth: azimuth as Float,
        }
    }
}

/// The units in which [`ClearSkyIrradiance`] reports its results
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrradianceUnits {
    /// W/m2 of solar radiation
    Watts,

    /// Photosynthetic Photon Flux Density, in µmol/m2/s
    #[default]
    Ppfd,
}

/// A very simple clear-sky model. The direct radiation is the extraterrestrial
/// irradiance attenuated following Meinel's model, with an air mass calculated
/// for a homogeneous spherical atmosphere. The diffuse component is a fixed
/// fraction of the direct one.
#[derive(Debug, Clone, Copy)]
pub struct ClearSkyIrradiance {
    /// The units of the results
    pub units: IrradianceUnits,

    /// The ratio between diffuse horizontal and direct normal irradiance
    pub diffuse_fraction: Float,
}

impl Default for ClearSkyIrradiance {
    fn default() -> Self {
        Self {
            units: IrradianceUnits::Ppfd,
            diffuse_fraction: 0.1,
        }
    }
}

impl ClearSkyIrradiance {
    /// Solar constant, in W/m2
    const SOLAR_CONSTANT: f64 = 1367.;

    /// Fraction of solar radiation that is photosynthetically active
    const ETA_PAR: f64 = 0.368;

    /// µmol of photons per Joule of PAR
    const ETA_PHOTON: f64 = 4.56;

    /// Earth's radius divided by the thickness of the (homogeneous) atmosphere
    const EARTH_TO_ATMOSPHERE: f64 = 6370. / 7.991;

    /// Relative optical air mass for a certain zenith angle, in radians
    fn air_mass(zenith: f64) -> f64 {
        let r = Self::EARTH_TO_ATMOSPHERE;
        let rc = r * zenith.cos();
        (rc * rc + 2. * r + 1.).sqrt() - rc
    }
}

impl Irradiance for ClearSkyIrradiance {
    fn irradiance(
        &self,
        latitude: Float,
        longitude: Float,
        date: &DateTime<Utc>,
    ) -> IrradianceComponents {
        let angles = ApparentSolarPosition.solar_angles(latitude, longitude, date);
        if angles.apparent_elevation <= 0.0 {
            return IrradianceComponents::default();
        }
        let zenith = (90. - angles.apparent_elevation as f64).to_radians();

        let day = date.ordinal() as f64;
        let extraterrestrial =
            Self::SOLAR_CONSTANT * (1. + 0.034 * (2. * std::f64::consts::PI * day / 365.25).cos());

        let air_mass = Self::air_mass(zenith);
        let mut direct = extraterrestrial * (0.7_f64).powf(air_mass.powf(0.678));
        if self.units == IrradianceUnits::Ppfd {
            direct *= Self::ETA_PAR * Self::ETA_PHOTON;
        }

        IrradianceComponents {
            direct: direct as Float,
            diffuse: self.diffuse_fraction * direct as Float,
        }
    }
}
