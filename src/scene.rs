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

use crate::accumulator::{
    diffuse_flux, fold_bounces, fold_parallel, fold_rays, histogram, zeros,
};
use crate::blaster::{GridOptions, RayBlaster};
use crate::geometry::check_direction;
use crate::oracle::{Hit, IntersectionOracle, QueryType};
use crate::solar::{Irradiance, IrradianceComponents, SolarPosition};
use crate::sun_blaster::{SunParameters, SunRayBlaster};
use crate::{Float, HothouseError, Model, Point3D, Result, TriangleSoup, Vector3D};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A set of [`Model`]s (e.g., plants) that can be lit by
/// [`RayBlaster`]s.
///
/// The triangles of each component are registered in an [`IntersectionOracle`]
/// under a [`GeometryId`](crate::GeometryId) that matches the index of the
/// component.
#[derive(Debug, Clone)]
pub struct Scene<O: IntersectionOracle = TriangleSoup> {
    components: Vec<Model>,

    /// A point on the ground
    ground: Point3D,

    /// The vertical direction
    up: Vector3D,

    /// The direction of North
    north: Vector3D,

    /// If `Some(n)`, the sun blasters produced by this scene
    /// follow each ray through up to `n` hits
    sun_bounces: Option<usize>,

    oracle: O,
}

/// The results of lighting a [`Scene`] with the sun and the sky
#[derive(Debug, Clone, Serialize)]
pub struct SolarPpfd {
    /// Apparent altitude of the sun, in degrees
    pub solar_altitude: Float,

    /// Azimuth of the sun (clockwise from North), in degrees
    pub solar_azimuth: Float,

    /// The flux densities of the sun and the sky
    pub irradiance: IrradianceComponents,

    /// The flux density on each triangle of each component
    pub flux: Vec<Vec<Float>>,
}

impl Scene<TriangleSoup> {
    /// Creates an empty `Scene` backed by a [`TriangleSoup`]
    pub fn new(ground: Point3D, up: Vector3D, north: Vector3D) -> Result<Self> {
        Self::with_oracle(TriangleSoup::new(), ground, up, north)
    }
}

impl<O: IntersectionOracle> Scene<O> {
    /// Creates an empty `Scene` backed by an arbitrary `oracle`, which
    /// needs to be empty as well.
    pub fn with_oracle(oracle: O, ground: Point3D, up: Vector3D, north: Vector3D) -> Result<Self> {
        if oracle.n_geometries() != 0 {
            return Err(HothouseError::validation(format!(
                "a new Scene needs an empty oracle, but it has {} geometries",
                oracle.n_geometries()
            )));
        }
        if !ground.is_finite() {
            return Err(HothouseError::validation(format!(
                "ground must be finite... found {:?}",
                ground
            )));
        }
        let up = check_direction(up, "up")?;
        let north = check_direction(north, "north")?;
        if up.cross(north).length() < 1e-6 * up.length() * north.length() {
            return Err(HothouseError::validation("'up' and 'north' cannot be parallel"));
        }
        Ok(Self {
            components: Vec::new(),
            ground,
            up,
            north,
            sun_bounces: None,
            oracle,
        })
    }

    /// Makes the sun blasters produced by [`Scene::get_sun_blaster`] follow
    /// their rays through up to `max_bounces` hits
    pub fn with_sun_bounces(mut self, max_bounces: usize) -> Self {
        self.sun_bounces = Some(max_bounces);
        self
    }

    /// The components in the scene
    pub fn components(&self) -> &[Model] {
        &self.components
    }

    /// A point on the ground
    pub fn ground(&self) -> Point3D {
        self.ground
    }

    /// The vertical direction
    pub fn up(&self) -> Vector3D {
        self.up
    }

    /// The direction of North
    pub fn north(&self) -> Vector3D {
        self.north
    }

    /// The intersection engine
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Adds a component, returning its index.
    ///
    /// Nothing is registered if the oracle is already out of step with
    /// the components of the scene.
    pub fn add_component(&mut self, model: Model) -> Result<usize> {
        let expected = self.components.len();
        if self.oracle.n_geometries() != expected {
            return Err(HothouseError::oracle(format!(
                "the oracle holds {} geometries but the scene has {} components",
                self.oracle.n_geometries(),
                expected
            )));
        }
        let id = self.oracle.register(model.triangles())?;
        if id != expected {
            return Err(HothouseError::oracle(format!(
                "registered component {} but got geometry id {}",
                expected, id
            )));
        }
        self.components.push(model);
        Ok(id)
    }

    /// The largest distance between `point` and any vertex in the scene.
    /// Zero if the scene is empty.
    pub fn maximum_distance(&self, point: Point3D) -> Float {
        self.components
            .iter()
            .map(|c| c.max_distance_from(point))
            .fold(0.0, Float::max)
    }

    fn cast(&self, blaster: &RayBlaster, query: QueryType) -> Result<Vec<Hit>> {
        let hits = self
            .oracle
            .query(blaster.origins(), blaster.directions(), query)?;
        if hits.len() != blaster.n_rays() {
            return Err(HothouseError::oracle(format!(
                "received {} hits for {} rays",
                hits.len(),
                blaster.n_rays()
            )));
        }
        let n_hits = hits.iter().filter(|h| !h.is_miss()).count();
        log::debug!("{} out of {} rays hit the scene", n_hits, hits.len());
        if n_hits == 0 {
            log::warn!("none of the {} rays hit the scene", hits.len());
        }
        Ok(hits)
    }

    /// Counts how many rays of `blaster` hit each triangle of each component
    pub fn compute_hit_count(&self, blaster: &RayBlaster) -> Result<Vec<Vec<u32>>> {
        let hits = self.cast(blaster, QueryType::Intersect)?;
        histogram(&self.components, &hits)
    }

    /// The distance travelled by each ray of `blaster` until it hits something
    /// (in units of the length of its direction). Rays that miss get
    /// `Float::INFINITY`.
    pub fn compute_distance(&self, blaster: &RayBlaster) -> Result<Vec<Float>> {
        let hits = self.cast(blaster, QueryType::Distance)?;
        Ok(hits.iter().map(|h| h.distance).collect())
    }

    /// Calculates the flux density on each triangle of each component, produced
    /// by all the `light_sources` together.
    ///
    /// If `any_direction` is `true`, both faces of each triangle receive light.
    /// Otherwise, light reaching the back of a triangle is lost.
    pub fn compute_flux_density(
        &self,
        light_sources: &[&RayBlaster],
        any_direction: bool,
    ) -> Result<Vec<Vec<Float>>> {
        let mut flux = zeros::<Float>(&self.components);
        for source in light_sources {
            let ray_intensity = source.ray_intensity();
            match source.max_bounces() {
                Some(max_bounces) => {
                    let bounces = self.oracle.query_bounces(
                        source.origins(),
                        source.directions(),
                        max_bounces,
                    )?;
                    if bounces.len() != source.n_rays() {
                        return Err(HothouseError::oracle(format!(
                            "received bounces for {} rays, but {} were cast",
                            bounces.len(),
                            source.n_rays()
                        )));
                    }
                    log::debug!(
                        "{} rays produced {} hits, following up to {} bounces",
                        bounces.len(),
                        bounces.iter().map(|b| b.len()).sum::<usize>(),
                        max_bounces
                    );
                    fold_bounces(
                        &self.components,
                        &bounces,
                        ray_intensity,
                        any_direction,
                        &mut flux,
                    )?;
                }
                None => {
                    let hits = self.cast(source, QueryType::Intersect)?;
                    match source.parallel_direction() {
                        Some(direction) => fold_parallel(
                            &self.components,
                            &hits,
                            direction,
                            ray_intensity,
                            any_direction,
                            &mut flux,
                        )?,
                        None => fold_rays(
                            &self.components,
                            &hits,
                            source.directions(),
                            ray_intensity,
                            any_direction,
                            &mut flux,
                        )?,
                    }
                }
            }

            let diffuse = source.diffuse_intensity();
            if diffuse > 0.0 {
                for (model, flux) in self.components.iter().zip(flux.iter_mut()) {
                    let sky = diffuse_flux(model, self.up, diffuse, any_direction)?;
                    for (f, s) in flux.iter_mut().zip(sky.iter()) {
                        *f += s;
                    }
                }
            }
        }
        Ok(flux)
    }

    /// Builds a [`SunRayBlaster`] large enough to light the whole scene.
    ///
    /// The rays are launched from twice the radius of the scene (measured from
    /// `ground`) and cover a square four times that radius wide. `irradiance` gives
    /// the direct (normal) flux density of the sun and the diffuse flux density of the sky.
    #[allow(clippy::too_many_arguments)]
    pub fn get_sun_blaster(
        &self,
        latitude: Float,
        longitude: Float,
        date: DateTime<Utc>,
        nx: usize,
        ny: usize,
        irradiance: IrradianceComponents,
        solar: &dyn SolarPosition,
    ) -> Result<SunRayBlaster> {
        let radius = self.maximum_distance(self.ground);
        if radius <= 0.0 {
            return Err(HothouseError::validation(
                "cannot size a sun blaster for a scene with no extent",
            ));
        }
        let zenith = self.ground + self.up.normalize() * (2. * radius);
        let side = 4. * radius;
        log::info!(
            "sun blaster of {}x{} rays over {:.3}x{:.3}, launched {:.3} away from the ground",
            nx,
            ny,
            side,
            side,
            2. * radius
        );

        let parameters = SunParameters {
            latitude,
            longitude,
            date,
            ground: self.ground,
            zenith,
            north: self.north,
        };
        let grid = GridOptions {
            width: side,
            height: side,
            nx,
            ny,
        };
        let blaster = SunRayBlaster::new(parameters, grid, irradiance.direct * side * side, solar)?
            .with_diffuse_intensity(irradiance.diffuse)?;
        match self.sun_bounces {
            Some(n) => blaster.with_bounces(n),
            None => Ok(blaster),
        }
    }

    /// Lights the scene with the sun and the sky at a certain location and date.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_solar_ppfd(
        &self,
        latitude: Float,
        longitude: Float,
        date: DateTime<Utc>,
        nx: usize,
        ny: usize,
        any_direction: bool,
        solar: &dyn SolarPosition,
        sky: &dyn Irradiance,
    ) -> Result<SolarPpfd> {
        let irradiance = sky.irradiance(latitude, longitude, &date);
        let blaster = self.get_sun_blaster(latitude, longitude, date, nx, ny, irradiance, solar)?;
        let flux = self.compute_flux_density(&[blaster.rays()], any_direction)?;
        Ok(SolarPpfd {
            solar_altitude: blaster.solar_altitude(),
            solar_azimuth: blaster.solar_azimuth(),
            irradiance,
            flux,
        })
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::blaster::{CameraBasis, OrthographicRayBlaster};
    use crate::oracle::{BounceRecord, GeometryId};
    use crate::solar::SolarAngles;
    use crate::{rotate, Triangle, PI};
    use chrono::TimeZone;

    struct FixedSun(SolarAngles);
    impl SolarPosition for FixedSun {
        fn solar_angles(&self, _: Float, _: Float, _: &DateTime<Utc>) -> SolarAngles {
            self.0
        }
    }

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

    fn empty_scene() -> Scene {
        Scene::new(Point3D::ZERO, Vector3D::Z, Vector3D::Y).unwrap()
    }

    fn looking_down(center: Point3D, side: Float, n: usize, intensity: Float) -> RayBlaster {
        let basis = CameraBasis::new(center, -Vector3D::Z, Vector3D::Y).unwrap();
        let grid = GridOptions {
            width: side,
            height: side,
            nx: n,
            ny: n,
        };
        OrthographicRayBlaster::new(basis, grid, intensity)
            .unwrap()
            .into_rays()
    }

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new() {
        assert!(Scene::new(Point3D::ZERO, Vector3D::Z, Vector3D::Z).is_err());
        assert!(Scene::new(Point3D::ZERO, Vector3D::ZERO, Vector3D::Y).is_err());

        let mut soup = TriangleSoup::new();
        soup.register(&square(0.)).unwrap();
        assert!(Scene::with_oracle(soup, Point3D::ZERO, Vector3D::Z, Vector3D::Y).is_err());
    }

    #[test]
    fn test_add_component() {
        let mut scene = empty_scene();
        assert_eq!(scene.add_component(Model::new(square(0.)).unwrap()).unwrap(), 0);
        assert_eq!(scene.add_component(Model::new(square(1.)).unwrap()).unwrap(), 1);
        assert_eq!(scene.components().len(), 2);
        assert_eq!(scene.oracle().n_geometries(), 2);
        assert!((scene.maximum_distance(Point3D::ZERO) - (3. as Float).sqrt()).abs() < 1e-9);
    }

    /// Shares its geometries with someone else, who can add more behind
    /// the back of the scene.
    struct SharedOracle {
        soup: TriangleSoup,
        foreign: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl IntersectionOracle for SharedOracle {
        fn register(&mut self, triangles: &[Triangle]) -> Result<GeometryId> {
            Ok(self.soup.register(triangles)? + self.foreign.get())
        }

        fn n_geometries(&self) -> usize {
            self.soup.n_geometries() + self.foreign.get()
        }

        fn query(
            &self,
            origins: &[Point3D],
            directions: &[Vector3D],
            query: QueryType,
        ) -> Result<Vec<Hit>> {
            self.soup.query(origins, directions, query)
        }

        fn query_bounces(
            &self,
            origins: &[Point3D],
            directions: &[Vector3D],
            max_bounces: usize,
        ) -> Result<Vec<Vec<BounceRecord>>> {
            self.soup.query_bounces(origins, directions, max_bounces)
        }
    }

    #[test]
    fn test_add_component_out_of_step() {
        let foreign = std::rc::Rc::new(std::cell::Cell::new(0));
        let oracle = SharedOracle {
            soup: TriangleSoup::new(),
            foreign: foreign.clone(),
        };
        let mut scene = Scene::with_oracle(oracle, Point3D::ZERO, Vector3D::Z, Vector3D::Y).unwrap();
        assert_eq!(scene.add_component(Model::new(square(0.)).unwrap()).unwrap(), 0);

        // Someone else registers a geometry
        foreign.set(1);
        let err = scene
            .add_component(Model::new(square(1.)).unwrap())
            .unwrap_err();
        assert!(matches!(err, HothouseError::Oracle(_)));

        // ... and nothing was added
        assert_eq!(scene.components().len(), 1);
        assert_eq!(scene.oracle().soup.n_geometries(), 1);
    }

    #[test]
    fn test_hit_count() {
        let mut scene = empty_scene();
        scene.add_component(Model::new(square(0.)).unwrap()).unwrap();

        // 3x3 of the 5x5 rays land on the square: 3 on the first triangle
        // and 6 on the second one.
        let blaster = looking_down(Point3D::new(0.1, 0.05, 10.), 3.2, 5, 1.);
        let count = scene.compute_hit_count(&blaster).unwrap();
        assert_eq!(count, vec![vec![3, 6]]);

        let distance = scene.compute_distance(&blaster).unwrap();
        assert_eq!(distance.len(), 25);
        assert_eq!(distance.iter().filter(|d| d.is_infinite()).count(), 16);
        assert!(distance
            .iter()
            .filter(|d| d.is_finite())
            .all(|d| (d - 10.).abs() < 1e-9));
    }

    #[test]
    fn test_hit_count_empty_scene() {
        let scene = empty_scene();
        let blaster = looking_down(Point3D::new(0., 0., 10.), 1., 2, 1.);
        let err = scene.compute_hit_count(&blaster).unwrap_err();
        assert!(matches!(err, HothouseError::Oracle(_)));
    }

    #[test]
    fn test_front_and_back() {
        let front = vec![[
            Point3D::new(-1., -1., 0.),
            Point3D::new(1., 0., 0.),
            Point3D::new(-1., 1., 0.),
        ]];
        let back: Vec<Triangle> = vec![[
            rotate(front[0][0], PI, Vector3D::X).unwrap(),
            rotate(front[0][1], PI, Vector3D::X).unwrap(),
            rotate(front[0][2], PI, Vector3D::X).unwrap(),
        ]];

        // 10 out of 25 rays hit the triangle, whose area is 2
        let blaster = looking_down(Point3D::new(0.05, 0.03, 5.), 2., 5, 25.);
        let expected = 10. * 1. / 2.;

        let flux = |triangles: Vec<Triangle>, any_direction: bool| -> Float {
            let mut scene = empty_scene();
            scene.add_component(Model::new(triangles).unwrap()).unwrap();
            scene.compute_flux_density(&[&blaster], any_direction).unwrap()[0][0]
        };

        assert!((flux(front.clone(), true) - expected).abs() < 1e-9);
        assert!((flux(front, false) - expected).abs() < 1e-9);
        assert!((flux(back.clone(), true) - expected).abs() < 1e-9);
        assert_eq!(flux(back, false), 0.0);
    }

    #[test]
    fn test_diffuse() {
        let mut scene = empty_scene();
        scene.add_component(Model::new(square(0.)).unwrap()).unwrap();
        let wall = vec![[
            Point3D::new(5., 0., 0.),
            Point3D::new(5., 1., 0.),
            Point3D::new(5., 0., 1.),
        ]];
        scene.add_component(Model::new(wall).unwrap()).unwrap();

        // This misses everything
        let blaster = looking_down(Point3D::new(100., 100., 10.), 1., 2, 1.)
            .with_diffuse_intensity(100.)
            .unwrap();
        let flux = scene.compute_flux_density(&[&blaster], false).unwrap();
        assert!((flux[0][0] - 100.).abs() < 1e-9);
        assert!((flux[0][1] - 100.).abs() < 1e-9);
        assert!((flux[1][0] - 50.).abs() < 1e-9);

        // Added once per source
        let flux = scene
            .compute_flux_density(&[&blaster, &blaster], false)
            .unwrap();
        assert!((flux[0][0] - 200.).abs() < 1e-9);
    }

    #[test]
    fn test_divergent_rays() {
        let mut scene = empty_scene();
        scene.add_component(Model::new(square(0.)).unwrap()).unwrap();
        let origin = Point3D::new(0.1, 0.2, 1.);
        let blaster = RayBlaster::new(
            vec![origin, origin],
            vec![Vector3D::new(0., 0., -1.), Vector3D::new(0.5, 0.3, -1.)],
            2.,
        )
        .unwrap();
        assert!(blaster.parallel_direction().is_none());
        let flux = scene.compute_flux_density(&[&blaster], false).unwrap();

        // Both rays hit the second triangle (area 2), each carrying 1.
        let cos = 1. / (0.5 as Float * 0.5 + 0.3 * 0.3 + 1.).sqrt();
        assert_eq!(flux[0][0], 0.0);
        assert!((flux[0][1] - (1. + cos) / 2.).abs() < 1e-9);
    }

    #[test]
    fn test_bounces() {
        let soup = TriangleSoup::new().with_reflectance(0.5).unwrap();
        let mut scene = Scene::with_oracle(soup, Point3D::ZERO, Vector3D::Z, Vector3D::Y).unwrap();
        scene.add_component(Model::new(square(0.)).unwrap()).unwrap();
        scene.add_component(Model::new(square(1.)).unwrap()).unwrap();

        let blaster = RayBlaster::new(
            vec![Point3D::new(0.1, 0.2, 0.5)],
            vec![Vector3D::new(0., 0., -1.)],
            1.,
        )
        .unwrap()
        .with_bounces(2);

        // The floor receives the ray; the ceiling receives half of it, on its back
        let flux = scene.compute_flux_density(&[&blaster], true).unwrap();
        assert!((flux[0][1] - 0.5).abs() < 1e-9);
        assert!((flux[1][1] - 0.25).abs() < 1e-9);
        assert_eq!(flux[0][0], 0.0);

        let flux = scene.compute_flux_density(&[&blaster], false).unwrap();
        assert!((flux[0][1] - 0.5).abs() < 1e-9);
        assert_eq!(flux[1][1], 0.0);
    }

    #[test]
    fn test_sun_blaster() {
        let mut scene = empty_scene();
        let overhead = FixedSun(SolarAngles {
            apparent_elevation: 90.,
            azimuth: 180.,
        });
        let irradiance = IrradianceComponents {
            direct: 1000.,
            diffuse: 0.,
        };

        // Nothing to size the blaster with
        assert!(scene
            .get_sun_blaster(40., -88., date(), 10, 10, irradiance, &overhead)
            .is_err());

        scene.add_component(Model::new(square(0.)).unwrap()).unwrap();
        let radius = (2. as Float).sqrt();
        let blaster = scene
            .get_sun_blaster(40., -88., date(), 101, 101, irradiance, &overhead)
            .unwrap();
        assert!((blaster.solar_distance() - 2. * radius).abs() < 1e-9);
        assert!((blaster.center() - Point3D::new(0., 0., 2. * radius)).length() < 1e-6);
        assert!((blaster.forward() + Vector3D::Z).length() < 1e-6);
        let grid = blaster.orthographic().grid();
        assert!((grid.width - 4. * radius).abs() < 1e-9);
        assert!((blaster.rays().intensity() - 1000. * 16. * radius * radius).abs() < 1e-6);

        // All of the square is covered, so the total power is roughly
        // the flux density times the area
        let flux = scene.compute_flux_density(&[blaster.rays()], false).unwrap();
        let power: Float = flux[0]
            .iter()
            .zip(scene.components()[0].areas().iter())
            .map(|(f, a)| f * a)
            .sum();
        assert!((power / 4000. - 1.).abs() < 0.1, "power = {}", power);

        let below = FixedSun(SolarAngles {
            apparent_elevation: -3.,
            azimuth: 180.,
        });
        let err = scene
            .get_sun_blaster(40., -88., date(), 10, 10, irradiance, &below)
            .unwrap_err();
        assert!(matches!(err, HothouseError::Domain(_)));
    }

    #[test]
    fn test_solar_ppfd() {
        let mut scene = empty_scene().with_sun_bounces(1);
        scene.add_component(Model::new(square(0.)).unwrap()).unwrap();
        let overhead = FixedSun(SolarAngles {
            apparent_elevation: 90.,
            azimuth: 180.,
        });
        let sky = IrradianceComponents {
            direct: 0.,
            diffuse: 100.,
        };
        let ppfd = scene
            .compute_solar_ppfd(40., -88., date(), 20, 20, false, &overhead, &sky)
            .unwrap();
        assert!((ppfd.solar_altitude - 90.).abs() < 1e-12);
        assert_eq!(ppfd.irradiance, sky);
        assert!((ppfd.flux[0][0] - 100.).abs() < 1e-9);
        assert!((ppfd.flux[0][1] - 100.).abs() < 1e-9);
    }

    #[test]
    fn test_solar_ppfd_does_not_depend_on_the_length_of_north() {
        let sun = FixedSun(SolarAngles {
            apparent_elevation: 60.,
            azimuth: 150.,
        });
        let sky = IrradianceComponents {
            direct: 1000.,
            diffuse: 0.,
        };
        let flux = |north: Vector3D| {
            let mut scene = Scene::new(Point3D::ZERO, Vector3D::Z, north).unwrap();
            scene.add_component(Model::new(square(0.)).unwrap()).unwrap();
            scene
                .compute_solar_ppfd(40., -88., date(), 40, 40, false, &sun, &sky)
                .unwrap()
                .flux
        };
        let reference = flux(Vector3D::Y);
        for north in [Vector3D::new(0., 2., 0.), Vector3D::new(0., 0.5, 0.)] {
            let found = flux(north);
            for (a, b) in reference[0].iter().zip(found[0].iter()) {
                assert!((a - b).abs() < 1e-6, "{} vs {}", a, b);
            }
        }
        // Hits scale with sin(altitude), and each one is weighted by it again
        let mean = (reference[0][0] + reference[0][1]) / 2.;
        let expected = 1000. * (60. as Float).to_radians().sin().powi(2);
        assert!((mean - expected).abs() / expected < 0.25, "{} vs {}", mean, expected);
    }
}
