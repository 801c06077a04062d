use anyhow::{anyhow, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// CONUS Albers Equal Area (EPSG:5070), used for every area computation.
const CONUS_ALBERS_PROJ4: &str =
    "+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs +type=crs";

/// Geographic (lon/lat degree) reference of an input geometry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeographicCrs {
    /// NAD83 (EPSG:4269), the TIGER/Line county boundary reference.
    Nad83,
    /// WGS84 (EPSG:4326), the reference of the reanalysis grid axes.
    Wgs84,
}

impl GeographicCrs {
    #[inline]
    fn proj4(self) -> &'static str {
        match self {
            Self::Nad83 => "+proj=longlat +datum=NAD83 +no_defs +type=crs",
            Self::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs +type=crs",
        }
    }
}

/// Transform from a geographic CRS into CONUS Albers metres.
pub(crate) struct EqualAreaProjection {
    from: Proj4,
    to: Proj4,
}

impl EqualAreaProjection {
    pub(crate) fn from_geographic(crs: GeographicCrs) -> Result<Self> {
        let from = Proj4::from_proj_string(crs.proj4())
            .with_context(|| anyhow!("failed to build source PROJ.4: {}", crs.proj4()))?;
        let to = Proj4::from_proj_string(CONUS_ALBERS_PROJ4)
            .with_context(|| anyhow!("failed to build target PROJ.4: {CONUS_ALBERS_PROJ4}"))?;
        Ok(Self { from, to })
    }

    /// Project one lon/lat coordinate (degrees) to Albers metres.
    pub(crate) fn project_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| anyhow!("CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y))?;
        Ok(Coord { x: point.0, y: point.1 })
    }

    /// Project every vertex of a shape; edges stay straight in the target plane.
    pub(crate) fn project(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        shape.try_map_coords(|coord| self.project_coord(coord))
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area};

    use super::*;

    #[test]
    fn albers_origin_maps_to_false_origin() {
        let projection = EqualAreaProjection::from_geographic(GeographicCrs::Nad83).unwrap();
        let origin = projection.project_coord(Coord { x: -96.0, y: 23.0 }).unwrap();
        assert!(origin.x.abs() < 1e-3);
        assert!(origin.y.abs() < 1e-3);
    }

    #[test]
    fn projected_degree_cell_has_plausible_area() {
        let projection = EqualAreaProjection::from_geographic(GeographicCrs::Wgs84).unwrap();
        let cell = MultiPolygon(vec![polygon![
            (x: -90.0, y: 40.0), (x: -89.0, y: 40.0), (x: -89.0, y: 41.0), (x: -90.0, y: 41.0), (x: -90.0, y: 40.0),
        ]]);

        // One degree square at 40.5N is about 111.2 km x 84.5 km.
        let area_km2 = projection.project(&cell).unwrap().unsigned_area() / 1e6;
        assert!((area_km2 - 9_400.0).abs() < 150.0, "area was {area_km2}");
    }
}
