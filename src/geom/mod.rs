mod bbox;
mod proj;
mod shp;

pub(crate) use bbox::BoundingBox;
pub(crate) use proj::EqualAreaProjection;
pub use proj::GeographicCrs;
pub(crate) use shp::{crs_from_shapefile, shp_to_geo};
