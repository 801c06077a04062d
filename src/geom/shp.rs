use std::{fs, path::Path};

use shapefile as shp;

use super::GeographicCrs;

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> geo::MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last {
                coords.push(first)
            }
        }
    }

    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<geo::LineString<f64>> = None;
    let mut current_holes: Vec<geo::LineString<f64>> = Vec::new();

    // Shapefile stores each outer ring followed by its holes.
    for ring in p.rings() {
        let mut coords: Vec<geo::Coord<f64>> = ring.points().iter()
            .map(|pt| geo::Coord { x: pt.x, y: pt.y })
            .collect();
        ensure_closed(&mut coords);
        let ls = geo::LineString(coords);

        match ring {
            shp::PolygonRing::Outer(_) => {
                if let Some(ext) = current_exterior.take() {
                    polys.push(geo::Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(ls);
            }
            shp::PolygonRing::Inner(_) => current_holes.push(ls),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(geo::Polygon::new(ext, current_holes));
    }

    geo::MultiPolygon(polys)
}

/// Geographic datum declared by the `.prj` sidecar of a shapefile.
/// Falls back to NAD83 (TIGER/Line) when no sidecar is present.
pub(crate) fn crs_from_shapefile(path: &Path) -> GeographicCrs {
    let Ok(wkt) = fs::read_to_string(path.with_extension("prj")) else {
        return GeographicCrs::Nad83;
    };
    let wkt = wkt.to_ascii_uppercase();
    if wkt.contains("WGS_1984") || wkt.contains("WGS 84") || wkt.contains("WGS84") {
        GeographicCrs::Wgs84
    } else {
        GeographicCrs::Nad83
    }
}
