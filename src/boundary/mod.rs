use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use geo::{Area, CoordsIter, MultiPolygon};
use log::{debug, info, warn};
use shapefile::{dbase::{FieldValue, Record}, Reader, Shape};

use crate::{common::{self, Fingerprint}, geom::{self, EqualAreaProjection, GeographicCrs}, PanelError};

/// One county boundary, in its source lon/lat reference and in equal-area metres.
#[derive(Debug, Clone)]
pub struct County {
    geo_id: String,
    geometry: MultiPolygon<f64>,
    projected: MultiPolygon<f64>,
    area_m2: f64,
}

impl County {
    /// 5-character county FIPS code (GEOID).
    #[inline] pub fn geo_id(&self) -> &str { &self.geo_id }

    /// Boundary in the source geographic reference (degrees).
    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    /// Boundary in CONUS Albers metres.
    #[inline] pub fn projected(&self) -> &MultiPolygon<f64> { &self.projected }

    /// Planar area of the projected boundary, in m². Zero for null geometry.
    #[inline] pub fn area_m2(&self) -> f64 { self.area_m2 }

    /// True if the county has no usable geometry (null shape or zero area).
    #[inline] pub fn is_empty(&self) -> bool { self.projected.0.is_empty() || self.area_m2 <= 0.0 }
}

/// The ordered county list of a run. Row `i` of every weight matrix and every
/// county vector refers to `counties[i]`.
#[derive(Debug, Clone)]
pub struct Counties {
    counties: Vec<County>,
    index: HashMap<String, usize>,
    fingerprint: String,
}

impl Counties {
    /// Load county polygons and identifiers from a `.shp` file (with `.dbf` sidecar).
    ///
    /// `id_field` names the character attribute holding the county code
    /// (`GEOID` for TIGER/Line). `limit` keeps only the first N records.
    pub fn from_shapefile(path: &Path, id_field: &str, limit: Option<usize>) -> Result<Self> {
        common::require_file_exists(path)
            .with_context(|| "county boundary source is missing")?;

        let mut reader = Reader::from_path(path)
            .map_err(|e| PanelError::config(format!("failed to open shapefile {}: {e}", path.display())))?;

        let mut ids = Vec::new();
        let mut shapes = Vec::new();
        for result in reader.iter_shapes_and_records() {
            if limit.is_some_and(|n| ids.len() >= n) { break }

            let (shape, record) = result
                .with_context(|| format!("Error reading shape+record from {}", path.display()))?;
            let geo_id = character_field(&record, id_field)?;
            let geometry = match shape {
                Shape::Polygon(polygon) => geom::shp_to_geo(&polygon),
                Shape::NullShape => {
                    warn!("[boundary] county {geo_id} has a null shape; its aggregates will be missing");
                    MultiPolygon(Vec::new())
                }
                other => anyhow::bail!(PanelError::config(format!(
                    "found non-Polygon shape ({:?}) for county {geo_id} in {}",
                    other.shapetype(), path.display()
                ))),
            };
            ids.push(geo_id);
            shapes.push(geometry);
        }

        if let Some(n) = limit {
            info!("[boundary] limited to the first {n} counties");
        }

        Self::from_geometries(ids, shapes, geom::crs_from_shapefile(path))
    }

    /// Build the county list from identifiers and lon/lat geometries.
    pub fn from_geometries(ids: Vec<String>, shapes: Vec<MultiPolygon<f64>>, crs: GeographicCrs) -> Result<Self> {
        anyhow::ensure!(ids.len() == shapes.len(), "[boundary] {} ids for {} geometries", ids.len(), shapes.len());

        let projection = EqualAreaProjection::from_geographic(crs)?;

        let mut fingerprint = Fingerprint::new("counties/v1");
        let mut index = HashMap::with_capacity(ids.len());
        let mut counties = Vec::with_capacity(ids.len());

        for (geo_id, geometry) in ids.into_iter().zip(shapes) {
            if index.insert(geo_id.clone(), counties.len()).is_some() {
                return Err(PanelError::config(format!("duplicate county identifier: {geo_id}")).into());
            }

            let projected = projection.project(&geometry)
                .with_context(|| format!("Failed to project county {geo_id}"))?;
            let area_m2 = projected.unsigned_area();

            let coords: Vec<f64> = geometry.coords_iter().flat_map(|c| [c.x, c.y]).collect();
            fingerprint.bytes("id", geo_id.as_bytes()).floats("coords", &coords);

            counties.push(County { geo_id, geometry, projected, area_m2 });
        }

        debug!("[boundary] loaded {} counties", counties.len());
        Ok(Self { counties, index, fingerprint: fingerprint.finish() })
    }

    #[inline] pub fn len(&self) -> usize { self.counties.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.counties.is_empty() }

    #[inline] pub fn get(&self, i: usize) -> Option<&County> { self.counties.get(i) }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &County> { self.counties.iter() }

    /// Position of a county by its identifier.
    #[inline] pub fn position(&self, geo_id: &str) -> Option<usize> { self.index.get(geo_id).copied() }

    /// County identifiers in row order.
    pub fn geo_ids(&self) -> Vec<String> {
        self.counties.iter().map(|county| county.geo_id.clone()).collect()
    }

    /// Content fingerprint over identifiers and source coordinates.
    #[inline] pub fn fingerprint(&self) -> &str { &self.fingerprint }
}

/// Get the value of a character field from a Record.
fn character_field(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Numeric(Some(n))) => Ok(format!("{:05}", *n as i64)),
        Some(other) => Err(PanelError::config(format!("identifier field {field} has unusable value {other:?}")).into()),
        None => Err(PanelError::config(format!("boundary source lacks identifier field {field}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use geo::polygon;
    use shapefile::{
        dbase::{FieldName, TableWriterBuilder},
        Point, Polygon, PolygonRing, Writer,
    };

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size), (x: x, y: y),
        ]])
    }

    #[test]
    fn counties_keep_input_order_and_index() {
        let counties = Counties::from_geometries(
            vec!["17031".into(), "17043".into()],
            vec![square(-88.0, 41.5, 0.5), square(-88.5, 41.5, 0.5)],
            GeographicCrs::Nad83,
        ).unwrap();

        assert_eq!(counties.len(), 2);
        assert_eq!(counties.geo_ids(), vec!["17031".to_string(), "17043".to_string()]);
        assert_eq!(counties.position("17043"), Some(1));
        assert!(counties.iter().all(|c| c.area_m2() > 1e9));
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let err = Counties::from_geometries(
            vec!["01001".into(), "01001".into()],
            vec![square(-87.0, 32.0, 0.1), square(-86.0, 32.0, 0.1)],
            GeographicCrs::Nad83,
        ).unwrap_err();
        assert!(matches!(err.downcast_ref::<PanelError>(), Some(PanelError::Configuration(_))));
    }

    #[test]
    fn null_geometry_is_empty_not_an_error() {
        let counties = Counties::from_geometries(
            vec!["02999".into()],
            vec![MultiPolygon(Vec::new())],
            GeographicCrs::Nad83,
        ).unwrap();
        let county = counties.get(0).unwrap();
        assert!(county.is_empty());
        assert_eq!(county.area_m2(), 0.0);
    }

    #[test]
    fn fingerprint_tracks_geometry_and_ids() {
        let build = |id: &str, x: f64| Counties::from_geometries(
            vec![id.into()], vec![square(x, 40.0, 0.25)], GeographicCrs::Nad83,
        ).unwrap();

        assert_eq!(build("19001", -94.0).fingerprint(), build("19001", -94.0).fingerprint());
        assert_ne!(build("19001", -94.0).fingerprint(), build("19003", -94.0).fingerprint());
        assert_ne!(build("19001", -94.0).fingerprint(), build("19001", -94.25).fingerprint());
    }

    #[test]
    fn missing_shapefile_is_a_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Counties::from_shapefile(&tmp.path().join("tl_2020_us_county.shp"), "GEOID", None).unwrap_err();
        assert!(matches!(err.downcast_ref::<PanelError>(), Some(PanelError::Configuration(_))));
    }

    /// Write `counties.shp` with a character `GEOID` and numeric `STATEFP`
    /// per record, one 0.5° square each. Records listed in `null_shapes` are
    /// rewritten as null shapes in place.
    fn write_shapefile(dir: &Path, rows: &[(&str, f64)], null_shapes: &[usize]) -> PathBuf {
        let path = dir.join("counties.shp");
        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("GEOID").unwrap(), 5)
            .add_numeric_field(FieldName::try_from("STATEFP").unwrap(), 10, 0);
        {
            let mut writer = Writer::from_path(&path, table).unwrap();
            for (k, &(geo_id, state)) in rows.iter().enumerate() {
                let (x, y) = (-90.0 + k as f64, 40.0);
                let ring = vec![
                    Point::new(x, y), Point::new(x, y + 0.5), Point::new(x + 0.5, y + 0.5),
                    Point::new(x + 0.5, y), Point::new(x, y),
                ];
                let mut record = Record::default();
                record.insert("GEOID".to_string(), FieldValue::Character(Some(geo_id.to_string())));
                record.insert("STATEFP".to_string(), FieldValue::Numeric(Some(state)));
                writer.write_shape_and_record(&Polygon::new(PolygonRing::Outer(ring)), &record).unwrap();
            }
        }

        // .shx entries are 8 bytes after a 100-byte header; offsets count 16-bit words.
        let shx = fs::read(path.with_extension("shx")).unwrap();
        let mut shp = fs::read(&path).unwrap();
        for &k in null_shapes {
            let entry = 100 + 8 * k;
            let offset = 2 * u32::from_be_bytes(shx[entry..entry + 4].try_into().unwrap()) as usize;
            shp[offset + 8..offset + 12].copy_from_slice(&0i32.to_le_bytes());
        }
        fs::write(&path, shp).unwrap();
        path
    }

    #[test]
    fn shapefile_ids_follow_record_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_shapefile(dir.path(), &[("19153", 19.0), ("19169", 19.0), ("17031", 17.0)], &[]);

        let counties = Counties::from_shapefile(&path, "GEOID", None).unwrap();
        assert_eq!(counties.geo_ids(), vec!["19153".to_string(), "19169".to_string(), "17031".to_string()]);
        assert!(counties.iter().all(|c| !c.is_empty() && c.area_m2() > 1e9));

        let first = Counties::from_shapefile(&path, "GEOID", Some(1)).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first.geo_ids(), vec!["19153".to_string()]);
    }

    #[test]
    fn numeric_identifier_is_zero_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_shapefile(dir.path(), &[("19153", 19.0), ("06037", 6.0)], &[]);

        let counties = Counties::from_shapefile(&path, "STATEFP", None).unwrap();
        assert_eq!(counties.geo_ids(), vec!["00019".to_string(), "00006".to_string()]);
    }

    #[test]
    fn null_shape_record_loads_as_empty_county() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_shapefile(dir.path(), &[("19153", 19.0), ("19169", 19.0)], &[1]);

        let counties = Counties::from_shapefile(&path, "GEOID", None).unwrap();
        assert_eq!(counties.len(), 2);
        assert!(!counties.get(0).unwrap().is_empty());
        assert!(counties.get(1).unwrap().is_empty());
        assert_eq!(counties.get(1).unwrap().geo_id(), "19169");
    }

    #[test]
    fn unknown_identifier_field_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_shapefile(dir.path(), &[("19153", 19.0)], &[]);

        let err = Counties::from_shapefile(&path, "FIPS", None).unwrap_err();
        assert!(matches!(err.downcast_ref::<PanelError>(), Some(PanelError::Configuration(_))));
    }
}
