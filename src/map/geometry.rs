use std::{
    cell::OnceCell,
    path::{Path, PathBuf},
};

use shapefile::dbase::{FieldValue, Record};

use super::MapError;

/// The attribute of the shapefile records holding the country name
const NAME_FIELD: &str = "NAME";

/// A closed sequence of points in map coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<(f64, f64)>,
    hole: bool,
}

impl Ring {
    /// An outer boundary
    pub fn outer(points: Vec<(f64, f64)>) -> Self {
        Ring {
            points,
            hole: false,
        }
    }

    /// A boundary cut out of an outer ring, like an enclave or a lake
    pub fn hole(points: Vec<(f64, f64)>) -> Self {
        Ring { points, hole: true }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_hole(&self) -> bool {
        self.hole
    }

    /// The points with the first one repeated at the end, if it isn't already
    pub fn closed(&self) -> Vec<(f64, f64)> {
        let mut points = self.points.clone();
        if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
            if first != *last {
                points.push(first);
            }
        }
        points
    }
}

/// The axis aligned box containing a geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Grows the box around its center so that width / height equals `aspect`.
    pub fn fit_aspect(self, aspect: f64) -> Self {
        // a single point or a line still needs an area to be drawn into
        let width = (self.max_x - self.min_x).max(f64::EPSILON);
        let height = (self.max_y - self.min_y).max(f64::EPSILON);
        let (cx, cy) = (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        );
        let (width, height) = if width / height < aspect {
            (height * aspect, height)
        } else {
            (width, width / aspect)
        };
        Bounds {
            min_x: cx - width / 2.0,
            max_x: cx + width / 2.0,
            min_y: cy - height / 2.0,
            max_y: cy + height / 2.0,
        }
    }
}

/// The outline of a single country, possibly made of many parts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    rings: Vec<Ring>,
}

impl Geometry {
    pub fn new(rings: Vec<Ring>) -> Self {
        Geometry { rings }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Returns the bounding box of all the points, or None for an empty geometry
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.rings.iter().flat_map(|r| r.points().iter());
        let &(x, y) = points.next()?;
        let mut bounds = Bounds {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        };
        for &(x, y) in points {
            bounds.min_x = bounds.min_x.min(x);
            bounds.max_x = bounds.max_x.max(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_y = bounds.max_y.max(y);
        }
        Some(bounds)
    }
}

/// Something that can provide country outlines by name
pub trait GeometrySource {
    /// Returns every geometry whose name exactly matches `name`
    fn lookup(&self, name: &str) -> Result<Vec<Geometry>, MapError>;
}

/// A [GeometrySource] backed by a polygon shapefile with a `NAME` attribute.
/// The file is read on the first lookup and kept in memory afterwards.
pub struct ShapefileSource {
    path: PathBuf,
    records: OnceCell<Vec<(String, Geometry)>>,
}

impl ShapefileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ShapefileSource {
            path: path.as_ref().to_owned(),
            records: OnceCell::new(),
        }
    }

    fn read(&self) -> Result<Vec<(String, Geometry)>, MapError> {
        log::info!("Reading geometry from {}", self.path.display());
        let shapes =
            shapefile::read_as::<_, shapefile::Polygon, Record>(&self.path)?;
        let mut res = Vec::with_capacity(shapes.len());
        for (polygon, record) in shapes {
            let name = match record.get(NAME_FIELD) {
                Some(FieldValue::Character(Some(name))) => name.trim().to_owned(),
                _ => continue,
            };
            let rings = polygon
                .rings()
                .iter()
                .map(|ring| {
                    let points = ring.points().iter().map(|p| (p.x, p.y)).collect();
                    match ring {
                        shapefile::PolygonRing::Outer(_) => Ring::outer(points),
                        shapefile::PolygonRing::Inner(_) => Ring::hole(points),
                    }
                })
                .collect();
            res.push((name, Geometry::new(rings)));
        }
        log::debug!("Read {} named shapes", res.len());
        Ok(res)
    }

    fn records(&self) -> Result<&[(String, Geometry)], MapError> {
        if self.records.get().is_none() {
            let records = self.read()?;
            let _ = self.records.set(records);
        }
        Ok(self.records.get().map(Vec::as_slice).unwrap_or_default())
    }
}

impl GeometrySource for ShapefileSource {
    fn lookup(&self, name: &str) -> Result<Vec<Geometry>, MapError> {
        Ok(self
            .records()?
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, g)| g.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let geometry = Geometry::new(vec![
            Ring::outer(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0)]),
            Ring::outer(vec![(-1.0, 3.0), (0.0, 4.0), (0.0, 3.0)]),
        ]);
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.min_x, -1.0);
        assert_eq!(bounds.max_x, 2.0);
        assert_eq!(bounds.min_y, 0.0);
        assert_eq!(bounds.max_y, 4.0);
        assert!(Geometry::default().bounds().is_none());
    }

    #[test]
    fn test_fit_aspect() {
        let tall = Bounds {
            min_x: 0.0,
            max_x: 1.0,
            min_y: 0.0,
            max_y: 4.0,
        }
        .fit_aspect(2.0);
        assert_eq!(tall.max_x - tall.min_x, 8.0);
        assert_eq!(tall.max_y - tall.min_y, 4.0);
        assert_eq!((tall.min_x + tall.max_x) / 2.0, 0.5);
        let wide = Bounds {
            min_x: 0.0,
            max_x: 10.0,
            min_y: 0.0,
            max_y: 1.0,
        }
        .fit_aspect(2.0);
        assert_eq!(wide.max_x - wide.min_x, 10.0);
        assert_eq!(wide.max_y - wide.min_y, 5.0);
    }

    #[test]
    fn test_closed_ring() {
        let ring = Ring::outer(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert_eq!(ring.closed().len(), 4);
        assert_eq!(ring.closed().last(), Some(&(0.0, 0.0)));
        let already = Ring::hole(ring.closed());
        assert_eq!(already.closed().len(), 4);
        assert!(already.is_hole());
    }

    fn square(x: f64, y: f64) -> shapefile::Polygon {
        shapefile::Polygon::new(shapefile::PolygonRing::Outer(vec![
            shapefile::Point::new(x, y),
            shapefile::Point::new(x, y + 1.0),
            shapefile::Point::new(x + 1.0, y + 1.0),
            shapefile::Point::new(x + 1.0, y),
            shapefile::Point::new(x, y),
        ]))
    }

    fn named(name: Option<&str>) -> Record {
        let mut record = Record::default();
        record.insert(
            NAME_FIELD.to_owned(),
            FieldValue::Character(name.map(str::to_owned)),
        );
        record
    }

    #[test]
    fn test_read_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.shp");
        {
            let table = shapefile::dbase::TableWriterBuilder::new()
                .add_character_field(NAME_FIELD.try_into().unwrap(), 40);
            let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
            for (x, name) in [(0.0, Some("France")), (2.0, Some("Japan")), (4.0, None)] {
                writer
                    .write_shape_and_record(&square(x, 0.0), &named(name))
                    .unwrap();
            }
        }
        let source = ShapefileSource::new(&path);
        let france = source.lookup("France").unwrap();
        assert_eq!(france.len(), 1);
        let bounds = france[0].bounds().unwrap();
        assert_eq!((bounds.min_x, bounds.max_x), (0.0, 1.0));
        assert!(!france[0].rings()[0].is_hole());
        assert_eq!(source.lookup("Japan").unwrap().len(), 1);
        assert!(source.lookup("Fr").unwrap().is_empty());
        assert!(source.lookup("france").unwrap().is_empty());
        // the record without a name can't be asked for
        assert!(source.lookup("").unwrap().is_empty());
        assert_eq!(source.records().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let source = ShapefileSource::new(dir.path().join("missing.shp"));
        assert!(source.lookup("France").is_err());
    }
}
