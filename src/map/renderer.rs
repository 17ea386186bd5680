use std::{
    error, fs,
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use plotters::{
    backend::{BitMapBackend, DrawingBackend, SVGBackend},
    chart::ChartBuilder,
    coord::Shift,
    drawing::{DrawingArea, DrawingAreaErrorKind, IntoDrawingArea},
    element::{PathElement, Polygon},
    style::{Color, RGBColor, BLACK, WHITE},
};

use super::{
    super::catalog::{Catalog, Country},
    Geometry, GeometrySource, ImageFormat, MapError,
};

/// The size of the generated images in pixels, a 2:1 aspect ratio
const IMAGE_SIZE: (u32, u32) = (600, 300);
/// Space left between the outline and the image border
const MARGIN: u32 = 10;

/// The fill of the land
const LAND_COLOR: RGBColor = RGBColor(211, 211, 211);
/// The color of the border lines
const OUTLINE_COLOR: RGBColor = BLACK;
/// The color of everything that isn't the country
const BACKGROUND_COLOR: RGBColor = WHITE;

fn drawing_error<E: error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> MapError {
    MapError::DrawingError(e.to_string())
}

/// Draws the outline of the geometry onto the given area, without any axes.
fn draw_geometry<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    geometry: &Geometry,
) -> Result<(), MapError> {
    let aspect = (IMAGE_SIZE.0 - 2 * MARGIN) as f64 / (IMAGE_SIZE.1 - 2 * MARGIN) as f64;
    let bounds = geometry
        .bounds()
        .ok_or_else(|| MapError::DrawingError("the geometry has no points".to_owned()))?
        .fit_aspect(aspect);
    root.fill(&BACKGROUND_COLOR).map_err(drawing_error)?;
    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(bounds.min_x..bounds.max_x, bounds.min_y..bounds.max_y)
        .map_err(drawing_error)?;
    // every outer ring is followed by its own holes, so filling in order keeps
    // islands lying inside the hole of another part
    chart
        .draw_series(geometry.rings().iter().map(|r| {
            let color = if r.is_hole() {
                BACKGROUND_COLOR
            } else {
                LAND_COLOR
            };
            Polygon::new(r.points().to_vec(), color.filled())
        }))
        .map_err(drawing_error)?;
    chart
        .draw_series(
            geometry
                .rings()
                .iter()
                .map(|r| PathElement::new(r.closed(), OUTLINE_COLOR.stroke_width(1))),
        )
        .map_err(drawing_error)?;
    root.present().map_err(drawing_error)?;
    Ok(())
}

/// A rendered map, as stored in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Creates map images of countries and keeps them in a cache directory.
/// An image that exists in the cache is always served as is, so the cache
/// can be filled by hand.
pub struct MapRenderer<G: GeometrySource> {
    source: G,
    cache_dir: PathBuf,
    format: ImageFormat,
}

impl<G: GeometrySource> MapRenderer<G> {
    /// Creates a new renderer, creating the cache directory if needed
    pub fn new<P: AsRef<Path>>(
        source: G,
        cache_dir: P,
        format: ImageFormat,
    ) -> Result<Self, MapError> {
        let cache_dir = cache_dir.as_ref().to_owned();
        fs::create_dir_all(&cache_dir)?;
        Ok(MapRenderer {
            source,
            cache_dir,
            format,
        })
    }

    /// The path under which the image of the country is stored
    pub fn image_path(&self, country: &Country) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", country.id(), self.format.extension()))
    }

    pub fn is_cached(&self, country: &Country) -> bool {
        self.image_path(country).is_file()
    }

    /// Returns the map image of the country, drawing it first if it isn't cached
    pub fn render(&self, country: &Country) -> Result<MapImage, MapError> {
        let path = self.image_path(country);
        if !path.is_file() {
            self.draw(country, &path)?;
        } else {
            log::debug!("Cache hit for {}", country.id());
        }
        let bytes = fs::read(&path)?;
        Ok(MapImage { path, bytes })
    }

    /// Draws the country into a temporary file and moves it into place, so
    /// that a failed draw never leaves something that looks like a cache hit.
    fn draw(&self, country: &Country, path: &Path) -> Result<(), MapError> {
        let mut geometries = self.source.lookup(country.id())?;
        let geometry = match geometries.len() {
            0 => return Err(MapError::NotFound(country.id().to_owned())),
            1 => geometries.remove(0),
            n => return Err(MapError::Ambiguous(country.id().to_owned(), n)),
        };
        log::info!("Drawing the map of {}", country.id());
        // plotters picks the bitmap encoder from the extension, so it has to stay last
        let partial = self.cache_dir.join(format!(
            "{}.partial.{}",
            country.id(),
            self.format.extension()
        ));
        let drawn = match self.format {
            ImageFormat::Svg => {
                draw_geometry(&SVGBackend::new(&partial, IMAGE_SIZE).into_drawing_area(), &geometry)
            }
            ImageFormat::Png => draw_geometry(
                &BitMapBackend::new(&partial, IMAGE_SIZE).into_drawing_area(),
                &geometry,
            ),
        };
        let res = drawn.and_then(|_| Ok(fs::rename(&partial, path)?));
        if res.is_err() {
            let _ = fs::remove_file(&partial);
        }
        res
    }

    /// Renders every country of the catalog that isn't in the cache yet.
    /// Returns the countries that failed along with the reason.
    pub fn prerender(&self, catalog: &Catalog) -> Vec<(String, MapError)> {
        let missing: Vec<&Country> = catalog.iter().filter(|c| !self.is_cached(c)).collect();
        let bar = ProgressBar::new(missing.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        let mut failed = Vec::new();
        for country in bar.wrap_iter(missing.into_iter()) {
            bar.set_message(country.id().to_owned());
            if let Err(e) = self.render(country) {
                log::warn!("Unable to render {}: {}", country.id(), e);
                failed.push((country.id().to_owned(), e));
            }
        }
        bar.finish_with_message("Maps rendered");
        failed
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::HashMap};

    use super::{super::Ring, *};

    /// Counts how many times the geometry was asked for
    #[derive(Default)]
    struct SpySource {
        calls: Cell<usize>,
        geometries: HashMap<String, Vec<Geometry>>,
    }

    impl SpySource {
        fn with(mut self, name: &str, geometry: Geometry) -> Self {
            self.geometries
                .entry(name.to_owned())
                .or_default()
                .push(geometry);
            self
        }
    }

    impl GeometrySource for SpySource {
        fn lookup(&self, name: &str) -> Result<Vec<Geometry>, MapError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.geometries.get(name).cloned().unwrap_or_default())
        }
    }

    fn square() -> Geometry {
        Geometry::new(vec![
            Ring::outer(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]),
            Ring::hole(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)]),
        ])
    }

    #[test]
    fn test_render_caches() {
        let dir = tempfile::tempdir().unwrap();
        let source = SpySource::default().with("Square", square());
        let renderer = MapRenderer::new(source, dir.path(), ImageFormat::Svg).unwrap();
        let country = Country::new("Square", None);
        assert!(!renderer.is_cached(&country));
        let first = renderer.render(&country).unwrap();
        assert_eq!(renderer.source.calls.get(), 1);
        assert_eq!(first.path, dir.path().join("Square.svg"));
        assert!(!first.bytes.is_empty());
        let second = renderer.render(&country).unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(renderer.source.calls.get(), 1);
        assert!(!dir.path().join("Square.partial.svg").exists());
    }

    #[test]
    fn test_render_png() {
        let dir = tempfile::tempdir().unwrap();
        let source = SpySource::default().with("Square", square());
        let renderer = MapRenderer::new(source, dir.path(), ImageFormat::Png).unwrap();
        let image = renderer.render(&Country::new("Square", None)).unwrap();
        assert_eq!(image.path, dir.path().join("Square.png"));
        let decoded = image::load_from_memory(&image.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), IMAGE_SIZE);
    }

    #[test]
    fn test_island_in_a_lake() {
        let dir = tempfile::tempdir().unwrap();
        let lake = Geometry::new(vec![
            Ring::outer(vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]),
            Ring::hole(vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)]),
            Ring::outer(vec![(4.0, 4.0), (4.0, 6.0), (6.0, 6.0), (6.0, 4.0)]),
        ]);
        let source = SpySource::default().with("Lake", lake);
        let renderer = MapRenderer::new(source, dir.path(), ImageFormat::Png).unwrap();
        let image = renderer.render(&Country::new("Lake", None)).unwrap();
        let pixels = image::load_from_memory(&image.bytes).unwrap().to_rgb8();
        let (cx, cy) = (IMAGE_SIZE.0 / 2, IMAGE_SIZE.1 / 2);
        let land = image::Rgb([LAND_COLOR.0, LAND_COLOR.1, LAND_COLOR.2]);
        let water = image::Rgb([BACKGROUND_COLOR.0, BACKGROUND_COLOR.1, BACKGROUND_COLOR.2]);
        // the island in the middle
        assert_eq!(*pixels.get_pixel(cx, cy), land);
        // the lake around it, one and a half units to the left
        assert_eq!(*pixels.get_pixel(cx - 42, cy), water);
        // the shore, four units to the left
        assert_eq!(*pixels.get_pixel(cx - 112, cy), land);
    }

    #[test]
    fn test_preseeded_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Atlantis.svg"), b"<svg/>").unwrap();
        let renderer = MapRenderer::new(SpySource::default(), dir.path(), ImageFormat::Svg).unwrap();
        let image = renderer.render(&Country::new("Atlantis", None)).unwrap();
        assert_eq!(image.bytes, b"<svg/>");
        assert_eq!(renderer.source.calls.get(), 0);
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(SpySource::default(), dir.path(), ImageFormat::Svg).unwrap();
        let country = Country::new("Atlantis", None);
        assert!(matches!(
            renderer.render(&country),
            Err(MapError::NotFound(_))
        ));
        assert!(!renderer.is_cached(&country));
    }

    #[test]
    fn test_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let source = SpySource::default()
            .with("Square", square())
            .with("Square", square());
        let renderer = MapRenderer::new(source, dir.path(), ImageFormat::Svg).unwrap();
        assert!(matches!(
            renderer.render(&Country::new("Square", None)),
            Err(MapError::Ambiguous(_, 2))
        ));
    }

    #[test]
    fn test_prerender() {
        let dir = tempfile::tempdir().unwrap();
        let source = SpySource::default().with("Square", square());
        let renderer = MapRenderer::new(source, dir.path().join("maps"), ImageFormat::Svg).unwrap();
        let catalog = Catalog::from_countries(vec![
            Country::new("Square", None),
            Country::new("Atlantis", None),
        ])
        .unwrap();
        let failed = renderer.prerender(&catalog);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "Atlantis");
        assert!(dir.path().join("maps").join("Square.svg").is_file());
        // everything that could be drawn is cached now
        assert_eq!(renderer.prerender(&catalog).len(), 1);
        assert_eq!(renderer.source.calls.get(), 3);
    }
}
