use crate::grid::error::GridError;
use crate::grid::sample::Sample;

/// A north-up, georeferenced single-band raster in geographic coordinates.
///
/// `origin_lon`/`origin_lat` is the upper-left corner of pixel (0, 0); pixels
/// are stored row by row from north to south.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    origin_lon: f64,
    origin_lat: f64,
    pixel_width: f64,
    pixel_height: f64,
    nodata: Option<f64>,
    data: Vec<f64>,
}

impl Raster {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: usize,
        height: usize,
        origin_lon: f64,
        origin_lat: f64,
        pixel_width: f64,
        pixel_height: f64,
        nodata: Option<f64>,
        data: Vec<f64>,
    ) -> Result<Self, GridError> {
        if data.len() != width * height {
            return Err(GridError::ShapeMismatch {
                expected: width * height,
                found: data.len(),
            });
        }
        if width == 0 {
            return Err(GridError::EmptyAxis("longitude"));
        }
        if height == 0 {
            return Err(GridError::EmptyAxis("latitude"));
        }
        Ok(Self {
            width,
            height,
            origin_lon,
            origin_lat,
            pixel_width: pixel_width.abs(),
            pixel_height: pixel_height.abs(),
            nodata,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Value of the pixel containing (`lon`, `lat`).
    pub fn sample(&self, lon: f64, lat: f64) -> Sample {
        let Some((row, col)) = self.cell_of(lon, lat) else {
            return Sample::OutOfExtent;
        };
        let value = self.data[row * self.width + col];
        if self.nodata.is_some_and(|nodata| nodata == value) {
            Sample::NoData
        } else {
            Sample::from_cell(value)
        }
    }

    fn cell_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let row = index_along(self.origin_lat - lat, self.pixel_height, self.height)?;
        let col = [lon, lon + 360.0, lon - 360.0]
            .into_iter()
            .find_map(|x| index_along(x - self.origin_lon, self.pixel_width, self.width))?;
        Some((row, col))
    }
}

/// Pixel index at `offset` from the origin edge; the far edge belongs to the last pixel.
fn index_along(offset: f64, pixel_size: f64, count: usize) -> Option<usize> {
    if offset < 0.0 {
        return None;
    }
    let index = (offset / pixel_size).floor() as usize;
    if index < count {
        Some(index)
    } else if offset <= pixel_size * count as f64 {
        Some(count - 1)
    } else {
        None
    }
}
