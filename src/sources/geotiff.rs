//! Minimal GeoTIFF reading: the first band plus its affine georeferencing.

use crate::sources::error::SourceError;
use crate::sources::raster::Raster;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

/// Decodes a single-band GeoTIFF into a [`Raster`].
///
/// Georeferencing comes from the `ModelPixelScale` and `ModelTiepoint` tags
/// (pixel-is-area), nodata from `GDAL_NODATA` when present.
pub fn read_geotiff(path: &Path) -> Result<Raster, SourceError> {
    let decode_err = |e: tiff::TiffError| SourceError::RasterDecode(path.to_path_buf(), e);

    let file = File::open(path).map_err(|e| SourceError::DatasetOpen(path.to_path_buf(), e))?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;

    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| SourceError::MissingGeoreference(path.to_path_buf()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| SourceError::MissingGeoreference(path.to_path_buf()))?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(SourceError::MissingGeoreference(path.to_path_buf()));
    }
    // Tie point (i, j, k) -> (x, y, z); shift to the corner of pixel (0, 0).
    let origin_lon = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_lat = tiepoint[4] + tiepoint[1] * scale[1];

    let nodata = decoder
        .find_tag(Tag::GdalNodata)
        .map_err(decode_err)?
        .and_then(|value| value.into_string().ok())
        .and_then(|text| text.trim_matches(char::from(0)).trim().parse::<f64>().ok());

    let data = match decoder.read_image().map_err(decode_err)? {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => return Err(SourceError::UnsupportedSampleFormat(path.to_path_buf())),
    };

    Raster::new(
        width as usize,
        height as usize,
        origin_lon,
        origin_lat,
        scale[0],
        scale[1],
        nodata,
        data,
    )
    .map_err(|source| SourceError::Grid {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grid::sample::Sample;
    use tiff::encoder::{colortype, TiffEncoder};

    /// Writes a georeferenced float raster; `origin` is the upper-left corner.
    pub(crate) fn write_geotiff(
        path: &Path,
        width: u32,
        height: u32,
        origin: (f64, f64),
        pixel_size: f64,
        nodata: Option<&str>,
        data: &[f32],
    ) {
        let mut file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(&mut file).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[pixel_size, pixel_size, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ModelTiepointTag,
                &[0.0, 0.0, 0.0, origin.0, origin.1, 0.0][..],
            )
            .unwrap();
        if let Some(nodata) = nodata {
            image.encoder().write_tag(Tag::GdalNodata, nodata).unwrap();
        }
        image.write_data(data).unwrap();
    }

    #[test]
    fn reads_georeferenced_float_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmean_1.tif");
        write_geotiff(
            &path,
            2,
            2,
            (10.0, 50.0),
            0.5,
            Some("-32768"),
            &[1.0, 2.0, 3.0, -32768.0],
        );
        let raster = read_geotiff(&path).unwrap();
        assert_eq!((raster.width(), raster.height()), (2, 2));
        assert_eq!(raster.sample(10.2, 49.9), Sample::Value(1.0));
        assert_eq!(raster.sample(10.7, 49.9), Sample::Value(2.0));
        assert_eq!(raster.sample(10.2, 49.2), Sample::Value(3.0));
        assert_eq!(raster.sample(10.7, 49.2), Sample::NoData);
        assert_eq!(raster.sample(11.2, 49.2), Sample::OutOfExtent);
    }

    #[test]
    fn plain_tiff_without_georeference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        {
            let mut file = File::create(&path).unwrap();
            let mut encoder = TiffEncoder::new(&mut file).unwrap();
            encoder
                .write_image::<colortype::Gray32Float>(1, 1, &[0.0])
                .unwrap();
        }
        assert!(matches!(
            read_geotiff(&path),
            Err(SourceError::MissingGeoreference(_))
        ));
    }
}
