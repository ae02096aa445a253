//! GeoTIFF reading and writing on top of the `tiff` crate
//!
//! Georeferencing is carried in ModelPixelScale (33550), ModelTiepoint
//! (33922) and a minimal GeoKeyDirectory (34735). NaN or the GDAL nodata
//! tag (42113) marks masked pixels.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{ColorType, Gray8, Gray32Float, RGBA8};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Sample format of a written band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// 32-bit float, NaN for masked pixels
    #[default]
    Float32,
    /// 8-bit unsigned, 0 for masked pixels
    UInt8,
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub sample_format: SampleFormat,
}

impl GeoTiffOptions {
    pub fn uint8() -> Self {
        Self {
            sample_format: SampleFormat::UInt8,
        }
    }
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Read the first band of a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::AssetNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    decode_geotiff(file)
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => return Err(Error::UnsupportedDataType("unsupported TIFF pixel format".to_string())),
    };

    // Multi-sample images decode interleaved; only single-band files are bands
    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected one sample per pixel, got {} values for {}x{}",
            data.len(),
            cols,
            rows
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));

    let nodata = decoder
        .get_tag_ascii_string(tag(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
        .and_then(num_traits::cast::<f64, T>);
    raster.set_nodata(nodata.or_else(|| T::is_float().then(T::default_nodata)));

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(tag(GEO_KEY_DIRECTORY)).ok()?;
    // Header is 4 shorts, then 4 shorts per key: id, location, count, value
    keys.get(4..)?
        .chunks_exact(4)
        .find(|k| (k[0] == GEOGRAPHIC_TYPE_KEY || k[0] == PROJECTED_CS_TYPE_KEY) && k[1] == 0)
        .map(|k| CRS::from_epsg(k[3] as u32))
}

fn geo_keys(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(|c| c.epsg()).and_then(|code| u16::try_from(code).ok());
    let geographic = crs.is_some_and(|c| c.is_geographic());

    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE_KEY, 0, 1, if geographic { 2 } else { 1 }],
        [GT_RASTER_TYPE_KEY, 0, 1, 1],
    ];
    if let Some(code) = epsg {
        let key = if geographic { GEOGRAPHIC_TYPE_KEY } else { PROJECTED_CS_TYPE_KEY };
        entries.push([key, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}

fn encode_image<W, C>(
    encoder: &mut TiffEncoder<W>,
    transform: &GeoTransform,
    crs: Option<&CRS>,
    nodata: Option<&str>,
    cols: usize,
    rows: usize,
    data: &[C::Inner],
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
{
    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let scale = [transform.pixel_width, transform.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
    let keys = geo_keys(crs);

    let tags = image.encoder();
    tags.write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])
        .and_then(|_| tags.write_tag(tag(MODEL_TIEPOINT), &tiepoint[..]))
        .and_then(|_| tags.write_tag(tag(GEO_KEY_DIRECTORY), keys.as_slice()))
        .map_err(|e| Error::Other(format!("Cannot write GeoTIFF tags: {}", e)))?;
    if let Some(nodata) = nodata {
        tags.write_tag(tag(GDAL_NODATA), nodata)
            .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;
    }

    image
        .write_data(data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))
}

/// Write a single-band raster to a GeoTIFF file.
///
/// `Float32` keeps NaN; `UInt8` maps NaN and out-of-range values to 0.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
    let (rows, cols) = raster.shape();

    match options.sample_format {
        SampleFormat::Float32 => {
            let data: Vec<f32> = raster
                .data()
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
                .collect();
            encode_image::<_, Gray32Float>(
                &mut encoder,
                raster.transform(),
                raster.crs(),
                Some("nan"),
                cols,
                rows,
                &data,
            )
        }
        SampleFormat::UInt8 => {
            let data: Vec<u8> = raster
                .data()
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or(0u8))
                .collect();
            encode_image::<_, Gray8>(
                &mut encoder,
                raster.transform(),
                raster.crs(),
                Some("0"),
                cols,
                rows,
                &data,
            )
        }
    }
}

/// Write interleaved RGBA bytes as a georeferenced quicklook image.
pub fn write_rgba_geotiff<P: AsRef<Path>>(
    rgba: &[u8],
    rows: usize,
    cols: usize,
    transform: &GeoTransform,
    crs: Option<&CRS>,
    path: P,
) -> Result<()> {
    if rgba.len() != rows * cols * 4 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let file = BufWriter::new(File::create(path.as_ref())?);
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
    encode_image::<_, RGBA8>(&mut encoder, transform, crs, None, cols, rows, rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn georef<T: RasterElement>(mut r: Raster<T>) -> Raster<T> {
        r.set_transform(GeoTransform::new(122.78, 11.0, 0.00027, -0.00027));
        r.set_crs(Some(CRS::wgs84()));
        r
    }

    #[test]
    fn test_float32_keeps_nan_and_georeferencing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.tif");
        let raster = georef(Raster::from_vec(vec![0.1, f64::NAN, 0.3, 0.4, 0.5, 0.6], 2, 3).unwrap());

        write_geotiff(&raster, &path, &GeoTiffOptions::default()).unwrap();
        let back: Raster<f64> = read_geotiff(&path).unwrap();

        assert_eq!(back.shape(), (2, 3));
        assert!(back.get(0, 1).unwrap().is_nan());
        assert!((back.get(1, 2).unwrap() - 0.6).abs() < 1e-6);
        assert!((back.transform().origin_x - 122.78).abs() < 1e-9);
        assert!((back.transform().pixel_height + 0.00027).abs() < 1e-12);
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(4326));
    }

    #[test]
    fn test_uint8_maps_nan_to_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.tif");
        let raster = georef(Raster::from_vec(vec![1.0, 5.0, f64::NAN, 3.0], 2, 2).unwrap());

        write_geotiff(&raster, &path, &GeoTiffOptions::uint8()).unwrap();
        let back: Raster<u8> = read_geotiff(&path).unwrap();

        assert_eq!(back.data().iter().copied().collect::<Vec<_>>(), vec![1, 5, 0, 3]);
        assert_eq!(back.nodata(), Some(0));
    }

    #[test]
    fn test_missing_file_is_asset_not_found() {
        let dir = tempdir().unwrap();
        let err = read_geotiff::<f64, _>(dir.path().join("nope.tif")).unwrap_err();
        assert!(matches!(err, Error::AssetNotFound { .. }));
    }

    #[test]
    fn test_rgba_size_checked() {
        let dir = tempdir().unwrap();
        let gt = GeoTransform::default();
        assert!(write_rgba_geotiff(&[0u8; 7], 1, 2, &gt, None, dir.path().join("q.tif")).is_err());
        write_rgba_geotiff(&[255u8; 8], 1, 2, &gt, None, dir.path().join("q.tif")).unwrap();
    }
}
