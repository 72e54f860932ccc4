//! Image processing for uploaded photos.
//!
//! Two pure transforms, both CPU bound (callers run them on the blocking
//! pool):
//! - normalization of any accepted encoding to canonical JPEG
//! - an anchored crop with the target's aspect ratio, scaled to the target

use bytes::Bytes;
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView, ImageReader,
    Rgb, RgbImage,
};
use std::io::Cursor;

use cropbot_core::{
    types::{Anchor, CropRequest, ImageFormat, NormalizedImage},
    Error, Result,
};

/// JPEG quality of delivered crops.
pub const DEFAULT_OUTPUT_QUALITY: u8 = 80;
/// JPEG quality for re-encoded uploads; high enough to be visually lossless.
pub const DEFAULT_NORMALIZE_QUALITY: u8 = 95;

/// Stateless image processor.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    output_quality: u8,
    normalize_quality: u8,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_QUALITY, DEFAULT_NORMALIZE_QUALITY)
    }
}

impl ImageProcessor {
    /// Create a processor with explicit JPEG qualities (1-100).
    pub fn new(output_quality: u8, normalize_quality: u8) -> Self {
        Self {
            output_quality: output_quality.clamp(1, 100),
            normalize_quality: normalize_quality.clamp(1, 100),
        }
    }

    /// Bring an upload into the canonical encoding.
    ///
    /// Canonical input is passed through untouched once its header checks
    /// out; anything else is decoded as `declared` and re-encoded.
    pub fn normalize(&self, data: Bytes, declared: ImageFormat) -> Result<NormalizedImage> {
        if declared.is_canonical() {
            let (width, height) = jpeg_dimensions(&data)?;
            return Ok(NormalizedImage {
                bytes: data,
                width,
                height,
            });
        }

        let img = image::load_from_memory_with_format(&data, codec_format(declared))
            .map_err(|e| Error::decode(format!("Invalid {} image: {}", declared, e)))?;
        let (width, height) = img.dimensions();
        let bytes = encode_jpeg(&flatten_onto_white(&img), self.normalize_quality)?;

        tracing::debug!(
            source_format = %declared,
            width,
            height,
            size_in = data.len(),
            size_out = bytes.len(),
            "Image normalized"
        );

        Ok(NormalizedImage {
            bytes,
            width,
            height,
        })
    }

    /// Crop `source` to the requested box per the anchor and encode the
    /// result.
    pub fn transform(&self, source: &[u8], request: &CropRequest) -> Result<Bytes> {
        let (tw, th) = (request.target.width, request.target.height);
        if tw == 0 || th == 0 {
            return Err(Error::Dimension {
                width: tw,
                height: th,
            });
        }

        let img = image::load_from_memory(source)
            .map_err(|e| Error::decode(format!("Invalid image: {}", e)))?;
        let cropped = cover_crop(&img, tw, th, request.anchor)?;
        encode_jpeg(&flatten_onto_white(&cropped), self.output_quality)
    }
}

/// Cut the largest box with the target's aspect ratio out of the source and
/// scale it to exactly `tw`x`th`.
///
/// Horizontally the box is always centered; vertically the anchor decides.
/// Only the selected window is resampled, so the work stays bounded by the
/// source and target sizes whatever the aspect ratios.
pub fn cover_crop(img: &DynamicImage, tw: u32, th: u32, anchor: Anchor) -> Result<DynamicImage> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(Error::decode("image has no pixels"));
    }

    let (cw, ch) = crop_window(w, h, tw, th);
    let x = (w - cw) / 2;
    let y = match anchor {
        Anchor::Top => 0,
        Anchor::Center => (h - ch) / 2,
        Anchor::Bottom => h - ch,
    };

    let window = img.crop_imm(x, y, cw, ch);
    if (cw, ch) == (tw, th) {
        return Ok(window);
    }
    Ok(window.resize_exact(tw, th, FilterType::Lanczos3))
}

/// Size in source pixels of the region that ends up in the output.
fn crop_window(w: u32, h: u32, tw: u32, th: u32) -> (u32, u32) {
    let scale = f64::max(tw as f64 / w as f64, th as f64 / h as f64);
    let cw = ((tw as f64 / scale).round() as u32).clamp(1, w);
    let ch = ((th as f64 / scale).round() as u32).clamp(1, h);
    (cw, ch)
}

fn jpeg_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Jpeg) => {}
        Ok(other) => {
            return Err(Error::decode(format!(
                "Declared JPEG but content is {:?}",
                other
            )))
        }
        Err(e) => return Err(Error::decode(format!("Declared JPEG but content is not an image: {}", e))),
    }

    ImageReader::with_format(Cursor::new(data), image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| Error::decode(format!("Invalid jpeg image: {}", e)))
}

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Webp => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Tiff => image::ImageFormat::Tiff,
    }
}

/// JPEG has no alpha channel; composite transparent pixels over white.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Bytes> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(rgb)
        .map_err(|e| Error::encode(format!("jpeg encode failed: {}", e)))?;
    Ok(Bytes::from(buf))
}
