//! Image pipeline: upload processing, format conversion, stock photos.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::storage::{validate_id, UploadStore};
use crate::types::{CatalogError, CatalogResult};

/// Uploads are scaled to fit inside this box, never enlarged.
pub const MAX_UPLOAD_DIMENSION: u32 = 1200;

/// Maximum size of one uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum number of files in one upload request.
pub const MAX_UPLOAD_FILES: usize = 15;

/// Accepted upload content types.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Default encoding quality.
pub const DEFAULT_QUALITY: u8 = 85;

/// A processed, stored upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Output format for optimized renditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

/// Parameters for an optimized rendition of a stored image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub format: OutputFormat,
}

/// Reference to an optimized rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    pub format: OutputFormat,
}

/// Whether a content type is accepted for upload.
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// Scale to fit inside `max_w` x `max_h`, keeping aspect ratio, never enlarging.
pub fn fit_inside(img: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_w && h <= max_h {
        return img.clone();
    }
    img.resize(max_w, max_h, image::imageops::FilterType::Lanczos3)
}

/// Encode an image in the requested format.
///
/// WebP output is lossless; `quality` applies to JPEG only.
pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> CatalogResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    match format {
        OutputFormat::Webp => {
            let rgba = img.to_rgba8();
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut cursor))?;
        }
        OutputFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let quality = quality.clamp(1, 100);
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, quality))?;
        }
        OutputFormat::Png => {
            let rgba = img.to_rgba8();
            rgba.write_with_encoder(PngEncoder::new(&mut cursor))?;
        }
    }
    Ok(buf)
}

/// Decode, downscale, re-encode as WebP and store one upload.
pub fn process_upload(
    bytes: &[u8],
    original_name: &str,
    mime: &str,
    store: &UploadStore,
) -> CatalogResult<UploadedImage> {
    if !is_allowed_mime(mime) {
        return Err(CatalogError::InvalidInput(
            "Invalid file type. Only JPEG, PNG, and WebP are allowed.".to_string(),
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CatalogError::InvalidInput(format!(
            "File {original_name} exceeds the {MAX_UPLOAD_BYTES} byte limit"
        )));
    }

    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    let resized = fit_inside(&img, MAX_UPLOAD_DIMENSION, MAX_UPLOAD_DIMENSION);
    let encoded = encode(&resized, OutputFormat::Webp, DEFAULT_QUALITY)?;

    let id = UploadStore::new_id();
    let filename = format!("{id}.webp");
    store.write(&filename, &encoded)?;

    Ok(UploadedImage {
        url: UploadStore::url_for(&filename),
        id,
        filename,
        original_name: original_name.to_string(),
        size: bytes.len(),
        width,
        height,
        format: "webp".to_string(),
    })
}

/// File name of an optimized rendition.
pub fn optimized_filename(id: &str, req: &OptimizeRequest) -> String {
    let dim = |d: Option<u32>| d.map(|v| v.to_string()).unwrap_or_else(|| "auto".to_string());
    format!(
        "{id}-{}x{}-q{}.{}",
        dim(req.width),
        dim(req.height),
        req.quality,
        req.format.extension()
    )
}

/// Produce (or reuse) an optimized rendition of a stored image.
pub fn optimize(id: &str, req: &OptimizeRequest, store: &UploadStore) -> CatalogResult<OptimizedImage> {
    validate_id(id)?;
    let filename = optimized_filename(id, req);
    let result = OptimizedImage {
        url: UploadStore::url_for(&filename),
        width: req.width,
        height: req.height,
        quality: req.quality,
        format: req.format,
    };

    if store.exists(&filename) {
        tracing::debug!("Reusing optimized rendition {filename}");
        return Ok(result);
    }

    let original = store.read(&format!("{id}.webp"))?;
    let img = image::load_from_memory(&original)?;
    let img = if req.width.is_some() || req.height.is_some() {
        fit_inside(&img, req.width.unwrap_or(u32::MAX), req.height.unwrap_or(u32::MAX))
    } else {
        img
    };
    store.write(&filename, &encode(&img, req.format, req.quality)?)?;
    Ok(result)
}

/// Photo orientation filter for stock searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Squarish,
}

fn default_count() -> usize {
    6
}

/// Stock photo search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuery {
    pub query: String,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub orientation: Orientation,
}

impl StockQuery {
    pub fn validate(&self) -> CatalogResult<()> {
        let len = self.query.chars().count();
        if !(2..=100).contains(&len) {
            return Err(CatalogError::InvalidInput(
                "query must be between 2 and 100 characters".to_string(),
            ));
        }
        if !(1..=MAX_UPLOAD_FILES).contains(&self.count) {
            return Err(CatalogError::InvalidInput(format!(
                "count must be between 1 and {MAX_UPLOAD_FILES}"
            )));
        }
        Ok(())
    }
}

/// A curated stock photo reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPhoto {
    pub id: String,
    pub url: String,
    pub alt: String,
    pub photographer: String,
    pub download_url: String,
    pub query: String,
    pub orientation: Orientation,
    pub fetched_at: DateTime<Utc>,
}

const STOCK_LIBRARY: &[(&str, &str, &str, &str)] = &[
    ("unsplash-1", "photo-1505740420928-5e560c06d30e", "Premium wireless headphones", "C D-X"),
    ("unsplash-2", "photo-1484704849700-f032a568e944", "Modern headphones design", "Blocks Fletcher"),
    ("unsplash-3", "photo-1583394838336-acd977736f90", "Professional audio equipment", "Malte Wingen"),
    ("unsplash-4", "photo-1546435770-a3e426bf472b", "Wireless technology", "John Tekeridis"),
    ("unsplash-5", "photo-1558756520-22cfe5d382ca", "Audio device close-up", "Garrett Morrow"),
    ("unsplash-6", "photo-1487215078519-e21cc028cb29", "Premium product photography", "Sennheiser"),
];

/// Curated stock photos for a query.
pub fn stock_photos(query: &StockQuery, fetched_at: DateTime<Utc>) -> CatalogResult<Vec<StockPhoto>> {
    query.validate()?;
    let photos: Vec<StockPhoto> = STOCK_LIBRARY
        .iter()
        .take(query.count)
        .map(|(id, photo, alt, photographer)| StockPhoto {
            id: id.to_string(),
            url: format!("https://images.unsplash.com/{photo}?w=800&q=80"),
            alt: alt.to_string(),
            photographer: photographer.to_string(),
            download_url: format!("https://images.unsplash.com/{photo}?w=1200&q=85"),
            query: query.query.clone(),
            orientation: query.orientation,
            fetched_at,
        })
        .collect();
    tracing::info!("Found {} stock images for query: {}", photos.len(), query.query);
    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn test_fit_inside_never_enlarges() {
        let small = DynamicImage::new_rgb8(300, 200);
        assert_eq!(fit_inside(&small, 1200, 1200).dimensions(), (300, 200));

        let wide = DynamicImage::new_rgb8(2400, 1200);
        assert_eq!(fit_inside(&wide, 1200, 1200).dimensions(), (1200, 600));
    }

    #[test]
    fn test_process_upload_stores_webp() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();
        let uploaded = process_upload(&png(1600, 800), "shot.png", "image/png", &store).unwrap();

        assert_eq!(uploaded.width, 1600);
        assert_eq!(uploaded.height, 800);
        assert_eq!(uploaded.format, "webp");
        assert_eq!(uploaded.url, format!("/uploads/{}", uploaded.filename));
        let stored = image::load_from_memory(&store.read(&uploaded.filename).unwrap()).unwrap();
        assert_eq!(stored.dimensions(), (1200, 600));
    }

    #[test]
    fn test_process_upload_rejects_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();
        let err = process_upload(&png(10, 10), "a.gif", "image/gif", &store).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
    }

    #[test]
    fn test_optimize_creates_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();
        let uploaded = process_upload(&png(800, 800), "a.png", "image/png", &store).unwrap();

        let req = OptimizeRequest {
            width: Some(400),
            height: Some(400),
            quality: 70,
            format: OutputFormat::Jpeg,
        };
        let first = optimize(&uploaded.id, &req, &store).unwrap();
        assert_eq!(first.url, format!("/uploads/{}-400x400-q70.jpeg", uploaded.id));
        let filename = first.url.trim_start_matches("/uploads/").to_string();
        let rendered = image::load_from_memory(&store.read(&filename).unwrap()).unwrap();
        assert_eq!(rendered.dimensions(), (400, 400));

        let second = optimize(&uploaded.id, &req, &store).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_optimize_missing_original() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();
        let req: OptimizeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.quality, DEFAULT_QUALITY);
        assert!(matches!(
            optimize("nope", &req, &store),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_stock_photos_slice_and_validate() {
        let now = Utc::now();
        let query = StockQuery {
            query: "headphones".into(),
            count: 3,
            orientation: Orientation::Portrait,
        };
        let photos = stock_photos(&query, now).unwrap();
        assert_eq!(photos.len(), 3);
        assert_eq!(photos[0].id, "unsplash-1");
        assert_eq!(photos[2].orientation, Orientation::Portrait);

        let bad = StockQuery {
            query: "x".into(),
            count: 3,
            orientation: Orientation::Landscape,
        };
        assert!(stock_photos(&bad, now).is_err());

        let many = StockQuery {
            query: "speakers".into(),
            count: 15,
            orientation: Orientation::Squarish,
        };
        assert_eq!(stock_photos(&many, now).unwrap().len(), STOCK_LIBRARY.len());
    }
}
