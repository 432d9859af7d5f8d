//! Raster image transforms and analysis. Inputs are decoded with `image`,
//! every transform is re-encoded as PNG.

use std::collections::HashMap;
use std::io::Cursor;

use ::image::{
    imageops::FilterType, ColorType, DynamicImage, GenericImageView, ImageFormat, ImageReader,
    Rgba, RgbaImage,
};
use imageproc::{
    edges::canny,
    filter::median_filter,
    geometric_transformations::{rotate_about_center, Interpolation},
};
use serde_json::{json, Value};

use super::{OpError, Output, Params};

pub const OPERATIONS: &[&str] = &[
    "enhance",
    "blur",
    "sharpen",
    "resize",
    "rotate",
    "grayscale",
    "edge_detection",
    "color_correction",
    "noise_reduction",
    "analyze",
];

const MAX_DIMENSION: u32 = 8192;
const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];
/// Share of pixels ignored at each end of a channel before stretching.
const WHITE_BALANCE_CLIP: f64 = 0.02;
const DOMINANT_COLORS: usize = 5;
const MAX_SAMPLED_PIXELS: usize = 250_000;

pub fn run(operation: &str, params: Params<'_>, source: &[u8]) -> Result<Output, OpError> {
    if !OPERATIONS.contains(&operation) {
        return Err(OpError::Unsupported {
            family: super::Family::Image,
            operation: operation.to_string(),
        });
    }
    let (image, format) = decode(source)?;

    let processed = match operation {
        "analyze" => return Output::json(&analyze(&image, format, source.len())),
        "enhance" => enhance(
            image,
            params.f64_or("brightness", 1.0).clamp(0.0, 10.0) as f32,
            params.f64_or("contrast", 1.0).clamp(0.0, 10.0) as f32,
        ),
        "blur" => image.blur(gaussian_sigma(params.usize_or("kernel_size", 15))),
        "sharpen" => image.filter3x3(&SHARPEN_KERNEL),
        "resize" => {
            let width = dimension(params, "width", image.width());
            let height = dimension(params, "height", image.height());
            image.resize_exact(width, height, FilterType::Triangle)
        }
        "rotate" => rotate(&image, params.f64_or("angle", 0.0) as f32),
        "grayscale" => image.grayscale(),
        "edge_detection" => DynamicImage::ImageLuma8(canny(
            &image.to_luma8(),
            params.f64_or("threshold1", 100.0) as f32,
            params.f64_or("threshold2", 200.0) as f32,
        )),
        "color_correction" => white_balance(&image),
        _ => {
            let radius = params.usize_or("radius", 1).clamp(1, 10) as u32;
            DynamicImage::ImageRgba8(median_filter(&image.to_rgba8(), radius, radius))
        }
    };
    encode_png(processed)
}

fn decode(source: &[u8]) -> Result<(DynamicImage, ImageFormat), OpError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| OpError::InvalidInput(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| OpError::InvalidInput("unrecognised image format".to_string()))?;
    Ok((reader.decode()?, format))
}

fn encode_png(image: DynamicImage) -> Result<Output, OpError> {
    // PNG has no float pixel layouts.
    let image = match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => image,
    };
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(Output {
        bytes: bytes.into_inner(),
        extension: "png",
        metadata: json!({
            "width": image.width(),
            "height": image.height(),
            "format": "png",
        }),
    })
}

fn dimension(params: Params<'_>, key: &str, current: u32) -> u32 {
    let requested = params.usize_or(key, current as usize);
    u32::try_from(requested)
        .unwrap_or(MAX_DIMENSION)
        .clamp(1, MAX_DIMENSION)
}

/// Sigma OpenCV derives for a square Gaussian kernel of odd size `k`.
fn gaussian_sigma(kernel_size: usize) -> f32 {
    let k = kernel_size.clamp(1, 99) | 1;
    (0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8).max(0.1)
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Brightness scales every channel; contrast scales distance from the mean grey.
fn enhance(image: DynamicImage, brightness: f32, contrast: f32) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    if brightness != 1.0 {
        for pixel in rgba.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = to_u8(f32::from(*channel) * brightness);
            }
        }
    }
    if contrast != 1.0 {
        let mean = mean_luma(&rgba);
        for pixel in rgba.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = to_u8(mean + (f32::from(*channel) - mean) * contrast);
            }
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

fn mean_luma(rgba: &RgbaImage) -> f32 {
    let count = rgba.pixels().len();
    if count == 0 {
        return 0.0;
    }
    let total: f64 = rgba
        .pixels()
        .map(|Rgba([r, g, b, _])| {
            0.299 * f64::from(*r) + 0.587 * f64::from(*g) + 0.114 * f64::from(*b)
        })
        .sum();
    (total / count as f64) as f32
}

/// Counter-clockwise by `degrees` about the centre; the canvas keeps its size.
fn rotate(image: &DynamicImage, degrees: f32) -> DynamicImage {
    let theta = -degrees.to_radians();
    DynamicImage::ImageRgba8(rotate_about_center(
        &image.to_rgba8(),
        theta,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    ))
}

/// Stretches each colour channel so its clipped range spans 0..=255.
fn white_balance(image: &DynamicImage) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    let clip = (rgba.pixels().len() as f64 * WHITE_BALANCE_CLIP) as usize;

    for channel in 0..3 {
        let mut histogram = [0usize; 256];
        for pixel in rgba.pixels() {
            histogram[usize::from(pixel.0[channel])] += 1;
        }
        let low = low_cut(&histogram, clip);
        let high = high_cut(&histogram, clip);
        if high <= low {
            continue;
        }
        let span = f32::from(high - low);
        for pixel in rgba.pixels_mut() {
            let value = pixel.0[channel].clamp(low, high) - low;
            pixel.0[channel] = to_u8(f32::from(value) * 255.0 / span);
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

fn low_cut(histogram: &[usize; 256], clip: usize) -> u8 {
    let mut seen = 0;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > clip {
            return value as u8;
        }
    }
    u8::MAX
}

fn high_cut(histogram: &[usize; 256], clip: usize) -> u8 {
    let mut seen = 0;
    for (value, count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > clip {
            return value as u8;
        }
    }
    0
}

fn analyze(image: &DynamicImage, format: ImageFormat, size_bytes: usize) -> Value {
    let (width, height) = image.dimensions();
    json!({
        "image_info": {
            "format": format!("{format:?}").to_lowercase(),
            "width": width,
            "height": height,
            "channels": image.color().channel_count(),
            "size_bytes": size_bytes,
            "size_mb": (size_bytes as f64 / (1024.0 * 1024.0) * 10_000.0).round() / 10_000.0,
        },
        "colors": dominant_colors(image),
    })
}

/// Most common colours after quantising each channel to 8 levels. Each
/// entry reports the mean of the pixels in its bucket.
fn dominant_colors(image: &DynamicImage) -> Value {
    let rgb = image.to_rgb8();
    let total = rgb.pixels().len();
    let step = (total / MAX_SAMPLED_PIXELS).max(1);

    let mut buckets: HashMap<(u8, u8, u8), (usize, [u64; 3])> = HashMap::new();
    let mut sampled = 0usize;
    for pixel in rgb.pixels().step_by(step) {
        let [r, g, b] = pixel.0;
        let entry = buckets.entry((r >> 5, g >> 5, b >> 5)).or_default();
        entry.0 += 1;
        entry.1[0] += u64::from(r);
        entry.1[1] += u64::from(g);
        entry.1[2] += u64::from(b);
        sampled += 1;
    }

    let mut ranked: Vec<_> = buckets.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(&b.0)));

    let colors: Vec<Value> = ranked
        .into_iter()
        .take(DOMINANT_COLORS)
        .map(|(_, (count, sums))| {
            let mean = sums.map(|sum| (sum / count as u64) as u8);
            json!({
                "color": mean,
                "percentage": (count as f64 / sampled as f64 * 10_000.0).round() / 100.0,
            })
        })
        .collect();
    let palette = match colors.first().and_then(|c| c["color"][0].as_u64()) {
        Some(red) if red > 150 => "warm",
        _ => "cool",
    };

    json!({
        "dominant_colors": colors,
        "color_palette": palette,
    })
}
