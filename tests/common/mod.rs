//! Synthetic photographs shared by the integration tests.
//!
//! Scenes are smooth brightness layouts with deterministic per-pixel noise,
//! so they compress like photographs and clear the classifier's size and
//! variance floors. Each image streams its noise from one xorshift
//! generator, so a seed reproduces the whole picture exactly.

#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use vehicle_photo_guard::core::input::ImageBytes;

/// Deterministic xorshift noise in `[-amplitude, amplitude]`
struct Noise {
    state: u32,
    amplitude: i32,
}

impl Noise {
    fn new(seed: u32, amplitude: i32) -> Self {
        Self {
            state: seed.max(1),
            amplitude,
        }
    }

    fn next(&mut self) -> i32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        if self.amplitude == 0 {
            return 0;
        }
        (self.state % (2 * self.amplitude as u32 + 1)) as i32 - self.amplitude
    }
}

fn channel(base: i32, noise: &mut Noise) -> u8 {
    (base + noise.next()).clamp(0, 255) as u8
}

/// Brightening left to right
pub fn horizontal_scene(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut noise = Noise::new(seed, 20);
    RgbImage::from_fn(width, height, |x, y| {
        let t = (x * 200 / width) as i32;
        let s = (y * 40 / height) as i32;
        Rgb([
            channel(30 + t, &mut noise),
            channel(40 + t + s, &mut noise),
            channel(20 + t / 2 + s, &mut noise),
        ])
    })
}

/// Brightening top to bottom
pub fn vertical_scene(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut noise = Noise::new(seed, 20);
    RgbImage::from_fn(width, height, |x, y| {
        let t = (y * 200 / height) as i32;
        let s = (x * 40 / width) as i32;
        Rgb([
            channel(20 + t + s, &mut noise),
            channel(35 + t, &mut noise),
            channel(50 + t / 2, &mut noise),
        ])
    })
}

/// A bright horizontal band across the middle
pub fn band_scene(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut noise = Noise::new(seed, 20);
    RgbImage::from_fn(width, height, |x, y| {
        let t = 140 - (y as i32 * 280 / height as i32 - 140).abs() + (x * 20 / width) as i32;
        Rgb([
            channel(40 + t, &mut noise),
            channel(30 + t, &mut noise),
            channel(30 + t, &mut noise),
        ])
    })
}

/// Bright top-left and bottom-right quadrants
pub fn quadrant_scene(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut noise = Noise::new(seed, 20);
    RgbImage::from_fn(width, height, |x, y| {
        let base = if x * 2 / width == y * 2 / height { 180 } else { 60 };
        Rgb([
            channel(base, &mut noise),
            channel(base - 10, &mut noise),
            channel(base + 10, &mut noise),
        ])
    })
}

/// A bright disc on a dark background
pub fn spot_scene(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut noise = Noise::new(seed, 20);
    let (cx, cy) = (i64::from(width / 2), i64::from(height / 2));
    let radius = i64::from(width.min(height) / 3);
    RgbImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (i64::from(x) - cx, i64::from(y) - cy);
        let base = if dx * dx + dy * dy < radius * radius { 200 } else { 50 };
        Rgb([
            channel(base, &mut noise),
            channel(base, &mut noise),
            channel(base, &mut noise),
        ])
    })
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub fn jpeg_bytes(image: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
        .unwrap();
    buffer
}

pub fn png(image: &RgbImage) -> ImageBytes {
    ImageBytes::new(png_bytes(image), "image/png")
}

pub fn jpeg(image: &RgbImage, quality: u8) -> ImageBytes {
    ImageBytes::new(jpeg_bytes(image, quality), "image/jpeg")
}

/// Decode a payload and save it again as PNG
pub fn reencode_as_png(image: &ImageBytes) -> ImageBytes {
    let decoded = image::load_from_memory(image.as_bytes()).unwrap();
    png(&decoded.to_rgb8())
}
