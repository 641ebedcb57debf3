//! Synthetic photographs for unit tests.
//!
//! Noise is a pure function of pixel position and seed, so any single
//! pixel can be reasoned about without replaying a generator.

use crate::core::input::ImageBytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Offset in `[-amplitude, amplitude]` for one channel of one pixel
fn dither(x: u32, y: u32, channel: u32, seed: u32, amplitude: i32) -> i32 {
    if amplitude <= 0 {
        return 0;
    }
    // lowbias32 integer hash
    let mut h = x
        .wrapping_mul(0x9E37_79B9)
        ^ y.wrapping_mul(0x85EB_CA6B)
        ^ channel.wrapping_mul(0xC2B2_AE35)
        ^ seed.wrapping_mul(0x27D4_EB2F);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    (h % (2 * amplitude as u32 + 1)) as i32 - amplitude
}

fn pixel(x: u32, y: u32, base: [i32; 3], noise: i32, seed: u32) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for (c, value) in base.iter().enumerate() {
        out[c] = (value + dither(x, y, c as u32, seed, noise)).clamp(0, 255) as u8;
    }
    Rgb(out)
}

/// Brightens left to right
pub fn horizontal_scene(width: u32, height: u32, noise: i32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let t = (x * 200 / width.max(1)) as i32;
        let s = (y * 40 / height.max(1)) as i32;
        pixel(x, y, [30 + t, 40 + t + s, 20 + t / 2 + s], noise, seed)
    })
}

/// Brightens top to bottom
pub fn vertical_scene(width: u32, height: u32, noise: i32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let t = (y * 200 / height.max(1)) as i32;
        let s = (x * 40 / width.max(1)) as i32;
        pixel(x, y, [20 + t + s, 35 + t, 50 + t / 2], noise, seed)
    })
}

pub fn solid(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
}

fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

pub fn png(image: &RgbImage) -> ImageBytes {
    ImageBytes::new(encode(image, ImageFormat::Png), "image/png")
}

pub fn jpeg(image: &RgbImage) -> ImageBytes {
    ImageBytes::new(encode(image, ImageFormat::Jpeg), "image/jpeg")
}
