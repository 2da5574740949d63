//! Test pattern generation
//!
//! RGB8 fixtures plus helpers to lay them out with padded strides and to
//! compare results.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Test pattern types
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Horizontal gradient black to white
    GradientH,
    /// RGB color cube corners (8 colors)
    ColorCube,
    /// Grayscale ramp 0-255
    Grayscale,
    /// Random pixels with seed
    Random(u64),
    /// All zeros (black)
    Black,
    /// All 255 (white)
    White,
}

/// Generate test pattern as a tightly packed RGB8 buffer
pub fn generate_pattern(pattern: TestPattern, width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    let mut data = vec![0u8; pixel_count * 3];

    match pattern {
        TestPattern::GradientH => {
            for row in data.chunks_exact_mut(width * 3) {
                for (x, px) in row.chunks_exact_mut(3).enumerate() {
                    px.fill(((x as f32 / width as f32) * 255.0) as u8);
                }
            }
        }
        TestPattern::ColorCube => {
            let corners: [[u8; 3]; 8] = [
                [0, 0, 0],
                [255, 0, 0],
                [0, 255, 0],
                [0, 0, 255],
                [255, 255, 0],
                [255, 0, 255],
                [0, 255, 255],
                [255, 255, 255],
            ];
            for (i, chunk) in data.chunks_exact_mut(3).enumerate() {
                chunk.copy_from_slice(&corners[i % 8]);
            }
        }
        TestPattern::Grayscale => {
            for (i, chunk) in data.chunks_exact_mut(3).enumerate() {
                chunk.fill(((i as f32 / pixel_count as f32) * 255.0) as u8);
            }
        }
        TestPattern::Random(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.fill_bytes(&mut data);
        }
        TestPattern::Black => {}
        TestPattern::White => data.fill(255),
    }

    data
}

/// Copy packed rows into a buffer with `stride` bytes per row. Padding
/// bytes are filled with `0xA5` so stray writes show up.
pub fn strided(data: &[u8], width: usize, height: usize, bpp: usize, stride: usize) -> Vec<u8> {
    let row = width * bpp;
    assert!(stride >= row, "stride {stride} shorter than row {row}");
    let mut out = vec![0xA5u8; stride * height];
    for (dst, src) in out.chunks_exact_mut(stride).zip(data.chunks_exact(row)) {
        dst[..row].copy_from_slice(src);
    }
    out
}

/// Largest absolute per-channel difference between two buffers
pub fn max_channel_diff(a: &[u8], b: &[u8]) -> u8 {
    assert_eq!(a.len(), b.len(), "buffer lengths differ");
    a.iter().zip(b).map(|(&x, &y)| x.abs_diff(y)).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_black() {
        let data = generate_pattern(TestPattern::Black, 2, 2);
        assert!(data.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_generate_white() {
        let data = generate_pattern(TestPattern::White, 2, 2);
        assert!(data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_random_deterministic() {
        let a = generate_pattern(TestPattern::Random(42), 10, 10);
        let b = generate_pattern(TestPattern::Random(42), 10, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_strided_pads_rows() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let out = strided(&data, 1, 2, 3, 5);
        assert_eq!(out, vec![1, 2, 3, 0xA5, 0xA5, 4, 5, 6, 0xA5, 0xA5]);
    }

    #[test]
    fn test_max_channel_diff() {
        assert_eq!(max_channel_diff(&[0, 10, 200], &[3, 10, 190]), 10);
        assert_eq!(max_channel_diff(&[], &[]), 0);
    }
}
