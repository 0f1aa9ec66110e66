//! Test image generation
//!
//! Images are built in memory with OpenCV and encoded as PNG, so tests never depend
//! on files checked into the repository.

use super::constants::*;
use opencv::core::{self, Mat, Rect, Scalar, Vector};
use opencv::imgcodecs;
use opencv::imgproc;

fn encode_png(image: &Mat) -> Vec<u8> {
    let mut buf = Vector::<u8>::new();
    let ok = imgcodecs::imencode(".png", image, &mut buf, &Vector::new())
        .expect("Failed to encode test image");
    assert!(ok, "OpenCV refused to encode test image");
    buf.to_vec()
}

/// A uniform gray square. No detector finds keypoints on it.
#[allow(dead_code)]
pub fn blank_png() -> Vec<u8> {
    let image = Mat::new_rows_cols_with_default(
        TEST_IMAGE_SIDE,
        TEST_IMAGE_SIDE,
        core::CV_8UC3,
        Scalar::all(BLANK_GRAY_LEVEL),
    )
    .expect("Failed to create blank image");
    encode_png(&image)
}

/// A black and white checkerboard, rich in corners.
#[allow(dead_code)]
pub fn textured_png() -> Vec<u8> {
    let side = TEST_IMAGE_SIDE * 2;
    let mut image =
        Mat::new_rows_cols_with_default(side, side, core::CV_8UC3, Scalar::all(0.0))
            .expect("Failed to create textured image");

    for row in 0..side / CHECKER_CELL {
        for col in 0..side / CHECKER_CELL {
            if (row + col) % 2 == 0 {
                continue;
            }
            imgproc::rectangle(
                &mut image,
                Rect::new(col * CHECKER_CELL, row * CHECKER_CELL, CHECKER_CELL, CHECKER_CELL),
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )
            .expect("Failed to draw checker cell");
        }
    }
    encode_png(&image)
}
