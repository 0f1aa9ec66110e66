//! Renders detected keypoints onto the grayscale image and writes a titled PNG.

use std::path::Path;

use opencv::core::{self, Mat, Point, Scalar, Vector};
use opencv::features2d::{self, DrawMatchesFlags};
use opencv::imgcodecs;
use opencv::imgproc;
use opencv::prelude::*;

use super::FeatureSet;

/// White margin around the annotated image, in pixels.
const MARGIN: i32 = 20;
const TITLE_FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;
const TITLE_THICKNESS: i32 = 2;

pub fn title_for(features: &FeatureSet) -> String {
    format!(
        "{} Features: {} keypoints detected",
        features.method,
        features.len()
    )
}

/// Font scale that keeps the title within the image width.
fn fit_title_scale(title: &str, available_width: i32) -> opencv::Result<f64> {
    let mut scale = (available_width as f64 / 900.0).clamp(0.4, 1.6);
    let mut baseline = 0;
    loop {
        let size =
            imgproc::get_text_size(title, TITLE_FONT, scale, TITLE_THICKNESS, &mut baseline)?;
        if size.width <= available_width || scale <= 0.3 {
            return Ok(scale);
        }
        scale *= 0.9;
    }
}

/// Draws rich keypoints (circle radius from size, tick from angle) and composes the figure.
pub fn compose_figure(gray: &Mat, features: &FeatureSet) -> opencv::Result<Mat> {
    let mut annotated = Mat::default();
    features2d::draw_keypoints(
        gray,
        &features.raw_keypoints,
        &mut annotated,
        Scalar::all(-1.0),
        DrawMatchesFlags::DRAW_RICH_KEYPOINTS,
    )?;

    let title = title_for(features);
    let scale = fit_title_scale(&title, annotated.cols().max(MARGIN * 4))?;
    let mut baseline = 0;
    let text_size =
        imgproc::get_text_size(&title, TITLE_FONT, scale, TITLE_THICKNESS, &mut baseline)?;
    let title_band = text_size.height + baseline + MARGIN * 2;

    let white = Scalar::all(255.0);
    let mut figure = Mat::default();
    core::copy_make_border(
        &annotated,
        &mut figure,
        title_band,
        MARGIN,
        MARGIN,
        MARGIN,
        core::BORDER_CONSTANT,
        white,
    )?;

    let text_x = ((figure.cols() - text_size.width) / 2).max(0);
    let text_y = MARGIN + text_size.height;
    imgproc::put_text(
        &mut figure,
        &title,
        Point::new(text_x, text_y),
        TITLE_FONT,
        scale,
        Scalar::all(0.0),
        TITLE_THICKNESS,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(figure)
}

/// Renders the visualization and encodes it as PNG at `output_path`.
pub fn render_visualization(
    gray: &Mat,
    features: &FeatureSet,
    output_path: &Path,
) -> opencv::Result<()> {
    let figure = compose_figure(gray, features)?;
    let path = output_path.to_str().ok_or_else(|| {
        opencv::Error::new(
            core::StsBadArg,
            format!("Output path is not valid UTF-8: {:?}", output_path),
        )
    })?;

    if !imgcodecs::imwrite(path, &figure, &Vector::new())? {
        return Err(opencv::Error::new(
            core::StsError,
            format!("Could not write image to {}", path),
        ));
    }
    Ok(())
}
