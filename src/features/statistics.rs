//! Descriptive statistics over a detector run.

use serde::Serialize;

use super::{DescriptorMatrix, Keypoint};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Aggregates that only exist when at least one keypoint was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeypointSummary {
    pub avg_size: f64,
    pub std_size: f64,
    pub avg_response: f64,
    pub std_response: f64,
    pub size_range: ValueRange,
    pub response_range: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub num_keypoints: usize,
    pub descriptor_shape: Option<[usize; 2]>,
    pub descriptor_dtype: Option<&'static str>,
    /// Flattened into the parent object; absent from the JSON when there are no keypoints.
    #[serde(flatten)]
    pub summary: Option<KeypointSummary>,
}

struct Moments {
    mean: f64,
    std: f64,
    range: ValueRange,
}

/// Mean, population standard deviation and range. `None` for an empty input.
fn moments(values: impl Iterator<Item = f64> + Clone) -> Option<Moments> {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.clone() {
        n += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    if n == 0 {
        return None;
    }

    let mean = sum / n as f64;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    Some(Moments {
        mean,
        std: variance.sqrt(),
        range: ValueRange { min, max },
    })
}

pub fn compute_statistics(
    keypoints: &[Keypoint],
    descriptors: Option<&DescriptorMatrix>,
) -> Statistics {
    let sizes = moments(keypoints.iter().map(|kp| kp.size as f64));
    let responses = moments(keypoints.iter().map(|kp| kp.response as f64));

    let summary = match (sizes, responses) {
        (Some(sizes), Some(responses)) => Some(KeypointSummary {
            avg_size: sizes.mean,
            std_size: sizes.std,
            avg_response: responses.mean,
            std_response: responses.std,
            size_range: sizes.range,
            response_range: responses.range,
        }),
        _ => None,
    };

    Statistics {
        num_keypoints: keypoints.len(),
        descriptor_shape: descriptors.map(DescriptorMatrix::shape),
        descriptor_dtype: descriptors.map(DescriptorMatrix::dtype),
        summary,
    }
}
