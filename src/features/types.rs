//! Feature model shared between extraction, statistics and visualization.

use opencv::core::{self, KeyPoint, Mat, Vector};
use opencv::prelude::*;

use super::DetectionMethod;

/// A detected salient location, copied out of the backend representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub angle: f32,
    pub response: f32,
    pub octave: i32,
    pub class_id: i32,
}

impl From<&KeyPoint> for Keypoint {
    fn from(kp: &KeyPoint) -> Self {
        let pt = kp.pt();
        Keypoint {
            x: pt.x,
            y: pt.y,
            size: kp.size(),
            angle: kp.angle(),
            response: kp.response(),
            octave: kp.octave(),
            class_id: kp.class_id(),
        }
    }
}

/// Element type of a descriptor matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    U8,
    F32,
}

impl DescriptorType {
    /// Element type tag, spelled the way numpy spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorType::U8 => "uint8",
            DescriptorType::F32 => "float32",
        }
    }
}

/// Shape and element type of the backend descriptor matrix, one row per keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatrix {
    pub rows: usize,
    pub cols: usize,
    pub element_type: DescriptorType,
}

impl DescriptorMatrix {
    /// Returns `Ok(None)` for an empty matrix, which is what detectors hand back when
    /// nothing was found.
    pub fn from_mat(mat: &Mat) -> opencv::Result<Option<Self>> {
        if mat.empty() {
            return Ok(None);
        }
        let element_type = match mat.depth() {
            core::CV_8U => DescriptorType::U8,
            core::CV_32F => DescriptorType::F32,
            other => {
                return Err(opencv::Error::new(
                    core::StsUnsupportedFormat,
                    format!("Unsupported descriptor depth: {}", other),
                ))
            }
        };
        Ok(Some(DescriptorMatrix {
            rows: mat.rows() as usize,
            cols: mat.cols() as usize,
            element_type,
        }))
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    pub fn dtype(&self) -> &'static str {
        self.element_type.as_str()
    }
}

/// Output of one detector run. Lives only for the duration of a request.
pub struct FeatureSet {
    pub method: DetectionMethod,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Option<DescriptorMatrix>,
    /// Backend keypoints, kept as-is for drawing.
    pub(crate) raw_keypoints: Vector<KeyPoint>,
}

impl FeatureSet {
    pub fn from_backend(
        method: DetectionMethod,
        raw_keypoints: Vector<KeyPoint>,
        descriptors: &Mat,
    ) -> opencv::Result<Self> {
        let keypoints = raw_keypoints.iter().map(|kp| Keypoint::from(&kp)).collect();
        Ok(FeatureSet {
            method,
            keypoints,
            descriptors: DescriptorMatrix::from_mat(descriptors)?,
            raw_keypoints,
        })
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}
