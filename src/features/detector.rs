//! Detector registry: maps a [`DetectionMethod`] to an OpenCV feature detector.

use std::fmt;
use std::str::FromStr;

use opencv::core::{KeyPoint, Mat, Ptr, Vector};
use opencv::features2d::{AKAZE, BRISK, ORB, SIFT};
use opencv::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FeatureSet;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Unknown method: {0}. Choose from: SIFT, ORB, AKAZE, BRISK")]
    UnsupportedMethod(String),

    #[error("{method} backend error: {source}")]
    Backend {
        method: DetectionMethod,
        #[source]
        source: opencv::Error,
    },
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DetectionMethod {
    #[default]
    #[serde(rename = "SIFT")]
    Sift,
    #[serde(rename = "ORB")]
    Orb,
    #[serde(rename = "AKAZE")]
    Akaze,
    #[serde(rename = "BRISK")]
    Brisk,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 4] = [
        DetectionMethod::Sift,
        DetectionMethod::Orb,
        DetectionMethod::Akaze,
        DetectionMethod::Brisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Sift => "SIFT",
            DetectionMethod::Orb => "ORB",
            DetectionMethod::Akaze => "AKAZE",
            DetectionMethod::Brisk => "BRISK",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = DetectorError;

    /// Names are matched exactly, "orb" is not a valid method.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DetectorError::UnsupportedMethod(s.to_string()))
    }
}

/// A constructed detector, one variant per method.
pub enum Detector {
    Sift(Ptr<SIFT>),
    Orb(Ptr<ORB>),
    Akaze(Ptr<AKAZE>),
    Brisk(Ptr<BRISK>),
}

/// Builds the detector for `method` with the library defaults.
pub fn create_detector(method: DetectionMethod) -> Result<Detector, DetectorError> {
    let detector = match method {
        DetectionMethod::Sift => SIFT::create_def().map(Detector::Sift),
        DetectionMethod::Orb => ORB::create_def().map(Detector::Orb),
        DetectionMethod::Akaze => AKAZE::create_def().map(Detector::Akaze),
        DetectionMethod::Brisk => BRISK::create_def().map(Detector::Brisk),
    };
    detector.map_err(|source| DetectorError::Backend { method, source })
}

impl Detector {
    pub fn method(&self) -> DetectionMethod {
        match self {
            Detector::Sift(_) => DetectionMethod::Sift,
            Detector::Orb(_) => DetectionMethod::Orb,
            Detector::Akaze(_) => DetectionMethod::Akaze,
            Detector::Brisk(_) => DetectionMethod::Brisk,
        }
    }

    /// Runs detection and description on a single-channel image.
    pub fn detect_and_compute(&mut self, gray: &Mat) -> Result<FeatureSet, DetectorError> {
        let method = self.method();
        let mask = Mat::default();
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();

        let outcome = match self {
            Detector::Sift(d) => {
                d.detect_and_compute_def(gray, &mask, &mut keypoints, &mut descriptors)
            }
            Detector::Orb(d) => {
                d.detect_and_compute_def(gray, &mask, &mut keypoints, &mut descriptors)
            }
            Detector::Akaze(d) => {
                d.detect_and_compute_def(gray, &mask, &mut keypoints, &mut descriptors)
            }
            Detector::Brisk(d) => {
                d.detect_and_compute_def(gray, &mask, &mut keypoints, &mut descriptors)
            }
        };

        outcome
            .and_then(|_| FeatureSet::from_backend(method, keypoints, &descriptors))
            .map_err(|source| DetectorError::Backend { method, source })
    }
}
