//! Static catalog of the tools this server offers.

use serde::Serialize;

use crate::features::DetectionMethod;

pub const FEATURE_EXTRACTOR_ID: &str = "feature-extractor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolStatus {
    Active,
    ComingSoon,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
}

pub fn tool_catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            id: FEATURE_EXTRACTOR_ID,
            name: "Feature Extractor",
            description:
                "Extract and visualize keypoints from images using SIFT, ORB, AKAZE, or BRISK",
            status: ToolStatus::Active,
            methods: Some(DetectionMethod::ALL.iter().map(|m| m.to_string()).collect()),
        },
        ToolDescriptor {
            id: "3d-reconstruction-benchmark",
            name: "3D Reconstruction Benchmark",
            description: "Compare different methods to reconstruct 3D scenes from images",
            status: ToolStatus::ComingSoon,
            methods: Some(vec![
                "colmap".to_string(),
                "MapAnything".to_string(),
                "other stuff".to_string(),
            ]),
        },
        ToolDescriptor {
            id: "underwater-tracking",
            name: "Underwater Object Tracking",
            description: "Track and analyze underwater objects in video footage",
            status: ToolStatus::ComingSoon,
            methods: None,
        },
    ]
}

/// Ids of the tools that can actually be used.
pub fn available_tools() -> Vec<&'static str> {
    tool_catalog()
        .into_iter()
        .filter(|t| t.status == ToolStatus::Active)
        .map(|t| t.id)
        .collect()
}
