use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One post in the archive's `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediatePostEntry {
    pub id: Uuid,
    pub paths: Vec<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub source: String,
    pub tags: Vec<String>,
    pub attachments: Vec<IntermediateAttachmentEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// One media file referenced by a post; `file` names it inside `media/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateAttachmentEntry {
    pub id: Uuid,
    pub url: String,
    pub paths: Vec<String>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}
