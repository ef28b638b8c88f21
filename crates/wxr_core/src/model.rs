/// A published post as extracted from the export, before conversion.
///
/// `content`, `lat` and `lon` are filled in by normalization; everything else
/// is set once by the reader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPost {
    pub post_id: Option<String>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: String,
    pub post_date: Option<String>,
    pub post_date_gmt: Option<String>,
    /// The post slug.
    pub post_name: Option<String>,
    pub tags: Vec<String>,
    pub attachments: Vec<RawAttachment>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A media record, either declared as an export item or synthesized from an
/// `<img>` reference found in post content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawAttachment {
    pub post_id: Option<String>,
    pub url: String,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub post_parent: Option<String>,
}

impl RawAttachment {
    /// Stub for an image found in content that no export item declares.
    pub fn ad_hoc(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn has_caption(&self) -> bool {
        self.caption.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn is_child_of(&self, post_id: Option<&str>) -> bool {
        match (self.post_parent.as_deref(), post_id) {
            (Some(parent), Some(id)) => parent == id,
            _ => false,
        }
    }
}
