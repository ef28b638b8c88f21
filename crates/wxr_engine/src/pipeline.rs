use wxr_core::{convert_posts, AttachmentIndex, IntermediatePostEntry, RawAttachment, RawPost};
use wxr_logging::wxr_debug;

use crate::normalize::Normalizer;
use crate::wxr::WxrExport;

/// State owned by one export run: the normalizer and the attachment index
/// every post is normalized against. Dropped once the run is packaged.
pub struct ExportRun {
    normalizer: Normalizer,
    index: AttachmentIndex,
}

impl ExportRun {
    /// Seed the index with the export's declared attachments.
    pub fn new(normalizer: Normalizer, declared: impl IntoIterator<Item = RawAttachment>) -> Self {
        Self {
            normalizer,
            index: AttachmentIndex::from_attachments(declared),
        }
    }

    pub fn index(&self) -> &AttachmentIndex {
        &self.index
    }

    pub fn into_index(self) -> AttachmentIndex {
        self.index
    }

    /// Normalize every post in input order, then give each post its
    /// attachments: declared children first (index order), then any local
    /// image it references that is not already listed.
    ///
    /// Attachments are assigned after all posts are normalized so captions
    /// picked up from any post are visible on every copy.
    pub fn prepare(&mut self, posts: Vec<RawPost>) -> Vec<RawPost> {
        let mut prepared = Vec::with_capacity(posts.len());
        let mut references = Vec::with_capacity(posts.len());
        for mut post in posts {
            let normalized = self.normalizer.normalize(&post.content, &mut self.index);
            post.content = normalized.markup;
            post.lat = normalized.lat;
            post.lon = normalized.lon;
            references.push(normalized.referenced);
            prepared.push(post);
        }

        for (post, referenced) in prepared.iter_mut().zip(references) {
            post.attachments = self.attachments_for(post.post_id.as_deref(), &referenced);
            wxr_debug!(
                "Post {:?}: {} attachments",
                post.post_id,
                post.attachments.len()
            );
        }
        prepared
    }

    /// Normalize and convert a whole export into index entries.
    pub fn entries(&mut self, posts: Vec<RawPost>) -> Vec<IntermediatePostEntry> {
        convert_posts(&self.prepare(posts))
    }

    fn attachments_for(&mut self, post_id: Option<&str>, referenced: &[String]) -> Vec<RawAttachment> {
        let mut attachments: Vec<RawAttachment> = self
            .index
            .values()
            .filter(|attachment| attachment.is_child_of(post_id))
            .cloned()
            .collect();

        for src in referenced {
            let Some(attachment) = self.index.get_mut(src) else {
                continue;
            };
            // Ad-hoc stubs belong to the first post that references them.
            if attachment.post_parent.is_none() {
                attachment.post_parent = post_id.map(str::to_string);
            }
            if attachments.iter().any(|a| a.url == attachment.url) {
                continue;
            }
            attachments.push(attachment.clone());
        }
        attachments
    }
}

/// Normalize and convert a parsed export in one go.
pub fn build_entries(export: WxrExport, normalizer: Normalizer) -> Vec<IntermediatePostEntry> {
    let mut run = ExportRun::new(normalizer, export.attachments);
    run.entries(export.posts)
}
