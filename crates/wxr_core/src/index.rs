use indexmap::IndexMap;

use crate::RawAttachment;

/// Attachments known to one export run, keyed by source URL.
///
/// Iteration follows insertion order, so two runs over the same export see
/// the same entries in the same order. Mutation needs `&mut self`; the run
/// that owns the index is its only writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentIndex {
    entries: IndexMap<String, RawAttachment>,
}

impl AttachmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from declared attachments. Attachments without a URL are not
    /// addressable and are skipped; a repeated URL keeps its first position
    /// but takes the later record.
    pub fn from_attachments(attachments: impl IntoIterator<Item = RawAttachment>) -> Self {
        let mut index = Self::new();
        for attachment in attachments {
            if attachment.url.is_empty() {
                continue;
            }
            index.insert(attachment.url.clone(), attachment);
        }
        index
    }

    pub fn insert(&mut self, src: impl Into<String>, attachment: RawAttachment) {
        self.entries.insert(src.into(), attachment);
    }

    pub fn get(&self, src: &str) -> Option<&RawAttachment> {
        self.entries.get(src)
    }

    pub fn get_mut(&mut self, src: &str) -> Option<&mut RawAttachment> {
        self.entries.get_mut(src)
    }

    pub fn contains(&self, src: &str) -> bool {
        self.entries.contains_key(src)
    }

    /// Returns the entry for `src`, creating it with `make` when missing.
    /// The flag is `true` when a new entry was created.
    pub fn get_or_insert_with(
        &mut self,
        src: &str,
        make: impl FnOnce() -> RawAttachment,
    ) -> (&mut RawAttachment, bool) {
        let created = !self.entries.contains_key(src);
        let entry = self.entries.entry(src.to_string()).or_insert_with(make);
        (entry, created)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawAttachment)> {
        self.entries.iter().map(|(src, att)| (src.as_str(), att))
    }

    pub fn values(&self) -> impl Iterator<Item = &RawAttachment> {
        self.entries.values()
    }
}
