//! WXR core: export data model and the pure record-to-entry conversion.
mod convert;
mod entry;
mod index;
mod model;

pub use convert::{
    attachment_filename, convert_attachment, convert_post, convert_posts, extension_from_path,
    hash_uuid, mime_type_for_extension, url_path, DEFAULT_MIME_TYPE, MIME_TYPES,
};
pub use entry::{IntermediateAttachmentEntry, IntermediatePostEntry};
pub use index::AttachmentIndex;
pub use model::{RawAttachment, RawPost};
