/// Hook for remapping media and link targets, e.g. when republishing to a
/// new host. Both methods default to the identity.
pub trait UrlRewriter: Send + Sync {
    fn rewrite_image(&self, url: &str) -> String {
        url.to_string()
    }

    fn rewrite_link(&self, url: &str) -> String {
        url.to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRewriter;

impl UrlRewriter for IdentityRewriter {}
