//! Link traversal for hypermedia documents.

use crate::error::{EodhError, Result};
use crate::models::{rel, Link};

/// A document carrying a list of hyperlinks.
pub trait Linked {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// All links of the document.
    fn links(&self) -> &[Link];

    /// First link with relation `rel`.
    fn link(&self, rel: &str) -> Option<&Link> {
        Link::find(self.links(), rel)
    }

    /// Target of the first link with relation `rel`.
    ///
    /// # Errors
    ///
    /// Returns [`EodhError::MissingLink`] if there is no such link.
    fn href(&self, rel: &str) -> Result<&str> {
        self.link(rel)
            .map(|l| l.href.as_str())
            .ok_or_else(|| EodhError::MissingLink {
                entity_type: Self::ENTITY,
                rel: rel.to_string(),
            })
    }

    /// URL of the document itself.
    fn self_href(&self) -> Result<String> {
        self.href(rel::SELF).map(str::to_string)
    }
}
