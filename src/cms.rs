//! The boundary to the headless CMS. [`ContentRepository`] is the narrow
//! contract the rest of the crate depends on; [`http::HttpRepository`] talks
//! to a live CMS API and [`memory::MemoryRepository`] serves an exported
//! document dump.

pub mod http;
pub mod memory;

use crate::post::{Post, PostPage, PostRef};
use std::time::Duration;
use thiserror::Error;

/// Which neighbour of a post to look up, relative to publication order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The nearest post published earlier.
    Previous,

    /// The nearest post published later.
    Next,
}

/// The type and uid of a CMS document, enough to build a link to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub kind: String,
    pub uid: Option<String>,
}

/// Read access to blog content. Every method takes an optional `revision`,
/// which selects a draft revision in preview mode and is otherwise `None`.
#[allow(async_fn_in_trait)]
pub trait ContentRepository {
    /// Lists one page of posts. With no `cursor` the first page is returned;
    /// otherwise `cursor` is a value previously returned in
    /// [`PostPage::next_page`].
    async fn list_posts(
        &self,
        page_size: usize,
        cursor: Option<&str>,
        revision: Option<&str>,
    ) -> Result<PostPage>;

    /// Fetches a single post. Returns [`Error::NotFound`] if there is no post
    /// with the given uid.
    async fn get_post_by_uid(&self, uid: &str, revision: Option<&str>) -> Result<Post>;

    /// Returns at most one post adjacent to the post with document id
    /// `after_id` in the given direction.
    async fn list_adjacent_posts(
        &self,
        after_id: &str,
        direction: Direction,
        revision: Option<&str>,
    ) -> Result<Vec<PostRef>>;

    /// Looks up any document by id.
    async fn find_document(
        &self,
        id: &str,
        revision: Option<&str>,
    ) -> Result<Option<DocumentRef>>;
}

/// The result of a CMS operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure talking to the CMS or interpreting its content.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the HTTP request fails or the response has an error
    /// status.
    #[error("cms request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Returned when a response or export can't be decoded.
    #[error("decoding cms content: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid cms url: {0}")]
    Url(#[from] url::ParseError),

    /// Returned for I/O errors reading an export.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned when a fetch doesn't complete in time.
    #[error("cms request timed out after {0:?}")]
    Timeout(Duration),

    /// Returned when the requested post doesn't exist.
    #[error("post `{0}` not found")]
    NotFound(String),

    /// Returned when the CMS API doesn't advertise a master ref.
    #[error("cms api has no master ref")]
    MissingMasterRef,

    /// Returned when a cursor wasn't produced by this repository.
    #[error("invalid cursor `{0}`")]
    InvalidCursor(String),
}
