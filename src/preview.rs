//! Preview mode: rendering draft revisions from the CMS. Entering preview
//! validates a revision token against the repository and remembers it; the
//! rest of the crate only ever passes [`PreviewSession::revision`] through to
//! the [`ContentRepository`].

use crate::cms::{ContentRepository, DocumentRef};
use crate::post::POST_TYPE;
use thiserror::Error;
use tracing::{info, warn};

/// The parameters a preview link carries.
#[derive(Clone, Debug, Default)]
pub struct PreviewQuery {
    pub token: Option<String>,
    pub document_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewSession {
    revision: Option<String>,
}

impl PreviewSession {
    /// The revision to request from the repository, if previewing.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.revision.is_some()
    }

    /// Validates the query's token and enters preview mode, returning the
    /// path to redirect to. The session is unchanged on failure.
    pub async fn enter<R: ContentRepository>(
        &mut self,
        repo: &R,
        query: &PreviewQuery,
    ) -> Result<String> {
        let token = match query.token.as_deref() {
            Some(token) if !token.trim().is_empty() => token,
            _ => return Err(Error::Unauthorized),
        };

        let location = match query.document_id.as_deref() {
            None => String::from("/"),
            Some(id) => match repo.find_document(id, Some(token)).await {
                Ok(document) => resolve_link(document.as_ref()),
                Err(err) => {
                    warn!(error = %err, "rejected preview token");
                    return Err(Error::Unauthorized);
                }
            },
        };

        info!(location = location.as_str(), "entering preview");
        self.revision = Some(token.to_owned());
        Ok(location)
    }

    /// Leaves preview mode and returns the path to redirect to.
    pub fn exit(&mut self) -> &'static str {
        self.revision = None;
        "/"
    }
}

/// Maps a document to the path it's rendered at.
pub fn resolve_link(document: Option<&DocumentRef>) -> String {
    match document {
        Some(DocumentRef {
            kind,
            uid: Some(uid),
        }) if kind == POST_TYPE => format!("/post/{}", uid),
        _ => String::from("/"),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the preview token is missing or the CMS rejects it.
    #[error("invalid preview token")]
    Unauthorized,
}
