//! Page resolution: maps a site path to the data its page is rendered from.
//! This is the seam between the CMS and rendering; [`crate::build`] asks the
//! [`Resolver`] for every path returned by [`Resolver::static_paths`] and
//! hands the resulting [`Props`] to [`crate::write::Writer`].

use crate::cms::{self, ContentRepository, Direction};
use crate::post::{Post, PostPage, PostRef};
use crate::reading_time;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// How long a resolved page stays fresh before it should be regenerated.
pub const REVALIDATE_AFTER: Duration = Duration::from_secs(60 * 60);

/// The number of posts on the first page of the post list.
pub const HOME_PAGE_SIZE: usize = 2;

/// The page size used when enumerating every post.
const ENUMERATION_PAGE_SIZE: usize = 100;

const POST_PREFIX: &str = "/post/";

/// The data a page is rendered from.
#[derive(Clone, Debug, PartialEq)]
pub enum Props {
    /// The post list.
    Home { first_page: PostPage, preview: bool },

    /// A single post with its estimated reading time (minutes) and its
    /// neighbours in publication order.
    Post {
        post: Post,
        reading_time: u32,
        previous: Option<PostRef>,
        next: Option<PostRef>,
        preview: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub props: Props,
    pub revalidate_after: Duration,
}

/// Returns the site path of the post with the given uid.
pub fn post_path(uid: &str) -> String {
    format!("{}{}", POST_PREFIX, uid)
}

pub struct Resolver<'a, R> {
    repo: &'a R,
    page_size: usize,
    revision: Option<&'a str>,
}

impl<'a, R: ContentRepository> Resolver<'a, R> {
    /// Constructs a resolver. `revision` selects a preview revision.
    pub fn new(repo: &'a R, page_size: usize, revision: Option<&'a str>) -> Resolver<'a, R> {
        Resolver {
            repo,
            page_size,
            revision,
        }
    }

    /// Resolves `/` to the post list and `/post/{uid}` to a post. Anything
    /// else, including unknown uids, is [`Error::NotFound`].
    pub async fn resolve(&self, path: &str) -> Result<Resolution> {
        debug!(path, "resolving");
        let props = if path == "/" {
            Props::Home {
                first_page: self.repo.list_posts(self.page_size, None, self.revision).await?,
                preview: self.revision.is_some(),
            }
        } else {
            match path.strip_prefix(POST_PREFIX) {
                Some(uid) if !uid.is_empty() && !uid.contains('/') => self.resolve_post(uid).await?,
                _ => return Err(Error::NotFound(path.to_owned())),
            }
        };
        Ok(Resolution {
            props,
            revalidate_after: REVALIDATE_AFTER,
        })
    }

    async fn resolve_post(&self, uid: &str) -> Result<Props> {
        let post = match self.repo.get_post_by_uid(uid, self.revision).await {
            Ok(post) => post,
            Err(cms::Error::NotFound(_)) => return Err(Error::NotFound(post_path(uid))),
            Err(err) => return Err(err.into()),
        };
        let previous = self.adjacent(&post, Direction::Previous).await?;
        let next = self.adjacent(&post, Direction::Next).await?;
        Ok(Props::Post {
            reading_time: reading_time::estimate(&post.content),
            post,
            previous,
            next,
            preview: self.revision.is_some(),
        })
    }

    async fn adjacent(&self, post: &Post, direction: Direction) -> Result<Option<PostRef>> {
        Ok(self
            .repo
            .list_adjacent_posts(&post.id, direction, self.revision)
            .await?
            .into_iter()
            .next())
    }

    /// Returns the paths of every post page.
    pub async fn static_paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .repo
                .list_posts(ENUMERATION_PAGE_SIZE, cursor.as_deref(), self.revision)
                .await?;
            paths.extend(page.items.iter().map(|p| post_path(&p.uid)));
            match page.next_page {
                Some(next) => cursor = Some(next),
                None => return Ok(paths),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Returned when no page exists at the path.
    #[error("no page at `{0}`")]
    NotFound(String),

    #[error(transparent)]
    Cms(#[from] cms::Error),
}
