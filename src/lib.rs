//! The library code for the `cmsblog` static site generator. `cmsblog` renders
//! a blog whose content lives in a headless CMS. The architecture can be
//! generally broken down into three steps:
//!
//! 1. Resolving pages from the CMS ([`crate::site`] over a
//!    [`crate::cms::ContentRepository`])
//! 2. Paginating the post list ([`crate::paginate`]) and estimating reading
//!    times ([`crate::reading_time`])
//! 3. Rendering the pages to disk ([`crate::write`]) along with an Atom feed
//!    ([`crate::feed`])
//!
//! The post list is paginated incrementally: index page `n` shows every post
//! loaded after `n` "load more" steps, and links to page `n + 1` only while
//! the CMS reports another page. Post pages carry a reading-time estimate,
//! links to the neighbouring posts, and an optional comment widget
//! ([`crate::comments`]). Draft revisions can be rendered in preview mode
//! ([`crate::preview`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod cms;
pub mod comments;
pub mod config;
pub mod feed;
pub mod paginate;
pub mod post;
pub mod preview;
pub mod reading_time;
pub mod richtext;
pub mod site;
pub mod write;
