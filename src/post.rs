//! Defines the [`Post`], [`PostSummary`], and [`PostPage`] types along with
//! the CMS wire format ([`Document`]) they are decoded from. See
//! [`Document::summarize`] and [`Document::into_post`] for how documents are
//! shaped into the values the rest of the crate consumes.

use chrono::{DateTime, FixedOffset, Locale};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// The document type of blog posts in the CMS.
pub const POST_TYPE: &str = "posts";

/// The date format used on index and post pages (e.g., `25 mar 2021`).
const DATE_FORMAT: &str = "%d %b %Y";

/// The fixed locale for displayed dates.
const DATE_LOCALE: Locale = Locale::pt_BR;

/// A post as shown in the post list. Immutable once fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary {
    pub uid: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of post summaries. `next_page` is the opaque cursor for the
/// following page; `None` means there are no further pages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostPage {
    pub items: Vec<PostSummary>,
    pub next_page: Option<String>,
}

/// A complete post, including its structured content.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The CMS document id. Adjacent-post lookups are keyed on this.
    pub id: String,

    /// The URL-facing identifier of the post.
    pub uid: String,

    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,

    /// The banner image URL, if the post has one.
    pub banner: Option<String>,

    pub content: Vec<RichTextBlock>,
}

/// A link target for prev/next navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRef {
    pub uid: String,
    pub title: String,
}

/// A content section as delivered by the CMS.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RichTextBlock {
    #[serde(default)]
    pub heading: String,

    #[serde(default)]
    pub body: Vec<Paragraph>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Paragraph {
    #[serde(default)]
    pub text: String,
}

/// Formats a publication timestamp for display, e.g. `25 mar 2021`.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format_localized(DATE_FORMAT, DATE_LOCALE).to_string()
}

/// A raw CMS document as it appears in search results and exports.
#[derive(Clone, Debug, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub data: DocumentData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DocumentData {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub main: Option<Image>,

    #[serde(default)]
    pub content: Vec<RichTextBlock>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Image {
    pub url: String,
}

/// The envelope of a CMS search response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Document>,

    #[serde(default)]
    pub next_page: Option<String>,
}

impl SearchResponse {
    /// Converts the response into a [`PostPage`]. Documents without a `uid`
    /// can't be linked to, so they are dropped.
    pub fn into_page(self) -> PostPage {
        PostPage {
            items: self.results.iter().filter_map(Document::summarize).collect(),
            next_page: self.next_page,
        }
    }
}

impl Document {
    pub fn summarize(&self) -> Option<PostSummary> {
        Some(PostSummary {
            uid: self.uid.clone()?,
            published_at: self.first_publication_date,
            title: self.data.title.clone(),
            subtitle: self.data.subtitle.clone(),
            author: self.data.author.clone(),
        })
    }

    pub fn post_ref(&self) -> Option<PostRef> {
        Some(PostRef {
            uid: self.uid.clone()?,
            title: self.data.title.clone(),
        })
    }

    pub fn into_post(self) -> Option<Post> {
        Some(Post {
            uid: self.uid?,
            id: self.id,
            published_at: self.first_publication_date,
            title: self.data.title,
            subtitle: self.data.subtitle,
            author: self.data.author,
            banner: self.data.main.map(|image| image.url),
            content: self.data.content,
        })
    }
}

/// Parses CMS timestamps. The CMS emits offsets without a colon
/// (`2021-03-25T19:25:28+0000`); RFC 3339 is accepted as well.
pub fn parse_timestamp(s: &str) -> chrono::ParseResult<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
}

fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid timestamp `{}`: {}", s, e))),
    }
}
