//! Support for creating Atom feeds from a list of posts.

use crate::config::Author;
use crate::post::PostSummary;
use crate::write::post_file_name;
use atom_syndication::{Entry, Error as AtomError, Feed, FixedDateTime, Link, Person, Text};
use chrono::Utc;
use std::io::Write;
use thiserror::Error;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,

    /// The base URL for post pages, used to build entry links.
    pub posts_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`PostSummary`]s and writes the result to a [`std::io::Write`]. This
/// function takes ownership of the provided [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[PostSummary], w: W) -> Result<()> {
    feed(config, posts)?.write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, posts: &[PostSummary]) -> Result<Feed> {
    let now: FixedDateTime = Utc::now().into();
    let mut feed = Feed::default();
    feed.set_entries(feed_entries(&config, posts, now)?);
    feed.set_title(Text::from(config.title));
    feed.set_id(config.id);
    feed.set_updated(
        posts
            .iter()
            .filter_map(|p| p.published_at)
            .max()
            .unwrap_or(now),
    );
    feed.set_authors(author_to_people(config.author));
    feed.set_links(vec![alternate(config.home_page.to_string())]);
    Ok(feed)
}

fn feed_entries(
    config: &FeedConfig,
    posts: &[PostSummary],
    now: FixedDateTime,
) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::with_capacity(posts.len());

    for post in posts {
        let url = config.posts_url.join(&post_file_name(&post.uid))?;
        let mut entry = Entry::default();
        entry.set_id(url.to_string());
        entry.set_title(Text::from(post.title.clone()));
        entry.set_updated(post.published_at.unwrap_or(now));
        entry.set_published(post.published_at);
        entry.set_authors(author_to_people(config.author.clone()));
        entry.set_links(vec![alternate(url.to_string())]);
        if !post.subtitle.is_empty() {
            entry.set_summary(Some(Text::from(post.subtitle.clone())));
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn alternate(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name);
            person.set_email(author.email);
            vec![person]
        }
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude Atom and URL issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when there is an Atom-related error, including I/O errors
    /// writing the feed.
    #[error(transparent)]
    Atom(#[from] AtomError),

    /// Returned when an entry URL can't be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::parse_timestamp;

    fn config() -> FeedConfig {
        FeedConfig {
            title: "spacetraveling".to_owned(),
            id: "https://example.org/".to_owned(),
            author: Some(Author {
                name: "Wellington".to_owned(),
                email: None,
            }),
            home_page: Url::parse("https://example.org/").unwrap(),
            posts_url: Url::parse("https://example.org/post/").unwrap(),
        }
    }

    fn summary(uid: &str, published_at: Option<&str>) -> PostSummary {
        PostSummary {
            uid: uid.to_owned(),
            published_at: published_at.map(|s| parse_timestamp(s).unwrap()),
            title: uid.to_uppercase(),
            subtitle: format!("About {}", uid),
            author: String::new(),
        }
    }

    #[test]
    fn test_feed() -> Result<()> {
        let posts = vec![
            summary("newer", Some("2021-03-25T08:00:00+0000")),
            summary("older", Some("2021-03-15T19:25:28+0000")),
        ];
        let feed = feed(config(), &posts)?;

        assert_eq!("spacetraveling", feed.title().value);
        assert_eq!(posts[0].published_at.unwrap(), *feed.updated());
        assert_eq!(2, feed.entries().len());

        let entry = &feed.entries()[0];
        assert_eq!("https://example.org/post/newer.html", entry.id());
        assert_eq!("https://example.org/post/newer.html", entry.links()[0].href());
        assert_eq!(Some("About newer"), entry.summary().map(|s| s.value.as_str()));
        assert_eq!(posts[0].published_at.as_ref(), entry.published());
        assert_eq!("Wellington", entry.authors()[0].name());
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let mut out: Vec<u8> = Vec::new();
        write_feed(config(), &[summary("undated", None)], &mut out)?;
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("spacetraveling"));
        assert!(xml.contains("https://example.org/post/undated.html"));
        Ok(())
    }
}
