use crate::comments::CommentWidget;
use crate::paginate::PaginatorState;
use crate::post::{format_date, Post, PostRef, PostSummary};
use crate::reading_time::format_minutes;
use crate::richtext;
use crate::site::post_path;
use gtmpl::{Template, Value};
use pulldown_cmark::escape::escape_html;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for index pages.
    pub index_template: &'a Template,

    /// The base URL for index pages. The pages are located at
    /// `{index_url}/index.html`, `{index_url}/1.html`, etc. This should end in
    /// a trailing slash.
    pub index_url: &'a Url,

    /// The directory in which the index HTML files will be written.
    pub index_output_directory: &'a Path,

    /// The base URL for post pages. A post is located at
    /// `{posts_url}/{slug}.html`. This should end in a trailing slash.
    pub posts_url: &'a Url,

    /// The directory in which the post HTML files will be written.
    pub posts_output_directory: &'a Path,

    /// The URL for the site's home page. This is made available to both post and
    /// index templates, typically as the destination for the site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets. This is made available to both post and
    /// index templates, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The URL of the Atom feed.
    pub atom_url: &'a Url,

    /// Where preview pages send readers who leave preview mode.
    pub exit_preview_url: &'a Url,

    /// The comment widget embedded into post pages, if any.
    pub comments: Option<&'a CommentWidget>,

    /// How long pages stay fresh. Exposed to templates in seconds.
    pub revalidate_after: Duration,
}

/// An output HTML file. A [`Page`] is converted into a [`Value`] for
/// templating via [`Page::to_value`].
pub struct Page<'t> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The previous page: a URL for index pages, a `{title, url}` object for
    /// post pages, or nil.
    prev: Value,

    /// The next page, in the same shape as `prev`.
    next: Value,

    /// Whether the page renders draft content.
    preview: bool,

    /// The template with which the page will be rendered.
    template: &'t Template,
}

impl Page<'_> {
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Converts a [`Page`] into a [`Value::Object`] with fields `item`,
    /// `prev`, `next`, and `preview`.
    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), self.prev.clone());
        m.insert("next".to_owned(), self.next.clone());
        m.insert("preview".to_owned(), Value::Bool(self.preview));
        Value::Object(m)
    }
}

impl<'a> Writer<'a> {
    /// Returns the URL of index page `number`. Page zero is `index.html`.
    pub fn index_page_url(&self, number: usize) -> Result<Url> {
        Ok(self.index_url.join(&index_file_name(number))?)
    }

    /// Returns the URL of the page for the post with the given uid.
    pub fn post_url(&self, uid: &str) -> Result<Url> {
        Ok(self.posts_url.join(&post_file_name(uid))?)
    }

    /// Creates index page `number` from the paginator state after `number`
    /// loads. The page lists every accumulated post; `next` links to the
    /// following page iff the state has another page to load.
    pub fn index_page(
        &self,
        number: usize,
        state: &PaginatorState,
        preview: bool,
    ) -> Result<Page<'a>> {
        Ok(Page {
            item: Value::Array(
                state
                    .items
                    .iter()
                    .map(|summary| self.summary_value(summary))
                    .collect::<Result<Vec<Value>>>()?,
            ),
            file_path: self.index_output_directory.join(index_file_name(number)),
            prev: match number {
                0 => Value::Nil,
                _ => url_value(&self.index_page_url(number - 1)?),
            },
            next: match state.has_more() {
                false => Value::Nil,
                true => url_value(&self.index_page_url(number + 1)?),
            },
            preview,
            template: self.index_template,
        })
    }

    /// Creates the page for a single post. `previous` and `next` are the
    /// neighbouring posts; a missing neighbour renders as nil so the template
    /// can omit its navigation block.
    pub fn post_page(
        &self,
        post: &Post,
        reading_time: u32,
        previous: Option<&PostRef>,
        next: Option<&PostRef>,
        preview: bool,
    ) -> Result<Page<'a>> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("uid".to_owned(), text(&post.uid)?);
        m.insert("url".to_owned(), url_value(&self.post_url(&post.uid)?));
        m.insert("title".to_owned(), text(&post.title)?);
        m.insert("subtitle".to_owned(), text(&post.subtitle)?);
        m.insert("author".to_owned(), text(&post.author)?);
        m.insert("date".to_owned(), date_value(post.published_at.as_ref()));
        m.insert(
            "banner".to_owned(),
            match &post.banner {
                Some(url) => text(url)?,
                None => Value::Nil,
            },
        );
        m.insert(
            "reading_time".to_owned(),
            Value::String(format_minutes(reading_time)),
        );
        m.insert(
            "content".to_owned(),
            Value::String(richtext::to_markup(&post.content)?),
        );
        m.insert(
            "comments".to_owned(),
            Value::String(match self.comments {
                Some(widget) => widget.render(&post_path(&post.uid))?,
                None => String::new(),
            }),
        );

        Ok(Page {
            item: Value::Object(m),
            file_path: self.posts_output_directory.join(post_file_name(&post.uid)),
            prev: self.neighbour_value(previous)?,
            next: self.neighbour_value(next)?,
            preview,
            template: self.posts_template,
        })
    }

    /// Templates a single [`Page`] into a string.
    pub fn render(&self, page: &Page) -> Result<String> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert("atom_url".to_owned(), Value::String(self.atom_url.to_string()));
            obj.insert(
                "exit_preview_url".to_owned(),
                Value::String(self.exit_preview_url.to_string()),
            );
            obj.insert(
                "revalidate_after".to_owned(),
                Value::String(self.revalidate_after.as_secs().to_string()),
            );
        }
        let mut out: Vec<u8> = Vec::new();
        page.template
            .execute(&mut out, &gtmpl::Context::from(value)?)?;
        String::from_utf8(out).map_err(|e| Error::Template(e.to_string()))
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    pub fn write_page(&self, page: &Page) -> Result<()> {
        let html = self.render(page)?;
        if let Some(dir) = page.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&page.file_path, html)?;
        info!(path = %page.file_path.display(), "wrote page");
        Ok(())
    }

    fn summary_value(&self, summary: &PostSummary) -> Result<Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("uid".to_owned(), text(&summary.uid)?);
        m.insert("url".to_owned(), url_value(&self.post_url(&summary.uid)?));
        m.insert("title".to_owned(), text(&summary.title)?);
        m.insert("subtitle".to_owned(), text(&summary.subtitle)?);
        m.insert("author".to_owned(), text(&summary.author)?);
        m.insert("date".to_owned(), date_value(summary.published_at.as_ref()));
        Ok(Value::Object(m))
    }

    fn neighbour_value(&self, neighbour: Option<&PostRef>) -> Result<Value> {
        Ok(match neighbour {
            None => Value::Nil,
            Some(post) => {
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("title".to_owned(), text(&post.title)?);
                m.insert("url".to_owned(), url_value(&self.post_url(&post.uid)?));
                Value::Object(m)
            }
        })
    }
}

fn index_file_name(number: usize) -> String {
    match number {
        0 => String::from("index.html"),
        _ => format!("{}.html", number),
    }
}

/// Returns the output file name of the post with the given uid.
pub fn post_file_name(uid: &str) -> String {
    format!("{}.html", slug::slugify(uid))
}

/// Converts CMS text into an HTML-escaped template value.
fn text(s: &str) -> Result<Value> {
    let mut escaped = String::with_capacity(s.len());
    escape_html(&mut escaped, s)?;
    Ok(Value::String(escaped))
}

fn url_value(url: &Url) -> Value {
    Value::String(url.to_string())
}

fn date_value(date: Option<&chrono::DateTime<chrono::FixedOffset>>) -> Value {
    match date {
        Some(date) => Value::String(format_date(date)),
        None => Value::Nil,
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, Error)]
pub enum Error {
    /// An error during templating.
    #[error("{0}")]
    Template(String),

    /// An error building a page URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// An error writing the output files.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::{parse_timestamp, PostPage};

    const INDEX_TEMPLATE: &str = concat!(
        "{{range .item}}<a href=\"{{.url}}\">{{.title}}</a> {{.date}};{{end}}",
        "{{if .prev}}<a class=\"prev\" href=\"{{.prev}}\"></a>{{end}}",
        "{{if .next}}<a class=\"more\" href=\"{{.next}}\">Carregar mais posts</a>{{end}}",
        "{{if .preview}}<a href=\"{{.exit_preview_url}}\">Sair do modo Preview</a>{{end}}",
    );

    const POST_TEMPLATE: &str = concat!(
        "<h1>{{.item.title}}</h1><p>{{.item.reading_time}}</p>{{.item.content}}",
        "{{if .prev}}<a class=\"prev\" href=\"{{.prev.url}}\">{{.prev.title}}</a>{{end}}",
        "{{if .next}}<a class=\"next\" href=\"{{.next.url}}\">{{.next.title}}</a>{{end}}",
        "{{.item.comments}}",
    );

    struct Fixture {
        index_template: Template,
        posts_template: Template,
        index_url: Url,
        posts_url: Url,
        home_page: Url,
        static_url: Url,
        atom_url: Url,
        exit_preview_url: Url,
        comments: CommentWidget,
    }

    impl Fixture {
        fn new() -> Fixture {
            let mut index_template = Template::default();
            index_template.parse(INDEX_TEMPLATE).unwrap();
            let mut posts_template = Template::default();
            posts_template.parse(POST_TEMPLATE).unwrap();
            Fixture {
                index_template,
                posts_template,
                index_url: Url::parse("https://example.org/pages/").unwrap(),
                posts_url: Url::parse("https://example.org/post/").unwrap(),
                home_page: Url::parse("https://example.org/").unwrap(),
                static_url: Url::parse("https://example.org/static/").unwrap(),
                atom_url: Url::parse("https://example.org/feed.atom").unwrap(),
                exit_preview_url: Url::parse("https://published.example.org/").unwrap(),
                comments: CommentWidget {
                    repo: "owner/blog".to_owned(),
                    theme: "github-dark".to_owned(),
                },
            }
        }

        fn writer(&self, comments: bool) -> Writer<'_> {
            Writer {
                posts_template: &self.posts_template,
                index_template: &self.index_template,
                index_url: &self.index_url,
                index_output_directory: Path::new("/out/pages"),
                posts_url: &self.posts_url,
                posts_output_directory: Path::new("/out/post"),
                home_page: &self.home_page,
                static_url: &self.static_url,
                atom_url: &self.atom_url,
                exit_preview_url: &self.exit_preview_url,
                comments: match comments {
                    true => Some(&self.comments),
                    false => None,
                },
                revalidate_after: Duration::from_secs(3600),
            }
        }
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_owned(),
            published_at: Some(parse_timestamp("2021-03-25T19:25:28+0000").unwrap()),
            title: title.to_owned(),
            subtitle: String::new(),
            author: String::new(),
        }
    }

    #[test]
    fn test_first_index_page_shows_load_more() -> Result<()> {
        let fixture = Fixture::new();
        let writer = fixture.writer(false);
        let state = PaginatorState::initialize(PostPage {
            items: vec![summary("a", "Post A"), summary("b", "Fish & Chips")],
            next_page: Some("cursor".to_owned()),
        });

        let page = writer.index_page(0, &state, false)?;
        assert_eq!(Path::new("/out/pages/index.html"), page.file_path());
        assert_eq!(
            concat!(
                "<a href=\"https://example.org/post/a.html\">Post A</a> 25 mar 2021;",
                "<a href=\"https://example.org/post/b.html\">Fish &amp; Chips</a> 25 mar 2021;",
                "<a class=\"more\" href=\"https://example.org/pages/1.html\">Carregar mais posts</a>",
            ),
            writer.render(&page)?
        );
        Ok(())
    }

    #[test]
    fn test_last_index_page_hides_load_more() -> Result<()> {
        let fixture = Fixture::new();
        let writer = fixture.writer(false);
        let state = PaginatorState {
            items: vec![summary("a", "A"), summary("b", "B"), summary("c", "C")],
            next_page: None,
        };

        let page = writer.index_page(1, &state, true)?;
        assert_eq!(Path::new("/out/pages/1.html"), page.file_path());
        let html = writer.render(&page)?;
        assert!(html.contains("C</a>"));
        assert!(html.contains("class=\"prev\" href=\"https://example.org/pages/index.html\""));
        assert!(!html.contains("Carregar mais posts"));
        assert!(html.contains(
            "<a href=\"https://published.example.org/\">Sair do modo Preview</a>"
        ));
        Ok(())
    }

    #[test]
    fn test_post_page() -> Result<()> {
        let fixture = Fixture::new();
        let writer = fixture.writer(true);
        let post = Post {
            id: "doc-2".to_owned(),
            uid: "Second Post".to_owned(),
            published_at: None,
            title: "Second".to_owned(),
            subtitle: String::new(),
            author: "Danilo".to_owned(),
            banner: None,
            content: Vec::new(),
        };
        let previous = PostRef {
            uid: "first".to_owned(),
            title: "First".to_owned(),
        };

        let page = writer.post_page(&post, 4, Some(&previous), None, false)?;
        assert_eq!(Path::new("/out/post/second-post.html"), page.file_path());
        let html = writer.render(&page)?;
        assert!(html.starts_with("<h1>Second</h1><p>4 min</p>"));
        assert!(html.contains(
            "<a class=\"prev\" href=\"https://example.org/post/first.html\">First</a>"
        ));
        assert!(!html.contains("class=\"next\""));
        assert!(html.contains("issue-term=\"/post/Second Post\""));
        Ok(())
    }

    #[test]
    fn test_post_page_without_comments() -> Result<()> {
        let fixture = Fixture::new();
        let writer = fixture.writer(false);
        let post = Post {
            id: "x".to_owned(),
            uid: "x".to_owned(),
            published_at: None,
            title: "X".to_owned(),
            subtitle: String::new(),
            author: String::new(),
            banner: None,
            content: Vec::new(),
        };
        let html = writer.render(&writer.post_page(&post, 0, None, None, false)?)?;
        assert_eq!("<h1>X</h1><p>0 min</p>", html);
        Ok(())
    }
}
