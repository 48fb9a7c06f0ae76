//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: resolving pages from the CMS
//! ([`crate::site`]), paginating the post list ([`crate::paginate`]),
//! rendering index and post pages ([`crate::write`]), copying the theme's
//! static directory into the static output directory, and generating the
//! Atom feed.

use crate::cms::{self, http::HttpRepository, memory::MemoryRepository, ContentRepository};
use crate::config::{Config, Source};
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::paginate::{Error as PaginateError, Paginator};
use crate::preview::{Error as PreviewError, PreviewQuery, PreviewSession};
use crate::site::{Error as SiteError, Props, Resolver};
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use walkdir::WalkDir;

/// Builds the site from a [`Config`] object. When `preview` carries a token,
/// the token is validated and the site is built from that draft revision.
/// A preview build should be written to its own output directory; its pages
/// link to [`Config::published_root`] to leave preview mode.
pub async fn build_site(config: Config, preview: Option<PreviewQuery>) -> Result<()> {
    match &config.source {
        Source::Api {
            endpoint,
            access_token,
        } => {
            let repo =
                HttpRepository::new(endpoint.clone(), access_token.clone(), config.fetch_timeout)?;
            build_with(&repo, &config, preview).await
        }
        Source::Export(path) => {
            let repo = MemoryRepository::from_file(path)?;
            build_with(&repo, &config, preview).await
        }
    }
}

/// Builds the site from the given repository. This calls into
/// [`Resolver::resolve`], [`Paginator::load_more`], and [`Writer::write_page`]
/// which do the heavy-lifting.
pub async fn build_with<R: ContentRepository>(
    repo: &R,
    config: &Config,
    preview: Option<PreviewQuery>,
) -> Result<()> {
    let mut session = PreviewSession::default();
    if let Some(query) = preview {
        session.enter(repo, &query).await?;
    }

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;

    // The draft revision drives every fetch; the session itself only yields
    // the exit location for the preview pages.
    let draft = session.revision().map(str::to_owned);
    let revision = draft.as_deref();
    let exit_preview_url = config
        .published_root
        .join(session.exit().trim_start_matches('/'))?;
    let resolver = Resolver::new(repo, config.index_page_size, revision);
    let home = resolver.resolve("/").await?;
    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        index_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        posts_url: &config.posts_url,
        posts_output_directory: &config.posts_output_directory,
        home_page: &config.home_page,
        static_url: &config.static_url,
        atom_url: &config.atom_url,
        exit_preview_url: &exit_preview_url,
        comments: config.comments.as_ref(),
        revalidate_after: home.revalidate_after,
    };

    // Write the index pages: page `n` shows the list after `n` loads.
    let (first_page, preview) = match home.props {
        Props::Home {
            first_page,
            preview,
        } => (first_page, preview),
        Props::Post { .. } => return Err(Error::UnexpectedProps(String::from("/"))),
    };
    let paginator = Paginator::new(first_page, config.fetch_timeout);
    let mut number = 0;
    writer.write_page(&writer.index_page(number, &paginator.state(), preview)?)?;
    while paginator.state().has_more() {
        let state = paginator
            .load_more(|cursor| async move {
                repo.list_posts(config.index_page_size, Some(&cursor), revision)
                    .await
            })
            .await
            .map_err(|e| {
                error!(error = %e, "loading more posts failed; re-run the build to retry");
                e
            })?;
        number += 1;
        writer.write_page(&writer.index_page(number, &state, preview)?)?;
    }

    // Write the post pages.
    for path in resolver.static_paths().await? {
        match resolver.resolve(&path).await?.props {
            Props::Post {
                post,
                reading_time,
                previous,
                next,
                preview,
            } => writer.write_page(&writer.post_page(
                &post,
                reading_time,
                previous.as_ref(),
                next.as_ref(),
                preview,
            )?)?,
            Props::Home { .. } => return Err(Error::UnexpectedProps(path)),
        }
    }

    // copy static directory
    copy_dir(
        &config.static_source_directory,
        &config.static_output_directory,
    )?;

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // create the atom feed
    write_feed(
        FeedConfig {
            title: config.title.clone(),
            id: config.home_page.to_string(),
            author: config.author.clone(),
            home_page: config.home_page.clone(),
            posts_url: config.posts_url.clone(),
        },
        &paginator.state().items,
        File::create(config.root_output_directory.join("feed.atom"))?,
    )?;

    info!(
        pages = number + 1,
        output = %config.root_output_directory.display(),
        "site built"
    );
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        return Ok(());
    }
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix can't fail since `src` is an ancestor of every entry
        let target = match entry.path().strip_prefix(src) {
            Ok(relative) => dst.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        contents.push_str(&std::fs::read_to_string(template_file).map_err(|e| {
            Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            }
        })?);
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(_) => Ok(()),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during fetching,
/// pagination, writing, cleaning output directories, parsing template files,
/// and other I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors talking to the CMS.
    #[error(transparent)]
    Cms(#[from] cms::Error),

    /// Returned when the preview token is rejected.
    #[error(transparent)]
    Preview(#[from] PreviewError),

    /// Returned when a page can't be resolved.
    #[error(transparent)]
    Site(#[from] SiteError),

    /// Returned when loading more posts fails.
    #[error(transparent)]
    Paginate(#[from] PaginateError),

    /// Returned for errors rendering pages to disk as HTML files.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned for errors creating the Atom feed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Returned when a path resolves to a different kind of page than
    /// expected.
    #[error("unexpected page kind at `{0}`")]
    UnexpectedProps(String),

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory `{path:?}`: {err}")]
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{path:?}`: {err}")]
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    #[error("parsing template: {0}")]
    ParseTemplate(String),

    /// Returned when the exit-preview URL can't be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Returned for errors walking the static directory.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
