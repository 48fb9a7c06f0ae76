//! Loads the project configuration. A project is a directory containing a
//! `blog.yaml` project file and a `theme/` directory with a `theme.yaml`
//! file, the templates it names, and a `static/` directory of assets.

use crate::comments::CommentWidget;
use crate::site::HOME_PAGE_SIZE;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const PROJECT_FILE: &str = "blog.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(HOME_PAGE_SIZE)
    }
}

#[derive(Deserialize)]
struct TimeoutSeconds(u64);
impl Default for TimeoutSeconds {
    fn default() -> Self {
        TimeoutSeconds(10)
    }
}

/// The author of the site, used in the Atom feed.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CmsSection {
    Api {
        endpoint: Url,

        #[serde(default)]
        access_token: Option<String>,

        #[serde(default)]
        timeout_seconds: TimeoutSeconds,
    },
    Export {
        export: PathBuf,

        #[serde(default)]
        timeout_seconds: TimeoutSeconds,
    },
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,
    title: String,

    #[serde(default)]
    author: Option<Author>,

    cms: CmsSection,

    #[serde(default)]
    index_page_size: PageSize,

    #[serde(default)]
    comments: Option<CommentWidget>,

    #[serde(default)]
    published_root: Option<Url>,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// Where content comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// A live CMS API.
    Api {
        endpoint: Url,
        access_token: Option<String>,
    },

    /// A JSON export of CMS documents.
    Export(PathBuf),
}

pub struct Config {
    pub title: String,
    pub author: Option<Author>,
    pub source: Source,
    pub fetch_timeout: Duration,
    pub comments: Option<CommentWidget>,
    pub home_page: Url,

    /// Where the published (non-preview) site is served. Preview pages link
    /// here to leave preview mode. Defaults to `site_root`.
    pub published_root: Url,

    pub index_url: Url,
    pub index_template: Vec<PathBuf>,
    pub index_page_size: usize,
    pub posts_url: Url,
    pub posts_template: Vec<PathBuf>,
    pub static_url: Url,
    pub atom_url: Url,
    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub static_output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a project file and loads it.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        if project.index_page_size.0 == 0 {
            return Err(anyhow!("`index_page_size` must be at least 1"));
        }

        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"), "theme")?)?;

        let (source, timeout) = match project.cms {
            CmsSection::Api {
                endpoint,
                access_token,
                timeout_seconds,
            } => (
                Source::Api {
                    endpoint,
                    access_token,
                },
                timeout_seconds,
            ),
            CmsSection::Export {
                export,
                timeout_seconds,
            } => (Source::Export(project_root.join(export)), timeout_seconds),
        };

        // `Url::join` treats the last path segment as a file name unless it
        // ends in a slash.
        let site_root = directory_url(project.site_root);
        Ok(Config {
            title: project.title,
            author: project.author,
            source,
            fetch_timeout: Duration::from_secs(timeout.0),
            comments: project.comments,
            published_root: project
                .published_root
                .map(directory_url)
                .unwrap_or_else(|| site_root.clone()),
            home_page: site_root.clone(),
            index_url: site_root.join("pages/")?,
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            index_page_size: project.index_page_size.0,
            posts_url: site_root.join("post/")?,
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            static_url: site_root.join("static/")?,
            atom_url: site_root.join("feed.atom")?,
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("post"),
            static_source_directory: theme_dir.join("static"),
            static_output_directory: output_directory.join("static"),
        })
    }
}

fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).map_err(|e| anyhow!("Opening {} file `{}`: {}", kind, path.display(), e))
}

#[cfg(test)]
mod test {
    use super::*;

    fn project_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demo")
    }

    #[test]
    fn test_from_project_file() -> Result<()> {
        let dir = project_dir();
        let config = Config::from_project_file(&dir.join(PROJECT_FILE), Path::new("/out"))?;

        assert_eq!("spacetraveling", config.title);
        assert_eq!(2, config.index_page_size);
        assert_eq!(Source::Export(dir.join("documents.json")), config.source);
        assert_eq!(Duration::from_secs(10), config.fetch_timeout);
        assert_eq!("https://blog.example.org/blog/pages/", config.index_url.as_str());
        assert_eq!("https://blog.example.org/blog/post/", config.posts_url.as_str());
        assert_eq!("https://blog.example.org/blog/feed.atom", config.atom_url.as_str());
        assert_eq!(vec![dir.join("theme/index.html")], config.index_template);
        assert_eq!(Path::new("/out/post"), config.posts_output_directory);
        assert_eq!(config.home_page, config.published_root);
        assert_eq!(
            Some("github-dark"),
            config.comments.as_ref().map(|c| c.theme.as_str())
        );
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let dir = project_dir();
        let config = Config::from_directory(&dir.join("theme").join("static"), Path::new("/out"))?;
        assert_eq!("spacetraveling", config.title);
        Ok(())
    }

    #[test]
    fn test_api_source() -> serde_yaml::Result<()> {
        let project: Project = serde_yaml::from_str(
            "site_root: https://blog.example.org\n\
             title: t\n\
             cms:\n  endpoint: https://blog.cdn.prismic.io/api/v2\n  timeout_seconds: 3\n",
        )?;
        match project.cms {
            CmsSection::Api {
                endpoint,
                access_token,
                timeout_seconds,
            } => {
                assert_eq!("blog.cdn.prismic.io", endpoint.host_str().unwrap());
                assert_eq!(None, access_token);
                assert_eq!(3, timeout_seconds.0);
            }
            CmsSection::Export { .. } => panic!("expected an api source"),
        }
        assert_eq!(HOME_PAGE_SIZE, project.index_page_size.0);
        assert_eq!(None, project.published_root);
        Ok(())
    }

    #[test]
    fn test_published_root() -> serde_yaml::Result<()> {
        let project: Project = serde_yaml::from_str(
            "site_root: https://preview.example.org\n\
             title: t\n\
             published_root: https://blog.example.org/blog\n\
             cms:\n  export: documents.json\n",
        )?;
        assert_eq!(
            Some("https://blog.example.org/blog/"),
            project.published_root.map(directory_url).as_ref().map(Url::as_str)
        );
        Ok(())
    }

    #[test]
    fn test_directory_url() {
        let url = directory_url(Url::parse("https://example.org/blog").unwrap());
        assert_eq!("https://example.org/blog/", url.as_str());
    }
}
