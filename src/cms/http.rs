//! A [`ContentRepository`] backed by a Prismic-style REST API. Every query
//! runs against a ref: the API's master ref for published content, or a
//! preview revision. The master ref is discovered once from the API root and
//! cached.

use super::{ContentRepository, Direction, DocumentRef, Error, Result};
use crate::post::{Post, PostPage, PostRef, SearchResponse, POST_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

const ORDER_OLDEST_FIRST: &str = "[document.first_publication_date]";
const ORDER_NEWEST_FIRST: &str = "[document.first_publication_date desc]";

pub struct HttpRepository {
    client: Client,

    /// The API root, e.g. `https://my-blog.cdn.prismic.io/api/v2`.
    endpoint: Url,

    access_token: Option<String>,

    master_ref: OnceCell<String>,
}

#[derive(Deserialize)]
struct Api {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,

    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

impl HttpRepository {
    /// Constructs a repository for the API at `endpoint`. Requests that take
    /// longer than `timeout` fail.
    pub fn new(
        endpoint: Url,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<HttpRepository> {
        Ok(HttpRepository {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
            access_token,
            master_ref: OnceCell::new(),
        })
    }

    async fn master_ref(&self) -> Result<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let api: Api = self.get(self.authorize(self.endpoint.clone())).await?;
                api.refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or(Error::MissingMasterRef)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(
        &self,
        params: &[(&str, &str)],
        revision: Option<&str>,
    ) -> Result<SearchResponse> {
        let reference = match revision {
            Some(revision) => revision,
            None => self.master_ref().await?,
        };
        self.get(self.search_url(reference, params)?).await
    }

    /// Builds the URL of a document search against `reference`.
    fn search_url(&self, reference: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(self.authorize(url))
    }

    /// Appends the access token to `url` unless it already carries one.
    fn authorize(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(path = url.path(), "cms request");
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?)
    }
}

/// Builds a query of `at` predicates, e.g.
/// `[[at(document.type,"posts")][at(my.posts.uid,"hello")]]`.
fn query(predicates: &[(&str, &str)]) -> String {
    let mut q = String::from("[");
    for (path, value) in predicates {
        q.push_str(&format!(
            "[at({},\"{}\")]",
            path,
            value.replace('\\', "\\\\").replace('"', "\\\"")
        ));
    }
    q.push(']');
    q
}

impl ContentRepository for HttpRepository {
    async fn list_posts(
        &self,
        page_size: usize,
        cursor: Option<&str>,
        revision: Option<&str>,
    ) -> Result<PostPage> {
        let response: SearchResponse = match cursor {
            // the CMS hands out fully-formed URLs as cursors
            Some(cursor) => self.get(self.authorize(Url::parse(cursor)?)).await?,
            None => {
                let q = query(&[("document.type", POST_TYPE)]);
                let page_size = page_size.to_string();
                self.search(
                    &[
                        ("q", q.as_str()),
                        ("pageSize", page_size.as_str()),
                        ("orderings", ORDER_NEWEST_FIRST),
                    ],
                    revision,
                )
                .await?
            }
        };
        Ok(response.into_page())
    }

    async fn get_post_by_uid(&self, uid: &str, revision: Option<&str>) -> Result<Post> {
        let uid_path = format!("my.{}.uid", POST_TYPE);
        let q = query(&[(uid_path.as_str(), uid)]);
        self.search(&[("q", q.as_str())], revision)
            .await?
            .results
            .into_iter()
            .next()
            .and_then(|d| d.into_post())
            .ok_or_else(|| Error::NotFound(uid.to_owned()))
    }

    async fn list_adjacent_posts(
        &self,
        after_id: &str,
        direction: Direction,
        revision: Option<&str>,
    ) -> Result<Vec<PostRef>> {
        let orderings = match direction {
            Direction::Previous => ORDER_NEWEST_FIRST,
            Direction::Next => ORDER_OLDEST_FIRST,
        };
        let q = query(&[("document.type", POST_TYPE)]);
        let response = self
            .search(
                &[
                    ("q", q.as_str()),
                    ("pageSize", "1"),
                    ("after", after_id),
                    ("orderings", orderings),
                ],
                revision,
            )
            .await?;
        Ok(response
            .results
            .iter()
            .take(1)
            .filter_map(|d| d.post_ref())
            .collect())
    }

    async fn find_document(
        &self,
        id: &str,
        revision: Option<&str>,
    ) -> Result<Option<DocumentRef>> {
        let q = query(&[("document.id", id)]);
        let response = self.search(&[("q", q.as_str())], revision).await?;
        Ok(response.results.into_iter().next().map(|d| DocumentRef {
            kind: d.kind,
            uid: d.uid,
        }))
    }
}
