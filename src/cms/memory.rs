//! A [`ContentRepository`] over an exported list of CMS documents. Posts are
//! listed newest first and cursors are decimal offsets into that list.
//! Revisions are accepted and ignored.

use super::{ContentRepository, Direction, DocumentRef, Error, Result};
use crate::post::{Document, Post, PostPage, PostRef, POST_TYPE};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct MemoryRepository {
    /// All documents of any type.
    documents: Vec<Document>,

    /// Indices into `documents` of linkable posts, oldest first.
    posts: Vec<usize>,
}

impl MemoryRepository {
    pub fn new(documents: Vec<Document>) -> MemoryRepository {
        let mut posts: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.kind == POST_TYPE && d.uid.is_some())
            .map(|(i, _)| i)
            .collect();
        // stable, so posts published at the same instant keep export order
        posts.sort_by_key(|&i| documents[i].first_publication_date);
        MemoryRepository { documents, posts }
    }

    /// Loads a JSON array of documents from `path`.
    pub fn from_file(path: &Path) -> Result<MemoryRepository> {
        let documents: Vec<Document> =
            serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(MemoryRepository::new(documents))
    }

    fn newest_first(&self) -> impl Iterator<Item = &Document> {
        self.posts.iter().rev().map(move |&i| &self.documents[i])
    }
}

impl ContentRepository for MemoryRepository {
    async fn list_posts(
        &self,
        page_size: usize,
        cursor: Option<&str>,
        _revision: Option<&str>,
    ) -> Result<PostPage> {
        let offset = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| Error::InvalidCursor(c.to_owned()))?,
        };
        let end = offset.saturating_add(page_size);
        Ok(PostPage {
            items: self
                .newest_first()
                .skip(offset)
                .take(page_size)
                .filter_map(Document::summarize)
                .collect(),
            next_page: match end < self.posts.len() {
                true => Some(end.to_string()),
                false => None,
            },
        })
    }

    async fn get_post_by_uid(&self, uid: &str, _revision: Option<&str>) -> Result<Post> {
        self.newest_first()
            .find(|d| d.uid.as_deref() == Some(uid))
            .and_then(|d| d.clone().into_post())
            .ok_or_else(|| Error::NotFound(uid.to_owned()))
    }

    async fn list_adjacent_posts(
        &self,
        after_id: &str,
        direction: Direction,
        _revision: Option<&str>,
    ) -> Result<Vec<PostRef>> {
        let position = match self
            .posts
            .iter()
            .position(|&i| self.documents[i].id == after_id)
        {
            Some(position) => position,
            None => return Ok(Vec::new()),
        };
        let neighbour = match direction {
            Direction::Previous => position.checked_sub(1),
            Direction::Next => Some(position + 1),
        };
        Ok(neighbour
            .and_then(|n| self.posts.get(n))
            .and_then(|&i| self.documents[i].post_ref())
            .into_iter()
            .collect())
    }

    async fn find_document(
        &self,
        id: &str,
        _revision: Option<&str>,
    ) -> Result<Option<DocumentRef>> {
        Ok(self.documents.iter().find(|d| d.id == id).map(|d| DocumentRef {
            kind: d.kind.clone(),
            uid: d.uid.clone(),
        }))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Three posts (`first` oldest, `third` newest) and one page document.
    pub(crate) fn fixture() -> MemoryRepository {
        let documents: Vec<Document> = serde_json::from_str(include_str!(
            "../../testdata/documents.json"
        ))
        .unwrap();
        MemoryRepository::new(documents)
    }

    fn uids(page: &PostPage) -> Vec<&str> {
        page.items.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() -> Result<()> {
        let repo = fixture();
        let first = repo.list_posts(2, None, None).await?;
        assert_eq!(vec!["third", "second"], uids(&first));
        assert_eq!(Some("2"), first.next_page.as_deref());

        let second = repo.list_posts(2, first.next_page.as_deref(), None).await?;
        assert_eq!(vec!["first"], uids(&second));
        assert_eq!(None, second.next_page);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_posts_exact_fit_has_no_cursor() -> Result<()> {
        let page = fixture().list_posts(3, None, None).await?;
        assert_eq!(3, page.items.len());
        assert_eq!(None, page.next_page);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        match fixture().list_posts(2, Some("https://nope"), None).await {
            Err(Error::InvalidCursor(c)) => assert_eq!("https://nope", c),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_post_by_uid() -> Result<()> {
        let repo = fixture();
        let post = repo.get_post_by_uid("second", None).await?;
        assert_eq!("doc-2", post.id);
        assert_eq!(2, post.content.len());

        match repo.get_post_by_uid("missing", None).await {
            Err(Error::NotFound(uid)) => assert_eq!("missing", uid),
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_adjacent_posts_at_corpus_boundary() -> Result<()> {
        let repo = fixture();

        // the oldest post has nothing before it
        let previous = repo.list_adjacent_posts("doc-1", Direction::Previous, None).await?;
        let next = repo.list_adjacent_posts("doc-1", Direction::Next, None).await?;
        assert!(previous.is_empty());
        assert_eq!(vec!["second"], next.iter().map(|p| p.uid.as_str()).collect::<Vec<_>>());

        // the newest post has nothing after it
        let previous = repo.list_adjacent_posts("doc-3", Direction::Previous, None).await?;
        let next = repo.list_adjacent_posts("doc-3", Direction::Next, None).await?;
        assert_eq!(1, previous.len());
        assert!(next.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_find_document() -> Result<()> {
        let repo = fixture();
        assert_eq!(
            Some(DocumentRef {
                kind: "page".to_owned(),
                uid: Some("about".to_owned()),
            }),
            repo.find_document("doc-about", None).await?
        );
        assert_eq!(None, repo.find_document("nope", None).await?);
        Ok(())
    }
}
