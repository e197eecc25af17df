//! Repository documentation indexing and search
//!
//! [`RepoIndexer`] turns a GitHub repository into an [`IndexedRepository`]
//! (download archive, extract `.md`/`.mdx` files, fit the text index) and
//! stores it in an injected [`RepoCache`]. [`DocSearch`] is the query
//! facade used by the tool registry.

use crate::archive::extract_documents;
use crate::error::{DocScoutError, Result};
use crate::github::{ArchiveDownloader, GitHubOptions, RepoRef};
use crate::index::{Index, Indexable};
use crate::types::{Document, SearchResult};
use crate::{DEFAULT_NUM_RESULTS, EXCERPT_CHARS};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Document fields the text index is fitted on
const SEARCH_FIELDS: [&str; 2] = ["content", "filename"];

impl Indexable for Document {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "content" => Some(&self.content),
            "filename" => Some(&self.path),
            _ => None,
        }
    }
}

/// Searchable documentation of one repository
#[derive(Debug)]
pub struct IndexedRepository {
    repo: RepoRef,
    documents: Vec<Document>,
    index: Index,
}

impl IndexedRepository {
    /// Fit the text index over `documents`
    pub fn new(repo: RepoRef, documents: Vec<Document>) -> Self {
        let mut index = Index::new(SEARCH_FIELDS);
        index.fit(&documents);
        Self {
            repo,
            documents,
            index,
        }
    }

    /// Repository this collection was built from
    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Indexed documents, in index order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documentation files were found
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Rank documents against `query`
    pub fn search(
        &self,
        query: &str,
        num_results: usize,
        excerpt_chars: usize,
    ) -> Vec<SearchResult> {
        self.index
            .search(query, num_results)
            .into_iter()
            .map(|(idx, score)| {
                SearchResult::from_document(&self.documents[idx], score, excerpt_chars)
            })
            .collect()
    }
}

/// Process-lifetime map from repository key to indexed repository
///
/// No eviction and no persistence: entries live until removed or the
/// cache is dropped.
#[derive(Debug, Default)]
pub struct RepoCache {
    entries: RwLock<HashMap<String, Arc<IndexedRepository>>>,
}

impl RepoCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a repository by key
    pub fn get(&self, key: &str) -> Option<Arc<IndexedRepository>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store a repository under its key, replacing any previous entry
    pub fn insert(&self, repo: Arc<IndexedRepository>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(repo.repo().key(), repo);
    }

    /// Drop a repository, returning it if it was cached
    pub fn remove(&self, key: &str) -> Option<Arc<IndexedRepository>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Returns true if the key is cached
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of cached repositories
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds and caches [`IndexedRepository`] values
#[derive(Debug)]
pub struct RepoIndexer {
    downloader: ArchiveDownloader,
    cache: Arc<RepoCache>,
    /// Serializes cache misses so a repository is downloaded once
    build_lock: Mutex<()>,
}

impl RepoIndexer {
    /// Create an indexer over an existing cache
    pub fn new(downloader: ArchiveDownloader, cache: Arc<RepoCache>) -> Self {
        Self {
            downloader,
            cache,
            build_lock: Mutex::new(()),
        }
    }

    /// Create an indexer with its own cache
    pub fn with_options(options: GitHubOptions) -> Result<Self> {
        Ok(Self::new(
            ArchiveDownloader::with_options(options)?,
            Arc::new(RepoCache::new()),
        ))
    }

    /// Shared cache handle
    pub fn cache(&self) -> &Arc<RepoCache> {
        &self.cache
    }

    /// Return the cached repository, building it on first use
    pub async fn ensure_indexed(&self, repo: &RepoRef) -> Result<Arc<IndexedRepository>> {
        let key = repo.key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(repo = %key, "Repository cache hit");
            return Ok(hit);
        }

        let _guard = self.build_lock.lock().await;
        if let Some(hit) = self.cache.get(&key) {
            debug!(repo = %key, "Repository indexed while waiting");
            return Ok(hit);
        }

        let indexed = Arc::new(self.build(repo).await?);
        self.cache.insert(Arc::clone(&indexed));
        Ok(indexed)
    }

    /// Drop any cached copy and index the repository again
    pub async fn refresh(&self, repo: &RepoRef) -> Result<Arc<IndexedRepository>> {
        let _guard = self.build_lock.lock().await;
        self.cache.remove(&repo.key());
        let indexed = Arc::new(self.build(repo).await?);
        self.cache.insert(Arc::clone(&indexed));
        Ok(indexed)
    }

    async fn build(&self, repo: &RepoRef) -> Result<IndexedRepository> {
        let archive = self.downloader.download(repo).await?;

        let documents = tokio::task::spawn_blocking(move || extract_documents(&archive))
            .await
            .map_err(|e| DocScoutError::Io(io::Error::other(e)))??;

        info!(repo = %repo, documents = documents.len(), "Indexed repository");
        Ok(IndexedRepository::new(repo.clone(), documents))
    }
}

/// Search facade over the repository indexer
#[derive(Debug)]
pub struct DocSearch {
    indexer: RepoIndexer,
    default_num_results: usize,
    excerpt_chars: usize,
}

impl DocSearch {
    /// Create a facade over an indexer
    pub fn new(indexer: RepoIndexer) -> Self {
        Self {
            indexer,
            default_num_results: DEFAULT_NUM_RESULTS,
            excerpt_chars: EXCERPT_CHARS,
        }
    }

    /// Create a facade with its own downloader and cache
    pub fn with_options(options: GitHubOptions) -> Result<Self> {
        Ok(Self::new(RepoIndexer::with_options(options)?))
    }

    /// Set the number of results returned when the caller gives none
    pub fn default_num_results(mut self, n: usize) -> Self {
        self.default_num_results = n;
        self
    }

    /// Set the excerpt length in characters
    pub fn excerpt_chars(mut self, n: usize) -> Self {
        self.excerpt_chars = n;
        self
    }

    /// Underlying indexer
    pub fn indexer(&self) -> &RepoIndexer {
        &self.indexer
    }

    /// Download and index a repository again, replacing any cached copy
    ///
    /// Returns the number of indexed documents.
    pub async fn refresh(&self, repo: &str) -> Result<usize> {
        let repo: RepoRef = repo.parse()?;
        let indexed = self.indexer.refresh(&repo).await?;
        Ok(indexed.len())
    }

    /// Search a repository's documentation
    ///
    /// `repo` accepts any form [`RepoRef`] parses. An empty query returns
    /// no results without touching the network.
    pub async fn search(
        &self,
        repo: &str,
        query: &str,
        num_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let repo: RepoRef = repo.parse()?;
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let indexed = self.indexer.ensure_indexed(&repo).await?;
        let n = num_results.unwrap_or(self.default_num_results);
        let results = indexed.search(query, n, self.excerpt_chars);
        debug!(
            repo = %repo,
            query = %query,
            hits = results.len(),
            "Searched repository docs"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(s: &str) -> RepoRef {
        s.parse().unwrap()
    }

    #[test]
    fn test_indexed_repository_search() {
        let docs = vec![
            Document::new("README.md", "vector search example"),
            Document::new("docs/install.md", "pip install the package"),
        ];
        let indexed = IndexedRepository::new(repo("owner/repo"), docs);
        let results = indexed.search("vector search", 5, EXCERPT_CHARS);
        assert_eq!(results[0].filename, "README.md");
        assert!(results[0].score > 0.0);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_filename_is_searchable() {
        let docs = vec![
            Document::new("docs/deployment.md", "steps for production"),
            Document::new("docs/other.md", "unrelated text"),
        ];
        let indexed = IndexedRepository::new(repo("owner/repo"), docs);
        let results = indexed.search("deployment", 5, EXCERPT_CHARS);
        assert_eq!(results[0].filename, "docs/deployment.md");
    }

    #[test]
    fn test_document_fields_match_search_fields() {
        let doc = Document::new("docs/a.md", "# Title\nbody");
        for field in SEARCH_FIELDS {
            assert!(doc.text_field(field).is_some());
        }
        assert_eq!(doc.text_field("title"), None);
    }

    #[test]
    fn test_empty_repository_search() {
        let indexed = IndexedRepository::new(repo("owner/repo"), Vec::new());
        assert!(indexed.is_empty());
        assert!(indexed.search("anything", 5, EXCERPT_CHARS).is_empty());
    }

    #[test]
    fn test_excerpt_is_truncated() {
        let long = "search ".repeat(200);
        let docs = vec![Document::new("big.md", long)];
        let indexed = IndexedRepository::new(repo("owner/repo"), docs);
        let results = indexed.search("search", 5, 20);
        assert_eq!(results[0].content.chars().count(), 23);
        assert!(results[0].content.ends_with("..."));
    }

    #[test]
    fn test_cache_insert_get_remove() {
        let cache = RepoCache::new();
        assert!(cache.is_empty());

        let indexed = Arc::new(IndexedRepository::new(repo("owner/repo"), Vec::new()));
        cache.insert(Arc::clone(&indexed));
        assert!(cache.contains("owner/repo"));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("owner/repo").unwrap(), &indexed));

        // Branch-pinned references use their own key
        assert!(cache.get("owner/repo@main").is_none());

        assert!(cache.remove("owner/repo").is_some());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_query_skips_indexing() {
        let search =
            DocSearch::with_options(GitHubOptions::default().github_base("http://127.0.0.1:1"))
                .unwrap();
        let results = search.search("owner/repo", "   ", None).await.unwrap();
        assert!(results.is_empty());
        assert!(search.indexer().cache().is_empty());
    }

    #[tokio::test]
    async fn test_search_invalid_repo() {
        let search = DocSearch::with_options(GitHubOptions::default()).unwrap();
        let err = search.search("not a repo", "query", None).await.unwrap_err();
        assert!(matches!(err, DocScoutError::InvalidRepo(_)));
    }

    #[tokio::test]
    async fn test_cached_repository_skips_download() {
        // Unroutable base: any download attempt would fail
        let indexer =
            RepoIndexer::with_options(GitHubOptions::default().github_base("http://127.0.0.1:1"))
                .unwrap();
        let docs = vec![Document::new("README.md", "cached content")];
        indexer
            .cache()
            .insert(Arc::new(IndexedRepository::new(repo("owner/repo"), docs)));

        let indexed = indexer.ensure_indexed(&repo("owner/repo")).await.unwrap();
        assert_eq!(indexed.len(), 1);
    }
}
