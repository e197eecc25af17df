//! GitHub repository identifiers and archive downloads

use crate::error::{DocScoutError, Result};
use crate::{DEFAULT_GITHUB_BASE, DEFAULT_USER_AGENT};
use bytes::Bytes;
use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Total timeout for archive downloads
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// Connect timeout for archive downloads
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Top-level GitHub paths that are never repository owners
const RESERVED_OWNERS: &[&str] = &[
    "settings",
    "explore",
    "trending",
    "collections",
    "events",
    "sponsors",
    "notifications",
    "marketplace",
    "pulls",
    "issues",
    "codespaces",
    "features",
    "enterprise",
    "organizations",
    "pricing",
    "about",
    "team",
    "security",
    "login",
    "join",
];

/// A GitHub repository, optionally pinned to a branch
///
/// Parses `owner/repo`, `https://github.com/owner/repo[.git]` and
/// `https://github.com/owner/repo/tree/<branch>[/<path>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
}

impl RepoRef {
    /// Create a reference to the default branch
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();
        validate_segment(&owner, "owner")?;
        validate_segment(&repo, "repository name")?;
        Ok(Self {
            owner,
            repo,
            branch: None,
        })
    }

    /// Pin the reference to a branch
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = if branch.is_empty() { None } else { Some(branch) };
        self
    }

    /// Cache key: `owner/repo` or `owner/repo@branch`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Archive path below the GitHub base URL
    pub fn archive_path(&self) -> String {
        match &self.branch {
            Some(branch) => format!(
                "{}/{}/archive/refs/heads/{}.zip",
                self.owner, self.repo, branch
            ),
            None => format!("{}/{}/archive/HEAD.zip", self.owner, self.repo),
        }
    }

    fn from_url(input: &str, url: &Url) -> Result<Self> {
        if url.host_str() != Some("github.com") && url.host_str() != Some("www.github.com") {
            return Err(DocScoutError::InvalidRepo(format!(
                "{input}: not a github.com URL"
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(DocScoutError::InvalidRepo(format!(
                "{input}: expected https://github.com/owner/repo"
            )));
        }

        if RESERVED_OWNERS.contains(&segments[0]) {
            return Err(DocScoutError::InvalidRepo(format!(
                "{input}: not a repository URL"
            )));
        }

        let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
        let mut repo_ref = Self::new(segments[0], repo)?;

        if segments.len() >= 4 && segments[2] == "tree" {
            // Anything after the branch is a path inside the tree
            repo_ref = repo_ref.with_branch(segments[3]);
        }

        Ok(repo_ref)
    }
}

impl FromStr for RepoRef {
    type Err = DocScoutError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        if input.is_empty() {
            return Err(DocScoutError::InvalidRepo(
                "repository identifier is empty".to_string(),
            ));
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input)
                .map_err(|e| DocScoutError::InvalidRepo(format!("{input}: {e}")))?;
            return Self::from_url(input, &url);
        }

        if let Some(rest) = input.strip_prefix("github.com/") {
            return Self::from_str(&format!("https://github.com/{rest}"));
        }

        let parts: Vec<&str> = input.split('/').collect();
        if parts.len() != 2 {
            return Err(DocScoutError::InvalidRepo(format!(
                "{input}: expected owner/repo"
            )));
        }
        Self::new(parts[0], parts[1].strip_suffix(".git").unwrap_or(parts[1]))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{}", self.owner, self.repo, branch),
            None => write!(f, "{}/{}", self.owner, self.repo),
        }
    }
}

fn validate_segment(segment: &str, what: &str) -> Result<()> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(DocScoutError::InvalidRepo(format!(
            "invalid {what}: {segment:?}"
        )))
    }
}

/// Archive download options
#[derive(Debug, Clone)]
pub struct GitHubOptions {
    /// Base URL archives are downloaded from
    pub github_base: String,
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Total download timeout
    pub timeout: Duration,
}

impl Default for GitHubOptions {
    fn default() -> Self {
        Self {
            github_base: DEFAULT_GITHUB_BASE.to_string(),
            user_agent: None,
            timeout: ARCHIVE_TIMEOUT,
        }
    }
}

impl GitHubOptions {
    /// Set the archive base URL
    pub fn github_base(mut self, base: impl Into<String>) -> Self {
        self.github_base = base.into();
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set download timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Downloads repository zip archives
#[derive(Debug, Clone)]
pub struct ArchiveDownloader {
    client: reqwest::Client,
    github_base: String,
}

impl ArchiveDownloader {
    /// Create a downloader with custom options
    pub fn with_options(options: GitHubOptions) -> Result<Self> {
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let client = reqwest::Client::builder()
            .user_agent(
                HeaderValue::from_str(user_agent)
                    .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
            )
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(options.timeout)
            .build()
            .map_err(DocScoutError::ClientBuild)?;

        Ok(Self {
            client,
            github_base: options.github_base.trim_end_matches('/').to_string(),
        })
    }

    /// Full archive URL for a repository
    pub fn archive_url(&self, repo: &RepoRef) -> String {
        format!("{}/{}", self.github_base, repo.archive_path())
    }

    /// Download the archive bytes
    pub async fn download(&self, repo: &RepoRef) -> Result<Bytes> {
        let url = self.archive_url(repo);
        info!(repo = %repo, url = %url, "Downloading repository archive");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(DocScoutError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DocScoutError::RepoNotFound(repo.to_string()));
        }
        if !status.is_success() {
            return Err(DocScoutError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await.map_err(DocScoutError::from_reqwest)?;
        info!(repo = %repo, size = bytes.len(), "Downloaded repository archive");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<RepoRef> {
        s.parse()
    }

    #[test]
    fn test_parse_owner_repo() {
        let r = parse("alexeygrigorev/minsearch").unwrap();
        assert_eq!(r.owner, "alexeygrigorev");
        assert_eq!(r.repo, "minsearch");
        assert_eq!(r.branch, None);
        assert_eq!(r.key(), "alexeygrigorev/minsearch");
    }

    #[test]
    fn test_parse_github_url() {
        let r = parse("https://github.com/jlowin/fastmcp").unwrap();
        assert_eq!((r.owner.as_str(), r.repo.as_str()), ("jlowin", "fastmcp"));

        let r = parse("https://github.com/jlowin/fastmcp/").unwrap();
        assert_eq!(r.repo, "fastmcp");

        let r = parse("https://github.com/jlowin/fastmcp.git").unwrap();
        assert_eq!(r.repo, "fastmcp");

        let r = parse("github.com/jlowin/fastmcp").unwrap();
        assert_eq!(r.owner, "jlowin");
    }

    #[test]
    fn test_parse_tree_branch() {
        let r = parse("https://github.com/owner/repo/tree/develop").unwrap();
        assert_eq!(r.branch.as_deref(), Some("develop"));
        assert_eq!(r.key(), "owner/repo@develop");

        let r = parse("https://github.com/owner/repo/tree/main/docs").unwrap();
        assert_eq!(r.branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_tree_subpath_archive_uses_branch_only() {
        let r = parse("https://github.com/owner/repo/tree/main/docs/guides").unwrap();
        assert_eq!(r.key(), "owner/repo@main");
        assert_eq!(r.archive_path(), "owner/repo/archive/refs/heads/main.zip");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("").is_err());
        assert!(parse("just-a-name").is_err());
        assert!(parse("a/b/c").is_err());
        assert!(parse("owner/").is_err());
        assert!(parse("own er/repo").is_err());
        assert!(parse("../repo").is_err());
        assert!(parse("https://gitlab.com/owner/repo").is_err());
        assert!(parse("https://github.com/owner").is_err());
        assert!(parse("https://github.com/settings/profile").is_err());

        let err = parse("nope").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_archive_path() {
        let r = parse("owner/repo").unwrap();
        assert_eq!(r.archive_path(), "owner/repo/archive/HEAD.zip");

        let r = r.with_branch("main");
        assert_eq!(r.archive_path(), "owner/repo/archive/refs/heads/main.zip");
    }

    #[test]
    fn test_archive_url() {
        let downloader = ArchiveDownloader::with_options(
            GitHubOptions::default().github_base("http://127.0.0.1:8080/"),
        )
        .unwrap();
        let r = parse("owner/repo").unwrap();
        assert_eq!(
            downloader.archive_url(&r),
            "http://127.0.0.1:8080/owner/repo/archive/HEAD.zip"
        );
    }
}
