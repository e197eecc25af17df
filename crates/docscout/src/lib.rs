//! DocScout - documentation research tools for AI assistants
//!
//! This crate provides three tools an assistant can call, plus two ways to
//! expose them:
//!
//! - `fetch_url_content` - fetch any web page as markdown through a reader proxy
//! - `search_repo_docs` - download a GitHub repository archive, index its
//!   `.md`/`.mdx` files and run a relevance search over them
//! - `count_word` - count occurrences of a word on a fetched page
//!
//! The tools live in a [`ToolRegistry`]. [`McpServer`] exposes the registry
//! over MCP stdio, and [`Assistant`] drives an interactive conversation with
//! a hosted chat model that calls the tools on the user's behalf.
//!
//! ## Repository search
//!
//! Indexed repositories are cached for the lifetime of the
//! [`RepoIndexer`], so each repository is downloaded and indexed at most
//! once per process.

mod archive;
pub mod assistant;
pub mod docs;
mod error;
pub mod github;
pub mod index;
pub mod mcp;
pub mod reader;
pub mod tool;
mod types;

pub use assistant::{Assistant, AssistantConfig, ChatMessage, ChatModel, OpenAiChat};
pub use docs::{DocSearch, IndexedRepository, RepoCache, RepoIndexer};
pub use error::{DocScoutError, ErrorKind, Result};
pub use github::{ArchiveDownloader, GitHubOptions, RepoRef};
pub use mcp::McpServer;
pub use reader::{ContentFetcher, ReaderOptions};
pub use tool::{ToolCall, ToolDefinition, ToolKind, ToolRegistry, ToolRegistryBuilder};
pub use types::{excerpt, Document, SearchResult};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "DocScout/0.1";

/// Reader proxy that renders any URL as markdown
pub const DEFAULT_READER_BASE: &str = "https://r.jina.ai/";

/// Host serving repository archives
pub const DEFAULT_GITHUB_BASE: &str = "https://github.com";

/// Results returned by `search_repo_docs` when the caller gives no count
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Characters of document content kept in each search result
pub const EXCERPT_CHARS: usize = 500;

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default chat-completions API base URL
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Model round trips with tool calls allowed per user query
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOLS_LLMTXT: &str = r#"# DocScout Tools

Research tools for documentation questions.

## fetch_url_content
Fetches a web page and returns its content as markdown.

- `url` (required): http:// or https:// URL

## search_repo_docs
Searches the markdown documentation (`.md`, `.mdx`) of a GitHub repository.
The first search of a repository downloads and indexes it; later searches
reuse the index.

- `repo` (required): `owner/repo`, `github.com/owner/repo` or a full GitHub URL
- `query` (required): search text
- `num_results` (optional): maximum results (default: 5)

Returns a JSON array of `{filename, title, score, content}` ordered by
relevance. `content` is the first 500 characters of the document.

## count_word
Counts case-insensitive occurrences of a word on a web page.

- `url` (required): http:// or https:// URL
- `word` (required): word to count

## Examples

```json
{"url": "https://example.com"}
```

```json
{"repo": "DataTalksClub/faq", "query": "how do I join the course", "num_results": 3}
```

```json
{"url": "https://example.com", "word": "data"}
```

## Error Handling
- Invalid URLs and repository names return an error
- Unknown repositories return a not-found error
- Network failures and non-success HTTP statuses return an error
"#;
