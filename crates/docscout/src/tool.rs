//! Tool registry: declarations and dispatch for the exposed operations

use crate::docs::DocSearch;
use crate::error::{DocScoutError, Result};
use crate::github::GitHubOptions;
use crate::reader::{ContentFetcher, ReaderOptions};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Arguments of `fetch_url_content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FetchUrlContentArgs {
    /// The URL of the web page to fetch (must be http:// or https://)
    pub url: String,
}

/// Arguments of `search_repo_docs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchRepoDocsArgs {
    /// GitHub repository as `owner/repo` or `https://github.com/owner/repo`
    #[serde(alias = "github_url")]
    pub repo: String,
    /// The search query
    pub query: String,
    /// Number of results to return (default 5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_results: Option<usize>,
}

/// Arguments of `count_word`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CountWordArgs {
    /// The URL of the web page to analyze
    pub url: String,
    /// The word to count (case-insensitive)
    pub word: String,
}

/// The set of tools this crate exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    FetchUrlContent,
    SearchRepoDocs,
    CountWord,
}

impl ToolKind {
    /// Every tool, in declaration order
    pub const ALL: [ToolKind; 3] = [
        ToolKind::FetchUrlContent,
        ToolKind::SearchRepoDocs,
        ToolKind::CountWord,
    ];

    /// Protocol-visible tool name
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::FetchUrlContent => "fetch_url_content",
            ToolKind::SearchRepoDocs => "search_repo_docs",
            ToolKind::CountWord => "count_word",
        }
    }

    /// Look a tool up by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Description for LLM consumption
    pub fn description(self) -> &'static str {
        match self {
            ToolKind::FetchUrlContent => {
                "Fetch a web page and return its content as readable markdown text."
            }
            ToolKind::SearchRepoDocs => {
                "Search the markdown documentation (.md, .mdx) of a GitHub repository. \
                 The repository is downloaded and indexed on first use. Returns matching \
                 files with a relevance score and the beginning of their content."
            }
            ToolKind::CountWord => {
                "Count how many times a word appears on a web page (case-insensitive)."
            }
        }
    }

    /// JSON schema of the tool arguments
    pub fn input_schema(self) -> Value {
        let schema = match self {
            ToolKind::FetchUrlContent => schema_for!(FetchUrlContentArgs),
            ToolKind::SearchRepoDocs => schema_for!(SearchRepoDocsArgs),
            ToolKind::CountWord => schema_for!(CountWordArgs),
        };
        let mut value = serde_json::to_value(schema).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("$schema");
        }
        value
    }

    /// Full declaration for discovery
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Tool declaration as advertised to protocol clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A parsed tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    FetchUrlContent(FetchUrlContentArgs),
    SearchRepoDocs(SearchRepoDocsArgs),
    CountWord(CountWordArgs),
}

impl ToolCall {
    /// Parse a call from a tool name and its JSON arguments
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| DocScoutError::UnknownTool(name.to_string()))?;
        // Some clients send `null` instead of an empty object
        let arguments = if arguments.is_null() {
            Value::Object(Default::default())
        } else {
            arguments
        };

        let invalid = |e: serde_json::Error| DocScoutError::InvalidArguments(format!("{name}: {e}"));
        Ok(match kind {
            ToolKind::FetchUrlContent => {
                ToolCall::FetchUrlContent(serde_json::from_value(arguments).map_err(invalid)?)
            }
            ToolKind::SearchRepoDocs => {
                ToolCall::SearchRepoDocs(serde_json::from_value(arguments).map_err(invalid)?)
            }
            ToolKind::CountWord => {
                ToolCall::CountWord(serde_json::from_value(arguments).map_err(invalid)?)
            }
        })
    }

    /// Parse a call whose arguments arrive as a JSON string
    pub fn parse_str(name: &str, arguments: &str) -> Result<Self> {
        let value = if arguments.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(arguments)
                .map_err(|e| DocScoutError::InvalidArguments(format!("{name}: {e}")))?
        };
        Self::parse(name, value)
    }

    /// Which tool this call targets
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::FetchUrlContent(_) => ToolKind::FetchUrlContent,
            ToolCall::SearchRepoDocs(_) => ToolKind::SearchRepoDocs,
            ToolCall::CountWord(_) => ToolKind::CountWord,
        }
    }
}

/// Builder for configuring the [`ToolRegistry`]
#[derive(Debug, Clone, Default)]
pub struct ToolRegistryBuilder {
    reader: ReaderOptions,
    github: GitHubOptions,
    default_num_results: Option<usize>,
}

impl ToolRegistryBuilder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set reader-service options
    pub fn reader(mut self, options: ReaderOptions) -> Self {
        self.reader = options;
        self
    }

    /// Set archive download options
    pub fn github(mut self, options: GitHubOptions) -> Self {
        self.github = options;
        self
    }

    /// Set custom User-Agent for every outbound request
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        let ua = ua.into();
        self.reader = self.reader.user_agent(ua.clone());
        self.github = self.github.user_agent(ua);
        self
    }

    /// Set the default number of search results
    pub fn default_num_results(mut self, n: usize) -> Self {
        self.default_num_results = Some(n);
        self
    }

    /// Build the registry
    pub fn build(self) -> Result<ToolRegistry> {
        let fetcher = ContentFetcher::with_options(self.reader)?;
        let mut docs = DocSearch::with_options(self.github)?;
        if let Some(n) = self.default_num_results {
            docs = docs.default_num_results(n);
        }
        Ok(ToolRegistry { fetcher, docs })
    }
}

/// Declares the tools and dispatches calls to their handlers
#[derive(Debug)]
pub struct ToolRegistry {
    fetcher: ContentFetcher,
    docs: DocSearch,
}

impl ToolRegistry {
    /// Create a registry from already-built components
    pub fn new(fetcher: ContentFetcher, docs: DocSearch) -> Self {
        Self { fetcher, docs }
    }

    /// Create a registry builder
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Declarations of every tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
    }

    /// Content fetcher backing `fetch_url_content` and `count_word`
    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    /// Search facade backing `search_repo_docs`
    pub fn docs(&self) -> &DocSearch {
        &self.docs
    }

    /// Parse and execute a call by name
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String> {
        let call = ToolCall::parse(name, arguments)?;
        self.dispatch(call).await
    }

    /// Execute a parsed call, returning its text result
    pub async fn dispatch(&self, call: ToolCall) -> Result<String> {
        debug!(tool = call.kind().name(), "Dispatching tool call");
        match call {
            ToolCall::FetchUrlContent(args) => self.fetcher.fetch(&args.url).await,
            ToolCall::SearchRepoDocs(args) => {
                let results = self
                    .docs
                    .search(&args.repo, &args.query, args.num_results)
                    .await?;
                Ok(serde_json::to_string_pretty(&results).unwrap_or_else(|_| "[]".to_string()))
            }
            ToolCall::CountWord(args) => {
                let count = self.fetcher.count_word(&args.url, &args.word).await?;
                Ok(count.to_string())
            }
        }
    }
}
