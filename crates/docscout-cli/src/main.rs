//! DocScout CLI - documentation research assistant, MCP server and tools

use clap::{Parser, Subcommand, ValueEnum};
use docscout::assistant::API_KEY_ENV;
use docscout::{
    Assistant, AssistantConfig, McpServer, SearchResult, ToolRegistry, DEFAULT_API_BASE,
    DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_MODEL, TOOLS_LLMTXT,
};
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Output format for the search subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Markdown sections, one per result
    #[default]
    Md,
    /// JSON array
    Json,
}

/// DocScout - research web pages and GitHub documentation with an AI assistant
#[derive(Parser, Debug)]
#[command(name = "docscout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full tool documentation (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    /// Custom User-Agent for outgoing requests
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive assistant backed by a hosted chat model
    Chat {
        /// Model identifier
        #[arg(long, env = "DOCSCOUT_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Chat-completions API base URL
        #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE)]
        api_base: String,

        /// Maximum tool-call rounds per question
        #[arg(long, default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
        max_tool_rounds: usize,
    },
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Fetch a URL through the reader and print it as markdown
    Fetch {
        /// URL to fetch
        url: String,
    },
    /// Search a GitHub repository's markdown documentation
    Search {
        /// Repository: owner/repo or a GitHub URL
        repo: String,

        /// Search query
        query: String,

        /// Number of results
        #[arg(long, short = 'n')]
        num_results: Option<usize>,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        /// Download and index the repository again before searching
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.llmtxt {
        writeln_safe(TOOLS_LLMTXT);
        std::process::exit(0);
    }

    // Logs go to stderr; stdout carries MCP frames and command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let Some(command) = cli.command else {
        eprintln!("Usage: docscout chat");
        eprintln!("   or: docscout mcp");
        eprintln!("   or: docscout fetch <URL>");
        eprintln!("   or: docscout search <REPO> <QUERY>");
        eprintln!("   or: docscout --help");
        std::process::exit(1);
    };

    let registry = build_registry(cli.user_agent);

    match command {
        Commands::Chat {
            model,
            api_base,
            max_tool_rounds,
        } => {
            let config = match AssistantConfig::from_env() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    eprintln!("Set {} to use the assistant.", API_KEY_ENV);
                    std::process::exit(1);
                }
            }
            .model(model)
            .api_base(api_base)
            .max_tool_rounds(max_tool_rounds);
            run_chat(&config, registry).await;
        }
        Commands::Mcp => {
            let server = McpServer::new(registry);
            if let Err(e) = server.run_stdio().await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Fetch { url } => match registry.fetcher().fetch(&url).await {
            Ok(text) => writeln_safe(&text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Search {
            repo,
            query,
            num_results,
            output,
            refresh,
        } => {
            let docs = registry.docs();
            if refresh {
                if let Err(e) = docs.refresh(&repo).await {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
            match docs.search(&repo, &query, num_results).await {
                Ok(results) => writeln_safe(&format_results(&results, output)),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn build_registry(user_agent: Option<String>) -> Arc<ToolRegistry> {
    let mut builder = ToolRegistry::builder();
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    match builder.build() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_chat(config: &AssistantConfig, registry: Arc<ToolRegistry>) {
    let assistant = match Assistant::from_config(config, registry) {
        Ok(assistant) => assistant,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("DocScout assistant ({}). Type 'quit' to exit.", config.model);
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = assistant.run(stdin.lock(), stdout.lock()).await {
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Render search results for the terminal
fn format_results(results: &[SearchResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Md => {
            if results.is_empty() {
                return "No results.".to_string();
            }
            let mut output = String::new();
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                output.push_str("---\n");
                output.push_str(&format!("filename: {}\n", result.filename));
                if let Some(ref title) = result.title {
                    output.push_str(&format!("title: {}\n", title));
                }
                output.push_str(&format!("score: {:.4}\n", result.score));
                output.push_str("---\n");
                output.push_str(&result.content);
                output.push('\n');
            }
            output
        }
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(filename: &str, title: Option<&str>, score: f32) -> SearchResult {
        SearchResult {
            filename: filename.to_string(),
            title: title.map(str::to_string),
            score,
            content: "Some content".to_string(),
        }
    }

    #[test]
    fn test_format_md() {
        let results = vec![
            result("README.md", Some("Intro"), 0.75),
            result("docs/faq.md", None, 0.5),
        ];
        let output = format_results(&results, OutputFormat::Md);

        assert!(output.starts_with("---\nfilename: README.md\ntitle: Intro\nscore: 0.7500\n---\n"));
        assert!(output.contains("---\nfilename: docs/faq.md\nscore: 0.5000\n---\nSome content"));
    }

    #[test]
    fn test_format_md_empty() {
        assert_eq!(format_results(&[], OutputFormat::Md), "No results.");
    }

    #[test]
    fn test_format_json() {
        let results = vec![result("README.md", None, 1.0)];
        let output = format_results(&results, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["filename"], "README.md");
        assert!(parsed[0].get("title").is_none());
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::parse_from(["docscout", "search", "owner/repo", "install", "-n", "3"]);
        match cli.command {
            Some(Commands::Search {
                repo,
                num_results,
                refresh,
                ..
            }) => {
                assert_eq!(repo, "owner/repo");
                assert_eq!(num_results, Some(3));
                assert!(!refresh);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_search_refresh() {
        let cli = Cli::parse_from(["docscout", "search", "--refresh", "owner/repo", "install"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Search { refresh: true, .. })
        ));
    }
}
