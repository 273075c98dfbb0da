//! API token resolution
//!
//! A token is resolved once at session start and handed to the fetcher.
//! Resolvers never fail: a missing or broken credential source simply yields
//! no token and the session runs unauthenticated.

use async_trait::async_trait;
use std::fmt;
use tokio::process::Command;

/// Environment variable consulted for a token
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// An API token; its value never appears in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wraps a token, returning None for blank input
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    /// The raw token value, for building the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// A source of API credentials
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// Short name of the source, for logs
    fn name(&self) -> &str;

    /// Looks up a token; None if this source has none
    async fn resolve(&self) -> Option<Token>;
}

/// A token passed explicitly, e.g. on the command line
pub struct ExplicitToken(Option<Token>);

impl ExplicitToken {
    pub fn new(value: Option<&str>) -> Self {
        Self(value.and_then(Token::new))
    }
}

#[async_trait]
impl TokenResolver for ExplicitToken {
    fn name(&self) -> &str {
        "command line"
    }

    async fn resolve(&self) -> Option<Token> {
        self.0.clone()
    }
}

/// Reads a token from an environment variable
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

#[async_trait]
impl TokenResolver for EnvToken {
    fn name(&self) -> &str {
        &self.var
    }

    async fn resolve(&self) -> Option<Token> {
        std::env::var(&self.var).ok().and_then(Token::new)
    }
}

/// Asks the GitHub CLI for the token of its logged-in account
///
/// Runs `gh auth status --show-token` and reads the `Token:` line.
pub struct GhCliToken {
    program: String,
}

impl GhCliToken {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GhCliToken {
    fn default() -> Self {
        Self::new("gh")
    }
}

#[async_trait]
impl TokenResolver for GhCliToken {
    fn name(&self) -> &str {
        "gh auth"
    }

    async fn resolve(&self) -> Option<Token> {
        let output = match Command::new(&self.program)
            .args(["auth", "status", "--show-token"])
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("GitHub CLI not available ({}): {}", self.program, e);
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!("GitHub CLI is not authenticated");
            return None;
        }

        // Older gh releases print the status on stderr
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        parse_gh_status_token(&stdout).or_else(|| parse_gh_status_token(&stderr))
    }
}

/// Extracts the token from `gh auth status --show-token` output
///
/// # Examples
///
/// ```
/// use awesome_metrics::crawler::parse_gh_status_token;
///
/// let output = "github.com\n  ✓ Logged in to github.com account octocat\n  - Token: gho_abc123\n";
/// assert_eq!(parse_gh_status_token(output).unwrap().expose(), "gho_abc123");
/// ```
pub fn parse_gh_status_token(output: &str) -> Option<Token> {
    output.lines().find_map(|line| {
        let line = line.trim_start().trim_start_matches(['-', '✓', '*']).trim_start();
        line.strip_prefix("Token:").and_then(Token::new)
    })
}

/// Tries resolvers in order and returns the first token found
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn TokenResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver to the chain
    pub fn with(mut self, resolver: impl TokenResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Explicit token, then `GITHUB_TOKEN`, then the GitHub CLI
    pub fn standard(explicit: Option<&str>) -> Self {
        Self::new()
            .with(ExplicitToken::new(explicit))
            .with(EnvToken::default())
            .with(GhCliToken::default())
    }
}

#[async_trait]
impl TokenResolver for ResolverChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn resolve(&self) -> Option<Token> {
        for resolver in &self.resolvers {
            if let Some(token) = resolver.resolve().await {
                tracing::info!("Using API token from {}", resolver.name());
                return Some(token);
            }
        }
        tracing::info!("No API token found, sending unauthenticated requests");
        None
    }
}

/// A resolver that never yields a token (for `--no-auth`)
pub struct NoToken;

#[async_trait]
impl TokenResolver for NoToken {
    fn name(&self) -> &str {
        "none"
    }

    async fn resolve(&self) -> Option<Token> {
        None
    }
}
