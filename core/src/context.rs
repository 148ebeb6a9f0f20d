//! Context gathering from the document repository and the web search API.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::{AssistantConfig, DEFAULT_REPO_API_BASE, DEFAULT_SEARCH_ENDPOINT};
use crate::errors::{AssistantError, AssistantResult};
use crate::types::{RepoEntry, SearchResponse, SearchResult};

/// Extensions of repository files that count as documents
pub const DOCUMENT_EXTENSIONS: [&str; 3] = [".txt", ".md", ".pdf"];

/// Number of search result titles kept in the context
pub const MAX_SEARCH_TITLES: usize = 2;

/// Source listing the documents available to the assistant
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn list_documents(&self) -> AssistantResult<Vec<RepoEntry>>;
}

/// Source of external web search results
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> AssistantResult<Vec<SearchResult>>;
}

/// Context collected for a single query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBundle {
    pub documents: Vec<String>,
    pub sources: Vec<String>,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.sources.is_empty()
    }

    /// Renders the bundle as prompt text, documents first
    pub fn render(&self) -> String {
        let mut text = String::new();
        if !self.documents.is_empty() {
            text.push_str("Internal documents found: ");
            text.push_str(&self.documents.join(", "));
            text.push('\n');
        }
        if !self.sources.is_empty() {
            text.push_str("External sources: ");
            text.push_str(&self.sources.join(", "));
        }
        text
    }
}

fn is_document(name: &str) -> bool {
    DOCUMENT_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Gathers context from both sources concurrently; never fails.
#[derive(Clone, Default)]
pub struct ContextGatherer {
    documents: Option<Arc<dyn DocumentRepository>>,
    search: Option<Arc<dyn WebSearch>>,
}

impl ContextGatherer {
    pub fn new(
        documents: Option<Arc<dyn DocumentRepository>>,
        search: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        Self { documents, search }
    }

    /// Wires the GitHub and Tavily clients from configuration.
    ///
    /// A source whose credentials are missing is left out and logged, rather than failing.
    pub fn from_config(config: &AssistantConfig, client: Client) -> Self {
        let documents = match GithubRepository::from_config(config, client.clone()) {
            Ok(repo) => Some(Arc::new(repo) as Arc<dyn DocumentRepository>),
            Err(e) => {
                warn!(error = %e, "Document repository disabled");
                None
            }
        };
        let search = match TavilySearch::from_config(config, client) {
            Ok(search) => Some(Arc::new(search) as Arc<dyn WebSearch>),
            Err(e) => {
                warn!(error = %e, "Web search disabled");
                None
            }
        };
        Self { documents, search }
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn gather(&self, query: &str) -> ContextBundle {
        let (documents, sources) = tokio::join!(self.document_names(), self.search_titles(query));
        debug!(
            documents = documents.len(),
            sources = sources.len(),
            "Context gathered"
        );
        ContextBundle { documents, sources }
    }

    async fn document_names(&self) -> Vec<String> {
        let Some(repo) = &self.documents else {
            return Vec::new();
        };
        match repo.list_documents().await {
            Ok(entries) => entries
                .into_iter()
                .map(|e| e.name)
                .filter(|name| is_document(name))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load repository documents");
                Vec::new()
            }
        }
    }

    async fn search_titles(&self, query: &str) -> Vec<String> {
        let Some(search) = &self.search else {
            return Vec::new();
        };
        match search.search(query).await {
            Ok(results) => results
                .into_iter()
                .take(MAX_SEARCH_TITLES)
                .map(|r| r.title)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Web search failed");
                Vec::new()
            }
        }
    }
}

async fn error_for_status(response: reqwest::Response) -> AssistantResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AssistantError::HttpError {
        status_code: status.as_u16(),
        message: body,
    })
}

/// Lists the root of a GitHub repository through the contents API
#[derive(Debug, Clone)]
pub struct GithubRepository {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubRepository {
    pub fn new(client: Client, api_base: &str, owner: &str, repo: &str, token: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_config(config: &AssistantConfig, client: Client) -> AssistantResult<Self> {
        let missing = |what: &str| AssistantError::ConfigError(format!("{} is not configured", what));
        let token = config
            .repo_access_token
            .as_deref()
            .ok_or_else(|| missing("Repository access token"))?;
        let owner = config.repo_owner.as_deref().ok_or_else(|| missing("Repository owner"))?;
        let repo = config.repo_name.as_deref().ok_or_else(|| missing("Repository name"))?;
        let api_base = config.repo_api_base.as_deref().unwrap_or(DEFAULT_REPO_API_BASE);
        Ok(Self::new(client, api_base, owner, repo, token))
    }

    pub fn contents_url(&self) -> String {
        format!("{}/repos/{}/{}/contents", self.api_base, self.owner, self.repo)
    }
}

#[async_trait]
impl DocumentRepository for GithubRepository {
    async fn list_documents(&self) -> AssistantResult<Vec<RepoEntry>> {
        let response = self
            .client
            .get(self.contents_url())
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AssistantError::RequestError(format!("Repository listing failed: {}", e)))?;

        let entries = error_for_status(response)
            .await?
            .json::<Vec<RepoEntry>>()
            .await
            .map_err(|e| AssistantError::ParsingError(format!("Bad repository listing: {}", e)))?;
        Ok(entries)
    }
}

/// Keyword web search through the Tavily API
#[derive(Debug, Clone)]
pub struct TavilySearch {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TavilySearch {
    pub fn new(client: Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &AssistantConfig, client: Client) -> AssistantResult<Self> {
        let api_key = config.search_api_key.as_deref().ok_or_else(|| {
            AssistantError::ConfigError("Search API key is not configured".to_string())
        })?;
        let endpoint = config.search_endpoint.as_deref().unwrap_or(DEFAULT_SEARCH_ENDPOINT);
        Ok(Self::new(client, endpoint, api_key))
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> AssistantResult<Vec<SearchResult>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AssistantError::RequestError(format!("Web search failed: {}", e)))?;

        let body = error_for_status(response)
            .await?
            .json::<SearchResponse>()
            .await
            .map_err(|e| AssistantError::ParsingError(format!("Bad search response: {}", e)))?;
        Ok(body.results)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct FakeRepository {
        pub result: Result<Vec<&'static str>, &'static str>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentRepository for FakeRepository {
        async fn list_documents(&self) -> AssistantResult<Vec<RepoEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(names) => Ok(names
                    .iter()
                    .map(|n| RepoEntry {
                        name: n.to_string(),
                        path: None,
                        kind: Some("file".into()),
                    })
                    .collect()),
                Err(msg) => Err(AssistantError::HttpError {
                    status_code: 401,
                    message: msg.to_string(),
                }),
            }
        }
    }

    pub(crate) struct FakeSearch {
        pub result: Result<Vec<&'static str>, &'static str>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl WebSearch for FakeSearch {
        async fn search(&self, _query: &str) -> AssistantResult<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield so the two sources really interleave under join!
            tokio::task::yield_now().await;
            match &self.result {
                Ok(titles) => Ok(titles
                    .iter()
                    .map(|t| SearchResult {
                        title: t.to_string(),
                        url: None,
                    })
                    .collect()),
                Err(msg) => Err(AssistantError::RequestError(msg.to_string())),
            }
        }
    }

    pub(crate) fn gatherer(
        docs: Result<Vec<&'static str>, &'static str>,
        titles: Result<Vec<&'static str>, &'static str>,
    ) -> ContextGatherer {
        ContextGatherer::new(
            Some(Arc::new(FakeRepository {
                result: docs,
                calls: AtomicUsize::new(0),
            })),
            Some(Arc::new(FakeSearch {
                result: titles,
                calls: AtomicUsize::new(0),
            })),
        )
    }

    #[tokio::test]
    async fn merges_documents_then_sources() {
        let gatherer = gatherer(
            Ok(vec!["policy.md", "logo.png", "report.pdf", "notes.txt"]),
            Ok(vec!["First", "Second", "Third"]),
        );

        let bundle = gatherer.gather("what is the policy").await;
        assert_eq!(bundle.documents, vec!["policy.md", "report.pdf", "notes.txt"]);
        assert_eq!(bundle.sources, vec!["First", "Second"]);
        assert_eq!(
            bundle.render(),
            "Internal documents found: policy.md, report.pdf, notes.txt\nExternal sources: First, Second"
        );
    }

    #[tokio::test]
    async fn one_failing_source_does_not_affect_the_other() {
        let bundle = gatherer(Err("bad credentials"), Ok(vec!["Only result"]))
            .gather("who")
            .await;
        assert!(bundle.documents.is_empty());
        assert_eq!(bundle.render(), "External sources: Only result");

        let bundle = gatherer(Ok(vec!["a.md"]), Err("timeout")).gather("who").await;
        assert_eq!(bundle.render(), "Internal documents found: a.md\n");
    }

    #[tokio::test]
    async fn both_sources_failing_yields_empty_bundle() {
        let bundle = gatherer(Err("down"), Err("down")).gather("where").await;
        assert!(bundle.is_empty());
        assert_eq!(bundle.render(), "");
    }

    #[tokio::test]
    async fn missing_sources_yield_empty_bundle() {
        let bundle = ContextGatherer::default().gather("where").await;
        assert!(bundle.is_empty());
    }

    #[test]
    fn github_url_and_config() {
        let mut config = AssistantConfig::defaults();
        assert!(GithubRepository::from_config(&config, Client::new()).is_err());

        config.repo_access_token = Some("ghp_x".into());
        config.repo_api_base = Some("https://api.github.com/".into());
        let repo = GithubRepository::from_config(&config, Client::new()).unwrap();
        assert_eq!(
            repo.contents_url(),
            "https://api.github.com/repos/GerediNIYIBIGIRA/AI_ProjectMethod_Assignment/contents"
        );
    }

    #[test]
    fn search_requires_key() {
        let config = AssistantConfig::defaults();
        assert!(matches!(
            TavilySearch::from_config(&config, Client::new()),
            Err(AssistantError::ConfigError(_))
        ));
    }
}
