//! Workplace stories from a news search API
//!
//! Builds a search from the first few words of the prompt, asks the news
//! API for a handful of relevant English articles, and turns the first
//! usable, non-promotional article into a short story.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeDelta};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use super::StoryResponse;
use crate::config::{require_keys, ComponentConfig};
use crate::error::AgentError;
use crate::preflight::Environment;
use crate::util::{mask_secret, sanitize_base_url, take_chars, validate_credential};

/// Provenance tag of this source
pub const SOURCE_TAG: &str = "news";

pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Prompt words that become search keywords
const KEYWORD_COUNT: usize = 3;
const PAGE_SIZE: u32 = 5;
const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const MAX_LOOKBACK_DAYS: i64 = 3650;
/// Characters of article body kept in the story
const DETAILS_BUDGET: usize = 500;

const WORKPLACE_CONTEXT: &str = "(workplace OR office OR work OR employee OR workplace-culture OR \
                                 office-environment OR workplace-behavior)";

/// Phrases that mark an article as an advert
const PROMOTIONAL_TERMS: [&str; 6] = ["buy now", "discount", "deal", "sale", "click here", "subscribe"];

/// Parameters of one news search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub q: String,
    pub sort_by: String,
    pub page_size: u32,
    pub language: String,
    pub from: NaiveDate,
}

impl NewsQuery {
    pub fn for_prompt(prompt: &str, from: NaiveDate) -> Self {
        Self {
            q: build_search_query(prompt),
            sort_by: "relevancy".to_string(),
            page_size: PAGE_SIZE,
            language: "en".to_string(),
            from,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Article {
    fn field(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("")
    }

    pub fn title(&self) -> &str {
        Self::field(&self.title)
    }

    pub fn description(&self) -> &str {
        Self::field(&self.description)
    }

    pub fn body(&self) -> &str {
        Self::field(&self.content)
    }

    pub fn source_name(&self) -> &str {
        self.source.name.as_deref().unwrap_or("Unknown Source")
    }

    fn has_content(&self) -> bool {
        !self.title().is_empty() && !self.description().is_empty() && !self.body().is_empty()
    }

    fn is_promotional(&self) -> bool {
        let text = format!("{}{}", self.description(), self.body()).to_lowercase();
        PROMOTIONAL_TERMS.iter().any(|term| text.contains(term))
    }
}

/// News search capability
#[async_trait]
pub trait NewsSearch: Send + Sync {
    async fn search(&self, query: &NewsQuery, api_key: &str) -> Result<Vec<Article>>;
}

/// newsapi.org `everything` endpoint client
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    endpoint: String,
    client: HttpClient,
}

impl NewsApiClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = sanitize_base_url(endpoint, "News API endpoint")?;
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("social-agent/0.2")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { endpoint, client })
    }
}

#[derive(Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[async_trait]
impl NewsSearch for NewsApiClient {
    async fn search(&self, query: &NewsQuery, api_key: &str) -> Result<Vec<Article>> {
        tracing::debug!("[NEWS] Using API key starting with: {}", mask_secret(api_key));

        let from = query.from.format("%Y-%m-%d").to_string();
        let page_size = query.page_size.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query.q.as_str()),
                ("sortBy", query.sort_by.as_str()),
                ("pageSize", page_size.as_str()),
                ("language", query.language.as_str()),
                ("apiKey", api_key),
                ("from", from.as_str()),
            ])
            .send()
            .await
            .context("News API request failed")?;

        let status = response.status();
        tracing::info!("News API response status: {}", status);

        let text = response.text().await.context("Failed to read News API response")?;
        if !status.is_success() {
            bail!("News API error: {}", text);
        }

        let parsed: NewsApiResponse =
            serde_json::from_str(&text).context("Failed to parse News API response")?;
        if parsed.status == "error" {
            bail!("News API error: {}", parsed.message.unwrap_or_default());
        }
        Ok(parsed.articles)
    }
}

/// `(context) AND (w1 OR w2 OR w3)` from the first prompt words
pub fn build_search_query(prompt: &str) -> String {
    let keywords = prompt
        .split_whitespace()
        .take(KEYWORD_COUNT)
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{} AND ({})", WORKPLACE_CONTEXT, keywords)
}

/// First article with full content that isn't an advert
pub fn select_article(articles: &[Article]) -> Option<&Article> {
    articles.iter().find(|article| {
        if !article.has_content() {
            tracing::debug!("Skipping article with insufficient content: {}", article.title());
            return false;
        }
        if article.is_promotional() {
            tracing::debug!("Skipping promotional article: {}", article.title());
            return false;
        }
        true
    })
}

pub fn format_article(article: &Article) -> String {
    format!(
        "From {}:\n\nTitle: {}\n\nContext: {}\n\nDetails: {}...",
        article.source_name(),
        article.title(),
        article.description(),
        take_chars(article.body(), DETAILS_BUDGET)
    )
}

pub struct NewsSource {
    client: Box<dyn NewsSearch>,
    api_key: String,
    published_after: NaiveDate,
}

impl NewsSource {
    pub fn new(client: Box<dyn NewsSearch>, api_key: String, published_after: NaiveDate) -> Self {
        Self {
            client,
            api_key,
            published_after,
        }
    }

    /// Build from the `[sources.news.config]` table
    ///
    /// Keys: `api_key_env` (required), `endpoint`, `published_after`
    /// (YYYY-MM-DD) or `lookback_days`.
    pub fn from_config(config: &ComponentConfig, env: &dyn Environment) -> crate::error::Result<Self> {
        require_keys("news", config, &["api_key_env"])?;

        let key_var = &config["api_key_env"];
        let api_key = env
            .var(key_var)
            .ok_or_else(|| AgentError::MissingEnvironment {
                names: vec![key_var.clone()],
            })?;
        let api_key = validate_credential(&api_key, key_var).map_err(|e| AgentError::InvalidConfig {
            message: e.to_string(),
        })?;

        let endpoint = config.get("endpoint").map(String::as_str).unwrap_or(DEFAULT_ENDPOINT);
        let client = NewsApiClient::new(endpoint).map_err(|e| AgentError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self::new(Box::new(client), api_key, published_after(config)?))
    }

    pub fn published_after(&self) -> NaiveDate {
        self.published_after
    }

    pub async fn generate_story(&self, prompt: &str) -> Option<StoryResponse> {
        let query = NewsQuery::for_prompt(prompt, self.published_after);
        tracing::info!("News search query: {}", query.q);

        let articles = match self.client.search(&query, &self.api_key).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::error!("Error fetching news: {:#}", e);
                return None;
            }
        };

        if articles.is_empty() {
            tracing::warn!("News API returned no articles");
            return None;
        }
        tracing::info!("News API returned {} articles", articles.len());

        let Some(article) = select_article(&articles) else {
            tracing::warn!("No suitable article among {} results", articles.len());
            return None;
        };
        tracing::info!("Found suitable news article: {}", article.title());

        StoryResponse::new(format_article(article), SOURCE_TAG)
    }
}

fn published_after(config: &ComponentConfig) -> crate::error::Result<NaiveDate> {
    if let Some(raw) = config.get("published_after") {
        return NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| AgentError::InvalidConfig {
            message: format!("invalid published_after '{}': {}", raw, e),
        });
    }

    let days = match config.get("lookback_days") {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|days| (0..=MAX_LOOKBACK_DAYS).contains(days))
            .ok_or_else(|| AgentError::InvalidConfig {
                message: format!("lookback_days must be between 0 and {}, got '{}'", MAX_LOOKBACK_DAYS, raw),
            })?,
        None => DEFAULT_LOOKBACK_DAYS,
    };

    TimeDelta::try_days(days)
        .and_then(|delta| Local::now().date_naive().checked_sub_signed(delta))
        .ok_or_else(|| AgentError::InvalidConfig {
            message: format!("lookback_days {} is out of range", days),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article(title: &str, description: &str, content: &str) -> Article {
        Article {
            source: ArticleSource {
                name: Some("The Daily".to_string()),
            },
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 11).unwrap()
    }

    async fn source_for(server: &MockServer) -> NewsSource {
        let client = NewsApiClient::new(&format!("{}/v2/everything", server.uri())).unwrap();
        NewsSource::new(Box::new(client), "key-123".to_string(), date())
    }

    #[test]
    fn test_query_uses_first_three_words() {
        let q = build_search_query("missed  promotion again today");
        assert_eq!(
            q,
            "(workplace OR office OR work OR employee OR workplace-culture OR office-environment OR \
             workplace-behavior) AND (missed OR promotion OR again)"
        );
    }

    #[test]
    fn test_select_skips_incomplete_and_promotional() {
        let articles = vec![
            article("No body", "desc", ""),
            article("Ad", "Huge DISCOUNT on chairs", "Office chairs"),
            article("Real", "Managers and teams", "A long story about teams"),
        ];
        assert_eq!(select_article(&articles).unwrap().title(), "Real");
    }

    #[test]
    fn test_promotional_match_spans_description_and_body() {
        // "sa" + "le" only matches once the two fields are joined
        let joined = article("Edge", "A quiet sa", "le of furniture");
        assert!(joined.is_promotional());
    }

    #[test]
    fn test_select_none_when_nothing_usable() {
        let articles = vec![article("Ad", "Subscribe now", "text")];
        assert!(select_article(&articles).is_none());
        assert!(select_article(&[]).is_none());
    }

    #[test]
    fn test_format_truncates_details() {
        let body = "x".repeat(800);
        let story = format_article(&article("T", "D", &body));
        assert!(story.starts_with("From The Daily:\n\nTitle: T\n\nContext: D\n\nDetails: "));
        assert!(story.ends_with(&format!("{}...", "x".repeat(500))));
        assert!(!story.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_format_unknown_source_name() {
        let mut a = article("T", "D", "B");
        a.source.name = None;
        assert!(format_article(&a).starts_with("From Unknown Source:"));
    }

    #[tokio::test]
    async fn test_second_article_used_when_first_is_promotional() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("sortBy", "relevancy"))
            .and(query_param("pageSize", "5"))
            .and(query_param("language", "en"))
            .and(query_param("from", "2025-09-11"))
            .and(query_param("apiKey", "key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 2,
                "articles": [
                    {
                        "source": { "id": null, "name": "Deals Daily" },
                        "title": "Office sale",
                        "description": "Click here for savings",
                        "content": "Chairs for everyone"
                    },
                    {
                        "source": { "id": "wired", "name": "Wired" },
                        "title": "Passed over",
                        "description": "Why promotions stall",
                        "content": "Researchers looked at promotion cycles"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let story = source_for(&server)
            .await
            .generate_story("missed promotion again")
            .await
            .unwrap();
        assert_eq!(story.source(), "news");
        assert!(story.content().starts_with("From Wired:\n\nTitle: Passed over"));
    }

    #[tokio::test]
    async fn test_zero_articles_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok", "totalResults": 0, "articles": []
            })))
            .mount(&server)
            .await;

        assert!(source_for(&server).await.generate_story("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_api_error_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"
            })))
            .mount(&server)
            .await;

        assert!(source_for(&server).await.generate_story("anything").await.is_none());
    }

    #[test]
    fn test_from_config_date_resolution() {
        let env = HashMap::from([("NEWS_API_KEY".to_string(), "k".to_string())]);

        let mut config = ComponentConfig::new();
        config.insert("api_key_env".to_string(), "NEWS_API_KEY".to_string());
        config.insert("published_after".to_string(), "2025-09-11".to_string());
        assert_eq!(NewsSource::from_config(&config, &env).unwrap().published_after(), date());

        config.remove("published_after");
        config.insert("lookback_days".to_string(), "7".to_string());
        let expected = Local::now().date_naive() - TimeDelta::days(7);
        assert_eq!(NewsSource::from_config(&config, &env).unwrap().published_after(), expected);

        config.insert("lookback_days".to_string(), "a week".to_string());
        assert!(NewsSource::from_config(&config, &env).is_err());
    }

    #[test]
    fn test_lookback_out_of_range_is_config_error() {
        let env = HashMap::from([("NEWS_API_KEY".to_string(), "k".to_string())]);
        let mut config = ComponentConfig::new();
        config.insert("api_key_env".to_string(), "NEWS_API_KEY".to_string());

        for raw in ["999999999999", "-5", "3651"] {
            config.insert("lookback_days".to_string(), raw.to_string());
            let err = NewsSource::from_config(&config, &env).err().unwrap();
            assert!(matches!(err, AgentError::InvalidConfig { .. }), "{raw}");
        }

        config.insert("lookback_days".to_string(), "0".to_string());
        let today = Local::now().date_naive();
        assert_eq!(NewsSource::from_config(&config, &env).unwrap().published_after(), today);
    }

    #[test]
    fn test_default_config_uses_fixed_lower_bound() {
        let config = crate::config::AppConfig::load().unwrap();
        let env = HashMap::from([("NEWS_API_KEY".to_string(), "k".to_string())]);
        let news = &config.sources["news"].config;
        assert_eq!(NewsSource::from_config(news, &env).unwrap().published_after(), date());
    }

    #[test]
    fn test_from_config_requires_key_name() {
        let env: HashMap<String, String> = HashMap::new();
        let err = NewsSource::from_config(&ComponentConfig::new(), &env).err().unwrap();
        assert!(matches!(err, AgentError::MissingConfigKeys { .. }));
    }
}
