use async_trait::async_trait;
use deckhand_core::config::SearchConfig;
use deckhand_core::ApplicationError;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Web search: query in, ranked hits out. Ranking itself belongs to the
/// engine, not to this crate.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ApplicationError>;
}

/// Client for the DuckDuckGo Instant Answer JSON API. The abstract (when
/// present) leads the hit list, followed by related topics flattened out of
/// their category groups, capped at the configured maximum.
pub struct DuckDuckGoClient {
    client: reqwest::Client,
    endpoint: String,
    region: String,
    max_results: usize,
}

impl DuckDuckGoClient {
    pub fn from_config(search: &SearchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: search.endpoint.trim_end_matches('/').to_string(),
            region: search.region.clone(),
            max_results: search.max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ApplicationError> {
        let response = self
            .client
            .get(format!("{}/", self.endpoint))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("no_redirect", "1"),
                ("kl", self.region.as_str()),
            ])
            .send()
            .await
            .map_err(|error| ApplicationError::Search(error.to_string()))?;
        if !response.status().is_success() {
            return Err(ApplicationError::Search(format!(
                "search endpoint returned {}",
                response.status()
            )));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|error| ApplicationError::Search(error.to_string()))?;
        Ok(collect_hits(answer, query, self.max_results))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstantAnswer {
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "AbstractText")]
    abstract_text: String,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Entry {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL", default)]
        #[allow(dead_code)]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

fn collect_hits(answer: InstantAnswer, query: &str, limit: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if !answer.abstract_text.is_empty() {
        let title = if answer.heading.is_empty() { query.to_string() } else { answer.heading };
        hits.push(SearchHit { title, snippet: answer.abstract_text });
    }
    flatten_topics(answer.related_topics, &mut hits, limit);
    hits.truncate(limit);
    hits
}

fn flatten_topics(topics: Vec<RelatedTopic>, hits: &mut Vec<SearchHit>, limit: usize) {
    for topic in topics {
        if hits.len() >= limit {
            return;
        }
        match topic {
            RelatedTopic::Entry { text, .. } => {
                if text.is_empty() {
                    continue;
                }
                let (title, snippet) = split_hit_text(&text);
                hits.push(SearchHit { title, snippet });
            }
            RelatedTopic::Group { topics } => flatten_topics(topics, hits, limit),
        }
    }
}

/// Instant Answer topics pack title and description into one `Text` field
/// separated by " - "; a hit without the separator repeats as both.
fn split_hit_text(text: &str) -> (String, String) {
    match text.split_once(" - ") {
        Some((title, rest)) => (title.to_string(), rest.to_string()),
        None => (text.to_string(), text.to_string()),
    }
}
