use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, WikiError};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Client over an external encyclopedic MediaWiki archive (a Memory
/// Alpha-style site). Used only as a fallback when the local store has no
/// answer, so failures are swallowed by callers rather than propagated —
/// see `search` which returns an empty string instead of erroring.
pub struct ArchiveClient {
    http: Client,
    api_url: String,
}

impl ArchiveClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(ARCHIVE_TIMEOUT)
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    /// Search the archive and format each hit as `**Title** [tag?]\n<intro>`.
    /// Best-effort: any failure (timeout, malformed JSON, empty result set)
    /// returns `Ok(String::new())` rather than an error, matching the
    /// `RemoteUnavailable` contract that callers treat as "no content".
    pub async fn search(&self, query: &str, limit: u32, tag_as_archive: bool) -> Result<String> {
        let titles = match self.search_titles(query, limit).await {
            Ok(titles) => titles,
            Err(e) => {
                warn!(query, error = %e, "archive search failed, returning empty result");
                return Ok(String::new());
            }
        };

        if titles.is_empty() {
            return Ok(String::new());
        }

        let extracts = match self.fetch_extracts(&titles).await {
            Ok(extracts) => extracts,
            Err(e) => {
                warn!(query, error = %e, "archive extract fetch failed, returning empty result");
                return Ok(String::new());
            }
        };

        let tag = if tag_as_archive { " [Federation Archives]" } else { "" };
        let formatted: Vec<String> = extracts
            .into_iter()
            .map(|(title, extract)| format!("**{title}**{tag}\n{extract}"))
            .collect();

        Ok(formatted.join("\n\n"))
    }

    async fn search_titles(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let limit_str = limit.to_string();
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit_str.as_str()),
                ("srnamespace", "0"),
                ("srprop", "snippet|titlesnippet"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(WikiError::Http {
                status: resp.status().as_u16(),
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| WikiError::Malformed(e.to_string()))?;

        let titles = body
            .pointer("/query/search")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .filter_map(|h| h.get("title").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(titles)
    }

    async fn fetch_extracts(&self, titles: &[String]) -> Result<Vec<(String, String)>> {
        let joined = titles.join("|");
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", joined.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(WikiError::Http {
                status: resp.status().as_u16(),
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| WikiError::Malformed(e.to_string()))?;

        let pages = body
            .pointer("/query/pages")
            .and_then(Value::as_object)
            .ok_or_else(|| WikiError::Malformed("missing query.pages".to_string()))?;

        let mut results: Vec<(String, String)> = pages
            .values()
            .filter_map(|p| {
                let title = p.get("title").and_then(Value::as_str)?.to_string();
                let extract = p.get("extract").and_then(Value::as_str).unwrap_or_default().to_string();
                if extract.trim().is_empty() {
                    None
                } else {
                    Some((title, extract))
                }
            })
            .collect();

        // Preserve the original ranking from the search call.
        results.sort_by_key(|(title, _)| titles.iter().position(|t| t == title).unwrap_or(usize::MAX));
        Ok(results)
    }
}
