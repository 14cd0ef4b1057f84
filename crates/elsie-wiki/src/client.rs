use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, WikiError};
use crate::types::{CombinedPageData, ParsedHtml, WikiSection};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Parsed-HTML fetches get up to this many attempts before giving up.
const PARSE_RETRIES: u32 = 2;
/// Delay between `allpages` continuation requests, for API politeness.
const PAGINATION_DELAY: Duration = Duration::from_secs(1);
const ALLPAGES_LIMIT: u32 = 500;

/// Typed client over a single MediaWiki-compatible `api.php` endpoint.
pub struct WikiClient {
    http: Client,
    api_url: String,
}

impl WikiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_client(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    /// Single combined query for extracts + info + revisions. Single-shot —
    /// no retry — because the crawler already revisits failed titles on the
    /// next incremental pass.
    pub async fn combined_page_data(&self, title: &str) -> Result<CombinedPageData> {
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "extracts|info|revisions|categories"),
                ("explaintext", "1"),
                ("exsectionformat", "plain"),
                ("inprop", "url|touched"),
                ("rvprop", "content"),
                ("rvslots", "*"),
                ("cllimit", "500"),
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

        parse_combined_page(&body, title)
    }

    /// `action=parse`, used when the plain-text extract doesn't give
    /// `ContentProcessor` enough structure (infoboxes, section hierarchy).
    /// Retried up to `PARSE_RETRIES` times with a short linear backoff.
    pub async fn parsed_html(&self, title: &str) -> Result<ParsedHtml> {
        let mut last_err = None;
        for attempt in 0..=PARSE_RETRIES {
            match self.try_parsed_html(title).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    warn!(title, attempt, error = %e, "parsed-HTML fetch failed");
                    last_err = Some(e);
                    if attempt < PARSE_RETRIES {
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                    }
                }
            }
        }
        Err(last_err.expect("loop always records an error before exhausting retries"))
    }

    async fn try_parsed_html(&self, title: &str) -> Result<ParsedHtml> {
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "parse"),
                ("format", "json"),
                ("page", title),
                ("prop", "text|sections|displaytitle"),
                ("disableeditsection", "1"),
                ("wrapoutputclass", ""),
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

        parse_parse_result(&body, title)
    }

    /// Paginated `list=allpages`, following `apcontinue` tokens with a 1s
    /// delay between pages.
    pub async fn all_page_titles(&self) -> Result<Vec<String>> {
        let mut titles = Vec::new();
        let mut continue_token: Option<String> = None;

        let limit_str = ALLPAGES_LIMIT.to_string();
        loop {
            let mut query = vec![
                ("action", "query"),
                ("format", "json"),
                ("list", "allpages"),
                ("aplimit", limit_str.as_str()),
            ];
            if let Some(token) = continue_token.as_deref() {
                query.push(("apcontinue", token));
            }

            let resp = self.http.get(&self.api_url).query(&query).send().await?;
            if !resp.status().is_success() {
                return Err(WikiError::Http {
                    status: resp.status().as_u16(),
                });
            }
            let body: Value = resp
                .json()
                .await
                .map_err(|e| WikiError::Malformed(e.to_string()))?;

            let page_titles = body
                .pointer("/query/allpages")
                .and_then(Value::as_array)
                .map(|pages| {
                    pages
                        .iter()
                        .filter_map(|p| p.get("title").and_then(Value::as_str))
                        .map(String::from)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            debug!(count = page_titles.len(), "fetched page of allpages titles");
            titles.extend(page_titles);

            continue_token = body
                .pointer("/continue/apcontinue")
                .and_then(Value::as_str)
                .map(String::from);

            match continue_token {
                Some(_) => tokio::time::sleep(PAGINATION_DELAY).await,
                None => break,
            }
        }

        Ok(titles)
    }
}

fn parse_combined_page(body: &Value, title: &str) -> Result<CombinedPageData> {
    let pages = body
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .ok_or_else(|| WikiError::Malformed("missing query.pages".to_string()))?;

    let page = pages
        .values()
        .next()
        .ok_or_else(|| WikiError::Malformed("empty query.pages".to_string()))?;

    let page_id = page.get("pageid").and_then(Value::as_i64).unwrap_or(-1);
    if page_id == -1 {
        return Ok(CombinedPageData {
            title: title.to_string(),
            page_id: -1,
            extract: String::new(),
            raw_wikitext: String::new(),
            categories: Vec::new(),
            canonical_url: String::new(),
            touched: None,
            lastrevid: None,
            page_exists: false,
        });
    }

    let extract = page
        .get("extract")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let raw_wikitext = page
        .pointer("/revisions/0/slots/main/*")
        .or_else(|| page.pointer("/revisions/0/*"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let categories = page
        .get("categories")
        .and_then(Value::as_array)
        .map(|cats| {
            cats.iter()
                .filter_map(|c| c.get("title").and_then(Value::as_str))
                .map(|c| c.trim_start_matches("Category:").to_string())
                .collect()
        })
        .unwrap_or_default();

    let canonical_url = page
        .get("canonicalurl")
        .or_else(|| page.get("fullurl"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let touched = page.get("touched").and_then(Value::as_str).map(String::from);
    let lastrevid = page.get("lastrevid").and_then(Value::as_i64);
    let resolved_title = page.get("title").and_then(Value::as_str).unwrap_or(title);

    Ok(CombinedPageData {
        title: resolved_title.to_string(),
        page_id,
        extract,
        raw_wikitext,
        categories,
        canonical_url,
        touched,
        lastrevid,
        page_exists: true,
    })
}

fn parse_parse_result(body: &Value, title: &str) -> Result<ParsedHtml> {
    if let Some(err) = body.get("error") {
        let info = err.get("info").and_then(Value::as_str).unwrap_or("unknown error");
        if info.to_lowercase().contains("missing") {
            return Err(WikiError::PageAbsent {
                title: title.to_string(),
            });
        }
        return Err(WikiError::Malformed(info.to_string()));
    }

    let html = body
        .pointer("/parse/text/*")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let display_title = body
        .pointer("/parse/displaytitle")
        .and_then(Value::as_str)
        .unwrap_or(title)
        .to_string();

    let sections = body
        .pointer("/parse/sections")
        .and_then(Value::as_array)
        .map(|secs| {
            secs.iter()
                .map(|s| WikiSection {
                    anchor: s.get("anchor").and_then(Value::as_str).unwrap_or_default().to_string(),
                    heading: s.get("line").and_then(Value::as_str).unwrap_or_default().to_string(),
                    level: s
                        .get("toclevel")
                        .and_then(Value::as_u64)
                        .unwrap_or(1)
                        .clamp(1, 4) as u8,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedHtml {
        html,
        sections,
        display_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_page_has_negative_id_and_exists_false() {
        let body = json!({
            "query": { "pages": { "-1": { "title": "Ghost Page", "missing": "" } } }
        });
        let parsed = parse_combined_page(&body, "Ghost Page").unwrap();
        assert_eq!(parsed.page_id, -1);
        assert!(!parsed.page_exists);
    }

    #[test]
    fn existing_page_extracts_fields() {
        let body = json!({
            "query": { "pages": { "123": {
                "pageid": 123,
                "title": "USS Stardancer",
                "extract": "A ship.",
                "touched": "2026-01-01T00:00:00Z",
                "lastrevid": 42,
                "canonicalurl": "https://wiki.example/USS_Stardancer",
                "categories": [ { "title": "Category:Starships" } ],
                "revisions": [ { "slots": { "main": { "*": "'''USS Stardancer'''" } } } ]
            }}}
        });
        let parsed = parse_combined_page(&body, "USS Stardancer").unwrap();
        assert_eq!(parsed.page_id, 123);
        assert!(parsed.page_exists);
        assert_eq!(parsed.categories, vec!["Starships".to_string()]);
        assert_eq!(parsed.raw_wikitext, "'''USS Stardancer'''");
    }
}
