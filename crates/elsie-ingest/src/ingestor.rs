//! Orchestrates the wiki client, content processor and store into a single
//! crawl: fetch titles, detect whether each one changed, process and upsert
//! the ones that did.

use std::time::Duration;

use elsie_category::page_type::classify_from_categories;
use elsie_category::PageType;
use elsie_store::{content_hash, NewPage, PageStatus, Store};
use elsie_wiki::WikiClient;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::mode::{IncrementalMode, Scope, CURATED_TITLES};
use crate::report::IngestReport;

/// Startup retry budget for an unreachable store, per the runtime contract:
/// ~30 attempts, 2 seconds apart, before giving up entirely.
const STORE_RETRY_ATTEMPTS: u32 = 30;
const STORE_RETRY_SPACING: Duration = Duration::from_secs(2);

pub struct Ingestor {
    wiki: WikiClient,
    store: Store,
    max_chunk_chars: usize,
    delay: Duration,
}

impl Ingestor {
    pub fn new(wiki: WikiClient, store: Store, max_chunk_chars: usize, delay_ms: u64) -> Self {
        Self {
            wiki,
            store,
            max_chunk_chars,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Connects to the store with the startup retry contract: on failure,
    /// retries `STORE_RETRY_ATTEMPTS` times, `STORE_RETRY_SPACING` apart,
    /// before surfacing `StoreUnavailable`.
    pub async fn connect_store(database_url: &str) -> Result<Store> {
        let mut last_err = None;
        for attempt in 1..=STORE_RETRY_ATTEMPTS {
            match Store::connect(database_url).await {
                Ok(store) => return Ok(store),
                Err(e) => {
                    warn!(attempt, error = %e, "store unreachable, retrying");
                    last_err = Some(e);
                    if attempt < STORE_RETRY_ATTEMPTS {
                        tokio::time::sleep(STORE_RETRY_SPACING).await;
                    }
                }
            }
        }
        error!(error = ?last_err, "store still unreachable after retry budget");
        Err(crate::error::IngestError::StoreUnavailable {
            attempts: STORE_RETRY_ATTEMPTS,
        })
    }

    /// Resolves a scope into the concrete list of titles to process.
    pub async fn resolve_titles(&self, scope: &Scope, limit: Option<usize>) -> Result<Vec<String>> {
        let mut titles = match scope {
            Scope::Single(title) => vec![title.clone()],
            Scope::Curated => CURATED_TITLES.iter().map(|s| s.to_string()).collect(),
            Scope::Comprehensive => self.wiki.all_page_titles().await?,
        };
        if let Some(limit) = limit {
            titles.truncate(limit);
        }
        Ok(titles)
    }

    /// Runs the crawl over `titles` under the given incremental mode and
    /// force flag, returning aggregate counts. Never aborts on a single
    /// page's failure — each title's errors land in `page_metadata` and the
    /// run continues.
    pub async fn run(&self, titles: &[String], mode: IncrementalMode, force: bool) -> IngestReport {
        let mut report = IngestReport::default();

        for title in titles {
            report.checked += 1;
            match self.process_title(title, mode, force).await {
                Ok(Outcome::New) => report.new += 1,
                Ok(Outcome::Updated) => report.updated += 1,
                Ok(Outcome::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    warn!(%title, error = %e, "failed to ingest page");
                    report.failed += 1;
                    if let Err(store_err) = self
                        .store
                        .upsert_metadata(title, title, "", PageStatus::Error, Some(&e.to_string()))
                        .await
                    {
                        error!(%title, error = %store_err, "failed to record error metadata");
                    }
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(%report, "ingest run complete");
        report
    }

    async fn process_title(&self, title: &str, mode: IncrementalMode, force: bool) -> Result<Outcome> {
        let page = self.wiki.combined_page_data(title).await?;
        if !page.page_exists {
            return Err(elsie_wiki::WikiError::PageAbsent { title: title.to_string() }.into());
        }

        if !force && mode != IncrementalMode::Test {
            if let Some(stored_touched) = self.store.get_touched(&page.title).await? {
                if Some(&stored_touched) == page.touched.as_ref() {
                    let hash = self.store.existing_hash(&page.title).await?.unwrap_or_default();
                    self.store
                        .upsert_metadata(&page.canonical_url, &page.title, &hash, PageStatus::Active, None)
                        .await?;
                    return Ok(Outcome::Unchanged);
                }
            }
        }

        let parsed_html = if classify_from_categories(&page.categories) == PageType::MissionLog {
            None
        } else {
            self.wiki.parsed_html(&page.title).await.ok()
        };

        let processed = elsie_content::process_page(&page, parsed_html.as_ref())?;
        let hash = content_hash(&processed.content);

        let existing_hash = self.store.existing_hash(&processed.title).await?;
        let needs_write = force || existing_hash.as_deref() != Some(hash.as_str());

        if mode == IncrementalMode::Check || mode == IncrementalMode::Test || !needs_write {
            if needs_write {
                return Ok(match existing_hash {
                    Some(_) => Outcome::Updated,
                    None => Outcome::New,
                });
            }
            return Ok(Outcome::Unchanged);
        }

        let log_date = if processed.page_type == PageType::MissionLog {
            crate::logdate::extract_log_date(&page.title)
        } else {
            None
        };

        let new_page = NewPage {
            title: processed.title.clone(),
            url: page.canonical_url.clone(),
            raw_content: processed.content,
            page_type: processed.page_type,
            ship_name: processed.ship,
            log_date,
            categories: processed.categories,
            lastrevid: page.lastrevid,
            touched: page.touched,
        };

        self.store.upsert_page(new_page, self.max_chunk_chars).await?;
        self.store
            .upsert_metadata(&page.canonical_url, &processed.title, &hash, PageStatus::Active, None)
            .await?;

        Ok(match existing_hash {
            Some(_) => Outcome::Updated,
            None => Outcome::New,
        })
    }
}

enum Outcome {
    New,
    Updated,
    Unchanged,
}
