use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Utc};
use elsie_category::fleet::{fleet_ship_names, is_fleet_ship};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::chunk::chunk_content;
use crate::error::Result;
use crate::hash::content_hash;
use crate::types::{LogSelection, NewPage, PageStatus, SearchFilter, WikiPageRow};

/// Regex-free, ordered title patterns used by `cleanup_mission_log_ship_names`:
/// the first fleet ship name that appears as a substring of the title wins.
/// Mirrors the crawler's own title→ship inference so cleanup never disagrees
/// with how new pages get classified.
fn infer_ship_from_title(title: &str) -> Option<String> {
    let lower = title.to_lowercase();
    fleet_ship_names().into_iter().find(|ship| lower.contains(&ship.to_lowercase()))
}

/// Title/content patterns that mark a row as crawler seed or example data
/// rather than a real wiki page.
const SEED_TITLE_PATTERNS: &[&str] = &["test page", "example page", "sandbox", "lorem ipsum"];

pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        let store = Self { pool };
        crate::schema::migrate(&store.pool).await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Classify, chunk and upsert a page. Returns the ids of every persisted
    /// part (more than one when the content was split).
    pub async fn upsert_page(&self, page: NewPage, max_chunk_chars: usize) -> Result<Vec<i64>> {
        let chunks = chunk_content(&page.raw_content, max_chunk_chars);
        let total = chunks.len();
        let mut ids = Vec::with_capacity(total);

        let mut tx = self.pool.begin().await?;
        for (idx, chunk) in chunks.into_iter().enumerate() {
            let (title, url) = if total > 1 {
                (
                    format!("{} (Part {}/{})", page.title, idx + 1, total),
                    format!("{}#part={}", page.url, idx + 1),
                )
            } else {
                (page.title.clone(), page.url.clone())
            };

            let categories = if page.categories.is_empty() {
                vec![elsie_category::GENERAL_INFORMATION.to_string()]
            } else {
                page.categories.clone()
            };
            let hash = content_hash(&chunk);

            let row: (i64,) = sqlx::query_as(
                r#"
                INSERT INTO wiki_pages
                    (url, title, raw_content, page_type, ship_name, log_date,
                     categories, content_hash, lastrevid, touched, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
                ON CONFLICT (url) DO UPDATE SET
                    title = EXCLUDED.title,
                    raw_content = EXCLUDED.raw_content,
                    page_type = EXCLUDED.page_type,
                    ship_name = EXCLUDED.ship_name,
                    log_date = EXCLUDED.log_date,
                    categories = EXCLUDED.categories,
                    content_hash = EXCLUDED.content_hash,
                    lastrevid = EXCLUDED.lastrevid,
                    touched = EXCLUDED.touched,
                    updated_at = now()
                RETURNING id
                "#,
            )
            .bind(&url)
            .bind(&title)
            .bind(&chunk)
            .bind(page.page_type.as_str())
            .bind(&page.ship_name)
            .bind(page.log_date)
            .bind(&categories)
            .bind(&hash)
            .bind(page.lastrevid)
            .bind(&page.touched)
            .fetch_one(&mut *tx)
            .await?;

            ids.push(row.0);
        }
        tx.commit().await?;

        info!(title = %page.title, parts = total, "upserted page");
        Ok(ids)
    }

    pub async fn upsert_metadata(
        &self,
        url: &str,
        title: &str,
        content_hash: &str,
        status: PageStatus,
        last_error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO page_metadata (url, title, content_hash, status, last_error, last_crawled, last_modified, crawl_count)
            VALUES ($1, $2, $3, $4, $5, now(), now(), 1)
            ON CONFLICT (url) DO UPDATE SET
                title = EXCLUDED.title,
                content_hash = EXCLUDED.content_hash,
                status = EXCLUDED.status,
                last_error = EXCLUDED.last_error,
                last_crawled = now(),
                last_modified = now(),
                crawl_count = page_metadata.crawl_count + 1
            "#,
        )
        .bind(url)
        .bind(title)
        .bind(content_hash)
        .bind(status.as_str())
        .bind(last_error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The `touched` timestamp last stored for `title`, if any. Lets an
    /// incremental crawl skip a whole page fetch when the remote reports the
    /// same value.
    pub async fn get_touched(&self, title: &str) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT touched FROM wiki_pages WHERE title = $1")
                .bind(title)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(touched,)| touched))
    }

    /// The content hash last recorded in `page_metadata` for `title`, if a
    /// row exists at all.
    pub async fn existing_hash(&self, title: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT content_hash FROM page_metadata WHERE title = $1")
                .bind(title)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(hash,)| hash))
    }

    /// True when there is no prior metadata for `title`, or the stored hash
    /// differs from `new_hash`.
    pub async fn should_update(&self, title: &str, new_hash: &str) -> Result<bool> {
        Ok(match self.existing_hash(title).await? {
            Some(hash) => hash != new_hash,
            None => true,
        })
    }

    /// Layered search: direct ship match, category+title FTS, title FTS,
    /// content FTS, then a LIKE fallback — merged in that order, deduped by
    /// id, ranked, and capped at `filter.limit`.
    pub async fn search_pages(&self, query: &str, filter: SearchFilter) -> Result<Vec<WikiPageRow>> {
        let limit = filter.limit.max(1);
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        if let Some(ship) = fleet_ship_names().into_iter().find(|s| is_fleet_ship(s) && query.to_lowercase().contains(&s.to_lowercase())) {
            let rows = self.search_by_ship_name(&ship, &filter, limit).await?;
            merge(&mut results, &mut seen, rows);
        }

        if !filter.categories.is_empty() && results.len() < limit as usize {
            let rows = self.search_categories_and_title(query, &filter.categories, limit).await?;
            merge(&mut results, &mut seen, rows);
        }

        if results.len() < limit as usize {
            let rows = self.search_title_fts(query, &filter, limit).await?;
            merge(&mut results, &mut seen, rows);
        }

        if results.len() < limit as usize {
            let rows = self.search_content_fts(query, &filter, limit).await?;
            merge(&mut results, &mut seen, rows);
        }

        if results.len() < limit as usize {
            let rows = self.search_like_fallback(query, &filter, limit).await?;
            merge(&mut results, &mut seen, rows);
        }

        results.truncate(limit as usize);

        if !results.is_empty() {
            let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
            if let Err(e) = self.bump_access_count(&ids).await {
                warn!(error = %e, "failed to bump access counts");
            }
        }

        Ok(results)
    }

    async fn search_by_ship_name(&self, ship: &str, filter: &SearchFilter, limit: i64) -> Result<Vec<WikiPageRow>> {
        let page_type = filter.page_type.map(|pt| pt.as_str());
        sqlx::query_as::<_, WikiPageRow>(
            r#"
            SELECT * FROM wiki_pages
            WHERE ship_name ILIKE $1
              AND ($2::text IS NULL OR page_type = $2)
              AND (NOT $3 OR page_type = 'mission_log')
            ORDER BY log_date DESC NULLS LAST
            LIMIT $4
            "#,
        )
        .bind(ship)
        .bind(page_type)
        .bind(filter.force_mission_logs_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn search_categories_and_title(
        &self,
        query: &str,
        categories: &[String],
        limit: i64,
    ) -> Result<Vec<WikiPageRow>> {
        sqlx::query_as::<_, WikiPageRow>(
            r#"
            SELECT *, ts_rank(to_tsvector('english', title), plainto_tsquery('english', $1)) AS rank
            FROM wiki_pages
            WHERE categories && $2
              AND to_tsvector('english', title) @@ plainto_tsquery('english', $1)
            ORDER BY rank DESC, log_date DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(categories)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn search_title_fts(&self, query: &str, filter: &SearchFilter, limit: i64) -> Result<Vec<WikiPageRow>> {
        let page_type = filter.page_type.map(|pt| pt.as_str());
        sqlx::query_as::<_, WikiPageRow>(
            r#"
            SELECT *, ts_rank(to_tsvector('english', title), plainto_tsquery('english', $1)) AS rank
            FROM wiki_pages
            WHERE to_tsvector('english', title) @@ plainto_tsquery('english', $1)
              AND ($2::text IS NULL OR page_type = $2)
            ORDER BY rank DESC, log_date DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(page_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn search_content_fts(&self, query: &str, filter: &SearchFilter, limit: i64) -> Result<Vec<WikiPageRow>> {
        let page_type = filter.page_type.map(|pt| pt.as_str());
        sqlx::query_as::<_, WikiPageRow>(
            r#"
            SELECT *, ts_rank(to_tsvector('english', raw_content), plainto_tsquery('english', $1)) AS rank
            FROM wiki_pages
            WHERE to_tsvector('english', raw_content) @@ plainto_tsquery('english', $1)
              AND ($2::text IS NULL OR page_type = $2)
            ORDER BY rank DESC, log_date DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(page_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn search_like_fallback(&self, query: &str, filter: &SearchFilter, limit: i64) -> Result<Vec<WikiPageRow>> {
        let like = format!("%{query}%");
        let page_type = filter.page_type.map(|pt| pt.as_str());
        sqlx::query_as::<_, WikiPageRow>(
            r#"
            SELECT * FROM wiki_pages
            WHERE (title ILIKE $1 OR raw_content ILIKE $1)
              AND ($2::text IS NULL OR page_type = $2)
            ORDER BY log_date DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(&like)
        .bind(page_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn get_recent_logs(&self, ship: Option<&str>, limit: i64) -> Result<Vec<WikiPageRow>> {
        let rows = match ship {
            Some(ship) => {
                sqlx::query_as::<_, WikiPageRow>(
                    "SELECT * FROM wiki_pages WHERE page_type = 'mission_log' AND ship_name ILIKE $1 \
                     ORDER BY log_date DESC NULLS LAST LIMIT $2",
                )
                .bind(ship)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WikiPageRow>(
                    "SELECT * FROM wiki_pages WHERE page_type = 'mission_log' \
                     ORDER BY log_date DESC NULLS LAST LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn get_selected_logs(
        &self,
        selection: LogSelection,
        ship: Option<&str>,
        limit: i64,
    ) -> Result<Vec<WikiPageRow>> {
        let today = Utc::now().date_naive();
        let (predicate, order, bind_date): (&str, &str, Option<(NaiveDate, NaiveDate)>) = match selection {
            LogSelection::Latest => ("TRUE", "log_date DESC NULLS LAST", None),
            LogSelection::Earliest => ("TRUE", "log_date ASC NULLS LAST", None),
            LogSelection::Random => ("TRUE", "RANDOM()", None),
            LogSelection::Today => ("log_date = $3", "log_date DESC", Some((today, today))),
            LogSelection::Yesterday => {
                let d = today - chrono::Duration::days(1);
                ("log_date = $3", "log_date DESC", Some((d, d)))
            }
            LogSelection::ThisWeek => {
                let start = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
                ("log_date BETWEEN $3 AND $4", "log_date DESC", Some((start, today)))
            }
            LogSelection::LastWeek => {
                let this_week_start = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
                let start = this_week_start - chrono::Duration::days(7);
                let end = this_week_start - chrono::Duration::days(1);
                ("log_date BETWEEN $3 AND $4", "log_date DESC", Some((start, end)))
            }
        };

        let sql = format!(
            "SELECT * FROM wiki_pages WHERE page_type = 'mission_log' AND ($1::text IS NULL OR ship_name ILIKE $1) \
             AND ({predicate}) ORDER BY {order} LIMIT $2"
        );

        let rows = match bind_date {
            Some((a, b)) => {
                sqlx::query_as::<_, WikiPageRow>(&sql)
                    .bind(ship)
                    .bind(limit)
                    .bind(a)
                    .bind(b)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, WikiPageRow>(&sql)
                    .bind(ship)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    /// Idempotent: assigns `ship_name` to mission-log rows missing one, by
    /// matching the first fleet ship name that appears in the title.
    pub async fn cleanup_mission_log_ship_names(&self) -> Result<u64> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, title FROM wiki_pages WHERE page_type = 'mission_log' AND ship_name IS NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut updated = 0u64;
        for (id, title) in rows {
            if let Some(ship) = infer_ship_from_title(&title) {
                sqlx::query("UPDATE wiki_pages SET ship_name = $1, updated_at = now() WHERE id = $2")
                    .bind(&ship)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Deletes rows that look like crawler seed/example data: a title
    /// matching a known seed pattern, or trivially short general content.
    pub async fn cleanup_seed_data(&self) -> Result<u64> {
        let mut deleted = 0u64;
        for pattern in SEED_TITLE_PATTERNS {
            let like = format!("%{pattern}%");
            let result = sqlx::query("DELETE FROM wiki_pages WHERE title ILIKE $1")
                .bind(&like)
                .execute(&self.pool)
                .await?;
            deleted += result.rows_affected();
        }

        let result = sqlx::query(
            "DELETE FROM wiki_pages WHERE length(raw_content) < 50 AND categories = ARRAY[$1::text]",
        )
        .bind(elsie_category::GENERAL_INFORMATION)
        .execute(&self.pool)
        .await?;
        deleted += result.rows_affected();

        Ok(deleted)
    }

    async fn bump_access_count(&self, ids: &[i64]) -> Result<()> {
        sqlx::query("UPDATE wiki_pages SET content_accessed = content_accessed + 1 WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn merge(results: &mut Vec<WikiPageRow>, seen: &mut HashSet<i64>, rows: Vec<WikiPageRow>) {
    for row in rows {
        if seen.insert(row.id) {
            results.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_ship_from_title_substring() {
        assert_eq!(infer_ship_from_title("USS Stardancer Mission Log 2026/1/1"), Some("Stardancer".to_string()));
        assert_eq!(infer_ship_from_title("General Federation History"), None);
    }
}
