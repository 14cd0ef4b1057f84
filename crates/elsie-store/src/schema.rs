use sqlx::PgPool;

use crate::error::Result;

/// Creates `wiki_pages` and `page_metadata` if absent. Safe to call on every
/// startup.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wiki_pages (
            id               BIGSERIAL PRIMARY KEY,
            url              TEXT NOT NULL UNIQUE,
            title            TEXT NOT NULL,
            raw_content      TEXT NOT NULL,
            page_type        TEXT NOT NULL,
            ship_name        TEXT,
            log_date         DATE,
            categories       TEXT[] NOT NULL DEFAULT ARRAY['General Information'],
            content_hash     TEXT NOT NULL,
            lastrevid        BIGINT,
            touched          TEXT,
            content_accessed BIGINT NOT NULL DEFAULT 0,
            created_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at       TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_wiki_pages_page_type ON wiki_pages(page_type)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_wiki_pages_ship_name ON wiki_pages(ship_name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_wiki_pages_categories ON wiki_pages USING GIN(categories)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_wiki_pages_content_fts ON wiki_pages \
         USING GIN(to_tsvector('english', raw_content))",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_wiki_pages_title_fts ON wiki_pages \
         USING GIN(to_tsvector('english', title))",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page_metadata (
            url           TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            content_hash  TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'active',
            last_error    TEXT,
            last_crawled  TIMESTAMPTZ NOT NULL DEFAULT now(),
            last_modified TIMESTAMPTZ NOT NULL DEFAULT now(),
            crawl_count   BIGINT NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
