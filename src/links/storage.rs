use crate::db::Db;
use crate::error::{Result, WikibaconError};
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

/// One cached page: its outbound article links and its categories, kept
/// apart so either traversal mode can be served from the same row.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Title the record was requested under (primary key).
    pub title: String,
    /// Title the encyclopedia resolved it to.
    pub canonical_title: String,
    pub links: Vec<String>,
    pub categories: Vec<String>,
}

/// Load the cached record for `title`, if any
pub async fn load_record(db: &Db, title: &str) -> Result<Option<CacheRecord>> {
    let title = title.to_string();

    db.with_connection(move |conn| {
        let row = conn
            .query_row(
                "SELECT title, canonical_title, links_json, categories_json \
                 FROM page_links WHERE title = ?1",
                params![title],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, canonical_title, links_json, categories_json)) = row else {
            return Ok(None);
        };

        Ok(Some(CacheRecord {
            title,
            canonical_title,
            links: serde_json::from_str(&links_json)?,
            categories: serde_json::from_str(&categories_json)?,
        }))
    })
    .await
}

/// Insert or overwrite the record for `record.title` (last write wins)
pub async fn store_record(db: &Db, record: &CacheRecord) -> Result<()> {
    let links_json = serde_json::to_string(&record.links)?;
    let categories_json = serde_json::to_string(&record.categories)?;
    let title = record.title.clone();
    let canonical_title = record.canonical_title.clone();
    let fetched_at = Utc::now().to_rfc3339();

    db.with_connection(move |conn| {
        conn.execute(
            r#"
            INSERT INTO page_links (title, canonical_title, links_json, categories_json, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(title) DO UPDATE SET
                canonical_title = excluded.canonical_title,
                links_json = excluded.links_json,
                categories_json = excluded.categories_json,
                fetched_at = excluded.fetched_at
            "#,
            params![title, canonical_title, links_json, categories_json, fetched_at],
        )?;
        Ok::<(), WikibaconError>(())
    })
    .await
}

/// Number of cached pages
pub async fn count_records(db: &Db) -> Result<usize> {
    db.with_connection(|conn| {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM page_links", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    async fn setup_db() -> (Db, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("cache.db"));
        db.migrate(&Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
            .await
            .unwrap();
        (db, temp_dir)
    }

    fn record(links: &[&str]) -> CacheRecord {
        CacheRecord {
            title: "Dog".to_string(),
            canonical_title: "Dog".to_string(),
            links: links.iter().map(|s| s.to_string()).collect(),
            categories: vec!["Category:Mammals".to_string()],
        }
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let (db, _temp) = setup_db().await;
        store_record(&db, &record(&["Wolf", "Mammal"])).await.unwrap();

        let loaded = load_record(&db, "Dog").await.unwrap().unwrap();
        assert_eq!(loaded, record(&["Wolf", "Mammal"]));
        assert!(load_record(&db, "Cat").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let (db, _temp) = setup_db().await;
        store_record(&db, &record(&["Wolf"])).await.unwrap();
        store_record(&db, &record(&["Wolf", "Bark"])).await.unwrap();

        let loaded = load_record(&db, "Dog").await.unwrap().unwrap();
        assert_eq!(loaded.links, vec!["Wolf".to_string(), "Bark".to_string()]);
        assert_eq!(count_records(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_json_is_an_error() {
        let (db, _temp) = setup_db().await;
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO page_links VALUES ('Dog', 'Dog', 'not json', '[]', '2026-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let err = load_record(&db, "Dog").await.unwrap_err();
        assert!(matches!(err, WikibaconError::Serialization(_)));
    }
}
