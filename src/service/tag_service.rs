use crate::errors::{not_found, ApiResult};
use crate::model::post::PostSummary;
use crate::model::tag::{normalize_tag_name, Tag, TagRow, TagWithPostCount};
use chrono::Utc;
use sqlx::{query_as, Sqlite, SqlitePool, Transaction};

impl Tag {
    /// Every tag with the number of posts referencing it, including unused tags.
    pub async fn get_all_with_post_count(pool: &SqlitePool) -> ApiResult<Vec<TagWithPostCount>> {
        let tags = query_as::<_, TagWithPostCount>(
            r#"
            SELECT t.name AS name, COUNT(bt.blogpost_id) AS post_count
            FROM Tag t
            LEFT JOIN BlogPost_Tag bt ON bt.tag_name = t.name
            GROUP BY t.name
            ORDER BY t.name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }

    /// Looks a tag up by name and collects the posts currently referencing it.
    pub async fn find_with_posts(pool: &SqlitePool, name: &str) -> ApiResult<Tag> {
        let name = normalize_tag_name(name);
        let mut tx = pool.begin().await?;

        let tag = query_as::<_, TagRow>("SELECT * FROM Tag WHERE name = ?")
            .bind(&name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(&format!("tag '{}' not found", name)))?;

        let posts = query_as::<_, PostSummary>(
            r#"
            SELECT p.id, p.title, p.body
            FROM BlogPost p
            INNER JOIN BlogPost_Tag bt ON bt.blogpost_id = p.id
            WHERE bt.tag_name = ?
            ORDER BY p.id
            "#,
        )
        .bind(&tag.name)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Tag {
            name: tag.name,
            posts,
        })
    }

    /// Returns the tag called `name`, creating it first if needed.
    /// `name` must already be normalized.
    ///
    /// A single upsert statement, so two writers racing on the same new name
    /// still end up sharing one row.
    pub async fn find_or_create(tx: &mut Transaction<'_, Sqlite>, name: &str) -> ApiResult<TagRow> {
        let now = Utc::now().timestamp_millis();

        let tag = query_as::<_, TagRow>(
            r#"
            INSERT INTO Tag (name, created_at)
            VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET created_at = Tag.created_at
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        Ok(tag)
    }
}
