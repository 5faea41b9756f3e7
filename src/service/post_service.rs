use crate::errors::{ApiError, ApiResult};
use crate::model::post::{Post, PostCreate, PostRow, PostUpdate};
use crate::model::tag::{normalize_tag_names, Tag, TagRef};
use chrono::Utc;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::debug;
use validator::Validate;

impl Post {
    /// All posts with their tags, oldest first.
    pub async fn find_all(pool: &SqlitePool) -> ApiResult<Vec<Post>> {
        // posts and tags are read from the same snapshot
        let mut tx = pool.begin().await?;

        let mut posts = query_as::<_, PostRow>("SELECT * FROM BlogPost ORDER BY id")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(Post::from)
            .collect::<Vec<_>>();

        Self::attach_tags(&mut tx, &mut posts).await?;
        tx.commit().await?;

        Ok(posts)
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> ApiResult<Post> {
        let mut tx = pool.begin().await?;

        let row = Post::find_by_id(&mut tx, id).await?.ok_or_else(post_not_found)?;
        let mut posts = vec![Post::from(row)];

        Self::attach_tags(&mut tx, &mut posts).await?;
        tx.commit().await?;

        Ok(posts.remove(0))
    }

    async fn find_by_id(tx: &mut Transaction<'_, Sqlite>, id: i64) -> ApiResult<Option<PostRow>> {
        Ok(query_as::<_, PostRow>("SELECT * FROM BlogPost WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?)
    }

    pub async fn create(pool: &SqlitePool, post: &PostCreate) -> ApiResult<Post> {
        post.validate()?;

        let now = Utc::now().timestamp_millis();

        let mut tx = pool.begin().await?;

        let row = query_as::<_, PostRow>(
            r#"
            INSERT INTO BlogPost (title, body, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let tags = Post::replace_post_tag_assoc(&mut tx, row.id, &post.tags, true).await?;

        tx.commit().await?;

        debug!("Created post {} with {} tag(s)", row.id, tags.len());
        Ok(Post { row, tags })
    }

    /// Replaces title, body and the whole tag list of an existing post.
    pub async fn update(pool: &SqlitePool, id: i64, post: &PostUpdate) -> ApiResult<Post> {
        post.validate()?;

        let now = Utc::now().timestamp_millis();

        let mut tx = pool.begin().await?;

        let row = query_as::<_, PostRow>(
            r#"
            UPDATE BlogPost
            SET title = ?, body = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(post_not_found)?;

        let tags = Post::replace_post_tag_assoc(&mut tx, id, &post.tags, false).await?;

        tx.commit().await?;

        debug!("Updated post {}", id);
        Ok(Post { row, tags })
    }

    /// Removes a post and its tag associations. The tags themselves stay.
    pub async fn delete(pool: &SqlitePool, id: i64) -> ApiResult<()> {
        let mut tx = pool.begin().await?;

        query("DELETE FROM BlogPost_Tag WHERE blogpost_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = query("DELETE FROM BlogPost WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(post_not_found());
        }

        tx.commit().await?;

        debug!("Deleted post {}", id);
        Ok(())
    }

    async fn replace_post_tag_assoc(
        tx: &mut Transaction<'_, Sqlite>,
        post_id: i64,
        tag_names: &[String],
        is_new_post: bool,
    ) -> ApiResult<Vec<TagRef>> {
        if !is_new_post {
            query("DELETE FROM BlogPost_Tag WHERE blogpost_id = ?")
                .bind(post_id)
                .execute(&mut **tx)
                .await?;
        }

        let names = normalize_tag_names(tag_names);
        let mut tags = Vec::with_capacity(names.len());

        for (position, name) in names.iter().enumerate() {
            let tag = Tag::find_or_create(tx, name).await?;

            query(
                r#"
                INSERT INTO BlogPost_Tag (blogpost_id, tag_name, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(post_id)
            .bind(&tag.name)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;

            tags.push(TagRef::from(tag.name));
        }

        Ok(tags)
    }

    async fn attach_tags(tx: &mut Transaction<'_, Sqlite>, posts: &mut [Post]) -> ApiResult<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let post_ids: Vec<i64> = posts.iter().map(|post| post.row.id).collect();
        let post_ids = serde_json::to_string(&post_ids)?;

        let rows = query_as::<_, (i64, String)>(
            r#"
            SELECT blogpost_id, tag_name
            FROM BlogPost_Tag
            WHERE blogpost_id IN (SELECT value FROM json_each(?1))
            ORDER BY blogpost_id, position
            "#,
        )
        .bind(post_ids)
        .fetch_all(&mut **tx)
        .await?;

        let mut tags: HashMap<i64, Vec<TagRef>> = HashMap::new();
        for (post_id, tag_name) in rows {
            tags.entry(post_id).or_default().push(TagRef::from(tag_name));
        }

        for post in posts {
            post.tags = tags.remove(&post.row.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn post_not_found() -> ApiError {
    ApiError::NotFound("post not found".to_owned())
}
