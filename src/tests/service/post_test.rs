#[cfg(test)]
mod tests {
    use crate::tests::common::{remove_file_db, setup_db, setup_file_db};
    use quill::config::db::DB;
    use quill::errors::ApiError;
    use quill::model::post::{Post, PostCreate, PostUpdate};
    use quill::model::tag::{Tag, MAX_TAG_NAME_LEN};
    use std::collections::HashSet;

    fn new_post(title: &str, body: &str, tags: &[&str]) -> PostCreate {
        PostCreate {
            title: title.to_string(),
            body: body.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn replacement(title: &str, body: &str, tags: &[&str]) -> PostUpdate {
        PostUpdate {
            id: None,
            title: title.to_string(),
            body: body.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn tag_names(post: &Post) -> Vec<&str> {
        post.tags.iter().map(|t| t.name.as_str()).collect()
    }

    async fn tag_count(db: &DB, name: &str) -> usize {
        Tag::get_all_with_post_count(db)
            .await
            .unwrap()
            .iter()
            .filter(|t| t.name == name)
            .count()
    }

    #[tokio::test]
    async fn test_create_and_list_round_trip() {
        let db = setup_db().await;

        let created = Post::create(&db, &new_post("T", "B", &["x"])).await.unwrap();
        assert!(created.row.id > 0);
        assert_eq!(created.row.created_at, created.row.updated_at);

        let posts = Post::find_all(&db).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].row.title, "T");
        assert_eq!(posts[0].row.body, "B");
        assert_eq!(tag_names(&posts[0]), vec!["x"]);
        assert_eq!(posts[0], created);
    }

    #[tokio::test]
    async fn test_shared_tag_is_stored_once() {
        let db = setup_db().await;

        let first = Post::create(&db, &new_post("one", "", &["a", "b"])).await.unwrap();
        let second = Post::create(&db, &new_post("two", "", &["b", "c"])).await.unwrap();

        let tags = Tag::get_all_with_post_count(&db).await.unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(tag_count(&db, "b").await, 1);

        let b = Tag::find_with_posts(&db, "b").await.unwrap();
        let ids: Vec<_> = b.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.row.id, second.row.id]);
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_never_reused() {
        let db = setup_db().await;

        let mut ids = HashSet::new();
        for i in 0..5 {
            let post = Post::create(&db, &new_post(&format!("post {i}"), "", &[])).await.unwrap();
            assert!(ids.insert(post.row.id));
        }

        let last = *ids.iter().max().unwrap();
        Post::delete(&db, last).await.unwrap();

        let next = Post::create(&db, &new_post("after delete", "", &[])).await.unwrap();
        assert!(!ids.contains(&next.row.id));
    }

    #[tokio::test]
    async fn test_tags_are_normalized_and_deduplicated() {
        let db = setup_db().await;

        let post = Post::create(&db, &new_post("t", "b", &[" Rust ", "web", "RUST", "Async"]))
            .await
            .unwrap();
        assert_eq!(tag_names(&post), vec!["rust", "web", "async"]);

        let other = Post::create(&db, &new_post("t2", "b2", &["rust"])).await.unwrap();
        assert_eq!(tag_names(&other), vec!["rust"]);
        assert_eq!(tag_count(&db, "rust").await, 1);
    }

    #[tokio::test]
    async fn test_tag_order_is_preserved() {
        let db = setup_db().await;

        let post = Post::create(&db, &new_post("t", "b", &["zeta", "alpha", "mu"])).await.unwrap();
        let fetched = Post::find(&db, post.row.id).await.unwrap();
        assert_eq!(tag_names(&fetched), vec!["zeta", "alpha", "mu"]);
    }

    #[tokio::test]
    async fn test_create_with_defaults() {
        let db = setup_db().await;

        let post = Post::create(&db, &PostCreate::default()).await.unwrap();
        assert_eq!(post.row.title, "");
        assert_eq!(post.row.body, "");
        assert!(post.tags.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_tag_names() {
        let db = setup_db().await;

        let dotted = "\u{130}".repeat(MAX_TAG_NAME_LEN);
        for tags in [vec![" "], vec!["a/b"], vec![dotted.as_str()]] {
            let err = Post::create(&db, &new_post("t", "b", &tags)).await.unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(_)));
        }

        assert!(Post::find_all(&db).await.unwrap().is_empty());
        assert!(Tag::get_all_with_post_count(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_tag_names_fit_the_limit() {
        let db = setup_db().await;

        let dotted = "\u{130}".repeat(MAX_TAG_NAME_LEN / 2);
        let post = Post::create(&db, &new_post("t", "b", &[dotted.as_str()])).await.unwrap();

        let stored = &post.tags[0].name;
        assert_eq!(stored.chars().count(), MAX_TAG_NAME_LEN);
        assert_eq!(Tag::find_with_posts(&db, stored).await.unwrap().posts.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_everything() {
        let db = setup_db().await;

        let post = Post::create(&db, &new_post("old", "old body", &["a", "b"])).await.unwrap();
        let updated = Post::update(&db, post.row.id, &replacement("new", "new body", &["b", "c"]))
            .await
            .unwrap();

        assert_eq!(updated.row.id, post.row.id);
        assert_eq!(updated.row.title, "new");
        assert_eq!(updated.row.body, "new body");
        assert_eq!(updated.row.created_at, post.row.created_at);
        assert!(updated.row.updated_at >= post.row.updated_at);
        assert_eq!(tag_names(&updated), vec!["b", "c"]);

        assert_eq!(Post::find(&db, post.row.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_drops_association_but_keeps_shared_tag() {
        let db = setup_db().await;

        let first = Post::create(&db, &new_post("one", "", &["shared", "x"])).await.unwrap();
        let second = Post::create(&db, &new_post("two", "", &["shared"])).await.unwrap();

        Post::update(&db, first.row.id, &replacement("one", "", &["x"])).await.unwrap();

        let shared = Tag::find_with_posts(&db, "shared").await.unwrap();
        let ids: Vec<_> = shared.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.row.id]);
    }

    #[tokio::test]
    async fn test_update_keeps_unreferenced_tag() {
        let db = setup_db().await;

        let post = Post::create(&db, &new_post("one", "", &["lonely"])).await.unwrap();
        Post::update(&db, post.row.id, &replacement("one", "", &[])).await.unwrap();

        let lonely = Tag::find_with_posts(&db, "lonely").await.unwrap();
        assert!(lonely.posts.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_post() {
        let db = setup_db().await;

        let err = Post::update(&db, 42, &replacement("t", "b", &["new-tag"])).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // nothing was written, the tag included
        let err = Tag::find_with_posts(&db, "new-tag").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_post_but_not_tags() {
        let db = setup_db().await;

        let gone = Post::create(&db, &new_post("gone", "", &["a", "b"])).await.unwrap();
        let kept = Post::create(&db, &new_post("kept", "", &["b"])).await.unwrap();

        Post::delete(&db, gone.row.id).await.unwrap();

        let posts = Post::find_all(&db).await.unwrap();
        assert_eq!(posts, vec![kept.clone()]);

        let a = Tag::find_with_posts(&db, "a").await.unwrap();
        assert!(a.posts.is_empty());

        let b = Tag::find_with_posts(&db, "b").await.unwrap();
        let ids: Vec<_> = b.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![kept.row.id]);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let db = setup_db().await;

        let post = Post::create(&db, &new_post("t", "b", &[])).await.unwrap();
        Post::delete(&db, post.row.id).await.unwrap();

        let err = Post::delete(&db, post.row.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = Post::find(&db, post.row.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_never_mix_old_and_new_versions() {
        let (db, path) = setup_file_db("quill-snapshot", 4).await;

        let post = Post::create(&db, &new_post("v0", "", &["v0"])).await.unwrap();
        let id = post.row.id;

        let writer = {
            let db = db.clone();
            tokio::spawn(async move {
                for i in 1..=50 {
                    let version = format!("v{i}");
                    let update = replacement(&version, "", &[version.as_str()]);
                    Post::update(&db, id, &update).await.unwrap();
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..3 {
            let db = db.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let one = Post::find(&db, id).await.unwrap();
                    assert_eq!(tag_names(&one), vec![one.row.title.as_str()]);

                    for post in Post::find_all(&db).await.unwrap() {
                        assert_eq!(tag_names(&post), vec![post.row.title.as_str()]);
                    }
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }

        remove_file_db(db, path).await;
    }

    #[tokio::test]
    async fn test_find_all_empty() {
        let db = setup_db().await;
        assert!(Post::find_all(&db).await.unwrap().is_empty());
    }
}
