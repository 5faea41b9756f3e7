use crate::errors::{bad_request, ApiResult};
use crate::model::post::{Post, PostCreate, PostUpdate};
use crate::model::tag::{Tag, TagWithPostCount};
use crate::util::extractor::{Json, Path, ValidatedJson};
use crate::util::fp::Pipe;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_posts).post(create_post))
        .route("/tags", get(get_tags))
        .route("/tag/{name}", get(get_tag))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
}

async fn get_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<Post>>> {
    Post::find_all(&state.db).await?.pipe(Json).pipe(Ok)
}

async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Post>> {
    let post = Post::find(&state.db, id).await?;
    Ok(Json(post))
}

async fn create_post(
    State(state): State<AppState>,
    ValidatedJson(post): ValidatedJson<PostCreate>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = Post::create(&state.db, &post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(post): ValidatedJson<PostUpdate>,
) -> ApiResult<Json<Post>> {
    if let Some(body_id) = post.id.filter(|body_id| *body_id != id) {
        return Err(bad_request(&format!(
            "id in body ({}) does not match id in path ({})",
            body_id, id
        )));
    }

    let post = Post::update(&state.db, id, &post).await?;
    Ok(Json(post))
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    Post::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_tag(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Tag>> {
    let tag = Tag::find_with_posts(&state.db, &name).await?;
    Ok(Json(tag))
}

async fn get_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<TagWithPostCount>>> {
    Tag::get_all_with_post_count(&state.db).await?.pipe(Json).pipe(Ok)
}
