use crate::model::tag::TagRef;
use crate::model::validator::validate_tag_names;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// which Rust types correspond to which sqlite column types:
// https://docs.rs/sqlx/latest/sqlx/sqlite/types/index.html
#[derive(Debug, Serialize, FromRow, Clone, PartialEq)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A post as returned by the API: the owning side of the post/tag relation,
/// so its tags are embedded in full.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Post {
    #[serde(flatten)]
    pub row: PostRow,

    pub tags: Vec<TagRef>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self { row, tags: vec![] }
    }
}

/// A post as seen from a tag. Carries no tags of its own, which keeps the
/// tag -> posts -> tags expansion from recursing.
#[derive(Debug, Serialize, FromRow, Clone, PartialEq)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct PostCreate {
    pub title: String,
    pub body: String,
    #[validate(custom(function = "validate_tag_names"))]
    pub tags: Vec<String>,
}

/// Full replacement of a post. `id` may be omitted; when given it has to
/// match the id in the path.
#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct PostUpdate {
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    #[validate(custom(function = "validate_tag_names"))]
    pub tags: Vec<String>,
}
