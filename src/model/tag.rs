use crate::model::post::PostSummary;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MAX_TAG_NAME_LEN: usize = 64;

#[derive(Debug, Serialize, FromRow, Clone, PartialEq)]
pub struct TagRow {
    pub name: String,
    pub created_at: i64,
}

/// A tag as embedded in a post.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
}

impl From<String> for TagRef {
    fn from(name: String) -> Self {
        Self { name }
    }
}

/// A tag together with the posts currently referencing it.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Serialize, FromRow, Clone, PartialEq)]
pub struct TagWithPostCount {
    pub name: String,
    pub post_count: i64,
}

/// Canonical form of a tag name, used as its identity: trimmed and lowercased.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalizes every name and drops repeats, keeping the first occurrence.
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let name = normalize_tag_name(name.as_ref());
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
