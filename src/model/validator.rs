use crate::model::tag::{normalize_tag_name, MAX_TAG_NAME_LEN};
use std::borrow::Cow;
use validator::ValidationError;

/// Validate tag names: non-blank, at most `MAX_TAG_NAME_LEN` chars, no '/'.
/// Checks apply to the stored form, since lowercasing can lengthen a name.
pub fn validate_tag_names(names: &[String]) -> Result<(), ValidationError> {
    for name in names {
        let name = normalize_tag_name(name);

        let reason = if name.is_empty() {
            "can not be empty"
        } else if name.chars().count() > MAX_TAG_NAME_LEN {
            "can not be longer than 64 characters"
        } else if name.contains('/') {
            "can not contain '/'"
        } else {
            continue;
        };

        let mut error = ValidationError::new("invalid_tag");
        error.message = Some(Cow::from(reason));
        error.add_param(Cow::from("value"), &name);
        return Err(error);
    }
    Ok(())
}
