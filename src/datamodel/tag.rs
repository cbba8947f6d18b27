use super::TagId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const TAG_NAME_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

impl Tag {
    pub fn new(id: TagId, name: String) -> Self {
        Tag { id, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewTag {
    pub name: String,
}

pub fn validate_tag_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if name.chars().count() > TAG_NAME_MAX_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            TAG_NAME_MAX_LENGTH
        ));
    }
    Ok(())
}
