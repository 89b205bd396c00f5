use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub pixel_data: Option<Map<String, Value>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tags: Vec<String>,
    pub is_public: bool,
    #[serde(serialize_with = "super::rfc3339")]
    pub created_at: i64,
    #[serde(serialize_with = "super::rfc3339")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreate {
    pub title: String,
    pub description: Option<String>,
    pub pixel_data: Option<Map<String, Value>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update. For the nullable columns the outer `Option` is "field present" and the
/// inner one is the new value, so `"description": null` clears while omitting it keeps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub pixel_data: Option<Option<Map<String, Value>>>,
    #[serde(default, deserialize_with = "present")]
    pub width: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub height: Option<Option<u32>>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_CANVAS_DIMENSION: u32 = 1000;

fn validate_title(title: &str) -> Result<(), String> {
    let len = title.chars().count();
    if !(1..=MAX_TITLE_LEN).contains(&len) {
        return Err(format!(
            "Title must be between 1 and {MAX_TITLE_LEN} characters"
        ));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), String> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )),
        _ => Ok(()),
    }
}

fn validate_dimension(name: &str, value: Option<u32>) -> Result<(), String> {
    match value {
        Some(v) if !(1..=MAX_CANVAS_DIMENSION).contains(&v) => Err(format!(
            "{name} must be between 1 and {MAX_CANVAS_DIMENSION}"
        )),
        _ => Ok(()),
    }
}

impl ProjectCreate {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        validate_dimension("width", self.width)?;
        validate_dimension("height", self.height)
    }
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_description(self.description.as_ref().and_then(Option::as_deref))?;
        validate_dimension("width", self.width.flatten())?;
        validate_dimension("height", self.height.flatten())
    }

    /// Apply the fields that were provided onto `project`.
    pub fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(pixel_data) = self.pixel_data {
            project.pixel_data = pixel_data;
        }
        if let Some(width) = self.width {
            project.width = width;
        }
        if let Some(height) = self.height {
            project.height = height;
        }
        if let Some(tags) = self.tags {
            project.tags = tags;
        }
        if let Some(is_public) = self.is_public {
            project.is_public = is_public;
        }
    }
}

/// `skip`/`limit` query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Page {
    pub fn validate(&self) -> Result<(), String> {
        if self.skip < 0 {
            return Err("skip must be greater than or equal to 0".to_string());
        }
        if !(1..=100).contains(&self.limit) {
            return Err("limit must be between 1 and 100".to_string());
        }
        Ok(())
    }
}
