use crate::error::{CorpusError, Result};
use crate::types::RawRow;
use serde::{Deserialize, Serialize};

/// Ingredient list with quantities stripped.
pub const INGREDIENTS_FIELD: &str = "วัตถุดิบ_ไม่มีปริมาณ";
/// Free-text "what I feel like eating" phrasing attached to each dish.
pub const CRAVING_QUERY_FIELD: &str = "query1 อยากกินอาหารครบ";
/// Dish name shown to users.
pub const DISH_NAME_FIELD: &str = "ชื่ออาหาร";
/// Dish category, display only.
pub const CATEGORY_FIELD: &str = "หมวดหมู่";

pub const DEFAULT_SEPARATOR: &str = " ";

/// Declares which source fields form a record's `search_text`, and in what order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTextPolicy {
    pub fields: Vec<String>,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl SearchTextPolicy {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let policy = Self {
            fields: fields.into_iter().map(Into::into).collect(),
            separator: default_separator(),
        };
        policy.validate()?;
        Ok(policy)
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Ingredients followed by the craving phrasing.
    #[must_use]
    pub fn thai_food() -> Self {
        Self {
            fields: vec![INGREDIENTS_FIELD.to_string(), CRAVING_QUERY_FIELD.to_string()],
            separator: default_separator(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(CorpusError::malformed(
                "search text policy must name at least one field",
            ));
        }
        if let Some(blank) = self.fields.iter().find(|f| f.trim().is_empty()) {
            return Err(CorpusError::malformed(format!(
                "search text policy contains a blank field name {blank:?}"
            )));
        }
        Ok(())
    }

    /// Joins the configured fields; missing fields contribute an empty string.
    #[must_use]
    pub fn build(&self, row: &RawRow) -> String {
        let parts: Vec<&str> = self
            .fields
            .iter()
            .map(|field| row.get(field).unwrap_or(""))
            .collect();
        let joined = parts.join(&self.separator);
        if parts.iter().all(|p| p.is_empty()) {
            String::new()
        } else {
            joined
        }
    }
}

impl Default for SearchTextPolicy {
    fn default() -> Self {
        Self::thai_food()
    }
}
