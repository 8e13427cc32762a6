pub mod activity_log;
pub mod announcement;
pub mod payment;
pub mod student;

pub use activity_log::*;
pub use announcement::*;
pub use payment::*;
pub use student::*;

use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

/// Sort direction shared by every listing query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Pagination envelope returned by announcement and activity-log listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            current_page: page,
            total_pages: (total + limit - 1) / limit.max(1),
            total_items: total,
            items_per_page: limit,
        }
    }
}

/// Browsers send omitted filters as empty strings (`?category=`); treat those
/// the same as an absent parameter instead of failing deserialization.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => {
            let string_de: de::value::StrDeserializer<'_, de::value::Error> =
                s.into_deserializer();
            T::deserialize(string_de).map(Some).map_err(de::Error::custom)
        }
    }
}

/// Like [`empty_string_as_none`] but for booleans, which serde cannot
/// re-parse from a bare string.
pub(crate) fn optional_bool_param<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(de::Error::custom(format!("invalid boolean: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_rounds_up() {
        let meta = PageMeta::new(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 25);

        let exact = PageMeta::new(2, 10, 20);
        assert_eq!(exact.total_pages, 2);
    }
}
