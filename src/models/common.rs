// src/models/common.rs

use bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use utoipa::ToSchema;

use crate::error::AppError;

/// Largest page a list endpoint will return.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Entrance or board exam a quiz or batch prepares for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamType {
    Jee,
    Neet,
    Boards,
    Other,
}

/// Parses a path segment into a MongoDB ObjectId.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid id '{}'", raw)))
}

/// Validates that a string is a correctly formatted absolute http(s) URL.
pub fn validate_link(field: &str, value: &str) -> Result<(), AppError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::BadRequest(format!("{} must be a valid http(s) URL", field))),
    }
}

/// Offset window derived from `page` (1-based) and `limit` query parameters.
/// Without a `limit` the whole collection is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    pub page: u64,
    pub limit: Option<u64>,
}

impl PageWindow {
    /// Rejects a page whose offset does not fit the store's signed skip.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Result<Self, AppError> {
        let window = Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.map(|l| l.clamp(1, MAX_PAGE_SIZE)),
        };

        if let Some(limit) = window.limit {
            (window.page - 1)
                .checked_mul(limit)
                .filter(|skip| i64::try_from(*skip).is_ok())
                .ok_or_else(|| AppError::BadRequest(format!("Page {} is out of range", window.page)))?;
        }

        Ok(window)
    }

    pub fn skip(&self) -> u64 {
        match self.limit {
            Some(limit) => (self.page - 1).saturating_mul(limit),
            None => 0,
        }
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|l| l as i64)
    }

    /// Cache key for one filtered page of a resource, e.g.
    /// `free-quizzes:{ "examType": "JEE" }:p1:l20`.
    pub fn cache_key(&self, resource: &str, filter: &Document) -> String {
        match self.limit {
            Some(limit) => format!("{}:{}:p{}:l{}", resource, filter, self.page, limit),
            None => format!("{}:{}", resource, filter),
        }
    }
}

impl fmt::Display for PageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "page {} ({} per page)", self.page, limit),
            None => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn page_window_clamps_and_offsets() {
        let window = PageWindow::new(Some(3), Some(500)).unwrap();
        assert_eq!(window.limit(), Some(MAX_PAGE_SIZE as i64));
        assert_eq!(window.skip(), 200);

        let window = PageWindow::new(Some(2), Some(0)).unwrap();
        assert_eq!(window.limit(), Some(1));
        assert_eq!(window.skip(), 1);

        let window = PageWindow::new(Some(0), None).unwrap();
        assert_eq!(window.page, 1);
        assert_eq!(window.skip(), 0);
        assert_eq!(window.limit(), None);
    }

    #[test]
    fn page_window_rejects_offsets_past_i64() {
        assert!(matches!(
            PageWindow::new(Some(u64::MAX), Some(100)),
            Err(AppError::BadRequest(_))
        ));
        let last = i64::MAX as u64 / 100 + 1;
        assert!(PageWindow::new(Some(last), Some(100)).is_ok());
        assert!(PageWindow::new(Some(last + 1), Some(100)).is_err());
        // Without a limit the page is ignored.
        assert!(PageWindow::new(Some(u64::MAX), None).is_ok());
    }

    #[test]
    fn cache_key_is_scoped_to_resource() {
        let filter = doc! { "examType": "JEE" };
        let key = PageWindow::new(Some(2), Some(10)).unwrap().cache_key("free-quizzes", &filter);
        assert!(key.starts_with("free-quizzes:"));
        assert!(key.ends_with(":p2:l10"));
    }

    #[test]
    fn object_ids_and_links_are_checked() {
        assert!(parse_object_id("65f1c0ffee0000000000abcd").is_ok());
        assert!(matches!(parse_object_id("nope"), Err(AppError::BadRequest(_))));
        assert!(validate_link("quizLink", "https://forms.gle/abc").is_ok());
        assert!(validate_link("quizLink", "javascript:alert(1)").is_err());
        assert!(validate_link("quizLink", "not a url").is_err());
    }
}
