// src/models/score_match_batch.rs

use std::sync::LazyLock;

use bson::{DateTime, Document, doc, oid::ObjectId};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::{Changes, Resource},
    error::AppError,
    models::common::{ExamType, PageWindow, validate_link},
    utils::html::clean_html,
};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("hex color pattern is valid")
});

fn default_color() -> String {
    "#2563eb".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchType {
    #[default]
    Regular,
    Crash,
    TestSeries,
}

/// Represents a document of the `scorematchbatches` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchBatch {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub desc: String,
    pub exam: ExamType,
    #[serde(default)]
    pub batch_type: BatchType,
    /// Display price, e.g. "₹4,999".
    pub price: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default)]
    pub enrollment_link: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime,
}

impl Resource for ScoreMatchBatch {
    const COLLECTION: &'static str = "scorematchbatches";
}

impl ScoreMatchBatch {
    pub fn check(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }
        if self.price.trim().is_empty() {
            return Err(AppError::BadRequest("Price is required".to_string()));
        }
        if !HEX_COLOR.is_match(&self.color) {
            return Err(AppError::BadRequest(format!(
                "Color '{}' must be a hex value like #2563eb",
                self.color
            )));
        }
        if !self.enrollment_link.is_empty() {
            validate_link("enrollmentLink", &self.enrollment_link)?;
        }
        if self.features.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::BadRequest("Features cannot contain empty entries".to_string()));
        }
        Ok(())
    }
}

/// DTO returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchBatchResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub desc: String,
    pub exam: ExamType,
    pub batch_type: BatchType,
    pub price: String,
    pub duration: String,
    pub schedule: String,
    pub start_date: String,
    pub features: Vec<String>,
    pub color: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub enrollment_link: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<ScoreMatchBatch> for ScoreMatchBatchResponse {
    fn from(batch: ScoreMatchBatch) -> Self {
        Self {
            id: batch.id.to_hex(),
            title: batch.title,
            subtitle: batch.subtitle,
            desc: batch.desc,
            exam: batch.exam,
            batch_type: batch.batch_type,
            price: batch.price,
            duration: batch.duration,
            schedule: batch.schedule,
            start_date: batch.start_date,
            features: batch.features,
            color: batch.color,
            icon: batch.icon,
            badge: batch.badge,
            enrollment_link: batch.enrollment_link,
            is_active: batch.is_active,
            created_at: batch.created_at.to_chrono(),
        }
    }
}

/// DTO for creating a batch.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateScoreMatchBatchRequest {
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 300))]
    pub subtitle: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub desc: String,
    pub exam: ExamType,
    #[serde(default)]
    pub batch_type: BatchType,
    #[validate(length(min = 1, max = 50, message = "Price is required."))]
    pub price: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub duration: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub schedule: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub start_date: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub features: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub icon: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub badge: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub enrollment_link: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreateScoreMatchBatchRequest {
    pub fn into_batch(self) -> ScoreMatchBatch {
        ScoreMatchBatch {
            id: ObjectId::new(),
            title: self.title.trim().to_string(),
            subtitle: self.subtitle,
            desc: clean_html(&self.desc),
            exam: self.exam,
            batch_type: self.batch_type,
            price: self.price.trim().to_string(),
            duration: self.duration,
            schedule: self.schedule,
            start_date: self.start_date,
            features: self.features.into_iter().map(|f| f.trim().to_string()).collect(),
            color: self.color.trim().to_string(),
            icon: self.icon,
            badge: self.badge.filter(|b| !b.trim().is_empty()),
            enrollment_link: self.enrollment_link.trim().to_string(),
            is_active: self.is_active,
            created_at: DateTime::now(),
        }
    }
}

/// DTO for updating a batch. A supplied `features` array replaces the stored one.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreMatchBatchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 300))]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam: Option<ExamType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_type: Option<BatchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub enrollment_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateScoreMatchBatchRequest {
    pub fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
        }
        if let Some(desc) = self.desc.as_mut() {
            *desc = clean_html(desc);
        }
        if let Some(price) = self.price.as_mut() {
            *price = price.trim().to_string();
        }
        if let Some(features) = self.features.as_mut() {
            for feature in features.iter_mut() {
                *feature = feature.trim().to_string();
            }
        }
        if let Some(color) = self.color.as_mut() {
            *color = color.trim().to_string();
        }
        if let Some(badge) = self.badge.as_mut() {
            *badge = badge.trim().to_string();
        }
        if let Some(link) = self.enrollment_link.as_mut() {
            *link = link.trim().to_string();
        }
    }

    pub fn apply_to(&self, batch: &mut ScoreMatchBatch) {
        if let Some(v) = &self.title {
            batch.title = v.clone();
        }
        if let Some(v) = &self.subtitle {
            batch.subtitle = v.clone();
        }
        if let Some(v) = &self.desc {
            batch.desc = v.clone();
        }
        if let Some(v) = self.exam {
            batch.exam = v;
        }
        if let Some(v) = self.batch_type {
            batch.batch_type = v;
        }
        if let Some(v) = &self.price {
            batch.price = v.clone();
        }
        if let Some(v) = &self.duration {
            batch.duration = v.clone();
        }
        if let Some(v) = &self.schedule {
            batch.schedule = v.clone();
        }
        if let Some(v) = &self.start_date {
            batch.start_date = v.clone();
        }
        if let Some(v) = &self.features {
            batch.features = v.clone();
        }
        if let Some(v) = &self.color {
            batch.color = v.clone();
        }
        if let Some(v) = &self.icon {
            batch.icon = v.clone();
        }
        if let Some(v) = &self.badge {
            batch.badge = Some(v.clone()).filter(|b| !b.is_empty());
        }
        if let Some(v) = &self.enrollment_link {
            batch.enrollment_link = v.clone();
        }
        if let Some(v) = self.is_active {
            batch.is_active = v;
        }
    }

    /// `$set` for every supplied field. An empty `badge` is `$unset` instead.
    pub fn to_changes(&self) -> Result<Changes, AppError> {
        let mut changes = Changes {
            set: bson::to_document(self)?,
            unset: Vec::new(),
        };
        if self.badge.as_deref() == Some("") {
            changes.set.remove("badge");
            changes.unset.push("badge");
        }
        Ok(changes)
    }
}

/// Query parameters for listing batches.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ScoreMatchBatchListParams {
    pub exam: Option<ExamType>,
    pub batch_type: Option<BatchType>,
    /// Only active (`true`) or only hidden (`false`) batches.
    pub active: Option<bool>,
    /// 1-based page number, used together with `limit`.
    pub page: Option<u64>,
    /// Page size, at most 100.
    pub limit: Option<u64>,
}

impl ScoreMatchBatchListParams {
    pub fn filter(&self) -> Result<Document, AppError> {
        let mut filter = doc! {};
        if let Some(exam) = self.exam {
            filter.insert("exam", bson::to_bson(&exam)?);
        }
        if let Some(batch_type) = self.batch_type {
            filter.insert("batchType", bson::to_bson(&batch_type)?);
        }
        if let Some(active) = self.active {
            filter.insert("isActive", active);
        }
        Ok(filter)
    }

    pub fn window(&self) -> Result<PageWindow, AppError> {
        PageWindow::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> ScoreMatchBatch {
        CreateScoreMatchBatchRequest {
            title: "NEET Score Match 2026".to_string(),
            subtitle: "Target 650+".to_string(),
            desc: "<p>Daily DPPs</p>".to_string(),
            exam: ExamType::Neet,
            batch_type: BatchType::Crash,
            price: " ₹4,999 ".to_string(),
            duration: "3 months".to_string(),
            schedule: "Mon-Sat, 6 PM".to_string(),
            start_date: "1 June".to_string(),
            features: vec![" Live classes".to_string(), "Weekly tests ".to_string()],
            color: default_color(),
            icon: "flask".to_string(),
            badge: Some(String::new()),
            enrollment_link: "https://wa.me/910000000000".to_string(),
            is_active: true,
        }
        .into_batch()
    }

    #[test]
    fn into_batch_normalises_fields() {
        let batch = batch();
        assert_eq!(batch.price, "₹4,999");
        assert_eq!(batch.features, vec!["Live classes", "Weekly tests"]);
        assert_eq!(batch.badge, None);
        assert!(batch.check().is_ok());
    }

    #[test]
    fn bad_color_and_link_are_rejected() {
        let mut b = batch();
        b.color = "blue".to_string();
        assert!(b.check().is_err());

        let mut b = batch();
        b.enrollment_link = "wa.me/123".to_string();
        assert!(b.check().is_err());

        let mut b = batch();
        b.color = "#fff".to_string();
        assert!(b.check().is_ok());
    }

    #[test]
    fn features_patch_replaces_in_order() {
        let mut b = batch();
        let patch = UpdateScoreMatchBatchRequest {
            features: Some(vec!["Z".to_string(), "A".to_string(), "M".to_string()]),
            ..Default::default()
        };
        patch.apply_to(&mut b);
        assert_eq!(b.features, vec!["Z", "A", "M"]);
        assert_eq!(patch.to_changes().unwrap().set, doc! { "features": ["Z", "A", "M"] });
    }

    #[test]
    fn blank_badge_patch_clears_the_badge() {
        let mut b = batch();
        b.badge = Some("Popular".to_string());

        let mut patch = UpdateScoreMatchBatchRequest {
            badge: Some("   ".to_string()),
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        patch.normalize();
        patch.apply_to(&mut b);
        assert_eq!(b.badge, None);

        let changes = patch.to_changes().unwrap();
        assert_eq!(changes.set, doc! { "title": "Renamed" });
        assert_eq!(changes.unset, vec!["badge"]);
    }

    #[test]
    fn batch_type_uses_screaming_snake_case() {
        assert_eq!(bson::to_bson(&BatchType::TestSeries).unwrap(), bson::Bson::String("TEST_SERIES".into()));
        let params = ScoreMatchBatchListParams {
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(params.filter().unwrap(), doc! { "isActive": true });
    }
}
