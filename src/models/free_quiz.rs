// src/models/free_quiz.rs

use bson::{DateTime, Document, doc, oid::ObjectId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::{Changes, Resource},
    error::AppError,
    models::common::{ExamType, PageWindow, validate_link},
    utils::html::clean_html,
};

/// Projected away from list responses; only the single-quiz endpoint returns it.
pub const PDF_DATA_PATH: &str = "quizPdf.data";

fn default_subject() -> String {
    "Chemistry".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuizType {
    Link,
    Pdf,
}

impl QuizType {
    /// Stored field holding the other quiz type's source.
    pub fn unused_field(self) -> &'static str {
        match self {
            QuizType::Link => "quizPdf",
            QuizType::Pdf => "quizLink",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Uploaded quiz sheet, embedded in the document as base64.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizPdf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Represents a document of the `freequizzes` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeQuiz {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub exam_type: ExamType,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub chapter: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub quiz_type: QuizType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_pdf: Option<QuizPdf>,
    pub created_at: DateTime,
}

impl Resource for FreeQuiz {
    const COLLECTION: &'static str = "freequizzes";
}

impl FreeQuiz {
    /// Cross-field rules: a LINK quiz needs a usable link, a PDF quiz needs PDF data.
    ///
    /// `require_pdf_data` is off for documents read back without their PDF.
    pub fn check(&self, require_pdf_data: bool) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        match self.quiz_type {
            QuizType::Link => {
                let link = self
                    .quiz_link
                    .as_deref()
                    .filter(|l| !l.trim().is_empty())
                    .ok_or_else(|| AppError::BadRequest("Quiz link is required for LINK quizzes".to_string()))?;
                validate_link("quizLink", link)
            }
            QuizType::Pdf => {
                let has_data = self
                    .quiz_pdf
                    .as_ref()
                    .and_then(|p| p.data.as_deref())
                    .is_some_and(|d| !d.trim().is_empty());
                if require_pdf_data && !has_data {
                    return Err(AppError::BadRequest("PDF file is required for PDF quizzes".to_string()));
                }
                Ok(())
            }
        }
    }

    pub fn pdf_data(&self) -> Option<&str> {
        self.quiz_pdf.as_ref().and_then(|p| p.data.as_deref())
    }

    /// A LINK quiz keeps no PDF and a PDF quiz keeps no link.
    pub fn drop_unused_source(&mut self) {
        match self.quiz_type {
            QuizType::Link => self.quiz_pdf = None,
            QuizType::Pdf => self.quiz_link = None,
        }
    }
}

/// DTO returned to clients. `_id` as hex, `createdAt` as RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FreeQuizResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub exam_type: ExamType,
    pub subject: String,
    pub chapter: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub quiz_type: QuizType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_pdf: Option<QuizPdf>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<FreeQuiz> for FreeQuizResponse {
    fn from(quiz: FreeQuiz) -> Self {
        Self {
            id: quiz.id.to_hex(),
            title: quiz.title,
            description: quiz.description,
            exam_type: quiz.exam_type,
            subject: quiz.subject,
            chapter: quiz.chapter,
            topic: quiz.topic,
            difficulty: quiz.difficulty,
            quiz_type: quiz.quiz_type,
            quiz_link: quiz.quiz_link,
            quiz_pdf: quiz.quiz_pdf,
            created_at: quiz.created_at.to_chrono(),
        }
    }
}

/// DTO for creating a free quiz.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFreeQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    pub exam_type: ExamType,
    #[serde(default = "default_subject")]
    #[validate(length(max = 100))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub chapter: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub quiz_type: QuizType,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub quiz_link: Option<String>,
    #[serde(default)]
    pub quiz_pdf: Option<QuizPdf>,
}

impl CreateFreeQuizRequest {
    pub fn pdf_data(&self) -> Option<&str> {
        self.quiz_pdf.as_ref().and_then(|p| p.data.as_deref())
    }

    /// Builds the stored document: new id, creation time, sanitised text.
    pub fn into_quiz(self) -> FreeQuiz {
        let mut quiz = FreeQuiz {
            id: ObjectId::new(),
            title: self.title.trim().to_string(),
            description: clean_html(&self.description),
            exam_type: self.exam_type,
            subject: self.subject,
            chapter: self.chapter,
            topic: self.topic,
            difficulty: self.difficulty,
            quiz_type: self.quiz_type,
            quiz_link: self.quiz_link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            quiz_pdf: self.quiz_pdf,
            created_at: DateTime::now(),
        };
        quiz.drop_unused_source();
        quiz
    }
}

/// DTO for updating a free quiz. Only supplied fields change.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFreeQuizRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<ExamType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub chapter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_type: Option<QuizType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub quiz_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_pdf: Option<QuizPdf>,
}

impl UpdateFreeQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.exam_type.is_none()
            && self.subject.is_none()
            && self.chapter.is_none()
            && self.topic.is_none()
            && self.difficulty.is_none()
            && self.quiz_type.is_none()
            && self.quiz_link.is_none()
            && self.quiz_pdf.is_none()
    }

    pub fn pdf_data(&self) -> Option<&str> {
        self.quiz_pdf.as_ref().and_then(|p| p.data.as_deref())
    }

    /// Trims and sanitises text fields in place.
    pub fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
        }
        if let Some(description) = self.description.as_mut() {
            *description = clean_html(description);
        }
        if let Some(link) = self.quiz_link.as_mut() {
            *link = link.trim().to_string();
        }
    }

    /// Applies the patch to an in-memory copy, used to re-check cross-field rules.
    pub fn apply_to(&self, quiz: &mut FreeQuiz) {
        if let Some(v) = &self.title {
            quiz.title = v.clone();
        }
        if let Some(v) = &self.description {
            quiz.description = v.clone();
        }
        if let Some(v) = self.exam_type {
            quiz.exam_type = v;
        }
        if let Some(v) = &self.subject {
            quiz.subject = v.clone();
        }
        if let Some(v) = &self.chapter {
            quiz.chapter = v.clone();
        }
        if let Some(v) = &self.topic {
            quiz.topic = v.clone();
        }
        if let Some(v) = self.difficulty {
            quiz.difficulty = v;
        }
        if let Some(v) = self.quiz_type {
            quiz.quiz_type = v;
        }
        if let Some(v) = &self.quiz_link {
            quiz.quiz_link = Some(v.clone());
        }
        if let Some(v) = &self.quiz_pdf {
            quiz.quiz_pdf = Some(v.clone());
        }
        quiz.drop_unused_source();
    }

    /// `$set` for the supplied fields, plus an `$unset` of whichever source
    /// (`quizPdf` or `quizLink`) a quiz of `quiz_type` does not use.
    pub fn to_changes(&self, quiz_type: QuizType) -> Result<Changes, AppError> {
        let mut set = bson::to_document(self)?;
        let unused = quiz_type.unused_field();
        set.remove(unused);
        Ok(Changes {
            set,
            unset: vec![unused],
        })
    }
}

/// Query parameters for listing free quizzes.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FreeQuizListParams {
    pub exam_type: Option<ExamType>,
    pub difficulty: Option<Difficulty>,
    pub quiz_type: Option<QuizType>,
    pub subject: Option<String>,
    pub chapter: Option<String>,
    /// 1-based page number, used together with `limit`.
    pub page: Option<u64>,
    /// Page size, at most 100.
    pub limit: Option<u64>,
}

impl FreeQuizListParams {
    pub fn filter(&self) -> Result<Document, AppError> {
        let mut filter = doc! {};
        if let Some(exam_type) = self.exam_type {
            filter.insert("examType", bson::to_bson(&exam_type)?);
        }
        if let Some(difficulty) = self.difficulty {
            filter.insert("difficulty", bson::to_bson(&difficulty)?);
        }
        if let Some(quiz_type) = self.quiz_type {
            filter.insert("quizType", bson::to_bson(&quiz_type)?);
        }
        if let Some(subject) = self.subject.as_deref().filter(|s| !s.is_empty()) {
            filter.insert("subject", subject);
        }
        if let Some(chapter) = self.chapter.as_deref().filter(|s| !s.is_empty()) {
            filter.insert("chapter", chapter);
        }
        Ok(filter)
    }

    pub fn window(&self) -> Result<PageWindow, AppError> {
        PageWindow::new(self.page, self.limit)
    }
}
