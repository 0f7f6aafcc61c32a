// src/analysis.rs
//! Result types returned to the HTTP layer.
//!
//! Wire shape (success):
//! `{success: true, categories: {<key>: {title, icon, content}, ..., sources}, total_articles, relevant_articles}`
//! Wire shape (failure): `{success: false, error}`

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::categorize::Category;
use crate::generate::GenerationError;

/// Fatal, request-level failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("No symbol provided")]
    EmptySymbol,
    #[error("No recent financial news found for {symbol} from major financial sources. Please check the stock symbol and try again.")]
    NoDocumentsFound { symbol: String },
}

/// One generated write-up. A failed generation keeps its slot and renders the
/// reason inline.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySection {
    pub category: Category,
    pub outcome: Result<String, GenerationError>,
}

impl CategorySection {
    pub fn content(&self) -> String {
        match &self.outcome {
            Ok(text) => text.clone(),
            Err(e) => format!("Error generating analysis for this category: {e}"),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

impl Serialize for CategorySection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CategorySection", 3)?;
        s.serialize_field("title", self.category.title())?;
        s.serialize_field("icon", self.category.icon())?;
        s.serialize_field("content", &self.content())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub symbol: String,
    /// Non-empty categories only, in declaration order.
    pub sections: Vec<CategorySection>,
    /// Distinct sources of every categorized document, comma-joined.
    pub sources: String,
    /// Documents after dedup, before retrieval.
    pub total_articles: usize,
    /// Documents returned by top-k retrieval.
    pub relevant_articles: usize,
}

impl AnalysisReport {
    pub fn section(&self, category: Category) -> Option<&CategorySection> {
        self.sections.iter().find(|s| s.category == category)
    }
}

struct CategoriesView<'a>(&'a AnalysisReport);

impl Serialize for CategoriesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(self.0.sections.len() + 1))?;
        for section in &self.0.sections {
            m.serialize_entry(section.category.key(), section)?;
        }
        m.serialize_entry("sources", &self.0.sources)?;
        m.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Success(AnalysisReport),
    Failure(AnalysisError),
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success(_))
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisResult::Success(r) => Some(r),
            AnalysisResult::Failure(_) => None,
        }
    }
}

impl From<Result<AnalysisReport, AnalysisError>> for AnalysisResult {
    fn from(r: Result<AnalysisReport, AnalysisError>) -> Self {
        match r {
            Ok(report) => AnalysisResult::Success(report),
            Err(e) => AnalysisResult::Failure(e),
        }
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalysisResult::Success(report) => {
                let mut s = serializer.serialize_struct("AnalysisResult", 4)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("categories", &CategoriesView(report))?;
                s.serialize_field("total_articles", &report.total_articles)?;
                s.serialize_field("relevant_articles", &report.relevant_articles)?;
                s.end()
            }
            AnalysisResult::Failure(err) => {
                let mut s = serializer.serialize_struct("AnalysisResult", 2)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", &err.to_string())?;
                s.end()
            }
        }
    }
}
