//! Data models shared between the sync engine and its consumers.
//!
//! `BookInfo` is the normalized record handed to the feed renderer;
//! `DailyBooks` is one day of the persisted history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized book record extracted from an OpenBD document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publisher: String,
    /// Publication date as published by the catalog (usually YYYYMMDD)
    #[serde(default)]
    pub publish_date: String,
    /// Price amount as a string, empty when unknown
    #[serde(default)]
    pub price: String,
}

/// Books extracted during one run, keyed by the run date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBooks {
    pub date: NaiveDate,
    pub books: Vec<BookInfo>,
}
