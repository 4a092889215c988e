//! Core data types: search queries with inline filters and a lenient view
//! over search results.

use serde::{Deserialize, Serialize};

use crate::config::{validate_date, validate_sort_by};
use crate::error::Result;

/// A free-text search plus the filters Indian Kanoon accepts inline in
/// `formInput`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub doctypes: Option<String>,
    pub fromdate: Option<String>,
    pub todate: Option<String>,
    pub sortby: Option<String>,
    pub added_today: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Restrict to document types, e.g. `supremecourt` or `judgments`.
    pub fn with_doctypes(mut self, doctypes: impl Into<String>) -> Self {
        self.doctypes = Some(doctypes.into());
        self
    }

    /// Only documents on or after this date (DD-MM-YYYY).
    pub fn with_fromdate(mut self, date: impl Into<String>) -> Result<Self> {
        let date = date.into();
        validate_date(&date)?;
        self.fromdate = Some(date);
        Ok(self)
    }

    /// Only documents on or before this date (DD-MM-YYYY).
    pub fn with_todate(mut self, date: impl Into<String>) -> Result<Self> {
        let date = date.into();
        validate_date(&date)?;
        self.todate = Some(date);
        Ok(self)
    }

    /// `mostrecent` or `leastrecent`.
    pub fn with_sortby(mut self, sortby: impl Into<String>) -> Result<Self> {
        let sortby = sortby.into();
        validate_sort_by(&sortby)?;
        self.sortby = Some(sortby);
        Ok(self)
    }

    pub fn added_today(mut self) -> Self {
        self.added_today = true;
        self
    }

    /// Render the unencoded `formInput` value.
    ///
    /// # Examples
    /// ```
    /// use kanoon_client::SearchQuery;
    ///
    /// let q = SearchQuery::new("right to privacy").with_doctypes("supremecourt");
    /// assert_eq!(q.form_input(), "right to privacy doctypes: supremecourt");
    /// ```
    pub fn form_input(&self) -> String {
        let mut input = self.text.trim().to_string();

        if let Some(doctypes) = &self.doctypes {
            input.push_str(&format!(" doctypes: {doctypes}"));
        }
        if let Some(fromdate) = &self.fromdate {
            input.push_str(&format!(" fromdate: {fromdate}"));
        }
        if let Some(todate) = &self.todate {
            input.push_str(&format!(" todate: {todate}"));
        }
        if let Some(sortby) = &self.sortby {
            input.push_str(&format!(" sortby: {sortby}"));
        }
        if self.added_today {
            input.push_str(" added:today");
        }

        input
    }
}

/// One document in a search result page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    pub tid: u64,
    pub title: String,
    /// Snippet around the match; contains `<b>` highlight markup.
    pub headline: String,
    pub docsource: String,
    pub publishdate: String,
}

/// Lenient view over a search response.
///
/// Unknown fields are ignored and missing ones default, so the sentinel
/// `{"errmsg": ...}` payload parses too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub docs: Vec<SearchHit>,
    pub errmsg: Option<String>,
}

impl SearchResults {
    /// Read a parsed JSON document, returning `None` if it is not an object
    /// of the expected shape.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn is_error(&self) -> bool {
        self.errmsg.is_some()
    }
}
