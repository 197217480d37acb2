//! Selecting and ordering records.
//!
//! Both operations borrow their input and return a new `Vec`, so a caller
//! can keep using the original sequence afterwards.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::ReportError;
use crate::record::Employee;

/// Direction for [`sort_by_last_name`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    #[default]
    #[value(name = "asc", alias = "ascending")]
    Ascending,
    #[value(name = "desc", alias = "descending")]
    Descending,
}

impl SortOrder {
    /// Apply this direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for SortOrder {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(ReportError::UnknownOrder(s.to_string())),
        }
    }
}

/// Keep the active records, in their original relative order.
pub fn select_active(records: &[Employee]) -> Vec<Employee> {
    records.iter().filter(|e| e.active).cloned().collect()
}

/// Order records by last name using plain code-point comparison.
///
/// The sort is stable in both directions: records with equal last names
/// keep their input order.
pub fn sort_by_last_name(records: &[Employee], order: SortOrder) -> Vec<Employee> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| order.apply(a.last_name.cmp(&b.last_name)));
    sorted
}
