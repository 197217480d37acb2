//! Projecting records into a header + rows table.
//!
//! A [`Table`] can only be built by [`tabulate`], which derives every data
//! row from the header's columns. Rows therefore always have the header's
//! arity.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ReportError, Result};
use crate::record::Employee;

/// A report column and the record attribute it projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    LastName,
    FirstName,
    TotalSalary,
    SocialSecurity,
}

impl Column {
    /// Header used when a report does not name its columns.
    pub const DEFAULT_HEADER: [Column; 3] =
        [Column::LastName, Column::FirstName, Column::TotalSalary];

    pub const ALL: [Column; 4] = [
        Column::LastName,
        Column::FirstName,
        Column::TotalSalary,
        Column::SocialSecurity,
    ];

    /// Header label as printed in reports.
    pub fn label(self) -> &'static str {
        match self {
            Column::LastName => "Last Name",
            Column::FirstName => "First Name",
            Column::TotalSalary => "Total Salary",
            Column::SocialSecurity => "Social Security",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Column::LastName => "last",
            Column::FirstName => "first",
            Column::TotalSalary => "total",
            Column::SocialSecurity => "ssn",
        }
    }

    /// Resolve a header label (`"Last Name"`) or short key (`last`).
    /// Matching ignores ASCII case.
    pub fn from_label(label: &str) -> Result<Column> {
        let label = label.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label) || c.key().eq_ignore_ascii_case(label))
            .ok_or_else(|| ReportError::UnknownColumn(label.to_string()))
    }

    fn cell(self, employee: &Employee) -> Cell {
        match self {
            Column::LastName => Cell::Text(employee.last_name.clone()),
            Column::FirstName => Cell::Text(employee.first_name.clone()),
            Column::TotalSalary => Cell::Number(employee.total_salary()),
            Column::SocialSecurity => Cell::Text(employee.social_security.clone()),
        }
    }
}

impl FromStr for Column {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Column::from_label(s)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One rendered table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Printed with the shortest representation that round-trips.
    Number(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Header row followed by one data row per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    header: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn header(&self) -> &[Column] {
        &self.header
    }

    pub fn header_labels(&self) -> Vec<&'static str> {
        self.header.iter().map(|c| c.label()).collect()
    }

    /// Data rows, without the header.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Every row as text, header first.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let header: Vec<String> = self.header.iter().map(|c| c.label().to_string()).collect();
        std::iter::once(header)
            .chain(
                self.rows
                    .iter()
                    .map(|row| row.iter().map(Cell::to_string).collect::<Vec<_>>()),
            )
            .collect()
    }

    /// Number of rows including the header.
    pub fn len(&self) -> usize {
        self.rows.len() + 1
    }

    /// A table always has its header row, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Build a table from already selected and ordered records.
///
/// Does not filter or sort. The caller passes exactly the records that
/// belong in the report.
pub fn tabulate(records: &[Employee], columns: &[Column]) -> Result<Table> {
    if columns.is_empty() {
        return Err(ReportError::EmptyHeader);
    }

    let rows = records
        .iter()
        .map(|e| columns.iter().map(|c| c.cell(e)).collect())
        .collect();

    let table = Table {
        header: columns.to_vec(),
        rows,
    };
    debug!(
        columns = columns.len(),
        rows = table.len(),
        "tabulated records"
    );
    Ok(table)
}

/// [`tabulate`] with the header given as labels.
pub fn tabulate_labels(records: &[Employee], labels: &[&str]) -> Result<Table> {
    let columns = labels
        .iter()
        .map(|l| Column::from_label(l))
        .collect::<Result<Vec<_>>>()?;
    tabulate(records, &columns)
}
