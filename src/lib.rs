//! # payroll-report
//!
//! Employee payment records to salary reports through a pipeline of pure
//! functions.
//!
//! ## Overview
//!
//! A report is produced by a fixed sequence of stages, each a function of
//! its arguments only:
//! - **Decode**: JSON text into [`Employee`] records
//! - **Censor**: redact social security numbers (`xxx-xx-1234`)
//! - **Select & order**: keep active employees, sort by last name
//! - **Tabulate**: project records into a header + rows [`Table`]
//! - **Render**: serialize the table as CSV or HTML
//!
//! No stage reads files, the clock, or shared state. The HTML "as of" date
//! is supplied by the caller.
//!
//! ## Example
//!
//! ```
//! use payroll_report::{Column, Employee, select_active, sort_by_last_name, tabulate, to_csv, SortOrder};
//!
//! let records = vec![
//!     Employee::new("John", "Doe", true, "xxx-xx-2588", vec![100.0, 50.5]),
//!     Employee::new("Mary", "Jane", false, "xxx-xx-1234", vec![10.0]),
//!     Employee::new("Ann", "Adams", true, "xxx-xx-3333", vec![7023.0]),
//! ];
//!
//! let active = select_active(&records);
//! let sorted = sort_by_last_name(&active, SortOrder::Ascending);
//! let table = tabulate(&sorted, &Column::DEFAULT_HEADER).unwrap();
//!
//! assert_eq!(
//!     to_csv(&table),
//!     "Last Name,First Name,Total Salary\nAdams,Ann,7023\nDoe,John,150.5"
//! );
//! ```

pub mod censor;
pub mod dsl;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod select;
pub mod table;

pub use censor::{censor, censor_employee, censor_records};
pub use dsl::{
    Command, DebugCallbacks, DebugInfo, ReportOutput, execute_report, execute_report_debug,
    parse_commands,
};
pub use error::{ReportError, Result};
pub use pipeline::ReportPipeline;
pub use record::{Employee, decode};
pub use render::{CsvRenderer, Format, HtmlRenderer, Renderer, to_csv, to_html};
pub use select::{SortOrder, select_active, sort_by_last_name};
pub use table::{Cell, Column, Table, tabulate, tabulate_labels};
