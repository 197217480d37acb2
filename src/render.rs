//! Serializing a [`Table`] as CSV or HTML text.
//!
//! Both renderers share the same table. The caller picks a strategy, either
//! by calling [`to_csv`] / [`to_html`] directly or through the [`Renderer`]
//! trait. Neither reads the clock: the HTML "as of" date is passed in.

use askama::Template;
use chrono::NaiveDate;
use clap::ValueEnum;

use crate::error::Result;
use crate::table::Table;

/// Title printed in the HTML document head and heading.
pub const HTML_TITLE: &str = "Employee Salary Report";

/// A way of turning a table into text.
pub trait Renderer {
    fn render(&self, table: &Table) -> Result<String>;

    /// The display name of this renderer.
    fn name(&self) -> &str;
}

/// Comma-separated values, one line per row.
pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn render(&self, table: &Table) -> Result<String> {
        Ok(to_csv(table))
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

/// HTML document stamped with the date the report describes.
pub struct HtmlRenderer {
    pub as_of: NaiveDate,
}

impl Renderer for HtmlRenderer {
    fn render(&self, table: &Table) -> Result<String> {
        to_html(table, self.as_of)
    }

    fn name(&self) -> &str {
        "HTML"
    }
}

/// Output format selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Html,
}

impl Format {
    pub fn renderer(self, as_of: NaiveDate) -> Box<dyn Renderer> {
        match self {
            Format::Csv => Box::new(CsvRenderer),
            Format::Html => Box::new(HtmlRenderer { as_of }),
        }
    }
}

/// Cells joined with `,`, rows joined with `\n`, no trailing newline.
///
/// Cells are written as-is; a cell containing a comma is not quoted.
pub fn to_csv(table: &Table) -> String {
    table
        .rows()
        .iter()
        .map(|row| row.join(","))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Askama view of a table; cell text is HTML-escaped on render.
#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    as_of: String,
    header: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

/// An HTML document with one `<tr>` per row: `<th>` cells for the header,
/// `<td>` cells for data, in table column order.
pub fn to_html(table: &Table, as_of: NaiveDate) -> Result<String> {
    let template = ReportTemplate {
        title: HTML_TITLE,
        as_of: as_of.format("%Y-%m-%d").to_string(),
        header: table.header_labels(),
        rows: table.rows().into_iter().skip(1).collect(),
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Employee;
    use crate::table::{Column, tabulate};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn john_and_mary() -> Vec<Employee> {
        let mary_payments = vec![
            12083.33, 12083.33, 12083.33, 11000.0, 12102.24, 12083.33, 12083.33, 12083.33,
            20076.0, 12083.33, 12083.33, 12083.33,
        ];
        vec![
            Employee::new(
                "John",
                "Doe",
                true,
                "xxx-xx-2588",
                vec![
                    8333.33, 8333.33, 8333.33, 8021.45, 7023.0, 9023.67, 8333.33, 8333.33,
                    8333.33, 6500.0, 8333.33, 8333.33,
                ],
            ),
            Employee::new("Mary", "Jane", true, "xxx-xx-1234", mary_payments),
        ]
    }

    #[test]
    fn test_csv_salary_report() {
        let table = tabulate(&john_and_mary(), &Column::DEFAULT_HEADER).unwrap();
        assert_eq!(
            to_csv(&table),
            "Last Name,First Name,Total Salary\nDoe,John,97234.76\nJane,Mary,151928.21"
        );
    }

    #[test]
    fn test_csv_header_only() {
        let table = tabulate(&[], &Column::DEFAULT_HEADER).unwrap();
        assert_eq!(to_csv(&table), "Last Name,First Name,Total Salary");
    }

    #[test]
    fn test_csv_does_not_quote() {
        let e = Employee::new("Jr, John", "Doe", true, "", vec![1.0]);
        let table = tabulate(&[e], &[Column::FirstName]).unwrap();
        assert_eq!(to_csv(&table), "First Name\nJr, John");
    }

    #[test]
    fn test_html_rows_and_cells() {
        let table = tabulate(&john_and_mary(), &Column::DEFAULT_HEADER).unwrap();
        let html = to_html(&table, date()).unwrap();

        assert_eq!(html.matches("<tr>").count(), 3);
        assert_eq!(html.matches("<th>").count(), 3);
        assert_eq!(html.matches("<td>").count(), 6);
        assert!(html.contains(
            "<tr><th>Last Name</th><th>First Name</th><th>Total Salary</th></tr>"
        ));
        assert!(html.contains("<tr><td>Doe</td><td>John</td><td>97234.76</td></tr>"));
        assert!(html.contains("<tr><td>Jane</td><td>Mary</td><td>151928.21</td></tr>"));
        assert!(html.find("Doe").unwrap() < html.find("Jane").unwrap());
    }

    #[test]
    fn test_html_uses_given_date() {
        let table = tabulate(&[], &Column::DEFAULT_HEADER).unwrap();
        let html = to_html(&table, date()).unwrap();
        assert!(html.contains("<p>As of 2024-03-15</p>"));
        assert_eq!(html, to_html(&table, date()).unwrap());
    }

    #[test]
    fn test_html_escapes_cells() {
        let e = Employee::new("<b>", "O'Neil & Sons", true, "", vec![]);
        let table = tabulate(&[e], &[Column::FirstName, Column::LastName]).unwrap();
        let html = to_html(&table, date()).unwrap();
        assert!(html.contains("<td>&lt;b&gt;</td><td>O&#x27;Neil &amp; Sons</td>"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_html_document_layout() {
        let e = Employee::new("Ann", "Adams", true, "", vec![3000.75]);
        let table = tabulate(&[e], &[Column::LastName, Column::TotalSalary]).unwrap();
        assert_eq!(
            to_html(&table, date()).unwrap(),
            "<!DOCTYPE html>\n<html>\n<head>\n<title>Employee Salary Report</title>\n</head>\n\
             <body>\n<h1>Employee Salary Report</h1>\n<p>As of 2024-03-15</p>\n<table>\n\
             <tr><th>Last Name</th><th>Total Salary</th></tr>\n\
             <tr><td>Adams</td><td>3000.75</td></tr>\n</table>\n</body>\n</html>"
        );
    }

    #[test]
    fn test_format_selects_renderer() {
        let table = tabulate(&john_and_mary(), &Column::DEFAULT_HEADER).unwrap();

        let csv = Format::Csv.renderer(date());
        assert_eq!(csv.name(), "CSV");
        assert_eq!(csv.render(&table).unwrap(), to_csv(&table));

        let html = Format::Html.renderer(date());
        assert_eq!(html.name(), "HTML");
        assert_eq!(html.render(&table).unwrap(), to_html(&table, date()).unwrap());
    }
}
