//! DSL parser and executor for report pipelines.
//!
//! Pipeline format (CMS Pipelines style):
//! ```text
//! PIPE DECODE
//! | CENSOR
//! | ACTIVE
//! | SORT DESC
//! | TABULATE "Last Name" "First Name" "Total Salary"
//! | CSV
//! ?
//! ```
//!
//! - `PIPE <stage>` starts the pipeline
//! - `| <stage>` continues to the next stage
//! - `?` on its own line marks end of pipeline
//! - Lines starting with `#` are comments
//!
//! The stream changes shape as it flows: raw text, then records, then a
//! table, then rendered text. Each stage only accepts one or two shapes:
//! - `CENSOR` - Redact identifiers in raw text (before DECODE) or in every
//!   text field of every record (after DECODE)
//! - `DECODE` - Parse raw text into records
//! - `ACTIVE` - Keep active records
//! - `SORT [ASC|DESC]` - Order records by last name (default ASC)
//! - `TABULATE ["label" ...]` - Project records into a table; labels may be
//!   delimited strings or short keys (`last first total ssn`). No labels
//!   means the default header.
//! - `CSV` / `HTML` - Render the table; must be the last stage

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::censor::{censor, censor_records};
use crate::error::{ReportError, Result};
use crate::record::{Employee, decode};
use crate::render::{to_csv, to_html};
use crate::select::{SortOrder, select_active, sort_by_last_name};
use crate::table::{Column, Table, tabulate};

/// Callback type for stage start events: `(stage_index, stage_name)`.
type StageStartCallback = Box<dyn Fn(usize, &str) + 'static>;
/// Callback type for stage complete events: `(stage_index, output_count)`.
type StageCompleteCallback = Box<dyn Fn(usize, usize) + 'static>;

/// Debug callback information for stage-by-stage execution.
#[derive(Default)]
pub struct DebugCallbacks {
    pub on_stage_start: Option<StageStartCallback>,
    pub on_stage_complete: Option<StageCompleteCallback>,
}

/// Debug information for a single pipeline stage execution.
///
/// Counts are in the unit of the stream at that point: one for raw or
/// rendered text, records after DECODE, data rows after TABULATE.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfo {
    pub stage_name: String,
    pub input_count: usize,
    pub output_count: usize,
}

impl DebugInfo {
    pub fn new(stage_name: String, input_count: usize, output_count: usize) -> Self {
        Self {
            stage_name,
            input_count,
            output_count,
        }
    }
}

/// Result of running a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutput {
    /// Rendered report.
    pub text: String,
    /// Records produced by DECODE.
    pub input_count: usize,
    /// Data rows in the rendered table.
    pub output_count: usize,
}

/// Parsed pipeline command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// DECODE - parse raw text into records
    Decode,
    /// CENSOR - redact identifiers in text or records
    Censor,
    /// ACTIVE - keep active records
    Active,
    /// SORT [ASC|DESC]
    Sort { order: SortOrder },
    /// TABULATE ["label" ...]
    Tabulate { columns: Vec<Column> },
    /// CSV - render the table as comma-separated values
    Csv,
    /// HTML - render the table as an HTML document
    Html,
}

impl Command {
    /// Can this stage be the first stage in a pipeline?
    /// Only stages that accept raw text qualify.
    pub fn can_be_first(&self) -> bool {
        matches!(self, Command::Decode | Command::Censor)
    }

    /// Can this stage be the last stage in a pipeline?
    pub fn can_be_last(&self) -> bool {
        matches!(self, Command::Csv | Command::Html)
    }

    /// Get the stage name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Decode => "DECODE",
            Command::Censor => "CENSOR",
            Command::Active => "ACTIVE",
            Command::Sort { .. } => "SORT",
            Command::Tabulate { .. } => "TABULATE",
            Command::Csv => "CSV",
            Command::Html => "HTML",
        }
    }

    /// The command as a line of pipeline text (without `PIPE` or `|`).
    pub fn to_line(&self) -> String {
        match self {
            Command::Sort { order } => format!("SORT {}", order.keyword()),
            Command::Tabulate { columns } => {
                let labels: Vec<String> = columns.iter().map(|c| format!("\"{c}\"")).collect();
                format!("TABULATE {}", labels.join(" "))
            }
            other => other.name().to_string(),
        }
    }
}

/// Parse DSL text into commands.
pub fn parse_commands(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = if line
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("PIPE "))
        {
            line[5..].trim()
        } else if line.eq_ignore_ascii_case("PIPE") {
            continue;
        } else {
            line
        };

        let line = match line.strip_prefix('|') {
            Some(stripped) => stripped.trim(),
            None => line,
        };

        let line = line.trim_end_matches('?').trim();
        if line.is_empty() {
            continue;
        }

        let cmd = parse_command(line)
            .map_err(|e| ReportError::Pipeline(format!("Line {}: {}", line_num + 1, e)))?;
        trace!(line = line_num + 1, stage = cmd.name(), "parsed pipeline stage");
        commands.push(cmd);
    }

    Ok(commands)
}

/// Parse a single command line.
fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let keyword = parts.next().unwrap_or_default().to_uppercase();
    let rest = parts.next().unwrap_or_default().trim();

    let no_operands = |cmd: Command| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(format!("{} takes no operands", cmd.name()))
        }
    };

    match keyword.as_str() {
        "DECODE" => no_operands(Command::Decode),
        "CENSOR" => no_operands(Command::Censor),
        "ACTIVE" => no_operands(Command::Active),
        "CSV" => no_operands(Command::Csv),
        "HTML" => no_operands(Command::Html),
        "SORT" => parse_sort(rest),
        "TABULATE" => parse_tabulate(rest),
        _ => Err(format!("Unknown command: {keyword}")),
    }
}

/// Parse SORT operands: nothing, `ASC`, or `DESC`.
fn parse_sort(rest: &str) -> std::result::Result<Command, String> {
    if rest.is_empty() {
        return Ok(Command::Sort {
            order: SortOrder::default(),
        });
    }
    let order = rest.parse::<SortOrder>().map_err(|e| e.to_string())?;
    Ok(Command::Sort { order })
}

/// Parse TABULATE operands: a mix of delimited labels and bare keys.
fn parse_tabulate(rest: &str) -> std::result::Result<Command, String> {
    let mut columns = Vec::new();
    let mut rest = rest.trim_start();

    while let Some(first) = rest.chars().next() {
        let (label, remaining) = if first.is_alphanumeric() {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            (rest[..end].to_string(), &rest[end..])
        } else {
            parse_delimited_string(rest)?
        };
        columns.push(Column::from_label(&label).map_err(|e| e.to_string())?);
        rest = remaining.trim_start();
    }

    if columns.is_empty() {
        columns = Column::DEFAULT_HEADER.to_vec();
    }
    Ok(Command::Tabulate { columns })
}

/// Parse a delimited string using CMS Pipelines convention.
/// The first non-blank character is the delimiter, and the string
/// continues until the next occurrence of that delimiter.
/// Returns (extracted_string, rest_of_input).
fn parse_delimited_string(s: &str) -> std::result::Result<(String, &str), String> {
    let s = s.trim_start();
    let Some(delim) = s.chars().next() else {
        return Err("Expected delimited string".to_string());
    };
    let after_delim = &s[delim.len_utf8()..];

    match after_delim.find(delim) {
        Some(end) => Ok((
            after_delim[..end].to_string(),
            &after_delim[end + delim.len_utf8()..],
        )),
        None => Err(format!("Unclosed delimiter '{delim}'")),
    }
}

/// The value flowing between stages.
enum Stream {
    Text(String),
    Records(Vec<Employee>),
    Table(Table),
}

impl Stream {
    fn count(&self) -> usize {
        match self {
            Stream::Text(_) => 1,
            Stream::Records(records) => records.len(),
            Stream::Table(table) => table.data_rows().len(),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Stream::Text(_) => "text",
            Stream::Records(_) => "records",
            Stream::Table(_) => "a table",
        }
    }
}

/// Check stage positions before running anything.
fn validate(commands: &[Command]) -> Result<()> {
    let (Some(first), Some(last)) = (commands.first(), commands.last()) else {
        return Err(ReportError::Pipeline("Pipeline is empty".to_string()));
    };

    if !first.can_be_first() {
        return Err(ReportError::Pipeline(format!(
            "{} cannot be the first stage (try DECODE or CENSOR)",
            first.name()
        )));
    }

    if !last.can_be_last() {
        return Err(ReportError::Pipeline(format!(
            "{} cannot be the last stage (try CSV or HTML)",
            last.name()
        )));
    }

    Ok(())
}

/// Apply a single command to the stream.
fn apply_command(stream: Stream, cmd: &Command, as_of: NaiveDate) -> Result<Stream> {
    match (cmd, stream) {
        (Command::Censor, Stream::Text(text)) => Ok(Stream::Text(censor(&text))),
        (Command::Censor, Stream::Records(records)) => {
            Ok(Stream::Records(censor_records(&records)))
        }
        (Command::Decode, Stream::Text(text)) => Ok(Stream::Records(decode(&text)?)),
        (Command::Active, Stream::Records(records)) => {
            Ok(Stream::Records(select_active(&records)))
        }
        (Command::Sort { order }, Stream::Records(records)) => {
            Ok(Stream::Records(sort_by_last_name(&records, *order)))
        }
        (Command::Tabulate { columns }, Stream::Records(records)) => {
            Ok(Stream::Table(tabulate(&records, columns)?))
        }
        (Command::Csv, Stream::Table(table)) => Ok(Stream::Text(to_csv(&table))),
        (Command::Html, Stream::Table(table)) => Ok(Stream::Text(to_html(&table, as_of)?)),
        (cmd, stream) => Err(ReportError::Pipeline(format!(
            "{} cannot take {} as input",
            cmd.name(),
            stream.shape()
        ))),
    }
}

/// Execute a pipeline defined by DSL text on input text.
///
/// `as_of` stamps HTML output; it is ignored by the other stages.
pub fn execute_report(
    input_text: &str,
    pipeline_text: &str,
    as_of: NaiveDate,
) -> Result<ReportOutput> {
    let (output, _) = execute_report_debug(input_text, pipeline_text, as_of, &None)?;
    Ok(output)
}

/// Execute a pipeline with debug callbacks for stage-by-stage inspection.
///
/// Returns the report and one `DebugInfo` per stage.
pub fn execute_report_debug(
    input_text: &str,
    pipeline_text: &str,
    as_of: NaiveDate,
    debug: &Option<DebugCallbacks>,
) -> Result<(ReportOutput, Vec<DebugInfo>)> {
    let commands = parse_commands(pipeline_text)?;
    validate(&commands)?;

    let mut debug_info = Vec::with_capacity(commands.len());
    let mut input_count = 0;
    let mut output_count = 0;
    let mut current = Stream::Text(input_text.to_string());

    for (idx, cmd) in commands.iter().enumerate() {
        let stage_name = cmd.name();

        if let Some(debug) = debug
            && let Some(on_start) = &debug.on_stage_start
        {
            on_start(idx, stage_name);
        }

        let input_count_stage = current.count();
        current = apply_command(current, cmd, as_of)
            .map_err(|e| match e {
                ReportError::Pipeline(msg) => {
                    ReportError::Pipeline(format!("Stage {}: {msg}", idx + 1))
                }
                other => other,
            })?;
        let output_count_stage = current.count();

        match cmd {
            Command::Decode => input_count = output_count_stage,
            Command::Tabulate { .. } => output_count = output_count_stage,
            _ => {}
        }

        if let Some(debug) = debug
            && let Some(on_complete) = &debug.on_stage_complete
        {
            on_complete(idx, output_count_stage);
        }

        debug!(
            stage = stage_name,
            input = input_count_stage,
            output = output_count_stage,
            "stage complete"
        );
        debug_info.push(DebugInfo::new(
            stage_name.to_string(),
            input_count_stage,
            output_count_stage,
        ));
    }

    let text = match current {
        Stream::Text(text) => text,
        other => {
            return Err(ReportError::Pipeline(format!(
                "Pipeline ended with {} instead of rendered text",
                other.shape()
            )));
        }
    };

    Ok((
        ReportOutput {
            text,
            input_count,
            output_count,
        },
        debug_info,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const INPUT: &str = r#"[
        {"firstName": "John", "lastName": "Doe", "active": true,
         "socialSecurity": "165-02-2588", "payments": [100, 50.5]},
        {"firstName": "Mary", "lastName": "Jane", "active": false,
         "socialSecurity": "120-23-1234", "payments": [10]},
        {"firstName": "Ann", "lastName": "Adams", "active": true,
         "socialSecurity": "111-22-3333", "payments": [7023]}
    ]"#;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_parse_full_pipeline() {
        let commands = parse_commands(
            r#"PIPE DECODE
| CENSOR
| ACTIVE
| SORT DESC
| TABULATE "Last Name" first total
| CSV
?"#,
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Decode,
                Command::Censor,
                Command::Active,
                Command::Sort {
                    order: SortOrder::Descending
                },
                Command::Tabulate {
                    columns: vec![Column::LastName, Column::FirstName, Column::TotalSalary]
                },
                Command::Csv,
            ]
        );
    }

    #[test]
    fn test_parse_defaults() {
        let commands = parse_commands("PIPE DECODE\n| sort\n| tabulate\n| html").unwrap();
        assert_eq!(
            commands[1],
            Command::Sort {
                order: SortOrder::Ascending
            }
        );
        assert_eq!(
            commands[2],
            Command::Tabulate {
                columns: Column::DEFAULT_HEADER.to_vec()
            }
        );
        assert_eq!(commands[3], Command::Html);
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let commands = parse_commands("# salary report\n\nPIPE\nDECODE\n\n| CSV\n?\n").unwrap();
        assert_eq!(commands, vec![Command::Decode, Command::Csv]);
    }

    #[test]
    fn test_parse_unknown_command_names_line() {
        let err = parse_commands("PIPE DECODE\n| EXPLODE\n| CSV").unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline error: Line 2: Unknown command: EXPLODE"
        );
    }

    #[test]
    fn test_parse_bad_operands() {
        assert!(parse_commands("PIPE DECODE\n| SORT UP").is_err());
        assert!(parse_commands("PIPE DECODE\n| ACTIVE NOW").is_err());
        assert!(parse_commands("PIPE DECODE\n| TABULATE \"Bonus\"").is_err());
        assert!(parse_commands("PIPE DECODE\n| TABULATE \"Last Name").is_err());
    }

    #[test]
    fn test_to_line_round_trips_through_parser() {
        let commands = vec![
            Command::Censor,
            Command::Decode,
            Command::Sort {
                order: SortOrder::Descending,
            },
            Command::Tabulate {
                columns: Column::ALL.to_vec(),
            },
            Command::Html,
        ];
        let text: Vec<String> = commands.iter().map(Command::to_line).collect();
        assert_eq!(parse_commands(&text.join("\n")).unwrap(), commands);
    }

    #[test]
    fn test_execute_report() {
        let pipeline = r#"PIPE DECODE
| ACTIVE
| SORT
| TABULATE
| CSV
?"#;
        let output = execute_report(INPUT, pipeline, as_of()).unwrap();
        assert_eq!(
            output.text,
            "Last Name,First Name,Total Salary\nAdams,Ann,7023\nDoe,John,150.5"
        );
        assert_eq!(output.input_count, 3);
        assert_eq!(output.output_count, 2);
    }

    #[test]
    fn test_censor_before_and_after_decode_agree() {
        let tail = "| ACTIVE\n| TABULATE last ssn\n| CSV";
        let before = execute_report(INPUT, &format!("PIPE CENSOR\n| DECODE\n{tail}"), as_of())
            .unwrap();
        let after = execute_report(INPUT, &format!("PIPE DECODE\n| CENSOR\n{tail}"), as_of())
            .unwrap();
        assert_eq!(before.text, after.text);
        assert_eq!(
            before.text,
            "Last Name,Social Security\nDoe,xxx-xx-2588\nAdams,xxx-xx-3333"
        );
    }

    #[test]
    fn test_inactive_employee_excluded() {
        let output = execute_report(
            INPUT,
            "PIPE DECODE\n| ACTIVE\n| TABULATE\n| CSV",
            as_of(),
        )
        .unwrap();
        assert!(!output.text.contains("Jane"));
        assert!(!output.text.contains("Mary"));
    }

    #[test]
    fn test_html_report_is_stamped() {
        let output = execute_report(INPUT, "PIPE DECODE\n| TABULATE\n| HTML", as_of()).unwrap();
        assert!(output.text.contains("As of 2024-03-15"));
        assert_eq!(output.text.matches("<tr>").count(), 4);
    }

    #[test]
    fn test_first_stage_must_take_text() {
        let err = execute_report(INPUT, "PIPE ACTIVE\n| CSV", as_of()).unwrap_err();
        assert!(err.to_string().contains("ACTIVE cannot be the first stage"));
    }

    #[test]
    fn test_last_stage_must_render() {
        let err = execute_report(INPUT, "PIPE DECODE\n| TABULATE", as_of()).unwrap_err();
        assert!(err.to_string().contains("TABULATE cannot be the last stage"));
    }

    #[test]
    fn test_empty_pipeline() {
        let err = execute_report(INPUT, "# nothing\n", as_of()).unwrap_err();
        assert!(err.to_string().contains("Pipeline is empty"));
    }

    #[test]
    fn test_stage_shape_mismatch() {
        let err = execute_report(INPUT, "PIPE DECODE\n| CSV", as_of()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline error: Stage 2: CSV cannot take records as input"
        );

        let err =
            execute_report(INPUT, "PIPE DECODE\n| TABULATE\n| SORT\n| CSV", as_of()).unwrap_err();
        assert!(err.to_string().contains("SORT cannot take a table as input"));
    }

    #[test]
    fn test_malformed_input_propagates() {
        let err = execute_report("not json", "PIPE DECODE\n| TABULATE\n| CSV", as_of())
            .unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(_)));
    }

    #[test]
    fn test_debug_info_counts() {
        let (output, info) = execute_report_debug(
            INPUT,
            "PIPE DECODE\n| ACTIVE\n| TABULATE\n| CSV",
            as_of(),
            &None,
        )
        .unwrap();
        assert_eq!(output.output_count, 2);
        assert_eq!(
            info,
            vec![
                DebugInfo::new("DECODE".to_string(), 1, 3),
                DebugInfo::new("ACTIVE".to_string(), 3, 2),
                DebugInfo::new("TABULATE".to_string(), 2, 2),
                DebugInfo::new("CSV".to_string(), 2, 1),
            ]
        );
    }

    #[test]
    fn test_debug_callbacks_fire_per_stage() {
        let started = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::new(RefCell::new(Vec::new()));
        let started_cb = Rc::clone(&started);
        let completed_cb = Rc::clone(&completed);

        let callbacks = DebugCallbacks {
            on_stage_start: Some(Box::new(move |idx: usize, name: &str| {
                started_cb.borrow_mut().push((idx, name.to_string()));
            })),
            on_stage_complete: Some(Box::new(move |idx: usize, count: usize| {
                completed_cb.borrow_mut().push((idx, count));
            })),
        };

        execute_report_debug(
            INPUT,
            "PIPE DECODE\n| ACTIVE\n| TABULATE\n| CSV",
            as_of(),
            &Some(callbacks),
        )
        .unwrap();

        assert_eq!(
            *started.borrow(),
            vec![
                (0, "DECODE".to_string()),
                (1, "ACTIVE".to_string()),
                (2, "TABULATE".to_string()),
                (3, "CSV".to_string()),
            ]
        );
        assert_eq!(*completed.borrow(), vec![(0, 3), (1, 2), (2, 2), (3, 1)]);
    }
}
