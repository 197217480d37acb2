//! Report pipeline built in code.
//!
//! [`ReportPipeline`] composes the stage functions directly: decode, censor,
//! select, sort, tabulate, render. It produces the same output as the
//! equivalent DSL text run through [`execute_report`](crate::execute_report),
//! which [`ReportPipeline::to_pipeline_text`] generates.

use chrono::NaiveDate;
use tracing::debug;

use crate::censor::censor_records;
use crate::dsl::{Command, ReportOutput};
use crate::error::Result;
use crate::record::decode;
use crate::render::Format;
use crate::select::{SortOrder, select_active, sort_by_last_name};
use crate::table::{Column, tabulate};

/// Builder for a report pipeline.
///
/// Defaults to the standard salary report: censored, active employees only,
/// ascending by last name, default header, CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPipeline {
    censor: bool,
    active_only: bool,
    order: Option<SortOrder>,
    columns: Vec<Column>,
    format: Format,
}

impl Default for ReportPipeline {
    fn default() -> Self {
        Self {
            censor: true,
            active_only: true,
            order: Some(SortOrder::Ascending),
            columns: Column::DEFAULT_HEADER.to_vec(),
            format: Format::Csv,
        }
    }
}

impl ReportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn censor(mut self, censor: bool) -> Self {
        self.censor = censor;
        self
    }

    pub fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Keep records in input order.
    pub fn unsorted(mut self) -> Self {
        self.order = None;
        self
    }

    /// Columns to tabulate, in order. An empty list means the default
    /// header, the same as a bare `TABULATE` stage.
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = if columns.is_empty() {
            Column::DEFAULT_HEADER.to_vec()
        } else {
            columns
        };
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Run every stage over `input`.
    pub fn run(&self, input: &str, as_of: NaiveDate) -> Result<ReportOutput> {
        let decoded = decode(input)?;
        let input_count = decoded.len();

        let records = if self.censor {
            censor_records(&decoded)
        } else {
            decoded
        };
        let records = if self.active_only {
            select_active(&records)
        } else {
            records
        };
        let records = match self.order {
            Some(order) => sort_by_last_name(&records, order),
            None => records,
        };

        let table = tabulate(&records, &self.columns)?;
        let renderer = self.format.renderer(as_of);
        debug!(
            renderer = renderer.name(),
            records = input_count,
            rows = records.len(),
            "rendering report"
        );

        Ok(ReportOutput {
            text: renderer.render(&table)?,
            input_count,
            output_count: records.len(),
        })
    }

    /// The DSL commands equivalent to this pipeline.
    pub fn to_commands(&self) -> Vec<Command> {
        let mut commands = vec![Command::Decode];
        if self.censor {
            commands.push(Command::Censor);
        }
        if self.active_only {
            commands.push(Command::Active);
        }
        if let Some(order) = self.order {
            commands.push(Command::Sort { order });
        }
        commands.push(Command::Tabulate {
            columns: self.columns.clone(),
        });
        commands.push(match self.format {
            Format::Csv => Command::Csv,
            Format::Html => Command::Html,
        });
        commands
    }

    /// Pipeline text that [`parse_commands`](crate::parse_commands) reads back
    /// as [`to_commands`](Self::to_commands).
    pub fn to_pipeline_text(&self) -> String {
        let lines: Vec<String> = self
            .to_commands()
            .iter()
            .enumerate()
            .map(|(i, cmd)| {
                let prefix = if i == 0 { "PIPE" } else { "|" };
                format!("{prefix} {}", cmd.to_line())
            })
            .collect();
        format!("{}\n?", lines.join("\n"))
    }
}
