//! Redaction of social security numbers.
//!
//! Any `ddd-dd-dddd` run of ASCII digits becomes `xxx-xx-dddd`, keeping the
//! last four digits. Replacement repeats until nothing matches, so the output
//! never matches the pattern and censoring twice is the same as censoring once.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::Employee;

static SSN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{3}-[0-9]{2}-([0-9]{4})").expect("Invalid regex pattern"));

/// Replace every identifier in `text` with its censored form.
///
/// Kept digits can complete a new identifier with the text after them
/// (`123-45-678912-34-5678`), so this loops to a fixed point.
pub fn censor(text: &str) -> String {
    let mut censored = text.to_string();
    loop {
        censored = match SSN_REGEX.replace_all(&censored, "xxx-xx-$1") {
            Cow::Borrowed(_) => return censored,
            Cow::Owned(next) => next,
        };
    }
}

/// Censor every text field of one record.
pub fn censor_employee(employee: &Employee) -> Employee {
    employee.with_text_fields(censor)
}

/// Censor every text field of every record.
pub fn censor_records(records: &[Employee]) -> Vec<Employee> {
    records.iter().map(censor_employee).collect()
}
