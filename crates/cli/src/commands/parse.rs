//! Parse command: show what a description extracts to, without running models

use anyhow::Result;
use perf_lib::extract_parameters;
use serde::Serialize;

use crate::output::{
    parameter_rows, print_error, print_json, print_success, print_table, OutputFormat,
};

#[derive(Serialize)]
struct ParseFailure<'a> {
    errors: &'a [perf_lib::FieldError],
}

pub fn parse_description(description: &str, format: OutputFormat) -> Result<()> {
    match extract_parameters(description) {
        Ok(params) => {
            match format {
                OutputFormat::Json => print_json(&params),
                OutputFormat::Table => {
                    print_success("All fields found");
                    print_table(&parameter_rows(&params), format);
                }
            }
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Json => print_json(&ParseFailure { errors: &e.errors }),
                OutputFormat::Table => {
                    for field_error in &e.errors {
                        print_error(&field_error.to_string());
                    }
                }
            }
            anyhow::bail!("{} field(s) missing or malformed", e.errors.len())
        }
    }
}
