//! Output formatting for command results.
//!
//! Results print as JSON (optionally pretty) or CSV. Types that can be
//! flattened into rows implement [`CsvRecordProducer`]; everything printable
//! implements [`Formattable`].

use std::str::FromStr;

use csv::Writer;
use serde::Serialize;
use strum::EnumIter;

pub const JSON: &str = "json";
pub const CSV: &str = "csv";

#[derive(Debug, thiserror::Error)]
pub enum FormattingError {
    #[error("invalid output format {0}")]
    UnsupportedOutputFormat(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    #[error("JSON serialization error: {0}")]
    JsonSerializationError(#[from] serde_json::Error),
    #[error("CSV writer into inner error: {0}")]
    CsvIntoInnerError(#[from] csv::IntoInnerError<Writer<Vec<u8>>>),
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub struct OutputFormatOptions {
    pub with_headers: bool,
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, PartialOrd, EnumIter)]
pub enum OutputFormat {
    Csv(OutputFormatOptions),
    Json(OutputFormatOptions),
}

impl OutputFormat {
    pub fn names() -> Vec<&'static str> {
        vec![JSON, CSV]
    }

    pub fn from_string_with_options(
        format_str: &str,
        options: OutputFormatOptions,
    ) -> Result<OutputFormat, FormattingError> {
        match format_str.to_lowercase().as_str() {
            JSON => Ok(OutputFormat::Json(options)),
            CSV => Ok(OutputFormat::Csv(options)),
            other => Err(FormattingError::UnsupportedOutputFormat(other.to_string())),
        }
    }

    pub fn options(&self) -> &OutputFormatOptions {
        match self {
            OutputFormat::Csv(options) | OutputFormat::Json(options) => options,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Json(OutputFormatOptions::default())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OutputFormat::Csv(_) => write!(f, "{}", CSV),
            OutputFormat::Json(_) => write!(f, "{}", JSON),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FormattingError;

    fn from_str(format_str: &str) -> Result<OutputFormat, FormattingError> {
        Self::from_string_with_options(format_str, OutputFormatOptions::default())
    }
}

/// Flattening into CSV rows.
pub trait CsvRecordProducer {
    fn csv_header(&self) -> Vec<String>;

    fn as_csv_records(&self) -> Vec<Vec<String>>;

    fn to_csv(&self, with_header: bool) -> Result<String, FormattingError> {
        let mut wtr = Writer::from_writer(Vec::new());
        if with_header {
            wtr.write_record(self.csv_header())?;
        }
        for record in self.as_csv_records() {
            wtr.write_record(&record)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(String::from_utf8(wtr.into_inner()?)?)
    }
}

pub trait Formattable {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError>;
}

/// JSON honoring the `pretty` option.
pub fn to_json<T: Serialize + ?Sized>(
    value: &T,
    options: &OutputFormatOptions,
) -> Result<String, FormattingError> {
    if options.pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

/// Format anything that is both serializable and row-shaped.
pub fn format_rows<T: Serialize + CsvRecordProducer>(
    value: &T,
    f: &OutputFormat,
) -> Result<String, FormattingError> {
    match f {
        OutputFormat::Json(options) => to_json(value, options),
        OutputFormat::Csv(options) => value.to_csv(options.with_headers),
    }
}
