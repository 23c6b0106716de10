//! Output modes and rendering of command results and error envelopes.

use crate::error::{CliError, ExitCode};
use clap::{Args, ValueEnum};
use serde_json::{Map, Value, json};
use skucode_shared::{ErrorCode, ErrorEnvelope, ErrorKind, REDACTED, is_secret_key};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `key: value` lines.
    Text,
    /// One pretty JSON object.
    Json,
    /// One compact JSON line.
    Ndjson,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Suppress progress and structured log output on stderr.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
}

impl OutputMode {
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: match args.output {
                Some(format) => format,
                None => OutputFormat::Text,
            },
            no_progress: args.no_progress,
        }
    }

    /// `info:` line for stderr; empty under `--no-progress`.
    fn progress(self, message: &str) -> String {
        if self.no_progress {
            String::new()
        } else {
            format!("info: {message}\n")
        }
    }
}

/// Rendered result of one command.
#[derive(Debug)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: ExitCode,
}

impl CliOutput {
    pub fn write(&self) -> Result<(), CliError> {
        io::stdout().write_all(self.stdout.as_bytes())?;
        if !self.stderr.is_empty() {
            let mut stderr = io::stderr();
            stderr.write_all(self.stderr.as_bytes())?;
            stderr.flush()?;
        }
        Ok(())
    }
}

/// Render a successful result.
///
/// Object fields of `payload` are merged into the JSON and NDJSON documents;
/// text mode prints `text` after the status line.
pub fn format_success(mode: OutputMode, kind: &str, payload: Value, text: String) -> CliOutput {
    let fields = match payload {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let stdout = match mode.format {
        OutputFormat::Text => {
            let mut out = text;
            out.insert_str(0, "status: ok\n");
            out
        },
        OutputFormat::Json => format!("{:#}\n", headed([("status", "ok")], fields)),
        OutputFormat::Ndjson => format!(
            "{}\n",
            headed([("type", "summary"), ("status", "ok"), ("kind", kind)], fields)
        ),
    };
    CliOutput {
        stdout,
        stderr: mode.progress(&format!("{kind} completed")),
        exit_code: ExitCode::Ok,
    }
}

/// Render a failed use case; secret-looking metadata is redacted first.
pub fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let error = redacted(error);
    let stdout = match mode.format {
        OutputFormat::Text => error_text(&error),
        OutputFormat::Json => format!(
            "{:#}\n",
            json!({ "status": "error", "error": error_payload(&error) })
        ),
        OutputFormat::Ndjson => format!(
            "{}\n",
            json!({ "type": "error", "status": "error", "error": error_payload(&error) })
        ),
    };
    CliOutput {
        stdout,
        stderr: mode.progress("command failed"),
        exit_code: envelope_exit_code(&error),
    }
}

/// Expected failures are caller mistakes; I/O codes get their own exit code.
pub fn envelope_exit_code(error: &ErrorEnvelope) -> ExitCode {
    let io_codes = [
        ErrorCode::io(),
        ErrorCode::not_found(),
        ErrorCode::permission_denied(),
    ];
    match error.kind {
        ErrorKind::Expected => ExitCode::InvalidInput,
        ErrorKind::Unexpected if io_codes.contains(&error.code) => ExitCode::Io,
        ErrorKind::Invariant | ErrorKind::Unexpected => ExitCode::Internal,
    }
}

fn headed<const N: usize>(header: [(&str, &str); N], fields: Map<String, Value>) -> Value {
    let mut document: Map<String, Value> = header
        .into_iter()
        .map(|(key, value)| (key.to_owned(), Value::from(value)))
        .collect();
    document.extend(fields);
    Value::Object(document)
}

fn redacted(error: &ErrorEnvelope) -> ErrorEnvelope {
    let mut error = error.clone();
    error
        .metadata
        .iter_mut()
        .filter(|(key, _)| is_secret_key(key))
        .for_each(|(_, value)| REDACTED.clone_into(value));
    error
}

fn error_payload(error: &ErrorEnvelope) -> Value {
    let mut payload = json!({
        "code": error.code.to_string(),
        "message": error.message,
        "kind": error.kind.as_str(),
        "retriable": error.class.is_retriable(),
    });
    if !error.metadata.is_empty() {
        payload["meta"] = json!(error.metadata);
    }
    payload
}

fn error_text(error: &ErrorEnvelope) -> String {
    let mut out = format!(
        "status: error\ncode: {}\nmessage: {}\nkind: {}\n",
        error.code, error.message, error.kind
    );
    for (key, value) in &error.metadata {
        let _ = writeln!(out, "meta.{key}: {value}");
    }
    out
}
