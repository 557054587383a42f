//! Source formatters for generated Go code.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread;

use proxygen_core::error::{Error, Result};
use proxygen_core::format::SourceFormatter;
use tracing::debug;

use crate::parser::GoParser;

/// Validates the text with tree-sitter-go and normalizes its layout: tab
/// indentation by nesting depth, no trailing whitespace, no runs of blank
/// lines, one final newline.
pub struct GoFormatter {
    parser: Mutex<GoParser>,
}

impl GoFormatter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: Mutex::new(GoParser::new()?),
        })
    }
}

impl SourceFormatter for GoFormatter {
    fn format(&self, source: &str) -> Result<String> {
        let syntax_error = {
            let mut parser = self
                .parser
                .lock()
                .map_err(|_| Error::Generic("go parser lock poisoned".to_string()))?;
            parser.check(source)?
        };
        if let Some(error) = syntax_error {
            return Err(Error::format(
                format!("syntax error at line {}, column {}", error.line, error.column),
                error.fragment,
            ));
        }
        Ok(normalize(source))
    }
}

/// Re-indent `source` by brace depth. Raw string literals are copied as is.
pub fn normalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut depth: usize = 0;
    let mut in_raw_string = false;
    let mut blank_run = false;

    for line in source.lines() {
        if in_raw_string {
            out.push_str(line);
            out.push('\n');
            in_raw_string = scan(line, true).in_raw_string;
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !blank_run && !out.is_empty() && !out.ends_with("{\n") && !out.ends_with("(\n") {
                out.push('\n');
            }
            blank_run = true;
            continue;
        }
        blank_run = false;

        let scanned = scan(trimmed, false);
        let indent = depth.saturating_sub(scanned.leading_closers);
        for _ in 0..indent {
            out.push('\t');
        }
        out.push_str(trimmed);
        out.push('\n');

        depth = (depth + scanned.opens).saturating_sub(scanned.closes);
        in_raw_string = scanned.in_raw_string;
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[derive(Default)]
struct LineScan {
    opens: usize,
    closes: usize,
    leading_closers: usize,
    in_raw_string: bool,
}

/// Count the brackets of one line outside of strings, runes and comments.
fn scan(line: &str, starts_in_raw_string: bool) -> LineScan {
    let mut result = LineScan {
        in_raw_string: starts_in_raw_string,
        ..LineScan::default()
    };
    let mut leading = true;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if result.in_raw_string {
            if ch == '`' {
                result.in_raw_string = false;
            }
            continue;
        }
        match ch {
            '`' => {
                result.in_raw_string = true;
                leading = false;
            }
            '"' | '\'' => {
                while let Some(next) = chars.next() {
                    if next == '\\' {
                        chars.next();
                    } else if next == ch {
                        break;
                    }
                }
                leading = false;
            }
            '/' if chars.peek() == Some(&'/') => break,
            '{' | '(' | '[' => {
                result.opens += 1;
                leading = false;
            }
            '}' | ')' | ']' => {
                result.closes += 1;
                if leading {
                    result.leading_closers += 1;
                }
            }
            ch if ch.is_whitespace() => {}
            _ => leading = false,
        }
    }
    result
}

/// Pipes the text through the `gofmt` binary.
#[derive(Clone, Debug)]
pub struct GofmtFormatter {
    binary: PathBuf,
}

impl GofmtFormatter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for GofmtFormatter {
    fn default() -> Self {
        Self::new("gofmt")
    }
}

impl SourceFormatter for GofmtFormatter {
    fn format(&self, source: &str) -> Result<String> {
        debug!(binary = %self.binary.display(), "running gofmt");
        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                Error::Generic(format!("failed to run {}: {}", self.binary.display(), err))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Generic("gofmt stdin unavailable".to_string()))?;
        let input = source.to_string();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| Error::Generic("gofmt writer thread panicked".to_string()))??;

        if output.status.success() {
            return String::from_utf8(output.stdout)
                .map_err(|err| Error::Generic(format!("gofmt produced invalid UTF-8: {}", err)));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.lines().next().unwrap_or("gofmt failed").to_string();
        let fragment = error_line(&message)
            .and_then(|line| source.lines().nth(line.saturating_sub(1)))
            .unwrap_or_default()
            .to_string();
        Err(Error::format(message, fragment))
    }
}

/// Line number of a `<standard input>:LINE:COL: message` diagnostic.
fn error_line(message: &str) -> Option<usize> {
    let mut parts = message.splitn(4, ':');
    parts.next()?;
    parts.next()?.trim().parse().ok()
}
