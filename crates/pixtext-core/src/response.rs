//! Text extraction from image analysis responses.
//!
//! The provider answers with a document shaped as
//!
//! ```text
//! { "readResult": { "blocks": [ { "lines": [ { "text": "..." } ] } ] } }
//! ```
//!
//! [`extract_text`] walks blocks in order, then lines in order, and appends
//! each line's `text` followed by a single space. The trailing space after
//! the last line is part of the output.
//!
//! A `text` holding a number or a boolean is read as its JSON rendering, so
//! `{"text": 42}` contributes `"42 "`. A missing, null, object or array
//! `text` is a fault.
//!
//! Extraction never panics. When the body is not JSON, or the walk hits a
//! missing or mistyped field, the text gathered so far is kept, the fault is
//! logged, and an [`Extraction::Partial`] is returned.

use std::borrow::Cow;
use std::iter::Enumerate;
use std::slice;

use serde_json::Value;

use crate::{Error, Result};

/// Tracing target for response extraction.
pub const TRACING_TARGET: &str = "pixtext_core::response";

const EMPTY: &[Value] = &[];

/// Separator appended after every line.
pub const LINE_SEPARATOR: char = ' ';

/// Outcome of walking a response body.
#[derive(Debug)]
pub enum Extraction {
    /// Every block and line was read.
    Complete(String),
    /// The walk stopped at a fault; `text` holds the lines read before it.
    Partial {
        /// Text accumulated before the fault.
        text: String,
        /// Where and why the walk stopped.
        error: Error,
    },
}

impl Extraction {
    fn partial(text: String, error: Error) -> Self {
        tracing::warn!(
            target: TRACING_TARGET,
            error = %error,
            recovered_len = text.len(),
            "Failed to extract text from response"
        );
        Self::Partial { text, error }
    }

    /// Returns the extracted text, complete or not.
    pub fn text(&self) -> &str {
        match self {
            Self::Complete(text) | Self::Partial { text, .. } => text,
        }
    }

    /// Consumes the extraction and returns its text.
    pub fn into_text(self) -> String {
        match self {
            Self::Complete(text) | Self::Partial { text, .. } => text,
        }
    }

    /// Returns true if the whole document was read.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Returns the fault that stopped the walk, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Complete(_) => None,
            Self::Partial { error, .. } => Some(error),
        }
    }

    /// Converts into a `Result`, discarding partial text on failure.
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Complete(text) => Ok(text),
            Self::Partial { error, .. } => Err(error),
        }
    }
}

/// Extracts the recognized text from a response body.
///
/// # Examples
///
/// ```rust
/// use pixtext_core::extract_text;
///
/// let body = r#"{"readResult":{"blocks":[{"lines":[{"text":"Hello"},{"text":"World"}]}]}}"#;
/// assert_eq!(extract_text(body).text(), "Hello World ");
///
/// let broken = extract_text("not json");
/// assert_eq!(broken.text(), "");
/// assert!(!broken.is_complete());
/// ```
pub fn extract_text(response_body: &str) -> Extraction {
    match OcrResponseDocument::parse(response_body) {
        Ok(document) => document.extract(),
        Err(error) => Extraction::partial(String::new(), error),
    }
}

/// Parsed response body.
///
/// The schema is checked lazily while walking, so a document whose later
/// blocks are broken still yields its earlier lines.
#[derive(Debug, Clone)]
pub struct OcrResponseDocument {
    root: Value,
}

impl OcrResponseDocument {
    /// Parses a response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedResponse`](crate::ErrorKind::MalformedResponse)
    /// error if the body is not valid JSON.
    pub fn parse(response_body: &str) -> Result<Self> {
        let root = serde_json::from_str(response_body)?;
        Ok(Self { root })
    }

    /// Iterates over line texts in document order.
    ///
    /// Texts are borrowed from the document unless they had to be rendered
    /// from a number or boolean.
    ///
    /// The iterator yields at most one error, after which it ends.
    pub fn lines(&self) -> Lines<'_> {
        let blocks = self
            .root
            .get("readResult")
            .ok_or_else(|| fault_at("readResult", "missing"))
            .and_then(|read_result| {
                read_result
                    .get("blocks")
                    .and_then(Value::as_array)
                    .ok_or_else(|| fault_at("readResult.blocks", "missing or not an array"))
            });

        match blocks {
            Ok(blocks) => Lines {
                blocks: blocks.iter().enumerate(),
                current: None,
                fault: None,
                finished: false,
            },
            Err(fault) => Lines {
                blocks: EMPTY.iter().enumerate(),
                current: None,
                fault: Some(fault),
                finished: false,
            },
        }
    }

    /// Concatenates every line, each followed by [`LINE_SEPARATOR`].
    pub fn extract(&self) -> Extraction {
        let mut text = String::new();

        for line in self.lines() {
            match line {
                Ok(line) => {
                    text.push_str(&line);
                    text.push(LINE_SEPARATOR);
                }
                Err(error) => return Extraction::partial(text, error),
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            text_len = text.len(),
            "Extracted text from response"
        );

        Extraction::Complete(text)
    }
}

/// Iterator over the line texts of an [`OcrResponseDocument`].
#[derive(Debug)]
pub struct Lines<'a> {
    blocks: Enumerate<slice::Iter<'a, Value>>,
    current: Option<(usize, Enumerate<slice::Iter<'a, Value>>)>,
    fault: Option<Error>,
    finished: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Result<Cow<'a, str>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(fault) = self.fault.take() {
            self.finished = true;
            return Some(Err(fault));
        }

        loop {
            if let Some((block_index, lines)) = &mut self.current
                && let Some((line_index, line)) = lines.next()
            {
                return match line.get("text").and_then(line_text) {
                    Some(text) => Some(Ok(text)),
                    None => {
                        let path =
                            format!("readResult.blocks[{block_index}].lines[{line_index}].text");
                        self.finished = true;
                        Some(Err(fault_at(&path, "missing or not a scalar")))
                    }
                };
            }

            let Some((block_index, block)) = self.blocks.next() else {
                self.finished = true;
                return None;
            };

            match block.get("lines").and_then(Value::as_array) {
                Some(lines) => self.current = Some((block_index, lines.iter().enumerate())),
                None => {
                    let path = format!("readResult.blocks[{block_index}].lines");
                    self.finished = true;
                    return Some(Err(fault_at(&path, "missing or not an array")));
                }
            }
        }
    }
}

/// Reads a line's `text` value. Numbers and booleans are rendered as JSON.
fn line_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text)),
        Value::Number(_) | Value::Bool(_) => Some(Cow::Owned(value.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn fault_at(path: &str, reason: &str) -> Error {
    Error::malformed_response().with_message(format!("{path}: {reason}"))
}
