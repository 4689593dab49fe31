//! Rendering of analysis outcomes.

use std::path::Path;

use pixtext_worker::AnalyzeOutcome;

/// Formats outcomes for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Report {
    /// Strip the trailing separator after the last line.
    pub trim: bool,
    /// Prefix each result with its file name.
    pub show_names: bool,
}

impl Report {
    /// Renders one outcome. Text goes to stdout, failures to stderr.
    pub fn render(&self, path: &Path, outcome: &AnalyzeOutcome) -> Rendered {
        match outcome {
            AnalyzeOutcome::Text(text) => {
                let text = if self.trim { text.trim_end() } else { text.as_str() };
                let line = if self.show_names {
                    format!("==> {} <==\n{text}", path.display())
                } else {
                    text.to_string()
                };
                Rendered::Stdout(line)
            }
            AnalyzeOutcome::Failed(message) => {
                Rendered::Stderr(format!("{}: {message}", path.display()))
            }
        }
    }
}

/// Output destined for one of the standard streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Stdout(String),
    Stderr(String),
}

impl Rendered {
    /// Writes the output to its stream.
    pub fn emit(&self) {
        match self {
            Self::Stdout(line) => println!("{line}"),
            Self::Stderr(line) => eprintln!("{line}"),
        }
    }
}
