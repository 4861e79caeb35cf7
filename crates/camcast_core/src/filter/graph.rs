//! Structured filter-graph value type.
//!
//! A graph is an ordered list of statements, each reading labeled input
//! pads and producing labeled output pads, plus one distinguished video
//! output label. Statements may only reference pads produced by earlier
//! statements (or demuxer pads like `0:v`), so a structurally valid graph
//! is a DAG by construction.

use std::collections::HashSet;

use thiserror::Error;

/// Errors from structural validation of a filter graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("statement {index} references undefined label '[{label}]'")]
    UndefinedLabel { index: usize, label: String },

    #[error("label '[{label}]' is produced more than once")]
    DuplicateLabel { label: String },

    #[error("output label '[{label}]' is never produced")]
    MissingOutput { label: String },

    #[error("output label '[{label}]' must be the final statement's sole output")]
    MisplacedOutput { label: String },

    #[error("graph has no statements")]
    Empty,
}

/// A single `[in..]filter[out..]` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStatement {
    /// Input pad labels, bracket-free (`0:v`, `v1`, ...).
    pub inputs: Vec<String>,
    /// Filter body, e.g. `scale=640:720,setpts=PTS-STARTPTS`.
    pub filter: String,
    /// Output pad labels, bracket-free.
    pub outputs: Vec<String>,
}

impl FilterStatement {
    pub fn new(inputs: Vec<String>, filter: impl Into<String>, outputs: Vec<String>) -> Self {
        Self {
            inputs,
            filter: filter.into(),
            outputs,
        }
    }
}

impl std::fmt::Display for FilterStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for input in &self.inputs {
            write!(f, "[{}]", input)?;
        }
        write!(f, "{}", self.filter)?;
        for output in &self.outputs {
            write!(f, "[{}]", output)?;
        }
        Ok(())
    }
}

/// An ordered filter graph with one distinguished video output label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    statements: Vec<FilterStatement>,
    output: String,
}

impl FilterGraph {
    /// Create an empty graph that will produce `output`.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            statements: Vec::new(),
            output: output.into(),
        }
    }

    pub fn push(&mut self, statement: FilterStatement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[FilterStatement] {
        &self.statements
    }

    /// The label the consuming command maps as its video stream.
    pub fn output_label(&self) -> &str {
        &self.output
    }

    /// Serialize to FFmpeg `-filter_complex` syntax: semicolon-separated
    /// `[in]filter[out]` statements.
    pub fn serialize(&self) -> String {
        self.statements
            .iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Check the structural invariants:
    /// - every referenced label was produced by an earlier statement
    ///   (demuxer pads containing `:` are exempt)
    /// - no label is produced twice
    /// - the output label is produced exactly once, by the final
    ///   statement, as its sole output
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.statements.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut defined: HashSet<&str> = HashSet::new();
        let mut output_produced = false;

        for (index, statement) in self.statements.iter().enumerate() {
            for label in &statement.inputs {
                // Demuxer pads reference input streams, not graph nodes.
                if label.contains(':') {
                    continue;
                }
                if !defined.contains(label.as_str()) {
                    return Err(GraphError::UndefinedLabel {
                        index,
                        label: label.clone(),
                    });
                }
            }
            for label in &statement.outputs {
                if !defined.insert(label.as_str()) {
                    return Err(GraphError::DuplicateLabel {
                        label: label.clone(),
                    });
                }
                if *label == self.output {
                    output_produced = true;
                }
            }
        }

        if !output_produced {
            return Err(GraphError::MissingOutput {
                label: self.output.clone(),
            });
        }

        if let Some(last) = self.statements.last() {
            if last.outputs.len() != 1 || last.outputs[0] != self.output {
                return Err(GraphError::MisplacedOutput {
                    label: self.output.clone(),
                });
            }
        }

        Ok(())
    }
}
