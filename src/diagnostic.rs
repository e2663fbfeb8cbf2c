//! User-facing error reports.
//!
//! Failures from every stage are collected as [`Diagnostic`]s and rendered
//! with ariadne against the source text they point into.

use ariadne::{Color, ColorGenerator, Config, Fmt, Label, Report, ReportKind, Source};
use yansi::Paint;

use crate::ast::Span;
use crate::error::{CodegenError, ExecutionError, ParseError};

use std::fmt::Display;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokenize,
    Parse,
    Emit,
    Execute,
    /// A broken invariant inside the session, not a user mistake.
    Internal,
}

impl Stage {
    pub fn code(&self) -> &'static str {
        match self {
            Stage::Tokenize => "LEX",
            Stage::Parse => "SYNTAX",
            Stage::Emit => "EMIT",
            Stage::Execute => "EXEC",
            Stage::Internal => "ICE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
    pub span: Option<Span>,
    pub note: Option<String>,
}

impl Diagnostic {
    pub fn new(stage: Stage, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic {
            stage,
            message: message.into(),
            span,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Wraps a failure of the top-level expression at `span`. A missing
    /// entry symbol means the session lost track of its own unit.
    pub fn execution(error: &ExecutionError, span: Span) -> Self {
        let stage = match error {
            ExecutionError::MissingEntry(_) => Stage::Internal,
            _ => Stage::Execute,
        };
        Diagnostic::new(stage, error.to_string(), Some(span))
    }

    fn label_message(&self, color: bool) -> String {
        match self.stage {
            Stage::Tokenize => format!("{} here", highlight("unrecognized input", Color::BrightRed, color)),
            Stage::Parse => format!("{} here", highlight("unexpected token", Color::BrightRed, color)),
            Stage::Emit => "while emitting this".to_string(),
            Stage::Execute => "while evaluating this".to_string(),
            Stage::Internal => "while handling this".to_string(),
        }
    }

    pub fn to_report(&self, file: &str, color: bool) -> Report<'static, (String, Span)> {
        let span = self.span.clone().unwrap_or(0..0);
        let kind = match self.stage {
            Stage::Internal => ReportKind::Custom("Internal error", Color::Magenta),
            _ => ReportKind::Error,
        };

        let mut report = Report::build(kind, (file.to_string(), span.clone()))
            .with_config(Config::default().with_color(color))
            .with_code(self.stage.code())
            .with_message(&self.message);

        if self.span.is_some() {
            report = report.with_label(
                Label::new((file.to_string(), span))
                    .with_message(self.label_message(color))
                    .with_color(ColorGenerator::new().next()),
            );
        }
        if let Some(note) = &self.note {
            report = report.with_note(note);
        }
        report.finish()
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(error: &ParseError) -> Self {
        let stage = match error {
            ParseError::LexicalAnomaly { .. } => Stage::Tokenize,
            ParseError::UnexpectedToken { .. } => Stage::Parse,
        };
        let diagnostic = Diagnostic::new(stage, error.to_string(), Some(error.span()));

        let expected = match error {
            ParseError::UnexpectedToken { expected, .. }
            | ParseError::LexicalAnomaly { expected, .. } => *expected,
        };
        if expected.contains("prototype") {
            diagnostic.with_note(prototype_syntax())
        } else {
            diagnostic
        }
    }
}

impl From<&CodegenError> for Diagnostic {
    fn from(error: &CodegenError) -> Self {
        let diagnostic = Diagnostic::new(Stage::Emit, error.to_string(), error.span());
        match error {
            CodegenError::UnknownFunction { name, .. } => diagnostic.with_note(format!(
                "declare it first with `extern {}(...)` or define it with `def {}(...)`",
                name, name
            )),
            CodegenError::Redefinition { .. } => {
                diagnostic.with_note("the earlier definition is kept")
            }
            CodegenError::DeclarationInUse { .. } => {
                diagnostic.with_note("functions in this unit already call the earlier declaration")
            }
            _ => diagnostic,
        }
    }
}

fn prototype_syntax() -> String {
    "a prototype looks like `name(arg1, arg2)`; parameters may be omitted: `name()`".to_string()
}

fn highlight(text: impl Display, color: Color, enabled: bool) -> String {
    if enabled {
        Fmt::fg(text.to_string(), color).bold().to_string()
    } else {
        text.to_string()
    }
}

/// Collects diagnostics until the driver renders them.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Renders every collected diagnostic against `source` into `writer`.
    pub fn write<W: Write>(
        &self,
        file: &str,
        source: &str,
        writer: &mut W,
        color: bool,
    ) -> io::Result<()> {
        let source = Source::from(source.to_string());
        for diagnostic in &self.items {
            diagnostic
                .to_report(file, color)
                .write((file.to_string(), source.clone()), &mut *writer)?;
        }
        Ok(())
    }

    pub fn report(&self, file: &str, source: &str) -> io::Result<()> {
        self.write(file, source, &mut io::stderr(), true)
    }
}
