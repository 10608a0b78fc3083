// src/exec/format.rs

use std::io::{self, Stdout, Write};

use tracing::info;

use super::backend::{EventSink, ExecError, TriggeredEvent};
use super::template::{CommandTemplate, TemplateContext};

/// `--format` sink: writes one rendered line per event and flushes, so the
/// output can be piped into another program.
#[derive(Debug)]
pub struct FormatPrinter<W: Write = Stdout> {
    template: CommandTemplate,
    root: String,
    count: u64,
    out: W,
}

impl FormatPrinter<Stdout> {
    pub fn stdout(template: impl Into<String>, root: impl Into<String>) -> Self {
        Self::new(template, root, io::stdout())
    }
}

impl<W: Write> FormatPrinter<W> {
    pub fn new(template: impl Into<String>, root: impl Into<String>, out: W) -> Self {
        Self {
            template: CommandTemplate::new(template),
            root: root.into(),
            count: 0,
            out,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for FormatPrinter<W> {
    fn trigger(&mut self, event: &TriggeredEvent) -> Result<(), ExecError> {
        info!(
            event = event.kind,
            path = %format!("{}{}", event.dir, event.name),
            "event triggered"
        );

        self.count += 1;
        let line = self.template.render(&TemplateContext {
            root: &self.root,
            event,
            count: self.count,
        });

        writeln!(self.out, "{line}").map_err(ExecError::Output)?;
        self.out.flush().map_err(ExecError::Output)
    }
}
