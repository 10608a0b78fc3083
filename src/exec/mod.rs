// src/exec/mod.rs

//! What happens to an accepted event.
//!
//! - [`backend`] provides the `EventSink` trait the dispatcher calls, and the
//!   `TriggeredEvent` it passes.
//! - [`template`] expands the `%r %p %f %e %x %n` placeholders.
//! - [`command`] spawns the rendered command through `sh -c`, detached.
//! - [`format`] prints the rendered line to stdout instead.

pub mod backend;
pub mod command;
pub mod format;
pub mod template;

pub use backend::{EventSink, ExecError, TriggeredEvent};
pub use command::CommandExecutor;
pub use format::FormatPrinter;
pub use template::{CommandTemplate, TemplateContext};

use crate::types::ExecMode;

/// Build the production sink for `mode`.
pub fn sink_for(mode: &ExecMode, root: &str) -> Box<dyn EventSink + Send> {
    match mode {
        ExecMode::Command(template) => Box::new(CommandExecutor::new(template.clone(), root)),
        ExecMode::Format(template) => Box::new(FormatPrinter::stdout(template.clone(), root)),
    }
}
