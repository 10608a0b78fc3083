// src/exec/template.rs

//! `%` placeholder substitution for `--command` and `--format`.
//!
//! | token | value |
//! |-------|-------|
//! | `%r`  | root path |
//! | `%p`  | directory containing the triggering entry |
//! | `%f`  | triggering file or directory name |
//! | `%e`  | event name |
//! | `%x`  | first capture group of the catch pattern |
//! | `%n`  | 1-based count of triggered events |
//!
//! Substitution is a single left-to-right pass, so a value that itself
//! contains `%f` is never expanded again. Unknown sequences stay verbatim.

use super::backend::TriggeredEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
}

/// Values substituted into a [`CommandTemplate`].
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub root: &'a str,
    pub event: &'a TriggeredEvent,
    pub count: u64,
}

impl CommandTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, ctx: &TemplateContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        let mut chars = self.source.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let Some(token) = chars.next() else {
                out.push('%');
                break;
            };
            match token {
                'r' => out.push_str(ctx.root),
                'p' => out.push_str(&ctx.event.dir),
                'f' => out.push_str(&ctx.event.name),
                'e' => out.push_str(ctx.event.kind),
                'x' => out.push_str(ctx.event.capture.as_deref().unwrap_or("")),
                'n' => out.push_str(&ctx.count.to_string()),
                other => {
                    out.push('%');
                    out.push(other);
                }
            }
        }
        out
    }
}
