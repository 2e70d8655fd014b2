mod escape;
mod parser;
pub(crate) mod reader;
mod render;
mod render_context;

pub use escape::escape_html;
pub use parser::Parser;
pub use render_context::Context;

use crate::data::{Value, to_value};
use crate::error::TemplateError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Variable(String),
    LiteralVariable(String),
    Section { name: String, children: Vec<Node> },
    InvertedSection { name: String, children: Vec<Node> },
    Partial { name: String, indent: String },
}

pub(crate) type PartialTable = HashMap<String, Arc<[Node]>>;

/// A parsed template. Immutable once built; rendering borrows it, so one
/// template can be rendered any number of times, from any number of threads.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Arc<[Node]>,
    partials: Arc<PartialTable>,
}

impl Template {
    pub(crate) fn new(nodes: Vec<Node>, partials: PartialTable) -> Self {
        Self {
            nodes: nodes.into(),
            partials: Arc::new(partials),
        }
    }

    /// Parses `source` with a fresh [`Parser`] using default options.
    pub fn parse(source: &str) -> Result<Template, TemplateError> {
        Parser::new().parse_str(source)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The parsed tree of a partial this template can reach.
    pub fn partial(&self, name: &str) -> Option<&[Node]> {
        self.partials.get(name).map(|nodes| &nodes[..])
    }

    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.render_to(data, &mut out);
        out
    }

    pub fn render_to<W: fmt::Write>(&self, data: &Value, out: &mut W) -> fmt::Result {
        let mut ctx = Context::new(data);
        self.render_with(&mut ctx, out)
    }

    /// Renders against an existing context, e.g. one the caller has pushed
    /// extra scopes onto.
    pub fn render_with<W: fmt::Write>(&self, ctx: &mut Context<'_>, out: &mut W) -> fmt::Result {
        render::render(&self.nodes, ctx, &self.partials, out)
    }

    pub fn write_to<W: io::Write>(&self, data: &Value, out: &mut W) -> io::Result<()> {
        let mut adapter = IoAdapter { inner: out, error: None };
        match self.render_to(data, &mut adapter) {
            Ok(()) => Ok(()),
            Err(_) => Err(adapter
                .error
                .unwrap_or_else(|| io::Error::other("formatter error"))),
        }
    }

    pub fn render_serialize<T: ?Sized + Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let value = to_value(data)?;
        Ok(self.render(&value))
    }
}

struct IoAdapter<'w, W> {
    inner: &'w mut W,
    error: Option<io::Error>,
}

impl<W: io::Write> fmt::Write for IoAdapter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}
