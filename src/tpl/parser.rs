use crate::error::TemplateError;
use crate::loader::{self, FileLoader, PartialLoader};
use crate::models::parser_options::ParserOptions;
use crate::tpl::reader::{Delimiters, TemplateReader};
use crate::tpl::{Node, PartialTable, Template};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Parses template sources into [`Template`]s.
///
/// A parser owns the cache of partials it has resolved: each partial name is
/// loaded and parsed at most once until [`Parser::clear_partials`] is called.
/// Parsing takes `&mut self`; use one parser per thread.
pub struct Parser {
    options: ParserOptions,
    loader: Option<Box<dyn PartialLoader>>,
    partials: PartialTable,
    pending: HashSet<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            loader: None,
            partials: PartialTable::new(),
            pending: HashSet::new(),
        }
    }

    /// Replaces the default file loader (`directory/name.extension`).
    pub fn with_loader(mut self, loader: impl PartialLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn parse_str(&mut self, source: &str) -> Result<Template, TemplateError> {
        self.parse_template(source.as_bytes())
    }

    pub fn parse_reader<R: Read>(&mut self, reader: R) -> Result<Template, TemplateError> {
        self.parse_template(BufReader::new(reader))
    }

    /// Parses a template file. Partials are then looked up next to it, with
    /// the same extension.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Template, TemplateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.options.directory = parent.to_path_buf();
        }
        if let Some(ext) = path.extension() {
            self.options.extension = ext.to_string_lossy().into_owned();
        }
        debug!(path = %path.display(), "parsing template file");
        self.parse_reader(File::open(path)?)
    }

    pub fn clear_partials(&mut self) {
        debug!(count = self.partials.len(), "clearing partial cache");
        self.partials.clear();
    }

    pub fn partial_names(&self) -> impl Iterator<Item = &str> {
        self.partials.keys().map(String::as_str)
    }

    /// Parses every partial found under `dir` into the cache, replacing cached
    /// entries of the same name. Returns the number of partials loaded.
    pub fn preload_partials(&mut self, dir: impl AsRef<Path>) -> Result<usize, TemplateError> {
        let dir = dir.as_ref();
        let found = loader::discover(dir, &self.options.extension)?;
        for (name, path) in &found {
            debug!(partial = %name, path = %path.display(), "preloading partial");
            let nodes = self
                .parse_document(BufReader::new(File::open(path)?))
                .map_err(|e| TemplateError::PartialLoad {
                    name: name.clone(),
                    source: Box::new(e),
                })?;
            self.partials.insert(name.clone(), nodes.into());
        }
        Ok(found.len())
    }

    fn parse_template<R: BufRead>(&mut self, input: R) -> Result<Template, TemplateError> {
        let nodes = self.parse_document(input)?;
        Ok(Template::new(nodes, self.partials.clone()))
    }

    /// One independent document: its own reader, default delimiters.
    fn parse_document<R: BufRead>(&mut self, input: R) -> Result<Vec<Node>, TemplateError> {
        let mut reader = TemplateReader::new(input, self.options.max_line_size);
        self.parse_nested(&mut reader, None)
    }

    fn parse_nested<R: BufRead>(
        &mut self,
        reader: &mut TemplateReader<R>,
        stopper: Option<&str>,
    ) -> Result<Vec<Node>, TemplateError> {
        let saved = reader.delimiters().clone();
        let result = self.parse_body(reader, stopper);
        reader.set_delimiters(saved);
        result
    }

    fn parse_body<R: BufRead>(
        &mut self,
        reader: &mut TemplateReader<R>,
        stopper: Option<&str>,
    ) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        loop {
            let Delimiters { open, close } = reader.delimiters().clone();
            if !reader.read_until(&open, &mut text)? {
                break;
            }
            append_text(&mut nodes, &mut text);

            let mut body = String::new();
            match reader.read_char()? {
                None => return Err(TemplateError::UnclosedTag),
                Some('{') => {
                    if !reader.read_until(&format!("}}{}", close), &mut body)? {
                        return Err(TemplateError::UnclosedLiteralTag);
                    }
                    let name = non_empty(body.trim())?;
                    nodes.push(Node::LiteralVariable(name.to_string()));
                }
                Some(c) => {
                    body.push(c);
                    if !reader.read_until(&close, &mut body)? {
                        return Err(TemplateError::UnclosedTag);
                    }
                    let tag = non_empty(body.trim())?;
                    let mut chars = tag.chars();
                    let sigil = chars.next().unwrap_or_default();
                    let name = chars.as_str().trim();

                    match sigil {
                        '&' => nodes.push(Node::LiteralVariable(non_empty(name)?.to_string())),
                        '#' => {
                            let name = non_empty(name)?;
                            let children = self.parse_nested(reader, Some(name))?;
                            nodes.push(Node::Section {
                                name: name.to_string(),
                                children,
                            });
                        }
                        '^' => {
                            let name = non_empty(name)?;
                            let children = self.parse_nested(reader, Some(name))?;
                            nodes.push(Node::InvertedSection {
                                name: name.to_string(),
                                children,
                            });
                        }
                        '/' => {
                            let name = non_empty(name)?;
                            if stopper != Some(name) {
                                return Err(TemplateError::UnmatchedSectionClose {
                                    expected: stopper.map(str::to_string),
                                    found: name.to_string(),
                                });
                            }
                            return Ok(nodes);
                        }
                        '>' => {
                            let name = non_empty(name)?;
                            self.resolve_partial(name)?;
                            nodes.push(Node::Partial {
                                name: name.to_string(),
                                indent: reader.indent().to_string(),
                            });
                        }
                        '=' => {
                            let delimiters = parse_delimiters(tag)?;
                            trace!(open = %delimiters.open, close = %delimiters.close, "delimiter change");
                            reader.set_delimiters(delimiters);
                        }
                        // a comment the normalizer could not see, opened after a
                        // delimiter change on the same line
                        '!' => {}
                        _ => nodes.push(Node::Variable(tag.to_string())),
                    }
                }
            }
        }

        if let Some(section) = stopper {
            return Err(TemplateError::UnclosedSection(section.to_string()));
        }
        append_text(&mut nodes, &mut text);
        Ok(nodes)
    }

    fn resolve_partial(&mut self, name: &str) -> Result<(), TemplateError> {
        // a partial reached again while its own parse is running is recursive;
        // its tree lands in the cache once that parse finishes
        if self.partials.contains_key(name) || self.pending.contains(name) {
            return Ok(());
        }
        debug!(partial = name, "loading partial");
        let source = self.load(name)?;

        self.pending.insert(name.to_string());
        let result = self.parse_document(source.as_bytes());
        self.pending.remove(name);

        let nodes = result.map_err(|e| TemplateError::PartialLoad {
            name: name.to_string(),
            source: Box::new(e),
        })?;
        self.partials.insert(name.to_string(), Arc::from(nodes));
        Ok(())
    }

    fn load(&self, name: &str) -> Result<String, TemplateError> {
        match &self.loader {
            Some(loader) => loader.load(name),
            None => FileLoader::new(&self.options.directory, &self.options.extension).load(name),
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(name: &str) -> Result<&str, TemplateError> {
    if name.is_empty() {
        Err(TemplateError::EmptyTag)
    } else {
        Ok(name)
    }
}

/// `=open close=` with both parts non-empty and separated by whitespace.
fn parse_delimiters(tag: &str) -> Result<Delimiters, TemplateError> {
    let inner = tag
        .strip_prefix('=')
        .and_then(|t| t.strip_suffix('='))
        .ok_or_else(|| TemplateError::IncorrectDelimiter(tag.to_string()))?;
    let parts: Vec<&str> = inner.split_whitespace().collect();
    match parts.as_slice() {
        [open, close] => Ok(Delimiters {
            open: open.to_string(),
            close: close.to_string(),
        }),
        _ => Err(TemplateError::IncorrectDelimiter(tag.to_string())),
    }
}

fn append_text(nodes: &mut Vec<Node>, text: &mut String) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last_text)) = nodes.last_mut() {
        last_text.push_str(text);
        text.clear();
    } else {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}
