//! Line normalizer feeding the tag parser.
//!
//! Input is pulled one line at a time into a bounded buffer. Before a line is
//! handed out, standalone tag lines are trimmed down to the bare tag (their
//! indentation is kept aside for partials) and complete comments are elided.

use crate::error::TemplateError;
use std::io::{BufRead, Read};

pub const DEFAULT_MAX_LINE_SIZE: usize = 1024;

const STANDALONE_SIGILS: &[char] = &['#', '^', '/', '>', '=', '!'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

pub(crate) struct TemplateReader<R> {
    input: R,
    max_line_size: usize,
    line: String,
    pos: usize,
    indent: String,
    delimiters: Delimiters,
}

impl<R: BufRead> TemplateReader<R> {
    pub fn new(input: R, max_line_size: usize) -> Self {
        Self {
            input,
            max_line_size: max_line_size.max(1),
            line: String::new(),
            pos: 0,
            indent: String::new(),
            delimiters: Delimiters::default(),
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Applies from the next line loaded; the current line is already normalized.
    pub fn set_delimiters(&mut self, delimiters: Delimiters) {
        self.delimiters = delimiters;
    }

    /// Indentation stripped from the current line, empty unless it was standalone.
    pub fn indent(&self) -> &str {
        &self.indent
    }

    pub fn read_char(&mut self) -> Result<Option<char>, TemplateError> {
        if !self.fill()? {
            return Ok(None);
        }
        let c = self.line[self.pos..].chars().next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        Ok(c)
    }

    /// Appends everything before the next `delimiter` to `out` and consumes the
    /// delimiter. Returns `false` at end of input, with the remainder in `out`.
    pub fn read_until(&mut self, delimiter: &str, out: &mut String) -> Result<bool, TemplateError> {
        while self.fill()? {
            let rest = &self.line[self.pos..];
            match rest.find(delimiter) {
                Some(i) => {
                    out.push_str(&rest[..i]);
                    self.pos += i + delimiter.len();
                    return Ok(true);
                }
                None => {
                    out.push_str(rest);
                    self.pos = self.line.len();
                }
            }
        }
        Ok(false)
    }

    /// Makes sure unread characters are buffered; `false` means end of input.
    fn fill(&mut self) -> Result<bool, TemplateError> {
        while self.pos >= self.line.len() {
            if !self.load_line()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn load_line(&mut self) -> Result<bool, TemplateError> {
        self.line.clear();
        self.pos = 0;
        self.indent.clear();

        let mut buf = Vec::new();
        loop {
            if self.read_physical_line(&mut buf)? == 0 {
                break;
            }
            // a comment left open at the end of the line swallows the next one
            match std::str::from_utf8(&buf) {
                Ok(text) if has_open_comment(text, &self.delimiters) => continue,
                _ => break,
            }
        }
        if buf.is_empty() {
            return Ok(false);
        }
        let raw = String::from_utf8(buf)?;

        let line = match standalone_tag(&raw, &self.delimiters) {
            Some(tag) => {
                self.indent.push_str(leading_whitespace(&raw));
                tag
            }
            None => raw.as_str(),
        };
        self.line = elide_comments(line, &self.delimiters);
        Ok(true)
    }

    fn read_physical_line(&mut self, buf: &mut Vec<u8>) -> Result<usize, TemplateError> {
        let n = (&mut self.input)
            .take(self.max_line_size as u64)
            .read_until(b'\n', buf)?;
        if n == self.max_line_size
            && buf.last() != Some(&b'\n')
            && !self.input.fill_buf()?.is_empty()
        {
            return Err(TemplateError::LineBufferOverflow(self.max_line_size));
        }
        Ok(n)
    }
}

/// The bare tag of a standalone line: one tag, nothing else but whitespace,
/// of a kind that produces no output of its own.
fn standalone_tag<'a>(line: &'a str, delimiters: &Delimiters) -> Option<&'a str> {
    let trimmed = line.trim();
    let inner = trimmed
        .strip_prefix(delimiters.open.as_str())?
        .strip_suffix(delimiters.close.as_str())?;
    if inner.starts_with(STANDALONE_SIGILS) && !inner.contains(delimiters.close.as_str()) {
        Some(trimmed)
    } else {
        None
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn comment_opener(delimiters: &Delimiters) -> String {
    format!("{}!", delimiters.open)
}

fn has_open_comment(text: &str, delimiters: &Delimiters) -> bool {
    let opener = comment_opener(delimiters);
    let mut rest = text;
    while let Some(start) = rest.find(&opener) {
        let body = &rest[start + opener.len()..];
        match body.find(delimiters.close.as_str()) {
            Some(end) => rest = &body[end + delimiters.close.len()..],
            None => return true,
        }
    }
    false
}

/// Removes every complete comment. An unterminated one is left in place so the
/// parser reports the unclosed tag.
fn elide_comments(text: &str, delimiters: &Delimiters) -> String {
    let opener = comment_opener(delimiters);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(&opener) {
        let body = &rest[start + opener.len()..];
        match body.find(delimiters.close.as_str()) {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &body[end + delimiters.close.len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}
