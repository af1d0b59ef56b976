//! Streaming XML parser that records the source line of every start tag
//!
//! CDD Principle: Anti-Corruption Layer - quick-xml events are translated into the domain tree
//! - One forward pass, an explicit stack of open elements and a pending text buffer
//! - Line numbers come from the reader's byte position, never from the text content

use super::{Document, DocumentBuilder, ElementId};
use crate::domain::violations::{GuardianError, GuardianResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse a descriptor file from disk
pub fn parse_file<P: AsRef<Path>>(path: P) -> GuardianResult<Document> {
    let path = path.as_ref();
    tracing::debug!("Reading {} (exists: {})", path.display(), path.exists());

    let file = File::open(path).map_err(|e| GuardianError::io(path, e))?;
    let mut bytes = Vec::new();
    std::io::BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| GuardianError::io(path, e))?;

    parse_bytes(&bytes)
}

/// Parse a document from any byte stream. The stream is consumed entirely.
pub fn parse<R: Read>(mut reader: R) -> GuardianResult<Document> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| GuardianError::io("<stream>", e))?;
    parse_bytes(&bytes)
}

/// Parse a document held in memory
pub fn parse_bytes(input: &[u8]) -> GuardianResult<Document> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    TreeBuilder::new(input).run()
}

/// Maps byte offsets to 1-based line numbers. Offsets must be queried in
/// non-decreasing order.
struct LineTracker<'a> {
    input: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineTracker<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, position: usize) -> usize {
        let position = position.min(self.input.len());
        if position > self.offset {
            self.line += self.input[self.offset..position]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.offset = position;
        }
        self.line
    }

    /// Line of an arbitrary offset, for diagnostics
    fn line_of(&self, position: usize) -> usize {
        let position = position.min(self.input.len());
        1 + self.input[..position].iter().filter(|&&b| b == b'\n').count()
    }
}

struct TreeBuilder<'a> {
    reader: Reader<&'a [u8]>,
    lines: LineTracker<'a>,
    builder: DocumentBuilder,
    stack: Vec<ElementId>,
    text: String,
    root_closed: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(input);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = true;
        config.expand_empty_elements = false;

        Self {
            reader,
            lines: LineTracker::new(input),
            builder: DocumentBuilder::default(),
            stack: Vec::new(),
            text: String::new(),
            root_closed: false,
        }
    }

    fn run(mut self) -> GuardianResult<Document> {
        loop {
            // the next event starts where the previous one ended
            let event_start = self.reader.buffer_position() as usize;
            let event = self
                .reader
                .read_event()
                .map_err(|e| self.malformed_at_error(e.to_string()))?;

            match event {
                Event::Start(start) => {
                    self.start_element(&start, event_start)?;
                }
                Event::Empty(start) => {
                    self.start_element(&start, event_start)?;
                    self.end_element()?;
                }
                Event::End(_) => {
                    self.end_element()?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| self.malformed(event_start, e.to_string()))?;
                    self.characters(&text, event_start)?;
                }
                Event::CData(cdata) => {
                    let text = std::str::from_utf8(&cdata)
                        .map_err(|e| self.malformed(event_start, e.to_string()))?
                        .to_owned();
                    self.characters(&text, event_start)?;
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }

        if let Some(&open) = self.stack.last() {
            let line = self.builder.elements[open.0].line as usize;
            let name = self.builder.elements[open.0].name.clone();
            return Err(GuardianError::malformed(
                line,
                format!("element <{name}> is never closed"),
            ));
        }
        if !self.root_closed {
            return Err(GuardianError::malformed(1, "document has no root element"));
        }

        let document = self.builder.finish();
        tracing::debug!(
            "Root element: {} ({} elements)",
            document.root().name(),
            document.element_count()
        );
        Ok(document)
    }

    fn start_element(&mut self, start: &BytesStart<'_>, position: usize) -> GuardianResult<()> {
        if self.root_closed {
            return Err(self.malformed(position, "content after the root element"));
        }
        self.flush_text();

        let name = self.decode(start.name().as_ref(), position)?;
        let mut attributes: Vec<(String, String)> = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| self.malformed(position, e.to_string()))?;
            let key = self.decode(attribute.key.as_ref(), position)?;
            let value = attribute
                .unescape_value()
                .map_err(|e| self.malformed(position, e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        let line = self.lines.line_at(position) as u32;
        let parent = self.stack.last().copied();
        let id = self.builder.open(name, attributes, parent, line);
        self.stack.push(id);
        Ok(())
    }

    fn end_element(&mut self) -> GuardianResult<()> {
        self.flush_text();
        let closed = self.stack.pop().ok_or_else(|| {
            let position = self.reader.buffer_position() as usize;
            self.malformed(position, "closing tag without a matching start tag")
        })?;

        match self.stack.last() {
            Some(&parent) => self.builder.push_child(parent, closed),
            None => self.root_closed = true,
        }
        Ok(())
    }

    fn characters(&mut self, text: &str, position: usize) -> GuardianResult<()> {
        if self.stack.is_empty() {
            // only whitespace may surround the root element
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(self.malformed(position, "text outside the root element"));
        }
        self.text.push_str(text);
        Ok(())
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        if let Some(&top) = self.stack.last() {
            let text = std::mem::take(&mut self.text);
            self.builder.push_text(top, text);
        }
    }

    fn decode(&self, bytes: &[u8], position: usize) -> GuardianResult<String> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| self.malformed(position, format!("invalid UTF-8 in name: {e}")))
    }

    fn malformed(&self, position: usize, message: impl Into<String>) -> GuardianError {
        GuardianError::malformed(self.lines.line_of(position), message)
    }

    fn malformed_at_error(&self, message: String) -> GuardianError {
        self.malformed(self.reader.error_position() as usize, message)
    }
}
