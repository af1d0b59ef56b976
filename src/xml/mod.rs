//! In-memory XML tree with source line numbers
//!
//! CDD Principle: Domain Model - The document is an immutable arena of elements
//! - Elements are addressed by `ElementId`; parent links are plain indices
//! - `ElementRef` is a cheap borrowed handle for navigating the tree
//! - Construction happens only in the line-tracking parser

mod parser;

pub use parser::{parse, parse_bytes, parse_file};

/// Index of an element inside its owning `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(usize);

/// A child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(ElementId),
    Text(String),
}

#[derive(Debug, Clone)]
struct ElementData {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    parent: Option<ElementId>,
    line: u32,
}

/// A parsed XML document.
///
/// Elements are stored in start-tag order, so the root always occupies the
/// first slot and iteration over `elements()` is document order.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<ElementData>,
}

impl Document {
    /// The document element
    pub fn root(&self) -> ElementRef<'_> {
        ElementRef {
            doc: self,
            id: ElementId(0),
        }
    }

    /// Number of elements in the document
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        (0..self.elements.len()).map(move |i| ElementRef {
            doc: self,
            id: ElementId(i),
        })
    }

    fn data(&self, id: ElementId) -> &ElementData {
        &self.elements[id.0]
    }
}

/// Builder used by the parser. Elements are allocated when their start tag
/// is seen and linked into their parent when their end tag is seen.
#[derive(Debug, Default)]
struct DocumentBuilder {
    elements: Vec<ElementData>,
}

impl DocumentBuilder {
    fn open(
        &mut self,
        name: String,
        attributes: Vec<(String, String)>,
        parent: Option<ElementId>,
        line: u32,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(ElementData {
            name,
            attributes,
            children: Vec::new(),
            parent,
            line,
        });
        id
    }

    fn push_text(&mut self, id: ElementId, text: String) {
        let children = &mut self.elements[id.0].children;
        // adjacent runs form one logical text node
        if let Some(Node::Text(previous)) = children.last_mut() {
            previous.push_str(&text);
        } else {
            children.push(Node::Text(text));
        }
    }

    fn push_child(&mut self, parent: ElementId, child: ElementId) {
        self.elements[parent.0].children.push(Node::Element(child));
    }

    fn finish(self) -> Document {
        Document {
            elements: self.elements,
        }
    }
}

/// Borrowed handle to an element of a `Document`
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    doc: &'a Document,
    id: ElementId,
}

impl<'a> ElementRef<'a> {
    /// Tag name as written in the source
    pub fn name(&self) -> &'a str {
        &self.doc.data(self.id).name
    }

    /// Line (1-indexed) of this element's start tag
    pub fn line(&self) -> u32 {
        self.doc.data(self.id).line
    }

    /// Attributes in source order
    pub fn attributes(&self) -> &'a [(String, String)] {
        &self.doc.data(self.id).attributes
    }

    /// Value of the attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.doc.data(self.id).parent.map(|id| ElementRef {
            doc: self.doc,
            id,
        })
    }

    /// All child nodes, text included
    pub fn children(&self) -> &'a [Node] {
        &self.doc.data(self.id).children
    }

    /// Child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let doc = self.doc;
        self.children().iter().filter_map(move |node| match node {
            Node::Element(id) => Some(ElementRef { doc, id: *id }),
            Node::Text(_) => None,
        })
    }

    /// First descendant element with the given name, in document order
    pub fn first_descendant(&self, name: &str) -> Option<ElementRef<'a>> {
        self.child_elements().find_map(|child| {
            if child.name() == name {
                Some(child)
            } else {
                child.first_descendant(name)
            }
        })
    }

    /// Character data directly under this element, untrimmed
    pub fn text(&self) -> String {
        self.children()
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Character data of this element and all descendants, in document order
    pub fn text_content(&self) -> String {
        let mut content = String::new();
        self.collect_text(&mut content);
        content
    }

    fn collect_text(&self, out: &mut String) {
        for node in self.children() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(id) => ElementRef {
                    doc: self.doc,
                    id: *id,
                }
                .collect_text(out),
            }
        }
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for ElementRef<'_> {}
