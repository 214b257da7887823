// Copyright 2024 Viktor Reusch
//
// This file is part of gpx_sort.
//
// gpx_sort is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// gpx_sort is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License
// for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with gpx_sort. If not, see <https://www.gnu.org/licenses/>.

//! Minimal XML tree which keeps everything inside the root element as parsed.
//!
//! Elements remember their raw start tag, so attributes are written back
//! unchanged. GPX elements are always written without prefix in the default
//! namespace. Text, CDATA, comments and processing instructions are kept as
//! raw events, which means entities stay escaped exactly like in the input.

use std::io::{self, Write as _};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::name::{Namespace, PrefixDeclaration, ResolveResult};
use quick_xml::{NsReader, Writer};

use crate::Error;

/// Namespace of all GPX 1.1 elements.
pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// Child of an [`Element`].
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Text, CDATA, comment, or processing instruction.
    Leaf(Event<'static>),
}

/// An XML element with its resolved namespace.
#[derive(Debug, Clone)]
pub struct Element {
    start: BytesStart<'static>,
    namespace: Option<String>,
    local_name: String,
    pub children: Vec<Node>,
}

impl Element {
    fn new(namespace: ResolveResult, start: BytesStart<'static>) -> Result<Self, Error> {
        let namespace = match namespace {
            ResolveResult::Bound(Namespace(uri)) => Some(std::str::from_utf8(uri)?.to_owned()),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(Error::Malformed(format!(
                    "undeclared namespace prefix `{}`",
                    String::from_utf8_lossy(&prefix)
                )))
            }
        };
        let local_name = std::str::from_utf8(start.local_name().as_ref())?.to_owned();

        Ok(Self {
            start,
            namespace,
            local_name,
            children: vec![],
        })
    }

    /// Namespace URI of this element, if it has one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Name of this element without prefix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Whether this is the GPX element `local_name`.
    pub fn is_gpx(&self, local_name: &str) -> bool {
        self.namespace() == Some(GPX_NAMESPACE) && self.local_name == local_name
    }

    /// Iterate over the direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Leaf(_) => None,
        })
    }

    /// Find the first descendant GPX element called `local_name`.
    ///
    /// Descendants are searched depth-first in document order.
    pub fn find_gpx(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find_map(|child| {
            if child.is_gpx(local_name) {
                Some(child)
            } else {
                child.find_gpx(local_name)
            }
        })
    }

    /// The unescaped text in front of the first child element.
    pub fn text(&self) -> Result<String, Error> {
        let mut text = String::new();
        for child in &self.children {
            match child {
                Node::Element(_) => break,
                Node::Leaf(Event::Text(t)) => {
                    text.push_str(&t.unescape().map_err(quick_xml::Error::from)?)
                }
                Node::Leaf(Event::CData(c)) => text.push_str(std::str::from_utf8(c)?),
                Node::Leaf(_) => {}
            }
        }
        Ok(text)
    }
}

/// A parsed XML document.
///
/// Only the root element is kept. The XML declaration and everything else
/// outside the root is dropped.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parse a complete XML document from `text`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut reader = NsReader::from_str(text);
        let mut stack: Vec<Element> = vec![];
        let mut root = None;

        loop {
            let (namespace, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(start) => stack.push(Element::new(namespace, start.into_owned())?),
                Event::Empty(start) => {
                    let element = Element::new(namespace, start.into_owned())?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Malformed("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Eof => break,
                event => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Leaf(event.into_owned())),
                    None => check_outside_root(&event)?,
                },
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::Malformed(format!(
                "element `{}` is not closed",
                open.local_name
            )));
        }
        let root = root.ok_or_else(|| Error::Malformed("no root element".to_string()))?;
        Ok(Self { root })
    }

    /// Write the document with an XML declaration to `sink`.
    pub fn write(&self, sink: impl io::Write) -> Result<(), Error> {
        let mut writer = Writer::new(sink);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.get_mut().write_all(b"\n")?;
        write_element(&mut writer, &self.root, None)?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

/// Add a finished `element` to its parent or make it the root.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => {
            return Err(Error::Malformed(format!(
                "second root element `{}`",
                element.local_name
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

/// Only whitespace and markup without content may surround the root.
fn check_outside_root(event: &Event) -> Result<(), Error> {
    match event {
        Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => Ok(()),
        Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => Ok(()),
        _ => Err(Error::Malformed(
            "content outside of the root element".to_string(),
        )),
    }
}

/// Write `element` and its children.
///
/// `default` is the default namespace the output declares at this point.
fn write_element<'a, W: io::Write>(
    writer: &mut Writer<W>,
    element: &'a Element,
    default: Option<&'a str>,
) -> Result<(), Error> {
    let (start, scope) = start_tag(element, default)?;
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start.borrow()))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child, scope)?,
            Node::Leaf(event) => writer.write_event(event.borrow())?,
        }
    }
    writer.write_event(Event::End(start.to_end()))?;
    Ok(())
}

/// Start tag of `element` and the default namespace in scope for its content.
///
/// GPX elements lose their prefix and bindings of a prefix to the GPX
/// namespace are dropped. Unprefixed elements declare the default namespace
/// wherever it differs from `inherited`. The raw tag is reused if nothing
/// changes.
fn start_tag<'a>(
    element: &'a Element,
    inherited: Option<&'a str>,
) -> Result<(BytesStart<'a>, Option<&'a str>), Error> {
    let gpx = element.namespace() == Some(GPX_NAMESPACE);
    let prefixed = element.start.name().prefix().is_some();
    let scope = if gpx || !prefixed {
        element.namespace()
    } else {
        inherited
    };
    let declare = scope != inherited;

    let mut raw_default = None;
    let mut dropped = false;
    let mut kept = vec![];
    for attr in element.start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => {
                let uri = std::str::from_utf8(&attr.value)?;
                raw_default = Some((!uri.is_empty()).then(|| uri.to_owned()));
            }
            Some(PrefixDeclaration::Named(_)) if &*attr.value == GPX_NAMESPACE.as_bytes() => {
                dropped = true;
            }
            _ => kept.push(attr),
        }
    }

    let unchanged = !(gpx && prefixed)
        && !dropped
        && match &raw_default {
            Some(raw) => declare && raw.as_deref() == scope,
            None => !declare,
        };
    if unchanged {
        return Ok((element.start.borrow(), scope));
    }

    let name = if gpx {
        element.local_name()
    } else {
        std::str::from_utf8(element.start.name().into_inner())?
    };
    let mut start = BytesStart::new(name);
    if declare {
        start.push_attribute(("xmlns", scope.unwrap_or("")));
    }
    for attr in kept {
        // Values are written in double quotes.
        if attr.value.contains(&b'"') {
            let value = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
            start.push_attribute(Attribute {
                key: attr.key,
                value: value.into_bytes().into(),
            });
        } else {
            start.push_attribute(attr);
        }
    }
    Ok((start, scope))
}
