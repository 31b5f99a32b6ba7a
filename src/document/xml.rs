// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! XML text <-> element tree.
//!
//! Element order, attribute order and whitespace are kept so an untouched
//! document writes back structurally identical. Comments, processing
//! instructions and the doctype are dropped.
//!
//! Element trees are walked recursively elsewhere, so parsing rejects
//! documents nested deeper than [`MAX_DEPTH`].

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::Element;
use crate::error::{EditError, Result};

/// Deepest element nesting accepted by [`parse`]
pub const MAX_DEPTH: usize = 256;

/// Parse XML text into its root element
pub fn parse(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(EditError::Format(format!(
                    "{} (near byte {})",
                    e,
                    reader.buffer_position()
                )))
            }
        };

        match event {
            Event::Start(ref start) => {
                check_depth(&stack)?;
                stack.push(start_element(start)?);
            }
            Event::Empty(ref start) => {
                check_depth(&stack)?;
                let element = start_element(start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| EditError::format("closing tag without opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref text) => {
                let text = text.unescape().map_err(EditError::format)?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(EditError::format)?;
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(EditError::Format(format!(
            "unexpected end of document inside <{}>",
            open.tag()
        )));
    }

    root.ok_or_else(|| EditError::format("document has no root element"))
}

/// Serialize a root element, preceded by a UTF-8 XML declaration
pub fn write(root: &Element) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(EditError::format)?;
    writer
        .write_event(Event::Text(BytesText::new("\n")))
        .map_err(EditError::format)?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn check_depth(stack: &[Element]) -> Result<()> {
    if stack.len() >= MAX_DEPTH {
        return Err(EditError::Format(format!(
            "elements nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

fn start_element(start: &BytesStart) -> Result<Element> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(EditError::format)?
        .to_string();
    let mut element = Element::new(tag);

    for attr in start.attributes() {
        let attr = attr.map_err(EditError::format)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(EditError::format)?;
        let value = attr.unescape_value().map_err(EditError::format)?;
        element.set_attr(key, value.into_owned());
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(EditError::Format(format!(
            "second root element <{}>",
            element.tag()
        )));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(EditError::format("text outside the root element")),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag());
    for (key, value) in element.attributes() {
        let value = escape_attr(value);
        start.push_attribute(Attribute::from((key.as_bytes(), value.as_bytes())));
    }

    if element.children().is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(EditError::format);
    }

    writer
        .write_event(Event::Start(start))
        .map_err(EditError::format)?;
    for child in element.children() {
        match child {
            super::Node::Element(nested) => write_element(writer, nested)?,
            super::Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(EditError::format)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag())))
        .map_err(EditError::format)
}

/// Escape an attribute value, keeping line breaks and tabs as character
/// references so readers do not normalize them to spaces
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in escape(value).chars() {
        match c {
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c => escaped.push(c),
        }
    }
    escaped
}
