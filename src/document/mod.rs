// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Document store for live sets.
//!
//! This module provides:
//! - A generic ordered element tree (`Element`, `Node`)
//! - The `Document` wrapper with track lookup/removal by `Id`
//! - XML reading/writing and the gzip container (`serializer`)

pub mod serializer;
pub mod xml;

pub use serializer::{PendingSave, SaveEvent, DEFAULT_COMPRESSION_LEVEL};

use crate::error::{EditError, Result};

/// Tag of the section holding one element per track
pub const TRACKS_TAG: &str = "Tracks";

/// Attribute carrying a track's unique identifier
pub const ID_ATTR: &str = "Id";

/// A child of an element: nested element or character data
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Unescaped character data (whitespace included)
    Text(String),
}

impl Node {
    /// Get the element if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Check if this node is whitespace-only text
    fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

/// A generic element: tag, ordered attributes, ordered children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Element tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// All attributes in document order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// All child nodes in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Append a child element
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append character data
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Direct child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First direct child element with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.elements().find(|e| e.tag == tag)
    }

    /// First descendant (not self) with the given tag, in document order
    pub fn find(&self, tag: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable variant of [`Element::find`]
    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Element> {
        for node in &mut self.children {
            if let Node::Element(child) = node {
                if child.tag == tag {
                    return Some(child);
                }
                if let Some(found) = child.find_mut(tag) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Resolve a path whose first step may match at any depth.
    ///
    /// `["Name", "EffectiveName"]` finds the first descendant `Name`
    /// that has a direct `EffectiveName` child and returns that child.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        let (first, rest) = path.split_first()?;
        for child in self.elements() {
            if child.tag == *first {
                if let Some(found) = child.child_path(rest) {
                    return Some(found);
                }
            }
            if let Some(found) = child.find_path(path) {
                return Some(found);
            }
        }
        None
    }

    /// Follow a chain of direct children
    fn child_path(&self, path: &[&str]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |element, tag| element.child(tag))
    }

    /// Remove every direct child element matching `predicate`.
    ///
    /// Whitespace text directly before a removed element goes with it, so
    /// the surviving siblings and the closing tag keep their indentation.
    pub fn remove_elements<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let mut removed = 0;
        let mut kept: Vec<Node> = Vec::with_capacity(self.children.len());

        for node in self.children.drain(..) {
            match node {
                Node::Element(element) if predicate(&element) => {
                    removed += 1;
                    if kept.last().map_or(false, Node::is_blank_text) {
                        kept.pop();
                    }
                }
                node => kept.push(node),
            }
        }

        self.children = kept;
        removed
    }
}

/// A parsed live set document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Wrap a root element
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse from XML text
    pub fn parse(text: &str) -> Result<Self> {
        xml::parse(text).map(Self::new)
    }

    /// Serialize to XML bytes with a UTF-8 declaration
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        xml::write(&self.root)
    }

    /// Root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The `Tracks` section
    pub fn tracks(&self) -> Result<&Element> {
        self.root.find(TRACKS_TAG).ok_or_else(missing_tracks)
    }

    /// Mutable `Tracks` section
    pub fn tracks_mut(&mut self) -> Result<&mut Element> {
        self.root.find_mut(TRACKS_TAG).ok_or_else(missing_tracks)
    }

    /// Identifiers of all track elements, in document order
    pub fn track_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .tracks()?
            .elements()
            .filter_map(|track| track.attr(ID_ATTR))
            .map(str::to_string)
            .collect())
    }

}

fn missing_tracks() -> EditError {
    EditError::Structure(format!("no <{}> section found", TRACKS_TAG))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse(
            r#"<Ableton><LiveSet><Tracks>
    <AudioTrack Id="1"><Name><EffectiveName Value="Kick"/></Name></AudioTrack>
    <MidiTrack Id="2"><Name><EffectiveName Value="Lead"/></Name></MidiTrack>
    <AudioTrack Id="3"/>
</Tracks></LiveSet></Ableton>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_attr_set_and_replace() {
        let mut element = Element::new("Track").with_attr("Id", "7");
        assert_eq!(element.attr("Id"), Some("7"));

        element.set_attr("Id", "8");
        element.set_attr("Color", "3");
        assert_eq!(element.attr("Id"), Some("8"));
        assert_eq!(element.attributes().len(), 2);
        assert_eq!(element.attributes()[0].0, "Id");
    }

    #[test]
    fn test_find_is_depth_first() {
        let doc = sample();
        let tracks = doc.tracks().unwrap();
        assert_eq!(tracks.tag(), "Tracks");
        assert_eq!(tracks.elements().count(), 3);
    }

    #[test]
    fn test_find_path() {
        let doc = sample();
        let lead = doc.tracks().unwrap().elements().nth(1).unwrap();
        let name = lead.find_path(&["Name", "EffectiveName"]).unwrap();
        assert_eq!(name.attr("Value"), Some("Lead"));

        let bare = doc.tracks().unwrap().elements().nth(2).unwrap();
        assert!(bare.find_path(&["Name", "EffectiveName"]).is_none());
    }

    #[test]
    fn test_find_path_skips_name_without_child() {
        let element = Element::new("Track")
            .with_child(Element::new("Name"))
            .with_child(
                Element::new("Device").with_child(
                    Element::new("Name")
                        .with_child(Element::new("EffectiveName").with_attr("Value", "Deep")),
                ),
            );
        let found = element.find_path(&["Name", "EffectiveName"]).unwrap();
        assert_eq!(found.attr("Value"), Some("Deep"));
    }

    #[test]
    fn test_track_ids_in_order() {
        let doc = sample();
        assert_eq!(doc.track_ids().unwrap(), vec!["1", "2", "3"]);
    }

    fn remove_ids(doc: &mut Document, ids: &[&str]) -> usize {
        doc.tracks_mut()
            .unwrap()
            .remove_elements(|track| track.attr(ID_ATTR).map_or(false, |id| ids.contains(&id)))
    }

    #[test]
    fn test_remove_elements() {
        let mut doc = sample();
        assert_eq!(remove_ids(&mut doc, &["2"]), 1);
        assert_eq!(doc.track_ids().unwrap(), vec!["1", "3"]);

        // Already gone
        assert_eq!(remove_ids(&mut doc, &["2"]), 0);
    }

    #[test]
    fn test_remove_takes_leading_whitespace() {
        let mut doc = sample();
        let before = doc.tracks().unwrap().children().len();
        remove_ids(&mut doc, &["1"]);
        let after = doc.tracks().unwrap().children().len();
        assert_eq!(before - after, 2);
    }

    #[test]
    fn test_remove_last_track_keeps_closing_indent() {
        let mut doc = Document::parse(
            "<Ableton>\n\t<Tracks>\n\t\t<AudioTrack Id=\"1\"/>\n\t\t<AudioTrack Id=\"2\"/>\n\t</Tracks>\n</Ableton>",
        )
        .unwrap();
        remove_ids(&mut doc, &["2"]);
        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();
        assert!(xml.contains("<AudioTrack Id=\"1\"/>\n\t</Tracks>"), "{}", xml);

        remove_ids(&mut doc, &["1"]);
        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();
        assert!(xml.contains("<Tracks>\n\t</Tracks>"), "{}", xml);
    }

    #[test]
    fn test_missing_tracks_section() {
        let doc = Document::parse("<Ableton><LiveSet/></Ableton>").unwrap();
        assert!(matches!(doc.tracks(), Err(EditError::Structure(_))));
        assert!(matches!(doc.track_ids(), Err(EditError::Structure(_))));
    }
}
