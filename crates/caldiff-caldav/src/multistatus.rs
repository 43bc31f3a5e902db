//! WebDAV multistatus decoding.
//!
//! This module parses a multistatus response body into a namespace-agnostic
//! property tree. Two server irregularities are absorbed here, once, so no
//! downstream consumer has to deal with them:
//!
//! - namespace prefixes vary arbitrarily between servers (`d:`, `D:`, none),
//!   so element names are matched by local name only;
//! - elements the schema allows to repeat are often emitted as a bare
//!   singleton, so every child lookup yields a sequence ([`PropNode::all`]).

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{DecodeError, DecodeResult};

/// A node in the decoded property tree.
///
/// Children are keyed by local element name; [`PropNode::all`] is the single
/// cardinality-normalization point for the singleton-vs-list ambiguity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropNode {
    text: String,
    attributes: Vec<(String, String)>,
    children: HashMap<String, Vec<PropNode>>,
}

impl PropNode {
    /// The concatenated, trimmed text content of this element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Looks up an attribute by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All children with the given local name, in document order.
    ///
    /// A singleton child and a repeated child look identical to callers:
    /// both come back as a slice.
    pub fn all(&self, name: &str) -> &[PropNode] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first child with the given local name.
    pub fn first(&self, name: &str) -> Option<&PropNode> {
        self.all(name).first()
    }

    /// The trimmed text of the first child with the given local name,
    /// when non-empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.first(name).map(PropNode::text).filter(|t| !t.is_empty())
    }

    fn push_child(&mut self, name: String, child: PropNode) {
        self.children.entry(name).or_default().push(child);
    }
}

/// One `propstat` block: a status line and the properties it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Propstat {
    /// The raw status text, e.g. `HTTP/1.1 200 OK`.
    pub status: String,
    /// The `prop` subtree.
    pub prop: PropNode,
}

impl Propstat {
    /// Whether this propstat reports success, matched case-insensitively
    /// since servers vary the status-line casing.
    pub fn is_ok(&self) -> bool {
        self.status.to_lowercase().contains("200 ok")
    }
}

/// One `response` element: a resource href plus its propstat blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    /// The resource href as received, not yet resolved.
    pub href: String,
    /// The propstat blocks, in document order.
    pub propstats: Vec<Propstat>,
}

impl ResponseRecord {
    /// The prop tree of the first propstat reporting `200 OK`, if any.
    pub fn ok_prop(&self) -> Option<&PropNode> {
        self.propstats.iter().find(|ps| ps.is_ok()).map(|ps| &ps.prop)
    }

    /// Scans every propstat for a property with the given local name.
    pub fn find_prop(&self, name: &str) -> Option<&PropNode> {
        self.propstats.iter().find_map(|ps| ps.prop.first(name))
    }
}

/// Decodes a multistatus response body into response records.
///
/// Failure here is fatal for the whole call: without a well-formed
/// `multistatus` root there are no record boundaries to recover. A valid
/// document with zero `response` children decodes to an empty vector.
pub fn decode_multistatus(xml: &str) -> DecodeResult<Vec<ResponseRecord>> {
    let (root_name, root) = parse_tree(xml)?;

    if root_name != "multistatus" {
        return Err(DecodeError::NotMultistatus(root_name));
    }

    let records = root
        .all("response")
        .iter()
        .filter_map(|response| {
            // A response without an href has no identity; skip it.
            let href = response.child_text("href")?.to_string();
            let propstats = response
                .all("propstat")
                .iter()
                .map(|ps| Propstat {
                    status: ps.child_text("status").unwrap_or_default().to_string(),
                    prop: ps.first("prop").cloned().unwrap_or_default(),
                })
                .collect();
            Some(ResponseRecord { href, propstats })
        })
        .collect();

    Ok(records)
}

/// Parses an XML document into a generic element tree, stripping namespace
/// prefixes from element names.
fn parse_tree(xml: &str) -> DecodeResult<(String, PropNode)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<(String, PropNode)> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&String::from_utf8_lossy(e.name().as_ref())).to_string();
                stack.push((name, node_with_attributes(&e)));
            }
            Event::Empty(e) => {
                let name = local_name(&String::from_utf8_lossy(e.name().as_ref())).to_string();
                let node = node_with_attributes(&e);
                match stack.last_mut() {
                    Some((_, parent)) => parent.push_child(name, node),
                    // `<multistatus/>` as the entire document.
                    None => return Ok((name, node)),
                }
            }
            Event::Text(t) => {
                if let Some((_, node)) = stack.last_mut() {
                    node.text.push_str(&t.unescape().unwrap_or_default());
                }
            }
            Event::CData(t) => {
                if let Some((_, node)) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(_) => {
                let (name, node) = stack.pop().ok_or(DecodeError::Truncated)?;
                match stack.last_mut() {
                    Some((_, parent)) => parent.push_child(name, node),
                    None => return Ok((name, node)),
                }
            }
            Event::Eof => return Err(DecodeError::Truncated),
            _ => {}
        }
    }
}

fn node_with_attributes(e: &quick_xml::events::BytesStart<'_>) -> PropNode {
    let attributes = e
        .attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            let key = local_name(&String::from_utf8_lossy(attr.key.as_ref())).to_string();
            let value = attr.unescape_value().unwrap_or_default().into_owned();
            (key, value)
        })
        .collect();

    PropNode {
        text: String::new(),
        attributes,
        children: HashMap::new(),
    }
}

/// Extracts the local name from a potentially namespaced element name.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
