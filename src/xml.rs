//! Namespace tolerant element lookup.
//!
//! HD DVD playlists come with the authoring tool's namespace, with none, or
//! with elements that moved under a different parent. [`ElementFinder`]
//! resolves a path in three steps and returns the first non-empty result:
//!
//! 1. the path with every segment in the root element's namespace,
//! 2. the path with un-namespaced segments,
//! 3. every descendant whose local name equals the last segment.

use roxmltree::{Document, Node};

#[derive(Debug, Clone, Copy)]
pub struct ElementFinder<'a> {
    namespace: Option<&'a str>,
}

impl<'a> ElementFinder<'a> {
    /// A finder using the namespace of the document's root element.
    pub fn for_document(doc: &'a Document<'_>) -> Self {
        Self {
            namespace: doc.root_element().tag_name().namespace(),
        }
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.namespace
    }

    /// All elements matching `.//path` below `scope`.
    ///
    /// `path` is a `/`-separated list of local names, e.g.
    /// `"TrackNavigationList/AudioTrack"`.
    pub fn find_all<'n, 'input>(&self, scope: Node<'n, 'input>, path: &str) -> Vec<Node<'n, 'input>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some(last) = segments.last().copied() else {
            return Vec::new();
        };

        if let Some(ns) = self.namespace {
            let found = walk(scope, &segments, Some(ns));
            if !found.is_empty() {
                return found;
            }
        }

        let found = walk(scope, &segments, None);
        if !found.is_empty() {
            return found;
        }

        scope
            .descendants()
            .filter(|n| *n != scope && n.is_element() && n.tag_name().name() == last)
            .collect()
    }
}

fn matches(node: &Node, name: &str, ns: Option<&str>) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == ns
}

fn walk<'n, 'input>(scope: Node<'n, 'input>, path: &[&str], ns: Option<&str>) -> Vec<Node<'n, 'input>> {
    let Some((first, rest)) = path.split_first() else {
        return Vec::new();
    };

    let mut current: Vec<Node<'n, 'input>> = scope
        .descendants()
        .filter(|n| *n != scope && matches(n, first, ns))
        .collect();
    for segment in rest {
        current = current
            .iter()
            .flat_map(|n| n.children().filter(move |c| matches(c, segment, ns)))
            .collect();
    }
    current
}

/// Attribute value or an empty string.
pub fn attr(node: &Node, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

/// Attribute value, `None` when absent.
pub fn opt_attr(node: &Node, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}
