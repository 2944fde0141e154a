//! Owned element tree built from an HTML snapshot.
//!
//! `scraper::Html` is neither `Send` nor cheap to share, so documents are
//! flattened into an index arena once and handed around as [`Element`]
//! handles that clone an `Arc`.

use std::fmt;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// Index of an element inside its [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Element-only view of a parsed document, in document order.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<NodeData>,
}

impl DomTree {
    /// Parse a full HTML document.
    pub fn parse(html: &str) -> Arc<DomTree> {
        let document = Html::parse_document(html);
        let (tree, _) = Self::build(&document, None);
        Arc::new(tree)
    }

    /// Parse a document and resolve every element matching `css`.
    pub fn parse_and_select(html: &str, css: &str) -> Result<(Arc<DomTree>, Vec<Element>)> {
        let selector = Selector::parse(css)
            .map_err(|e| Error::Dom(format!("Invalid selector '{}': {:?}", css, e)))?;

        let document = Html::parse_document(html);
        let (tree, selected) = Self::build(&document, Some(&selector));
        let tree = Arc::new(tree);

        let matches = selected
            .into_iter()
            .map(|i| Element::new(tree.clone(), NodeId(i)))
            .collect();

        Ok((tree, matches))
    }

    fn build(document: &Html, selector: Option<&Selector>) -> (DomTree, Vec<usize>) {
        let wanted: Vec<_> = selector
            .map(|sel| document.select(sel).map(|el| el.id()).collect())
            .unwrap_or_default();

        let mut nodes: Vec<NodeData> = Vec::new();
        let mut selected = Vec::new();
        let mut stack: Vec<(ElementRef<'_>, Option<usize>)> = vec![(document.root_element(), None)];

        while let Some((el, parent)) = stack.pop() {
            let idx = nodes.len();
            if wanted.contains(&el.id()) {
                selected.push(idx);
            }
            nodes.push(NodeData {
                tag: el.value().name().to_ascii_lowercase(),
                attrs: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent,
                children: Vec::new(),
            });
            if let Some(p) = parent {
                nodes[p].children.push(idx);
            }

            let children: Vec<ElementRef<'_>> = el.children().filter_map(ElementRef::wrap).collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        (DomTree { nodes }, selected)
    }

    /// The `<html>` element.
    pub fn root(self: &Arc<Self>) -> Element {
        Element::new(self.clone(), NodeId(0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All elements satisfying `pred`, in document order.
    pub fn find_all<F>(self: &Arc<Self>, pred: F) -> Vec<Element>
    where
        F: Fn(&Element) -> bool,
    {
        (0..self.nodes.len())
            .map(|i| Element::new(self.clone(), NodeId(i)))
            .filter(|el| pred(el))
            .collect()
    }
}

/// Cheap, thread-safe handle to one element of a [`DomTree`].
#[derive(Clone)]
pub struct Element {
    tree: Arc<DomTree>,
    id: NodeId,
}

impl Element {
    fn new(tree: Arc<DomTree>, id: NodeId) -> Self {
        Self { tree, id }
    }

    fn data(&self) -> &NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &Arc<DomTree> {
        &self.tree
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.data().tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.data()
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of `data-testid`.
    pub fn test_id(&self) -> Option<&str> {
        self.attr("data-testid")
    }

    pub fn parent(&self) -> Option<Element> {
        self.data()
            .parent
            .map(|p| Element::new(self.tree.clone(), NodeId(p)))
    }

    pub fn children(&self) -> Vec<Element> {
        self.data()
            .children
            .iter()
            .map(|&c| Element::new(self.tree.clone(), NodeId(c)))
            .collect()
    }

    /// This element followed by each ancestor up to the root.
    pub fn ancestors_inclusive(&self) -> impl Iterator<Item = Element> + '_ {
        std::iter::successors(Some(self.clone()), |el| el.parent())
    }

    /// Nearest element (starting with this one) satisfying `pred`.
    pub fn closest<F>(&self, pred: F) -> Option<Element>
    where
        F: Fn(&Element) -> bool,
    {
        self.ancestors_inclusive().find(|el| pred(el))
    }

    /// Descendants in document order, excluding this element.
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.data().children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(Element::new(self.tree.clone(), NodeId(idx)));
            stack.extend(self.tree.nodes[idx].children.iter().rev().copied());
        }
        out
    }

    pub fn find_all<F>(&self, pred: F) -> Vec<Element>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants().into_iter().filter(|el| pred(el)).collect()
    }

    pub fn find_first<F>(&self, pred: F) -> Option<Element>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants().into_iter().find(|el| pred(el))
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
            && other.ancestors_inclusive().any(|el| el.id == self.id)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Element");
        dbg.field("tag", &self.tag());
        if let Some(test_id) = self.test_id() {
            dbg.field("data-testid", &test_id);
        }
        dbg.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <article data-testid="tweet">
            <a href="/alice/status/1">time</a>
            <div data-testid="tweetPhoto"><img id="first" src="https://pbs.twimg.com/media/A.jpg"></div>
            <div data-testid="tweetPhoto"><img id="second" src="https://pbs.twimg.com/media/B.jpg"></div>
          </article>
        </body></html>
    "#;

    #[test]
    fn test_select_resolves_to_arena_elements() {
        let (_, matches) = DomTree::parse_and_select(PAGE, "#second").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tag(), "img");
        assert_eq!(
            matches[0].attr("src"),
            Some("https://pbs.twimg.com/media/B.jpg")
        );
    }

    #[test]
    fn test_closest_walks_up_to_container() {
        let (_, matches) = DomTree::parse_and_select(PAGE, "#first").unwrap();
        let article = matches[0]
            .closest(|el| el.tag() == "article")
            .unwrap();
        assert_eq!(article.test_id(), Some("tweet"));
        assert!(article.contains(&matches[0]));
        assert!(!matches[0].contains(&article));
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let tree = DomTree::parse(PAGE);
        let imgs = tree.find_all(|el| el.tag() == "img");
        let ids: Vec<_> = imgs.iter().filter_map(|el| el.attr("id")).collect();
        assert_eq!(ids, vec!["first", "second"]);

        let article = tree.find_all(|el| el.tag() == "article").remove(0);
        let photos = article.find_all(|el| el.test_id() == Some("tweetPhoto"));
        assert_eq!(photos.len(), 2);
    }

    #[test]
    fn test_invalid_selector_is_dom_error() {
        let err = DomTree::parse_and_select(PAGE, "div[").unwrap_err();
        assert!(matches!(err, Error::Dom(_)));
    }

    #[test]
    fn test_elements_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Element>();
    }
}
