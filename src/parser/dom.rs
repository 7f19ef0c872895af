use std::sync::LazyLock;

use scraper::ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Collapse whitespace runs to single spaces and trim.
pub fn clean(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element and its descendants.
pub fn text_of(el: ElementRef) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// Heading depth: `<h2>` → 2. None for anything that isn't h1-h6.
pub fn heading_level(el: ElementRef) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

pub fn is_heading(el: ElementRef) -> bool {
    heading_level(el).is_some()
}

pub fn has_class(el: ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Every element of the document in document order.
pub fn elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

/// Nearest heading at `el` or above it, levels 2 through `max_level`.
pub fn enclosing_heading(el: ElementRef, max_level: u8) -> Option<ElementRef> {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find(|e| matches!(heading_level(*e), Some(l) if l >= 2 && l <= max_level))
}

/// Document-order successor: first child, else next sibling, else the
/// nearest ancestor's next sibling.
fn next_node<'a>(node: NodeRef<'a, Node>) -> Option<NodeRef<'a, Node>> {
    if let Some(child) = node.first_child() {
        return Some(child);
    }
    let mut cur = Some(node);
    while let Some(n) = cur {
        if let Some(sib) = n.next_sibling() {
            return Some(sib);
        }
        cur = n.parent();
    }
    None
}

/// Document-order predecessor: mirror of `next_node`. Ancestors count as
/// preceding, after the subtrees of earlier siblings.
fn prev_node<'a>(node: NodeRef<'a, Node>) -> Option<NodeRef<'a, Node>> {
    if let Some(sib) = node.prev_sibling() {
        let mut deepest = sib;
        while let Some(last) = deepest.last_child() {
            deepest = last;
        }
        return Some(deepest);
    }
    node.parent()
}

/// Every node after `start` in document order.
pub fn following<'a>(start: NodeRef<'a, Node>) -> impl Iterator<Item = NodeRef<'a, Node>> + 'a {
    std::iter::successors(next_node(start), |n| next_node(*n))
}

/// Elements after `start` in document order.
pub fn following_elements<'a>(
    start: NodeRef<'a, Node>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    following(start).filter_map(ElementRef::wrap)
}

/// Elements before `start` in reverse document order.
pub fn preceding_elements<'a>(
    start: NodeRef<'a, Node>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    std::iter::successors(prev_node(start), |n| prev_node(*n)).filter_map(ElementRef::wrap)
}

/// First `<img>` inside `el`, by document order.
pub fn first_img(el: ElementRef) -> Option<ElementRef> {
    el.select(&IMG).next()
}

/// Lazy-loading wikis keep the real image in `data-src`; `src` is the eager
/// fallback.
pub fn img_src(img: ElementRef) -> String {
    img.value()
        .attr("data-src")
        .or_else(|| img.value().attr("src"))
        .unwrap_or("")
        .to_string()
}

/// Text of `el` excluding any infobox fragment nested inside it (an `aside`
/// or anything classed `portable-infobox`). The shared tree is never
/// mutated; exclusion happens during the walk.
pub fn text_without_infobox(el: ElementRef) -> String {
    let mut parts = Vec::new();
    for child in el.children() {
        collect_text(child, &mut parts);
    }
    clean(&parts.join(" "))
}

fn collect_text(node: NodeRef<Node>, out: &mut Vec<String>) {
    match node.value() {
        Node::Text(t) => out.push(t.to_string()),
        Node::Element(e) if e.name() == "aside" || e.classes().any(|c| c == "portable-infobox") => {}
        Node::Element(_) => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_whitespace() {
        assert_eq!(clean("  a \n\t b  "), "a b");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn heading_levels() {
        let doc = Html::parse_document("<h2>two</h2><h4>four</h4><p>not</p>");
        let levels: Vec<_> = elements(&doc).filter_map(heading_level).collect();
        assert_eq!(levels, vec![2, 4]);
    }

    #[test]
    fn following_walks_document_order() {
        let doc = Html::parse_document("<h2>Start</h2><div><p>a</p><p>b</p></div><h3>End</h3>");
        let start = elements(&doc).find(|e| e.value().name() == "h2").unwrap();
        let names: Vec<_> = following_elements(*start)
            .map(|e| e.value().name().to_string())
            .collect();
        assert_eq!(names, vec!["div", "p", "p", "h3"]);
    }

    #[test]
    fn preceding_finds_nearest_first() {
        let doc = Html::parse_document("<figure>f</figure><div>d</div><h3>Name</h3>");
        let start = elements(&doc).find(|e| e.value().name() == "h3").unwrap();
        let first = preceding_elements(*start)
            .find(|e| matches!(e.value().name(), "figure" | "div"))
            .unwrap();
        assert_eq!(first.value().name(), "div");
    }

    #[test]
    fn text_skips_nested_infobox() {
        let doc = Html::parse_document(
            r#"<p>Real text <span class="portable-infobox">junk</span> more.</p>"#,
        );
        let p = elements(&doc).find(|e| e.value().name() == "p").unwrap();
        assert_eq!(text_without_infobox(p), "Real text more.");
    }

    #[test]
    fn img_src_prefers_data_src() {
        let doc = Html::parse_document(
            r#"<img data-src="https://img.example/real.png" src="data:image/gif;base64,x">"#,
        );
        let img = elements(&doc).find(|e| e.value().name() == "img").unwrap();
        assert_eq!(img_src(img), "https://img.example/real.png");
    }
}
