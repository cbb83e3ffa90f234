use ego_tree::iter::Edge;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose subtree never contributes visible text.
const SKIPPED_TAGS: &[&str] = &["script", "style"];

/// Elements that start and end a line of text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hr", "html", "li", "main", "nav", "ol", "option", "p", "pre", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

/// A parsed HTML document. Parsing is html5ever's error-recovering tree
/// builder, so any input produces a tree.
pub struct Markup {
    doc: Html,
}

impl Markup {
    pub fn parse(html: &str) -> Self {
        Self { doc: Html::parse_document(html) }
    }

    /// First `tag` element whose `attribute` equals `value`. For `class` the
    /// value is matched against each whitespace-separated class token.
    pub fn find_by_attribute(&self, tag: &str, attribute: &str, value: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(tag).ok()?;
        self.doc.select(&sel).find(|el| {
            let e = el.value();
            if attribute == "class" {
                e.classes().any(|c| c == value)
            } else {
                e.attr(attribute) == Some(value)
            }
        })
    }

    pub fn find(&self, tag: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(tag).ok()?;
        self.doc.select(&sel).next()
    }

    pub fn find_all(&self, tag: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(tag) {
            Ok(sel) => self.doc.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Visible text of the whole document, script and style removed.
    pub fn visible_text(&self) -> String {
        block_text(self.doc.root_element())
    }
}

/// Text under `el`, one line per block element, whitespace collapsed inside
/// each line and blank lines dropped.
pub fn block_text(el: ElementRef<'_>) -> String {
    let mut lines = Lines::default();
    walk(el, &mut lines);
    lines.finish()
}

/// Text under `el` on a single line.
pub fn inline_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn walk(el: ElementRef<'_>, out: &mut Lines) {
    // iterative: depth of hostile markup must not grow the call stack
    let mut skipped = 0usize;
    for edge in el.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(e) => {
                    if skipped > 0 || SKIPPED_TAGS.contains(&e.name()) {
                        skipped += 1;
                    } else if BLOCK_TAGS.contains(&e.name()) {
                        out.break_line();
                    }
                }
                Node::Text(t) if skipped == 0 => out.push(t),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(e) = node.value() {
                    if skipped > 0 {
                        skipped -= 1;
                    } else if BLOCK_TAGS.contains(&e.name()) {
                        out.break_line();
                    }
                }
            }
        }
    }
}

#[derive(Default)]
struct Lines {
    done: Vec<String>,
    current: String,
}

impl Lines {
    fn push(&mut self, text: &str) { self.current.push_str(text); }

    fn break_line(&mut self) {
        let line = collapse_whitespace(&self.current);
        if !line.is_empty() { self.done.push(line); }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.done.join("\n")
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                if !buf.is_empty() { buf.push(' '); }
                in_ws = true;
            }
        } else {
            buf.push(ch);
            in_ws = false;
        }
    }
    buf.trim_end().to_string()
}
