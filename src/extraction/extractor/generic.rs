use crate::extraction::markup::Markup;

/// Visible text of an arbitrary page: script and style dropped, one line per
/// block element. Never fails; malformed input yields whatever text survives.
pub fn scrape_generic(html: &str) -> String {
    Markup::parse(html).visible_text()
}
