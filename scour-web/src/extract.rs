//! Visible-text extraction.
//!
//! Parses with `scraper` (html5ever underneath), so malformed markup is
//! repaired the way a browser would and entities come back decoded. Text
//! under non-rendered elements is dropped; block-level elements act as word
//! boundaries so adjacent paragraphs do not run together.
use scraper::{ElementRef, Html, Node};

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extract the human-visible text of an HTML document.
///
/// Pure and infallible: any input yields some (possibly empty) string with
/// whitespace runs collapsed to single spaces.
///
/// ```
/// use scour_web::visible_text;
///
/// let text = visible_text("<html><body><script>x</script><p>Hello</p></body></html>");
/// assert_eq!(text, "Hello");
/// ```
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);

    // The document title is rendered (tab caption) even though it lives in <head>.
    if let Some(title) = document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "head")
        .and_then(|head| {
            head.children()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "title")
        })
    {
        raw.extend(title.text());
        raw.push(' ');
    }

    for node in document.root_element().descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                });
                if !hidden {
                    raw.push_str(text);
                }
            }
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => raw.push(' '),
            _ => {}
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_script_and_style() {
        let html = r#"<html><head><style>.a{color:red}</style></head>
            <body><script>var secret = 1;</script><p>Hello</p><noscript>enable js</noscript></body></html>"#;
        assert_eq!(visible_text(html), "Hello");
    }

    #[test]
    fn keeps_title() {
        let html = "<html><head><title>Quotes</title></head><body><p>to scrape</p></body></html>";
        assert_eq!(visible_text(html), "Quotes to scrape");
    }

    #[test]
    fn inline_elements_do_not_split_words() {
        assert_eq!(visible_text("<p>Hap<b>pi</b>ness</p>"), "Happiness");
    }

    #[test]
    fn block_elements_separate_words() {
        assert_eq!(visible_text("<div>one</div><div>two</div>"), "one two");
        assert_eq!(visible_text("<p>line<br>break</p>"), "line break");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(visible_text("<p>fish &amp; chips&nbsp;now</p>"), "fish & chips now");
    }

    #[test]
    fn malformed_markup_is_best_effort() {
        let text = visible_text("<div><p>unclosed <b>bold <i>both</div> tail");
        assert!(text.contains("unclosed"));
        assert!(text.contains("both"));
        assert!(text.contains("tail"));
    }

    #[test]
    fn plain_text_and_empty_input() {
        assert_eq!(visible_text("just words"), "just words");
        assert_eq!(visible_text(""), "");
    }
}
