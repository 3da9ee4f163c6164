//! HTML element classification and attribute parsing.
//!
//! Used by the HTML minifier to decide where whitespace is significant.

/// Check if an HTML tag is a void element (no closing tag).
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content is not markup).
///
/// `textarea` and `title` are escapable raw text; their content is kept verbatim too.
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

/// Check if tag preserves whitespace in its content.
#[inline]
pub fn is_whitespace_preserving(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea" | "listing" | "plaintext")
}

/// Check if whitespace next to this tag is insignificant for rendering.
///
/// Covers block-level flow content plus document-level and table structure
/// elements, which never render surrounding whitespace.
#[inline]
pub fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "head"
            | "body"
            | "title"
            | "meta"
            | "link"
            | "base"
            | "style"
            | "script"
            | "noscript"
            | "template"
            | "address"
            | "article"
            | "aside"
            | "blockquote"
            | "canvas"
            | "dd"
            | "details"
            | "dialog"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "optgroup"
            | "option"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "caption"
            | "colgroup"
            | "col"
            | "thead"
            | "tbody"
            | "tfoot"
            | "tr"
            | "td"
            | "th"
            | "ul"
            | "video"
            | "audio"
            | "source"
            | "picture"
    )
}

/// Parse HTML-style attributes from a string.
///
/// Input: `type="module" src='app.js' defer`
/// Output: `vec![("type", "module"), ("src", "app.js"), ("defer", "")]`
///
/// Attribute names are lowercased.
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == '/').is_some() {}

        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=' && *c != '/') {
            name.push(c.to_ascii_lowercase());
        }
        if name.is_empty() {
            break;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            match chars.peek().copied() {
                Some(quote @ ('"' | '\'')) => {
                    chars.next();
                    for c in chars.by_ref() {
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                }
                _ => {
                    while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                        value.push(c);
                    }
                }
            }
        }

        attrs.push((name, value));
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br"));
        assert!(is_void_element("img"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn test_raw_text_elements() {
        assert!(is_raw_text_element("script"));
        assert!(is_raw_text_element("textarea"));
        assert!(!is_raw_text_element("pre"));
    }

    #[test]
    fn test_block_elements() {
        assert!(is_block_element("div"));
        assert!(is_block_element("head"));
        assert!(is_block_element("li"));
        assert!(!is_block_element("span"));
        assert!(!is_block_element("a"));
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#"a="1" b='2' c=3 disabled"#);
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0], ("a".to_string(), "1".to_string()));
        assert_eq!(attrs[1], ("b".to_string(), "2".to_string()));
        assert_eq!(attrs[2], ("c".to_string(), "3".to_string()));
        assert_eq!(attrs[3], ("disabled".to_string(), "".to_string()));
    }

    #[test]
    fn test_parse_attributes_spacing_and_case() {
        let attrs = parse_attributes(r#" TYPE = "module"  SRC=app.js /"#);
        assert_eq!(
            attrs,
            vec![
                ("type".to_string(), "module".to_string()),
                ("src".to_string(), "app.js".to_string()),
            ]
        );
    }
}
