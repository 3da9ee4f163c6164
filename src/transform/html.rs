//! HTML minification.
//!
//! A single forward pass over the markup:
//!
//! - comments are dropped, except conditional comments (`<!--[if ...]>`)
//! - whitespace runs collapse to one space, and disappear next to block tags
//! - `<pre>` content and raw text elements (`script`, `style`, `textarea`,
//!   `title`) are copied verbatim
//! - whitespace inside tags is normalized outside quoted attribute values
//!
//! In production mode inline `<style>` and `<script>` bodies are minified as
//! well; a body that fails to minify is kept as written.

use crate::pipeline::{FileTransform, StageError, VirtualFile};
use crate::utils::html::{
    is_block_element, is_raw_text_element, is_whitespace_preserving, parse_attributes,
};
use lightningcss::targets::Targets;
use std::borrow::Cow;

use super::{minify_css, minify_js};

/// `minify-html` stage.
pub struct MinifyHtml {
    production: bool,
}

impl MinifyHtml {
    pub const fn development() -> Self {
        Self { production: false }
    }

    pub const fn production() -> Self {
        Self { production: true }
    }
}

impl FileTransform for MinifyHtml {
    fn name(&self) -> &'static str {
        "minify-html"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let html = minify_html(file.text()?, self.production).map_err(StageError::new)?;
        Ok(file.with_contents(html.into_bytes()))
    }
}

/// Minify an HTML document. Fails on unterminated comments, tags and raw
/// text elements.
pub fn minify_html(source: &str, production: bool) -> Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    let mut preserve = 0usize;
    let mut after_block = true;

    while !rest.is_empty() {
        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body
                .find("-->")
                .ok_or_else(|| "unterminated comment".to_string())?;
            let len = 4 + end + 3;
            if body.starts_with("[if") {
                out.push_str(&rest[..len]);
                after_block = false;
            }
            rest = &rest[len..];
            continue;
        }

        if rest.starts_with('<')
            && let Some(tag) = Tag::parse(rest)?
        {
            rest = &rest[tag.len..];

            let block = tag.is_block();
            if block && preserve == 0 && out.ends_with(' ') {
                out.pop();
            }
            tag.write(&mut out);
            after_block = block;

            if tag.closing {
                if is_whitespace_preserving(&tag.name) {
                    preserve = preserve.saturating_sub(1);
                }
            } else if tag.declaration || tag.self_closing {
                // no content
            } else if is_raw_text_element(&tag.name) {
                let end = find_closing_tag(rest, &tag.name)
                    .ok_or_else(|| format!("unclosed <{}>", tag.name))?;
                out.push_str(&raw_content(&tag, &rest[..end], production));
                rest = &rest[end..];
            } else if is_whitespace_preserving(&tag.name) {
                preserve += 1;
            }
            continue;
        }

        // Text runs to the next `<`; a `<` that did not open a tag is text.
        let skip = usize::from(rest.starts_with('<'));
        let end = rest[skip..].find('<').map_or(rest.len(), |i| i + skip);
        let text = &rest[..end];
        rest = &rest[end..];

        if preserve > 0 {
            out.push_str(text);
            after_block = false;
        } else {
            push_collapsed(&mut out, text, after_block);
            if !text.trim_ascii().is_empty() {
                after_block = false;
            }
        }
    }

    out.truncate(out.trim_end().len());
    Ok(out)
}

/// A parsed start tag, end tag or declaration.
struct Tag {
    /// Lowercased element name, empty for declarations
    name: String,
    /// Attribute text with whitespace normalized (whole body for declarations)
    attrs: String,
    /// Source length in bytes
    len: usize,
    closing: bool,
    self_closing: bool,
    /// `<!DOCTYPE ...>` or `<?...?>`
    declaration: bool,
}

impl Tag {
    /// Parse the tag at the start of `s`. `Ok(None)` means `<` is plain text.
    fn parse(s: &str) -> Result<Option<Self>, String> {
        let bytes = s.as_bytes();

        if matches!(bytes.get(1), Some(b'!' | b'?')) {
            let end = s
                .find('>')
                .ok_or_else(|| "unterminated declaration".to_string())?;
            return Ok(Some(Self {
                name: String::new(),
                attrs: collapse_attrs(&s[1..end]),
                len: end + 1,
                closing: false,
                self_closing: false,
                declaration: true,
            }));
        }

        let closing = bytes.get(1) == Some(&b'/');
        let start = if closing { 2 } else { 1 };
        let name_len = s[start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b':')
            .count();
        if name_len == 0 || !bytes[start].is_ascii_alphabetic() {
            return Ok(None);
        }

        let name = s[start..start + name_len].to_ascii_lowercase();
        let after_name = start + name_len;
        let end = find_tag_end(&s[after_name..])
            .ok_or_else(|| format!("unterminated tag <{name}"))?
            + after_name;

        let mut attrs = if closing {
            String::new()
        } else {
            collapse_attrs(&s[after_name..end])
        };
        let self_closing = attrs.ends_with('/');
        if self_closing {
            attrs.pop();
            attrs.truncate(attrs.trim_end().len());
        }

        Ok(Some(Self {
            name,
            attrs,
            len: end + 1,
            closing,
            self_closing,
            declaration: false,
        }))
    }

    fn is_block(&self) -> bool {
        self.declaration || is_block_element(&self.name)
    }

    fn write(&self, out: &mut String) {
        if self.declaration {
            out.push('<');
            out.push_str(&self.attrs);
            out.push('>');
            return;
        }
        out.push('<');
        if self.closing {
            out.push('/');
        }
        out.push_str(&self.name);
        if !self.attrs.is_empty() {
            out.push(' ');
            out.push_str(&self.attrs);
        }
        if self.self_closing {
            out.push('/');
        }
        out.push('>');
    }
}

/// Offset of the `>` closing a tag, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in s.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Collapse whitespace outside quotes and trim.
fn collapse_attrs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut quote = None;
    let mut space = false;

    for c in s.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_ascii_whitespace() => space = true,
            None => {
                if space && !out.is_empty() {
                    out.push(' ');
                }
                space = false;
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Append `text` with whitespace collapsed. Leading whitespace is dropped
/// after a block tag.
fn push_collapsed(out: &mut String, text: &str, after_block: bool) {
    let mut space = false;
    let mut leading = true;

    let flush_space = |out: &mut String, leading: bool| {
        if !(leading && after_block) && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    };

    for c in text.chars() {
        if c.is_ascii_whitespace() {
            space = true;
            continue;
        }
        if space {
            flush_space(out, leading);
        }
        out.push(c);
        space = false;
        leading = false;
    }
    if space {
        flush_space(out, leading);
    }
}

/// Offset of `</name` (case-insensitive) in `s`.
fn find_closing_tag(s: &str, name: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = s[from..].find("</") {
        let at = from + i;
        let candidate = &s.as_bytes()[at + 2..];
        if candidate.len() >= name.len()
            && candidate[..name.len()].eq_ignore_ascii_case(name.as_bytes())
            && !candidate
                .get(name.len())
                .is_some_and(|b| b.is_ascii_alphanumeric())
        {
            return Some(at);
        }
        from = at + 2;
    }
    None
}

fn raw_content<'a>(tag: &Tag, content: &'a str, production: bool) -> Cow<'a, str> {
    if !production || content.trim().is_empty() {
        return Cow::Borrowed(content);
    }
    let minified = match tag.name.as_str() {
        "style" => minify_css(content, Targets::default()).ok(),
        "script" if is_inline_javascript(&tag.attrs) => minify_js(content).ok(),
        _ => None,
    };
    minified.map_or(Cow::Borrowed(content), Cow::Owned)
}

/// Inline classic or module script, not JSON or a template.
fn is_inline_javascript(attrs: &str) -> bool {
    let attrs = parse_attributes(attrs);
    if attrs.iter().any(|(name, _)| name == "src") {
        return false;
    }
    attrs
        .iter()
        .find(|(name, _)| name == "type")
        .is_none_or(|(_, ty)| {
            matches!(
                ty.to_ascii_lowercase().as_str(),
                "" | "module" | "text/javascript" | "application/javascript"
            )
        })
}
