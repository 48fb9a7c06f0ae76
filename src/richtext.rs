//! Converts CMS rich text into plain text (for word counting) and into HTML
//! (for post pages). For markup, paragraph text may carry inline Markdown
//! formatting, which is parsed with `pulldown_cmark`. Raw HTML in the source
//! is dropped, so the markup produced here is safe to insert into a page
//! verbatim. Plain text is the CMS text as stored, so nothing the reader sees
//! goes uncounted.

use crate::post::{Paragraph, RichTextBlock};
use pulldown_cmark::{escape::escape_html, html, Event, Parser};
use std::io;

/// Joins the text of `paragraphs` with newlines. The text is taken as the
/// CMS stores it; it is not reinterpreted as Markdown.
pub fn to_plain_text(paragraphs: &[Paragraph]) -> String {
    paragraphs
        .iter()
        .map(|paragraph| paragraph.text.as_str())
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Renders `blocks` to HTML. Each block becomes an `<h2>` heading followed by
/// its paragraphs.
pub fn to_markup(blocks: &[RichTextBlock]) -> io::Result<String> {
    let mut out = String::new();
    for block in blocks {
        out.push_str("<h2>");
        escape_html(&mut out, &block.heading)?;
        out.push_str("</h2>\n");
        for paragraph in &block.body {
            html::push_html(
                &mut out,
                Parser::new(&paragraph.text).filter(|e| !matches!(e, Event::Html(_))),
            );
        }
    }
    Ok(out)
}
