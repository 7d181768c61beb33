//! Article generators shared by the highlight benchmarks.
//!
//! Each bench target compiles this module separately, so a generator unused
//! by one target is allowed to be dead there.

#[allow(dead_code)]
pub fn generate_article(paragraphs: usize) -> String {
    let mut markup = String::from("<article data-highlightable>");
    for i in 0..paragraphs {
        markup.push_str(&format!(
            "<p>Paragraph {i} has <em>some emphasis</em>, a <a href=\"#{i}\">link</a> and plain text.</p>\n"
        ));
    }
    markup.push_str("</article>");
    markup
}

#[allow(dead_code)]
pub fn generate_highlighted_article(paragraphs: usize) -> String {
    let mut markup = String::from("<article data-highlightable>");
    for i in 0..paragraphs {
        markup.push_str(&format!(
            "<p>Paragraph {i} <mark data-text-highlighter=\"h{i}\">has some</mark> highlighted <u data-text-highlighter=\"u{i}\" data-color=\"red\">text</u>.</p>\n"
        ));
    }
    markup.push_str("</article>");
    markup
}

/// Same text as [`generate_highlighted_article`] without any regions
#[allow(dead_code)]
pub fn generate_plain_article(paragraphs: usize) -> String {
    let mut markup = String::from("<article data-highlightable>");
    for i in 0..paragraphs {
        markup.push_str(&format!(
            "<p>Paragraph {i} has some highlighted text.</p>\n"
        ));
    }
    markup.push_str("</article>");
    markup
}
