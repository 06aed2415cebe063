//! Markdown to HTML for model output.
//!
//! Raw HTML in the source is shown as text, and `javascript:` links are
//! neutralised, so the result can be embedded in a page unescaped.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

pub fn render(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("data:") || scheme.starts_with("vbscript:") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_formatting() {
        let html = render("✅ **Success!** done\n\n- one\n- two");
        assert!(html.contains("<strong>Success!</strong>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render("hello <b onclick=\"x()\">there</b>\n\n<script>alert(1)</script>\n");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b onclick"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_links() {
        let html = render("[Source](https://example.org/a) and [bad](javascript:alert(1))");
        assert!(html.contains("href=\"https://example.org/a\""));
        assert!(!html.contains("javascript:"));
    }
}
