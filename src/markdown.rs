// Markdown to HTML for page bodies

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

pub fn render_markdown_html(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(content, options).map(|event| match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_destination(dest_url, "#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_destination(dest_url, ""),
            title,
            id,
        }),
        // Raw HTML is shown, never interpreted
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(CowStr::from(raw.into_string())),
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

fn sanitize_destination(dest_url: CowStr<'_>, fallback: &'static str) -> CowStr<'static> {
    let value = dest_url.into_string();
    if is_safe_destination(&value) {
        CowStr::from(value)
    } else {
        CowStr::from(fallback)
    }
}

fn is_safe_destination(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return true;
    }
    if lower.starts_with("//") {
        return false;
    }
    if lower.starts_with('#') || lower.starts_with('/') || lower.starts_with("./") || lower.starts_with("../") {
        return true;
    }
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:") {
        return true;
    }

    !lower.contains(':')
}
