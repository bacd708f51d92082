// Server-rendered HTML views
// Every user-provided string goes through html_escape before it lands in markup

use axum::http::StatusCode;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::entities::{EntPage, EntUser, PageStatus};

const SITE_NAME: &str = "WikiStack";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} | {site}</title>
</head>
<body>
    <nav>
        <a href="/">{site}</a>
        <a href="/wiki/add">Add a page</a>
        <a href="/wiki/search">Search by tag</a>
        <a href="/users">Authors</a>
    </nav>
    <main>
{body}
    </main>
</body>
</html>
"#,
        title = text(title),
        site = SITE_NAME,
        body = body,
    )
}

fn page_link(page: &EntPage) -> String {
    format!(
        r#"<li><a href="{}">{}</a></li>"#,
        attr(&page.route()),
        text(&page.title)
    )
}

fn tag_links(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| {
            format!(
                r#"<a class="tag" href="/wiki/search?search={}">{}</a>"#,
                attr(&urlencoding::encode(tag)),
                text(tag)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// List of pages under a heading; also used for search and similar results
pub fn index(heading: &str, pages: &[EntPage]) -> String {
    let list = if pages.is_empty() {
        "        <p>No pages found.</p>".to_string()
    } else {
        let items: Vec<String> = pages.iter().map(page_link).collect();
        format!("        <ul>\n{}\n        </ul>", items.join("\n"))
    };

    let body = format!("        <h1>{}</h1>\n{}", text(heading), list);
    layout(heading, &body)
}

pub fn add_page() -> String {
    let options: Vec<String> = PageStatus::ALL
        .iter()
        .map(|s| format!(r#"<option value="{0}">{0}</option>"#, s.as_str()))
        .collect();

    let body = format!(
        r#"        <h1>Add a page</h1>
        <form method="POST" action="/wiki/">
            <label>Author name <input name="name" required></label>
            <label>Author email <input name="email" type="email" required></label>
            <label>Page title <input name="title" required></label>
            <label>Content <textarea name="content" rows="12" required></textarea></label>
            <label>Tags <input name="tags" placeholder="comma, separated, tags"></label>
            <label>Status <select name="status"><option value=""></option>{}</select></label>
            <button type="submit">Submit</button>
        </form>"#,
        options.join("")
    );
    layout("Add a page", &body)
}

pub fn search() -> String {
    let body = r#"        <h1>Search by tag</h1>
        <form method="GET" action="/wiki/search">
            <input name="search" placeholder="tag">
            <button type="submit">Search</button>
        </form>"#;
    layout("Search by tag", body)
}

pub fn wiki_page(page: &EntPage, author: Option<&EntUser>) -> String {
    let byline = match author {
        Some(author) => format!(
            r#"        <p class="author">by <a href="{}">{}</a></p>"#,
            attr(&author.route()),
            text(&author.name)
        ),
        None => String::new(),
    };
    let status = page
        .status
        .map(|s| format!(r#"        <p class="status">Status: {}</p>"#, s))
        .unwrap_or_default();
    let similar = format!(
        r#"        <p><a href="{}/similar">Similar pages</a></p>"#,
        attr(&page.route())
    );

    let body = format!(
        "        <h1>{title}</h1>\n{byline}\n{status}\n        <p class=\"tags\">{tags}</p>\n        <article>\n{content}        </article>\n{similar}",
        title = text(&page.title),
        byline = byline,
        status = status,
        tags = tag_links(&page.tags),
        content = page.rendered_content(),
        similar = similar,
    );
    layout(&page.title, &body)
}

pub fn users(users: &[EntUser]) -> String {
    let items: Vec<String> = users
        .iter()
        .map(|u| {
            format!(
                r#"<li><a href="{}">{}</a> &lt;{}&gt;</li>"#,
                attr(&u.route()),
                text(&u.name),
                text(&u.email)
            )
        })
        .collect();
    let list = if items.is_empty() {
        "        <p>No authors yet.</p>".to_string()
    } else {
        format!("        <ul>\n{}\n        </ul>", items.join("\n"))
    };
    layout("Authors", &format!("        <h1>Authors</h1>\n{}", list))
}

pub fn user_page(user: &EntUser, pages: &[EntPage]) -> String {
    let items: Vec<String> = pages.iter().map(page_link).collect();
    let body = format!(
        "        <h1>{}</h1>\n        <p>{}</p>\n        <h2>Pages</h2>\n        <ul>\n{}\n        </ul>",
        text(&user.name),
        text(&user.email),
        items.join("\n")
    );
    layout(&user.name, &body)
}

pub fn error_page(status: StatusCode, message: &str, details: &[String]) -> String {
    let items: Vec<String> = details
        .iter()
        .map(|d| format!("<li>{}</li>", text(d)))
        .collect();
    let list = if items.is_empty() {
        String::new()
    } else {
        format!("\n        <ul>\n{}\n        </ul>", items.join("\n"))
    };

    let heading = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!(
        "        <h1>{}</h1>\n        <p>{}</p>{}",
        heading,
        text(message),
        list
    );
    layout(&heading, &body)
}
