//! Server-rendered HTML pages.

use std::fmt::Write;

use reqwest::Url;

use super::flash::Flash;
use crate::student::StudentRecord;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
header { background: #2c3e50; color: #fff; padding: 1rem 2rem; display: flex; gap: 2rem; align-items: center; }
header a { color: #fff; text-decoration: none; }
main { max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { padding: .6rem; border-bottom: 1px solid #ddd; text-align: left; }
form.inline { display: inline; }
label { display: block; margin-top: .8rem; }
input[type=text] { width: 100%; padding: .4rem; box-sizing: border-box; }
button, .button { margin-top: 1rem; padding: .4rem .9rem; cursor: pointer; }
.alert { padding: .8rem 1rem; margin-bottom: 1rem; border-radius: 4px; transition: opacity .3s; }
.alert.success { background: #d4edda; }
.alert.error { background: #f8d7da; }
.alert.warning { background: #fff3cd; }
.empty { padding: 2rem; text-align: center; color: #777; }
"#;

/// Escape text for HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Origin used only to build site-relative paths through [`Url`].
const PATH_BASE: &str = "http://localhost/";

/// Site path `/{action}/{reg_number}` with the key percent-encoded as a
/// single path segment, so keys holding `/`, spaces or non-ASCII text
/// round-trip through the router.
pub fn record_path(action: &str, reg_number: &str) -> String {
    let Ok(mut url) = Url::parse(PATH_BASE) else {
        return format!("/{action}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(action).push(reg_number);
    }
    url.path().to_string()
}

fn layout(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let alert = flash
        .map(|f| {
            format!(
                r#"<div class="alert {}">{}</div>"#,
                f.kind.as_str(),
                escape(&f.message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Student Records</title>
<style>{STYLE}</style>
<script src="/static/script.js" defer></script>
</head>
<body>
<header><strong>Student Records</strong><a href="/">All students</a><a href="/add">Add student</a></header>
<main>
{alert}
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

/// The student list, optionally showing search results for `query`.
pub fn index(records: &[StudentRecord], query: Option<&str>, flash: Option<&Flash>) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<form action="/search" method="get">
<input type="text" name="q" placeholder="Search by name, registration number, department or level" value="{}">
<button type="submit">Search</button>
</form>
"#,
        escape(query.unwrap_or_default())
    );

    match query {
        Some(q) => {
            let _ = write!(
                body,
                r#"<h2>Search results for "{}" ({})</h2><p><a href="/">Clear search</a></p>"#,
                escape(q),
                records.len()
            );
        }
        None => {
            let _ = write!(body, "<h2>All students ({})</h2>", records.len());
        }
    }

    if records.is_empty() {
        body.push_str(r#"<div class="empty">No student records to show.</div>"#);
    } else {
        body.push_str(
            "<table>\n<thead><tr><th>Name</th><th>Registration number</th>\
             <th>Department</th><th>Level</th><th>Actions</th></tr></thead>\n<tbody>\n",
        );
        for record in records {
            body.push_str(&row(record));
        }
        body.push_str("</tbody>\n</table>\n");
    }

    layout("Students", flash, &body)
}

fn row(record: &StudentRecord) -> String {
    let edit = escape(&record_path("edit", &record.reg_number));
    let delete = escape(&record_path("delete", &record.reg_number));
    // JSON gives a valid JS string literal; escaping makes it attribute-safe.
    let js_name = serde_json::to_string(&record.name).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"<tr><td>{name}</td><td>{reg}</td><td>{dept}</td><td>{level}</td><td>
<a href="{edit}">Edit</a>
<form class="inline" action="{delete}" method="post" onsubmit="return confirmDelete({js})"><button type="submit">Delete</button></form>
</td></tr>
"#,
        name = escape(&record.name),
        reg = escape(&record.reg_number),
        dept = escape(&record.department),
        level = escape(&record.level),
        js = escape(&js_name),
    )
}

/// Form for adding a new student.
pub fn add_form(flash: Option<&Flash>) -> String {
    let body = r#"<h2>Add student</h2>
<form action="/add" method="post">
<label>Name <input type="text" name="name" required></label>
<label>Registration number <input type="text" name="reg_number" required></label>
<label>Department <input type="text" name="department" required></label>
<label>Level <input type="text" name="level" required></label>
<button type="submit">Add student</button>
<a class="button" href="/">Cancel</a>
</form>
"#;
    layout("Add student", flash, body)
}

/// Form for editing an existing student. The registration number is shown
/// but not submitted.
pub fn edit_form(record: &StudentRecord, flash: Option<&Flash>) -> String {
    let body = format!(
        r#"<h2>Edit student</h2>
<form action="{action}" method="post">
<label>Registration number <input type="text" value="{reg}" disabled></label>
<label>Name <input type="text" name="name" value="{name}" required></label>
<label>Department <input type="text" name="department" value="{dept}" required></label>
<label>Level <input type="text" name="level" value="{level}" required></label>
<button type="submit">Save changes</button>
<a class="button" href="/">Cancel</a>
</form>
"#,
        action = escape(&record_path("edit", &record.reg_number)),
        reg = escape(&record.reg_number),
        name = escape(&record.name),
        dept = escape(&record.department),
        level = escape(&record.level),
    );
    layout("Edit student", flash, &body)
}

/// Page shown when a view cannot be loaded.
pub fn error_page(flash: &Flash) -> String {
    layout(
        "Unavailable",
        Some(flash),
        r#"<p><a href="/">Back to the student list</a></p>"#,
    )
}
