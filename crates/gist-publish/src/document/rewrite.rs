//! Rewriting local reference paths to hosted URLs.

use super::Document;
use std::collections::HashMap;

/// Hosted URL per reference path, keyed by the path as written
pub type HostedUrls = HashMap<String, String>;

/// Replace the path of every hosted local reference with its URL.
///
/// Only the path bytes change. Alt text, titles, HTML attributes and all
/// text between references are copied verbatim. References without an
/// entry in `hosted` (missing files, remote URLs) are left as they are.
///
/// ```
/// use gist_publish::document::{rewrite, Document, HostedUrls};
///
/// let doc = Document::new("![d](./a.png)", "/tmp");
/// let mut hosted = HostedUrls::new();
/// hosted.insert("./a.png".to_string(), "https://h/a.png".to_string());
///
/// assert_eq!(rewrite(&doc, &hosted).text(), "![d](https://h/a.png)");
/// ```
pub fn rewrite(document: &Document, hosted: &HostedUrls) -> Document {
    let text = document.text();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for reference in document.references() {
        if !reference.is_local() {
            continue;
        }
        let Some(url) = hosted.get(&reference.path) else {
            continue;
        };
        out.push_str(&text[cursor..reference.path_span.start]);
        out.push_str(url);
        cursor = reference.path_span.end;
    }
    out.push_str(&text[cursor..]);

    document.with_text(out)
}
