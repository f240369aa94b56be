//! Image reference scanning.
//!
//! Recognizes two syntaxes:
//!
//! - Markdown images: `![alt](path)`, `![alt](path "title")`, `![alt](<path>)`
//! - Inline HTML images: `<img src="path">` / `<img src='path'>` (case-insensitive)
//!
//! Matches never overlap. When both syntaxes could match, the one starting
//! earlier wins.

use regex::{CaptureMatches, Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn reference_regex() -> &'static Regex {
    REFERENCE_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?x)
              !\[[^\]]*\]\((?P<dest>[^)\n]*)\)
            | <(?i:img)\b[^>]*?\s(?i:src)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')
            "#,
        )
        .expect("Image reference regex should compile")
    })
}

/// Which syntactic form a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSyntax {
    MarkdownImage,
    HtmlImage,
}

/// Whether a reference points at the local filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    Local,
    /// Carries a URL scheme (`https:`, `data:`, ...) or is protocol-relative
    Remote,
}

/// One image reference found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub syntax: ReferenceSyntax,
    /// Full matched text, e.g. `![alt](./img/a.png)`
    pub raw: String,
    /// Path exactly as written
    pub path: String,
    /// Byte range of `raw` within the document
    pub span: Range<usize>,
    /// Byte range of `path` within the document
    pub path_span: Range<usize>,
    pub locality: Locality,
}

impl AssetReference {
    pub fn is_local(&self) -> bool {
        self.locality == Locality::Local
    }

    /// Byte offset where the reference starts
    pub fn position(&self) -> usize {
        self.span.start
    }
}

/// Lazy iterator over the image references of a text, in document order.
pub struct References<'a> {
    inner: CaptureMatches<'static, 'a>,
}

impl Iterator for References<'_> {
    type Item = AssetReference;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let caps = self.inner.next()?;
            if let Some(reference) = reference_from_captures(&caps) {
                return Some(reference);
            }
        }
    }
}

/// Scan text for image references without modifying it.
///
/// # Example
///
/// ```
/// use gist_publish::document::scan_references;
///
/// let refs: Vec<_> = scan_references("![a](./a.png) <img src=\"https://x.com/b.png\">").collect();
/// assert_eq!(refs.len(), 2);
/// assert!(refs[0].is_local());
/// assert!(!refs[1].is_local());
/// ```
pub fn scan_references(text: &str) -> References<'_> {
    References {
        inner: reference_regex().captures_iter(text),
    }
}

fn reference_from_captures(caps: &Captures<'_>) -> Option<AssetReference> {
    let whole = caps.get(0)?;

    let (syntax, path_span) = if let Some(dest) = caps.name("dest") {
        let (start, end) = markdown_destination(dest.as_str())?;
        (
            ReferenceSyntax::MarkdownImage,
            dest.start() + start..dest.start() + end,
        )
    } else {
        let value = caps.name("dq").or_else(|| caps.name("sq"))?;
        if value.as_str().trim().is_empty() {
            return None;
        }
        (ReferenceSyntax::HtmlImage, value.range())
    };

    let haystack_offset = whole.start();
    let raw = whole.as_str();
    let path = raw[path_span.start - haystack_offset..path_span.end - haystack_offset].to_string();
    let locality = if is_remote(&path) {
        Locality::Remote
    } else {
        Locality::Local
    };

    Some(AssetReference {
        syntax,
        raw: raw.to_string(),
        path,
        span: whole.range(),
        path_span,
        locality,
    })
}

/// Locate the path inside a markdown link destination.
///
/// Returns byte offsets relative to `dest`, or `None` for an empty destination.
fn markdown_destination(dest: &str) -> Option<(usize, usize)> {
    let start = dest.len() - dest.trim_start().len();
    let rest = &dest[start..];

    if let Some(inner) = rest.strip_prefix('<') {
        if let Some(close) = inner.find('>') {
            if close == 0 {
                return None;
            }
            return Some((start + 1, start + 1 + close));
        }
    }

    let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    if len == 0 {
        return None;
    }
    Some((start, start + len))
}

/// URL schemes treated as remote; anything else before a `:` is a filename
const REMOTE_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "sftp", "data", "mailto", "file", "blob", "cid",
];

/// Whether a path denotes a remote location rather than a local file.
///
/// A path is remote when it is protocol-relative (`//host/...`) or starts
/// with one of a fixed set of URL schemes, compared case-insensitively.
/// `fig:1.png` and `C:/img/a.png` stay local.
pub fn is_remote(path: &str) -> bool {
    let path = path.trim();
    if path.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = path.split_once(':') else {
        return false;
    };
    REMOTE_SCHEMES
        .iter()
        .any(|known| scheme.eq_ignore_ascii_case(known))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(text: &str) -> Vec<String> {
        scan_references(text).map(|r| r.path).collect()
    }

    #[test]
    fn test_scan_markdown_image() {
        let text = "# Doc\n\n![Logo](./assets/logo.png)\n";
        let refs: Vec<_> = scan_references(text).collect();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].syntax, ReferenceSyntax::MarkdownImage);
        assert_eq!(refs[0].path, "./assets/logo.png");
        assert_eq!(refs[0].raw, "![Logo](./assets/logo.png)");
        assert_eq!(&text[refs[0].path_span.clone()], "./assets/logo.png");
        assert_eq!(refs[0].position(), 7);
        assert!(refs[0].is_local());
    }

    #[test]
    fn test_scan_html_image_both_quotes() {
        let text = r#"<img src="a.png" width="40"> <IMG alt='x' SRC='b.gif'>"#;
        let refs: Vec<_> = scan_references(text).collect();

        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.syntax == ReferenceSyntax::HtmlImage));
        assert_eq!(refs[0].path, "a.png");
        assert_eq!(refs[1].path, "b.gif");
        assert_eq!(&text[refs[1].path_span.clone()], "b.gif");
    }

    #[test]
    fn test_scan_preserves_document_order_across_syntaxes() {
        let text = r#"<img src="one.png"> ![two](two.png) <img src="three.png">"#;
        assert_eq!(paths(text), vec!["one.png", "two.png", "three.png"]);
    }

    #[test]
    fn test_scan_ignores_plain_links() {
        assert!(paths("[Guide](../docs/guide.md)").is_empty());
    }

    #[test]
    fn test_scan_ignores_data_src_attribute() {
        assert!(paths(r#"<img data-src="lazy.png">"#).is_empty());
    }

    #[test]
    fn test_scan_markdown_title_is_not_part_of_path() {
        let text = r#"![a](img/a.png "A title")"#;
        let refs: Vec<_> = scan_references(text).collect();
        assert_eq!(refs[0].path, "img/a.png");
        assert_eq!(&text[refs[0].path_span.clone()], "img/a.png");
    }

    #[test]
    fn test_scan_markdown_angle_brackets() {
        let text = "![a](<my image.png>)";
        let refs: Vec<_> = scan_references(text).collect();
        assert_eq!(refs[0].path, "my image.png");
        assert_eq!(&text[refs[0].path_span.clone()], "my image.png");
    }

    #[test]
    fn test_scan_skips_empty_destinations() {
        assert!(paths("![a]() ![b](<>) <img src=\"\">").is_empty());
    }

    #[test]
    fn test_scan_marks_remote_references() {
        let refs: Vec<_> =
            scan_references("![d](./img/flow.png) and ![ext](https://x.com/y.png)").collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].locality, Locality::Local);
        assert_eq!(refs[1].locality, Locality::Remote);
    }

    #[test]
    fn test_scan_keeps_duplicates() {
        assert_eq!(paths("![a](x.png) ![b](x.png)"), vec!["x.png", "x.png"]);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("http://example.com/a.png"));
        assert!(is_remote("HTTPS://example.com/a.png"));
        assert!(is_remote("//cdn.example.com/a.png"));
        assert!(is_remote("data:image/png;base64,AAAA"));
        assert!(is_remote("ftp://host/file.gif"));

        assert!(!is_remote("./img/a.png"));
        assert!(!is_remote("img/a:b.png"));
        assert!(!is_remote("C:/images/a.png"));
        assert!(!is_remote("/abs/a.png"));
        assert!(!is_remote("a.png"));
        assert!(!is_remote("fig:1.png"));
        assert!(!is_remote("diagram:v2.png"));
    }
}
