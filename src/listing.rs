//! HTML directory listings.
//!
//! The same table layout serves filesystem directories, archive roots, and
//! directories inside archives. Entries are collected in full, sorted, and
//! only then rendered.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::humanize::file_size;
use crate::natural::natural_cmp_ignore_case;

/// Bytes left unescaped in a single path segment: the unreserved set plus
/// the sub-delimiters that are legal inside a segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

// The empty data URL keeps browsers from requesting a favicon.
const PRELUDE: &str = "<head><link rel=icon href=data:,><style>* { font-family: monospace; } table { border: none; margin: 1rem; } td { padding-right: 2rem; }</style></head>\n<table>";

const DOWNLOAD_ROW: &str = "<tr><td><a href=?download>download zip</a></td></tr>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    Other,
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    /// Already percent-escaped link target.
    pub href: String,
}

impl ListingEntry {
    pub fn directory(name: impl Into<String>, href: String) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: None,
            href,
        }
    }

    pub fn file(name: impl Into<String>, size: u64, href: String) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::RegularFile,
            size: Some(size),
            href,
        }
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Other,
            size: None,
            href: String::new(),
        }
    }
}

/// Percent-escape one path segment for use in an `href`.
pub fn escape_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Absolute link built from unescaped segments.
pub fn absolute_href<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut href = String::new();
    for seg in segments {
        href.push('/');
        href.push_str(&escape_segment(seg));
    }
    if href.is_empty() {
        href.push('/');
    }
    href
}

/// Render a plain directory listing.
pub fn render(entries: Vec<ListingEntry>) -> String {
    render_table(None, entries)
}

/// Render an archive root listing, which leads with a whole-archive download link.
pub fn render_archive_root(entries: Vec<ListingEntry>) -> String {
    render_table(Some(DOWNLOAD_ROW), entries)
}

fn render_table(lead: Option<&str>, mut entries: Vec<ListingEntry>) -> String {
    // Stable: names that compare equal keep their enumeration order.
    entries.sort_by(|a, b| natural_cmp_ignore_case(&a.name, &b.name));

    let mut html = String::with_capacity(PRELUDE.len() + entries.len() * 64);
    html.push_str(PRELUDE);
    if let Some(lead) = lead {
        html.push_str(lead);
    }

    // Display names are written raw, not HTML-escaped.
    for entry in &entries {
        let row = match entry.kind {
            EntryKind::Directory => format!(
                "<tr><td><a href=\"{}\">{}/</a></td></tr>",
                entry.href, entry.name
            ),
            EntryKind::RegularFile => format!(
                "<tr><td><a href=\"{}\">{}</a></td><td>{}</td></tr>",
                entry.href,
                entry.name,
                file_size(entry.size.unwrap_or(0))
            ),
            EntryKind::Other => format!(
                "<tr><td><p style=\"color: #777\">{}</p></td></tr>",
                entry.name
            ),
        };
        html.push_str(&row);
    }

    html.push_str("</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_a_path_segment() {
        assert_eq!(escape_segment("a b.txt"), "a%20b.txt");
        assert_eq!(escape_segment("x/y?z#"), "x%2Fy%3Fz%23");
        assert_eq!(escape_segment("k=v&w+1@h:p;q,$~"), "k=v&w+1@h:p;q,$~");
        assert_eq!(escape_segment("über"), "%C3%BCber");
    }

    #[test]
    fn absolute_links() {
        assert_eq!(absolute_href(["a.zip", "sub dir", "f.txt"]), "/a.zip/sub%20dir/f.txt");
        assert_eq!(absolute_href([]), "/");
    }

    #[test]
    fn rows_per_kind() {
        let html = render(vec![
            ListingEntry::file("notes.txt", 1536, "notes.txt".into()),
            ListingEntry::directory("docs", "docs/".into()),
            ListingEntry::other("dev-null"),
        ]);

        assert!(html.starts_with("<head><link rel=icon href=data:,>"));
        assert!(html.contains("<tr><td><a href=\"docs/\">docs/</a></td></tr>"));
        assert!(html.contains("<tr><td><a href=\"notes.txt\">notes.txt</a></td><td>1.5K</td></tr>"));
        assert!(html.contains("<tr><td><p style=\"color: #777\">dev-null</p></td></tr>"));
        assert!(!html.contains("download zip"));
        assert!(html.ends_with("</table>"));
    }

    #[test]
    fn rows_are_naturally_sorted() {
        let names = ["file10.txt", "File2.txt", "file1.txt", "a"];
        let entries = names
            .iter()
            .map(|n| ListingEntry::file(*n, 1, escape_segment(n)))
            .collect();
        let html = render(entries);

        let positions: Vec<_> = ["\">a<", "file1.txt<", "File2.txt<", "file10.txt<"]
            .iter()
            .map(|needle| html.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn archive_root_leads_with_download() {
        let html = render_archive_root(vec![ListingEntry::file("a", 3, "/x.zip/a".into())]);
        let download = html.find("<a href=?download>download zip</a>").unwrap();
        let row = html.find("/x.zip/a").unwrap();
        assert!(download < row);
    }

    #[test]
    fn display_names_are_not_escaped() {
        let name = "<b>bold</b>";
        let html = render(vec![ListingEntry::file(name, 0, escape_segment(name))]);
        assert!(!html.contains("&lt;"));
        assert!(html.contains("<b>bold</b></a>"));
        assert!(html.contains("href=\"%3Cb%3Ebold%3C%2Fb%3E\""));
    }
}
