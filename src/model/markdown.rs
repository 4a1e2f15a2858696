//! Markdown rendering for book exports.
//!
//! One file per book: a metadata header, an optional chapter listing, and
//! the annotations separated by horizontal rules.

use std::fmt::Write as _;

use crate::model::{Annotation, Book, Chapter};
use crate::util::{format_duration_from_ms, sanitize_file_stem};

/// Derive the output file name for a book from its title.
///
/// Only the main title is used (no subtitle), sanitized for the filesystem
/// and for Markdown/Obsidian-style linking.
#[must_use]
pub fn book_file_name(book: &Book) -> String {
    format!("{}.md", sanitize_file_stem(&book.title))
}

/// Render a book with its chapters and annotations to Markdown.
#[must_use]
pub fn render_book(
    book: &Book,
    chapters: Option<&[Chapter]>,
    annotations: &[Annotation],
    annotations_version: Option<&str>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", book.title);

    // Book information
    if let Some(subtitle) = &book.subtitle {
        let _ = writeln!(out, "- Subtitle: {subtitle}");
    }
    let _ = writeln!(out, "- Author(s): {}", book.author);
    if !book.image_url.is_empty() {
        let _ = writeln!(out, "- Image URL: {}", book.image_url);
    }
    if let Some(pdf_url) = &book.pdf_url {
        // Accessing the URL typically requires session cookies; it is
        // expected to be downloaded separately.
        let _ = writeln!(out, "- PDF URL: {pdf_url}");
    }
    if let Some(publication_date) = &book.publication_date {
        let _ = writeln!(out, "- Publication date: {publication_date}");
    }
    if let Some(purchase_date) = &book.purchase_date {
        let _ = writeln!(out, "- Purchase date: {purchase_date}");
    }
    let _ = writeln!(out, "- Last opened date: {}", book.last_opened_date);
    let _ = writeln!(out, "- ASIN: {}", book.asin);
    out.push('\n');

    if let Some(chapters) = chapters {
        out.push_str("## Contents\n\n");
        write_chapters(&mut out, chapters, 0);
        out.push('\n');
    }

    if !annotations.is_empty() {
        out.push_str("## Annotations\n\n");
        if let Some(version) = annotations_version {
            let _ = writeln!(out, "Version: {version}");
        }
        out.push_str("\n---\n\n");
        for annotation in annotations {
            write_annotation(&mut out, book, annotation);
        }
    }

    out
}

fn write_chapters(out: &mut String, chapters: &[Chapter], depth: usize) {
    for chapter in chapters {
        let _ = write!(out, "{}- {}", "  ".repeat(depth), chapter.title);

        if let (Some(start_ms), Some(end_ms)) = (chapter.start_ms, chapter.end_ms) {
            let _ = write!(
                out,
                " [{}, {}]",
                format_duration_from_ms(start_ms),
                format_duration_from_ms(end_ms)
            );
        }
        out.push('\n');

        if let Some(subchapters) = &chapter.subchapters {
            write_chapters(out, subchapters, depth + 1);
        }
    }
}

fn write_annotation(out: &mut String, book: &Book, annotation: &Annotation) {
    // Metadata lines
    if let Some(created_at) = &annotation.created_at {
        let _ = write!(out, "- Created: {created_at}");
        if let Some(updated_at) = &annotation.updated_at {
            if updated_at != created_at {
                let _ = write!(out, " | Updated: {updated_at}");
            }
        }
        out.push('\n');
    }
    if let (Some(start_ms), Some(end_ms)) = (annotation.clip_start_ms, annotation.clip_end_ms) {
        let _ = writeln!(
            out,
            "- Clip: [{}, {}]",
            format_duration_from_ms(start_ms),
            format_duration_from_ms(end_ms)
        );
    }
    if let Some(location) = annotation.location {
        out.push_str("- ");
        if let Some(page) = annotation.page {
            let _ = write!(out, "Page: {page} | ");
        }
        let _ = writeln!(
            out,
            "Location: {location} [(kindle link)]\
             (kindle://book?action=open&asin={}&location={location})",
            book.asin
        );
    }

    // Main content
    out.push('\n');
    if let Some(highlight) = &annotation.highlight {
        let color = annotation.highlight_color.as_deref().unwrap_or("unknown");
        let _ = writeln!(out, "**{color} highlight:**");
        let _ = writeln!(out, "> {highlight}");
        out.push('\n');
    }
    if let Some(note) = &annotation.note {
        out.push_str("**Note:**\n");
        let _ = writeln!(out, "{note}");
    }

    out.push_str("\n---\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        Book {
            asin: "B0ABCDEF12".into(),
            title: "Title A".into(),
            subtitle: Some("Subtitle A".into()),
            author: "Author A, Author B".into(),
            image_url: "https://m.media-amazon.com/images/I/abc.jpg".into(),
            last_opened_date: "Sunday January 30, 2022".into(),
            ..Book::default()
        }
    }

    #[test]
    fn test_book_file_name_uses_main_title() {
        assert_eq!(book_file_name(&sample_book()), "Title A.md");
    }

    #[test]
    fn test_render_book_header() {
        let rendered = render_book(&sample_book(), None, &[], None);

        assert!(rendered.starts_with("# Title A\n\n"));
        assert!(rendered.contains("- Subtitle: Subtitle A\n"));
        assert!(rendered.contains("- Author(s): Author A, Author B\n"));
        assert!(rendered.contains("- ASIN: B0ABCDEF12\n"));
        // No annotations section without annotations.
        assert!(!rendered.contains("## Annotations"));
    }

    #[test]
    fn test_render_chapters_with_offsets() {
        let chapters = vec![Chapter {
            title: "Opening".into(),
            start_ms: Some(0),
            end_ms: Some(61_000),
            subchapters: Some(vec![Chapter {
                title: "Part 1".into(),
                start_ms: Some(5_000),
                end_ms: Some(30_000),
                subchapters: None,
            }]),
        }];

        let rendered = render_book(&sample_book(), Some(&chapters), &[], None);
        assert!(rendered.contains("## Contents"));
        assert!(rendered.contains("- Opening [0:00:00, 0:01:01]\n"));
        assert!(rendered.contains("  - Part 1 [0:00:05, 0:00:30]\n"));
    }

    #[test]
    fn test_render_kindle_annotation() {
        let annotations = vec![Annotation {
            highlight: Some("A memorable passage.".into()),
            highlight_color: Some("yellow".into()),
            note: Some("look this up".into()),
            location: Some(1234),
            page: Some(42),
            ..Annotation::default()
        }];

        let rendered = render_book(&sample_book(), None, &annotations, None);
        assert!(rendered.contains("- Page: 42 | Location: 1234"));
        assert!(rendered.contains("kindle://book?action=open&asin=B0ABCDEF12&location=1234"));
        assert!(rendered.contains("**yellow highlight:**\n> A memorable passage.\n"));
        assert!(rendered.contains("**Note:**\nlook this up\n"));
    }

    #[test]
    fn test_render_audible_annotation_with_version() {
        let annotations = vec![Annotation {
            note: Some("great quote".into()),
            clip_start_ms: Some(60_000),
            clip_end_ms: Some(90_000),
            created_at: Some("Sat, 01 Apr 2023 12:30:00 +0000".into()),
            updated_at: Some("Sun, 02 Apr 2023 08:00:00 +0000".into()),
            ..Annotation::default()
        }];

        let rendered = render_book(&sample_book(), None, &annotations, Some("d41d8cd9"));
        assert!(rendered.contains("Version: d41d8cd9\n"));
        assert!(rendered.contains(
            "- Created: Sat, 01 Apr 2023 12:30:00 +0000 | Updated: Sun, 02 Apr 2023 08:00:00 +0000"
        ));
        assert!(rendered.contains("- Clip: [0:01:00, 0:01:30]\n"));
    }
}
