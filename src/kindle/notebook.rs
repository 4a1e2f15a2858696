//! HTML parsing for the Kindle notebook pages.
//!
//! `read.amazon.com/notebook` has no public API; the library listing and the
//! per-book annotation pages are scraped from the HTML the website serves.
//! Selectors target stable `kp-notebook-*` ids and classes.

use scraper::{ElementRef, Html, Selector};

use crate::model::{Annotation, Book};
use crate::sync::source::SourceError;

/// One page of a book's annotation listing.
///
/// `next_page_token` and `content_limit_state` feed the query string of the
/// next page request; no token means the listing is complete.
#[derive(Debug)]
pub struct NotebookPage {
    pub annotations: Vec<Annotation>,
    pub next_page_token: Option<String>,
    pub content_limit_state: Option<String>,
}

fn malformed(what: &str) -> SourceError {
    SourceError::Fetch(format!("unexpected kindle notebook markup: {what}"))
}

fn select_first<'a>(fragment: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    fragment.select(&selector).next()
}

fn select_first_in<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

/// Text content of an element with entities decoded and edges trimmed.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse the library listing into books.
///
/// # Errors
///
/// `SourceError::Fetch` when a book entry is missing an expected field.
pub fn parse_library(html: &str) -> Result<Vec<Book>, SourceError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.kp-notebook-library-each-book")
        .map_err(|_| malformed("bad library selector"))?;

    let mut books = Vec::new();
    for entry in document.select(&selector) {
        books.push(parse_book_entry(entry)?);
    }
    Ok(books)
}

fn parse_book_entry(entry: ElementRef<'_>) -> Result<Book, SourceError> {
    let asin = entry
        .value()
        .attr("id")
        .ok_or_else(|| malformed("book entry without an id"))?
        .to_string();

    // Some books format their title as "<title>: <subtitle>"; only the part
    // before the colon names the output file, so split them apart.
    let full_title = select_first_in(entry, "h2")
        .map(element_text)
        .ok_or_else(|| malformed("book entry without a title"))?;
    let (title, subtitle) = match full_title.split_once(':') {
        Some((title, subtitle)) => (title.trim().to_string(), Some(subtitle.trim().to_string())),
        None => (full_title, None),
    };

    // The author line reads "By: <author>".
    let author_line = select_first_in(entry, "p")
        .map(element_text)
        .ok_or_else(|| malformed("book entry without an author"))?;
    let author = author_line
        .split_once(':')
        .map_or(author_line.as_str(), |(_, rest)| rest)
        .trim()
        .to_string();

    let image_url = select_first_in(entry, "img")
        .and_then(|img| img.value().attr("src"))
        .ok_or_else(|| malformed("book entry without a cover image"))?
        .to_string();

    // A hidden input carries the date, formatted like
    // "Wednesday January 26, 2022". Kept verbatim.
    let last_opened_date = select_first_in(entry, "input")
        .and_then(|input| input.value().attr("value"))
        .ok_or_else(|| malformed("book entry without a last-opened date"))?
        .to_string();

    Ok(Book {
        asin,
        title,
        subtitle,
        author,
        image_url,
        last_opened_date,
        ..Book::default()
    })
}

/// Parse one annotation page, including the pagination state for the next.
///
/// # Errors
///
/// `SourceError::Fetch` when an annotation row is missing an expected field.
pub fn parse_annotations_page(html: &str) -> Result<NotebookPage, SourceError> {
    let document = Html::parse_document(html);

    let next_page_token = select_first(&document, "input.kp-notebook-annotations-next-page-start")
        .and_then(|input| input.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(String::from);
    let content_limit_state = select_first(&document, "input.kp-notebook-content-limit-state")
        .and_then(|input| input.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(String::from);

    let selector = Selector::parse("div.kp-notebook-row-separator")
        .map_err(|_| malformed("bad annotation selector"))?;

    let mut annotations = Vec::new();
    for row in document.select(&selector) {
        annotations.push(parse_annotation_row(row)?);
    }

    Ok(NotebookPage {
        annotations,
        next_page_token,
        content_limit_state,
    })
}

fn parse_annotation_row(row: ElementRef<'_>) -> Result<Annotation, SourceError> {
    let mut highlight = None;
    let mut highlight_color = None;
    let mut note = None;
    let mut page = None;

    if let Some(highlight_element) = select_first_in(row, "span#highlight") {
        highlight = Some(element_text(highlight_element));

        // The header reads "<color> highlight | Page: <n>" or
        // "<color> highlight | Location: <n>". The location also lives in a
        // dedicated field, so only the page is pulled from here.
        let header = select_first_in(row, "span#annotationHighlightHeader")
            .map(element_text)
            .ok_or_else(|| malformed("highlight without a header"))?;
        let (color, parsed_page) = parse_annotation_header(&header);
        highlight_color = color;
        page = parsed_page;
    }

    // The note span is always present; emptiness signals absence.
    let note_text = select_first_in(row, "span#note")
        .map(element_text)
        .ok_or_else(|| malformed("annotation row without a note span"))?;
    if !note_text.is_empty() {
        note = Some(note_text);

        // Without a highlight, the page number hides in the note header,
        // formatted "Note | Page: <n>".
        if highlight.is_none() {
            let header = select_first_in(row, "span#annotationNoteHeader")
                .map(element_text)
                .ok_or_else(|| malformed("note without a header"))?;
            let (_, parsed_page) = parse_annotation_header(&header);
            page = parsed_page;
        }
    }

    let location = select_first_in(row, "input#kp-annotation-location")
        .and_then(|input| input.value().attr("value"))
        .ok_or_else(|| malformed("annotation row without a location"))?
        .parse::<u32>()
        .map_err(|_| malformed("annotation location is not a number"))?;

    Ok(Annotation {
        highlight,
        highlight_color,
        note,
        page,
        location: Some(location),
        ..Annotation::default()
    })
}

/// Split an annotation header into its color word and optional page number.
///
/// Headers look like "Yellow highlight | Page:\u{a0}32". The separator after
/// "Page:" is a non-breaking space.
fn parse_annotation_header(header: &str) -> (Option<String>, Option<u32>) {
    let Some((kind, position)) = header.split_once('|') else {
        return (None, None);
    };

    let color = kind
        .trim()
        .split_whitespace()
        .next()
        .map(ToString::to_string);

    let page = position
        .trim()
        .split_once(":\u{a0}")
        .filter(|(label, _)| *label == "Page")
        .and_then(|(_, number)| number.trim().parse().ok());

    (color, page)
}
