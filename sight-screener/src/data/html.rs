//! Small helpers over `scraper` shared by the extractors.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("cell selector"));

/// Collapse runs of whitespace (including full-width spaces) into one space.
pub fn normalize_ws(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{3000}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fold full-width digits, decimal point, comma and percent sign to ASCII.
pub fn fold_fullwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '．' => '.',
            '，' => ',',
            '％' => '%',
            _ => c,
        })
        .collect()
}

/// Visible text of an element, whitespace-normalized.
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// First `<table>` in the document, if any.
pub fn first_table(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&TABLE).next()
}

/// All `<tr>` rows under an element, in document order.
pub fn rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table.select(&ROW).collect()
}

/// Cell texts (`th` and `td`) of a row.
pub fn cell_texts(row: &ElementRef<'_>) -> Vec<String> {
    row.select(&CELL).map(|cell| element_text(&cell)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  a \n\t b\u{3000}c  "), "a b c");
        assert_eq!(normalize_ws(""), "");
    }

    #[test]
    fn test_fold_fullwidth() {
        assert_eq!(fold_fullwidth("１２３億４，５００万"), "123億4,500万");
        assert_eq!(fold_fullwidth("（４５．０％）"), "（45.0%）");
        assert_eq!(fold_fullwidth("abc"), "abc");
    }

    #[test]
    fn test_first_table_rows_and_cells() {
        let doc = Html::parse_document(
            "<div><table><tr><th>h1</th><th>h2</th></tr>\
             <tr><td> x </td><td><a href='#'>y</a> z</td></tr></table>\
             <table><tr><td>other</td></tr></table></div>",
        );
        let table = first_table(&doc).unwrap();
        let rows = rows(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(cell_texts(&rows[0]), vec!["h1", "h2"]);
        assert_eq!(cell_texts(&rows[1]), vec!["x", "y z"]);
    }

    #[test]
    fn test_no_table() {
        let doc = Html::parse_document("<p>maintenance</p>");
        assert!(first_table(&doc).is_none());
    }
}
