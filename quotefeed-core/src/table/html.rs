//! HTML to [`TabularDocument`] conversion.

use super::document::{Cell, Row, Table, TabularDocument};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("static selector is valid"));

/// Parse an HTML page into its tables.
///
/// Only direct `thead`/`tbody` rows of each table are considered, so nested
/// tables show up as tables of their own instead of polluting their parent.
/// `tfoot` rows are ignored.
pub fn parse_html(html: &str) -> TabularDocument {
    let document = Html::parse_document(html);

    let language = document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(ToString::to_string);

    let tables = document.select(&TABLE).map(convert_table).collect();

    TabularDocument {
        language,
        tables,
        raw: html.to_string(),
    }
}

fn convert_table(table: ElementRef<'_>) -> Table {
    let mut converted = Table::default();

    for section in element_children(table) {
        match section.value().name() {
            "thead" => converted.head.extend(rows_of(section)),
            "tbody" => converted.body.extend(rows_of(section)),
            // html5ever normally wraps bare rows in a tbody
            "tr" => converted.body.push(convert_row(section)),
            _ => {}
        }
    }

    converted
}

fn rows_of(section: ElementRef<'_>) -> impl Iterator<Item = Row> + '_ {
    element_children(section)
        .filter(|el| el.value().name() == "tr")
        .map(convert_row)
}

fn convert_row(row: ElementRef<'_>) -> Row {
    let cells = element_children(row)
        .filter_map(|el| match el.value().name() {
            "th" => Some(Cell::header(cell_text(el))),
            "td" => Some(Cell::data(cell_text(el))),
            _ => None,
        })
        .collect();
    Row { cells }
}

fn element_children(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Cell text with whitespace runs collapsed and trimmed.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
