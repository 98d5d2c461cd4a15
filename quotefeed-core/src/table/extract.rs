//! Row extraction: typed records from the rows of a matched table.

use super::document::{Row, TabularDocument};
use super::schema::{infer_schema, DocumentKind, Role, TableSchema};
use crate::domain::{EventKind, EventRecord, PriceRecord, Ratio};
use crate::error::FeedError;
use crate::parse::{parse_date, parse_number, parse_quote, LanguageHint, ParseError};
use crate::result::Extraction;

/// A cell that failed to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellError {
    pub role: Role,
    pub text: String,
    pub error: ParseError,
}

/// The data cells of one row, addressed by role through the schema.
#[derive(Debug)]
pub struct RowCells<'a> {
    schema: &'a TableSchema,
    cells: Vec<&'a str>,
    hint: Option<LanguageHint>,
}

impl<'a> RowCells<'a> {
    pub fn new(schema: &'a TableSchema, cells: Vec<&'a str>, hint: Option<LanguageHint>) -> Self {
        Self {
            schema,
            cells,
            hint,
        }
    }

    /// Text of the cell for `role`; `Ok(None)` if the schema has no such column.
    fn text(&self, role: Role) -> Result<Option<&'a str>, CellError> {
        let Some(index) = self.schema.index_of(role) else {
            return Ok(None);
        };
        self.cells
            .get(index)
            .copied()
            .map(Some)
            .ok_or_else(|| CellError {
                role,
                text: String::new(),
                error: ParseError::Empty,
            })
    }

    fn required<T>(
        &self,
        role: Role,
        parse: impl Fn(&str, Option<LanguageHint>) -> Result<T, ParseError>,
    ) -> Result<T, CellError> {
        match self.text(role)? {
            Some(text) => parse(text, self.hint).map_err(|error| CellError {
                role,
                text: text.to_string(),
                error,
            }),
            None => Err(CellError {
                role,
                text: String::new(),
                error: ParseError::Empty,
            }),
        }
    }

    /// Like [`Self::required`], but a lone `-` (and, if `allow_empty`, an
    /// empty cell) means "not available".
    fn optional<T>(
        &self,
        role: Role,
        allow_empty: bool,
        parse: impl Fn(&str, Option<LanguageHint>) -> Result<T, ParseError>,
    ) -> Result<Option<T>, CellError> {
        match self.text(role)? {
            None => Ok(None),
            Some(text) if text.trim() == "-" => Ok(None),
            Some(text) if allow_empty && text.trim().is_empty() => Ok(None),
            Some(_) => self.required(role, parse).map(Some),
        }
    }
}

/// A record type that can be built from one table row.
pub trait FromRow: Sized {
    /// The column set used to find the table.
    const KIND: DocumentKind;

    fn from_row(row: &RowCells<'_>) -> Result<Self, CellError>;
}

impl FromRow for PriceRecord {
    const KIND: DocumentKind = DocumentKind::Quotes;

    fn from_row(row: &RowCells<'_>) -> Result<Self, CellError> {
        let date = row.required(Role::Date, |t, _| parse_date(t))?;
        let value = row.required(Role::Close, parse_quote)?;
        let high = row.optional(Role::High, false, parse_quote)?;
        let low = row.optional(Role::Low, false, parse_quote)?;
        let volume = row.optional(Role::Volume, true, parse_volume)?;

        Ok(Self {
            date,
            value,
            high,
            low,
            volume,
        })
    }
}

impl FromRow for EventRecord {
    const KIND: DocumentKind = DocumentKind::Events;

    fn from_row(row: &RowCells<'_>) -> Result<Self, CellError> {
        let date = row.required(Role::Date, |t, _| parse_date(t))?;
        let kind = row.required(Role::EventType, |t, _| {
            EventKind::classify(t).ok_or(ParseError::Empty)
        })?;
        let ratio = row.optional(Role::Ratio, true, parse_ratio)?;
        let amount = row.optional(Role::Amount, true, parse_quote)?;

        Ok(Self {
            date,
            kind,
            ratio,
            amount,
        })
    }
}

fn parse_volume(text: &str, hint: Option<LanguageHint>) -> Result<i64, ParseError> {
    parse_number(text, hint).map(|v| v.round() as i64)
}

/// Parse `1:4`, `1/4`, `1 for 4` or `1-for-4`.
fn parse_ratio(text: &str, hint: Option<LanguageHint>) -> Result<Ratio, ParseError> {
    let lower = text.to_lowercase();
    let (from, to) = [":", "/", "-for-", " for "]
        .iter()
        .find_map(|sep| lower.split_once(sep))
        .ok_or_else(|| ParseError::Ratio(text.to_string()))?;

    let from = parse_number(from, hint).map_err(|_| ParseError::Ratio(text.to_string()))?;
    let to = parse_number(to, hint).map_err(|_| ParseError::Ratio(text.to_string()))?;
    Ok(Ratio { from, to })
}

/// Extract all records of type `R` from the first matching table of `doc`.
///
/// `page` names the document in error messages. The language hint is taken
/// from the document unless `hint` overrides it. Failing rows are reported
/// and dropped; a missing table or an empty result is reported with the raw
/// document attached.
pub fn extract_table<R: FromRow>(
    doc: &TabularDocument,
    page: &str,
    hint: Option<LanguageHint>,
) -> Extraction<R> {
    let mut out = Extraction::default();

    let Some(found) = infer_schema(doc, R::KIND) else {
        out.errors.push(FeedError::NoTableFound {
            page: page.to_string(),
            raw: doc.raw.clone(),
        });
        return out;
    };

    let hint = hint.or_else(|| doc.language.as_deref().and_then(LanguageHint::from_tag));
    let body = &doc.tables[found.table].body;

    for (offset, row) in body.iter().enumerate().skip(found.skip_rows) {
        match extract_row::<R>(row, &found.schema, hint) {
            Ok(Some(record)) => out.records.push(record),
            Ok(None) => {}
            Err(cell) => out.errors.push(FeedError::RowParse {
                page: page.to_string(),
                row: offset + 1,
                role: cell.role,
                text: cell.text,
                message: cell.error.to_string(),
            }),
        }
    }

    if out.records.is_empty() {
        out.errors.push(FeedError::NoRecords {
            page: page.to_string(),
            raw: doc.raw.clone(),
        });
    }

    out
}

/// Build one record from a row. Rows with fewer than two data cells are
/// decorative and yield `Ok(None)`.
pub fn extract_row<R: FromRow>(
    row: &Row,
    schema: &TableSchema,
    hint: Option<LanguageHint>,
) -> Result<Option<R>, CellError> {
    let cells: Vec<&str> = row.data_cells().map(|c| c.text.as_str()).collect();
    if cells.len() < 2 {
        return Ok(None);
    }
    R::from_row(&RowCells::new(schema, cells, hint)).map(Some)
}
