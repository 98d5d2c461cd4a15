//! Column roles and table schema inference.
//!
//! Quote pages put their columns in arbitrary order and label them in
//! whatever language the site uses. A [`ColumnSpec`] recognizes one column
//! role from its header text; a [`TableSchema`] maps roles to column positions
//! of one table.
//!
//! Detection per table, first hit wins:
//! 1. a header-section row (`thead`) of header cells, else of plain cells;
//! 2. a body row made of header cells;
//! 3. the first body row's data cells, and if none matched, the second's.
//!
//! The first table whose schema carries all mandatory roles is used; any
//! later table is ignored.

use super::document::{Cell, Row, Table, TabularDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Semantic meaning of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Date,
    Close,
    High,
    Low,
    Volume,
    EventType,
    Ratio,
    Amount,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A column role and the header texts that identify it.
///
/// Patterns are regular expressions matched against the whole cell text.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    role: Role,
    patterns: Vec<Regex>,
}

impl ColumnSpec {
    pub fn new(role: Role, patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("^(?:{p})$")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { role, patterns })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

fn builtin(role: Role, patterns: &[&str]) -> ColumnSpec {
    ColumnSpec::new(role, patterns).expect("built-in column patterns are valid")
}

static QUOTE_COLUMNS: Lazy<Vec<ColumnSpec>> = Lazy::new(|| {
    vec![
        builtin(Role::Date, &["Datum.*", "Date.*"]),
        builtin(
            Role::Close,
            &[
                "Schluss.*",
                "Schluß.*",
                "Rücknahmepreis.*",
                "Close.*",
                "Zuletzt",
                "Price",
                "akt. Kurs",
            ],
        ),
        builtin(Role::High, &["Hoch.*", "Tageshoch.*", "Max.*", "High.*"]),
        builtin(Role::Low, &["Tief.*", "Tagestief.*", "Low.*"]),
        builtin(Role::Volume, &["Volumen.*", "Volume.*", "Stück.*"]),
    ]
});

static EVENT_COLUMNS: Lazy<Vec<ColumnSpec>> = Lazy::new(|| {
    vec![
        builtin(
            Role::Date,
            &["Datum.*", "Date.*", "Ex-Tag.*", "Ex-Datum.*", "Ex-Date.*"],
        ),
        builtin(
            Role::EventType,
            &["Typ.*", "Type.*", "Art.*", "Ereignis.*", "Event.*"],
        ),
        builtin(Role::Ratio, &["Verhältnis.*", "Bezugsverhältnis.*", "Ratio.*"]),
        builtin(
            Role::Amount,
            &[
                "Betrag.*",
                "Dividende.*",
                "Ausschüttung.*",
                "Amount.*",
                "Dividend.*",
            ],
        ),
    ]
});

/// The kind of table being extracted, which fixes its column specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Quotes,
    Events,
}

impl DocumentKind {
    /// Column specs in matching priority order.
    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            Self::Quotes => &QUOTE_COLUMNS,
            Self::Events => &EVENT_COLUMNS,
        }
    }

    /// Roles a schema must contain to be usable.
    pub fn mandatory(self) -> &'static [Role] {
        match self {
            Self::Quotes => &[Role::Date, Role::Close],
            Self::Events => &[Role::Date, Role::EventType],
        }
    }
}

/// One matched column: role and zero-based position among the row's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaColumn {
    pub role: Role,
    pub index: usize,
}

/// Mapping from role to column position for one table. At most one column
/// per role, in left-to-right order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<SchemaColumn>,
}

impl TableSchema {
    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn index_of(&self, role: Role) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.role == role)
            .map(|c| c.index)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.index_of(role).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn is_valid_for(&self, kind: DocumentKind) -> bool {
        kind.mandatory().iter().all(|role| self.contains(*role))
    }
}

/// Match a row of header texts against the column specs.
///
/// Left to right, each text claims the first still-unclaimed spec whose
/// pattern matches it, so earlier columns win ties and each role is claimed
/// at most once.
pub fn match_row<S: AsRef<str>>(texts: &[S], specs: &[ColumnSpec]) -> TableSchema {
    let remaining: Vec<&ColumnSpec> = specs.iter().collect();

    let (columns, _) = texts.iter().enumerate().fold(
        (Vec::new(), remaining),
        |(mut columns, remaining), (index, text)| {
            let Some(role) = remaining
                .iter()
                .find(|spec| spec.matches(text.as_ref()))
                .map(|spec| spec.role)
            else {
                return (columns, remaining);
            };

            columns.push(SchemaColumn { role, index });
            let remaining = remaining.into_iter().filter(|s| s.role != role).collect();
            (columns, remaining)
        },
    );

    TableSchema { columns }
}

/// The schema chosen for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMatch {
    /// Position of the table in the document.
    pub table: usize,
    pub schema: TableSchema,
    /// Body rows consumed by detection that must not be extracted as data.
    pub skip_rows: usize,
}

/// Find the first table with a valid schema for `kind`.
pub fn infer_schema(doc: &TabularDocument, kind: DocumentKind) -> Option<SchemaMatch> {
    doc.tables.iter().enumerate().find_map(|(index, table)| {
        let (schema, skip_rows) = detect_schema(table, kind.columns());
        schema.is_valid_for(kind).then_some(SchemaMatch {
            table: index,
            schema,
            skip_rows,
        })
    })
}

/// Detect the schema of a single table, returning it with the number of
/// body rows used up by detection.
pub fn detect_schema(table: &Table, specs: &[ColumnSpec]) -> (TableSchema, usize) {
    if let Some(row) = table.head.iter().find(|r| r.has_header_cells()) {
        return (match_row(&texts(row.header_cells()), specs), 0);
    }

    if let Some(row) = table.head.iter().find(|r| !r.cells.is_empty()) {
        return (match_row(&texts(row.data_cells()), specs), 0);
    }

    if let Some(row) = table.body.iter().find(|r| r.has_header_cells()) {
        return (match_row(&texts(row.header_cells()), specs), 0);
    }

    let mut consumed = 0;
    let mut schema = TableSchema::default();

    for row in table.body.iter().take(2) {
        schema = match_row(&data_texts(row), specs);
        consumed += 1;
        if !schema.is_empty() {
            break;
        }
    }

    (schema, consumed)
}

fn texts<'a>(cells: impl Iterator<Item = &'a Cell>) -> Vec<&'a str> {
    cells.map(|c| c.text.as_str()).collect()
}

fn data_texts(row: &Row) -> Vec<&str> {
    texts(row.data_cells())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes() -> &'static [ColumnSpec] {
        DocumentKind::Quotes.columns()
    }

    #[test]
    fn header_row_in_any_column_order() {
        let schema = match_row(&["Schluss", "Volumen", "Datum"], quotes());
        assert_eq!(schema.index_of(Role::Close), Some(0));
        assert_eq!(schema.index_of(Role::Volume), Some(1));
        assert_eq!(schema.index_of(Role::Date), Some(2));
        assert!(schema.is_valid_for(DocumentKind::Quotes));
    }

    #[test]
    fn each_role_is_claimed_once() {
        let schema = match_row(&["Date", "Close", "Close (adj.)", "Datum"], quotes());
        assert_eq!(schema.columns().len(), 2);
        assert_eq!(schema.index_of(Role::Date), Some(0));
        assert_eq!(schema.index_of(Role::Close), Some(1));
    }

    #[test]
    fn patterns_match_whole_text() {
        let schema = match_row(&["Letzter Preis", "Price"], quotes());
        assert_eq!(schema.index_of(Role::Close), Some(1));
        assert!(!schema.contains(Role::Date));
    }

    #[test]
    fn earlier_spec_wins_for_same_cell() {
        let specs = vec![
            ColumnSpec::new(Role::High, &["Max.*"]).unwrap(),
            ColumnSpec::new(Role::Close, &["Max.*"]).unwrap(),
        ];
        let schema = match_row(&["Maximum", "Maximum"], &specs);
        assert_eq!(schema.index_of(Role::High), Some(0));
        assert_eq!(schema.index_of(Role::Close), Some(1));
    }

    #[test]
    fn thead_header_takes_priority() {
        let table = Table::new(
            vec![Row::header(&["Datum", "Schluss"])],
            vec![Row::data(&["Date", "Close"])],
        );
        let (schema, skip) = detect_schema(&table, quotes());
        assert!(schema.is_valid_for(DocumentKind::Quotes));
        assert_eq!(skip, 0);
    }

    #[test]
    fn thead_without_th_uses_td() {
        let table = Table::new(vec![Row::data(&["Date", "Close"])], vec![]);
        let (schema, skip) = detect_schema(&table, quotes());
        assert!(schema.is_valid_for(DocumentKind::Quotes));
        assert_eq!(skip, 0);
    }

    #[test]
    fn header_cells_in_body() {
        let table = Table::new(
            vec![],
            vec![
                Row::header(&["Datum", "Hoch", "Tief", "Schluss"]),
                Row::data(&["01.03.21", "2", "1", "1,5"]),
            ],
        );
        let (schema, skip) = detect_schema(&table, quotes());
        assert_eq!(schema.index_of(Role::Close), Some(3));
        assert_eq!(skip, 0);
    }

    #[test]
    fn falls_back_to_second_data_row() {
        let table = Table::new(
            vec![],
            vec![
                Row::data(&["Kursdaten", "ACME AG"]),
                Row::data(&["Datum", "Schluss"]),
                Row::data(&["01.03.21", "100,50"]),
            ],
        );
        let (schema, skip) = detect_schema(&table, quotes());
        assert!(schema.is_valid_for(DocumentKind::Quotes));
        assert_eq!(skip, 2);
    }

    #[test]
    fn partial_first_row_does_not_try_second() {
        let table = Table::new(
            vec![],
            vec![Row::data(&["Datum", "Info"]), Row::data(&["Datum", "Schluss"])],
        );
        let (schema, skip) = detect_schema(&table, quotes());
        assert!(!schema.is_valid_for(DocumentKind::Quotes));
        assert_eq!(skip, 1);
    }

    #[test]
    fn first_valid_table_wins() {
        let doc = TabularDocument::new(vec![
            Table::new(vec![Row::header(&["Name", "Wert"])], vec![]),
            Table::new(vec![Row::header(&["Date", "Close"])], vec![]),
            Table::new(vec![Row::header(&["Datum", "Schluss"])], vec![]),
        ]);
        let found = infer_schema(&doc, DocumentKind::Quotes).unwrap();
        assert_eq!(found.table, 1);
    }

    #[test]
    fn no_valid_table() {
        let doc = TabularDocument::new(vec![Table::new(
            vec![Row::header(&["Datum", "Volumen"])],
            vec![],
        )]);
        assert!(infer_schema(&doc, DocumentKind::Quotes).is_none());
    }

    #[test]
    fn event_tables_require_type_column() {
        let events = DocumentKind::Events.columns();
        let schema = match_row(&["Ex-Tag", "Art", "Betrag", "Verhältnis"], events);
        assert!(schema.is_valid_for(DocumentKind::Events));
        assert_eq!(schema.index_of(Role::Amount), Some(2));
        assert_eq!(schema.index_of(Role::Ratio), Some(3));

        let schema = match_row(&["Datum", "Betrag"], events);
        assert!(!schema.is_valid_for(DocumentKind::Events));
    }
}
