//! Markup-independent model of a tabular document.
//!
//! Schema inference only needs to know, per table, which rows sit in the
//! header section, which rows sit in the body, and whether a cell was marked
//! up as a header cell. HTML is converted into this model once by
//! [`super::html`].

/// One table cell: normalized text plus header-markup flag (`<th>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub header: bool,
}

impl Cell {
    pub fn data(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            header: false,
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            header: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    /// Row of plain data cells.
    pub fn data<S: AsRef<str>>(texts: &[S]) -> Self {
        Self {
            cells: texts.iter().map(|t| Cell::data(t.as_ref())).collect(),
        }
    }

    /// Row of header-markup cells.
    pub fn header<S: AsRef<str>>(texts: &[S]) -> Self {
        Self {
            cells: texts.iter().map(|t| Cell::header(t.as_ref())).collect(),
        }
    }

    pub fn header_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.header)
    }

    pub fn data_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.header)
    }

    pub fn has_header_cells(&self) -> bool {
        self.cells.iter().any(|c| c.header)
    }
}

/// A table split into its header section and its body rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub head: Vec<Row>,
    pub body: Vec<Row>,
}

impl Table {
    pub fn new(head: Vec<Row>, body: Vec<Row>) -> Self {
        Self { head, body }
    }
}

/// All tables of a document in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularDocument {
    /// Declared document language (`<html lang>`), if any.
    pub language: Option<String>,
    pub tables: Vec<Table>,
    /// Original markup, kept for diagnostics.
    pub raw: String,
}

impl TabularDocument {
    pub fn new(tables: Vec<Table>) -> Self {
        Self {
            language: None,
            tables,
            raw: String::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}
