//! Delivery-note PDF rendering.
//!
//! The document content (which lines appear, in what order) is assembled
//! here; turning lines into bytes is behind the [`PdfRenderer`] seam. The
//! mock renderer emits the same lines as plain text so tests can assert on
//! content without parsing PDF streams.

use albar_types::{
    entities::{Client, DeliveryNote, Project, User},
    error::{Error, Result},
};

/// One rendered line item
#[derive(Debug, Clone, PartialEq)]
pub struct NoteLine {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
}

/// Assembled document content for one delivery note
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDocument {
    pub title: String,
    pub user_name: String,
    pub client_name: String,
    pub project_name: String,
    pub kind: String,
    pub entries: Vec<NoteLine>,
    pub signed: bool,
}

impl NoteDocument {
    /// Assemble the document for a note and its resolved references
    pub fn from_note(note: &DeliveryNote, creator: &User, client: &Client, project: &Project) -> Self {
        Self {
            title: "ALBARÁN".to_string(),
            user_name: creator.display_name(),
            client_name: client.name.clone(),
            project_name: project.name.clone(),
            kind: note.kind.to_string(),
            entries: note
                .entries
                .iter()
                .map(|e| NoteLine {
                    name: e.name.clone(),
                    quantity: e.quantity,
                    unit: e.unit.clone(),
                })
                .collect(),
            signed: note.signed,
        }
    }

    /// The body lines in render order, title excluded
    ///
    /// The trailing FIRMADO marker appears only on signed notes.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Usuario: {}", self.user_name),
            format!("Cliente: {}", self.client_name),
            format!("Proyecto: {}", self.project_name),
            format!("Tipo: {}", self.kind),
            "Entradas:".to_string(),
        ];
        for entry in &self.entries {
            let unit = entry.unit.as_deref().unwrap_or("");
            lines.push(format!("  - {}: {} {}", entry.name, entry.quantity, unit));
        }
        if self.signed {
            lines.push("FIRMADO".to_string());
        }
        lines
    }
}

/// PDF byte-stream renderer abstraction
pub trait PdfRenderer: Send + Sync {
    /// Render the document to bytes; never mutates anything
    fn render(&self, doc: &NoteDocument) -> Result<Vec<u8>>;
}

/// A4 renderer over `printpdf` with the built-in Helvetica font
pub struct PrintPdfRenderer;

impl PrintPdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PrintPdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer for PrintPdfRenderer {
    fn render(&self, doc: &NoteDocument) -> Result<Vec<u8>> {
        use printpdf::{BuiltinFont, Mm, PdfDocument};

        let (pdf, page, layer) = PdfDocument::new(&doc.title, Mm(210.0), Mm(297.0), "Layer 1");
        let font = pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::internal(format!("Failed to load PDF font: {e}")))?;
        let current = pdf.get_page(page).get_layer(layer);

        let mut y = 270.0;
        current.use_text(doc.title.as_str(), 18.0, Mm(80.0), Mm(y), &font);
        y -= 14.0;

        for line in doc.lines() {
            current.use_text(line.as_str(), 12.0, Mm(20.0), Mm(y), &font);
            y -= 7.0;
        }

        pdf.save_to_bytes().map_err(|e| Error::internal(format!("Failed to render PDF: {e}")))
    }
}

/// Mock renderer: title plus lines as plain UTF-8 text
pub struct MockPdfRenderer;

impl MockPdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockPdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer for MockPdfRenderer {
    fn render(&self, doc: &NoteDocument) -> Result<Vec<u8>> {
        let mut text = doc.title.clone();
        for line in doc.lines() {
            text.push('\n');
            text.push_str(&line);
        }
        Ok(text.into_bytes())
    }
}
