//! Pure pagination planner for prescription documents.
//!
//! Produces a [`LayoutPlan`] of positioned primitives in millimetres on A4
//! pages. The plan is deterministic for a given record, so pagination rules
//! are asserted here directly instead of being dug out of PDF bytes. The
//! printpdf side lives in [`crate::prescription::render`].

use crate::models::{MedicationEntry, PrescriptionRecord, PLACEHOLDER};
use crate::prescription::format::{format_date_es, wrap_text};

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN_LEFT: f64 = 20.0;
pub const MARGIN_RIGHT: f64 = 20.0;
/// First-page cursor start (y grows upward in PDF space).
pub const TOP_START: f64 = 277.0;
/// Continuation pages skip the letterhead and start a little higher.
pub const CONTINUATION_TOP: f64 = 272.0;
/// Body content never descends below this line.
pub const BOTTOM_MARGIN: f64 = 30.0;
pub const LINE_H: f64 = 4.5;
/// Character limit per wrapped line at body size.
pub const WRAP_COLS: usize = 78;

/// Extra clearance required beyond a block's own height before it is
/// placed; avoids entries hugging the bottom edge.
const BLOCK_THRESHOLD: f64 = 6.0;

const BARCODE_HEIGHT: f64 = 8.0;
const SIGNATURE_Y: f64 = 42.0;
const SIGNATURE_X: f64 = 30.0;
const STAMP_X: f64 = 125.0;
/// Footer block (rules, slots, issue date) total height.
const FOOTER_HEIGHT: f64 = 34.0;

pub const SLOT_WIDTH: f64 = 55.0;
pub const SLOT_HEIGHT: f64 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
    Oblique,
}

/// Owning section of a placed primitive, used to locate content in tests
/// and to pick per-section styling in the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Doctor,
    Patient,
    Diagnosis,
    Medication,
    Notes,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Signature,
    Stamp,
}

#[derive(Debug, Clone)]
pub enum Primitive {
    Text {
        text: String,
        size: f32,
        style: TextStyle,
        x: f64,
        y: f64,
    },
    Rule {
        x1: f64,
        x2: f64,
        y: f64,
        thickness: f64,
    },
    Bar {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    ImageSlot {
        slot: SlotKind,
        x: f64,
        y: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Placed {
    pub section: Section,
    /// Index into the record's medication list when the primitive belongs
    /// to one entry; lets tests check that no entry straddles pages.
    pub med_index: Option<usize>,
    pub primitive: Primitive,
}

#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    pub items: Vec<Placed>,
}

#[derive(Debug, Clone)]
pub struct LayoutPlan {
    pub pages: Vec<PagePlan>,
}

/// Vertical cursor walking pages top to bottom.
struct Cursor {
    pages: Vec<PagePlan>,
    y: f64,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PagePlan::default()],
            y: TOP_START,
        }
    }

    fn remaining(&self) -> f64 {
        self.y - BOTTOM_MARGIN
    }

    fn break_page(&mut self) {
        self.pages.push(PagePlan::default());
        self.y = CONTINUATION_TOP;
    }

    fn ensure(&mut self, height: f64) {
        if self.remaining() < height {
            self.break_page();
        }
    }

    fn place(&mut self, section: Section, med_index: Option<usize>, primitive: Primitive) {
        // pages is never empty
        if let Some(page) = self.pages.last_mut() {
            page.items.push(Placed {
                section,
                med_index,
                primitive,
            });
        }
    }

    fn text(
        &mut self,
        section: Section,
        med_index: Option<usize>,
        text: impl Into<String>,
        size: f32,
        style: TextStyle,
        x: f64,
    ) {
        let y = self.y;
        self.place(
            section,
            med_index,
            Primitive::Text {
                text: text.into(),
                size,
                style,
                x,
                y,
            },
        );
    }

    fn advance(&mut self, dy: f64) {
        self.y -= dy;
    }
}

fn or_placeholder(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

/// Total height a medication block will occupy, computed before placement
/// so the block is moved to a fresh page as a unit when it does not fit.
fn medication_block_height(med: &MedicationEntry) -> f64 {
    let mut lines = 2.0; // name+dosage, frequency
    if med.duration.is_some() {
        lines += 1.0;
    }
    if let Some(instructions) = &med.instructions {
        lines += wrap_text(instructions, WRAP_COLS).len() as f64;
    }
    lines * LINE_H + 3.0 // trailing gap between entries
}

fn plan_header(cursor: &mut Cursor, record: &PrescriptionRecord) {
    cursor.text(
        Section::Header,
        None,
        "RECETA MÉDICA",
        18.0,
        TextStyle::Bold,
        MARGIN_LEFT,
    );
    cursor.text(
        Section::Header,
        None,
        format!("Folio: {}", record.folio),
        9.0,
        TextStyle::Regular,
        PAGE_WIDTH - MARGIN_RIGHT - 70.0,
    );
    cursor.advance(LINE_H);

    // Cosmetic barcode: bar widths keyed off the folio bytes so the strip
    // is stable for a given document.
    let mut x = PAGE_WIDTH - MARGIN_RIGHT - 70.0;
    let bar_y = cursor.y - BARCODE_HEIGHT;
    for byte in record.folio.bytes().take(32) {
        let width = 0.3 + f64::from(byte % 5) * 0.12;
        cursor.place(
            Section::Header,
            None,
            Primitive::Bar {
                x,
                y: bar_y,
                width,
                height: BARCODE_HEIGHT,
            },
        );
        x += width + 0.4;
    }

    cursor.advance(BARCODE_HEIGHT + 2.0);
    cursor.place(
        Section::Header,
        None,
        Primitive::Rule {
            x1: MARGIN_LEFT,
            x2: PAGE_WIDTH - MARGIN_RIGHT,
            y: cursor.y,
            thickness: 0.6,
        },
    );
    cursor.advance(LINE_H + 2.0);
}

fn plan_doctor(cursor: &mut Cursor, record: &PrescriptionRecord) {
    cursor.text(
        Section::Doctor,
        None,
        record.doctor_name.clone(),
        12.0,
        TextStyle::Bold,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    cursor.text(
        Section::Doctor,
        None,
        or_placeholder(&record.doctor_specialty).to_string(),
        10.0,
        TextStyle::Regular,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    cursor.text(
        Section::Doctor,
        None,
        format!("Cédula profesional: {}", or_placeholder(&record.doctor_license)),
        9.0,
        TextStyle::Regular,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    cursor.text(
        Section::Doctor,
        None,
        or_placeholder(&record.doctor_clinic).to_string(),
        9.0,
        TextStyle::Regular,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H + 3.0);
}

fn plan_patient(cursor: &mut Cursor, record: &PrescriptionRecord) {
    let age = record
        .patient_age
        .map(|a| format!("{a} años"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    cursor.text(
        Section::Patient,
        None,
        format!("Paciente: {}", record.patient_name),
        10.0,
        TextStyle::Bold,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    cursor.text(
        Section::Patient,
        None,
        format!("Edad: {age}"),
        9.0,
        TextStyle::Regular,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    cursor.text(
        Section::Patient,
        None,
        format!("Fecha: {}", format_date_es(record.issued_on)),
        9.0,
        TextStyle::Regular,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H + 3.0);
}

fn plan_diagnosis(cursor: &mut Cursor, record: &PrescriptionRecord) {
    cursor.ensure(LINE_H * 3.0 + BLOCK_THRESHOLD);
    cursor.text(
        Section::Diagnosis,
        None,
        "Diagnóstico",
        11.0,
        TextStyle::Bold,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    for line in wrap_text(or_placeholder(&record.diagnosis), WRAP_COLS) {
        cursor.ensure(LINE_H + BLOCK_THRESHOLD);
        cursor.text(Section::Diagnosis, None, line, 10.0, TextStyle::Regular, MARGIN_LEFT);
        cursor.advance(LINE_H);
    }
    cursor.advance(3.0);
}

fn plan_medications(cursor: &mut Cursor, record: &PrescriptionRecord) {
    cursor.ensure(LINE_H * 3.0 + BLOCK_THRESHOLD);
    cursor.text(
        Section::Medication,
        None,
        "Medicamentos",
        11.0,
        TextStyle::Bold,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H + 1.0);

    for (index, med) in record.medications.iter().enumerate() {
        // Atomic placement: either the whole block fits or it opens the
        // next page.
        cursor.ensure(medication_block_height(med) + BLOCK_THRESHOLD);

        cursor.text(
            Section::Medication,
            Some(index),
            format!("{}. {} {}", index + 1, med.name, med.dosage),
            10.0,
            TextStyle::Bold,
            MARGIN_LEFT,
        );
        cursor.advance(LINE_H);
        cursor.text(
            Section::Medication,
            Some(index),
            format!("Frecuencia: {}", med.frequency),
            9.0,
            TextStyle::Regular,
            MARGIN_LEFT + 5.0,
        );
        cursor.advance(LINE_H);
        if let Some(duration) = &med.duration {
            cursor.text(
                Section::Medication,
                Some(index),
                format!("Duración: {duration}"),
                9.0,
                TextStyle::Regular,
                MARGIN_LEFT + 5.0,
            );
            cursor.advance(LINE_H);
        }
        if let Some(instructions) = &med.instructions {
            for line in wrap_text(instructions, WRAP_COLS) {
                cursor.text(
                    Section::Medication,
                    Some(index),
                    line,
                    9.0,
                    TextStyle::Oblique,
                    MARGIN_LEFT + 5.0,
                );
                cursor.advance(LINE_H);
            }
        }
        cursor.advance(3.0);
    }
}

fn plan_notes(cursor: &mut Cursor, record: &PrescriptionRecord) {
    cursor.ensure(LINE_H * 3.0 + BLOCK_THRESHOLD);
    cursor.text(
        Section::Notes,
        None,
        "Indicaciones generales",
        11.0,
        TextStyle::Bold,
        MARGIN_LEFT,
    );
    cursor.advance(LINE_H);
    for line in wrap_text(or_placeholder(&record.notes), WRAP_COLS) {
        cursor.ensure(LINE_H + BLOCK_THRESHOLD);
        cursor.text(Section::Notes, None, line, 9.0, TextStyle::Regular, MARGIN_LEFT);
        cursor.advance(LINE_H);
    }
}

/// Footer sits at fixed coordinates on the final page; a fresh page is
/// opened when body content has run into its area.
fn plan_footer(cursor: &mut Cursor, record: &PrescriptionRecord) {
    if cursor.y < FOOTER_HEIGHT + BOTTOM_MARGIN {
        cursor.break_page();
    }

    cursor.place(
        Section::Footer,
        None,
        Primitive::ImageSlot {
            slot: SlotKind::Signature,
            x: SIGNATURE_X,
            y: SIGNATURE_Y,
        },
    );
    cursor.place(
        Section::Footer,
        None,
        Primitive::ImageSlot {
            slot: SlotKind::Stamp,
            x: STAMP_X,
            y: SIGNATURE_Y,
        },
    );
    for (x, label) in [(SIGNATURE_X, "Firma del médico"), (STAMP_X, "Sello")] {
        cursor.place(
            Section::Footer,
            None,
            Primitive::Rule {
                x1: x,
                x2: x + SLOT_WIDTH,
                y: SIGNATURE_Y - 2.0,
                thickness: 0.4,
            },
        );
        cursor.place(
            Section::Footer,
            None,
            Primitive::Text {
                text: label.to_string(),
                size: 8.0,
                style: TextStyle::Regular,
                x,
                y: SIGNATURE_Y - 6.5,
            },
        );
    }
    cursor.place(
        Section::Footer,
        None,
        Primitive::Text {
            text: format!(
                "Expedida el {} · Folio {}",
                format_date_es(record.issued_on),
                record.folio
            ),
            size: 8.0,
            style: TextStyle::Oblique,
            x: MARGIN_LEFT,
            y: 20.0,
        },
    );
}

/// Lay out the whole document. Never fails: every missing optional field
/// is replaced with the placeholder text.
pub fn plan_prescription(record: &PrescriptionRecord) -> LayoutPlan {
    let mut cursor = Cursor::new();
    plan_header(&mut cursor, record);
    plan_doctor(&mut cursor, record);
    plan_patient(&mut cursor, record);
    plan_diagnosis(&mut cursor, record);
    plan_medications(&mut cursor, record);
    plan_notes(&mut cursor, record);
    plan_footer(&mut cursor, record);
    LayoutPlan {
        pages: cursor.pages,
    }
}
