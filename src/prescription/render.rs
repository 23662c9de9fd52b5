//! printpdf renderer for [`LayoutPlan`]s.
//!
//! The plan keeps its geometry in f64 millimetres; conversion to the
//! crate's f32 units happens here, at the printpdf boundary only.

use std::io::BufWriter;

use printpdf::*;

use crate::prescription::images::{SlotContent, SlotImages};
use crate::prescription::layout::{
    LayoutPlan, Primitive, SlotKind, TextStyle, PAGE_HEIGHT, PAGE_WIDTH, SLOT_HEIGHT, SLOT_WIDTH,
};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("fuente PDF no disponible: {0}")]
    Font(String),
    #[error("no se pudo serializar el PDF: {0}")]
    Save(String),
    #[error("no se pudo volcar el buffer del PDF: {0}")]
    Buffer(String),
}

fn mm(value: f64) -> Mm {
    Mm(value as f32)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn pick(&self, style: TextStyle) -> &IndirectFontRef {
        match style {
            TextStyle::Regular => &self.regular,
            TextStyle::Bold => &self.bold,
            TextStyle::Oblique => &self.oblique,
        }
    }
}

fn draw_rect(layer: &PdfLayerReference, x: f64, y: f64, width: f64, height: f64, thickness: f64) {
    layer.set_outline_thickness(thickness as f32);
    let points = vec![
        (Point::new(mm(x), mm(y)), false),
        (Point::new(mm(x + width), mm(y)), false),
        (Point::new(mm(x + width), mm(y + height)), false),
        (Point::new(mm(x), mm(y + height)), false),
        (Point::new(mm(x), mm(y)), false),
    ];
    layer.add_line(Line {
        points,
        is_closed: true,
    });
}

/// Embed the slot image aspect-preserved inside the slot box; decode
/// failure degrades to the fallback label like a failed fetch.
fn draw_slot(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    content: &SlotContent,
    fallback: &'static str,
    x: f64,
    y: f64,
) {
    let bytes = match content {
        SlotContent::Image(bytes) => bytes,
        SlotContent::Fallback(label) => {
            layer.use_text(
                *label,
                8.0,
                mm(x + 4.0),
                mm(y + SLOT_HEIGHT / 2.0),
                &fonts.oblique,
            );
            return;
        }
    };

    match printpdf::image_crate::load_from_memory(bytes) {
        Ok(decoded) => {
            let image = Image::from_dynamic_image(&decoded);
            // printpdf renders at 300 dpi by default: px * 25.4 / 300 mm.
            let natural_w = image.image.width.0 as f64 * 25.4 / 300.0;
            let natural_h = image.image.height.0 as f64 * 25.4 / 300.0;
            let scale = (SLOT_WIDTH / natural_w).min(SLOT_HEIGHT / natural_h);
            image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(mm(x)),
                    translate_y: Some(mm(y)),
                    scale_x: Some(scale as f32),
                    scale_y: Some(scale as f32),
                    ..Default::default()
                },
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "slot image decode failed");
            layer.use_text(
                fallback,
                8.0,
                mm(x + 4.0),
                mm(y + SLOT_HEIGHT / 2.0),
                &fonts.oblique,
            );
        }
    }
}

/// Render the plan to PDF bytes. One layer per page, builtin Helvetica
/// only, so the output is deterministic for a given plan and slot set.
pub fn render_pdf(
    plan: &LayoutPlan,
    images: &SlotImages,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let (doc, page1, layer1) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Página 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Font(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Font(e.to_string()))?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| RenderError::Font(e.to_string()))?,
    };

    for (n, page_plan) in plan.pages.iter().enumerate() {
        let layer = if n == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(
                mm(PAGE_WIDTH),
                mm(PAGE_HEIGHT),
                format!("Página {}", n + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        for item in &page_plan.items {
            match &item.primitive {
                Primitive::Text {
                    text,
                    size,
                    style,
                    x,
                    y,
                } => {
                    layer.use_text(text, *size, mm(*x), mm(*y), fonts.pick(*style));
                }
                Primitive::Rule {
                    x1,
                    x2,
                    y,
                    thickness,
                } => {
                    layer.set_outline_thickness(*thickness as f32);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(mm(*x1), mm(*y)), false),
                            (Point::new(mm(*x2), mm(*y)), false),
                        ],
                        is_closed: false,
                    });
                }
                Primitive::Bar {
                    x,
                    y,
                    width,
                    height,
                } => {
                    draw_rect(&layer, *x, *y, *width, *height, 0.2);
                }
                Primitive::ImageSlot { slot, x, y } => match slot {
                    SlotKind::Signature => draw_slot(
                        &layer,
                        &fonts,
                        &images.signature,
                        crate::prescription::images::SIGNATURE_FALLBACK,
                        *x,
                        *y,
                    ),
                    SlotKind::Stamp => draw_slot(
                        &layer,
                        &fonts,
                        &images.stamp,
                        crate::prescription::images::STAMP_FALLBACK,
                        *x,
                        *y,
                    ),
                },
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Save(e.to_string()))?;
    buf.into_inner().map_err(|e| RenderError::Buffer(e.to_string()))
}
