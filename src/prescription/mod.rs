//! Prescription document generation: pure pagination planning, image slot
//! fetching and printpdf rendering.

pub mod format;
pub mod images;
pub mod layout;
pub mod render;

pub use images::{SlotContent, SlotImages};
pub use layout::{plan_prescription, LayoutPlan};
pub use render::{render_pdf, RenderError};

use crate::models::Prescription;

/// Full pipeline: project the stored prescription, fetch footer images
/// (degrading to labels on failure) and render the PDF bytes.
pub async fn generate_prescription_pdf(
    client: &reqwest::Client,
    prescription: &Prescription,
) -> Result<Vec<u8>, RenderError> {
    let record = prescription.to_record();
    let slots = images::fetch_prescription_images(client, &record).await;
    let plan = plan_prescription(&record);
    render_pdf(&plan, &slots, &format!("Receta {}", record.folio))
}
