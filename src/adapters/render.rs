use crate::domain::model::{PartyAddress, ShippingLabel};
use crate::domain::ports::{Document, DocumentRenderer, LayoutOptions, PageSize};
use crate::domain::posting_list::{Closed, PostingList};
use crate::utils::error::{Result, SigepError};
use std::fmt::Write as _;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const LABELS_MEDIA_TYPE: &str = "application/zip";
pub const MANIFEST_MEDIA_TYPE: &str = "text/csv";

/// Plain-text label sheets packed in a zip archive, plus a CSV manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveRenderer;

impl ArchiveRenderer {
    pub fn new() -> Self {
        Self
    }

    fn page(&self, list: &PostingList<Closed>, labels: &[ShippingLabel], layout: &LayoutOptions, page: usize, pages: usize) -> String {
        let margin = " ".repeat(layout.shipping_labels_margin);
        let size = match layout.page_size {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}Posting list {} (carrier #{}), page {}/{} [{}]",
            margin,
            list.custom_id(),
            list.number(),
            page,
            pages,
            size
        );
        for label in labels {
            let _ = writeln!(out, "{}{}", margin, "=".repeat(48));
            let _ = writeln!(
                out,
                "{}{}  {} ({})",
                margin,
                label.tracking_code,
                label.service.description(),
                label.service.code()
            );
            let (index, total) = label.package.sequence();
            let _ = writeln!(
                out,
                "{}Weight: {} g  Volume {}/{}",
                margin,
                label.package.weight(),
                index,
                total
            );
            write_party(&mut out, &margin, "TO", &label.receiver);
            write_party(&mut out, &margin, "FROM", &label.sender);
        }
        out
    }
}

fn write_party(out: &mut String, margin: &str, heading: &str, party: &PartyAddress) {
    let _ = writeln!(out, "{}{}: {}", margin, heading, party.name());
    let mut street = format!("{}, {}", party.street(), party.number());
    if let Some(complement) = party.complement() {
        street.push_str(" - ");
        street.push_str(complement);
    }
    let _ = writeln!(out, "{}  {}", margin, street);
    if let Some(neighborhood) = party.neighborhood() {
        let _ = writeln!(out, "{}  {}", margin, neighborhood);
    }
    let _ = writeln!(
        out,
        "{}  {}/{}  {}",
        margin,
        party.city(),
        party.state(),
        party.zip_code()
    );
}

impl DocumentRenderer for ArchiveRenderer {
    fn render_labels(&self, posting_list: &PostingList<Closed>, layout: &LayoutOptions) -> Result<Document> {
        if layout.labels_per_page == 0 {
            return Err(SigepError::validation(
                "labels_per_page",
                "At least one label per page is required",
            ));
        }

        let chunks: Vec<&[ShippingLabel]> = posting_list
            .shipping_labels()
            .chunks(layout.labels_per_page)
            .collect();
        let pages = chunks.len();

        let bytes = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (i, labels) in chunks.into_iter().enumerate() {
                zip.start_file::<_, ()>(format!("page-{:03}.txt", i + 1), FileOptions::default())?;
                zip.write_all(self.page(posting_list, labels, layout, i + 1, pages).as_bytes())?;
            }
            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!(pages, bytes = bytes.len(), "Label archive built");
        Ok(Document {
            media_type: LABELS_MEDIA_TYPE,
            bytes,
        })
    }

    fn render_posting_list(&self, posting_list: &PostingList<Closed>, layout: &LayoutOptions) -> Result<Document> {
        let buffer = "\n".repeat(layout.posting_list_margin).into_bytes();
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(buffer);

        let Some(first) = posting_list.shipping_labels().first() else {
            return Err(SigepError::validation(
                "posting_list",
                "Cannot render a manifest for an empty posting list",
            ));
        };
        let card = &first.posting_card;

        writer.write_record(["posting_card", card.number.as_str()])?;
        writer.write_record(["contract", card.contract.number.as_str()])?;
        writer.write_record(["sender", first.sender.name()])?;
        writer.write_record(["batch_id", posting_list.custom_id().to_string().as_str()])?;
        writer.write_record(["carrier_number", posting_list.number().to_string().as_str()])?;
        writer.write_record(["closed_at", posting_list.closed_at().to_rfc3339().as_str()])?;

        writer.write_record([
            "tracking_code",
            "service",
            "receiver",
            "zip_code",
            "city",
            "state",
            "weight_g",
            "declared_value",
            "volume",
        ])?;
        for label in posting_list.shipping_labels() {
            let (index, total) = label.package.sequence();
            writer.write_record([
                label.tracking_code.to_string(),
                label.service.code().to_string(),
                label.receiver.name().to_string(),
                label.receiver.zip_code().to_string(),
                label.receiver.city().to_string(),
                label.receiver.state().to_string(),
                label.package.weight().to_string(),
                format!("{:.2}", label.declared_value()),
                format!("{}/{}", index, total),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| SigepError::Io(e.into_error()))?;
        Ok(Document {
            media_type: MANIFEST_MEDIA_TYPE,
            bytes,
        })
    }
}
