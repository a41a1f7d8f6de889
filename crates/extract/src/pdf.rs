use lopdf::Document;
use tracing::warn;

use crate::error::ExtractError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// One blob per page, in page order.
pub(crate) fn extract_pdf(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    // lopdf tolerates a little leading junk before the header; anything
    // without a header in the first KiB is not a PDF.
    let head = &bytes[..bytes.len().min(1024)];
    if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Err(ExtractError::pdf("missing %PDF header"));
    }

    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::pdf(e.to_string()))?;
    let pages = doc.get_pages();

    let mut out = Vec::with_capacity(pages.len());
    for &number in pages.keys() {
        match doc.extract_text(&[number]) {
            Ok(text) => out.push(text),
            Err(err) => {
                warn!(page = number, error = %err, "extract.pdf_page_undecodable");
                out.push(String::new());
            }
        }
    }
    Ok(out)
}
