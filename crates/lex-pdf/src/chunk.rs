use lopdf::Document;

use crate::error::PdfError;

/// One page-range slice of a larger PDF, ready to upload as its own blob.
/// `start_page`/`end_page` are 0-indexed with `end_page` exclusive, matching
/// how the page range is reported back in [`crate::ExtractionResult`].
pub struct PdfChunk {
    pub bytes: Vec<u8>,
    pub start_page: u32,
    pub end_page: u32,
}

pub fn page_count(pdf_bytes: &[u8]) -> Result<u32, PdfError> {
    let doc = Document::load_mem(pdf_bytes)?;
    Ok(doc.get_pages().len() as u32)
}

/// Splits a PDF into chunks of at most `chunk_size_pages` pages each.
///
/// An 84-page document with the default chunk size of 40 yields three
/// chunks covering pages `[0, 40)`, `[40, 80)`, `[80, 84)`.
pub fn split_into_chunks(pdf_bytes: &[u8], chunk_size_pages: u32) -> Result<Vec<PdfChunk>, PdfError> {
    let doc = Document::load_mem(pdf_bytes)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let total_pages = page_numbers.len() as u32;

    let mut chunks = Vec::new();
    let mut chunk_start = 0u32;

    while chunk_start < total_pages {
        let chunk_end = (chunk_start + chunk_size_pages).min(total_pages);

        let keep: std::collections::HashSet<u32> =
            page_numbers[chunk_start as usize..chunk_end as usize].iter().copied().collect();
        let remove: Vec<u32> = page_numbers.iter().copied().filter(|page| !keep.contains(page)).collect();

        let mut chunk_doc = doc.clone();
        chunk_doc.delete_pages(&remove);

        let mut buffer = Vec::new();
        chunk_doc.save_to(&mut buffer)?;

        chunks.push(PdfChunk { bytes: buffer, start_page: chunk_start, end_page: chunk_end });
        chunk_start = chunk_end;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf(pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page_ids = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(lopdf::Stream::new(lopdf::dictionary! {}, b"".to_vec()));
            let page_id = doc.add_object(lopdf::dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            lopdf::Object::Dictionary(lopdf::dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn splits_into_expected_page_ranges() {
        let pdf = minimal_pdf(84);
        let chunks = split_into_chunks(&pdf, 40).unwrap();
        let ranges: Vec<(u32, u32)> = chunks.iter().map(|c| (c.start_page, c.end_page)).collect();
        assert_eq!(ranges, vec![(0, 40), (40, 80), (80, 84)]);
    }

    #[test]
    fn single_chunk_when_under_threshold() {
        let pdf = minimal_pdf(10);
        let chunks = split_into_chunks(&pdf, 40).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start_page, chunks[0].end_page), (0, 10));
    }
}
