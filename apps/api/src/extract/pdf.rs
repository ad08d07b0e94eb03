use super::ExtractError;

/// Extracts PDF text page by page, optionally tagging each page with its
/// number and source file so generated questions can cite it.
pub(super) fn pdf_text(
    file_name: &str,
    content: &[u8],
    annotate_pages: bool,
) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(content)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(join_pages(file_name, pages, annotate_pages))
}

fn join_pages(file_name: &str, pages: Vec<String>, annotate_pages: bool) -> String {
    pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            if annotate_pages {
                format!("Page {} of '{}'\n{}", i + 1, file_name, text.trim_end())
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
