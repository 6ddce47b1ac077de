use thiserror::Error;

use crate::schemas::feedback::StudentResponse;

/// A submission pulled out of an uploaded form document.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExtractedForm {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) response: StudentResponse,
}

#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error("Failed to read PDF document: {0}")]
    Pdf(String),
}

/// Extract the form fields from a PDF document.
///
/// The document is expected to follow the submission template: a "Name" and
/// "Email" line, then "1. Point", "2. Evidence" and "3. Explanation" labels
/// each followed by one line of content. A violated template yields `None`
/// fields, never an error; only an unreadable PDF fails.
pub(crate) fn from_pdf(bytes: &[u8]) -> Result<ExtractedForm, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|err| ExtractError::Pdf(err.to_string()))?;
    Ok(from_text(&text))
}

/// Scan extracted document text for the labeled template fields.
pub(crate) fn from_text(text: &str) -> ExtractedForm {
    let lines: Vec<&str> =
        text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

    let mut form = ExtractedForm::default();

    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if lower.starts_with("1. point") {
            form.response.point = following_line(&lines, idx);
        } else if lower.starts_with("2. evidence") {
            form.response.evidence = following_line(&lines, idx);
        } else if lower.starts_with("3. explanation") {
            form.response.explanation = following_line(&lines, idx);
        } else if lower.starts_with("email") {
            form.email = label_remainder(line, "email");
        } else if lower.starts_with("name") {
            form.name = label_remainder(line, "name");
        }
    }

    form
}

/// Value of a numbered field: the first non-blank line after its label, or
/// `None` when the label is the last line of the document.
fn following_line(lines: &[&str], label_idx: usize) -> Option<String> {
    lines.get(label_idx + 1).map(|line| line.to_string())
}

/// Value of an inline field: the rest of the label line, with a separating
/// colon stripped. Empty remainders count as missing.
fn label_remainder(line: &str, label: &str) -> Option<String> {
    let remainder = line.get(label.len()..)?.trim_start_matches(':').trim();
    if remainder.is_empty() {
        None
    } else {
        Some(remainder.to_string())
    }
}
