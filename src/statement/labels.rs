use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLabels {
    pub doc_title: String,
    pub statement_title: String,
    pub company_fallback: String,
    pub generated_on: String,

    pub employee_code: String,
    pub employee_name: String,
    pub department: String,
    pub designation: String,
    pub location: String,
    pub reporting_head: String,

    pub col_position: String,
    pub col_date: String,
    pub col_details: String,
    pub col_category: String,
    pub col_amount: String,
    pub total: String,

    pub claimed_by: String,
    pub checked_by: String,
    pub authorized_by: String,

    pub attachment_for: String,
    pub date: String,
    pub amount: String,
    document_placeholder: String,
    pub image_error: String,
    page: String,
}

impl StatementLabels {
    pub fn document_placeholder(&self, mime: &str) -> String {
        self.document_placeholder.replace("{mime}", mime)
    }

    pub fn page(&self, page: usize, pages: usize) -> String {
        self.page
            .replace("{page}", &page.to_string())
            .replace("{pages}", &pages.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StatementLabelsFile {
    en: StatementLabels,
}

static STATEMENT_LABELS: OnceLock<std::result::Result<StatementLabelsFile, String>> = OnceLock::new();

pub fn statement_labels() -> Result<&'static StatementLabels> {
    let file = STATEMENT_LABELS.get_or_init(|| {
        let json = include_str!("../../assets/statementLabels.json");
        serde_json::from_str::<StatementLabelsFile>(json)
            .map_err(|e| format!("Failed to parse embedded assets/statementLabels.json: {e}"))
    });

    match file {
        Ok(f) => Ok(&f.en),
        Err(e) => Err(Error::Config(e.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_labels_parse() {
        let l = statement_labels().unwrap();
        assert_eq!(l.claimed_by, "Claimed By");
        assert_eq!(l.page(2, 5), "Page 2 of 5");
        assert!(l.document_placeholder("application/pdf").contains("application/pdf"));
    }
}
