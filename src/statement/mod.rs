//! Monthly expense statement: header band, employee block, expense table with
//! a total, one page per attachment, and the signature band on every page.

pub mod labels;
pub mod layout;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use printpdf::image_crate::{self, DynamicImage};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::attachment::Attachment;
use crate::error::{Error, Result};
use crate::format::{statement_filename, MoneyFormat};
use crate::model::{CompanySettings, EmployeeDetails, Expense};

pub use labels::{statement_labels, StatementLabels};
pub use layout::{AttachmentVisual, DrawOp, PageKind, PagePlan, StatementPlan};

use layout::LayoutInput;
use render::ImageSet;

pub struct StatementRequest<'a> {
    pub company: &'a CompanySettings,
    pub employee: &'a EmployeeDetails,
    pub expenses: &'a [Expense],
    pub generated_at: OffsetDateTime,
    pub money: &'a MoneyFormat,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub plan: StatementPlan,
    pub bytes: Vec<u8>,
    /// `expense-report-<Month>-<Year>.pdf`
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Download { dir: PathBuf },
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Saved(PathBuf),
    Previewed(PathBuf),
}

fn decode_image(a: &Attachment) -> Result<DynamicImage> {
    let bytes = a.decode()?;
    image_crate::load_from_memory(&bytes).map_err(|e| Error::Attachment(format!("failed to decode image: {e}")))
}

pub fn build_statement(req: &StatementRequest<'_>) -> Result<Statement> {
    let labels = statement_labels()?;

    let logo = req.company.logo.as_ref().and_then(|a| match decode_image(a) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(error = %e, "company logo skipped");
            None
        }
    });

    let mut images = ImageSet {
        logo,
        attachments: Vec::with_capacity(req.expenses.len()),
    };
    let mut visuals = Vec::with_capacity(req.expenses.len());
    for (idx, expense) in req.expenses.iter().enumerate() {
        let Some(a) = expense.attachment.as_ref() else {
            images.attachments.push(None);
            visuals.push(None);
            continue;
        };
        if !a.is_image() {
            images.attachments.push(None);
            visuals.push(Some(AttachmentVisual::Placeholder(labels.document_placeholder(&a.mime()))));
            continue;
        }
        match decode_image(a) {
            Ok(img) => {
                visuals.push(Some(AttachmentVisual::Image {
                    px_w: img.width(),
                    px_h: img.height(),
                }));
                images.attachments.push(Some(img));
            }
            Err(e) => {
                warn!(position = idx + 1, error = %e, "attachment image could not be loaded");
                images.attachments.push(None);
                visuals.push(Some(AttachmentVisual::Placeholder(labels.image_error.clone())));
            }
        }
    }

    let input = LayoutInput {
        company: req.company,
        employee: req.employee,
        expenses: req.expenses,
        logo: images.logo.as_ref().map(|img| (img.width(), img.height())),
        visuals: &visuals,
        generated_at: req.generated_at,
        money: req.money,
        labels,
    };
    let plan = layout::plan(&input);
    let bytes = render::render(&plan, &labels.doc_title, &images)?;
    let filename = statement_filename(req.generated_at.month(), req.generated_at.year());

    info!(
        pages = plan.pages.len(),
        rows = req.expenses.len(),
        bytes = bytes.len(),
        "statement generated"
    );
    Ok(Statement { plan, bytes, filename })
}

pub fn deliver(statement: &Statement, mode: &OutputMode) -> Result<Delivery> {
    deliver_with(statement, mode, |path| {
        opener::open(path).map_err(|e| e.to_string())
    })
}

/// Like [`deliver`], with the viewer launch supplied by the caller.
pub fn deliver_with<F>(statement: &Statement, mode: &OutputMode, open: F) -> Result<Delivery>
where
    F: FnOnce(&Path) -> std::result::Result<(), String>,
{
    match mode {
        OutputMode::Download { dir } => {
            let path = write_into(dir, statement)?;
            info!(path = %path.display(), "statement saved");
            Ok(Delivery::Saved(path))
        }
        OutputMode::Preview => {
            let path = write_into(&std::env::temp_dir(), statement)?;
            if let Err(e) = open(&path) {
                warn!(path = %path.display(), error = %e, "statement viewer could not be opened");
                return Err(Error::PreviewUnavailable(e));
            }
            info!(path = %path.display(), "statement opened for preview");
            Ok(Delivery::Previewed(path))
        }
    }
}

fn write_into(dir: &Path, statement: &Statement) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&statement.filename);
    fs::write(&path, &statement.bytes)?;
    Ok(path)
}
