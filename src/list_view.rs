//! Table and gallery projections of the expense list. Rebuilt from scratch on
//! every change; nothing here holds state.

use prettytable::{format, row, Table};

use crate::format::{display_date, MoneyFormat};
use crate::model::{Expense, ExpenseId};

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub id: ExpenseId,
    /// 1-based; also the handle for edit/delete.
    pub position: usize,
    pub date: String,
    pub details: String,
    pub category: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardBody {
    /// Inline preview. Dimensions are absent when the image cannot be decoded.
    Image { mime: String, dimensions: Option<(u32, u32)> },
    Download { mime: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryCard {
    pub position: usize,
    pub title: String,
    pub date: String,
    pub body: CardBody,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub rows: Vec<ExpenseRow>,
    pub gallery: Vec<GalleryCard>,
}

impl ListView {
    pub fn project(expenses: &[Expense], money: &MoneyFormat) -> Self {
        let rows = expenses
            .iter()
            .enumerate()
            .map(|(i, e)| ExpenseRow {
                id: e.id,
                position: i + 1,
                date: display_date(&e.date),
                details: e.details.clone(),
                category: e.category.clone(),
                amount: money.format(e.amount),
            })
            .collect();

        let gallery = expenses
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let a = e.attachment.as_ref()?;
                let body = if a.is_image() {
                    let dimensions = a
                        .decode()
                        .ok()
                        .and_then(|bytes| printpdf::image_crate::load_from_memory(&bytes).ok())
                        .map(|img| (img.width(), img.height()));
                    CardBody::Image { mime: a.mime(), dimensions }
                } else {
                    CardBody::Download { mime: a.mime() }
                };
                Some(GalleryCard {
                    position: i + 1,
                    title: format!("Receipt for {}", e.details),
                    date: display_date(&e.date),
                    body,
                })
            })
            .collect();

        Self { rows, gallery }
    }

    pub fn render_table(&self) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(row!["#", "Date", "Details", "Category", r->"Amount", "Actions"]);
        for item in &self.rows {
            table.add_row(row![
                c->item.position,
                item.date,
                item.details,
                item.category,
                r->item.amount,
                format!("edit {0} | delete {0}", item.position)
            ]);
        }
        table.to_string()
    }

    pub fn render_gallery(&self) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row!["#", "Receipt", "Date", "Preview"]);
        for card in &self.gallery {
            let preview = match &card.body {
                CardBody::Image {
                    mime,
                    dimensions: Some((w, h)),
                } => format!("{mime} {w}x{h}px"),
                CardBody::Image { mime, dimensions: None } => format!("{mime} (unreadable image)"),
                CardBody::Download { .. } => format!("Download: attachment save {} <path>", card.position),
            };
            table.add_row(row![card.position, card.title, card.date, preview]);
        }
        table.to_string()
    }
}
