//! Page layout for the expense statement.
//!
//! Layout is pure arithmetic: it turns the statement inputs into a list of
//! pages, each holding draw operations in millimetres with a bottom-left
//! origin (the printpdf convention). The renderer executes the operations
//! without making any layout decisions of its own.

use time::OffsetDateTime;
use tracing::error;

use crate::format::{display_date, display_timestamp, month_name, truncate_chars, MoneyFormat};
use crate::model::{CompanySettings, EmployeeDetails, Expense};

use super::labels::StatementLabels;

pub const PAGE_W: f32 = 210.0;
pub const PAGE_H: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
const CONTENT_W: f32 = PAGE_W - 2.0 * MARGIN;
const TOP_Y: f32 = PAGE_H - MARGIN;

/// A table row (or the total row) whose top would sit below this line goes
/// to the next page. Everything underneath belongs to the signature band.
pub const ROW_BREAK_Y: f32 = 50.0;

pub const COLUMN_WIDTHS: [f32; 5] = [20.0, 30.0, 50.0, 35.0, 45.0];
pub const COLUMN_ALIGN: [Align; 5] = [Align::Center, Align::Left, Align::Left, Align::Left, Align::Right];
pub const DETAILS_BUDGET: usize = 20;

const HEADER_ROW_H: f32 = 8.0;
const ROW_H: f32 = 7.0;
const TOTAL_ROW_H: f32 = 8.0;
const TOTAL_GAP: f32 = 2.0;
const CELL_PAD_LEFT: f32 = 3.0;
const CELL_PAD_RIGHT: f32 = 4.0;
const ROW_BASELINE: f32 = 5.0;

const HEADER_FILL: f32 = 0.92;
const ZEBRA_FILL: f32 = 0.96;
const TOTAL_FILL: f32 = 0.86;
const BORDER_THICKNESS: f32 = 0.4;

const LOGO_BOX: f32 = 25.0;
const META_ROW_H: f32 = 9.0;
const META_COLS: usize = 3;

const SIGNATURE_LABEL_Y: f32 = 36.0;
const SIGNATURE_RULE_Y: f32 = 26.0;
const SIGNATURE_NAME_Y: f32 = 21.0;
const SIGNATURE_COL_W: f32 = 60.0;
const SIGNATURE_RULE_W: f32 = 50.0;
const FOOTER_Y: f32 = 8.0;

/// Lowest point attachment content may reach.
const ATTACHMENT_AREA_BOTTOM: f32 = SIGNATURE_LABEL_Y + 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef {
    Logo,
    /// Index into the expense slice.
    Attachment(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `x` is the anchor for `align`; `y` is the baseline.
    Text {
        text: String,
        size: f32,
        weight: Weight,
        x: f32,
        y: f32,
        align: Align,
        max_width: Option<f32>,
    },
    FillRect {
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        gray: f32,
    },
    StrokeRect {
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        thickness: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    Image {
        source: ImageRef,
        x: f32,
        y_bottom: f32,
        w: f32,
        h: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Table,
    /// 1-based position of the expense the page belongs to.
    Attachment { position: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub kind: PageKind,
    pub ops: Vec<DrawOp>,
    pub table_header: bool,
    /// 1-based positions of the data rows on this page, in drawing order.
    pub rows: Vec<usize>,
    pub total_row: bool,
    pub signature: bool,
}

impl PagePlan {
    fn new(kind: PageKind) -> Self {
        Self {
            kind,
            ops: Vec::new(),
            table_header: false,
            rows: Vec::new(),
            total_row: false,
            signature: false,
        }
    }

    fn text(&mut self, text: impl Into<String>, size: f32, weight: Weight, x: f32, y: f32, align: Align) {
        self.ops.push(DrawOp::Text {
            text: text.into(),
            size,
            weight,
            x,
            y,
            align,
            max_width: None,
        });
    }

    fn text_clipped(&mut self, text: impl Into<String>, size: f32, weight: Weight, x: f32, y: f32, align: Align, max_width: f32) {
        self.ops.push(DrawOp::Text {
            text: text.into(),
            size,
            weight,
            x,
            y,
            align,
            max_width: Some(max_width),
        });
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// What the layout knows about an attachment without touching the bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentVisual {
    Image { px_w: u32, px_h: u32 },
    Placeholder(String),
}

pub struct LayoutInput<'a> {
    pub company: &'a CompanySettings,
    pub employee: &'a EmployeeDetails,
    pub expenses: &'a [Expense],
    /// Pixel size of the decoded logo, if any.
    pub logo: Option<(u32, u32)>,
    /// Parallel to `expenses`; `None` when the expense has no attachment.
    pub visuals: &'a [Option<AttachmentVisual>],
    pub generated_at: OffsetDateTime,
    pub money: &'a MoneyFormat,
    pub labels: &'a StatementLabels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementPlan {
    pub title: String,
    pub total: f64,
    pub pages: Vec<PagePlan>,
}

impl StatementPlan {
    pub fn table_rows(&self) -> Vec<usize> {
        self.pages.iter().flat_map(|p| p.rows.iter().copied()).collect()
    }

    pub fn attachment_pages(&self) -> impl Iterator<Item = &PagePlan> {
        self.pages
            .iter()
            .filter(|p| matches!(p.kind, PageKind::Attachment { .. }))
    }
}

pub fn statement_title(labels: &StatementLabels, at: OffsetDateTime) -> String {
    format!("{} - {} {}", labels.statement_title, month_name(at.month()), at.year())
}

fn column_x(col: usize) -> f32 {
    MARGIN + COLUMN_WIDTHS[..col].iter().sum::<f32>()
}

fn cell_anchor(col: usize) -> f32 {
    let x = column_x(col);
    let w = COLUMN_WIDTHS[col];
    match COLUMN_ALIGN[col] {
        Align::Left => x + CELL_PAD_LEFT,
        Align::Center => x + w / 2.0,
        Align::Right => x + w - CELL_PAD_RIGHT,
    }
}

fn cell_max_width(col: usize) -> f32 {
    COLUMN_WIDTHS[col] - CELL_PAD_LEFT - CELL_PAD_RIGHT
}

fn table_width() -> f32 {
    COLUMN_WIDTHS.iter().sum()
}

/// Fits `(px_w, px_h)` into a `box_w` x `box_h` area keeping the aspect ratio.
pub fn fit_image(px_w: u32, px_h: u32, box_w: f32, box_h: f32) -> (f32, f32) {
    let w = px_w.max(1) as f32;
    let h = px_h.max(1) as f32;
    let scale = (box_w / w).min(box_h / h);
    (w * scale, h * scale)
}

struct Planner<'a> {
    input: &'a LayoutInput<'a>,
    pages: Vec<PagePlan>,
    page: PagePlan,
    y: f32,
    segment_top: f32,
}

pub fn plan(input: &LayoutInput<'_>) -> StatementPlan {
    let total: f64 = input.expenses.iter().map(|e| e.amount).sum();
    let title = statement_title(input.labels, input.generated_at);

    let mut p = Planner {
        input,
        pages: Vec::new(),
        page: PagePlan::new(PageKind::Table),
        y: TOP_Y,
        segment_top: TOP_Y,
    };

    p.header_band(&title);
    p.metadata_block();
    p.table_header();

    for (idx, expense) in input.expenses.iter().enumerate() {
        if p.y < ROW_BREAK_Y {
            p.continue_table_on_new_page();
        }
        p.data_row(idx, expense);
    }
    if input.expenses.is_empty() {
        // keep an empty body so the table frame is visible
        p.y -= ROW_H;
    }
    p.close_segment();

    p.y -= TOTAL_GAP;
    if p.y < ROW_BREAK_Y {
        p.continue_table_on_new_page();
        p.close_segment();
    }
    match p.total_row(total) {
        Ok(()) => p.page.total_row = true,
        Err(e) => error!(error = %e, "failed to draw total row"),
    }

    let finished = std::mem::replace(&mut p.page, PagePlan::new(PageKind::Table));
    p.pages.push(finished);

    for (idx, expense) in input.expenses.iter().enumerate() {
        if let Some(Some(visual)) = input.visuals.get(idx) {
            let page = attachment_page(input, idx, expense, visual);
            p.pages.push(page);
        }
    }

    let mut pages = p.pages;
    let count = pages.len();
    for (n, page) in pages.iter_mut().enumerate() {
        signature_block(page, input.employee, input.labels);
        page.text(
            input.labels.page(n + 1, count),
            7.0,
            Weight::Regular,
            PAGE_W / 2.0,
            FOOTER_Y,
            Align::Center,
        );
    }

    StatementPlan { title, total, pages }
}

impl Planner<'_> {
    fn header_band(&mut self, title: &str) {
        let labels = self.input.labels;
        let top = self.y;

        if let Some((px_w, px_h)) = self.input.logo {
            let (w, h) = fit_image(px_w, px_h, LOGO_BOX, LOGO_BOX);
            self.page.ops.push(DrawOp::Image {
                source: ImageRef::Logo,
                x: MARGIN,
                y_bottom: top - h,
                w,
                h,
            });
        }

        let name = self.input.company.name.trim();
        let name = if name.is_empty() { labels.company_fallback.as_str() } else { name };
        // Centred between the logo box and its mirror on the right.
        let name_w = CONTENT_W - 2.0 * (LOGO_BOX + 5.0);
        self.page
            .text_clipped(name, 20.0, Weight::Bold, PAGE_W / 2.0, top - 12.0, Align::Center, name_w);

        self.page.text(
            format!("{}: {}", labels.generated_on, display_timestamp(self.input.generated_at)),
            8.0,
            Weight::Regular,
            PAGE_W - MARGIN,
            top,
            Align::Right,
        );

        let title_y = top - LOGO_BOX - 6.0;
        self.page
            .text(title, 13.0, Weight::Bold, PAGE_W / 2.0, title_y, Align::Center);
        self.y = title_y - 8.0;
    }

    fn metadata_block(&mut self) {
        let labels = self.input.labels;
        let emp = self.input.employee;
        let cells = [
            (&labels.employee_code, &emp.emp_code),
            (&labels.employee_name, &emp.emp_name),
            (&labels.department, &emp.department),
            (&labels.designation, &emp.designation),
            (&labels.location, &emp.location),
            (&labels.reporting_head, &emp.reporting_head),
        ];

        let top = self.y;
        let rows = cells.len().div_ceil(META_COLS);
        let h = rows as f32 * META_ROW_H + 2.0;
        let col_w = CONTENT_W / META_COLS as f32;

        self.page.ops.push(DrawOp::StrokeRect {
            x: MARGIN,
            y_top: top,
            w: CONTENT_W,
            h,
            thickness: BORDER_THICKNESS,
        });
        for (i, (label, value)) in cells.iter().enumerate() {
            let row = i / META_COLS;
            let col = i % META_COLS;
            self.page.text_clipped(
                format!("{}: {}", label, value.trim()),
                8.5,
                Weight::Regular,
                MARGIN + col as f32 * col_w + 3.0,
                top - 6.5 - row as f32 * META_ROW_H,
                Align::Left,
                col_w - 6.0,
            );
        }
        self.y = top - h - 8.0;
    }

    fn table_header(&mut self) {
        let labels = self.input.labels;
        let headers = [
            &labels.col_position,
            &labels.col_date,
            &labels.col_details,
            &labels.col_category,
            &labels.col_amount,
        ];
        let top = self.y;
        self.segment_top = top;
        self.page.ops.push(DrawOp::FillRect {
            x: MARGIN,
            y_top: top,
            w: table_width(),
            h: HEADER_ROW_H,
            gray: HEADER_FILL,
        });
        for (col, h) in headers.iter().enumerate() {
            self.page.text_clipped(
                h.as_str(),
                9.0,
                Weight::Bold,
                cell_anchor(col),
                top - 5.5,
                COLUMN_ALIGN[col],
                cell_max_width(col),
            );
        }
        self.page.ops.push(DrawOp::Line {
            x1: MARGIN,
            y1: top - HEADER_ROW_H,
            x2: MARGIN + table_width(),
            y2: top - HEADER_ROW_H,
            thickness: BORDER_THICKNESS,
        });
        self.page.table_header = true;
        self.y = top - HEADER_ROW_H;
    }

    fn data_row(&mut self, idx: usize, expense: &Expense) {
        let top = self.y;
        if idx % 2 == 1 {
            self.page.ops.push(DrawOp::FillRect {
                x: MARGIN,
                y_top: top,
                w: table_width(),
                h: ROW_H,
                gray: ZEBRA_FILL,
            });
        }

        let position = idx + 1;
        let cells = [
            format!("{position:02}"),
            display_date(&expense.date),
            truncate_chars(&expense.details, DETAILS_BUDGET),
            expense.category.clone(),
            self.input.money.format(expense.amount),
        ];
        for (col, text) in cells.into_iter().enumerate() {
            self.page.text_clipped(
                text,
                9.0,
                Weight::Regular,
                cell_anchor(col),
                top - ROW_BASELINE,
                COLUMN_ALIGN[col],
                cell_max_width(col),
            );
        }
        self.page.rows.push(position);
        self.y = top - ROW_H;
    }

    /// Frames the table part drawn on the current page: outer border plus
    /// column separators from the header top down to the cursor.
    fn close_segment(&mut self) {
        let top = self.segment_top;
        let bottom = self.y;
        self.page.ops.push(DrawOp::StrokeRect {
            x: MARGIN,
            y_top: top,
            w: table_width(),
            h: top - bottom,
            thickness: BORDER_THICKNESS,
        });
        for col in 1..COLUMN_WIDTHS.len() {
            let x = column_x(col);
            self.page.ops.push(DrawOp::Line {
                x1: x,
                y1: top,
                x2: x,
                y2: bottom,
                thickness: BORDER_THICKNESS,
            });
        }
    }

    fn continue_table_on_new_page(&mut self) {
        self.close_segment();
        let finished = std::mem::replace(&mut self.page, PagePlan::new(PageKind::Table));
        self.pages.push(finished);
        self.y = TOP_Y;
        self.table_header();
    }

    fn total_row(&mut self, total: f64) -> Result<(), String> {
        if !total.is_finite() {
            return Err(format!("total is not a finite number ({total})"));
        }
        let top = self.y;
        let amount_col = COLUMN_WIDTHS.len() - 1;
        self.page.ops.push(DrawOp::FillRect {
            x: MARGIN,
            y_top: top,
            w: table_width(),
            h: TOTAL_ROW_H,
            gray: TOTAL_FILL,
        });
        self.page.text(
            format!("{}:", self.input.labels.total),
            9.5,
            Weight::Bold,
            column_x(amount_col) - CELL_PAD_RIGHT,
            top - 5.5,
            Align::Right,
        );
        self.page.text_clipped(
            self.input.money.format(total),
            9.5,
            Weight::Bold,
            cell_anchor(amount_col),
            top - 5.5,
            Align::Right,
            cell_max_width(amount_col),
        );
        self.y = top - TOTAL_ROW_H;
        Ok(())
    }
}

fn attachment_page(input: &LayoutInput<'_>, idx: usize, expense: &Expense, visual: &AttachmentVisual) -> PagePlan {
    let labels = input.labels;
    let mut page = PagePlan::new(PageKind::Attachment { position: idx + 1 });
    let mut y = TOP_Y;

    page.text_clipped(
        format!("{}: {}", labels.attachment_for, expense.details),
        12.0,
        Weight::Bold,
        MARGIN,
        y,
        Align::Left,
        CONTENT_W,
    );
    y -= 7.0;
    page.text(
        format!("{}: {}", labels.date, display_date(&expense.date)),
        9.0,
        Weight::Regular,
        MARGIN,
        y,
        Align::Left,
    );
    y -= 5.0;
    page.text(
        format!("{}: {}", labels.amount, input.money.format(expense.amount)),
        9.0,
        Weight::Regular,
        MARGIN,
        y,
        Align::Left,
    );
    y -= 6.0;

    match visual {
        AttachmentVisual::Image { px_w, px_h } => {
            let area_h = (y - ATTACHMENT_AREA_BOTTOM).max(1.0);
            let (w, h) = fit_image(*px_w, *px_h, CONTENT_W, area_h);
            page.ops.push(DrawOp::Image {
                source: ImageRef::Attachment(idx),
                x: MARGIN + (CONTENT_W - w) / 2.0,
                y_bottom: y - h,
                w,
                h,
            });
        }
        AttachmentVisual::Placeholder(notice) => {
            page.text_clipped(notice.as_str(), 10.0, Weight::Regular, MARGIN, y - 6.0, Align::Left, CONTENT_W);
        }
    }
    page
}

fn signature_block(page: &mut PagePlan, employee: &EmployeeDetails, labels: &StatementLabels) {
    let slots = [
        (&labels.claimed_by, employee.emp_name.trim()),
        (&labels.checked_by, ""),
        (&labels.authorized_by, employee.reporting_head.trim()),
    ];
    for (i, (label, name)) in slots.iter().enumerate() {
        let x = MARGIN + i as f32 * SIGNATURE_COL_W;
        page.text(label.as_str(), 9.0, Weight::Bold, x, SIGNATURE_LABEL_Y, Align::Left);
        page.ops.push(DrawOp::Line {
            x1: x,
            y1: SIGNATURE_RULE_Y,
            x2: x + SIGNATURE_RULE_W,
            y2: SIGNATURE_RULE_Y,
            thickness: 0.5,
        });
        if !name.is_empty() {
            page.text_clipped(*name, 9.0, Weight::Regular, x, SIGNATURE_NAME_Y, Align::Left, SIGNATURE_RULE_W);
        }
    }
    page.signature = true;
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::attachment::Attachment;
    use crate::model::ExpenseId;
    use crate::statement::labels::statement_labels;

    fn expense(details: &str, amount: f64) -> Expense {
        Expense {
            id: ExpenseId::new(),
            date: "2026-10-03".into(),
            category: "Travel".into(),
            amount,
            details: details.into(),
            attachment: None,
        }
    }

    fn plan_for(expenses: &[Expense], visuals: &[Option<AttachmentVisual>]) -> StatementPlan {
        let company = CompanySettings {
            name: "Acme Corp".into(),
            logo: None,
        };
        let employee = EmployeeDetails {
            emp_code: "E-42".into(),
            emp_name: "Asha Rao".into(),
            department: "Sales".into(),
            designation: "Manager".into(),
            location: "Pune".into(),
            reporting_head: "Vikram Shah".into(),
        };
        let money = MoneyFormat::default();
        let labels = statement_labels().unwrap();
        let input = LayoutInput {
            company: &company,
            employee: &employee,
            expenses,
            logo: None,
            visuals,
            generated_at: datetime!(2026-10-16 10:30:00 UTC),
            money: &money,
            labels,
        };
        plan(&input)
    }

    fn no_visuals(n: usize) -> Vec<Option<AttachmentVisual>> {
        vec![None; n]
    }

    #[test]
    fn three_expenses_give_three_rows_and_total() {
        let list = vec![expense("Hotel", 100.0), expense("Flight", 250.5), expense("Cab", 49.5)];
        let plan = plan_for(&list, &no_visuals(3));

        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.total, 400.0);
        assert_eq!(plan.table_rows(), vec![1, 2, 3]);
        let page = &plan.pages[0];
        assert!(page.total_row);
        assert!(page.texts().any(|t| t == "₹400.00"));
        assert_eq!(plan.title, "Expense Statement - October 2026");
    }

    #[test]
    fn empty_statement_has_header_and_zero_total() {
        let plan = plan_for(&[], &[]);
        assert_eq!(plan.pages.len(), 1);
        let page = &plan.pages[0];
        assert!(page.table_header);
        assert!(page.rows.is_empty());
        assert!(page.total_row);
        assert!(page.texts().any(|t| t == "₹0.00"));
        assert_eq!(plan.total, 0.0);
    }

    #[test]
    fn long_tables_repeat_header_without_losing_rows() {
        let list: Vec<_> = (0..80).map(|i| expense(&format!("item {i}"), 1.0)).collect();
        let plan = plan_for(&list, &no_visuals(list.len()));

        assert!(plan.pages.len() >= 3);
        assert_eq!(plan.table_rows(), (1..=80).collect::<Vec<_>>());
        for page in &plan.pages {
            if !page.rows.is_empty() {
                assert!(page.table_header, "page with rows lacks the header");
            }
            assert!(page.signature);
        }
        assert_eq!(plan.total, 80.0);
        assert!(plan.pages.last().unwrap().total_row);
    }

    #[test]
    fn rows_never_cross_the_break_line() {
        let list: Vec<_> = (0..60).map(|i| expense(&format!("row {i}"), 2.0)).collect();
        let plan = plan_for(&list, &no_visuals(list.len()));
        for page in &plan.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, size, weight: Weight::Regular, .. } = op {
                    // data row baselines sit above the signature band
                    if *size == 9.0 && *y > SIGNATURE_LABEL_Y + 1.0 {
                        assert!(*y >= ROW_BREAK_Y - ROW_BASELINE - 0.01);
                    }
                }
            }
        }
    }

    #[test]
    fn first_page_break_happens_at_threshold() {
        // Find the largest table that still fits on one page, then add one row.
        let mut n = 1;
        loop {
            let list: Vec<_> = (0..n).map(|i| expense(&format!("r{i}"), 1.0)).collect();
            let plan = plan_for(&list, &no_visuals(n));
            let first_rows = plan.pages[0].rows.len();
            if first_rows < n {
                assert!(plan.pages[1].table_header);
                assert_eq!(plan.pages[1].rows.first(), Some(&(first_rows + 1)));
                break;
            }
            n += 1;
            assert!(n < 100);
        }
    }

    #[test]
    fn total_row_moves_to_new_page_with_header() {
        // Fill the first page exactly so no space is left for the total.
        let mut n = 1;
        let plan = loop {
            let list: Vec<_> = (0..n).map(|i| expense(&format!("r{i}"), 1.0)).collect();
            let plan = plan_for(&list, &no_visuals(n));
            let table_pages = plan.pages.iter().filter(|p| p.kind == PageKind::Table).count();
            if table_pages == 2 && plan.pages[1].rows.is_empty() {
                break plan;
            }
            n += 1;
            assert!(n < 100, "no overflow case found");
        };
        let second = &plan.pages[1];
        assert!(second.table_header);
        assert!(second.total_row);
        assert!(!plan.pages[0].total_row);
    }

    #[test]
    fn details_are_truncated_to_budget() {
        let list = vec![expense("Conference registration fee", 10.0), expense("Cab", 1.0)];
        let plan = plan_for(&list, &no_visuals(2));
        let texts: Vec<_> = plan.pages[0].texts().collect();
        assert!(texts.contains(&"Conference registrat"));
        assert!(texts.contains(&"Cab"));
    }

    #[test]
    fn zebra_striping_shades_every_second_row() {
        let list: Vec<_> = (0..4).map(|i| expense(&format!("r{i}"), 1.0)).collect();
        let plan = plan_for(&list, &no_visuals(4));
        let zebra = plan.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { gray, .. } if *gray == ZEBRA_FILL))
            .count();
        assert_eq!(zebra, 2);
    }

    #[test]
    fn one_attachment_page_per_attached_expense() {
        let mut list = vec![expense("No receipt", 1.0), expense("Photo", 2.0), expense("Scan", 3.0)];
        list[1].attachment = Some(Attachment::from_bytes("image/png", b"x"));
        list[2].attachment = Some(Attachment::from_bytes("application/pdf", b"x"));
        let visuals = vec![
            None,
            Some(AttachmentVisual::Image { px_w: 800, px_h: 1200 }),
            Some(AttachmentVisual::Placeholder("placeholder notice".into())),
        ];
        let plan = plan_for(&list, &visuals);

        let pages: Vec<_> = plan.attachment_pages().collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].kind, PageKind::Attachment { position: 2 });
        assert!(pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Image { source: ImageRef::Attachment(1), .. })));
        assert!(pages[1].texts().any(|t| t == "placeholder notice"));
        assert!(pages.iter().all(|p| p.signature));
    }

    #[test]
    fn attachment_image_keeps_aspect_ratio_inside_area() {
        let mut list = vec![expense("Tall", 1.0)];
        list[0].attachment = Some(Attachment::from_bytes("image/png", b"x"));
        let visuals = vec![Some(AttachmentVisual::Image { px_w: 100, px_h: 400 })];
        let plan = plan_for(&list, &visuals);
        let page = plan.attachment_pages().next().unwrap();
        let (w, h, y_bottom) = page
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Image { w, h, y_bottom, .. } => Some((*w, *h, *y_bottom)),
                _ => None,
            })
            .unwrap();
        assert!((h / w - 4.0).abs() < 1e-3);
        assert!(y_bottom >= ATTACHMENT_AREA_BOTTOM - 1e-3);
        assert!(w <= CONTENT_W + 1e-3);
    }

    #[test]
    fn signature_names_come_from_employee() {
        let plan = plan_for(&[expense("x", 1.0)], &no_visuals(1));
        let texts: Vec<_> = plan.pages[0].texts().collect();
        for want in ["Claimed By", "Checked By", "Authorized By", "Asha Rao", "Vikram Shah"] {
            assert!(texts.contains(&want), "missing {want}");
        }
    }

    #[test]
    fn footer_numbers_every_page() {
        let list: Vec<_> = (0..40).map(|i| expense(&format!("r{i}"), 1.0)).collect();
        let plan = plan_for(&list, &no_visuals(40));
        let n = plan.pages.len();
        for (i, page) in plan.pages.iter().enumerate() {
            let want = format!("Page {} of {}", i + 1, n);
            assert!(page.texts().any(|t| t == want));
        }
    }

    #[test]
    fn non_finite_total_skips_total_row_only() {
        let list = vec![expense("a", f64::MAX), expense("b", f64::MAX)];
        let plan = plan_for(&list, &no_visuals(2));
        assert_eq!(plan.table_rows(), vec![1, 2]);
        assert!(!plan.pages[0].total_row);
        assert!(plan.pages[0].signature);
    }

    #[test]
    fn fit_image_scales_both_ways() {
        assert_eq!(fit_image(50, 50, 25.0, 25.0), (25.0, 25.0));
        let (w, h) = fit_image(1000, 500, 25.0, 25.0);
        assert!((w - 25.0).abs() < 1e-4 && (h - 12.5).abs() < 1e-4);
    }
}
