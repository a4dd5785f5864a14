use std::io::Cursor;

use printpdf::image_crate::DynamicImage;
use printpdf::path::PaintMode;
use printpdf::{
    Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use crate::error::{Error, Result};

use super::layout::{Align, DrawOp, ImageRef, StatementPlan, Weight, PAGE_H, PAGE_W};

static FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
static FONT_BOLD_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

const IMAGE_DPI: f32 = 300.0;
const ELLIPSIS: char = '…';

/// Decoded pictures referenced by [`ImageRef`]s in the plan.
#[derive(Default)]
pub struct ImageSet {
    pub logo: Option<DynamicImage>,
    /// Parallel to the expense slice the plan was built from.
    pub attachments: Vec<Option<DynamicImage>>,
}

impl ImageSet {
    fn get(&self, r: ImageRef) -> Option<&DynamicImage> {
        match r {
            ImageRef::Logo => self.logo.as_ref(),
            ImageRef::Attachment(i) => self.attachments.get(i).and_then(Option::as_ref),
        }
    }
}

struct Fonts<'f> {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    regular_face: ttf_parser::Face<'f>,
    bold_face: ttf_parser::Face<'f>,
}

impl Fonts<'_> {
    fn pick(&self, weight: Weight) -> (&IndirectFontRef, &ttf_parser::Face<'_>) {
        match weight {
            Weight::Regular => (&self.regular, &self.regular_face),
            Weight::Bold => (&self.bold, &self.bold_face),
        }
    }
}

pub fn render(plan: &StatementPlan, doc_title: &str, images: &ImageSet) -> Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(doc_title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");

    // DejaVu Sans covers the rupee sign and other non-ASCII text.
    let fonts = Fonts {
        regular: doc.add_external_font(Cursor::new(FONT_BYTES))?,
        bold: doc.add_external_font(Cursor::new(FONT_BOLD_BYTES))?,
        regular_face: ttf_parser::Face::parse(FONT_BYTES, 0)
            .map_err(|_| Error::Pdf("failed to parse embedded font for measurement".to_string()))?,
        bold_face: ttf_parser::Face::parse(FONT_BOLD_BYTES, 0)
            .map_err(|_| Error::Pdf("failed to parse embedded bold font for measurement".to_string()))?,
    };

    for (n, page) in plan.pages.iter().enumerate() {
        let layer = if n == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        for op in &page.ops {
            draw(&layer, &fonts, images, op);
        }
    }

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| Error::Pdf(format!("failed to flush pdf buffer: {}", e.error())))
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts<'_>, images: &ImageSet, op: &DrawOp) {
    match op {
        DrawOp::Text {
            text,
            size,
            weight,
            x,
            y,
            align,
            max_width,
        } => {
            let (font, face) = fonts.pick(*weight);
            let text = match max_width {
                Some(w) => fit_text(face, text, *size, *w),
                None => text.clone(),
            };
            let width = text_width_mm_ttf(face, &text, *size);
            let left = match align {
                Align::Left => *x,
                Align::Center => *x - width / 2.0,
                Align::Right => *x - width,
            };
            push_line(layer, font, &text, *size, left.max(0.0), *y);
        }
        DrawOp::FillRect { x, y_top, w, h, gray } => fill_rect_gray(layer, *x, *y_top, *w, *h, *gray),
        DrawOp::StrokeRect {
            x,
            y_top,
            w,
            h,
            thickness,
        } => {
            layer.set_outline_thickness(*thickness);
            let rect = Rect::new(Mm(*x), Mm(y_top - h), Mm(x + w), Mm(*y_top)).with_mode(PaintMode::Stroke);
            layer.add_rect(rect);
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            thickness,
        } => draw_line_with_thickness(layer, (*x1, *y1), (*x2, *y2), *thickness),
        DrawOp::Image {
            source,
            x,
            y_bottom,
            w,
            ..
        } => {
            // Layout only emits image ops for pictures that decoded.
            if let Some(img) = images.get(*source) {
                add_image(layer, img, *x, *y_bottom, *w);
            }
        }
    }
}

fn push_line(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, font_size: f32, x: f32, y: f32) {
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn draw_line_with_thickness(layer: &PdfLayerReference, from: (f32, f32), to: (f32, f32), thickness: f32) {
    layer.set_outline_thickness(thickness);
    layer.add_line(printpdf::Line {
        points: vec![
            (printpdf::Point::new(Mm(from.0), Mm(from.1)), false),
            (printpdf::Point::new(Mm(to.0), Mm(to.1)), false),
        ],
        is_closed: false,
    });
}

fn fill_rect_gray(layer: &PdfLayerReference, x: f32, y_top: f32, w: f32, h: f32, gray: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
    let rect = Rect::new(Mm(x), Mm(y_top - h), Mm(x + w), Mm(y_top)).with_mode(PaintMode::Fill);
    layer.add_rect(rect);
    // reset fill to black for text
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn add_image(layer: &PdfLayerReference, img: &DynamicImage, x: f32, y_bottom: f32, w: f32) {
    // Alpha channels are flattened; printpdf embeds them as a separate mask
    // that some viewers render black.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let natural_w_mm = rgb.width().max(1) as f32 / IMAGE_DPI * 25.4;
    let scale = (w / natural_w_mm).max(0.0001);
    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y_bottom)),
            rotate: None,
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
        },
    );
}

pub(crate) fn text_width_mm_ttf(face: &ttf_parser::Face<'_>, text: &str, font_size_pt: f32) -> f32 {
    // PDF font sizes are in points; coordinates are in millimeters.
    const PT_TO_MM: f32 = 25.4 / 72.0;
    let units_per_em = face.units_per_em() as f32;
    if units_per_em <= 0.0 {
        return 0.0;
    }

    let mut width_units: i32 = 0;
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            continue;
        };
        width_units += face.glyph_hor_advance(gid).unwrap_or(0) as i32;
    }

    (width_units as f32 / units_per_em) * font_size_pt * PT_TO_MM
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width_mm`.
pub(crate) fn fit_text(face: &ttf_parser::Face<'_>, text: &str, font_size_pt: f32, max_width_mm: f32) -> String {
    if text_width_mm_ttf(face, text, font_size_pt) <= max_width_mm {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().chain(std::iter::once(&ELLIPSIS)).collect();
        if text_width_mm_ttf(face, &candidate, font_size_pt) <= max_width_mm {
            return candidate;
        }
    }
    String::new()
}
