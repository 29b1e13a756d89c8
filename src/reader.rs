//! Text spans and filled paths read from PDF content streams.
//!
//! Everything returned here is in a top-left-origin page space: `x` runs
//! right from the media box's left edge and `y` runs down from its top edge.

use std::collections::HashMap;
use std::path::Path;

use pdf::content::{Color, Matrix, Op, Point as PdfPoint, Rect, TextDrawAdjusted};
use pdf::error::PdfError;
use pdf::file::{CachedFile, FileOptions};
use pdf::font::{Font, ToUnicodeMap, Widths};
use pdf::object::{Page, Resolve, Resources};
use pdf::primitive::PdfString;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::geometry::{BBox, Point};
use crate::shading::Rgb;

/// Glyph ascent and descent as a fraction of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Baselines closer than this belong to the same line.
const BASELINE_TOLERANCE: f32 = 2.0;

/// Chunks separated by less than this fraction of the font size form one span.
const SPAN_JOIN_GAP: f32 = 0.25;

/// A run of text with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size: bbox.height(),
        }
    }
}

/// Spans sharing one baseline, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub bbox: BBox,
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    pub fn new(spans: Vec<TextSpan>) -> Self {
        let bbox = spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(BBox::new(0.0, 0.0, 0.0, 0.0));
        Self { bbox, spans }
    }

    /// Span texts joined by single spaces.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Bounding box and paint of one filled subpath.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledPath {
    pub bbox: BBox,
    /// `None` for pattern, separation and other non-device colour spaces.
    pub color: Option<Rgb>,
    pub alpha: f32,
}

/// Everything the calendar heuristics need from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<TextLine>,
    pub fills: Vec<FilledPath>,
}

impl PageContent {
    /// Plain page text, one line per text line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|line| line.spans.iter())
    }
}

/// Open a PDF file using the `pdf` crate with the default cached options.
fn open_pdf(path: &Path) -> Result<CachedFile<Vec<u8>>, PdfError> {
    FileOptions::cached().open(path)
}

/// Read every page of a document, in order.
pub fn read_document(path: impl AsRef<Path>) -> Result<Vec<PageContent>, ExtractError> {
    let path = path.as_ref();
    let pdf = open_pdf(path)?;
    let resolver = pdf.resolver();
    let mut pages = Vec::with_capacity(pdf.num_pages() as usize);
    for index in 0..pdf.num_pages() {
        let page = pdf.get_page(index)?;
        let content = read_page(&page, index as usize, &resolver)?;
        debug!(
            page = index + 1,
            lines = content.lines.len(),
            fills = content.fills.len(),
            "read page"
        );
        pages.push(content);
    }
    Ok(pages)
}

fn read_page(page: &Page, index: usize, resolver: &impl Resolve) -> Result<PageContent, PdfError> {
    let media_box = page.media_box()?;
    let frame = PageFrame {
        left: media_box.left,
        top: media_box.top,
    };
    let width = media_box.right - media_box.left;
    let height = media_box.top - media_box.bottom;
    let resources: Option<&Resources> = page.resources().ok().map(|r| &**r);
    let fonts = match resources {
        Some(res) => collect_fonts(res, resolver),
        None => HashMap::new(),
    };
    let operations = match &page.contents {
        Some(content) => content.operations(resolver)?,
        None => Vec::new(),
    };

    let fill_alphas = resources.map(ext_gstate_alphas).unwrap_or_default();

    let mut interpreter = Interpreter::new(frame, &fonts, &fill_alphas);
    for op in &operations {
        interpreter.apply(op);
    }
    let (chunks, fills) = interpreter.finish();

    Ok(PageContent {
        index,
        width,
        height,
        lines: group_lines(chunks),
        fills,
    })
}

/// Maps PDF user space (bottom-left origin) into top-left page space.
#[derive(Debug, Clone, Copy)]
struct PageFrame {
    left: f32,
    top: f32,
}

impl PageFrame {
    fn to_page(&self, (x, y): (f32, f32)) -> Point {
        Point::new(x - self.left, self.top - y)
    }
}

/// Maintain the current text state while iterating over PDF text operators.
#[derive(Debug)]
struct TextState {
    current_font: Option<String>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    text_rise: f32,
    text_matrix: Matrix,
    text_line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            current_font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 100.0,
            leading: 0.0,
            text_rise: 0.0,
            text_matrix: Matrix::default(),
            text_line_matrix: Matrix::default(),
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.text_matrix = Matrix::default();
        self.text_line_matrix = Matrix::default();
    }

    fn set_text_matrix(&mut self, matrix: Matrix) {
        self.text_matrix = matrix;
        self.text_line_matrix = matrix;
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.text_line_matrix = multiply_matrix(&translation(tx, ty), &self.text_line_matrix);
        self.text_matrix = self.text_line_matrix;
    }

    fn newline(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn translate_text(&mut self, tx: f32) {
        self.text_matrix = multiply_matrix(&translation(tx, 0.0), &self.text_matrix);
    }
}

/// Graphics state entries that influence fills and text placement.
#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    fill: Option<Rgb>,
    fill_alpha: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::default(),
            fill: Some(Rgb::BLACK),
            fill_alpha: 1.0,
        }
    }
}

/// Extract the available font information for a page resource.
struct ResolvedFont {
    widths: Option<Widths>,
    to_unicode: Option<ToUnicodeMap>,
    is_cid: bool,
}

impl ResolvedFont {
    fn from_font(font: &Font, resolver: &impl Resolve) -> Result<Self, PdfError> {
        let widths = font.widths(resolver)?;
        let to_unicode = match font.to_unicode(resolver) {
            Some(map) => Some(map?),
            None => None,
        };
        Ok(Self {
            widths,
            to_unicode,
            is_cid: font.is_cid(),
        })
    }

    fn decode(&self, text: &PdfString) -> DecodedText {
        let bytes = text.as_bytes();
        if self.is_cid {
            decode_cid(bytes, self.to_unicode.as_ref())
        } else {
            decode_simple(bytes, self.to_unicode.as_ref())
        }
    }

    fn glyph_width(&self, code: u16) -> f32 {
        self.widths
            .as_ref()
            .map(|w| w.get(code as usize))
            .unwrap_or(1000.0)
    }
}

/// Text decoded from a PDF string along with the glyph identifiers used for width calculation.
struct DecodedText {
    text: String,
    codes: Vec<u16>,
}

fn decode_simple(bytes: &[u8], map: Option<&ToUnicodeMap>) -> DecodedText {
    let mut text = String::new();
    let mut codes = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        let code = byte as u16;
        codes.push(code);
        if let Some(value) = map.and_then(|m| m.get(code)) {
            text.push_str(value);
            continue;
        }
        text.push(char::from_u32(code as u32).unwrap_or('\u{FFFD}'));
    }
    DecodedText { text, codes }
}

fn decode_cid(bytes: &[u8], map: Option<&ToUnicodeMap>) -> DecodedText {
    let mut text = String::new();
    let mut codes = Vec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        let code = u16::from_be_bytes([chunk[0], chunk[1]]);
        codes.push(code);
        if let Some(value) = map.and_then(|m| m.get(code)) {
            text.push_str(value);
            continue;
        }
        text.push(char::from_u32(code as u32).unwrap_or('\u{FFFD}'));
    }
    DecodedText { text, codes }
}

fn fallback_decode(text: &PdfString) -> DecodedText {
    DecodedText {
        text: text.to_string_lossy(),
        codes: text.as_bytes().iter().map(|&b| b as u16).collect(),
    }
}

fn collect_fonts(resources: &Resources, resolver: &impl Resolve) -> HashMap<String, ResolvedFont> {
    let mut fonts = HashMap::new();
    for (name, font_ref) in resources.fonts.iter() {
        let resolved = font_ref
            .load(resolver)
            .and_then(|font| ResolvedFont::from_font(&font, resolver));
        match resolved {
            Ok(resolved) => {
                fonts.insert(name.as_str().to_owned(), resolved);
            }
            Err(err) => warn!(font = name.as_str(), %err, "font could not be resolved; using raw bytes"),
        }
    }
    fonts
}

/// Fill opacity (`ca`) of every named ExtGState that sets one.
fn ext_gstate_alphas(resources: &Resources) -> HashMap<String, f32> {
    resources
        .graphics_states
        .iter()
        .filter_map(|(name, params)| Some((name.as_str().to_owned(), params.fill_alpha?)))
        .collect()
}

fn translation(tx: f32, ty: f32) -> Matrix {
    Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: tx,
        f: ty,
    }
}

/// Row-vector product `left × right`: apply `left` first, then `right`.
fn multiply_matrix(left: &Matrix, right: &Matrix) -> Matrix {
    Matrix {
        a: left.a * right.a + left.b * right.c,
        b: left.a * right.b + left.b * right.d,
        c: left.c * right.a + left.d * right.c,
        d: left.c * right.b + left.d * right.d,
        e: left.e * right.a + left.f * right.c + right.e,
        f: left.e * right.b + left.f * right.d + right.f,
    }
}

fn apply_matrix(matrix: &Matrix, point: (f32, f32)) -> (f32, f32) {
    (
        matrix.a * point.0 + matrix.c * point.1 + matrix.e,
        matrix.b * point.0 + matrix.d * point.1 + matrix.f,
    )
}

fn rect_corners(rect: &Rect) -> [(f32, f32); 4] {
    let Rect {
        x,
        y,
        width,
        height,
    } = *rect;
    [(x, y), (x + width, y), (x + width, y + height), (x, y + height)]
}

fn fill_color(color: &Color) -> Option<Rgb> {
    match color {
        Color::Gray(level) => Some(Rgb::gray(*level)),
        Color::Rgb(rgb) => Some(Rgb::new(rgb.red, rgb.green, rgb.blue)),
        Color::Cmyk(cmyk) => Some(Rgb::from_cmyk(cmyk.cyan, cmyk.magenta, cmyk.yellow, cmyk.key)),
        _ => None,
    }
}

/// A decoded text-show operation before line grouping.
#[derive(Debug, Clone)]
struct TextChunk {
    text: String,
    bbox: BBox,
    baseline: f32,
    font_size: f32,
}

/// Walks one content stream, tracking just enough state to place text and fills.
struct Interpreter<'a> {
    frame: PageFrame,
    fonts: &'a HashMap<String, ResolvedFont>,
    fill_alphas: &'a HashMap<String, f32>,
    text: TextState,
    graphics: GraphicsState,
    stack: Vec<GraphicsState>,
    subpaths: Vec<Vec<(f32, f32)>>,
    chunks: Vec<TextChunk>,
    fills: Vec<FilledPath>,
}

impl<'a> Interpreter<'a> {
    fn new(
        frame: PageFrame,
        fonts: &'a HashMap<String, ResolvedFont>,
        fill_alphas: &'a HashMap<String, f32>,
    ) -> Self {
        Self {
            frame,
            fonts,
            fill_alphas,
            text: TextState::default(),
            graphics: GraphicsState::default(),
            stack: Vec::new(),
            subpaths: Vec::new(),
            chunks: Vec::new(),
            fills: Vec::new(),
        }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Save => self.stack.push(self.graphics),
            Op::Restore => self.graphics = self.stack.pop().unwrap_or_default(),
            Op::Transform { matrix } => {
                self.graphics.ctm = multiply_matrix(matrix, &self.graphics.ctm)
            }
            Op::FillColor { color } => self.graphics.fill = fill_color(color),
            Op::GraphicsState { name } => {
                if let Some(&alpha) = self.fill_alphas.get(name.as_str()) {
                    self.graphics.fill_alpha = alpha;
                }
            }
            Op::MoveTo { p } => self.subpaths.push(vec![(p.x, p.y)]),
            Op::LineTo { p } => self.extend_path(p),
            Op::CurveTo { c1, c2, p } => {
                self.extend_path(c1);
                self.extend_path(c2);
                self.extend_path(p);
            }
            Op::Rect { rect } => self.subpaths.push(rect_corners(rect).to_vec()),
            Op::Fill { .. } | Op::FillAndStroke { .. } => self.paint_fill(),
            Op::Stroke | Op::EndPath => self.subpaths.clear(),
            Op::BeginText => self.text.begin_text(),
            Op::SetTextMatrix { matrix } => self.text.set_text_matrix(*matrix),
            Op::MoveTextPosition { translation } => {
                self.text.translate_line(translation.x, translation.y)
            }
            Op::TextNewline => self.text.newline(),
            Op::TextFont { name, size } => {
                self.text.current_font = Some(name.as_str().to_owned());
                self.text.font_size = *size;
            }
            Op::CharSpacing { char_space } => self.text.char_spacing = *char_space,
            Op::WordSpacing { word_space } => self.text.word_spacing = *word_space,
            Op::TextScaling { horiz_scale } => self.text.horizontal_scale = *horiz_scale,
            Op::Leading { leading } => self.text.leading = *leading,
            Op::TextRise { rise } => self.text.text_rise = *rise,
            Op::TextDraw { text } => self.show_text(text),
            Op::TextDrawAdjusted { array } => {
                for item in array {
                    match item {
                        TextDrawAdjusted::Text(text) => self.show_text(text),
                        TextDrawAdjusted::Spacing(amount) => {
                            let adjustment = -amount / 1000.0
                                * self.text.font_size
                                * (self.text.horizontal_scale / 100.0);
                            if adjustment != 0.0 {
                                self.text.translate_text(adjustment);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn extend_path(&mut self, p: &PdfPoint) {
        match self.subpaths.last_mut() {
            Some(current) => current.push((p.x, p.y)),
            None => self.subpaths.push(vec![(p.x, p.y)]),
        }
    }

    /// One `FilledPath` per subpath, so a single `re re re f` sequence still
    /// yields one box per cell.
    fn paint_fill(&mut self) {
        let frame = self.frame;
        let graphics = self.graphics;
        for subpath in self.subpaths.drain(..) {
            let points: Vec<Point> = subpath
                .iter()
                .map(|&p| frame.to_page(apply_matrix(&graphics.ctm, p)))
                .collect();
            if let Some(bbox) = BBox::from_points(&points) {
                self.fills.push(FilledPath {
                    bbox,
                    color: graphics.fill,
                    alpha: graphics.fill_alpha,
                });
            }
        }
    }

    fn show_text(&mut self, text: &PdfString) {
        let fonts = self.fonts;
        let font = self
            .text
            .current_font
            .as_ref()
            .and_then(|name| fonts.get(name));
        let decoded = match font {
            Some(resolved) => resolved.decode(text),
            None => fallback_decode(text),
        };
        if decoded.text.is_empty() {
            return;
        }
        let advance = self.text_displacement(font, &decoded.codes);
        let size = self.text.font_size;
        let rise = self.text.text_rise;
        let render = multiply_matrix(&self.text.text_matrix, &self.graphics.ctm);
        let corners: Vec<Point> = [
            (0.0, rise - DESCENT * size),
            (advance, rise - DESCENT * size),
            (0.0, rise + ASCENT * size),
            (advance, rise + ASCENT * size),
        ]
        .iter()
        .map(|&p| self.frame.to_page(apply_matrix(&render, p)))
        .collect();
        let origin = self.frame.to_page(apply_matrix(&render, (0.0, rise)));
        if let Some(bbox) = BBox::from_points(&corners) {
            self.chunks.push(TextChunk {
                text: decoded.text,
                font_size: bbox.height(),
                bbox,
                baseline: origin.y,
            });
        }
        if advance != 0.0 {
            self.text.translate_text(advance);
        }
    }

    fn text_displacement(&self, font: Option<&ResolvedFont>, codes: &[u16]) -> f32 {
        let state = &self.text;
        let mut total = 0.0;
        for &code in codes {
            let glyph_width = font.map(|f| f.glyph_width(code)).unwrap_or(1000.0);
            let mut advance = (glyph_width / 1000.0) * state.font_size;
            advance += state.char_spacing;
            if code == 32 {
                advance += state.word_spacing;
            }
            total += advance;
        }
        total * (state.horizontal_scale / 100.0)
    }

    fn finish(self) -> (Vec<TextChunk>, Vec<FilledPath>) {
        (self.chunks, self.fills)
    }
}

/// Cluster chunks by baseline, then merge horizontally adjacent chunks into spans.
fn group_lines(mut chunks: Vec<TextChunk>) -> Vec<TextLine> {
    chunks.sort_by(|a, b| {
        a.baseline
            .total_cmp(&b.baseline)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut rows: Vec<(f32, Vec<TextChunk>)> = Vec::new();
    for chunk in chunks {
        match rows.last_mut() {
            Some((baseline, row)) if (chunk.baseline - *baseline).abs() <= BASELINE_TOLERANCE => {
                row.push(chunk)
            }
            _ => rows.push((chunk.baseline, vec![chunk])),
        }
    }

    rows.into_iter()
        .filter_map(|(_, mut row)| {
            row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let spans = merge_spans(row);
            if spans.is_empty() {
                None
            } else {
                Some(TextLine::new(spans))
            }
        })
        .collect()
}

fn merge_spans(row: Vec<TextChunk>) -> Vec<TextSpan> {
    let mut spans: Vec<TextSpan> = Vec::new();
    for chunk in row {
        if let Some(last) = spans.last_mut() {
            let gap = chunk.bbox.x0 - last.bbox.x1;
            if gap <= SPAN_JOIN_GAP * chunk.font_size.max(last.font_size) {
                last.text.push_str(&chunk.text);
                last.bbox = last.bbox.union(&chunk.bbox);
                continue;
            }
        }
        spans.push(TextSpan {
            text: chunk.text,
            bbox: chunk.bbox,
            font_size: chunk.font_size,
        });
    }
    spans.retain(|s| !s.text.trim().is_empty());
    for span in &mut spans {
        span.text = span.text.trim().to_string();
    }
    spans
}

#[cfg(test)]
mod tests {
    use pdf::content::{Cmyk, Rgb as PdfRgb, Winding};
    use pdf::primitive::Name;

    use super::*;

    fn chunk(text: &str, x0: f32, x1: f32, baseline: f32) -> TextChunk {
        TextChunk {
            text: text.to_string(),
            bbox: BBox::new(x0, baseline - 8.0, x1, baseline + 2.0),
            baseline,
            font_size: 10.0,
        }
    }

    const TOP: f32 = 842.0;

    fn run(ops: &[Op], fill_alphas: &HashMap<String, f32>) -> (Vec<TextChunk>, Vec<FilledPath>) {
        let fonts = HashMap::new();
        let frame = PageFrame { left: 0.0, top: TOP };
        let mut interpreter = Interpreter::new(frame, &fonts, fill_alphas);
        for op in ops {
            interpreter.apply(op);
        }
        interpreter.finish()
    }

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Op {
        Op::Rect {
            rect: Rect {
                x,
                y,
                width,
                height,
            },
        }
    }

    fn fill() -> Op {
        Op::Fill {
            winding: Winding::NonZero,
        }
    }

    fn rgb(red: f32, green: f32, blue: f32) -> Op {
        Op::FillColor {
            color: Color::Rgb(PdfRgb { red, green, blue }),
        }
    }

    #[test]
    fn filled_rect_lands_in_top_left_space_through_the_ctm() {
        let ops = [
            Op::Transform {
                matrix: Matrix {
                    a: 2.0,
                    b: 0.0,
                    c: 0.0,
                    d: 2.0,
                    e: 10.0,
                    f: 20.0,
                },
            },
            rgb(0.8, 0.9, 1.0),
            rect(10.0, 10.0, 20.0, 5.0),
            fill(),
        ];
        let (chunks, fills) = run(&ops, &HashMap::new());
        assert!(chunks.is_empty());
        assert_eq!(
            fills,
            vec![FilledPath {
                bbox: BBox::new(30.0, TOP - 50.0, 70.0, TOP - 40.0),
                color: Some(Rgb::new(0.8, 0.9, 1.0)),
                alpha: 1.0,
            }]
        );
    }

    #[test]
    fn each_subpath_of_one_fill_is_its_own_box() {
        let ops = [
            rect(0.0, 0.0, 10.0, 10.0),
            rect(50.0, 0.0, 10.0, 10.0),
            fill(),
            rect(0.0, 0.0, 5.0, 5.0),
            Op::EndPath,
            fill(),
        ];
        let (_, fills) = run(&ops, &HashMap::new());
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[1].bbox.x0, 50.0);
        assert_eq!(fills[0].color, Some(Rgb::BLACK));
    }

    #[test]
    fn restore_brings_back_the_saved_fill_colour() {
        let ops = [
            rgb(1.0, 0.0, 0.0),
            Op::Save,
            rgb(0.0, 0.0, 1.0),
            rect(0.0, 0.0, 10.0, 10.0),
            fill(),
            Op::Restore,
            rect(0.0, 0.0, 10.0, 10.0),
            fill(),
        ];
        let (_, fills) = run(&ops, &HashMap::new());
        assert_eq!(fills[0].color, Some(Rgb::new(0.0, 0.0, 1.0)));
        assert_eq!(fills[1].color, Some(Rgb::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn ext_gstate_sets_fill_alpha_until_restore() {
        let alphas = HashMap::from([("GS0".to_owned(), 0.0)]);
        let gs = |name: &str| Op::GraphicsState {
            name: Name::from(name),
        };
        let ops = [
            Op::Save,
            gs("GS0"),
            rect(0.0, 0.0, 10.0, 10.0),
            fill(),
            Op::Restore,
            gs("Unknown"),
            rect(0.0, 0.0, 10.0, 10.0),
            fill(),
        ];
        let (_, fills) = run(&ops, &alphas);
        assert_eq!(fills[0].alpha, 0.0);
        assert_eq!(fills[1].alpha, 1.0);
    }

    #[test]
    fn device_colours_convert_and_other_spaces_have_none() {
        assert_eq!(fill_color(&Color::Gray(0.5)), Some(Rgb::gray(0.5)));
        let white = Color::Cmyk(Cmyk {
            cyan: 0.0,
            magenta: 0.0,
            yellow: 0.0,
            key: 0.0,
        });
        assert_eq!(fill_color(&white), Some(Rgb::from_cmyk(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(fill_color(&Color::Other(Vec::new())), None);
    }

    #[test]
    fn shown_text_is_boxed_from_the_text_matrix() {
        let ops = [
            Op::BeginText,
            Op::TextFont {
                name: Name::from("F1"),
                size: 10.0,
            },
            Op::SetTextMatrix {
                matrix: translation(100.0, 700.0),
            },
            Op::TextDraw {
                text: PdfString::from("17"),
            },
            Op::TextDraw {
                text: PdfString::from("5"),
            },
            Op::EndText,
        ];
        let (chunks, fills) = run(&ops, &HashMap::new());
        assert!(fills.is_empty());
        assert_eq!(chunks.len(), 2);
        let first = &chunks[0];
        assert_eq!(first.text, "17");
        assert!((first.baseline - (TOP - 700.0)).abs() < 1e-3);
        assert!((first.bbox.x0 - 100.0).abs() < 1e-3);
        assert!((first.bbox.x1 - 120.0).abs() < 1e-3);
        assert!((first.bbox.y0 - (TOP - 708.0)).abs() < 1e-3);
        assert!((first.bbox.y1 - (TOP - 698.0)).abs() < 1e-3);
        // The second show starts where the first one's advance ended.
        assert!((chunks[1].bbox.x0 - 120.0).abs() < 1e-3);
    }

    #[test]
    fn multiply_applies_left_then_right() {
        let scale = Matrix {
            a: 10.0,
            b: 0.0,
            c: 0.0,
            d: 10.0,
            e: 100.0,
            f: 200.0,
        };
        let moved = multiply_matrix(&translation(2.0, 0.0), &scale);
        assert_eq!(apply_matrix(&moved, (0.0, 0.0)), (120.0, 200.0));
    }

    #[test]
    fn page_frame_flips_y_axis() {
        let frame = PageFrame {
            left: 0.0,
            top: 842.0,
        };
        assert_eq!(frame.to_page((50.0, 800.0)), Point::new(50.0, 42.0));
    }

    #[test]
    fn simple_decode_falls_back_to_latin1() {
        let decoded = decode_simple(b"15", None);
        assert_eq!(decoded.text, "15");
        assert_eq!(decoded.codes, vec![49, 53]);
    }

    #[test]
    fn cid_decode_reads_big_endian_pairs() {
        let decoded = decode_cid(&[0x00, 0x4D, 0x00, 0x54, 0x01], None);
        assert_eq!(decoded.text, "MT");
        assert_eq!(decoded.codes, vec![0x4D, 0x54]);
    }

    #[test]
    fn adjacent_chunks_merge_and_distant_chunks_split() {
        let lines = group_lines(vec![
            chunk("2", 100.0, 105.0, 50.0),
            chunk("M", 20.0, 28.0, 50.5),
            chunk("1", 105.5, 110.0, 50.0),
            chunk("T", 45.0, 51.0, 49.5),
            chunk("Term", 20.0, 40.0, 90.0),
        ]);
        assert_eq!(lines.len(), 2);
        let texts: Vec<_> = lines[0].spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["M", "T", "21"]);
        assert_eq!(lines[0].text(), "M T 21");
        assert_eq!(lines[1].text(), "Term");
    }

    #[test]
    fn whitespace_only_spans_are_dropped() {
        let lines = group_lines(vec![chunk(" ", 10.0, 12.0, 30.0), chunk("7", 60.0, 65.0, 30.0)]);
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[0].spans[0].text, "7");
    }
}
