use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::BBox;
use crate::reader::FilledPath;

/// Every qualifying fill is grown by this much so its box covers the whole
/// visible cell, including digits drawn slightly outside the fill.
pub const BOX_INFLATION: f32 = 8.0;

/// Fill colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn gray(level: f32) -> Self {
        Self::new(level, level, level)
    }

    pub fn from_cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self::new((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
    }

    /// Round every channel to three decimals so near-identical fills compare equal.
    pub fn normalized(&self) -> Self {
        fn round3(v: f32) -> f32 {
            (v * 1000.0).round() / 1000.0
        }
        Self::new(round3(self.r), round3(self.g), round3(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({:.3}, {:.3}, {:.3})", self.r, self.g, self.b)
    }
}

/// A non-white fill that may mark a calendar cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadedBox {
    /// Index in page order; stable for diagnostics within one page.
    pub id: usize,
    pub rect: BBox,
    pub color: Option<Rgb>,
}

impl ShadedBox {
    /// Only coloured fills count as holiday shading. Black fills are borders
    /// and grid lines; fills with no RGB equivalent carry no signal.
    pub fn is_highlight(&self) -> bool {
        match self.color {
            Some(color) => color != Rgb::BLACK && color != Rgb::WHITE,
            None => false,
        }
    }

    pub fn color_label(&self) -> String {
        match self.color {
            Some(color) => color.to_string(),
            None => "Unknown".to_string(),
        }
    }
}

/// Keep every fill that has area, is not fully transparent and is not white.
pub fn detect_shaded_boxes(fills: &[FilledPath]) -> Vec<ShadedBox> {
    let mut boxes = Vec::new();
    for fill in fills {
        if fill.bbox.is_empty() || fill.alpha <= 0.0 {
            continue;
        }
        let color = fill.color.map(|c| c.normalized());
        if color == Some(Rgb::WHITE) {
            continue;
        }
        boxes.push(ShadedBox {
            id: boxes.len(),
            rect: fill.bbox.inflate(BOX_INFLATION),
            color,
        });
    }
    boxes
}

/// Per-colour box count and size range, used for page diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSummary {
    pub count: usize,
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

pub fn summarize_colors(boxes: &[ShadedBox]) -> BTreeMap<String, ColorSummary> {
    let mut summary: BTreeMap<String, ColorSummary> = BTreeMap::new();
    for b in boxes.iter().filter(|b| b.is_highlight()) {
        let (w, h) = (b.rect.width(), b.rect.height());
        summary
            .entry(b.color_label())
            .and_modify(|s| {
                s.count += 1;
                s.min_width = s.min_width.min(w);
                s.max_width = s.max_width.max(w);
                s.min_height = s.min_height.min(h);
                s.max_height = s.max_height.max(h);
            })
            .or_insert(ColorSummary {
                count: 1,
                min_width: w,
                max_width: w,
                min_height: h,
                max_height: h,
            });
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(bbox: BBox, color: Option<Rgb>, alpha: f32) -> FilledPath {
        FilledPath { bbox, color, alpha }
    }

    #[test]
    fn skips_white_transparent_and_empty_fills() {
        let fills = vec![
            fill(BBox::new(0.0, 0.0, 10.0, 10.0), Some(Rgb::WHITE), 1.0),
            fill(BBox::new(0.0, 0.0, 10.0, 10.0), Some(Rgb::new(0.8, 0.9, 1.0)), 0.0),
            fill(BBox::new(5.0, 5.0, 5.0, 20.0), Some(Rgb::new(0.8, 0.9, 1.0)), 1.0),
            fill(BBox::new(20.0, 20.0, 40.0, 35.0), Some(Rgb::new(0.8, 0.9, 1.0)), 1.0),
        ];
        let boxes = detect_shaded_boxes(&fills);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].id, 0);
        assert_eq!(boxes[0].rect, BBox::new(12.0, 12.0, 48.0, 43.0));
    }

    #[test]
    fn nearly_white_rounds_to_white() {
        let fills = vec![fill(
            BBox::new(0.0, 0.0, 10.0, 10.0),
            Some(Rgb::new(0.9999, 1.0, 0.99995)),
            1.0,
        )];
        assert!(detect_shaded_boxes(&fills).is_empty());
    }

    #[test]
    fn black_and_unknown_fills_are_kept_but_not_highlights() {
        let fills = vec![
            fill(BBox::new(0.0, 0.0, 10.0, 10.0), Some(Rgb::BLACK), 1.0),
            fill(BBox::new(0.0, 0.0, 10.0, 10.0), None, 1.0),
            fill(BBox::new(0.0, 0.0, 10.0, 10.0), Some(Rgb::new(1.0, 0.8, 0.6)), 1.0),
        ];
        let boxes = detect_shaded_boxes(&fills);
        assert_eq!(boxes.len(), 3);
        let highlights: Vec<_> = boxes.iter().map(|b| b.is_highlight()).collect();
        assert_eq!(highlights, vec![false, false, true]);
    }

    #[test]
    fn color_summary_groups_by_normalized_color() {
        let fills = vec![
            fill(BBox::new(0.0, 0.0, 10.0, 10.0), Some(Rgb::new(1.0, 0.8, 0.6)), 1.0),
            fill(BBox::new(0.0, 0.0, 20.0, 14.0), Some(Rgb::new(1.0, 0.8, 0.6)), 1.0),
        ];
        let summary = summarize_colors(&detect_shaded_boxes(&fills));
        let s = &summary["RGB(1.000, 0.800, 0.600)"];
        assert_eq!(s.count, 2);
        assert_eq!(s.min_width, 26.0);
        assert_eq!(s.max_width, 36.0);
    }
}
