//! Outlines for the glyphs the compiler adds.

use crate::font::{Contour, ContourPoint, PointKind};

/// Handle length, relative to the radius, of a cubic quarter circle.
pub const CIRCULAR_SUPERNESS: f64 = 0.551784777779014;

// ── Pen ──────────────────────────────────────────────────────────────

/// Minimal segment pen producing one closed contour.
#[derive(Debug, Default)]
pub struct Pen {
    points: Vec<ContourPoint>,
}

impl Pen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, (x, y): (f64, f64)) -> &mut Self {
        self.points.push(ContourPoint {
            x,
            y,
            kind: PointKind::Move,
        });
        self
    }

    pub fn line_to(&mut self, (x, y): (f64, f64)) -> &mut Self {
        self.points.push(ContourPoint {
            x,
            y,
            kind: PointKind::Line,
        });
        self
    }

    pub fn curve_to(&mut self, c1: (f64, f64), c2: (f64, f64), to: (f64, f64)) -> &mut Self {
        for (x, y) in [c1, c2] {
            self.points.push(ContourPoint {
                x,
                y,
                kind: PointKind::OffCurve,
            });
        }
        self.points.push(ContourPoint {
            x: to.0,
            y: to.1,
            kind: PointKind::Curve,
        });
        self
    }

    pub fn close(&mut self) -> Contour {
        Contour {
            points: std::mem::take(&mut self.points),
        }
    }
}

// ── Shapes ───────────────────────────────────────────────────────────

/// Which end of the slug a cap closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapSide {
    Left,
    Right,
}

/// A semicircular cap of diameter `height`, inset by `margin` on its outer
/// side. The left cap bulges left from its right edge at `height / 2`; the
/// right cap bulges right from x = 0.
pub fn semicircle(height: i64, side: CapSide, margin: i64) -> Contour {
    let radius = height as f64 / 2.0;
    let k = radius * CIRCULAR_SUPERNESS;
    let margin = margin as f64;
    let origin_x = match side {
        CapSide::Left => radius,
        CapSide::Right => 0.0,
    };
    let w = (origin_x - radius + margin, radius);
    let n = (origin_x, 2.0 * radius);
    let e = (origin_x + radius - margin, radius);
    let s = (origin_x, 0.0);

    let mut pen = Pen::new();
    pen.move_to(s);
    match side {
        CapSide::Left => {
            pen.curve_to((s.0 - k, s.1), (w.0, w.1 - k), w);
            pen.curve_to((w.0, w.1 + k), (n.0 - k, n.1), n);
        }
        CapSide::Right => {
            pen.line_to(n);
            pen.curve_to((n.0 + k, n.1), (e.0, e.1 + k), e);
            pen.curve_to((e.0, e.1 - k), (s.0 + k, s.1), s);
        }
    }
    pen.close()
}

/// A `width` by `height` rectangle standing on the baseline.
pub fn rectangle(width: i64, height: i64) -> Contour {
    let (w, h) = (width as f64, height as f64);
    Pen::new()
        .move_to((0.0, 0.0))
        .line_to((w, 0.0))
        .line_to((w, h))
        .line_to((0.0, h))
        .close()
}

/// Advance widths of the left and right caps; together they span `height`.
pub fn cap_widths(height: i64) -> (i64, i64) {
    let left = height / 2;
    (left, height - left)
}
