//! Coverage rasterizer — decides which grid cells a shape covers.
//!
//! The encoder never computes coverage itself; it hands geometry to a
//! `Rasterizer` and paints whatever cells come back. `ScanlineRasterizer` is
//! the built-in implementation: binary coverage, no anti-aliasing, sampled
//! at grid resolution.

use std::collections::BTreeSet;

use crate::types::{Cell, GridSpace, Point, StrokeStyle};

/// The coverage contract between the encoder and the geometry pipeline.
/// Coordinates are source-image pixels; returned cells must lie inside
/// `space`.
pub trait Rasterizer {
    fn polygon_coverage(&mut self, rings: &[Vec<Point>], space: GridSpace) -> Vec<Cell>;

    fn line_coverage(
        &mut self,
        paths: &[Vec<Point>],
        stroke: &StrokeStyle,
        space: GridSpace,
    ) -> Vec<Cell>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

#[derive(Debug, Clone, Default)]
pub struct ScanlineRasterizer {
    pub fill_rule: FillRule,
    crossings: Vec<(f64, i32)>,
}

impl ScanlineRasterizer {
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            fill_rule,
            crossings: Vec::new(),
        }
    }

    /// Collect where each ring edge crosses the horizontal line `y`,
    /// with +1/-1 winding for downward/upward edges.
    fn collect_crossings(&mut self, rings: &[Vec<Point>], y: f64) {
        self.crossings.clear();
        for ring in rings {
            let n = ring.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if !(finite(a) && finite(b)) || a.y == b.y {
                    continue;
                }
                let (top, bottom, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
                // Half-open in y so a vertex shared by two edges counts once.
                if y < top.y || y >= bottom.y {
                    continue;
                }
                let x = top.x + (y - top.y) * (bottom.x - top.x) / (bottom.y - top.y);
                self.crossings.push((x, winding));
            }
        }
        self.crossings.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    /// Spans `[x_start, x_end)` inside the polygon on the current scanline.
    fn spans(&self) -> Vec<(f64, f64)> {
        let mut spans = Vec::new();
        match self.fill_rule {
            FillRule::EvenOdd => {
                for pair in self.crossings.chunks_exact(2) {
                    spans.push((pair[0].0, pair[1].0));
                }
            }
            FillRule::NonZero => {
                let mut winding = 0;
                let mut start = 0.0;
                for &(x, w) in &self.crossings {
                    let was_inside = winding != 0;
                    winding += w;
                    match (was_inside, winding != 0) {
                        (false, true) => start = x,
                        (true, false) => spans.push((start, x)),
                        _ => {}
                    }
                }
            }
        }
        spans
    }
}

impl Rasterizer for ScanlineRasterizer {
    fn polygon_coverage(&mut self, rings: &[Vec<Point>], space: GridSpace) -> Vec<Cell> {
        let res = space.resolution as f64;
        let mut cells = Vec::new();
        for row in 0..space.rows {
            let y = (row as f64 + 0.5) * res;
            self.collect_crossings(rings, y);
            for (x_start, x_end) in self.spans() {
                // Cells whose centre falls in [x_start, x_end).
                let first = clamp_col((x_start / res - 0.5).ceil(), space.cols);
                let last = clamp_col((x_end / res - 0.5).ceil(), space.cols);
                cells.extend((first..last).map(|col| Cell::new(row, col)));
            }
        }
        cells
    }

    fn line_coverage(
        &mut self,
        paths: &[Vec<Point>],
        stroke: &StrokeStyle,
        space: GridSpace,
    ) -> Vec<Cell> {
        let half_width = if stroke.width.is_finite() {
            stroke.width.max(0.0) / 2.0
        } else {
            0.0
        };
        let mut cells = BTreeSet::new();
        for path in paths {
            match path.as_slice() {
                [] => {}
                [only] => stroke_segment(*only, *only, half_width, space, &mut cells),
                points => {
                    for pair in points.windows(2) {
                        stroke_segment(pair[0], pair[1], half_width, space, &mut cells);
                    }
                }
            }
        }
        cells.into_iter().collect()
    }
}

fn finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

fn clamp_col(value: f64, cols: u32) -> u32 {
    value.clamp(0.0, cols as f64) as u32
}

/// Mark every cell whose square, grown by `half_width` on each side, is
/// touched by the segment `a`–`b`.
///
/// Walks the cells under the segment and tests only their neighbourhood, so
/// the cost follows the segment's length rather than its bounding box.
fn stroke_segment(a: Point, b: Point, half_width: f64, space: GridSpace, cells: &mut BTreeSet<Cell>) {
    if !(finite(a) && finite(b)) || space.cols == 0 || space.rows == 0 {
        return;
    }
    let res = space.resolution as f64;
    // Nothing beyond this margin can reach a cell.
    let reach = half_width + res;
    let Some((t0, t1)) = clip_segment(
        a,
        b,
        Point::new(-reach, -reach),
        Point::new(space.cols as f64 * res + reach, space.rows as f64 * res + reach),
    ) else {
        return;
    };
    let start = lerp(a, b, t0);
    let end = lerp(a, b, t1);

    // A touched cell is within this many cells of one the walk visits;
    // the extra one covers segments running along a cell border.
    let spread = (half_width / res).floor() as i64 + 1;
    let (cols, rows) = (space.cols as i64, space.rows as i64);
    walk_cells(start, end, res, |col, row| {
        for r in (row - spread).max(0)..=(row + spread).min(rows - 1) {
            for c in (col - spread).max(0)..=(col + spread).min(cols - 1) {
                let (r, c) = (r as u32, c as u32);
                let cell = Cell::new(r, c);
                if cells.contains(&cell) {
                    continue;
                }
                let min = Point::new(c as f64 * res - half_width, r as f64 * res - half_width);
                let max = Point::new(
                    (c + 1) as f64 * res + half_width,
                    (r + 1) as f64 * res + half_width,
                );
                if segment_hits_box(a, b, min, max) {
                    cells.insert(cell);
                }
            }
        }
    });
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Visit, in order, the unclipped `(col, row)` cells the segment passes
/// through (Amanatides–Woo traversal).
fn walk_cells(a: Point, b: Point, res: f64, mut visit: impl FnMut(i64, i64)) {
    let mut col = (a.x / res).floor() as i64;
    let mut row = (a.y / res).floor() as i64;
    let end_col = (b.x / res).floor() as i64;
    let end_row = (b.y / res).floor() as i64;
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let step_col = if dx > 0.0 { 1 } else { -1 };
    let step_row = if dy > 0.0 { 1 } else { -1 };

    // Segment parameter of the next column/row border, and the spacing
    // between borders.
    let next_border = |cell: i64, step: i64, origin: f64, delta: f64| {
        if delta == 0.0 {
            return f64::INFINITY;
        }
        let border = (if step > 0 { cell + 1 } else { cell }) as f64 * res;
        (border - origin) / delta
    };
    let mut t_col = next_border(col, step_col, a.x, dx);
    let mut t_row = next_border(row, step_row, a.y, dy);
    let dt_col = if dx == 0.0 { f64::INFINITY } else { res / dx.abs() };
    let dt_row = if dy == 0.0 { f64::INFINITY } else { res / dy.abs() };

    visit(col, row);
    let steps = (end_col - col).abs() + (end_row - row).abs();
    for _ in 0..steps {
        if t_col < t_row {
            col += step_col;
            t_col += dt_col;
        } else {
            row += step_row;
            t_row += dt_row;
        }
        visit(col, row);
    }
}

/// Liang–Barsky clip of segment `a`–`b` against the closed box `min`..`max`.
/// Returns the parameter range of the segment inside the box.
fn clip_segment(a: Point, b: Point, min: Point, max: Point) -> Option<(f64, f64)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, a.x - min.x),
        (dx, max.x - a.x),
        (-dy, a.y - min.y),
        (dy, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

fn segment_hits_box(a: Point, b: Point, min: Point, max: Point) -> bool {
    clip_segment(a, b, min, max).is_some()
}
