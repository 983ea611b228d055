// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edges and the active edge list.

use core::cmp::Ordering;
use tessel_common::flatten::Line;
use tessel_common::geometry::Point;
use tessel_common::path::FillType;
use tessel_common::sample;

/// A non-horizontal line of a flattened path, oriented from top to bottom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// The upper end point.
    pub top: Point,
    /// The lower end point.
    pub bottom: Point,
    /// `1` if the line runs upwards, `-1` if it runs downwards.
    pub winding: i8,
    /// The first row whose sample the edge crosses.
    pub first_row: i32,
    /// One past the last row whose sample the edge crosses.
    pub end_row: i32,
}

/// The first row whose sample height is at or below `y`.
fn row_at_or_below(y: f32) -> i32 {
    let row = (y as f64 - 0.5).ceil();
    row.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

impl Edge {
    /// The edge of a line, or `None` if the line crosses no row sample.
    pub fn new(line: &Line) -> Option<Self> {
        let (top, bottom, winding) = match line.p0.y.partial_cmp(&line.p1.y)? {
            Ordering::Less => (line.p0, line.p1, -1),
            Ordering::Greater => (line.p1, line.p0, 1),
            Ordering::Equal => return None,
        };
        let first_row = row_at_or_below(top.y);
        let end_row = row_at_or_below(bottom.y);
        (first_row < end_row).then_some(Self {
            top,
            bottom,
            winding,
            first_row,
            end_row,
        })
    }

    /// `dx / dy`.
    pub fn slope(&self) -> f32 {
        (self.bottom.x - self.top.x) / (self.bottom.y - self.top.y)
    }

    /// The ordering of the edge table: by top, then x at the top, then slope.
    pub fn table_order(&self, other: &Self) -> Ordering {
        self.top
            .y
            .total_cmp(&other.top.y)
            .then(self.top.x.total_cmp(&other.top.x))
            .then(self.slope().total_cmp(&other.slope()))
    }
}

#[derive(Clone, Copy, Debug)]
struct Crossing {
    x: i32,
    winding: i8,
}

/// A sorted edge table with the list of edges active in the current row.
///
/// Rows must be visited in increasing order after [`EdgeList::start`].
#[derive(Debug, Default)]
pub struct EdgeList {
    edges: Vec<Edge>,
    next: usize,
    active: Vec<usize>,
    crossings: Vec<Crossing>,
}

impl EdgeList {
    /// Replace the edges with those of `lines`.
    pub fn reset(&mut self, lines: impl IntoIterator<Item = Line>) {
        self.edges.clear();
        self.edges.extend(lines.into_iter().filter_map(|l| Edge::new(&l)));
        self.edges.sort_by(Edge::table_order);
        self.next = 0;
        self.active.clear();
    }

    /// The edges in table order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Rewind to visit rows starting at `y`.
    pub fn start(&mut self, y: i32) {
        self.next = 0;
        self.active.clear();
        self.activate(y);
    }

    fn activate(&mut self, y: i32) {
        while let Some(edge) = self.edges.get(self.next) {
            if edge.first_row > y {
                break;
            }
            if edge.end_row > y {
                self.active.push(self.next);
            }
            self.next += 1;
        }
        let edges = &self.edges;
        self.active.retain(|&i| edges[i].end_row > y);
    }

    /// Report the maximal runs of pixels in row `y` within `left..right` whose winding number
    /// is inside according to `fill`.
    pub fn row_spans(
        &mut self,
        y: i32,
        left: i32,
        right: i32,
        fill: FillType,
        mut f: impl FnMut(i32, i32),
    ) {
        self.activate(y);
        self.crossings.clear();
        for &i in &self.active {
            let edge = &self.edges[i];
            self.crossings.push(Crossing {
                x: sample::first_pixel_right_of(edge.top, edge.bottom, y),
                winding: edge.winding,
            });
        }
        // Stable, so edges meeting at a pixel keep their table order.
        self.crossings.sort_by_key(|c| c.x);

        let mut winding = 0_i32;
        let mut run_start = fill.contains(0).then_some(left);
        for (i, crossing) in self.crossings.iter().enumerate() {
            winding += i32::from(crossing.winding);
            // Only the winding after the last crossing at a pixel matters.
            if self.crossings.get(i + 1).is_some_and(|next| next.x == crossing.x) {
                continue;
            }
            let x = crossing.x.clamp(left, right);
            let inside = fill.contains(winding);
            match run_start {
                Some(start) if !inside => {
                    if x > start {
                        f(start, x);
                    }
                    run_start = None;
                }
                None if inside => run_start = Some(x),
                _ => {}
            }
        }
        if let Some(start) = run_start {
            if right > start {
                f(start, right);
            }
        }
    }
}
