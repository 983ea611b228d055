// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangulation of the inner fan of a path.
//!
//! The input is a set of closed polygons. The triangulator
//!
//! 1. merges coincident vertices and splits edges at vertices lying on them, so the output uses
//!    exactly the input vertices and keeps collinear ones,
//! 2. in [`TriangulationMode::Breadcrumbs`], also splits crossing edges at their rounded
//!    intersection, recording the sliver between each original edge and its split chain as
//!    breadcrumb triangles,
//! 3. merges coincident edges by summing their windings and drops edges that cancel,
//! 4. sweeps the vertices in `(y, x)` order, tracking the winding number of every region
//!    between active edges and building y-monotone polygons for the regions inside the fill,
//! 5. triangulates every monotone polygon with the usual stack walk.
//!
//! Triangles are oriented by the sign of the winding number of their region, so that summing
//! their signed coverage (clockwise counts as one) reproduces the fill. Breadcrumbs are meant to
//! be added to the stencil buffer alongside the curves of the path.

use crate::error::TriangulationError;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use tessel_common::geometry::Point;
use tessel_common::path::FillType;

/// Every pass finds at least one split while any is left, but crossings split at rounded points
/// can create new crossings: give up after this many passes more than there are input edges.
const MAX_RESOLVE_ROUNDS: usize = 8;

/// What the caller can handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangulationMode {
    /// Fail on crossing edges, and on regions wound more than once for non-zero fills.
    Simple,
    /// Resolve crossings and multiply wound regions with breadcrumb triangles.
    Breadcrumbs,
}

/// The result of a triangulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Triangulation {
    /// The triangles cover the fill exactly once.
    Clean(Vec<[Point; 3]>),
    /// The triangles and the breadcrumbs together reproduce the winding of the fill.
    Breadcrumbs {
        /// One triangle per point inside the fill.
        triangles: Vec<[Point; 3]>,
        /// Signed corrections to the winding number.
        breadcrumbs: Vec<[Point; 3]>,
    },
}

impl Triangulation {
    /// The triangles covering the fill.
    pub fn triangles(&self) -> &[[Point; 3]] {
        match self {
            Self::Clean(triangles) | Self::Breadcrumbs { triangles, .. } => triangles,
        }
    }

    /// The breadcrumbs, empty for a clean triangulation.
    pub fn breadcrumbs(&self) -> &[[Point; 3]] {
        match self {
            Self::Clean(_) => &[],
            Self::Breadcrumbs { breadcrumbs, .. } => breadcrumbs,
        }
    }

    /// Whether the triangles alone reproduce the fill.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }

    /// Take the triangles and breadcrumbs.
    pub fn into_parts(self) -> (Vec<[Point; 3]>, Vec<[Point; 3]>) {
        match self {
            Self::Clean(triangles) => (triangles, Vec::new()),
            Self::Breadcrumbs {
                triangles,
                breadcrumbs,
            } => (triangles, breadcrumbs),
        }
    }
}

/// Which side `v` is on of the line through `t` and `b`: negative right, positive left, when
/// `t` is above `b`.
fn side(t: Point, b: Point, v: Point) -> f64 {
    let (tx, ty) = (f64::from(t.x), f64::from(t.y));
    (f64::from(b.x) - tx) * (f64::from(v.y) - ty) - (f64::from(b.y) - ty) * (f64::from(v.x) - tx)
}

/// The sweep order.
fn sweep_cmp(a: Point, b: Point) -> core::cmp::Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

/// Whether `v` lies on the segment `a`-`b` strictly between its ends.
fn on_open_segment(a: Point, b: Point, v: Point) -> bool {
    if side(a, b, v) != 0. {
        return false;
    }
    let (lo, hi) = if sweep_cmp(a, b).is_lt() {
        (a, b)
    } else {
        (b, a)
    };
    sweep_cmp(lo, v).is_lt() && sweep_cmp(v, hi).is_lt()
}

#[derive(Debug, Default)]
struct VertexPool {
    points: Vec<Point>,
    lookup: HashMap<(u32, u32), usize>,
}

impl VertexPool {
    fn insert(&mut self, p: Point) -> usize {
        // Adding zero folds -0 into 0.
        let key = ((p.x + 0.).to_bits(), (p.y + 0.).to_bits());
        *self.lookup.entry(key).or_insert_with(|| {
            self.points.push(p);
            self.points.len() - 1
        })
    }
}

/// Split edges at vertices lying on them, and in breadcrumb mode at their crossings, until no
/// edge touches another except at its ends.
fn resolve(
    pool: &mut VertexPool,
    mut edges: Vec<[usize; 2]>,
    mode: TriangulationMode,
    breadcrumbs: &mut Vec<[Point; 3]>,
) -> Result<Vec<[usize; 2]>, TriangulationError> {
    for _ in 0..MAX_RESOLVE_ROUNDS + edges.len() {
        let splits = find_splits(pool, &edges, mode)?;
        if splits.iter().all(SmallVec::is_empty) {
            return Ok(edges);
        }
        let mut next = Vec::with_capacity(edges.len() + splits.len());
        for (&[from, to], mut chain) in edges.iter().zip(splits) {
            if chain.is_empty() {
                next.push([from, to]);
                continue;
            }
            let (p0, p1) = (pool.points[from], pool.points[to]);
            let (dx, dy) = (f64::from(p1.x - p0.x), f64::from(p1.y - p0.y));
            let param = |v: usize| {
                let q = pool.points[v];
                f64::from(q.x - p0.x) * dx + f64::from(q.y - p0.y) * dy
            };
            chain.sort_unstable();
            chain.dedup();
            chain.sort_by(|&a, &b| param(a).total_cmp(&param(b)));
            let mut prev = from;
            for (i, &v) in chain.iter().enumerate() {
                next.push([prev, v]);
                prev = v;
                let after = chain.get(i + 1).copied().unwrap_or(to);
                let (a, b) = (pool.points[after], pool.points[v]);
                if side(p0, a, b) != 0. {
                    breadcrumbs.push([p0, a, b]);
                }
            }
            next.push([prev, to]);
        }
        edges = next;
    }
    Err(TriangulationError::Unresolved)
}

/// Compares edges that become neighbours along a sweep line.
///
/// Active edges are kept ordered left to right, so each vertex is located with a binary search
/// and only edges meeting a new neighbour are compared. A pass over edges that touch reports at
/// least the first touch or crossing in sweep order.
struct SplitSweep<'a> {
    points: &'a [Point],
    /// Per edge, its upper and lower vertex.
    ends: Vec<[usize; 2]>,
    splits: Vec<SmallVec<[usize; 2]>>,
    crossings: Vec<(usize, usize)>,
    compared: HashSet<(usize, usize)>,
}

impl SplitSweep<'_> {
    /// Which side of edge `e` the point `p` is on, negative when the edge is left of it.
    fn side_of(&self, e: usize, p: Point) -> f64 {
        let [top, bottom] = self.ends[e];
        side(self.points[top], self.points[bottom], p)
    }

    fn compare(&mut self, i: usize, j: usize) {
        if !self.compared.insert((i.min(j), i.max(j))) {
            return;
        }
        let points = self.points;
        let ([a, b], [c, d]) = (self.ends[i], self.ends[j]);
        let (pa, pb, pc, pd) = (points[a], points[b], points[c], points[d]);
        for v in [c, d] {
            if v != a && v != b && on_open_segment(pa, pb, points[v]) {
                self.splits[i].push(v);
            }
        }
        for v in [a, b] {
            if v != c && v != d && on_open_segment(pc, pd, points[v]) {
                self.splits[j].push(v);
            }
        }
        if a == c || a == d || b == c || b == d {
            return;
        }
        let (d1, d2) = (side(pa, pb, pc), side(pa, pb, pd));
        let (d3, d4) = (side(pc, pd, pa), side(pc, pd, pb));
        let opposite = |x: f64, y: f64| (x < 0. && y > 0.) || (x > 0. && y < 0.);
        if opposite(d1, d2) && opposite(d3, d4) {
            self.crossings.push((i, j));
        }
    }

    fn run(&mut self, starting: &mut [SmallVec<[usize; 4]>], ending: &[usize], order: &[usize]) {
        let mut active: Vec<usize> = Vec::new();
        for &v in order {
            let p = self.points[v];
            let lo = active.partition_point(|&e| self.side_of(e, p) < 0.);
            let mut hi = lo;
            while active.get(hi).is_some_and(|&e| self.side_of(e, p) == 0.) {
                hi += 1;
            }

            // Edges through `v` that neither start nor end there have it in their interior.
            let mut removed = 0;
            let mut k = lo;
            while k < hi {
                let e = active[k];
                if self.ends[e][1] == v {
                    active.remove(k);
                    hi -= 1;
                    removed += 1;
                } else {
                    self.splits[e].push(v);
                    k += 1;
                }
            }
            if removed != ending[v] {
                // Crossings found earlier in this pass left the order inconsistent.
                let ends = &self.ends;
                active.retain(|&e| ends[e][1] != v);
            }
            let lo = lo.min(active.len());

            let mut starts = core::mem::take(&mut starting[v]);
            let points = self.points;
            let ends = &self.ends;
            starts.sort_by(|&a, &b| {
                let s = side(p, points[ends[a][1]], points[ends[b][1]]);
                s.partial_cmp(&0.).unwrap_or(core::cmp::Ordering::Equal)
            });
            let count = starts.len();
            active.splice(lo..lo, starts);

            let first = lo.saturating_sub(1);
            let last = (lo + count + 1).min(active.len());
            for k in first..last.saturating_sub(1) {
                self.compare(active[k], active[k + 1]);
            }
        }
    }
}

fn find_splits(
    pool: &mut VertexPool,
    edges: &[[usize; 2]],
    mode: TriangulationMode,
) -> Result<Vec<SmallVec<[usize; 2]>>, TriangulationError> {
    let SplitSweep {
        mut splits,
        crossings,
        ..
    } = sweep_splits(&pool.points, edges);
    if mode == TriangulationMode::Simple && !crossings.is_empty() {
        return Err(TriangulationError::SelfIntersection);
    }
    for (i, j) in crossings {
        let [a, b] = edges[i];
        let [c, d] = edges[j];
        let (pa, pb, pc, pd) = (
            pool.points[a],
            pool.points[b],
            pool.points[c],
            pool.points[d],
        );
        let (d3, d4) = (side(pc, pd, pa), side(pc, pd, pb));
        let t = d3 / (d3 - d4);
        let x = f64::from(pa.x) + (f64::from(pb.x) - f64::from(pa.x)) * t;
        let y = f64::from(pa.y) + (f64::from(pb.y) - f64::from(pa.y)) * t;
        let p = Point::new(x as f32, y as f32);
        if !p.is_finite() {
            return Err(TriangulationError::NonFinite);
        }
        let v = pool.insert(p);
        if v != a && v != b {
            splits[i].push(v);
        }
        if v != c && v != d {
            splits[j].push(v);
        }
    }
    Ok(splits)
}

/// Find the vertices lying inside each edge, and the pairs of edges that cross.
fn sweep_splits<'a>(points: &'a [Point], edges: &[[usize; 2]]) -> SplitSweep<'a> {
    let n = points.len();
    let mut starting: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
    let mut ending = vec![0_usize; n];
    let mut used = vec![false; n];
    let ends: Vec<[usize; 2]> = edges
        .iter()
        .enumerate()
        .map(|(i, &[a, b])| {
            let [top, bottom] = if sweep_cmp(points[a], points[b]).is_lt() {
                [a, b]
            } else {
                [b, a]
            };
            starting[top].push(i);
            ending[bottom] += 1;
            used[top] = true;
            used[bottom] = true;
            [top, bottom]
        })
        .collect();
    let mut order: Vec<usize> = (0..n).filter(|&v| used[v]).collect();
    order.sort_by(|&a, &b| sweep_cmp(points[a], points[b]));

    let mut sweep = SplitSweep {
        points,
        ends,
        splits: vec![SmallVec::new(); edges.len()],
        crossings: Vec::new(),
        compared: HashSet::new(),
    };
    sweep.run(&mut starting, &ending, &order);
    sweep
}

/// An edge of the sweep, between vertices in sweep order.
#[derive(Clone, Copy, Debug)]
struct SweepEdge {
    top: usize,
    bottom: usize,
    winding: i32,
}

/// Which chain of a monotone polygon a vertex is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chain {
    Top,
    Left,
    Right,
    Bottom,
}

#[derive(Debug)]
struct MonotonePoly {
    winding: i32,
    vertices: Vec<(usize, Chain)>,
}

/// The polygon state of the region to the right of an active edge.
#[derive(Clone, Copy, Debug)]
enum Region {
    Outside,
    One(usize),
    /// Two polygons meeting at a merge vertex; the next vertex in the region connects to it.
    Merged {
        left: usize,
        right: usize,
    },
}

#[derive(Clone, Copy, Debug)]
struct ActiveEdge {
    edge: usize,
    winding_right: i32,
    region: Region,
}

struct Sweep<'a> {
    points: &'a [Point],
    fill: FillType,
    mode: TriangulationMode,
    polys: Vec<MonotonePoly>,
    triangles: Vec<[Point; 3]>,
    breadcrumbs: Vec<[Point; 3]>,
}

impl Sweep<'_> {
    fn inside(&self, winding: i32) -> bool {
        self.fill.contains(winding)
    }

    fn new_poly(&mut self, winding: i32, top: usize) -> Result<usize, TriangulationError> {
        if self.mode == TriangulationMode::Simple && !self.fill.is_even_odd() && winding.abs() > 1
        {
            return Err(TriangulationError::ComplexWinding(winding));
        }
        self.polys.push(MonotonePoly {
            winding,
            vertices: vec![(top, Chain::Top)],
        });
        Ok(self.polys.len() - 1)
    }

    fn push(&mut self, poly: usize, v: usize, chain: Chain) {
        self.polys[poly].vertices.push((v, chain));
    }

    fn finish(&mut self, poly: usize, v: usize) {
        self.push(poly, v, Chain::Bottom);
        let vertices = core::mem::take(&mut self.polys[poly].vertices);
        let winding = self.polys[poly].winding;
        self.triangulate_monotone(&vertices, winding);
    }

    fn finish_region(&mut self, region: Region, v: usize) {
        match region {
            Region::Outside => {}
            Region::One(p) => self.finish(p, v),
            Region::Merged { left, right } => {
                self.finish(left, v);
                self.finish(right, v);
            }
        }
    }

    /// `v` continues the right boundary of `region`.
    fn on_right_boundary(&mut self, region: Region, v: usize) -> Region {
        match region {
            Region::Outside => Region::Outside,
            Region::One(p) => {
                self.push(p, v, Chain::Right);
                Region::One(p)
            }
            Region::Merged { left, right } => {
                self.push(left, v, Chain::Right);
                self.finish(right, v);
                Region::One(left)
            }
        }
    }

    /// `v` continues the left boundary of `region`.
    fn on_left_boundary(&mut self, region: Region, v: usize) -> Region {
        match region {
            Region::Outside => Region::Outside,
            Region::One(p) => {
                self.push(p, v, Chain::Left);
                Region::One(p)
            }
            Region::Merged { left, right } => {
                self.push(right, v, Chain::Left);
                self.finish(left, v);
                Region::One(right)
            }
        }
    }

    /// `v` starts edges inside `region` without ending any: connect it to the region's helper.
    fn split(&mut self, region: Region, v: usize) -> Result<(Region, Region), TriangulationError> {
        Ok(match region {
            Region::Outside => (Region::Outside, Region::Outside),
            Region::One(p) => {
                let Some(&(helper, chain)) = self.polys[p].vertices.last() else {
                    return Err(TriangulationError::Unresolved);
                };
                let q = self.new_poly(self.polys[p].winding, helper)?;
                if chain == Chain::Right {
                    self.push(p, v, Chain::Right);
                    self.push(q, v, Chain::Left);
                    (Region::One(p), Region::One(q))
                } else {
                    self.push(p, v, Chain::Left);
                    self.push(q, v, Chain::Right);
                    (Region::One(q), Region::One(p))
                }
            }
            Region::Merged { left, right } => {
                self.push(left, v, Chain::Right);
                self.push(right, v, Chain::Left);
                (Region::One(left), Region::One(right))
            }
        })
    }

    fn emit(&mut self, tri: [usize; 3], winding: i32) {
        let [a, b, c] = tri.map(|i| self.points[i]);
        let area = side(a, b, c);
        if area == 0. {
            return;
        }
        // Positive area is clockwise on screen.
        let tri = if (area > 0.) == (winding > 0) {
            [a, b, c]
        } else {
            [a, c, b]
        };
        self.triangles.push(tri);
        if !self.fill.is_even_odd() {
            for _ in 1..winding.unsigned_abs() {
                self.breadcrumbs.push(tri);
            }
        }
    }

    fn triangulate_monotone(&mut self, vertices: &[(usize, Chain)], winding: i32) {
        let [first, second, middle @ .., last] = vertices else {
            return;
        };
        let mut stack: SmallVec<[(usize, Chain); 16]> = SmallVec::new();
        stack.push(*first);
        stack.push(*second);
        for &(u, chain) in middle {
            let Some(&top) = stack.last() else {
                break;
            };
            if chain != top.1 {
                for pair in stack.windows(2) {
                    self.emit([u, pair[0].0, pair[1].0], winding);
                }
                stack.clear();
                stack.push(top);
                stack.push((u, chain));
                continue;
            }
            let Some(mut prev) = stack.pop() else {
                break;
            };
            while let Some(&t) = stack.last() {
                let s = side(self.points[t.0], self.points[u], self.points[prev.0]);
                let convex = if chain == Chain::Left { s > 0. } else { s < 0. };
                if !convex {
                    break;
                }
                self.emit([t.0, prev.0, u], winding);
                prev = t;
                stack.pop();
            }
            stack.push(prev);
            stack.push((u, chain));
        }
        let bottom = last.0;
        for pair in stack.windows(2) {
            self.emit([bottom, pair[0].0, pair[1].0], winding);
        }
    }

    fn run(&mut self, edges: &[SweepEdge]) -> Result<(), TriangulationError> {
        let n = self.points.len();
        let mut starting: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
        let mut ending = vec![0_usize; n];
        for (i, e) in edges.iter().enumerate() {
            starting[e.top].push(i);
            ending[e.bottom] += 1;
        }
        let mut active: Vec<ActiveEdge> = Vec::new();
        for v in 0..n {
            let p = self.points[v];
            let start = active.partition_point(|a| {
                let e = &edges[a.edge];
                side(self.points[e.top], self.points[e.bottom], p) < 0.
            });
            let mut end = start;
            while active.get(end).is_some_and(|a| edges[a.edge].bottom == v) {
                end += 1;
            }
            if end - start != ending[v] {
                return Err(TriangulationError::Unresolved);
            }
            let mut starts = core::mem::take(&mut starting[v]);
            if start == end && starts.is_empty() {
                continue;
            }
            let winding_in: i32 = active[start..end]
                .iter()
                .map(|a| edges[a.edge].winding)
                .sum();
            let winding_out: i32 = starts.iter().map(|&e| edges[e].winding).sum();
            if winding_in != winding_out {
                return Err(TriangulationError::Unresolved);
            }
            let points = self.points;
            starts.sort_by(|&a, &b| {
                let s = side(p, points[edges[a].bottom], points[edges[b].bottom]);
                s.partial_cmp(&0.).unwrap_or(core::cmp::Ordering::Equal)
            });

            let left_winding = if start > 0 {
                active[start - 1].winding_right
            } else {
                0
            };
            let region_left = if start > 0 {
                active[start - 1].region
            } else {
                Region::Outside
            };
            let (left_region, right_region) = if start == end {
                self.split(region_left, v)?
            } else {
                let a = self.on_right_boundary(region_left, v);
                for ended in &active[start..end - 1] {
                    self.finish_region(ended.region, v);
                }
                let b = self.on_left_boundary(active[end - 1].region, v);
                if starts.is_empty() {
                    let merged = match (a, b) {
                        (Region::Outside, Region::Outside) => Region::Outside,
                        (Region::One(left), Region::One(right)) => Region::Merged { left, right },
                        _ => return Err(TriangulationError::Unresolved),
                    };
                    (merged, Region::Outside)
                } else {
                    (a, b)
                }
            };

            let mut new_edges: SmallVec<[ActiveEdge; 4]> = SmallVec::new();
            let mut winding = left_winding;
            for (i, &e) in starts.iter().enumerate() {
                winding += edges[e].winding;
                let region = if i + 1 == starts.len() {
                    right_region
                } else if self.inside(winding) {
                    Region::One(self.new_poly(winding, v)?)
                } else {
                    Region::Outside
                };
                new_edges.push(ActiveEdge {
                    edge: e,
                    winding_right: winding,
                    region,
                });
            }
            if start > 0 {
                active[start - 1].region = left_region;
            }
            active.splice(start..end, new_edges);
        }
        if active.is_empty() {
            Ok(())
        } else {
            Err(TriangulationError::Unresolved)
        }
    }
}

/// Triangulate the region of `polygons` inside `fill`. The inverse of the fill type is ignored.
///
/// Every polygon is closed implicitly.
pub fn triangulate(
    polygons: &[Vec<Point>],
    fill: FillType,
    mode: TriangulationMode,
) -> Result<Triangulation, TriangulationError> {
    let mut pool = VertexPool::default();
    let mut directed = Vec::new();
    for polygon in polygons {
        if polygon.iter().any(|p| !p.is_finite()) {
            return Err(TriangulationError::NonFinite);
        }
        let ids: SmallVec<[usize; 16]> = polygon.iter().map(|&p| pool.insert(p)).collect();
        for (i, &from) in ids.iter().enumerate() {
            let to = ids[(i + 1) % ids.len()];
            if from != to {
                directed.push([from, to]);
            }
        }
    }

    let mut breadcrumbs = Vec::new();
    let directed = resolve(&mut pool, directed, mode, &mut breadcrumbs)?;

    // Number the vertices in sweep order.
    let mut order: Vec<usize> = (0..pool.points.len()).collect();
    order.sort_by(|&a, &b| sweep_cmp(pool.points[a], pool.points[b]));
    let mut rank = vec![0; order.len()];
    for (r, &v) in order.iter().enumerate() {
        rank[v] = r;
    }
    let points: Vec<Point> = order.iter().map(|&v| pool.points[v]).collect();

    // Upward edges wind positively, as in the scan converter.
    let mut merged: HashMap<(usize, usize), i32> = HashMap::new();
    for [from, to] in directed {
        let (rf, rt) = (rank[from], rank[to]);
        if rf < rt {
            *merged.entry((rf, rt)).or_default() -= 1;
        } else {
            *merged.entry((rt, rf)).or_default() += 1;
        }
    }
    let mut edges: Vec<SweepEdge> = merged
        .into_iter()
        .filter(|&(_, w)| w != 0)
        .map(|((top, bottom), winding)| SweepEdge {
            top,
            bottom,
            winding,
        })
        .collect();
    edges.sort_by_key(|e| (e.top, e.bottom));

    let mut sweep = Sweep {
        points: &points,
        fill: fill.to_non_inverse(),
        mode,
        polys: Vec::new(),
        triangles: Vec::new(),
        breadcrumbs,
    };
    sweep.run(&edges)?;
    let Sweep {
        triangles,
        breadcrumbs,
        ..
    } = sweep;
    Ok(if breadcrumbs.is_empty() {
        Triangulation::Clean(triangles)
    } else {
        Triangulation::Breadcrumbs {
            triangles,
            breadcrumbs,
        }
    })
}
