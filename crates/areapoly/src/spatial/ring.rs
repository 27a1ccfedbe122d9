use std::collections::BTreeMap;

use crate::geom::{Point, Polygon};

const NIL: usize = usize::MAX;

/// Working polygon over a fixed point set.
///
/// Vertices are point ids; `next`/`prev` hold the cyclic order of every id
/// currently on the ring. Several disjoint cycles may coexist while layers
/// are being merged; every mutating primitive goes through `link`/`unlink`
/// so the aggregates stay exact:
/// - `twice_area`: sum of `cross(p, q)` over all edges (twice the signed area
///   when there is a single cycle);
/// - `lengths`: multiset of edge lengths, keyed by the bit pattern of the
///   non-negative length (monotone in the value).
#[derive(Clone, Debug)]
pub struct Ring<'a> {
    points: &'a [Point],
    next: Vec<usize>,
    prev: Vec<usize>,
    len: usize,
    twice_area: f64,
    lengths: BTreeMap<u64, usize>,
}

impl<'a> Ring<'a> {
    /// An empty ring over `points`; nothing is on it yet.
    pub fn new(points: &'a [Point]) -> Self {
        Self {
            points,
            next: vec![NIL; points.len()],
            prev: vec![NIL; points.len()],
            len: 0,
            twice_area: 0.0,
            lengths: BTreeMap::new(),
        }
    }

    /// A ring holding the single cycle `order`.
    pub fn from_cycle(points: &'a [Point], order: &[usize]) -> Self {
        let mut ring = Self::new(points);
        ring.add_cycle(order);
        ring
    }

    /// Add a new cycle over ids that are not yet on the ring.
    pub fn add_cycle(&mut self, order: &[usize]) {
        debug_assert!(order.iter().all(|&i| !self.contains(i)));
        let k = order.len();
        for i in 0..k {
            self.link(order[i], order[(i + 1) % k]);
        }
        self.len += k;
    }

    #[inline]
    pub fn points(&self) -> &'a [Point] {
        self.points
    }

    #[inline]
    pub fn point(&self, id: usize) -> Point {
        self.points[id]
    }

    #[inline]
    pub fn next(&self, id: usize) -> usize {
        self.next[id]
    }

    #[inline]
    pub fn prev(&self, id: usize) -> usize {
        self.prev[id]
    }

    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        self.next[id] != NIL
    }

    /// Number of ids on the ring (all cycles).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Twice the signed area (sum over all cycles).
    #[inline]
    pub fn twice_signed_area(&self) -> f64 {
        self.twice_area
    }

    #[inline]
    pub fn area(&self) -> f64 {
        0.5 * self.twice_area.abs()
    }

    /// Longest current edge, 0 for an empty ring.
    pub fn max_edge_len(&self) -> f64 {
        self.lengths
            .keys()
            .next_back()
            .map(|&bits| f64::from_bits(bits))
            .unwrap_or(0.0)
    }

    /// Re-sum the signed area from scratch, dropping accumulated rounding.
    pub fn refresh_area(&mut self) {
        let mut twice = 0.0;
        for id in 0..self.next.len() {
            let n = self.next[id];
            if n != NIL {
                twice += cross(self.points[id], self.points[n]);
            }
        }
        self.twice_area = twice;
    }

    /// Ids of the cycle through `start`, following `next`.
    pub fn cycle_from(&self, start: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.len);
        if !self.contains(start) {
            return out;
        }
        let mut cur = start;
        loop {
            out.push(cur);
            cur = self.next[cur];
            if cur == start || out.len() > self.len {
                break;
            }
        }
        out
    }

    /// Any id on the ring.
    pub fn first(&self) -> Option<usize> {
        self.next.iter().position(|&n| n != NIL)
    }

    /// The cycle through the lowest id as a polygon.
    pub fn to_polygon(&self) -> Polygon {
        let order = self.first().map(|s| self.cycle_from(s)).unwrap_or_default();
        Polygon::new(order.into_iter().map(|i| self.points[i]).collect())
    }

    /// Take the whole cycle through `start` off the ring.
    pub fn remove_cycle(&mut self, start: usize) {
        let ids = self.cycle_from(start);
        for &a in &ids {
            let b = self.next[a];
            self.unlink(a, b);
        }
        self.len -= ids.len();
    }

    /// `a -> x -> next(a)`.
    pub fn insert_after(&mut self, a: usize, x: usize) {
        debug_assert!(!self.contains(x));
        let b = self.next[a];
        self.unlink(a, b);
        self.link(a, x);
        self.link(x, b);
        self.len += 1;
    }

    /// `p -> x -> q` becomes `p -> q`.
    pub fn remove(&mut self, x: usize) {
        let p = self.prev[x];
        let q = self.next[x];
        self.unlink(p, x);
        self.unlink(x, q);
        self.link(p, q);
        self.len -= 1;
    }

    /// Exchange the order of `q` and `r = next(q)`: `p q r s` becomes `p r q s`.
    pub fn swap_with_next(&mut self, q: usize) {
        let p = self.prev[q];
        let r = self.next[q];
        let s = self.next[r];
        self.unlink(p, q);
        self.unlink(q, r);
        self.unlink(r, s);
        self.link(p, r);
        self.link(r, q);
        self.link(q, s);
    }

    /// Cut the chain `first ..= last` (following `next`) and reinsert it
    /// between `u` and `next(u)`, optionally reversed.
    ///
    /// `u` and `next(u)` must not lie on the chain.
    pub fn relocate_chain(&mut self, first: usize, last: usize, u: usize, reversed: bool) {
        let chain = self.chain(first, last);
        let p = self.prev[first];
        let q = self.next[last];
        let w = self.next[u];
        debug_assert!(!chain.contains(&u) && !chain.contains(&w));
        self.unlink(p, first);
        self.unlink(last, q);
        self.unlink(u, w);
        self.link(p, q);
        if reversed {
            for pair in chain.windows(2) {
                self.unlink(pair[0], pair[1]);
            }
            for pair in chain.windows(2) {
                self.link(pair[1], pair[0]);
            }
            self.link(u, last);
            self.link(first, w);
        } else {
            self.link(u, first);
            self.link(last, w);
        }
    }

    /// Merge the cycle through `w` into the cycle through `a`:
    /// `a -> b` and `w -> u` become `a -> u` and `w -> b`.
    pub fn splice(&mut self, a: usize, w: usize) {
        let b = self.next[a];
        let u = self.next[w];
        self.unlink(a, b);
        self.unlink(w, u);
        self.link(a, u);
        self.link(w, b);
    }

    /// Ids `first ..= last` following `next`.
    pub fn chain(&self, first: usize, last: usize) -> Vec<usize> {
        let mut out = vec![first];
        let mut cur = first;
        while cur != last && out.len() <= self.len {
            cur = self.next[cur];
            out.push(cur);
        }
        out
    }

    fn link(&mut self, a: usize, b: usize) {
        self.next[a] = b;
        self.prev[b] = a;
        let (pa, pb) = (self.points[a], self.points[b]);
        self.twice_area += cross(pa, pb);
        *self.lengths.entry(length_key(pa, pb)).or_insert(0) += 1;
    }

    fn unlink(&mut self, a: usize, b: usize) {
        debug_assert_eq!(self.next[a], b);
        self.next[a] = NIL;
        self.prev[b] = NIL;
        let (pa, pb) = (self.points[a], self.points[b]);
        self.twice_area -= cross(pa, pb);
        let key = length_key(pa, pb);
        if let Some(count) = self.lengths.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.lengths.remove(&key);
            }
        }
    }
}

#[inline]
fn cross(p: Point, q: Point) -> f64 {
    p.x * q.y - q.x * p.y
}

#[inline]
fn length_key(a: Point, b: Point) -> u64 {
    (b - a).norm().to_bits()
}
