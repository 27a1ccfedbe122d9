use crate::geom::Point;

/// Points per leaf bucket.
const LEAF_SIZE: usize = 8;

/// Axis-aligned bounding box (closed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    pub min: Point,
    pub max: Point,
}

impl Bbox {
    /// The empty box: includes nothing, grows with `include`.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point::new(f64::INFINITY, f64::INFINITY),
            max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn around<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.include(p);
        }
        b
    }

    #[inline]
    pub fn include(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    #[inline]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn intersects(&self, other: &Bbox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    #[inline]
    fn within(&self, outer: &Bbox) -> bool {
        self.min.x >= outer.min.x
            && self.max.x <= outer.max.x
            && self.min.y >= outer.min.y
            && self.max.y <= outer.max.y
    }
}

#[derive(Clone, Debug)]
enum Node {
    Branch {
        bbox: Bbox,
        left: usize,
        right: usize,
    },
    Leaf {
        bbox: Bbox,
        start: usize,
        end: usize,
    },
}

impl Node {
    #[inline]
    fn bbox(&self) -> &Bbox {
        match self {
            Node::Branch { bbox, .. } | Node::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Static kd-tree over point ids.
///
/// Built once by recursive median partitioning on the axis of largest
/// spread; each node keeps the bounding box of its subtree so queries prune
/// whole subtrees and report fully covered ones without per-point tests.
#[derive(Clone, Debug)]
pub struct KdTree {
    positions: Vec<Point>,
    ids: Vec<usize>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl KdTree {
    pub fn build(points: &[Point]) -> Self {
        let mut tree = Self {
            positions: points.to_vec(),
            ids: (0..points.len()).collect(),
            nodes: Vec::with_capacity(2 * points.len() / LEAF_SIZE + 1),
            root: None,
        };
        if !points.is_empty() {
            let root = tree.build_node(0, points.len());
            tree.root = Some(root);
        }
        tree
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let bbox = Bbox::around(self.ids[start..end].iter().map(|&i| self.positions[i]));
        if end - start <= LEAF_SIZE {
            self.nodes.push(Node::Leaf { bbox, start, end });
            return self.nodes.len() - 1;
        }
        let split_x = bbox.max.x - bbox.min.x >= bbox.max.y - bbox.min.y;
        let mid = start + (end - start) / 2;
        let positions = &self.positions;
        self.ids[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            let (ka, kb) = if split_x {
                (positions[a].x, positions[b].x)
            } else {
                (positions[a].y, positions[b].y)
            };
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        });
        let left = self.build_node(start, mid);
        let right = self.build_node(mid, end);
        self.nodes.push(Node::Branch { bbox, left, right });
        self.nodes.len() - 1
    }

    /// Visit every id whose position lies in `query`.
    pub fn query<F: FnMut(usize)>(&self, query: &Bbox, mut visit: F) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(k) = stack.pop() {
            let node = &self.nodes[k];
            if !node.bbox().intersects(query) {
                continue;
            }
            match *node {
                Node::Branch {
                    ref bbox,
                    left,
                    right,
                } => {
                    if bbox.within(query) {
                        self.visit_all(k, &mut visit);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
                Node::Leaf { start, end, .. } => {
                    for &i in &self.ids[start..end] {
                        if query.contains(self.positions[i]) {
                            visit(i);
                        }
                    }
                }
            }
        }
    }

    fn visit_all<F: FnMut(usize)>(&self, node: usize, visit: &mut F) {
        let mut stack = vec![node];
        while let Some(k) = stack.pop() {
            match self.nodes[k] {
                Node::Branch { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                Node::Leaf { start, end, .. } => {
                    for &i in &self.ids[start..end] {
                        visit(i);
                    }
                }
            }
        }
    }

    /// Ids of the `k` nearest points to `ids[center]`'s position, excluding `center`.
    ///
    /// Grows a square window around the point until it holds enough candidates,
    /// then sorts by distance.
    pub fn nearest(&self, center: usize, k: usize) -> Vec<usize> {
        if k == 0 || self.ids.len() <= 1 {
            return Vec::new();
        }
        let c = self.positions[center];
        let root_box = self.root.map(|r| *self.nodes[r].bbox()).unwrap_or(Bbox::empty());
        let extent = (root_box.max.x - root_box.min.x)
            .max(root_box.max.y - root_box.min.y)
            .max(f64::MIN_POSITIVE);
        let want = k.min(self.ids.len() - 1);
        let mut radius = extent / (self.ids.len() as f64).sqrt();
        loop {
            let window = Bbox { min: c, max: c }.expanded(radius);
            let mut found = Vec::new();
            self.query(&window, |i| {
                if i != center {
                    found.push(i);
                }
            });
            // Only points within `radius` are guaranteed to beat everything outside the window.
            let mut inside: Vec<(f64, usize)> = found
                .into_iter()
                .map(|i| ((self.positions[i] - c).norm(), i))
                .collect();
            inside.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            let certain = inside.iter().take_while(|(d, _)| *d <= radius).count();
            if certain >= want || radius > 2.0 * extent {
                return inside.into_iter().take(want).map(|(_, i)| i).collect();
            }
            radius *= 2.0;
        }
    }
}
