//! Point-file loading and the text/WKT artifacts written by `run`.

use anyhow::{bail, Context, Result};
use areapoly::{Point, Polygon};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Points read from an instance file plus the hull area its header declares.
#[derive(Clone, Debug)]
pub struct PointSet {
    pub points: Vec<Point>,
    pub declared_hull_area: Option<f64>,
}

pub fn load_points(path: &Path) -> Result<PointSet> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading points {}", path.display()))?;
    parse_points(&text).with_context(|| format!("parsing points {}", path.display()))
}

/// Two header lines (the second may carry `{"area": "<hull area>"}`), then
/// one `index x y` line per point. Blank lines are skipped.
pub fn parse_points(text: &str) -> Result<PointSet> {
    let mut lines = text.lines();
    let _title = lines.next();
    let declared_hull_area = match lines.next() {
        Some(header) => declared_area(header)?,
        None => bail!("missing header lines"),
    };
    let mut points = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_, x, y] = fields[..] else {
            bail!("line {}: expected 'index x y', got '{line}'", lineno + 3);
        };
        let x: f64 = x
            .parse()
            .with_context(|| format!("line {}: bad x '{x}'", lineno + 3))?;
        let y: f64 = y
            .parse()
            .with_context(|| format!("line {}: bad y '{y}'", lineno + 3))?;
        points.push(Point::new(x, y));
    }
    Ok(PointSet {
        points,
        declared_hull_area,
    })
}

/// `area` from the JSON object embedded in the header, given as a string or a number.
fn declared_area(header: &str) -> Result<Option<f64>> {
    let (Some(open), Some(close)) = (header.find('{'), header.rfind('}')) else {
        return Ok(None);
    };
    if close < open {
        return Ok(None);
    }
    let meta: serde_json::Value = serde_json::from_str(&header[open..=close])
        .with_context(|| format!("bad JSON in header '{header}'"))?;
    let area = match meta.get("area") {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("bad hull area in header '{header}'"))?,
        Some(v) => match v.as_f64() {
            Some(x) => x,
            None => bail!("bad hull area in header '{header}'"),
        },
    };
    Ok(Some(area))
}

/// `POLYGON((x y, ..., x0 y0))`, closed.
pub fn polygon_wkt(polygon: &Polygon) -> String {
    let mut out = String::from("POLYGON((");
    let closing = polygon.vertices.first();
    for (i, p) in polygon.vertices.iter().chain(closing).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} {}", p.x, p.y);
    }
    out.push_str("))");
    out
}

/// `MULTIPOINT((x y), ...)`.
pub fn multipoint_wkt(points: &[Point]) -> String {
    let parts: Vec<String> = points.iter().map(|p| format!("({} {})", p.x, p.y)).collect();
    format!("MULTIPOINT({})", parts.join(", "))
}

/// Everything the text report needs.
pub struct Report<'a> {
    pub polygon: &'a Polygon,
    /// `<optimizer>_<min|max>`.
    pub algorithm: String,
    /// `None` for the ant colony, which has no starting polygon.
    pub initial_area: Option<f64>,
    pub hull_area: f64,
    pub millis: u128,
}

impl Report<'_> {
    pub fn render(&self) -> String {
        let mut out = String::from("Optimal Area Polygonization\n");
        for p in &self.polygon.vertices {
            let _ = writeln!(out, "{} {}", p.x, p.y);
        }
        for (a, b) in self.polygon.edges() {
            let _ = writeln!(out, "{} {} {} {}", a.x, a.y, b.x, b.y);
        }
        let area = self.polygon.area();
        let _ = writeln!(out, "Algorithm: {}", self.algorithm);
        if let Some(initial) = self.initial_area {
            let _ = writeln!(out, "area_initial: {initial}");
        }
        let _ = writeln!(out, "area: {area}");
        if let Some(initial) = self.initial_area {
            let _ = writeln!(out, "ratio_initial: {}", initial / self.hull_area);
        }
        let _ = writeln!(out, "ratio: {}", area / self.hull_area);
        let _ = writeln!(out, "construction time: {}", self.millis);
        out
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}
