use crate::sim_if::SIM_IF;
use prettytable::{Cell, Row, Table};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

struct CoverPoint {
    name: String,
    bins: Vec<String>,
    hits: HashSet<String>,
}

struct CoverCross {
    name: String,
    // indices into the points vector
    items: Vec<usize>,
    hits: HashSet<Vec<String>>,
}

/// Functional-coverage accumulator. Points and crosses are declared once at
/// construction; recording marks bins as hit and is idempotent. Values
/// outside the declared bins are ignored, recording against an undeclared
/// point is an API misuse and panics.
pub struct CoverageDb {
    points: Vec<CoverPoint>,
    crosses: Vec<CoverCross>,
}

impl CoverageDb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            crosses: Vec::new(),
        }
    }

    pub fn add_point(&mut self, name: &str, bins: &[&str]) {
        if self.point_index(name).is_some() {
            panic!("Coverage point {} declared twice", name);
        }
        self.points.push(CoverPoint {
            name: name.to_string(),
            bins: bins.iter().map(|b| b.to_string()).collect(),
            hits: HashSet::new(),
        });
    }

    /// Declares a cross over previously declared points. Its bins are the
    /// Cartesian product of the item points' bins.
    pub fn add_cross(&mut self, name: &str, items: &[&str]) {
        let items = items
            .iter()
            .map(|i| {
                self.point_index(i)
                    .unwrap_or_else(|| panic!("Cross {} references unknown point {}", name, i))
            })
            .collect();
        self.crosses.push(CoverCross {
            name: name.to_string(),
            items,
            hits: HashSet::new(),
        });
    }

    fn point_index(&self, name: &str) -> Option<usize> {
        self.points.iter().position(|p| p.name == name)
    }

    fn cross_index(&self, name: &str) -> Option<usize> {
        self.crosses.iter().position(|c| c.name == name)
    }

    pub fn record(&mut self, point: &str, value: &str) {
        let idx = self
            .point_index(point)
            .unwrap_or_else(|| panic!("Unknown coverage point {}", point));
        let p = &mut self.points[idx];
        if p.bins.iter().any(|b| b == value) {
            p.hits.insert(value.to_string());
        }
    }

    pub fn record_cross(&mut self, cross: &str, tuple: &[&str]) {
        let idx = self
            .cross_index(cross)
            .unwrap_or_else(|| panic!("Unknown coverage cross {}", cross));
        let items = &self.crosses[idx].items;
        if tuple.len() != items.len() {
            return;
        }
        let in_bins = items
            .iter()
            .zip(tuple.iter())
            .all(|(p, v)| self.points[*p].bins.iter().any(|b| b == v));
        if in_bins {
            self.crosses[idx]
                .hits
                .insert(tuple.iter().map(|v| v.to_string()).collect());
        }
    }

    pub fn point_hits(&self, name: &str) -> usize {
        self.points[self.point_index(name).unwrap()].hits.len()
    }

    pub fn cross_hits(&self, name: &str) -> usize {
        self.crosses[self.cross_index(name).unwrap()].hits.len()
    }

    fn cross_size(&self, cross: &CoverCross) -> usize {
        cross.items.iter().map(|p| self.points[*p].bins.len()).product()
    }

    /// Human-readable hit/miss summary of every bin.
    pub fn report(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("point"),
            Cell::new("bin"),
            Cell::new("hit"),
        ]));
        for p in &self.points {
            for bin in &p.bins {
                table.add_row(Row::new(vec![
                    Cell::new(&p.name),
                    Cell::new(bin),
                    Cell::new(if p.hits.contains(bin) { "yes" } else { "no" }),
                ]));
            }
        }
        SIM_IF.log("coverage report:");
        table.printstd();
        for p in &self.points {
            SIM_IF.log(&format!(
                "  {}: {}/{} bins ({:.1}%)",
                p.name,
                p.hits.len(),
                p.bins.len(),
                100.0 * p.hits.len() as f64 / p.bins.len() as f64
            ));
        }
        for c in &self.crosses {
            let size = self.cross_size(c);
            SIM_IF.log(&format!(
                "  {}: {}/{} bins ({:.1}%)",
                c.name,
                c.hits.len(),
                size,
                100.0 * c.hits.len() as f64 / size as f64
            ));
        }
    }

    /// Structured export of all points and crosses with their hit-bin sets.
    pub fn export_xml(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(file, "<coverage>")?;
        for p in &self.points {
            writeln!(
                file,
                "  <coverpoint name=\"{}\" bins=\"{}\" hit=\"{}\">",
                p.name,
                p.bins.len(),
                p.hits.len()
            )?;
            for bin in &p.bins {
                writeln!(
                    file,
                    "    <bin value=\"{}\" hit=\"{}\"/>",
                    bin,
                    p.hits.contains(bin) as u32
                )?;
            }
            writeln!(file, "  </coverpoint>")?;
        }
        for c in &self.crosses {
            writeln!(
                file,
                "  <covercross name=\"{}\" bins=\"{}\" hit=\"{}\">",
                c.name,
                self.cross_size(c),
                c.hits.len()
            )?;
            let mut hit_tuples: Vec<&Vec<String>> = c.hits.iter().collect();
            hit_tuples.sort();
            for tuple in hit_tuples {
                writeln!(file, "    <tuple value=\"{}\"/>", tuple.join(","))?;
            }
            writeln!(file, "  </covercross>")?;
        }
        writeln!(file, "</coverage>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> CoverageDb {
        let mut db = CoverageDb::new();
        db.add_point("top.a", &["0", "1"]);
        db.add_point("top.b", &["0", "1"]);
        db.add_cross("top.cross.ab", &["top.a", "top.b"]);
        db
    }

    #[test]
    fn recording_is_idempotent() {
        let mut db = db();
        db.record("top.a", "1");
        db.record("top.a", "1");
        assert_eq!(db.point_hits("top.a"), 1);
        db.record_cross("top.cross.ab", &["1", "0"]);
        db.record_cross("top.cross.ab", &["1", "0"]);
        assert_eq!(db.cross_hits("top.cross.ab"), 1);
    }

    #[test]
    fn off_bin_values_are_ignored() {
        let mut db = db();
        db.record("top.a", "7");
        assert_eq!(db.point_hits("top.a"), 0);
        db.record_cross("top.cross.ab", &["0", "banana"]);
        db.record_cross("top.cross.ab", &["0"]);
        assert_eq!(db.cross_hits("top.cross.ab"), 0);
    }

    #[test]
    #[should_panic(expected = "Unknown coverage point")]
    fn unknown_point_panics() {
        let mut db = db();
        db.record("top.nope", "0");
    }

    #[test]
    fn full_cross_coverage() {
        let mut db = db();
        for a in ["0", "1"] {
            for b in ["0", "1"] {
                db.record_cross("top.cross.ab", &[a, b]);
            }
        }
        assert_eq!(db.cross_hits("top.cross.ab"), 4);
    }

    #[test]
    fn report_renders_every_bin() {
        let mut db = db();
        db.record("top.a", "1");
        db.record_cross("top.cross.ab", &["1", "0"]);
        db.report();
    }

    #[test]
    fn xml_export_shape() {
        let mut db = db();
        db.record("top.a", "0");
        db.record_cross("top.cross.ab", &["0", "1"]);
        let path = std::env::temp_dir().join("orfifo_tb_cov_shape_test.xml");
        db.export_xml(&path).unwrap();
        let xml = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(xml.contains("<coverpoint name=\"top.a\" bins=\"2\" hit=\"1\">"));
        assert!(xml.contains("<bin value=\"0\" hit=\"1\"/>"));
        assert!(xml.contains("<bin value=\"1\" hit=\"0\"/>"));
        assert!(xml.contains("<covercross name=\"top.cross.ab\" bins=\"4\" hit=\"1\">"));
        assert!(xml.contains("<tuple value=\"0,1\"/>"));
    }
}
