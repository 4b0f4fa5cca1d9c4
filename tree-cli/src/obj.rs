//! Minimal Wavefront OBJ reader.
//!
//! Only `v` and `f` records are used. Polygons are fan-triangulated around
//! their first corner; texture and normal references (`v/vt/vn`) are ignored
//! and negative indices count back from the last vertex read so far.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use glam::Vec3;
use tree_core::Mesh;

/// Reads the mesh stored in the OBJ file at `path`.
pub fn load(path: &Path) -> Result<Mesh> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

/// Parses OBJ text into a [`Mesh`].
pub fn parse(reader: impl BufRead) -> Result<Mesh> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut xyz = [0.0_f32; 3];
                for c in &mut xyz {
                    let field = fields
                        .next()
                        .ok_or_else(|| anyhow!("line {lineno}: vertex needs three coordinates"))?;
                    *c = field
                        .parse()
                        .with_context(|| format!("line {lineno}: bad coordinate {field:?}"))?;
                }
                vertices.push(Vec3::from_array(xyz));
            }
            Some("f") => {
                let corners = fields
                    .map(|f| resolve_index(f, vertices.len()))
                    .collect::<Result<Vec<usize>>>()
                    .with_context(|| format!("line {lineno}: bad face"))?;
                if corners.len() < 3 {
                    bail!("line {lineno}: face needs at least three corners");
                }
                for k in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok(Mesh::new(vertices, triangles)?)
}

/// Zero-based vertex index of one face corner such as `7`, `7/2/3` or `-1//4`.
fn resolve_index(corner: &str, vertex_count: usize) -> Result<usize> {
    let raw = corner.split('/').next().unwrap_or_default();
    let index: i64 = raw
        .parse()
        .with_context(|| format!("bad vertex reference {corner:?}"))?;
    let resolved = match index {
        0 => bail!("vertex indices start at 1"),
        i if i > 0 => i - 1,
        i => vertex_count as i64 + i,
    };
    usize::try_from(resolved).map_err(|_| anyhow!("vertex reference {corner:?} is out of range"))
}
