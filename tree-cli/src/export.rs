//! Plain-text and legacy VTK writers for a grown tree.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tree_core::{GrownTree, Tree};

/// Writes every output file for `grown` next to `base`.
///
/// `base` is the path prefix; `_xyz.txt`, `_ien.txt`, `_endnodes.txt` and
/// `.vtk` are appended to it.
///
/// ### Returns
/// The paths written, in the order above.
pub fn write_all(grown: &GrownTree, base: &Path) -> Result<Vec<PathBuf>> {
    let tree = &grown.tree;
    Ok(vec![
        write_file(base, "_xyz.txt", |w| write_xyz(tree, w))?,
        write_file(base, "_ien.txt", |w| write_ien(tree, w))?,
        write_file(base, "_endnodes.txt", |w| write_end_nodes(tree, w))?,
        write_file(base, ".vtk", |w| write_vtk(tree, &grown.output_name, w))?,
    ])
}

fn write_file(
    base: &Path,
    suffix: &str,
    write: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<PathBuf> {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    let path = PathBuf::from(name);

    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// One `x y z` line per node, in node-id order.
pub fn write_xyz(tree: &Tree, w: &mut dyn Write) -> io::Result<()> {
    for node in tree.nodes() {
        writeln!(w, "{:.8e} {:.8e} {:.8e}", node.pos.x, node.pos.y, node.pos.z)?;
    }
    Ok(())
}

/// One `parent child` line per segment, in creation order.
pub fn write_ien(tree: &Tree, w: &mut dyn Write) -> io::Result<()> {
    for s in tree.segments() {
        writeln!(w, "{} {}", s.parent, s.child)?;
    }
    Ok(())
}

/// Ids of the leaf nodes, one per line.
pub fn write_end_nodes(tree: &Tree, w: &mut dyn Write) -> io::Result<()> {
    for id in tree.end_nodes() {
        writeln!(w, "{id}")?;
    }
    Ok(())
}

/// Legacy ASCII VTK polydata: nodes as points, segments as two-point lines,
/// with each line's generation as a cell scalar.
pub fn write_vtk(tree: &Tree, title: &str, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "{}", title.lines().next().unwrap_or_default())?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET POLYDATA")?;

    writeln!(w, "POINTS {} float", tree.node_count())?;
    for node in tree.nodes() {
        writeln!(w, "{} {} {}", node.pos.x, node.pos.y, node.pos.z)?;
    }

    let lines = tree.segment_count();
    writeln!(w, "LINES {} {}", lines, lines * 3)?;
    for s in tree.segments() {
        writeln!(w, "2 {} {}", s.parent, s.child)?;
    }

    writeln!(w, "CELL_DATA {lines}")?;
    writeln!(w, "SCALARS generation int 1")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for view in tree.segment_views() {
        writeln!(w, "{}", view.generation)?;
    }
    Ok(())
}
