//! STL mesh writers

use crate::MeshWriter;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tactilecrate_core::{Error, MeshGeometry, Result};

const HEADER_LEN: usize = 80;

/// Binary STL: 80 byte header, face count, then 50 bytes per face.
pub struct StlWriter;

/// ASCII STL with `facet normal` blocks.
pub struct AsciiStlWriter;

impl MeshWriter for StlWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &MeshGeometry, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_binary(mesh, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl MeshWriter for AsciiStlWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &MeshGeometry, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_ascii(mesh, "relief", &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

pub fn write_binary<W: Write>(mesh: &MeshGeometry, writer: &mut W) -> Result<()> {
    let count = u32::try_from(mesh.face_count()).map_err(|_| {
        Error::InvalidData(format!("{} faces do not fit a binary STL", mesh.face_count()))
    })?;

    let mut header = [0u8; HEADER_LEN];
    let label = b"tactilecrate relief";
    header[..label.len()].copy_from_slice(label);
    writer.write_all(&header)?;
    writer.write_u32::<LittleEndian>(count)?;

    let normals = mesh.calculate_face_normals();
    for (face, normal) in mesh.faces().iter().zip(&normals) {
        for value in [normal.x, normal.y, normal.z] {
            writer.write_f32::<LittleEndian>(value as f32)?;
        }
        for &index in face {
            let v = mesh.vertices()[index];
            for value in [v.x, v.y, v.z] {
                writer.write_f32::<LittleEndian>(value as f32)?;
            }
        }
        writer.write_u16::<LittleEndian>(0)?;
    }
    Ok(())
}

pub fn write_ascii<W: Write>(mesh: &MeshGeometry, name: &str, writer: &mut W) -> Result<()> {
    writeln!(writer, "solid {name}")?;
    let normals = mesh.calculate_face_normals();
    for (face, n) in mesh.faces().iter().zip(&normals) {
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for &index in face {
            let v = mesh.vertices()[index];
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}
