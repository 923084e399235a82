//! PLY mesh writer

use crate::MeshWriter;
use ply_rs::{
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tactilecrate_core::{Error, MeshGeometry, Result};

/// ASCII PLY with double precision vertices and an int index list per face.
pub struct PlyWriter;

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &MeshGeometry, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_ply(mesh, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

pub fn write_ply<W: Write>(mesh: &MeshGeometry, writer: &mut W) -> Result<()> {
    let mut ply = Ply::<DefaultElement>::new();

    let mut vertex_element = ElementDef::new("vertex".to_string());
    vertex_element.count = mesh.vertex_count();
    for axis in ["x", "y", "z"] {
        vertex_element.properties.add(PropertyDef::new(
            axis.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    ply.header.elements.add(vertex_element);

    let mut face_element = ElementDef::new("face".to_string());
    face_element.count = mesh.face_count();
    face_element.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    ply.header.elements.add(face_element);

    let vertices = mesh
        .vertices()
        .iter()
        .map(|v| {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Double(v.x));
            element.insert("y".to_string(), Property::Double(v.y));
            element.insert("z".to_string(), Property::Double(v.z));
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    let faces = mesh
        .faces()
        .iter()
        .map(|face| {
            let indices = face
                .iter()
                .map(|&i| {
                    i32::try_from(i).map_err(|_| {
                        Error::InvalidData(format!("vertex index {i} does not fit a PLY int"))
                    })
                })
                .collect::<Result<Vec<i32>>>()?;
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            Ok(element)
        })
        .collect::<Result<Vec<_>>>()?;
    ply.payload.insert("face".to_string(), faces);

    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}
