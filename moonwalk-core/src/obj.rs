/// Wavefront OBJ importer
///
/// Reads `v`, `vn` and `f` records; anything else is skipped. Files with
/// normals keep them and share vertices between faces, files without get
/// flat per-triangle normals.
use std::collections::HashMap;

use log::{debug, trace};
use nom::{
    bytes::complete::take_till1,
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, map, opt},
    multi::many1,
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::{face_normal, Mesh};
use crate::vector::Vec3;

/// One `a/b/c` token of a face record, indices as written (1-based or negative)
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawFaceVertex {
    position: i64,
    texcoord: Option<i64>,
    normal: Option<i64>,
}

/// A face vertex with indices resolved to 0-based offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FaceVertex {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

/// Triangle corner plus the line it came from, for error reporting
#[derive(Debug, Clone, Copy)]
struct Corner {
    vertex: FaceVertex,
    line: usize,
}

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoord_count: usize,
    triangles: Vec<[Corner; 3]>,
}

/// Parse OBJ text into a mesh.
pub fn parse_obj(input: &str) -> Result<Mesh> {
    let data = read_records(input)?;
    let mesh = if data.normals.is_empty() {
        assemble_flat(&data)?
    } else {
        assemble_shared(&data)?
    };
    debug!(
        "imported OBJ: {} source positions, {} source normals -> {} vertices, {} triangles",
        data.positions.len(),
        data.normals.len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Read an OBJ file from disk.
pub fn load_obj(path: impl AsRef<std::path::Path>) -> Result<Mesh> {
    let text = std::fs::read_to_string(path)?;
    parse_obj(&text)
}

fn read_records(input: &str) -> Result<ObjData> {
    let mut data = ObjData::default();

    for (index, raw_line) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (rest, keyword) =
            keyword(line).map_err(|_| Error::parse(line_number, "missing record keyword"))?;
        match keyword {
            "v" => {
                let position = complete(rest, vertex_record)
                    .ok_or_else(|| malformed(line_number, "vertex", line))?;
                data.positions.push(position);
            }
            "vn" => {
                let normal = complete(rest, normal_record)
                    .ok_or_else(|| malformed(line_number, "normal", line))?;
                data.normals.push(normal);
            }
            "vt" => data.texcoord_count += 1,
            "f" => {
                let raw = complete(rest, face_record)
                    .ok_or_else(|| malformed(line_number, "face", line))?;
                if raw.len() < 3 {
                    return Err(Error::parse(
                        line_number,
                        format!("face needs at least 3 vertices, found {}", raw.len()),
                    ));
                }
                let corners = raw
                    .iter()
                    .map(|r| {
                        resolve(r, &data, line_number).map(|vertex| Corner {
                            vertex,
                            line: line_number,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                // Fan around the first corner.
                for i in 1..corners.len() - 1 {
                    data.triangles.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            other => trace!("line {}: skipping `{}` record", line_number, other),
        }
    }

    Ok(data)
}

fn malformed(line_number: usize, record: &str, line: &str) -> Error {
    Error::parse(line_number, format!("malformed {} record `{}`", record, line))
}

/// Every face corner becomes its own vertex carrying the triangle's normal.
fn assemble_flat(data: &ObjData) -> Result<Mesh> {
    let mut positions = Vec::with_capacity(data.triangles.len() * 3);
    let mut normals = Vec::with_capacity(data.triangles.len() * 3);
    let mut indices = Vec::with_capacity(data.triangles.len() * 3);

    for triangle in &data.triangles {
        let [a, b, c] = [0, 1, 2].map(|i| data.positions[triangle[i].vertex.position]);
        let normal = face_normal(&a, &b, &c).map_err(|_| {
            Error::degenerate(format!("zero-area face on line {}", triangle[0].line))
        })?;
        for p in [a, b, c] {
            indices.push(positions.len() as u32);
            positions.push(p);
            normals.push(normal);
        }
    }

    Mesh::new(positions, normals, indices)
}

/// Repeated position/texcoord/normal combinations share one output vertex.
fn assemble_shared(data: &ObjData) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::with_capacity(data.triangles.len() * 3);
    let mut seen: HashMap<FaceVertex, u32> = HashMap::new();

    for corner in data.triangles.iter().flatten() {
        let normal = corner.vertex.normal.ok_or_else(|| {
            Error::parse(
                corner.line,
                "face vertex has no normal index but the file defines normals",
            )
        })?;
        let index = *seen.entry(corner.vertex).or_insert_with(|| {
            positions.push(data.positions[corner.vertex.position]);
            normals.push(data.normals[normal]);
            (positions.len() - 1) as u32
        });
        indices.push(index);
    }

    Mesh::new(positions, normals, indices)
}

fn resolve(raw: &RawFaceVertex, data: &ObjData, line: usize) -> Result<FaceVertex> {
    let position = resolve_index(raw.position, data.positions.len(), "position", line)?;
    let texcoord = raw
        .texcoord
        .map(|i| resolve_index(i, data.texcoord_count, "texture coordinate", line))
        .transpose()?;
    let normal = raw
        .normal
        .map(|i| resolve_index(i, data.normals.len(), "normal", line))
        .transpose()?;
    Ok(FaceVertex {
        position,
        texcoord,
        normal,
    })
}

/// OBJ indices are 1-based; negative ones count back from the latest element.
fn resolve_index(index: i64, count: usize, what: &str, line: usize) -> Result<usize> {
    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => count.checked_sub(i.unsigned_abs() as usize),
    };
    match resolved {
        Some(i) if i < count => Ok(i),
        _ => Err(Error::parse(
            line,
            format!("{} index {} out of range ({} defined so far)", what, index, count),
        )),
    }
}

/// Run `parser` over the whole remainder of a line.
fn complete<'a, O>(
    input: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Option<O> {
    all_consuming(terminated(parser, space0))(input)
        .ok()
        .map(|(_, output)| output)
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn coordinate(input: &str) -> IResult<&str, f32> {
    preceded(space1, float)(input)
}

fn vector3(input: &str) -> IResult<&str, Vec3> {
    map(tuple((coordinate, coordinate, coordinate)), |(x, y, z)| Vec3::new(x, y, z))(input)
}

/// `x y z [w]`; the optional weight is ignored.
fn vertex_record(input: &str) -> IResult<&str, Vec3> {
    terminated(vector3, opt(coordinate))(input)
}

fn normal_record(input: &str) -> IResult<&str, Vec3> {
    vector3(input)
}

fn face_record(input: &str) -> IResult<&str, Vec<RawFaceVertex>> {
    many1(preceded(space1, face_vertex))(input)
}

/// `p`, `p/t`, `p//n` or `p/t/n`
fn face_vertex(input: &str) -> IResult<&str, RawFaceVertex> {
    let (input, position) = integer(input)?;
    let (input, rest) = opt(pair(
        preceded(char('/'), opt(integer)),
        opt(preceded(char('/'), integer)),
    ))(input)?;
    let (texcoord, normal) = rest.unwrap_or((None, None));
    Ok((
        input,
        RawFaceVertex {
            position,
            texcoord,
            normal,
        },
    ))
}
