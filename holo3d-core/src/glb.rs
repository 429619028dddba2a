/// Binary glTF (GLB) loader
///
/// Parses the container framing with nom and the scene document chunk with
/// serde_json, then flattens the node tree into world-space triangle meshes.
/// Whatever materials or textures the file carries are ignored; the stage
/// overrides them unconditionally.
use std::collections::HashMap;

use nalgebra::{Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};
use nom::{
    bytes::complete::{tag, take},
    number::complete::le_u32,
    IResult,
};
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{Aabb, Mesh, Triangle, Vertex};

const GLB_MAGIC: &[u8] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// glTF primitive mode for triangle lists
const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a GLB container")]
    BadContainer,
    #[error("unsupported glTF version {0}")]
    UnsupportedVersion(u32),
    #[error("missing {0} chunk")]
    MissingChunk(&'static str),
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("accessor data out of range")]
    AccessorOutOfRange,
    #[error("unsupported accessor layout {0:?}")]
    UnsupportedAccessor(String),
}

/// A loaded model: one mesh per drawable node, positions in model space
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn bounding_box(&self) -> Aabb {
        Aabb::of_meshes(&self.meshes)
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.iter().all(|m| m.triangles.is_empty())
    }
}

/// Parse a GLB byte buffer into a model
pub fn parse_glb(data: &[u8]) -> Result<Model, AssetError> {
    let (mut rest, version) = parse_header(data).map_err(|_| AssetError::BadContainer)?;
    if version != GLB_VERSION {
        return Err(AssetError::UnsupportedVersion(version));
    }

    let mut json: Option<&[u8]> = None;
    let mut bin: Option<&[u8]> = None;
    while !rest.is_empty() {
        let (next, (kind, chunk)) = parse_chunk(rest).map_err(|_| AssetError::BadContainer)?;
        match kind {
            CHUNK_JSON => json = json.or(Some(chunk)),
            CHUNK_BIN => bin = bin.or(Some(chunk)),
            // Unknown chunk kinds are skippable per the container format.
            _ => {}
        }
        rest = next;
    }

    let json = json.ok_or(AssetError::MissingChunk("JSON"))?;
    let doc: Document = serde_json::from_slice(json)?;
    extract_model(&doc, bin.unwrap_or(&[]))
}

fn parse_header(input: &[u8]) -> IResult<&[u8], u32> {
    let (input, _) = tag(GLB_MAGIC)(input)?;
    let (input, version) = le_u32(input)?;
    let (input, _total_length) = le_u32(input)?;
    Ok((input, version))
}

fn parse_chunk(input: &[u8]) -> IResult<&[u8], (u32, &[u8])> {
    let (input, length) = le_u32(input)?;
    let (input, kind) = le_u32(input)?;
    let (input, data) = take(length as usize)(input)?;
    Ok((input, (kind, data)))
}

// --- scene document ---------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
}

#[derive(Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Deserialize)]
struct NodeDef {
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Deserialize)]
struct MeshDef {
    #[serde(default)]
    primitives: Vec<PrimitiveDef>,
}

#[derive(Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    mode: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    element_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

// --- extraction --------------------------------------------------------------

/// Node trees are DAGs per the format; the depth cap only guards against
/// malformed circular files.
const MAX_NODE_DEPTH: usize = 64;

fn extract_model(doc: &Document, bin: &[u8]) -> Result<Model, AssetError> {
    let mut model = Model::default();

    let roots: Vec<usize> = match doc.scenes.get(doc.scene.unwrap_or(0)) {
        Some(scene) => scene.nodes.clone(),
        // No scene listing: every node not referenced as a child is a root.
        None => {
            let mut is_child = vec![false; doc.nodes.len()];
            for node in &doc.nodes {
                for &child in &node.children {
                    if let Some(slot) = is_child.get_mut(child) {
                        *slot = true;
                    }
                }
            }
            (0..doc.nodes.len()).filter(|&i| !is_child[i]).collect()
        }
    };

    for root in roots {
        visit_node(doc, bin, root, &Matrix4::identity(), 0, &mut model)?;
    }
    Ok(model)
}

fn visit_node(
    doc: &Document,
    bin: &[u8],
    index: usize,
    parent: &Matrix4<f32>,
    depth: usize,
    model: &mut Model,
) -> Result<(), AssetError> {
    if depth > MAX_NODE_DEPTH {
        return Err(AssetError::BadContainer);
    }
    let node = doc.nodes.get(index).ok_or(AssetError::AccessorOutOfRange)?;
    let world = parent * node_matrix(node);

    if let Some(mesh_index) = node.mesh {
        let def = doc
            .meshes
            .get(mesh_index)
            .ok_or(AssetError::AccessorOutOfRange)?;
        let mesh = build_mesh(doc, bin, def, &world)?;
        if !mesh.triangles.is_empty() {
            model.meshes.push(mesh);
        }
    }

    for &child in &node.children {
        visit_node(doc, bin, child, &world, depth + 1, model)?;
    }
    Ok(())
}

fn node_matrix(node: &NodeDef) -> Matrix4<f32> {
    if let Some(m) = node.matrix {
        // glTF stores matrices column-major.
        return Matrix4::from_column_slice(&m);
    }
    let t = node.translation.unwrap_or([0.0; 3]);
    let r = node.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
    let s = node.scale.unwrap_or([1.0; 3]);
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(r[3], r[0], r[1], r[2]));
    Matrix4::new_translation(&Vector3::from(t))
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(&Vector3::from(s))
}

fn build_mesh(
    doc: &Document,
    bin: &[u8],
    def: &MeshDef,
    world: &Matrix4<f32>,
) -> Result<Mesh, AssetError> {
    // Normals transform by the inverse transpose; fall back to the identity
    // for singular node transforms.
    let normal_matrix = world
        .try_inverse()
        .map(|m| m.transpose())
        .unwrap_or_else(Matrix4::identity);

    let mut mesh = Mesh::new();
    for primitive in &def.primitives {
        if primitive.mode.unwrap_or(MODE_TRIANGLES) != MODE_TRIANGLES {
            log::debug!("skipping non-triangle primitive");
            continue;
        }
        let Some(&position_accessor) = primitive.attributes.get("POSITION") else {
            continue;
        };

        let positions = Accessor::resolve(doc, bin, position_accessor)?;
        let normals = match primitive.attributes.get("NORMAL") {
            Some(&idx) => Some(Accessor::resolve(doc, bin, idx)?),
            None => None,
        };

        let index_accessor = match primitive.indices {
            Some(idx) => Some(Accessor::resolve(doc, bin, idx)?),
            None => None,
        };
        let index_count = index_accessor.as_ref().map_or(positions.count, |a| a.count);

        let mut tri = [Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0); 3];
        for face in 0..index_count / 3 {
            for corner in 0..3 {
                let i = match &index_accessor {
                    Some(acc) => acc.read_index(face * 3 + corner)?,
                    None => face * 3 + corner,
                };
                let p = positions.read_vec3(i)?;
                let position = world.transform_point(&Point3::from(p));
                let normal = match &normals {
                    Some(acc) => {
                        let n = Vector3::from(acc.read_vec3(i)?);
                        normal_matrix.transform_vector(&n)
                    }
                    None => Vector3::zeros(),
                };
                tri[corner] = Vertex {
                    position,
                    normal,
                };
            }
            let mut triangle = Triangle::new(tri[0], tri[1], tri[2]);
            // Missing or degenerate normals fall back to the face normal.
            let face_normal = triangle.calculate_normal();
            for vertex in &mut triangle.vertices {
                if vertex.normal.norm_squared() < 1e-12 {
                    vertex.normal = face_normal;
                } else {
                    vertex.normal = vertex.normal.normalize();
                }
            }
            mesh.add_triangle(triangle);
        }
    }
    Ok(mesh)
}

/// A resolved accessor: a typed window into the binary chunk
struct Accessor<'a> {
    data: &'a [u8],
    stride: usize,
    element_size: usize,
    count: usize,
    component_type: u32,
}

impl<'a> Accessor<'a> {
    fn resolve(doc: &Document, bin: &'a [u8], index: usize) -> Result<Self, AssetError> {
        let def = doc
            .accessors
            .get(index)
            .ok_or(AssetError::AccessorOutOfRange)?;
        let view_index = def.buffer_view.ok_or_else(|| {
            AssetError::UnsupportedAccessor("sparse accessor".to_string())
        })?;
        let view = doc
            .buffer_views
            .get(view_index)
            .ok_or(AssetError::AccessorOutOfRange)?;

        let components = match def.element_type.as_str() {
            "SCALAR" => 1,
            "VEC2" => 2,
            "VEC3" => 3,
            "VEC4" => 4,
            other => return Err(AssetError::UnsupportedAccessor(other.to_string())),
        };
        let component_size = match def.component_type {
            5120 | 5121 => 1, // byte / unsigned byte
            5122 | 5123 => 2, // short / unsigned short
            5125 | 5126 => 4, // unsigned int / float
            other => return Err(AssetError::UnsupportedAccessor(other.to_string())),
        };
        let element_size = components * component_size;
        let stride = view.byte_stride.unwrap_or(element_size);

        let start = view.byte_offset + def.byte_offset;
        let end = match def.count {
            0 => start,
            n => start + (n - 1) * stride + element_size,
        };
        if end > bin.len() || end > view.byte_offset + view.byte_length {
            return Err(AssetError::AccessorOutOfRange);
        }

        Ok(Self {
            data: &bin[start..],
            stride,
            element_size,
            count: def.count,
            component_type: def.component_type,
        })
    }

    fn element(&self, index: usize) -> Result<&'a [u8], AssetError> {
        if index >= self.count {
            return Err(AssetError::AccessorOutOfRange);
        }
        let at = index * self.stride;
        Ok(&self.data[at..at + self.element_size])
    }

    fn read_vec3(&self, index: usize) -> Result<[f32; 3], AssetError> {
        if self.component_type != 5126 || self.element_size != 12 {
            return Err(AssetError::UnsupportedAccessor(format!(
                "component type {} for vec3",
                self.component_type
            )));
        }
        let e = self.element(index)?;
        let f = |o: usize| f32::from_le_bytes([e[o], e[o + 1], e[o + 2], e[o + 3]]);
        Ok([f(0), f(4), f(8)])
    }

    fn read_index(&self, index: usize) -> Result<usize, AssetError> {
        let e = self.element(index)?;
        match self.component_type {
            5121 => Ok(e[0] as usize),
            5123 => Ok(u16::from_le_bytes([e[0], e[1]]) as usize),
            5125 => Ok(u32::from_le_bytes([e[0], e[1], e[2], e[3]]) as usize),
            other => Err(AssetError::UnsupportedAccessor(format!(
                "component type {other} for indices"
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Assemble a GLB container from a document and a binary chunk.
    pub(crate) fn build_glb(doc: serde_json::Value, bin: &[u8]) -> Vec<u8> {
        let mut json = serde_json::to_vec(&doc).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&GLB_VERSION.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }

    pub(crate) fn single_triangle_doc() -> serde_json::Value {
        json!({
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0}],
            "meshes": [{"primitives": [{
                "attributes": {"POSITION": 0},
                "indices": 1
            }]}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "buffers": [{"byteLength": 42}]
        })
    }

    pub(crate) fn single_triangle_bin() -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices: [u16; 3] = [0, 1, 2];
        let mut bin = Vec::new();
        for p in positions {
            bin.extend_from_slice(&p.to_le_bytes());
        }
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin
    }

    #[test]
    fn test_parse_single_triangle() {
        let glb = build_glb(single_triangle_doc(), &single_triangle_bin());
        let model = parse_glb(&glb).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].triangles.len(), 1);

        let tri = &model.meshes[0].triangles[0];
        assert!((tri.vertices[1].position - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
        // No NORMAL attribute: face normal fallback, +Z for this winding.
        assert!((tri.vertices[0].normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_node_translation_is_applied() {
        let mut doc = single_triangle_doc();
        doc["nodes"][0]["translation"] = json!([10.0, 0.0, 0.0]);
        let glb = build_glb(doc, &single_triangle_bin());
        let model = parse_glb(&glb).unwrap();
        let tri = &model.meshes[0].triangles[0];
        assert!((tri.vertices[0].position - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut glb = build_glb(single_triangle_doc(), &single_triangle_bin());
        glb[0] = b'x';
        assert!(matches!(parse_glb(&glb), Err(AssetError::BadContainer)));
    }

    #[test]
    fn test_truncated_container_is_rejected() {
        let glb = build_glb(single_triangle_doc(), &single_triangle_bin());
        assert!(matches!(
            parse_glb(&glb[..glb.len() - 4]),
            Err(AssetError::BadContainer)
        ));
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let mut glb = build_glb(single_triangle_doc(), &single_triangle_bin());
        glb[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            parse_glb(&glb),
            Err(AssetError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_accessor_past_end_of_bin_is_rejected() {
        let mut doc = single_triangle_doc();
        doc["accessors"][0]["count"] = json!(1000);
        doc["bufferViews"][0]["byteLength"] = json!(12000);
        let glb = build_glb(doc, &single_triangle_bin());
        assert!(matches!(
            parse_glb(&glb),
            Err(AssetError::AccessorOutOfRange)
        ));
    }

    #[test]
    fn test_model_bounding_box() {
        let glb = build_glb(single_triangle_doc(), &single_triangle_bin());
        let model = parse_glb(&glb).unwrap();
        let bounds = model.bounding_box();
        assert!((bounds.size() - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-6);
    }
}
