//! Mesh flattening between host polygon meshes and document objects.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use log::{debug, warn};

use crate::basis::{to_host_basis, to_render_basis};
use crate::document::Object;
use crate::error::{Result, SceneError};
use crate::host::HostObject;
use crate::resolve::MaterialIndexMap;

/// Evaluated host mesh (modifiers already applied).
///
/// Attributes that the host stores per face corner ("loop") are indexed by
/// loop, where loops are the polygons' corners concatenated in polygon order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostMesh {
    pub positions: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    /// Active UV layer, one entry per loop.
    pub uv_layer: Option<Vec<Vec2>>,
    /// Triangulation computed by the host, if it provides one.
    pub loop_triangles: Option<Vec<LoopTriangle>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<u32>,
    /// Index into the owning object's material slots.
    pub material_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTriangle {
    pub loops: [usize; 3],
    pub polygon: usize,
}

/// How a mesh whose faces use several materials maps onto document objects,
/// which carry a single material each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialAssignment {
    /// The whole object takes the material of its last triangle.
    #[default]
    LastTriangle,
    /// One document object per distinct material.
    SplitByMaterial,
}

impl HostMesh {
    /// Builds a mesh with one polygon per triangle, all using slot 0.
    pub fn from_triangles(positions: Vec<Vec3>, triangles: &[[u32; 3]]) -> Self {
        Self {
            positions,
            polygons: triangles
                .iter()
                .map(|tri| Polygon {
                    vertices: tri.to_vec(),
                    material_index: 0,
                })
                .collect(),
            uv_layer: None,
            loop_triangles: None,
        }
    }

    pub fn loop_count(&self) -> usize {
        self.polygons.iter().map(|p| p.vertices.len()).sum()
    }

    /// Vertex id of every loop, in loop order.
    pub fn loop_vertices(&self) -> Vec<u32> {
        self.polygons
            .iter()
            .flat_map(|p| p.vertices.iter().copied())
            .collect()
    }

    /// Triangles in host order: the host's own triangulation when present,
    /// otherwise a fan over every polygon.
    pub fn triangulate(&self) -> Vec<LoopTriangle> {
        if let Some(triangles) = &self.loop_triangles {
            return triangles.clone();
        }
        let mut triangles = Vec::new();
        let mut start = 0;
        for (polygon_index, polygon) in self.polygons.iter().enumerate() {
            let len = polygon.vertices.len();
            for i in 1..len.saturating_sub(1) {
                triangles.push(LoopTriangle {
                    loops: [start, start + i, start + i + 1],
                    polygon: polygon_index,
                });
            }
            start += len;
        }
        triangles
    }

    fn check(&self, object: &str) -> Result<()> {
        let invalid = |reason: String| SceneError::InvalidMesh {
            object: object.to_string(),
            reason,
        };
        let vertex_count = self.positions.len();
        for (index, polygon) in self.polygons.iter().enumerate() {
            if polygon.vertices.len() < 3 {
                return Err(invalid(format!(
                    "polygon {index} has {} corners",
                    polygon.vertices.len()
                )));
            }
            if let Some(v) = polygon.vertices.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(invalid(format!(
                    "polygon {index} uses vertex {v} but the mesh has {vertex_count}"
                )));
            }
        }
        let loop_count = self.loop_count();
        if let Some(uvs) = &self.uv_layer {
            if uvs.len() != loop_count {
                return Err(invalid(format!(
                    "uv layer has {} entries for {loop_count} loops",
                    uvs.len()
                )));
            }
        }
        if let Some(triangles) = &self.loop_triangles {
            let polygon_count = self.polygons.len();
            if let Some(bad) = triangles
                .iter()
                .find(|t| t.polygon >= polygon_count || t.loops.iter().any(|&l| l >= loop_count))
            {
                return Err(invalid(format!("loop triangle {bad:?} is out of range")));
            }
        }
        Ok(())
    }
}

/// Converts a mesh object into document objects.
///
/// UVs are stored per vertex in the document, so each vertex keeps the UV of
/// the first loop that references it and seams collapse onto that value.
/// Vertices that no loop references get a zero UV.
pub fn flatten_object(
    object: &HostObject,
    mesh: &HostMesh,
    materials: &MaterialIndexMap,
    assignment: MaterialAssignment,
) -> Result<Vec<Object>> {
    mesh.check(&object.name)?;

    let loop_vertices = mesh.loop_vertices();
    let triangles = mesh.triangulate();
    let vertices: Vec<Vec3> = mesh
        .positions
        .iter()
        .map(|&p| to_render_basis(object.matrix_world.transform_point3(p)))
        .collect();
    let uvs = mesh
        .uv_layer
        .as_deref()
        .map(|layer| per_vertex_uvs(&object.name, &loop_vertices, layer, vertices.len()));

    let material_of = |triangle: &LoopTriangle| -> usize {
        let slot = mesh.polygons[triangle.polygon].material_index;
        object
            .material_slots
            .get(slot)
            .and_then(|slot| slot.as_deref())
            .and_then(|name| materials.get(name))
            .unwrap_or(0)
    };

    let mut groups: Vec<(usize, Vec<[u32; 3]>)> = Vec::new();
    for triangle in &triangles {
        let material = material_of(triangle);
        let tri = triangle.loops.map(|l| loop_vertices[l]);
        match groups.iter_mut().find(|(m, _)| *m == material) {
            Some((_, tris)) => tris.push(tri),
            None => groups.push((material, vec![tri])),
        }
    }

    if assignment == MaterialAssignment::SplitByMaterial && groups.len() > 1 {
        debug!(
            "splitting {} into {} objects by material",
            object.name,
            groups.len()
        );
        return Ok(groups
            .iter()
            .map(|(material, tris)| compact(*material, tris, &vertices, uvs.as_deref()))
            .collect());
    }

    if groups.len() > 1 {
        warn!(
            "{} uses {} materials; exporting it with the material of its last triangle",
            object.name,
            groups.len()
        );
    }
    let material_index = triangles.last().map(material_of).unwrap_or(0);
    Ok(vec![Object {
        material_index,
        vertices: flatten_vec3(&vertices),
        triangles: triangles
            .iter()
            .flat_map(|t| t.loops.map(|l| loop_vertices[l]))
            .collect(),
        uvs: uvs.map(|uvs| flatten_uvs(&uvs)),
    }])
}

fn per_vertex_uvs(
    object: &str,
    loop_vertices: &[u32],
    layer: &[Vec2],
    vertex_count: usize,
) -> Vec<Vec2> {
    let mut lookup: HashMap<u32, Vec2> = HashMap::new();
    let mut seams = 0usize;
    for (&vertex, &uv) in loop_vertices.iter().zip(layer) {
        let first = *lookup.entry(vertex).or_insert(uv);
        if first != uv {
            seams += 1;
        }
    }
    if seams > 0 {
        warn!("{object}: {seams} corner UVs differ from their vertex's first UV and were dropped");
    }
    (0..vertex_count as u32)
        .map(|v| lookup.get(&v).copied().unwrap_or(Vec2::ZERO))
        .collect()
}

/// Builds an object holding only the vertices its triangles reference.
fn compact(
    material_index: usize,
    triangles: &[[u32; 3]],
    vertices: &[Vec3],
    uvs: Option<&[Vec2]>,
) -> Object {
    let mut lookup: HashMap<u32, u32> = HashMap::new();
    let mut used = Vec::new();
    let mut indices = Vec::with_capacity(triangles.len() * 3);
    for tri in triangles {
        for &vertex in tri {
            let next_index = used.len() as u32;
            let entry = lookup.entry(vertex).or_insert_with(|| {
                used.push(vertex as usize);
                next_index
            });
            indices.push(*entry);
        }
    }
    let positions: Vec<Vec3> = used.iter().map(|&v| vertices[v]).collect();
    Object {
        material_index,
        vertices: flatten_vec3(&positions),
        triangles: indices,
        uvs: uvs.map(|uvs| flatten_uvs(&used.iter().map(|&v| uvs[v]).collect::<Vec<_>>())),
    }
}

fn flatten_vec3(values: &[Vec3]) -> Vec<f32> {
    values.iter().flat_map(|v| v.to_array()).collect()
}

fn flatten_uvs(values: &[Vec2]) -> Vec<f32> {
    values.iter().flat_map(|uv| [uv.x, uv.y, 0.0]).collect()
}

/// Rebuilds a host mesh from document object `index`: one triangle polygon
/// per index triple, every polygon on material slot 0, and a UV layer that
/// gives each corner its vertex's UV.
pub fn rebuild_mesh(index: usize, object: &Object) -> Result<HostMesh> {
    object.check_geometry(index)?;
    let positions = object
        .vertices
        .chunks_exact(3)
        .map(|p| to_host_basis(Vec3::from_slice(p)))
        .collect();
    let polygons: Vec<Polygon> = object
        .triangles
        .chunks_exact(3)
        .map(|tri| Polygon {
            vertices: tri.to_vec(),
            material_index: 0,
        })
        .collect();
    let uv_layer = object.uvs.as_ref().map(|uvs| {
        object
            .triangles
            .iter()
            .map(|&v| {
                let i = v as usize * 3;
                Vec2::new(uvs[i], uvs[i + 1])
            })
            .collect()
    });
    Ok(HostMesh {
        positions,
        polygons,
        uv_layer,
        loop_triangles: None,
    })
}
