use crate::{ImportRequest, ImportResult, TypeImporter};
use gltf::mesh::Mode;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug)]
pub enum MeshImportError
{
    NoMeshes,
    NoPositionData { mesh: usize },
    UnsupportedPrimitiveMode { mesh: usize, mode: Mode },
    IndexOutOfRange { mesh: usize },
}
impl Display for MeshImportError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for MeshImportError { }

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeshVertex
{
    pub position: [f32; 3],
    pub normal: [f32; 3], // zero if the source had none
    pub tex_coord: [f32; 2],
}

// A run of triangle indices sharing one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh
{
    pub material_index: Option<usize>,
    pub index_offset: usize,
    pub index_count: usize,
}

// Every triangle primitive in a model file, merged into one vertex and index buffer.
// Node transforms are not applied
pub struct Mesh
{
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>, // into vertices, three per triangle
    pub submeshes: Vec<Submesh>,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}
impl Mesh
{
    #[inline] #[must_use]
    pub fn triangle_count(&self) -> usize { self.indices.len() / 3 }
}

// Imports glTF models, both JSON (.gltf, buffers relative to the file or embedded) and binary (.glb)
#[derive(Default)]
pub struct MeshImporter;
impl MeshImporter
{
    fn decode(request: &mut ImportRequest) -> ImportResult<Mesh>
    {
        let bytes = request.read_to_end()?;
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(&bytes)?;
        let buffers = gltf::import_buffers(&document, request.path.parent(), blob)?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut submeshes = Vec::new();
        let mut bounds_min = [f32::MAX; 3];
        let mut bounds_max = [f32::MIN; 3];

        for gltf_mesh in document.meshes()
        {
            let mesh = gltf_mesh.index();
            for primitive in gltf_mesh.primitives()
            {
                if primitive.mode() != Mode::Triangles
                {
                    return Err(Box::new(MeshImportError::UnsupportedPrimitiveMode { mesh, mode: primitive.mode() }));
                }

                let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
                let positions = reader.read_positions().ok_or(MeshImportError::NoPositionData { mesh })?;
                let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
                let tex_coords: Vec<[f32; 2]> = reader.read_tex_coords(0).map(|t| t.into_f32().collect()).unwrap_or_default();

                let base_vertex = vertices.len() as u32;
                for (i, position) in positions.enumerate()
                {
                    for axis in 0..3
                    {
                        bounds_min[axis] = bounds_min[axis].min(position[axis]);
                        bounds_max[axis] = bounds_max[axis].max(position[axis]);
                    }
                    vertices.push(MeshVertex
                    {
                        position,
                        normal: normals.get(i).copied().unwrap_or_default(),
                        tex_coord: tex_coords.get(i).copied().unwrap_or_default(),
                    });
                }
                let vertex_count = vertices.len() as u32 - base_vertex;

                let index_offset = indices.len();
                match reader.read_indices()
                {
                    Some(read) =>
                    {
                        for index in read.into_u32()
                        {
                            if index >= vertex_count
                            {
                                return Err(Box::new(MeshImportError::IndexOutOfRange { mesh }));
                            }
                            indices.push(base_vertex + index);
                        }
                    },
                    None => indices.extend(base_vertex..(base_vertex + vertex_count)),
                }

                submeshes.push(Submesh
                {
                    material_index: primitive.material().index(),
                    index_offset,
                    index_count: indices.len() - index_offset,
                });
            }
        }

        if submeshes.is_empty()
        {
            return Err(Box::new(MeshImportError::NoMeshes));
        }

        log::trace!("Decoded '{}': {} vertices, {} triangles in {} submesh(es)",
            request.name,
            vertices.len(),
            indices.len() / 3,
            submeshes.len());

        Ok(Mesh { vertices, indices, submeshes, bounds_min, bounds_max })
    }
}
impl TypeImporter for MeshImporter
{
    type Asset = Mesh;
    const EXTENSIONS: &'static str = ".gltf,.glb";
    const SUPPORTS_UPDATE: bool = true;

    fn import(&self, mut request: ImportRequest) -> ImportResult<Self::Asset>
    {
        Self::decode(&mut request)
    }
}
