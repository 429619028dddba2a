/// Geometry primitives for the holographic stage
use nalgebra::{Matrix4, Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(
            self.triangles
                .iter()
                .flat_map(|t| t.vertices.iter().map(|v| v.position)),
        )
    }

    /// Create a simple cube mesh for demos and tests
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::new();

        // Each face is a quad split into two triangles, outward normal.
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            (
                [0.0, 0.0, 1.0],
                [
                    [-half, -half, half],
                    [half, -half, half],
                    [half, half, half],
                    [-half, half, half],
                ],
            ),
            (
                [0.0, 0.0, -1.0],
                [
                    [half, -half, -half],
                    [-half, -half, -half],
                    [-half, half, -half],
                    [half, half, -half],
                ],
            ),
            (
                [0.0, 1.0, 0.0],
                [
                    [-half, half, half],
                    [half, half, half],
                    [half, half, -half],
                    [-half, half, -half],
                ],
            ),
            (
                [0.0, -1.0, 0.0],
                [
                    [-half, -half, -half],
                    [half, -half, -half],
                    [half, -half, half],
                    [-half, -half, half],
                ],
            ),
            (
                [1.0, 0.0, 0.0],
                [
                    [half, -half, half],
                    [half, -half, -half],
                    [half, half, -half],
                    [half, half, half],
                ],
            ),
            (
                [-1.0, 0.0, 0.0],
                [
                    [-half, -half, -half],
                    [-half, -half, half],
                    [-half, half, half],
                    [-half, half, -half],
                ],
            ),
        ];

        for (n, quad) in faces {
            let v = |p: [f32; 3]| Vertex::new(p[0], p[1], p[2], n[0], n[1], n[2]);
            mesh.add_triangle(Triangle::new(v(quad[0]), v(quad[1]), v(quad[2])));
            mesh.add_triangle(Triangle::new(v(quad[0]), v(quad[2]), v(quad[3])));
        }

        mesh
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Bounding box of a point cloud. Empty input degenerates to the origin.
    pub fn from_points<I: IntoIterator<Item = Point3<f32>>>(points: I) -> Self {
        let mut iter = points.into_iter();
        let first = match iter.next() {
            Some(p) => p,
            None => Point3::origin(),
        };
        let mut min = first;
        let mut max = first;
        for p in iter {
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Self { min, max }
    }

    /// Bounding box of several meshes taken together
    pub fn of_meshes<'a, I: IntoIterator<Item = &'a Mesh>>(meshes: I) -> Self {
        Self::from_points(meshes.into_iter().flat_map(|m| {
            m.triangles
                .iter()
                .flat_map(|t| t.vertices.iter().map(|v| v.position))
        }))
    }

    /// Bounding box after applying a transform to every corner
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self::from_points(self.corners().iter().map(|c| matrix.transform_point(c)))
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest extent along any axis
    pub fn max_dim(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }
}
