use glam::{Mat3, Mat4, Vec3};
use wgpu::util::DeviceExt;
use bytemuck::NoUninit;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// sRGB hex colour (0xRRGGBB) to linear RGBA, since the surface format is sRGB
pub fn rgb(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0), 1.0]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Merge another mesh into this one, rebasing its indices
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Copy with every vertex moved by `transform`; normals use the inverse transpose
    pub fn transformed(&self, transform: Mat4) -> Mesh {
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex {
                pos: transform.transform_point3(Vec3::from(v.pos)).to_array(),
                normal: (normal_matrix * Vec3::from(v.normal)).normalize_or_zero().to_array(),
                color: v.color,
            })
            .collect();
        Mesh { vertices, indices: self.indices.clone() }
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        for c in corners {
            self.vertices.push(Vertex { pos: c.to_array(), normal: normal.to_array(), color });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned box centred on the origin
    pub fn cuboid(width: f32, height: f32, depth: f32, color: [f32; 4]) -> Mesh {
        let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
        let mut mesh = Mesh::empty();
        // +Y, -Y
        mesh.push_quad([Vec3::new(-x, y, z), Vec3::new(x, y, z), Vec3::new(x, y, -z), Vec3::new(-x, y, -z)], Vec3::Y, color);
        mesh.push_quad([Vec3::new(-x, -y, -z), Vec3::new(x, -y, -z), Vec3::new(x, -y, z), Vec3::new(-x, -y, z)], Vec3::NEG_Y, color);
        // +X, -X
        mesh.push_quad([Vec3::new(x, -y, z), Vec3::new(x, -y, -z), Vec3::new(x, y, -z), Vec3::new(x, y, z)], Vec3::X, color);
        mesh.push_quad([Vec3::new(-x, -y, -z), Vec3::new(-x, -y, z), Vec3::new(-x, y, z), Vec3::new(-x, y, -z)], Vec3::NEG_X, color);
        // +Z, -Z
        mesh.push_quad([Vec3::new(-x, -y, z), Vec3::new(x, -y, z), Vec3::new(x, y, z), Vec3::new(-x, y, z)], Vec3::Z, color);
        mesh.push_quad([Vec3::new(x, -y, -z), Vec3::new(-x, -y, -z), Vec3::new(-x, y, -z), Vec3::new(x, y, -z)], Vec3::NEG_Z, color);
        mesh
    }

    /// Frustum along Y centred on the origin: `radius_top` at +height/2, `radius_bottom` at -height/2.
    /// A zero radius closes that end to a point (cone).
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32, color: [f32; 4]) -> Mesh {
        let segments = segments.max(3);
        let half = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;
        let mut mesh = Mesh::empty();

        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * std::f32::consts::TAU;
            let a1 = (i + 1) as f32 / segments as f32 * std::f32::consts::TAU;
            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();

            let base = mesh.vertices.len() as u32;
            for (s, c, r, y) in [
                (s0, c0, radius_bottom, -half),
                (s1, c1, radius_bottom, -half),
                (s1, c1, radius_top, half),
                (s0, c0, radius_top, half),
            ] {
                let normal = Vec3::new(s, slope, c).normalize();
                mesh.vertices.push(Vertex {
                    pos: [r * s, y, r * c],
                    normal: normal.to_array(),
                    color,
                });
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        for (radius, y, normal) in [(radius_top, half, Vec3::Y), (radius_bottom, -half, Vec3::NEG_Y)] {
            if radius <= 0.0 {
                continue;
            }
            let centre = mesh.vertices.len() as u32;
            mesh.vertices.push(Vertex { pos: [0.0, y, 0.0], normal: normal.to_array(), color });
            for i in 0..segments {
                let a = i as f32 / segments as f32 * std::f32::consts::TAU;
                mesh.vertices.push(Vertex {
                    pos: [radius * a.sin(), y, radius * a.cos()],
                    normal: normal.to_array(),
                    color,
                });
            }
            for i in 0..segments {
                let a = centre + 1 + i;
                let b = centre + 1 + (i + 1) % segments;
                if normal.y > 0.0 {
                    mesh.indices.extend_from_slice(&[centre, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[centre, b, a]);
                }
            }
        }

        mesh
    }

    /// Flat filled ellipse in the XZ plane facing +Y
    pub fn ellipse_disc(radius_x: f32, radius_z: f32, segments: u32, color: [f32; 4]) -> Mesh {
        let segments = segments.max(3);
        let mut mesh = Mesh::empty();
        mesh.vertices.push(Vertex { pos: [0.0, 0.0, 0.0], normal: [0.0, 1.0, 0.0], color });
        for i in 0..segments {
            let a = i as f32 / segments as f32 * std::f32::consts::TAU;
            mesh.vertices.push(Vertex {
                pos: [radius_x * a.cos(), 0.0, radius_z * a.sin()],
                normal: [0.0, 1.0, 0.0],
                color,
            });
        }
        for i in 0..segments {
            mesh.indices.extend_from_slice(&[0, 1 + (i + 1) % segments, 1 + i]);
        }
        mesh
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {

        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}
