use wgpu::*;
use wgpu::util::DeviceExt;
use glam::{Mat4, Vec3};

use crate::model::{car, Camera, CarPose, TrackGeometry};
use crate::utils::{rgb, Mesh, MeshBuffer, Vertex};
use crate::view::GpuContext;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const SKY: u32 = 0x87ceeb;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Hemisphere ambient plus one directional sun
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub sky_color: [f32; 3],
    pub hemi_intensity: f32,
    pub ground_color: [f32; 3],
    pub _pad: f32,
}

impl Default for LightingUniform {
    fn default() -> Self {
        let sky = rgb(0xffffff);
        let ground = rgb(0x444444);
        Self {
            sun_dir: Vec3::new(5.0, 10.0, 7.0).normalize().to_array(),
            sun_intensity: 0.8,
            sky_color: [sky[0], sky[1], sky[2]],
            hemi_intensity: 0.6,
            ground_color: [ground[0], ground[1], ground[2]],
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub transform: [[f32; 4]; 4],
}

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("lighting_buffer"),
        contents: bytemuck::bytes_of(&LightingUniform::default()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn create_model_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("model_bind_group_layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    })
}

pub fn create_scene_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    camera_layout: &wgpu::BindGroupLayout,
    model_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader_src = include_str!("shaders/scene.wgsl");
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(shader_src.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[camera_layout, model_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("render_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                    wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
                    wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x4 },
                ],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // procedural parts mix windings; draw both sides
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// A mesh on the GPU with its own model transform
pub struct MeshInstance {
    pub mesh: MeshBuffer,
    pub model_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MeshInstance {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, mesh: &Mesh, label: &str) -> Self {
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&TransformUniform { transform: Mat4::IDENTITY.to_cols_array_2d() }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: model_buffer.as_entire_binding() }],
        });
        Self { mesh: mesh.upload(device), model_buffer, bind_group }
    }

    pub fn set_transform(&self, queue: &Queue, transform: Mat4) {
        let uniform = TransformUniform { transform: transform.to_cols_array_2d() };
        queue.write_buffer(&self.model_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn draw(&self, rp: &mut RenderPass<'_>) {
        if self.mesh.index_count == 0 {
            return;
        }
        rp.set_bind_group(1, &self.bind_group, &[]);
        rp.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        rp.set_index_buffer(self.mesh.index_buffer.slice(..), IndexFormat::Uint32);
        rp.draw_indexed(0..self.mesh.index_count, 0, 0..1);
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Consolidated render state to avoid parameter explosion
pub struct RenderState {
    pub width: u32,
    pub height: u32,

    pub pipeline: RenderPipeline,
    pub camera: CameraResources,
    pub depth_view: TextureView,

    // Scene graph: static world, car body, four wheels
    pub track: MeshInstance,
    pub body: MeshInstance,
    pub wheels: [MeshInstance; 4],

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_full_output: Option<egui::FullOutput>,
    pub egui_dpr: f32,
}

impl RenderState {
    /// Build pipelines and upload every procedural mesh once
    pub fn new(gpu: &GpuContext, track: &TrackGeometry) -> Self {
        let device = gpu.device.as_ref();
        let width = gpu.config.width;
        let height = gpu.config.height;

        let camera = create_camera_resources(device);
        let model_layout = create_model_bind_group_layout(device);
        let pipeline = create_scene_pipeline(device, gpu.format, &camera.bind_group_layout, &model_layout);
        let (_, depth_view) = create_depth_texture(device, width, height);

        let track = MeshInstance::new(device, &model_layout, &track.get_mesh(), "track");
        let body = MeshInstance::new(device, &model_layout, &car::body_mesh(), "car_body");
        let wheel_mesh = car::wheel_mesh();
        let wheels = std::array::from_fn(|i| {
            MeshInstance::new(device, &model_layout, &wheel_mesh, &format!("wheel_{i}"))
        });

        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        Self {
            width,
            height,
            pipeline,
            camera,
            depth_view,
            track,
            body,
            wheels,
            egui_renderer,
            egui_primitives: None,
            egui_full_output: None,
            egui_dpr: 1.0,
        }
    }

    /// Recreate size dependent targets; the surface itself is reconfigured by the caller
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        let (_, depth_view) = create_depth_texture(device, self.width, self.height);
        self.depth_view = depth_view;
    }

    /// Presentation step: push camera and car pose to the GPU
    pub fn update(&self, queue: &Queue, camera: &Camera, pose: &CarPose) {
        let cam = CameraUniform { view_proj: camera.view_proj().to_cols_array_2d() };
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&cam));

        self.body.set_transform(queue, pose.body);
        for (instance, transform) in self.wheels.iter().zip(pose.wheels.iter()) {
            instance.set_transform(queue, *transform);
        }
    }

    pub fn set_ui(&mut self, primitives: Vec<egui::ClippedPrimitive>, full_output: egui::FullOutput, dpr: f32) {
        self.egui_primitives = Some(primitives);
        self.egui_full_output = Some(full_output);
        self.egui_dpr = dpr;
    }

    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
    ) -> Result<(), SurfaceError> {
        let frame = surface.get_current_texture()?;

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        let sky = rgb(SKY);
        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: sky[0] as f64,
                            g: sky[1] as f64,
                            b: sky[2] as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);

            self.track.draw(&mut rp);
            self.body.draw(&mut rp);
            for wheel in &self.wheels {
                wheel.draw(&mut rp);
            }
        }

        if let (Some(egui_primitives), Some(egui_full_output)) = (self.egui_primitives.take(), self.egui_full_output.take()) {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.width, self.height],
                pixels_per_point: self.egui_dpr,
            };

            // Upload egui textures
            for (id, image_delta) in &egui_full_output.textures_delta.set {
                self.egui_renderer
                    .update_texture(device, queue, *id, image_delta);
            }

            // Update egui buffers
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &egui_primitives, &screen_descriptor);

            // Render egui overlay
            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &egui_primitives, &screen_descriptor);
            }

            // Free egui textures
            for id in &egui_full_output.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 48);
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
    }

    #[test]
    fn test_sun_points_down_from_above() {
        let lighting = LightingUniform::default();
        assert!(lighting.sun_dir[1] > 0.0);
        let len = Vec3::from(lighting.sun_dir).length();
        assert!((len - 1.0).abs() < 1e-5);
    }
}
