use crate::shaders;
use bytemuck::{Pod, Zeroable};
use cubefield_common::{Color, ObjectId, Transform};
use cubefield_kernel::{ObjectKind, World, WorldEvent};
use cubefield_render::{PointerLockCamera, Renderer};
use glam::Mat4;
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(transform: &Transform, color: Color) -> Self {
        let cols = transform.to_matrix().to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: color.to_f32_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GroundVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Generate unit cube vertices and indices.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p] },
        Vertex { position: [ p, -p,  p] },
        Vertex { position: [ p,  p,  p] },
        Vertex { position: [-p,  p,  p] },
        // -Z face
        Vertex { position: [ p, -p, -p] },
        Vertex { position: [-p, -p, -p] },
        Vertex { position: [-p,  p, -p] },
        Vertex { position: [ p,  p, -p] },
        // +X face
        Vertex { position: [ p, -p,  p] },
        Vertex { position: [ p, -p, -p] },
        Vertex { position: [ p,  p, -p] },
        Vertex { position: [ p,  p,  p] },
        // -X face
        Vertex { position: [-p, -p, -p] },
        Vertex { position: [-p, -p,  p] },
        Vertex { position: [-p,  p,  p] },
        Vertex { position: [-p,  p, -p] },
        // +Y face
        Vertex { position: [-p,  p,  p] },
        Vertex { position: [ p,  p,  p] },
        Vertex { position: [ p,  p, -p] },
        Vertex { position: [-p,  p, -p] },
        // -Y face
        Vertex { position: [-p, -p, -p] },
        Vertex { position: [ p, -p, -p] },
        Vertex { position: [ p, -p,  p] },
        Vertex { position: [-p, -p,  p] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// Two triangles spanning `size` x `size` in the XZ plane at `y = 0`.
fn ground_mesh(size: f32, color: Color) -> Vec<GroundVertex> {
    let h = size / 2.0;
    let color = color.to_f32_array();
    let corner = |x: f32, z: f32| GroundVertex {
        position: [x, 0.0, z],
        color,
    };
    vec![
        corner(-h, -h),
        corner(-h, h),
        corner(h, h),
        corner(h, h),
        corner(h, -h),
        corner(-h, -h),
    ]
}

/// Objects the renderer has been told about, keyed by id.
///
/// Registration is idempotent per id: a repeated announcement is ignored.
#[derive(Debug, Default)]
struct SceneRegistry {
    ground: Option<(ObjectId, f32, Color)>,
    cube_colors: BTreeMap<ObjectId, Color>,
}

impl SceneRegistry {
    /// Returns `true` if the event added something new.
    fn register(&mut self, event: &WorldEvent) -> bool {
        let WorldEvent::Registered {
            id,
            kind,
            transform,
            color,
        } = event;
        match kind {
            ObjectKind::Ground => {
                if self.ground.is_some_and(|(g, _, _)| g == *id) {
                    return false;
                }
                self.ground = Some((*id, transform.scale.x, *color));
                true
            }
            ObjectKind::Cube => {
                if self.cube_colors.contains_key(id) {
                    return false;
                }
                self.cube_colors.insert(*id, *color);
                true
            }
        }
    }

    /// Instance data for every registered cube, in world order.
    fn instances(&self, world: &World) -> Vec<InstanceData> {
        world
            .cubes()
            .iter()
            .filter_map(|cube| {
                self.cube_colors
                    .get(&cube.id)
                    .map(|color| InstanceData::new(&cube.transform, *color))
            })
            .collect()
    }
}

/// wgpu-based world renderer.
pub struct WgpuRenderer {
    cube_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    ground_vertex_buffer: Option<wgpu::Buffer>,
    ground_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
    registry: SceneRegistry,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_stencil = wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let cube_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cube_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CUBE_SHADER.into()),
        });

        let cube_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cube_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &cube_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            1 => Float32x4,
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &cube_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let ground_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ground_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GROUND_SHADER.into()),
        });

        // The plane is visible from both sides, so no culling.
        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ground_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ground_shader,
                entry_point: Some("vs_ground"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GroundVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &ground_shader,
                entry_point: Some("fs_ground"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        let max_instances = 64u32;
        let instance_buffer = Self::create_instance_buffer(device, max_instances);

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            cube_pipeline,
            ground_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            ground_vertex_buffer: None,
            ground_vertex_count: 0,
            instance_buffer,
            max_instances,
            depth_texture,
            registry: SceneRegistry::default(),
        }
    }

    /// Drain the world's registration events and add each new object to the
    /// GPU scene. Safe to call every frame; with no pending events it does
    /// nothing.
    pub fn sync(&mut self, device: &wgpu::Device, world: &mut World) {
        let events = world.drain_events();
        if events.is_empty() {
            return;
        }

        let mut added = 0usize;
        for event in &events {
            if !self.registry.register(event) {
                continue;
            }
            added += 1;
            let WorldEvent::Registered { kind, .. } = event;
            if *kind == ObjectKind::Ground {
                if let Some((_, size, color)) = self.registry.ground {
                    let verts = ground_mesh(size, color);
                    self.ground_vertex_count = verts.len() as u32;
                    self.ground_vertex_buffer = Some(device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some("ground_vertex_buffer"),
                            contents: bytemuck::cast_slice(&verts),
                            usage: wgpu::BufferUsages::VERTEX,
                        },
                    ));
                }
            }
        }

        let needed = self.registry.cube_colors.len() as u32;
        if needed > self.max_instances {
            self.max_instances = needed.next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.max_instances);
            tracing::debug!("instance buffer grown to {}", self.max_instances);
        }
        tracing::info!(added, cubes = needed, "scene objects registered");
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame: ground plane + spinning cubes.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &PointerLockCamera,
        world: &World,
    ) {
        let vp = camera.view_projection();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: vp.to_cols_array_2d(),
            }),
        );

        let mut instances = self.registry.instances(world);
        instances.truncate(self.max_instances as usize);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(ground) = &self.ground_vertex_buffer {
                pass.set_pipeline(&self.ground_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, ground.slice(..));
                pass.draw(0..self.ground_vertex_count, 0..1);
            }

            if !instances.is_empty() {
                pass.set_pipeline(&self.cube_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.cube_index_count, 0, 0..instances.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (capacity as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// One frame's GPU target, so the frame pipeline can drive the wgpu renderer
/// through the generic [`Renderer`] trait.
pub struct FrameTarget<'a> {
    pub renderer: &'a WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
}

impl Renderer for FrameTarget<'_> {
    type Output = ();

    fn render(&mut self, world: &World, camera: &PointerLockCamera) -> Self::Output {
        self.renderer
            .render(self.device, self.queue, self.view, camera, world);
    }
}
