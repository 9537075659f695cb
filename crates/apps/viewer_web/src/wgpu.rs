#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use wasm_bindgen::prelude::*;

    use crate::scene::{ArcVertex, FlatVertex, Globals, SceneData};

    #[derive(Debug)]
    pub struct GpuMesh {
        pub buffer: ::wgpu::Buffer,
        pub vertex_count: u32,
    }

    #[derive(Debug)]
    pub struct WgpuContext {
        // Declared before `_instance` so the surface is dropped first.
        pub surface: ::wgpu::Surface<'static>,
        pub _instance: ::wgpu::Instance,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub clear_color: ::wgpu::Color,
        pub shadow_pipeline: ::wgpu::RenderPipeline,
        pub fill_pipeline: ::wgpu::RenderPipeline,
        pub outline_pipeline: ::wgpu::RenderPipeline,
        pub arc_pipeline: ::wgpu::RenderPipeline,
        pub uniform_buffer: ::wgpu::Buffer,
        pub uniform_bind_group: ::wgpu::BindGroup,
        pub depth_texture: ::wgpu::Texture,
        pub depth_view: ::wgpu::TextureView,
        pub shadow: GpuMesh,
        pub fill: GpuMesh,
        pub outline: GpuMesh,
        pub arc: GpuMesh,
    }

    const MAP_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    land: vec4<f32>,
    shadow: vec4<f32>,
    coastline: vec4<f32>,
    arc: vec4<f32>,
    // x = glow time, y = lead, z = trail
    glow: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@vertex
fn vs_flat(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_shadow() -> @location(0) vec4<f32> {
    return globals.shadow;
}

@fragment
fn fs_land() -> @location(0) vec4<f32> {
    return globals.land;
}

@fragment
fn fs_coastline() -> @location(0) vec4<f32> {
    return globals.coastline;
}

struct ArcOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) progress: f32,
};

@vertex
fn vs_arc(@location(0) position: vec3<f32>, @location(1) progress: f32) -> ArcOut {
    return ArcOut(globals.view_proj * vec4<f32>(position, 1.0), progress);
}

@fragment
fn fs_arc(fs_in: ArcOut) -> @location(0) vec4<f32> {
    // Travelling glow: fade in just behind the head, fade out along the tail.
    let t = globals.glow.x;
    let rise = smoothstep(t - globals.glow.y, t, fs_in.progress);
    let fall = 1.0 - smoothstep(t, t + globals.glow.z, fs_in.progress);
    return vec4<f32>(globals.arc.rgb, globals.arc.a * rise * fall);
}
"#;

    const DEPTH_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Depth24Plus;

    fn create_depth_target(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> (::wgpu::Texture, ::wgpu::TextureView) {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("map-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = tex.create_view(&::wgpu::TextureViewDescriptor::default());
        (tex, view)
    }

    /// Empty meshes still get a one-vertex buffer so binding never sees size 0.
    fn create_mesh<T: bytemuck::Pod + bytemuck::Zeroable>(
        device: &::wgpu::Device,
        label: &str,
        vertices: &[T],
    ) -> GpuMesh {
        let placeholder = [T::zeroed()];
        let contents: &[T] = if vertices.is_empty() {
            &placeholder
        } else {
            vertices
        };
        let buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        GpuMesh {
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    struct PipelineSpec<'a> {
        label: &'a str,
        vs_entry: &'a str,
        fs_entry: &'a str,
        buffer: ::wgpu::VertexBufferLayout<'a>,
        topology: ::wgpu::PrimitiveTopology,
        blend: ::wgpu::BlendState,
        depth_write: bool,
    }

    fn create_pipeline(
        device: &::wgpu::Device,
        layout: &::wgpu::PipelineLayout,
        module: &::wgpu::ShaderModule,
        format: ::wgpu::TextureFormat,
        spec: PipelineSpec<'_>,
    ) -> ::wgpu::RenderPipeline {
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(layout),
            vertex: ::wgpu::VertexState {
                module,
                entry_point: Some(spec.vs_entry),
                compilation_options: Default::default(),
                buffers: &[spec.buffer],
            },
            fragment: Some(::wgpu::FragmentState {
                module,
                entry_point: Some(spec.fs_entry),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(spec.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: spec.topology,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                // Ring winding in the dataset is not guaranteed.
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: spec.depth_write,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    const FLAT_ATTRIBUTES: [::wgpu::VertexAttribute; 1] = [::wgpu::VertexAttribute {
        format: ::wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }];

    const ARC_ATTRIBUTES: [::wgpu::VertexAttribute; 2] = [
        ::wgpu::VertexAttribute {
            format: ::wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        ::wgpu::VertexAttribute {
            format: ::wgpu::VertexFormat::Float32,
            offset: 12,
            shader_location: 1,
        },
    ];

    fn flat_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FlatVertex>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &FLAT_ATTRIBUTES,
        }
    }

    pub async fn init_wgpu_for_canvas(
        canvas: web_sys::HtmlCanvasElement,
        width: u32,
        height: u32,
        scene: &SceneData,
        background: [f32; 4],
    ) -> Result<WgpuContext, JsValue> {
        // Prefer WebGPU when available, but allow WebGL as a fallback.
        let instance = ::wgpu::Instance::new(&::wgpu::InstanceDescriptor {
            backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("map-wgpu-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let (depth_texture, depth_view) = create_depth_target(&device, &config);

        let shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("map-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(MAP_SHADER)),
        });

        let uniform_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("map-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("map-globals-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("map-globals-bg"),
            layout: &uniform_bind_group_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("map-pipeline-layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            immediate_size: 0,
        });

        let shadow_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineSpec {
                label: "map-shadow-pipeline",
                vs_entry: "vs_flat",
                fs_entry: "fs_shadow",
                buffer: flat_layout(),
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
        );

        let fill_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineSpec {
                label: "map-land-pipeline",
                vs_entry: "vs_flat",
                fs_entry: "fs_land",
                buffer: flat_layout(),
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );

        let outline_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineSpec {
                label: "map-coastline-pipeline",
                vs_entry: "vs_flat",
                fs_entry: "fs_coastline",
                buffer: flat_layout(),
                topology: ::wgpu::PrimitiveTopology::LineList,
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
        );

        let arc_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineSpec {
                label: "map-arc-pipeline",
                vs_entry: "vs_arc",
                fs_entry: "fs_arc",
                buffer: ::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ArcVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &ARC_ATTRIBUTES,
                },
                topology: ::wgpu::PrimitiveTopology::LineStrip,
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                // Transparent tail must not hide anything drawn later.
                depth_write: false,
            },
        );

        let shadow = create_mesh(&device, "map-shadow-vertices", &scene.shadow);
        let fill = create_mesh(&device, "map-land-vertices", &scene.fill);
        let outline = create_mesh(&device, "map-coastline-vertices", &scene.outline);
        let arc = create_mesh(&device, "map-arc-vertices", &scene.arc);

        // Initialize uniforms so the first render doesn't read uninitialized memory.
        queue.write_buffer(
            &uniform_buffer,
            0,
            bytemuck::bytes_of(&<Globals as bytemuck::Zeroable>::zeroed()),
        );

        let [r, g, b, a] = background.map(f64::from);
        Ok(WgpuContext {
            surface,
            _instance: instance,
            device,
            queue,
            config,
            clear_color: ::wgpu::Color { r, g, b, a },
            shadow_pipeline,
            fill_pipeline,
            outline_pipeline,
            arc_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_texture,
            depth_view,
            shadow,
            fill,
            outline,
            arc,
        })
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_texture.destroy();
        let (depth_texture, depth_view) = create_depth_target(&ctx.device, &ctx.config);
        ctx.depth_texture = depth_texture;
        ctx.depth_view = depth_view;
    }

    pub fn render_map(ctx: &WgpuContext, globals: &Globals) -> Result<(), JsValue> {
        let frame = match ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(::wgpu::SurfaceError::Outdated | ::wgpu::SurfaceError::Lost) => {
                // Skip this frame; the next one draws into the reconfigured surface.
                ctx.surface.configure(&ctx.device, &ctx.config);
                return Ok(());
            }
            Err(e) => return Err(JsValue::from_str(&format!("surface acquire failed: {e}"))),
        };
        let view = frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        ctx.queue
            .write_buffer(&ctx.uniform_buffer, 0, bytemuck::bytes_of(globals));

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("map-encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("map-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(ctx.clear_color),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &ctx.uniform_bind_group, &[]);

            // Back to front: shadow, land, coastline, arc.
            for (pipeline, mesh) in [
                (&ctx.shadow_pipeline, &ctx.shadow),
                (&ctx.fill_pipeline, &ctx.fill),
                (&ctx.outline_pipeline, &ctx.outline),
                (&ctx.arc_pipeline, &ctx.arc),
            ] {
                if mesh.vertex_count == 0 {
                    continue;
                }
                rpass.set_pipeline(pipeline);
                rpass.set_vertex_buffer(0, mesh.buffer.slice(..));
                rpass.draw(0..mesh.vertex_count, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Frees GPU memory now instead of waiting for the context to be dropped.
    pub fn release_wgpu(ctx: WgpuContext) {
        for mesh in [&ctx.shadow, &ctx.fill, &ctx.outline, &ctx.arc] {
            mesh.buffer.destroy();
        }
        ctx.uniform_buffer.destroy();
        ctx.depth_texture.destroy();
        ctx.device.destroy();
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use wasm_bindgen::prelude::JsValue;

    use crate::scene::{Globals, SceneData};

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_for_canvas(
        _canvas: web_sys::HtmlCanvasElement,
        _width: u32,
        _height: u32,
        _scene: &SceneData,
        _background: [f32; 4],
    ) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn render_map(_ctx: &WgpuContext, _globals: &Globals) -> Result<(), JsValue> {
        Err(JsValue::from_str(
            "wgpu rendering is only available on wasm32 targets",
        ))
    }

    pub fn release_wgpu(_ctx: WgpuContext) {}
}

pub use imp::{WgpuContext, init_wgpu_for_canvas, release_wgpu, render_map, resize_wgpu};
