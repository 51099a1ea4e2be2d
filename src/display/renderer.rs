//! Rendu wgpu: téléversement de la trame et blit vers la fenêtre

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use log::debug;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use wgpu::*;
use winit::window::Window;

use super::{DisplayBackend, DisplayFactory, DisplayMode, FrameBuffer};
use crate::error::FrontendError;

/// Paramètres du shader de blit (mise à l'échelle avec bandes noires)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BlitParams {
    scale: [f32; 2],
    _pad: [f32; 2],
}

impl BlitParams {
    fn letterbox(frame: (u32, u32), surface: (u32, u32)) -> Self {
        let (fw, fh) = (frame.0 as f32, frame.1 as f32);
        let (sw, sh) = (surface.0.max(1) as f32, surface.1.max(1) as f32);
        let factor = (sw / fw).min(sh / fh);
        Self {
            scale: [fw * factor / sw, fh * factor / sh],
            _pad: [0.0; 2],
        }
    }
}

/// Affichage wgpu vers une fenêtre winit
pub struct WgpuDisplay {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    surface_config: SurfaceConfiguration,
    pipeline: RenderPipeline,
    bind_group: BindGroup,
    frame_texture: Texture,
    params_buffer: Buffer,
    frame: FrameBuffer,
    mode: DisplayMode,
}

fn unavailable(e: impl std::fmt::Display) -> FrontendError {
    FrontendError::DisplayBackendUnavailable(e.to_string())
}

impl WgpuDisplay {
    /// Initialise la surface. Le mode logiciel force l'adaptateur de repli.
    pub async fn new(
        window: Arc<Window>,
        mode: DisplayMode,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self, FrontendError> {
        let size = window.inner_size();

        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            dx12_shader_compiler: Dx12Compiler::Fxc,
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let surface = instance.create_surface(window).map_err(unavailable)?;

        let software = mode == DisplayMode::Software;
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: if software {
                    PowerPreference::LowPower
                } else {
                    PowerPreference::HighPerformance
                },
                compatible_surface: Some(&surface),
                force_fallback_adapter: software,
            })
            .await
            .ok_or_else(|| unavailable("aucun adaptateur graphique compatible"))?;

        debug!("Adaptateur {} retenu: {:?}", mode, adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Display Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(unavailable)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| unavailable("surface sans format utilisable"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                PresentMode::AutoVsync
            } else {
                PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let frame_texture = device.create_texture(&TextureDescriptor {
            label: Some("Frame Texture"),
            size: Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let frame_view = frame_texture.create_view(&TextureViewDescriptor::default());

        // Mise à l'échelle lissée en accéléré, pixels nets en logiciel
        let filter = if software { FilterMode::Nearest } else { FilterMode::Linear };
        let sampler = device.create_sampler(&SamplerDescriptor {
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: FilterMode::Nearest,
            ..Default::default()
        });

        let params = BlitParams::letterbox((width, height), (surface_config.width, surface_config.height));
        let params_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("Blit Params"),
            contents: bytemuck::bytes_of(&params),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        view_dimension: TextureViewDimension::D2,
                        sample_type: TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::VERTEX,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some("Blit Bind Group Layout"),
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&frame_view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&sampler),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
            label: Some("Blit Bind Group"),
        });

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(ColorTargetState {
                    format: surface_config.format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            pipeline,
            bind_group,
            frame_texture,
            params_buffer,
            frame: FrameBuffer::new(width, height),
            mode,
        })
    }

    fn upload_frame(&self) {
        self.queue.write_texture(
            ImageCopyTexture {
                texture: &self.frame_texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            self.frame.as_bytes(),
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.frame.stride()),
                rows_per_image: Some(self.frame.height),
            },
            Extent3d {
                width: self.frame.width,
                height: self.frame.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl DisplayBackend for WgpuDisplay {
    fn frame_buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    fn present(&mut self) -> Result<()> {
        self.upload_frame();

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (SurfaceError::Lost | SurfaceError::Outdated)) => {
                // La trame suivante utilisera la surface reconfigurée
                self.surface.configure(&self.device, &self.surface_config);
                debug!("Surface reconfigurée");
                return Err(anyhow!("Trame sautée: {}", e));
            }
            Err(e) => return Err(anyhow!("Surface indisponible: {}", e)),
        };
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Blit Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.frame.clear();
        self.present()
    }

    fn mode(&self) -> DisplayMode {
        self.mode
    }

    fn name(&self) -> &'static str {
        match self.mode {
            DisplayMode::Accelerated => "wgpu",
            DisplayMode::Software => "wgpu-fallback",
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            let params = BlitParams::letterbox((self.frame.width, self.frame.height), (width, height));
            self.queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
        }
    }
}

/// Fabrique des affichages wgpu pour une fenêtre
pub struct WindowDisplayFactory {
    window: Arc<Window>,
    width: u32,
    height: u32,
    vsync: bool,
}

impl WindowDisplayFactory {
    pub fn new(window: Arc<Window>, width: u32, height: u32, vsync: bool) -> Self {
        Self { window, width, height, vsync }
    }
}

impl DisplayFactory for WindowDisplayFactory {
    fn create(&mut self, mode: DisplayMode) -> Result<Box<dyn DisplayBackend>, FrontendError> {
        let display = pollster::block_on(WgpuDisplay::new(
            self.window.clone(),
            mode,
            self.width,
            self.height,
            self.vsync,
        ))?;
        Ok(Box::new(display))
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_wide_window() {
        // Fenêtre 2x plus large que le ratio 4:3
        let params = BlitParams::letterbox((320, 240), (1280, 480));
        assert!((params.scale[0] - 0.5).abs() < 1e-6);
        assert!((params.scale[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_letterbox_exact_fit() {
        let params = BlitParams::letterbox((320, 240), (640, 480));
        assert_eq!(params.scale, [1.0, 1.0]);
    }

    #[test]
    fn test_letterbox_degenerate_surface() {
        let params = BlitParams::letterbox((320, 240), (0, 0));
        assert!(params.scale.iter().all(|s| s.is_finite()));
    }
}
