// SPDX-License-Identifier: MPL-2.0

mod render;

use raw_window_handle::HasRawWindowHandle;
use wgpu::{*, util::DeviceExt as _};

use crate::{
    component::DrawItem,
    error::Error,
    frame::Viewport,
    material::{Material, ShaderId, TextureId},
    mesh::{Mesh, MeshId, Vertex},
    scene::Scene,
    shader::ShaderDescriptor,
    texture::{Filtering, TextureData},
    uniform::UniformLayout,
    Result,
};
use render::{DepthBuffer, Draw, Job, DEPTH_FORMAT};

const PREFERRED_SURFACE_FORMAT: TextureFormat = TextureFormat::Bgra8UnormSrgb;

/// Uniform buffers are never smaller than this.
const MIN_UNIFORM_BUFFER_SIZE: usize = 16;

/// The 3D renderer.
#[derive(Debug)]
pub struct Renderer {
    device: Device,
    queue: Queue,
    surface: Surface,
    surface_config: SurfaceConfiguration,
    depth: DepthBuffer,
    uniform_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    meshes: Vec<GpuMesh>,
    textures: Vec<GpuTexture>,
    shaders: Vec<GpuShader>,
    /// Bound for textured shaders drawn with an untextured material.
    white: GpuTexture,
    /// One per draw item, reused across frames.
    uniform_slots: Vec<UniformSlot>,
    pub clear_color: Color,
}

/// A uniform buffer and the bind group that exposes it.
#[derive(Debug)]
struct UniformSlot {
    buffer: Buffer,
    bind_group: BindGroup,
    capacity: usize,
}

#[derive(Debug)]
struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

#[derive(Debug)]
struct GpuTexture {
    _texture: Texture,
    bind_group: BindGroup,
}

#[derive(Debug)]
struct GpuShader {
    label: String,
    pipeline: RenderPipeline,
    uniforms: UniformLayout,
    textured: bool,
}

impl Renderer {
    /// Creates a new `Renderer`.
    ///
    /// # Safety
    ///
    /// `window` must live for as long as the returned renderer.
    pub async unsafe fn new(
        window: &impl HasRawWindowHandle,
        backends: Backends,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Self> {
        let (adapter, surface) = Self::create_adapter_and_surface(window, backends).await?;
        tracing::info!("Using adapter: {:?}", adapter.get_info());

        let format = Self::choose_surface_format(&surface, &adapter)?;
        let (device, queue) = Self::create_device_and_queue(&adapter).await?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: surface_width.max(1),
            height: surface_height.max(1),
            present_mode: PresentMode::Fifo,
        };
        surface.configure(&device, &surface_config);
        let depth = DepthBuffer::new(&device, surface_config.width, surface_config.height);

        let uniform_layout = Self::create_uniform_bind_group_layout(&device);
        let texture_layout = Self::create_texture_bind_group_layout(&device);
        let white = Self::create_texture(
            &device,
            &queue,
            &texture_layout,
            &TextureData::solid([255, 255, 255, 255]),
            Filtering::Nearest,
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            depth,
            uniform_layout,
            texture_layout,
            meshes: Vec::new(),
            textures: Vec::new(),
            shaders: Vec::new(),
            white,
            uniform_slots: Vec::new(),
            clear_color: Color {
                r: 0.2,
                g: 0.3,
                b: 0.3,
                a: 1.0,
            },
        })
    }

    /// Creates handles to the graphics backend as well as the surface upon which rendering will
    /// take place.
    async fn create_adapter_and_surface(
        window: &impl HasRawWindowHandle,
        backends: Backends,
    ) -> Result<(Adapter, Surface)> {
        let instance = Instance::new(backends);

        // SAFETY: the caller guarantees that `window` is valid and outlives the renderer, and so
        // the surface.
        let surface = unsafe { instance.create_surface(window) };

        instance
            .request_adapter(&RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .ok_or(Error::NoCompatibleAdapterFound)
            .map(|adapter| (adapter, surface))
    }

    fn choose_surface_format(surface: &Surface, adapter: &Adapter) -> Result<TextureFormat> {
        let formats = surface.get_supported_formats(adapter);
        if formats.contains(&PREFERRED_SURFACE_FORMAT) {
            return Ok(PREFERRED_SURFACE_FORMAT);
        }

        let fallback = formats.first().copied().ok_or(Error::NoCompatibleAdapterFound)?;
        tracing::warn!(
            "{:?} is unsupported; falling back to {:?} (available are: {})",
            PREFERRED_SURFACE_FORMAT,
            fallback,
            formats
                .iter()
                .map(|format| format!("{:?}", format))
                .collect::<Vec<String>>()
                .join(", "),
        );

        Ok(fallback)
    }

    /// Creates handles to the logical graphics device as well as the command buffer queue.
    async fn create_device_and_queue(adapter: &Adapter) -> Result<(Device, Queue)> {
        adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Device"),
                    limits: adapter.limits(),
                    features: Features::empty(),
                },
                None,
            )
            .await
            .map_err(|_| Error::NoCompatibleDeviceFound)
    }

    fn create_uniform_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Uniform bind group layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    fn create_texture_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture bind group layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// The size of the surface being rendered to.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.surface_config.width, self.surface_config.height)
    }

    /// Reconfigures the surface and depth buffer. Zero sizes, as reported for minimized windows,
    /// are ignored.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::debug!("Ignoring resize to {}x{}", width, height);
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth = DepthBuffer::new(&self.device, width, height);
    }
}

// Resources.
impl Renderer {
    /// Compiles a shader and builds its pipeline.
    ///
    /// Compilation errors are captured and returned rather than aborting the process.
    pub async fn create_shader(&mut self, descriptor: &ShaderDescriptor) -> Result<ShaderId> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(descriptor.label.as_str()),
            source: ShaderSource::Wgsl(descriptor.source.as_str().into()),
        });
        let pipeline = self.create_pipeline(&module, descriptor);
        if let Some(error) = self.device.pop_error_scope().await {
            return Err(Error::ShaderCompilation {
                label: descriptor.label.clone(),
                message: error.to_string(),
            });
        }
        tracing::info!(
            "Compiled shader '{}' ({} uniform byte(s))",
            descriptor.label,
            descriptor.uniforms.size(),
        );

        self.shaders.push(GpuShader {
            label: descriptor.label.clone(),
            pipeline,
            uniforms: descriptor.uniforms.clone(),
            textured: descriptor.textured,
        });

        Ok(ShaderId(self.shaders.len() - 1))
    }

    fn create_pipeline(
        &self,
        module: &ShaderModule,
        descriptor: &ShaderDescriptor,
    ) -> RenderPipeline {
        let mut bind_group_layouts = vec![&self.uniform_layout];
        if descriptor.textured {
            bind_group_layouts.push(&self.texture_layout);
        }
        let layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(descriptor.label.as_str()),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(descriptor.label.as_str()),
            layout: Some(&layout),
            vertex: VertexState {
                module,
                entry_point: &descriptor.vertex_entry,
                buffers: &[VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                        3 => Float32x3,
                    ],
                }],
            },
            fragment: Some(FragmentState {
                module,
                entry_point: &descriptor.fragment_entry,
                targets: &[Some(ColorTargetState {
                    format: self.surface_config.format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // The pass always has a depth attachment, so overlays disable the test rather than
            // omitting the state.
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: descriptor.depth_test,
                depth_compare: if descriptor.depth_test {
                    CompareFunction::Less
                } else {
                    CompareFunction::Always
                },
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
        })
    }

    pub fn upload_mesh(&mut self, mesh: &Mesh) -> MeshId {
        tracing::debug!(
            "Uploading mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count(),
        );
        self.meshes.push(GpuMesh {
            vertex_buffer: self.create_buffer(&mesh.vertices, BufferUsages::VERTEX),
            index_buffer: self.create_buffer(&mesh.indices, BufferUsages::INDEX),
            index_count: (3 * mesh.triangle_count()) as u32,
        });

        MeshId(self.meshes.len() - 1)
    }

    pub fn upload_texture(&mut self, data: &TextureData, filtering: Filtering) -> TextureId {
        let texture = Self::create_texture(
            &self.device,
            &self.queue,
            &self.texture_layout,
            data,
            filtering,
        );
        self.textures.push(texture);

        TextureId(self.textures.len() - 1)
    }

    fn create_texture(
        device: &Device,
        queue: &Queue,
        layout: &BindGroupLayout,
        data: &TextureData,
        filtering: Filtering,
    ) -> GpuTexture {
        let (width, height) = (data.width.max(1), data.height.max(1));
        let expected = width as usize * height as usize * 4;
        let mut pixels = std::borrow::Cow::Borrowed(data.pixels.as_slice());
        if pixels.len() != expected {
            tracing::warn!(
                "Texture data holds {} byte(s) but {}x{} RGBA needs {}; padding or truncating",
                pixels.len(),
                width,
                height,
                expected,
            );
            pixels.to_mut().resize(expected, 0);
        }

        let texture = device.create_texture_with_data(
            queue,
            &TextureDescriptor {
                label: Some("Texture"),
                size: Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: TextureFormat::Rgba8UnormSrgb,
                usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            },
            &pixels,
        );
        let view = texture.create_view(&TextureViewDescriptor::default());

        let filter = match filtering {
            Filtering::Nearest => FilterMode::Nearest,
            Filtering::Linear => FilterMode::Linear,
        };
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("Texture sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("Texture bind group"),
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&sampler),
                },
            ],
        });

        GpuTexture {
            _texture: texture,
            bind_group,
        }
    }

    fn create_buffer<T>(&self, slice: &[T], usage: BufferUsages) -> Buffer
    where
        T: bytemuck::Pod,
    {
        self.device.create_buffer_init(&util::BufferInitDescriptor {
            label: None,
            contents: bytemuck::cast_slice(slice),
            usage,
        })
    }
}

// Rendering.
impl Renderer {
    /// Draws every item in the scene's [draw list](Scene::draw_list).
    ///
    /// A lost or outdated surface is reconfigured and the frame is skipped.
    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        let items = scene.draw_list();
        tracing::debug!("Rendering {} draw item(s)...", items.len());

        self.write_uniforms(&items)?;
        let draws = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.prepare_draw(index, item))
            .collect::<Result<Vec<Draw>>>()?;

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                tracing::warn!("Surface lost or outdated; reconfiguring and skipping the frame");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(Error::Surface(e)),
        };

        let mut job = Job::new(frame, &self.device);
        {
            let mut pass = job.begin_pass(&self.depth, self.clear_color);
            for draw in &draws {
                pass.draw(draw);
            }
        }
        job.submit(&self.queue);

        Ok(())
    }

    /// Packs each item's uniforms into its slot, growing the slot list as needed.
    fn write_uniforms(&mut self, items: &[DrawItem<'_>]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            let shader = self
                .shaders
                .get(item.material.shader.0)
                .ok_or(Error::UnknownResource("shader"))?;
            let bytes = uniform_bytes(&shader.uniforms, item.material)?;

            let reusable = self
                .uniform_slots
                .get(index)
                .map_or(false, |slot| slot_fits(slot.capacity, bytes.len()));
            if !reusable {
                let slot = self.create_uniform_slot(bytes.len());
                if index < self.uniform_slots.len() {
                    self.uniform_slots[index] = slot;
                } else {
                    self.uniform_slots.push(slot);
                }
            }

            self.queue.write_buffer(&self.uniform_slots[index].buffer, 0, &bytes);
        }

        Ok(())
    }

    fn create_uniform_slot(&self, capacity: usize) -> UniformSlot {
        tracing::debug!("Creating a {}-byte uniform buffer", capacity);

        let buffer = self.device.create_buffer(&BufferDescriptor {
            label: Some("Uniform buffer"),
            size: capacity as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("Uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        UniformSlot {
            buffer,
            bind_group,
            capacity,
        }
    }

    fn prepare_draw<'r>(&'r self, index: usize, item: &DrawItem<'_>) -> Result<Draw<'r>> {
        let material = item.material;
        let shader = self
            .shaders
            .get(material.shader.0)
            .ok_or(Error::UnknownResource("shader"))?;
        let mesh = self
            .meshes
            .get(item.mesh.0)
            .ok_or(Error::UnknownResource("mesh"))?;

        let texture = if shader.textured {
            let texture = match material.texture {
                Some(id) => self
                    .textures
                    .get(id.0)
                    .ok_or(Error::UnknownResource("texture"))?,
                None => &self.white,
            };
            Some(&texture.bind_group)
        } else {
            None
        };

        let uniforms = self
            .uniform_slots
            .get(index)
            .map(|slot| &slot.bind_group)
            .ok_or(Error::UnknownResource("uniform slot"))?;

        Ok(Draw {
            label: &shader.label,
            pipeline: &shader.pipeline,
            uniforms,
            texture,
            vertex_buffer: &mesh.vertex_buffer,
            index_buffer: &mesh.index_buffer,
            index_count: mesh.index_count,
        })
    }
}

/// The bytes uploaded for a material's uniforms: packed by `layout`, at least
/// [`MIN_UNIFORM_BUFFER_SIZE`] long and a whole number of words.
fn uniform_bytes(layout: &UniformLayout, material: &Material) -> Result<Vec<u8>> {
    let mut bytes = layout.pack(material.uniforms())?;
    let len = ((bytes.len().max(MIN_UNIFORM_BUFFER_SIZE) + 3) / 4) * 4;
    bytes.resize(len, 0);

    Ok(bytes)
}

/// Whether a slot of `capacity` bytes can hold `len` bytes without being rebuilt.
///
/// Oversized slots are kept; the shader only reads its own struct from the start of the buffer.
fn slot_fits(capacity: usize, len: usize) -> bool {
    len <= capacity
}
