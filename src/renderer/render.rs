// SPDX-License-Identifier: MPL-2.0

//! One frame's worth of GPU work.

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The depth attachment, sized to match the surface.
#[derive(Debug)]
pub(super) struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    pub(super) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth buffer"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        });
        let view = create_texture_view(&texture, "Depth view", wgpu::TextureAspect::DepthOnly);

        Self {
            _texture: texture,
            view,
        }
    }
}

/// Everything needed to issue one indexed draw.
pub(super) struct Draw<'r> {
    pub(super) label: &'r str,
    pub(super) pipeline: &'r wgpu::RenderPipeline,
    /// Group 0, holding this draw's uniform buffer.
    pub(super) uniforms: &'r wgpu::BindGroup,
    /// Group 1, present only for textured shaders.
    pub(super) texture: Option<&'r wgpu::BindGroup>,
    pub(super) vertex_buffer: &'r wgpu::Buffer,
    pub(super) index_buffer: &'r wgpu::Buffer,
    pub(super) index_count: u32,
}

/// A surface frame and the encoder recording into it.
pub(super) struct Job {
    frame: wgpu::SurfaceTexture,
    frame_view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

impl Job {
    pub(super) fn new(frame: wgpu::SurfaceTexture, device: &wgpu::Device) -> Self {
        Self {
            frame_view: create_texture_view(
                &frame.texture,
                "Frame view",
                wgpu::TextureAspect::All,
            ),
            frame,
            encoder: device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame encoder"),
            }),
        }
    }

    /// Begins the frame's only render pass, clearing color and depth.
    pub(super) fn begin_pass<'a>(
        &'a mut self,
        depth: &'a DepthBuffer,
        clear_color: wgpu::Color,
    ) -> Pass<'a> {
        Pass(self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Frame render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.frame_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: true,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    // In clip space, 1.0 is the maximum depth.
                    load: wgpu::LoadOp::Clear(1.0),
                    store: true,
                }),
                stencil_ops: None,
            }),
        }))
    }

    pub(super) fn submit(self, queue: &wgpu::Queue) {
        queue.submit(Some(self.encoder.finish()));
        self.frame.present();
    }
}

pub(super) struct Pass<'a>(wgpu::RenderPass<'a>);

impl<'a> Pass<'a> {
    pub(super) fn draw(&mut self, draw: &'a Draw<'_>) {
        if draw.index_count == 0 {
            return;
        }
        tracing::debug!("Drawing {} triangles with '{}'...", draw.index_count / 3, draw.label);

        self.0.set_pipeline(draw.pipeline);
        self.0.set_bind_group(0, draw.uniforms, &[]);
        if let Some(texture) = draw.texture {
            self.0.set_bind_group(1, texture, &[]);
        }
        self.0.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
        self.0.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.0.draw_indexed(0..draw.index_count, 0, 0..1);
    }
}

fn create_texture_view(
    texture: &wgpu::Texture,
    label: &str,
    aspect: wgpu::TextureAspect,
) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        aspect,
        ..Default::default()
    })
}
