// SPDX-License-Identifier: MPL-2.0

//! A free-look viewer: a spinning checkerboard cube with an orbiting moon, a crosshair, and
//! optionally an OBJ model given as the first argument.
//!
//! WASD moves, space and shift rise and sink, the mouse looks around and the wheel zooms. Escape
//! quits.

use std::{env, path::PathBuf};

use anyhow::Context as _;
use limited_engine::{linear::Vec3, *};
use winit::{
    dpi::PhysicalSize,
    event::{
        DeviceEvent, ElementState, Event, KeyboardInput, MouseScrollDelta, VirtualKeyCode,
        WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

/// Pixels of trackpad scrolling per line of wheel scrolling.
const PIXELS_PER_LINE: f32 = 20.0;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let event_loop = EventLoop::new();
    let window = create_window(&event_loop)?;
    let mut renderer = create_renderer(&window)?;
    let mut scene = create_scene(&mut renderer, env::args_os().nth(1).map(PathBuf::from))?;

    let mut input = InputState::new();
    let mut clock = FrameClock::new();
    let mut fps = fps_counter::FPSCounter::new();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => renderer.resize_surface(size.width, size.height),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    renderer.resize_surface(new_inner_size.width, new_inner_size.height);
                }
                WindowEvent::Focused(false) => input.clear(),
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            virtual_keycode: Some(key),
                            state,
                            ..
                        },
                    ..
                } => {
                    if key == VirtualKeyCode::Escape {
                        *control_flow = ControlFlow::Exit;
                    } else if let Some(movement) = movement_for(key) {
                        match state {
                            ElementState::Pressed => input.press(movement),
                            ElementState::Released => input.release(movement),
                        }
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => input.scrolled(match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                }),
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta: (dx, dy) },
                ..
            } => input.pointer_moved(dx as f32, dy as f32),
            Event::MainEventsCleared => window.request_redraw(),
            Event::RedrawRequested(_) => {
                let frame = clock.tick(renderer.viewport());
                scene.update(&input.take_frame(), &frame);

                if let Err(e) = renderer.render(&scene) {
                    tracing::error!("Failed to render: {}", e);
                    *control_flow = ControlFlow::Exit;
                }

                let rate = fps.tick();
                if frame.frame_index % 300 == 0 {
                    tracing::info!("{} FPS", rate);
                }
            }
            _ => {}
        }
    })
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();
}

fn create_window(event_loop: &EventLoop<()>) -> anyhow::Result<Window> {
    let window = WindowBuilder::new()
        .with_title("Viewer")
        .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .build(event_loop)
        .context("failed to create window")?;

    if let Err(e) = window.set_cursor_grab(true) {
        tracing::warn!("Could not grab the cursor: {}", e);
    }
    window.set_cursor_visible(false);

    Ok(window)
}

fn create_renderer(window: &Window) -> anyhow::Result<Renderer> {
    let size = window.inner_size();

    // SAFETY: the window is moved into the event loop alongside the renderer, and the event loop
    // never returns.
    let renderer = pollster::block_on(unsafe {
        Renderer::new(window, wgpu::Backends::all(), size.width, size.height)
    })?;

    Ok(renderer)
}

fn create_scene(renderer: &mut Renderer, obj_path: Option<PathBuf>) -> anyhow::Result<Scene> {
    let object_shader = pollster::block_on(renderer.create_shader(&ShaderDescriptor::object()))?;
    let overlay_shader = pollster::block_on(renderer.create_shader(&ShaderDescriptor::overlay()))?;

    let checkerboard = renderer.upload_texture(
        &TextureData::checkerboard(64, 8, [230, 230, 230, 255], [60, 60, 60, 255]),
        Filtering::Nearest,
    );
    let cube_mesh = renderer.upload_mesh(&Mesh::cube());
    let crosshair_mesh = renderer.upload_mesh(&Mesh::crosshair());

    let mut scene = Scene::new(Camera::new(
        Vec3::new(0.0, 0.0, 3.0),
        CameraConfig::default(),
        Frustum::default(),
    ));

    let cube = scene.spawn("cube", None)?;
    scene
        .entity_mut(cube)
        .context("cube was just spawned")?
        .add_component(Spin::new(Vec3::new(0.5, 1.0, 0.0), 50.0))
        .add_component(Render3d::new(
            cube_mesh,
            Material::new(object_shader, Some(checkerboard)),
        ));

    let moon = scene.spawn("moon", Some(cube))?;
    let transform = scene.transform_mut(moon).context("moon was just spawned")?;
    transform.set_position(Vec3::new(1.5, 0.0, 0.0));
    transform.set_scale(Vec3::splat(0.3));
    scene
        .entity_mut(moon)
        .context("moon was just spawned")?
        .add_component(Render3d::new(cube_mesh, Material::new(object_shader, None)));

    if let Some(path) = obj_path {
        let mesh = Mesh::load_obj(&path)?;
        let model_mesh = renderer.upload_mesh(&mesh);

        let model = scene.spawn("model", None)?;
        scene
            .transform_mut(model)
            .context("model was just spawned")?
            .set_position(Vec3::new(0.0, 0.0, -4.0));
        scene
            .entity_mut(model)
            .context("model was just spawned")?
            .add_component(Render3d::new(model_mesh, Material::new(object_shader, None)));
    }

    let mut crosshair_material = Material::new(overlay_shader, None);
    crosshair_material.set_uniform("color", Vec3::ONE);
    let crosshair = scene.spawn("crosshair", None)?;
    scene
        .entity_mut(crosshair)
        .context("crosshair was just spawned")?
        .add_component(Render2d::new(crosshair_mesh, crosshair_material));

    Ok(scene)
}

fn movement_for(key: VirtualKeyCode) -> Option<Movement> {
    match key {
        VirtualKeyCode::W => Some(Movement::Forward),
        VirtualKeyCode::S => Some(Movement::Backward),
        VirtualKeyCode::A => Some(Movement::Left),
        VirtualKeyCode::D => Some(Movement::Right),
        VirtualKeyCode::Space => Some(Movement::Up),
        VirtualKeyCode::LShift => Some(Movement::Down),
        _ => None,
    }
}
