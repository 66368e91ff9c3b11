mod config;
mod editor;
mod input;
mod mesh_library;

use config::EditorConfig;
use editor::EditorLayer;
use glam::Vec2;
use input::{Key, ViewportInput};
use lumen_render::{headless::HeadlessApi, Renderer};
use std::error::Error;
use tracing_subscriber::EnvFilter;

const FRAMES: u32 = 240;
const DELTA_TIME: f32 = 1.0 / 60.0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api = HeadlessApi::new();
    let log = api.log();
    let mut renderer = Renderer::new(api);
    renderer.init();

    let mut editor = EditorLayer::on_attach(&mut renderer, EditorConfig::default())?;
    editor.log_hierarchy();
    if let Some(player) = editor.find_entity("Player") {
        editor.select(player);
    }

    for frame in 0..FRAMES {
        let input = scripted_input(frame);
        editor.on_update(DELTA_TIME, &input);
        let Some(color) = editor.render_scene(&mut renderer) else {
            tracing::error!("scene framebuffer is gone");
            break;
        };

        if frame % 60 == 0 {
            let stats = renderer.stats();
            let camera = editor.camera();
            tracing::info!(
                frame,
                draw_calls = stats.draw_calls,
                indices = stats.indices,
                texture = color.get(),
                "camera at {:?}, yaw {:.1}, pitch {:.1}, fov {:.1}",
                camera.position(),
                camera.yaw(),
                camera.pitch(),
                camera.zoom()
            );
        }
    }

    if let Some(light) = editor.scene_light_mut() {
        light.intensity = 0.5;
    }
    if let Some(sphere) = editor.find_entity("Sphere") {
        editor.destroy_entity(sphere);
    }
    editor.render_scene(&mut renderer);
    tracing::info!(draw_calls = renderer.stats().draw_calls, "dimmed frame");

    editor.log_hierarchy();
    if let Some(material) = editor.selected().and_then(|entity| editor.material(entity)) {
        tracing::info!(color = ?material.color, "selected entity material");
    }
    editor.clear_selection();

    if let Some(framebuffer) = renderer.device.framebuffer(editor.framebuffer()) {
        tracing::info!(
            width = framebuffer.width(),
            height = framebuffer.height(),
            roots = editor.world().roots().len(),
            "final scene view"
        );
    }
    tracing::info!("{} graphics commands recorded", log.len());

    editor.on_detach(&mut renderer);
    renderer.shutdown();

    Ok(())
}

/// Fly forward, orbit with a right-drag, zoom in, then grow the viewport.
fn scripted_input(frame: u32) -> ViewportInput {
    let mut input = ViewportInput {
        focused: true,
        hovered: true,
        ..Default::default()
    };

    match frame {
        0..=59 => {
            input.held_keys.insert(Key::W);
        }
        60..=119 => {
            input.right_mouse_down = true;
            input.mouse_position = Vec2::new(640.0 + (frame - 60) as f32 * 4.0, 360.0);
        }
        120..=139 => input.scroll = 1.0,
        140..=179 => {
            input.held_keys.insert(Key::E);
        }
        _ => input.size = Vec2::new(1600.0, 900.0),
    }

    input
}
