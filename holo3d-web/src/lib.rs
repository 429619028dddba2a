/// Holo3D Web - WASM bindings for the holographic stage
///
/// JavaScript owns the canvas blit, the asset fetch (and its progress
/// events), and the window-resize subscription; this module owns the
/// presentation state and rasterizes each frame into an RGBA buffer read
/// through `frame_ptr`/`frame_len`.

use std::time::Duration;

use wasm_bindgen::prelude::*;

use holo3d_core::{
    parse_glb,
    typewriter::{CHAR_DELAY, LINE_PAUSE},
    FrameBuffer, LoadEvent, Scene, Typewriter,
};

/// The script revealed over the spinning model
const SCRIPT: [&str; 3] = [
    "We're building the next generation of open hardware.",
    "We're looking for engineers who want to shape it.",
    "Join us.",
];

/// Emissive blueprint-blue tint for dim pixels, blended toward white
const TINT: [f32; 3] = [66.0 / 255.0, 135.0 / 255.0, 245.0 / 255.0];

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[wasm_bindgen]
pub struct WebStage {
    scene: Scene,
    typewriter: Typewriter,
    frame: FrameBuffer,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl WebStage {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> WebStage {
        WebStage {
            scene: Scene::new(width, height),
            typewriter: Typewriter::new(SCRIPT, CHAR_DELAY, LINE_PAUSE),
            frame: FrameBuffer::new(width as usize, height as usize),
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Track a viewport resize; the camera aspect and the output surface
    /// follow on the next tick.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.resize(width, height);
        self.frame.resize(width as usize, height as usize);
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize * 4, 0);
    }

    /// Feed the fetched asset bytes. Returns true when the model staged;
    /// a failure is logged and the empty stage keeps rendering.
    pub fn load_model(&mut self, bytes: &[u8]) -> bool {
        let event = match parse_glb(bytes) {
            Ok(model) => LoadEvent::Loaded(model),
            Err(error) => LoadEvent::Failed(error),
        };
        let staged = matches!(event, LoadEvent::Loaded(_));
        self.scene.ingest(event);
        staged
    }

    /// Report fetch progress (fraction in [0, 1]) from JavaScript
    pub fn load_progress(&mut self, fraction: f32) {
        self.scene.ingest(LoadEvent::Progress(fraction));
    }

    /// Advance and rasterize one frame. `elapsed_ms` is the time since
    /// mount, as handed to the requestAnimationFrame callback.
    pub fn tick(&mut self, elapsed_ms: f64) {
        self.typewriter.poll(Duration::from_millis(elapsed_ms as u64));
        self.scene.advance();
        self.scene.render_into(&mut self.frame);
        self.encode_pixels();
    }

    /// The revealed script text, for the DOM overlay
    pub fn text(&self) -> String {
        self.typewriter.text().to_string()
    }

    pub fn caret_visible(&self, elapsed_ms: f64) -> bool {
        self.typewriter
            .caret_visible(Duration::from_millis(elapsed_ms as u64))
    }

    pub fn frame_ptr(&self) -> *const u8 {
        self.pixels.as_ptr()
    }

    pub fn frame_len(&self) -> usize {
        self.pixels.len()
    }

    pub fn width(&self) -> u32 {
        self.frame.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.frame.height() as u32
    }

    /// Intensity to premultiplied-feeling RGBA: tint blends toward white
    /// as pixels brighten, alpha scales with intensity so the page shows
    /// through the empty regions.
    fn encode_pixels(&mut self) {
        for (i, &value) in self.frame.pixels().iter().enumerate() {
            let t = value.clamp(0.0, 1.0);
            let rgba = [
                (lerp(TINT[0], 1.0, t) * 255.0) as u8,
                (lerp(TINT[1], 1.0, t) * 255.0) as u8,
                (lerp(TINT[2], 1.0, t) * 255.0) as u8,
                (t * 255.0) as u8,
            ];
            self.pixels[i * 4..i * 4 + 4].copy_from_slice(&rgba);
        }
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    Ok(())
}
