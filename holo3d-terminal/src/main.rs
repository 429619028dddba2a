/// Holo3D Terminal Stage
///
/// Renders the holographic showcase in a terminal: a typewriter script over
/// a continuously rotating, translucent model with a wireframe overlay.
/// Controls:
///   - Q/ESC: Quit

use std::io;

use holo3d_core::ModelLoader;
use holo3d_terminal::StageApp;

/// Fixed relative path of the showcase asset
const DEFAULT_MODEL_PATH: &str = "assets/showcase.glb";

/// The script revealed over the spinning model
const SCRIPT: [&str; 3] = [
    "We're building the next generation of open hardware.",
    "We're looking for engineers who want to shape it.",
    "Join us.",
];

fn main() -> io::Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());

    // A missing or malformed asset is logged and the empty stage keeps
    // running, so the loader is spawned unconditionally.
    let loader = ModelLoader::spawn(path);

    let mut app = StageApp::new(&SCRIPT, Some(loader))?;
    app.run()
}
