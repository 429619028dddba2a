/// Example: stage the built-in cube without an asset file
///
/// Usage: cargo run --example cube_stage

use std::io;

use holo3d_core::{Mesh, Model};
use holo3d_terminal::StageApp;

fn main() -> io::Result<()> {
    env_logger::init();

    let mut app = StageApp::new(&["A cube,", "spinning forever."], None)?;
    app.stage_model(Model {
        meshes: vec![Mesh::cube(2.0)],
    });
    app.run()
}
