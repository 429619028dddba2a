/// Terminal front end for the holographic stage
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

use holo3d_core::{
    typewriter::{CHAR_DELAY, LINE_PAUSE},
    FrameBuffer, LoadEvent, Model, ModelLoader, Scene, Typewriter,
};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Main application struct for the terminal stage
pub struct StageApp {
    scene: Scene,
    typewriter: Typewriter,
    loader: Option<ModelLoader>,
    frame: FrameBuffer,
    renderer: AsciiRenderer,
    running: bool,
    started: Instant,
    last_frame: Instant,
    frame_count: u32,
}

impl StageApp {
    pub fn new(script: &[&str], loader: Option<ModelLoader>) -> io::Result<Self> {
        let (width, height) = terminal::size()?;

        Ok(Self {
            scene: Scene::new(width as u32, height as u32),
            typewriter: Typewriter::new(script, CHAR_DELAY, LINE_PAUSE),
            loader,
            frame: FrameBuffer::new(width as usize, height as usize),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            started: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
        })
    }

    /// Put a model on the stage directly, bypassing the asset loader
    pub fn stage_model(&mut self, model: Model) {
        self.scene.stage(model);
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input and resize events
            if event::poll(Duration::from_millis(0))? {
                self.handle_event()?;
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                let fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                log::debug!("stage running at {fps:.1} fps");
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                _ => {}
            },
            Event::Resize(width, height) => {
                self.scene.resize(width as u32, height as u32);
                self.frame.resize(width as usize, height as usize);
                self.renderer.resize(width as usize, height as usize);
            }
            _ => {}
        }
        Ok(())
    }

    fn update(&mut self) {
        // Fold in load outcomes; drop the loader once it has delivered its
        // terminal event.
        if let Some(loader) = &self.loader {
            let events = loader.poll();
            let finished = events
                .iter()
                .any(|e| !matches!(e, LoadEvent::Progress(_)));
            for event in events {
                self.scene.ingest(event);
            }
            if finished {
                self.loader = None;
            }
        }

        self.scene.advance();
        self.typewriter.poll(self.started.elapsed());
    }

    fn render(&mut self) -> io::Result<()> {
        self.scene.render_into(&mut self.frame);

        self.renderer.compose(&self.frame);
        self.renderer.overlay_script(
            self.typewriter.text(),
            self.typewriter.caret_visible(self.started.elapsed()),
        );

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;
        stdout.flush()?;
        Ok(())
    }
}
