/// One-shot background model load with progress reporting
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::glb::{parse_glb, AssetError, Model};
use crate::scene::LoadEvent;

const PROGRESS_CHUNK: usize = 64 * 1024;

/// Reads and parses one asset on a worker thread, streaming progress and
/// exactly one terminal event (Loaded or Failed) over a channel.
///
/// Dropping the loader is the cancellation/teardown guard: every later
/// send from the worker fails and is discarded, so a load completing after
/// the owner is gone can never touch scene state.
pub struct ModelLoader {
    rx: Receiver<LoadEvent>,
    #[cfg_attr(not(test), allow(dead_code))]
    handle: JoinHandle<()>,
}

impl ModelLoader {
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = channel();
        let handle = thread::spawn(move || {
            let terminal = match load(&path, &tx) {
                Ok(model) => LoadEvent::Loaded(model),
                Err(error) => LoadEvent::Failed(error),
            };
            let _ = tx.send(terminal);
        });
        Self { rx, handle }
    }

    /// Drain every event delivered since the last poll, without blocking
    pub fn poll(&self) -> Vec<LoadEvent> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    fn into_parts(self) -> (Receiver<LoadEvent>, JoinHandle<()>) {
        (self.rx, self.handle)
    }
}

fn load(path: &Path, events: &Sender<LoadEvent>) -> Result<Model, AssetError> {
    let mut file = File::open(path)?;
    let total = file.metadata()?.len() as usize;

    let mut data = Vec::with_capacity(total);
    let mut buf = [0u8; PROGRESS_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if total > 0 {
            let fraction = (data.len() as f32 / total as f32).min(1.0);
            let _ = events.send(LoadEvent::Progress(fraction));
        }
    }

    parse_glb(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn collect_events(loader: &ModelLoader) -> Vec<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(loader.poll());
            if events
                .iter()
                .any(|e| matches!(e, LoadEvent::Loaded(_) | LoadEvent::Failed(_)))
            {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        events
    }

    fn write_temp_glb(name: &str) -> PathBuf {
        let glb = crate::glb::tests::build_glb(
            crate::glb::tests::single_triangle_doc(),
            &crate::glb::tests::single_triangle_bin(),
        );
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, glb).unwrap();
        path
    }

    #[test]
    fn test_load_success_emits_progress_then_loaded() {
        let path = write_temp_glb("holo3d-loader-success.glb");
        let loader = ModelLoader::spawn(&path);
        let events = collect_events(&loader);

        assert!(events
            .iter()
            .any(|e| matches!(e, LoadEvent::Progress(f) if (*f - 1.0).abs() < 1e-6)));
        let terminal: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, LoadEvent::Loaded(_) | LoadEvent::Failed(_)))
            .collect();
        assert_eq!(terminal.len(), 1);
        assert!(matches!(terminal[0], LoadEvent::Loaded(_)));
    }

    #[test]
    fn test_missing_file_emits_exactly_one_failure() {
        let loader = ModelLoader::spawn("does/not/exist.glb");
        let events = collect_events(&loader);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LoadEvent::Failed(AssetError::Io(_))));
    }

    #[test]
    fn test_malformed_file_fails_without_partial_model() {
        let path = std::env::temp_dir().join("holo3d-loader-malformed.glb");
        std::fs::write(&path, b"definitely not a glb").unwrap();
        let loader = ModelLoader::spawn(&path);
        let events = collect_events(&loader);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Failed(AssetError::BadContainer))
        ));
        assert!(!events.iter().any(|e| matches!(e, LoadEvent::Loaded(_))));
    }

    #[test]
    fn test_completion_after_teardown_mutates_nothing() {
        let path = write_temp_glb("holo3d-loader-teardown.glb");
        let loader = ModelLoader::spawn(&path);
        let (rx, handle) = loader.into_parts();
        // Tear the owner down before the load resolves.
        drop(rx);
        // The worker must finish cleanly with nowhere to deliver.
        handle.join().expect("worker must not panic after teardown");
    }
}
