//! WindowSurface - on-screen window backed by minifb
//!
//! minifb windows are not `Send`, so the window lives on its own UI
//! thread. `show` leaves the converted frame in a single-frame slot that
//! the UI thread drains; if the thread falls behind, older frames are
//! dropped. The window is created lazily at the first frame's size and
//! recreated when the size changes. Pressing `q` or Escape, or closing the window, raises the
//! flag read by [`WindowQuitListener`].

use contracts::{ContractError, DisplaySurface, QuitListener};
use image::RgbImage;
use minifb::{Key, Window, WindowOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace};

use super::slot::FrameSlot;

/// Event pump interval while no frame arrives
const PUMP_INTERVAL: Duration = Duration::from_millis(16);

struct PendingFrame {
    title: String,
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

struct Shared {
    quit: AtomicBool,
    closing: AtomicBool,
    failure: Mutex<Option<String>>,
    frames: FrameSlot<PendingFrame>,
}

impl Shared {
    fn new() -> Self {
        Self {
            quit: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            failure: Mutex::new(None),
            frames: FrameSlot::new(),
        }
    }

    fn fail(&self, message: String) {
        let mut failure = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        failure.get_or_insert(message);
    }

    fn failure(&self) -> Option<String> {
        self.failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Surface drawing frames into a desktop window
pub struct WindowSurface {
    name: String,
    ui_thread: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl WindowSurface {
    /// Start the UI thread; the window itself opens on the first frame
    pub fn new(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let shared = Arc::new(Shared::new());
        let thread_shared = Arc::clone(&shared);

        let ui_thread = thread::Builder::new()
            .name(format!("window-{name}"))
            .spawn(move || ui_loop(&thread_shared))?;

        Ok(Self {
            name,
            ui_thread: Some(ui_thread),
            shared,
        })
    }

    /// Quit listener tied to this window's keyboard
    pub fn quit_listener(&self) -> WindowQuitListener {
        WindowQuitListener {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl DisplaySurface for WindowSurface {
    fn name(&self) -> &str {
        &self.name
    }

    fn show(&mut self, window_name: &str, image: &RgbImage) -> Result<(), ContractError> {
        if let Some(message) = self.shared.failure() {
            return Err(ContractError::display(&self.name, message));
        }
        match &self.ui_thread {
            None => return Err(ContractError::display(&self.name, "window destroyed")),
            Some(handle) if handle.is_finished() => {
                return Err(ContractError::display(&self.name, "window thread exited"));
            }
            Some(_) => {}
        }

        let pixels = image
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
            })
            .collect();

        let replaced = self.shared.frames.put(PendingFrame {
            title: window_name.to_string(),
            width: image.width() as usize,
            height: image.height() as usize,
            pixels,
        });
        if replaced {
            trace!(surface = %self.name, "Window behind, previous frame dropped");
        }
        Ok(())
    }

    fn destroy(&mut self, window_name: &str) {
        self.shared.closing.store(true, Ordering::SeqCst);
        if let Some(handle) = self.ui_thread.take() {
            if handle.join().is_err() {
                error!(surface = %self.name, "Window thread panicked");
            }
            info!(surface = %self.name, window = window_name, "Window destroyed");
        }
    }
}

impl Drop for WindowSurface {
    fn drop(&mut self) {
        let name = self.name.clone();
        self.destroy(&name);
    }
}

fn ui_loop(shared: &Shared) {
    let mut window: Option<(Window, usize, usize)> = None;

    while !shared.closing.load(Ordering::SeqCst) {
        match shared.frames.take_timeout(PUMP_INTERVAL) {
            Some(PendingFrame {
                title,
                width,
                height,
                pixels,
            }) => {
                let reopen = !matches!(&window, Some((_, w, h)) if *w == width && *h == height);
                if reopen {
                    match Window::new(&title, width, height, WindowOptions::default()) {
                        Ok(w) => {
                            debug!(window = %title, width, height, "Window opened");
                            window = Some((w, width, height));
                        }
                        Err(e) => {
                            shared.fail(format!("cannot open window: {e}"));
                            return;
                        }
                    }
                }
                if let Some((w, _, _)) = window.as_mut() {
                    if let Err(e) = w.update_with_buffer(&pixels, width, height) {
                        shared.fail(format!("cannot update window: {e}"));
                        return;
                    }
                }
            }
            None => {
                if let Some((w, _, _)) = window.as_mut() {
                    w.update();
                }
            }
        }

        if let Some((w, _, _)) = &window {
            if !w.is_open() || w.is_key_down(Key::Q) || w.is_key_down(Key::Escape) {
                shared.quit.store(true, Ordering::SeqCst);
            }
        }
    }
}

/// Quit listener reading the window's keyboard state
#[derive(Clone)]
pub struct WindowQuitListener {
    shared: Arc<Shared>,
}

impl QuitListener for WindowQuitListener {
    fn is_quit_pressed(&mut self) -> Result<bool, ContractError> {
        if let Some(message) = self.shared.failure() {
            return Err(ContractError::quit_listener(message));
        }
        Ok(self.shared.quit.load(Ordering::SeqCst))
    }
}
