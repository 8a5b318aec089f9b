// src/engine.rs
use std::fs;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::orbit::{render_orbit_png, OrbitDisplay, OrbitError, PlotStyle};
use crate::types::{EngineMessage, GuiCommand};

/// Owns the display on its own thread. GUI actions arrive as commands and
/// are applied between refresh cycles, so `update()` never runs
/// concurrently with a capture start, reset or reconfiguration.
pub struct Engine {
    display: OrbitDisplay,
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<GuiCommand>,
    plot_style: PlotStyle,
}

impl Engine {
    pub fn new(
        display: OrbitDisplay,
        tx: Sender<EngineMessage>,
        rx_cmd: Receiver<GuiCommand>,
        plot_style: PlotStyle,
    ) -> Self {
        Self {
            display,
            tx,
            rx_cmd,
            plot_style,
        }
    }

    #[cfg(test)]
    pub fn display(&self) -> &OrbitDisplay {
        &self.display
    }

    /// Applies every queued command. Returns `false` once the GUI is gone
    /// or asked for shutdown.
    pub fn drain_commands(&mut self) -> bool {
        let mut changed = false;
        loop {
            let cmd = match self.rx_cmd.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return false,
            };
            info!("engine command {cmd:?}");
            match cmd {
                GuiCommand::StartCapture => {
                    self.display.start_capture();
                    let target = self.display.capture_state().target;
                    self.log(format!("Collecting reference over {target} cycles"));
                    changed = true;
                }
                GuiCommand::ResetCapture => {
                    self.display.reset_capture();
                    self.log("Reference cleared".to_owned());
                    changed = true;
                }
                GuiCommand::ReplaceTable { table, labels } => {
                    let rows = table.len();
                    self.display.reconfigure_table(table);
                    self.display.set_labels(labels);
                    self.log(format!("Monitoring {rows} devices"));
                    changed = true;
                }
                GuiCommand::ReconfigureColor {
                    signal,
                    color_map,
                    extents,
                } => match self.display.reconfigure_color(signal, color_map, extents) {
                    Ok(()) => {
                        self.log("Colour map updated".to_owned());
                        changed = true;
                    }
                    Err(e) => self.log(format!("Colour map rejected: {e}")),
                },
                GuiCommand::ExportPng(path) => {
                    let result = render_orbit_png(self.display.products(), self.plot_style.clone())
                        .and_then(|png| {
                            fs::write(&path, png).map_err(|e| OrbitError::Plot(e.to_string()))
                        });
                    match result {
                        Ok(()) => self.log(format!("Saved {}", path.display())),
                        Err(e) => self.log(format!("Export failed: {e}")),
                    }
                }
                GuiCommand::Shutdown => return false,
            }
        }
        if changed {
            self.publish();
        }
        true
    }

    /// One refresh. A failed fetch skips the frame and keeps the last one.
    pub fn tick(&mut self) {
        let was_capturing = self.display.capture_state().capturing;
        match self.display.update() {
            Ok(()) => {
                if was_capturing && !self.display.capture_state().capturing {
                    self.log("Reference captured".to_owned());
                }
                self.publish();
            }
            Err(e) => {
                warn!("orbit update failed: {e}");
                self.log(format!("Update skipped: {e}"));
            }
        }
    }

    pub fn run(mut self, interval: Duration) {
        self.log("Orbit engine ready.".to_owned());
        loop {
            let started = Instant::now();
            if !self.drain_commands() {
                info!("engine stopping");
                break;
            }
            self.tick();
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }

    fn publish(&self) {
        let frame = Box::new(self.display.products().clone());
        self.tx.send(EngineMessage::Frame(frame)).ok();
    }

    fn log(&self, msg: String) {
        self.tx.send(EngineMessage::Log(msg)).ok();
    }
}

pub fn spawn_thread(engine: Engine, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || engine.run(interval))
}
