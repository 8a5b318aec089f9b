// src/gui.rs
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use eframe::egui;
use egui::Color32;
use egui_plot::{Bar, BarChart, HLine, Line, Plot, PlotPoint, PlotPoints, Text};

use crate::config::DisplayConfig;
use crate::engine::{self, Engine};
use crate::orbit::{Axis, OrbitDisplay, OrbitError, OrbitProducts, PlotStyle, Rgb};
use crate::simulation::SimulatedScalar;
use crate::types::*;

/// Commands that bring a running display in line with a re-read config.
/// Only the device table, labels and colour map are applied live.
pub fn reload_commands(config: &DisplayConfig) -> Result<Vec<GuiCommand>, OrbitError> {
    let mut commands = vec![GuiCommand::ReplaceTable {
        table: config.table()?,
        labels: config.labels()?,
    }];
    if let Some(color) = &config.color {
        let binner = color.binner()?;
        commands.push(GuiCommand::ReconfigureColor {
            signal: Box::new(SimulatedScalar::for_binner(&binner, None)),
            color_map: binner.colors().to_vec(),
            extents: binner.extents().to_vec(),
        });
    }
    Ok(commands)
}

fn to_color32(color: Rgb) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

pub struct OrbitApp {
    frame: Option<Box<OrbitProducts>>,
    y_range: (f64, f64),
    plot_height: f32,
    refresh: Duration,
    export_path: String,
    config_path: Option<PathBuf>,
    log_messages: Vec<String>,

    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<GuiCommand>,
}

impl OrbitApp {
    pub fn new(
        config: &DisplayConfig,
        style: PlotStyle,
        config_path: Option<PathBuf>,
        display: OrbitDisplay,
    ) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let refresh = Duration::from_millis(config.refresh_ms.max(10));
        engine::spawn_thread(Engine::new(display, tx, rx_cmd, style), refresh);

        Self {
            frame: None,
            y_range: config.y_range,
            plot_height: config.height as f32,
            refresh,
            export_path: "orbit.png".to_owned(),
            config_path,
            log_messages: vec!["Orbit display ready.".to_owned()],
            rx,
            tx_cmd,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn send(&mut self, cmd: GuiCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            self.log("Engine is not running");
        }
    }

    fn reload_config(&mut self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        let commands = DisplayConfig::from_path(&path)
            .and_then(|config| reload_commands(&config).map_err(Into::into));
        match commands {
            Ok(commands) => {
                for cmd in commands {
                    self.send(cmd);
                }
                self.log(&format!("Reloaded {}", path.display()));
            }
            Err(e) => self.log(&format!("Reload failed: {e:#}")),
        }
    }

    fn plane_plot(&self, ui: &mut egui::Ui, axis: Axis, frame: &OrbitProducts) {
        let raw = frame.raw(axis);
        let reference = frame.reference(axis);
        let (z_min, z_max) = frame.z_range;
        let (y_lo, y_hi) = self.y_range;

        Plot::new(format!("orbit_{axis}"))
            .height(self.plot_height)
            .include_x(z_min)
            .include_x(z_max)
            .include_y(y_lo)
            .include_y(y_hi)
            .link_axis("orbit_z", true, false)
            .show(ui, |plot_ui| {
                let bars = raw
                    .positions
                    .iter()
                    .zip(&raw.values)
                    .zip(&raw.devices)
                    .zip(&raw.colors)
                    .filter(|(((_, v), _), _)| !v.is_nan())
                    .map(|(((z, v), device), color)| {
                        Bar::new(*z, *v)
                            .width(frame.bar_width)
                            .fill(to_color32(*color))
                            .name(format!("{device} @ {z:.1} m"))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(format!("{axis} (mm)")));

                if raw.crosses_zero() {
                    plot_ui.hline(HLine::new(0.0).color(Color32::BLACK).width(2.0));
                }

                if !reference.is_empty() {
                    let points: Vec<[f64; 2]> = reference.points().map(|(z, v)| [z, v]).collect();
                    let color = frame
                        .reference_color
                        .map(to_color32)
                        .unwrap_or(Color32::LIGHT_BLUE);
                    plot_ui.line(
                        Line::new(PlotPoints::new(points))
                            .color(color)
                            .width(2.0)
                            .name("reference"),
                    );
                }

                for (z, label) in &frame.labels {
                    plot_ui.text(
                        Text::new(PlotPoint::new(*z, y_lo), label.as_str()).color(Color32::GRAY),
                    );
                }
            });
    }
}

impl Drop for OrbitApp {
    fn drop(&mut self) {
        self.tx_cmd.send(GuiCommand::Shutdown).ok();
    }
}

impl eframe::App for OrbitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                EngineMessage::Log(s) => self.log(&s),
                EngineMessage::Frame(frame) => self.frame = Some(frame),
            }
        }

        egui::SidePanel::left("controls").min_width(220.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Orbit");
            ui.separator();

            let capture = self.frame.as_ref().map(|f| f.capture);
            let capturing = capture.map_or(false, |c| c.capturing);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!capturing, egui::Button::new("Collect Reference"))
                    .clicked()
                {
                    self.send(GuiCommand::StartCapture);
                }
                if ui.button("Reset").clicked() {
                    self.send(GuiCommand::ResetCapture);
                }
            });
            if ui
                .add_enabled(self.config_path.is_some(), egui::Button::new("Reload Config"))
                .clicked()
            {
                self.reload_config();
            }
            if let Some(c) = capture.filter(|c| c.capturing) {
                let progress = c.collected() as f32 / c.target as f32;
                ui.add(
                    egui::ProgressBar::new(progress)
                        .text(format!("{}/{}", c.collected(), c.target)),
                );
            }

            if let Some((extents, colors)) = self.frame.as_ref().and_then(|f| f.color_scale.as_ref()) {
                ui.add_space(10.0);
                ui.label("COLOUR SCALE");
                for (extent, color) in extents.iter().zip(colors) {
                    ui.colored_label(to_color32(*color), format!("■ {extent:.2}"));
                }
            }

            ui.add_space(10.0);
            ui.separator();
            ui.label("EXPORT");
            ui.text_edit_singleline(&mut self.export_path);
            if ui.button("Save PNG").clicked() {
                let path = PathBuf::from(self.export_path.trim());
                self.send(GuiCommand::ExportPng(path));
            }

            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(140.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.frame.as_deref() {
            Some(frame) => {
                for axis in Axis::ALL {
                    ui.label(format!("{axis} (mm)"));
                    self.plane_plot(ui, axis, frame);
                }
                ui.label(format!("cycle {}", frame.cycle));
            }
            None => {
                ui.label("Waiting for first orbit...");
            }
        });

        ctx.request_repaint_after(self.refresh);
    }
}
