// src/main.rs
mod config;
mod engine;
mod gui;
mod orbit;
mod simulation;
mod types;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use eframe::egui;

use crate::config::DisplayConfig;
use crate::orbit::ScalarSource;
use crate::simulation::{SimulatedOrbit, SimulatedScalar};

// fraction of simulated readings reported missing, and of polls that time out
const SIM_DROPOUT: f64 = 0.02;
const SIM_TIMEOUT_RATE: f64 = 0.005;

fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => DisplayConfig::from_path(path)?,
        None => DisplayConfig::demo(),
    };
    let plot_style = config.plot_style()?;

    let color_source = match &config.color {
        Some(color) => Some(
            Box::new(SimulatedScalar::for_binner(&color.binner()?, None)) as Box<dyn ScalarSource>,
        ),
        None => None,
    };
    let source = SimulatedOrbit::new(None)
        .with_dropout(SIM_DROPOUT)
        .with_timeouts(SIM_TIMEOUT_RATE);
    let display = config.build_display(Box::new(source), color_source)?;
    log::info!(
        "monitoring {} devices, reference over {} cycles",
        display.table().len(),
        display.capture_state().target
    );

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([config.width as f32 + 260.0, config.height as f32 * 2.0 + 120.0])
        .with_title("Orbit Display");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Orbit Display",
        options,
        Box::new(move |_cc| {
            Box::new(gui::OrbitApp::new(&config, plot_style, config_path, display))
        }),
    )
    .map_err(|e| anyhow!("{e}"))
}
