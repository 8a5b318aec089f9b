// src/types.rs
use std::fmt;
use std::path::PathBuf;

use crate::orbit::{DeviceTable, OrbitProducts, Rgb, ScalarSource};

// GUI -> engine
pub enum GuiCommand {
    StartCapture,
    ResetCapture,
    ReplaceTable {
        table: DeviceTable,
        labels: Vec<(f64, String)>,
    },
    ReconfigureColor {
        signal: Box<dyn ScalarSource>,
        color_map: Vec<Rgb>,
        extents: Vec<f64>,
    },
    ExportPng(PathBuf),
    Shutdown,
}

impl fmt::Debug for GuiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuiCommand::StartCapture => f.write_str("StartCapture"),
            GuiCommand::ResetCapture => f.write_str("ResetCapture"),
            GuiCommand::ReplaceTable { table, .. } => {
                write!(f, "ReplaceTable({} rows)", table.len())
            }
            GuiCommand::ReconfigureColor { extents, .. } => {
                write!(f, "ReconfigureColor({} bins)", extents.len())
            }
            GuiCommand::ExportPng(path) => write!(f, "ExportPng({})", path.display()),
            GuiCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

// engine -> GUI
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Frame(Box<OrbitProducts>),
}
