//! Elecpick GUI application entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod surface;
mod ui;
mod util;
mod viewer;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use app::ElecpickApp;
use clap::Parser;
use eframe::egui;
use elecpick_core::{Session, SessionConfig, VoxelTransform};
use elecpick_io::{load_subject, JsonFileStore, LoaderConfig};
use log::info;
use rfd::FileDialog;

/// Interactive electrode picker for co-registered MRI and CT.
#[derive(Parser)]
#[command(name = "elecpick-gui")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subject directory containing `mri/` and `CT/` (asks with a folder
    /// picker when omitted)
    subject_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let subject_dir = match cli.subject_dir {
        Some(dir) => dir,
        None => FileDialog::new()
            .set_title("Select subject directory")
            .pick_folder()
            .context("no subject directory selected")?,
    };

    let loader = LoaderConfig::default();
    let volumes = load_subject(&subject_dir, &loader)
        .with_context(|| format!("failed to load subject {}", subject_dir.display()))?;
    let store = volumes.into_store()?;
    let transform = VoxelTransform::surface_ras(store.shape());
    let annotations = JsonFileStore::for_subject(&subject_dir, &loader);
    info!("Annotations go to {}", annotations.dir().display());

    let session = Session::new(store, transform, annotations, SessionConfig::default());
    let app = ElecpickApp::new(session, subject_dir.display().to_string());

    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Elecpick",
        opts,
        Box::new(|cc| {
            ui::theme::configure_style(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
