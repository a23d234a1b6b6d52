//! Main gallery application with egui integration
//!
//! This module provides the kiosk window:
//! - Header with logo and controls legend
//! - Message line (notifications, welcome text)
//! - Three-pane carousel and progress bar
//! - Play / return-to-gallery handling
//! - USB import events drained from the worker channel

use super::artwork::{load_resized, TextureCache};
use super::theme;
use crate::carousel::{CarouselSlot, CarouselView};
use crate::config::Config;
use crate::emulator::{EmulatorProcess, LaunchOutcome, StopOutcome};
use crate::library::RomLibrary;
use crate::notification::Notifier;
use crate::usb::{self, ImportQueue, ImportReport, UsbEvent, Waker};
use egui::{Key, RichText, TextureHandle, TextureOptions, Vec2};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

const LOGO_SIZE: [u32; 2] = [350, 200];

const MSG_ALREADY_RUNNING: &str = "A game is already running. Close it before opening another one.";
const MSG_GAME_CLOSED: &str = "Game closed, back to the gallery.";
const MSG_CLOSE_FAILED: &str = "The game could not be closed.";
const MSG_LAUNCH_FAILED: &str = "The game could not be started.";
const MSG_NO_GAMES: &str = "There are no games yet. Insert a USB drive with games.";

/// Resolved navigation keys
#[derive(Debug, Clone, Copy)]
struct Keys {
    left: Key,
    right: Key,
    play: Key,
    back: Key,
}

impl Keys {
    fn from_config(config: &Config) -> Self {
        let bindings = &config.ui.key_bindings;
        Self {
            left: resolve_key(&bindings.left, Key::ArrowLeft),
            right: resolve_key(&bindings.right, Key::ArrowRight),
            play: resolve_key(&bindings.play, Key::Enter),
            back: resolve_key(&bindings.back, Key::Escape),
        }
    }
}

fn resolve_key(name: &str, fallback: Key) -> Key {
    Key::from_name(name).unwrap_or_else(|| {
        log::warn!("Unknown key name '{}', using {:?}", name, fallback);
        fallback
    })
}

/// Main application state
pub struct GalleryApp {
    config: Config,
    library: RomLibrary,
    emulator: EmulatorProcess,
    notifier: Notifier,
    keys: Keys,
    view: Option<CarouselView>,

    // Textures
    artwork: TextureCache,
    logo: Option<TextureHandle>,
    logo_loaded: bool,

    // USB worker channel
    usb_tx: Sender<UsbEvent>,
    usb_rx: Receiver<UsbEvent>,
    waker: Waker,
    imports: ImportQueue,
}

impl GalleryApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        theme::apply(&cc.egui_ctx);
        if let Some(ref font) = config.ui.font_path {
            theme::install_font(&cc.egui_ctx, font);
        }

        let (usb_tx, usb_rx) = channel();
        let ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || ctx.request_repaint());

        if let Err(e) = usb::spawn_watcher(config.usb.clone(), usb_tx.clone(), waker.clone()) {
            log::error!("Failed to start USB watcher: {}", e);
        }

        let library = RomLibrary::load(&config);
        let view = CarouselView::compute(&library, &config);

        Self {
            library,
            view,
            emulator: EmulatorProcess::new(config.emulator.clone()),
            notifier: Notifier::new(config.ui.welcome_text.clone(), config.ui.notification_duration()),
            keys: Keys::from_config(&config),
            artwork: TextureCache::new(),
            logo: None,
            logo_loaded: false,
            usb_tx,
            usb_rx,
            waker,
            imports: ImportQueue::new(),
            config,
        }
    }

    fn handle_usb_events(&mut self) {
        // Sampled first: an exited worker has already posted all it will post
        let worker_exited = self.imports.worker_exited();

        while let Ok(event) = self.usb_rx.try_recv() {
            match event {
                UsbEvent::Mounted(mount_point) => self.imports.push(mount_point),
                UsbEvent::ImportStarted { pending } => {
                    self.notifier
                        .show_persistent(format!("Copying {} game(s) from the USB drive...", pending));
                }
                UsbEvent::ImportFinished(report) => {
                    self.imports.finish();
                    self.finish_import(report);
                }
            }
        }

        if worker_exited && self.imports.is_busy() {
            if self.imports.reap() {
                log::error!("USB import worker panicked");
            } else {
                log::warn!("USB import worker exited without a report");
            }
            self.notifier.clear();
        }

        self.start_next_import();
    }

    fn start_next_import(&mut self) {
        let emulator = &mut self.emulator;
        let config = &self.config;
        let tx = &self.usb_tx;
        let waker = &self.waker;

        let started = self.imports.start_next(|mount_point| {
            // Importing preempts play
            if let Err(e) = emulator.stop() {
                log::error!("Failed to stop game before import: {}", e);
            }
            usb::spawn_import(mount_point, config.clone(), tx.clone(), waker.clone())
        });
        if let Some(mount_point) = started {
            log::info!(
                "Import from {} started, {} drive(s) waiting",
                mount_point.display(),
                self.imports.waiting()
            );
        }
    }

    fn finish_import(&mut self, report: ImportReport) {
        let duration = self.config.ui.import_notification_duration();
        self.notifier.show(report.summary(), duration, Instant::now());

        if report.copied.is_empty() {
            return;
        }

        let count = report.copied_count();
        let added = self.library.merge(report.copied);
        log::info!(
            "Import from {} done: {} found, {} copied, {} failed, {} new in library",
            report.mount_point.display(),
            report.found,
            count,
            report.failed.len(),
            added
        );
        self.artwork.clear();
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        self.view = CarouselView::compute(&self.library, &self.config);
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let keys = self.keys;
        let (left, right, play, back) = ctx.input(|i| {
            (
                i.key_pressed(keys.left),
                i.key_pressed(keys.right),
                i.key_pressed(keys.play),
                i.key_pressed(keys.back),
            )
        });

        if left {
            self.library.move_left();
        }
        if right {
            self.library.move_right();
        }
        if left || right {
            self.refresh_view();
        }
        if play {
            self.play_selected();
        }
        if back {
            self.return_to_gallery(ctx);
        }
    }

    fn play_selected(&mut self) {
        let Some(name) = self.library.selected() else {
            self.notifier.notify(MSG_NO_GAMES, Instant::now());
            return;
        };
        let rom_path = self.config.rom_path(name);

        match self.emulator.launch(&rom_path) {
            Ok(LaunchOutcome::Started { pid }) => {
                log::info!("Started {} (pid {})", rom_path.display(), pid);
            }
            Ok(LaunchOutcome::AlreadyRunning) => {
                self.notifier.notify(MSG_ALREADY_RUNNING, Instant::now());
            }
            Err(e) => {
                log::error!("Failed to launch game: {}", e);
                self.notifier.notify(MSG_LAUNCH_FAILED, Instant::now());
            }
        }
    }

    fn return_to_gallery(&mut self, ctx: &egui::Context) {
        match self.emulator.stop() {
            Ok(StopOutcome::Stopped(_)) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                self.notifier.notify(MSG_GAME_CLOSED, Instant::now());
            }
            Ok(StopOutcome::NotRunning) => {}
            Err(e) => {
                log::error!("Failed to close game: {}", e);
                self.notifier.notify(MSG_CLOSE_FAILED, Instant::now());
            }
        }
    }

    fn ensure_logo(&mut self, ctx: &egui::Context) {
        if self.logo_loaded {
            return;
        }
        self.logo_loaded = true;

        let path = &self.config.logo_path;
        if !path.exists() {
            log::warn!("Logo not found: {}", path.display());
            return;
        }
        match load_resized(path, LOGO_SIZE) {
            Ok(image) => self.logo = Some(ctx.load_texture("logo", image, TextureOptions::LINEAR)),
            Err(e) => log::error!("Failed to load logo: {}", e),
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::new().fill(theme::BACKGROUND).inner_margin(egui::Margin::same(10)))
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if let Some(ref logo) = self.logo {
                        ui.add(egui::Image::new(egui::load::SizedTexture::new(
                            logo.id(),
                            egui::vec2(LOGO_SIZE[0] as f32, LOGO_SIZE[1] as f32),
                        )));
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(&self.config.ui.controls_text)
                                .size(theme::CONTROLS_SIZE)
                                .color(theme::TEXT),
                        );
                    });
                });
            });
    }

    fn render_progress(&mut self, ctx: &egui::Context, fraction: f32) {
        egui::TopBottomPanel::bottom("progress")
            .frame(egui::Frame::new().fill(theme::BACKGROUND).inner_margin(egui::Margin::symmetric(20, 10)))
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.add(egui::ProgressBar::new(fraction));
            });
    }

    fn render_carousel(&mut self, ctx: &egui::Context, view: Option<&CarouselView>) {
        let message = self.notifier.current(Instant::now()).to_owned();

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BACKGROUND))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(10.0);
                    ui.label(RichText::new(message).size(theme::MESSAGE_SIZE).color(theme::TEXT));
                });

                let Some(view) = view else {
                    // Empty state
                    ui.vertical_centered(|ui| {
                        ui.add_space(80.0);
                        ui.heading(RichText::new("No games found").size(32.0).color(theme::TEXT));
                        ui.add_space(16.0);
                        ui.label(
                            RichText::new(format!(
                                "Insert a USB drive with {} files to add games",
                                self.config
                                    .rom_extensions
                                    .iter()
                                    .map(|e| format!(".{}", e))
                                    .collect::<Vec<_>>()
                                    .join(" / ")
                            ))
                            .size(18.0)
                            .color(theme::UNSELECTED),
                        );
                    });
                    return;
                };

                let top = (ui.available_height() - view.center.size[1] as f32 - 60.0).max(0.0) / 2.0;
                ui.add_space(top);
                ui.columns(3, |columns| {
                    for (column, slot) in columns.iter_mut().zip(view.slots()) {
                        column.vertical_centered(|ui| {
                            if !slot.is_selected() {
                                let offset = (view.center.size[1] - slot.size[1]) as f32 / 2.0;
                                ui.add_space(offset);
                            }
                            self.draw_slot(ui, ctx, slot);
                        });
                    }
                });
            });
    }

    fn draw_slot(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, slot: &CarouselSlot) {
        let size = Vec2::new(slot.size[0] as f32, slot.size[1] as f32);
        let texture = slot
            .artwork
            .as_ref()
            .and_then(|path| self.artwork.get(ctx, path, slot.size));

        if let Some(texture) = texture {
            ui.add(egui::Image::new(egui::load::SizedTexture::new(texture.id(), size)));
        } else {
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter().rect_filled(rect, 4.0, theme::PLACEHOLDER);
        }

        let (color, font_size) = if slot.is_selected() {
            (theme::SELECTED, theme::CENTER_TITLE_SIZE)
        } else {
            (theme::UNSELECTED, theme::SIDE_TITLE_SIZE)
        };
        ui.label(RichText::new(&slot.title).size(font_size).color(color).strong());
    }
}

impl eframe::App for GalleryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_logo(ctx);
        self.handle_usb_events();
        self.handle_input(ctx);

        let view = self.view.take();
        let fraction = view.as_ref().map_or(0.0, CarouselView::progress_fraction);

        self.render_header(ctx);
        self.render_progress(ctx, fraction);
        self.render_carousel(ctx, view.as_ref());
        self.view = view;

        // Wake up when the notification reverts
        let now = Instant::now();
        if let Some(at) = self.notifier.next_change(now) {
            ctx.request_repaint_after(at - now);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.emulator.stop() {
            log::error!("Failed to stop game on exit: {}", e);
        }
    }
}
