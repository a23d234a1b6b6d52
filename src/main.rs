use clap::Parser;
use romgallery::ui::GalleryApp;
use romgallery::Config;
use std::fs::{create_dir_all, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "romgallery")]
#[command(about = "Fullscreen ROM carousel with USB auto-import")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the ROM directory from the configuration
    #[arg(long)]
    roms_dir: Option<PathBuf>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    init_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// A writer that writes to both stdout and a file
struct DualWriter {
    file: File,
}

impl DualWriter {
    fn new(file: File) -> Self {
        Self { file }
    }
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

fn init_logging(debug: bool) {
    let log_level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let logs_dir = PathBuf::from("logs");
    if let Err(e) = create_dir_all(&logs_dir) {
        eprintln!("Warning: Could not create logs directory: {}", e);
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let log_path = logs_dir.join(format!("romgallery_{}.log", timestamp));

    let log_file = match File::create(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            None
        }
    };

    // RUST_LOG still wins over the --debug default
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level);
    builder.parse_default_env();

    if let Some(file) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(DualWriter::new(file))));
    }

    builder.init();
    log::info!("Log file: {}", log_path.display());
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let mut config = Config::load(args.config.as_deref());
    if let Some(roms_dir) = args.roms_dir {
        config.roms_dir = roms_dir;
    }

    if args.init_config {
        let path = args.config.unwrap_or_else(Config::config_path);
        if let Err(e) = config.save(&path) {
            log::error!("Failed to write config: {}", e);
            std::process::exit(1);
        }
        return;
    }

    log::info!("ROM directory: {}", config.roms_dir.display());
    log::info!("Images directory: {}", config.images_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Game Carousel")
            .with_fullscreen(config.ui.fullscreen)
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "romgallery",
        options,
        Box::new(move |cc| Ok(Box::new(GalleryApp::new(cc, config)))),
    );

    if let Err(e) = result {
        log::error!("UI error: {}", e);
        std::process::exit(1);
    }
}
