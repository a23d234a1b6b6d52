use clap::Parser;
use romgallery_relay::gpio::CdevInput;
use romgallery_relay::{Binding, HidKeyboard, Relay, DEFAULT_BINDINGS};
use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "romgallery-relay")]
#[command(about = "Forward arcade buttons on GPIO lines to a HID gadget keyboard")]
struct Args {
    /// GPIO character device
    #[arg(long, default_value = "/dev/gpiochip0")]
    chip: PathBuf,

    /// HID gadget endpoint
    #[arg(long, default_value = "/dev/hidg0")]
    hid: PathBuf,

    /// Delay between poll cycles in milliseconds (0 polls continuously)
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut bindings = Vec::with_capacity(DEFAULT_BINDINGS.len());
    for (line, key) in DEFAULT_BINDINGS {
        let pin = CdevInput::request(&args.chip, line)?;
        log::debug!("Line {} -> key 0x{:02X}", line, key.code());
        bindings.push(Binding::new(line, key, pin));
    }

    let hid = OpenOptions::new().write(true).open(&args.hid).map_err(|e| {
        log::error!("Failed to open {}: {}", args.hid.display(), e);
        e
    })?;
    log::info!("Writing reports to {}", args.hid.display());

    let mut relay = Relay::new(bindings, HidKeyboard::new(hid));
    match relay.run(Duration::from_millis(args.interval_ms)) {
        Ok(never) => match never {},
        Err(e) => {
            log::error!("Relay stopped: {}", e);
            Err(e.into())
        }
    }
}
