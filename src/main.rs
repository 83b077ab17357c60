//! Installs the modifier tap and blocks until interrupted.
//!
//! Note: creating the tap may require running as root or granting
//! Accessibility permission to the terminal.

use flagtap::{Config, SystemPlatform, launch, stop_run_loop};

fn main() {
    colog::default_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = ctrlc::set_handler(|| {
        log::info!("interrupted, stopping run loop");
        if let Err(e) = stop_run_loop() {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }) {
        log::warn!("no Ctrl-C handler installed: {}", e);
    }

    std::process::exit(launch(SystemPlatform, Config::default()));
}
