use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = holo_tree::config::Config::parse();
    if cfg.list_devices {
        holo_tree::audio::list_devices()?;
        return Ok(());
    }

    // Keep the writer alive until the terminal has been restored.
    let _log = match holo_tree::logging::init(&cfg.log_path(), &cfg.log_level) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    holo_tree::app::run(cfg)
}
