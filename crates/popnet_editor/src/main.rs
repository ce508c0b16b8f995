// SPDX-License-Identifier: MIT OR Apache-2.0
//! `popnet` - command line front end of the POP patch-panel editor.

use clap::Parser;
use popnet_editor::cli::{self, Cli};
use popnet_editor::ProjectSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let settings = match ProjectSettings::load_or_default(&cli.project_dir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    // RUST_LOG wins over the project filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting popnet v{}", env!("CARGO_PKG_VERSION"));

    let mut stdout = std::io::stdout().lock();
    match cli::run(cli, &settings, &mut stdout) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    }
}
