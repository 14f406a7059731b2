//! Folio - a terminal markdown article reader.
//!
//! # Usage
//!
//! ```bash
//! folio articles/
//! folio --watch articles/
//! folio --no-line-numbers notes.md
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use folio::app::App;
use folio::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use folio::highlight::{HighlightBackground, set_background_mode};

/// A terminal markdown article reader
#[derive(Parser, Debug)]
#[command(name = "folio", version, about, long_about = None)]
struct Cli {
    /// Markdown file or article directory to read
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Watch articles for changes and auto-reload
    #[arg(short, long)]
    watch: bool,

    /// Start with the article list sidebar visible
    #[arg(long)]
    list: bool,

    /// Hide the article list sidebar
    #[arg(long)]
    no_list: bool,

    /// Disable the line-number gutter in code blocks
    #[arg(long)]
    no_line_numbers: bool,

    /// Force syntax highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Save current command-line flags as defaults in .foliorc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .foliorc
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    match effective.theme.unwrap_or(ThemeMode::Auto) {
        ThemeMode::Auto => set_background_mode(None),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    if !cli.path.exists() {
        anyhow::bail!("Path not found: {}", cli.path.display());
    }

    // Directories open with the article list up unless it was hidden.
    let list_visible = !effective.no_list && (effective.list || cli.path.is_dir());

    let mut app = App::new(cli.path)
        .with_watch(effective.watch)
        .with_list_visible(list_visible)
        .with_line_numbers(!effective.no_line_numbers);

    app.run().context("Application error")
}
