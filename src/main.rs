use clap::Parser;
use derive_more::{Display, From};
use human_panic::setup_panic;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::{
    env, error,
    fs::{self, File},
    io::{self, stdin, stdout, IsTerminal},
    path::Path,
    process::ExitCode,
};

/// A submodule that handles the command line arguments, or asks the user for them
mod args;
use args::Args;

/// The list of countries and their translated names
mod catalog;
use catalog::{Catalog, CatalogError};

/// Drawing of the country maps and the cache they are kept in
mod map;
use map::{MapError, MapRenderer, ShapefileSource};

/// The rules of the game: rounds, scoring and when it ends
mod game;
use game::RandomRounds;

/// The loop tying the game, the maps and the player together
mod session;
use session::SessionError;

/// The terminal front end
mod ui;
use ui::Terminal;

#[derive(Debug, From, Display)]
enum Error {
    CatalogError(CatalogError),
    MapError(MapError),
    SessionError(SessionError),
    IoError(io::Error),
    DumpError(serde_json::Error),
    #[display("the game can only be played in a terminal, try --prerender")]
    #[from(ignore)]
    NotATerminal,
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::CatalogError(e) => Some(e),
            Error::MapError(e) => Some(e),
            Error::SessionError(e) => Some(e),
            Error::IoError(e) => Some(e),
            Error::DumpError(e) => Some(e),
            Error::NotATerminal => None,
        }
    }
}

/// Sends the log to a file, so that it doesn't mix with the game on screen
fn init_logging(path: &Path) {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let res = File::create(path).map(|file| {
        WriteLogger::init(
            level,
            ConfigBuilder::new()
                .set_target_level(LevelFilter::Error)
                .build(),
            file,
        )
    });
    match res {
        Ok(Ok(())) => {}
        Ok(Err(e)) => eprintln!("Unable to set up logging: {}", e),
        Err(e) => eprintln!("Unable to create the log file {}: {}", path.display(), e),
    }
}

fn run(args: Args) -> Result<(), Error> {
    let translations = args.translations_path();
    let mut catalog = Catalog::load(&args.names, translations.as_ref())?;
    if args.no_translate {
        catalog = catalog.untranslated();
    }
    let renderer = MapRenderer::new(
        ShapefileSource::new(&args.shapefile),
        &args.cache,
        args.format,
    )?;
    if args.prerender {
        let failed = renderer.prerender(&catalog);
        for (country, e) in failed.iter() {
            eprintln!("Unable to draw {}: {}", country, e);
        }
        println!(
            "{} of {} maps are in {}",
            catalog.len() - failed.len(),
            catalog.len(),
            args.cache.display()
        );
        return Ok(());
    }
    if !stdin().is_terminal() || !stdout().is_terminal() {
        return Err(Error::NotATerminal);
    }
    let mut generator = RandomRounds::new(rand::rng());
    let mut terminal = Terminal::new(args.open);
    let report = session::play(
        &catalog,
        &renderer,
        &mut generator,
        &mut terminal,
        args.rounds,
    )?;
    if let Some(path) = &args.dump {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        log::info!("Results written to {}", path.display());
    }
    Ok(())
}

/// Main function. This is the entry point of the program.
///
/// Without any arguments, in a terminal, the settings are asked for
/// interactively. Otherwise they are taken from the command line, see [Args].
fn main() -> ExitCode {
    setup_panic!();
    let args = if env::args().len() < 2 && stdin().is_terminal() {
        match Args::get_from_user() {
            Ok(args) => args,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        Args::parse()
    };
    init_logging(&args.log);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
