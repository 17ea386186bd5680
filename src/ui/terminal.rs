use std::{io, path::Path};

use dialoguer::{Confirm, Input, Select};

use super::{
    super::{
        game::{GameState, Round, Summary},
        map::MapImage,
        session::Frontend,
    },
    ascii_preview,
};

/// The title shown at the start of every game
const TITLE: &str = "Map Guesser";
/// Width of the map preview in characters
const PREVIEW_WIDTH: u32 = 72;

/// A [Frontend] that plays the game in the terminal using [dialoguer] prompts
pub struct Terminal {
    /// Whether the maps are also opened in the system image viewer
    open_images: bool,
}

impl Terminal {
    pub fn new(open_images: bool) -> Self {
        Terminal { open_images }
    }

    fn show_map(&self, image: &MapImage) {
        let is_raster = image
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_raster {
            match ascii_preview(&image.bytes, PREVIEW_WIDTH) {
                Ok(preview) => println!("{}", preview),
                Err(e) => log::warn!("Unable to preview {}: {}", image.path.display(), e),
            }
        }
        if self.open_images || !is_raster {
            open_image(&image.path);
        }
    }
}

/// The prompts only ever fail on the terminal itself
fn prompt_error(e: dialoguer::Error) -> io::Error {
    match e {
        dialoguer::Error::IO(e) => e,
    }
}

/// Opens the image in the default viewer, the game goes on if that fails
fn open_image(path: &Path) {
    if let Err(e) = open::that(path) {
        log::warn!("Unable to open {}: {}", path.display(), e);
        println!("The map is at {}", path.display());
    }
}

impl Frontend for Terminal {
    fn show_round(&mut self, state: &GameState, image: &MapImage) -> io::Result<()> {
        if state.completed() == 0 {
            println!("{}\n", TITLE);
        }
        println!(
            "Round {} of {}",
            state.completed() + 1,
            state.max_rounds()
        );
        self.show_map(image);
        Ok(())
    }

    fn choose(&mut self, round: &Round) -> io::Result<String> {
        let selection = Select::new()
            .with_prompt("Which country is this?")
            .items(round.answers())
            .default(0)
            .interact()
            .map_err(prompt_error)?;
        round
            .answers()
            .get(selection)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no such answer"))
    }

    fn show_feedback(&mut self, round: &Round) -> io::Result<()> {
        if let Some(feedback) = round.feedback() {
            println!("{}", feedback);
        }
        Ok(())
    }

    fn next_round(&mut self) -> io::Result<()> {
        Input::<String>::new()
            .with_prompt("Press enter for the next round")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        Ok(())
    }

    fn show_summary(&mut self, summary: Summary) -> io::Result<()> {
        println!("Game over! Your final score is: {}", summary);
        Ok(())
    }

    fn play_again(&mut self) -> io::Result<bool> {
        Confirm::new()
            .with_prompt("Play again?")
            .default(false)
            .interact()
            .map_err(prompt_error)
    }
}
