use clap_derive::Parser;
use derive_more::Display;
use dialoguer::{Completion, Confirm, Input, Select};

use std::{
    error, fs,
    path::{Path, PathBuf},
};

use super::map::ImageFormat;

/// The file listing the canonical country names
const DEFAULT_NAMES: &str = "Country_name_list.txt";
/// The file with the translated names, used when present
const DEFAULT_TRANSLATIONS: &str = "Chinese_name.txt";
/// The Natural Earth map units shapefile
const DEFAULT_SHAPEFILE: &str = "ne_10m_admin_0_map_units.shp";
/// Where the rendered maps are kept
const DEFAULT_CACHE: &str = "maps";
const DEFAULT_LOG: &str = "map_guesser.log";
const DEFAULT_ROUNDS: u32 = 10;

const FORMATS: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Svg];

/// A [Completion] struct for file names, that also acts as a list of files
/// with a given extension in the current directory.
struct FileNameCompletion {
    files: Vec<String>,
}

impl FileNameCompletion {
    fn with_extension(extension: &str) -> Self {
        let mut res = Vec::new();
        if let Ok(entries) = fs::read_dir(".") {
            for entry in entries.flatten() {
                let entry = entry.path();
                if entry.is_file() && entry.extension().is_some_and(|ext| ext == extension) {
                    res.push(entry.to_string_lossy().into_owned());
                }
            }
        }
        res.sort();
        FileNameCompletion { files: res }
    }

    /// The best guess for the input, preferring the given default
    fn initial(&self, default: &str) -> String {
        if Path::new(default).is_file() {
            return default.to_owned();
        }
        self.files.first().cloned().unwrap_or_default()
    }
}

impl Completion for FileNameCompletion {
    fn get(&self, input: &str) -> Option<String> {
        self.files.iter().find(|x| x.contains(input)).cloned()
    }
}

#[derive(Debug, Display)]
enum InvalidPath {
    #[display("invalid path (does not exist)")]
    InvalidPath,
    #[display("not a file")]
    NotAFile,
}

impl error::Error for InvalidPath {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/// A function to validate the file path input.
fn validate_file_path(input: &String) -> Result<(), InvalidPath> {
    let p = Path::new(input);
    if p.exists() {
        if p.is_file() {
            Ok(())
        } else {
            Err(InvalidPath::NotAFile)
        }
    } else {
        Err(InvalidPath::InvalidPath)
    }
}

/// Same as [validate_file_path], but an empty input is fine
fn validate_optional_file_path(input: &String) -> Result<(), InvalidPath> {
    if input.is_empty() {
        return Ok(());
    }
    validate_file_path(input)
}

/// A function to parse the path argument.
fn parse_path_arg(input: &str) -> Result<PathBuf, &'static str> {
    let p = PathBuf::from(input);
    if p.is_file() {
        Ok(p)
    } else {
        Err("Invalid path")
    }
}

/// A function to parse the number of rounds.
fn parse_rounds_arg(input: &str) -> Result<u32, &'static str> {
    match input.parse::<u32>() {
        Ok(0) => Err("A game needs at least one round"),
        Ok(n) => Ok(n),
        Err(_) => Err("Not a number"),
    }
}

/// The arguments to the program.
#[derive(Parser)]
#[command(version, about)]
pub struct Args {
    #[arg(short, long, default_value = DEFAULT_NAMES)]
    /// The file with one country name per line.
    pub names: PathBuf,
    #[arg(short, long, default_value = None, value_parser = parse_path_arg)]
    /// The file with the translated names, paired line by line with the names.
    pub translations: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    /// A flag that tells the program to show the untranslated names.
    pub no_translate: bool,
    #[arg(short, long, default_value = DEFAULT_SHAPEFILE)]
    /// The shapefile the maps are drawn from.
    pub shapefile: PathBuf,
    #[arg(short, long, default_value = DEFAULT_CACHE)]
    /// The directory the drawn maps are kept in.
    pub cache: PathBuf,
    #[arg(short, long, default_value_t = DEFAULT_ROUNDS, value_parser = parse_rounds_arg)]
    /// The number of rounds in a game.
    pub rounds: u32,
    #[arg(short, long, value_enum, default_value_t = ImageFormat::Png)]
    /// The format the maps are drawn in.
    pub format: ImageFormat,
    #[arg(short, long, default_value_t = false)]
    /// A flag that tells the program to open the maps in the image viewer.
    pub open: bool,
    #[arg(long, default_value_t = false)]
    /// A flag that tells the program to draw all the missing maps and exit.
    pub prerender: bool,
    #[arg(long, default_value = None)]
    /// A path to a file to dump the results of the last game to.
    pub dump: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_LOG)]
    /// The file the log is written to.
    pub log: PathBuf,
}

impl Args {
    /// The translation file to use, if any.
    /// Without an explicit one, the default file is used if it exists.
    pub fn translations_path(&self) -> Option<PathBuf> {
        if self.no_translate {
            return None;
        }
        self.translations.clone().or_else(|| {
            let default = PathBuf::from(DEFAULT_TRANSLATIONS);
            default.is_file().then_some(default)
        })
    }

    /// Create the object based on user input.
    pub fn get_from_user() -> dialoguer::Result<Self> {
        println!("Welcome to Map Guesser!\nTab autocompletes the query, arrows cycle through possible options and enter confirms the selection.");
        let text_files = FileNameCompletion::with_extension("txt");
        let names = PathBuf::from(
            Input::<String>::new()
                .with_prompt("Enter the country names file")
                .validate_with(validate_file_path)
                .with_initial_text(text_files.initial(DEFAULT_NAMES))
                .completion_with(&text_files)
                .interact_text()?,
        );
        let translations = Input::<String>::new()
            .with_prompt("Enter the translated names file [empty for None]")
            .allow_empty(true)
            .validate_with(validate_optional_file_path)
            .with_initial_text(if Path::new(DEFAULT_TRANSLATIONS).is_file() {
                DEFAULT_TRANSLATIONS
            } else {
                ""
            })
            .completion_with(&text_files)
            .interact_text()
            .map(|x| {
                if x.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(x))
                }
            })?;
        let shapefiles = FileNameCompletion::with_extension("shp");
        let shapefile = PathBuf::from(
            Input::<String>::new()
                .with_prompt("Enter the shapefile path")
                .with_initial_text(shapefiles.initial(DEFAULT_SHAPEFILE))
                .completion_with(&shapefiles)
                .interact_text()?,
        );
        let rounds = Input::<u32>::new()
            .with_prompt("Enter the number of rounds")
            .default(DEFAULT_ROUNDS)
            .validate_with(|input: &u32| -> Result<(), &'static str> {
                if *input == 0 {
                    Err("A game needs at least one round")
                } else {
                    Ok(())
                }
            })
            .interact()?;
        let format = FORMATS[Select::new()
            .with_prompt("Choose the map format")
            .items(&FORMATS)
            .default(0)
            .interact()?];
        let open = Confirm::new()
            .with_prompt("Open the maps in the image viewer?")
            .default(format == ImageFormat::Svg)
            .interact()?;
        Ok(Args {
            names,
            no_translate: translations.is_none(),
            translations,
            shapefile,
            cache: PathBuf::from(DEFAULT_CACHE),
            rounds,
            format,
            open,
            prerender: false,
            dump: None,
            log: PathBuf::from(DEFAULT_LOG),
        })
    }
}
