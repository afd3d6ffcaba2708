use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use log::{info, LevelFilter};
use relief::{timed, Seed, Terrain, TerrainConfig};
use simple_logger::SimpleLogger;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for generating diamond-square terrain meshes.
#[derive(Debug, StructOpt)]
#[structopt(name = "relief")]
struct Opt {
    /// Path to a config file that defines the terrain to be generated.
    /// Supported formats: JSON, TOML. If neither this nor `--bin` is given,
    /// the default config is used.
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// Path to an existing .bin terrain file to load
    #[structopt(short, long)]
    bin: Option<PathBuf>,

    /// Override the seed from the config. Integers are used as-is, any other
    /// text is hashed.
    #[structopt(short, long)]
    seed: Option<String>,

    /// If given, the terrain will be saved to this directory. Each output
    /// format is written to `terrain.<ext>`. See `--output-formats`.
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output the terrain in. Supported formats:
    ///
    /// bin - Binary representation that can be reloaded by this CLI later.
    ///   Use this for persisting & sharing terrains
    ///
    /// cfg - The full config object used for the terrain, in TOML format
    ///
    /// json - JSON representation. Similar to the binary format, but slower
    ///   and much less compact
    ///
    /// stl - 3D model of the terrain mesh
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// The logging level to use during generation. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export the terrain in a serialized binary format, which can be
    /// deserialized later to recover the terrain
    Bin,
    /// Export the terrain's full config in a human-readable file
    Cfg,
    /// Export the terrain in a serialized JSON format. This is similar to the
    /// bin format, but human readable at the cost of size
    Json,
    /// Render the terrain mesh as a 3D STL
    Stl,
}

impl OutputFormat {
    fn file_ext(self) -> &'static str {
        match self {
            Self::Bin => "bin",
            Self::Cfg => "toml",
            Self::Json => "json",
            Self::Stl => "stl",
        }
    }
}

fn load_config(config_path: &Path) -> anyhow::Result<TerrainConfig> {
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

/// Generate an output form of the terrain in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    terrain: &Terrain,
) -> anyhow::Result<()> {
    let output_file_path = output_dir
        .join("terrain")
        .with_extension(output_format.file_ext());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = match output_format {
                OutputFormat::Bin => terrain.to_bin(),
                OutputFormat::Cfg => toml::to_string_pretty(terrain.config())
                    .context("error serializing config")?
                    .into_bytes(),
                OutputFormat::Json => terrain.to_json().into_bytes(),
                OutputFormat::Stl => terrain.to_stl(),
            };
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let terrain = match (&opt.config, &opt.bin) {
        (config_path, None) => {
            let mut config = match config_path {
                Some(config_path) => load_config(config_path)?,
                None => TerrainConfig::default(),
            };
            if let Some(seed) = &opt.seed {
                config.seed = Seed::from(seed.as_str());
            }
            Terrain::generate(config)?
        }
        (None, Some(input_path)) => {
            if opt.seed.is_some() {
                bail!("--seed can't be used when loading an existing terrain")
            }
            let file = OpenOptions::new()
                .read(true)
                .open(input_path)
                .with_context(|| {
                    format!("error opening terrain file {:?}", input_path)
                })?;
            let terrain = Terrain::from_bin(file)?;
            info!("Loaded terrain from {:?}", input_path);
            terrain
        }
        (Some(_), Some(_)) => bail!(
            "pass at most one of --config (to generate a new terrain) \
            or --bin (to load an existing terrain)"
        ),
    };

    // If an output dir was specified, write out output format(s) there
    if let Some(output_dir) = &opt.output {
        if opt.output_formats.is_empty() {
            bail!("output dir was specified, but no output formats were given")
        }
        fs::create_dir_all(output_dir)?;
        for output_format in &opt.output_formats {
            gen_output(output_dir, *output_format, &terrain)?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
