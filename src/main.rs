use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser};
use env_logger::Builder;
use log::{info, LevelFilter};
use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::PathBuf,
};

/// Hide a file inside a PNG image, or recover one.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["extract", "implant"])))]
struct Args {
    /// Extract hidden data from this image
    #[arg(long, value_name = "IMAGE")]
    extract: Option<PathBuf>,

    /// Implant data into this image
    #[arg(long, value_name = "IMAGE")]
    implant: Option<PathBuf>,

    /// File to implant into the image (required for --implant)
    #[arg(long, value_name = "FILE")]
    in_file: Option<PathBuf>,

    /// Output file (required for --implant, optional for --extract)
    #[arg(long, value_name = "FILE")]
    out_file: Option<PathBuf>,
}

fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logger();

    if let Some(image) = args.implant {
        let (Some(in_file), Some(out_file)) = (args.in_file, args.out_file) else {
            Args::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "--implant requires both --in-file and --out-file",
                )
                .exit();
        };
        let payload = fs::read(&in_file)?;
        let cover = fs::read(&image)?;
        info!(
            "Implanting {} bytes from {} into {}",
            payload.len(),
            in_file.display(),
            image.display()
        );
        let stego = pngsteg::implant(&cover, &payload)?;
        fs::write(&out_file, stego)?;
        info!("Wrote {}", out_file.display());
    } else if let Some(image) = args.extract {
        let stego = fs::read(&image)?;
        info!("Extracting from {}", image.display());
        let payload = pngsteg::extract(&stego)?;
        info!("Recovered {} bytes", payload.len());
        match args.out_file {
            Some(out_file) => {
                fs::write(&out_file, payload)?;
                info!("Wrote {}", out_file.display());
            }
            None => io::stdout().write_all(&payload)?,
        }
    }

    Ok(())
}
