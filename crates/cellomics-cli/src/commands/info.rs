use std::path::PathBuf;

use anyhow::Result;
use cellomics_core::filename::{plate_from_directory_name, FilenameRecord};
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Cellomics tile filenames
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    for file in &args.files {
        let record = FilenameRecord::decode(file)?;

        println!("File:        {}", file.display());
        if !record.directory.is_empty() {
            println!("Directory:   {}", record.directory);
            if let Ok(plate) = plate_from_directory_name(&record.directory) {
                println!("Dir plate:   {}", plate);
            }
        }
        println!("Prefix:      {}", record.prefix);
        println!("Plate:       {}", record.plate);
        println!("Well:        {}", record.well);
        println!("Column:      {}", record.column());
        println!("Field:       {}", record.field);
        println!("Channel:     {}", record.channel);
        println!("Suffix:      {}", record.suffix);
        println!("Output name: {}", record.output_filename());
        println!();
    }

    Ok(())
}
