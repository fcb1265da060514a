//! Command-line entry point: run the method drivers described by a YAML
//! configuration file.

use chem::app::ChemApplication;
use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    ChemApplication::from_cli()?.run()
}
