use crate::config::Config;
use color_eyre::eyre::{eyre, Result};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use tracing::info;

/// Elements and coordinates prepared from the user configuration.
pub struct Geometry {
    pub elements: Vec<Element>,
    pub coords: Vec<Vector3<f64>>,
}

impl Geometry {
    pub fn num_electrons(&self, charge: i32) -> i64 {
        let nuclear: i64 = self
            .elements
            .iter()
            .map(|e| e.get_atomic_number() as i64)
            .sum();
        nuclear - charge as i64
    }
}

/// Build the molecular geometry defined in the YAML configuration.
pub fn build_geometry(config: &Config) -> Result<Geometry> {
    info!("Preparing geometry...");

    let mut elements = Vec::with_capacity(config.geometry.len());
    let mut coords = Vec::with_capacity(config.geometry.len());

    for atom in &config.geometry {
        let element = Element::from_symbol(&atom.element)
            .ok_or_else(|| eyre!("Invalid element symbol: {}", atom.element))?;
        elements.push(element);
        coords.push(Vector3::new(atom.coords[0], atom.coords[1], atom.coords[2]));
    }

    if elements.is_empty() {
        return Err(eyre!("Configuration contains no atoms"));
    }

    Ok(Geometry { elements, coords })
}
