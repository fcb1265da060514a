//! Contracted Gaussian-type orbitals and NWChem-format basis sets.
//!
//! A `ContractedGto` is a fixed linear combination of primitives sharing one
//! angular momentum. `NwchemBasis` holds every contracted function an element
//! contributes, parsed from the NWChem text format used by the Basis Set
//! Exchange, e.g.:
//!
//! ```text
//! BASIS "ao basis" SPHERICAL PRINT
//! #BASIS SET: (3s) -> [1s]
//! H    S
//!       3.42525091             0.15432897
//!       0.62391373             0.53532814
//!       0.16885540             0.44463454
//! END
//! ```

use crate::basis::{AOBasis, Basis};
use crate::gto::Gto;
use itertools::iproduct;
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::sync::Arc;

/// Contraction of primitive Gaussians with fixed coefficients.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContractedGto {
    pub primitives: Vec<Gto>,
    pub coefficients: Vec<f64>,
    /// "1s", "2s", "2px", ...
    pub shell_type: String,
    pub n: i32,
    pub l: i32,
    pub m: i32,
}

impl ContractedGto {
    pub fn new(shell_type: &str, n: i32, l: i32, m: i32) -> Self {
        Self {
            primitives: Vec::new(),
            coefficients: Vec::new(),
            shell_type: shell_type.to_string(),
            n,
            l,
            m,
        }
    }

    pub fn push_primitive(&mut self, alpha: f64, coefficient: f64, l_xyz: Vector3<i32>) {
        self.primitives
            .push(Gto::new(alpha, l_xyz, Vector3::zeros()));
        self.coefficients.push(coefficient);
    }

    /// Rescale the contraction coefficients so that ⟨φ|φ⟩ = 1. Published
    /// coefficients assume normalized primitives but leave the contraction
    /// itself only approximately normalized.
    pub fn normalize(&mut self) {
        let self_overlap = Self::Sab(self, self);
        if self_overlap > 0.0 {
            let scale = 1.0 / self_overlap.sqrt();
            for c in &mut self.coefficients {
                *c *= scale;
            }
        }
    }

    /// Rebuild every primitive on a new atomic center.
    pub fn set_center(&mut self, center: Vector3<f64>) {
        for p in &mut self.primitives {
            *p = Gto::new(p.alpha, p.l_xyz, center);
        }
    }
}

impl Basis for ContractedGto {
    fn evaluate(&self, r: &Vector3<f64>) -> f64 {
        self.primitives
            .iter()
            .zip(&self.coefficients)
            .map(|(p, c)| c * p.evaluate(r))
            .sum()
    }

    fn Sab(a: &Self, b: &Self) -> f64 {
        iproduct!(0..a.primitives.len(), 0..b.primitives.len())
            .map(|(i, j)| {
                a.coefficients[i]
                    * b.coefficients[j]
                    * Gto::Sab(&a.primitives[i], &b.primitives[j])
            })
            .sum()
    }

    fn Tab(a: &Self, b: &Self) -> f64 {
        iproduct!(0..a.primitives.len(), 0..b.primitives.len())
            .map(|(i, j)| {
                a.coefficients[i]
                    * b.coefficients[j]
                    * Gto::Tab(&a.primitives[i], &b.primitives[j])
            })
            .sum()
    }

    fn Vab(a: &Self, b: &Self, center: Vector3<f64>, charge: u32) -> f64 {
        iproduct!(0..a.primitives.len(), 0..b.primitives.len())
            .map(|(i, j)| {
                a.coefficients[i]
                    * b.coefficients[j]
                    * Gto::Vab(&a.primitives[i], &b.primitives[j], center, charge)
            })
            .sum()
    }

    fn JKabcd(a: &Self, b: &Self, c: &Self, d: &Self) -> f64 {
        iproduct!(
            0..a.primitives.len(),
            0..b.primitives.len(),
            0..c.primitives.len(),
            0..d.primitives.len()
        )
        .map(|(i, j, k, l)| {
            a.coefficients[i]
                * b.coefficients[j]
                * c.coefficients[k]
                * d.coefficients[l]
                * Gto::JKabcd(
                    &a.primitives[i],
                    &b.primitives[j],
                    &c.primitives[k],
                    &d.primitives[l],
                )
        })
        .sum()
    }
}

/// Errors raised while reading NWChem basis set text.
#[derive(Debug)]
pub enum BasisParseError {
    UnknownElement(String),
    InconsistentElement { expected: String, found: String },
    UnsupportedShell(String),
    MalformedRow(String),
    Empty,
}

impl fmt::Display for BasisParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisParseError::UnknownElement(sym) => write!(f, "unknown element symbol: {}", sym),
            BasisParseError::InconsistentElement { expected, found } => write!(
                f,
                "basis text mixes elements: expected {}, found {}",
                expected, found
            ),
            BasisParseError::UnsupportedShell(kind) => {
                write!(f, "unsupported shell type: {}", kind)
            }
            BasisParseError::MalformedRow(row) => write!(f, "malformed primitive row: {}", row),
            BasisParseError::Empty => write!(f, "no shells found in basis text"),
        }
    }
}

impl std::error::Error for BasisParseError {}

/// Per-element basis set parsed from NWChem-format text.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NwchemBasis {
    /// Basis set family, e.g. "sto-3g".
    pub name: String,
    pub element: String,
    pub atomic_number: u32,
    pub shells: Vec<ContractedGto>,
    center: Vector3<f64>,
}

enum ShellKind {
    S,
    P,
    Sp,
}

impl ShellKind {
    fn parse(token: &str) -> Option<ShellKind> {
        match token {
            "S" => Some(ShellKind::S),
            "P" => Some(ShellKind::P),
            "SP" => Some(ShellKind::Sp),
            _ => None,
        }
    }
}

impl NwchemBasis {
    /// Parse one element's shells from NWChem-format text.
    pub fn parse_nwchem(name: &str, input: &str) -> Result<Self, BasisParseError> {
        let mut basis = NwchemBasis {
            name: name.to_string(),
            element: String::new(),
            atomic_number: 0,
            shells: Vec::new(),
            center: Vector3::zeros(),
        };

        // principal quantum number bookkeeping per angular momentum
        let mut n_s = 0;
        let mut n_p = 1;

        let mut current: Option<(ShellKind, Vec<String>)> = None;

        for raw in input.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("BASIS") {
                continue;
            }
            if line.eq_ignore_ascii_case("END") {
                break;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() == 2 && tokens[0].chars().all(char::is_alphabetic) {
                if let Some(kind) = ShellKind::parse(tokens[1]) {
                    basis.record_element(tokens[0])?;
                    if let Some((prev_kind, rows)) = current.take() {
                        basis.finish_shell(prev_kind, &rows, &mut n_s, &mut n_p)?;
                    }
                    current = Some((kind, Vec::new()));
                    continue;
                }
                return Err(BasisParseError::UnsupportedShell(tokens[1].to_string()));
            }

            match current.as_mut() {
                Some((_, rows)) => rows.push(line.to_string()),
                None => return Err(BasisParseError::MalformedRow(line.to_string())),
            }
        }

        if let Some((kind, rows)) = current.take() {
            basis.finish_shell(kind, &rows, &mut n_s, &mut n_p)?;
        }

        if basis.shells.is_empty() {
            return Err(BasisParseError::Empty);
        }

        for shell in &mut basis.shells {
            shell.normalize();
        }
        Ok(basis)
    }

    fn record_element(&mut self, symbol: &str) -> Result<(), BasisParseError> {
        let element = Element::from_symbol(symbol)
            .ok_or_else(|| BasisParseError::UnknownElement(symbol.to_string()))?;
        if self.element.is_empty() {
            self.element = element.get_symbol().to_string();
            self.atomic_number = element.get_atomic_number() as u32;
        } else if self.element != element.get_symbol() {
            return Err(BasisParseError::InconsistentElement {
                expected: self.element.clone(),
                found: symbol.to_string(),
            });
        }
        Ok(())
    }

    fn finish_shell(
        &mut self,
        kind: ShellKind,
        rows: &[String],
        n_s: &mut i32,
        n_p: &mut i32,
    ) -> Result<(), BasisParseError> {
        let parsed: Vec<Vec<f64>> = rows
            .iter()
            .map(|row| {
                row.split_whitespace()
                    .map(|tok| {
                        // Fortran exponent markers occasionally appear
                        tok.replace(['D', 'd'], "E")
                            .parse::<f64>()
                            .map_err(|_| BasisParseError::MalformedRow(row.clone()))
                    })
                    .collect()
            })
            .collect::<Result<_, _>>()?;

        let columns = match kind {
            ShellKind::S | ShellKind::P => 2,
            ShellKind::Sp => 3,
        };
        if let Some(bad) = parsed.iter().find(|row| row.len() != columns) {
            return Err(BasisParseError::MalformedRow(format!("{:?}", bad)));
        }

        match kind {
            ShellKind::S => {
                *n_s += 1;
                let mut shell = ContractedGto::new(&format!("{}s", n_s), *n_s, 0, 0);
                for row in &parsed {
                    shell.push_primitive(row[0], row[1], Vector3::zeros());
                }
                self.shells.push(shell);
            }
            ShellKind::P => {
                *n_p += 1;
                self.push_p_shell(&parsed, *n_p, 1);
            }
            ShellKind::Sp => {
                *n_s += 1;
                *n_p += 1;
                let mut s_shell = ContractedGto::new(&format!("{}s", n_s), *n_s, 0, 0);
                for row in &parsed {
                    s_shell.push_primitive(row[0], row[1], Vector3::zeros());
                }
                self.shells.push(s_shell);
                self.push_p_shell(&parsed, *n_p, 2);
            }
        }
        Ok(())
    }

    fn push_p_shell(&mut self, rows: &[Vec<f64>], n: i32, coeff_col: usize) {
        let axes = [
            ("px", Vector3::new(1, 0, 0), 1),
            ("py", Vector3::new(0, 1, 0), -1),
            ("pz", Vector3::new(0, 0, 1), 0),
        ];
        for (label, l_xyz, m) in axes {
            let mut shell = ContractedGto::new(&format!("{}{}", n, label), n, 1, m);
            for row in rows {
                shell.push_primitive(row[0], row[coeff_col], l_xyz);
            }
            self.shells.push(shell);
        }
    }

    pub fn to_pickle(&self) -> Result<Vec<u8>, serde_pickle::Error> {
        serde_pickle::to_vec(self, serde_pickle::SerOptions::new())
    }

    pub fn from_pickle(bytes: &[u8]) -> Result<Self, serde_pickle::Error> {
        serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new())
    }

    pub fn save_to_file(&self, filename: &str) -> std::io::Result<()> {
        let serialized = self
            .to_pickle()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        let mut file = File::create(filename)?;
        file.write_all(&serialized)
    }

    pub fn load_from_file(filename: &str) -> std::io::Result<Self> {
        let mut file = File::open(filename)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_pickle(&buffer).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

impl AOBasis for NwchemBasis {
    type BasisType = ContractedGto;

    fn basis_size(&self) -> usize {
        self.shells.len()
    }

    fn get_basis(&self) -> Vec<Arc<ContractedGto>> {
        self.shells.iter().cloned().map(Arc::new).collect()
    }

    fn set_center(&mut self, center: Vector3<f64>) {
        self.center = center;
        for shell in &mut self.shells {
            shell.set_center(center);
        }
    }

    fn get_center(&self) -> Vector3<f64> {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STO3G_H: &str = r#"
BASIS "ao basis" SPHERICAL PRINT
#BASIS SET: (3s) -> [1s]
H    S
      3.42525091             0.15432897
      0.62391373             0.53532814
      0.16885540             0.44463454
END
"#;

    const STO3G_O: &str = r#"
BASIS "ao basis" SPHERICAL PRINT
#BASIS SET: (6s,3p) -> [2s,1p]
O    S
    130.7093200              0.15432897
     23.8088610              0.53532814
      6.4436083              0.44463454
O    SP
      5.0331513             -0.09996723             0.15591627
      1.1695961              0.39951283             0.60768372
      0.3803890              0.70011547             0.39195739
END
"#;

    #[test]
    fn parses_single_s_shell() {
        let basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_H).unwrap();
        assert_eq!(basis.element, "H");
        assert_eq!(basis.atomic_number, 1);
        assert_eq!(basis.shells.len(), 1);
        assert_eq!(basis.shells[0].shell_type, "1s");
        assert_eq!(basis.shells[0].primitives.len(), 3);
    }

    #[test]
    fn parses_sp_shells() {
        let basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_O).unwrap();
        assert_eq!(basis.atomic_number, 8);
        // 1s + (2s 2px 2py 2pz)
        assert_eq!(basis.shells.len(), 5);
        let labels: Vec<&str> = basis.shells.iter().map(|s| s.shell_type.as_str()).collect();
        assert_eq!(labels, vec!["1s", "2s", "2px", "2py", "2pz"]);
    }

    #[test]
    fn contractions_are_normalized() {
        let basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_O).unwrap();
        for shell in &basis.shells {
            let overlap = ContractedGto::Sab(shell, shell);
            assert!(
                (overlap - 1.0).abs() < 1e-10,
                "shell {} overlap {}",
                shell.shell_type,
                overlap
            );
        }
    }

    #[test]
    fn set_center_moves_every_primitive() {
        let mut basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_H).unwrap();
        let target = Vector3::new(0.0, 0.0, 1.4);
        basis.set_center(target);
        assert_eq!(basis.get_center(), target);
        for shell in &basis.shells {
            for p in &shell.primitives {
                assert_eq!(p.center, target);
            }
        }
    }

    #[test]
    fn pickle_round_trip() {
        let basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_O).unwrap();
        let bytes = basis.to_pickle().unwrap();
        let restored = NwchemBasis::from_pickle(&bytes).unwrap();
        assert_eq!(restored.element, basis.element);
        assert_eq!(restored.shells.len(), basis.shells.len());
    }

    #[test]
    fn rejects_garbage() {
        assert!(NwchemBasis::parse_nwchem("sto-3g", "H  Q\n1.0 1.0\n").is_err());
        assert!(NwchemBasis::parse_nwchem("sto-3g", "").is_err());
    }
}
