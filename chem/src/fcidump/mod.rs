//! FCIDUMP serialization.
//!
//! The standard Molpro-style format: a `&FCI` namelist header followed by
//! one integral per line, indices 1-based, `0 0 0 0` carrying the core
//! energy. Two-electron integrals are written once per 8-fold permutational
//! equivalence class and screened by magnitude.

use crate::cholesky_impl::SpatialEri;
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::DMatrix;
use std::fs;
use std::io::Write;
use std::path::Path;

const INTEGRAL_SCREEN: f64 = 1e-12;

/// Contents of an FCIDUMP file.
pub struct FcidumpData {
    pub norb: usize,
    pub nelec: usize,
    pub ms2: i32,
    pub core_energy: f64,
    pub h1: DMatrix<f64>,
    pub eri: SpatialEri,
}

/// Write integrals to `path` in FCIDUMP format.
pub fn write_fcidump<P: AsRef<Path>>(
    path: P,
    h1: &DMatrix<f64>,
    eri: &SpatialEri,
    nelec: usize,
    ms2: i32,
    core_energy: f64,
) -> Result<()> {
    let norb = h1.nrows();
    assert_eq!(norb, h1.ncols());
    assert_eq!(norb, eri.n);

    let mut out = Vec::new();
    let orbsym = vec!["1"; norb].join(",");
    writeln!(out, "&FCI NORB={:4}, NELEC={:3}, MS2={:2},", norb, nelec, ms2)?;
    writeln!(out, "  ORBSYM={},", orbsym)?;
    writeln!(out, "  ISYM=1,")?;
    writeln!(out, " &END")?;

    // unique two-electron integrals: p >= q, r >= s, (pq) >= (rs)
    for p in 0..norb {
        for q in 0..=p {
            let pq = p * (p + 1) / 2 + q;
            for r in 0..norb {
                for s in 0..=r {
                    let rs = r * (r + 1) / 2 + s;
                    if rs > pq {
                        continue;
                    }
                    let value = eri.get(p, q, r, s);
                    if value.abs() > INTEGRAL_SCREEN {
                        writeln!(
                            out,
                            "{:>24.16E} {:4} {:4} {:4} {:4}",
                            value,
                            p + 1,
                            q + 1,
                            r + 1,
                            s + 1
                        )?;
                    }
                }
            }
        }
    }

    // one-electron integrals
    for p in 0..norb {
        for q in 0..=p {
            let value = h1[(p, q)];
            if value.abs() > INTEGRAL_SCREEN {
                writeln!(out, "{:>24.16E} {:4} {:4} {:4} {:4}", value, p + 1, q + 1, 0, 0)?;
            }
        }
    }

    // core energy
    writeln!(out, "{:>24.16E} {:4} {:4} {:4} {:4}", core_energy, 0, 0, 0, 0)?;

    fs::write(path.as_ref(), out)
        .wrap_err_with(|| format!("Failed to write FCIDUMP file: {}", path.as_ref().display()))
}

fn header_field(header: &str, key: &str) -> Result<i64> {
    let upper = header.to_uppercase();
    let start = upper
        .find(&format!("{}=", key))
        .ok_or_else(|| eyre!("FCIDUMP header missing {}", key))?
        + key.len()
        + 1;
    let rest = &header[start..];
    let token: String = rest
        .chars()
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit() || *c == '-' || *c == '+')
        .collect();
    token
        .parse::<i64>()
        .wrap_err_with(|| format!("Malformed {} field in FCIDUMP header", key))
}

/// Read an FCIDUMP file back, expanding the permutational symmetry.
pub fn read_fcidump<P: AsRef<Path>>(path: P) -> Result<FcidumpData> {
    let text = fs::read_to_string(path.as_ref())
        .wrap_err_with(|| format!("Failed to read FCIDUMP file: {}", path.as_ref().display()))?;

    let end = text
        .to_uppercase()
        .find("&END")
        .ok_or_else(|| eyre!("FCIDUMP header is not terminated by &END"))?;
    let header = &text[..end];
    let body = &text[end + 4..];

    let norb = header_field(header, "NORB")? as usize;
    let nelec = header_field(header, "NELEC")? as usize;
    let ms2 = header_field(header, "MS2")? as i32;

    let mut h1 = DMatrix::zeros(norb, norb);
    let mut eri = SpatialEri::zeros(norb);
    let mut core_energy = 0.0;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 5 {
            return Err(eyre!("malformed FCIDUMP line: {}", line));
        }
        let value: f64 = tokens[0]
            .parse()
            .wrap_err_with(|| format!("malformed FCIDUMP value: {}", tokens[0]))?;
        let idx: Vec<usize> = tokens[1..]
            .iter()
            .map(|t| t.parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .wrap_err_with(|| format!("malformed FCIDUMP indices: {}", line))?;
        let (i, j, k, l) = (idx[0], idx[1], idx[2], idx[3]);

        if i == 0 && j == 0 && k == 0 && l == 0 {
            core_energy = value;
        } else if k == 0 && l == 0 {
            h1[(i - 1, j - 1)] = value;
            h1[(j - 1, i - 1)] = value;
        } else {
            let (p, q, r, s) = (i - 1, j - 1, k - 1, l - 1);
            for &(a, b, c, d) in &[
                (p, q, r, s),
                (q, p, r, s),
                (p, q, s, r),
                (q, p, s, r),
                (r, s, p, q),
                (s, r, p, q),
                (r, s, q, p),
                (s, r, q, p),
            ] {
                eri.set(a, b, c, d, value);
            }
        }
    }

    Ok(FcidumpData {
        norb,
        nelec,
        ms2,
        core_energy,
        h1,
        eri,
    })
}
