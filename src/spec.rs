// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The external spec document and data maps.
//!
//! The spec JSON names model inputs and outputs, forced separations, and
//! dimension families. Fields ending in `Names` carry source-level names
//! and are canonicalized on access; the bare fields are canonical already
//! (canonicalization is idempotent, so everything goes through it).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::common::{canonicalize, canonicalize_var_ref, Ident, Result};
use crate::model_err;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Spec {
    pub input_vars: Vec<String>,
    pub input_var_names: Vec<String>,
    pub output_vars: Vec<String>,
    pub output_var_names: Vec<String>,
    pub special_separation_dims: HashMap<String, String>,
    pub dimension_families: HashMap<String, String>,
    /// Pass-through for the code generator; the analyzer never inspects it.
    pub bindings: Option<serde_json::Value>,
}

impl Spec {
    pub fn from_json(text: &str) -> Result<Spec> {
        match serde_json::from_str(text) {
            Ok(spec) => Ok(spec),
            Err(err) => model_err!(Generic, format!("spec document: {}", err)),
        }
    }

    /// Canonical input names, `inputVars` then canonicalized
    /// `inputVarNames`, de-duplicated in order.
    pub fn input_names(&self) -> Vec<Ident> {
        merged_names(&self.input_vars, &self.input_var_names)
    }

    /// Canonical output names; entries may carry an `[index]` suffix.
    pub fn output_names(&self) -> Vec<Ident> {
        merged_names(&self.output_vars, &self.output_var_names)
    }

    pub fn separation_dims(&self) -> HashMap<Ident, Ident> {
        self.special_separation_dims
            .iter()
            .map(|(var, dim)| (canonicalize(var), canonicalize(dim)))
            .collect()
    }

    pub fn families(&self) -> HashMap<Ident, Ident> {
        self.dimension_families
            .iter()
            .map(|(dim, family)| (canonicalize(dim), canonicalize(family)))
            .collect()
    }

    /// Dead-code elimination runs only when both inputs and outputs are
    /// declared.
    pub fn dce_enabled(&self) -> bool {
        !(self.input_vars.is_empty() && self.input_var_names.is_empty())
            && !(self.output_vars.is_empty() && self.output_var_names.is_empty())
    }
}

fn merged_names(canonical: &[String], source: &[String]) -> Vec<Ident> {
    let mut out: Vec<Ident> = Vec::with_capacity(canonical.len() + source.len());
    for name in canonical.iter().chain(source.iter()) {
        let name = canonicalize_var_ref(name);
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Preloaded time series keyed by canonical variable name, consumed when
/// synthesizing lookups for spec variables with no equation.
pub type ExtData = HashMap<Ident, Vec<(f64, f64)>>;

/// One tabular dataset, as loaded from a data file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectDataTable {
    pub rows: Vec<Vec<String>>,
}

/// Tabular datasets keyed by dataset tag (e.g. `?data`), consumed by
/// `GET DIRECT DATA`.
pub type DirectData = HashMap<String, DirectDataTable>;

impl DirectDataTable {
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut rdr = match csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
        {
            Ok(rdr) => rdr,
            Err(err) => {
                return model_err!(BadTable, format!("{}: {}", path.display(), err));
            }
        };
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in rdr.records() {
            match record {
                Ok(record) => {
                    rows.push(record.iter().map(|field| field.trim().to_string()).collect())
                }
                Err(err) => {
                    return model_err!(BadTable, format!("{}: {}", path.display(), err));
                }
            }
        }
        Ok(DirectDataTable { rows })
    }

    fn cell(&self, col: usize, row: usize) -> Option<&str> {
        let field = self.rows.get(row)?.get(col)?;
        if field.is_empty() {
            None
        } else {
            Some(field.as_str())
        }
    }

    fn numeric_cell(&self, col: usize, row: usize) -> Option<f64> {
        self.cell(col, row).and_then(|field| field.parse().ok())
    }

    /// Extracts a `(time, value)` series. A numeric `time_row_or_col`
    /// names the 1-based row holding time values, read along the anchor
    /// cell's row; an alphabetic one names the column holding them, read
    /// down from the anchor cell.
    pub fn series(&self, time_row_or_col: &str, cell: &str) -> Result<Vec<(f64, f64)>> {
        let (col, row) = parse_cell_ref(cell)?;
        let mut points: Vec<(f64, f64)> = Vec::new();
        if let Ok(time_row) = time_row_or_col.trim().parse::<usize>() {
            if time_row == 0 {
                return model_err!(BadTable, format!("bad time row in {}", time_row_or_col));
            }
            let time_row = time_row - 1;
            let mut c = col;
            while let (Some(t), Some(v)) = (self.numeric_cell(c, time_row), self.numeric_cell(c, row))
            {
                points.push((t, v));
                c += 1;
            }
        } else {
            let time_col = column_number(time_row_or_col.trim())?;
            let mut r = row;
            while let (Some(t), Some(v)) = (self.numeric_cell(time_col, r), self.numeric_cell(col, r))
            {
                points.push((t, v));
                r += 1;
            }
        }
        Ok(points)
    }
}

/// Parses a spreadsheet-style cell reference like `B2` into 0-based
/// `(column, row)`.
pub(crate) fn parse_cell_ref(cell: &str) -> Result<(usize, usize)> {
    let cell = cell.trim();
    let split = cell.find(|ch: char| ch.is_ascii_digit());
    let (letters, digits) = match split {
        Some(pos) if pos > 0 => cell.split_at(pos),
        _ => {
            return model_err!(BadTable, format!("bad cell reference {}", cell));
        }
    };
    let col = column_number(letters)?;
    let row: usize = match digits.parse() {
        Ok(row) if row > 0 => row,
        _ => {
            return model_err!(BadTable, format!("bad cell reference {}", cell));
        }
    };
    Ok((col, row - 1))
}

fn column_number(letters: &str) -> Result<usize> {
    let mut col: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return model_err!(BadTable, format!("bad column reference {}", letters));
        }
        col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    if col == 0 {
        return model_err!(BadTable, format!("bad column reference {}", letters));
    }
    Ok(col - 1)
}
