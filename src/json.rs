// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON listing for downstream consumers.
//!
//! The serialization is canonical: dimensions sorted by name, variables in
//! listing order, fixed field order, no map iteration anywhere. Identical
//! inputs produce byte-identical output.

use serde::Serialize;

use crate::common::Result;
use crate::model::Analyzer;
use crate::model_err;
use crate::variable::VarType;

// Helper functions for serde skip_serializing_if

fn is_empty_vec<T>(val: &[T]) -> bool {
    val.is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDimension {
    pub name: String,
    pub family: String,
    pub value: Vec<String>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonVariable {
    pub ref_id: String,
    pub var_name: String,
    #[serde(skip_serializing_if = "is_empty_vec")]
    pub subscripts: Vec<String>,
    #[serde(skip_serializing_if = "is_empty_vec")]
    pub families: Vec<String>,
    #[serde(skip_serializing_if = "is_empty_vec")]
    pub references: Vec<String>,
    #[serde(skip_serializing_if = "is_empty_vec")]
    pub init_references: Vec<String>,
    pub has_init_value: bool,
    pub var_type: String,
    #[serde(skip_serializing_if = "is_empty_vec")]
    pub separation_dims: Vec<String>,
    #[serde(rename = "modelLHS")]
    pub model_lhs: String,
    pub model_formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonListing {
    pub dimensions: Vec<JsonDimension>,
    pub variables: Vec<JsonVariable>,
}

impl Analyzer {
    pub fn json_listing(&self) -> Result<JsonListing> {
        let subscripts = self.subscripts();
        let mut dimensions: Vec<JsonDimension> = subscripts
            .all_dimensions()
            .into_iter()
            .chain(subscripts.all_aliases())
            .map(|dim| JsonDimension {
                name: dim.name.clone(),
                family: dim.family.clone(),
                value: dim.value.clone(),
                size: dim.size,
            })
            .collect();
        dimensions.sort_by(|a, b| a.name.cmp(&b.name));

        let index_info = self.var_index_info()?;
        let var_index = |name: &str| -> Option<usize> {
            index_info
                .iter()
                .find(|info| info.var_name == name)
                .map(|info| info.var_index)
        };

        let variables: Vec<JsonVariable> = self
            .eval_order_listing()?
            .into_iter()
            .map(|var| {
                let families: Vec<String> = var
                    .subscripts
                    .iter()
                    .map(|sub| {
                        subscripts
                            .family_of(sub)
                            .unwrap_or(sub.as_str())
                            .to_string()
                    })
                    .collect();
                let var_index = match var.var_type {
                    VarType::Data | VarType::Lookup => None,
                    _ => var_index(&var.var_name),
                };
                JsonVariable {
                    ref_id: var.ref_id.clone(),
                    var_name: var.var_name.clone(),
                    subscripts: var.subscripts.to_vec(),
                    families,
                    references: var.references.clone(),
                    init_references: var.init_references.clone(),
                    has_init_value: var.has_init_value,
                    var_type: var.var_type.to_string(),
                    separation_dims: var.separation_dims.clone(),
                    model_lhs: var.model_lhs.clone(),
                    model_formula: var.model_formula.clone(),
                    var_index,
                }
            })
            .collect();

        Ok(JsonListing {
            dimensions,
            variables,
        })
    }

    /// The canonical serialized listing.
    pub fn json_list(&self) -> Result<String> {
        let listing = self.json_listing()?;
        match serde_json::to_string_pretty(&listing) {
            Ok(text) => Ok(text),
            Err(err) => model_err!(Generic, format!("listing serialization: {}", err)),
        }
    }
}
