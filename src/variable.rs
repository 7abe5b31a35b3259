// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;
use std::fmt;

use smallvec::SmallVec;

use crate::ast::EquationRhs;
use crate::common::Ident;
use crate::dimensions::SubscriptList;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarType {
    Const,
    Lookup,
    Data,
    Aux,
    Level,
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VarType::Const => "const",
            VarType::Lookup => "lookup",
            VarType::Data => "data",
            VarType::Aux => "aux",
            VarType::Level => "level",
        };
        write!(f, "{}", name)
    }
}

/// One analyzed variable: a single equation head, or one variant of a
/// non-apply-to-all array.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub var_name: Ident,
    /// Unique id: `var_name` for scalars and apply-to-all arrays,
    /// `var_name[subs]` for non-apply-to-all variants.
    pub ref_id: Ident,
    pub model_lhs: String,
    pub model_formula: String,
    /// Canonical subscript tokens in normal family order.
    pub subscripts: SubscriptList,
    /// Dimensions this variable was split on for non-apply-to-all
    /// semantics.
    pub separation_dims: Vec<Ident>,
    pub var_type: VarType,
    pub has_init_value: bool,
    /// `(x, y)` pairs for lookups and data variables.
    pub points: Vec<(f64, f64)>,
    pub references: Vec<Ident>,
    pub init_references: Vec<Ident>,
    pub referenced_lookup_var_names: Vec<Ident>,
    pub referenced_function_names: Vec<Ident>,
    /// Parsed right-hand side, retained until equation reading consumes it.
    pub eqn: Option<EquationRhs>,
}

impl Variable {
    pub fn new(var_name: Ident, model_lhs: String, model_formula: String) -> Self {
        Variable {
            ref_id: var_name.clone(),
            var_name,
            model_lhs,
            model_formula,
            subscripts: SmallVec::new(),
            separation_dims: Vec::new(),
            var_type: VarType::Aux,
            has_init_value: false,
            points: Vec::new(),
            references: Vec::new(),
            init_references: Vec::new(),
            referenced_lookup_var_names: Vec::new(),
            referenced_function_names: Vec::new(),
            eqn: None,
        }
    }

    pub fn is_separated(&self) -> bool {
        !self.separation_dims.is_empty()
    }

    /// Appends a reference, keeping the list duplicate-free in insertion
    /// order.
    pub fn push_reference(&mut self, ref_id: Ident) {
        if !self.references.contains(&ref_id) {
            self.references.push(ref_id);
        }
    }

    pub fn push_init_reference(&mut self, ref_id: Ident) {
        if !self.init_references.contains(&ref_id) {
            self.init_references.push(ref_id);
        }
    }
}

/// The variable table: an insertion-ordered arena plus a by-name index.
/// Variables are referred to by `refId` (or arena index internally), never
/// by pointer, so that mutually-referencing variables need no special
/// handling.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    vars: Vec<Variable>,
    by_name: HashMap<Ident, Vec<usize>>,
}

impl VariableTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reset(&mut self) {
        self.vars.clear();
        self.by_name.clear();
    }

    pub fn add(&mut self, var: Variable) -> usize {
        let idx = self.vars.len();
        self.by_name
            .entry(var.var_name.clone())
            .or_default()
            .push(idx);
        self.vars.push(var);
        idx
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Variable {
        &self.vars[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Variable {
        &mut self.vars[idx]
    }

    pub fn all(&self) -> &[Variable] {
        &self.vars
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.vars.iter_mut()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All variants registered under a canonical name, in insertion order.
    pub fn vars_with_name(&self, name: &str) -> Vec<&Variable> {
        match self.by_name.get(name) {
            Some(indices) => indices.iter().map(|&i| &self.vars[i]).collect(),
            None => Vec::new(),
        }
    }

    pub fn indices_with_name(&self, name: &str) -> Vec<usize> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    /// The first variant registered under a canonical name.
    pub fn var_with_name(&self, name: &str) -> Option<&Variable> {
        self.by_name
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&i| &self.vars[i])
    }

    pub fn ref_ids_with_name(&self, name: &str) -> Vec<Ident> {
        self.vars_with_name(name)
            .into_iter()
            .map(|v| v.ref_id.clone())
            .collect()
    }

    /// Sorted, de-duplicated list of all variable names.
    pub fn all_var_names(&self) -> Vec<Ident> {
        let mut names: Vec<Ident> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops variables failing the predicate and rebuilds the by-name map,
    /// preserving insertion order of the survivors.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: Fn(&Variable) -> bool,
    {
        self.vars.retain(|v| keep(v));
        self.rebuild_index();
    }

    /// Drops the variables at the given arena indices.
    pub fn remove_indices(&mut self, drop: &[usize]) {
        let mut idx = 0;
        self.vars.retain(|_| {
            let keep = !drop.contains(&idx);
            idx += 1;
            keep
        });
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.by_name.clear();
        for (idx, var) in self.vars.iter().enumerate() {
            self.by_name
                .entry(var.var_name.clone())
                .or_default()
                .push(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable::new(name.to_string(), name.to_string(), String::new())
    }

    #[test]
    fn test_table_ops() {
        let mut table = VariableTable::new();
        table.add(var("_b"));
        table.add(var("_a"));
        let mut v = var("_a");
        v.ref_id = "_a[_r2]".to_string();
        table.add(v);

        assert_eq!(3, table.len());
        assert_eq!(2, table.vars_with_name("_a").len());
        assert_eq!("_a", table.var_with_name("_a").unwrap().ref_id);
        assert_eq!(vec!["_a", "_a[_r2]"], table.ref_ids_with_name("_a"));
        assert_eq!(vec!["_a", "_b"], table.all_var_names());
        assert!(table.vars_with_name("_missing").is_empty());
    }

    #[test]
    fn test_retain_rebuilds_index() {
        let mut table = VariableTable::new();
        table.add(var("_a"));
        table.add(var("_b"));
        table.add(var("_c"));
        table.retain(|v| v.var_name != "_b");
        assert_eq!(2, table.len());
        assert!(!table.contains_name("_b"));
        assert_eq!("_c", table.get(1).var_name);
        assert_eq!(vec![1], table.indices_with_name("_c"));
    }
}
