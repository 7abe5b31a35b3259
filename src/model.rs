// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The analyzer context: owns the subscript and variable tables and runs
//! the analysis pipeline over a parsed model.
//!
//! Variables refer to each other by `refId`, never by pointer, so
//! mutually-referencing levels and lookup-through-function references need
//! no special representation. The context is resettable: consumers run
//! several compilations per process.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::ast::{EquationDef, EquationLhs, EquationRhs, Expr, ParsedModel, SubscriptDefElements};
use crate::common::{
    base_name, canonicalize, decanonicalize, topo_sort, Ident, Result,
};
use crate::dimensions::SubscriptTable;
use crate::equation::{constant_value, read_equation, EquationReadResult, ReadContext};
use crate::reader::{time_placeholder, VariableReader};
use crate::reduce::{reduce, ReduceMode};
use crate::spec::{DirectData, ExtData, Spec};
use crate::variable::{VarType, Variable, VariableTable};
use crate::{eprintln, spec_err, var_err};

/// Variables always reachable when dead-code elimination runs.
const DCE_PINS: [&str; 4] = ["_initial_time", "_final_time", "_saveper", "_time_step"];

#[derive(Clone, Debug, Default)]
pub struct Options {
    pub reduce: ReduceMode,
}

#[derive(Clone, Debug)]
pub struct VarIndexInfo {
    pub var_name: Ident,
    pub var_index: usize,
    pub subscript_count: usize,
}

#[derive(Debug, Default)]
pub struct Analyzer {
    subscripts: SubscriptTable,
    vars: VariableTable,
    /// Per-position expansion flags for each non-apply-to-all name.
    expansion_flags: HashMap<Ident, Vec<bool>>,
    /// Sidecar memo of evaluated constant subexpressions, by source text.
    const_memo: HashMap<String, f64>,
    options: Options,
}

impl Analyzer {
    pub fn new(options: Options) -> Self {
        Analyzer {
            options,
            ..Default::default()
        }
    }

    /// Clears variable-side state so another model can be analyzed. The
    /// dimension table is reset by re-running resolution.
    pub fn reset(&mut self) {
        self.vars.reset();
        self.expansion_flags.clear();
        self.const_memo.clear();
    }

    /// Runs the full pipeline: dimension resolution, variable and
    /// equation reading, refId assignment, duplicate reconciliation, spec
    /// checking with lookup synthesis, and dead-code elimination.
    pub fn analyze(
        &mut self,
        model: &ParsedModel,
        spec: &Spec,
        ext_data: &ExtData,
        direct_data: &DirectData,
        model_dir: Option<&Path>,
    ) -> Result<()> {
        self.reset();
        self.subscripts.clear();

        self.read_subscript_ranges(model)?;
        self.subscripts.resolve(&spec.families(), model_dir)?;

        self.read_variables(model, &spec.separation_dims())?;
        self.detect_non_apply_to_all()?;
        self.assign_ref_ids();
        self.read_equations(spec, ext_data, direct_data)?;
        self.resolve_duplicate_declarations();
        self.check_spec(spec, ext_data, direct_data)?;
        if spec.dce_enabled() {
            self.remove_unused_variables(spec);
        }
        self.validate_references()?;
        Ok(())
    }

    pub fn subscripts(&self) -> &SubscriptTable {
        &self.subscripts
    }

    /// All analyzed variables in insertion order.
    pub fn variables(&self) -> &[Variable] {
        self.vars.all()
    }

    pub fn var_names(&self) -> Vec<Ident> {
        self.vars.all_var_names()
    }

    pub fn vars_with_name(&self, name: &str) -> Vec<&Variable> {
        self.vars.vars_with_name(name)
    }

    pub fn ref_ids_with_name(&self, name: &str) -> Vec<Ident> {
        self.vars.ref_ids_with_name(name)
    }

    /// Which subscript positions vary across a non-apply-to-all name's
    /// variants; `None` for scalars and apply-to-all arrays.
    pub fn expansion_flags(&self, var_name: &str) -> Option<&[bool]> {
        self.expansion_flags.get(var_name).map(|flags| flags.as_slice())
    }

    /// Source-level display form of a canonical name.
    pub fn vensim_name(&self, c_name: &str) -> String {
        decanonicalize(c_name)
    }

    /// Canonical form of a source-level name.
    pub fn c_name(&self, source_name: &str) -> Ident {
        canonicalize(source_name)
    }

    /// Resolves a textual refId to its variable: a direct match, a variant
    /// whose subscript pattern covers the reference, or the apply-to-all
    /// array with that base name.
    pub fn var_with_ref_id(&self, ref_id: &str) -> Option<&Variable> {
        self.index_with_ref_id(ref_id).map(|idx| self.vars.get(idx))
    }

    fn index_with_ref_id(&self, ref_id: &str) -> Option<usize> {
        let base = base_name(ref_id);
        let indices = self.vars.indices_with_name(base);
        if indices.is_empty() {
            return None;
        }
        if let Some(&idx) = indices.iter().find(|&&i| self.vars.get(i).ref_id == ref_id) {
            return Some(idx);
        }
        if let Some(open) = ref_id.find('[') {
            let subs: Vec<Ident> = ref_id[open + 1..]
                .trim_end_matches(']')
                .split(',')
                .map(|s| s.to_string())
                .collect();
            for &idx in indices.iter() {
                if self
                    .subscripts
                    .covers(&self.vars.get(idx).subscripts, &subs)
                {
                    return Some(idx);
                }
            }
        }
        if !self.expansion_flags.contains_key(base) {
            return indices.first().copied();
        }
        None
    }

    fn read_subscript_ranges(&mut self, model: &ParsedModel) -> Result<()> {
        for def in model.subscript_defs() {
            if let Some(family) = &def.alias_of {
                self.subscripts.add_alias(&def.name, family)?;
                continue;
            }
            match &def.elements {
                SubscriptDefElements::Names(elements) => {
                    self.subscripts
                        .add_dimension(&def.name, elements.clone(), def.mappings.clone())?;
                }
                SubscriptDefElements::Direct { file, tab, cell } => {
                    self.subscripts
                        .add_direct_dimension(&def.name, file, tab, cell)?;
                }
            }
        }
        Ok(())
    }

    fn read_variables(
        &mut self,
        model: &ParsedModel,
        separation_dims: &HashMap<Ident, Ident>,
    ) -> Result<()> {
        let defs = model.equation_defs();
        for def in defs {
            let reader = VariableReader {
                subscripts: &self.subscripts,
                separation_dims,
            };
            for var in reader.read(def)? {
                self.vars.add(var);
            }
        }
        // the placeholder is appended exactly once, whichever tree shape
        // produced the equations
        self.vars.add(time_placeholder());
        Ok(())
    }

    /// Marks names with several variants and records which subscript
    /// positions vary across them.
    fn detect_non_apply_to_all(&mut self) -> Result<()> {
        for name in self.vars.all_var_names() {
            let variants = self.vars.vars_with_name(&name);
            if variants.len() < 2 {
                continue;
            }
            let arity = variants[0].subscripts.len();
            if variants.iter().any(|v| v.subscripts.len() != arity) {
                return var_err!(
                    MismatchedDimensions,
                    format!(
                        "{} ({}): variants disagree on subscript arity at analysis",
                        name,
                        decanonicalize(&name)
                    )
                );
            }
            let mut flags = vec![false; arity];
            for (i, flag) in flags.iter_mut().enumerate() {
                let first = &variants[0].subscripts[i];
                *flag = variants.iter().any(|v| &v.subscripts[i] != first);
            }
            self.expansion_flags.insert(name, flags);
        }
        Ok(())
    }

    fn assign_ref_ids(&mut self) {
        let expansion_flags = &self.expansion_flags;
        for var in self.vars.iter_mut() {
            var.ref_id = if var.subscripts.is_empty()
                || !expansion_flags.contains_key(&var.var_name)
            {
                var.var_name.clone()
            } else {
                format!("{}[{}]", var.var_name, var.subscripts.join(","))
            };
        }
    }

    /// Values of scalar constant variables, used by aggressive reduction.
    /// Inputs stay opaque.
    fn constant_values(&self, spec: &Spec) -> HashMap<Ident, f64> {
        let inputs: HashSet<Ident> = spec
            .input_names()
            .iter()
            .map(|name| base_name(name).to_string())
            .collect();
        let mut out = HashMap::new();
        for var in self.vars.iter() {
            if !var.subscripts.is_empty() || inputs.contains(&var.var_name) {
                continue;
            }
            if let Some(EquationRhs::Expr(expr)) = &var.eqn {
                if let Some(value) = constant_value(expr) {
                    out.entry(var.var_name.clone()).or_insert(value);
                }
            }
        }
        out
    }

    fn read_equations(
        &mut self,
        spec: &Spec,
        ext_data: &ExtData,
        direct_data: &DirectData,
    ) -> Result<()> {
        let const_values = self.constant_values(spec);

        let mut results: Vec<(usize, Expr, EquationReadResult)> = Vec::new();
        for idx in 0..self.vars.len() {
            let eqn = self.vars.get(idx).eqn.clone();
            let expr = match eqn {
                Some(EquationRhs::Expr(expr)) => expr,
                _ => continue,
            };
            let expr = reduce(expr, self.options.reduce, &const_values, &mut self.const_memo);
            let reading = self.vars.get(idx).clone();
            let ctx = ReadContext {
                subscripts: &self.subscripts,
                vars: &self.vars,
                expansion_flags: &self.expansion_flags,
                direct_data,
            };
            let result = read_equation(&ctx, &reading, &expr)?;
            results.push((idx, expr, result));
        }
        for (idx, expr, result) in results {
            self.apply_read_result(idx, expr, result);
        }

        // declared data variables pick up their points from external data
        for idx in 0..self.vars.len() {
            let var = self.vars.get(idx);
            if var.var_type == VarType::Data && var.points.is_empty() {
                if let Some(points) = ext_data.get(&var.var_name) {
                    self.vars.get_mut(idx).points = points.clone();
                }
            }
        }
        Ok(())
    }

    fn apply_read_result(&mut self, idx: usize, expr: Expr, result: EquationReadResult) {
        let var = self.vars.get_mut(idx);
        if let Some(var_type) = result.var_type {
            var.var_type = var_type;
        }
        var.has_init_value |= result.has_init_value;
        if let Some(points) = result.points {
            var.points = points;
        }
        var.references = result.references;
        var.init_references = result.init_references;
        var.referenced_lookup_var_names = result.referenced_lookup_var_names;
        var.referenced_function_names = result.referenced_function_names;
        var.eqn = Some(EquationRhs::Expr(expr));
    }

    /// A name declared both `const` and `data` reconciles to `data`: the
    /// constant value becomes a flat two-point series and the duplicate
    /// record is dropped. An unparseable constant is diagnosed and left
    /// alone.
    fn resolve_duplicate_declarations(&mut self) {
        let mut dropped: Vec<usize> = Vec::new();
        for name in self.vars.all_var_names() {
            let indices = self.vars.indices_with_name(&name);
            if indices.len() < 2 {
                continue;
            }
            for &ci in indices.iter() {
                if self.vars.get(ci).var_type != VarType::Const {
                    continue;
                }
                let di = indices.iter().find(|&&i| {
                    let v = self.vars.get(i);
                    v.var_type == VarType::Data
                        && v.subscripts == self.vars.get(ci).subscripts
                        && !dropped.contains(&i)
                });
                let di = match di {
                    Some(&di) => di,
                    None => continue,
                };
                let formula = self.vars.get(ci).model_formula.clone();
                match formula.trim().parse::<f64>() {
                    Ok(k) => {
                        let var = self.vars.get_mut(ci);
                        var.var_type = VarType::Data;
                        var.points = vec![(-1e308, k), (1e308, k)];
                        dropped.push(di);
                    }
                    Err(_) => {
                        eprintln!(
                            "error: {} ({}) declared const and data, but {} is not a number",
                            name,
                            decanonicalize(&name),
                            formula
                        );
                    }
                }
            }
        }
        if !dropped.is_empty() {
            self.vars.remove_indices(&dropped);
        }
    }

    /// Ensures every declared input and output is backed by a variable,
    /// synthesizing `name = WITH LOOKUP(Time, ...)` from external data
    /// when available.
    fn check_spec(
        &mut self,
        spec: &Spec,
        ext_data: &ExtData,
        direct_data: &DirectData,
    ) -> Result<()> {
        let fields = [
            ("input", spec.input_names()),
            ("output", spec.output_names()),
        ];
        for (field, names) in fields {
            for name in names {
                let base = base_name(&name).to_string();
                if self.vars.contains_name(&base) {
                    continue;
                }
                let points = match ext_data.get(&base) {
                    Some(points) => points.clone(),
                    None => {
                        return spec_err!(
                            BadSpecVariable,
                            format!(
                                "{} ({}) is a spec {} with no equation and no external data",
                                base,
                                decanonicalize(&base),
                                field
                            )
                        );
                    }
                };
                let display = decanonicalize(&base).to_uppercase();
                let rhs = Expr::App(
                    "WITH LOOKUP".to_string(),
                    vec![
                        Expr::Var("Time".to_string(), Vec::new()),
                        Expr::Table(points),
                    ],
                );
                let def = EquationDef {
                    lhs: EquationLhs {
                        name: display.clone(),
                        subscripts: Vec::new(),
                    },
                    model_lhs: display,
                    model_formula: rhs.to_string(),
                    rhs: EquationRhs::Expr(rhs),
                };
                self.add_equation(&def, direct_data)?;
            }
        }
        Ok(())
    }

    /// Adds one equation through the same reader path normal equations
    /// take, reading its references immediately.
    pub fn add_equation(&mut self, def: &EquationDef, direct_data: &DirectData) -> Result<()> {
        let empty = HashMap::new();
        let new_vars = {
            let reader = VariableReader {
                subscripts: &self.subscripts,
                separation_dims: &empty,
            };
            reader.read(def)?
        };
        let mut added: Vec<usize> = Vec::with_capacity(new_vars.len());
        for var in new_vars {
            added.push(self.vars.add(var));
        }
        let mut results: Vec<(usize, Expr, EquationReadResult)> = Vec::new();
        for &idx in added.iter() {
            let expr = match &self.vars.get(idx).eqn {
                Some(EquationRhs::Expr(expr)) => expr.clone(),
                _ => continue,
            };
            let reading = self.vars.get(idx).clone();
            let ctx = ReadContext {
                subscripts: &self.subscripts,
                vars: &self.vars,
                expansion_flags: &self.expansion_flags,
                direct_data,
            };
            let result = read_equation(&ctx, &reading, &expr)?;
            results.push((idx, expr, result));
        }
        for (idx, expr, result) in results {
            self.apply_read_result(idx, expr, result);
        }
        Ok(())
    }

    /// Drops variables unreachable from the time pins, the inputs, and the
    /// outputs. Tracking is by base name, so every variant of a referenced
    /// array survives together.
    fn remove_unused_variables(&mut self, spec: &Spec) {
        let mut reachable: BTreeSet<Ident> = BTreeSet::new();
        let mut queue: VecDeque<Ident> = VecDeque::new();
        let enqueue =
            |name: Ident, reachable: &mut BTreeSet<Ident>, queue: &mut VecDeque<Ident>| {
                if reachable.insert(name.clone()) {
                    queue.push_back(name);
                }
            };

        for pin in DCE_PINS {
            enqueue(pin.to_string(), &mut reachable, &mut queue);
        }
        for name in spec.input_names() {
            enqueue(base_name(&name).to_string(), &mut reachable, &mut queue);
        }
        for name in spec.output_names() {
            enqueue(base_name(&name).to_string(), &mut reachable, &mut queue);
        }

        while let Some(name) = queue.pop_front() {
            for var in self.vars.vars_with_name(&name) {
                let mut found: Vec<Ident> = Vec::new();
                for ref_id in var.references.iter().chain(var.init_references.iter()) {
                    found.push(base_name(ref_id).to_string());
                }
                for lookup in var.referenced_lookup_var_names.iter() {
                    found.push(lookup.clone());
                }
                // a function call may name a lookup variable
                for fn_name in var.referenced_function_names.iter() {
                    if self.vars.contains_name(fn_name) {
                        found.push(fn_name.clone());
                    }
                }
                for name in found {
                    if reachable.insert(name.clone()) {
                        queue.push_back(name);
                    }
                }
            }
        }

        self.vars.retain(|v| reachable.contains(&v.var_name));
    }

    fn validate_references(&self) -> Result<()> {
        for var in self.vars.iter() {
            for ref_id in var.references.iter().chain(var.init_references.iter()) {
                if self.index_with_ref_id(ref_id).is_none() {
                    return var_err!(
                        UnknownDependency,
                        format!(
                            "{} referenced by {} ({}) at reference validation",
                            ref_id,
                            var.ref_id,
                            decanonicalize(&var.var_name)
                        )
                    );
                }
            }
        }
        Ok(())
    }

    /// Evaluation order for variables of the given phase type. Edges run
    /// dependent-to-dependency and the sorted order is reversed, so
    /// dependencies evaluate first; level-to-level edges are reversed
    /// beforehand, encoding that levels read their peers' previous values.
    pub fn sort_vars_of_type(&self, target: VarType) -> Result<Vec<Ident>> {
        let stage = match target {
            VarType::Level => "level",
            _ => "aux",
        };
        let mut edges: Vec<(Ident, Ident)> = Vec::new();
        for var in self.vars.iter() {
            if var.var_type != target {
                continue;
            }
            for ref_id in var.references.iter() {
                let ref_var = match self.var_with_ref_id(ref_id) {
                    Some(ref_var) => ref_var,
                    None => continue,
                };
                if ref_var.var_type != target {
                    continue;
                }
                let edge = if target == VarType::Level {
                    (ref_var.ref_id.clone(), var.ref_id.clone())
                } else {
                    (var.ref_id.clone(), ref_var.ref_id.clone())
                };
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }

        if target == VarType::Level {
            // an antisymmetric pair means both levels read previous
            // values: no ordering constraint remains between them
            let mut keep = vec![true; edges.len()];
            for i in 0..edges.len() {
                for j in 0..edges.len() {
                    if edges[j].0 == edges[i].1 && edges[j].1 == edges[i].0 {
                        keep[i] = false;
                        keep[j] = false;
                    }
                }
            }
            edges = edges
                .into_iter()
                .zip(keep)
                .filter(|(_, keep)| *keep)
                .map(|(edge, _)| edge)
                .collect();
        }

        let mut vertices: Vec<Ident> = Vec::new();
        for (src, dst) in edges.iter() {
            if !vertices.contains(src) {
                vertices.push(src.clone());
            }
            if !vertices.contains(dst) {
                vertices.push(dst.clone());
            }
        }
        let sorted = topo_sort(vertices.clone(), &edges, stage)?;
        let mut order: Vec<Ident> = sorted.into_iter().rev().collect();

        let mut isolated: Vec<Ident> = self
            .vars
            .iter()
            .filter(|v| v.var_type == target && !vertices.contains(&v.ref_id))
            .map(|v| v.ref_id.clone())
            .collect();
        isolated.sort();
        isolated.append(&mut order);
        Ok(isolated)
    }

    /// Initialization order: starting from every variable carrying an
    /// initial value, walk init references (eval references for plain
    /// variables pulled in along the way), sort, and keep what must be
    /// computed at init time.
    pub fn sort_init_vars(&self) -> Result<Vec<Ident>> {
        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut seen: HashSet<Ident> = HashSet::new();
        for (idx, var) in self.vars.iter().enumerate() {
            if var.has_init_value {
                queue.push_back(idx);
                seen.insert(var.ref_id.clone());
            }
        }

        let mut edges: Vec<(Ident, Ident)> = Vec::new();
        while let Some(idx) = queue.pop_front() {
            let var = self.vars.get(idx);
            let refs = if var.has_init_value {
                &var.init_references
            } else {
                &var.references
            };
            for ref_id in refs.iter() {
                // normalize through resolution so an indexed reference to
                // an apply-to-all array collapses onto its one record
                let (target_id, target_idx) = match self.index_with_ref_id(ref_id) {
                    Some(ref_idx) => (self.vars.get(ref_idx).ref_id.clone(), Some(ref_idx)),
                    None => (ref_id.clone(), None),
                };
                let edge = (var.ref_id.clone(), target_id);
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
                if let Some(ref_idx) = target_idx {
                    let ref_var = self.vars.get(ref_idx);
                    if ref_var.var_type != VarType::Const && !seen.contains(&ref_var.ref_id) {
                        seen.insert(ref_var.ref_id.clone());
                        queue.push_back(ref_idx);
                    }
                }
            }
        }

        let mut vertices: Vec<Ident> = Vec::new();
        for (src, dst) in edges.iter() {
            if !vertices.contains(src) {
                vertices.push(src.clone());
            }
            if !vertices.contains(dst) {
                vertices.push(dst.clone());
            }
        }
        let sorted = topo_sort(vertices.clone(), &edges, "init")?;
        let order: Vec<Ident> = sorted
            .into_iter()
            .rev()
            .filter(|ref_id| {
                match self.var_with_ref_id(ref_id) {
                    Some(var) => !matches!(
                        var.var_type,
                        VarType::Const | VarType::Lookup | VarType::Data
                    ),
                    None => false,
                }
            })
            .collect();

        let mut isolated: Vec<Ident> = self
            .vars
            .iter()
            .filter(|v| v.has_init_value && !vertices.contains(&v.ref_id))
            .map(|v| v.ref_id.clone())
            .collect();
        isolated.sort();
        let mut out = isolated;
        out.extend(order);
        Ok(out)
    }

    fn is_generated_helper(ref_id: &str) -> bool {
        ref_id.starts_with("__level") || ref_id.starts_with("__aux")
    }

    /// The evaluation-order listing: consts, lookups, data, the time
    /// placeholder, init order, aux order; each variable once, generated
    /// helpers omitted.
    pub fn eval_order_listing(&self) -> Result<Vec<&Variable>> {
        let mut ids: Vec<Ident> = Vec::new();
        let push = |ids: &mut Vec<Ident>, id: Ident| {
            if !Self::is_generated_helper(&id) && !ids.contains(&id) {
                ids.push(id);
            }
        };

        for bucket in [VarType::Const, VarType::Lookup, VarType::Data] {
            let mut names: Vec<Ident> = self
                .vars
                .iter()
                .filter(|v| v.var_type == bucket && v.ref_id != "_time")
                .map(|v| v.ref_id.clone())
                .collect();
            names.sort();
            for id in names {
                push(&mut ids, id);
            }
        }
        if self.vars.contains_name("_time") {
            push(&mut ids, "_time".to_string());
        }
        for id in self.sort_init_vars()? {
            push(&mut ids, id);
        }
        for id in self.sort_vars_of_type(VarType::Aux)? {
            push(&mut ids, id);
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.var_with_ref_id(id))
            .collect())
    }

    /// 1-based indices for each unique name eligible for output (data and
    /// lookup variables carry none), in listing order; the result is
    /// sorted by name.
    pub fn var_index_info(&self) -> Result<Vec<VarIndexInfo>> {
        let mut out: Vec<VarIndexInfo> = Vec::new();
        let mut next = 1;
        for var in self.eval_order_listing()? {
            if matches!(var.var_type, VarType::Data | VarType::Lookup) {
                continue;
            }
            if out.iter().any(|info| info.var_name == var.var_name) {
                continue;
            }
            out.push(VarIndexInfo {
                var_name: var.var_name.clone(),
                var_index: next,
                subscript_count: var.subscripts.len(),
            });
            next += 1;
        }
        out.sort_by(|a, b| a.var_name.cmp(&b.var_name));
        Ok(out)
    }
}
