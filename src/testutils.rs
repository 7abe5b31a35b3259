// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use crate::ast::{EquationDef, EquationLhs, EquationRhs, Expr, ParsedModel, SubscriptDef};
use crate::dimensions::SubscriptTable;
use crate::model::{Analyzer, Options};
use crate::spec::{DirectData, ExtData, Spec};

pub(crate) fn num(value: f64) -> Expr {
    let text = if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    };
    Expr::Const(value, text)
}

pub(crate) fn var(name: &str) -> Expr {
    Expr::Var(name.to_string(), Vec::new())
}

pub(crate) fn varsub(name: &str, subs: &[&str]) -> Expr {
    Expr::Var(
        name.to_string(),
        subs.iter().map(|s| s.to_string()).collect(),
    )
}

pub(crate) fn app(name: &str, args: Vec<Expr>) -> Expr {
    Expr::App(name.to_string(), args)
}

pub(crate) fn lit(text: &str) -> Expr {
    Expr::Literal(text.to_string())
}

pub(crate) fn table_of(points: &[(f64, f64)]) -> Expr {
    Expr::Table(points.to_vec())
}

pub(crate) fn add(l: Expr, r: Expr) -> Expr {
    Expr::Op2(crate::ast::BinaryOp::Add, Box::new(l), Box::new(r))
}

pub(crate) fn mul(l: Expr, r: Expr) -> Expr {
    Expr::Op2(crate::ast::BinaryOp::Mul, Box::new(l), Box::new(r))
}

pub(crate) fn eqn(name: &str, subs: &[&str], rhs: Expr) -> EquationDef {
    let model_lhs = if subs.is_empty() {
        name.to_string()
    } else {
        format!("{}[{}]", name, subs.join(","))
    };
    EquationDef {
        lhs: EquationLhs {
            name: name.to_string(),
            subscripts: subs.iter().map(|s| s.to_string()).collect(),
        },
        model_lhs,
        model_formula: rhs.to_string(),
        rhs: EquationRhs::Expr(rhs),
    }
}

/// An equation whose right-hand side is just a number.
pub(crate) fn x_eqn(name: &str, subs: &[&str], formula: &str) -> EquationDef {
    let value: f64 = formula.trim().parse().unwrap();
    eqn(name, subs, Expr::Const(value, formula.trim().to_string()))
}

pub(crate) fn x_model(dims: &[(&str, &[&str])], equations: Vec<EquationDef>) -> ParsedModel {
    ParsedModel::Modern {
        dimensions: dims
            .iter()
            .map(|(name, elements)| SubscriptDef::named(name, elements))
            .collect(),
        equations,
    }
}

pub(crate) fn resolved_dims(defs: &[(&str, &[&str])]) -> SubscriptTable {
    let mut table = SubscriptTable::new();
    for (name, elements) in defs {
        let elements = elements.iter().map(|e| e.to_string()).collect();
        table.add_dimension(name, elements, Vec::new()).unwrap();
    }
    table.resolve(&HashMap::new(), None).unwrap();
    table
}

pub(crate) fn spec_io(inputs: &[&str], outputs: &[&str]) -> Spec {
    Spec {
        input_var_names: inputs.iter().map(|s| s.to_string()).collect(),
        output_var_names: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

pub(crate) fn analyze(model: &ParsedModel, spec: &Spec) -> Analyzer {
    let mut analyzer = Analyzer::new(Options::default());
    analyzer
        .analyze(model, spec, &ExtData::new(), &DirectData::new(), None)
        .unwrap();
    analyzer
}
