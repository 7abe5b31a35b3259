// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end analysis scenarios driven through the public API.

use sd_analyzer::ast::{
    EquationDef, EquationLhs, EquationRhs, Expr, ModelItem, ParsedModel, SubscriptDef,
};
use sd_analyzer::{Analyzer, DirectData, ExtData, Options, Spec, VarType};

fn num(value: f64) -> Expr {
    let text = if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    };
    Expr::Const(value, text)
}

fn var(name: &str) -> Expr {
    Expr::Var(name.to_string(), Vec::new())
}

fn varsub(name: &str, subs: &[&str]) -> Expr {
    Expr::Var(
        name.to_string(),
        subs.iter().map(|s| s.to_string()).collect(),
    )
}

fn add(l: Expr, r: Expr) -> Expr {
    Expr::Op2(sd_analyzer::ast::BinaryOp::Add, Box::new(l), Box::new(r))
}

fn mul(l: Expr, r: Expr) -> Expr {
    Expr::Op2(sd_analyzer::ast::BinaryOp::Mul, Box::new(l), Box::new(r))
}

fn integ(rate: Expr, init: Expr) -> Expr {
    Expr::App("INTEG".to_string(), vec![rate, init])
}

fn eqn(name: &str, subs: &[&str], rhs: Expr) -> EquationDef {
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

fn model(dims: &[(&str, &[&str])], equations: Vec<EquationDef>) -> ParsedModel {
    ParsedModel::Modern {
        dimensions: dims
            .iter()
            .map(|(name, elements)| SubscriptDef::named(name, elements))
            .collect(),
        equations,
    }
}

fn spec_outputs(outputs: &[&str]) -> Spec {
    Spec {
        output_var_names: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn run(model: &ParsedModel, spec: &Spec, ext_data: &ExtData) -> Analyzer {
    let mut analyzer = Analyzer::new(Options::default());
    analyzer
        .analyze(model, spec, ext_data, &DirectData::new(), None)
        .unwrap();
    analyzer
}

fn var_type(analyzer: &Analyzer, name: &str) -> VarType {
    analyzer.vars_with_name(name)[0].var_type
}

#[test]
fn scalar_chain() {
    let model = model(
        &[],
        vec![
            eqn("a", &[], num(1.0)),
            eqn("b", &[], add(var("a"), num(2.0))),
            eqn("c", &[], mul(var("b"), num(3.0))),
        ],
    );
    let analyzer = run(&model, &spec_outputs(&["c"]), &ExtData::new());

    assert_eq!(VarType::Const, var_type(&analyzer, "_a"));
    assert_eq!(VarType::Aux, var_type(&analyzer, "_b"));
    assert_eq!(VarType::Aux, var_type(&analyzer, "_c"));
    assert_eq!(
        vec!["_b", "_c"],
        analyzer.sort_vars_of_type(VarType::Aux).unwrap()
    );
    // no inputs declared: elimination is off, everything survives
    assert_eq!(vec!["_a", "_b", "_c", "_time"], analyzer.var_names());
}

#[test]
fn apply_to_all_array() {
    let model = model(
        &[("R", &["r1", "r2"])],
        vec![
            eqn("x", &["R"], num(10.0)),
            eqn("y", &["R"], add(varsub("x", &["R"]), num(1.0))),
        ],
    );
    let analyzer = run(&model, &spec_outputs(&["y"]), &ExtData::new());

    assert_eq!(1, analyzer.vars_with_name("_x").len());
    assert_eq!(1, analyzer.vars_with_name("_y").len());
    assert_eq!("_x", analyzer.vars_with_name("_x")[0].ref_id);
    assert_eq!(
        vec!["_x"],
        analyzer.vars_with_name("_y")[0].references
    );
    assert_eq!(VarType::Const, var_type(&analyzer, "_x"));
    assert_eq!(
        vec!["_y"],
        analyzer.sort_vars_of_type(VarType::Aux).unwrap()
    );
}

#[test]
fn non_apply_to_all_array() {
    let model = model(
        &[("R", &["r1", "r2"])],
        vec![
            eqn("v", &["r1"], num(1.0)),
            eqn("v", &["r2"], num(2.0)),
        ],
    );
    let analyzer = run(&model, &Spec::default(), &ExtData::new());

    assert_eq!(
        vec!["_v[_r1]", "_v[_r2]"],
        analyzer.ref_ids_with_name("_v")
    );
    assert_eq!(Some(&[true][..]), analyzer.expansion_flags("_v"));
    for v in analyzer.vars_with_name("_v") {
        assert_eq!(v, analyzer.var_with_ref_id(&v.ref_id).unwrap());
    }
}

#[test]
fn level_with_init() {
    let model = model(
        &[],
        vec![
            eqn("s", &[], integ(var("flow"), var("s0"))),
            eqn("flow", &[], num(2.0)),
            eqn("s0", &[], num(5.0)),
        ],
    );
    let analyzer = run(&model, &spec_outputs(&["s"]), &ExtData::new());

    let s = analyzer.vars_with_name("_s")[0];
    assert_eq!(VarType::Level, s.var_type);
    assert!(s.has_init_value);
    assert_eq!(vec!["_flow"], s.references);
    assert_eq!(vec!["_s0"], s.init_references);
    // constants drop out of the init order; the level remains
    assert_eq!(vec!["_s"], analyzer.sort_init_vars().unwrap());

    let listing: Vec<String> = analyzer
        .eval_order_listing()
        .unwrap()
        .iter()
        .map(|v| v.ref_id.clone())
        .collect();
    assert_eq!(vec!["_flow", "_s0", "_time", "_s"], listing);
}

#[test]
fn mutually_referencing_levels() {
    let model = model(
        &[],
        vec![
            eqn("a", &[], integ(var("b"), num(0.0))),
            eqn("b", &[], integ(var("a"), num(0.0))),
        ],
    );
    let analyzer = run(&model, &Spec::default(), &ExtData::new());

    assert_eq!(VarType::Level, var_type(&analyzer, "_a"));
    assert_eq!(VarType::Level, var_type(&analyzer, "_b"));
    // reversal cancels the pair: both levels order independently
    assert_eq!(
        vec!["_a", "_b"],
        analyzer.sort_vars_of_type(VarType::Level).unwrap()
    );
}

#[test]
fn spec_supplied_external_data() {
    let model = model(&[], vec![eqn("other", &[], num(1.0))]);
    let mut ext_data = ExtData::new();
    ext_data.insert("_gdp".to_string(), vec![(0.0, 100.0), (1.0, 110.0)]);
    let analyzer = run(&model, &spec_outputs(&["gdp"]), &ext_data);

    let gdp = analyzer.vars_with_name("_gdp")[0];
    assert_eq!(VarType::Aux, gdp.var_type);
    assert_eq!(vec![(0.0, 100.0), (1.0, 110.0)], gdp.points);
    assert_eq!(vec!["_time"], gdp.references);
    assert_eq!(vec!["_with_lookup"], gdp.referenced_function_names);
    assert_eq!("GDP", gdp.model_lhs);
    assert!(gdp.model_formula.starts_with("WITH LOOKUP(Time,"));
}

#[test]
fn spec_variable_with_no_backing_is_fatal() {
    let model = model(&[], vec![eqn("other", &[], num(1.0))]);
    let mut analyzer = Analyzer::new(Options::default());
    let err = analyzer
        .analyze(
            &model,
            &spec_outputs(&["gdp"]),
            &ExtData::new(),
            &DirectData::new(),
            None,
        )
        .unwrap_err();
    assert_eq!(sd_analyzer::ErrorCode::BadSpecVariable, err.code);
}

#[test]
fn legacy_and_modern_shapes_agree() {
    let dims: &[(&str, &[&str])] = &[("R", &["r1", "r2"])];
    let equations = vec![
        eqn("x", &["R"], num(10.0)),
        eqn("y", &["R"], add(varsub("x", &["R"]), num(1.0))),
    ];
    let modern = model(dims, equations.clone());
    let legacy = ParsedModel::Legacy(
        std::iter::once(ModelItem::SubscriptRange(SubscriptDef::named(
            "R",
            &["r1", "r2"],
        )))
        .chain(equations.into_iter().map(ModelItem::Equation))
        .collect(),
    );

    let a = run(&modern, &Spec::default(), &ExtData::new());
    let b = run(&legacy, &Spec::default(), &ExtData::new());
    assert_eq!(a.json_list().unwrap(), b.json_list().unwrap());
}

#[test]
fn name_round_trips() {
    let model = model(
        &[],
        vec![eqn("Heat Loss to Room", &[], num(3.0))],
    );
    let analyzer = run(&model, &Spec::default(), &ExtData::new());
    for name in analyzer.var_names() {
        let display = analyzer.vensim_name(&name);
        assert_eq!(name, analyzer.c_name(&display));
    }
}
