// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Algebraic reduction of right-hand sides.
//!
//! Constant subexpressions fold to literals and land in the
//! expression-text memo for reuse across equations. Aggressive mode also
//! inlines the values of constant variables; input variables stay opaque
//! in every mode, since their values change between runs.

use std::collections::HashMap;

use float_cmp::approx_eq;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::common::{canonicalize, Ident};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ReduceMode {
    #[default]
    Default,
    Aggressive,
    Off,
}

/// Renders a folded value the way a modeler would write it.
fn fmt_const(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn const_expr(value: f64) -> Expr {
    Expr::Const(value, fmt_const(value))
}

/// Reduces an expression under `mode`, recording folded subexpressions in
/// `memo` keyed by their original source text. `const_values` holds the
/// values of constant variables eligible for inlining (inputs excluded).
pub(crate) fn reduce(
    expr: Expr,
    mode: ReduceMode,
    const_values: &HashMap<Ident, f64>,
    memo: &mut HashMap<String, f64>,
) -> Expr {
    if mode == ReduceMode::Off {
        return expr;
    }
    reduce_inner(expr, mode == ReduceMode::Aggressive, const_values, memo)
}

fn reduce_inner(
    expr: Expr,
    aggressive: bool,
    const_values: &HashMap<Ident, f64>,
    memo: &mut HashMap<String, f64>,
) -> Expr {
    let text = expr.to_string();
    if !matches!(expr, Expr::Const(_, _)) {
        if let Some(value) = memo.get(&text) {
            return const_expr(*value);
        }
    }

    match expr {
        Expr::Const(_, _) | Expr::Table(_) | Expr::Literal(_) => expr,
        Expr::Var(name, subs) => {
            if aggressive && subs.is_empty() {
                if let Some(value) = const_values.get(&canonicalize(&name)) {
                    memo.insert(text, *value);
                    return const_expr(*value);
                }
            }
            Expr::Var(name, subs)
        }
        Expr::Paren(inner) => {
            let inner = reduce_inner(*inner, aggressive, const_values, memo);
            match inner {
                Expr::Const(_, _) => inner,
                _ => Expr::Paren(Box::new(inner)),
            }
        }
        Expr::Op1(op, inner) => {
            let inner = reduce_inner(*inner, aggressive, const_values, memo);
            match (op, &inner) {
                (UnaryOp::Negative, Expr::Const(v, _)) => {
                    let value = -*v;
                    memo.insert(text, value);
                    const_expr(value)
                }
                (UnaryOp::Positive, _) => inner,
                _ => Expr::Op1(op, Box::new(inner)),
            }
        }
        Expr::Op2(op, l, r) => {
            let l = reduce_inner(*l, aggressive, const_values, memo);
            let r = reduce_inner(*r, aggressive, const_values, memo);
            if let (Expr::Const(lv, _), Expr::Const(rv, _)) = (&l, &r) {
                if let Some(value) = fold(op, *lv, *rv) {
                    memo.insert(text, value);
                    return const_expr(value);
                }
            }
            simplify(op, l, r, aggressive)
        }
        Expr::App(name, args) => {
            let args = args
                .into_iter()
                .map(|arg| reduce_inner(arg, aggressive, const_values, memo))
                .collect();
            Expr::App(name, args)
        }
    }
}

fn fold(op: BinaryOp, l: f64, r: f64) -> Option<f64> {
    match op {
        BinaryOp::Add => Some(l + r),
        BinaryOp::Sub => Some(l - r),
        BinaryOp::Mul => Some(l * r),
        BinaryOp::Div => Some(l / r),
        BinaryOp::Exp => Some(l.powf(r)),
        _ => None,
    }
}

/// Identity rewrites that hold for any finite operand.
fn simplify(op: BinaryOp, l: Expr, r: Expr, aggressive: bool) -> Expr {
    let l_const = match &l {
        Expr::Const(v, _) => Some(*v),
        _ => None,
    };
    let r_const = match &r {
        Expr::Const(v, _) => Some(*v),
        _ => None,
    };
    let is = |v: Option<f64>, expected: f64| match v {
        Some(v) => approx_eq!(f64, v, expected),
        None => false,
    };

    match op {
        BinaryOp::Add if is(l_const, 0.0) => return r,
        BinaryOp::Add | BinaryOp::Sub if is(r_const, 0.0) => return l,
        BinaryOp::Mul if is(l_const, 1.0) => return r,
        BinaryOp::Mul | BinaryOp::Div if is(r_const, 1.0) => return l,
        BinaryOp::Exp if is(r_const, 1.0) => return l,
        // x*0 only folds aggressively: x may be NaN at runtime
        BinaryOp::Mul if aggressive && (is(l_const, 0.0) || is(r_const, 0.0)) => {
            return const_expr(0.0);
        }
        _ => {}
    }
    Expr::Op2(op, Box::new(l), Box::new(r))
}
