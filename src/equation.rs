// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The equation reader: walks each right-hand side, classifies the
//! variable, and accumulates its reference sets.
//!
//! References made during normal evaluation land in `references`; those
//! made inside an initial expression (the init argument of an integration
//! intrinsic, or `INITIAL(...)`) land in `init_references`.

use std::collections::HashMap;

use crate::ast::Expr;
use crate::builtins::{is_builtin_fn, is_level_intrinsic};
use crate::common::{canonicalize, decanonicalize, Ident, Result};
use crate::dimensions::{SubscriptLike, SubscriptTable};
use crate::spec::DirectData;
use crate::var_err;
use crate::variable::{VarType, Variable, VariableTable};

/// Everything the walker needs to resolve references without holding a
/// mutable borrow of the variable being read.
pub(crate) struct ReadContext<'a> {
    pub subscripts: &'a SubscriptTable,
    pub vars: &'a VariableTable,
    pub expansion_flags: &'a HashMap<Ident, Vec<bool>>,
    pub direct_data: &'a DirectData,
}

/// The outcome of reading one right-hand side, applied to the variable by
/// the caller.
#[derive(Default)]
pub(crate) struct EquationReadResult {
    pub var_type: Option<VarType>,
    pub has_init_value: bool,
    pub points: Option<Vec<(f64, f64)>>,
    pub references: Vec<Ident>,
    pub init_references: Vec<Ident>,
    pub referenced_lookup_var_names: Vec<Ident>,
    pub referenced_function_names: Vec<Ident>,
}

impl EquationReadResult {
    fn push(list: &mut Vec<Ident>, id: Ident) {
        if !list.contains(&id) {
            list.push(id);
        }
    }
}

/// A right-hand side that is just a (possibly signed, possibly
/// parenthesized) numeric literal.
pub(crate) fn constant_value(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Const(value, _) => Some(*value),
        Expr::Paren(inner) => constant_value(inner),
        Expr::Op1(crate::ast::UnaryOp::Negative, inner) => constant_value(inner).map(|v| -v),
        Expr::Op1(crate::ast::UnaryOp::Positive, inner) => constant_value(inner),
        _ => None,
    }
}

pub(crate) fn read_equation(
    ctx: &ReadContext,
    reading: &Variable,
    expr: &Expr,
) -> Result<EquationReadResult> {
    let mut out = EquationReadResult::default();

    if constant_value(expr).is_some() {
        out.var_type = Some(VarType::Const);
        return Ok(out);
    }

    let mut walker = Walker {
        ctx,
        reading,
        out: &mut out,
    };
    walker.walk(expr, false)?;
    Ok(out)
}

struct Walker<'a, 'b> {
    ctx: &'a ReadContext<'a>,
    reading: &'a Variable,
    out: &'b mut EquationReadResult,
}

impl Walker<'_, '_> {
    fn walk(&mut self, e: &Expr, in_init: bool) -> Result<()> {
        match e {
            Expr::Const(_, _) | Expr::Table(_) | Expr::Literal(_) => Ok(()),
            Expr::Var(name, subs) => {
                self.reference(name, subs, in_init);
                Ok(())
            }
            Expr::Paren(inner) | Expr::Op1(_, inner) => self.walk(inner, in_init),
            Expr::Op2(_, l, r) => {
                self.walk(l, in_init)?;
                self.walk(r, in_init)
            }
            Expr::App(name, args) => self.apply(name, args, in_init),
        }
    }

    fn apply(&mut self, name: &str, args: &[Expr], in_init: bool) -> Result<()> {
        let fn_name = canonicalize(name);
        EquationReadResult::push(&mut self.out.referenced_function_names, fn_name.clone());

        if is_level_intrinsic(&fn_name) {
            return self.apply_level(&fn_name, args, in_init);
        }

        match fn_name.as_str() {
            "_initial" => {
                self.out.has_init_value = true;
                for arg in args {
                    self.walk(arg, true)?;
                }
                Ok(())
            }
            "_with_lookup" => {
                if let Some(arg) = args.first() {
                    self.walk(arg, in_init)?;
                }
                if let Some(Expr::Table(points)) = args.get(1) {
                    self.out.points = Some(points.clone());
                }
                Ok(())
            }
            "_get_direct_data" => self.apply_direct_data(args),
            _ if is_builtin_fn(&fn_name) => {
                for arg in args {
                    self.walk(arg, in_init)?;
                }
                Ok(())
            }
            _ => {
                // a symbol call is a lookup invocation
                EquationReadResult::push(&mut self.out.referenced_lookup_var_names, fn_name);
                for arg in args {
                    self.walk(arg, in_init)?;
                }
                Ok(())
            }
        }
    }

    /// Integration intrinsics make the variable a level. The final
    /// argument is the initial expression where the intrinsic takes one;
    /// the input expression stands in for intrinsics without it.
    fn apply_level(&mut self, fn_name: &str, args: &[Expr], in_init: bool) -> Result<()> {
        self.out.var_type = Some(VarType::Level);
        self.out.has_init_value = true;

        let init_arg = match fn_name {
            "_integ" | "_active_initial" => 1,
            "_delay_fixed" | "_delay1i" | "_delay3i" | "_smoothi" | "_smooth3i" | "_trend" => 2,
            // DELAY1/DELAY3/SMOOTH/SMOOTH3 have no explicit initial
            _ => usize::MAX,
        };

        for (i, arg) in args.iter().enumerate() {
            if i == init_arg {
                self.walk(arg, true)?;
            } else {
                self.walk(arg, in_init)?;
            }
        }
        if init_arg == usize::MAX || args.len() <= init_arg {
            if let Some(input) = args.first() {
                self.walk(input, true)?;
            }
        }
        Ok(())
    }

    fn apply_direct_data(&mut self, args: &[Expr]) -> Result<()> {
        self.out.var_type = Some(VarType::Data);
        let arg = |i: usize| -> Option<&str> {
            match args.get(i) {
                Some(Expr::Literal(text)) => Some(text.as_str()),
                _ => None,
            }
        };
        let (tag, time_row_or_col, cell) = match (arg(0), arg(2), arg(3)) {
            (Some(tag), Some(trc), Some(cell)) => (tag, trc, cell),
            _ => {
                return var_err!(
                    BadTable,
                    format!(
                        "{} ({}): GET DIRECT DATA needs quoted tag, tab, time, cell arguments",
                        self.reading.var_name,
                        decanonicalize(&self.reading.var_name)
                    )
                );
            }
        };
        let table = match self.ctx.direct_data.get(tag) {
            Some(table) => table,
            None => {
                return var_err!(
                    BadTable,
                    format!(
                        "{} ({}): no direct data registered under {}",
                        self.reading.var_name,
                        decanonicalize(&self.reading.var_name),
                        tag
                    )
                );
            }
        };
        self.out.points = Some(table.series(time_row_or_col, cell)?);
        Ok(())
    }

    /// Records the refIds a textual reference resolves to. References to
    /// non-apply-to-all arrays expand to every variant the (separation-
    /// substituted) subscripts cover.
    fn reference(&mut self, name: &str, subs: &[String], in_init: bool) {
        let cname = canonicalize(name);
        let mut ids: Vec<Ident> = Vec::new();

        if !self.ctx.expansion_flags.contains_key(&cname) {
            ids.push(cname);
        } else {
            let subs: Vec<Ident> = subs
                .iter()
                .map(|s| self.substitute(&canonicalize(s)))
                .collect();
            let subs = self.ctx.subscripts.normal_order(&subs);

            for variant in self.ctx.vars.vars_with_name(&cname) {
                if self
                    .ctx
                    .subscripts
                    .matches_reference(&variant.subscripts, &subs)
                {
                    ids.push(variant.ref_id.clone());
                }
            }
            if ids.is_empty() {
                // recorded as written; reference validation reports it later
                ids.push(format!("{}[{}]", cname, subs.join(",")));
            }
        }

        let list = if in_init {
            &mut self.out.init_references
        } else {
            &mut self.out.references
        };
        for id in ids {
            EquationReadResult::push(list, id);
        }
    }

    /// When the reading variable is pinned to an index of some family, a
    /// dimension subscript of that family refers to the pinned index.
    fn substitute(&self, sub: &Ident) -> Ident {
        if let Some(dim) = self.ctx.subscripts.dimension(sub) {
            for own in self.reading.subscripts.iter() {
                if let Some(index) = self.ctx.subscripts.index(own) {
                    if index.family() == dim.family() {
                        return own.clone();
                    }
                }
            }
        }
        sub.clone()
    }
}
