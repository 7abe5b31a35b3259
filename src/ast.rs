// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Parse-tree types handed to the analyzer by the lexer/parser.
//!
//! The parser is an external collaborator: it produces these trees from
//! Vensim-style source text, and the analyzer never looks at source text
//! itself (except for the retained `model_lhs`/`model_formula` strings,
//! which exist for diagnostics and listing output).

use std::fmt;

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Positive,
    /// `-x`
    Negative,
    /// `:NOT: x`
    Not,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `^`
    Exp,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,
    And,
    Or,
}

impl BinaryOp {
    fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Exp => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Lte => "<=",
            BinaryOp::Gte => ">=",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::And => ":AND:",
            BinaryOp::Or => ":OR:",
        }
    }
}

/// Expression AST.
///
/// Names are source-level (not canonical); canonicalization happens in the
/// analyzer so that diagnostics can still show what the user wrote.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal: value plus the source spelling (`1.5`, `1e-6`)
    Const(f64, String),
    /// Variable reference, possibly subscripted: `x`, `x[DimA]`
    Var(String, Vec<String>),
    /// Function or lookup call: `MAX(a, b)`, `table(x)`
    App(String, Vec<Expr>),
    /// Inline table literal, the second argument of `WITH LOOKUP`
    Table(Vec<(f64, f64)>),
    /// Quoted string argument: `'data.csv'`
    Literal(String),
    Op1(UnaryOp, Box<Expr>),
    Op2(BinaryOp, Box<Expr>, Box<Expr>),
    /// Parenthesized expression, retained so source text reconstructs
    Paren(Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Const(_, text) => write!(f, "{}", text),
            Expr::Var(name, subs) => {
                if subs.is_empty() {
                    write!(f, "{}", name)
                } else {
                    write!(f, "{}[{}]", name, subs.join(","))
                }
            }
            Expr::App(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Table(points) => {
                write!(f, "(")?;
                for (i, (x, y)) in points.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "({},{})", x, y)?;
                }
                write!(f, ")")
            }
            Expr::Literal(text) => write!(f, "'{}'", text),
            Expr::Op1(op, r) => {
                let op = match op {
                    UnaryOp::Positive => "+",
                    UnaryOp::Negative => "-",
                    UnaryOp::Not => ":NOT: ",
                };
                write!(f, "{}{}", op, r)
            }
            Expr::Op2(op, l, r) => write!(f, "{}{}{}", l, op.as_str(), r),
            Expr::Paren(e) => write!(f, "({})", e),
        }
    }
}

/// How a subscript range gets its elements.
#[derive(Clone, Debug, PartialEq)]
pub enum SubscriptDefElements {
    /// Listed in the source: `DimA: a1, a2, SubDim`
    Names(Vec<String>),
    /// `GET DIRECT SUBSCRIPT('file.csv', 'tab', 'A2')`: read from a file
    /// sibling to the model.
    Direct {
        file: String,
        tab: String,
        cell: String,
    },
}

/// A subscript range definition (dimension, alias, or mapped dimension).
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptDef {
    pub name: String,
    /// `DimA <-> DimB` declares `DimA` an alias of `DimB`; elements empty.
    pub alias_of: Option<String>,
    pub elements: SubscriptDefElements,
    /// `-> (Target: tok, tok, ...)` mapping clauses, target first.
    pub mappings: Vec<(String, Vec<String>)>,
}

impl SubscriptDef {
    pub fn named(name: &str, elements: &[&str]) -> Self {
        SubscriptDef {
            name: name.to_string(),
            alias_of: None,
            elements: SubscriptDefElements::Names(
                elements.iter().map(|e| e.to_string()).collect(),
            ),
            mappings: Vec::new(),
        }
    }

    pub fn alias(name: &str, family: &str) -> Self {
        SubscriptDef {
            name: name.to_string(),
            alias_of: Some(family.to_string()),
            elements: SubscriptDefElements::Names(Vec::new()),
            mappings: Vec::new(),
        }
    }
}

/// Left-hand side of an equation: base name plus subscript tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct EquationLhs {
    pub name: String,
    pub subscripts: Vec<String>,
}

/// Right-hand side shapes the parser distinguishes.
#[derive(Clone, Debug, PartialEq)]
pub enum EquationRhs {
    Expr(Expr),
    /// Inline lookup definition: `( (x1,y1), (x2,y2), ... )`
    Lookup(Vec<(f64, f64)>),
    /// Constant list: `1, 2, 3` (value plus source spelling per element)
    ConstList(Vec<(f64, String)>),
    /// Data declaration with no equation; points arrive from external data.
    Data,
}

/// One equation as parsed, with the source text retained.
#[derive(Clone, Debug, PartialEq)]
pub struct EquationDef {
    pub lhs: EquationLhs,
    pub rhs: EquationRhs,
    pub model_lhs: String,
    pub model_formula: String,
}

/// An item of the legacy single-root parse tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelItem {
    SubscriptRange(SubscriptDef),
    Equation(EquationDef),
}

/// The two parse-tree shapes produced by different parser generations. The
/// analyzer dispatches on this tag and nothing else differs downstream.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedModel {
    /// One root, mixed subscript ranges and equations in source order.
    Legacy(Vec<ModelItem>),
    /// Separate lists of dimension and equation definitions.
    Modern {
        dimensions: Vec<SubscriptDef>,
        equations: Vec<EquationDef>,
    },
}

impl ParsedModel {
    pub fn subscript_defs(&self) -> Vec<&SubscriptDef> {
        match self {
            ParsedModel::Legacy(items) => items
                .iter()
                .filter_map(|item| match item {
                    ModelItem::SubscriptRange(def) => Some(def),
                    ModelItem::Equation(_) => None,
                })
                .collect(),
            ParsedModel::Modern { dimensions, .. } => dimensions.iter().collect(),
        }
    }

    pub fn equation_defs(&self) -> Vec<&EquationDef> {
        match self {
            ParsedModel::Legacy(items) => items
                .iter()
                .filter_map(|item| match item {
                    ModelItem::SubscriptRange(_) => None,
                    ModelItem::Equation(def) => Some(def),
                })
                .collect(),
            ParsedModel::Modern { equations, .. } => equations.iter().collect(),
        }
    }
}
