// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Semantic analyzer for Vensim-style system dynamics models.
//!
//! Given a parse tree of subscript declarations and equations plus a spec
//! of inputs and outputs, the analyzer produces typed, uniquely identified
//! variables with resolved subscripts, per-equation reference graphs, and
//! evaluation orders for the init, aux, and level phases. The lexer/
//! parser, numeric runtime, and file-format readers are external
//! collaborators.

#![forbid(unsafe_code)]

pub mod ast;
pub mod builtins;
pub mod common;
pub mod dimensions;
mod equation;
pub mod json;
pub mod model;
mod reader;
pub mod reduce;
pub mod spec;
pub mod variable;

#[cfg(test)]
pub(crate) mod testutils;

pub use self::common::{
    canonicalize, decanonicalize, Error, ErrorCode, ErrorKind, Ident, Result,
};
pub use self::dimensions::{Dimension, Index, Subscript, SubscriptLike, SubscriptTable};
pub use self::model::{Analyzer, Options, VarIndexInfo};
pub use self::reduce::ReduceMode;
pub use self::spec::{DirectData, ExtData, Spec};
pub use self::variable::{VarType, Variable};
