// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;
use std::fmt;
use std::{error, result};

use lazy_static::lazy_static;
use regex::Regex;
use unicode_xid::UnicodeXID;

pub type Ident = String;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError, // will never be produced
    DoesNotExist,
    CircularDimensionDefinition,
    DuplicateDimension,
    UnknownFamily,
    BadDimensionName,
    MismatchedDimensions,
    UnknownDependency,
    BadSpecVariable,
    TypeConflict,
    ExpectedNumber,
    CircularDependency,
    BadTable,
    Generic,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            DoesNotExist => "does_not_exist",
            CircularDimensionDefinition => "circular_dimension_definition",
            DuplicateDimension => "duplicate_dimension",
            UnknownFamily => "unknown_family",
            BadDimensionName => "bad_dimension_name",
            MismatchedDimensions => "mismatched_dimensions",
            UnknownDependency => "unknown_dependency",
            BadSpecVariable => "bad_spec_variable",
            TypeConflict => "type_conflict",
            ExpectedNumber => "expected_number",
            CircularDependency => "circular_dependency",
            BadTable => "bad_table",
            Generic => "generic",
        };

        write!(f, "{}", name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Subscript,
    Variable,
    Model,
    Spec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub(crate) details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Subscript => "SubscriptError",
            ErrorKind::Variable => "VariableError",
            ErrorKind::Model => "ModelError",
            ErrorKind::Spec => "SpecError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

// from https://stackoverflow.com/questions/27588416/how-to-send-output-to-stderr
#[macro_export]
macro_rules! eprintln(
    ($($arg:tt)*) => {{
        use std::io::Write;
        let r = writeln!(&mut ::std::io::stderr(), $($arg)*);
        r.expect("failed printing to stderr");
    }}
);

#[macro_export]
macro_rules! sub_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error {
            kind: ErrorKind::Subscript,
            code: ErrorCode::$code,
            details: Some($str),
        })
    }}
);

#[macro_export]
macro_rules! var_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error {
            kind: ErrorKind::Variable,
            code: ErrorCode::$code,
            details: Some($str),
        })
    }}
);

#[macro_export]
macro_rules! model_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error {
            kind: ErrorKind::Model,
            code: ErrorCode::$code,
            details: Some($str),
        })
    }}
);

#[macro_export]
macro_rules! spec_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error {
            kind: ErrorKind::Spec,
            code: ErrorCode::$code,
            details: Some($str),
        })
    }}
);

/// Returns the canonical identifier for a source-level name: quoting
/// stripped, runs of non-identifier characters collapsed to single
/// underscores, lowercased, with a single leading underscore.
///
/// Idempotent: feeding a canonical id back in yields the same id.
pub fn canonicalize(name: &str) -> Ident {
    let name = name.trim();

    lazy_static! {
        static ref QUOTED_RE: Regex = Regex::new(r#"^"(.*)"$"#).unwrap();
    }

    let name = match QUOTED_RE.captures(name) {
        Some(caps) => caps.get(1).unwrap().as_str(),
        None => name,
    };

    let mut id = String::with_capacity(name.len() + 1);
    for ch in name.chars() {
        if ch != '_' && UnicodeXID::is_xid_continue(ch) {
            id.extend(ch.to_lowercase());
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }

    format!("_{}", id.trim_matches('_'))
}

/// Inverse of [`canonicalize`] for display: the leading underscore is
/// dropped and remaining underscores become spaces.
pub fn decanonicalize(id: &str) -> String {
    id.strip_prefix('_').unwrap_or(id).replace('_', " ")
}

/// Canonicalizes a variable reference that may carry subscripts:
/// `Y[A1]` becomes `_y[_a1]`. Idempotent, like [`canonicalize`].
pub fn canonicalize_var_ref(name: &str) -> Ident {
    match name.find('[') {
        Some(open) => {
            let base = &name[..open];
            let subs = name[open + 1..].trim_end_matches(']');
            let subs: Vec<Ident> = subs.split(',').map(canonicalize).collect();
            format!("{}[{}]", canonicalize(base), subs.join(","))
        }
        None => canonicalize(name),
    }
}

/// The base variable name of a refId: `_y[_a1]` yields `_y`.
pub fn base_name(ref_id: &str) -> &str {
    match ref_id.find('[') {
        Some(open) => &ref_id[..open],
        None => ref_id,
    }
}

/// Sorts `vertices` so that for every edge `(a, b)`, `a` precedes `b`.
///
/// Ties are broken by insertion order in `vertices`, keeping the result
/// deterministic for identical inputs. Every endpoint in `edges` must
/// appear in `vertices`. On a cycle, the error names one vertex in it and
/// the `stage` the sort was running for.
pub fn topo_sort(vertices: Vec<Ident>, edges: &[(Ident, Ident)], stage: &str) -> Result<Vec<Ident>> {
    let index: HashMap<&str, usize> = vertices
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let n = vertices.len();

    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree: Vec<usize> = vec![0; n];
    for (src, dst) in edges.iter() {
        let src = index[src.as_str()];
        let dst = index[dst.as_str()];
        succs[src].push(dst);
        indegree[dst] += 1;
    }

    let mut emitted: Vec<bool> = vec![false; n];
    let mut order: Vec<Ident> = Vec::with_capacity(n);
    while order.len() < n {
        // take the earliest-inserted ready vertex each round
        let next = (0..n).find(|&i| !emitted[i] && indegree[i] == 0);
        match next {
            Some(i) => {
                emitted[i] = true;
                for &succ in succs[i].iter() {
                    indegree[succ] -= 1;
                }
                order.push(vertices[i].clone());
            }
            None => {
                let culprit = (0..n).find(|&i| !emitted[i]).unwrap();
                let id = &vertices[culprit];
                return model_err!(
                    CircularDependency,
                    format!("{} ({}) in {} ordering", id, decanonicalize(id), stage)
                );
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!("_final_time", canonicalize("Final Time"));
        assert_eq!("_a_b", canonicalize("   a b"));
        assert_eq!("_a_b", canonicalize("a \n b"));
        assert_eq!("_hello_there", canonicalize("\"hello there\""));
        assert_eq!("_a_b_c", canonicalize("a.b!c"));
        assert_eq!("_time", canonicalize("Time"));
        // idempotent
        assert_eq!("_final_time", canonicalize("_final_time"));
        assert_eq!(canonicalize("å b"), canonicalize(&canonicalize("Å\nb")));
    }

    #[test]
    fn test_decanonicalize() {
        assert_eq!("final time", decanonicalize("_final_time"));
        assert_eq!("x", decanonicalize("_x"));
        for id in &["_a", "_a_b", "_heat_loss_to_room"] {
            assert_eq!(*id, canonicalize(&decanonicalize(id)));
        }
    }

    #[test]
    fn test_topo_sort() {
        let vertices = vec!["_c".to_string(), "_b".to_string(), "_a".to_string()];
        let edges = vec![
            ("_c".to_string(), "_b".to_string()),
            ("_b".to_string(), "_a".to_string()),
        ];
        let order = topo_sort(vertices, &edges, "aux").unwrap();
        assert_eq!(vec!["_c", "_b", "_a"], order);
    }

    #[test]
    fn test_topo_sort_stable() {
        // no edges: insertion order preserved
        let vertices: Vec<Ident> = ["_m", "_z", "_a"].iter().map(|s| s.to_string()).collect();
        let order = topo_sort(vertices.clone(), &[], "aux").unwrap();
        assert_eq!(vertices, order);
    }

    #[test]
    fn test_topo_sort_cycle() {
        let vertices = vec!["_a".to_string(), "_b".to_string()];
        let edges = vec![
            ("_a".to_string(), "_b".to_string()),
            ("_b".to_string(), "_a".to_string()),
        ];
        let err = topo_sort(vertices, &edges, "aux").unwrap_err();
        assert_eq!(ErrorCode::CircularDependency, err.code);
        assert!(err.get_details().unwrap().contains("_a"));
    }
}
