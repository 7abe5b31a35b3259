// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The variable reader: one parsed equation in, one or more `Variable`
//! records out.
//!
//! A scalar equation or an apply-to-all array head produces a single
//! record. Separation (forced by `specialSeparationDims`, or implied by a
//! constant list) splits the head into one record per index of the
//! separated dimension.

use std::collections::HashMap;

use crate::ast::{EquationDef, EquationRhs, Expr};
use crate::common::{canonicalize, decanonicalize, Ident, Result};
use crate::dimensions::{SubscriptList, SubscriptTable};
use crate::var_err;
use crate::variable::{VarType, Variable};

pub(crate) struct VariableReader<'a> {
    pub subscripts: &'a SubscriptTable,
    pub separation_dims: &'a HashMap<Ident, Ident>,
}

impl VariableReader<'_> {
    pub fn read(&self, def: &EquationDef) -> Result<Vec<Variable>> {
        let var_name = canonicalize(&def.lhs.name);
        let subs: Vec<Ident> = def.lhs.subscripts.iter().map(|s| canonicalize(s)).collect();
        let subs = self.subscripts.normal_order(&subs);

        let base = |formula: &str| -> Variable {
            let mut v = Variable::new(
                var_name.clone(),
                def.model_lhs.clone(),
                formula.to_string(),
            );
            v.subscripts = subs.clone();
            v
        };

        match &def.rhs {
            EquationRhs::ConstList(values) => self.read_const_list(&var_name, &subs, values, base),
            EquationRhs::Lookup(points) => {
                let mut v = base(&def.model_formula);
                v.var_type = VarType::Lookup;
                v.points = points.clone();
                Ok(vec![v])
            }
            EquationRhs::Data => {
                let mut v = base(&def.model_formula);
                v.var_type = VarType::Data;
                Ok(vec![v])
            }
            EquationRhs::Expr(_) => {
                let sep_dim = self
                    .separation_dims
                    .get(&var_name)
                    .filter(|dim| subs.contains(*dim))
                    .cloned();
                match sep_dim {
                    Some(dim) => {
                        let indices = match self.subscripts.dimension(&dim) {
                            Some(d) => d.value.clone(),
                            None => {
                                return var_err!(
                                    DoesNotExist,
                                    format!(
                                        "{} ({}): separation dimension {} at variable reading",
                                        var_name,
                                        decanonicalize(&var_name),
                                        dim
                                    )
                                );
                            }
                        };
                        let pos = subs.iter().position(|s| *s == dim).unwrap();
                        let vars = indices
                            .iter()
                            .map(|index| {
                                let mut v = base(&def.model_formula);
                                v.subscripts[pos] = index.clone();
                                v.separation_dims = vec![dim.clone()];
                                v.eqn = Some(def.rhs.clone());
                                v
                            })
                            .collect();
                        Ok(vars)
                    }
                    None => {
                        let mut v = base(&def.model_formula);
                        v.eqn = Some(def.rhs.clone());
                        Ok(vec![v])
                    }
                }
            }
        }
    }

    /// A constant list separates on the first dimension subscript: one
    /// `const` record per index, each holding one listed value.
    fn read_const_list<F>(
        &self,
        var_name: &Ident,
        subs: &SubscriptList,
        values: &[(f64, String)],
        base: F,
    ) -> Result<Vec<Variable>>
    where
        F: Fn(&str) -> Variable,
    {
        if values.len() == 1 && subs.iter().all(|s| !self.subscripts.is_dimension(s)) {
            let (value, text) = &values[0];
            let mut v = base(text);
            v.var_type = VarType::Const;
            v.eqn = Some(EquationRhs::Expr(Expr::Const(*value, text.clone())));
            return Ok(vec![v]);
        }

        let (pos, dim) = match subs
            .iter()
            .enumerate()
            .find(|(_, s)| self.subscripts.is_dimension(s.as_str()))
        {
            Some((pos, dim)) => (pos, self.subscripts.dimension(dim).unwrap()),
            None => {
                return var_err!(
                    MismatchedDimensions,
                    format!(
                        "{} ({}): constant list without a dimension at variable reading",
                        var_name,
                        decanonicalize(var_name)
                    )
                );
            }
        };
        if dim.size != values.len() {
            return var_err!(
                MismatchedDimensions,
                format!(
                    "{} ({}): {} constants listed for {} of size {} at variable reading",
                    var_name,
                    decanonicalize(var_name),
                    values.len(),
                    dim.name,
                    dim.size
                )
            );
        }

        let dim_name = dim.name.clone();
        let indices = dim.value.clone();
        let vars = indices
            .iter()
            .zip(values.iter())
            .map(|(index, (value, text))| {
                let mut v = base(text);
                v.subscripts[pos] = index.clone();
                v.separation_dims = vec![dim_name.clone()];
                v.var_type = VarType::Const;
                v.eqn = Some(EquationRhs::Expr(Expr::Const(*value, text.clone())));
                v
            })
            .collect();
        Ok(vars)
    }
}

/// The `_time` placeholder appended once after all equations are read.
pub(crate) fn time_placeholder() -> Variable {
    let mut v = Variable::new("_time".to_string(), "Time".to_string(), String::new());
    v.var_type = VarType::Const;
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EquationLhs;
    use crate::testutils::{resolved_dims, x_eqn};

    fn reader_read(
        table: &SubscriptTable,
        separation: &HashMap<Ident, Ident>,
        def: &EquationDef,
    ) -> Vec<Variable> {
        let reader = VariableReader {
            subscripts: table,
            separation_dims: separation,
        };
        reader.read(def).unwrap()
    }

    #[test]
    fn test_scalar_equation() {
        let table = resolved_dims(&[]);
        let def = x_eqn("a", &[], "1");
        let vars = reader_read(&table, &HashMap::new(), &def);
        assert_eq!(1, vars.len());
        assert_eq!("_a", vars[0].var_name);
        assert!(vars[0].subscripts.is_empty());
    }

    #[test]
    fn test_apply_to_all() {
        let table = resolved_dims(&[("DimA", &["a1", "a2"])]);
        let def = x_eqn("x", &["DimA"], "10");
        let vars = reader_read(&table, &HashMap::new(), &def);
        assert_eq!(1, vars.len());
        assert_eq!(vec!["_dima".to_string()], vars[0].subscripts.to_vec());
    }

    #[test]
    fn test_separation() {
        let table = resolved_dims(&[("DimA", &["a1", "a2"])]);
        let separation: HashMap<Ident, Ident> =
            [("_x".to_string(), "_dima".to_string())].into_iter().collect();
        let def = x_eqn("x", &["DimA"], "10");
        let vars = reader_read(&table, &separation, &def);
        assert_eq!(2, vars.len());
        assert_eq!(vec!["_a1".to_string()], vars[0].subscripts.to_vec());
        assert_eq!(vec!["_a2".to_string()], vars[1].subscripts.to_vec());
        assert_eq!(vec!["_dima".to_string()], vars[0].separation_dims);
    }

    #[test]
    fn test_const_list() {
        let table = resolved_dims(&[("DimA", &["a1", "a2"])]);
        let def = EquationDef {
            lhs: EquationLhs {
                name: "c".to_string(),
                subscripts: vec!["DimA".to_string()],
            },
            rhs: EquationRhs::ConstList(vec![(1.0, "1".to_string()), (2.0, "2".to_string())]),
            model_lhs: "c[DimA]".to_string(),
            model_formula: "1, 2".to_string(),
        };
        let vars = reader_read(&table, &HashMap::new(), &def);
        assert_eq!(2, vars.len());
        assert!(vars.iter().all(|v| v.var_type == VarType::Const));
        assert_eq!("2", vars[1].model_formula);
    }

    #[test]
    fn test_const_list_size_mismatch() {
        let table = resolved_dims(&[("DimA", &["a1", "a2"])]);
        let def = EquationDef {
            lhs: EquationLhs {
                name: "c".to_string(),
                subscripts: vec!["DimA".to_string()],
            },
            rhs: EquationRhs::ConstList(vec![(1.0, "1".to_string())]),
            model_lhs: "c[DimA]".to_string(),
            model_formula: "1".to_string(),
        };
        let reader = VariableReader {
            subscripts: &table,
            separation_dims: &HashMap::new(),
        };
        let err = reader.read(&def).unwrap_err();
        assert_eq!(crate::common::ErrorCode::MismatchedDimensions, err.code);
    }

    #[test]
    fn test_inline_lookup() {
        let table = resolved_dims(&[]);
        let def = EquationDef {
            lhs: EquationLhs {
                name: "shape".to_string(),
                subscripts: vec![],
            },
            rhs: EquationRhs::Lookup(vec![(0.0, 0.0), (1.0, 2.0)]),
            model_lhs: "shape".to_string(),
            model_formula: "((0,0),(1,2))".to_string(),
        };
        let vars = reader_read(&table, &HashMap::new(), &def);
        assert_eq!(VarType::Lookup, vars[0].var_type);
        assert_eq!(vec![(0.0, 0.0), (1.0, 2.0)], vars[0].points);
    }
}
