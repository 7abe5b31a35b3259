// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The subscript/dimension table.
//!
//! Registers dimensions, aliases, indices, and inter-dimension mappings,
//! then resolves them: dimension names nested inside other dimensions are
//! expanded to index lists, aliases inherit from their families, families
//! are assigned, indices registered, and mappings inverted.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use smallvec::SmallVec;

use crate::common::{canonicalize, decanonicalize, Ident, Result};
use crate::spec::parse_cell_ref;
use crate::{eprintln, sub_err};

/// Subscript lists are short: nearly every variable carries 0-2 entries.
pub type SubscriptList = SmallVec<[Ident; 2]>;

pub trait SubscriptLike {
    fn name(&self) -> &str;
    fn family(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    pub name: Ident,
    /// Owning family; provisionally the dimension itself until resolution.
    pub family: Ident,
    /// Source-level element tokens as parsed (may name other dimensions).
    pub model_value: Vec<String>,
    /// Canonical index names after expansion.
    pub value: Vec<Ident>,
    pub size: usize,
    /// Inverted mappings: target dimension name to the from-dimension index
    /// mapped to each target position. Unresolved positions stay empty.
    pub mappings: BTreeMap<Ident, Vec<Ident>>,
    /// Mapping clauses as parsed (canonical tokens), inverted at resolution.
    model_mappings: BTreeMap<Ident, Vec<Ident>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Index {
    pub name: Ident,
    /// 0-based position in the family dimension.
    pub value: usize,
    pub family: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Subscript {
    Dimension(Dimension),
    Index(Index),
}

impl SubscriptLike for Dimension {
    fn name(&self) -> &str {
        &self.name
    }
    fn family(&self) -> &str {
        &self.family
    }
}

impl SubscriptLike for Index {
    fn name(&self) -> &str {
        &self.name
    }
    fn family(&self) -> &str {
        &self.family
    }
}

impl SubscriptLike for Subscript {
    fn name(&self) -> &str {
        match self {
            Subscript::Dimension(dim) => dim.name(),
            Subscript::Index(ind) => ind.name(),
        }
    }
    fn family(&self) -> &str {
        match self {
            Subscript::Dimension(dim) => dim.family(),
            Subscript::Index(ind) => ind.family(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SubscriptTable {
    subs: HashMap<Ident, Subscript>,
    aliases: Vec<Ident>,
    direct_sources: HashMap<Ident, (String, String, String)>,
}

impl SubscriptTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.subs.clear();
        self.aliases.clear();
        self.direct_sources.clear();
    }

    pub fn add_dimension(
        &mut self,
        name: &str,
        model_value: Vec<String>,
        mappings: Vec<(String, Vec<String>)>,
    ) -> Result<()> {
        let cname = canonicalize(name);
        if self.subs.contains_key(&cname) {
            return sub_err!(
                DuplicateDimension,
                format!("{} ({}) at dimension registration", cname, name)
            );
        }
        let value: Vec<Ident> = model_value.iter().map(|tok| canonicalize(tok)).collect();
        let model_mappings: BTreeMap<Ident, Vec<Ident>> = mappings
            .into_iter()
            .map(|(to, toks)| {
                (
                    canonicalize(&to),
                    toks.iter().map(|tok| canonicalize(tok)).collect(),
                )
            })
            .collect();
        self.subs.insert(
            cname.clone(),
            Subscript::Dimension(Dimension {
                name: cname.clone(),
                family: cname,
                model_value,
                value,
                size: 0,
                mappings: BTreeMap::new(),
                model_mappings,
            }),
        );
        Ok(())
    }

    pub fn add_direct_dimension(
        &mut self,
        name: &str,
        file: &str,
        tab: &str,
        cell: &str,
    ) -> Result<()> {
        self.add_dimension(name, Vec::new(), Vec::new())?;
        self.direct_sources.insert(
            canonicalize(name),
            (file.to_string(), tab.to_string(), cell.to_string()),
        );
        Ok(())
    }

    pub fn add_alias(&mut self, name: &str, family_name: &str) -> Result<()> {
        let cname = canonicalize(name);
        if self.subs.contains_key(&cname) {
            return sub_err!(
                DuplicateDimension,
                format!("{} ({}) at dimension registration", cname, name)
            );
        }
        self.subs.insert(
            cname.clone(),
            Subscript::Dimension(Dimension {
                name: cname.clone(),
                family: canonicalize(family_name),
                model_value: Vec::new(),
                value: Vec::new(),
                size: 0,
                mappings: BTreeMap::new(),
                model_mappings: BTreeMap::new(),
            }),
        );
        self.aliases.push(cname);
        Ok(())
    }

    pub fn add_index(&mut self, name: &str, position: usize, family: &str) {
        let cname = canonicalize(name);
        self.subs.insert(
            cname.clone(),
            Subscript::Index(Index {
                name: cname,
                value: position,
                family: canonicalize(family),
            }),
        );
    }

    pub fn sub(&self, name: &str) -> Option<&Subscript> {
        self.subs.get(name)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        match self.subs.get(name) {
            Some(Subscript::Dimension(dim)) => Some(dim),
            _ => None,
        }
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        match self.subs.get(name) {
            Some(Subscript::Index(ind)) => Some(ind),
            _ => None,
        }
    }

    pub fn is_dimension(&self, name: &str) -> bool {
        matches!(self.subs.get(name), Some(Subscript::Dimension(_)))
    }

    pub fn is_index(&self, name: &str) -> bool {
        matches!(self.subs.get(name), Some(Subscript::Index(_)))
    }

    /// All non-alias dimensions, sorted by canonical name.
    pub fn all_dimensions(&self) -> Vec<&Dimension> {
        let mut dims: Vec<&Dimension> = self
            .subs
            .values()
            .filter_map(|sub| match sub {
                Subscript::Dimension(dim) if !self.aliases.contains(&dim.name) => Some(dim),
                _ => None,
            })
            .collect();
        dims.sort_by(|a, b| a.name.cmp(&b.name));
        dims
    }

    pub fn all_aliases(&self) -> Vec<&Dimension> {
        self.aliases
            .iter()
            .filter_map(|name| self.dimension(name))
            .collect()
    }

    /// The sort key for subscript normalization: indices sort by their
    /// family, dimensions by themselves.
    fn sort_key<'a>(&'a self, token: &'a str) -> &'a str {
        match self.subs.get(token) {
            Some(Subscript::Index(ind)) => &ind.family,
            _ => token,
        }
    }

    /// Reorders a subscript list into normal family order.
    pub fn normal_order(&self, subscripts: &[Ident]) -> SubscriptList {
        let mut out: SubscriptList = subscripts.iter().cloned().collect();
        out.sort_by(|a, b| self.sort_key(a).cmp(self.sort_key(b)));
        out
    }

    pub fn family_of(&self, token: &str) -> Option<&str> {
        self.subs.get(token).map(|sub| sub.family())
    }

    /// Whether a variant's subscript pattern covers a reference's
    /// subscripts, position-wise: equal tokens always match, and a
    /// dimension in the pattern covers any of its own indices. An index in
    /// the pattern never covers a dimension in the reference.
    pub fn covers(&self, pattern: &[Ident], reference: &[Ident]) -> bool {
        if pattern.len() != reference.len() {
            return false;
        }
        pattern.iter().zip(reference.iter()).all(|(p, r)| {
            if p == r {
                return true;
            }
            match self.dimension(p) {
                Some(dim) => dim.value.contains(r),
                None => false,
            }
        })
    }

    /// Whether a variant is among those a textual reference names. Looser
    /// than [`covers`](Self::covers): a dimension on the reference side
    /// takes in every variant pinned to one of its indices, so referencing
    /// a non-apply-to-all array by dimension reaches all its variants.
    pub fn matches_reference(&self, pattern: &[Ident], reference: &[Ident]) -> bool {
        if pattern.len() != reference.len() {
            return false;
        }
        pattern.iter().zip(reference.iter()).all(|(p, r)| {
            if p == r {
                return true;
            }
            if let Some(dim) = self.dimension(p) {
                if dim.value.contains(r) {
                    return true;
                }
            }
            if let Some(dim) = self.dimension(r) {
                if dim.value.contains(p) {
                    return true;
                }
            }
            false
        })
    }

    /// Runs dimension resolution: direct subscript loading, value
    /// expansion, alias fill, family assignment, index registration, and
    /// mapping inversion. Re-running recomputes all derived state.
    pub fn resolve(
        &mut self,
        dimension_families: &HashMap<Ident, Ident>,
        model_dir: Option<&Path>,
    ) -> Result<()> {
        self.load_direct_sources(model_dir)?;
        self.expand_values()?;
        self.fill_aliases()?;
        self.assign_families(dimension_families);
        self.register_indices();
        self.invert_mappings();
        Ok(())
    }

    fn load_direct_sources(&mut self, model_dir: Option<&Path>) -> Result<()> {
        let sources: Vec<(Ident, (String, String, String))> = {
            let mut sources: Vec<_> = self.direct_sources.iter().collect();
            sources.sort_by(|a, b| a.0.cmp(b.0));
            sources
                .into_iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        for (dim_name, (file, tab, cell)) in sources {
            let dir = match model_dir {
                Some(dir) => dir,
                None => {
                    return sub_err!(
                        BadTable,
                        format!(
                            "{} ({}): GET DIRECT SUBSCRIPT requires a model directory",
                            dim_name,
                            decanonicalize(&dim_name)
                        )
                    );
                }
            };
            let elements = read_direct_subscript(&dir.join(&file), &tab, &cell)?;
            if let Some(Subscript::Dimension(dim)) = self.subs.get_mut(&dim_name) {
                dim.value = elements.iter().map(|e| canonicalize(e)).collect();
                dim.model_value = elements;
            }
        }
        Ok(())
    }

    /// Step 1: replace dimension tokens inside dimension values with those
    /// dimensions' values until only index tokens remain. The dependency
    /// graph among dimensions must be a DAG.
    fn expand_values(&mut self) -> Result<()> {
        let mut names: Vec<Ident> = self
            .subs
            .iter()
            .filter(|(name, sub)| {
                matches!(sub, Subscript::Dimension(_)) && !self.aliases.contains(*name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();

        let mut expanded: Vec<(Ident, Vec<Ident>)> = Vec::with_capacity(names.len());
        for name in names {
            let mut visited = BTreeSet::new();
            let value = self.expand_one(&name, &mut visited)?;
            expanded.push((name, value));
        }
        for (name, value) in expanded {
            if let Some(Subscript::Dimension(dim)) = self.subs.get_mut(&name) {
                dim.size = value.len();
                dim.value = value;
            }
        }
        Ok(())
    }

    fn expand_one(&self, name: &Ident, visited: &mut BTreeSet<Ident>) -> Result<Vec<Ident>> {
        if visited.contains(name) {
            return sub_err!(
                CircularDimensionDefinition,
                format!(
                    "{} ({}) at dimension expansion",
                    name,
                    decanonicalize(name)
                )
            );
        }
        visited.insert(name.clone());

        let dim = match self.dimension(name) {
            Some(dim) => dim,
            None => {
                return sub_err!(
                    DoesNotExist,
                    format!(
                        "{} ({}) at dimension expansion",
                        name,
                        decanonicalize(name)
                    )
                );
            }
        };
        // aliases route through their family's definition
        if dim.model_value.is_empty() && self.aliases.contains(name) {
            let family = dim.family.clone();
            visited.remove(name);
            return self.expand_one(&family, visited);
        }

        let mut out: Vec<Ident> = Vec::with_capacity(dim.value.len());
        for token in dim.value.iter() {
            if self.is_dimension(token) {
                out.extend(self.expand_one(token, visited)?);
            } else {
                out.push(token.clone());
            }
        }
        visited.remove(name);
        Ok(out)
    }

    /// Step 2: aliases copy value, size, and modelValue from their family.
    fn fill_aliases(&mut self) -> Result<()> {
        let aliases = self.aliases.clone();
        for name in aliases {
            let target = match self.dimension(&name) {
                Some(dim) => dim.family.clone(),
                None => continue,
            };
            let (value, size, model_value) = match self.dimension(&target) {
                Some(dim) => (dim.value.clone(), dim.size, dim.model_value.clone()),
                None => {
                    return sub_err!(
                        UnknownFamily,
                        format!(
                            "{} ({}) at alias fill: family {} not defined",
                            name,
                            decanonicalize(&name),
                            target
                        )
                    );
                }
            };
            if let Some(Subscript::Dimension(dim)) = self.subs.get_mut(&name) {
                dim.value = value;
                dim.size = size;
                dim.model_value = model_value;
            }
        }
        Ok(())
    }

    /// Step 3: a dimension's family is the externally named one if given;
    /// otherwise, among all dimensions containing its first index, the one
    /// with the largest size (ties: sort by size ascending, name
    /// descending, take the last).
    fn assign_families(&mut self, dimension_families: &HashMap<Ident, Ident>) {
        let mut names: Vec<Ident> = self
            .subs
            .iter()
            .filter(|(_, sub)| matches!(sub, Subscript::Dimension(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();

        let mut families: Vec<(Ident, Ident)> = Vec::with_capacity(names.len());
        for name in names {
            if let Some(family) = dimension_families.get(&name) {
                families.push((name, family.clone()));
                continue;
            }
            let dim = self.dimension(&name).unwrap();
            let first = match dim.value.first() {
                Some(first) => first,
                None => continue,
            };
            let mut candidates: Vec<&Dimension> = self
                .subs
                .values()
                .filter_map(|sub| match sub {
                    Subscript::Dimension(dim) if dim.value.contains(first) => Some(dim),
                    _ => None,
                })
                .collect();
            candidates.sort_by(|a, b| {
                a.size
                    .cmp(&b.size)
                    .then_with(|| b.name.cmp(&a.name))
            });
            if let Some(family) = candidates.last() {
                families.push((name, family.name.clone()));
            }
        }
        for (name, family) in families {
            if let Some(Subscript::Dimension(dim)) = self.subs.get_mut(&name) {
                dim.family = family;
            }
        }
    }

    /// Step 4: dimensions that are their own family register their indices.
    fn register_indices(&mut self) {
        let mut indices: Vec<(Ident, usize, Ident)> = Vec::new();
        for sub in self.subs.values() {
            if let Subscript::Dimension(dim) = sub {
                if dim.name == dim.family {
                    for (i, ind_name) in dim.value.iter().enumerate() {
                        indices.push((ind_name.clone(), i, dim.name.clone()));
                    }
                }
            }
        }
        indices.sort();
        for (name, position, family) in indices {
            self.subs.insert(
                name.clone(),
                Subscript::Index(Index {
                    name,
                    value: position,
                    family,
                }),
            );
        }
    }

    /// Step 5: invert each mapping clause so that position `j` of the
    /// result names the from-dimension index mapped to target index `j`.
    /// A duplicate target position overwrites (last write wins); an
    /// out-of-range position is diagnosed and the slot stays empty.
    fn invert_mappings(&mut self) {
        let mut names: Vec<Ident> = self
            .subs
            .iter()
            .filter(|(_, sub)| matches!(sub, Subscript::Dimension(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();

        let mut inverted: Vec<(Ident, Ident, Vec<Ident>)> = Vec::new();
        for from_name in names {
            let from_dim = self.dimension(&from_name).unwrap();
            for (to_name, mapping_value) in from_dim.model_mappings.iter() {
                let to_dim = match self.dimension(to_name) {
                    Some(dim) => dim,
                    None => {
                        eprintln!(
                            "warning: mapping from {} to unknown dimension {} ignored",
                            from_name, to_name
                        );
                        continue;
                    }
                };
                if mapping_value.is_empty() {
                    inverted.push((from_name.clone(), to_name.clone(), from_dim.value.clone()));
                    continue;
                }
                let mut slots: Vec<Ident> = vec![String::new(); to_dim.size];
                let place = |slots: &mut Vec<Ident>, to_ind: &str, from_ind: &Ident| {
                    match to_dim.value.iter().position(|v| v == to_ind) {
                        Some(pos) => slots[pos] = from_ind.clone(),
                        None => {
                            eprintln!(
                                "warning: mapping from {} to {}: {} is not an index of the target",
                                from_name, to_name, to_ind
                            );
                        }
                    }
                };
                for (i, from_ind) in from_dim.value.iter().enumerate() {
                    let token = match mapping_value.get(i) {
                        Some(token) => token,
                        None => {
                            eprintln!(
                                "warning: mapping from {} to {} is shorter than the dimension",
                                from_name, to_name
                            );
                            break;
                        }
                    };
                    if let Some(token_dim) = self.dimension(token) {
                        for to_ind in token_dim.value.iter() {
                            place(&mut slots, to_ind, from_ind);
                        }
                    } else {
                        place(&mut slots, token, from_ind);
                    }
                }
                inverted.push((from_name.clone(), to_name.clone(), slots));
            }
        }
        for (from_name, to_name, slots) in inverted {
            if let Some(Subscript::Dimension(dim)) = self.subs.get_mut(&from_name) {
                dim.mappings.insert(to_name, slots);
            }
        }
    }
}

/// Reads subscript elements from a CSV file: the cells to the right of the
/// anchor cell's position, on the anchor cell's row, until the first empty
/// cell. `tab` is carried for diagnostics only (CSV files are single-tab).
fn read_direct_subscript(path: &Path, _tab: &str, cell: &str) -> Result<Vec<String>> {
    let (col, row) = parse_cell_ref(cell)?;
    let mut rdr = match csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
    {
        Ok(rdr) => rdr,
        Err(err) => {
            return sub_err!(BadTable, format!("{}: {}", path.display(), err));
        }
    };
    for (i, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                return sub_err!(BadTable, format!("{}: {}", path.display(), err));
            }
        };
        if i == row {
            let elements: Vec<String> = record
                .iter()
                .skip(col)
                .take_while(|field| !field.trim().is_empty())
                .map(|field| field.trim().to_string())
                .collect();
            return Ok(elements);
        }
    }
    sub_err!(
        BadTable,
        format!("{}: no row {} for cell {}", path.display(), row + 1, cell)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn resolved(defs: &[(&str, &[&str])]) -> SubscriptTable {
        let mut table = SubscriptTable::new();
        for (name, elements) in defs {
            let elements = elements.iter().map(|e| e.to_string()).collect();
            table.add_dimension(name, elements, Vec::new()).unwrap();
        }
        table.resolve(&HashMap::new(), None).unwrap();
        table
    }

    #[test]
    fn test_expansion() {
        let table = resolved(&[
            ("DimA", &["a1", "a2"]),
            ("DimB", &["b1", "b2"]),
            ("DimC", &["DimA", "b1"]),
        ]);
        let dim = table.dimension("_dimc").unwrap();
        assert_eq!(vec!["_a1", "_a2", "_b1"], dim.value);
        assert_eq!(3, dim.size);
        assert!(table.is_index("_a1"));
        // the merged dimension is the largest containing a1, so it owns
        // the family
        assert_eq!(Some("_dimc"), table.family_of("_a2"));
        assert_eq!("_dimc", table.dimension("_dima").unwrap().family);
    }

    #[test]
    fn test_expansion_cycle() {
        let mut table = SubscriptTable::new();
        table
            .add_dimension("DimA", vec!["DimB".to_string()], Vec::new())
            .unwrap();
        table
            .add_dimension("DimB", vec!["DimA".to_string()], Vec::new())
            .unwrap();
        let err = table.resolve(&HashMap::new(), None).unwrap_err();
        assert_eq!(
            crate::common::ErrorCode::CircularDimensionDefinition,
            err.code
        );
    }

    #[test]
    fn test_duplicate_dimension() {
        let mut table = SubscriptTable::new();
        table
            .add_dimension("DimA", vec!["a1".to_string()], Vec::new())
            .unwrap();
        let err = table
            .add_dimension("DimA", vec!["a2".to_string()], Vec::new())
            .unwrap_err();
        assert_eq!(crate::common::ErrorCode::DuplicateDimension, err.code);
    }

    #[test]
    fn test_alias_inherits_family() {
        let mut table = SubscriptTable::new();
        table
            .add_dimension(
                "DimA",
                vec!["a1".to_string(), "a2".to_string()],
                Vec::new(),
            )
            .unwrap();
        table.add_alias("DimX", "DimA").unwrap();
        table.resolve(&HashMap::new(), None).unwrap();

        let alias = table.dimension("_dimx").unwrap();
        assert_eq!(vec!["_a1", "_a2"], alias.value);
        assert_eq!(2, alias.size);
        assert_eq!("_dima", alias.family);
        assert_eq!(1, table.all_aliases().len());
        // aliases are not listed among plain dimensions
        assert!(table.all_dimensions().iter().all(|d| d.name != "_dimx"));
    }

    #[test]
    fn test_family_assignment_prefers_largest() {
        // SubDim's first index a1 is contained in both SubDim (size 1) and
        // DimA (size 2): the larger dimension owns the family.
        let table = resolved(&[("DimA", &["a1", "a2"]), ("SubDim", &["a1"])]);
        assert_eq!("_dima", table.dimension("_subdim").unwrap().family);
        assert_eq!("_dima", table.dimension("_dima").unwrap().family);
    }

    #[test]
    fn test_family_override() {
        let mut table = SubscriptTable::new();
        table
            .add_dimension(
                "DimA",
                vec!["a1".to_string(), "a2".to_string()],
                Vec::new(),
            )
            .unwrap();
        table
            .add_dimension(
                "DimB",
                vec!["a1".to_string(), "a2".to_string()],
                Vec::new(),
            )
            .unwrap();
        let families: HashMap<Ident, Ident> =
            [("_dimb".to_string(), "_dimb".to_string())].into_iter().collect();
        table.resolve(&families, None).unwrap();
        assert_eq!("_dimb", table.dimension("_dimb").unwrap().family);
    }

    #[test]
    fn test_normal_order() {
        let table = resolved(&[("DimA", &["a1", "a2"]), ("DimB", &["b1", "b2"])]);
        let subs: Vec<Ident> = vec!["_dimb".to_string(), "_a1".to_string()];
        let normal = table.normal_order(&subs);
        // _a1 sorts by its family _dima, _dimb by itself
        assert_eq!(vec!["_a1", "_dimb"], normal.to_vec());
    }

    #[test]
    fn test_mapping_inversion_empty() {
        let mut table = SubscriptTable::new();
        table
            .add_dimension(
                "DimA",
                vec!["a1".to_string(), "a2".to_string()],
                vec![("DimB".to_string(), Vec::new())],
            )
            .unwrap();
        table
            .add_dimension(
                "DimB",
                vec!["b1".to_string(), "b2".to_string()],
                Vec::new(),
            )
            .unwrap();
        table.resolve(&HashMap::new(), None).unwrap();
        let dim = table.dimension("_dima").unwrap();
        assert_eq!(vec!["_a1", "_a2"], dim.mappings["_dimb"]);
    }

    #[test]
    fn test_mapping_inversion_indices() {
        // DimA maps a1->b2, a2->b1: inverted, position of b1 holds a2.
        let mut table = SubscriptTable::new();
        table
            .add_dimension(
                "DimA",
                vec!["a1".to_string(), "a2".to_string()],
                vec![(
                    "DimB".to_string(),
                    vec!["b2".to_string(), "b1".to_string()],
                )],
            )
            .unwrap();
        table
            .add_dimension(
                "DimB",
                vec!["b1".to_string(), "b2".to_string()],
                Vec::new(),
            )
            .unwrap();
        table.resolve(&HashMap::new(), None).unwrap();
        let dim = table.dimension("_dima").unwrap();
        assert_eq!(vec!["_a2", "_a1"], dim.mappings["_dimb"]);
    }

    #[test]
    fn test_mapping_inversion_dimension_token() {
        // mapping a whole dimension token spreads the from-index across it
        let mut table = SubscriptTable::new();
        table
            .add_dimension(
                "DimA",
                vec!["a1".to_string()],
                vec![("DimB".to_string(), vec!["DimB".to_string()])],
            )
            .unwrap();
        table
            .add_dimension(
                "DimB",
                vec!["b1".to_string(), "b2".to_string()],
                Vec::new(),
            )
            .unwrap();
        table.resolve(&HashMap::new(), None).unwrap();
        let dim = table.dimension("_dima").unwrap();
        assert_eq!(vec!["_a1", "_a1"], dim.mappings["_dimb"]);
    }

    #[test]
    fn test_direct_subscript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "label,Boston,Chicago,LA").unwrap();
        drop(f);

        let mut table = SubscriptTable::new();
        table
            .add_direct_dimension("City", "subs.csv", "CSV", "B1")
            .unwrap();
        table.resolve(&HashMap::new(), Some(dir.path())).unwrap();
        let dim = table.dimension("_city").unwrap();
        assert_eq!(vec!["_boston", "_chicago", "_la"], dim.value);
        assert_eq!(3, dim.size);
    }
}
