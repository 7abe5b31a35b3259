// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Builtin function classification.
//!
//! All names here are in canonical form; the equation reader canonicalizes
//! function names before consulting these tables.

pub fn is_builtin_fn(name: &str) -> bool {
    is_level_intrinsic(name)
        || is_data_intrinsic(name)
        || is_0_arity_builtin_fn(name)
        || matches!(
            name,
            "_abs"
                | "_arccos"
                | "_arcsin"
                | "_arctan"
                | "_cos"
                | "_exp"
                | "_if_then_else"
                | "_initial"
                | "_int"
                | "_integer"
                | "_ln"
                | "_log10"
                | "_lookup"
                | "_max"
                | "_min"
                | "_modulo"
                | "_power"
                | "_pulse"
                | "_pulse_train"
                | "_quantum"
                | "_ramp"
                | "_sin"
                | "_sqrt"
                | "_step"
                | "_tan"
                | "_vector_select"
                | "_with_lookup"
                | "_xidz"
                | "_zidz"
        )
}

/// Integration intrinsics: a right-hand side using one of these makes the
/// variable a level, carrying an initial value.
pub fn is_level_intrinsic(name: &str) -> bool {
    matches!(
        name,
        "_integ"
            | "_active_initial"
            | "_delay_fixed"
            | "_delay1"
            | "_delay1i"
            | "_delay3"
            | "_delay3i"
            | "_smooth"
            | "_smoothi"
            | "_smooth3"
            | "_smooth3i"
            | "_trend"
    )
}

/// Data-import intrinsics: the variable's points come from external tables.
pub fn is_data_intrinsic(name: &str) -> bool {
    matches!(name, "_get_direct_data")
}

pub fn is_0_arity_builtin_fn(name: &str) -> bool {
    matches!(
        name,
        "_time" | "_time_step" | "_initial_time" | "_final_time" | "_saveper"
    )
}

#[test]
fn test_is_builtin_fn() {
    assert!(is_builtin_fn("_max"));
    assert!(is_builtin_fn("_integ"));
    assert!(is_builtin_fn("_with_lookup"));
    assert!(!is_builtin_fn("_maximal"));
    assert!(!is_builtin_fn("_demand_curve"));
}

#[test]
fn test_is_level_intrinsic() {
    assert!(is_level_intrinsic("_integ"));
    assert!(is_level_intrinsic("_smooth3i"));
    assert!(!is_level_intrinsic("_initial"));
    assert!(!is_level_intrinsic("_max"));
}
