//! Overload resolution.
//!
//! One resolver serves methods, constructors, indexers, aggregate forms,
//! and the synthetic operator signature sets. A candidate is applicable
//! when its arity matches exactly, no parameter is an out-parameter, and
//! every argument promotes (non-exactly) to the parameter type. Among
//! multiple applicable candidates, those not worse than any other
//! survive; anything but exactly one survivor is a failure.

use dynq_types::code::{is_compatible_with, is_signed_integral, is_unsigned_integral};
use dynq_types::{Expr, Ty};

use crate::parser::Parser;

/// A resolvable candidate: its parameter types and whether any parameter
/// is an out-parameter.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
    pub params: Vec<Ty>,
    pub has_out: bool,
}

impl Candidate {
    pub fn new(params: Vec<Ty>) -> Self {
        Self {
            params,
            has_out: false,
        }
    }
}

/// The outcome of resolution. `Single` carries the promoted argument
/// vector, written back into the call the caller builds.
pub(crate) enum Resolution {
    Single { index: usize, args: Vec<Expr> },
    None,
    Ambiguous,
}

impl Parser<'_> {
    /// Resolve `args` against `candidates`.
    pub(crate) fn find_best(&self, candidates: &[Candidate], args: &[Expr]) -> Resolution {
        let mut applicable: Vec<(usize, Vec<Expr>)> = Vec::new();
        'candidates: for (index, candidate) in candidates.iter().enumerate() {
            if candidate.has_out || candidate.params.len() != args.len() {
                continue;
            }
            let mut promoted = Vec::with_capacity(args.len());
            for (arg, param) in args.iter().zip(&candidate.params) {
                match self.promote_expression(arg, param, false) {
                    Some(e) => promoted.push(e),
                    None => continue 'candidates,
                }
            }
            applicable.push((index, promoted));
        }

        match applicable.len() {
            0 => Resolution::None,
            1 => {
                let (index, args) = applicable.pop().expect("len checked");
                Resolution::Single { index, args }
            }
            _ => {
                // Retain candidates that are not worse than any other.
                let survivors: Vec<usize> = (0..applicable.len())
                    .filter(|&m| {
                        (0..applicable.len()).all(|n| {
                            m == n
                                || !is_better_than(
                                    args,
                                    &candidates[applicable[n].0].params,
                                    &candidates[applicable[m].0].params,
                                )
                        })
                    })
                    .collect();
                if survivors.len() == 1 {
                    let (index, args) = applicable.swap_remove(survivors[0]);
                    Resolution::Single { index, args }
                } else {
                    Resolution::Ambiguous
                }
            }
        }
    }
}

/// Whether candidate `m` is strictly better than `n` for `args`: every
/// position at least as good, at least one strictly better.
fn is_better_than(args: &[Expr], m: &[Ty], n: &[Ty]) -> bool {
    let mut better = false;
    for (i, arg) in args.iter().enumerate() {
        match compare_conversions(&arg.ty(), &m[i], &n[i]) {
            c if c < 0 => return false,
            c if c > 0 => better = true,
            _ => {}
        }
    }
    better
}

/// Compare the conversion from `s` to `t1` against the conversion from
/// `s` to `t2`: positive favors `t1`, negative favors `t2`.
fn compare_conversions(s: &Ty, t1: &Ty, t2: &Ty) -> i32 {
    if t1 == t2 {
        return 0;
    }
    if s == t1 {
        return 1;
    }
    if s == t2 {
        return -1;
    }
    let t1_into_t2 = is_compatible_with(t1, t2);
    let t2_into_t1 = is_compatible_with(t2, t1);
    if t1_into_t2 && !t2_into_t1 {
        return 1; // t1 is the narrower target
    }
    if t2_into_t1 && !t1_into_t2 {
        return -1;
    }
    if is_signed_integral(t1) && is_unsigned_integral(t2) {
        return 1;
    }
    if is_signed_integral(t2) && is_unsigned_integral(t1) {
        return -1;
    }
    0
}
