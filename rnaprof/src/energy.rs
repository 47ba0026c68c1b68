//! Free-energy queries against the nearest-neighbour model.

use super::convert;
use super::params::{LoopInitTable, MismatchTable, Model, Params, MAXLOOP};
use super::sequence::BP_PAIR;
use enum_dispatch::enum_dispatch;

/// Scalar free-energy queries consumed by the inside-outside passes.
///
/// Positions are 0-based on the encoded sequence and energies come back in
/// the parameter tables' deca-cal/mol units; callers divide by [`kt`] where
/// the recurrences need unit-free terms.
///
/// [`kt`]: EnergyModel::kt
#[enum_dispatch]
pub trait EnergyModel {
    /// Installs the sequence all subsequent queries refer to.
    fn set_sequence(&mut self, seq: &str, codes: &[usize]);

    /// Thermal energy in the same units as the table entries.
    fn kt(&self) -> f64;

    /// Hairpin loop closed by the pair `(i, j)`.
    fn energy_hairpin(&self, i: usize, j: usize) -> f64;

    /// Stack, bulge, or interior loop with outer pair `(i, j)` and inner
    /// pair `(p, q)`, `i < p <= q < j`.
    fn energy_loop(&self, i: usize, j: usize, p: usize, q: usize) -> f64;

    /// Pair `(i, j)` sitting in the exterior loop.
    fn energy_external(&self, i: usize, j: usize) -> f64;

    /// Unpaired exterior stretch `[i, j]`.
    fn energy_external_unpaired(&self, i: usize, j: usize) -> f64;

    /// Unpaired multiloop stretch `[i, j]`.
    fn energy_multi_unpaired(&self, i: usize, j: usize) -> f64;

    /// Pair `(i, j)` closing a multiloop, scored from inside the loop.
    fn energy_multi_closing(&self, i: usize, j: usize) -> f64;

    /// Branch entering a multiloop through the pair `(i, j)`.
    fn energy_multi_bif(&self, i: usize, j: usize) -> f64;
}

/// Energy backends an engine can drive.
#[enum_dispatch(EnergyModel)]
pub enum EnergyModelEnum {
    /// Table-driven nearest-neighbour model.
    NearestNeighbor,
}

/// Nearest-neighbour model over one resolved parameter set.
pub struct NearestNeighbor {
    params: &'static Params,
    seq: String,
    codes: Vec<usize>,
}

impl NearestNeighbor {
    /// Creates the model for `model`'s parameter set; no sequence installed.
    #[must_use]
    pub fn new(model: Model) -> Self {
        Self {
            params: model.params(),
            seq: String::new(),
            codes: Vec::new(),
        }
    }

    fn pair_type(&self, i: usize, j: usize) -> usize {
        BP_PAIR[self.codes[i]][self.codes[j]]
    }

    /// Full tabulated energy of the hairpin closed by `(i, j)` when its
    /// motif (closing pair included) is one of the special loops.
    fn special_hairpin(&self, i: usize, j: usize) -> Option<i32> {
        let special = self.params.special_hairpins?;
        let d = j - i - 1;
        let (motifs, values) = match d {
            3 => (special.triloops, special.triloop),
            4 => (special.tetraloops, special.tetraloop),
            6 => (special.hexaloops, special.hexaloop),
            _ => return None,
        };
        let motif = &self.seq[i..=j];
        motifs.find(motif).map(|at| values[at / (d + 3)])
    }

    /// Size initiation, extrapolated logarithmically past [`MAXLOOP`].
    fn loop_initiation(&self, init: &LoopInitTable, d: usize) -> f64 {
        if d <= MAXLOOP {
            f64::from(init[d])
        } else {
            f64::from(init[MAXLOOP]) + self.params.lxc * (convert::f64_from_usize(d) / 30.0).ln()
        }
    }

    /// Mismatch or dangle contribution of the bases flanking the pair
    /// `(i, j)` from outside, plus the non-GC terminal penalty.
    fn terminal_stack(&self, i: usize, j: usize, mismatch: Option<&'static MismatchTable>) -> f64 {
        let params = self.params;
        let ty = self.pair_type(i, j);
        let has_left = i >= 1;
        let has_right = j + 1 < self.codes.len();

        let mut energy = 0.0;
        match mismatch {
            Some(table) if has_left && has_right => {
                energy += f64::from(table[ty][self.codes[i - 1]][self.codes[j + 1]]);
            }
            _ => {
                if has_left {
                    energy += f64::from(params.dangle5[ty][self.codes[i - 1]]);
                }
                if has_right {
                    energy += f64::from(params.dangle3[ty][self.codes[j + 1]]);
                }
            }
        }
        if ty > 2 {
            energy += f64::from(params.terminal_au);
        }
        energy
    }
}

impl EnergyModel for NearestNeighbor {
    fn set_sequence(&mut self, seq: &str, codes: &[usize]) {
        // motif lookups expect the upper-case RNA alphabet, and slicing by
        // position requires one byte per base
        self.seq = seq
            .chars()
            .map(|base| match base.to_ascii_uppercase() {
                'T' => 'U',
                upper if upper.is_ascii() => upper,
                _ => 'N',
            })
            .collect();
        self.codes = codes.to_vec();
    }

    fn kt(&self) -> f64 {
        self.params.kt
    }

    fn energy_hairpin(&self, i: usize, j: usize) -> f64 {
        let params = self.params;
        let ty = self.pair_type(i, j);
        let d = j - i - 1;

        if let Some(tabulated) = self.special_hairpin(i, j) {
            return f64::from(tabulated);
        }

        let mut energy = self.loop_initiation(params.hairpin, d);
        if d != 3 {
            energy += f64::from(params.mismatch_hairpin[ty][self.codes[i + 1]][self.codes[j - 1]]);
        } else if ty > 2 {
            energy += f64::from(params.terminal_au);
        }
        energy
    }

    fn energy_loop(&self, i: usize, j: usize, p: usize, q: usize) -> f64 {
        let params = self.params;
        let ty1 = self.pair_type(i, j);
        let ty2 = self.pair_type(q, p);
        let d1 = p - i - 1;
        let d2 = j - q - 1;
        let d = d1 + d2;
        let (dmin, dmax) = (d1.min(d2), d1.max(d2));
        let si = self.codes[i + 1];
        let sj = self.codes[j - 1];
        let sp = self.codes[p - 1];
        let sq = self.codes[q + 1];

        if dmax == 0 {
            return f64::from(params.stack[ty1][ty2]);
        }

        if dmin == 0 {
            let mut energy = self.loop_initiation(params.bulge, d);
            if dmax == 1 {
                energy += f64::from(params.stack[ty1][ty2]);
            } else {
                if ty1 > 2 {
                    energy += f64::from(params.terminal_au);
                }
                if ty2 > 2 {
                    energy += f64::from(params.terminal_au);
                }
            }
            return energy;
        }

        if d1 == 1 && d2 == 1 {
            return f64::from(params.int11[ty1][ty2][si][sj]);
        }
        if d1 == 1 && d2 == 2 {
            return f64::from(params.int21[ty1][ty2][si][sq][sj]);
        }
        if d1 == 2 && d2 == 1 {
            return f64::from(params.int21[ty2][ty1][sq][si][sp]);
        }
        if d1 == 2 && d2 == 2 {
            return f64::from(params.int22[ty1][ty2][si][sp][sq][sj]);
        }

        let mut energy = self.loop_initiation(params.internal_loop, d);
        energy += f64::from(
            params
                .max_ninio
                .min(params.ninio * convert::i32_from_usize(dmax - dmin)),
        );

        let mismatch = if dmin == 1 {
            params.mismatch_internal_1n
        } else if dmin == 2 && dmax == 3 {
            params.mismatch_internal_23
        } else {
            params.mismatch_internal
        };
        energy += f64::from(mismatch[ty1][si][sj]) + f64::from(mismatch[ty2][sq][sp]);

        energy
    }

    fn energy_external(&self, i: usize, j: usize) -> f64 {
        self.terminal_stack(i, j, self.params.mismatch_external)
    }

    fn energy_external_unpaired(&self, _i: usize, _j: usize) -> f64 {
        0.0
    }

    fn energy_multi_unpaired(&self, _i: usize, _j: usize) -> f64 {
        0.0
    }

    fn energy_multi_closing(&self, i: usize, j: usize) -> f64 {
        // the closing pair is scored as the reversed bifurcation term
        self.energy_multi_bif(j, i) + f64::from(self.params.ml_closing)
    }

    fn energy_multi_bif(&self, i: usize, j: usize) -> f64 {
        f64::from(self.params.ml_intern) + self.terminal_stack(i, j, self.params.mismatch_multi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence;
    use float_cmp::assert_approx_eq;

    fn model_for(seq: &str, model: Model) -> NearestNeighbor {
        let mut energy = NearestNeighbor::new(model);
        energy.set_sequence(seq, &sequence::encode(seq));
        energy
    }

    #[test]
    fn stack_energy_is_the_table_entry() {
        // outer (0, 8) reads as GC, inner (1, 7) reversed reads as CG
        let energy = model_for("GGGAAACCC", Model::Turner2004);
        assert_approx_eq!(f64, energy.energy_loop(0, 8, 1, 7), -330.0, ulps = 2);
    }

    #[test]
    fn short_hairpin_has_no_mismatch_term() {
        let energy = model_for("GGGAAACCC", Model::Turner1999);
        // (2, 6) closes AAA: initiation only, GC closing pair
        assert_approx_eq!(f64, energy.energy_hairpin(2, 6), 570.0, ulps = 2);
    }

    #[test]
    fn short_hairpin_closed_by_au_pays_the_terminal_penalty() {
        let energy = model_for("AAAAU", Model::Turner1999);
        // (0, 4) = A-U with d = 3: initiation plus the non-GC penalty
        assert_approx_eq!(f64, energy.energy_hairpin(0, 4), 570.0 + 50.0, ulps = 2);
    }

    #[test]
    fn long_hairpin_adds_the_mismatch_term() {
        let energy = model_for("AAAAAU", Model::Turner1999);
        // (0, 5) = A-U with d = 4: mismatch replaces the terminal penalty
        let mismatch = energy.energy_hairpin(0, 5) - 560.0;
        assert_approx_eq!(f64, mismatch, -30.0, ulps = 2);
    }

    #[test]
    fn special_tetraloop_is_tabulated() {
        // GGGGAC is not special; CUUCGG is (value 370)
        let energy = model_for("CUUCGG", Model::Turner2004);
        assert_approx_eq!(f64, energy.energy_hairpin(0, 5), 370.0, ulps = 2);
    }

    #[test]
    fn special_hairpins_are_absent_from_the_legacy_set() {
        let energy = model_for("CUUCGG", Model::Turner1999);
        // falls through to initiation + tetraloop mismatch
        let expected = 560.0 + f64::from(
            Model::Turner1999.params().mismatch_hairpin[1][4][3],
        );
        assert_approx_eq!(f64, energy.energy_hairpin(0, 5), expected, ulps = 2);
    }

    #[test]
    fn bulge_of_one_keeps_the_stack() {
        let energy = model_for("GGAGCCC", Model::Turner1999);
        // outer (1, 5) G-C, inner (3, 4) G-C, left bulge of one A
        let params = Model::Turner1999.params();
        let expected = f64::from(params.bulge[1]) + f64::from(params.stack[2][1]);
        assert_approx_eq!(f64, energy.energy_loop(1, 5, 3, 4), expected, ulps = 2);
    }

    #[test]
    fn external_pair_uses_dangles_without_mismatch_tables() {
        let energy = model_for("AGGGAAACCCA", Model::Turner1999);
        let params = Model::Turner1999.params();
        // (1, 9) = G-C with both neighbours present
        let expected = f64::from(params.dangle5[2][1]) + f64::from(params.dangle3[2][1]);
        assert_approx_eq!(f64, energy.energy_external(1, 9), expected, ulps = 2);
    }

    #[test]
    fn multi_closing_is_the_reversed_bifurcation_plus_closing() {
        let energy = model_for("GGGAAACCC", Model::Turner2004);
        let expected = energy.energy_multi_bif(8, 0) + 930.0;
        assert_approx_eq!(f64, energy.energy_multi_closing(0, 8), expected, ulps = 2);
    }

    #[test]
    fn unpaired_contributions_are_zero_under_the_default_model() {
        let energy = model_for("GGGAAACCC", Model::Turner2004);
        assert_approx_eq!(f64, energy.energy_external_unpaired(1, 4), 0.0, ulps = 2);
        assert_approx_eq!(f64, energy.energy_multi_unpaired(1, 4), 0.0, ulps = 2);
    }
}
