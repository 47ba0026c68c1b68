//! Nearest-neighbour parameter sets.

mod turner1999;
mod turner2004;

/// The minimum hairpin loop length.
pub const TURN: usize = 3;
/// The maximum total unpaired length of a bulge or interior loop.
pub const MAXLOOP: usize = 30;
/// The maximum run of unpaired bases inside a multiloop region.
pub const MULTI_MAX_UNPAIRED: usize = 30;
/// The number of distinguishable base pairs.
pub const NBPAIRS: usize = 7;
/// Tabulated "never occurs" energy.
pub const INF_ENERGY: i32 = 10_000_000;

/// The gas constant, in cal/K.
pub const GAS_CONSTANT: f64 = 1.98717;
/// 0 deg Celsius in Kelvin.
pub const K0: f64 = 273.15;

/// Pair-type indexed square table (stacking energies).
pub type PairTable = [[i32; NBPAIRS + 1]; NBPAIRS + 1];
/// Pair type x two mismatching bases.
pub type MismatchTable = [[[i32; 5]; 5]; NBPAIRS];
/// Pair type x one dangling base.
pub type DangleTable = [[i32; 5]; NBPAIRS + 1];
/// Loop-size initiation energies.
pub type LoopInitTable = [i32; MAXLOOP + 1];
/// 1x1 interior loops: outer pair, inner pair, the two unpaired bases.
pub type Int11Table = [[[[i32; 5]; 5]; NBPAIRS + 1]; NBPAIRS + 1];
/// 1x2 interior loops: outer pair, inner pair, three unpaired bases.
pub type Int21Table = [[[[[i32; 5]; 5]; 5]; NBPAIRS + 1]; NBPAIRS + 1];
/// 2x2 interior loops: outer pair, inner pair, four unpaired bases.
pub type Int22Table = [[[[[[i32; 5]; 5]; 5]; 5]; NBPAIRS + 1]; NBPAIRS + 1];

/// Which parameter set drives the energy model.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Model {
    /// The 2004 set: special short hairpins plus multiloop and exterior
    /// terminal mismatches.
    #[default]
    Turner2004,
    /// The 1999 set: dangling ends stand in for the terminal mismatches.
    Turner1999,
}

impl Model {
    /// Resolved parameter set for this model. Sets are built once per
    /// process and shared.
    #[must_use]
    pub fn params(self) -> &'static Params {
        match self {
            Self::Turner2004 => &turner2004::PARAMS,
            Self::Turner1999 => &turner1999::PARAMS,
        }
    }
}

/// Tabulated tri-, tetra- and hexa-loop motifs with their full hairpin
/// energies. Motifs include the closing pair and are separated by single
/// spaces.
pub struct SpecialHairpins {
    /// Triloop motifs (5 bases + closing pair).
    pub triloops: &'static str,
    /// Energies matching [`Self::triloops`] in order.
    pub triloop: &'static [i32],
    /// Tetraloop motifs.
    pub tetraloops: &'static str,
    /// Energies matching [`Self::tetraloops`] in order.
    pub tetraloop: &'static [i32],
    /// Hexaloop motifs.
    pub hexaloops: &'static str,
    /// Energies matching [`Self::hexaloops`] in order.
    pub hexaloop: &'static [i32],
}

/// One fully resolved parameter set. All table energies are in deca-cal/mol
/// at 37 degrees Celsius.
pub struct Params {
    /// Reference temperature in degrees Celsius.
    pub temperature: f64,
    /// Thermal energy in table units.
    pub kt: f64,
    /// Scale of the logarithmic loop-size extrapolation beyond [`MAXLOOP`].
    pub lxc: f64,
    /// Per-branch multiloop energy.
    pub ml_intern: i32,
    /// Multiloop closing energy.
    pub ml_closing: i32,
    /// Per-unpaired-base multiloop energy.
    pub ml_base: i32,
    /// Cap on the interior-loop asymmetry penalty.
    pub max_ninio: i32,
    /// Interior-loop asymmetry penalty per unit of asymmetry.
    pub ninio: i32,
    /// Penalty for a non-GC pair terminating a helix.
    pub terminal_au: i32,
    /// Stacking energies.
    pub stack: &'static PairTable,
    /// Hairpin initiation by loop size.
    pub hairpin: &'static LoopInitTable,
    /// Bulge initiation by loop size.
    pub bulge: &'static LoopInitTable,
    /// Interior-loop initiation by loop size.
    pub internal_loop: &'static LoopInitTable,
    /// Generic interior-loop mismatches.
    pub mismatch_internal: &'static MismatchTable,
    /// Mismatches for 1xn interior loops.
    pub mismatch_internal_1n: &'static MismatchTable,
    /// Mismatches for 2x3 interior loops.
    pub mismatch_internal_23: &'static MismatchTable,
    /// Hairpin mismatches.
    pub mismatch_hairpin: &'static MismatchTable,
    /// Multiloop terminal mismatches; dangles are used when absent.
    pub mismatch_multi: Option<&'static MismatchTable>,
    /// Exterior terminal mismatches; dangles are used when absent.
    pub mismatch_external: Option<&'static MismatchTable>,
    /// 5' dangling ends.
    pub dangle5: &'static DangleTable,
    /// 3' dangling ends.
    pub dangle3: &'static DangleTable,
    /// Dedicated 1x1 interior-loop energies.
    pub int11: &'static Int11Table,
    /// Dedicated 1x2 interior-loop energies.
    pub int21: &'static Int21Table,
    /// Dedicated 2x2 interior-loop energies.
    pub int22: &'static Int22Table,
    /// Tabulated special short hairpins, when the set carries them.
    pub special_hairpins: Option<&'static SpecialHairpins>,
    /// Whether engines driven by this set use the tabulated log-sum-exp.
    pub use_fast_logsumexp: bool,
}

/// Thermal energy at `temperature` in the tables' deca-cal/mol units.
pub(crate) fn kt_at(temperature: f64) -> f64 {
    (temperature + K0) * GAS_CONSTANT / 10.0
}

// The dedicated small interior-loop tables are materialised from the same
// per-class rule energy_loop applies to every other size: initiation plus
// capped asymmetry plus the class mismatches.

pub(crate) fn build_int11(init: &LoopInitTable, mismatch: &MismatchTable) -> Box<Int11Table> {
    let mut table = Box::new([[[[0_i32; 5]; 5]; NBPAIRS + 1]; NBPAIRS + 1]);
    for t1 in 1..NBPAIRS {
        for t2 in 1..NBPAIRS {
            for a in 0..5 {
                for b in 0..5 {
                    table[t1][t2][a][b] = init[2] + mismatch[t1][a][b] + mismatch[t2][b][a];
                }
            }
        }
    }
    table
}

pub(crate) fn build_int21(
    init: &LoopInitTable,
    ninio: i32,
    max_ninio: i32,
    mismatch: &MismatchTable,
) -> Box<Int21Table> {
    let asymmetry = max_ninio.min(ninio);
    let mut table = Box::new([[[[[0_i32; 5]; 5]; 5]; NBPAIRS + 1]; NBPAIRS + 1]);
    for t1 in 1..NBPAIRS {
        for t2 in 1..NBPAIRS {
            for a in 0..5 {
                for c in 0..5 {
                    for b in 0..5 {
                        table[t1][t2][a][c][b] =
                            init[3] + asymmetry + mismatch[t1][a][b] + mismatch[t2][c][a];
                    }
                }
            }
        }
    }
    table
}

pub(crate) fn build_int22(init: &LoopInitTable, mismatch: &MismatchTable) -> Box<Int22Table> {
    let mut table = Box::new([[[[[[0_i32; 5]; 5]; 5]; 5]; NBPAIRS + 1]; NBPAIRS + 1]);
    for t1 in 1..NBPAIRS {
        for t2 in 1..NBPAIRS {
            for a in 0..5 {
                for p in 0..5 {
                    for q in 0..5 {
                        for b in 0..5 {
                            table[t1][t2][a][p][q][b] =
                                init[4] + mismatch[t1][a][b] + mismatch[t2][q][p];
                        }
                    }
                }
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sets_resolve() {
        let turner2004 = Model::Turner2004.params();
        let turner1999 = Model::Turner1999.params();
        assert!(turner2004.special_hairpins.is_some());
        assert!(turner1999.special_hairpins.is_none());
        assert!(turner2004.mismatch_external.is_some());
        assert!(turner1999.mismatch_external.is_none());
    }

    #[test]
    fn thermal_energy_matches_the_reference_temperature() {
        let params = Model::Turner2004.params();
        float_cmp::assert_approx_eq!(f64, params.kt, 61.63207755, epsilon = 1e-6);
    }

    #[test]
    fn small_loop_tables_follow_the_generic_rule() {
        let params = Model::Turner1999.params();
        // 1x1 between two CG pairs with A-A mismatches
        let expected = params.internal_loop[2]
            + params.mismatch_internal_1n[1][1][1]
            + params.mismatch_internal_1n[1][1][1];
        assert_eq!(params.int11[1][1][1][1], expected);
    }

    #[test]
    fn loop_initiations_are_monotonic_past_the_measured_sizes() {
        for params in [Model::Turner2004.params(), Model::Turner1999.params()] {
            for d in 10..MAXLOOP {
                assert!(params.hairpin[d] <= params.hairpin[d + 1]);
                assert!(params.bulge[d] <= params.bulge[d + 1]);
                assert!(params.internal_loop[d] <= params.internal_loop[d + 1]);
            }
        }
    }
}
