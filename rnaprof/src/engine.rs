//! The inside-outside engine and profile assembly.

use super::beam;
use super::energy::{EnergyModel, EnergyModelEnum, NearestNeighbor};
use super::logsumexp::{add_range, prefix_sum, LogSumExp, NEG_INF};
use super::params::{Model, GAS_CONSTANT, K0, MAXLOOP, MULTI_MAX_UNPAIRED, TURN};
use super::profile::Profile;
use super::sequence::{self, NBASE};
use super::sparse::SparseTable;
use rustc_hash::FxHashMap;
use tracing::warn;

/// Engine configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// States kept per DP column; 0 disables pruning.
    pub beam_size: usize,
    /// Parameter set driving the energy model.
    pub model: Model,
    /// Renormalise every profile column to sum to 1.
    pub normalize_profiles: bool,
    /// Column-sum drift beyond this bound triggers a diagnostic.
    pub normalize_warn_eps: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beam_size: 100,
            model: Model::default(),
            normalize_profiles: true,
            normalize_warn_eps: 1e-3,
        }
    }
}

/// Computes structural profiles, one sequence at a time.
///
/// All DP state is owned by the instance and rebuilt per [`Self::run`];
/// share nothing but the configuration across workers.
pub struct Engine {
    config: Config,
    lse: LogSumExp,
    energy: EnergyModelEnum,

    seq_n: usize,
    codes: Vec<usize>,
    next_pair: [Vec<usize>; NBASE],

    alpha_o: Vec<f64>,
    beta_o: Vec<f64>,
    alpha_s: SparseTable,
    alpha_se: SparseTable,
    alpha_m: SparseTable,
    alpha_mb: SparseTable,
    alpha_m1: SparseTable,
    alpha_m2: SparseTable,
    beta_s: SparseTable,
    beta_se: SparseTable,
    beta_m: SparseTable,
    beta_mb: SparseTable,
    beta_m1: SparseTable,
    beta_m2: SparseTable,

    prob_b: Vec<f64>,
    prob_e: Vec<f64>,
    prob_h: Vec<f64>,
    prob_i: Vec<f64>,
    prob_m: Vec<f64>,
    prob_s: Vec<f64>,
}

/// Bias used for pruning: the outside-so-far weight of everything left of
/// the state's left endpoint.
fn prune_by_outside(column: &mut FxHashMap<usize, f64>, beam_size: usize, alpha_o: &[f64]) -> f64 {
    beam::prune(column, beam_size, |i, score| {
        if i >= 1 {
            alpha_o[i - 1] + score
        } else {
            score
        }
    })
}

impl Engine {
    /// Creates an engine; the log-sum-exp mode follows the parameter set.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let lse = if config.model.params().use_fast_logsumexp {
            LogSumExp::Fast
        } else {
            LogSumExp::Legacy
        };
        Self {
            config,
            lse,
            energy: NearestNeighbor::new(config.model).into(),
            seq_n: 0,
            codes: Vec::new(),
            next_pair: std::array::from_fn(|_| Vec::new()),
            alpha_o: Vec::new(),
            beta_o: Vec::new(),
            alpha_s: SparseTable::new(),
            alpha_se: SparseTable::new(),
            alpha_m: SparseTable::new(),
            alpha_mb: SparseTable::new(),
            alpha_m1: SparseTable::new(),
            alpha_m2: SparseTable::new(),
            beta_s: SparseTable::new(),
            beta_se: SparseTable::new(),
            beta_m: SparseTable::new(),
            beta_mb: SparseTable::new(),
            beta_m1: SparseTable::new(),
            beta_m2: SparseTable::new(),
            prob_b: Vec::new(),
            prob_e: Vec::new(),
            prob_h: Vec::new(),
            prob_i: Vec::new(),
            prob_m: Vec::new(),
            prob_s: Vec::new(),
        }
    }

    /// Computes the structural profile of `seq`.
    ///
    /// Sequences of length `<= TURN` cannot pair at all; they yield a zero
    /// profile and a diagnostic.
    pub fn run(&mut self, seq: &str) -> Profile {
        self.initialize(seq);
        if self.seq_n <= TURN {
            warn!(
                length = self.seq_n,
                "sequence too short to pair, emitting a zero profile"
            );
            self.alpha_o.fill(0.0);
            self.beta_o.fill(0.0);
            return self.assemble();
        }
        self.calc_inside();
        self.calc_outside();
        self.calc_profile();
        self.assemble()
    }

    /// Drops all per-sequence state.
    pub fn clear(&mut self) {
        self.seq_n = 0;
        self.codes.clear();
        self.next_pair = std::array::from_fn(|_| Vec::new());
        self.alpha_o.clear();
        self.beta_o.clear();
        for table in [
            &mut self.alpha_s,
            &mut self.alpha_se,
            &mut self.alpha_m,
            &mut self.alpha_mb,
            &mut self.alpha_m1,
            &mut self.alpha_m2,
            &mut self.beta_s,
            &mut self.beta_se,
            &mut self.beta_m,
            &mut self.beta_mb,
            &mut self.beta_m1,
            &mut self.beta_m2,
        ] {
            table.clear();
        }
        for track in [
            &mut self.prob_b,
            &mut self.prob_e,
            &mut self.prob_h,
            &mut self.prob_i,
            &mut self.prob_m,
            &mut self.prob_s,
        ] {
            track.clear();
        }
    }

    /// Log partition function of the last run.
    #[must_use]
    pub fn log_partition(&self) -> f64 {
        if self.seq_n == 0 {
            return 0.0;
        }
        self.alpha_o[self.seq_n - 1]
    }

    /// Free energy of the ensemble of the last run, in kcal/mol.
    #[must_use]
    pub fn ensemble_energy(&self) -> f64 {
        let params = self.config.model.params();
        self.log_partition() * -(params.temperature + K0) * GAS_CONSTANT / 1000.0
    }

    /// Probability of every stem pair kept by the last run, sorted by
    /// endpoints. Summing the probabilities counts each paired position
    /// once, so twice the sum equals the unnormalised stem track total.
    #[must_use]
    pub fn stem_pair_probabilities(&self) -> Vec<(usize, usize, f64)> {
        if self.seq_n == 0 {
            return Vec::new();
        }
        let log_z = self.log_partition();
        let mut pairs = Vec::new();
        for j in 0..self.seq_n {
            for (&i, &score) in self.alpha_s.column(j) {
                if self.beta_s.contains(i, j) {
                    pairs.push((i, j, (score + self.beta_s.get(i, j) - log_z).exp()));
                }
            }
        }
        pairs.sort_unstable_by_key(|&(i, j, _)| (i, j));
        pairs
    }

    fn initialize(&mut self, seq: &str) {
        let codes = sequence::encode(seq);
        self.seq_n = codes.len();
        self.energy.set_sequence(seq, &codes);
        self.next_pair = sequence::build_next_pair(&codes);
        self.codes = codes;

        let n = self.seq_n;
        self.alpha_o.clear();
        self.alpha_o.resize(n, NEG_INF);
        self.beta_o.clear();
        self.beta_o.resize(n, NEG_INF);
        for table in [
            &mut self.alpha_s,
            &mut self.alpha_se,
            &mut self.alpha_m,
            &mut self.alpha_mb,
            &mut self.alpha_m1,
            &mut self.alpha_m2,
            &mut self.beta_s,
            &mut self.beta_se,
            &mut self.beta_m,
            &mut self.beta_mb,
            &mut self.beta_m1,
            &mut self.beta_m2,
        ] {
            table.resize(n);
        }
        for track in [
            &mut self.prob_b,
            &mut self.prob_e,
            &mut self.prob_h,
            &mut self.prob_i,
            &mut self.prob_m,
            &mut self.prob_s,
        ] {
            track.clear();
            track.resize(n, 0.0);
        }
    }

    fn pairable(&self, i: usize, j: usize) -> bool {
        sequence::can_pair(self.codes[i], self.codes[j])
    }

    fn calc_inside(&mut self) {
        let n = self.seq_n;
        let lse = self.lse;
        let kt = self.energy.kt();
        let beam_size = self.config.beam_size;

        self.alpha_o[0] = 0.0;

        for j in 0..n {
            // stems closed at j
            prune_by_outside(self.alpha_s.column_mut(j), beam_size, &self.alpha_o);
            for (i, score) in self.alpha_s.states(j) {
                // extend the helix outwards
                if i >= 1 && j + 1 < n && self.pairable(i - 1, j + 1) {
                    let e = self.energy.energy_loop(i - 1, j + 1, i, j);
                    self.alpha_s.update_sum(lse, i - 1, j + 1, score - e / kt);
                }

                // enter a multiloop as a branch, optionally padded right
                for pad in 0..=MULTI_MAX_UNPAIRED {
                    if j + pad >= n {
                        break;
                    }
                    let e = self.energy.energy_multi_bif(i, j)
                        + self.energy.energy_multi_unpaired(j + 1, j + pad);
                    self.alpha_m2.update_sum(lse, i, j + pad, score - e / kt);
                }

                // become the inner helix of a bulge or interior loop closed
                // by some (p - 1, q)
                if i >= 1 {
                    for p in (i.saturating_sub(MAXLOOP).max(1)..=i).rev() {
                        let pb = self.codes[p - 1];
                        let mut q = self.next_pair[pb][j + 1];
                        while q < n && (q - j - 1) + (i - p) <= MAXLOOP {
                            if !(p == i && q == j + 1) {
                                let e = self.energy.energy_loop(p - 1, q, i, j);
                                self.alpha_se.update_sum(lse, p, q - 1, score - e / kt);
                            }
                            q = self.next_pair[pb][q + 1];
                        }
                    }
                }

                // sit in the exterior loop
                let left = if i >= 1 { self.alpha_o[i - 1] } else { 0.0 };
                let e = self.energy.energy_external(i, j);
                lse.update_sum(&mut self.alpha_o, j, left + score - e / kt);
            }

            // two-or-more stem concatenations
            prune_by_outside(self.alpha_m2.column_mut(j), beam_size, &self.alpha_o);
            for (i, score) in self.alpha_m2.states(j) {
                self.alpha_m1.update_sum(lse, i, j, score);
                if i >= 1 {
                    for (k, score_m1) in self.alpha_m1.states(i - 1) {
                        self.alpha_mb.update_sum(lse, k, j, score_m1 + score);
                    }
                }
            }

            // bifurcation anchors
            prune_by_outside(self.alpha_mb.column_mut(j), beam_size, &self.alpha_o);
            for (i, score) in self.alpha_mb.states(j) {
                self.alpha_m1.update_sum(lse, i, j, score);
                for pad in 0..=MULTI_MAX_UNPAIRED {
                    if pad > i {
                        break;
                    }
                    self.alpha_m.update_sum(lse, i - pad, j, score);
                }
            }

            prune_by_outside(self.alpha_m1.column_mut(j), beam_size, &self.alpha_o);

            // complete multiloop interiors
            prune_by_outside(self.alpha_m.column_mut(j), beam_size, &self.alpha_o);
            for (i, score) in self.alpha_m.states(j) {
                if i >= 1 && j + 1 < n && self.pairable(i - 1, j + 1) {
                    let e = self.energy.energy_multi_closing(i - 1, j + 1);
                    self.alpha_se.update_sum(lse, i, j, score - e / kt);
                }
            }

            // hairpins seed the stem interior directly
            if j + 1 < n {
                for d in TURN..=MAXLOOP.min(j) {
                    let i = j + 1 - d;
                    if self.pairable(i - 1, j + 1) {
                        let e = self.energy.energy_hairpin(i - 1, j + 1);
                        self.alpha_se.update_sum(lse, i, j, -e / kt);
                    }
                }
            }

            // stem interiors promote to stems once the outer pair closes
            prune_by_outside(self.alpha_se.column_mut(j), beam_size, &self.alpha_o);
            for (i, score) in self.alpha_se.states(j) {
                if i >= 1 && j + 1 < n && self.pairable(i - 1, j + 1) {
                    self.alpha_s.update_sum(lse, i - 1, j + 1, score);
                }
            }

            // extend the exterior loop by one unpaired base
            if j + 1 < n {
                let e = self.energy.energy_external_unpaired(j + 1, j + 1);
                let v = self.alpha_o[j] - e / kt;
                lse.update_sum(&mut self.alpha_o, j + 1, v);
            }
        }
    }

    fn calc_outside(&mut self) {
        let n = self.seq_n;
        let lse = self.lse;
        let kt = self.energy.kt();

        for j in (0..n).rev() {
            let right = if j + 1 < n { self.beta_o[j + 1] } else { 0.0 };

            // exterior loop shrinks from the right
            let e_unpaired = self.energy.energy_external_unpaired(j + 1, j + 1);
            lse.update_sum(&mut self.beta_o, j, right - e_unpaired / kt);

            // exterior context of everything left of a stem
            for (i, score) in self.alpha_s.states(j) {
                let e = self.energy.energy_external(i, j);
                lse.update_sum(&mut self.beta_o, i, score + right - e / kt);
            }

            // stem interiors inherit the context of their stem
            for (i, _) in self.alpha_se.states(j) {
                if i >= 1 && j + 1 < n {
                    let v = self.beta_s.get(i - 1, j + 1);
                    self.beta_se.update_sum(lse, i, j, v);
                }
            }

            // multiloop interiors inherit through the closing pair
            for (i, _) in self.alpha_m.states(j) {
                if i >= 1 && j + 1 < n {
                    let e = self.energy.energy_multi_closing(i - 1, j + 1);
                    let v = self.beta_se.get(i, j);
                    self.beta_m.update_sum(lse, i, j, v - e / kt);
                }
            }

            // bifurcation anchors feed both fragment kinds
            for (i, _) in self.alpha_mb.states(j) {
                let v = self.beta_m1.get(i, j);
                self.beta_mb.update_sum(lse, i, j, v);
                for pad in 0..=MULTI_MAX_UNPAIRED {
                    if pad > i {
                        break;
                    }
                    let v = self.beta_m.get(i - pad, j);
                    self.beta_mb.update_sum(lse, i, j, v);
                }
            }

            // one- and many-branch fragments
            for (i, score_m2) in self.alpha_m2.states(j) {
                let v = self.beta_m1.get(i, j);
                self.beta_m2.update_sum(lse, i, j, v);
                if i == 0 {
                    continue;
                }
                for (k, score_m1) in self.alpha_m1.states(i - 1) {
                    let v = self.beta_mb.get(k, j);
                    self.beta_m1.update_sum(lse, k, i - 1, v + score_m2);
                    self.beta_m2.update_sum(lse, i, j, v + score_m1);
                }
            }

            // stems, mirroring the four inside rules
            for (i, _) in self.alpha_s.states(j) {
                let left = if i >= 1 { self.alpha_o[i - 1] } else { 0.0 };
                let e = self.energy.energy_external(i, j);
                self.beta_s.update_sum(lse, i, j, left + right - e / kt);

                if i >= 1 {
                    for p in (i.saturating_sub(MAXLOOP).max(1)..=i).rev() {
                        let pb = self.codes[p - 1];
                        let mut q = self.next_pair[pb][j + 1];
                        while q < n && (q - j - 1) + (i - p) <= MAXLOOP {
                            if !(p == i && q == j + 1) {
                                let e = self.energy.energy_loop(p - 1, q, i, j);
                                let v = self.beta_se.get(p, q - 1);
                                self.beta_s.update_sum(lse, i, j, v - e / kt);
                            }
                            q = self.next_pair[pb][q + 1];
                        }
                    }
                }

                if i >= 1 && j + 1 < n {
                    let e = self.energy.energy_loop(i - 1, j + 1, i, j);
                    let v = self.beta_s.get(i - 1, j + 1);
                    self.beta_s.update_sum(lse, i, j, v - e / kt);
                }

                for pad in 0..=MULTI_MAX_UNPAIRED {
                    if j + pad >= n {
                        break;
                    }
                    let e = self.energy.energy_multi_bif(i, j)
                        + self.energy.energy_multi_unpaired(j + 1, j + pad);
                    let v = self.beta_m2.get(i, j + pad);
                    self.beta_s.update_sum(lse, i, j, v - e / kt);
                }
            }
        }
    }

    fn calc_profile(&mut self) {
        let n = self.seq_n;
        let kt = self.energy.kt();
        let log_z = self.alpha_o[n - 1];

        // hairpin, bulge, and interior contexts from the stem interiors
        for k in 0..n {
            for (j, score) in self.beta_se.states(k) {
                let e_hairpin = self.energy.energy_hairpin(j - 1, k + 1);
                add_range(
                    &mut self.prob_h,
                    j,
                    k,
                    (score - e_hairpin / kt - log_z).exp(),
                );

                for p in j..=(j + MAXLOOP).min(k - 1) {
                    let mut q = k;
                    while q >= p + TURN + 1 && (p - j) + (k - q) <= MAXLOOP {
                        if !(p == j && q == k) && self.alpha_s.contains(p, q) {
                            let e = self.energy.energy_loop(j - 1, k + 1, p, q);
                            let w = (score + self.alpha_s.get(p, q) - e / kt - log_z).exp();
                            if q == k {
                                add_range(&mut self.prob_b, j, p - 1, w);
                            } else {
                                add_range(&mut self.prob_i, j, p - 1, w);
                            }
                            if p == j {
                                add_range(&mut self.prob_b, q + 1, k, w);
                            } else {
                                add_range(&mut self.prob_i, q + 1, k, w);
                            }
                        }
                        q -= 1;
                    }
                }
            }
        }
        prefix_sum(&mut self.prob_b);
        prefix_sum(&mut self.prob_h);
        prefix_sum(&mut self.prob_i);

        // multiloop context: unpaired run ahead of a bifurcation
        for k in 0..n {
            for (p, score) in self.alpha_mb.states(k) {
                if p == 0 {
                    continue;
                }
                for j in (p.saturating_sub(MAXLOOP)..p).rev() {
                    if self.beta_m.contains(j, k) {
                        let e = self.energy.energy_multi_unpaired(j, p - 1);
                        let w = (score + self.beta_m.get(j, k) - e / kt - log_z).exp();
                        add_range(&mut self.prob_m, j, p - 1, w);
                    }
                }
            }
        }
        // multiloop context: unpaired run behind the last stem
        for q in 0..n {
            for (j, score) in self.alpha_s.states(q) {
                for k in (q + 1)..=(q + MAXLOOP).min(n - 1) {
                    if self.beta_m2.contains(j, k) {
                        let e = self.energy.energy_multi_bif(j, q)
                            + self.energy.energy_multi_unpaired(q + 1, k);
                        let w = (score + self.beta_m2.get(j, k) - e / kt - log_z).exp();
                        add_range(&mut self.prob_m, q + 1, k, w);
                    }
                }
            }
        }
        prefix_sum(&mut self.prob_m);

        // stem context: both endpoints of every surviving pair
        for j in 0..n {
            for (i, score) in self.alpha_s.states(j) {
                if self.beta_s.contains(i, j) {
                    let w = (score + self.beta_s.get(i, j) - log_z).exp();
                    self.prob_s[i] += w;
                    self.prob_s[j] += w;
                }
            }
        }

        // exterior context
        self.prob_e[0] = (self.beta_o[1] - log_z).exp();
        self.prob_e[n - 1] = (self.alpha_o[n - 2] - log_z).exp();
        for i in 1..n - 1 {
            self.prob_e[i] = (self.alpha_o[i - 1] + self.beta_o[i + 1] - log_z).exp();
        }

        self.regularize();
    }

    fn regularize(&mut self) {
        let n = self.seq_n;
        let normalize = self.config.normalize_profiles;
        let eps = self.config.normalize_warn_eps;
        let mut tracks = [
            &mut self.prob_b,
            &mut self.prob_e,
            &mut self.prob_h,
            &mut self.prob_i,
            &mut self.prob_m,
            &mut self.prob_s,
        ];

        for idx in 0..n {
            let mut sum = 0.0;
            for track in &mut tracks {
                if track[idx] < 0.0 {
                    track[idx] = 0.0;
                }
                sum += track[idx];
            }
            if (sum - 1.0).abs() > eps {
                warn!(position = idx, sum, "profile column drifted from 1");
            }
            if normalize && sum > 0.0 {
                for track in &mut tracks {
                    track[idx] /= sum;
                }
            }
        }
    }

    fn assemble(&self) -> Profile {
        Profile::from_tracks([
            self.prob_b.clone(),
            self.prob_e.clone(),
            self.prob_h.clone(),
            self.prob_i.clone(),
            self.prob_m.clone(),
            self.prob_s.clone(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Track;
    use float_cmp::assert_approx_eq;

    #[test]
    fn too_short_sequences_yield_a_zero_profile() {
        let mut engine = Engine::new(Config::default());
        let profile = engine.run("ACG");
        for track in Track::ALL {
            assert!(profile.track(track).iter().all(|&p| p == 0.0));
        }
        assert_approx_eq!(f64, engine.log_partition(), 0.0, ulps = 2);
        assert_approx_eq!(f64, engine.ensemble_energy(), 0.0, ulps = 2);
    }

    #[test]
    fn unpairable_sequences_are_fully_exterior() {
        let mut engine = Engine::new(Config::default());
        let profile = engine.run("AAAAA");
        for p in 0..profile.len() {
            assert_approx_eq!(f64, profile.track(Track::Exterior)[p], 1.0, epsilon = 1e-12);
            assert_approx_eq!(f64, profile.track(Track::Stem)[p], 0.0, epsilon = 1e-12);
            assert_approx_eq!(f64, profile.track(Track::Hairpin)[p], 0.0, epsilon = 1e-12);
        }
        assert_approx_eq!(f64, engine.ensemble_energy(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rerunning_after_clear_is_bit_identical() {
        let mut engine = Engine::new(Config::default());
        let first = engine.run("GGGAAACCC");
        engine.clear();
        let second = engine.run("GGGAAACCC");
        assert_eq!(first, second);
    }

    #[test]
    fn fresh_engines_agree_with_reused_ones() {
        let mut reused = Engine::new(Config::default());
        reused.run("AAAAA");
        let warmed_over = reused.run("GGGAAACCC");
        let fresh = Engine::new(Config::default()).run("GGGAAACCC");
        assert_eq!(warmed_over, fresh);
    }
}
