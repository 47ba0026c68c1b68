#![allow(missing_docs)]

use float_cmp::assert_approx_eq;
use rnaprof::engine::{Config, Engine};
use rnaprof::params::Model;
use rnaprof::profile::{Profile, Track};

fn run(seq: &str, config: Config) -> Profile {
    Engine::new(config).run(seq)
}

fn assert_stochastic(profile: &Profile, eps: f64) {
    for (position, &sum) in profile.column_sums().iter().enumerate() {
        assert!(
            (sum - 1.0).abs() <= eps,
            "column {position} sums to {sum}"
        );
    }
    for track in Track::ALL {
        for (position, &p) in profile.track(track).iter().enumerate() {
            assert!(
                (0.0..=1.0).contains(&p),
                "{track:?} at {position} out of range: {p}"
            );
        }
    }
}

#[test]
fn short_helix_with_hairpin() {
    let profile = run("GGGAAACCC", Config::default());
    assert_stochastic(&profile, 1e-6);

    // the canonical helix dominates, with register-shifted helices as the
    // main competition; stems carry most of the mass at the outer positions
    let stem = profile.track(Track::Stem);
    for position in [0, 1, 7] {
        assert!(
            stem[position] > 0.75,
            "stem probability at {position} is {}",
            stem[position]
        );
    }
    for position in [2, 6, 8] {
        assert!(
            stem[position] > 0.35,
            "stem probability at {position} is {}",
            stem[position]
        );
    }
    let stem_mass: f64 = [0, 1, 2, 6, 7, 8].iter().map(|&p| stem[p]).sum();
    assert!(stem_mass > 4.0, "stem mass over the helix is {stem_mass}");

    let hairpin = profile.track(Track::Hairpin);
    let loop_mass: f64 = (3..=5).map(|position| hairpin[position]).sum();
    assert!(loop_mass > 2.4, "hairpin mass over the loop is {loop_mass}");

    let exterior = profile.track(Track::Exterior);
    for position in [1, 2, 6, 7] {
        assert!(
            exterior[position] < 0.15,
            "exterior probability at {position} is {}",
            exterior[position]
        );
    }
}

#[test]
fn unpairable_sequence_is_exterior_only() {
    let mut engine = Engine::new(Config::default());
    let profile = engine.run("AAAAA");
    assert_stochastic(&profile, 1e-6);
    for position in 0..profile.len() {
        assert_approx_eq!(
            f64,
            profile.track(Track::Exterior)[position],
            1.0,
            epsilon = 1e-9
        );
    }
    assert_approx_eq!(f64, engine.ensemble_energy(), 0.0, epsilon = 1e-9);
}

#[test]
fn alternating_gc_without_a_possible_hairpin_stays_stochastic() {
    // no hairpin of length >= 3 exists, so the ensemble is mostly open;
    // the interesting property left is exact stochasticity
    let profile = run("GCGCGCGC", Config::default());
    assert_stochastic(&profile, 1e-6);
    let second = run("GCGCGCGC", Config::default());
    assert_eq!(profile, second);
}

#[test]
fn nested_helix_concentrates_stems_at_both_ends() {
    let profile = run("GGGGAAAACCCC", Config::default());
    assert_stochastic(&profile, 1e-6);

    let stem = profile.track(Track::Stem);
    for position in (0..4).chain(8..12) {
        assert!(
            stem[position] > 0.8,
            "stem probability at {position} is {}",
            stem[position]
        );
    }

    let hairpin = profile.track(Track::Hairpin);
    for position in 4..8 {
        assert!(
            hairpin[position] > 0.8,
            "hairpin probability at {position} is {}",
            hairpin[position]
        );
    }

    let internal = profile.track(Track::Internal);
    for (position, &p) in internal.iter().enumerate() {
        assert!(p < 0.05, "internal probability at {position} is {p}");
    }
}

#[test]
fn unknown_bases_never_pair() {
    let profile = run("GGGAAACCCNGGGAAACCC", Config::default());
    assert_stochastic(&profile, 1e-6);

    let stem = profile.track(Track::Stem);
    assert_approx_eq!(f64, stem[9], 0.0, epsilon = 1e-12);

    // the N sits between two hairpin helices and reads as exterior far more
    // than its paired neighbours
    let exterior = profile.track(Track::Exterior);
    assert!(exterior[9] > exterior[8]);
    assert!(exterior[9] > exterior[10]);
}

#[test]
fn columns_are_near_stochastic_before_regularisation() {
    let config = Config {
        normalize_profiles: false,
        ..Config::default()
    };
    let profile = run("GGGAAACCC", config);
    for (position, &sum) in profile.column_sums().iter().enumerate() {
        assert!(
            (sum - 1.0).abs() <= 1e-3,
            "raw column {position} sums to {sum}"
        );
    }
}

#[test]
fn disabling_the_beam_matches_a_beam_wider_than_any_column() {
    let unbeamed = run(
        "GGGAAACCC",
        Config {
            beam_size: 0,
            ..Config::default()
        },
    );
    let wide = run(
        "GGGAAACCC",
        Config {
            beam_size: 10_000,
            ..Config::default()
        },
    );
    assert_eq!(unbeamed, wide);
}

#[test]
fn a_tight_beam_still_yields_stochastic_columns() {
    let profile = run(
        "GGGAAACCCAAGGGAAACCC",
        Config {
            beam_size: 1,
            ..Config::default()
        },
    );
    for &sum in &profile.column_sums() {
        assert_approx_eq!(f64, sum, 1.0, epsilon = 1e-6);
    }
}

#[test]
fn the_two_parameter_sets_disagree_numerically() {
    let mut turner2004 = Engine::new(Config::default());
    turner2004.run("GGGAAACCC");
    let mut turner1999 = Engine::new(Config {
        model: Model::Turner1999,
        ..Config::default()
    });
    turner1999.run("GGGAAACCC");

    assert!(
        (turner2004.log_partition() - turner1999.log_partition()).abs() > 1e-6,
        "parameter sets should not agree bit for bit"
    );
}

#[test]
fn both_parameter_sets_stay_stochastic() {
    for model in [Model::Turner2004, Model::Turner1999] {
        let profile = run(
            "GGGAAACCC",
            Config {
                model,
                ..Config::default()
            },
        );
        assert_stochastic(&profile, 1e-6);
    }
}

#[test]
fn stem_pairs_are_consistent_between_the_passes() {
    let config = Config {
        normalize_profiles: false,
        ..Config::default()
    };
    let mut engine = Engine::new(config);
    let profile = engine.run("GGGAAACCC");

    let pairs = engine.stem_pair_probabilities();
    assert!(!pairs.is_empty());
    for &(i, j, p) in &pairs {
        assert!(i < j);
        assert!(
            (-1e-9..=1.0 + 1e-9).contains(&p),
            "pair ({i}, {j}) has probability {p}"
        );
    }

    let paired_mass: f64 = pairs.iter().map(|&(_, _, p)| p).sum();
    let stem_mass: f64 = profile.track(Track::Stem).sum();
    assert_approx_eq!(f64, 2.0 * paired_mass, stem_mass, epsilon = 1e-9);
}

#[test]
fn empty_sequences_produce_empty_profiles() {
    let profile = run("", Config::default());
    assert!(profile.is_empty());
}
