//! The structural profile emitted per sequence.

use ndarray::{Array2, ArrayView1, Axis};

/// Number of structural contexts.
pub const NTRACKS: usize = 6;

/// Structural context of a position, in output order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Track {
    /// Unpaired inside a bulge loop.
    Bulge,
    /// Unpaired in the exterior loop.
    Exterior,
    /// Unpaired inside a hairpin loop.
    Hairpin,
    /// Unpaired inside an interior loop.
    Internal,
    /// Unpaired inside a multiloop.
    Multiloop,
    /// Paired in a stem.
    Stem,
}

impl Track {
    /// All tracks in output order.
    pub const ALL: [Self; NTRACKS] = [
        Self::Bulge,
        Self::Exterior,
        Self::Hairpin,
        Self::Internal,
        Self::Multiloop,
        Self::Stem,
    ];

    /// Output label; `legacy_multibranch` selects the historical spelling of
    /// the multiloop track.
    #[must_use]
    pub const fn label(self, legacy_multibranch: bool) -> &'static str {
        match self {
            Self::Bulge => "Bulge",
            Self::Exterior => "Exterior",
            Self::Hairpin => "Hairpin",
            Self::Internal => "Internal",
            Self::Multiloop => {
                if legacy_multibranch {
                    "Multibranch"
                } else {
                    "Multiloop"
                }
            }
            Self::Stem => "Stem",
        }
    }
}

/// Six probability tracks over one sequence, one column per position. After
/// regularisation every column sums to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    tracks: Array2<f64>,
}

impl Profile {
    /// Builds a profile from the per-track vectors, in [`Track::ALL`] order.
    ///
    /// # Panics
    ///
    /// Panics if the vectors disagree in length.
    #[must_use]
    pub fn from_tracks(tracks: [Vec<f64>; NTRACKS]) -> Self {
        let n = tracks[0].len();
        assert!(
            tracks.iter().all(|track| track.len() == n),
            "profile tracks must share one length"
        );
        let data: Vec<f64> = tracks.into_iter().flatten().collect();
        Self {
            tracks: Array2::from_shape_vec((NTRACKS, n), data).unwrap(),
        }
    }

    /// Sequence length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.ncols()
    }

    /// Whether the profile covers an empty sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.ncols() == 0
    }

    /// One probability track across all positions.
    #[must_use]
    pub fn track(&self, track: Track) -> ArrayView1<'_, f64> {
        self.tracks.row(track as usize)
    }

    /// Per-position sums over the six tracks.
    #[must_use]
    pub fn column_sums(&self) -> Vec<f64> {
        self.tracks.sum_axis(Axis(0)).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn tracks_keep_their_order_and_values() {
        let profile = Profile::from_tracks([
            vec![0.0, 0.1],
            vec![0.5, 0.2],
            vec![0.0, 0.3],
            vec![0.0, 0.1],
            vec![0.0, 0.1],
            vec![0.5, 0.2],
        ]);
        assert_eq!(profile.len(), 2);
        assert_approx_eq!(f64, profile.track(Track::Exterior)[0], 0.5, ulps = 2);
        assert_approx_eq!(f64, profile.track(Track::Stem)[1], 0.2, ulps = 2);
        let sums = profile.column_sums();
        assert_approx_eq!(f64, sums[0], 1.0, ulps = 2);
        assert_approx_eq!(f64, sums[1], 1.0, ulps = 2);
    }

    #[test]
    fn the_multiloop_label_has_a_legacy_alias() {
        assert_eq!(Track::Multiloop.label(false), "Multiloop");
        assert_eq!(Track::Multiloop.label(true), "Multibranch");
        assert_eq!(Track::Bulge.label(true), "Bulge");
    }
}
