//! Decoration generators.
//!
//! Purely cosmetic effects. Generators either return [`ElementSpec`]s for the
//! caller to insert or compute a style value from their inputs; none of them
//! can influence the reveal state. A missing container or element simply
//! means the effect does not run.

pub mod countdown;
pub mod cursor;
pub mod parallax;
pub mod particles;
pub mod progress;
pub mod tilt;
pub mod typewriter;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    LoadingStars,
    LoadingParticles,
    LockStars,
    LockParticles,
    HeroParticles,
}

impl DecorationKind {
    /// Id of the container the generator fills.
    pub fn container_id(self) -> &'static str {
        match self {
            DecorationKind::LoadingStars => "starField",
            DecorationKind::LoadingParticles => "loadingParticles",
            DecorationKind::LockStars => "stars",
            DecorationKind::LockParticles => "particles",
            DecorationKind::HeroParticles => "heroParticles",
        }
    }
}

/// Uniform value in `[min, max)`.
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Append `specs` to the element with id `container_id`. Returns the number
/// of elements created, or `None` when the container is missing.
pub fn spawn_into<D: Document + ?Sized>(
    doc: &mut D,
    container_id: &str,
    specs: &[ElementSpec],
) -> Option<usize> {
    let container = doc.find_by_id(container_id)?;
    Some(
        specs
            .iter()
            .filter_map(|spec| doc.append_child(container, spec))
            .count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::VirtualDocument;
    use rand::SeedableRng;

    #[test]
    fn random_between_stays_in_range() {
        let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_between(&mut rng, 2.0, 6.0);
            assert!((2.0..6.0).contains(&v));
        }
    }

    #[test]
    fn pick_on_empty_slice_is_empty_str() {
        let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
        assert_eq!(pick(&mut rng, &[]), "");
        assert_eq!(pick(&mut rng, &["only"]), "only");
    }

    #[test]
    fn spawn_into_missing_container_is_skipped() {
        let mut doc = VirtualDocument::default();
        assert_eq!(spawn_into(&mut doc, "nowhere", &[ElementSpec::div()]), None);
    }
}
