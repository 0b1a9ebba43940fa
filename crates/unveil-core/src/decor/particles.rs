//! Star and particle generators for the loading overlay, lock screen and
//! hero section.
//!
//! Each generator is pure: given an RNG and a count it returns the element
//! descriptions to append. Keyframes they rely on are installed once per
//! document via [`install_keyframes`].

use rand::Rng;

use super::{pick, random_between};
use crate::dom::{Document, ElementSpec};

pub const STAR_COLORS: [&str; 6] = ["#ff2d95", "#a855f7", "#3b82f6", "#06b6d4", "#fbbf24", "#ffffff"];
pub const PARTICLE_COLORS: [&str; 5] = ["#ff2d95", "#a855f7", "#3b82f6", "#06b6d4", "#fbbf24"];
const HERO_COLORS: [&str; 3] = ["#d4a574", "#e8b4c4", "#d4c4e8"];
const HERO_GLYPHS: [&str; 3] = ["✦", "✧", "·"];
const LOCK_PARTICLE_TYPES: [&str; 3] = ["circle", "star", "heart"];

pub const STAR_KEYFRAMES_ID: &str = "starKeyframes";
pub const PARTICLE_KEYFRAMES_ID: &str = "particleKeyframes";

const STAR_KEYFRAMES: &str = "@keyframes star-twinkle {
    0%, 100% { opacity: 0.3; transform: scale(1); }
    50% { opacity: 1; transform: scale(1.5); }
}";

/// Keyframes for the loading overlay. The particle drift is randomised once
/// per installation, so all particles on the page share it.
pub fn particle_keyframes<R: Rng + ?Sized>(rng: &mut R) -> String {
    let drift = random_between(rng, -50.0, 50.0);
    format!(
        "@keyframes particle-float-up {{
    0% {{ transform: translateY(0) translateX(0) scale(1); opacity: 0; }}
    10% {{ opacity: 1; }}
    90% {{ opacity: 1; }}
    100% {{ transform: translateY(-120vh) translateX({drift:.1}px) scale(0.5); opacity: 0; }}
}}"
    )
}

/// Install the overlay keyframes unless already present. Returns how many
/// sheets were added.
pub fn install_keyframes<D: Document + ?Sized, R: Rng + ?Sized>(doc: &mut D, rng: &mut R) -> usize {
    let mut added = 0;
    if doc.install_stylesheet(STAR_KEYFRAMES_ID, STAR_KEYFRAMES) {
        added += 1;
    }
    if doc.install_stylesheet(PARTICLE_KEYFRAMES_ID, &particle_keyframes(rng)) {
        added += 1;
    }
    added
}

fn px(value: f64) -> String {
    format!("{value:.2}px")
}

fn pct(value: f64) -> String {
    format!("{value:.2}%")
}

fn secs(value: f64) -> String {
    format!("{value:.2}s")
}

/// Twinkling stars behind the loading overlay.
pub fn loading_stars<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ElementSpec> {
    (0..count)
        .map(|_| {
            let size = random_between(rng, 1.0, 4.0);
            let color = pick(rng, &STAR_COLORS);
            let duration = random_between(rng, 2.0, 5.0);
            let delay = random_between(rng, -3.0, 0.0);
            ElementSpec::div()
                .class("loading-star")
                .style("position", "absolute")
                .style("width", px(size))
                .style("height", px(size))
                .style("background", color)
                .style("border-radius", "50%")
                .style("left", pct(random_between(rng, 0.0, 100.0)))
                .style("top", pct(random_between(rng, 0.0, 100.0)))
                .style("box-shadow", format!("0 0 {} {color}", px(size * 3.0)))
                .style(
                    "animation",
                    format!("star-twinkle {} ease-in-out {} infinite", secs(duration), secs(delay)),
                )
                .style("opacity", format!("{:.2}", random_between(rng, 0.3, 1.0)))
        })
        .collect()
}

/// Particles rising from below the loading overlay.
pub fn loading_particles<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ElementSpec> {
    (0..count)
        .map(|_| {
            let size = random_between(rng, 2.0, 6.0);
            let color = pick(rng, &PARTICLE_COLORS);
            let duration = random_between(rng, 4.0, 8.0);
            // Negative delays start each particle part-way through its rise.
            let delay = random_between(rng, -5.0, 0.0);
            ElementSpec::div()
                .class("loading-particle")
                .style("position", "absolute")
                .style("width", px(size))
                .style("height", px(size))
                .style("background", color)
                .style("border-radius", "50%")
                .style("left", pct(random_between(rng, 0.0, 100.0)))
                .style("top", pct(random_between(rng, 100.0, 120.0)))
                .style("box-shadow", format!("0 0 {} {color}", px(size * 4.0)))
                .style(
                    "animation",
                    format!("particle-float-up {} linear {} infinite", secs(duration), secs(delay)),
                )
        })
        .collect()
}

/// Background stars on the lock screen.
pub fn lock_stars<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ElementSpec> {
    (0..count)
        .map(|_| {
            let size = random_between(rng, 2.0, 4.0);
            ElementSpec::div()
                .class("star-particle")
                .style("left", pct(random_between(rng, 0.0, 100.0)))
                .style("top", pct(random_between(rng, 0.0, 100.0)))
                .style("width", px(size))
                .style("height", px(size))
                .style("animation-delay", secs(random_between(rng, 0.0, 3.0)))
                .style("animation-duration", secs(random_between(rng, 2.0, 4.0)))
                .style("opacity", format!("{:.2}", random_between(rng, 0.3, 0.8)))
        })
        .collect()
}

/// Floating circles, stars and hearts on the lock screen.
pub fn lock_particles<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ElementSpec> {
    (0..count)
        .map(|_| {
            let kind = pick(rng, &LOCK_PARTICLE_TYPES);
            let mut spec = ElementSpec::div()
                .class("particle")
                .class(kind)
                .style("left", pct(random_between(rng, 0.0, 100.0)))
                .style("animation-delay", secs(random_between(rng, 0.0, 20.0)))
                .style("animation-duration", secs(random_between(rng, 15.0, 25.0)));
            spec = match kind {
                "circle" => {
                    let size = random_between(rng, 4.0, 10.0);
                    spec.style("width", px(size)).style("height", px(size))
                }
                "star" => spec
                    .text("✦")
                    .style("font-size", px(random_between(rng, 10.0, 18.0))),
                _ => spec
                    .text("♡")
                    .style("font-size", px(random_between(rng, 10.0, 18.0))),
            };
            spec.style("opacity", format!("{:.2}", random_between(rng, 0.3, 0.7)))
        })
        .collect()
}

/// Faint glyphs twinkling in the hero section.
pub fn hero_particles<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ElementSpec> {
    (0..count)
        .map(|_| {
            let duration = random_between(rng, 2.0, 4.0);
            ElementSpec::div()
                .class("particle star")
                .text(pick(rng, &HERO_GLYPHS))
                .style("position", "absolute")
                .style("left", pct(random_between(rng, 0.0, 100.0)))
                .style("top", pct(random_between(rng, 0.0, 100.0)))
                .style("font-size", px(random_between(rng, 8.0, 16.0)))
                .style("color", pick(rng, &HERO_COLORS))
                .style("opacity", format!("{:.2}", random_between(rng, 0.2, 0.5)))
                .style(
                    "animation",
                    format!("twinkle-star {} ease-in-out infinite", secs(duration)),
                )
                .style("animation-delay", secs(random_between(rng, 0.0, 3.0)))
        })
        .collect()
}
