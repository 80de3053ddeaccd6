//! Tiny synthetic event-file generator used by tests and the CLI `generate`
//! subcommand. Produces an LHE-shaped file: a `<LesHouchesEvents>` header with
//! an `<init>` block, `events` records of a few particle lines each, and the
//! `</LesHouchesEvents>` terminator. Output depends only on the seed.

use std::io::{self, Write};

use rand::{rngs::StdRng, Rng as _, SeedableRng};

use crate::format::{DEFAULT_CLOSE_MARKER, DEFAULT_END_MARKER, DEFAULT_OPEN_MARKER};

/// Shape of a generated file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorSpec {
    /// Number of records.
    pub events: u64,
    /// Particle lines per record are drawn from `2..=max_particles`.
    pub max_particles: u8,
    /// Seed of the deterministic generator.
    pub seed: u64,
}

impl Default for GeneratorSpec {
    fn default() -> Self {
        Self {
            events: 100,
            max_particles: 6,
            seed: 42,
        }
    }
}

/// Write a synthetic event file to `w`.
pub fn write_event_file<W: Write>(w: &mut W, spec: &GeneratorSpec) -> io::Result<()> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let max_particles = spec.max_particles.max(2);

    writeln!(w, "<LesHouchesEvents version=\"3.0\">")?;
    writeln!(w, "<header>")?;
    writeln!(w, "<!-- synthetic sample, seed {} -->", spec.seed)?;
    writeln!(w, "</header>")?;
    writeln!(w, "<init>")?;
    writeln!(w, " 2212 2212 6.8000000e+03 6.8000000e+03 0 0 0 0 3 1")?;
    writeln!(w, " 1.0000000e+00 1.0000000e-02 1.0000000e+00 1")?;
    writeln!(w, "</init>")?;

    for id in 0..spec.events {
        let particles = rng.random_range(2..=max_particles);
        writeln!(w, "{DEFAULT_OPEN_MARKER}")?;
        writeln!(w, " {particles} 1 +1.0000000e+00 {id} 7.8e-03 1.2e-01")?;
        for _ in 0..particles {
            let pdg: i32 = match rng.random_range(0..4) {
                0 => 21,
                1 => 1,
                2 => -2,
                _ => 11,
            };
            let px: f64 = rng.random_range(-50.0..50.0);
            let py: f64 = rng.random_range(-50.0..50.0);
            let pz: f64 = rng.random_range(-500.0..500.0);
            let e = (px * px + py * py + pz * pz).sqrt();
            writeln!(
                w,
                " {pdg:>8} 1 0 0 0 0 {px:+.7e} {py:+.7e} {pz:+.7e} {e:.7e} 0.0 0. 9."
            )?;
        }
        writeln!(w, "{DEFAULT_CLOSE_MARKER}")?;
    }

    writeln!(w, "{DEFAULT_END_MARKER}")?;
    Ok(())
}

/// [`write_event_file`] into a fresh buffer.
pub fn event_file_bytes(spec: &GeneratorSpec) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_event_file(&mut buf, spec)?;
    Ok(buf)
}
