//! Built-in reference constellations.
//!
//! Star positions are laid out in pixel space around a 600x400 canvas
//! centre at (300, 200), +Y down. They are schematic, chosen to reproduce
//! each constellation's recognisable figure rather than its true
//! astrometry. Brightness is relative within each constellation.

use super::{CatalogStar, ConstellationRecord};

const CENTER_X: f64 = 300.0;
const CENTER_Y: f64 = 200.0;

/// (star name, dx, dy, brightness) relative to the canvas centre.
type StarRow = (&'static str, f64, f64, f64);

fn record(name: &str, stars: &[StarRow], lines: &[(usize, usize)]) -> ConstellationRecord {
    ConstellationRecord {
        name: name.to_string(),
        stars: stars
            .iter()
            .map(|&(star, dx, dy, brightness)| CatalogStar {
                name: star.to_string(),
                x: CENTER_X + dx,
                y: CENTER_Y + dy,
                brightness,
            })
            .collect(),
        lines: lines.iter().map(|&(a, b)| [a, b]).collect(),
    }
}

/// Chain lines 0-1, 1-2, ..., (n-2)-(n-1).
fn chain(n: usize) -> Vec<(usize, usize)> {
    (1..n).map(|i| (i - 1, i)).collect()
}

/// The 20 reference constellations, in library order.
pub fn builtin_constellations() -> Vec<ConstellationRecord> {
    vec![
        record(
            "Andromeda",
            &[
                ("Alpheratz", -120.0, -80.0, 1.0),
                ("Mirach", -80.0, -40.0, 0.9),
                ("Almach", -40.0, 0.0, 0.8),
                ("Delta And", 0.0, 40.0, 0.7),
                ("Mu And", 40.0, 80.0, 0.7),
                ("Nu And", 80.0, 120.0, 0.6),
            ],
            &chain(6),
        ),
        record(
            "Aquila",
            &[
                ("Altair", -100.0, -60.0, 1.0),
                ("Tarazed", -60.0, -20.0, 0.8),
                ("Alshain", -20.0, 20.0, 0.7),
                ("Theta Aql", 20.0, 60.0, 0.7),
                ("Delta Aql", 60.0, 100.0, 0.6),
            ],
            &chain(5),
        ),
        record(
            "Auriga",
            &[
                ("Capella", -40.0, -110.0, 1.0),
                ("Menkalinan", 60.0, -80.0, 0.85),
                ("Elnath", 30.0, 90.0, 0.8),
                ("Hassaleh", -90.0, 40.0, 0.65),
                ("Mahasim", 90.0, 20.0, 0.6),
                ("Almaaz", -85.0, -60.0, 0.5),
            ],
            &[(0, 1), (1, 4), (4, 2), (2, 3), (3, 5), (5, 0)],
        ),
        record(
            "CanisMajor",
            &[
                ("Sirius", -20.0, -70.0, 1.0),
                ("Adhara", 30.0, 100.0, 0.85),
                ("Wezen", 10.0, 40.0, 0.8),
                ("Mirzam", -90.0, -40.0, 0.7),
                ("Aludra", 80.0, 90.0, 0.65),
                ("Furud", -40.0, 110.0, 0.5),
                ("Muliphein", 10.0, -110.0, 0.45),
            ],
            &[(6, 0), (0, 3), (0, 2), (2, 1), (2, 4), (1, 5)],
        ),
        record(
            "Capricornus",
            &[
                ("Deneb Algedi", 140.0, -30.0, 1.0),
                ("Dabih", -110.0, -60.0, 0.85),
                ("Nashira", 100.0, -20.0, 0.7),
                ("Algedi", -130.0, -80.0, 0.65),
                ("Omega Cap", -60.0, 70.0, 0.55),
                ("Psi Cap", -80.0, 40.0, 0.5),
                ("Zeta Cap", 30.0, 60.0, 0.5),
            ],
            &[(3, 1), (1, 5), (5, 4), (4, 6), (6, 2), (2, 0), (0, 3)],
        ),
        record(
            "Cetus",
            &[
                ("Diphda", -130.0, 60.0, 1.0),
                ("Menkar", 140.0, -60.0, 0.9),
                ("Mira", 40.0, 0.0, 0.75),
                ("Baten Kaitos", -20.0, 50.0, 0.7),
                ("Kaffaljidhma", 110.0, -40.0, 0.6),
                ("Deneb Kaitos Shemali", -140.0, 10.0, 0.5),
                ("Iota Ceti", -170.0, -10.0, 0.45),
            ],
            &[(6, 5), (5, 0), (0, 3), (3, 2), (2, 4), (4, 1)],
        ),
        record(
            "Columba",
            &[
                ("Phact", -20.0, -10.0, 1.0),
                ("Wazn", 50.0, 10.0, 0.85),
                ("Delta Col", 110.0, -40.0, 0.6),
                ("Eta Col", 40.0, 90.0, 0.55),
                ("Epsilon Col", -90.0, -20.0, 0.5),
            ],
            &[(4, 0), (0, 1), (1, 2), (1, 3)],
        ),
        record(
            "Gemini",
            &[
                ("Pollux", 60.0, -120.0, 1.0),
                ("Castor", -10.0, -140.0, 0.9),
                ("Alhena", 90.0, 110.0, 0.85),
                ("Tejat", -70.0, 70.0, 0.7),
                ("Mebsuta", -50.0, 0.0, 0.65),
                ("Wasat", 70.0, 20.0, 0.6),
                ("Propus", -110.0, 90.0, 0.55),
                ("Alzirr", 130.0, 70.0, 0.5),
            ],
            &[(1, 4), (4, 3), (3, 6), (0, 5), (5, 2), (5, 7), (1, 0)],
        ),
        record(
            "Grus",
            &[
                ("Alnair", -70.0, -50.0, 1.0),
                ("Tiaki", 30.0, 30.0, 0.95),
                ("Gamma Gru", -20.0, -130.0, 0.7),
                ("Epsilon Gru", 90.0, 70.0, 0.6),
                ("Delta Gru", -10.0, -40.0, 0.55),
                ("Zeta Gru", 110.0, 120.0, 0.5),
                ("Iota Gru", 140.0, 20.0, 0.45),
            ],
            &[(2, 4), (4, 1), (1, 3), (3, 5), (0, 4), (1, 6)],
        ),
        record(
            "Leo",
            &[
                ("Regulus", -80.0, -60.0, 1.0),
                ("Denebola", -40.0, -100.0, 0.9),
                ("Algieba", 0.0, -80.0, 0.8),
                ("Zosma", 40.0, -40.0, 0.8),
                ("Chort", 80.0, 0.0, 0.7),
                ("Adhafera", 120.0, 40.0, 0.7),
            ],
            &[(0, 2), (2, 3), (3, 1), (3, 4), (4, 5), (2, 5)],
        ),
        record(
            "Orion",
            &[
                ("Betelgeuse", -100.0, -120.0, 1.0),
                ("Rigel", 100.0, 120.0, 0.9),
                ("Bellatrix", 80.0, -100.0, 0.8),
                ("Saiph", -80.0, 100.0, 0.8),
                ("Alnitak", -20.0, 0.0, 0.7),
                ("Alnilam", 0.0, 10.0, 0.7),
                ("Mintaka", 20.0, -10.0, 0.7),
                ("Meissa", -40.0, -40.0, 0.6),
                ("Hatysa", 40.0, 40.0, 0.6),
            ],
            &[
                (0, 4),
                (4, 5),
                (5, 6),
                (6, 2),
                (0, 7),
                (7, 2),
                (4, 3),
                (3, 1),
                (1, 8),
                (8, 6),
            ],
        ),
        record(
            "Pavo",
            &[
                ("Peacock", 120.0, 20.0, 1.0),
                ("Beta Pav", -20.0, 40.0, 0.75),
                ("Delta Pav", -60.0, -30.0, 0.7),
                ("Eta Pav", 30.0, -90.0, 0.6),
                ("Epsilon Pav", -120.0, 60.0, 0.55),
                ("Zeta Pav", -150.0, -10.0, 0.5),
            ],
            &[(0, 1), (1, 2), (2, 3), (1, 4), (4, 5), (5, 2)],
        ),
        record(
            "Pegasus",
            &[
                ("Markab", -100.0, -100.0, 1.0),
                ("Scheat", -50.0, -50.0, 0.9),
                ("Algenib", 0.0, 0.0, 0.8),
                ("Enif", 50.0, -50.0, 0.8),
                ("Matar", 100.0, -100.0, 0.7),
                ("Homam", 150.0, -50.0, 0.7),
            ],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (0, 4)],
        ),
        record(
            "Phoenix",
            &[
                ("Ankaa", -60.0, -70.0, 1.0),
                ("Beta Phe", 40.0, 30.0, 0.8),
                ("Gamma Phe", 110.0, -10.0, 0.7),
                ("Zeta Phe", 20.0, 110.0, 0.6),
                ("Delta Phe", 130.0, 60.0, 0.55),
                ("Kappa Phe", -30.0, -10.0, 0.5),
                ("Epsilon Phe", -100.0, -20.0, 0.45),
            ],
            &[(6, 0), (0, 5), (5, 1), (1, 2), (2, 4), (1, 3)],
        ),
        record(
            "Pisces",
            &[
                ("Alpherg", 160.0, -110.0, 1.0),
                ("Alrescha", 60.0, 100.0, 0.85),
                ("Fumalsamakah", -150.0, 40.0, 0.7),
                ("Gamma Psc", -130.0, -10.0, 0.7),
                ("Omega Psc", -60.0, 50.0, 0.6),
                ("Iota Psc", -100.0, 80.0, 0.55),
                ("Nu Psc", 10.0, 70.0, 0.5),
                ("Tau Psc", 150.0, -60.0, 0.45),
            ],
            &[(3, 2), (2, 5), (5, 4), (4, 3), (4, 6), (6, 1), (1, 7), (7, 0)],
        ),
        record(
            "PiscisAustrinus",
            &[
                ("Fomalhaut", -110.0, 10.0, 1.0),
                ("Epsilon PsA", -40.0, 60.0, 0.75),
                ("Delta PsA", -60.0, -40.0, 0.65),
                ("Beta PsA", 40.0, -20.0, 0.6),
                ("Iota PsA", 120.0, 30.0, 0.5),
                ("Mu PsA", 70.0, 70.0, 0.45),
            ],
            &[(0, 1), (1, 5), (5, 4), (4, 3), (3, 2), (2, 0)],
        ),
        record(
            "Puppis",
            &[
                ("Naos", 40.0, 80.0, 1.0),
                ("Tureis", -70.0, -90.0, 0.9),
                ("Azmidi", 110.0, 20.0, 0.75),
                ("Pi Pup", -20.0, 10.0, 0.7),
                ("Nu Pup", 140.0, 120.0, 0.6),
                ("Sigma Pup", -110.0, 40.0, 0.55),
                ("Tau Pup", 90.0, -60.0, 0.5),
            ],
            &[(1, 3), (3, 0), (0, 2), (2, 6), (0, 4), (3, 5)],
        ),
        record(
            "UrsaMajor",
            &[
                ("Dubhe", -90.0, -40.0, 1.0),
                ("Merak", -50.0, -80.0, 0.9),
                ("Phecda", 0.0, -100.0, 0.9),
                ("Megrez", 50.0, -80.0, 0.8),
                ("Alioth", 90.0, -40.0, 0.9),
                ("Mizar", 130.0, 0.0, 0.8),
                ("Alkaid", 170.0, 40.0, 0.7),
            ],
            &chain(7),
        ),
        record(
            "UrsaMinor",
            &[
                ("Polaris", -140.0, -60.0, 1.0),
                ("Kochab", 110.0, 40.0, 0.9),
                ("Pherkad", 140.0, 90.0, 0.75),
                ("Yildun", -90.0, -20.0, 0.55),
                ("Epsilon UMi", -30.0, 10.0, 0.5),
                ("Zeta UMi", 40.0, 20.0, 0.5),
                ("Eta UMi", 70.0, 80.0, 0.45),
            ],
            &[(0, 3), (3, 4), (4, 5), (5, 1), (1, 2), (2, 6), (6, 5)],
        ),
        record(
            "Vela",
            &[
                ("Regor", -120.0, -30.0, 1.0),
                ("Koo She", 40.0, 90.0, 0.9),
                ("Suhail", 130.0, -70.0, 0.85),
                ("Markeb", -50.0, 110.0, 0.75),
                ("Mu Vel", 150.0, 40.0, 0.6),
                ("Psi Vel", 60.0, -110.0, 0.55),
                ("Phi Vel", -90.0, 60.0, 0.5),
            ],
            &[(0, 6), (6, 3), (3, 1), (1, 4), (4, 2), (2, 5), (5, 0)],
        ),
    ]
}
