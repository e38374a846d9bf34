//! Brightness-derived star annotations used for presentation.
//!
//! These are not physical measurements: a detected brightness in [0, 1] is
//! mapped onto a spectral class and an apparent-magnitude-like value so that
//! detected stars can be labeled consistently.

/// Spectral type bucket for a normalized brightness.
pub fn estimate_spectral_type(brightness: f64) -> &'static str {
    if brightness > 0.9 {
        "B2V"
    } else if brightness > 0.8 {
        "A0V"
    } else if brightness > 0.7 {
        "F0V"
    } else if brightness > 0.6 {
        "G2V"
    } else if brightness > 0.5 {
        "K0V"
    } else if brightness > 0.4 {
        "K5V"
    } else {
        "M0V"
    }
}

/// Map brightness in [0, 1] onto a 0..6 magnitude scale (lower is brighter),
/// rounded to one decimal place.
pub fn estimate_magnitude(brightness: f64) -> f64 {
    ((1.0 - brightness) * 6.0 * 10.0).round() / 10.0
}

/// Human-readable description of a spectral type such as "B8Ia" or "G2V".
///
/// Colour comes from the leading class letter, luminosity class from the
/// Roman numeral suffix.
pub fn describe_spectral_type(spectral_type: &str) -> String {
    let spectral_type = spectral_type.trim();
    if spectral_type.is_empty() || spectral_type.eq_ignore_ascii_case("unknown") {
        return "star of unknown type".to_string();
    }

    let colour = match spectral_type.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('O') => "hot blue star",
        Some('B') => "blue-white star",
        Some('A') => "white star",
        Some('F') => "yellow-white star",
        Some('G') => "yellow star",
        Some('K') => "orange star",
        Some('M') => "red star",
        _ => "star",
    };

    // Only the suffix after the class letter and subclass digits carries
    // the luminosity class.
    let suffix: String = spectral_type
        .chars()
        .skip(1)
        .skip_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let luminosity = match luminosity_class(&suffix) {
        Some(class) => class,
        None => return colour.to_string(),
    };
    format!("{colour} {luminosity}")
}

fn luminosity_class(suffix: &str) -> Option<&'static str> {
    let numeral: String = suffix
        .chars()
        .take_while(|c| matches!(c, 'I' | 'V' | 'a' | 'b'))
        .filter(|c| matches!(c, 'I' | 'V'))
        .collect();
    match numeral.as_str() {
        "I" => Some("supergiant"),
        "II" => Some("bright giant"),
        "III" => Some("giant"),
        "IV" => Some("subgiant"),
        "V" => Some("main sequence"),
        "VI" => Some("subdwarf"),
        "VII" => Some("white dwarf"),
        _ => None,
    }
}
