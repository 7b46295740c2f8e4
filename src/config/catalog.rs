//! Built-in fuel and oxidizer catalogs.
//!
//! Entries are looked up case-insensitively by their full label
//! (`"Methane (CH4)"`) or by the label without the parenthesised formula
//! (`"methane"`).
use crate::chemistry::FuelSpec;

/// `(label, mechanism, formula, has_carbon)`.
pub const FUELS: &[(&str, &str, &str, bool)] = &[
    ("Hydrogen (H2)", "h2o2.yaml", "H2:1.0", false),
    ("Methane (CH4)", "gri30.yaml", "CH4:1.0", true),
    ("Carbon Monoxide (CO)", "gri30.yaml", "CO:1.0", true),
    ("Methanol (CH3OH)", "gri30.yaml", "CH3OH:1.0", true),
    ("Acetylene (C2H2)", "gri30.yaml", "C2H2:1.0", true),
    ("Ethylene (C2H4)", "gri30.yaml", "C2H4:1.0", true),
    ("Ethane (C2H6)", "gri30.yaml", "C2H6:1.0", true),
    ("Ammonia (NH3)", "gri30.yaml", "NH3:1.0", false),
    ("Propane (C3H8)", "gri30.yaml", "C3H8:1.0", true),
];

/// `(label, composition)`.
pub const OXIDIZERS: &[(&str, &str)] = &[
    ("Air", "O2:0.21,N2:0.79"),
    ("Oxygen (O2)", "O2:1.0"),
    ("Oxygen-Enriched Air (30% O2)", "O2:0.30,N2:0.70"),
];

/// Species offered for `max_species` ignition detection.
pub const IGNITION_SPECIES: &[&str] = &["OH", "H", "O", "CO", "CH2O"];

fn matches_label(label: &str, query: &str) -> bool {
    let query = query.trim();
    let short = label.split(" (").next().unwrap_or(label);
    label.eq_ignore_ascii_case(query) || short.eq_ignore_ascii_case(query)
}

pub fn fuel(name: &str) -> Option<FuelSpec> {
    FUELS
        .iter()
        .find(|(label, ..)| matches_label(label, name))
        .map(|&(label, mechanism, formula, has_carbon)| {
            FuelSpec::new(label, mechanism, formula, has_carbon)
        })
}

pub fn oxidizer(name: &str) -> Option<&'static str> {
    OXIDIZERS
        .iter()
        .find(|(label, _)| matches_label(label, name))
        .map(|&(_, composition)| composition)
}

pub fn fuel_names() -> impl Iterator<Item = &'static str> {
    FUELS.iter().map(|&(label, ..)| label)
}
