//! Fixed subtype → visual spec lookup tables for palette drops

use super::entities::{EnergyCategory, Rgb};

/// Placement spec for an energy grid component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySpec {
    pub subtype: &'static str,
    pub category: EnergyCategory,
    pub power: f32,
    pub label: &'static str,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
}

/// Placement spec for an atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementSpec {
    pub symbol: &'static str,
    pub color: Rgb,
    pub radius: f32,
    pub charge: i8,
}

/// Placement spec for a simulated mesh peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerSpec {
    pub subtype: &'static str,
    pub id_prefix: &'static str,
    pub role: &'static str,
    pub color: Rgb,
}

pub const ENERGY_SPECS: &[EnergySpec] = &[
    EnergySpec { subtype: "solar", category: EnergyCategory::Generation, power: 150.0, label: "PV", width: 50.0, height: 50.0, color: Rgb::hex("#f59e0b") },
    EnergySpec { subtype: "wind", category: EnergyCategory::Generation, power: 600.0, label: "WT", width: 60.0, height: 60.0, color: Rgb::hex("#0ea5e9") },
    EnergySpec { subtype: "hydro", category: EnergyCategory::Generation, power: 1200.0, label: "HYD", width: 60.0, height: 60.0, color: Rgb::hex("#2563eb") },
    EnergySpec { subtype: "diesel", category: EnergyCategory::Generation, power: 5000.0, label: "DSL", width: 60.0, height: 50.0, color: Rgb::hex("#78350f") },
    EnergySpec { subtype: "nuclear", category: EnergyCategory::Generation, power: 8000.0, label: "CORE", width: 70.0, height: 70.0, color: Rgb::hex("#dc2626") },
    EnergySpec { subtype: "fusion", category: EnergyCategory::Experimental, power: 20000.0, label: "FUS", width: 70.0, height: 70.0, color: Rgb::hex("#9333ea") },
    EnergySpec { subtype: "battery", category: EnergyCategory::Storage, power: 0.0, label: "BAT", width: 40.0, height: 70.0, color: Rgb::hex("#10b981") },
    EnergySpec { subtype: "capacitor", category: EnergyCategory::Storage, power: 0.0, label: "CAP", width: 30.0, height: 50.0, color: Rgb::hex("#ec4899") },
    EnergySpec { subtype: "load", category: EnergyCategory::Load, power: -2000.0, label: "LOAD", width: 80.0, height: 60.0, color: Rgb::hex("#64748b") },
];

pub const ELEMENT_SPECS: &[ElementSpec] = &[
    ElementSpec { symbol: "H", color: Rgb::hex("#ffffff"), radius: 12.0, charge: 1 },
    ElementSpec { symbol: "C", color: Rgb::hex("#a8a29e"), radius: 15.0, charge: 0 },
    ElementSpec { symbol: "N", color: Rgb::hex("#818cf8"), radius: 15.0, charge: -3 },
    ElementSpec { symbol: "O", color: Rgb::hex("#f43f5e"), radius: 15.0, charge: -2 },
    ElementSpec { symbol: "Si", color: Rgb::hex("#38bdf8"), radius: 16.0, charge: 4 },
    ElementSpec { symbol: "Fe", color: Rgb::hex("#b45309"), radius: 17.0, charge: 2 },
    ElementSpec { symbol: "Au", color: Rgb::hex("#facc15"), radius: 18.0, charge: 1 },
    ElementSpec { symbol: "U", color: Rgb::hex("#22c55e"), radius: 19.0, charge: 6 },
];

pub const PEER_SPECS: &[PeerSpec] = &[
    PeerSpec { subtype: "relay", id_prefix: "AI-", role: "Relay Node", color: Rgb::hex("#3b82f6") },
    PeerSpec { subtype: "gateway", id_prefix: "GW-", role: "Gateway Node", color: Rgb::hex("#ef4444") },
];

/// Older palette names that map onto a current subtype.
const ALIASES: &[(&str, &str)] = &[("home", "load"), ("firewall", "gateway")];

fn canonical(subtype: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(subtype))
        .map_or(subtype, |&(_, target)| target)
}

pub fn energy_spec(subtype: &str) -> Option<&'static EnergySpec> {
    let key = canonical(subtype);
    ENERGY_SPECS.iter().find(|s| s.subtype.eq_ignore_ascii_case(key))
}

/// Element symbols are case-sensitive ("Si", not "SI").
pub fn element_spec(symbol: &str) -> Option<&'static ElementSpec> {
    ELEMENT_SPECS.iter().find(|s| s.symbol == symbol)
}

pub fn peer_spec(subtype: &str) -> Option<&'static PeerSpec> {
    let key = canonical(subtype);
    PEER_SPECS.iter().find(|s| s.subtype.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_sign_matches_category() {
        for spec in ENERGY_SPECS {
            match spec.category {
                EnergyCategory::Generation | EnergyCategory::Experimental => {
                    assert!(spec.power > 0.0, "{} should generate", spec.subtype)
                }
                EnergyCategory::Storage => assert_eq!(spec.power, 0.0),
                EnergyCategory::Load => assert!(spec.power < 0.0),
            }
        }
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(energy_spec("home").map(|s| s.subtype), Some("load"));
        assert_eq!(peer_spec("firewall").map(|s| s.role), Some("Gateway Node"));
    }

    #[test]
    fn unknown_subtypes_are_none() {
        assert!(energy_spec("antimatter").is_none());
        assert!(element_spec("Xx").is_none());
        assert!(element_spec("si").is_none());
        assert!(peer_spec("satellite").is_none());
    }
}
