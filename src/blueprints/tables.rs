//! Hand-curated battlegroup and upgrade names.
//!
//! The identifiers the decoder reports for battlegroup selections and global
//! upgrades do not line up with the general blueprint databases, so these two
//! kinds resolve through fixed tables instead.

use crate::core::types::Pbgid;

/// Battlegroup display name for a selection identifier
pub fn battlegroup_name(pbgid: Pbgid) -> Option<&'static str> {
    let name = match pbgid.0 {
        // Afrika Korps
        2075338 => "Armored Support",
        2074237 => "Italian Combined Arms",
        2072429 => "Italian Infantry",
        2164392 => "Panzerjäger Kommand",
        2151628 => "Subterfuge",

        // US Forces
        199102 => "Airborne",
        199103 => "Armored",
        199104 => "Infantry",
        201151 => "Special Operations",

        // British
        2164585 => "Special Weapons",
        2031369 => "Australian Defense",
        222365 => "British Air and Sea",
        202334 => "British Armored",
        2164115 => "Canadian Shock",
        201661 => "Indian Artillery",

        // Wehrmacht
        199106 => "Breakthrough",
        2033170 => "Coastal",
        200769 => "Defense",
        199091 => "Luftwaffe",
        199105 => "Mechanized",
        2163770 => "Terror",

        // Identifiers seen in selection commands of recorded matches. Only the
        // US one has been matched to a battlegroup so far.
        196934 => "Armored (US)",
        198405 => "Unknown Wehrmacht BG 1",
        197799 => "Unknown Wehrmacht BG 2",
        2164378 => "Unknown Afrika Korps BG",
        2164107 => "Unknown British BG 1",
        2031370 => "Unknown British BG 2",

        _ => return None,
    };
    Some(name)
}

/// Global upgrade display name
pub fn upgrade_name(pbgid: Pbgid) -> Option<&'static str> {
    let name = match pbgid.0 {
        // Afrika Korps
        2072101 => "T1 Unit Unlock (Afrika Korps)",
        2072102 => "T2 Unit Unlock (Afrika Korps)",
        2108279 => "Armored Assault Tactics (Afrika Korps)",
        2084237 => "Vehicle Survivability Self-Repair (Afrika Korps)",
        2084216 => "Operational Blitzkrieg (Afrika Korps)",
        2084214 => "Smoke Survivability (Afrika Korps)",

        // British
        197637 => "Bishop Squad Unlock (British)",
        197636 => "Stuart Squad Unlock (British)",
        197635 => "Rifle Grenade Tommy (British)",
        197638 => "17-pounder Squad Unlock (British)",
        2072354 => "Grant Tank Unlock (British)",

        // British Africa
        2082737 => "Training Center Infantry (British Africa)",
        2082738 => "Training Center Team Weapons (British Africa)",

        // Wehrmacht
        170742 => "Medical Station (Wehrmacht)",
        2081888 => "Panzer Kompanie Veterancy (Wehrmacht)",
        2081886 => "Panzergrenadier Kompanie Veterancy (Wehrmacht)",
        2089293 => "Side Skirts Global (Wehrmacht)",
        2140327 => "Medical Bunker Defense (Wehrmacht)",
        201588 => "Advanced Mechanical Assault Tactics (Wehrmacht)",
        205683 => "Repair Bunker Defense (Wehrmacht)",

        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battlegroup_lookup() {
        assert_eq!(battlegroup_name(Pbgid(199105)), Some("Mechanized"));
        assert_eq!(battlegroup_name(Pbgid(196934)), Some("Armored (US)"));
        assert_eq!(battlegroup_name(Pbgid(1)), None);
    }

    #[test]
    fn test_upgrade_lookup() {
        assert_eq!(
            upgrade_name(Pbgid(2072101)),
            Some("T1 Unit Unlock (Afrika Korps)")
        );
        assert_eq!(upgrade_name(Pbgid(205683)), Some("Repair Bunker Defense (Wehrmacht)"));
        assert_eq!(upgrade_name(Pbgid(199105)), None);
    }

    #[test]
    fn test_tables_are_independent() {
        // A battlegroup id is not an upgrade and vice versa
        assert!(upgrade_name(Pbgid(2075338)).is_none());
        assert!(battlegroup_name(Pbgid(170742)).is_none());
    }
}
