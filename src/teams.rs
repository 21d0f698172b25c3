//! Team name resolution.
//!
//! Providers spell the same school many ways ("Oklahoma Sooners", "OU",
//! "Oklahoma St." vs "Oklahoma State"). Normalizers ask a [`TeamDirectory`]
//! for the canonical id; the directory is a collaborator they do not own.

use std::collections::HashMap;

pub type TeamId = String;

pub trait TeamDirectory: Send + Sync {
    /// Canonical id for a team name, if the name is known.
    fn resolve(&self, name: &str) -> Option<TeamId>;

    /// The school's own spelling for a canonical id.
    fn school_name(&self, id: &str) -> Option<String>;
}

/// In-memory directory built from `(id, school, aliases)` rows.
#[derive(Debug, Clone, Default)]
pub struct StaticTeamDirectory {
    by_key: HashMap<String, TeamId>,
    schools: HashMap<TeamId, String>,
}

impl StaticTeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, id: &str, school: &str, aliases: &[&str]) -> Self {
        self.insert(id, school, aliases);
        self
    }

    /// Register a team. The first registration of a spelling wins.
    pub fn insert(&mut self, id: &str, school: &str, aliases: &[&str]) {
        self.schools
            .entry(id.to_string())
            .or_insert_with(|| school.to_string());
        for name in [id, school].iter().chain(aliases) {
            for form in name_forms(name) {
                self.by_key
                    .entry(match_key(&form))
                    .or_insert_with(|| id.to_string());
            }
        }
    }

    /// Number of registered teams.
    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    /// A small directory of college programs used when no other table is
    /// configured.
    pub fn builtin() -> Self {
        const TEAMS: &[(&str, &str, &[&str])] = &[
            ("alabama", "Alabama", &["Alabama Crimson Tide", "Bama", "ALA"]),
            ("clemson", "Clemson", &["Clemson Tigers", "CLEM"]),
            ("florida-state", "Florida State", &["Florida State Seminoles", "FSU"]),
            ("georgia", "Georgia", &["Georgia Bulldogs", "UGA"]),
            ("lsu", "LSU", &["LSU Tigers", "Louisiana State"]),
            ("michigan", "Michigan", &["Michigan Wolverines", "MICH"]),
            ("notre-dame", "Notre Dame", &["Notre Dame Fighting Irish", "ND"]),
            ("ohio-state", "Ohio State", &["Ohio State Buckeyes", "OSU"]),
            ("oklahoma", "Oklahoma", &["Oklahoma Sooners", "OU", "OKLA"]),
            ("oklahoma-state", "Oklahoma State", &["Oklahoma State Cowboys", "OKST"]),
            ("oregon", "Oregon", &["Oregon Ducks", "ORE"]),
            ("penn-state", "Penn State", &["Penn State Nittany Lions", "PSU"]),
            ("texas", "Texas", &["Texas Longhorns", "TEX", "UT"]),
            ("texas-am", "Texas A&M", &["Texas A&M Aggies", "TAMU"]),
            ("usc", "USC", &["USC Trojans", "Southern California"]),
            ("eastern-washington", "Eastern Washington", &["Eastern Washington Eagles", "EWU"]),
            ("mount-union", "Mount Union", &["Mount Union Purple Raiders"]),
            ("north-dakota-state", "North Dakota State", &["North Dakota State Bison", "NDSU"]),
        ];

        TEAMS
            .iter()
            .fold(Self::new(), |dir, (id, school, aliases)| dir.with_team(id, school, aliases))
    }
}

impl TeamDirectory for StaticTeamDirectory {
    fn resolve(&self, name: &str) -> Option<TeamId> {
        name_candidates(name)
            .iter()
            .find_map(|candidate| self.by_key.get(&match_key(candidate)).cloned())
    }

    fn school_name(&self, id: &str) -> Option<String> {
        self.schools.get(id).cloned()
    }
}

/// Spellings of one name: the cleaned form, an expanded prefix abbreviation
/// and "State"/"St" swaps.
fn name_forms(name: &str) -> Vec<String> {
    let cleaned = normalize_lookup_name(name);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut out = vec![cleaned.clone()];
    for swapped in [swap_word(&cleaned, "State", "St"), swap_word(&cleaned, "St", "State")] {
        if swapped != cleaned {
            out.push(swapped);
        }
    }
    let expanded: Vec<String> = out.iter().filter_map(|s| expand_prefix_abbrev(s)).collect();
    out.extend(expanded);
    out
}

/// Lookup candidates in priority order: the name's own forms first, then the
/// forms with one and two trailing words (usually a mascot) dropped.
fn name_candidates(team_name: &str) -> Vec<String> {
    let cleaned = normalize_lookup_name(team_name);
    let mut out = name_forms(&cleaned);

    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    for drop in 1..=2 {
        if parts.len() > drop {
            out.extend(name_forms(&parts[..parts.len() - drop].join(" ")));
        }
    }

    let mut seen = std::collections::HashSet::new();
    out.retain(|s| seen.insert(match_key(s)));
    out
}

fn swap_word(s: &str, from: &str, to: &str) -> String {
    s.split_whitespace()
        .map(|w| if w == from { to } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a team name for lookup:
/// - remove parenthetical suffixes (e.g. "(OH)")
/// - normalize quotes and dashes
/// - drop periods so "St." and "St" meet
/// - collapse whitespace
fn normalize_lookup_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut paren_depth: u32 = 0;

    for ch in name.chars() {
        match ch {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            _ if paren_depth > 0 => {}
            '’' | '‘' => out.push('\''),
            '–' | '—' | '-' => out.push(' '),
            '.' => {}
            _ => out.push(ch),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand common prefix abbreviations: "E" -> "Eastern", "Mt" -> "Mount"...
fn expand_prefix_abbrev(s: &str) -> Option<String> {
    let mut parts = s.split_whitespace();
    let first = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    let expanded = match first {
        "E" => "Eastern",
        "W" => "Western",
        "N" => "Northern",
        "S" => "Southern",
        "C" => "Central",
        "Mt" => "Mount",
        _ => return None,
    };

    if rest.is_empty() {
        return None;
    }
    Some(format!("{} {}", expanded, rest.join(" ")))
}

/// Case-insensitive key that ignores everything but letters and digits.
fn match_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ignores_case_and_punctuation() {
        let dir = StaticTeamDirectory::builtin();
        assert_eq!(dir.resolve("oklahoma"), Some("oklahoma".to_string()));
        assert_eq!(dir.resolve("OKLAHOMA SOONERS"), Some("oklahoma".to_string()));
        assert_eq!(dir.resolve("Texas A&M"), Some("texas-am".to_string()));
        assert_eq!(dir.resolve("texas a & m"), Some("texas-am".to_string()));
    }

    #[test]
    fn test_state_abbreviation_and_mascot_variants() {
        let dir = StaticTeamDirectory::builtin();
        assert_eq!(dir.resolve("Ohio St."), Some("ohio-state".to_string()));
        assert_eq!(dir.resolve("Ohio St"), Some("ohio-state".to_string()));
        assert_eq!(dir.resolve("Oklahoma State Cowboys"), Some("oklahoma-state".to_string()));
        assert_eq!(dir.resolve("Penn State"), Some("penn-state".to_string()));
    }

    #[test]
    fn test_prefix_and_parenthetical_forms() {
        let dir = StaticTeamDirectory::builtin();
        assert_eq!(dir.resolve("E. Washington"), Some("eastern-washington".to_string()));
        assert_eq!(dir.resolve("Mt. Union (OH)"), Some("mount-union".to_string()));
        assert_eq!(dir.resolve("North Dakota St."), Some("north-dakota-state".to_string()));
    }

    #[test]
    fn test_unknown_team_is_absent() {
        let dir = StaticTeamDirectory::builtin();
        assert_eq!(dir.resolve("Hogwarts"), None);
        assert_eq!(dir.resolve("   "), None);
    }

    #[test]
    fn test_school_name_for_resolved_alias() {
        let dir = StaticTeamDirectory::builtin();
        let id = dir.resolve("texas a & m").unwrap();
        assert_eq!(dir.school_name(&id).as_deref(), Some("Texas A&M"));
        assert_eq!(dir.school_name("hogwarts"), None);
        assert_eq!(dir.len(), 18);
    }

    #[test]
    fn test_normalize_lookup_name() {
        assert_eq!(normalize_lookup_name("Miami (FL)"), "Miami");
        assert_eq!(normalize_lookup_name("Texas A&M–Commerce"), "Texas A&M Commerce");
        assert_eq!(normalize_lookup_name("  St.  John’s "), "St John's");
    }
}
