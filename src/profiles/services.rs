use super::dto::UpdateProfileRequest;
use super::repo_types::{PreferenceProfile, ProfileUpdate};

pub const NO_DIETARY_PREFS: &str = "None specified";
pub const NO_ALLERGIES: &str = "None";
pub const ANY_CUISINE: &str = "Any cuisine";

/// Preference tags rendered for the prompt, with readable defaults for
/// anything the user left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPreferences {
    pub dietary_prefs: String,
    pub allergies: String,
    pub favorite_cuisines: String,
    has_allergies: bool,
}

impl AggregatedPreferences {
    pub fn from_profile(profile: Option<&PreferenceProfile>) -> Self {
        let (dietary, allergies, cuisines) = match profile {
            Some(p) => (
                p.dietary_prefs.as_slice(),
                p.allergies.as_slice(),
                p.favorite_cuisines.as_slice(),
            ),
            None => (&[][..], &[][..], &[][..]),
        };
        let allergies_joined = join_tags(allergies);
        Self {
            dietary_prefs: join_tags(dietary).unwrap_or_else(|| NO_DIETARY_PREFS.into()),
            has_allergies: allergies_joined.is_some(),
            allergies: allergies_joined.unwrap_or_else(|| NO_ALLERGIES.into()),
            favorite_cuisines: join_tags(cuisines).unwrap_or_else(|| ANY_CUISINE.into()),
        }
    }

    pub fn has_allergies(&self) -> bool {
        self.has_allergies
    }
}

impl Default for AggregatedPreferences {
    fn default() -> Self {
        Self::from_profile(None)
    }
}

fn join_tags(tags: &[String]) -> Option<String> {
    let kept: Vec<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    (!kept.is_empty()).then(|| kept.join(", "))
}

/// Trims, drops blanks and de-duplicates (case-insensitively, first spelling
/// wins).
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

pub fn build_update(req: UpdateProfileRequest) -> ProfileUpdate {
    let custom = req.custom_allergies.unwrap_or_default();
    let allergies = req
        .allergies
        .iter()
        .map(String::as_str)
        .chain(custom.split(','))
        .collect::<Vec<_>>();

    ProfileUpdate {
        name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        dietary_prefs: normalize_tags(&req.dietary_prefs),
        allergies: normalize_tags(allergies),
        favorite_cuisines: normalize_tags(&req.favorite_cuisines),
    }
}
