use serde::{Deserialize, Deserializer, Serialize};

/// Dietary preferences for one account.
///
/// Missing fields default to off, so an empty or partial response still
/// produces a usable value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub is_vegan: bool,
    pub is_vegetarian: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
    pub is_nut_free: bool,
    pub is_high_protein: bool,
    pub is_low_carb: bool,
    pub is_custom: bool,
    #[serde(deserialize_with = "deserialize_null_as_empty")]
    pub custom_text: String,
}

/// One of the on/off dietary toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DietaryFlag {
    Vegan,
    Vegetarian,
    GlutenFree,
    DairyFree,
    NutFree,
    HighProtein,
    LowCarb,
}

impl DietaryFlag {
    pub const ALL: [DietaryFlag; 7] = [
        DietaryFlag::Vegan,
        DietaryFlag::Vegetarian,
        DietaryFlag::GlutenFree,
        DietaryFlag::DairyFree,
        DietaryFlag::NutFree,
        DietaryFlag::HighProtein,
        DietaryFlag::LowCarb,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DietaryFlag::Vegan => "Vegan",
            DietaryFlag::Vegetarian => "Vegetarian",
            DietaryFlag::GlutenFree => "Gluten Free",
            DietaryFlag::DairyFree => "Dairy Free",
            DietaryFlag::NutFree => "Nut Free",
            DietaryFlag::HighProtein => "High Protein",
            DietaryFlag::LowCarb => "Low Carb",
        }
    }
}

impl Preferences {
    pub fn get(&self, flag: DietaryFlag) -> bool {
        match flag {
            DietaryFlag::Vegan => self.is_vegan,
            DietaryFlag::Vegetarian => self.is_vegetarian,
            DietaryFlag::GlutenFree => self.is_gluten_free,
            DietaryFlag::DairyFree => self.is_dairy_free,
            DietaryFlag::NutFree => self.is_nut_free,
            DietaryFlag::HighProtein => self.is_high_protein,
            DietaryFlag::LowCarb => self.is_low_carb,
        }
    }

    pub fn set(&mut self, flag: DietaryFlag, value: bool) {
        let slot = match flag {
            DietaryFlag::Vegan => &mut self.is_vegan,
            DietaryFlag::Vegetarian => &mut self.is_vegetarian,
            DietaryFlag::GlutenFree => &mut self.is_gluten_free,
            DietaryFlag::DairyFree => &mut self.is_dairy_free,
            DietaryFlag::NutFree => &mut self.is_nut_free,
            DietaryFlag::HighProtein => &mut self.is_high_protein,
            DietaryFlag::LowCarb => &mut self.is_low_carb,
        };
        *slot = value;
    }

    /// Flip the custom toggle. Turning it off discards the custom text.
    pub fn toggle_custom(&mut self) {
        self.is_custom = !self.is_custom;
        if !self.is_custom {
            self.custom_text.clear();
        }
    }

    /// Copy to send to the server: custom text only survives while the
    /// custom toggle is on.
    pub fn for_save(&self) -> Self {
        let mut prefs = self.clone();
        if !prefs.is_custom {
            prefs.custom_text.clear();
        }
        prefs
    }

    /// Labels of every enabled toggle, custom text last.
    pub fn enabled_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = DietaryFlag::ALL
            .iter()
            .filter(|flag| self.get(**flag))
            .map(|flag| flag.label().to_string())
            .collect();
        if self.is_custom && !self.custom_text.trim().is_empty() {
            labels.push(self.custom_text.trim().to_string());
        }
        labels
    }
}

fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_response_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"is_vegan": true, "custom_text": null}"#).unwrap();
        assert!(prefs.is_vegan);
        assert!(!prefs.is_low_carb);
        assert_eq!(prefs.custom_text, "");
    }

    #[test]
    fn test_set_and_get_flags() {
        let mut prefs = Preferences::default();
        for flag in DietaryFlag::ALL {
            prefs.set(flag, true);
            assert!(prefs.get(flag), "{:?} should be set", flag);
        }
        prefs.set(DietaryFlag::NutFree, false);
        assert!(!prefs.is_nut_free);
    }

    #[test]
    fn test_toggle_custom_clears_text() {
        let mut prefs = Preferences {
            is_custom: true,
            custom_text: "no mushrooms".to_string(),
            ..Default::default()
        };
        prefs.toggle_custom();
        assert!(!prefs.is_custom);
        assert!(prefs.custom_text.is_empty());
    }

    #[test]
    fn test_for_save_drops_text_when_custom_off() {
        let prefs = Preferences {
            custom_text: "leftover".to_string(),
            ..Default::default()
        };
        assert!(prefs.for_save().custom_text.is_empty());
        assert_eq!(prefs.custom_text, "leftover");
    }

    #[test]
    fn test_enabled_labels() {
        let prefs = Preferences {
            is_vegan: true,
            is_low_carb: true,
            is_custom: true,
            custom_text: " halal ".to_string(),
            ..Default::default()
        };
        assert_eq!(prefs.enabled_labels(), vec!["Vegan", "Low Carb", "halal"]);
    }
}
