use serde::{Deserialize, Serialize};

pub type SoundId = u32;
pub type GroupId = u32;

const FALLBACK_VOLUME: f32 = 0.5;

/// A sound as described by `GET /api/sounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDescriptor {
    pub id: SoundId,
    pub name: String,
    pub display_name: String,
    pub file_path: String,
    #[serde(default, rename = "default_volume")]
    pub raw_default_volume: Option<f32>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub user_can_access: bool,
    #[serde(default, rename = "groups")]
    pub group_ids: Vec<GroupId>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl SoundDescriptor {
    pub fn default_volume(&self) -> f32 {
        self.raw_default_volume
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(FALLBACK_VOLUME)
    }

    /// Premium sounds are only offered to logged-in users.
    pub fn is_eligible(&self, logged_in: bool) -> bool {
        logged_in || !self.is_premium
    }

    pub fn in_group(&self, group_id: GroupId) -> bool {
        self.group_ids.contains(&group_id)
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("other")
    }
}

/// The read-only list of sounds loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    sounds: Vec<SoundDescriptor>,
}

impl SoundCatalog {
    pub fn new(sounds: Vec<SoundDescriptor>) -> Self {
        Self { sounds }
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SoundDescriptor> {
        self.sounds.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&SoundDescriptor> {
        self.sounds.iter().find(|s| s.name == name)
    }

    pub fn by_id(&self, id: SoundId) -> Option<&SoundDescriptor> {
        self.sounds.iter().find(|s| s.id == id)
    }

    pub fn accessible(&self) -> impl Iterator<Item = &SoundDescriptor> {
        self.sounds.iter().filter(|s| s.user_can_access)
    }

    /// Categories in the order they first appear in the catalog.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for sound in &self.sounds {
            let label = sound.category_label();
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        seen
    }

    /// Catalog indices ordered by category, keeping the server order inside
    /// each category. This is the order the sound list is drawn in.
    pub fn display_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.sounds.len());
        for category in self.categories() {
            order.extend(
                self.sounds
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.category_label() == category)
                    .map(|(i, _)| i),
            );
        }
        order
    }
}

#[cfg(test)]
pub(crate) fn descriptor(
    id: SoundId,
    name: &str,
    premium: bool,
    groups: &[GroupId],
) -> SoundDescriptor {
    SoundDescriptor {
        id,
        name: name.to_string(),
        display_name: name.to_uppercase(),
        file_path: format!("/sounds/{name}.mp3"),
        raw_default_volume: Some(0.5),
        is_premium: premium,
        user_can_access: !premium,
        group_ids: groups.to_vec(),
        icon: None,
        category: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_shape() {
        let json = r#"[
          {
            "id": 1,
            "name": "rain",
            "display_name": "Rain",
            "icon": "static/icons/rain.png",
            "file_path": "/sounds/rain.mp3",
            "default_volume": 0.7,
            "category": "nature",
            "is_premium": false,
            "groups": [1, 2, 4],
            "user_can_access": true
          },
          {
            "id": 17,
            "name": "airplane",
            "display_name": "Airplane",
            "file_path": "/sounds/airplane.mp3",
            "default_volume": null,
            "is_premium": true,
            "groups": [5],
            "user_can_access": false
          }
        ]"#;
        let sounds: Vec<SoundDescriptor> = serde_json::from_str(json).unwrap();
        let catalog = SoundCatalog::new(sounds);

        let rain = catalog.by_name("rain").unwrap();
        assert_eq!(rain.default_volume(), 0.7);
        assert!(rain.in_group(4));
        assert_eq!(rain.category_label(), "nature");

        let plane = catalog.by_id(17).unwrap();
        assert_eq!(plane.default_volume(), 0.5);
        assert!(!plane.is_eligible(false));
        assert!(plane.is_eligible(true));
        assert_eq!(catalog.accessible().count(), 1);
    }

    #[test]
    fn out_of_range_default_volume_is_clamped() {
        let mut sound = descriptor(1, "fan", false, &[]);
        sound.raw_default_volume = Some(1.7);
        assert_eq!(sound.default_volume(), 1.0);
        sound.raw_default_volume = Some(f32::NAN);
        assert_eq!(sound.default_volume(), 0.5);
    }

    #[test]
    fn display_order_groups_categories() {
        let mut a = descriptor(1, "rain", false, &[]);
        a.category = Some("nature".into());
        let mut b = descriptor(2, "cafe", false, &[]);
        b.category = Some("city".into());
        let mut c = descriptor(3, "wind", false, &[]);
        c.category = Some("nature".into());
        let catalog = SoundCatalog::new(vec![a, b, c]);

        assert_eq!(catalog.categories(), vec!["nature", "city"]);
        assert_eq!(catalog.display_order(), vec![0, 2, 1]);
    }
}
