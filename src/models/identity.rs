/// Composite identity key for remote entities.
///
/// Combines a type tag with the entity's natural id so that, for example, an
/// app with id 100 and an achievement belonging to app 100 never compare
/// equal or collide in a set. No mutable field participates in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    App(u32),
    Achievement { appid: u32, api_name: String },
}

/// Implemented by every entity kind; equality and hashing on the entities
/// delegate to this key.
pub trait Entity {
    fn identity(&self) -> EntityId;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_app_and_achievement_ids_never_collide() {
        let app = EntityId::App(100);
        let achievement = EntityId::Achievement {
            appid: 100,
            api_name: "100".to_string(),
        };
        assert_ne!(app, achievement);

        let mut set = HashSet::new();
        set.insert(app.clone());
        set.insert(achievement);
        set.insert(app);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_achievement_identity_includes_api_name() {
        let first = EntityId::Achievement {
            appid: 70,
            api_name: "KILL_GARGANTUA".to_string(),
        };
        let second = EntityId::Achievement {
            appid: 70,
            api_name: "SECRET_ENDING".to_string(),
        };
        assert_ne!(first, second);
    }
}
