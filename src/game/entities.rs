//! # Entities Module
//!
//! The player, monsters, and the species template registry.
//!
//! There is no entity inheritance hierarchy here: the player and monsters
//! are separate concrete types, and anything combat needs from either goes
//! through the [`CombatActor`] capability trait. Monster stat blocks come
//! from a data-driven [`SpeciesRegistry`] resolved once at spawn time.

use crate::ai::AiMemory;
use crate::game::Position;
use crate::GloamResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capability view over anything that can attack or defend.
///
/// Implemented by [`PlayerCharacter`] and [`Monster`]; the combat resolver
/// is generic over this trait and never inspects concrete entity types.
pub trait CombatActor {
    /// Name used in combat narration (the player reads as "You").
    fn display_name(&self) -> &str;
    /// Whether this actor is the player, for message grammar.
    fn is_player(&self) -> bool;
    fn attack_bonus(&self) -> i32;
    fn defense_bonus(&self) -> i32;
    fn base_damage(&self) -> i32;
    fn hp(&self) -> i32;
    fn max_hp(&self) -> i32;
    fn set_hp(&mut self, hp: i32);
}

/// The player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub name: String,
    pub position: Position,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    /// Radius of the player's field of view, in tiles
    pub fov_radius: u32,
    /// Experience accumulated from kills
    pub xp: u32,
}

impl PlayerCharacter {
    /// Creates a new player at the given position with the stock stats.
    pub fn new(name: String, position: Position) -> Self {
        Self::from_config(name, position, &crate::GameConfig::default())
    }

    /// Creates a new player using the configured starting stats.
    pub fn from_config(name: String, position: Position, config: &crate::GameConfig) -> Self {
        Self {
            name,
            position,
            hp: config.player_starting_hp,
            max_hp: config.player_starting_hp,
            attack: config.player_starting_attack,
            defense: config.player_starting_defense,
            fov_radius: config.fov_radius,
            xp: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

impl CombatActor for PlayerCharacter {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_player(&self) -> bool {
        true
    }

    fn attack_bonus(&self) -> i32 {
        self.attack
    }

    fn defense_bonus(&self) -> i32 {
        self.defense
    }

    fn base_damage(&self) -> i32 {
        // Unarmed damage scales with the attack stat.
        2 + self.attack
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }

    fn set_hp(&mut self, hp: i32) {
        self.hp = hp;
    }
}

/// A monster entity.
///
/// Stats are copied out of a [`SpeciesTemplate`] at spawn time; the AI
/// memory is owned by the monster and created lazily on its first AI
/// update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    /// Species id, e.g. `"gutter_rat"`
    pub species: String,
    /// Display name, e.g. `"Gutter Rat"`
    pub name: String,
    pub glyph: char,
    pub position: Position,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    /// Experience awarded to the killer
    pub xp_value: u32,
    pub aggressive: bool,
    pub can_open_doors: bool,
    /// Per-monster AI state, created on first AI update
    pub ai: Option<AiMemory>,
}

impl Monster {
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Returns the AI memory, creating a fresh one if the monster has
    /// never taken an AI turn.
    pub fn ai_mut(&mut self) -> &mut AiMemory {
        self.ai.get_or_insert_with(AiMemory::new)
    }
}

impl CombatActor for Monster {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_player(&self) -> bool {
        false
    }

    fn attack_bonus(&self) -> i32 {
        self.attack
    }

    fn defense_bonus(&self) -> i32 {
        self.defense
    }

    fn base_damage(&self) -> i32 {
        2 + self.attack
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }

    fn set_hp(&mut self, hp: i32) {
        self.hp = hp;
    }
}

/// Static stat block for one monster species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesTemplate {
    pub id: String,
    pub name: String,
    pub glyph: char,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub xp_value: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub aggressive: bool,
    #[serde(default)]
    pub can_open_doors: bool,
}

fn default_true() -> bool {
    true
}

/// Lookup table of species templates, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    templates: HashMap<String, SpeciesTemplate>,
}

impl SpeciesRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Creates a registry holding the stock bestiary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for template in builtin_templates() {
            registry.insert(template);
        }
        registry
    }

    /// Loads templates from a JSON document of the form
    /// `{"monsters": [ ... ]}`, merging over any existing entries.
    pub fn load_from_json(&mut self, json: &str) -> GloamResult<()> {
        #[derive(Deserialize)]
        struct Document {
            monsters: Vec<SpeciesTemplate>,
        }

        let doc: Document = serde_json::from_str(json)?;
        for template in doc.monsters {
            self.insert(template);
        }
        Ok(())
    }

    /// Adds or replaces a template.
    pub fn insert(&mut self, template: SpeciesTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Looks up a template by species id.
    pub fn get(&self, species: &str) -> Option<&SpeciesTemplate> {
        self.templates.get(species)
    }

    /// Instantiates a monster of the given species at a position.
    ///
    /// Returns `None` for an unknown species id; callers treat that as a
    /// skipped spawn, not an error.
    pub fn create_monster(&self, species: &str, position: Position) -> Option<Monster> {
        let template = self.get(species)?;
        Some(Monster {
            species: template.id.clone(),
            name: template.name.clone(),
            glyph: template.glyph,
            position,
            hp: template.hp,
            max_hp: template.hp,
            attack: template.attack,
            defense: template.defense,
            speed: template.speed,
            xp_value: template.xp_value,
            aggressive: template.aggressive,
            can_open_doors: template.can_open_doors,
            ai: None,
        })
    }
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The stock bestiary.
fn builtin_templates() -> Vec<SpeciesTemplate> {
    fn template(
        id: &str,
        name: &str,
        glyph: char,
        hp: i32,
        attack: i32,
        defense: i32,
        speed: i32,
        xp_value: u32,
        description: &str,
    ) -> SpeciesTemplate {
        SpeciesTemplate {
            id: id.to_string(),
            name: name.to_string(),
            glyph,
            hp,
            attack,
            defense,
            speed,
            xp_value,
            description: description.to_string(),
            aggressive: true,
            can_open_doors: false,
        }
    }

    vec![
        template(
            "gutter_rat",
            "Gutter Rat",
            'r',
            4,
            1,
            0,
            110,
            2,
            "A mangy rat grown bold in the dark.",
        ),
        template(
            "cave_spider",
            "Cave Spider",
            's',
            6,
            2,
            0,
            120,
            4,
            "A fist-sized spider that skitters along the walls.",
        ),
        template(
            "kobold",
            "Kobold",
            'k',
            8,
            2,
            1,
            100,
            6,
            "A small reptilian scavenger with a rusty knife.",
        ),
        template(
            "orc_rookling",
            "Orc Rookling",
            'o',
            12,
            3,
            1,
            100,
            10,
            "A young orc eager to prove itself.",
        ),
        template(
            "zombie",
            "Zombie",
            'z',
            16,
            3,
            2,
            80,
            14,
            "A shambling corpse that does not tire.",
        ),
        template(
            "orc",
            "Orc",
            'O',
            20,
            4,
            2,
            100,
            18,
            "A full-grown orc warrior. Orcs never run.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = PlayerCharacter::new("Hero".to_string(), Position::new(5, 5));
        assert_eq!(player.hp, player.max_hp);
        assert!(player.is_alive());
        assert!(player.is_player());
        assert_eq!(player.display_name(), "Hero");
    }

    #[test]
    fn test_builtin_registry() {
        let registry = SpeciesRegistry::builtin();
        for species in [
            "gutter_rat",
            "cave_spider",
            "kobold",
            "orc_rookling",
            "zombie",
            "orc",
        ] {
            assert!(registry.get(species).is_some(), "missing {}", species);
        }
        assert!(registry.get("dragon").is_none());
    }

    #[test]
    fn test_create_monster_from_template() {
        let registry = SpeciesRegistry::builtin();
        let monster = registry
            .create_monster("kobold", Position::new(3, 4))
            .unwrap();

        assert_eq!(monster.species, "kobold");
        assert_eq!(monster.position, Position::new(3, 4));
        assert_eq!(monster.hp, monster.max_hp);
        assert!(monster.ai.is_none());
        assert!(!monster.is_player());
    }

    #[test]
    fn test_unknown_species_is_none() {
        let registry = SpeciesRegistry::builtin();
        assert!(registry.create_monster("beholder", Position::origin()).is_none());
    }

    #[test]
    fn test_ai_memory_created_lazily() {
        let registry = SpeciesRegistry::builtin();
        let mut monster = registry
            .create_monster("gutter_rat", Position::origin())
            .unwrap();

        assert!(monster.ai.is_none());
        monster.ai_mut();
        assert!(monster.ai.is_some());
    }

    #[test]
    fn test_registry_json_loading() {
        let mut registry = SpeciesRegistry::new();
        let json = r#"{
            "monsters": [
                {
                    "id": "bone_hound",
                    "name": "Bone Hound",
                    "glyph": "h",
                    "hp": 9,
                    "attack": 3,
                    "defense": 1,
                    "speed": 130,
                    "xp_value": 8
                }
            ]
        }"#;

        registry.load_from_json(json).unwrap();
        let template = registry.get("bone_hound").unwrap();
        assert_eq!(template.hp, 9);
        assert!(template.aggressive);
    }
}
