//! The game-state snapshot exchanged with the narrative service.
//!
//! Each narrated turn returns a complete [`GameState`]; the session replaces
//! its copy wholesale rather than merging fields.

use crate::character::Character;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub character: Character,
    #[serde(default)]
    pub world: WorldState,
    #[serde(default)]
    pub combat: Option<CombatState>,
}

impl GameState {
    pub fn new(character: Character) -> Self {
        Self {
            character,
            world: WorldState::default(),
            combat: None,
        }
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub notable_npcs: Vec<String>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            location: "The Crossroads Inn".to_string(),
            time_of_day: "Evening".to_string(),
            quests: Vec::new(),
            notable_npcs: Vec::new(),
        }
    }
}

impl WorldState {
    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter().filter(|q| q.status == QuestStatus::Active)
    }
}

// ============================================================================
// Quests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub objectives: Vec<QuestObjective>,
    #[serde(default)]
    pub giver: Option<String>,
}

impl Quest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status: QuestStatus::Active,
            objectives: Vec::new(),
            giver: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == QuestStatus::Completed
            || (!self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

// ============================================================================
// Combat
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub name: String,
    #[serde(default)]
    pub initiative: i32,
    #[serde(default)]
    pub is_player: bool,
    #[serde(default)]
    pub is_ally: bool,
    pub current_hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub armor_class: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub turn_index: usize,
    #[serde(default)]
    pub combatants: Vec<Combatant>,
}

impl CombatState {
    /// Insert keeping initiative order, highest first.
    pub fn add_combatant(&mut self, combatant: Combatant) {
        self.combatants.push(combatant);
        self.combatants
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
    }

    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.combatants.get(self.turn_index)
    }

    pub fn next_turn(&mut self) {
        self.turn_index += 1;
        if self.turn_index >= self.combatants.len() {
            self.turn_index = 0;
            self.round += 1;
        }
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| !c.is_player && !c.is_ally)
    }
}

/// JSON schema for [`GameState`], handed to the model as part of the turn
/// tool so its snapshot decodes into these types.
pub fn game_state_schema() -> serde_json::Value {
    let string = json!({"type": "string"});
    let integer = json!({"type": "integer"});
    let strings = json!({"type": "array", "items": {"type": "string"}});

    json!({
        "type": "object",
        "properties": {
            "character": {
                "type": "object",
                "properties": {
                    "name": string,
                    "race": string,
                    "class": string,
                    "level": integer,
                    "experience": integer,
                    "abilityScores": {
                        "type": "object",
                        "properties": {
                            "strength": integer,
                            "dexterity": integer,
                            "constitution": integer,
                            "intelligence": integer,
                            "wisdom": integer,
                            "charisma": integer
                        }
                    },
                    "hitPoints": {
                        "type": "object",
                        "properties": {"current": integer, "maximum": integer}
                    },
                    "inventory": {
                        "type": "array",
                        "items": string,
                        "description": "\"Item Name\", \"Item Name (qty)\" or coin such as \"50 gp\""
                    },
                    "feats": {
                        "type": "array",
                        "items": string,
                        "description": "Targeted feats as \"Feat Name (Target)\""
                    },
                    "skills": {
                        "type": "object",
                        "additionalProperties": integer,
                        "description": "Skill name to rank"
                    }
                },
                "required": ["name", "race", "class", "level"]
            },
            "world": {
                "type": "object",
                "properties": {
                    "location": string,
                    "timeOfDay": string,
                    "quests": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": string,
                                "description": string,
                                "status": {"type": "string", "enum": ["Active", "Completed", "Failed"]},
                                "objectives": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "description": string,
                                            "completed": {"type": "boolean"}
                                        },
                                        "required": ["description"]
                                    }
                                },
                                "giver": string
                            },
                            "required": ["name"]
                        }
                    },
                    "notableNpcs": strings
                }
            },
            "combat": {
                "type": "object",
                "description": "Omit when not in combat",
                "properties": {
                    "round": integer,
                    "turnIndex": integer,
                    "combatants": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": string,
                                "initiative": integer,
                                "isPlayer": {"type": "boolean"},
                                "isAlly": {"type": "boolean"},
                                "currentHp": integer,
                                "maxHp": integer,
                                "armorClass": integer
                            },
                            "required": ["name", "currentHp", "maxHp"]
                        }
                    }
                }
            }
        },
        "required": ["character", "world"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterClass, Race};

    #[test]
    fn test_decodes_sparse_snapshot() {
        let json = r#"{
            "character": {"name": "Ember", "race": "Human", "class": "Sorcerer", "level": 1},
            "world": {"location": "Old Mill", "quests": [{"name": "Find the miller"}]}
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();

        assert_eq!(state.character.class, CharacterClass::Sorcerer);
        assert_eq!(state.world.location, "Old Mill");
        assert_eq!(state.world.time_of_day, "");
        assert_eq!(state.world.active_quests().count(), 1);
        assert!(!state.in_combat());
    }

    #[test]
    fn test_decodes_nested_feat_target() {
        let json = r#"{
            "character": {
                "name": "Ember", "race": "Human", "class": "Fighter", "level": 3,
                "feats": ["Weapon Focus (Bastard Sword (Exotic))"]
            }
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        let feat = &state.character.feats[0];
        assert_eq!(feat.feat, "Weapon Focus");
        assert_eq!(feat.target.as_deref(), Some("Bastard Sword (Exotic)"));
        assert!(state.character.has_feat("Weapon Focus"));
    }

    #[test]
    fn test_combat_turn_order() {
        let goblin = |name: &str, initiative| Combatant {
            name: name.to_string(),
            initiative,
            is_player: false,
            is_ally: false,
            current_hp: 5,
            max_hp: 5,
            armor_class: 15,
        };
        let mut combat = CombatState {
            round: 1,
            ..Default::default()
        };
        combat.add_combatant(goblin("Slow", 3));
        combat.add_combatant(goblin("Fast", 18));

        assert_eq!(combat.current_combatant().map(|c| c.name.as_str()), Some("Fast"));
        combat.next_turn();
        combat.next_turn();
        assert_eq!(combat.round, 2);
        assert_eq!(combat.enemies().count(), 2);
    }

    #[test]
    fn test_wire_names_match_schema() {
        let mut state = GameState::new(Character::new("Ember", Race::Human, CharacterClass::Sorcerer));
        state.combat = Some(CombatState::default());
        let value = serde_json::to_value(&state).unwrap();
        let schema = game_state_schema();

        for key in ["timeOfDay", "notableNpcs"] {
            assert!(value["world"].get(key).is_some());
            assert!(schema["properties"]["world"]["properties"].get(key).is_some());
        }
        assert!(value["character"].get("abilityScores").is_some());
        assert!(schema["properties"]["character"]["properties"].get("abilityScores").is_some());
        assert!(value["combat"].get("turnIndex").is_some());
    }

    #[test]
    fn test_quest_completion() {
        let mut quest = Quest::new("Rats", "Clear the cellar");
        assert!(!quest.is_complete());
        quest.objectives.push(QuestObjective {
            description: "Kill the rat king".to_string(),
            completed: true,
        });
        assert!(quest.is_complete());
    }
}
