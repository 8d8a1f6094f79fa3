//! # Combat Resolver
//!
//! d20-style attack resolution between any two combat-capable actors.
//!
//! One attack consumes exactly one d20 draw and, if it hits, exactly one
//! damage draw. The resolver is generic over [`CombatActor`], so the player
//! and monsters resolve identically, and it always produces a valid
//! [`CombatOutcome`]; an absent message sink just skips narration.

use crate::game::{CombatActor, MessageLog};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

/// Structured result of a single attack.
///
/// Produced and consumed per attack, never persisted. `damage` is the
/// rolled damage (doubled on a critical) before the defender's defense is
/// subtracted.
#[derive(Debug, Clone, Default)]
pub struct CombatOutcome {
    pub hit: bool,
    pub damage: i32,
    pub critical: bool,
    pub fatal: bool,
    pub attack_text: String,
    pub damage_text: String,
    pub result_text: String,
}

/// The combat resolution system.
pub struct CombatSystem;

impl CombatSystem {
    /// Defense value everyone starts from before bonuses.
    pub const BASE_DEFENSE: i32 = 10;
    /// Floor on damage applied by any successful hit.
    pub const MIN_DAMAGE: i32 = 1;
    /// Natural roll that always hits and doubles damage.
    pub const CRITICAL_HIT_ROLL: i32 = 20;
    /// Natural roll that always misses.
    pub const CRITICAL_MISS_ROLL: i32 = 1;

    /// Resolves one attack, drawing the d20 from `rng`.
    pub fn process_attack<A, D>(
        attacker: &A,
        defender: &mut D,
        rng: &mut StdRng,
        log: Option<&mut MessageLog>,
    ) -> CombatOutcome
    where
        A: CombatActor + ?Sized,
        D: CombatActor + ?Sized,
    {
        let raw_d20 = rng.gen_range(1..=20);
        Self::process_attack_with_roll(attacker, defender, raw_d20, rng, log)
    }

    /// Resolves one attack with the d20 already drawn.
    ///
    /// Exists so tests can pin the die; gameplay goes through
    /// [`CombatSystem::process_attack`].
    pub fn process_attack_with_roll<A, D>(
        attacker: &A,
        defender: &mut D,
        raw_d20: i32,
        rng: &mut StdRng,
        log: Option<&mut MessageLog>,
    ) -> CombatOutcome
    where
        A: CombatActor + ?Sized,
        D: CombatActor + ?Sized,
    {
        let mut outcome = CombatOutcome::default();

        let attack_roll = raw_d20 + attacker.attack_bonus();
        let defense_value = Self::BASE_DEFENSE + defender.defense_bonus();

        outcome.critical = raw_d20 == Self::CRITICAL_HIT_ROLL;
        let critical_miss = raw_d20 == Self::CRITICAL_MISS_ROLL;

        // Natural extremes bypass the hit-chance comparison entirely.
        outcome.hit = if outcome.critical {
            true
        } else if critical_miss {
            false
        } else {
            attack_roll >= defense_value
        };

        debug!(
            "{} attacks {}: d20={} attack_roll={} defense={} hit={} critical={}",
            Self::combatant_name(attacker),
            Self::combatant_name(defender),
            raw_d20,
            attack_roll,
            defense_value,
            outcome.hit,
            outcome.critical
        );

        if outcome.hit {
            outcome.damage = rng.gen_range(1..=attacker.base_damage().max(1));
            if outcome.critical {
                outcome.damage *= 2;
            }

            let actual = Self::MIN_DAMAGE.max(outcome.damage - defender.defense_bonus());
            defender.set_hp((defender.hp() - actual).max(0));
            outcome.fatal = defender.hp() <= 0;

            debug!(
                "{} takes {} damage ({} after defense), hp now {}/{}",
                Self::combatant_name(defender),
                outcome.damage,
                actual,
                defender.hp(),
                defender.max_hp()
            );

            outcome.attack_text =
                Self::attack_message(attacker, defender, true, outcome.critical);
            outcome.damage_text = Self::damage_message(defender, outcome.damage, outcome.fatal);
            if outcome.fatal {
                outcome.result_text = format!(
                    "{} {}",
                    Self::combatant_name(defender),
                    if defender.is_player() { "die!" } else { "dies!" }
                );
            }
        } else {
            outcome.attack_text = Self::attack_message(attacker, defender, false, false);
        }

        if let Some(log) = log {
            Self::narrate(log, &outcome);
        }

        outcome
    }

    /// Appends the outcome's message lines to a sink, in order: attack,
    /// damage (if any), death (if any).
    fn narrate(log: &mut MessageLog, outcome: &CombatOutcome) {
        if !outcome.attack_text.is_empty() {
            log.append(outcome.attack_text.clone());
        }
        if outcome.hit && !outcome.damage_text.is_empty() {
            log.append(outcome.damage_text.clone());
        }
        if !outcome.result_text.is_empty() {
            log.append(outcome.result_text.clone());
        }
    }

    /// The name an actor goes by in narration; the acting player is "You".
    fn combatant_name<T: CombatActor + ?Sized>(actor: &T) -> &str {
        if actor.is_player() {
            "You"
        } else {
            actor.display_name()
        }
    }

    fn attack_message<A, D>(attacker: &A, defender: &D, hit: bool, critical: bool) -> String
    where
        A: CombatActor + ?Sized,
        D: CombatActor + ?Sized,
    {
        let attacker_name = Self::combatant_name(attacker);
        let defender_name = Self::combatant_name(defender);
        // Third-person verbs get their "s"; the player speaks in second
        // person.
        let third_person = !attacker.is_player();

        if hit {
            if critical {
                format!(
                    "{} critically hit{} {}!",
                    attacker_name,
                    if third_person { "s" } else { "" },
                    defender_name
                )
            } else {
                format!(
                    "{} hit{} {}.",
                    attacker_name,
                    if third_person { "s" } else { "" },
                    defender_name
                )
            }
        } else {
            format!(
                "{} miss{} {}.",
                attacker_name,
                if third_person { "es" } else { "" },
                defender_name
            )
        }
    }

    fn damage_message<D: CombatActor + ?Sized>(defender: &D, damage: i32, fatal: bool) -> String {
        if defender.is_player() {
            if fatal {
                format!("You take {} damage and die!", damage)
            } else {
                format!("You take {} damage.", damage)
            }
        } else if fatal {
            format!("{} takes {} damage and dies!", defender.display_name(), damage)
        } else {
            format!("{} takes {} damage.", defender.display_name(), damage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerCharacter, Position, SpeciesRegistry};
    use rand::SeedableRng;

    fn player() -> PlayerCharacter {
        PlayerCharacter::new("Hero".to_string(), Position::origin())
    }

    fn kobold() -> crate::game::Monster {
        SpeciesRegistry::builtin()
            .create_monster("kobold", Position::new(1, 0))
            .unwrap()
    }

    #[test]
    fn test_natural_twenty_always_crits() {
        let attacker = player();
        let mut rng = StdRng::seed_from_u64(0);

        // Even against an absurd defense, a natural 20 lands.
        let mut defender = kobold();
        defender.defense = 1000;
        let hp_before = defender.hp;

        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 20, &mut rng, None);

        assert!(outcome.hit);
        assert!(outcome.critical);
        // Critical damage is a doubled roll: always even, and at least 2.
        assert!(outcome.damage >= 2);
        assert_eq!(outcome.damage % 2, 0);
        // Minimum damage still applies through the huge defense bonus.
        assert_eq!(defender.hp, hp_before - 1);
    }

    #[test]
    fn test_natural_one_always_misses() {
        let mut attacker = player();
        attacker.attack = 1000;
        let mut defender = kobold();
        let hp_before = defender.hp;
        let mut rng = StdRng::seed_from_u64(0);

        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 1, &mut rng, None);

        assert!(!outcome.hit);
        assert!(!outcome.critical);
        assert!(!outcome.fatal);
        assert_eq!(outcome.damage, 0);
        assert_eq!(defender.hp, hp_before);
    }

    #[test]
    fn test_ordinary_hit_respects_defense_comparison() {
        let attacker = player(); // attack bonus 2
        let mut defender = kobold(); // defense bonus 1 -> defense value 11
        let mut rng = StdRng::seed_from_u64(0);

        // 8 + 2 = 10 < 11: miss.
        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 8, &mut rng, None);
        assert!(!outcome.hit);

        // 9 + 2 = 11 >= 11: hit.
        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 9, &mut rng, None);
        assert!(outcome.hit);
        assert!(!outcome.critical);
    }

    #[test]
    fn test_minimum_one_damage_on_hit() {
        let mut attacker = player();
        attacker.attack = 0; // base damage 2
        let mut defender = kobold();
        defender.defense = 50;
        let hp_before = defender.hp;
        let mut rng = StdRng::seed_from_u64(42);

        // A natural 20 guarantees contact; the damage roll can never beat
        // the defense bonus, so the floor applies.
        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 20, &mut rng, None);

        assert!(outcome.hit);
        assert_eq!(defender.hp, hp_before - 1);
    }

    #[test]
    fn test_fatal_attack_floors_hp_at_zero() {
        let attacker = player();
        let mut defender = kobold();
        defender.hp = 1;
        defender.defense = 0;
        let mut rng = StdRng::seed_from_u64(9);

        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 20, &mut rng, None);

        assert!(outcome.fatal);
        assert_eq!(defender.hp, 0);
        assert_eq!(outcome.result_text, "Kobold dies!");
    }

    #[test]
    fn test_message_grammar() {
        let attacker = player();
        let mut defender = kobold();
        defender.hp = 1000;
        defender.max_hp = 1000;
        let mut rng = StdRng::seed_from_u64(1);

        let outcome =
            CombatSystem::process_attack_with_roll(&attacker, &mut defender, 15, &mut rng, None);
        assert_eq!(outcome.attack_text, "You hit Kobold.");
        assert!(outcome.damage_text.starts_with("Kobold takes "));

        // Monster attacking the player uses third-person verbs.
        let monster = kobold();
        let mut target = player();
        let outcome =
            CombatSystem::process_attack_with_roll(&monster, &mut target, 1, &mut rng, None);
        assert_eq!(outcome.attack_text, "Kobold misses You.");
    }

    #[test]
    fn test_narration_order_in_message_log() {
        let attacker = player();
        let mut defender = kobold();
        defender.hp = 1;
        defender.defense = 0;
        let mut rng = StdRng::seed_from_u64(2);
        let mut log = MessageLog::new();

        CombatSystem::process_attack_with_roll(
            &attacker,
            &mut defender,
            20,
            &mut rng,
            Some(&mut log),
        );

        let lines: Vec<&str> = log.recent(10).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("critically hit"));
        assert!(lines[1].contains("damage"));
        assert_eq!(lines[2], "Kobold dies!");
    }

    #[test]
    fn test_random_attack_produces_valid_outcome() {
        let attacker = player();
        let mut defender = kobold();
        let mut rng = StdRng::seed_from_u64(12345);

        for _ in 0..100 {
            defender.hp = defender.max_hp;
            let outcome = CombatSystem::process_attack(&attacker, &mut defender, &mut rng, None);
            // Critical hits and misses are mutually exclusive.
            if outcome.critical {
                assert!(outcome.hit);
            }
            if outcome.hit {
                assert!(outcome.damage >= 1);
            } else {
                assert_eq!(outcome.damage, 0);
            }
        }
    }
}
