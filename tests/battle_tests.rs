use pokemon_random_battle::ai::BattleAI;
use pokemon_random_battle::engine::{BattleEngine, Phase, PlayerInput, Transition, Winner};
use pokemon_random_battle::model::{Combatant, MoveCategory, MoveDescriptor, Roster};
use pokemon_random_battle::stats::StatsSet;
use pokemon_random_battle::types::PokemonType;
use rand::RngCore;

fn make_move(name: &str, move_type: PokemonType, category: MoveCategory, power: u32) -> MoveDescriptor {
    MoveDescriptor::new(name, move_type, category, Some(power))
}

fn make_mon(name: &str, types: &[PokemonType], speed: u32, mv: MoveDescriptor) -> Combatant {
    let base = StatsSet {
        hp: 80,
        atk: 80,
        def: 80,
        spa: 80,
        spd: 80,
        spe: 80,
    };
    let mut mon = Combatant::new(1, name, types.to_vec(), base, vec![mv], 50).expect("valid combatant");
    mon.stats.spe = speed;
    mon
}

fn tackle() -> MoveDescriptor {
    make_move("tackle", PokemonType::Normal, MoveCategory::Physical, 40)
}

fn poke() -> MoveDescriptor {
    make_move("light-poke", PokemonType::Normal, MoveCategory::Physical, 10)
}

fn at_one_hp(mut mon: Combatant) -> Combatant {
    mon.current_hp = 1;
    mon
}

fn fainted(mut mon: Combatant) -> Combatant {
    mon.take_damage(u32::MAX);
    mon
}

fn start(player: Vec<Combatant>, opponent: Vec<Combatant>, seed: u64) -> BattleEngine {
    let mut engine = BattleEngine::with_seed(seed);
    assert_eq!(
        engine.begin(Roster::new(player).unwrap(), Roster::new(opponent).unwrap()),
        Transition::Accepted
    );
    engine.drain_log();
    assert_eq!(engine.phase(), Phase::PlayerAction);
    engine
}

fn messages_since(engine: &BattleEngine, from: usize) -> Vec<String> {
    engine.log()[from..].iter().map(|e| e.message.clone()).collect()
}

fn fight(engine: &mut BattleEngine, move_index: usize) {
    assert_eq!(engine.apply(PlayerInput::Fight), Transition::Accepted);
    assert_eq!(engine.apply(PlayerInput::ChooseMove(move_index)), Transition::Accepted);
    assert_eq!(engine.phase(), Phase::TurnProcessing);
    engine.resolve_turn();
}

#[test]
fn intro_announces_both_sides() {
    let engine = start(
        vec![make_mon("pikachu", &[PokemonType::Electric], 90, poke())],
        vec![make_mon("eevee", &[PokemonType::Normal], 55, poke())],
        1,
    );
    let log = engine.log();
    assert_eq!(log[0].message, "A wild EEVEE appeared!");
    assert!(!log[0].typewriter);
    assert_eq!(log[1].message, "Go, PIKACHU!");
    assert!(log[1].typewriter);
    assert_eq!(log[2].message, "What will PIKACHU do?");
}

#[test]
fn faster_combatant_attacks_first() {
    let mut engine = start(
        vec![make_mon("fastmon", &[PokemonType::Normal], 100, poke())],
        vec![make_mon("slowmon", &[PokemonType::Normal], 80, poke())],
        7,
    );
    let before = engine.log().len();
    fight(&mut engine, 0);
    let messages = messages_since(&engine, before);
    assert_eq!(messages[0], "FASTMON used light poke!");
    assert_eq!(messages[1], "SLOWMON used light poke!");
    assert_eq!(messages.last().unwrap(), "What will FASTMON do?");
    assert_eq!(engine.phase(), Phase::PlayerAction);

    let mut engine = start(
        vec![make_mon("slowmon", &[PokemonType::Normal], 80, poke())],
        vec![make_mon("fastmon", &[PokemonType::Normal], 100, poke())],
        7,
    );
    let before = engine.log().len();
    fight(&mut engine, 0);
    assert_eq!(messages_since(&engine, before)[0], "FASTMON used light poke!");
}

#[test]
fn opponent_faint_promotes_next_member_and_skips_its_attack() {
    let mut engine = start(
        vec![make_mon("hero", &[PokemonType::Normal], 100, tackle())],
        vec![
            at_one_hp(make_mon("first", &[PokemonType::Normal], 50, tackle())),
            make_mon("second", &[PokemonType::Normal], 50, tackle()),
        ],
        3,
    );
    let before = engine.log().len();
    fight(&mut engine, 0);
    let messages = messages_since(&engine, before);
    assert_eq!(
        messages,
        vec![
            "HERO used tackle!",
            "FIRST fainted!",
            "The opponent sent out SECOND!",
            "What will HERO do?"
        ]
    );
    let state = engine.state();
    assert!(state.opponent.get(0).unwrap().is_fainted);
    assert_eq!(state.opponent.get(0).unwrap().current_hp, 0);
    assert_eq!(state.opponent.active_index(), 1);
    let hero = state.player.active().unwrap();
    assert_eq!(hero.current_hp, hero.max_hp);
}

#[test]
fn last_opponent_faint_ends_battle_for_player() {
    let mut engine = start(
        vec![make_mon("hero", &[PokemonType::Normal], 100, tackle())],
        vec![at_one_hp(make_mon("wildmon", &[PokemonType::Normal], 50, tackle()))],
        3,
    );
    fight(&mut engine, 0);
    assert_eq!(engine.phase(), Phase::GameOver);
    assert_eq!(engine.winner(), Some(Winner::Player));
    let last = engine.log().last().unwrap();
    assert_eq!(last.message, "You defeated the wild WILDMON!");
    assert!(!last.typewriter);
    assert!(engine.legal_inputs().is_empty());
    assert_eq!(engine.apply(PlayerInput::Fight), Transition::Ignored);
    assert!(!engine.step());
}

#[test]
fn beating_a_full_team_uses_team_message() {
    let mut engine = start(
        vec![make_mon("hero", &[PokemonType::Normal], 100, tackle())],
        vec![
            fainted(make_mon("gone", &[PokemonType::Normal], 50, tackle())),
            at_one_hp(make_mon("last", &[PokemonType::Normal], 50, tackle())),
        ],
        3,
    );
    // A roster always opens on index 0, even when that member is already down.
    assert_eq!(engine.state().opponent.active_index(), 0);
    fight(&mut engine, 0);
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert_eq!(engine.state().opponent.active_index(), 1);
    fight(&mut engine, 0);
    assert_eq!(engine.winner(), Some(Winner::Player));
    assert_eq!(
        engine.log().last().unwrap().message,
        "You defeated the opposing team!"
    );
}

#[test]
fn player_faint_with_teammate_forces_switch_without_free_attack() {
    let mut engine = start(
        vec![
            at_one_hp(make_mon("frail", &[PokemonType::Normal], 10, tackle())),
            make_mon("backup", &[PokemonType::Normal], 10, tackle()),
        ],
        vec![make_mon("bully", &[PokemonType::Normal], 100, tackle())],
        9,
    );
    fight(&mut engine, 0);
    assert_eq!(engine.phase(), Phase::ForcedSwitch);
    let last = engine.log().last().unwrap();
    assert_eq!(last.message, "Choose your next Pokémon!");
    assert!(!last.typewriter);
    assert!(!engine
        .log()
        .iter()
        .any(|e| e.message == "FRAIL used tackle!"));
    assert_eq!(engine.legal_inputs(), vec![PlayerInput::ChooseSwitch(1)]);
    assert_eq!(engine.apply(PlayerInput::Fight), Transition::Ignored);
    assert_eq!(engine.apply(PlayerInput::Run), Transition::Ignored);

    let before = engine.log().len();
    let bully_hp_before = engine.state().opponent.active().unwrap().current_hp;
    assert_eq!(engine.apply(PlayerInput::ChooseSwitch(1)), Transition::Accepted);
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert_eq!(
        messages_since(&engine, before),
        vec!["Go, BACKUP!", "What will BACKUP do?"]
    );
    let backup = engine.state().player.active().unwrap();
    assert_eq!(backup.current_hp, backup.max_hp);
    assert_eq!(
        engine.state().opponent.active().unwrap().current_hp,
        bully_hp_before
    );
}

#[test]
fn losing_last_member_ends_battle_for_opponent() {
    let mut engine = start(
        vec![at_one_hp(make_mon("frail", &[PokemonType::Normal], 10, tackle()))],
        vec![make_mon("bully", &[PokemonType::Normal], 100, tackle())],
        9,
    );
    fight(&mut engine, 0);
    assert_eq!(engine.phase(), Phase::GameOver);
    assert_eq!(engine.winner(), Some(Winner::Opponent));
    let tail = messages_since(&engine, engine.log().len() - 2);
    assert_eq!(
        tail,
        vec!["You have no more Pokémon that can fight!", "You blacked out..."]
    );
}

#[test]
fn voluntary_switch_gives_opponent_a_free_attack() {
    let mut engine = start(
        vec![
            make_mon("lead", &[PokemonType::Normal], 200, tackle()),
            make_mon("bench", &[PokemonType::Normal], 200, tackle()),
        ],
        vec![make_mon("foe", &[PokemonType::Normal], 10, tackle())],
        4,
    );
    let before = engine.log().len();
    assert_eq!(engine.apply(PlayerInput::ChooseSwitch(1)), Transition::Accepted);
    assert_eq!(engine.phase(), Phase::TurnProcessing);
    engine.resolve_turn();
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert_eq!(
        messages_since(&engine, before),
        vec![
            "Come back, LEAD!",
            "Go, BENCH!",
            "FOE used tackle!",
            "What will BENCH do?"
        ]
    );
    let state = engine.state();
    assert_eq!(state.player.active_index(), 1);
    let lead = state.player.get(0).unwrap();
    assert_eq!(lead.current_hp, lead.max_hp);
    let bench = state.player.get(1).unwrap();
    assert!(bench.current_hp < bench.max_hp);
}

#[test]
fn free_attack_that_faints_the_incoming_member_forces_another_switch() {
    let mut engine = start(
        vec![
            make_mon("lead", &[PokemonType::Normal], 200, tackle()),
            at_one_hp(make_mon("bench", &[PokemonType::Normal], 200, tackle())),
        ],
        vec![make_mon("foe", &[PokemonType::Normal], 10, tackle())],
        4,
    );
    assert_eq!(engine.apply(PlayerInput::ChooseSwitch(1)), Transition::Accepted);
    engine.resolve_turn();
    assert_eq!(engine.phase(), Phase::ForcedSwitch);
    assert!(engine.state().player.get(1).unwrap().is_fainted);
    assert_eq!(engine.legal_inputs(), vec![PlayerInput::ChooseSwitch(0)]);
    assert_eq!(
        engine.log().last().unwrap().message,
        "Choose your next Pokémon!"
    );

    assert_eq!(engine.apply(PlayerInput::ChooseSwitch(0)), Transition::Accepted);
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert_eq!(engine.state().player.active_index(), 0);
}

#[test]
fn free_attack_that_faints_the_last_member_loses_the_battle() {
    let mut engine = start(
        vec![
            fainted(make_mon("lead", &[PokemonType::Normal], 200, tackle())),
            at_one_hp(make_mon("bench", &[PokemonType::Normal], 200, tackle())),
        ],
        vec![make_mon("foe", &[PokemonType::Normal], 10, tackle())],
        4,
    );
    assert_eq!(engine.apply(PlayerInput::ChooseSwitch(1)), Transition::Accepted);
    engine.resolve_turn();
    assert_eq!(engine.phase(), Phase::GameOver);
    assert_eq!(engine.winner(), Some(Winner::Opponent));
    assert_eq!(engine.log().last().unwrap().message, "You blacked out...");
    assert!(engine.legal_inputs().is_empty());
}

/// Always picks the same move slot.
struct FixedAI(usize);

impl BattleAI for FixedAI {
    fn choose_move(&mut self, _active: &Combatant, _rng: &mut dyn RngCore) -> Option<usize> {
        Some(self.0)
    }
}

#[test]
fn injected_ai_chooses_the_opponent_move() {
    let mut foe = make_mon("foe", &[PokemonType::Normal], 10, poke());
    foe.moves
        .push(make_move("scratch", PokemonType::Normal, MoveCategory::Physical, 10));
    let mut engine = BattleEngine::with_seed(2).with_ai(FixedAI(1));
    let _ = engine.begin(
        Roster::new(vec![make_mon("hero", &[PokemonType::Normal], 100, poke())]).unwrap(),
        Roster::new(vec![foe]).unwrap(),
    );
    engine.drain_log();
    for _ in 0..3 {
        let before = engine.log().len();
        fight(&mut engine, 0);
        let messages = messages_since(&engine, before);
        assert_eq!(messages[0], "HERO used light poke!");
        assert_eq!(messages[1], "FOE used scratch!");
    }
}

#[test]
fn illegal_inputs_leave_state_untouched() {
    let mut engine = start(
        vec![
            make_mon("lead", &[PokemonType::Normal], 50, poke()),
            make_mon("bench", &[PokemonType::Normal], 50, poke()),
        ],
        vec![make_mon("foe", &[PokemonType::Normal], 50, poke())],
        5,
    );
    let snapshot = serde_json::to_string(&engine.snapshot()).unwrap();
    for input in [
        PlayerInput::ChooseMove(0),
        PlayerInput::Back,
        PlayerInput::ChooseSwitch(0),
        PlayerInput::ChooseSwitch(6),
    ] {
        assert_eq!(engine.apply(input), Transition::Ignored, "{input:?}");
    }
    assert_eq!(serde_json::to_string(&engine.snapshot()).unwrap(), snapshot);

    assert_eq!(engine.apply(PlayerInput::Run), Transition::Accepted);
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert_eq!(serde_json::to_string(&engine.snapshot()).unwrap(), snapshot);

    assert_eq!(engine.apply(PlayerInput::Fight), Transition::Accepted);
    assert_eq!(
        engine.legal_inputs(),
        vec![PlayerInput::ChooseMove(0), PlayerInput::Back]
    );
    assert_eq!(engine.apply(PlayerInput::ChooseMove(3)), Transition::Ignored);
    assert_eq!(engine.apply(PlayerInput::ChooseSwitch(1)), Transition::Ignored);
    assert_eq!(engine.apply(PlayerInput::Back), Transition::Accepted);
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert_eq!(
        engine.legal_inputs(),
        vec![
            PlayerInput::Fight,
            PlayerInput::Run,
            PlayerInput::ChooseSwitch(1)
        ]
    );
}

#[test]
fn inputs_before_battle_starts_are_ignored() {
    let mut engine = BattleEngine::with_seed(0);
    assert_eq!(engine.phase(), Phase::Loading);
    assert_eq!(engine.apply(PlayerInput::Fight), Transition::Ignored);
    assert!(engine.legal_inputs().is_empty());
    assert!(engine.next_entry().is_none());
    assert_eq!(engine.phase(), Phase::Loading);
}

#[test]
fn immune_defender_takes_no_damage() {
    let mut engine = start(
        vec![make_mon("brawler", &[PokemonType::Normal], 100, tackle())],
        vec![make_mon("phantom", &[PokemonType::Ghost], 10, poke())],
        6,
    );
    let before = engine.log().len();
    fight(&mut engine, 0);
    let messages = messages_since(&engine, before);
    assert_eq!(messages[0], "BRAWLER used tackle!");
    assert_eq!(messages[1], "It had no effect!");
    let phantom = engine.state().opponent.active().unwrap();
    assert_eq!(phantom.current_hp, phantom.max_hp);
}

#[test]
fn effectiveness_is_narrated_after_the_hit() {
    let water = make_move("water-gun", PokemonType::Water, MoveCategory::Special, 40);
    let mut engine = start(
        vec![make_mon("squirt", &[PokemonType::Water], 100, water)],
        vec![make_mon("stone", &[PokemonType::Fire, PokemonType::Rock], 10, poke())],
        6,
    );
    let before = engine.log().len();
    fight(&mut engine, 0);
    let messages = messages_since(&engine, before);
    assert_eq!(messages[0], "SQUIRT used water gun!");
    assert_eq!(messages[1], "It's super effective!");
}

#[test]
fn same_seed_replays_the_same_battle() {
    let build = || {
        start(
            vec![make_mon("a", &[PokemonType::Normal], 60, tackle())],
            vec![make_mon("b", &[PokemonType::Normal], 60, tackle())],
            42,
        )
    };
    let mut first = build();
    let mut second = build();
    while first.phase() != Phase::GameOver {
        fight(&mut first, 0);
        fight(&mut second, 0);
        first.drain_log();
        second.drain_log();
    }
    assert_eq!(first.log(), second.log());
    assert_eq!(first.winner(), second.winner());
}

#[test]
fn turn_resolves_one_step_at_a_time() {
    let mut engine = start(
        vec![make_mon("fastmon", &[PokemonType::Normal], 100, poke())],
        vec![make_mon("slowmon", &[PokemonType::Normal], 80, poke())],
        8,
    );
    let _ = engine.apply(PlayerInput::Fight);
    let _ = engine.apply(PlayerInput::ChooseMove(0));
    let before = engine.log().len();
    assert!(engine.step());
    assert_eq!(messages_since(&engine, before), vec!["FASTMON used light poke!"]);
    assert_eq!(engine.phase(), Phase::TurnProcessing);
    assert_eq!(engine.apply(PlayerInput::Fight), Transition::Ignored);
    assert!(engine.step());
    assert!(engine.step());
    assert_eq!(engine.phase(), Phase::PlayerAction);
    assert!(!engine.step());
}
