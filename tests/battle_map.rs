use std::fs;

use wg_hexmap::model::{CellKind, EntityKind, TerrainKind};
use wg_hexmap::parser::{load_battle, load_map, load_token_map};
use wg_hexmap::processor::{self, MemoryStore, Session};

fn session_from_fixtures() -> Session {
    let log = fs::read_to_string("tests/fixtures/battle_3697692.xml").unwrap();
    let tokens = fs::read_to_string("tests/fixtures/token_sprite_map.json").unwrap();
    Session {
        token_config: Some(load_token_map(&tokens).expect("valid token map")),
        map: Some(load_map(&log).expect("map rows in log")),
        battle: Some(load_battle(&log).expect("battle in log")),
        ..Session::default()
    }
}

fn terrain(t: TerrainKind) -> Option<CellKind> {
    Some(CellKind::Terrain(t))
}

#[test]
fn classifies_map_from_raw_log() {
    let mut store = MemoryStore::with(r#"{"tokenProps":{"R":{"passable":false}}}"#);
    let model = processor::run(&session_from_fixtures(), &mut store);
    let kind = |x, y| model.cell(x, y).map(|c| c.kind);

    // first map row lands on grid row 1, shifted one column right
    assert_eq!(model.token_at(5, 1), 'P');
    assert_eq!(kind(5, 1), terrain(TerrainKind::Impassable));
    assert_eq!(kind(1, 1), terrain(TerrainKind::Passable));
    assert_eq!(kind(0, 1), Some(CellKind::Exit));

    // sprite says passable, the persisted override wins
    assert_eq!(kind(5, 2), terrain(TerrainKind::Impassable));
    let tree = model.cell(5, 2).and_then(|c| c.sprite.cloned()).expect("tree sprite");
    assert_eq!(tree.src, "exp/sprites/tree_01.png");
    assert_eq!(tree.transform.z, 6);

    assert_eq!(kind(5, 3), terrain(TerrainKind::Bush));
    assert_eq!(kind(9, 3), terrain(TerrainKind::Impassable));
    assert_eq!(kind(1, 4), terrain(TerrainKind::Hedgehog));
    assert_eq!(model.token_at(1, 5), '?');
}

#[test]
fn places_battle_from_raw_log() {
    let mut store = MemoryStore::default();
    let model = processor::run(&session_from_fixtures(), &mut store);

    let stats = model.stats();
    assert_eq!(stats.monsters, 2, "$rat1 falls outside the grid");
    assert_eq!(stats.players, 1);
    assert_eq!(stats.objects, 1);

    let player = model.cell(14, 11).and_then(|c| c.entity.cloned()).expect("player");
    assert_eq!(player.kind, EntityKind::Player);
    assert_eq!((player.hp, player.max_hp, player.level), (80, 100, 10));

    let rat = model.cell(15, 13).and_then(|c| c.entity.cloned()).expect("rat");
    assert_eq!(rat.sprite.file, "1439.png");
    let stich = model.cell(17, 13).and_then(|c| c.entity.cloned()).expect("stich");
    assert_eq!(stich.sprite.file, "1441.png");
    assert_eq!((stich.hp, stich.max_hp), (90, 120));

    let medkit = model.cell(15, 12).and_then(|c| c.object.cloned()).expect("object");
    assert_eq!((medkit.txt.as_str(), medkit.count), ("Medkit", 3));
}

#[test]
fn reloading_battle_is_idempotent() {
    let session = session_from_fixtures();
    let mut model = processor::run(&session, &mut MemoryStore::default());
    let battle = session.battle.clone().expect("battle");

    let before: Vec<_> = model.grid().iter().cloned().collect();
    model.apply_battle_data(&battle);
    let after: Vec<_> = model.grid().iter().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn json_rows_fixture() {
    let json = fs::read_to_string("tests/fixtures/map_rows.json").unwrap();
    let map = load_map(&json).expect("valid json");
    assert_eq!(map.rows, vec!["A0".to_string(), "RP".to_string()]);
}
