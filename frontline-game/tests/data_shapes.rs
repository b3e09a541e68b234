use std::collections::HashSet;
use std::hash::Hasher;

use frontline_game::{
    BattleCatalog, CatalogError, EngineConfig, Faction, RngBundle, campaigns, generate_map,
};
use twox_hash::XxHash64;

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn map_digest(seed: u64, faction: Faction) -> u64 {
    let mut rngs = RngBundle::from_user_seed(seed);
    let mut bytes = Vec::new();
    for battle in campaigns().campaign(faction) {
        let field = generate_map(battle, rngs.map());
        bytes.extend(serde_json::to_vec(&field.grid).unwrap());
        bytes.extend(serde_json::to_vec(&field.routes).unwrap());
    }
    snapshot_hash(&bytes)
}

#[test]
fn bundled_campaigns_have_expected_shape() {
    let catalog = campaigns();
    for faction in [Faction::Allies, Faction::Axis] {
        let campaign = catalog.campaign(faction);
        assert_eq!(campaign.len(), 5, "{faction}");
        let mut last = 0.0;
        for battle in campaign {
            assert!(battle.difficulty_multiplier > last, "{} not escalating", battle.id);
            last = battle.difficulty_multiplier;
            assert!(battle.routes_to_cut <= battle.route_capacity());
            assert!(!battle.allowed_enemies.is_empty());
        }
    }
    assert_eq!(catalog.battle(Faction::Allies, 2).unwrap().name, "Normandy");
    assert_eq!(catalog.battle(Faction::Axis, 4).unwrap().id, "A5");
    assert!(catalog.battle(Faction::Axis, 5).is_none());
}

#[test]
fn battle_records_use_camel_case_fields() {
    let json = serde_json::to_value(campaigns().battle(Faction::Allies, 0).unwrap()).unwrap();
    for key in ["difficultyMultiplier", "gridRows", "gridCols", "allowedEnemies", "routesToCut"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["allowedEnemies"][0], "INFANTRY");
}

#[test]
fn catalog_rejects_unreachable_objectives() {
    let json = r#"{
        "allies": [{ "id": "X1", "name": "Narrow", "difficultyMultiplier": 1.0,
                     "gridRows": 3, "gridCols": 2, "allowedEnemies": ["INFANTRY"],
                     "routesToCut": 2 }],
        "axis": [{ "id": "Y1", "name": "Fine", "difficultyMultiplier": 1.0,
                   "gridRows": 3, "gridCols": 4, "allowedEnemies": ["HEAVY"],
                   "routesToCut": 2 }]
    }"#;
    assert!(matches!(
        BattleCatalog::from_json(json),
        Err(CatalogError::RoutesUnreachable { .. })
    ));
    assert!(matches!(
        BattleCatalog::from_json("[]"),
        Err(CatalogError::Parse(_))
    ));
}

#[test]
fn seeded_maps_are_reproducible() {
    assert_eq!(map_digest(1944, Faction::Allies), map_digest(1944, Faction::Allies));
    assert_eq!(map_digest(1939, Faction::Axis), map_digest(1939, Faction::Axis));
    assert_ne!(map_digest(1944, Faction::Allies), map_digest(1945, Faction::Allies));
}

#[test]
fn grid_serializes_with_wire_names() {
    let mut rngs = RngBundle::from_user_seed(7);
    let battle = campaigns().battle(Faction::Axis, 3).unwrap();
    let field = generate_map(battle, rngs.map());
    let json = serde_json::to_value(&field.grid).unwrap();
    let cells = json["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 24);
    let first = &cells[0];
    assert_eq!(first["id"], "A1");
    assert!(first.get("enemyType").is_some());
    assert!(first.get("isDaubed").is_some());
    let specials: HashSet<_> = cells
        .iter()
        .filter_map(|cell| cell["special"].as_str())
        .collect();
    assert!(specials.contains("COMMS_TOWER"));
    assert!(specials.contains("SUPPLY_DROP"));
}

#[test]
fn default_config_round_trips_through_json() {
    let cfg = EngineConfig::default_config();
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(EngineConfig::from_json(&json).unwrap(), cfg);
    let partial = EngineConfig::from_json(r#"{ "tutorial_steps": 2 }"#).unwrap();
    assert_eq!(partial.tutorial_steps, 2);
    assert_eq!(partial.hand, cfg.hand);
}
