use chaintally_engine::{
    AgeMode, ChainDuration, ChainSession, MilestoneRule, RewardConfig, classify_purchases,
    tally_milestones,
};
use std::collections::BTreeMap;

/// A four-jump chain with a supplement, a companion, both alt-form
/// spellings, a temporary item, and mixed id types. Mirrors what a real
/// export looks like after a few edits by hand.
const CHAIN: &str = r#"{
    "jumps": {
        "10": {"name": "Gauntlet of Ash", "duration": {"years": 1}},
        "11": {"name": "Starfall Academy", "duration": {"months": 6}, "characters": ["1"]},
        "12": {"name": "Academy Dormitories", "parentJump": "11", "duration": {"years": 2}, "characters": ["1"]},
        "13": {"name": "Iron Frontier", "duration": {"years": 2, "months": 7, "days": 45}, "characters": [1]}
    },
    "characters": {
        "0": {"name": "Jumper", "originalAge": 23},
        "1": {"name": "Alya", "originalAge": "19"}
    },
    "purchases": {
        "p1": {"_characterId": "0", "_jumpId": "10", "_type": 1},
        "p2": {"_characterId": 0, "_jumpId": 10, "_type": 1},
        "p3": {"_characterId": "0", "_jumpId": "10", "_type": 1},
        "p4": {"_characterId": "0", "_jumpId": "10", "_type": 1, "duration": 1},
        "p5": {"_characterId": "0", "_jumpId": "13", "_type": 1},
        "p6": {"_characterId": "0", "_jumpId": "13", "_type": 1},
        "p7": {"_characterId": "0", "_jumpId": "11", "_type": 3},
        "p8": {"_characterId": "0", "_jumpId": "11", "_type": 3},
        "p9": {"_characterId": "0", "_jumpId": "10", "_type": 2},
        "p10": {"_characterId": "1", "_jumpId": "11", "_type": 1}
    },
    "altforms": {
        "af1": {"characterId": "0", "jumpId": "11", "name": "Moonlit Wolf"},
        "af2": {"characterId": "0", "jumpId": "13", "name": "Stormborn Drake"},
        "af3": {"characterId": "1", "jumpId": "11", "name": "Ember Fox"}
    },
    "jumpList": ["10", "11", "12", "13"]
}"#;

fn session() -> ChainSession {
    ChainSession::from_json(CHAIN).expect("fixture parses")
}

#[test]
fn milestones_accumulate_across_the_whole_chain() {
    let mut session = session();
    session.set_override("11", 4);
    let report = session.milestone_report().expect("default rules are valid");

    assert!(report.declared_order);
    assert_eq!(report.character_id, "0");
    assert_eq!(report.rows.len(), 4);

    let names: Vec<&str> = report.rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Gauntlet of Ash",
            "Starfall Academy",
            "Academy Dormitories",
            "Iron Frontier"
        ]
    );
    let sequence: Vec<Option<u32>> = report.rows.iter().map(|row| row.sequence).collect();
    assert_eq!(sequence, [Some(1), Some(2), None, Some(3)]);

    // Items: 3 permanent in jump 10 (the temporary one does not count),
    // 2 more in jump 13 cross the 5-item threshold there.
    let item_counts: Vec<u64> = report.rows.iter().map(|row| row.items.count).collect();
    assert_eq!(item_counts, [3, 0, 0, 2]);
    let item_pt: Vec<u64> = report.rows.iter().map(|row| row.items.pt).collect();
    assert_eq!(item_pt, [0, 0, 0, 2]);

    // Alt-forms come from the dedicated records; the category-2 purchase
    // in jump 10 is ignored.
    let alt_counts: Vec<u64> = report.rows.iter().map(|row| row.alt_forms.count).collect();
    assert_eq!(alt_counts, [0, 1, 0, 1]);
    let alt_pt: Vec<u64> = report.rows.iter().map(|row| row.alt_forms.pt).collect();
    assert_eq!(alt_pt, [0, 0, 0, 1]);

    // Two drawbacks never reach the 10-drawback threshold.
    assert_eq!(report.totals.drawbacks.count, 2);
    assert_eq!(report.totals.drawbacks.pt, 0);

    // The manual extermination count lands on jump 11 and pays there.
    assert_eq!(report.rows[1].exterminations.count, 4);
    assert_eq!(report.rows[1].exterminations.pt, 2);

    let row_pt: Vec<u64> = report.rows.iter().map(|row| row.pt).collect();
    assert_eq!(row_pt, [0, 2, 0, 3]);
    let running: Vec<u64> = report.rows.iter().map(|row| row.pt_to_date).collect();
    assert_eq!(running, [0, 2, 2, 5]);
    assert_eq!(report.totals.pt, 5);
}

#[test]
fn recomputing_reports_is_idempotent() {
    let mut session = session();
    session.set_override("11", 4);
    let first = session.milestone_report().unwrap();
    let second = session.milestone_report().unwrap();
    assert_eq!(first, second, "recomputes must not double-count");
}

#[test]
fn jumper_age_accumulates_every_primary_jump() {
    let session = session();
    let trajectory = session.age_report(AgeMode::Participation);

    // 1 year + 6 months + (2y 7m 45d), supplement excluded, on top of 23.
    assert_eq!(trajectory.summary.duration, ChainDuration::new(4, 2, 15.0));
    assert_eq!(trajectory.summary.age, ChainDuration::new(27, 2, 15.0));
    assert_eq!(
        trajectory.summary.age_text.verbose_clean,
        "27 years, 2 months, 15 days"
    );
    assert_eq!(trajectory.summary.source_jump.as_deref(), Some("13"));
    assert!(!trajectory.rows["12"].included);
}

#[test]
fn companion_age_differs_by_mode() {
    let mut session = session();
    session.select_character("1");

    let participation = session.age_report(AgeMode::Participation);
    assert!(!participation.rows["10"].included);
    assert_eq!(participation.summary.age, ChainDuration::new(22, 2, 15.0));

    let continuous = session.age_report(AgeMode::Continuous);
    assert!(!continuous.rows["10"].included, "jump 10 precedes Alya");
    assert!(continuous.rows["11"].included);
    assert!(continuous.rows["13"].included);
    assert_eq!(continuous.summary.age, ChainDuration::new(22, 2, 15.0));
}

#[test]
fn supplement_toggle_extends_companion_timelines() {
    let mut session = session();
    session.select_character("1");
    session.set_include_supplements(true);
    let trajectory = session.age_report(AgeMode::Participation);
    assert!(trajectory.rows["12"].included);
    assert_eq!(trajectory.summary.age, ChainDuration::new(24, 2, 15.0));
}

#[test]
fn switching_characters_reclassifies_purchases() {
    let mut session = session();
    assert_eq!(session.tallies().get("10").items, 3);

    session.select_character("1");
    let report = session.milestone_report().unwrap();
    assert_eq!(report.character_id, "1");
    assert_eq!(report.rows[1].items.count, 1, "p10 belongs to Alya");
    assert_eq!(report.rows[1].alt_forms.count, 1, "af3 belongs to Alya");
    assert_eq!(report.rows[0].items.count, 0);
}

#[test]
fn custom_rules_change_payouts_without_touching_counts() {
    let save = chaintally_engine::ChainSave::from_json(CHAIN).unwrap();
    let tallies = classify_purchases(&save, "0");
    let config = RewardConfig {
        items: MilestoneRule::new(1, 1),
        ..RewardConfig::default()
    };
    let report = tally_milestones(&save, &tallies, &config, &BTreeMap::new()).unwrap();

    let item_pt: Vec<u64> = report.rows.iter().map(|row| row.items.pt).collect();
    assert_eq!(item_pt, [3, 0, 0, 2], "1 PT per item pays immediately");
    let item_counts: Vec<u64> = report.rows.iter().map(|row| row.items.count).collect();
    assert_eq!(item_counts, [3, 0, 0, 2]);
}
