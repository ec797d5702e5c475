use proptest::prelude::*;

use hoops_projector::enhance::{Compound, MULTIPLIER_CAP};
use hoops_projector::game_script::{AGGREGATE_CONFIDENCE, GameScript};
use hoops_projector::impact::classify;
use hoops_projector::injury::{InjuryStatus, expected_stat};
use hoops_projector::injury_report::parse_report;
use hoops_projector::model::{
    InjuryRecord, PlayerStatLine, StatFactors, TeamSchedule, TeamStatProfile,
};
use hoops_projector::scoring::{PaceConfidence, project_possessions};
use hoops_projector::teammates::{project_teammate, select_driver};

fn empty_script() -> GameScript {
    GameScript {
        battles: Vec::new(),
        insights: Vec::new(),
        confidence: AGGREGATE_CONFIDENCE,
    }
}

fn status_strategy() -> impl Strategy<Value = InjuryStatus> {
    prop_oneof![
        Just(InjuryStatus::Out),
        Just(InjuryStatus::Doubtful),
        Just(InjuryStatus::Questionable),
        Just(InjuryStatus::Probable),
        Just(InjuryStatus::Available),
    ]
}

proptest! {
    #[test]
    fn capped_compound_stays_in_band(factors in prop::collection::vec(0.8f64..1.3, 0..12)) {
        let mut acc = Compound::default();
        for f in &factors {
            acc.absorb(&StatFactors {
                points: Some(*f),
                assists: Some(*f * 0.98),
                rebounds: None,
                three_pointers: Some(2.0 - *f),
            });
        }
        let capped = acc.capped();
        for v in [capped.points, capped.assists, capped.rebounds, capped.three_pointers] {
            prop_assert!((1.0..=MULTIPLIER_CAP).contains(&v));
        }
    }

    #[test]
    fn injury_expectation_matches_table(base in 0.0f64..60.0, status in status_strategy()) {
        let a = status.availability();
        let expected = expected_stat(base, status);
        prop_assert!((expected - base * a.play_probability * a.effectiveness).abs() < 1e-9);
        if status == InjuryStatus::Out {
            prop_assert_eq!(expected, 0.0);
        }
    }

    #[test]
    fn scenarios_sum_to_one(
        star_pts in 20.0f64..40.0,
        mate_pts in 0.0f64..30.0,
        mate_reb in 0.0f64..15.0,
        uncertain in prop_oneof![Just(InjuryStatus::Questionable), Just(InjuryStatus::Doubtful)],
    ) {
        let star = classify(&PlayerStatLine { name: "Star Player".into(), points: star_pts, rebounds: 8.0, assists: 6.0, ..Default::default() });
        let mate = classify(&PlayerStatLine { name: "Role Player".into(), points: mate_pts, rebounds: mate_reb, assists: 2.0, ..Default::default() });
        let injuries = vec![InjuryRecord {
            team: "Team".into(),
            player_name: "Star Player".into(),
            status: uncertain,
            description: String::new(),
            source: "prop".into(),
        }];
        let driver = select_driver(&[star, mate.clone()], &injuries);
        prop_assert!(driver.is_some());
        let proj = project_teammate(&mate, driver.as_ref());
        let total: f64 = proj.scenarios.iter().map(|s| s.probability).sum();
        prop_assert!((total - 1.0).abs() < 1e-12);
        let weighted: f64 = proj.scenarios.iter().map(|s| s.probability * s.points).sum();
        prop_assert!((weighted - proj.points).abs() < 1e-9);
    }

    #[test]
    fn possessions_are_clamped(
        pace in 60.0f64..140.0,
        tov in 5.0f64..25.0,
        opp_tov in 5.0f64..25.0,
        oreb in 0.0f64..20.0,
        b2b in any::<bool>(),
        rest in 0u32..6,
    ) {
        let mut team = TeamStatProfile::named("A");
        team.general.turnovers = tov;
        team.general.offensive_rebounds = oreb;
        let mut opp = TeamStatProfile::named("B");
        opp.general.turnovers = opp_tov;
        let schedule = TeamSchedule { back_to_back: b2b, rest_days: rest };
        let mut reasons = Vec::new();
        let poss = project_possessions(pace, &team, &opp, Some(&schedule), &empty_script(), &mut reasons);
        prop_assert!((85.0..=115.0).contains(&poss));
    }

    #[test]
    fn pace_confidence_is_monotonic(a in 0u8..6, b in 0u8..6) {
        if a <= b {
            prop_assert!(PaceConfidence::from_layers(a) <= PaceConfidence::from_layers(b));
        }
    }

    #[test]
    fn parser_is_deterministic_and_valid(lines in prop::collection::vec("[A-Za-z ,.]{0,40}", 0..12), team_first in any::<bool>()) {
        let mut text = String::new();
        if team_first {
            text.push_str("Boston Celtics Tatum, Jayson Questionable Knee\n");
        }
        for line in &lines {
            text.push_str(line);
            text.push('\n');
        }
        let first = parse_report(&text);
        prop_assert_eq!(&first, &parse_report(&text));
        for record in &first.records {
            prop_assert!(!record.team.is_empty());
            prop_assert!(record.status != InjuryStatus::Unrecognized);
            let tokens = record.player_name.split_whitespace().count();
            prop_assert!(tokens >= 2 || record.player_name.contains("Jr") || record.player_name.contains("Sr"));
        }
    }
}
