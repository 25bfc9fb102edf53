use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use u_hyperheur::class::HeuristicClassTag;
use u_hyperheur::profile::{HeuristicProfile, ProfileConfig};
use u_hyperheur::selection::SelectionPolicy;

fn primitive_tag() -> impl Strategy<Value = HeuristicClassTag> {
    prop::sample::select(HeuristicClassTag::PRIMITIVE.to_vec())
}

fn records() -> impl Strategy<Value = Vec<(HeuristicClassTag, bool)>> {
    prop::collection::vec((primitive_tag(), any::<bool>()), 0..200)
}

fn profile_config() -> impl Strategy<Value = ProfileConfig> {
    (0.01f64..=1.0, 0.0f64..5.0, 0.0f64..5.0).prop_map(|(decay, acc, imp)| {
        ProfileConfig::default()
            .with_decay(decay)
            .with_weights(acc, imp)
    })
}

proptest! {
    /// Property: attempts equals the sum of per-class counts and bounds accepted_count
    #[test]
    fn prop_profile_counters_consistent(config in profile_config(), history in records()) {
        let mut profile = HeuristicProfile::new(config);
        for &(tag, accepted) in &history {
            profile.record(tag, accepted);
        }

        let total: u64 = profile.per_class_count().iter().sum();
        prop_assert_eq!(profile.attempts(), total);
        prop_assert_eq!(profile.attempts(), history.len() as u64);
        prop_assert!(profile.accepted_count() <= profile.attempts());
        prop_assert_eq!(profile.class_count(HeuristicClassTag::ImprovingMoreOrEqual), 0);
        prop_assert!(profile.score() >= config.min_score);
    }

    /// Property: restoring saved counters reproduces score() exactly
    #[test]
    fn prop_profile_restore_reproduces_score(config in profile_config(), history in records()) {
        let mut profile = HeuristicProfile::new(config);
        for &(tag, accepted) in &history {
            profile.record(tag, accepted);
        }

        let restored = HeuristicProfile::from_parts(
            *profile.config(),
            profile.attempts(),
            profile.accepted_count(),
            profile.per_class_count(),
            profile.score(),
        ).unwrap();
        prop_assert_eq!(restored.score().to_bits(), profile.score().to_bits());
        prop_assert_eq!(&restored, &profile);
    }

    /// Property: epsilon-greedy with zero exploration always returns the
    /// lowest id among the highest scores
    #[test]
    fn prop_greedy_deterministic(
        histories in prop::collection::vec(records(), 1..8),
        seed in any::<u64>(),
    ) {
        let mut profiles = BTreeMap::new();
        for (id, history) in histories.iter().enumerate() {
            let mut profile = HeuristicProfile::default();
            for &(tag, accepted) in history {
                profile.record(tag, accepted);
            }
            profiles.insert(id, profile);
        }

        let best_score = profiles
            .values()
            .map(|p| p.score())
            .fold(f64::NEG_INFINITY, f64::max);
        let expected = profiles
            .iter()
            .find(|(_, p)| p.score() == best_score)
            .map(|(&id, _)| id)
            .unwrap();

        let policy = SelectionPolicy::EpsilonGreedy { exploration_rate: 0.0 };
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..10 {
            prop_assert_eq!(policy.select(&profiles, &mut rng).unwrap(), expected);
        }
    }

    /// Property: every selection policy returns a registered id
    #[test]
    fn prop_selection_returns_registered_id(
        ids in prop::collection::btree_set(0usize..1000, 1..20),
        seed in any::<u64>(),
        rate in 0.0f64..=1.0,
    ) {
        let profiles: BTreeMap<_, _> = ids
            .iter()
            .map(|&id| (id, HeuristicProfile::default()))
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        for policy in [
            SelectionPolicy::Uniform,
            SelectionPolicy::Roulette,
            SelectionPolicy::EpsilonGreedy { exploration_rate: rate },
        ] {
            let id = policy.select(&profiles, &mut rng).unwrap();
            prop_assert!(profiles.contains_key(&id));
        }
    }
}
