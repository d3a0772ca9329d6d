use fishtank_core::{BehaviorKind, CreatureId, PopulationConfig, SimulationConfig, Vec2};
use fishtank_world::{CreatureSpec, Simulation};
use proptest::prelude::*;

fn stocked(seed: u64, width: i32, height: i32, goldfish: usize) -> Simulation {
    let mut config = SimulationConfig::empty(width, height);
    config.seed = seed;
    config.population = vec![PopulationConfig {
        species: "goldfish".into(),
        count: goldfish,
    }];
    Simulation::new(config).unwrap()
}

/// An add or remove issued between ticks
#[derive(Debug, Clone)]
enum Edit {
    Add { x: f64, y: f64 },
    Spawn,
    RemoveOldest,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0.0f64..=29.0, 0.0f64..=11.0).prop_map(|(x, y)| Edit::Add { x, y }),
        Just(Edit::Spawn),
        Just(Edit::RemoveOldest),
    ]
}

fn apply(sim: &mut Simulation, edit: &Edit) {
    match edit {
        Edit::Add { x, y } => {
            sim.add_creature(CreatureSpec::new("minnow", Vec2::new(*x, *y)))
                .unwrap();
        }
        Edit::Spawn => {
            sim.spawn("loach").unwrap();
        }
        Edit::RemoveOldest => {
            let oldest = sim.creatures().next().map(|c| c.id);
            if let Some(id) = oldest {
                sim.remove_creature(id).unwrap();
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn creatures_never_leave_the_tank(
        seed in any::<u64>(),
        width in 1i32..40,
        height in 1i32..20,
        count in 0usize..8,
    ) {
        let mut sim = stocked(seed, width, height, count);
        for _ in 0..60 {
            sim.advance().unwrap();
            for creature in sim.creatures() {
                let p = creature.position;
                prop_assert!(p.x >= 0.0 && p.x < f64::from(width), "x = {}", p.x);
                prop_assert!(p.y >= 0.0 && p.y < f64::from(height), "y = {}", p.y);

                let max_speed = sim.catalog().get(&creature.species).unwrap().max_speed;
                let speed = creature.heading.length();
                prop_assert!(speed <= max_speed + 1e-9, "heading length {}", speed);
            }
        }
    }

    #[test]
    fn same_seed_gives_identical_frames(seed in any::<u64>(), food_column in 0i32..30) {
        let mut a = stocked(seed, 30, 12, 6);
        let mut b = stocked(seed, 30, 12, 6);
        a.drop_food(food_column).unwrap();
        b.drop_food(food_column).unwrap();

        for _ in 0..100 {
            prop_assert_eq!(a.advance().unwrap(), b.advance().unwrap());
        }
    }

    #[test]
    fn same_edits_give_identical_runs(
        seed in any::<u64>(),
        edits in prop::collection::vec(prop::option::of(edit_strategy()), 60),
    ) {
        let mut a = stocked(seed, 30, 12, 4);
        let mut b = stocked(seed, 30, 12, 4);

        for edit in &edits {
            if let Some(edit) = edit {
                apply(&mut a, edit);
                apply(&mut b, edit);
            }
            prop_assert_eq!(a.advance().unwrap(), b.advance().unwrap());
        }
        prop_assert_eq!(a.snapshot(), b.snapshot());

        for creature in a.creatures() {
            let max_speed = a.catalog().get(&creature.species).unwrap().max_speed;
            prop_assert!(creature.heading.length() <= max_speed + 1e-9);
        }
    }

    #[test]
    fn wall_hit_clamps_and_reflects(
        width in 2i32..40,
        height in 1i32..20,
        row in 0usize..20,
        vx in 0.1f64..=1.0,
    ) {
        let mut sim = stocked(0, width, height, 0);
        let y = (row % height as usize) as f64;
        let x = f64::from(width - 1);
        let id = sim
            .add_creature(
                CreatureSpec::new("goldfish", Vec2::new(x, y)).with_heading(Vec2::new(vx, 0.0)),
            )
            .unwrap();

        sim.advance().unwrap();

        let fish = sim.creature(id).unwrap();
        prop_assert_eq!(fish.position, Vec2::new(x, y));
        prop_assert!((fish.heading.x + vx).abs() < 1e-12);
        prop_assert_eq!(fish.heading.y, 0.0);
        prop_assert_eq!(fish.kind(), BehaviorKind::Startled);
    }

    #[test]
    fn every_frame_covers_the_tank(
        seed in any::<u64>(),
        width in 1i32..30,
        height in 1i32..15,
        count in 0usize..10,
        ticks in 0usize..20,
    ) {
        let mut sim = stocked(seed, width, height, count);
        sim.drop_food(0).unwrap();
        let mut frame = sim.frame().unwrap();
        for _ in 0..ticks {
            frame = sim.advance().unwrap();
        }

        prop_assert_eq!(frame.width(), width as usize);
        prop_assert_eq!(frame.height(), height as usize);
        prop_assert_eq!(frame.cells().len(), (width * height) as usize);
        for cell in frame.cells() {
            prop_assert!(["o", "#", " "].contains(&cell.glyph.as_str()), "cell {:?}", cell);
        }
    }

    #[test]
    fn add_then_remove_is_invisible(
        seed in any::<u64>(),
        x in 0.0f64..=29.0,
        y in 0.0f64..=11.0,
        warmup in 0usize..30,
    ) {
        let mut sim = stocked(seed, 30, 12, 5);
        for _ in 0..warmup {
            sim.advance().unwrap();
        }
        let mut twin = sim.clone();

        let id = twin
            .add_creature(CreatureSpec::new("minnow", Vec2::new(x, y)).with_id(CreatureId(99)))
            .unwrap();
        twin.remove_creature(id).unwrap();

        prop_assert_eq!(twin.snapshot(), sim.snapshot());
        prop_assert_eq!(twin.frame().unwrap(), sim.frame().unwrap());
        for _ in 0..10 {
            prop_assert_eq!(twin.advance().unwrap(), sim.advance().unwrap());
        }
    }
}

#[test]
fn long_run_visits_every_behavior() {
    let mut sim = stocked(2024, 20, 10, 6);
    for _ in 0..10_000 {
        sim.advance().unwrap();
    }

    let stats = sim.stats();
    for kind in BehaviorKind::all() {
        assert!(stats.observed(kind), "{} never observed", kind);
    }
    assert!(stats.observed_all());
    assert_eq!(stats.ticks, 10_000);
    assert_eq!(stats.census.total(), 60_000);
}

#[test]
fn overlapping_creatures_draw_lowest_id() {
    let mut sim = stocked(0, 10, 5, 0);
    let low = CreatureSpec::new("goldfish", Vec2::new(4.0, 2.0))
        .with_id(CreatureId(3))
        .with_heading(Vec2::new(0.0, 0.0));
    let high = CreatureSpec::new("minnow", Vec2::new(4.2, 2.1))
        .with_id(CreatureId(7))
        .with_heading(Vec2::new(1.0, 0.0));
    sim.add_creature(high).unwrap();
    sim.add_creature(low).unwrap();

    let frame = sim.frame().unwrap();
    assert_eq!(frame.get(4, 2).unwrap().glyph, "o");
    assert_eq!(frame.iter().filter(|(_, c)| c.glyph != " ").count(), 1);
}
