use fastrand::Rng;
use glam::Vec3;
use holo_tree::config::{Rgb, SceneConfig, SceneMode, PALETTES};
use holo_tree::scene::integrator::{
    advance_collection, advance_formation, blend_target, smoothing_factor, FrameInput, ObjectKind,
    phase_time, CALM_RATE, DIFFUSION, DRIFT_AMPLITUDE, FORMATION_SPIN_RATE, PHASE_PERIOD,
};
use holo_tree::scene::layout::{
    bells, cone_radius_at, explosion_direction, gallery_ring, gift_boxes, particles, TREE_HEIGHT,
    TREE_RADIUS,
};
use holo_tree::scene::Scene;
use holo_tree::signal::{Gesture, HandSignal};
use std::f32::consts::PI;

const C1: Rgb = Rgb::new(0x00, 0xf3, 0xff);
const C2: Rgb = Rgb::new(0xff, 0x00, 0xaa);

fn hand(gesture: Gesture) -> HandSignal {
    HandSignal {
        x: 0.5,
        y: 0.5,
        gesture,
        present: true,
    }
}

fn small_config(particles: usize) -> SceneConfig {
    SceneConfig::default()
        .with_particle_count(particles)
        .with_ornament_counts(0, 0)
        .with_panel_count(0)
}

fn input(dt: f32, mode: SceneMode, gesture: Gesture, beat: f32) -> FrameInput {
    FrameInput {
        dt,
        elapsed: 0.0,
        mode,
        hand: hand(gesture),
        beat,
    }
}

// ── layout ──────────────────────────────────────────────────────────────────

#[test]
fn formed_particles_stay_inside_the_cone() {
    let mut rng = Rng::with_seed(1);
    let c = particles(&mut rng, 20_000, C1, C2);
    assert_eq!(c.len(), 20_000);
    for p in c.formed() {
        assert!(p.y >= -TREE_HEIGHT / 2.0 && p.y <= TREE_HEIGHT / 2.0, "height out of range: {p}");
        let r = (p.x * p.x + p.z * p.z).sqrt();
        assert!(r <= cone_radius_at(p.y) + 1e-4, "{p} exceeds cone radius {}", cone_radius_at(p.y));
    }
}

#[test]
fn cone_radius_tapers_to_apex() {
    assert!((cone_radius_at(-TREE_HEIGHT / 2.0) - TREE_RADIUS).abs() < 1e-5);
    assert!(cone_radius_at(TREE_HEIGHT / 2.0).abs() < 1e-5);
    assert!((cone_radius_at(0.0) - TREE_RADIUS / 2.0).abs() < 1e-5);
}

#[test]
fn explosion_directions_are_unit_vectors() {
    let mut rng = Rng::with_seed(2);
    for _ in 0..5_000 {
        let d = explosion_direction(&mut rng);
        assert!(d.is_finite());
        assert!((d.length() - 1.0).abs() < 1e-4, "not unit: {d}");
    }
    let c = gift_boxes(&mut rng, 500, C1, C2);
    assert!(c.explosion().iter().all(|d| (d.length() - 1.0).abs() < 1e-4));
}

#[test]
fn particle_colours_split_eighty_twenty() {
    let mut rng = Rng::with_seed(3);
    let c = particles(&mut rng, 20_000, C1, C2);
    let accents = c.colors().iter().filter(|&&col| col == C2).count();
    let primaries = c.colors().iter().filter(|&&col| col == C1).count();
    assert_eq!(accents + primaries, 20_000, "particles must never blend colours");
    let share = accents as f32 / 20_000.0;
    assert!((share - 0.2).abs() < 0.02, "accent share {share}");
}

#[test]
fn gift_boxes_split_evenly_with_scales_in_range() {
    let mut rng = Rng::with_seed(4);
    let c = gift_boxes(&mut rng, 10_000, C1, C2);
    let first = c.colors().iter().filter(|&&col| col == C1).count() as f32 / 10_000.0;
    assert!((first - 0.5).abs() < 0.03, "box colour share {first}");
    assert!(c.base_scales().iter().all(|&s| (0.2..0.5).contains(&s)));
    assert!(c
        .rotation_phases()
        .iter()
        .all(|p| [p.x, p.y, p.z].iter().all(|a| (0.0..PI).contains(a))));
    assert_eq!(c.kind(), ObjectKind::GiftBox);
}

#[test]
fn bells_share_one_colour() {
    let mut rng = Rng::with_seed(5);
    let gold = Rgb::new(0xff, 0xd7, 0x00);
    let c = bells(&mut rng, 1_000, gold);
    assert!(c.colors().iter().all(|&col| col == gold));
    assert!(c.base_scales().iter().all(|&s| (0.2..0.4).contains(&s)));
}

#[test]
fn objects_start_at_their_formed_position() {
    let mut rng = Rng::with_seed(6);
    let c = particles(&mut rng, 100, C1, C2);
    assert_eq!(c.positions(), c.formed());
}

#[test]
fn gallery_ring_spaces_panels_by_index() {
    let mut rng = Rng::with_seed(7);
    let seeds = gallery_ring(&mut rng, 4);
    assert_eq!(seeds.len(), 4);
    for (i, s) in seeds.iter().enumerate() {
        let a = i as f32 / 4.0 * std::f32::consts::TAU;
        assert!((s.position.x - a.sin() * 8.0).abs() < 1e-4);
        assert!((s.position.z - a.cos() * 8.0).abs() < 1e-4);
        assert!(s.position.y >= -4.0 && s.position.y < 4.0);
        assert!((s.rotation.y - (a + PI)).abs() < 1e-5);
    }
}

#[test]
fn same_seed_same_layout() {
    let a = particles(&mut Rng::with_seed(9), 50, C1, C2);
    let b = particles(&mut Rng::with_seed(9), 50, C1, C2);
    assert_eq!(a.formed(), b.formed());
    assert_eq!(a.scattered(), b.scattered());
    assert_eq!(a.colors(), b.colors());
}

// ── integrator ──────────────────────────────────────────────────────────────

#[test]
fn smoothing_factor_is_clamped() {
    assert_eq!(smoothing_factor(0.0, 2.0), 0.0);
    assert_eq!(smoothing_factor(-1.0, 2.0), 0.0);
    assert_eq!(smoothing_factor(f32::NAN, 2.0), 0.0);
    assert_eq!(smoothing_factor(10.0, 2.0), 1.0);
    assert!((smoothing_factor(0.25, 2.0) - 0.5).abs() < 1e-6);
}

#[test]
fn blend_target_adds_explosion_only_while_shattering() {
    let f = Vec3::new(1.0, 2.0, 3.0);
    let s = Vec3::new(-4.0, 0.0, 4.0);
    let e = Vec3::X;
    assert_eq!(blend_target(f, s, e, SceneMode::Formed, false, 1.0), f);
    assert_eq!(blend_target(f, s, e, SceneMode::Scattered, false, 1.0), s);
    let shattered = blend_target(f, s, e, SceneMode::Formed, true, 1.0);
    assert!((shattered - (f + e * DIFFUSION * 1.5)).length() < 1e-5);
}

#[test]
fn zero_dt_does_not_move_anything() {
    let mut scene = Scene::new(small_config(3), SceneMode::Formed, Some(11));
    let before = scene.particles().positions().to_vec();
    let spin = scene.spin();

    scene.step(0.0, HandSignal::absent(), 0.0);

    assert_eq!(scene.particles().positions(), before.as_slice());
    assert_eq!(scene.spin(), spin);
    assert_eq!(scene.particles().scales(), scene.particles().base_scales());
}

#[test]
fn positions_converge_monotonically() {
    let mut rng = Rng::with_seed(12);
    let mut c = particles(&mut rng, 200, C1, C2);
    let frame = input(1.0 / 60.0, SceneMode::Scattered, Gesture::Hover, 0.0);

    let dist = |c: &holo_tree::scene::integrator::Collection| -> Vec<f32> {
        c.positions()
            .iter()
            .zip(c.scattered())
            .map(|(p, t)| p.distance(*t))
            .collect()
    };

    let mut prev = dist(&c);
    for _ in 0..2_000 {
        advance_collection(&mut c, &frame);
        let next = dist(&c);
        let mut all_close = true;
        for (i, (&a, &b)) in prev.iter().zip(&next).enumerate() {
            if a > 1e-3 {
                all_close = false;
                assert!(b < a, "object {i} did not move closer: {a} -> {b}");
            }
        }
        prev = next;
        if all_close {
            return;
        }
    }
    panic!("positions did not converge");
}

#[test]
fn long_frame_snaps_to_target_without_overshoot() {
    let mut rng = Rng::with_seed(13);
    let mut c = particles(&mut rng, 50, C1, C2);
    advance_collection(&mut c, &input(5.0, SceneMode::Scattered, Gesture::Idle, 0.0));
    for (p, t) in c.positions().iter().zip(c.scattered()) {
        assert!(p.distance(*t) < 1e-4);
    }
}

#[test]
fn open_hand_shatters_with_beat() {
    let mut rng = Rng::with_seed(14);
    let mut c = particles(&mut rng, 50, C1, C2);
    // dt * SHATTER_RATE >= 1 lands exactly on the target.
    advance_collection(&mut c, &input(1.0, SceneMode::Formed, Gesture::Open, 1.0));
    for i in 0..c.len() {
        let want = c.formed()[i] + c.explosion()[i] * DIFFUSION * 1.5;
        assert!(c.positions()[i].distance(want) < 1e-4);
        assert!((c.scales()[i] - c.base_scales()[i] * 1.5).abs() < 1e-6);
    }
}

#[test]
fn pinch_also_shatters() {
    assert!(input(0.1, SceneMode::Formed, Gesture::Pinch, 0.0).is_shattering());
    assert!(!input(0.1, SceneMode::Formed, Gesture::Hover, 0.0).is_shattering());
    assert!(!input(0.1, SceneMode::Formed, Gesture::Idle, 0.0).is_shattering());
}

#[test]
fn mode_flip_bends_trajectory_without_reset() {
    let mut scene = Scene::new(small_config(20), SceneMode::Formed, Some(15));
    for _ in 0..10 {
        scene.step(1.0 / 60.0, hand(Gesture::Open), 0.0);
    }
    let before = scene.particles().positions().to_vec();

    scene.set_mode(SceneMode::Scattered);
    let dt = 1.0 / 60.0;
    scene.step(dt, HandSignal::absent(), 0.0);

    let alpha = smoothing_factor(dt, CALM_RATE);
    let c = scene.particles();
    for i in 0..c.len() {
        let target = c.scattered()[i];
        let want = before[i] + (target - before[i]) * alpha;
        assert!(c.positions()[i].distance(want) < 1e-4, "object {i} did not continue from where it was");
        assert!(c.positions()[i].distance(target) < before[i].distance(target));
    }
}

#[test]
fn ornaments_spin_particles_do_not() {
    let mut rng = Rng::with_seed(16);
    let mut boxes = gift_boxes(&mut rng, 10, C1, C2);
    let mut bell = bells(&mut rng, 10, C1);
    let mut parts = particles(&mut rng, 10, C1, C2);
    let mut frame = input(0.1, SceneMode::Formed, Gesture::Idle, 0.0);
    frame.elapsed = 10.0;
    advance_collection(&mut boxes, &frame);
    advance_collection(&mut bell, &frame);
    advance_collection(&mut parts, &frame);

    for i in 0..10 {
        let d = boxes.orientations()[i] - boxes.rotation_phases()[i];
        assert!((d - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-4);
        let d = bell.orientations()[i] - bell.rotation_phases()[i];
        assert!((d - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
        assert_eq!(parts.orientations()[i], parts.rotation_phases()[i]);
    }
}

#[test]
fn scattered_particles_drift_only_on_display() {
    let mut rng = Rng::with_seed(17);
    let c = particles(&mut rng, 10, C1, C2);
    for i in 0..c.len() {
        let p = c.positions()[i];
        let calm = c.display_position(i, SceneMode::Scattered, false, 3.0);
        assert!(calm.distance(p) <= DRIFT_AMPLITUDE * 2f32.sqrt() + 1e-6);
        assert_eq!(c.display_position(i, SceneMode::Formed, false, 3.0), p);
        assert_eq!(c.display_position(i, SceneMode::Scattered, true, 3.0), p);
    }
}

#[test]
fn formation_spins_only_while_formed() {
    let mut spin = 0.0;
    advance_formation(&mut spin, &input(0.5, SceneMode::Formed, Gesture::Idle, 0.0));
    assert!((spin - 0.5 * FORMATION_SPIN_RATE).abs() < 1e-6);
    advance_formation(&mut spin, &input(0.5, SceneMode::Scattered, Gesture::Idle, 0.0));
    assert!((spin - 0.5 * FORMATION_SPIN_RATE).abs() < 1e-6);

    let mut scene = Scene::new(small_config(1), SceneMode::Scattered, Some(1));
    scene.step(1.0, HandSignal::absent(), 0.0);
    assert_eq!(scene.spin(), 0.0);
    assert_eq!(scene.toggle_mode(), SceneMode::Formed);
    scene.step(1.0, HandSignal::absent(), 0.0);
    assert!((scene.spin() - FORMATION_SPIN_RATE).abs() < 1e-6);
}

#[test]
fn non_finite_inputs_are_ignored() {
    let mut scene = Scene::new(small_config(10), SceneMode::Formed, Some(18));
    scene.step(f32::NAN, hand(Gesture::Open), f32::INFINITY);
    assert!(scene.particles().positions().iter().all(|p| p.is_finite()));
    assert_eq!(scene.elapsed(), 0.0);
    assert_eq!(scene.beat(), 0.0);
}

#[test]
fn phase_period_holds_every_periodic_rate() {
    // Ornament spins, drift, bob and the panel ring all complete whole turns.
    for rate in [
        ObjectKind::GiftBox.spin().x as f64,
        ObjectKind::Bell.spin().y as f64,
        0.5,
        1.0,
    ] {
        let turns = rate * PHASE_PERIOD / std::f64::consts::TAU;
        assert!((turns - turns.round()).abs() < 1e-5, "rate {rate}: {turns} turns");
    }
    assert_eq!(phase_time(0.0), 0.0);
    assert!((phase_time(PHASE_PERIOD + 1.0) - 1.0).abs() < 1e-4);
}

#[test]
fn long_uptime_keeps_frame_steps_precise() {
    let mut scene = Scene::new(small_config(1), SceneMode::Formed, Some(21));
    // Three days of running.
    scene.step(259_200.0, HandSignal::absent(), 0.0);
    let before = scene.elapsed();
    assert!(before >= 0.0 && (before as f64) < PHASE_PERIOD);

    scene.step(0.016, HandSignal::absent(), 0.0);
    let step = scene.elapsed() - before;
    assert!((step - 0.016).abs() < 1e-4, "frame step came out as {step}");
    assert!((scene.uptime() - 259_200.016).abs() < 1e-3);
}

// ── regeneration ────────────────────────────────────────────────────────────

#[test]
fn count_change_regenerates_only_that_collection() {
    let cfg = SceneConfig::default()
        .with_particle_count(100)
        .with_ornament_counts(20, 20)
        .with_panel_count(4);
    let mut scene = Scene::new(cfg, SceneMode::Scattered, Some(19));
    let boxes = scene.boxes().formed().to_vec();
    let bells = scene.bells().formed().to_vec();

    scene.apply_config(cfg.with_particle_count(300));

    assert_eq!(scene.particles().len(), 300);
    assert_eq!(scene.boxes().formed(), boxes.as_slice());
    assert_eq!(scene.bells().formed(), bells.as_slice());
    assert_eq!(scene.mode(), SceneMode::Scattered, "regeneration must not touch the mode");
    assert_eq!(scene.config().particle_count, 300);
}

#[test]
fn palette_change_recolours_collections() {
    let mut scene = Scene::new(small_config(50).with_ornament_counts(10, 10), SceneMode::Formed, Some(20));
    let next = scene.config().with_palette(PALETTES[1]);
    scene.apply_config(next);
    let (p1, p2) = PALETTES[1].particles;
    assert!(scene.particles().colors().iter().all(|&c| c == p1 || c == p2));
    assert!(scene.bells().colors().iter().all(|&c| c == PALETTES[1].bell));
}

#[test]
fn unchanged_config_keeps_positions() {
    let cfg = small_config(30);
    let mut scene = Scene::new(cfg, SceneMode::Scattered, Some(21));
    scene.step(0.1, HandSignal::absent(), 0.0);
    let moved = scene.particles().positions().to_vec();
    scene.apply_config(cfg);
    assert_eq!(scene.particles().positions(), moved.as_slice());
}

#[test]
fn empty_collections_are_fine() {
    let mut scene = Scene::new(small_config(0), SceneMode::Formed, None);
    scene.step(0.1, hand(Gesture::Pinch), 0.5);
    assert!(scene.particles().is_empty());
    assert!(scene.gallery().is_empty());
    assert_eq!(scene.interaction().grabbed, None);
}
