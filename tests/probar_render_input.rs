//! Rendering and user-input merging against full simulations.

use goalsim::config::Tolerances;
use goalsim::input::{add_user_input_to_scene, MergeOptions};
use goalsim::prelude::*;
use goalsim::render::{featurize_scene, render_bodies, render_scene, OBJECT_FEATURE_SIZE};
use goalsim::scene::task::SpatialRelationship;
use goalsim::scene::{
    build_box, build_circle, CircleWithPosition, Scene, UserInputStatus, Vec2,
};

#[test]
fn simple_box_rendering() {
    // Expected image (dots = 0), origin at the bottom-left corner:
    //  ......
    //  ......
    //  ......
    //  .11...
    //  .11...
    //  .11...
    //  ......
    let bodies = vec![build_box(1.0, 1.0, 2.0, 3.0, 0.0, false)];
    let image = render_bodies(&bodies, 7, 6);
    for y in 0..7 {
        for x in 0..6 {
            let inside = (x == 1 || x == 2) && (1..=3).contains(&y);
            assert_eq!(
                image.get(x, y),
                u8::from(inside),
                "mismatch at position ({x}, {y})"
            );
        }
    }
}

#[test]
fn simple_box_rendering_as_user_body() {
    // The same box merged as user input renders identically.
    let scene = Scene::new(6, 7);
    let input = UserInput {
        polygons: vec![goalsim::scene::AbsoluteConvexPolygon {
            vertices: vec![
                Vec2::new(1.0, 1.0),
                Vec2::new(3.0, 1.0),
                Vec2::new(3.0, 4.0),
                Vec2::new(1.0, 4.0),
            ],
        }],
        ..UserInput::default()
    };
    let merged = add_user_input_to_scene(
        &scene,
        &input,
        MergeOptions::default(),
        &Tolerances::default(),
    )
    .unwrap();
    assert_eq!(merged.user_input_status, UserInputStatus::NoOcclusions);

    let image = render_scene(&merged);
    for y in 0..7 {
        for x in 0..6 {
            let inside = (x == 1 || x == 2) && (1..=3).contains(&y);
            assert_eq!(
                image.get(x, y),
                u8::from(inside),
                "mismatch at position ({x}, {y})"
            );
        }
    }
}

#[test]
fn merged_ball_participates_in_simulation() {
    // A user ball dropped above a static floor must fall and land on it.
    let mut scene = Scene::new(128, 128);
    scene.bodies.push(build_box(0.0, 0.0, 100.0, 4.0, 0.0, false));

    let input = UserInput {
        balls: vec![CircleWithPosition {
            position: Vec2::new(50.0, 60.0),
            radius: 3.0,
        }],
        ..UserInput::default()
    };
    let merged = add_user_input_to_scene(
        &scene,
        &input,
        MergeOptions::default(),
        &Tolerances::default(),
    )
    .unwrap();
    assert_eq!(merged.user_input_status, UserInputStatus::NoOcclusions);
    assert_eq!(merged.user_input_bodies.len(), 1);

    let scenes = simulate_scene(&merged, 300).unwrap();
    let last = scenes.last().unwrap();
    let ball = &last.user_input_bodies[0];
    // Landed on the floor: center a radius above the floor top.
    assert!(ball.position.y < 60.0);
    assert!(ball.position.y > 4.0);
    assert!((ball.position.x - 50.0).abs() < 5.0);
}

#[test]
fn rejected_input_preserves_scene() {
    let mut scene = Scene::new(64, 64);
    scene.bodies.push(build_box(10.0, 10.0, 10.0, 10.0, 0.0, false));

    let input = UserInput {
        balls: vec![CircleWithPosition {
            position: Vec2::new(15.0, 15.0),
            radius: 3.0,
        }],
        ..UserInput::default()
    };
    let merged = add_user_input_to_scene(
        &scene,
        &input,
        MergeOptions::default(),
        &Tolerances::default(),
    )
    .unwrap();
    assert_eq!(merged.user_input_status, UserInputStatus::HadOcclusions);
    assert!(merged.user_input_bodies.is_empty());
    assert_eq!(merged.bodies, scene.bodies);
}

#[test]
fn user_bodies_are_invisible_to_touching_goals() {
    // The goal pair is authored bodies 1 and 0; a user ball resting on
    // the floor between them must not make the goal pass, and contacts
    // against the user ball must not count as touching the floor.
    let mut scene = Scene::new(128, 128);
    scene.bodies.push(build_box(0.0, 0.0, 100.0, 4.0, 0.0, false));
    scene.bodies.push(build_circle(30.0, 60.0, 2.0, true));

    let input = UserInput {
        balls: vec![CircleWithPosition {
            // Directly under the falling authored ball: it lands on the
            // user ball, not on the floor.
            position: Vec2::new(30.0, 7.0),
            radius: 3.0,
        }],
        ..UserInput::default()
    };
    let merged = add_user_input_to_scene(
        &scene,
        &input,
        MergeOptions::default(),
        &Tolerances::default(),
    )
    .unwrap();

    let task = Task {
        scene: merged,
        body_id1: 1,
        body_id2: 0,
        relationships: vec![SpatialRelationship::TouchingBriefly],
        phantom_shape: None,
        tier: String::new(),
    };
    let simulation = simulate_task(&task, 120, 1).unwrap();
    // Resting on the user ball keeps the authored ball about two radii
    // higher than the floor contact would; the goal must not fire from
    // the user contact alone.
    let final_scene = simulation.scene_list.last().unwrap();
    assert!(final_scene.bodies[1].position.y > 8.0);
    assert!(!simulation.is_solution);
}

#[test]
fn featurization_tracks_simulation() {
    let mut scene = Scene::new(128, 128);
    scene.bodies.push(build_box(0.0, 0.0, 100.0, 4.0, 0.0, false));
    scene.bodies.push(build_circle(50.0, 60.0, 3.0, true));

    let scenes = simulate_scene(&scene, 120).unwrap();
    let before = featurize_scene(&scene);
    let after = featurize_scene(scenes.last().unwrap());

    // Only the ball has a defined shape type: one block each.
    assert_eq!(before.len(), OBJECT_FEATURE_SIZE);
    assert_eq!(after.len(), OBJECT_FEATURE_SIZE);
    // Normalized y decreased as the ball fell.
    assert!(after[1] < before[1]);
    // One-hot blocks are unchanged by motion.
    assert_eq!(&before[4..14], &after[4..14]);
}
