//! Property tests for the pathfinding layer.

use gloam::{find_path, has_line_of_sight, Level, Position, Tile};
use proptest::prelude::*;

const SIZE: i32 = 16;

/// Builds a level from a set of wall cells; everything else inside the
/// border is floor.
fn level_with_walls(walls: &[(i32, i32)]) -> Level {
    let mut level = Level::new(0, SIZE as u32, SIZE as u32);
    for y in 1..SIZE - 1 {
        for x in 1..SIZE - 1 {
            level.set_tile(Position::new(x, y), Tile::floor()).unwrap();
        }
    }
    for &(x, y) in walls {
        if x > 0 && y > 0 && x < SIZE - 1 && y < SIZE - 1 {
            level.set_tile(Position::new(x, y), Tile::wall()).unwrap();
        }
    }
    level
}

fn interior_coord() -> impl Strategy<Value = (i32, i32)> {
    (1..SIZE - 1, 1..SIZE - 1)
}

proptest! {
    /// A returned path ends at the goal, starts one step from the start,
    /// and every consecutive pair is a single 8-connected walkable step.
    #[test]
    fn path_steps_are_valid(
        walls in prop::collection::vec(interior_coord(), 0..40),
        (sx, sy) in interior_coord(),
        (gx, gy) in interior_coord(),
    ) {
        let level = level_with_walls(&walls);
        let start = Position::new(sx, sy);
        let goal = Position::new(gx, gy);
        prop_assume!(level.is_walkable(sx, sy) && level.is_walkable(gx, gy));

        let path = find_path(start, goal, &level, true);

        if start == goal {
            prop_assert_eq!(path, vec![goal]);
        } else if !path.is_empty() {
            prop_assert_eq!(*path.last().unwrap(), goal);
            prop_assert!(start.is_adjacent(path[0]));
            for pair in path.windows(2) {
                prop_assert!(pair[0].is_adjacent(pair[1]));
                prop_assert!(level.is_walkable(pair[1].x, pair[1].y));
            }
        }
    }

    /// Cardinal-only paths contain no diagonal steps.
    #[test]
    fn cardinal_paths_have_no_diagonals(
        (sx, sy) in interior_coord(),
        (gx, gy) in interior_coord(),
    ) {
        let level = level_with_walls(&[]);
        let path = find_path(Position::new(sx, sy), Position::new(gx, gy), &level, false);

        let mut prev = Position::new(sx, sy);
        for step in path {
            let delta = step - prev;
            prop_assert!(delta.x == 0 || delta.y == 0);
            prev = step;
        }
    }

    /// On an unobstructed floor every interior pair has line of sight.
    #[test]
    fn open_floor_always_has_los(
        (ax, ay) in interior_coord(),
        (bx, by) in interior_coord(),
    ) {
        let level = level_with_walls(&[]);
        prop_assert!(has_line_of_sight(
            Position::new(ax, ay),
            Position::new(bx, by),
            &level
        ));
    }

    /// A path never walks through a wall cell.
    #[test]
    fn paths_avoid_walls(
        walls in prop::collection::vec(interior_coord(), 1..30),
        (sx, sy) in interior_coord(),
        (gx, gy) in interior_coord(),
    ) {
        let level = level_with_walls(&walls);
        prop_assume!(level.is_walkable(sx, sy) && level.is_walkable(gx, gy));

        let path = find_path(Position::new(sx, sy), Position::new(gx, gy), &level, true);
        for step in path {
            prop_assert!(level.is_walkable(step.x, step.y));
        }
    }
}
