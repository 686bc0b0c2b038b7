use eframe::egui::{pos2, vec2, Pos2, Rect};
use startpage::dashboard::config::{LayoutPersistence, DEFAULT_LAYOUT_KEY};
use startpage::dashboard::drag::{DragController, DragEvent, DragOutcome};
use startpage::dashboard::grid::GridGeometry;
use startpage::dashboard::layout::COLUMNS;
use startpage::dashboard::storage::MemoryStore;
use startpage::dashboard::store::LayoutStore;
use startpage::dashboard::widgets::WidgetRegistry;
use std::sync::Arc;

fn store() -> LayoutStore {
    LayoutStore::open(
        LayoutPersistence::new(MemoryStore::new(), DEFAULT_LAYOUT_KEY),
        Arc::new(WidgetRegistry::with_defaults()),
    )
}

fn grid() -> GridGeometry {
    GridGeometry::new(
        Rect::from_min_size(pos2(40.0, 60.0), vec2(900.0, 700.0)),
        120.0,
    )
}

fn start(drag: &mut DragController, store: &mut LayoutStore, id: &str, pointer: Pos2) {
    let origin = grid().widget_rect(store.layout().get(id).unwrap()).min;
    let out = drag.handle(
        DragEvent::Start {
            widget_id: id.into(),
            pointer,
            widget_origin: origin,
        },
        &grid(),
        store,
    );
    assert_eq!(out, DragOutcome::Started);
}

#[test]
fn committed_cells_are_always_in_range() {
    let g = grid();
    let mut xs = vec![-5000.0_f32, -1.0, 0.0, 39.9, 40.0, 489.0, 939.9, 940.0, 5000.0];
    xs.extend((0..30).map(|i| 40.0 + i as f32 * 31.7));
    let ys = [-900.0_f32, 0.0, 59.0, 60.0, 300.0, 759.0, 2000.0];
    for &x in &xs {
        for &y in &ys {
            let mut store = store();
            let mut drag = DragController::new();
            drag.set_edit_mode(true);
            start(&mut drag, &mut store, "calendar_default", pos2(200.0, 200.0));
            match drag.handle(DragEvent::Drop { pointer: pos2(x, y) }, &g, &mut store) {
                DragOutcome::Committed { cell, .. } => {
                    assert!(cell.x < COLUMNS);
                    let w = store.layout().get("calendar_default").unwrap();
                    assert_eq!((w.grid_x, w.grid_y), (cell.x, cell.y));
                }
                DragOutcome::Cancelled => assert!(!g.contains(pos2(x, y))),
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}

#[test]
fn drop_outside_container_keeps_positions() {
    let mut store = store();
    let before = store.snapshot();
    let mut drag = DragController::new();
    drag.set_edit_mode(true);
    start(&mut drag, &mut store, "todo_default", pos2(400.0, 200.0));
    drag.handle(DragEvent::Over { pointer: pos2(700.0, 500.0) }, &grid(), &mut store);
    let out = drag.handle(DragEvent::Drop { pointer: pos2(10.0, 10.0) }, &grid(), &mut store);
    assert_eq!(out, DragOutcome::Cancelled);
    assert_eq!(store.snapshot(), before);
}

#[test]
fn outside_edit_mode_pointer_goes_to_content() {
    let mut store = store();
    let mut drag = DragController::new();
    let out = drag.handle(
        DragEvent::Start {
            widget_id: "clock_default".into(),
            pointer: pos2(50.0, 70.0),
            widget_origin: pos2(40.0, 60.0),
        },
        &grid(),
        &mut store,
    );
    assert_eq!(out, DragOutcome::Ignored);
    assert!(!drag.is_dragging());
}

#[test]
fn widget_does_not_jump_under_cursor() {
    let mut store = store();
    let mut drag = DragController::new();
    drag.set_edit_mode(true);
    // grab the weather widget (0,1) near its bottom-right corner
    start(&mut drag, &mut store, "weather_default", pos2(180.0, 290.0));
    // a tiny move keeps it in place
    let out = drag.handle(DragEvent::Drop { pointer: pos2(185.0, 295.0) }, &grid(), &mut store);
    assert!(matches!(out, DragOutcome::Committed { .. }));
    let w = store.layout().get("weather_default").unwrap();
    assert_eq!((w.grid_x, w.grid_y), (0, 1));
}
