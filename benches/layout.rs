use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eframe::egui::{pos2, vec2, Rect};
use startpage::dashboard::config::{LayoutPersistence, LayoutRecord, DEFAULT_LAYOUT_KEY};
use startpage::dashboard::drag::{DragController, DragEvent};
use startpage::dashboard::grid::GridGeometry;
use startpage::dashboard::layout::{Layout, Widget};
use startpage::dashboard::storage::MemoryStore;
use startpage::dashboard::store::LayoutStore;
use startpage::dashboard::widgets::WidgetRegistry;
use std::sync::Arc;

fn grid() -> GridGeometry {
    GridGeometry::new(
        Rect::from_min_size(pos2(0.0, 0.0), vec2(1200.0, 4000.0)),
        140.0,
    )
}

fn large_layout(count: u32) -> Layout {
    Layout {
        widgets: (0..count)
            .map(|i| {
                Widget::new(&format!("notes_{i}"), "notes", "Notes", (1, 1))
                    .at((i % 6) as i64, (i / 6) as i64)
            })
            .collect(),
        ..Layout::default()
    }
}

fn bench_quantize(c: &mut Criterion) {
    let g = grid();
    let pointers: Vec<_> = (0..1_000)
        .map(|i| pos2((i * 37 % 1400) as f32 - 100.0, (i * 53 % 4200) as f32 - 100.0))
        .collect();
    c.bench_function("cell_at_1k", |b| {
        b.iter(|| {
            for p in &pointers {
                black_box(g.cell_at(*p));
            }
        })
    });
}

fn bench_drag_commit(c: &mut Criterion) {
    let persistence = LayoutPersistence::new(MemoryStore::new(), DEFAULT_LAYOUT_KEY);
    persistence.save(&large_layout(200)).expect("seed layout");
    let mut store = LayoutStore::open(persistence, Arc::new(WidgetRegistry::with_defaults()));
    let mut drag = DragController::new();
    drag.set_edit_mode(true);
    let g = grid();
    let mut n = 0u32;
    c.bench_function("drag_commit_200_widgets", |b| {
        b.iter(|| {
            n = n.wrapping_add(1);
            drag.handle(
                DragEvent::Start {
                    widget_id: "notes_100".into(),
                    pointer: pos2(10.0, 10.0),
                    widget_origin: pos2(0.0, 0.0),
                },
                &g,
                &mut store,
            );
            let x = (n % 6) as f32 * 200.0 + 20.0;
            black_box(drag.handle(DragEvent::Drop { pointer: pos2(x, 300.0) }, &g, &mut store));
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let json = LayoutRecord::from(&large_layout(500)).to_json().expect("encode layout");
    c.bench_function("parse_500_widgets", |b| {
        b.iter(|| black_box(LayoutRecord::parse(&json).map(|(l, _)| l.widgets.len())))
    });
}

criterion_group!(benches, bench_quantize, bench_drag_commit, bench_parse);
criterion_main!(benches);
