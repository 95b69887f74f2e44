//! Filter and paste benchmarks
//!
//! Target: filter a 2000-widget document in <5ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use widgetree_editor::{Catalog, Document, FilterState, Manager, NodeKey, WidgetData};

fn generate_document(frames: usize, labels_per_frame: usize) -> Document {
    let mut doc = Document::new(Arc::new(Catalog::tk()));
    let root = doc
        .append(None, WidgetData::new("tk.Toplevel", "toplevel1", Manager::Pack))
        .unwrap();

    for f in 0..frames {
        let frame = doc
            .append(Some(root), WidgetData::new("ttk.Frame", format!("frame{}", f), Manager::Pack))
            .unwrap();
        for l in 0..labels_per_frame {
            let class = if l % 3 == 0 { "ttk.Button" } else { "ttk.Label" };
            let id = format!("widget{}_{}", f, l);
            doc.append(Some(frame), WidgetData::new(class, id.as_str(), Manager::Grid))
                .unwrap();
        }
    }
    doc
}

fn bench_filter(c: &mut Criterion) {
    let doc = generate_document(100, 20);

    c.bench_function("filter_apply_2000", |b| {
        let mut filter = FilterState::new();
        b.iter(|| filter.apply(black_box(&doc), black_box("widget42_")))
    });

    c.bench_function("filter_round_trip_2000", |b| {
        let mut filter = FilterState::new();
        b.iter(|| {
            filter.apply(&doc, "button");
            let visible = filter.visible_preorder(&doc);
            filter.clear();
            visible
        })
    });
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_grid_children_500", |b| {
        b.iter(|| {
            let mut doc = Document::new(Arc::new(Catalog::tk()));
            let frame: NodeKey = doc
                .append(None, WidgetData::new("ttk.Frame", "frame", Manager::Grid))
                .unwrap();
            for i in 0..500 {
                let id = format!("label{}", i);
                doc.append(Some(frame), WidgetData::new("ttk.Label", id.as_str(), Manager::Grid))
                    .unwrap();
            }
            black_box(doc.len())
        })
    });
}

criterion_group!(benches, bench_filter, bench_insert);
criterion_main!(benches);
