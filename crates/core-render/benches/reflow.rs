use std::hint::black_box;
use std::sync::Arc;

use core_config::WrapMode;
use core_render::{Annotator, LayoutPass, LineLayoutBuilder, LineRun};
use core_text::{Document, MonospaceGlyphs, NullObserver, Ordinal, OrdinalShift};
use criterion::{Criterion, criterion_group, criterion_main};

fn sample_text() -> String {
    "The quick brown fox jumps over the lazy dog and keeps running.\n".repeat(2000)
}

fn bench_reflow(c: &mut Criterion) {
    let builder = LineLayoutBuilder::new(Arc::new(MonospaceGlyphs::unit()), WrapMode::Word);
    let width = 24.0;

    c.bench_function("full_layout_2000_paragraphs", |b| {
        let doc = Document::from_text(&sample_text());
        b.iter(|| {
            let chars = doc.read();
            let mut annotator = Annotator::None;
            let mut run = LineRun::new();
            let mut pass = LayoutPass { chars: &chars, builder: &builder, annotator: &mut annotator, width };
            run.rebuild(&mut pass, Ordinal::ZERO, f32::MAX);
            black_box(run.len())
        })
    });

    c.bench_function("incremental_reflow_single_insert", |b| {
        let mut doc = Document::from_text(&sample_text());
        let mut annotator = Annotator::None;
        let mut run = LineRun::new();
        {
            let chars = doc.read();
            let mut pass = LayoutPass { chars: &chars, builder: &builder, annotator: &mut annotator, width };
            run.rebuild(&mut pass, Ordinal::ZERO, f32::MAX);
        }
        let at = Ordinal::new(4000);
        b.iter(|| {
            doc.insert(at, "x", &mut NullObserver);
            run.apply_shift(OrdinalShift::new(at, 1));
            {
                let chars = doc.read();
                let mut pass = LayoutPass { chars: &chars, builder: &builder, annotator: &mut annotator, width };
                black_box(run.reflow(&mut pass, at, at.offset(1)));
            }
            doc.delete_at(at, 1, &mut NullObserver);
            run.apply_shift(OrdinalShift::new(at, -1));
            let chars = doc.read();
            let mut pass = LayoutPass { chars: &chars, builder: &builder, annotator: &mut annotator, width };
            black_box(run.reflow(&mut pass, at, at));
        })
    });
}

criterion_group!(benches, bench_reflow);
criterion_main!(benches);
