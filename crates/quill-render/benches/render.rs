//! Benchmarks for whole-document rendering.

use std::hint::black_box;
use std::path::Path;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use quill_render::{
    DocumentError, Element, ElementKind, LabelType, RenderSummary, SequenceType, XhtmlDriver,
};

/// Render `sections` sections of `paragraphs` paragraphs each, plus one figure per section.
fn render(dir: &Path, sections: usize, paragraphs: usize) -> Result<RenderSummary, DocumentError> {
    let mut doc = XhtmlDriver::new().create_context(dir)?.create_document()?;
    let labels: Vec<_> = (0..sections)
        .map(|_| doc.create_label(LabelType::Figure))
        .collect();

    doc.within(Element::Header, |d| {
        d.within(Element::Title, |d| d.write("Benchmark"))
    })?;
    doc.begin(Element::Body)?;
    for (i, label) in labels.iter().enumerate() {
        doc.within(Element::Section(None), |d| {
            d.within(Element::SectionTitle, |d| d.write(&format!("Section {i}")))?;
            d.within(Element::SectionBody, |d| {
                for j in 0..paragraphs {
                    d.within(Element::Paragraph, |d| {
                        d.write(&format!("Paragraph {j} refers to "))?;
                        d.reference(SequenceType::And, &labels, true)?;
                        d.write(" & <more> text.")
                    })?;
                }
                d.within(Element::Figure(Some(*label)), |d| {
                    d.within(Element::Caption, |d| d.write("Figure caption"))
                })
            })
        })?;
    }
    doc.end(ElementKind::Body)?;
    doc.close()
}

fn bench_render_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_by_size");
    for (sections, paragraphs) in [(5, 2), (20, 5), (50, 10)] {
        group.bench_with_input(
            BenchmarkId::new("sections", format!("{sections}x{paragraphs}")),
            &(sections, paragraphs),
            |b, &(sections, paragraphs)| {
                b.iter_batched(
                    || tempfile::tempdir().unwrap(),
                    |dir| black_box(render(dir.path(), sections, paragraphs).unwrap()),
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_render_by_size);
criterion_main!(benches);
