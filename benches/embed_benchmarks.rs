use code_embed::dom::Element;
use code_embed::embed::EmbedSelector;
use code_embed::embed::resolver::resolve;
use code_embed::host::FileRef;
use code_embed::markdown::render_document;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Vault listing with `count` files spread over a few directories
fn generate_vault(count: usize) -> Vec<FileRef> {
    let extensions = ["py", "rs", "md", "shader", "json"];
    (0..count)
        .map(|i| {
            FileRef::new(format!(
                "area{}/project{}/file{}.{}",
                i % 7,
                i % 31,
                i,
                extensions[i % extensions.len()]
            ))
        })
        .collect()
}

/// Markdown note with `count` wiki embeds between paragraphs of prose
fn generate_note(count: usize) -> String {
    let mut note = String::from("# Notes\n\n");
    for i in 0..count {
        note.push_str(&format!(
            "Step {} runs the script below.\n\n![[scripts/step{}.py]]\n\n",
            i, i
        ));
    }
    note
}

fn bench_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector");
    let extensions: Vec<String> = (0..20).map(|i| format!("ext{i}")).collect();
    let selector = EmbedSelector::build(&extensions);

    let mut element = Element::new("span");
    element.set_attr("src", "deep/path/to/some/file.ext19");

    group.bench_function("match_last_extension", |b| {
        b.iter(|| code_embed::dom::Matcher::matches(&selector, black_box(&element)))
    });
    group.bench_function("build_20", |b| {
        b.iter(|| EmbedSelector::build(black_box(&extensions)))
    });
    group.bench_function("to_css_20", |b| b.iter(|| black_box(&selector).to_css()));
    group.finish();
}

fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver");
    let active = FileRef::new("area3/project3/notes.md");

    for size in [100, 1_000, 10_000] {
        let files = generate_vault(size);
        group.throughput(Throughput::Elements(size as u64));

        // Exact match fails, the suffix scan finds the last file
        let reference = format!("file{}.json", size - 1);
        group.bench_with_input(BenchmarkId::new("suffix_fallback", size), &files, |b, files| {
            b.iter(|| resolve(black_box(&reference), &active, files))
        });

        group.bench_with_input(BenchmarkId::new("not_found", size), &files, |b, files| {
            b.iter(|| resolve(black_box("missing.py"), &active, files))
        });
    }
    group.finish();
}

fn bench_markdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("markdown");
    for count in [10, 100] {
        let note = generate_note(count);
        group.throughput(Throughput::Bytes(note.len() as u64));
        group.bench_with_input(BenchmarkId::new("render_embeds", count), &note, |b, note| {
            b.iter(|| render_document(black_box(note)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_selector, bench_resolver, bench_markdown);
criterion_main!(benches);
