use criterion::{Criterion, criterion_group, criterion_main};
use notekit_config::Config;
use notekit_engine::dom::html::parse_fragment;
use notekit_engine::{Change, Editor, NodeId, Point, Range, Tree};

fn generate_document(paragraphs: usize) -> String {
    let mut html = String::new();
    for i in 0..paragraphs {
        match i % 4 {
            0 => html.push_str(&format!("<h2>Section {i}</h2>")),
            1 => html.push_str(&format!("<p>Paragraph {i} with <strong>bold</strong> and <em>em</em> text.</p>")),
            2 => html.push_str(&format!("<ol><li>item {i}a</li><li>item {i}b</li><li>item {i}c</li></ol>")),
            _ => html.push_str(&format!("<blockquote><p>quote {i}</p></blockquote>")),
        }
    }
    html
}

fn document(html: &str) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.create_element_with("div", &[("data-element", "root")]);
    let doc = tree.document();
    tree.append(doc, root);
    let frag = parse_fragment(&mut tree, html);
    tree.append(root, frag);
    (tree, root)
}

fn first_text(tree: &Tree, root: NodeId) -> NodeId {
    tree.descendants(root)
        .into_iter()
        .find(|id| tree.text_len(*id) > 4)
        .unwrap()
}

fn bench_change_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("change");
    group.sample_size(10);

    let content = generate_document(100);

    group.bench_function("insert_text", |b| {
        let (mut tree, root) = document(&content);
        let text = first_text(&tree, root);
        b.iter(|| {
            let mut range = Range::collapsed(Point::new(text, 2));
            Change::new(&mut tree, root).insert_text(&mut range, std::hint::black_box("x"));
            std::hint::black_box(range);
        });
    });

    group.bench_function("split_block", |b| {
        b.iter(|| {
            let (mut tree, root) = document(&content);
            let text = first_text(&tree, root);
            let mut range = Range::collapsed(Point::new(text, 2));
            let p = tree.create_element("p");
            Change::new(&mut tree, root).insert_block(&mut range, p, false);
            std::hint::black_box(range);
        });
    });

    group.bench_function("delete_across_blocks", |b| {
        b.iter(|| {
            let (mut tree, root) = document(&content);
            let texts: Vec<NodeId> = tree
                .descendants(root)
                .into_iter()
                .filter(|id| tree.is_text(*id))
                .collect();
            let (first, last) = (texts[1], texts[texts.len() - 2]);
            let mut range = Range::new(Point::new(first, 1), Point::new(last, 1));
            Change::new(&mut tree, root).delete_content(&mut range, false);
            std::hint::black_box(range);
        });
    });

    group.finish();
}

fn bench_editor(c: &mut Criterion) {
    let mut group = c.benchmark_group("editor");
    group.sample_size(10);

    let content = generate_document(100);

    group.bench_function("set_value", |b| {
        let mut editor = Editor::new(&Config::default());
        b.iter(|| {
            editor.set_value(std::hint::black_box(&content));
        });
    });

    group.bench_function("insert_html_and_undo", |b| {
        let mut editor = Editor::new(&Config::default());
        editor.set_value(&content);
        b.iter(|| {
            editor.insert_html("<b>x</b>").unwrap();
            std::hint::black_box(editor.undo());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_change_operations, bench_editor);
criterion_main!(benches);
