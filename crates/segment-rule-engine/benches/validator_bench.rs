//! 规则树校验与描述的性能基准
//!
//! 预览协调器在每次提交时都会校验整棵树，校验耗时必须远小于一次按键间隔。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use segment_rules::{
    Mutation, Operator, RuleChild, RuleNode, RuleTree, RuleValue, TreeEditor, describe_tree,
    validate,
};
use std::hint::black_box;

/// 根下 `width` 个分支，每个分支是两层嵌套的规则组
fn create_wide_tree(width: usize) -> RuleTree {
    let branch = |i: usize| -> RuleChild {
        RuleTree::or(vec![
            RuleNode::new("health_score", Operator::Lt, RuleValue::Number(40.0 + i as f64)).into(),
            RuleTree::and(vec![
                RuleNode::new(
                    "plan",
                    Operator::In,
                    RuleValue::TextList(vec!["growth".into(), "enterprise".into()]),
                )
                .into(),
                RuleNode::unary("industry", Operator::IsNotEmpty).into(),
            ])
            .into(),
        ])
        .into()
    };

    RuleTree::and((0..width).map(branch).collect())
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for width in [1usize, 10, 100].iter() {
        let tree = create_wide_tree(*width);
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| validate(black_box(&tree)))
        });
    }

    group.finish();
}

fn bench_describe(c: &mut Criterion) {
    let tree = create_wide_tree(10);

    c.bench_function("describe_tree", |b| b.iter(|| describe_tree(black_box(&tree))));
}

fn bench_editor_apply(c: &mut Criterion) {
    let tree = create_wide_tree(50);

    c.bench_function("editor_apply_toggle", |b| {
        b.iter(|| {
            let mut editor = TreeEditor::new(tree.clone());
            for i in 0..10 {
                let _ = editor.apply(Mutation::ToggleLogic { path: vec![i] });
            }
            black_box(editor.revision())
        })
    });
}

criterion_group!(benches, bench_validate, bench_describe, bench_editor_apply);
criterion_main!(benches);
