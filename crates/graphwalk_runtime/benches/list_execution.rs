//! Benchmarks for list-heavy query execution.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use graphwalk_document::{Document, FieldSelection, OperationDefinition};
use graphwalk_runtime::{
    ExecutionRequest, Executor, FieldDef, ObjectDef, SchemaBuilder, TypeDef, TypeRef,
};
use serde_json::{json, Value};

fn people_executor() -> Executor {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .add_type(TypeDef::Object(ObjectDef::new("Query").add_field(
            FieldDef::new("people", TypeRef::list(TypeRef::named("Person"))),
        )))
        .add_type(TypeDef::Object(
            ObjectDef::new("Person")
                .add_field(FieldDef::new("name", TypeRef::named("String")))
                .add_field(FieldDef::new("age", TypeRef::named("Int"))),
        ))
        .build();
    Executor::new(schema)
}

fn bench_list_execution(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let executor = people_executor();
    let document = Document::new().with_operation(
        OperationDefinition::query().with_selection(
            FieldSelection::new("people")
                .with_selection(FieldSelection::new("name"))
                .with_selection(FieldSelection::new("age")),
        ),
    );

    let mut group = c.benchmark_group("list_execution");
    for size in [10_usize, 100, 1000] {
        let people: Vec<Value> = (0..size)
            .map(|i| json!({"name": format!("p{i}"), "age": i}))
            .collect();
        let root = json!({"people": people});
        group.bench_with_input(BenchmarkId::from_parameter(size), &root, |b, root| {
            b.iter(|| {
                runtime.block_on(
                    executor.execute(ExecutionRequest::new(&document).with_root(root.clone())),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_list_execution);
criterion_main!(benches);
