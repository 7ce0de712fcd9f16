use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use forgeiq_dashboard::{
    ClientError, Dashboard,
    domain::ApiPath,
    fetch::PipelineExecutionsQuery,
    transport::{Method, Transport},
};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

/// Answers instantly with a fixed page of executions.
struct StaticBackend(Value);

#[async_trait]
impl Transport for StaticBackend {
    async fn request(
        &self,
        _method: Method,
        _path: &ApiPath,
        _params: &[(String, String)],
        _body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        Ok(self.0.clone())
    }
}

fn bench_cached_fetch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let pipelines: Vec<Value> = (0..25)
        .map(|i| json!({"dag_id": format!("d{i}"), "status": "RUNNING", "project_id": "p1"}))
        .collect();
    let dashboard = Dashboard::new(Arc::new(StaticBackend(json!({ "pipelines": pipelines }))));
    let query = PipelineExecutionsQuery::new().project("p1");

    // warm the entry so every iteration is a hit
    rt.block_on(dashboard.fetch(&query));

    c.bench_function("fetch pipeline executions (cache hit)", |b| {
        b.to_async(&rt).iter(|| async {
            let result = dashboard.fetch(&query).await;
            std::hint::black_box(result.data.len());
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_cached_fetch
}
criterion_main!(benches);
