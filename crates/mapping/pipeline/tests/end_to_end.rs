use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mapping_analysis::AnalysisOptions;
use mapping_ancestry::{AncestryOptions, EntityKind};
use mapping_cache::{MappingProvider, ProviderCache, ProviderError, StaticProvider};
use mapping_compose::{InterceptorChain, PackagePrefixer, StaticInitializerFilter};
use mapping_pipeline::{
    ContributorSpec, MappingPipeline, MappingPipelineBuilder, PipelineOutput, ReleaseOutcome,
    Stage,
};
use mapping_types::{
    FieldKey, Fragment, FragmentClass, FragmentField, FragmentMethod, MethodKey, Release,
    ReleaseKind,
};

fn release(id: &str, day: u32) -> Release {
    let at = Utc.with_ymd_and_hms(2021, 6, day, 0, 0, 0).unwrap();
    Release::new(id, ReleaseKind::Release, at)
}

fn releases() -> Vec<Release> {
    vec![release("1.0", 1), release("1.1", 2), release("1.2", 3)]
}

fn alpha(source: &str, count: &str, tick: &str) -> FragmentClass {
    FragmentClass::new(source)
        .named("net/Alpha")
        .field(FragmentField::new(count, Some("I")).named("count"))
        .method(FragmentMethod::new(tick, "()V").named("tick"))
}

/// Alpha is renamed structurally every release but keeps its reliable name.
/// Beta becomes Gamma in 1.1 and disappears in 1.2. `total` is dropped
/// after 1.0.
fn mojang() -> StaticProvider {
    StaticProvider::new("mojang")
        .with(
            "1.0",
            Fragment::new("mojang")
                .class(alpha("a", "x", "m").field(FragmentField::new("y", Some("J")).named("total")))
                .class(FragmentClass::new("e").named("net/Beta")),
        )
        .with(
            "1.1",
            Fragment::new("mojang")
                .class(alpha("b", "p", "n"))
                .class(FragmentClass::new("f").named("net/Gamma")),
        )
        .with("1.2", Fragment::new("mojang").class(alpha("c", "q", "o")))
}

fn yarn() -> StaticProvider {
    StaticProvider::new("yarn")
        .with("1.0", Fragment::new("yarn").class(FragmentClass::new("a").named("Alpha")))
        .with("1.1", Fragment::new("yarn").class(FragmentClass::new("b").named("AlphaRenamed")))
        .with("1.2", Fragment::new("yarn").class(FragmentClass::new("c").named("Alpha")))
}

fn builder(mojang: Arc<dyn MappingProvider>, yarn: Arc<dyn MappingProvider>) -> MappingPipelineBuilder {
    MappingPipeline::builder()
        .releases(releases())
        .contributor(ContributorSpec::add("mojang", mojang))
        .contributor(ContributorSpec::add("yarn", yarn))
        .ancestry(AncestryOptions::new(["mojang"]))
        .index_namespace("lineage")
}

async fn run(builder: MappingPipelineBuilder) -> PipelineOutput {
    builder.build().unwrap().run().await.unwrap()
}

#[tokio::test]
async fn class_survives_unreliable_rename_and_reliable_rename_breaks() {
    let out = run(builder(Arc::new(mojang()), Arc::new(yarn()))).await;

    assert_eq!(out.release_ids(), vec!["1.0", "1.1", "1.2"]);
    assert!(out.failures.is_empty());

    let index = &out.index;
    assert_eq!(index.len(EntityKind::Class), 3);
    assert_eq!(index.class_index(0, "a"), Some(0));
    assert_eq!(index.class_index(1, "b"), Some(0));
    assert_eq!(index.class_index(2, "c"), Some(0));
    assert_eq!(index.class_index(0, "e"), Some(1));
    assert_eq!(index.class_index(1, "f"), Some(2));

    let history: Vec<_> = index
        .history(EntityKind::Class, 0)
        .unwrap()
        .iter()
        .map(|o| o.release.as_str())
        .collect();
    assert_eq!(history, vec!["1.0", "1.1", "1.2"]);
}

#[tokio::test]
async fn dropped_field_closes_and_methods_follow_their_class() {
    let out = run(builder(Arc::new(mojang()), Arc::new(yarn()))).await;
    let index = &out.index;

    let count = index.field_index(0, "a", &FieldKey::new("x", Some("I".into())));
    assert!(count.is_some());
    assert_eq!(count, index.field_index(1, "b", &FieldKey::new("p", Some("I".into()))));
    assert_eq!(count, index.field_index(2, "c", &FieldKey::new("q", Some("I".into()))));

    let total = index
        .field_index(0, "a", &FieldKey::new("y", Some("J".into())))
        .unwrap();
    let history = index.history(EntityKind::Field, total).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].release, "1.0");
    assert_eq!(index.len(EntityKind::Field), 2);

    let tick = index.method_index(0, "a", &MethodKey::new("m", "()V"));
    assert!(tick.is_some());
    assert_eq!(tick, index.method_index(2, "c", &MethodKey::new("o", "()V")));
}

#[tokio::test]
async fn lineage_indices_are_stamped_into_trees() {
    let out = run(builder(Arc::new(mojang()), Arc::new(yarn()))).await;

    let tree = out.tree("1.1").unwrap();
    assert!(tree.has_namespace("lineage"));
    assert_eq!(tree.class_name("b", "lineage"), Some("0"));
    assert_eq!(tree.class_name("f", "lineage"), Some("2"));
    assert_eq!(out.tree("1.2").unwrap().class_name("c", "yarn"), Some("Alpha"));
}

#[tokio::test]
async fn identical_inputs_give_identical_indices() {
    let first = run(builder(Arc::new(mojang()), Arc::new(yarn()))).await;
    let second = run(builder(Arc::new(mojang()), Arc::new(yarn()))).await;

    assert_eq!(
        serde_json::to_string(&first.index.summary()).unwrap(),
        serde_json::to_string(&second.index.summary()).unwrap()
    );
    for (a, b) in first.trees.iter().zip(&second.trees) {
        assert!(a.same_content(b));
    }
}

/// Fails one release and panics on another.
struct BrokenProvider {
    inner: StaticProvider,
    failing: &'static str,
    panicking: Option<&'static str>,
}

#[async_trait]
impl MappingProvider for BrokenProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn fetch(&self, release: &Release) -> Result<Fragment, ProviderError> {
        if Some(release.id.as_str()) == self.panicking {
            panic!("provider crashed on {}", release.id);
        }
        if release.id == self.failing {
            return Err(ProviderError::Fetch {
                provider: self.inner.id().to_string(),
                release: release.id.clone(),
                message: "connection reset".into(),
            });
        }
        self.inner.fetch(release).await
    }
}

#[tokio::test]
async fn failed_release_is_removed_without_aborting_siblings() {
    let broken = BrokenProvider {
        inner: mojang(),
        failing: "1.1",
        panicking: None,
    };
    let out = run(builder(Arc::new(broken), Arc::new(yarn()))).await;

    assert_eq!(out.release_ids(), vec!["1.0", "1.2"]);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].release, "1.1");
    assert_eq!(out.failures[0].stage, Stage::Fetch);

    // Ordinals refer to the surviving sequence.
    assert_eq!(out.index.releases(), ["1.0", "1.2"]);
    assert_eq!(out.index.class_index(0, "a"), Some(0));
    assert_eq!(out.index.class_index(1, "c"), Some(0));
    assert_eq!(out.index.len(EntityKind::Class), 2);
}

#[tokio::test]
async fn panicking_release_task_is_isolated() {
    let broken = BrokenProvider {
        inner: mojang(),
        failing: "none",
        panicking: Some("1.2"),
    };
    let out = run(builder(Arc::new(broken), Arc::new(yarn()))).await;

    assert_eq!(out.release_ids(), vec!["1.0", "1.1"]);
    assert_eq!(out.failures[0].stage, Stage::Panic);
}

#[tokio::test]
async fn contributor_without_data_is_skipped() {
    let sparse_yarn = StaticProvider::new("yarn")
        .with("1.0", Fragment::new("yarn").class(FragmentClass::new("a").named("Alpha")));
    let out = run(builder(Arc::new(mojang()), Arc::new(sparse_yarn))).await;

    assert!(out.failures.is_empty());
    assert_eq!(out.tree("1.0").unwrap().class_name("a", "yarn"), Some("Alpha"));
    assert_eq!(out.tree("1.2").unwrap().class_name("c", "yarn"), None);
}

#[tokio::test]
async fn release_without_any_data_fails_at_fetch() {
    let mut selected = releases();
    selected.push(release("1.3", 4));
    let out = run(builder(Arc::new(mojang()), Arc::new(yarn())).releases(selected)).await;

    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].release, "1.3");
    assert_eq!(out.failures[0].stage, Stage::Fetch);
}

#[tokio::test]
async fn shared_cache_fetches_each_release_once() {
    let mojang = Arc::new(mojang());
    let cache = Arc::new(ProviderCache::in_memory());

    for _ in 0..2 {
        run(builder(mojang.clone(), Arc::new(yarn())).cache(Arc::clone(&cache))).await;
    }
    assert_eq!(mojang.fetch_count(), 3);
}

#[tokio::test]
async fn same_provider_under_two_contributors_is_fetched_once_per_release() {
    let mojang = Arc::new(mojang());
    let out = run(
        builder(mojang.clone(), Arc::new(yarn()))
            .contributor(ContributorSpec::add("mojang-mirror", mojang.clone())),
    )
    .await;

    assert_eq!(out.trees.len(), 3);
    assert_eq!(mojang.fetch_count(), 3);
}

#[tokio::test]
async fn wrapped_contributor_is_transformed_before_merge() {
    let spigot = StaticProvider::new("spigot")
        .with("1.0", Fragment::new("spigot").class(FragmentClass::new("a").named("Alpha")))
        .with("1.1", Fragment::new("spigot").class(FragmentClass::new("b").named("util/Alpha")));
    let prefixer = PackagePrefixer::new("spigot", "net/server/").prepend_everything_in(["1.1"]);

    let out = run(
        builder(Arc::new(mojang()), Arc::new(yarn()))
            .contributor(ContributorSpec::add("spigot", Arc::new(spigot)))
            .contributor(ContributorSpec::wrap("spigot-legacy", "spigot", Arc::new(prefixer))),
    )
    .await;

    assert_eq!(out.tree("1.0").unwrap().class_name("a", "spigot"), Some("net/server/Alpha"));
    assert_eq!(
        out.tree("1.1").unwrap().class_name("b", "spigot"),
        Some("net/server/util/Alpha")
    );
    // No spigot data for 1.2: the wrapper is skipped with its inner contributor.
    assert!(out.failures.is_empty());
    assert_eq!(out.tree("1.2").unwrap().class_name("c", "spigot"), None);
}

fn nested() -> StaticProvider {
    StaticProvider::new("mojang").with(
        "1.0",
        Fragment::new("mojang")
            .class(FragmentClass::new("a").named("net/Alpha"))
            .class(FragmentClass::new("a$d"))
            .class(
                FragmentClass::new("k")
                    .named("net/Kept")
                    .method(FragmentMethod::new("<clinit>", "()V")),
            ),
    )
}

fn nested_yarn() -> StaticProvider {
    StaticProvider::new("yarn").with(
        "1.0",
        Fragment::new("yarn")
            .class(FragmentClass::new("a").named("Alpha"))
            .class(FragmentClass::new("a$d").named("Alpha$Inner")),
    )
}

fn nested_builder() -> MappingPipelineBuilder {
    MappingPipeline::builder()
        .releases(vec![release("1.0", 1)])
        .contributor(ContributorSpec::add("mojang", Arc::new(nested())))
        .contributor(ContributorSpec::add("yarn", Arc::new(nested_yarn())))
        .interceptors(InterceptorChain::builder().then(StaticInitializerFilter).build())
        .analysis(
            AnalysisOptions::new()
                .completion_candidates(["yarn"])
                .completion_targets(["mojang"]),
        )
        .ancestry(AncestryOptions::new(["mojang"]))
}

#[tokio::test]
async fn analysis_repairs_are_committed() {
    let out = run(nested_builder()).await;
    let tree = &out.trees[0];

    assert_eq!(tree.class_name("a$d", "mojang"), Some("net/Alpha$Inner"));
    assert!(tree.class("k").unwrap().methods.is_empty());
    assert!(matches!(&out.outcomes[0], ReleaseOutcome::Accepted(s) if s.names_set == 1));
    assert_eq!(out.index.len(EntityKind::Class), 3);
}

#[tokio::test]
async fn dry_run_keeps_the_report_and_leaves_trees_untouched() {
    let out = run(nested_builder().dry_run(true)).await;
    let tree = &out.trees[0];

    assert_eq!(tree.class_name("a$d", "mojang"), None);
    let ReleaseOutcome::DryRun(report) = &out.outcomes[0] else {
        panic!("expected a dry-run report");
    };
    assert_eq!(report.resolutions().len(), 1);
    assert_eq!(report.release(), "1.0");
}

#[tokio::test]
async fn output_is_written_as_tiny_files_and_lineage_json() {
    let out = run(builder(Arc::new(mojang()), Arc::new(yarn()))).await;
    let dir = tempfile::tempdir().unwrap();

    let written = out.write_to(dir.path(), true).unwrap();
    assert_eq!(written.len(), 4);

    let text = std::fs::read_to_string(dir.path().join("1.0.tiny")).unwrap();
    assert!(text.starts_with("tiny\t2\t0\tsource\tmojang\tyarn\tlineage\tmeta_super"));
    let parsed = mapping_emit::read_tiny(&text, release("1.0", 1)).unwrap();
    assert!(parsed.same_content(&out.trees[0]));

    let lineage: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("lineage.json")).unwrap())
            .unwrap();
    assert_eq!(lineage["releases"].as_array().unwrap().len(), 3);
    assert_eq!(lineage["classes"].as_array().unwrap().len(), 3);
}
