/// Test suite for scope resolution
///
/// Tests cover:
/// - Attribute resolution through the registry
/// - Nested requirement rewriting
/// - Pass-through and idempotence
/// - Cancellation and timeouts
/// - Keyword and attribute composition

use super::*;
use crate::datasource::{AddDataSourceCommand, DatasourceNameScopeResolver, DatasourceUidScopeResolver, InMemoryDataSourceStore};
use crate::error::{AccessControlError, Result};
use crate::evaluator::{eval_action, eval_all, eval_any, eval_permission};
use crate::types::UserContext;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn datasource_resolver() -> ScopeResolver {
    let store = Arc::new(InMemoryDataSourceStore::new());
    store
        .add(AddDataSourceCommand {
            uid: "testUID".to_string(),
            org_id: 1,
            name: "testds".to_string(),
            ds_type: "postgresql".to_string(),
            url: "http://localhost:5432".to_string(),
            access: "Proxy".to_string(),
        })
        .await
        .unwrap();

    ScopeResolver::new()
        .with_attribute_resolver(DatasourceNameScopeResolver::new(store.clone()))
        .with_attribute_resolver(DatasourceUidScopeResolver::new(store))
}

// ============================================================================
// Attribute Resolution Tests
// ============================================================================

#[tokio::test]
async fn test_no_resolution_evaluator() {
    let resolver = datasource_resolver().await;
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    let evaluator = eval_action("datasources:read");
    let resolved = evaluator.resolve_scopes(&modifier).await.unwrap();
    assert_eq!(resolved, eval_action("datasources:read"));
}

#[tokio::test]
async fn test_datasource_name_resolution() {
    let resolver = datasource_resolver().await;
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    let evaluator = eval_permission("datasources:read", [scope(&["datasources", "name", "testds"])]);
    let resolved = evaluator.resolve_scopes(&modifier).await.unwrap();

    assert_eq!(
        resolved,
        eval_permission("datasources:read", [scope(&["datasources", "id", "1"])])
    );
}

#[tokio::test]
async fn test_datasource_uid_resolution() {
    let resolver = datasource_resolver().await;
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    let resolved = AsyncScopeModifier::modify(&modifier, "datasources:uid:testUID").await.unwrap();
    assert_eq!(resolved, "datasources:id:1");
}

#[tokio::test]
async fn test_nested_datasource_name_resolution() {
    let resolver = datasource_resolver().await;
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    let by_name = || eval_permission("datasources:read", [scope(&["datasources", "name", "testds"])]);
    let by_id = || eval_permission("datasources:read", [scope(&["datasources", "id", "1"])]);

    let evaluator = eval_all(vec![by_name(), eval_any(vec![by_name(), by_name()])]);
    let resolved = evaluator.resolve_scopes(&modifier).await.unwrap();

    assert_eq!(resolved, eval_all(vec![by_id(), eval_any(vec![by_id(), by_id()])]));
}

#[tokio::test]
async fn test_unknown_datasource_is_an_error() {
    let resolver = datasource_resolver().await;

    let evaluator = eval_all(vec![
        eval_permission("datasources:read", ["datasources:name:testds"]),
        eval_permission("datasources:read", ["datasources:name:missing"]),
    ]);

    let err = evaluator
        .resolve_scopes(&resolver.attribute_modifier(ResolveContext::new(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessControlError::DataSourceNotFound(ref name) if name == "missing"));

    // Data sources are looked up within the requesting org
    let err = evaluator
        .resolve_scopes(&resolver.attribute_modifier(ResolveContext::new(), 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessControlError::DataSourceNotFound(ref name) if name == "testds"));
}

#[tokio::test]
async fn test_unregistered_prefix_passes_through() {
    let resolver = datasource_resolver().await;
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    for original in ["", ":", "datasources:", "datasources:*", "dashboards:name:home", "users:self"] {
        let resolved = AsyncScopeModifier::modify(&modifier, original).await.unwrap();
        assert_eq!(resolved, original);
    }
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let resolver = datasource_resolver().await;
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    let evaluator = eval_permission("datasources:read", ["datasources:name:testds"]);
    let once = evaluator.resolve_scopes(&modifier).await.unwrap();
    let twice = once.resolve_scopes(&modifier).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(evaluator, eval_permission("datasources:read", ["datasources:name:testds"]));
}

#[tokio::test]
async fn test_value_segment_keeps_separators() {
    let mut resolver = ScopeResolver::new();
    resolver.add_attribute_resolver(FnAttributeResolver::new(
        "folders:path:",
        |_ctx, org_id, value: String| async move {
            assert_eq!(value, "general:reports");
            Ok::<_, AccessControlError>(format!("{}-7", org_id))
        },
    ));

    let modifier = resolver.attribute_modifier(ResolveContext::new(), 4);
    let resolved = AsyncScopeModifier::modify(&modifier, "folders:path:general:reports").await.unwrap();
    assert_eq!(resolved, "folders:id:4-7");
}

#[tokio::test]
async fn test_resolved_attribute_override() {
    struct UidResolver;

    #[async_trait::async_trait]
    impl AttributeResolver for UidResolver {
        fn prefix(&self) -> &str {
            "teams:name:"
        }

        fn resolved_attribute(&self) -> &str {
            "uid"
        }

        async fn resolve(&self, _ctx: &ResolveContext, _org_id: i64, value: &str) -> Result<String> {
            Ok(value.to_uppercase())
        }
    }

    let resolver = ScopeResolver::new().with_attribute_resolver(UidResolver);
    let modifier = resolver.attribute_modifier(ResolveContext::new(), 1);

    let resolved = AsyncScopeModifier::modify(&modifier, "teams:name:ops").await.unwrap();
    assert_eq!(resolved, "teams:uid:OPS");
}

#[test]
fn test_registry_replaces_same_prefix() {
    let first = FnAttributeResolver::new("teams:name:", |_ctx, _org, _v: String| async {
        Ok::<_, AccessControlError>("1".to_string())
    });
    let second = FnAttributeResolver::new("teams:name:", |_ctx, _org, _v: String| async {
        Ok::<_, AccessControlError>("2".to_string())
    });

    let mut resolver = ScopeResolver::new();
    resolver.add_attribute_resolver(first);
    resolver.add_attribute_resolver(second);

    assert_eq!(resolver.prefixes(), vec!["teams:name:"]);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

fn slow_resolver(calls: Arc<AtomicUsize>) -> ScopeResolver {
    ScopeResolver::new().with_attribute_resolver(FnAttributeResolver::new(
        "datasources:name:",
        move |_ctx, _org_id, _value: String| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, AccessControlError>("1".to_string())
            }
        },
    ))
}

#[tokio::test]
async fn test_lookup_timeout_propagates() {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = slow_resolver(calls.clone());
    let ctx = ResolveContext::new().with_timeout(Duration::from_millis(20));

    let evaluator = eval_any(vec![eval_permission("datasources:read", ["datasources:name:slow"])]);
    let err = evaluator
        .resolve_scopes(&resolver.attribute_modifier(ctx, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AccessControlError::Timeout { ref scope, .. } if scope == "datasources:name:slow"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout_is_one_deadline_for_the_pass() {
    let resolver = ScopeResolver::new().with_attribute_resolver(FnAttributeResolver::new(
        "teams:name:",
        |_ctx, _org_id, value: String| async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok::<_, AccessControlError>(value)
        },
    ));
    let ctx = ResolveContext::new().with_timeout(Duration::from_millis(50));

    let evaluator = eval_all(
        (0..5)
            .map(|i| eval_permission("teams:read", [format!("teams:name:t{}", i)]))
            .collect(),
    );

    let start = std::time::Instant::now();
    let err = evaluator
        .resolve_scopes(&resolver.attribute_modifier(ctx, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AccessControlError::Timeout { ref scope, .. } if scope == "teams:name:t1"));
    assert!(start.elapsed() < Duration::from_millis(150));
}

#[tokio::test]
async fn test_cancelled_lookup_propagates() {
    let resolver = slow_resolver(Arc::new(AtomicUsize::new(0)));
    let token = CancellationToken::new();
    let ctx = ResolveContext::new().with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let evaluator = eval_permission("datasources:read", ["datasources:name:slow"]);
    let err = evaluator
        .resolve_scopes(&resolver.attribute_modifier(ctx, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AccessControlError::Cancelled(_)));
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_already_cancelled_context_skips_lookup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = slow_resolver(calls.clone());
    let ctx = ResolveContext::new();
    ctx.cancellation_token().cancel();

    let err = AsyncScopeModifier::modify(&resolver.attribute_modifier(ctx, 1), "datasources:name:x")
        .await
        .unwrap_err();

    assert!(matches!(err, AccessControlError::Cancelled(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Composition Tests
// ============================================================================

#[tokio::test]
async fn test_keyword_then_attribute_resolution() {
    let resolver = datasource_resolver().await;
    let user = UserContext::new(2, 1);

    let chained = Chain::new(
        KeywordScopeModifier::new(&user),
        resolver.attribute_modifier(ResolveContext::new(), user.org_id),
    );

    let evaluator = eval_all(vec![
        eval_permission("users:read", ["users:self"]),
        eval_permission("datasources:read", ["datasources:name:testds"]),
        eval_permission("orgs:read", ["orgs:current"]),
    ]);

    let resolved = evaluator.resolve_scopes(&chained).await.unwrap();
    assert_eq!(
        resolved.scopes(),
        vec!["users:id:2", "datasources:id:1", "orgs:id:1"]
    );
}

#[tokio::test]
async fn test_template_error_aborts_resolution() {
    let resolver = datasource_resolver().await;

    let chained = Chain::new(
        ScopeInjector::new(ScopeParams::default()),
        resolver.attribute_modifier(ResolveContext::new(), 1),
    );

    let evaluator = eval_any(vec![
        eval_permission("dashboards:read", ["dashboards:id:{{ .OrgID"]),
        eval_permission("datasources:read", ["datasources:name:testds"]),
    ]);

    let err = evaluator.resolve_scopes(&chained).await.unwrap_err();
    assert!(matches!(err, AccessControlError::Template(TemplateError::Unclosed(_))));
}

#[tokio::test]
async fn test_braces_in_attribute_value_are_not_templates() {
    let store = Arc::new(InMemoryDataSourceStore::new());
    store
        .add(AddDataSourceCommand {
            uid: "prodUID".to_string(),
            org_id: 1,
            name: "{{prod}}".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let resolver = ScopeResolver::new().with_attribute_resolver(DatasourceNameScopeResolver::new(store));
    let user = UserContext::new(2, 1);

    let chained = Chain::new(
        KeywordScopeModifier::new(&user),
        resolver.attribute_modifier(ResolveContext::new(), user.org_id),
    );

    let evaluator = eval_permission("datasources:read", ["datasources:name:{{prod}}"]);
    let resolved = evaluator.resolve_scopes(&chained).await.unwrap();
    assert_eq!(resolved, eval_permission("datasources:read", ["datasources:id:1"]));
}

#[test]
fn test_concurrent_keyword_resolution() {
    use std::thread;

    let evaluator = Arc::new(eval_all(vec![eval_permission("users:read", ["users:self"])]));
    let mut handles = vec![];

    for i in 0..10 {
        let evaluator = Arc::clone(&evaluator);
        handles.push(thread::spawn(move || {
            let user = UserContext::new(i, 1);
            let resolved = evaluator.modify_scopes(&KeywordScopeModifier::new(&user)).unwrap();
            resolved.scopes()[0] == format!("users:id:{}", i)
        }));
    }

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(evaluator.scopes(), vec!["users:self"]);
}
