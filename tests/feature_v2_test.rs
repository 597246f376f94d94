mod common;

use anyhow::Result;
use common::{admin, provider_for, state, TOKEN};
use httpmock::prelude::*;
use serde_json::json;
use unleash_provider::ProviderError;

fn checkout_config() -> serde_json::Value {
    json!({
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "description": "new checkout",
        "environment": [{
            "name": "production",
            "strategy": [{
                "name": "flexibleRollout",
                "parameters": {"rollout": "50", "stickiness": "default", "groupId": "checkout"},
                "constraint": [{"context_name": "userId", "operator": "IN", "values": ["1", "2"]}]
            }]
        }],
        "tag": [{"value": "web"}]
    })
}

#[tokio::test]
async fn test_create_provisions_environments_and_tags() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features"))
                .header("Authorization", TOKEN)
                .json_body(json!({
                    "name": "checkout",
                    "description": "new checkout",
                    "type": "release",
                    "project": "default"
                }));
            then.status(201)
                .json_body(json!({"name": "checkout", "type": "release", "project": "default"}));
        })
        .await;
    let strategy = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features/checkout/environments/production/strategies"))
                .body_contains("\"contextName\":\"userId\"");
            then.status(200)
                .json_body(json!({"id": "s-1", "name": "flexibleRollout"}));
        })
        .await;
    let enable = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features/checkout/environments/production/on"));
            then.status(200);
        })
        .await;
    let tag = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/features/checkout/tags"))
                .json_body(json!({"type": "simple", "value": "web"}));
            then.status(201).json_body(json!({"type": "simple", "value": "web"}));
        })
        .await;
    let read = server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/default/features/checkout"));
            then.status(200).json_body(json!({
                "name": "checkout",
                "description": "new checkout",
                "type": "release",
                "project": "default",
                "environments": [
                    {"name": "development", "enabled": false, "strategies": []},
                    {"name": "production", "enabled": true, "strategies": [{
                        "id": "s-1",
                        "name": "flexibleRollout",
                        "parameters": {"rollout": 50, "stickiness": "default", "groupId": "checkout"},
                        "constraints": [{"contextName": "userId", "operator": "IN", "values": ["1", "2"]}]
                    }]}
                ]
            }));
        })
        .await;
    let tags = server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/features/checkout/tags"));
            then.status(200).json_body(json!({"tags": [
                {"type": "simple", "value": "web"},
                {"type": "simple", "value": "added-elsewhere"}
            ]}));
        })
        .await;

    let plan = provider.plan_resource_change(
        "unleash_feature_v2",
        None,
        Some(state(checkout_config())),
    )?;
    let created = provider
        .apply_resource_change("unleash_feature_v2", None, plan.planned_state)
        .await?
        .expect("state after create");

    create.assert_async().await;
    strategy.assert_async().await;
    enable.assert_async().await;
    tag.assert_async().await;
    read.assert_async().await;
    tags.assert_async().await;

    assert_eq!(created["id"], json!("checkout"));
    assert_eq!(created["archive_on_destroy"], json!(true));
    let environments = created["environment"].as_array().unwrap();
    assert_eq!(environments.len(), 1);
    assert_eq!(environments[0]["name"], json!("production"));
    let saved = &environments[0]["strategy"][0];
    assert_eq!(saved["id"], json!("s-1"));
    assert_eq!(saved["parameters"]["rollout"], json!("50"));
    assert_eq!(saved["constraint"][0]["values"], json!(["1", "2"]));
    assert_eq!(created["tag"], json!([{"type": "simple", "value": "web"}]));
    Ok(())
}

#[tokio::test]
async fn test_create_rolls_back_when_a_strategy_fails() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    server
        .mock_async(|when, then| {
            when.method(POST).path(admin("/projects/default/features"));
            then.status(201)
                .json_body(json!({"name": "checkout", "type": "release", "project": "default"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features/checkout/environments/production/strategies"));
            then.status(400).body("{\"message\":\"unknown strategy\"}");
        })
        .await;
    let archive = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/projects/default/features/checkout"));
            then.status(202);
        })
        .await;
    let purge = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/archive/checkout"));
            then.status(200);
        })
        .await;

    let plan = provider.plan_resource_change(
        "unleash_feature_v2",
        None,
        Some(state(checkout_config())),
    )?;
    let err = provider
        .apply_resource_change("unleash_feature_v2", None, plan.planned_state)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ApiStatusError { status: 400, .. }));
    archive.assert_async().await;
    purge.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_update_reconciles_environments_and_tags() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let prior = state(json!({
        "id": "checkout",
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "description": "",
        "archive_on_destroy": true,
        "environment": [
            {"name": "production", "enabled": true, "strategy": [
                {"id": "s-1", "name": "default", "parameters": {}, "constraint": [], "variant": []},
                {"id": "s-2", "name": "userWithId", "parameters": {"userIds": "1"}, "constraint": [], "variant": []}
            ]},
            {"name": "staging", "enabled": true, "strategy": [
                {"id": "s-3", "name": "default", "parameters": {}, "constraint": [], "variant": []}
            ]}
        ],
        "tag": [{"type": "simple", "value": "web"}, {"type": "simple", "value": "old"}]
    }));
    let planned = state(json!({
        "id": "checkout",
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "description": "",
        "archive_on_destroy": true,
        "environment": [
            {"name": "production", "enabled": true, "strategy": [
                {"id": "s-1", "name": "default"},
                {"name": "flexibleRollout", "parameters": {"rollout": "25"}}
            ]},
            {"name": "development", "enabled": true, "strategy": [{"name": "default"}]}
        ],
        "tag": [{"type": "simple", "value": "web"}, {"type": "simple", "value": "new"}]
    }));

    let strategies = |env: &str| admin(&format!(
        "/projects/default/features/checkout/environments/{}/strategies",
        env
    ));
    let toggle = |env: &str, onoff: &str| admin(&format!(
        "/projects/default/features/checkout/environments/{}/{}",
        env, onoff
    ));

    let update_feature = server
        .mock_async(|when, then| {
            when.method(PUT).path(admin("/projects/default/features/checkout"));
            then.status(200)
                .json_body(json!({"name": "checkout", "type": "release", "project": "default"}));
        })
        .await;
    let update_tags = server
        .mock_async(|when, then| {
            when.method(PUT).path(admin("/features/checkout/tags")).json_body(json!({
                "addedTags": [{"type": "simple", "value": "new"}],
                "removedTags": [{"type": "simple", "value": "old"}]
            }));
            then.status(200);
        })
        .await;
    let update_s1 = server
        .mock_async(|when, then| {
            when.method(PUT).path(format!("{}/s-1", strategies("production")));
            then.status(200).json_body(json!({"id": "s-1", "name": "default"}));
        })
        .await;
    let add_rollout = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(strategies("production"))
                .body_contains("\"rollout\":\"25\"");
            then.status(200)
                .json_body(json!({"id": "s-4", "name": "flexibleRollout"}));
        })
        .await;
    let delete_s2 = server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{}/s-2", strategies("production")));
            then.status(200);
        })
        .await;
    let production_on = server
        .mock_async(|when, then| {
            when.method(POST).path(toggle("production", "on"));
            then.status(200);
        })
        .await;
    let delete_s3 = server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{}/s-3", strategies("staging")));
            then.status(200);
        })
        .await;
    let staging_off = server
        .mock_async(|when, then| {
            when.method(POST).path(toggle("staging", "off"));
            then.status(200);
        })
        .await;
    let add_development = server
        .mock_async(|when, then| {
            when.method(POST).path(strategies("development"));
            then.status(200).json_body(json!({"id": "s-5", "name": "default"}));
        })
        .await;
    let development_on = server
        .mock_async(|when, then| {
            when.method(POST).path(toggle("development", "on"));
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/default/features/checkout"));
            then.status(200).json_body(json!({
                "name": "checkout",
                "type": "release",
                "project": "default",
                "environments": [
                    {"name": "development", "enabled": true, "strategies": [{"id": "s-5", "name": "default"}]},
                    {"name": "production", "enabled": true, "strategies": [
                        {"id": "s-1", "name": "default"},
                        {"id": "s-4", "name": "flexibleRollout", "parameters": {"rollout": "25"}}
                    ]},
                    {"name": "staging", "enabled": false, "strategies": []}
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/features/checkout/tags"));
            then.status(200).json_body(json!({"tags": [
                {"type": "simple", "value": "web"},
                {"type": "simple", "value": "new"}
            ]}));
        })
        .await;

    let updated = provider
        .apply_resource_change("unleash_feature_v2", Some(prior), Some(planned))
        .await?
        .expect("state after update");

    update_feature.assert_async().await;
    update_tags.assert_async().await;
    update_s1.assert_async().await;
    add_rollout.assert_async().await;
    delete_s2.assert_async().await;
    production_on.assert_async().await;
    delete_s3.assert_async().await;
    staging_off.assert_async().await;
    add_development.assert_async().await;
    development_on.assert_async().await;

    let names: Vec<_> = updated["environment"]
        .as_array()
        .unwrap()
        .iter()
        .map(|env| env["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("production"), json!("development")]);
    assert_eq!(updated["environment"][0]["strategy"][1]["id"], json!("s-4"));
    assert_eq!(updated["tag"][1]["value"], json!("new"));
    Ok(())
}

#[tokio::test]
async fn test_delete_without_archive_purges_feature() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let archive = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/projects/default/features/checkout"));
            then.status(202);
        })
        .await;
    let purge = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/archive/checkout"));
            then.status(200);
        })
        .await;

    let prior = state(json!({
        "id": "checkout",
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "archive_on_destroy": false
    }));
    let result = provider
        .apply_resource_change("unleash_feature_v2", Some(prior), None)
        .await?;

    assert!(result.is_none());
    archive.assert_async().await;
    purge.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_read_drops_missing_feature() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/default/features/checkout"));
            then.status(404).json_body(json!({"message": "not found"}));
        })
        .await;

    let current = state(json!({
        "id": "checkout",
        "name": "checkout",
        "project_id": "default",
        "type": "release"
    }));
    let refreshed = provider.read_resource("unleash_feature_v2", current).await?;
    assert!(refreshed.is_none());
    Ok(())
}

#[tokio::test]
async fn test_create_rolls_back_when_a_tag_fails() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(admin("/projects/default/features"));
            then.status(201)
                .json_body(json!({"name": "checkout", "type": "release", "project": "default"}));
        })
        .await;
    let tag = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/features/checkout/tags"))
                .json_body(json!({"type": "simple", "value": "web"}));
            then.status(500).body("tag store unavailable");
        })
        .await;
    let archive = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/projects/default/features/checkout"));
            then.status(202);
        })
        .await;
    let purge = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/archive/checkout"));
            then.status(200);
        })
        .await;

    let config = state(json!({
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "tag": [{"value": "web"}]
    }));
    let plan = provider.plan_resource_change("unleash_feature_v2", None, Some(config))?;
    let err = provider
        .apply_resource_change("unleash_feature_v2", None, plan.planned_state)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ApiStatusError { status: 500, .. }));
    create.assert_async().await;
    tag.assert_async().await;
    archive.assert_async().await;
    purge.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_unchanged_config_plans_no_change() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/default/features/checkout"));
            then.status(200).json_body(json!({
                "name": "checkout",
                "type": "release",
                "project": "default",
                "environments": [
                    {"name": "production", "enabled": true, "strategies": [{"id": "s-1", "name": "default"}]}
                ]
            }));
        })
        .await;
    let update_feature = server
        .mock_async(|when, then| {
            when.method(PUT).path(admin("/projects/default/features/checkout"));
            then.status(200)
                .json_body(json!({"name": "checkout", "type": "release", "project": "default"}));
        })
        .await;
    let update_strategy = server
        .mock_async(|when, then| {
            when.method(PUT).path(admin(
                "/projects/default/features/checkout/environments/production/strategies/s-1",
            ));
            then.status(200).json_body(json!({"id": "s-1", "name": "default"}));
        })
        .await;
    let enable = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features/checkout/environments/production/on"));
            then.status(200);
        })
        .await;

    let config = json!({
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "environment": [{"name": "production", "strategy": [{"name": "default"}]}]
    });
    let stored = state(json!({
        "id": "checkout",
        "name": "checkout",
        "project_id": "default",
        "type": "release",
        "archive_on_destroy": true,
        "environment": [{"name": "production", "enabled": true, "strategy": [{"id": "s-1", "name": "default"}]}]
    }));
    let prior = provider
        .read_resource("unleash_feature_v2", stored)
        .await?
        .expect("feature exists");
    assert_eq!(prior["description"], json!(""));
    assert_eq!(prior["environment"][0]["strategy"][0]["variant"], json!([]));

    let plan = provider.plan_resource_change(
        "unleash_feature_v2",
        Some(prior.clone()),
        Some(state(config)),
    )?;
    assert!(plan.requires_replace.is_empty());
    assert_eq!(plan.planned_state.as_ref(), Some(&prior));

    let applied = provider
        .apply_resource_change("unleash_feature_v2", Some(prior.clone()), plan.planned_state)
        .await?;
    assert_eq!(applied, Some(prior));
    update_feature.assert_hits_async(0).await;
    update_strategy.assert_hits_async(0).await;
    enable.assert_hits_async(0).await;
    Ok(())
}
