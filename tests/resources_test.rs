mod common;

use anyhow::Result;
use common::{admin, provider_for, state};
use httpmock::prelude::*;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use unleash_provider::ProviderError;

fn rollout_definition() -> serde_json::Value {
    json!({
        "name": "flexibleRollout",
        "description": "Gradual rollout",
        "parameters": [
            {"name": "rollout", "type": "percentage", "required": true},
            {"name": "stickiness", "type": "string", "required": true},
            {"name": "groupId", "type": "string", "required": false}
        ]
    })
}

#[tokio::test]
async fn test_strategy_assignment_create_and_read() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let definition = server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/strategies/flexibleRollout"));
            then.status(200).json_body(rollout_definition());
        })
        .await;
    let add = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features/checkout/environments/production/strategies"))
                .body_contains("\"rollout\":\"30\"")
                .body_contains("\"weightType\":\"fix\"");
            then.status(200)
                .json_body(json!({"id": "s-9", "name": "flexibleRollout"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/default/features/checkout"));
            then.status(200).json_body(json!({
                "name": "checkout",
                "type": "release",
                "project": "default",
                "environments": [{"name": "production", "enabled": true, "strategies": [
                    {"id": "s-0", "name": "default"},
                    {
                        "id": "s-9",
                        "name": "flexibleRollout",
                        "parameters": {"rollout": "30", "stickiness": "default", "groupId": "checkout"},
                        "variants": [
                            {"name": "red", "weight": 0, "weightType": "variable", "stickiness": "default"},
                            {"name": "blue", "weight": 1000, "weightType": "fix", "stickiness": "default"}
                        ]
                    }
                ]}]
            }));
        })
        .await;

    let config = state(json!({
        "feature_name": "checkout",
        "project_id": "default",
        "environment": "production",
        "strategy_name": "flexibleRollout",
        "parameters": {"rollout": "30", "stickiness": "default", "groupId": "checkout"},
        "variant": [{"name": "blue", "weight": 1000, "weight_type": "fix"}]
    }));
    let plan = provider.plan_resource_change("unleash_strategy_assignment", None, Some(config))?;
    let created = provider
        .apply_resource_change("unleash_strategy_assignment", None, plan.planned_state)
        .await?
        .expect("state after create");

    add.assert_async().await;
    definition.assert_hits_async(2).await;
    assert_eq!(created["id"], json!("s-9"));
    assert_eq!(created["strategy_id"], json!("s-9"));
    assert_eq!(created["parameters"]["rollout"], json!("30"));
    assert_eq!(created["variant"].as_array().unwrap().len(), 1);
    assert_eq!(created["variant"][0]["name"], json!("blue"));
    Ok(())
}

#[tokio::test]
async fn test_strategy_assignment_requires_declared_parameters() {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/strategies/flexibleRollout"));
            then.status(200).json_body(rollout_definition());
        })
        .await;
    let add = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(admin("/projects/default/features/checkout/environments/production/strategies"));
            then.status(200).json_body(json!({"id": "s-9", "name": "flexibleRollout"}));
        })
        .await;

    let planned = state(json!({
        "feature_name": "checkout",
        "project_id": "default",
        "environment": "production",
        "strategy_name": "flexibleRollout",
        "parameters": {"rollout": "30"}
    }));
    let result = provider
        .apply_resource_change("unleash_strategy_assignment", None, Some(planned))
        .await;

    let err = assert_err!(result);
    assert!(matches!(err, ProviderError::StrategyParametersRequired));
    add.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_user_lifecycle() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(admin("/user-admin")).json_body(json!({
                "name": "Jo",
                "email": "jo@example.com",
                "username": "jo",
                "rootRole": 2,
                "sendEmail": true
            }));
            then.status(201).json_body(json!({
                "id": 7,
                "name": "Jo",
                "email": "jo@example.com",
                "username": "jo",
                "rootRole": 2,
                "inviteLink": "http://unleash/invite/abc",
                "emailSent": true
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/user-admin/7"));
            then.status(200).json_body(json!({
                "id": 7,
                "name": "Jo",
                "email": "jo@example.com",
                "username": "jo",
                "rootRole": 2
            }));
        })
        .await;
    let remove = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/user-admin/7"));
            then.status(200);
        })
        .await;

    let config = state(json!({
        "name": "Jo",
        "email": "jo@example.com",
        "username": "jo",
        "root_role": "Editor"
    }));
    let plan = provider.plan_resource_change("unleash_user", None, Some(config))?;
    let created = provider
        .apply_resource_change("unleash_user", None, plan.planned_state)
        .await?
        .expect("state after create");

    create.assert_async().await;
    assert_eq!(created["id"], json!("7"));
    assert_eq!(created["user_id"], json!(7));
    assert_eq!(created["root_role"], json!("Editor"));
    assert_eq!(created["invite_link"], json!("http://unleash/invite/abc"));
    assert_eq!(created["email_sent"], json!(true));

    let gone = provider
        .apply_resource_change("unleash_user", Some(created), None)
        .await?;
    assert!(gone.is_none());
    remove.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_api_token_create_and_extend() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let secret = "default:development.4f1c2d";
    let token = json!({
        "secret": secret,
        "tokenName": "ci",
        "type": "client",
        "environment": "development",
        "projects": ["*"],
        "createdAt": "2024-05-01T12:00:00.000Z"
    });

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(admin("/api-tokens")).json_body(json!({
                "tokenName": "ci",
                "type": "client",
                "environment": "development",
                "projects": ["*"],
                "expiresAt": "2030-01-01T00:00:00Z"
            }));
            then.status(201).json_body(token.clone());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/api-tokens"));
            then.status(200).json_body(json!({"tokens": [token]}));
        })
        .await;
    let extend = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(admin(&format!("/api-tokens/{}", secret)))
                .json_body(json!({"expiresAt": "2031-06-30T00:00:00Z"}));
            then.status(200);
        })
        .await;

    let config = state(json!({
        "username": "ci",
        "type": "client",
        "expires_at": "2030-01-01T01:00:00+01:00"
    }));
    let plan = provider.plan_resource_change("unleash_api_token", None, Some(config))?;
    let created = provider
        .apply_resource_change("unleash_api_token", None, plan.planned_state)
        .await?
        .expect("state after create");

    create.assert_async().await;
    assert_eq!(created["id"], json!(format!("{:x}", md5::compute(secret))));
    assert_eq!(created["secret"], json!(secret));
    assert_eq!(created["created_at"], json!("2024-05-01T12:00:00Z"));
    assert_eq!(created["environment"], json!("development"));

    let mut proposed = created.clone();
    proposed.insert("expires_at".to_string(), json!("2031-06-30T00:00:00Z"));
    let plan = provider.plan_resource_change(
        "unleash_api_token",
        Some(created.clone()),
        Some(proposed),
    )?;
    assert!(plan.requires_replace.is_empty());

    let updated = provider
        .apply_resource_change("unleash_api_token", Some(created), plan.planned_state)
        .await;
    assert_ok!(&updated);
    extend.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_project_create_uses_description() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(admin("/projects")).json_body(json!({
                "id": "web",
                "name": "Web",
                "description": "Web team"
            }));
            then.status(201)
                .json_body(json!({"id": "web", "name": "Web", "description": "Web team"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/web"));
            then.status(200)
                .json_body(json!({"id": "web", "name": "Web", "description": "Web team"}));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT).path(admin("/projects/web")).json_body(json!({
                "id": "web",
                "name": "Web Platform",
                "description": "Web team"
            }));
            then.status(200);
        })
        .await;

    let config = state(json!({"id": "web", "name": "Web", "description": "Web team"}));
    let created = provider
        .apply_resource_change("unleash_project", None, Some(config))
        .await?
        .expect("state after create");
    create.assert_async().await;
    assert_eq!(created["id"], json!("web"));

    let renamed = state(json!({"id": "web", "name": "Web Platform", "description": "Web team"}));
    provider
        .apply_resource_change("unleash_project", Some(created), Some(renamed))
        .await?;
    update.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_feature_enabling_switches_environment() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let env_path = admin("/projects/default/features/checkout/environments/production");

    let on = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/on", env_path));
            then.status(200);
        })
        .await;
    let off = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/off", env_path));
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/default/features/checkout"));
            then.status(200).json_body(json!({
                "name": "checkout",
                "project": "default",
                "environments": [{"name": "production", "enabled": true}]
            }));
        })
        .await;

    let config = state(json!({
        "feature_name": "checkout",
        "project_id": "default",
        "environment": "production"
    }));
    let created = provider
        .apply_resource_change("unleash_feature_enabling", None, Some(config))
        .await?
        .expect("state after create");
    on.assert_async().await;
    assert_eq!(created["id"], json!("checkout/production"));
    assert_eq!(created["enabled"], json!(true));

    provider
        .apply_resource_change("unleash_feature_enabling", Some(created), None)
        .await?;
    off.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_feature_replace_when_project_changes() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);

    let archive = server
        .mock_async(|when, then| {
            when.method(DELETE).path(admin("/projects/default/features/checkout"));
            then.status(202);
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(admin("/projects/web/features"));
            then.status(201)
                .json_body(json!({"name": "checkout", "type": "release", "project": "web"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/projects/web/features/checkout"));
            then.status(200)
                .json_body(json!({"name": "checkout", "type": "release", "description": "", "project": "web"}));
        })
        .await;

    let prior = state(json!({
        "id": "checkout",
        "name": "checkout",
        "project_id": "default",
        "type": "release"
    }));
    let planned = state(json!({"name": "checkout", "project_id": "web", "type": "release"}));
    let replaced = provider
        .apply_resource_change("unleash_feature", Some(prior), Some(planned))
        .await?
        .expect("state after replace");

    archive.assert_async().await;
    create.assert_async().await;
    assert_eq!(replaced["project_id"], json!("web"));
    Ok(())
}

#[tokio::test]
async fn test_strategy_assignment_update_clears_variants_and_delete() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let strategy_path =
        admin("/projects/default/features/checkout/environments/production/strategies/s-9");

    server
        .mock_async(|when, then| {
            when.method(GET).path(admin("/strategies/flexibleRollout"));
            then.status(200).json_body(rollout_definition());
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(strategy_path.clone())
                .body_contains("\"id\":\"s-9\"")
                .body_contains("\"rollout\":\"60\"")
                .body_contains("\"variants\":[]");
            then.status(200)
                .json_body(json!({"id": "s-9", "name": "flexibleRollout"}));
        })
        .await;
    let remove = server
        .mock_async(|when, then| {
            when.method(DELETE).path(strategy_path.clone());
            then.status(200);
        })
        .await;

    let prior = state(json!({
        "id": "s-9",
        "feature_name": "checkout",
        "project_id": "default",
        "environment": "production",
        "strategy_name": "flexibleRollout",
        "strategy_id": "s-9",
        "parameters": {"rollout": "30", "stickiness": "default"},
        "variant": [{"name": "blue", "stickiness": "default", "weight": 1000, "weight_type": "fix"}]
    }));
    let proposed = state(json!({
        "feature_name": "checkout",
        "project_id": "default",
        "environment": "production",
        "strategy_name": "flexibleRollout",
        "parameters": {"rollout": "60", "stickiness": "default"}
    }));
    let plan = provider.plan_resource_change(
        "unleash_strategy_assignment",
        Some(prior.clone()),
        Some(proposed),
    )?;
    assert!(plan.requires_replace.is_empty());

    let updated = provider
        .apply_resource_change("unleash_strategy_assignment", Some(prior), plan.planned_state)
        .await?
        .expect("state after update");
    update.assert_async().await;
    assert_eq!(updated["id"], json!("s-9"));
    assert_eq!(updated["parameters"]["rollout"], json!("60"));

    let gone = provider
        .apply_resource_change("unleash_strategy_assignment", Some(updated), None)
        .await?;
    assert!(gone.is_none());
    remove.assert_async().await;
    Ok(())
}
