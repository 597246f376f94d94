use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggle {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub feature_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing)]
    pub stale: bool,
    #[serde(default, skip_serializing)]
    pub archived: bool,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub environments: Vec<Environment>,
    #[serde(default, skip_serializing)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub strategies: Vec<FeatureStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStrategy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    // Unleash stores parameters as strings but older servers echo typed values.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub constraints: Vec<StrategyConstraint>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConstraint {
    pub context_name: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub stickiness: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub weight_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<VariantPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureTag {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureTags {
    #[serde(default)]
    pub tags: Vec<FeatureTag>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeatureTags {
    pub added_tags: Vec<FeatureTag>,
    pub removed_tags: Vec<FeatureTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureType {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lifetime_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureTypes {
    #[serde(default)]
    pub types: Vec<FeatureType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategyParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub parameter_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategyDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<StrategyParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing)]
    pub environments: Vec<ProjectEnvironment>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectEnvironment {
    pub environment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub root_role: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub email_sent: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub root_role: i64,
    pub send_email: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToken {
    pub secret: String,
    #[serde(default)]
    pub token_name: Option<String>,
    // Older servers only send the deprecated username field.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "type", default)]
    pub token_type: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ApiToken {
    pub fn name(&self) -> &str {
        self.token_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTokens {
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiToken {
    pub token_name: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub environment: String,
    pub projects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiToken {
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_serializes_only_writable_fields() {
        let feature = FeatureToggle {
            name: "checkout".to_string(),
            description: "new checkout".to_string(),
            feature_type: "release".to_string(),
            project: "default".to_string(),
            stale: true,
            ..Default::default()
        };
        let body = serde_json::to_value(&feature).unwrap();
        assert_eq!(
            body,
            json!({"name": "checkout", "description": "new checkout", "type": "release", "project": "default"})
        );
    }

    #[test]
    fn test_feature_deserializes_environments_and_strategies() {
        let feature: FeatureToggle = serde_json::from_value(json!({
            "name": "checkout",
            "type": "release",
            "project": "default",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "environments": [{
                "name": "production",
                "enabled": true,
                "strategies": [{
                    "id": "abc",
                    "name": "flexibleRollout",
                    "parameters": {"rollout": "50", "groupId": "checkout"},
                    "constraints": [{"contextName": "userId", "operator": "IN", "values": ["1"]}]
                }]
            }]
        }))
        .unwrap();
        assert_eq!(feature.created_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        let strategy = &feature.environments[0].strategies[0];
        assert_eq!(strategy.id, "abc");
        assert_eq!(strategy.constraints[0].context_name, "userId");
        assert!(!strategy.constraints[0].case_insensitive);
    }

    #[test]
    fn test_api_token_name_prefers_token_name() {
        let token: ApiToken = serde_json::from_value(json!({
            "secret": "default:development.abc",
            "tokenName": "ci",
            "username": "ci-legacy",
            "type": "client"
        }))
        .unwrap();
        assert_eq!(token.name(), "ci");

        let legacy: ApiToken =
            serde_json::from_value(json!({"secret": "s", "username": "old", "type": "admin"}))
                .unwrap();
        assert_eq!(legacy.name(), "old");
    }
}
