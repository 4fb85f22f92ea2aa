use log::info;

use super::core::GitLabClient;
use crate::error::Result;
use crate::providers::gitlab::types::{Environment, NewVariable, Project, Variable};

impl GitLabClient {
    /// Looks up a project by numeric ID or `namespace/project` path.
    pub async fn show_project(&self, id: &str) -> Result<Project> {
        let url = self.endpoint(&["projects", id])?;
        self.get(url).await
    }

    pub async fn list_environments(&self, project_id: u64) -> Result<Vec<Environment>> {
        let url = self.endpoint(&["projects", &project_id.to_string(), "environments"])?;
        self.get_page(url).await
    }

    pub async fn list_project_variables(&self, project_id: u64) -> Result<Vec<Variable>> {
        let url = self.endpoint(&["projects", &project_id.to_string(), "variables"])?;
        self.get_page(url).await
    }

    /// Creates a project variable.
    ///
    /// # Errors
    ///
    /// Returns [`DevopsError::Conflict`](crate::error::DevopsError::Conflict)
    /// when a variable with the same key already exists in that scope.
    pub async fn create_project_variable(
        &self,
        project_id: u64,
        variable: &NewVariable,
    ) -> Result<Variable> {
        info!("Creating variable {} in project {project_id}", variable.key);
        let url = self.endpoint(&["projects", &project_id.to_string(), "variables"])?;
        self.send(self.client().post(url).json(variable)).await
    }

    /// Overwrites the variable with the same key and environment scope.
    pub async fn edit_project_variable(
        &self,
        project_id: u64,
        variable: &NewVariable,
    ) -> Result<Variable> {
        info!("Updating variable {} in project {project_id}", variable.key);
        let mut url = self.endpoint(&[
            "projects",
            &project_id.to_string(),
            "variables",
            &variable.key,
        ])?;
        url.query_pairs_mut()
            .append_pair("filter[environment_scope]", &variable.environment_scope);
        self.send(self.client().put(url).json(variable)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::Token;
    use crate::error::DevopsError;
    use crate::providers::gitlab::client::GitLabClient;
    use crate::providers::gitlab::types::NewVariable;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_create_duplicate_variable_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v4/projects/72/variables")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "key": "API_URL",
                "environment_scope": "*"
            })))
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":{"key":["(API_URL) has already been taken"]}}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), Token::from("t")).unwrap();
        let err = client
            .create_project_variable(72, &NewVariable::new("API_URL", "https://api"))
            .await
            .unwrap_err();

        match err {
            DevopsError::Conflict(key) => assert_eq!(key, "API_URL"),
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_variable_filters_by_scope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v4/projects/72/variables/API_URL")
            .match_query(Matcher::UrlEncoded(
                "filter[environment_scope]".into(),
                "production".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"key":"API_URL","value":"https://new","environment_scope":"production"}"#,
            )
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), Token::from("t")).unwrap();
        let mut variable = NewVariable::new("API_URL", "https://new");
        variable.environment_scope = "production".into();

        let updated = client.edit_project_variable(72, &variable).await.unwrap();
        assert_eq!(updated.value, "https://new");
        mock.assert_async().await;
    }
}
