use log::info;

use super::core::GitLabClient;
use crate::error::Result;
use crate::providers::gitlab::types::{Group, Project, Variable};

impl GitLabClient {
    /// Looks up a group by numeric ID or full path.
    pub async fn show_group(&self, id: &str) -> Result<Group> {
        let mut url = self.endpoint(&["groups", id])?;
        url.query_pairs_mut().append_pair("with_projects", "false");
        self.get(url).await
    }

    /// Groups visible to the user (first page).
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        info!("Fetching groups");
        let url = self.endpoint(&["groups"])?;
        self.get_page(url).await
    }

    pub async fn list_group_projects(&self, group_id: u64) -> Result<Vec<Project>> {
        let url = self.endpoint(&["groups", &group_id.to_string(), "projects"])?;
        self.get_page(url).await
    }

    pub async fn list_subgroups(&self, group_id: u64) -> Result<Vec<Group>> {
        let url = self.endpoint(&["groups", &group_id.to_string(), "subgroups"])?;
        self.get_page(url).await
    }

    pub async fn list_group_variables(&self, group_id: u64) -> Result<Vec<Variable>> {
        let url = self.endpoint(&["groups", &group_id.to_string(), "variables"])?;
        self.get_page(url).await
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::Token;
    use crate::providers::gitlab::client::GitLabClient;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_show_group_by_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/groups/dnet%2Fcatalogos")
            .match_query(Matcher::UrlEncoded("with_projects".into(), "false".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 9, "name": "Catalogos", "path": "catalogos",
                    "full_path": "dnet/catalogos",
                    "web_url": "https://gitlab.com/groups/dnet/catalogos",
                    "parent_id": 4}"#,
            )
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), Token::from("t")).unwrap();
        let group = client.show_group("dnet/catalogos").await.unwrap();

        assert_eq!(group.id, 9);
        assert_eq!(group.parent_id, Some(4));
        assert!(!group.is_top_level());
        mock.assert_async().await;
    }
}
