use std::io::Write;

use log::{debug, info, warn};

use crate::browser::Browser;
use crate::error::{DevopsError, Result};
use crate::output::{self, Presenter};
use crate::prompt::Prompter;
use crate::providers::gitlab::client::GitLabClient;
use crate::providers::gitlab::types::{Environment, Group, Project, Variable};

/// What to do with a resolved project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Info,
    Open,
    Variables,
    /// Reserved for re-running a deployment; does nothing yet.
    Redeploy,
}

impl Action {
    /// Recognizes an action keyword, `None` for anything else.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "open" | "abrir" => Some(Self::Open),
            "variable" | "variables" => Some(Self::Variables),
            "redeploy" => Some(Self::Redeploy),
            _ => None,
        }
    }

    /// Like [`Action::from_keyword`], falling back to `Info`.
    pub fn from_arg(word: &str) -> Self {
        Self::from_keyword(word).unwrap_or_else(|| {
            debug!("Unknown action '{word}', showing info");
            Self::Info
        })
    }
}

/// One invocation of the group/project command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Numeric ID or path; `None` lists top-level groups
    pub identifier: Option<String>,
    pub action: Action,
    /// Environment to select by exact name
    pub environment: Option<String>,
    /// Include stopped environments
    pub include_all: bool,
}

impl Request {
    /// Builds a request from `--id` and the positional arguments.
    ///
    /// With `--id` the positionals are `[ACTION] [ENVIRONMENT]`. Without it
    /// they are `[IDENTIFIER] [ACTION] [ENVIRONMENT]`, except that a leading
    /// action keyword is taken as the action so the identifier can be
    /// inferred from the repository.
    pub fn from_args(id: Option<String>, args: &[String], include_all: bool) -> Self {
        let mut args = args.iter().cloned().peekable();

        let identifier = match id {
            Some(id) => Some(id),
            None => match args.peek() {
                Some(first) if Action::from_keyword(first).is_some() => None,
                _ => args.next(),
            },
        };

        Self {
            identifier,
            action: args.next().map(|a| Action::from_arg(&a)).unwrap_or_default(),
            environment: args.next(),
            include_all,
        }
    }
}

/// A classified identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Group(Group),
    Project(Project),
}

/// Result of the interactive variable creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableOutcome {
    Created,
    Updated,
    /// Duplicate key and the user declined to overwrite
    Kept,
    Failed,
}

/// What a resolution pass showed or did.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    TopLevelGroups(Vec<Group>),
    Group {
        group: Group,
        projects: Vec<Project>,
        variables: Vec<Variable>,
        subgroups: Vec<Group>,
    },
    Project {
        project: Project,
        environments: Vec<Environment>,
        environment: Option<Environment>,
        variables: Vec<Variable>,
        opened: Option<String>,
        variable: Option<VariableOutcome>,
    },
}

/// Keeps available environments unless `include_all` is set.
pub fn select_environments(environments: Vec<Environment>, include_all: bool) -> Vec<Environment> {
    if include_all {
        return environments;
    }
    environments
        .into_iter()
        .filter(Environment::is_available)
        .collect()
}

/// Finds an environment by exact name.
///
/// # Errors
///
/// Returns [`DevopsError::NotFound`] naming the environment when none matches.
pub fn find_environment(environments: &[Environment], name: &str) -> Result<Environment> {
    environments
        .iter()
        .find(|env| env.name == name)
        .cloned()
        .ok_or_else(|| DevopsError::NotFound(format!("environment {name}")))
}

/// Decides whether an identifier names a group or a project and shows it.
///
/// Groups are always tried first: an ID shared by a group and a project
/// resolves to the group.
pub struct ResourceResolver<'a, W: Write> {
    client: &'a GitLabClient,
    presenter: Presenter<W>,
    prompter: &'a dyn Prompter,
    browser: &'a dyn Browser,
}

impl<'a, W: Write> ResourceResolver<'a, W> {
    pub fn new(
        client: &'a GitLabClient,
        presenter: Presenter<W>,
        prompter: &'a dyn Prompter,
        browser: &'a dyn Browser,
    ) -> Self {
        Self {
            client,
            presenter,
            prompter,
            browser,
        }
    }

    pub fn into_presenter(self) -> Presenter<W> {
        self.presenter
    }

    /// Classifies `identifier` as a group or a project.
    ///
    /// # Errors
    ///
    /// Returns [`DevopsError::NotFound`] when it is neither, or the underlying
    /// error when a lookup fails for another reason.
    pub async fn classify(&self, identifier: &str) -> Result<Resource> {
        match self.client.show_group(identifier).await {
            Ok(group) => return Ok(Resource::Group(group)),
            Err(e) if e.is_not_found() => debug!("{identifier} is not a group"),
            Err(e) => {
                warn!("Failed to look up group {identifier}: {e}");
                return Err(e);
            }
        }

        match self.client.show_project(identifier).await {
            Ok(project) => Ok(Resource::Project(project)),
            Err(e) if e.is_not_found() => Err(DevopsError::NotFound(format!(
                "group or project {identifier}"
            ))),
            Err(e) => {
                warn!("Failed to look up project {identifier}: {e}");
                Err(e)
            }
        }
    }

    pub async fn resolve(&mut self, request: &Request) -> Result<Resolution> {
        let Some(identifier) = request.identifier.as_deref() else {
            return self.show_top_level_groups().await;
        };

        info!("Resolving {identifier}");
        match self.classify(identifier).await? {
            Resource::Group(group) => self.show_group(group).await,
            Resource::Project(project) => self.show_project(project, request).await,
        }
    }

    async fn show_top_level_groups(&mut self) -> Result<Resolution> {
        let groups: Vec<Group> = self
            .client
            .list_groups()
            .await?
            .into_iter()
            .filter(Group::is_top_level)
            .collect();

        self.presenter.table("Groups", &groups)?;
        Ok(Resolution::TopLevelGroups(groups))
    }

    async fn show_group(&mut self, group: Group) -> Result<Resolution> {
        info!("{} is group {}", group.full_path, group.id);
        debug!("{group:?}");

        self.presenter.heading(&group.name)?;
        self.presenter.detail("Group ID", group.id)?;
        self.presenter.detail("Path", &group.full_path)?;
        self.presenter.detail("GitLab", &group.web_url)?;

        let projects = self
            .client
            .list_group_projects(group.id)
            .await
            .unwrap_or_else(|e| section_failed("projects", &group.full_path, &e));
        if !projects.is_empty() {
            self.presenter.table("Projects", &projects)?;
        }

        let variables = match self.client.list_group_variables(group.id).await {
            Ok(variables) => {
                self.presenter.table("Variables", &variables)?;
                variables
            }
            Err(e) => section_failed("variables", &group.full_path, &e),
        };

        let subgroups = self
            .client
            .list_subgroups(group.id)
            .await
            .unwrap_or_else(|e| section_failed("subgroups", &group.full_path, &e));
        if !subgroups.is_empty() {
            self.presenter.table("Subgroups", &subgroups)?;
        }

        Ok(Resolution::Group {
            group,
            projects,
            variables,
            subgroups,
        })
    }

    async fn show_project(&mut self, project: Project, request: &Request) -> Result<Resolution> {
        info!("{} is project {}", project.path_with_namespace, project.id);
        debug!("{project:?}");

        self.presenter.heading(&project.name)?;
        self.presenter.detail("Project ID", project.id)?;
        self.presenter.detail("Path", &project.path_with_namespace)?;
        self.presenter.detail("GitLab", &project.web_url)?;
        self.presenter.detail(
            "Group",
            format!("{} | {}", project.namespace.full_path, project.namespace.name),
        )?;

        // Without an environment to match, missing environments only cost a table
        let environments = match self.client.list_environments(project.id).await {
            Ok(environments) => select_environments(environments, request.include_all),
            Err(e) if request.environment.is_none() => {
                section_failed("environments", &project.path_with_namespace, &e)
            }
            Err(e) => return Err(e),
        };

        let environment = request
            .environment
            .as_deref()
            .map(|name| find_environment(&environments, name))
            .transpose()?;

        let variables = self
            .client
            .list_project_variables(project.id)
            .await
            .unwrap_or_else(|e| section_failed("variables", &project.path_with_namespace, &e));

        let mut opened = None;
        let mut variable = None;

        match request.action {
            Action::Open => {
                let url = match environment.as_ref().and_then(|e| e.external_url.as_ref()) {
                    Some(url) => {
                        let name = environment.as_ref().map_or("", |e| e.name.as_str());
                        self.presenter
                            .message(format!("Opening environment \"{name}\" in the browser: {url}"))?;
                        url.clone()
                    }
                    None => project.web_url.clone(),
                };
                self.browser.open(&url)?;
                opened = Some(url);
            }
            Action::Variables => {
                self.presenter.table("Variables", &variables)?;
                variable = Some(self.add_variable(&project).await?);
            }
            Action::Redeploy => {
                info!("Redeploy is not available yet");
            }
            Action::Info => {
                if !variables.is_empty() {
                    self.presenter.table("Variables", &variables)?;
                }
                if !environments.is_empty() {
                    self.presenter.table("Environments", &environments)?;
                }
            }
        }

        Ok(Resolution::Project {
            project,
            environments,
            environment,
            variables,
            opened,
            variable,
        })
    }

    /// Prompts for a variable and creates it, asking before overwriting.
    async fn add_variable(&mut self, project: &Project) -> Result<VariableOutcome> {
        let new_variable = self.prompter.new_variable(project)?;

        match self
            .client
            .create_project_variable(project.id, &new_variable)
            .await
        {
            Ok(created) => {
                self.presenter.message(format!("Created {}", created.key))?;
                Ok(VariableOutcome::Created)
            }
            Err(DevopsError::Conflict(_)) => {
                if !self.prompter.confirm_overwrite(&new_variable.key)? {
                    debug!("Keeping existing variable {}", new_variable.key);
                    return Ok(VariableOutcome::Kept);
                }
                match self
                    .client
                    .edit_project_variable(project.id, &new_variable)
                    .await
                {
                    Ok(updated) => {
                        self.presenter.message(format!("Updated {}", updated.key))?;
                        Ok(VariableOutcome::Updated)
                    }
                    Err(e) => {
                        output::warn(format!("Failed to update variable {}: {e}", new_variable.key));
                        Ok(VariableOutcome::Failed)
                    }
                }
            }
            Err(e) => {
                output::warn(format!("Failed to create variable {}: {e}", new_variable.key));
                Ok(VariableOutcome::Failed)
            }
        }
    }
}

fn section_failed<T>(section: &str, owner: &str, error: &DevopsError) -> Vec<T> {
    output::warn(format!("Could not list {section} of {owner}: {error}"));
    Vec::new()
}
