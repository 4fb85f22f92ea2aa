use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use crate::auth::Token;
use crate::browser::SystemBrowser;
use crate::config::{ConfigStore, StoredConfig};
use crate::credentials::{CredentialOverrides, CredentialResolver};
use crate::git;
use crate::login::{self, LoginOutcome};
use crate::output::{self, Presenter, Spinner, TableOptions};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::providers::gitlab::client::GitLabClient;
use crate::providers::gitlab::resolver::{Request, ResourceResolver};

#[derive(Parser)]
#[command(name = "devops")]
#[command(author, version, about = "GitLab groups, projects, environments and CI/CD variables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitLab host [env: GITLAB_HOST]
    #[arg(long, global = true)]
    host: Option<String>,

    /// GitLab personal access token [env: GITLAB_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,

    /// Include debug information
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the GitLab server and access token
    Login,

    /// Forget the stored access token
    Logout,

    /// Set or reset the stored configuration
    Config {
        #[arg(value_enum)]
        action: Option<ConfigAction>,
    },

    /// Inspect a GitLab group or project
    #[command(visible_alias = "gl")]
    Gitlab(GitlabArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ConfigAction {
    /// Forget host and token
    Reset,
}

#[derive(Args, Debug, Clone)]
struct GitlabArgs {
    /// [IDENTIFIER] [ACTION] [ENVIRONMENT]; ACTION is info (default), open,
    /// variables or redeploy
    #[arg(value_name = "ARGS", num_args = 0..=3)]
    args: Vec<String>,

    /// Group or project ID or path, e.g. dgti, dnet/catalogos, 72
    #[arg(long)]
    id: Option<String>,

    /// Include every environment instead of only available ones
    #[arg(short, long, default_value_t = false)]
    all: bool,

    #[command(flatten)]
    table: TableOptions,
}

impl Cli {
    fn overrides(&self) -> CredentialOverrides {
        CredentialOverrides {
            host: self.host.clone(),
            token: self.token.clone(),
        }
    }

    async fn execute_login(&self, store: &ConfigStore) -> Result<()> {
        // The stored pair is what is being replaced, so only flags and env count
        let resolver = CredentialResolver::new(None);
        let overrides = self.overrides();
        let prompter = TerminalPrompter::new();

        let host = match resolver.host(&overrides) {
            Some(host) => host,
            None => prompter.choose_host()?,
        };
        let token = match resolver.token(&overrides) {
            Some(token) => token,
            None => prompter.enter_token()?,
        };

        let spinner = Spinner::start(format!("Verifying token with {host}"));
        match login::verify_and_save(store, &host, Token::from(token)).await {
            Ok(LoginOutcome::Saved(user)) => {
                spinner.succeed("Token verified");
                println!("\nSigned in as {}\n", output::emphasis(&user.name));
                println!(
                    "{} {}",
                    output::success("Configuration saved"),
                    output::label(store.path().display())
                );
            }
            Ok(LoginOutcome::InvalidToken) => {
                spinner.fail("Token rejected");
                output::warn("Invalid token, nothing was saved");
            }
            Err(e) => {
                spinner.fail("Verification failed");
                output::warn(format!(
                    "Could not query GitLab server {host}, nothing was saved: {e}"
                ));
            }
        }

        Ok(())
    }

    fn execute_reset(store: &ConfigStore) -> Result<()> {
        store
            .reset()
            .with_context(|| format!("Failed to write {}", store.path().display()))?;
        println!("Token cleared. Configure again with: devops login");
        Ok(())
    }

    /// An unreadable file counts as absent: flags and environment may still
    /// provide both fields.
    fn stored_config(store: &ConfigStore) -> Option<StoredConfig> {
        store.read().unwrap_or_else(|e| {
            output::warn(format!("Ignoring stored configuration: {e}"));
            None
        })
    }

    async fn execute_gitlab(
        &self,
        args: &GitlabArgs,
        store: &ConfigStore,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let credentials = CredentialResolver::with_env(Self::stored_config(store), env)
            .resolve(&self.overrides())?;
        let client = GitLabClient::new(&credentials.host, credentials.token)?;

        let mut request = Request::from_args(args.id.clone(), &args.args, args.all);
        if request.identifier.is_none() {
            let cwd = std::env::current_dir()?;
            request.identifier = git::origin_project_path(&cwd).await;
            if let Some(identifier) = &request.identifier {
                info!("Using {identifier} from the origin remote");
            }
        }

        let prompter = TerminalPrompter::new();
        let browser = SystemBrowser;
        let presenter = Presenter::stdout(args.table.clone());
        let mut resolver = ResourceResolver::new(&client, presenter, &prompter, &browser);

        resolver.resolve(&request).await?;
        resolver.into_presenter().finish()?;
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let store = ConfigStore::default_location()?;

        match &self.command {
            Commands::Login | Commands::Config { action: None } => {
                self.execute_login(&store).await
            }
            Commands::Logout | Commands::Config { action: Some(ConfigAction::Reset) } => {
                Self::execute_reset(&store)
            }
            Commands::Gitlab(args) => {
                self.execute_gitlab(args, &store, |name| std::env::var(name).ok())
                    .await
            }
        }
    }
}
