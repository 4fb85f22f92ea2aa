use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};

use crate::credentials::HOST_OPTIONS;
use crate::error::Result;
use crate::providers::gitlab::types::{NewVariable, Project, ALL_ENVIRONMENTS_SCOPE};

const OTHER: &str = "Other...";

const SCOPE_CHOICES: &[(&str, &str)] = &[
    ("* (All environments)", ALL_ENVIRONMENTS_SCOPE),
    ("production", "production"),
    ("staging", "staging"),
    ("review/*", "review/*"),
];

const FLAG_CHOICES: &[&str] = &["protected", "masked"];

/// Questions asked to the person at the terminal.
pub trait Prompter {
    /// Picks the GitLab server to sign in to.
    fn choose_host(&self) -> Result<String>;

    fn enter_token(&self) -> Result<String>;

    /// Collects scope, key, value and flags of a new project variable.
    fn new_variable(&self, project: &Project) -> Result<NewVariable>;

    fn confirm_overwrite(&self, key: &str) -> Result<bool>;
}

/// Terminal prompts built on `dialoguer`.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn choose_or_type(&self, prompt: &str, choices: &[(&str, &str)]) -> Result<String> {
        let mut labels: Vec<&str> = choices.iter().map(|(label, _)| *label).collect();
        labels.push(OTHER);

        let selection = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()?;

        match choices.get(selection) {
            Some((_, value)) => Ok((*value).to_string()),
            None => Ok(Input::<String>::with_theme(&self.theme)
                .with_prompt(prompt)
                .interact_text()?
                .trim()
                .to_string()),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn choose_host(&self) -> Result<String> {
        self.choose_or_type("GitLab server", HOST_OPTIONS)
    }

    fn enter_token(&self) -> Result<String> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt("Personal access token")
            .interact()?)
    }

    fn new_variable(&self, project: &Project) -> Result<NewVariable> {
        eprintln!("\nAdd a CI/CD variable to project {}?", project.name);

        let environment_scope = self.choose_or_type("Environment(s)", SCOPE_CHOICES)?;

        let key: String = Input::with_theme(&self.theme)
            .with_prompt("Variable name")
            .validate_with(|input: &String| -> std::result::Result<(), &str> {
                if input.trim().is_empty() {
                    Err("The name cannot be empty")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;

        let value: String = Input::with_theme(&self.theme)
            .with_prompt("Value")
            .allow_empty(true)
            .interact_text()?;

        let flags = MultiSelect::with_theme(&self.theme)
            .with_prompt("Options (Space to select, Enter to confirm)")
            .items(FLAG_CHOICES)
            .interact()?;

        let mut variable = NewVariable::new(key.trim(), value);
        variable.environment_scope = environment_scope;
        variable.protected = flags.contains(&0);
        variable.masked = flags.contains(&1);
        Ok(variable)
    }

    fn confirm_overwrite(&self, key: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(format!("A variable named {key} already exists. Overwrite it?"))
            .default(false)
            .interact()?)
    }
}
