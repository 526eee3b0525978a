//! Template evaluation against a variable store and a command executor

use std::sync::Arc;
use tracing::{debug, trace};

use super::lexer::{Lexer, TokenKind};
use crate::error::{ApidError, ErrorCode};
use crate::subprocess::{CommandExecutor, ExitStatus, ProcessError};
use crate::variables::Variables;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template syntax error: {0}")]
    Syntax(String),

    #[error("unknown variable '{0}'")]
    UnknownIdentifier(String),

    #[error("command '{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: ProcessError,
    },

    #[error("command '{command}' exited with {status}: {output}")]
    CommandStatus {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

impl From<TemplateError> for ApidError {
    fn from(err: TemplateError) -> Self {
        let code = match &err {
            TemplateError::Syntax(_) => ErrorCode::TEMPLATE_SYNTAX,
            TemplateError::UnknownIdentifier(_) => ErrorCode::TEMPLATE_UNKNOWN_VARIABLE,
            TemplateError::Command { .. } | TemplateError::CommandStatus { .. } => {
                ErrorCode::TEMPLATE_COMMAND_FAILED
            }
        };
        ApidError::template_with_code(code, err.to_string()).with_source(err)
    }
}

/// Resolves identifiers and runs commands found in a template
#[derive(Clone)]
pub struct TemplateEvaluator {
    executor: Arc<dyn CommandExecutor>,
}

impl TemplateEvaluator {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Render `template`, stopping at the first failure
    ///
    /// Command output is inserted verbatim and never re-evaluated.
    pub async fn render(&self, template: &str, vars: &Variables) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(template.len());

        for token in Lexer::new(template) {
            match token.kind {
                TokenKind::Text => rendered.push_str(&token.value),
                TokenKind::Identifier => {
                    let value = resolve_identifier(&token.value, vars)?;
                    trace!("Resolved {{{{ {} }}}} to {} bytes", token.value, value.len());
                    rendered.push_str(&value);
                }
                TokenKind::Command => {
                    let output = self.run_command(&token.value, vars).await?;
                    rendered.push_str(&output);
                }
                TokenKind::Error => return Err(TemplateError::Syntax(token.value)),
                TokenKind::End => break,
            }
        }

        Ok(rendered)
    }

    async fn run_command(&self, command: &str, vars: &Variables) -> Result<String, TemplateError> {
        debug!("Evaluating template command: {}", command);

        let output = self
            .executor
            .exec(command, vars)
            .await
            .map_err(|source| TemplateError::Command {
                command: command.to_string(),
                source,
            })?;

        if !output.success() {
            return Err(TemplateError::CommandStatus {
                command: command.to_string(),
                status: output.status.clone(),
                output: output.text(),
            });
        }

        Ok(output.text())
    }
}

/// Look up an identifier and render it for insertion into text
///
/// Strings are inserted without quotes; anything else as compact JSON.
pub fn resolve_identifier(identifier: &str, vars: &Variables) -> Result<String, TemplateError> {
    match vars.lookup(identifier) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(value) => Ok(value.to_string()),
        None => Err(TemplateError::UnknownIdentifier(identifier.to_string())),
    }
}
