//! External-command transformer
//!
//! Runs one process per class:
//!
//! ```text
//! <program> [args...] <dotted class name>
//!   stdin         class file bytes
//!   TQE_PACKAGES  comma-separated package prefixes
//!   TQE_AGENT     agent argument string (debug=2)
//!   exit 0, stdout non-empty  -> transformed, stdout is the new class file
//!   exit 0, stdout empty      -> declined
//!   any other exit            -> transform error
//!   stderr                    -> transformer log, line by line
//! ```

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use tqe_artifact::ClassName;
use tqe_enhance::{
    AgentOptions, EnhanceError, EnhanceResult, PackageSet, TransformError, TransformScope,
    Transformer, TransformerFactory,
};

/// Environment variable carrying the package list
pub const PACKAGES_ENV: &str = "TQE_PACKAGES";

/// Environment variable carrying the agent arguments
pub const AGENT_ENV: &str = "TQE_AGENT";

/// Builds [`CommandTransformer`]s from a command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTransformerFactory {
    command: Vec<String>,
}

impl CommandTransformerFactory {
    /// Factory for `program args...`; no words means no transformer
    #[must_use]
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated command line
    #[must_use]
    pub fn parse(command_line: &str) -> Self {
        Self::new(command_line.split_whitespace())
    }
}

impl TransformerFactory for CommandTransformerFactory {
    fn create(&self, options: &AgentOptions, packages: &PackageSet) -> EnhanceResult<Box<dyn Transformer>> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(EnhanceError::TransformerSetup(
                "no transformer command configured".to_string(),
            ));
        };
        Ok(Box::new(CommandTransformer {
            program: program.clone(),
            args: args.to_vec(),
            packages: packages.iter().collect::<Vec<_>>().join(","),
            agent_args: options.to_agent_args(),
        }))
    }
}

/// Transformer backed by an external process
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    program: String,
    args: Vec<String>,
    packages: String,
    agent_args: String,
}

impl CommandTransformer {
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn packages(&self) -> &str {
        &self.packages
    }
}

impl Transformer for CommandTransformer {
    fn transform(
        &self,
        scope: TransformScope<'_>,
        class_name: &ClassName,
        bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, TransformError> {
        let class = class_name.as_str();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(class)
            .env(PACKAGES_ENV, &self.packages)
            .env(AGENT_ENV, &self.agent_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| TransformError::agent(class, format!("cannot run {}: {err}", self.program)))?;

        // Fed from a thread so a child writing before it reads cannot block us
        let feeder = child.stdin.take().map(|mut stdin| {
            let input = bytes.to_vec();
            thread::spawn(move || match stdin.write_all(&input) {
                Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
                _ => Ok(()),
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|err| TransformError::agent(class, format!("{} failed: {err}", self.program)))?;

        if let Some(feeder) = feeder {
            match feeder.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    return Err(TransformError::agent(
                        class,
                        format!("cannot write class bytes to {}: {err}", self.program),
                    ))
                }
                Err(_) => return Err(TransformError::agent(class, "stdin writer panicked")),
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            scope.log(&stderr);
        }

        if !output.status.success() {
            return Err(TransformError::agent(
                class,
                format!("{} exited with {}", self.program, output.status),
            ));
        }
        tracing::trace!(class, bytes = output.stdout.len(), "transformer output");
        Ok((!output.stdout.is_empty()).then_some(output.stdout))
    }
}
