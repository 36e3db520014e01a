//! Running one invocation from the command line.

use std::path::{Path, PathBuf};

use crate::builder::{Builder, BuilderOptions};
use crate::config::{find_project_root, RcFile};
use crate::error::Result;
use crate::properties::{parse_invocation, ArgKind, PropertyValue};
use crate::state::Checkpoint;

use super::args::Cli;

/// Resolves the distribution and dispatches the requested action.
#[derive(Debug)]
pub struct Invocation {
    base_dir: PathBuf,
    words: Vec<String>,
    use_rc: bool,
}

impl Invocation {
    /// An invocation rooted at `cwd` unless the CLI names a directory.
    pub fn from_cli(cli: &Cli, cwd: &Path) -> Self {
        let base_dir = match &cli.base_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
        };
        Self {
            base_dir,
            words: cli.args.clone(),
            use_rc: !cli.no_rc,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Construct the builder, resuming from a checkpoint when one exists.
    pub fn builder(&self) -> Result<Builder> {
        let options = BuilderOptions::from_dir(&self.base_dir)?;
        if Checkpoint::exists(&self.base_dir) {
            tracing::debug!("Resuming from {}", Checkpoint::path(&self.base_dir).display());
            Builder::resume(options)
        } else {
            Builder::new(options)
        }
    }

    /// Run the invocation to completion.
    pub fn run(&self) -> Result<()> {
        let mut builder = self.builder()?;
        let kind = |name: &str| {
            let props = builder.props();
            if props.is_additive(name) {
                ArgKind::Additive
            } else if props.is_valid(name) {
                ArgKind::Scalar
            } else {
                ArgKind::Unknown
            }
        };

        let cli = parse_invocation(&self.words, kind)?;
        let action = cli
            .action
            .clone()
            .or_else(|| builder.props().text("default_action").map(String::from));

        let mut overrides: Vec<(String, PropertyValue)> = Vec::new();
        if self.use_rc {
            let rc = RcFile::discover()?;
            let rc_words = rc.args_for(action.as_deref().unwrap_or(RcFile::ALL_ACTIONS));
            if !rc_words.is_empty() {
                tracing::debug!("rc arguments: {:?}", rc_words);
                let rc_args = parse_invocation(&rc_words, kind)?;
                overrides.extend(rc_args.properties);
            }
        }
        overrides.extend(cli.properties);

        builder.dispatch(action.as_deref(), overrides)
    }
}
