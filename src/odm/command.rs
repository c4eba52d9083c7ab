//! ODM command-line construction.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use crate::core::config::OdmOptions;

/// Mount point of the input images inside the ODM container.
pub const CONTAINER_IMAGE_MOUNT: &str = "/code/images";
/// Mount point of the output base directory inside the ODM container.
pub const CONTAINER_OUTPUT_MOUNT: &str = "/code/odm_output";
/// Project name that collides with ODM's image folder.
pub const RESERVED_PROJECT_NAME: &str = "images";

/// Options the docker invocation handles itself or ODM no longer accepts.
pub const DOCKER_EXCLUDED_OPTIONS: &[&str] = &["use-gpu", "orthophoto-tif", "name", "project-name"];
/// Options a native run drops; `use-gpu` is understood by CUDA builds of `run.py`.
pub const NATIVE_EXCLUDED_OPTIONS: &[&str] = &["orthophoto-tif", "name", "project-name"];

/// Translate an option map into `--flag [value]` arguments.
///
/// `true` adds a bare flag, `false` and null values add nothing, other values
/// add the flag followed by their string form. Keys in `excluded` are skipped.
pub fn build_option_flags(options: &OdmOptions, excluded: &[&str]) -> Vec<String> {
    let mut flags = Vec::new();
    for (key, value) in options {
        if excluded.contains(&key.as_str()) {
            continue;
        }
        let flag = format!("--{key}");
        if value.is_true() {
            flags.push(flag);
        } else if let Some(arg) = value.as_arg() {
            flags.push(flag);
            flags.push(arg);
        }
    }
    flags
}

/// A fully constructed external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory for the child, inherited when `None`
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Start a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Whether `arg` appears among the arguments.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// The argument following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Quote a word for a POSIX shell when it contains special characters.
pub fn shell_quote(word: &str) -> Cow<'_, str> {
    if word.is_empty() {
        return Cow::Borrowed("''");
    }
    let safe = word
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r#"'"'"'"#)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OdmOptionValue;

    fn options(pairs: &[(&str, OdmOptionValue)]) -> OdmOptions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn booleans_toggle_bare_flags_and_values_follow_flags() {
        let opts = options(&[
            ("dsm", true.into()),
            ("fast-orthophoto", false.into()),
            ("orthophoto-resolution", 5.0.into()),
        ]);
        let flags = build_option_flags(&opts, DOCKER_EXCLUDED_OPTIONS);

        assert!(flags.contains(&"--dsm".to_string()));
        assert!(!flags.iter().any(|f| f == "--fast-orthophoto"));
        let pos = flags
            .iter()
            .position(|f| f == "--orthophoto-resolution")
            .expect("resolution flag");
        assert_eq!(flags[pos + 1], "5.0");
        assert_eq!(flags.len(), 3);
    }

    #[test]
    fn excluded_and_null_options_are_dropped() {
        let opts = options(&[
            ("use-gpu", true.into()),
            ("orthophoto-tif", true.into()),
            ("name", "legacy".into()),
            ("project-name", "legacy".into()),
            ("resize-to", OdmOptionValue::Null),
            ("matcher-type", "flann".into()),
        ]);
        assert_eq!(
            build_option_flags(&opts, DOCKER_EXCLUDED_OPTIONS),
            vec!["--matcher-type", "flann"]
        );
        assert_eq!(
            build_option_flags(&opts, NATIVE_EXCLUDED_OPTIONS),
            vec!["--use-gpu", "--matcher-type", "flann"]
        );
    }

    #[test]
    fn option_order_is_preserved() {
        let opts = options(&[
            ("pc-quality", "high".into()),
            ("dsm", true.into()),
            ("max-concurrency", OdmOptionValue::Int(4)),
        ]);
        assert_eq!(
            build_option_flags(&opts, &[]),
            vec!["--pc-quality", "high", "--dsm", "--max-concurrency", "4"]
        );
    }

    #[test]
    fn display_quotes_unsafe_words() {
        let mut cmd = ToolCommand::new("docker");
        cmd.args(["run", "-v", "/my data:/code/images:ro", "it's"]);
        assert_eq!(
            cmd.to_string(),
            r#"docker run -v '/my data:/code/images:ro' 'it'"'"'s'"#
        );
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn value_of_reads_following_argument() {
        let mut cmd = ToolCommand::new("python");
        cmd.args(["run.py", "--project-path", "/out", "site"]);
        assert_eq!(cmd.value_of("--project-path"), Some("/out"));
        assert_eq!(cmd.value_of("site"), None);
        assert!(cmd.has_arg("run.py"));
    }
}
