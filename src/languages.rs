//! Language configuration for compilation and execution
//!
//! The toolchain table is immutable once loaded and is handed to the
//! orchestrator by reference; nothing here is process-global.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// Supported candidate languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Java,
    Cpp,
    C,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::Javascript,
        Language::Java,
        Language::Cpp,
        Language::C,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Language {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GradeError::UnsupportedLanguage(s.to_string()))
    }
}

/// How a language's stdout is turned back into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputGrammar {
    /// A JSON document
    Json,
    /// A Python `repr`-style literal (single quotes, True/False/None, tuples)
    PythonLiteral,
    /// JSON, or a bracketed comma separated list
    BracketedList,
}

/// Paths substituted into command templates
#[derive(Debug, Clone, Copy)]
pub struct CommandVars<'a> {
    pub source: &'a Path,
    pub binary: &'a Path,
    pub class: &'a str,
    pub dir: &'a Path,
}

/// Configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Source file extension without the dot (e.g., "cpp")
    pub extension: String,
    /// Compile command template (None if not needed)
    pub compile_command: Option<Vec<String>>,
    /// Run command template
    pub run_command: Vec<String>,
    pub output: OutputGrammar,
}

impl LanguageConfig {
    /// Compile command with placeholders filled in
    pub fn compile_command_for(&self, vars: &CommandVars<'_>) -> Option<Vec<String>> {
        self.compile_command
            .as_ref()
            .map(|cmd| expand_command(cmd, vars))
    }

    /// Run command with placeholders filled in
    pub fn run_command_for(&self, vars: &CommandVars<'_>) -> Vec<String> {
        expand_command(&self.run_command, vars)
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    extension: String,
    compile_command: Option<String>,
    run_command: String,
    output: OutputGrammar,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Immutable language → toolchain lookup table
#[derive(Debug, Clone)]
pub struct LanguageTable {
    configs: HashMap<Language, LanguageConfig>,
    names: HashMap<String, Language>,
}

impl LanguageTable {
    /// Table compiled into the binary from `files/languages.toml`
    pub fn builtin() -> Result<Self, GradeError> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml(content)
    }

    /// Load from `path` if given, otherwise the builtin table
    pub fn load(path: Option<&Path>) -> Result<Self, GradeError> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    GradeError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)
            }
            None => Self::builtin(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, GradeError> {
        let raw_configs: HashMap<String, RawLanguageConfig> =
            toml::from_str(content).map_err(|e| GradeError::Config(e.to_string()))?;

        let mut configs = HashMap::new();
        let mut names = HashMap::new();

        for (name, raw) in raw_configs {
            let language = Language::from_str(&name)
                .map_err(|_| GradeError::Config(format!("Unknown language section [{}]", name)))?;

            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                return Err(GradeError::Config(format!(
                    "Empty run command for {}",
                    language
                )));
            }

            let config = LanguageConfig {
                extension: raw.extension.trim_start_matches('.').to_string(),
                compile_command: raw
                    .compile_command
                    .map(|cmd| into_command(&cmd))
                    .filter(|cmd| !cmd.is_empty()),
                run_command,
                output: raw.output,
            };

            // Add main language name
            names.insert(language.as_str().to_string(), language);

            // Add aliases
            for alias in raw.aliases {
                names.insert(alias.to_lowercase(), language);
            }

            configs.insert(language, config);
        }

        Ok(Self { configs, names })
    }

    pub fn get(&self, language: Language) -> Option<&LanguageConfig> {
        self.configs.get(&language)
    }

    /// Configuration for `language`, or `UnsupportedLanguage` if the table has none
    pub fn config_for(&self, language: Language) -> Result<&LanguageConfig, GradeError> {
        self.get(language)
            .ok_or_else(|| GradeError::UnsupportedLanguage(language.to_string()))
    }

    /// Resolve a language name or alias
    pub fn resolve(&self, name: &str) -> Result<Language, GradeError> {
        self.names
            .get(&name.trim().to_lowercase())
            .copied()
            .ok_or_else(|| GradeError::UnsupportedLanguage(name.to_string()))
    }

    /// Configured languages in declaration order of the enum
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|lang| self.configs.contains_key(lang))
            .collect()
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}

fn expand_command(template: &[String], vars: &CommandVars<'_>) -> Vec<String> {
    let source = vars.source.to_string_lossy();
    let binary = vars.binary.to_string_lossy();
    let dir = vars.dir.to_string_lossy();

    template
        .iter()
        .map(|token| {
            token
                .replace("{source}", &source)
                .replace("{binary}", &binary)
                .replace("{class}", vars.class)
                .replace("{dir}", &dir)
        })
        .collect()
}
