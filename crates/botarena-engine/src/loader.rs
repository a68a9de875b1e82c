//! Locating and loading bot programs.
//!
//! Bots come either from programs bundled into the binary or from YAML
//! files on disk. Command-line arguments name files or directories; a
//! directory contributes every `*.yaml` / `*.yml` file in it, in name
//! order. The configuration file may list sources under its `bots` key.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::script::{BotProgram, ScriptError};

/// Programs compiled into the binary, by name.
const BUNDLED: &[(&str, &str)] = &[
    ("hunter", include_str!("../bots/hunter.yaml")),
    ("hunted", include_str!("../bots/hunted.yaml")),
];

/// Errors that can occur while loading bots.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A named path does not exist.
    #[error("bot source not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// No bundled program has this name.
    #[error("no bundled bot named {name}")]
    UnknownBundled {
        /// The requested name.
        name: String,
    },

    /// A directory holds no bot programs.
    #[error("no bot programs in directory {}", path.display())]
    EmptyDirectory {
        /// The directory.
        path: PathBuf,
    },

    /// A program failed to parse.
    #[error("script error: {source}")]
    Script {
        /// The underlying script error.
        #[from]
        source: ScriptError,
    },
}

/// Where one bot program comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotSource {
    /// A program bundled into the binary.
    Bundled(String),
    /// A YAML file on disk.
    File(PathBuf),
}

impl BotSource {
    /// Load and parse the program.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownBundled`] for an unknown bundled name,
    /// [`LoadError::Io`] if the file cannot be read, or
    /// [`LoadError::Script`] if it does not parse.
    pub fn load(&self) -> Result<BotProgram, LoadError> {
        match self {
            Self::Bundled(name) => {
                let (_, yaml) = BUNDLED
                    .iter()
                    .find(|(bundled, _)| *bundled == name.as_str())
                    .ok_or_else(|| LoadError::UnknownBundled { name: name.clone() })?;
                Ok(BotProgram::parse(yaml, name)?)
            }
            Self::File(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(BotProgram::parse(&yaml, &path.display().to_string())?)
            }
        }
    }
}

/// The line-up used when nothing else is configured: one hunter against
/// one hunted.
pub fn default_sources() -> Vec<BotSource> {
    vec![
        BotSource::Bundled(String::from("hunter")),
        BotSource::Bundled(String::from("hunted")),
    ]
}

/// Read a list of bot sources from the `bots` section of the configuration.
///
/// Each entry is a single-key map such as `bundled: hunter` or
/// `file: bots/sniper.yaml`.
///
/// # Errors
///
/// Returns the YAML error if an entry is malformed.
pub fn sources_from_config(bots: serde_yml::Value) -> Result<Vec<BotSource>, serde_yml::Error> {
    serde_yml::with::singleton_map_recursive::deserialize(bots)
}

/// Turn command-line arguments into bot sources.
///
/// Each argument is a file or a directory. A directory expands to its
/// YAML files sorted by name.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] for a missing path,
/// [`LoadError::EmptyDirectory`] for a directory without programs, or
/// [`LoadError::Io`] if a directory cannot be listed.
pub fn sources_from_args(args: &[String]) -> Result<Vec<BotSource>, LoadError> {
    let mut sources = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        if path.is_dir() {
            let files = yaml_files_in(path)?;
            if files.is_empty() {
                return Err(LoadError::EmptyDirectory {
                    path: path.to_path_buf(),
                });
            }
            debug!(dir = %path.display(), count = files.len(), "Expanded bot directory");
            sources.extend(files.into_iter().map(BotSource::File));
        } else if path.is_file() {
            sources.push(BotSource::File(path.to_path_buf()));
        } else {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(sources)
}

fn yaml_files_in(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every source in order. Actor `i` plays program `i`.
///
/// # Errors
///
/// Returns the first [`LoadError`] encountered.
pub fn load_programs(sources: &[BotSource]) -> Result<Vec<BotProgram>, LoadError> {
    let programs = sources
        .iter()
        .map(BotSource::load)
        .collect::<Result<Vec<_>, _>>()?;
    for (actor, program) in programs.iter().enumerate() {
        info!(actor, name = %program.name, steps = program.steps.len(), "Bot loaded");
    }
    Ok(programs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("botarena-loader-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn bundled_programs_parse() {
        let programs = load_programs(&default_sources()).unwrap();
        let names: Vec<&str> = programs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["hunter", "hunted"]);
        assert!(programs.iter().all(|p| !p.steps.is_empty()));
    }

    #[test]
    fn unknown_bundled_name() {
        let result = BotSource::Bundled(String::from("ghost")).load();
        assert!(matches!(result, Err(LoadError::UnknownBundled { .. })));
    }

    #[test]
    fn directory_expands_sorted_yaml_files() {
        let dir = scratch_dir("dir");
        std::fs::write(dir.join("b.yaml"), "name: bee\nsteps: [move]\n").unwrap();
        std::fs::write(dir.join("a.yml"), "name: ant\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "not a bot").unwrap();

        let sources = sources_from_args(&[dir.display().to_string()]).unwrap();
        assert_eq!(
            sources,
            vec![
                BotSource::File(dir.join("a.yml")),
                BotSource::File(dir.join("b.yaml")),
            ]
        );
        let programs = load_programs(&sources).unwrap();
        assert_eq!(programs.first().unwrap().name, "ant");
        assert_eq!(programs.get(1).unwrap().steps.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_path_and_empty_directory() {
        let dir = scratch_dir("empty");
        let missing = dir.join("nope.yaml").display().to_string();
        assert!(matches!(
            sources_from_args(&[missing]),
            Err(LoadError::NotFound { .. })
        ));
        assert!(matches!(
            sources_from_args(&[dir.display().to_string()]),
            Err(LoadError::EmptyDirectory { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn bad_file_is_a_script_error() {
        let dir = scratch_dir("bad");
        let path = dir.join("broken.yaml");
        std::fs::write(&path, "steps: [teleport]\n").unwrap();
        let result = BotSource::File(path).load();
        assert!(matches!(result, Err(LoadError::Script { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn sources_deserialize_from_config() {
        let yaml = "- bundled: hunter\n- file: bots/mine.yaml\n";
        let sources = sources_from_config(serde_yml::from_str(yaml).unwrap()).unwrap();
        assert_eq!(
            sources,
            vec![
                BotSource::Bundled(String::from("hunter")),
                BotSource::File(PathBuf::from("bots/mine.yaml")),
            ]
        );
    }

    #[test]
    fn shipped_config_lists_loadable_bots() {
        let raw: serde_yml::Value =
            serde_yml::from_str(include_str!("../../../botarena-config.yaml")).unwrap();
        let sources = sources_from_config(raw.get("bots").unwrap().clone()).unwrap();
        assert_eq!(sources, default_sources());
        let programs = load_programs(&sources).unwrap();
        assert_eq!(programs.len(), 2);
    }

    #[test]
    fn malformed_config_entry_is_rejected() {
        let raw: serde_yml::Value = serde_yml::from_str("- teleport: somewhere\n").unwrap();
        assert!(sources_from_config(raw).is_err());
    }
}
