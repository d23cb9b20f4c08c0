//! depfetch CLI - build-time component resolver
//!
//! Usage:
//!   depfetch deps [--entries <list>]       Fetch name<-url release tarballs
//!   depfetch assets [--entries <list>]     Fetch component<-file<-tag<-repo assets
//!   depfetch components-list               Print the COMPONENTS_LIST define
//!
//! Typical PlatformIO wiring:
//!
//! ```ini
//! [env]
//! extra_scripts = pre:scripts/depfetch.py   ; runs `depfetch assets`
//! build_flags = !depfetch components-list
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depfetch::{
    FetchMode, RunOptions, RunOutcome, Settings, components_list, engine::declared_entries,
    output, run,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "depfetch")]
#[command(about = "Fetch, cache and unpack GitHub release components before a build")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to depfetch.toml in the project directory, if present)
    #[arg(short, long, global = true, env = "DEPFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Project directory that relative paths are resolved against
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Directory receiving one subdirectory per component
    #[arg(long, global = true)]
    components_dir: Option<PathBuf>,

    /// Hash cache file
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(clap::Args)]
struct FetchArgs {
    /// Whitespace-separated entries (overrides the config file)
    #[arg(short, long)]
    entries: Option<String>,

    /// The build system is cleaning; skip fetching
    #[arg(long)]
    clean: bool,

    /// Skip the connectivity probe
    #[arg(long)]
    no_probe: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch release tarballs declared as name<-url
    Deps {
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Fetch GitHub release assets declared as component<-filename<-tag<-repo
    Assets {
        #[command(flatten)]
        fetch: FetchArgs,

        /// Token file (defaults to ~/.pio_github_token)
        #[arg(long, env = "DEPFETCH_TOKEN_FILE")]
        token_file: Option<PathBuf>,

        /// GitHub API base URL (for GitHub Enterprise)
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Print the COMPONENTS_LIST compile-time define
    ComponentsList {
        /// Whitespace-separated entries (overrides the config file)
        #[arg(short, long)]
        entries: Option<String>,

        /// Read name<-url entries instead of GitHub asset entries
        #[arg(long)]
        urls: bool,

        /// Write a C header to this path instead of printing a compiler flag
        #[arg(long)]
        header: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run_cli(Cli::parse()) {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    output::set_quiet(cli.quiet);
    let mut settings = project_settings(&cli)?;
    let project_dir = cli.project_dir;

    match cli.command {
        Commands::Deps { fetch } => {
            fetch_components(FetchMode::Dependencies, settings, fetch)?;
        }

        Commands::Assets {
            fetch,
            token_file,
            api_base,
        } => {
            if let Some(file) = token_file {
                settings.token_file = Some(in_project(&project_dir, file));
            }
            if let Some(api) = api_base {
                settings.api_base = api.trim_end_matches('/').to_string();
            }
            fetch_components(FetchMode::GithubAssets, settings, fetch)?;
        }

        Commands::ComponentsList {
            entries,
            urls,
            header,
        } => {
            let mode = if urls {
                FetchMode::Dependencies
            } else {
                FetchMode::GithubAssets
            };
            let entries = entries.or_else(|| std::env::var(mode.env_var()).ok());
            let options = RunOptions {
                entries,
                clean_target: false,
            };
            let declared = declared_entries(mode, &settings, &options)?;
            let list = components_list::components_list(&declared);

            match header {
                Some(path) => {
                    let path = in_project(&project_dir, path);
                    std::fs::write(&path, components_list::header(&list))
                        .with_context(|| format!("Failed to write header: {}", path.display()))?;
                    output::info(&format!("COMPONENTS_LIST: {}", list));
                }
                // stdout carries only the flag so build systems can splice it in
                None => println!("{}", components_list::define_flag(&list)),
            }
        }
    }

    Ok(())
}

/// Resolve a path given on the command line against the project directory.
fn in_project(project_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        project_dir.join(path)
    } else {
        path
    }
}

/// Settings from the config file with the global CLI overrides applied.
fn project_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(cli.config.as_deref(), &cli.project_dir)?;
    if let Some(dir) = &cli.components_dir {
        settings.components_dir = in_project(&cli.project_dir, dir.clone());
    }
    if let Some(file) = &cli.cache_file {
        settings.cache_file = in_project(&cli.project_dir, file.clone());
    }
    Ok(settings)
}

fn load_settings(config: Option<&Path>, project_dir: &Path) -> Result<Settings> {
    let settings = match config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Settings::discover(project_dir).with_context(|| {
            format!("Failed to load config from {}", project_dir.display())
        })?,
    };
    Ok(settings)
}

fn fetch_components(mode: FetchMode, mut settings: Settings, args: FetchArgs) -> Result<()> {
    if args.no_probe {
        settings.probe_url = None;
    }
    let options = RunOptions {
        entries: args.entries.or_else(|| std::env::var(mode.env_var()).ok()),
        clean_target: args.clean,
    };

    match run(mode, &settings, &options)? {
        RunOutcome::Resolved(report) => {
            output::detail(&format!(
                "{} downloaded, {} already satisfied",
                report.downloaded(),
                report.satisfied()
            ));
        }
        RunOutcome::Skipped(_) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assets_with_token_file() {
        let cli = Cli::try_parse_from([
            "depfetch",
            "assets",
            "--entries",
            "bar<-bar.tar.gz<-v1<-acme/bar",
            "--token-file",
            "/tmp/token",
            "--clean",
        ])
        .unwrap();

        match cli.command {
            Commands::Assets {
                fetch, token_file, ..
            } => {
                assert_eq!(fetch.entries.as_deref(), Some("bar<-bar.tar.gz<-v1<-acme/bar"));
                assert!(fetch.clean);
                assert_eq!(token_file, Some(PathBuf::from("/tmp/token")));
            }
            _ => panic!("expected assets subcommand"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "depfetch",
            "deps",
            "--components-dir",
            "lib/components",
            "--no-probe",
        ])
        .unwrap();
        assert_eq!(cli.components_dir, Some(PathBuf::from("lib/components")));
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Commands::Deps { fetch } if fetch.no_probe));
    }

    #[test]
    fn test_load_settings_from_project_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("depfetch.toml"),
            "components_dir = \"deps\"\n",
        )
        .unwrap();

        let settings = load_settings(None, dir.path()).unwrap();
        assert_eq!(settings.components_dir, dir.path().join("deps"));
    }

    #[test]
    fn test_cli_paths_resolved_against_project_dir() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "depfetch",
            "-C",
            project,
            "deps",
            "--components-dir",
            "lib",
            "--cache-file",
            "/abs/cache.toml",
        ])
        .unwrap();

        let settings = project_settings(&cli).unwrap();
        assert_eq!(settings.components_dir, dir.path().join("lib"));
        assert_eq!(settings.cache_file, PathBuf::from("/abs/cache.toml"));
    }

    #[test]
    fn test_relative_header_written_in_project_dir() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "depfetch",
            "-C",
            dir.path().to_str().unwrap(),
            "components-list",
            "--entries",
            "foo<-foo.tar.gz<-v1.2<-acme/foo",
            "--header",
            "include/components_list.h",
        ])
        .unwrap();

        std::fs::create_dir(dir.path().join("include")).unwrap();
        run_cli(cli).unwrap();
        assert!(dir.path().join("include/components_list.h").exists());
    }

    #[test]
    fn test_load_settings_missing_explicit_config() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_components_list_header_written() {
        let dir = TempDir::new().unwrap();
        let header = dir.path().join("components_list.h");
        let cli = Cli::try_parse_from([
            "depfetch",
            "-C",
            dir.path().to_str().unwrap(),
            "components-list",
            "--entries",
            "foo<-foo.tar.gz<-v1.2<-acme/foo",
            "--header",
            header.to_str().unwrap(),
        ])
        .unwrap();

        run_cli(cli).unwrap();
        let content = std::fs::read_to_string(&header).unwrap();
        assert!(content.contains("#define COMPONENTS_LIST \"foo:v1.2 \""));
    }
}
