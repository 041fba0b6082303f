use clap::{Parser, Subcommand};
use drlcheck_core::cli::ModalityArg;
use drlcheck_core::{
    DrlError, Modality, Protocol, ProtocolStore, Result, StoreConfig, DEFAULT_CONFIG_DIR,
};
use log::{error, info};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

/// CLI tool for editing the per-modality DRL configuration
#[derive(Parser, Debug)]
#[command(name = "drlconfig")]
#[command(about = "Edit Diagnostic Reference Level protocol configuration")]
#[command(version)]
struct Cli {
    /// Modality whose configuration is edited
    #[arg(short, long)]
    modality: ModalityArg,

    /// Directory holding the DRL configuration documents
    #[arg(long, env = "DRL_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured protocols with their match patterns
    List,
    /// Print one protocol as JSON
    Show {
        name: String,
    },
    /// Add or replace a protocol from a JSON file
    Add {
        name: String,
        /// JSON file holding the protocol body
        #[arg(long, value_name = "FILE")]
        from_json: PathBuf,
    },
    /// Delete a protocol
    Delete {
        name: String,
    },
    /// Replace the whole configuration with the rows of a CSV file
    Import {
        #[arg(value_name = "CSV")]
        file: PathBuf,
    },
    /// Write the configuration to a CSV file
    Export {
        #[arg(value_name = "CSV")]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let modality: Modality = cli.modality.into();
    let mut store = ProtocolStore::new(StoreConfig::default().with_config_dir(&cli.config_dir));

    match run(&mut store, modality, cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                print!("{}", output);
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

/// Executes one subcommand, returning what should be printed
fn run(store: &mut ProtocolStore, modality: Modality, command: Command) -> Result<String> {
    store.load(modality)?;

    let mut output = String::new();
    match command {
        Command::List => {
            let protocols = store.list_all(modality);
            if protocols.is_empty() {
                output.push_str(&format!("No {} protocols configured\n", modality));
            }
            for (name, protocol) in protocols.iter() {
                let patterns = protocol.match_patterns().join(", ");
                output.push_str(&format!("{}: {}\n", name, patterns));
            }
        }
        Command::Show { name } => {
            let protocol = store.get(modality, &name).ok_or_else(|| not_found(&name))?;
            let json = serde_json::to_string_pretty(protocol).map_err(DrlError::Serialize)?;
            output.push_str(&json);
            output.push('\n');
        }
        Command::Add { name, from_json } => {
            let protocol = read_protocol(modality, &name, &from_json)?;
            store.add(modality, &name, protocol)?;
            info!("Saved {} protocol '{}'", modality, name);
        }
        Command::Delete { name } => {
            if !store.delete(modality, &name)? {
                return Err(not_found(&name));
            }
            info!("Deleted {} protocol '{}'", modality, name);
        }
        Command::Import { file } => {
            let count = store.import_csv(modality, &file)?;
            output.push_str(&format!("Imported {} {} protocols\n", count, modality));
        }
        Command::Export { file } => {
            store.export_csv(modality, &file)?;
            output.push_str(&format!("Exported to {}\n", file.display()));
        }
    }

    Ok(output)
}

/// Reads a protocol body for `name`; unreadable JSON counts as invalid
fn read_protocol(modality: Modality, name: &str, path: &Path) -> Result<Protocol> {
    let invalid = |e: serde_json::Error| {
        DrlError::validation(
            name,
            format!("{} is not a valid {} protocol: {}", path.display(), modality, e),
        )
    };
    let value: serde_json::Value = serde_json::from_reader(File::open(path)?).map_err(invalid)?;
    Protocol::from_value(modality, value).map_err(invalid)
}

fn not_found(name: &str) -> DrlError {
    DrlError::validation(name, "no such protocol")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ProtocolStore {
        ProtocolStore::new(StoreConfig::default().with_config_dir(dir.path().join("configs")))
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn test_add_show_list_delete() {
        let dir = TempDir::new().unwrap();
        let body = write_file(
            &dir,
            "chest.json",
            r#"{"protocol_match": ["chest", "thorax"], "adult": {"DAP": 0.15}, "child": {}}"#,
        );

        let mut store = store(&dir);
        let add = Command::Add {
            name: "Chest PA".to_string(),
            from_json: body,
        };
        run(&mut store, Modality::Dx, add).unwrap();

        let listed = run(&mut store, Modality::Dx, Command::List).unwrap();
        assert_eq!(listed, "Chest PA: chest, thorax\n");

        let shown = run(
            &mut store,
            Modality::Dx,
            Command::Show {
                name: "Chest PA".to_string(),
            },
        )
        .unwrap();
        assert!(shown.contains("\"DAP\": 0.15"));

        let delete = || Command::Delete {
            name: "Chest PA".to_string(),
        };
        run(&mut store, Modality::Dx, delete()).unwrap();
        assert!(run(&mut store, Modality::Dx, delete()).is_err());
    }

    #[test]
    fn test_add_rejects_wrong_shape() {
        let dir = TempDir::new().unwrap();
        let body = write_file(&dir, "bad.json", r#"{"protocol_match": ["cc"]}"#);

        let mut store = store(&dir);
        let result = run(
            &mut store,
            Modality::Mg,
            Command::Add {
                name: "CC".to_string(),
                from_json: body,
            },
        );
        assert!(matches!(result, Err(DrlError::Validation { .. })));
        assert!(store.list_all(Modality::Mg).is_empty());
    }

    #[test]
    fn test_add_rejects_broken_json() {
        let dir = TempDir::new().unwrap();
        let body = write_file(&dir, "broken.json", r#"{"protocol_match": ["cc"], "AGD": "#);

        let mut store = store(&dir);
        let add = Command::Add {
            name: "CC".to_string(),
            from_json: body,
        };
        match run(&mut store, Modality::Mg, add) {
            Err(DrlError::Validation { protocol, reason }) => {
                assert_eq!(protocol, "CC");
                assert!(reason.contains("broken.json"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_edits_refused_on_malformed_document() {
        let dir = TempDir::new().unwrap();
        let document = r#"{
    "Head": {"protocol_match": ["head"], "adult": {"DLP": 970, "CTDIvol": "60"}},
    "Chest": {"protocol_match": ["chest"], "adult": {"DLP": 400, "CTDIvol": 15}}
}"#;
        let config_dir = dir.path().join("configs");
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(Modality::Ct.default_file_name());
        std::fs::write(&path, document).unwrap();

        let body = write_file(
            &dir,
            "abdomen.json",
            r#"{"protocol_match": ["abdomen"], "adult": {"DLP": 800, "CTDIvol": 15}}"#,
        );
        let mut store = store(&dir);
        let add = Command::Add {
            name: "Abdomen".to_string(),
            from_json: body,
        };
        let result = run(&mut store, Modality::Ct, add);
        assert!(matches!(result, Err(DrlError::ConfigParse { .. })));

        let after = std::fs::read_to_string(&path).unwrap();
        assert!(after.contains("Chest"));
        assert!(!after.contains("Abdomen"));
    }

    #[test]
    fn test_empty_list_message() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let listed = run(&mut store, Modality::Xa, Command::List).unwrap();
        assert_eq!(listed, "No XA protocols configured\n");
    }
}
