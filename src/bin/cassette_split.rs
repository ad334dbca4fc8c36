//! Splits a cassette holding several ports into one cassette per port.
//!
//! Usage: `cassette_split <input.yaml> <output_dir>`
//!
//! The output directory uses the layout of a recording session, so it can
//! be replayed with `pmf-artwork --replay <output_dir>`.

use std::path::Path;
use std::{env, fs, process};

use pmf_artwork::cassette::config::{cassette_file_name, CassetteConfig};
use pmf_artwork::cassette::format::{Cassette, Interaction};
use pmf_artwork::cassette::{NOTIFIER_PORT, STORE_PORT, WORKFLOW_PORT};

fn split_cassette(input: &Path, output_dir: &Path) -> Result<Vec<String>, String> {
    let cassette = CassetteConfig::load_cassette(input)?;
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create {}: {e}", output_dir.display()))?;

    let mut written = Vec::new();
    for port in [STORE_PORT, NOTIFIER_PORT, WORKFLOW_PORT] {
        let interactions: Vec<Interaction> = cassette
            .for_port(port)
            .zip(0_u64..)
            .map(|(interaction, seq)| Interaction { seq, ..interaction.clone() })
            .collect();
        if interactions.is_empty() {
            continue;
        }

        let per_port = Cassette {
            name: format!("{}-{port}", cassette.name),
            recorded_at: cassette.recorded_at,
            commit: cassette.commit.clone(),
            interactions,
        };
        let path = output_dir.join(cassette_file_name(port));
        let yaml = serde_yaml::to_string(&per_port)
            .map_err(|e| format!("Failed to serialize cassette for port {port}: {e}"))?;
        fs::write(&path, yaml).map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        println!("Wrote {}", path.display());
        written.push(port.to_string());
    }

    let unknown: Vec<&str> = cassette
        .interactions
        .iter()
        .map(|i| i.port.as_str())
        .filter(|port| ![STORE_PORT, NOTIFIER_PORT, WORKFLOW_PORT].contains(port))
        .collect();
    if !unknown.is_empty() {
        eprintln!(
            "Skipped {} interaction(s) on unknown ports: {}",
            unknown.len(),
            unknown.join(", ")
        );
    }
    Ok(written)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: cassette_split <input.yaml> <output_dir>");
        process::exit(1);
    }

    if let Err(e) = split_cassette(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
