//! # Game Version Registry
//!
//! The known MDL Zork builds and the Fortran Dungeon port, plus the
//! filesystem logic to turn a version id into something launchable: which
//! program to run, with which restore file, in which directory.
//!
//! MDL versions run under the `confusion` interpreter as
//! `mdli -r <restore-file>` inside the version's game directory. The
//! restore file (the prepared game world) is resolved in a fixed fallback
//! order, same as the historical launcher: the `SAVEFILE/` directory, then
//! `MDL/MADADV.SAVE`, then `MTRZORK/ZORK.SAVE`. The Fortran version ships
//! its own `src/dungeon` executable.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::debug;

use crate::core::lifecycle::SessionState;

/// How a version is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// MDL sources restored into the `confusion` interpreter.
    Mdl,
    /// Pre-built Fortran executable.
    Fortran,
}

/// One playable game version.
#[derive(Debug, Clone, Copy)]
pub struct GameVersion {
    /// Stable identifier, also the game directory name.
    pub id: &'static str,
    /// Human-readable label for the version selector.
    pub label: &'static str,
    pub flavor: Flavor,
}

/// All known versions, oldest first.
pub const VERSIONS: &[GameVersion] = &[
    GameVersion {
        id: "mdlzork_771212",
        label: "Zork 1977-12-12 (500 points)",
        flavor: Flavor::Mdl,
    },
    GameVersion {
        id: "mdlzork_780124",
        label: "Zork 1978-01-24 (with end-game)",
        flavor: Flavor::Mdl,
    },
    GameVersion {
        id: "mdlzork_791211",
        label: "Zork 1979-12-11 (616 points)",
        flavor: Flavor::Mdl,
    },
    GameVersion {
        id: "mdlzork_810722",
        label: "Zork 1981-07-22 (Final MDL)",
        flavor: Flavor::Mdl,
    },
    GameVersion {
        id: "dungeon_3_2b",
        label: "Dungeon 3.2b (Fortran)",
        flavor: Flavor::Fortran,
    },
];

/// Look up a version by id.
pub fn find(id: &str) -> Option<&'static GameVersion> {
    VERSIONS.iter().find(|v| v.id == id)
}

/// Errors preventing a session start. All recoverable: the session stays
/// startable and the user can pick another version or fix the install.
#[derive(Debug)]
pub enum StartError {
    /// The identifier does not match a known version.
    UnknownVersion(String),
    /// The version's game directory does not exist under the games dir.
    MissingGameDir(PathBuf),
    /// The `confusion` interpreter binary was not found.
    MissingInterpreter(PathBuf),
    /// The Fortran executable was not found (needs compiling).
    MissingExecutable(PathBuf),
    /// No restore file in any of the known locations.
    NoRestoreFile { tried: Vec<String> },
    /// The interpreter process could not be spawned.
    Spawn(io::Error),
    /// The session is not in a startable state.
    NotStartable(SessionState),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::UnknownVersion(id) => write!(f, "unknown game version: {id}"),
            StartError::MissingGameDir(p) => {
                write!(f, "game directory not found: {}", p.display())
            }
            StartError::MissingInterpreter(p) => write!(
                f,
                "MDL interpreter (confusion) not found at {}; build it with `make` in confusion-mdl/",
                p.display()
            ),
            StartError::MissingExecutable(p) => write!(
                f,
                "dungeon executable not found at {}; compile the Fortran version with `make` in src/",
                p.display()
            ),
            StartError::NoRestoreFile { tried } => {
                write!(f, "no restore file found; tried: {}", tried.join(", "))
            }
            StartError::Spawn(e) => write!(f, "failed to spawn interpreter: {e}"),
            StartError::NotStartable(state) => write!(f, "cannot start while {state}"),
        }
    }
}

impl std::error::Error for StartError {}

/// Everything needed to launch one interpreter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Working directory, always the version's game directory.
    pub cwd: PathBuf,
}

/// Resolve the restore file for an MDL game directory, returning its path
/// relative to the game directory. Order: sole (or alphabetically first)
/// entry of `SAVEFILE/`, then `MDL/MADADV.SAVE`, then `MTRZORK/ZORK.SAVE`.
pub fn resolve_restore_file(game_dir: &Path) -> Result<String, StartError> {
    let savefile_dir = game_dir.join("SAVEFILE");
    if savefile_dir.is_dir() {
        let mut names: Vec<String> = fs::read_dir(&savefile_dir)
            .map_err(StartError::Spawn)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        if let Some(name) = names.first() {
            return Ok(format!("SAVEFILE/{name}"));
        }
    }

    for candidate in ["MDL/MADADV.SAVE", "MTRZORK/ZORK.SAVE"] {
        if game_dir.join(candidate).is_file() {
            return Ok(candidate.to_string());
        }
    }

    Err(StartError::NoRestoreFile {
        tried: vec![
            "SAVEFILE/".to_string(),
            "MDL/MADADV.SAVE".to_string(),
            "MTRZORK/ZORK.SAVE".to_string(),
        ],
    })
}

/// Build the launch spec for a version. `interpreter` is the `mdli` binary
/// path (ignored for the Fortran flavor).
pub fn launch_spec(
    version: &GameVersion,
    games_dir: &Path,
    interpreter: &Path,
) -> Result<LaunchSpec, StartError> {
    let game_dir = games_dir.join(version.id);
    if !game_dir.is_dir() {
        return Err(StartError::MissingGameDir(game_dir));
    }

    let spec = match version.flavor {
        Flavor::Fortran => {
            let program = game_dir.join("src").join("dungeon");
            if !program.is_file() {
                return Err(StartError::MissingExecutable(program));
            }
            LaunchSpec {
                program,
                args: Vec::new(),
                cwd: game_dir,
            }
        }
        Flavor::Mdl => {
            if !interpreter.is_file() {
                return Err(StartError::MissingInterpreter(interpreter.to_path_buf()));
            }
            let restore = resolve_restore_file(&game_dir)?;
            LaunchSpec {
                program: interpreter.to_path_buf(),
                args: vec!["-r".to_string(), restore],
                cwd: game_dir,
            }
        }
    };

    debug!(
        "Launch spec for {}: {} {:?} (cwd {})",
        version.id,
        spec.program.display(),
        spec.args,
        spec.cwd.display()
    );
    Ok(spec)
}

// ============================================================================
// In-game save artifacts
// ============================================================================

/// File name the player is asked to use with the in-game SAVE command. The
/// bridge captures this file into snapshot payloads and restores it from
/// them.
pub const ARTIFACT_NAME: &str = "BRIDGE.SAVE";

/// Read the in-game save artifact as an opaque JSON payload
/// (`{"file": ..., "data": <base64>}`), or `Ok(None)` if the game has not
/// written one yet.
pub fn read_save_artifact(game_dir: &Path) -> io::Result<Option<serde_json::Value>> {
    let path = game_dir.join(ARTIFACT_NAME);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path)?;
    debug!("Captured save artifact {} ({} bytes)", path.display(), bytes.len());
    Ok(Some(serde_json::json!({
        "file": ARTIFACT_NAME,
        "data": BASE64.encode(bytes),
    })))
}

/// Write a snapshot payload back as the in-game save artifact so the player
/// can RESTORE it. Payloads without the expected shape are rejected.
pub fn write_save_artifact(game_dir: &Path, payload: &serde_json::Value) -> io::Result<()> {
    let encoded = payload
        .get("data")
        .and_then(|v| v.as_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "payload has no data field"))?;
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let path = game_dir.join(ARTIFACT_NAME);
    fs::write(&path, bytes)?;
    debug!("Restored save artifact to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_game_dir() -> PathBuf {
        let dir = std::env::temp_dir()
            .join("zorkbridge-test")
            .join(uuid::Uuid::new_v4().to_string());
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(find("mdlzork_771212").unwrap().label, "Zork 1977-12-12 (500 points)");
        assert_eq!(find("dungeon_3_2b").unwrap().flavor, Flavor::Fortran);
        assert!(find("mdlzork_999999").is_none());
    }

    #[test]
    fn test_restore_file_prefers_savefile_dir() {
        let dir = temp_game_dir();
        fs::create_dir_all(dir.join("SAVEFILE")).unwrap();
        fs::write(dir.join("SAVEFILE").join("MADADV.SAVE"), b"x").unwrap();
        fs::create_dir_all(dir.join("MDL")).unwrap();
        fs::write(dir.join("MDL").join("MADADV.SAVE"), b"y").unwrap();

        assert_eq!(resolve_restore_file(&dir).unwrap(), "SAVEFILE/MADADV.SAVE");
    }

    #[test]
    fn test_restore_file_fallback_chain() {
        let dir = temp_game_dir();
        fs::create_dir_all(dir.join("MTRZORK")).unwrap();
        fs::write(dir.join("MTRZORK").join("ZORK.SAVE"), b"z").unwrap();
        assert_eq!(resolve_restore_file(&dir).unwrap(), "MTRZORK/ZORK.SAVE");

        fs::create_dir_all(dir.join("MDL")).unwrap();
        fs::write(dir.join("MDL").join("MADADV.SAVE"), b"y").unwrap();
        assert_eq!(resolve_restore_file(&dir).unwrap(), "MDL/MADADV.SAVE");
    }

    #[test]
    fn test_restore_file_missing_reports_tried_locations() {
        let dir = temp_game_dir();
        match resolve_restore_file(&dir) {
            Err(StartError::NoRestoreFile { tried }) => assert_eq!(tried.len(), 3),
            other => panic!("expected NoRestoreFile, got {other:?}"),
        }
    }

    #[test]
    fn test_launch_spec_unknown_game_dir() {
        let games = temp_game_dir();
        let version = find("mdlzork_810722").unwrap();
        match launch_spec(version, &games, Path::new("/nonexistent/mdli")) {
            Err(StartError::MissingGameDir(_)) => {}
            other => panic!("expected MissingGameDir, got {other:?}"),
        }
    }

    #[test]
    fn test_launch_spec_mdl_flavor() {
        let games = temp_game_dir();
        let game_dir = games.join("mdlzork_810722");
        fs::create_dir_all(game_dir.join("SAVEFILE")).unwrap();
        fs::write(game_dir.join("SAVEFILE").join("ZORK.SAVE"), b"w").unwrap();
        let mdli = games.join("mdli");
        fs::write(&mdli, b"#!/bin/true").unwrap();

        let version = find("mdlzork_810722").unwrap();
        let spec = launch_spec(version, &games, &mdli).unwrap();
        assert_eq!(spec.program, mdli);
        assert_eq!(spec.args, ["-r", "SAVEFILE/ZORK.SAVE"]);
        assert_eq!(spec.cwd, game_dir);
    }

    #[test]
    fn test_save_artifact_round_trip() {
        let dir = temp_game_dir();
        assert!(read_save_artifact(&dir).unwrap().is_none());

        fs::write(dir.join(ARTIFACT_NAME), b"\x00\x01binary state\xff").unwrap();
        let payload = read_save_artifact(&dir).unwrap().unwrap();
        assert_eq!(payload["file"], ARTIFACT_NAME);

        fs::remove_file(dir.join(ARTIFACT_NAME)).unwrap();
        write_save_artifact(&dir, &payload).unwrap();
        assert_eq!(fs::read(dir.join(ARTIFACT_NAME)).unwrap(), b"\x00\x01binary state\xff");
    }

    #[test]
    fn test_write_save_artifact_rejects_malformed_payload() {
        let dir = temp_game_dir();
        let err = write_save_artifact(&dir, &serde_json::json!({"room": "West of House"}));
        assert!(err.is_err());
    }
}
