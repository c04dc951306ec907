//! A shell-script stand-in for `flac`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::encoder::{flac, EncoderConfig};

/// Behaviour is picked from the input's file name:
///
/// - `*slow*` sleeps 400 ms instead of 50 ms,
/// - `*fail*` always exits 1 and leaves the temporary file behind,
/// - a sibling `<input>.fail-once` marker fails one run and is removed,
/// - `*noisy*` prints unexpected output on success,
/// - `*benign*` prints the "could not compress further" notice,
/// - `*pgid*` copies its `/proc/<pid>/stat` line to `<input>.stat` (Linux).
///
/// Every run appends the input path to `invocations.log` next to the input.
///
/// The same script answers `--show-vendor-tag` like `metaflac`: `*current*`
/// files report the default vendor string, `*fail*` files cannot be read.
const SCRIPT: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "flac 1.4.3"
    exit 0
fi

if [ "$1" = "--show-vendor-tag" ]; then
    case "$(basename "$2")" in
        *fail*) echo "$2: ERROR: FLAC__METADATA_CHAIN_STATUS_NOT_A_FLAC_FILE" >&2; exit 1 ;;
        *current*) echo "reference libFLAC 1.3.1 20141125" ;;
        *) echo "reference libFLAC 1.2.1 20070917" ;;
    esac
    exit 0
fi

in="$1"
name=$(basename "$in")
dir=$(dirname "$in")
tmp="$in.tmp,fl-ac+en'c"

echo "$in" >> "$dir/invocations.log"
printf 'partial' > "$tmp"

case "$name" in
    *slow*) sleep 0.4 ;;
    *) sleep 0.05 ;;
esac

if [ -e "$in.fail-once" ]; then
    rm -f "$in.fail-once"
    echo "$name: ERROR while encoding, state = FLAC__STREAM_ENCODER_CLIENT_ERROR" >&2
    exit 1
fi

case "$name" in
    *fail*)
        echo "$name: ERROR while encoding, state = FLAC__STREAM_ENCODER_CLIENT_ERROR" >&2
        exit 1
        ;;
    *noisy*) echo "$name: unexpected chatter" >&2 ;;
    *benign*) echo "$name: WARNING, could not compress further, leaving as is" >&2 ;;
    *pgid*) cat /proc/$$/stat > "$in.stat" ;;
esac

mv -f "$tmp" "$in"
exit 0
"#;

/// Path of the fake encoder, written once per process.
#[cfg(unix)]
pub fn fake_encoder_path() -> &'static Path {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("reflac-fake-flac-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create fake encoder dir");
        let path = dir.join("flac");
        std::fs::write(&path, SCRIPT).expect("write fake encoder");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake encoder");

        // Another test thread may have forked while the script was open for
        // writing; wait until it can be executed (ETXTBSY).
        for _ in 0..50 {
            match std::process::Command::new(&path).arg("--version").output() {
                Err(e) if e.raw_os_error() == Some(26) => {
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
                _ => break,
            }
        }
        path
    })
}

/// A scratch music folder encoded by the fake encoder.
#[derive(Debug, Clone)]
pub struct FakeLibrary {
    root: PathBuf,
}

impl FakeLibrary {
    /// Uses `root` (normally a `TempDir`) as the library folder.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encoder config pointing at the fake encoder.
    #[cfg(unix)]
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig::with_flac_path(fake_encoder_path())
    }

    /// Creates a dummy file at `relative` (parent folders included).
    pub fn add(&self, relative: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, b"fLaC").expect("write dummy file");
        path
    }

    /// Makes the next run on `path` fail.
    pub fn fail_once(&self, path: &Path) {
        let mut marker = path.as_os_str().to_os_string();
        marker.push(".fail-once");
        std::fs::write(PathBuf::from(marker), b"").expect("write marker");
    }

    /// Inputs the fake encoder was run on, in start order.
    pub fn invocations(&self) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() == "invocations.log")
        {
            let log = std::fs::read_to_string(entry.path()).unwrap_or_default();
            seen.extend(log.lines().map(PathBuf::from));
        }
        seen
    }

    /// Temporary encoder files still on disk.
    pub fn leftover_temp_files(&self) -> Vec<PathBuf> {
        walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(flac::TEMP_SUFFIX))
            .map(|e| e.into_path())
            .collect()
    }
}
