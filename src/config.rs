//! Project directory layout and logging setup shared by training scripts.

use std::io::Write;
use std::path::PathBuf;

use env_logger::Env;

/// Root for downloaded and generated datasets.
pub fn datasets_dir() -> PathBuf {
    PathBuf::from("datasets")
}

/// Root for everything a training run produces.
pub fn output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Saved model state dicts.
pub fn models_dir() -> PathBuf {
    output_dir().join("models")
}

/// Extracted per-layer parameter files.
pub fn params_dir() -> PathBuf {
    output_dir().join("params")
}

/// Installs the crate's logger: `[LEVEL] target:message` lines, `RUST_LOG`
/// filtered with an `info` default. Safe to call more than once; only the
/// first call installs.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "[{}] {}:{}", record.level(), record.target(), record.args())
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_subdirs_nest_under_output() {
        assert_eq!(models_dir(), PathBuf::from("output/models"));
        assert_eq!(params_dir(), PathBuf::from("output/params"));
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
