use std::env;
use std::path::PathBuf;

const RESULT_PATH_VAR: &str = "RESULT_PATH";

/// Run configuration. The result directory receives `results.xml` and
/// `coverage.xml`; everything else is a constructor parameter with a default.
#[derive(Debug, Clone)]
pub struct TbConfig {
    pub result_dir: PathBuf,
    /// Watchdog: a scenario still running past this simulation time is
    /// failed with an explicit timeout instead of hanging the process.
    pub max_sim_time_ns: u64,
}

impl TbConfig {
    pub const DEFAULT_MAX_SIM_TIME_NS: u64 = 2_000_000;

    pub fn from_env() -> Self {
        let result_dir = env::var(RESULT_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self {
            result_dir,
            max_sim_time_ns: Self::DEFAULT_MAX_SIM_TIME_NS,
        }
    }

    pub fn with_result_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            result_dir: dir.into(),
            max_sim_time_ns: Self::DEFAULT_MAX_SIM_TIME_NS,
        }
    }
}

impl Default for TbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_dir_defaults_to_cwd_and_honors_env() {
        env::remove_var(RESULT_PATH_VAR);
        assert_eq!(TbConfig::from_env().result_dir, PathBuf::from("."));
        env::set_var(RESULT_PATH_VAR, "/tmp/results");
        assert_eq!(TbConfig::from_env().result_dir, PathBuf::from("/tmp/results"));
        env::remove_var(RESULT_PATH_VAR);
    }
}
