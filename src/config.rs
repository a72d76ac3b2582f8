//! Configuration file parser for the reconstruction

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cg::CgConf;
use crate::error::Error;

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Maximum number of CG iterations to perform
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// l2 regularization weight λ
    #[serde(default)]
    pub l2: f32,

    /// Relative residual at which to stop early; 0 runs the full budget
    #[serde(default)]
    pub tolerance: f32,
}

fn default_iterations() -> usize { CgConf::default().max_iter }

impl Default for Config {
    fn default() -> Self {
        Self { iterations: default_iterations(), l2: 0.0, tolerance: 0.0 }
    }
}

impl From<Config> for CgConf {
    fn from(config: Config) -> Self {
        CgConf {
            max_iter: config.iterations,
            l2lambda: config.l2,
            tolerance: config.tolerance,
        }
    }
}

pub fn read_config_file(path: &Path) -> Result<Config, Error> {
    let text = fs::read_to_string(path)?;
    toml::from_str(&text)
        .map_err(|e| Error::InvalidConfiguration(format!("config file {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Config {
        toml::from_str(input).unwrap()
    }

    #[test]
    fn config_iterations() {
        let config = parse("iterations = 50");
        assert_eq!(config.iterations, 50);
        assert_eq!(config.l2, 0.0);
        assert_eq!(config.tolerance, 0.0);
    }

    #[test]
    fn config_full() {
        let config = parse(r#"
            iterations = 100
            l2 = 0.01
            tolerance = 1e-6
        "#);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.l2, 0.01);
        assert_eq!(config.tolerance, 1e-6);
    }

    #[test]
    fn config_defaults_match_the_solver_defaults() {
        let cg: CgConf = parse("").into();
        assert_eq!(cg.max_iter, CgConf::default().max_iter);
        assert_eq!(cg.l2lambda, 0.0);
    }

    #[test]
    fn config_rejects_unknown_field() {
        let result: Result<Config, _> = toml::from_str("unknown_field = 666");
        assert!(result.is_err());
    }
}
