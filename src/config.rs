use clap::Args;
use serde::Deserialize;
use std::{fs, io, path::Path, path::PathBuf};

use crate::{
    comparison::SimilarityMetric,
    error::Error,
    strategy::{external::DEFAULT_MEMORY_PRESSURE_FACTOR, ComparisonMode},
};

macro_rules! config_structs {
    {
        $(
            $( #[config_opt($attr:meta)] )*
            pub $name:ident: $typ:ty,
        )*
        $(
            #[config_unset]
            $( #[config_opt($uattr:meta)] )*
            pub $uname:ident: Option<$utyp:ty>,
        )*
        $(
            #[config_alias($atarget:ident = $avalue:expr)]
            $( #[config_opt($aattr:meta)] )*
            pub $aname:ident: bool,
        )*
    } => {
        #[derive(Clone, Debug)]
        pub struct Config {
            $( pub $name: $typ, )*
            $( pub $uname: Option<$utyp>, )*
        }

        #[derive(Args, Debug, Default, Deserialize)]
        pub struct ConfigOpt {
            $( $( #[$aattr] )* #[serde(skip)] pub $aname: bool, )*
            $( $( #[$attr] )* pub $name: Option<$typ>, )*
            $( $( #[$uattr] )* pub $uname: Option<$utyp>, )*
        }

        impl Config {
            pub fn update(self, mut opt: ConfigOpt) -> Config {
                $(
                    if opt.$aname {
                        opt.$atarget = Some($avalue);
                    }
                )*
                Config {
                    $( $name: opt.$name.unwrap_or(self.$name), )*
                    $( $uname: opt.$uname.or(self.$uname), )*
                }
            }
        }
    }
}

config_structs! {
    #[config_opt(arg(short = 'L', long))]
    pub language: String,

    #[config_opt(arg(short = 'M', long))]
    pub similarity_metric: SimilarityMetric,

    #[config_opt(arg(short = 'm', long, group = "comparison_mode_group"))]
    pub comparison_mode: ComparisonMode,

    #[config_opt(arg(short = 't', long, value_name = "RATIO"))]
    pub similarity_threshold: f64,

    #[config_opt(arg(long, value_name = "NUM"))]
    pub memory_pressure_factor: u64,

    #[config_unset]
    #[config_opt(arg(short = 'l', long, value_name = "NUM"))]
    pub minimum_match_length: Option<usize>,

    #[config_unset]
    #[config_opt(arg(short = 'j', long, value_name = "NUM"))]
    pub worker_count: Option<usize>,

    #[config_unset]
    #[config_opt(arg(long, value_name = "NUM"))]
    pub max_comparisons: Option<usize>,

    #[config_unset]
    #[config_opt(arg(short, long, value_name = "NAME"))]
    pub base_code: Option<String>,

    #[config_unset]
    #[config_opt(arg(short = 'x', long, value_name = "REGEX"))]
    pub exclude: Option<String>,

    #[config_alias(comparison_mode = ComparisonMode::Parallel)]
    #[config_opt(arg(long, group = "comparison_mode_group"))]
    pub parallel: bool,

    #[config_alias(comparison_mode = ComparisonMode::External)]
    #[config_opt(arg(long, group = "comparison_mode_group"))]
    pub external: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            language: "text".to_owned(),
            similarity_metric: SimilarityMetric::Average,
            comparison_mode: ComparisonMode::Normal,
            similarity_threshold: 0.0,
            memory_pressure_factor: DEFAULT_MEMORY_PRESSURE_FACTOR,
            minimum_match_length: None,
            worker_count: None,
            max_comparisons: None,
            base_code: None,
            exclude: None,
        }
    }
}

impl Config {
    /// Rejects values no run can start with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.minimum_match_length == Some(0) {
            return Err(Error::Config("minimum match length must be positive".to_owned()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "similarity threshold {} is outside of [0, 1]",
                self.similarity_threshold
            )));
        }
        if self.worker_count == Some(0) {
            return Err(Error::Config("worker count must be positive".to_owned()));
        }
        if self.memory_pressure_factor < 1 {
            return Err(Error::Config("memory pressure factor must be at least 1".to_owned()));
        }
        Ok(())
    }
}

/// `tokensim/config.toml` in the platform's configuration directory.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tokensim").join("config.toml"))
}

/// Reads a TOML file with the same keys as the long command line options, in snake case.
/// A missing file is no error and yields empty options.
pub fn read_config_file(path: &Path) -> Result<ConfigOpt, Error> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ConfigOpt::default()),
        Err(err) => Err(err.into()),
    }
}
